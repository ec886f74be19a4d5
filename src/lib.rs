//! rastercube: an in-memory data cube engine for raster pixel samples
//!
//! A multi-dimensional, named-and-labeled array abstraction used to execute
//! process-graph style transformations (reduce, apply, aggregate-over-time,
//! merge) over raster pixel-sample data. It is the computational substrate
//! beneath per-pixel evaluation scripts.
//!
//! ## Key Features
//!
//! - **Strided views**: shape/stride/offset interpretation of a shared flat
//!   buffer with aliasing sub-views (`pick`, `lo`, `hi`, `step`,
//!   `transpose`, broadcast)
//! - **Labeled dimensions**: named, typed (`temporal`/`bands`/`other`)
//!   dimensions with string-or-number labels
//! - **Dimension-aware operations**: filtering, reduction, mapping,
//!   interval- and calendar-period temporal aggregation
//! - **Cube merging**: four combination strategies chosen by an explicit
//!   dimension-relationship classification
//!
//! ## Module Organization
//!
//! - [`view`]: strided N-dimensional views and flatten/broadcast utilities
//! - [`cube`]: data cubes and the process-graph operations
//! - [`calendar`]: calendar-period labeling and date stepping
//! - [`temporal`]: RFC-3339 date/date-time/time parsing and extents
//! - [`reducers`]: stock mean/sum/min/max reducers with no-data skipping
//! - [`validation`]: shared parameter validation
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust
//! use rastercube::prelude::*;
//! use serde_json::{json, Map, Value};
//!
//! // Two scenes of two bands each
//! let samples: Vec<Map<String, Value>> = vec![
//!     json!({"B01": 3.0, "B02": 3.0}).as_object().unwrap().clone(),
//!     json!({"B01": 5.0, "B02": 1.0}).as_object().unwrap().clone(),
//! ];
//! let cube = DataCube::from_samples(&samples, None).unwrap();
//!
//! // Mean over the temporal axis, ignoring no-data
//! let mean = |values: &[f64], _labels: &[Value]| Reducer::Mean.apply(values);
//! let reduced = cube.reduce_by_dimension(mean, "t").unwrap();
//! assert_eq!(reduced.to_flat_vec(), vec![4.0, 2.0]);
//! ```
//!
//! All operations are synchronous and single-threaded; a cube is owned
//! exclusively by one evaluation at a time.

// Core modules
pub mod calendar;
pub mod cube;
pub mod errors;
pub mod reducers;
pub mod temporal;
pub mod validation;
pub mod view;

// Direct re-exports for the public API
pub use cube::{DataCube, Dimension, DimensionType, MergeStrategy, OverlapResolver};
pub use errors::{CubeError, Result};
pub use reducers::Reducer;
pub use view::{SharedBuffer, StridedView};

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::calendar::Period;
    pub use crate::cube::{DataCube, Dimension, DimensionType, MergeStrategy};
    pub use crate::errors::{CubeError, Result};
    pub use crate::reducers::Reducer;
    pub use crate::view::StridedView;
}
