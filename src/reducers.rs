//! Stock reducers for dimension-aware reductions
//!
//! Cube operations accept arbitrary closures; this module provides the
//! standard set used by the CLI and tests. All reducers skip non-finite
//! values (the no-data placeholder) and yield NaN when no valid value
//! remains.

use crate::errors::{CubeError, Result};
use std::str::FromStr;

/// Supported stock reduction operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Arithmetic mean
    Mean,
    /// Sum of values
    Sum,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
}

impl Reducer {
    /// Get the string representation of the operation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::Min => "minimum",
            Self::Max => "maximum",
        }
    }

    /// Reduces a sequence of values to a scalar, skipping non-finite values.
    /// Returns NaN when no valid value remains (sum returns 0).
    #[must_use]
    pub fn apply(self, values: &[f64]) -> f64 {
        let valid = values.iter().copied().filter(|v| v.is_finite());
        match self {
            Self::Mean => {
                let mut sum = 0.0;
                let mut count = 0u64;
                for v in valid {
                    sum += v;
                    count += 1;
                }
                if count > 0 {
                    sum / count as f64
                } else {
                    f64::NAN
                }
            }
            Self::Sum => valid.sum(),
            Self::Min => {
                let min = valid.fold(f64::INFINITY, f64::min);
                if min == f64::INFINITY {
                    f64::NAN
                } else {
                    min
                }
            }
            Self::Max => {
                let max = valid.fold(f64::NEG_INFINITY, f64::max);
                if max == f64::NEG_INFINITY {
                    f64::NAN
                } else {
                    max
                }
            }
        }
    }
}

impl FromStr for Reducer {
    type Err = CubeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(Self::Mean),
            "sum" => Ok(Self::Sum),
            "min" | "minimum" => Ok(Self::Min),
            "max" | "maximum" => Ok(Self::Max),
            other => Err(CubeError::ValidationError {
                parameter: "reducer".to_string(),
                reason: format!("'{}' is not a known reducer", other),
            }),
        }
    }
}
