//! Data cubes: named, typed, labeled dimensions over a strided view
//!
//! A [`DataCube`] pairs a [`StridedView`] with an ordered list of
//! [`Dimension`]s and provides the dimension-aware operations of the
//! process-graph surface: filtering, reduction, mapping, temporal
//! aggregation, merging and structural edits. Every operation returns a new
//! logical cube; buffers are rebuilt unless an operation explicitly mutates
//! in place.

mod aggregate;
mod merge;

pub use merge::{MergeStrategy, OverlapResolver};

use crate::errors::{CubeError, Result};
use crate::temporal;
use crate::validation::{check_parameter, ParamSpec, ParamType};
use crate::view::{row_major_coords, row_major_strides, StridedView};
use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};

/// Default name of the temporal dimension seeded from raw samples
pub const TEMPORAL_DIMENSION: &str = "t";
/// Default name of the bands dimension seeded from raw samples
pub const BANDS_DIMENSION: &str = "bands";

/// Kind of a cube dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionType {
    Temporal,
    Bands,
    Other,
}

impl DimensionType {
    /// Get the string representation of the dimension type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Temporal => "temporal",
            Self::Bands => "bands",
            Self::Other => "other",
        }
    }
}

/// A named, typed, labeled cube dimension.
///
/// `labels.len()` equals the cube's shape on this axis once the dimension is
/// fully materialized; freshly constructed cubes may carry empty label lists
/// until labels are assigned.
#[derive(Debug, Clone)]
pub struct Dimension {
    pub name: String,
    pub labels: Vec<Value>,
    pub dimension_type: DimensionType,
}

impl Dimension {
    /// Create a dimension with labels
    #[must_use]
    pub fn new(name: impl Into<String>, labels: Vec<Value>, dimension_type: DimensionType) -> Self {
        Self {
            name: name.into(),
            labels,
            dimension_type,
        }
    }

    /// Position of a label within this dimension
    #[must_use]
    pub fn index_of(&self, label: &Value) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

/// A data cube: a strided view plus its ordered dimension list.
///
/// Axis order in `dimensions` matches axis order in the view's shape.
#[derive(Debug, Clone)]
pub struct DataCube {
    dimensions: Vec<Dimension>,
    data: StridedView<f64>,
}

impl DataCube {
    /// Creates a cube from a view and its dimension list.
    ///
    /// # Errors
    ///
    /// Fails `Internal` when the dimension count does not match the view's
    /// rank, or a materialized dimension's label count does not match the
    /// axis length.
    pub fn new(data: StridedView<f64>, dimensions: Vec<Dimension>) -> Result<Self> {
        if dimensions.len() != data.ndim() {
            return Err(CubeError::Internal(format!(
                "{} dimensions for a rank-{} view",
                dimensions.len(),
                data.ndim()
            )));
        }
        for (axis, dim) in dimensions.iter().enumerate() {
            if !dim.labels.is_empty() && dim.labels.len() != data.shape()[axis] {
                return Err(CubeError::Internal(format!(
                    "dimension '{}' has {} labels for axis length {}",
                    dim.name,
                    dim.labels.len(),
                    data.shape()[axis]
                )));
            }
        }
        Ok(Self { dimensions, data })
    }

    /// Internal constructor for operations that uphold the invariants by
    /// construction.
    pub(crate) fn from_raw(dimensions: Vec<Dimension>, data: StridedView<f64>) -> Self {
        debug_assert_eq!(dimensions.len(), data.ndim());
        Self { dimensions, data }
    }

    /// Creates a cube from one flat band-name→value record (a single time
    /// step).
    ///
    /// # Errors
    ///
    /// Fails `ValidationError` when a band value is neither a number nor
    /// null.
    pub fn from_sample(sample: &Map<String, Value>) -> Result<Self> {
        Self::from_samples(std::slice::from_ref(sample), None)
    }

    /// Creates a cube from an ordered sequence of flat band-name→value
    /// records, one per scene, with axis order `[t, bands]`.
    ///
    /// Temporal labels come from `scene_times` when given (one RFC-3339
    /// string per record), otherwise from the record index. Band labels come
    /// from the first record's keys; every record must carry the same bands.
    ///
    /// # Errors
    ///
    /// Fails `ValidationError` on an empty sample sequence, a band value
    /// that is neither a number nor null, a record missing a band, or a
    /// scene-time count that does not match the record count.
    pub fn from_samples(samples: &[Map<String, Value>], scene_times: Option<&[String]>) -> Result<Self> {
        if samples.is_empty() {
            return Err(CubeError::ValidationError {
                parameter: "samples".to_string(),
                reason: "at least one sample record is required".to_string(),
            });
        }
        if let Some(times) = scene_times {
            if times.len() != samples.len() {
                return Err(CubeError::ValidationError {
                    parameter: "scene_times".to_string(),
                    reason: format!("{} times for {} samples", times.len(), samples.len()),
                });
            }
        }

        let bands: Vec<&String> = samples[0].keys().collect();
        let band_spec = ParamSpec::required("sample")
            .nullable()
            .types(&[ParamType::Number]);

        let mut buffer = Vec::with_capacity(samples.len() * bands.len());
        for sample in samples {
            for &band in &bands {
                let value = sample.get(band);
                if value.is_none() {
                    return Err(CubeError::ValidationError {
                        parameter: "samples".to_string(),
                        reason: format!("band '{}' is missing from a sample record", band),
                    });
                }
                check_parameter(value, &band_spec)?;
                buffer.push(value.and_then(Value::as_f64).unwrap_or(f64::NAN));
            }
        }

        let temporal_labels: Vec<Value> = match scene_times {
            Some(times) => times.iter().map(|t| Value::String(t.clone())).collect(),
            None => (0..samples.len()).map(Value::from).collect(),
        };
        let band_labels: Vec<Value> = bands.iter().map(|b| Value::String((*b).clone())).collect();

        let shape = vec![samples.len(), bands.len()];
        Self::new(
            StridedView::from_shape(buffer, shape),
            vec![
                Dimension::new(TEMPORAL_DIMENSION, temporal_labels, DimensionType::Temporal),
                Dimension::new(BANDS_DIMENSION, band_labels, DimensionType::Bands),
            ],
        )
    }

    /// The cube's ordered dimension list
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// The cube's strided view
    #[must_use]
    pub fn data(&self) -> &StridedView<f64> {
        &self.data
    }

    /// Logical shape of the cube
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Number of dimensions
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Axis index of a dimension name
    #[must_use]
    pub fn axis_of(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d.name == name)
    }

    /// Dimension by name
    #[must_use]
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Axis of the designated bands dimension.
    ///
    /// # Errors
    ///
    /// Fails `DimensionNotAvailable` when the cube has no bands dimension.
    pub fn bands_axis(&self) -> Result<usize> {
        self.dimensions
            .iter()
            .position(|d| d.dimension_type == DimensionType::Bands)
            .ok_or_else(|| CubeError::DimensionNotAvailable {
                dim: BANDS_DIMENSION.to_string(),
            })
    }

    /// Resolves the temporal axis to operate on: by name when given,
    /// otherwise the cube's single temporal dimension.
    ///
    /// # Errors
    ///
    /// Fails `DimensionNotAvailable` when the named dimension does not exist
    /// (or is not temporal), or no temporal dimension exists;
    /// `TooManyDimensions` when several temporal dimensions exist and none
    /// is named.
    pub fn temporal_axis(&self, name: Option<&str>) -> Result<usize> {
        match name {
            Some(name) => self
                .dimensions
                .iter()
                .position(|d| d.name == name && d.dimension_type == DimensionType::Temporal)
                .ok_or_else(|| CubeError::DimensionNotAvailable {
                    dim: name.to_string(),
                }),
            None => {
                let mut candidates = self
                    .dimensions
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| d.dimension_type == DimensionType::Temporal);
                let first = candidates.next();
                if candidates.next().is_some() {
                    return Err(CubeError::TooManyDimensions {
                        message: "the data cube has more than one temporal dimension; \
                                  the dimension to operate on must be named explicitly"
                            .to_string(),
                    });
                }
                first
                    .map(|(axis, _)| axis)
                    .ok_or_else(|| CubeError::DimensionNotAvailable {
                        dim: TEMPORAL_DIMENSION.to_string(),
                    })
            }
        }
    }

    /// Parses every label of a temporal axis into a UTC instant.
    pub(crate) fn label_instants(&self, axis: usize) -> Result<Vec<DateTime<Utc>>> {
        self.dimensions[axis]
            .labels
            .iter()
            .map(|label| match label.as_str() {
                Some(s) => temporal::parse_temporal(s).map(|p| p.instant),
                None => Err(CubeError::InvalidTemporalString {
                    value: label.to_string(),
                }),
            })
            .collect()
    }

    /// Keeps only the given positions along one axis, rebuilding the buffer.
    fn select_indices(&self, axis: usize, indices: &[usize]) -> Self {
        let mut shape = self.shape().to_vec();
        shape[axis] = indices.len();

        let mut buffer = Vec::with_capacity(shape.iter().product());
        for mut coord in row_major_coords(shape.clone()) {
            coord[axis] = indices[coord[axis]];
            buffer.push(self.data.get(&coord));
        }

        let mut dimensions = self.dimensions.clone();
        if !dimensions[axis].labels.is_empty() {
            dimensions[axis].labels = indices
                .iter()
                .map(|&i| dimensions[axis].labels[i].clone())
                .collect();
        }
        Self {
            dimensions,
            data: StridedView::from_shape(buffer, shape),
        }
    }

    /// Keeps only the sample positions on the bands axis whose label is in
    /// `names`, in the cube's existing internal order (not reordered to
    /// match `names`).
    ///
    /// # Errors
    ///
    /// Fails `DimensionNotAvailable` when no bands dimension exists.
    pub fn filter_bands(&self, names: &[&str]) -> Result<Self> {
        let axis = self.bands_axis()?;
        let indices: Vec<usize> = self.dimensions[axis]
            .labels
            .iter()
            .enumerate()
            .filter(|(_, label)| label.as_str().is_some_and(|s| names.contains(&s)))
            .map(|(i, _)| i)
            .collect();
        Ok(self.select_indices(axis, &indices))
    }

    /// Keeps only the time steps inside a half-open `[start, end)` extent.
    /// Each bound is either open (`None`) or an RFC-3339 date, date-time or
    /// time string.
    ///
    /// # Errors
    ///
    /// Fails `InvalidExtent` when both bounds are open or a bound does not
    /// parse; `DimensionNotAvailable`/`TooManyDimensions` per
    /// [`DataCube::temporal_axis`].
    pub fn filter_temporal(
        &self,
        extent: (Option<&str>, Option<&str>),
        dimension_name: Option<&str>,
    ) -> Result<Self> {
        let axis = self.temporal_axis(dimension_name)?;
        let extent = temporal::parse_extent(extent)?;
        let instants = self.label_instants(axis)?;
        let indices: Vec<usize> = instants
            .iter()
            .enumerate()
            .filter(|(_, &t)| temporal::in_extent(t, &extent))
            .map(|(i, _)| i)
            .collect();
        Ok(self.select_indices(axis, &indices))
    }

    /// Reduces one dimension to a scalar per remaining coordinate and
    /// removes it entirely. The reducer receives the full ordered value
    /// sequence along the dimension together with its labels; the result has
    /// rank = input rank − 1.
    ///
    /// # Errors
    ///
    /// Fails `DimensionNotAvailable` when the dimension does not exist.
    pub fn reduce_by_dimension(
        &self,
        reducer: impl Fn(&[f64], &[Value]) -> f64,
        dimension_name: &str,
    ) -> Result<Self> {
        let axis = self
            .axis_of(dimension_name)
            .ok_or_else(|| CubeError::DimensionNotAvailable {
                dim: dimension_name.to_string(),
            })?;
        let labels = self.dimensions[axis].labels.clone();
        let axis_len = self.shape()[axis];
        let reduced_shape = removed(self.shape(), axis);

        let mut buffer = Vec::with_capacity(reduced_shape.iter().product());
        for coord in row_major_coords(reduced_shape.clone()) {
            let mut values = Vec::with_capacity(axis_len);
            for i in 0..axis_len {
                values.push(self.data.get(&inserted(&coord, axis, i)));
            }
            buffer.push(reducer(&values, &labels));
        }

        let mut dimensions = self.dimensions.clone();
        dimensions.remove(axis);
        Ok(Self {
            dimensions,
            data: StridedView::from_shape(buffer, reduced_shape),
        })
    }

    /// Maps the value sequence along one dimension through a process that
    /// may change its length. With a target name, the dimension is renamed,
    /// retyped to `other` and labeled `0..new_len`; without one, the length
    /// must be unchanged and the original labels are kept.
    ///
    /// # Errors
    ///
    /// Fails `DimensionNotAvailable` when the dimension does not exist,
    /// `DimensionExists` when the target name collides with an existing
    /// dimension, and `Internal` when the process returns sequences of
    /// differing lengths or changes the length without a target name.
    pub fn apply_dimension(
        &self,
        process: impl Fn(&[f64], &[Value]) -> Vec<f64>,
        dimension_name: &str,
        target_dimension_name: Option<&str>,
    ) -> Result<Self> {
        let axis = self
            .axis_of(dimension_name)
            .ok_or_else(|| CubeError::DimensionNotAvailable {
                dim: dimension_name.to_string(),
            })?;
        if let Some(target) = target_dimension_name {
            if self.axis_of(target).is_some() {
                return Err(CubeError::DimensionExists {
                    dim: target.to_string(),
                });
            }
        }

        let labels = self.dimensions[axis].labels.clone();
        let axis_len = self.shape()[axis];
        let outer_shape = removed(self.shape(), axis);

        let mut outputs: Vec<Vec<f64>> = Vec::new();
        for coord in row_major_coords(outer_shape.clone()) {
            let mut values = Vec::with_capacity(axis_len);
            for i in 0..axis_len {
                values.push(self.data.get(&inserted(&coord, axis, i)));
            }
            let output = process(&values, &labels);
            if let Some(first) = outputs.first() {
                if output.len() != first.len() {
                    return Err(CubeError::Internal(
                        "process returned sequences of different lengths".to_string(),
                    ));
                }
            }
            outputs.push(output);
        }

        let new_len = outputs.first().map_or(axis_len, Vec::len);
        if target_dimension_name.is_none() && new_len != axis_len {
            return Err(CubeError::Internal(format!(
                "process changed the length of dimension '{}' from {} to {}; \
                 a target dimension name is required",
                dimension_name, axis_len, new_len
            )));
        }

        let mut new_shape = self.shape().to_vec();
        new_shape[axis] = new_len;
        let strides = row_major_strides(&new_shape);
        let mut buffer = vec![0.0; new_shape.iter().product()];
        for (slot, coord) in row_major_coords(outer_shape).enumerate() {
            for (i, &value) in outputs[slot].iter().enumerate() {
                let full = inserted(&coord, axis, i);
                let flat: isize = full
                    .iter()
                    .zip(strides.iter())
                    .map(|(&c, &s)| c as isize * s)
                    .sum();
                buffer[flat as usize] = value;
            }
        }

        let mut dimensions = self.dimensions.clone();
        match target_dimension_name {
            Some(target) => {
                dimensions[axis] = Dimension::new(
                    target,
                    (0..new_len).map(Value::from).collect(),
                    DimensionType::Other,
                );
            }
            None => {
                // length unchanged, original labels stay valid
            }
        }
        Ok(Self {
            dimensions,
            data: StridedView::from_shape(buffer, new_shape),
        })
    }

    /// Adds a new leading dimension of length one.
    ///
    /// # Errors
    ///
    /// Fails `DimensionExists` when the name is already taken.
    pub fn add_dimension(
        &self,
        name: &str,
        label: Value,
        dimension_type: DimensionType,
    ) -> Result<Self> {
        if self.axis_of(name).is_some() {
            return Err(CubeError::DimensionExists {
                dim: name.to_string(),
            });
        }
        let mut shape = vec![1];
        shape.extend_from_slice(self.shape());
        let mut stride = vec![0isize];
        stride.extend_from_slice(self.data.stride());
        let data = StridedView::from_parts(
            self.data.buffer(),
            shape,
            Some(stride),
            Some(self.data.offset()),
        );
        let mut dimensions = vec![Dimension::new(name, vec![label], dimension_type)];
        dimensions.extend(self.dimensions.iter().cloned());
        Ok(Self { dimensions, data })
    }

    /// Removes a length-one dimension, collapsing it into the remaining
    /// axes.
    ///
    /// # Errors
    ///
    /// Fails `DimensionNotAvailable` when the dimension does not exist and
    /// `Internal` when it has more than one label.
    pub fn remove_dimension(&self, name: &str) -> Result<Self> {
        let axis = self
            .axis_of(name)
            .ok_or_else(|| CubeError::DimensionNotAvailable {
                dim: name.to_string(),
            })?;
        if self.shape()[axis] != 1 {
            return Err(CubeError::Internal(format!(
                "cannot remove dimension '{}' with {} labels",
                name,
                self.shape()[axis]
            )));
        }
        let mut picks = vec![None; self.ndim()];
        picks[axis] = Some(0);
        let mut dimensions = self.dimensions.clone();
        dimensions.remove(axis);
        Ok(Self {
            dimensions,
            data: self.data.pick(&picks),
        })
    }

    /// Inserts a rank−1 slice (broadcastable to the cube's shape without
    /// `axis`) at position `at` along `axis`, rebuilding the buffer and
    /// inserting `label` into the dimension.
    ///
    /// # Errors
    ///
    /// Fails `Internal` when `at` is out of range or the slice shape cannot
    /// be broadcast.
    pub fn insert_into_dimension(
        &self,
        axis: usize,
        values: &StridedView<f64>,
        at: usize,
        label: Value,
    ) -> Result<Self> {
        let axis_len = self.shape()[axis];
        if at > axis_len {
            return Err(CubeError::Internal(format!(
                "insert position {} exceeds axis length {}",
                at, axis_len
            )));
        }
        let slice_shape = removed(self.shape(), axis);
        let values = values.broadcast_to(&slice_shape)?;

        let mut shape = self.shape().to_vec();
        shape[axis] += 1;
        let mut buffer = Vec::with_capacity(shape.iter().product());
        for coord in row_major_coords(shape.clone()) {
            let i = coord[axis];
            let value = if i == at {
                values.get(&removed(&coord, axis))
            } else {
                let mut source = coord.clone();
                if i > at {
                    source[axis] -= 1;
                }
                self.data.get(&source)
            };
            buffer.push(value);
        }

        let mut dimensions = self.dimensions.clone();
        dimensions[axis].labels.insert(at, label);
        Ok(Self {
            dimensions,
            data: StridedView::from_shape(buffer, shape),
        })
    }

    /// Appends a rank−1 slice at the end of `axis`.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`DataCube::insert_into_dimension`].
    pub fn extend_dimension_with_data(
        &self,
        axis: usize,
        values: &StridedView<f64>,
        label: Value,
    ) -> Result<Self> {
        self.insert_into_dimension(axis, values, self.shape()[axis], label)
    }

    /// Overwrites the slice at position `at` along `axis` in place. The
    /// write is visible through every view aliasing this cube's buffer.
    ///
    /// # Errors
    ///
    /// Fails `Internal` when `at` is out of range or the slice shape cannot
    /// be broadcast.
    pub fn set_in_dimension(
        &self,
        axis: usize,
        values: &StridedView<f64>,
        at: usize,
    ) -> Result<()> {
        if at >= self.shape()[axis] {
            return Err(CubeError::Internal(format!(
                "position {} exceeds axis length {}",
                at,
                self.shape()[axis]
            )));
        }
        let slice_shape = removed(self.shape(), axis);
        let values = values.broadcast_to(&slice_shape)?;
        // Snapshot first: source and destination may alias the same buffer.
        let snapshot = values.to_vec();
        let mut picks = vec![None; self.ndim()];
        picks[axis] = Some(at);
        let target = self.data.pick(&picks);
        for (value, coord) in snapshot.into_iter().zip(row_major_coords(slice_shape)) {
            target.set(&coord, value);
        }
        Ok(())
    }

    /// Copies the cube into a fresh contiguous buffer.
    #[must_use]
    pub fn materialized(&self) -> Self {
        Self {
            dimensions: self.dimensions.clone(),
            data: self.data.materialize(),
        }
    }

    /// Row-major linearization of all elements, honoring the view's logical
    /// order rather than raw buffer order.
    #[must_use]
    pub fn to_flat_vec(&self) -> Vec<f64> {
        self.data.to_vec()
    }

    /// Flattens the cube for output: a single scalar for a one-element
    /// rank-0 cube, otherwise the row-major sequence of all elements.
    /// Non-finite values render as JSON null (the no-data placeholder).
    #[must_use]
    pub fn flatten_to_array(&self) -> Value {
        if self.ndim() == 0 {
            return number_or_null(self.data.get(&[]));
        }
        Value::Array(self.to_flat_vec().into_iter().map(number_or_null).collect())
    }
}

fn number_or_null(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Shape or coordinate with one axis removed
pub(crate) fn removed(coord: &[usize], axis: usize) -> Vec<usize> {
    let mut out = coord.to_vec();
    out.remove(axis);
    out
}

/// Coordinate with `i` inserted at `axis`
pub(crate) fn inserted(coord: &[usize], axis: usize, i: usize) -> Vec<usize> {
    let mut out = coord.to_vec();
    out.insert(axis, i);
    out
}
