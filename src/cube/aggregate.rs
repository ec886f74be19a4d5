//! Temporal aggregation over a cube's temporal dimension
//!
//! Two flavors: explicit `[start, end)` intervals with caller-supplied or
//! derived labels, and calendar-aligned period bins (hour, day, week, dekad,
//! month, season, tropical-season, year, decade, decade-ad).

use super::{inserted, DataCube};
use crate::calendar::{self, Period};
use crate::errors::{CubeError, Result};
use crate::temporal;
use crate::view::{row_major_coords, StridedView};
use chrono::{Datelike, TimeZone, Utc};
use serde_json::Value;

impl DataCube {
    /// Aggregates time steps into caller-defined intervals. Each interval is
    /// a half-open `[start, end)` extent; membership follows the same rules
    /// as temporal filtering. The output label for interval `i` is
    /// `labels[i]` when labels are supplied, otherwise the interval's start
    /// bound verbatim. Intervals with no member time steps produce the
    /// no-data placeholder without invoking the reducer.
    ///
    /// # Errors
    ///
    /// Fails `ValidationError` when `labels` does not match the interval
    /// count, `InvalidExtent` for a fully-open or unparseable interval,
    /// `DuplicateLabel` when two output labels coincide, and
    /// `DimensionNotAvailable`/`TooManyDimensions` per
    /// [`DataCube::temporal_axis`].
    pub fn aggregate_temporal(
        &self,
        intervals: &[(Option<&str>, Option<&str>)],
        reducer: impl Fn(&[f64], &[Value]) -> f64,
        labels: Option<&[Value]>,
        dimension_name: Option<&str>,
    ) -> Result<Self> {
        if let Some(labels) = labels {
            if labels.len() != intervals.len() {
                return Err(CubeError::ValidationError {
                    parameter: "labels".to_string(),
                    reason: format!(
                        "{} labels for {} intervals",
                        labels.len(),
                        intervals.len()
                    ),
                });
            }
        }
        let axis = self.temporal_axis(dimension_name)?;
        let instants = self.label_instants(axis)?;

        let mut bins = Vec::with_capacity(intervals.len());
        let mut out_labels = Vec::with_capacity(intervals.len());
        for (i, &interval) in intervals.iter().enumerate() {
            let extent = temporal::parse_extent(interval)?;
            let members: Vec<usize> = instants
                .iter()
                .enumerate()
                .filter(|(_, &t)| temporal::in_extent(t, &extent))
                .map(|(idx, _)| idx)
                .collect();
            bins.push(members);
            out_labels.push(match labels {
                Some(labels) => labels[i].clone(),
                None => interval
                    .0
                    .map_or(Value::Null, |start| Value::String(start.to_string())),
            });
        }
        ensure_unique(&out_labels)?;
        Ok(self.aggregate_bins(axis, &bins, out_labels, &reducer))
    }

    /// Aggregates time steps into calendar-aligned period bins. Bin labels
    /// run from the first day of the year containing the minimum label date
    /// through the maximum, skipping any leading bins before the data
    /// begins; a time step belongs to the bin whose label equals its own
    /// period-formatted label. Bins with no member produce the no-data
    /// placeholder without invoking the reducer; trailing empty bins past
    /// the last data-bearing one are not emitted.
    ///
    /// # Errors
    ///
    /// Fails `UnknownPeriod` for a period name outside the closed set,
    /// `DimensionNotAvailable`/`TooManyDimensions` per
    /// [`DataCube::temporal_axis`], and `Internal` when the temporal
    /// dimension carries no labels.
    pub fn aggregate_temporal_period(
        &self,
        period: &str,
        reducer: impl Fn(&[f64], &[Value]) -> f64,
        dimension_name: Option<&str>,
    ) -> Result<Self> {
        let period: Period = period.parse()?;
        let axis = self.temporal_axis(dimension_name)?;
        let instants = self.label_instants(axis)?;
        let (min, max) = match (instants.iter().min(), instants.iter().max()) {
            (Some(&min), Some(&max)) => (min, max),
            _ => {
                return Err(CubeError::Internal(
                    "temporal dimension has no labels to aggregate".to_string(),
                ))
            }
        };

        let start = Utc
            .with_ymd_and_hms(min.year(), 1, 1, 0, 0, 0)
            .single()
            .unwrap_or(min);
        let first_label = calendar::label_of(period, min);
        let step_labels: Vec<String> = instants
            .iter()
            .map(|&t| calendar::label_of(period, t))
            .collect();

        let mut bins: Vec<Vec<usize>> = Vec::new();
        let mut out_labels: Vec<Value> = Vec::new();
        let mut started = false;
        for candidate in calendar::generate_range(start, max, period) {
            let label = calendar::label_of(period, candidate);
            if !started {
                if label != first_label {
                    continue;
                }
                started = true;
            }
            let members: Vec<usize> = step_labels
                .iter()
                .enumerate()
                .filter(|(_, l)| **l == label)
                .map(|(i, _)| i)
                .collect();
            bins.push(members);
            out_labels.push(Value::String(label));
        }
        // The generated range runs through the first timestamp past the
        // maximum, which can open a bin no time step falls into.
        while bins.last().is_some_and(Vec::is_empty) {
            bins.pop();
            out_labels.pop();
        }

        Ok(self.aggregate_bins(axis, &bins, out_labels, &reducer))
    }

    /// Replaces the values along `axis` with one reduced value per bin;
    /// empty bins become NaN without invoking the reducer.
    fn aggregate_bins(
        &self,
        axis: usize,
        bins: &[Vec<usize>],
        new_labels: Vec<Value>,
        reducer: &impl Fn(&[f64], &[Value]) -> f64,
    ) -> Self {
        let old_labels = &self.dimensions()[axis].labels;
        let bin_labels: Vec<Vec<Value>> = bins
            .iter()
            .map(|members| {
                members
                    .iter()
                    .filter_map(|&i| old_labels.get(i).cloned())
                    .collect()
            })
            .collect();

        let mut shape = self.shape().to_vec();
        shape[axis] = bins.len();
        let mut buffer = Vec::with_capacity(shape.iter().product());
        for coord in row_major_coords(shape.clone()) {
            let bin = coord[axis];
            let members = &bins[bin];
            if members.is_empty() {
                buffer.push(f64::NAN);
                continue;
            }
            let outer = super::removed(&coord, axis);
            let values: Vec<f64> = members
                .iter()
                .map(|&i| self.data().get(&inserted(&outer, axis, i)))
                .collect();
            buffer.push(reducer(&values, &bin_labels[bin]));
        }

        let mut dimensions = self.dimensions().to_vec();
        dimensions[axis].labels = new_labels;
        Self::from_raw(dimensions, StridedView::from_shape(buffer, shape))
    }
}

/// Rejects label sequences with coinciding entries.
fn ensure_unique(labels: &[Value]) -> Result<()> {
    for (i, label) in labels.iter().enumerate() {
        if labels[..i].contains(label) {
            return Err(CubeError::DuplicateLabel {
                label: label.to_string(),
            });
        }
    }
    Ok(())
}
