//! Cube-to-cube merging
//!
//! Merging first classifies the dimension relationship of the two cubes into
//! exactly one [`MergeStrategy`], then applies the combination rule for that
//! case. The classification is a pure decision procedure kept separate from
//! execution.

use super::{DataCube, Dimension, DimensionType};
use crate::errors::{CubeError, Result};
use crate::view::{row_major_coords, StridedView};
use serde_json::Value;

/// Caller-supplied function combining two scalar values from corresponding
/// positions of two cubes being merged; the first argument comes from the
/// cube `merge` was called on.
pub type OverlapResolver<'a> = &'a dyn Fn(f64, f64) -> f64;

/// Relationship class of two cubes' dimension lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Same names, types and label sequences
    Identical,
    /// The other cube's dimensions are a subset of this cube's
    SubsetOther,
    /// This cube's dimensions are a subset of the other's
    SubsetSelf,
    /// Exactly one shared dimension (at this axis) has differing labels
    SingleDiffering(usize),
    /// Each cube has dimensions the other lacks; shared dimensions match
    DisjointUnion,
}

impl DataCube {
    /// Classifies the dimension relationship between two cubes.
    ///
    /// # Errors
    ///
    /// Fails `Internal` when a matching dimension carries duplicate labels
    /// ("labels must be unique"), when a shared name has different types,
    /// or when label sets differ on more than one dimension at once ("only
    /// one dimension may differ").
    pub fn merge_strategy(&self, other: &Self) -> Result<MergeStrategy> {
        for dim in self.dimensions() {
            if let Some(other_dim) = other.dimension(&dim.name) {
                ensure_unique_labels(dim)?;
                ensure_unique_labels(other_dim)?;
                if dim.dimension_type != other_dim.dimension_type {
                    return Err(CubeError::Internal(format!(
                        "dimension '{}' has different types in the merged cubes",
                        dim.name
                    )));
                }
            }
        }

        let only_self = self
            .dimensions()
            .iter()
            .any(|d| other.axis_of(&d.name).is_none());
        let only_other = other
            .dimensions()
            .iter()
            .any(|d| self.axis_of(&d.name).is_none());
        let differing: Vec<usize> = self
            .dimensions()
            .iter()
            .enumerate()
            .filter(|(_, d)| {
                other
                    .dimension(&d.name)
                    .is_some_and(|od| od.labels != d.labels)
            })
            .map(|(axis, _)| axis)
            .collect();

        match (only_self, only_other, differing.as_slice()) {
            (false, false, []) => Ok(MergeStrategy::Identical),
            (false, false, [axis]) => Ok(MergeStrategy::SingleDiffering(*axis)),
            (true, false, []) => Ok(MergeStrategy::SubsetOther),
            (false, true, []) => Ok(MergeStrategy::SubsetSelf),
            (true, true, []) => Ok(MergeStrategy::DisjointUnion),
            _ => Err(CubeError::Internal(
                "only one dimension may differ".to_string(),
            )),
        }
    }

    /// Merges two cubes according to their classified dimension
    /// relationship:
    ///
    /// 1. identical dimensions — element-wise resolve, or without a
    ///    resolver stack both cubes along a new leading `"cubes"` dimension
    ///    labeled `["cube1", "cube2"]`;
    /// 2. one cube's dimensions a subset of the other's — broadcast-merge
    ///    through the resolver (required), the symmetric case swapping
    ///    roles;
    /// 3. exactly one shared dimension with differing labels — labels
    ///    present in both resolve element-wise (resolver required only when
    ///    an overlap exists), one-sided labels append unchanged;
    /// 4. otherwise the union of dimension names, each cube broadcast along
    ///    the dimensions it lacks and combined through the resolver
    ///    (required).
    ///
    /// The resolver is always called as `(this value, other value)`.
    ///
    /// # Errors
    ///
    /// Fails `OverlapResolverMissing` when an overlap requires a resolver
    /// that was not supplied, plus the classification failures of
    /// [`DataCube::merge_strategy`].
    pub fn merge(&self, other: &Self, overlap_resolver: Option<OverlapResolver<'_>>) -> Result<Self> {
        match self.merge_strategy(other)? {
            MergeStrategy::Identical => match overlap_resolver {
                Some(resolve) => union_combine(self, other, resolve),
                None => stack(self, other),
            },
            MergeStrategy::SubsetOther => {
                let resolve = overlap_resolver.ok_or(CubeError::OverlapResolverMissing)?;
                union_combine(self, other, resolve)
            }
            MergeStrategy::SubsetSelf => {
                let resolve = overlap_resolver.ok_or(CubeError::OverlapResolverMissing)?;
                union_combine(other, self, &|x, y| resolve(y, x))
            }
            MergeStrategy::SingleDiffering(axis) => {
                self.merge_single_differing(other, axis, overlap_resolver)
            }
            MergeStrategy::DisjointUnion => {
                let resolve = overlap_resolver.ok_or(CubeError::OverlapResolverMissing)?;
                union_combine(self, other, resolve)
            }
        }
    }

    /// Case 3: labels present in both cubes resolve element-wise, labels
    /// present only in the other cube append their slices unchanged.
    fn merge_single_differing(
        &self,
        other: &Self,
        axis: usize,
        overlap_resolver: Option<OverlapResolver<'_>>,
    ) -> Result<Self> {
        let name = self.dimensions()[axis].name.clone();
        let other_axis = other
            .axis_of(&name)
            .ok_or_else(|| CubeError::Internal(format!("dimension '{}' vanished", name)))?;
        let other_dim = &other.dimensions()[other_axis];

        let outer_names: Vec<String> = self
            .dimensions()
            .iter()
            .enumerate()
            .filter(|&(k, _)| k != axis)
            .map(|(_, d)| d.name.clone())
            .collect();

        let self_labels = self.dimensions()[axis].labels.clone();
        let overlapping: Vec<(usize, usize)> = self_labels
            .iter()
            .enumerate()
            .filter_map(|(i, label)| other_dim.index_of(label).map(|j| (i, j)))
            .collect();
        if !overlapping.is_empty() && overlap_resolver.is_none() {
            return Err(CubeError::OverlapResolverMissing);
        }

        let mut result = self.materialized();
        for (i, j) in overlapping {
            // Resolver presence was checked above.
            let resolve = overlap_resolver.ok_or(CubeError::OverlapResolverMissing)?;
            let mut picks = vec![None; result.ndim()];
            picks[axis] = Some(i);
            let mine = result.data().pick(&picks);
            let theirs = aligned_slice(other, other_axis, j, &outer_names)?;
            for coord in row_major_coords(mine.shape().to_vec()) {
                let combined = resolve(mine.get(&coord), theirs.get(&coord));
                mine.set(&coord, combined);
            }
        }

        for (j, label) in other_dim.labels.iter().enumerate() {
            if self_labels.contains(label) {
                continue;
            }
            let theirs = aligned_slice(other, other_axis, j, &outer_names)?;
            result = result.extend_dimension_with_data(axis, &theirs, label.clone())?;
        }
        Ok(result)
    }
}

/// Picks one position along an axis and permutes the remaining axes into
/// the given dimension-name order.
fn aligned_slice(
    cube: &DataCube,
    axis: usize,
    index: usize,
    outer_names: &[String],
) -> Result<StridedView<f64>> {
    let mut picks = vec![None; cube.ndim()];
    picks[axis] = Some(index);
    let picked = cube.data().pick(&picks);

    let remaining: Vec<&str> = cube
        .dimensions()
        .iter()
        .enumerate()
        .filter(|&(k, _)| k != axis)
        .map(|(_, d)| d.name.as_str())
        .collect();
    let perm: Vec<usize> = outer_names
        .iter()
        .map(|name| {
            remaining
                .iter()
                .position(|r| r == name)
                .ok_or_else(|| CubeError::Internal(format!("dimension '{}' vanished", name)))
        })
        .collect::<Result<_>>()?;
    Ok(picked.transpose(&perm))
}

/// Element-wise combination over the union of both cubes' dimensions:
/// the result carries `a`'s dimensions followed by the dimensions only `b`
/// has, each cube broadcast along the dimensions it lacks, and
/// `resolve(a value, b value)` at every cell. Covers the identical, subset
/// and disjoint-union merge cases.
fn union_combine(a: &DataCube, b: &DataCube, resolve: OverlapResolver<'_>) -> Result<DataCube> {
    let mut dimensions = a.dimensions().to_vec();
    let mut shape = a.shape().to_vec();
    for (j, dim) in b.dimensions().iter().enumerate() {
        if a.axis_of(&dim.name).is_none() {
            dimensions.push(dim.clone());
            shape.push(b.shape()[j]);
        }
    }

    let a_rank = a.ndim();
    let b_map: Vec<usize> = b
        .dimensions()
        .iter()
        .map(|dim| {
            dimensions
                .iter()
                .position(|d| d.name == dim.name)
                .ok_or_else(|| CubeError::Internal(format!("dimension '{}' vanished", dim.name)))
        })
        .collect::<Result<_>>()?;

    let mut buffer = Vec::with_capacity(shape.iter().product());
    for coord in row_major_coords(shape.clone()) {
        let a_value = a.data().get(&coord[..a_rank]);
        let b_coord: Vec<usize> = b_map.iter().map(|&idx| coord[idx]).collect();
        buffer.push(resolve(a_value, b.data().get(&b_coord)));
    }
    Ok(DataCube::from_raw(
        dimensions,
        StridedView::from_shape(buffer, shape),
    ))
}

/// Case 1 without a resolver: stack both cubes along a new leading
/// dimension named `"cubes"` with labels `["cube1", "cube2"]`.
fn stack(a: &DataCube, b: &DataCube) -> Result<DataCube> {
    let perm: Vec<usize> = a
        .dimensions()
        .iter()
        .map(|dim| {
            b.axis_of(&dim.name)
                .ok_or_else(|| CubeError::Internal(format!("dimension '{}' vanished", dim.name)))
        })
        .collect::<Result<_>>()?;

    let mut buffer = a.data().to_vec();
    buffer.extend(b.data().transpose(&perm).to_vec());

    let mut shape = vec![2];
    shape.extend_from_slice(a.shape());
    let mut dimensions = vec![Dimension::new(
        "cubes",
        vec![Value::String("cube1".to_string()), Value::String("cube2".to_string())],
        DimensionType::Other,
    )];
    dimensions.extend(a.dimensions().iter().cloned());
    Ok(DataCube::from_raw(
        dimensions,
        StridedView::from_shape(buffer, shape),
    ))
}

/// Duplicate labels within a matching dimension are rejected.
fn ensure_unique_labels(dim: &Dimension) -> Result<()> {
    for (i, label) in dim.labels.iter().enumerate() {
        if dim.labels[..i].contains(label) {
            return Err(CubeError::Internal(format!(
                "dimension '{}' labels must be unique",
                dim.name
            )));
        }
    }
    Ok(())
}
