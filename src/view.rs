//! Strided N-dimensional views over a shared flat buffer
//!
//! A [`StridedView`] interprets a flat buffer through shape, per-axis stride
//! and offset. View-producing operations (`pick`, `lo`, `hi`, `step`,
//! `transpose`, `broadcast_to`) return new views that alias the same buffer;
//! mutating an element through one view is visible through every overlapping
//! view. Shape, stride and offset are fixed at construction, only buffer
//! contents are mutable.

use crate::errors::{CubeError, Result};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared, mutable flat buffer underlying one or more views.
///
/// `Rc<RefCell<_>>` makes the sharing explicit and keeps the whole view layer
/// single-threaded by type (`Rc` is `!Send`).
pub type SharedBuffer<T> = Rc<RefCell<Vec<T>>>;

/// A virtual multi-dimensional array described by shape, per-axis stride and
/// an offset into a shared flat buffer.
///
/// The address of the element at logical coordinate `(i_0..i_{d-1})` is
/// `offset + Σ stride_k * i_k`. A rank-0 view addresses a single buffer slot.
#[derive(Debug, Clone)]
pub struct StridedView<T> {
    buffer: SharedBuffer<T>,
    shape: Vec<usize>,
    stride: Vec<isize>,
    offset: usize,
}

/// Row-major strides for a shape: last axis fastest, computed right-to-left
/// as a cumulative product.
#[must_use]
pub fn row_major_strides(shape: &[usize]) -> Vec<isize> {
    let mut stride = vec![1isize; shape.len()];
    for k in (0..shape.len().saturating_sub(1)).rev() {
        stride[k] = stride[k + 1] * shape[k + 1] as isize;
    }
    stride
}

impl<T: Clone> StridedView<T> {
    /// Creates a rank-1 view owning `data`, with shape `[data.len()]`.
    #[must_use]
    pub fn from_vec(data: Vec<T>) -> Self {
        let shape = vec![data.len()];
        Self::from_parts(Rc::new(RefCell::new(data)), shape, None, None)
    }

    /// Creates a view over `data` with the given shape and row-major strides.
    ///
    /// The product of `shape` must equal `data.len()`.
    #[must_use]
    pub fn from_shape(data: Vec<T>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self::from_parts(Rc::new(RefCell::new(data)), shape, None, None)
    }

    /// Creates a rank-0 (scalar) view addressing a single buffer slot.
    #[must_use]
    pub fn from_scalar(value: T) -> Self {
        Self::from_parts(Rc::new(RefCell::new(vec![value])), Vec::new(), None, None)
    }

    /// Creates a view from an existing shared buffer.
    ///
    /// `stride` defaults to row-major. `offset` defaults to 0, adjusted
    /// upward so that all addresses stay non-negative when any stride is
    /// negative.
    #[must_use]
    pub fn from_parts(
        buffer: SharedBuffer<T>,
        shape: Vec<usize>,
        stride: Option<Vec<isize>>,
        offset: Option<usize>,
    ) -> Self {
        let stride = stride.unwrap_or_else(|| row_major_strides(&shape));
        debug_assert_eq!(shape.len(), stride.len());
        let offset = offset.unwrap_or_else(|| {
            shape
                .iter()
                .zip(stride.iter())
                .filter(|(_, &s)| s < 0)
                .map(|(&n, &s)| n.saturating_sub(1) * s.unsigned_abs())
                .sum()
        });
        Self {
            buffer,
            shape,
            stride,
            offset,
        }
    }

    /// Number of dimensions of this view.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Logical shape of this view.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Per-axis strides of this view.
    #[must_use]
    pub fn stride(&self) -> &[isize] {
        &self.stride
    }

    /// Offset of the first logical element into the buffer.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Number of logical elements (product of the shape; 1 for rank 0).
    #[must_use]
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Returns true if the view addresses no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle to the underlying shared buffer.
    #[must_use]
    pub fn buffer(&self) -> SharedBuffer<T> {
        Rc::clone(&self.buffer)
    }

    /// Returns true if `other` aliases the same buffer as this view.
    #[must_use]
    pub fn shares_buffer_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.buffer, &other.buffer)
    }

    /// Buffer address of the element at `coord`.
    ///
    /// Bounds are not enforced; callers must supply exactly `ndim()`
    /// coordinates within the shape.
    #[must_use]
    pub fn address(&self, coord: &[usize]) -> usize {
        debug_assert_eq!(coord.len(), self.ndim());
        let mut addr = self.offset as isize;
        for (k, &i) in coord.iter().enumerate() {
            addr += self.stride[k] * i as isize;
        }
        addr as usize
    }

    /// Reads the element at `coord`.
    #[must_use]
    pub fn get(&self, coord: &[usize]) -> T {
        let addr = self.address(coord);
        self.buffer.borrow()[addr].clone()
    }

    /// Writes `value` at `coord`. Visible through all overlapping views.
    pub fn set(&self, coord: &[usize], value: T) {
        let addr = self.address(coord);
        self.buffer.borrow_mut()[addr] = value;
    }

    /// Collapses every axis with a numeric coordinate into the offset and
    /// drops it from shape and stride; `None` (or a missing trailing entry)
    /// keeps the axis. The result aliases the same buffer.
    #[must_use]
    pub fn pick(&self, coords: &[Option<usize>]) -> Self {
        let mut shape = Vec::new();
        let mut stride = Vec::new();
        let mut offset = self.offset as isize;
        for k in 0..self.ndim() {
            match coords.get(k).copied().flatten() {
                Some(i) => offset += self.stride[k] * i as isize,
                None => {
                    shape.push(self.shape[k]);
                    stride.push(self.stride[k]);
                }
            }
        }
        Self {
            buffer: Rc::clone(&self.buffer),
            shape,
            stride,
            offset: offset as usize,
        }
    }

    /// Shifts the start of each axis forward by the given amount, shrinking
    /// the shape accordingly; `None` is a no-op for that axis. No copy.
    #[must_use]
    pub fn lo(&self, starts: &[Option<usize>]) -> Self {
        let mut view = self.clone();
        let mut offset = view.offset as isize;
        for k in 0..view.ndim() {
            if let Some(a) = starts.get(k).copied().flatten() {
                let a = a.min(view.shape[k]);
                offset += view.stride[k] * a as isize;
                view.shape[k] -= a;
            }
        }
        view.offset = offset as usize;
        view
    }

    /// Caps each axis at the given length; `None` is a no-op for that axis.
    /// The cap is clamped to the current length. No copy.
    #[must_use]
    pub fn hi(&self, ends: &[Option<usize>]) -> Self {
        let mut view = self.clone();
        for k in 0..view.ndim() {
            if let Some(b) = ends.get(k).copied().flatten() {
                view.shape[k] = view.shape[k].min(b);
            }
        }
        view
    }

    /// Re-samples each axis with an integer stride multiplier. Negative
    /// multipliers reverse traversal and reposition the offset to the former
    /// last element of that axis. `None` or 0 keeps the axis unchanged.
    #[must_use]
    pub fn step(&self, steps: &[Option<isize>]) -> Self {
        let mut view = self.clone();
        let mut offset = view.offset as isize;
        for k in 0..view.ndim() {
            let s = steps.get(k).copied().flatten().unwrap_or(1);
            if s == 0 || s == 1 {
                continue;
            }
            if s < 0 {
                if view.shape[k] > 0 {
                    offset += view.stride[k] * (view.shape[k] as isize - 1);
                }
                let t = s.unsigned_abs();
                view.shape[k] = view.shape[k].div_ceil(t);
            } else {
                view.shape[k] = view.shape[k].div_ceil(s as usize);
            }
            view.stride[k] *= s;
        }
        view.offset = offset as usize;
        view
    }

    /// Permutes shape and stride. Unspecified trailing axes default to their
    /// own index, so `transpose(&[])` is the identity.
    #[must_use]
    pub fn transpose(&self, perm: &[usize]) -> Self {
        let axes: Vec<usize> = (0..self.ndim())
            .map(|k| perm.get(k).copied().unwrap_or(k))
            .collect();
        let shape = axes.iter().map(|&a| self.shape[a]).collect();
        let stride = axes.iter().map(|&a| self.stride[a]).collect();
        Self {
            buffer: Rc::clone(&self.buffer),
            shape,
            stride,
            offset: self.offset,
        }
    }

    /// Canonical axis visitation order: axes sorted by ascending absolute
    /// stride, ties broken by original axis index.
    #[must_use]
    pub fn order(&self) -> Vec<usize> {
        let mut axes: Vec<usize> = (0..self.ndim()).collect();
        axes.sort_by_key(|&k| (self.stride[k].unsigned_abs(), k));
        axes
    }

    /// Returns true if the buffer is laid out contiguously in the canonical
    /// visitation order, i.e. walking axes by ascending absolute stride
    /// touches consecutive addresses.
    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        let mut expected = 1usize;
        for &k in &self.order() {
            if self.shape[k] > 1 && self.stride[k].unsigned_abs() != expected {
                return false;
            }
            expected *= self.shape[k].max(1);
        }
        true
    }

    /// Linearizes the view to a plain vector in row-major logical order
    /// (honoring shape and strides, not raw buffer order).
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        for coord in row_major_coords(self.shape.clone()) {
            out.push(self.get(&coord));
        }
        out
    }

    /// Broadcasts the view to a larger target shape by zero-striding matched
    /// axes. New leading axes and axes of length 1 repeat their data; any
    /// other mismatch is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` has fewer axes than the view or an axis
    /// length that is neither equal to the view's nor broadcastable from 1.
    pub fn broadcast_to(&self, target: &[usize]) -> Result<Self> {
        if target.len() < self.ndim() {
            return Err(CubeError::Internal(format!(
                "cannot broadcast shape {:?} to smaller rank {:?}",
                self.shape, target
            )));
        }
        let lead = target.len() - self.ndim();
        let mut stride = vec![0isize; target.len()];
        for k in lead..target.len() {
            let j = k - lead;
            if self.shape[j] == target[k] {
                stride[k] = self.stride[j];
            } else if self.shape[j] == 1 {
                stride[k] = 0;
            } else {
                return Err(CubeError::Internal(format!(
                    "cannot broadcast shape {:?} to {:?}",
                    self.shape, target
                )));
            }
        }
        Ok(Self {
            buffer: Rc::clone(&self.buffer),
            shape: target.to_vec(),
            stride,
            offset: self.offset,
        })
    }

    /// Copies the view into a fresh contiguous buffer with the same shape.
    #[must_use]
    pub fn materialize(&self) -> Self {
        Self::from_shape(self.to_vec(), self.shape.clone())
    }
}

/// Iterator over all coordinates of a shape in row-major order (last axis
/// fastest). A rank-0 shape yields exactly one empty coordinate.
pub struct RowMajorCoords {
    shape: Vec<usize>,
    next: Option<Vec<usize>>,
}

/// Iterates the coordinates of `shape` in row-major order.
#[must_use]
pub fn row_major_coords(shape: Vec<usize>) -> RowMajorCoords {
    let next = if shape.iter().any(|&n| n == 0) {
        None
    } else {
        Some(vec![0; shape.len()])
    };
    RowMajorCoords { shape, next }
}

impl Iterator for RowMajorCoords {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.clone()?;
        // Odometer increment, last axis fastest
        let mut carry = true;
        let mut next = current.clone();
        for k in (0..self.shape.len()).rev() {
            next[k] += 1;
            if next[k] < self.shape[k] {
                carry = false;
                break;
            }
            next[k] = 0;
        }
        self.next = if carry { None } else { Some(next) };
        Some(current)
    }
}
