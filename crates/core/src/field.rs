//! Two-dimensional scalar grid indexed by (column = x, row = y).
//!
//! A `Field` stores `width * height` f64 values in row-major layout: row `r`
//! holds every sample sharing the `r`-th y coordinate. Values are unbounded so
//! the same type carries plume concentration and signed flow components.
//! Coordinate access clamps to the edge cells instead of wrapping.

use crate::error::SimError;

/// A dense 2D grid of f64 values with edge-clamped cell access.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

fn checked_len(width: usize, height: usize) -> Result<usize, SimError> {
    if width == 0 || height == 0 {
        return Err(SimError::InvalidDimensions);
    }
    width
        .checked_mul(height)
        .ok_or(SimError::InvalidDimensions)
}

impl Field {
    /// Creates a zero-filled field of the given dimensions.
    ///
    /// Returns `SimError::InvalidDimensions` if either dimension is zero
    /// or if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, SimError> {
        Self::filled(width, height, 0.0)
    }

    /// Creates a field with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: f64) -> Result<Self, SimError> {
        let len = checked_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![value; len],
        })
    }

    /// Creates a field by evaluating `f(col, row)` for every cell in
    /// row-major order.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> f64,
    ) -> Result<Self, SimError> {
        let len = checked_len(width, height)?;
        let mut data = Vec::with_capacity(len);
        for row in 0..height {
            for col in 0..width {
                data.push(f(col, row));
            }
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Creates a field from a pre-built row-major data vector, validating
    /// that `data.len() == width * height`.
    pub fn from_data(width: usize, height: usize, data: Vec<f64>) -> Result<Self, SimError> {
        let expected = checked_len(width, height)?;
        if data.len() != expected {
            return Err(SimError::DimensionMismatch {
                lhs_w: width,
                lhs_h: height,
                rhs_w: data.len(),
                rhs_h: 1,
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wraps row-major data whose shape the caller already guarantees.
    pub(crate) fn from_raw(width: usize, height: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    /// Number of columns (x samples).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows (y samples).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Read-only access to the underlying row-major data.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to the underlying row-major data.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    fn index(&self, col: usize, row: usize) -> usize {
        row.min(self.height - 1) * self.width + col.min(self.width - 1)
    }

    /// Gets the value at `(col, row)`. Indices past the last column or row
    /// resolve to the edge cell.
    pub fn get(&self, col: usize, row: usize) -> f64 {
        self.data[self.index(col, row)]
    }

    /// Sets the value at `(col, row)` with the same edge clamping as [`Field::get`].
    pub fn set(&mut self, col: usize, row: usize, value: f64) {
        let idx = self.index(col, row);
        self.data[idx] = value;
    }

    fn ensure_same_shape(&self, other: &Field) -> Result<(), SimError> {
        if self.width != other.width || self.height != other.height {
            return Err(SimError::DimensionMismatch {
                lhs_w: self.width,
                lhs_h: self.height,
                rhs_w: other.width,
                rhs_h: other.height,
            });
        }
        Ok(())
    }

    /// In-place element-wise addition.
    ///
    /// Returns `SimError::DimensionMismatch` if the fields differ in size.
    pub fn add_assign(&mut self, other: &Field) -> Result<(), SimError> {
        self.ensure_same_shape(other)?;
        self.data
            .iter_mut()
            .zip(other.data.iter())
            .for_each(|(a, b)| *a += b);
        Ok(())
    }

    /// Raises every value below `floor` to `floor`.
    pub fn floor_assign(&mut self, floor: f64) {
        self.data.iter_mut().for_each(|v| *v = v.max(floor));
    }

    /// Smallest value in the field.
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest value in the field.
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Arithmetic mean of all cells.
    pub fn mean(&self) -> f64 {
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    /// `(col, row)` of the first cell holding the maximum value.
    pub fn argmax(&self) -> (usize, usize) {
        let mut best = 0;
        for (i, &v) in self.data.iter().enumerate() {
            if v > self.data[best] {
                best = i;
            }
        }
        (best % self.width, best / self.width)
    }

    /// Iterates over all cells yielding `(col, row, value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.data.iter().enumerate().map(|(i, &v)| {
            let col = i % self.width;
            let row = i / self.width;
            (col, row, v)
        })
    }

    /// Copies the grid into nested rows (`rows[row][col]`), the layout
    /// external renderers expect.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.width).map(<[f64]>::to_vec).collect()
    }
}
