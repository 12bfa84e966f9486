//! Grid storage: dense per-cell layers addressed by a validated cell index.
//!
//! Every layer the engine reads or writes (developed state, subregion ids,
//! development pressure, predictors, probability, weights) goes through the
//! narrow [`GridStorage`] contract, so a paged or file-backed layer can be
//! swapped in without touching the growth code.

use serde::{Deserialize, Serialize};

use crate::error::GrowthError;

// ---------------------------------------------------------------------------
// Grid dimensions and cell addressing
// ---------------------------------------------------------------------------

/// Row/column extent of the simulation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDims {
    pub rows: usize,
    pub cols: usize,
}

/// Linear index of a cell. Only [`GridDims`] hands these out, so holding one
/// means it is inside the grid it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(usize);

impl CellId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl GridDims {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> Option<CellId> {
        self.in_bounds(row, col)
            .then_some(CellId(row * self.cols + col))
    }

    pub fn cell_checked(&self, row: usize, col: usize) -> Result<CellId, GrowthError> {
        self.cell(row, col)
            .ok_or(GrowthError::CellOutOfBounds { row, col })
    }

    /// Resolve a raw linear index, e.g. one read back from a snapshot.
    pub fn cell_from_index(&self, index: usize) -> Option<CellId> {
        (index < self.len()).then_some(CellId(index))
    }

    #[inline]
    pub fn row_col(&self, cell: CellId) -> (usize, usize) {
        (cell.0 / self.cols, cell.0 % self.cols)
    }

    /// The cell at `(row + dr, col + dc)`, or `None` when that falls off the grid.
    #[inline]
    pub fn offset(&self, cell: CellId, dr: i32, dc: i32) -> Option<CellId> {
        let (row, col) = self.row_col(cell);
        let r = row as i64 + dr as i64;
        let c = col as i64 + dc as i64;
        if r < 0 || c < 0 {
            return None;
        }
        self.cell(r as usize, c as usize)
    }

    pub fn cells(&self) -> impl Iterator<Item = CellId> {
        (0..self.len()).map(CellId)
    }
}

// ---------------------------------------------------------------------------
// Cell values with a null representation
// ---------------------------------------------------------------------------

/// A value type that can be stored in a layer, with an in-band null.
pub trait CellValue: Copy + PartialEq + std::fmt::Debug {
    const NULL: Self;

    fn is_null(self) -> bool;
}

impl CellValue for i32 {
    const NULL: Self = crate::config::NULL_CELL;

    #[inline]
    fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl CellValue for f32 {
    const NULL: Self = f32::NAN;

    #[inline]
    fn is_null(self) -> bool {
        self.is_nan()
    }
}

// ---------------------------------------------------------------------------
// Storage contract
// ---------------------------------------------------------------------------

/// Per-cell get/put/flush access to one layer.
pub trait GridStorage<T: CellValue> {
    fn dims(&self) -> GridDims;

    /// `None` means the cell is null (outside the study area for this layer).
    fn get(&self, cell: CellId) -> Option<T>;

    fn put(&mut self, cell: CellId, value: Option<T>);

    /// Push pending writes to the backing store.
    fn flush(&mut self);

    fn get_rc(&self, row: usize, col: usize) -> Option<T> {
        self.dims().cell(row, col).and_then(|cell| self.get(cell))
    }
}

/// In-memory layer holding one value per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer<T: CellValue> {
    dims: GridDims,
    values: Vec<T>,
    dirty: bool,
}

impl<T: CellValue> DenseLayer<T> {
    pub fn filled(dims: GridDims, value: T) -> Self {
        Self {
            dims,
            values: vec![value; dims.len()],
            dirty: false,
        }
    }

    pub fn null(dims: GridDims) -> Self {
        Self::filled(dims, T::NULL)
    }

    /// Wrap a raw row-major buffer; nulls are encoded in-band.
    pub fn from_values(
        name: &str,
        dims: GridDims,
        values: Vec<T>,
    ) -> Result<Self, GrowthError> {
        if values.len() != dims.len() {
            return Err(GrowthError::LayerSizeMismatch {
                layer: name.to_string(),
                expected: dims.len(),
                found: values.len(),
            });
        }
        Ok(Self {
            dims,
            values,
            dirty: false,
        })
    }

    /// Raw row-major values, nulls included.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn count_where(&self, mut pred: impl FnMut(T) -> bool) -> usize {
        self.values
            .iter()
            .filter(|v| !v.is_null() && pred(**v))
            .count()
    }
}

impl<T: CellValue> GridStorage<T> for DenseLayer<T> {
    #[inline]
    fn dims(&self) -> GridDims {
        self.dims
    }

    #[inline]
    fn get(&self, cell: CellId) -> Option<T> {
        let v = self.values[cell.index()];
        (!v.is_null()).then_some(v)
    }

    #[inline]
    fn put(&mut self, cell: CellId, value: Option<T>) {
        self.values[cell.index()] = value.unwrap_or(T::NULL);
        self.dirty = true;
    }

    fn flush(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_roundtrip() {
        let dims = GridDims::new(7, 5);
        for row in 0..7 {
            for col in 0..5 {
                let cell = dims.cell(row, col).unwrap();
                assert_eq!(dims.row_col(cell), (row, col));
            }
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let dims = GridDims::new(4, 4);
        assert!(dims.cell(4, 0).is_none());
        assert!(dims.cell(0, 4).is_none());
        assert_eq!(
            dims.cell_checked(9, 1),
            Err(GrowthError::CellOutOfBounds { row: 9, col: 1 })
        );
        assert!(dims.cell_from_index(16).is_none());
    }

    #[test]
    fn test_offset_clips_at_edges() {
        let dims = GridDims::new(3, 3);
        let corner = dims.cell(0, 0).unwrap();
        assert!(dims.offset(corner, -1, 0).is_none());
        assert!(dims.offset(corner, 0, -1).is_none());
        assert_eq!(dims.offset(corner, 1, 1), dims.cell(1, 1));
        let far = dims.cell(2, 2).unwrap();
        assert!(dims.offset(far, 1, 0).is_none());
    }

    #[test]
    fn test_null_roundtrip() {
        let dims = GridDims::new(2, 2);
        let mut layer = DenseLayer::<f32>::filled(dims, 0.5);
        let cell = dims.cell(1, 0).unwrap();
        assert_eq!(layer.get(cell), Some(0.5));
        layer.put(cell, None);
        assert_eq!(layer.get(cell), None);
        assert!(layer.is_dirty());
        layer.flush();
        assert!(!layer.is_dirty());
        assert_eq!(layer.get_rc(1, 0), None);
        assert_eq!(layer.get_rc(5, 5), None);
    }

    #[test]
    fn test_from_values_checks_length() {
        let dims = GridDims::new(2, 3);
        let err = DenseLayer::from_values("subregion", dims, vec![1i32; 5]).unwrap_err();
        assert!(matches!(err, GrowthError::LayerSizeMismatch { found: 5, .. }));
        assert!(DenseLayer::from_values("subregion", dims, vec![1i32; 6]).is_ok());
    }

    #[test]
    fn test_count_where_skips_nulls() {
        let dims = GridDims::new(1, 4);
        let layer =
            DenseLayer::from_values("developed", dims, vec![-1, 0, i32::MIN, -1]).unwrap();
        assert_eq!(layer.count_where(|v| v == -1), 2);
        assert_eq!(layer.count_where(|_| true), 3);
    }
}
