use bevy::prelude::*;

use crate::error::GrowthError;
use crate::growth_params::Neighborhood;
use crate::storage::{CellId, DenseLayer, GridDims, GridStorage};

/// `developed` value of a cell that can still be converted.
pub const UNDEVELOPED: i32 = -1;

/// `developed` value of a cell that was already built up before step 1.
pub const DEVELOPED_AT_START: i32 = 0;

/// All per-cell layers of a run.
///
/// `developed` holds `-1` for undeveloped cells, the 1-based step of conversion
/// for cells converted during the run, `0` for initially developed cells, and
/// null for cells outside the study area.
#[derive(Resource, Debug, Clone)]
pub struct Landscape {
    dims: GridDims,
    pub developed: DenseLayer<i32>,
    pub subregion: DenseLayer<i32>,
    /// Region used for coefficient lookup when it differs from `subregion`.
    pub potential_subregion: Option<DenseLayer<i32>>,
    pub pressure: DenseLayer<f32>,
    pub predictor: DenseLayer<f32>,
    pub probability: DenseLayer<f32>,
    pub weight: Option<DenseLayer<f32>>,
}

impl Landscape {
    /// A landscape where every cell is undeveloped, in region 1, with zero
    /// pressure and predictor.
    pub fn open(dims: GridDims) -> Self {
        Self {
            dims,
            developed: DenseLayer::filled(dims, UNDEVELOPED),
            subregion: DenseLayer::filled(dims, 1),
            potential_subregion: None,
            pressure: DenseLayer::filled(dims, 0.0),
            predictor: DenseLayer::filled(dims, 0.0),
            probability: DenseLayer::filled(dims, 0.0),
            weight: None,
        }
    }

    /// Assemble a landscape from loaded layers, checking they share the grid.
    pub fn from_layers(
        developed: DenseLayer<i32>,
        subregion: DenseLayer<i32>,
        potential_subregion: Option<DenseLayer<i32>>,
        pressure: DenseLayer<f32>,
        predictor: DenseLayer<f32>,
        weight: Option<DenseLayer<f32>>,
    ) -> Result<Self, GrowthError> {
        let dims = developed.dims();
        let check = |name: &str, other: GridDims| {
            if other == dims {
                Ok(())
            } else {
                Err(GrowthError::LayerSizeMismatch {
                    layer: name.to_string(),
                    expected: dims.len(),
                    found: other.len(),
                })
            }
        };
        check("subregion", subregion.dims())?;
        if let Some(layer) = &potential_subregion {
            check("potential_subregion", layer.dims())?;
        }
        check("pressure", pressure.dims())?;
        check("predictor", predictor.dims())?;
        if let Some(layer) = &weight {
            check("weight", layer.dims())?;
        }
        Ok(Self {
            dims,
            developed,
            subregion,
            potential_subregion,
            pressure,
            predictor,
            probability: DenseLayer::filled(dims, 0.0),
            weight,
        })
    }

    #[inline]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    #[inline]
    pub fn developed_at(&self, cell: CellId) -> Option<i32> {
        self.developed.get(cell)
    }

    /// True only for cells inside the study area that are not yet developed.
    #[inline]
    pub fn is_undeveloped(&self, cell: CellId) -> bool {
        self.developed.get(cell) == Some(UNDEVELOPED)
    }

    /// Convert a cell at `step`. Conversion happens once; a cell that is
    /// already developed or excluded is left untouched and `false` is returned.
    pub fn mark_developed(&mut self, cell: CellId, step: u32) -> bool {
        if !self.is_undeveloped(cell) {
            return false;
        }
        self.developed.put(cell, Some(step as i32));
        true
    }

    #[inline]
    pub fn region_of(&self, cell: CellId) -> Option<i32> {
        self.subregion.get(cell)
    }

    /// Region whose coefficients drive this cell's probability.
    #[inline]
    pub fn potential_region_of(&self, cell: CellId) -> Option<i32> {
        match &self.potential_subregion {
            Some(layer) => layer.get(cell),
            None => self.subregion.get(cell),
        }
    }

    #[inline]
    pub fn pressure_at(&self, cell: CellId) -> f64 {
        self.pressure.get(cell).unwrap_or(0.0) as f64
    }

    #[inline]
    pub fn predictor_at(&self, cell: CellId) -> f64 {
        self.predictor.get(cell).unwrap_or(0.0) as f64
    }

    /// Scenario weight; absent layers and null cells are neutral (0).
    #[inline]
    pub fn weight_at(&self, cell: CellId) -> f64 {
        self.weight
            .as_ref()
            .and_then(|layer| layer.get(cell))
            .unwrap_or(0.0) as f64
    }

    /// Probability written by the last recompute; 0 for cells never scored.
    #[inline]
    pub fn probability_at(&self, cell: CellId) -> f64 {
        self.probability.get(cell).unwrap_or(0.0) as f64
    }

    /// Returns up to 8 neighbors and the count of valid entries.
    /// Use `&result[..count]` to iterate over valid neighbors.
    pub fn neighbors(&self, cell: CellId, neighborhood: Neighborhood) -> ([CellId; 8], usize) {
        let mut result = [cell; 8];
        let mut count = 0;
        for &(dr, dc) in neighborhood.offsets() {
            if let Some(n) = self.dims.offset(cell, dr, dc) {
                result[count] = n;
                count += 1;
            }
        }
        (result, count)
    }

    pub fn count_undeveloped(&self) -> usize {
        self.developed.count_where(|v| v == UNDEVELOPED)
    }

    pub fn count_developed_at(&self, step: u32) -> usize {
        self.developed.count_where(|v| v == step as i32)
    }

    /// Undeveloped cells in one subregion.
    pub fn count_undeveloped_in(&self, region: i32) -> usize {
        self.dims
            .cells()
            .filter(|&c| self.is_undeveloped(c) && self.region_of(c) == Some(region))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_landscape_is_undeveloped() {
        let land = Landscape::open(GridDims::new(4, 5));
        assert_eq!(land.count_undeveloped(), 20);
        assert_eq!(land.count_developed_at(1), 0);
    }

    #[test]
    fn test_mark_developed_only_once() {
        let mut land = Landscape::open(GridDims::new(2, 2));
        let cell = land.dims().cell(1, 1).unwrap();
        assert!(land.mark_developed(cell, 3));
        assert_eq!(land.developed_at(cell), Some(3));
        assert!(!land.mark_developed(cell, 4));
        assert_eq!(land.developed_at(cell), Some(3));
    }

    #[test]
    fn test_excluded_cells_never_develop() {
        let mut land = Landscape::open(GridDims::new(2, 2));
        let cell = land.dims().cell(0, 0).unwrap();
        land.developed.put(cell, None);
        assert!(!land.is_undeveloped(cell));
        assert!(!land.mark_developed(cell, 1));
        assert_eq!(land.developed_at(cell), None);
        assert_eq!(land.count_undeveloped(), 3);
    }

    #[test]
    fn test_neighbors_at_corner_and_center() {
        let land = Landscape::open(GridDims::new(3, 3));
        let corner = land.dims().cell(0, 0).unwrap();
        let center = land.dims().cell(1, 1).unwrap();
        assert_eq!(land.neighbors(corner, Neighborhood::Four).1, 2);
        assert_eq!(land.neighbors(corner, Neighborhood::Eight).1, 3);
        assert_eq!(land.neighbors(center, Neighborhood::Four).1, 4);
        assert_eq!(land.neighbors(center, Neighborhood::Eight).1, 8);
    }

    #[test]
    fn test_potential_region_falls_back_to_subregion() {
        let dims = GridDims::new(1, 2);
        let mut land = Landscape::open(dims);
        let cell = dims.cell(0, 1).unwrap();
        assert_eq!(land.potential_region_of(cell), Some(1));
        land.potential_subregion = Some(DenseLayer::filled(dims, 7));
        assert_eq!(land.potential_region_of(cell), Some(7));
        assert_eq!(land.region_of(cell), Some(1));
    }

    #[test]
    fn test_from_layers_rejects_mismatched_dims() {
        let dims = GridDims::new(2, 2);
        let other = GridDims::new(3, 2);
        let err = Landscape::from_layers(
            DenseLayer::filled(dims, UNDEVELOPED),
            DenseLayer::filled(dims, 1),
            None,
            DenseLayer::filled(other, 0.0),
            DenseLayer::filled(dims, 0.0),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, GrowthError::LayerSizeMismatch { .. }));
    }
}
