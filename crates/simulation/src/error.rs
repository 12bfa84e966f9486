// ---------------------------------------------------------------------------
// GrowthError: fatal configuration errors for a growth run
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors that abort a simulation run.
///
/// Supply shortfalls and failed seed searches are not errors; they are logged
/// and recorded in the step report instead.
#[derive(Debug, Clone, PartialEq)]
pub enum GrowthError {
    /// The incentive transform was asked for an index outside its table.
    InvalidIncentiveIndex { index: i64, size: usize },
    /// A region ended up without any usable patch size.
    EmptyPatchPool { region: i32 },
    /// A (potential) subregion has no entry in the coefficient table.
    MissingCoefficients { region: i32 },
    /// A region id was referenced that the run does not know about.
    UnknownRegion { region: i32 },
    /// A layer does not have one value per grid cell.
    LayerSizeMismatch {
        layer: String,
        expected: usize,
        found: usize,
    },
    /// A cell coordinate fell outside the grid.
    CellOutOfBounds { row: usize, col: usize },
    /// A run parameter is out of range or not finite.
    InvalidParameter(String),
    /// A scenario file could not be read or parsed.
    Scenario(String),
}

impl fmt::Display for GrowthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrowthError::InvalidIncentiveIndex { index, size } => write!(
                f,
                "Incentive lookup index {index} is outside the table (size {size}); \
                 check the incentive exponent"
            ),
            GrowthError::EmptyPatchPool { region } => {
                write!(f, "Region {region} has no patch sizes to sample from")
            }
            GrowthError::MissingCoefficients { region } => {
                write!(f, "No potential coefficients for subregion {region}")
            }
            GrowthError::UnknownRegion { region } => write!(f, "Unknown subregion {region}"),
            GrowthError::LayerSizeMismatch {
                layer,
                expected,
                found,
            } => write!(
                f,
                "Layer '{layer}' has {found} cells, but the grid has {expected}"
            ),
            GrowthError::CellOutOfBounds { row, col } => {
                write!(f, "Cell ({row}, {col}) is outside the grid")
            }
            GrowthError::InvalidParameter(msg) => write!(f, "Invalid parameter: {msg}"),
            GrowthError::Scenario(msg) => write!(f, "Scenario error: {msg}"),
        }
    }
}

impl std::error::Error for GrowthError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_incentive_index() {
        let err = GrowthError::InvalidIncentiveIndex {
            index: 1200,
            size: 1001,
        };
        let msg = format!("{err}");
        assert!(msg.contains("1200"), "got: {msg}");
        assert!(msg.contains("1001"), "got: {msg}");
    }

    #[test]
    fn test_display_layer_mismatch() {
        let err = GrowthError::LayerSizeMismatch {
            layer: "weight".to_string(),
            expected: 100,
            found: 99,
        };
        let msg = format!("{err}");
        assert!(msg.contains("weight"), "got: {msg}");
        assert!(msg.contains("99"), "got: {msg}");
    }

    #[test]
    fn test_is_error_trait() {
        let err: Box<dyn std::error::Error> =
            Box::new(GrowthError::InvalidParameter("steps".into()));
        assert!(err.to_string().contains("steps"));
    }
}
