use rand::Rng;

use crate::growth_params::SeedSearch;
use crate::undeveloped_index::{CellBucket, UndevelopedCell};

/// Draw an index into a region's undeveloped-cell bucket, or `None` when the
/// bucket is empty.
pub fn select_seed(bucket: &CellBucket, strategy: SeedSearch, rng: &mut impl Rng) -> Option<usize> {
    if bucket.is_empty() {
        return None;
    }
    let i = match strategy {
        SeedSearch::Random => rng.gen_range(0..bucket.len()),
        SeedSearch::Probability => search_cumulative(bucket.entries(), rng.gen::<f64>()),
    };
    Some(i)
}

/// Smallest index whose cumulative probability is `>= draw`. Draws below the
/// first entry land on 0, draws above the last on the last index.
pub fn search_cumulative(entries: &[UndevelopedCell], draw: f64) -> usize {
    let i = entries.partition_point(|e| e.cumulative < draw);
    i.min(entries.len().saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim_rng::SimRng;
    use crate::storage::GridDims;

    fn entries(cumulative: &[f64]) -> Vec<UndevelopedCell> {
        let dims = GridDims::new(1, cumulative.len());
        cumulative
            .iter()
            .zip(dims.cells())
            .map(|(&c, cell)| UndevelopedCell {
                cell,
                probability: 0.0,
                cumulative: c,
                tried: false,
            })
            .collect()
    }

    #[test]
    fn test_search_finds_first_covering_entry() {
        let e = entries(&[0.1, 0.4, 0.4, 0.9, 1.0]);
        assert_eq!(search_cumulative(&e, 0.0), 0);
        assert_eq!(search_cumulative(&e, 0.05), 0);
        assert_eq!(search_cumulative(&e, 0.1), 0);
        assert_eq!(search_cumulative(&e, 0.2), 1);
        assert_eq!(search_cumulative(&e, 0.4), 1);
        assert_eq!(search_cumulative(&e, 0.95), 4);
    }

    #[test]
    fn test_search_clamps_above_last() {
        let e = entries(&[0.5, 0.8]);
        assert_eq!(search_cumulative(&e, 0.99), 1);
        assert_eq!(search_cumulative(&e, 5.0), 1);
    }

    #[test]
    fn test_empty_bucket_has_no_seed() {
        let mut rng = SimRng::from_seed_u64(3);
        let bucket = CellBucket::default();
        assert_eq!(select_seed(&bucket, SeedSearch::Random, &mut rng.0), None);
        assert_eq!(select_seed(&bucket, SeedSearch::Probability, &mut rng.0), None);
    }
}
