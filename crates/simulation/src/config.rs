/// Consecutive candidate passes without an acceptance before the stall
/// strategy kicks in during patch growth.
pub const MAX_CANDIDATE_ITER: u32 = 100;

/// Unsuccessful seed attempts (per cell still to convert) after which seeds
/// that were already tried this step become eligible again.
pub const MAX_SEED_ITER: u64 = 20;

/// Consecutive unsuccessful seed attempts after which a region gives up on
/// the rest of its demand for the current step.
pub const DEFAULT_MAX_FAILED_SEEDS: u64 = 1000;

/// Number of points the incentive lookup table is tabulated at over `[0, 1]`.
pub const INCENTIVE_TABLE_SIZE: usize = 1001;

/// Growth factor applied to an undeveloped-cell bucket when it runs full.
pub const BUCKET_GROWTH_FACTOR: f64 = 1.25;

/// Initial capacity of a per-region undeveloped-cell bucket.
pub const BUCKET_INITIAL_CAPACITY: usize = 1024;

/// Seed used when a run does not specify one.
pub const DEFAULT_SEED: u64 = 42;

/// Sentinel for a null cell in integer layers exchanged with collaborators.
pub const NULL_CELL: i32 = i32::MIN;
