/*
 * Uniform random selection of a lesson from a candidate pool, plus the
 * per-session rep-count roll for drills that carry the `uses_rep_count`
 * flag. Randomness goes through the `RandomnessOperations` trait so the
 * session controller can be driven deterministically in tests; the
 * production implementation (`CoreRandomness`) uses the thread RNG.
 */
use super::models::Exercise;

pub const REP_COUNT_MIN: u8 = 1;
pub const REP_COUNT_MAX: u8 = 11;

#[derive(Debug, PartialEq, Eq)]
pub enum SelectionError {
    EmptyPool,
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionError::EmptyPool => write!(f, "No exercises available to pick from"),
        }
    }
}

impl std::error::Error for SelectionError {}

pub trait RandomnessOperations: Send + Sync {
    /// Uniform index in `[0, upper)`. Callers guarantee `upper > 0`.
    fn index_below(&self, upper: usize) -> usize;
    /// Uniform value in `[low, high]` inclusive.
    fn roll_in_range(&self, low: u8, high: u8) -> u8;
}

pub struct CoreRandomness;

impl CoreRandomness {
    pub fn new() -> Self {
        CoreRandomness
    }
}

impl Default for CoreRandomness {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomnessOperations for CoreRandomness {
    fn index_below(&self, upper: usize) -> usize {
        use rand::Rng;
        rand::rng().random_range(0..upper)
    }

    fn roll_in_range(&self, low: u8, high: u8) -> u8 {
        use rand::Rng;
        rand::rng().random_range(low..=high)
    }
}

/// Picks one exercise uniformly from the pool. Repeats across consecutive
/// picks are allowed; the pool order does not bias the result.
pub fn pick_random<'a>(
    pool: &[&'a Exercise],
    randomness: &dyn RandomnessOperations,
) -> Result<&'a Exercise, SelectionError> {
    if pool.is_empty() {
        return Err(SelectionError::EmptyPool);
    }
    let index = randomness.index_below(pool.len());
    let picked = pool[index];
    log::debug!(
        "Selection: Picked '{}' ({} of {} candidates).",
        picked.title,
        index + 1,
        pool.len()
    );
    Ok(picked)
}

/// Rolls a fresh rep count for the given exercise, or returns None when the
/// drill does not use one. Never caches: every call on a flagged exercise
/// produces an independent roll.
pub fn roll_rep_count(
    exercise: &Exercise,
    randomness: &dyn RandomnessOperations,
) -> Option<u8> {
    if !exercise.uses_rep_count {
        return None;
    }
    let value = randomness.roll_in_range(REP_COUNT_MIN, REP_COUNT_MAX);
    log::debug!("Selection: Rolled rep count {value} for '{}'.", exercise.title);
    Some(value)
}
