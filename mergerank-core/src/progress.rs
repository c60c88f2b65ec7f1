/// Progress estimation.
///
/// The denominator is computed once from the starting item count and never
/// recalculated. It is an upper bound: cache hits during replay and removed
/// items both reduce the real number of questions.
use crate::constants::MAX_PERCENT_BEFORE_COMPLETE;

/// Comparisons-and-placements bound for merge-sorting `num_items` items.
///
/// Each merge level of a run of length L contributes L (its left plus right
/// halves); runs of length <= 1 contribute nothing.
pub fn compute_total_battles(num_items: usize) -> usize {
    if num_items <= 1 {
        return 0;
    }
    let mid = num_items.div_ceil(2);
    num_items + compute_total_battles(mid) + compute_total_battles(num_items - mid)
}

/// Percent complete, 0..=100.
///
/// 100 only once `complete` is true. Otherwise `floor(settled / total * 100)`
/// capped at 99. A zero `total_battles` (0 or 1 items) counts as complete.
pub fn percent_complete(settled_count: usize, total_battles: usize, complete: bool) -> u8 {
    if complete || total_battles == 0 {
        return 100;
    }
    let percent = (settled_count.saturating_mul(100) / total_battles).min(MAX_PERCENT_BEFORE_COMPLETE);
    percent as u8
}
