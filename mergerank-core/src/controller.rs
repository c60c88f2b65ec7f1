/// Merge-sort controller: top-down merge sort that suspends on unknown comparisons.
///
/// The recursion
///
/// ```text
/// sort(lo, hi):  if hi - lo <= 1 return
///                mid = lo + (hi - lo) / 2
///                sort(lo, mid); sort(mid, hi); merge(lo, mid, hi)
/// ```
///
/// only depends on the run length, so the sequence of merges is precomputed
/// as a post-order schedule and executed one placement at a time. That makes
/// the suspension point explicit: `step()` returns `ControllerStep::Compare`
/// whenever the heads of the two runs have no cached answer, and simply
/// returns the same request again until the cache learns the answer.
///
/// A controller always starts in replay mode. Replay ends the first time a
/// genuinely new decision is supplied (`exit_replay`), so placements that only
/// re-derive cached answers never count towards progress.
use crate::cache::ComparisonCache;
use crate::types::ItemId;

/// One merge of `work[lo..mid]` with `work[mid..hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MergeTask {
    pub lo: usize,
    pub mid: usize,
    pub hi: usize,
}

/// Post-order merge schedule for a run of `len` items.
pub(crate) fn merge_schedule(len: usize) -> Vec<MergeTask> {
    fn visit(lo: usize, hi: usize, out: &mut Vec<MergeTask>) {
        if hi - lo <= 1 {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        visit(lo, mid, out);
        visit(mid, hi, out);
        out.push(MergeTask { lo, mid, hi });
    }

    let mut out = Vec::with_capacity(len.saturating_sub(1));
    visit(0, len, &mut out);
    out
}

/// Result of advancing the controller by one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerStep {
    /// An item was appended to a merged run. `replayed` is true while the
    /// controller is still re-deriving already-known decisions.
    Placed { item: ItemId, replayed: bool },
    /// The heads of the two runs have no cached answer.
    Compare { left: ItemId, right: ItemId },
    /// Every merge is done; `order()` is final.
    Complete,
}

#[derive(Debug, Clone)]
struct ActiveMerge {
    task: MergeTask,
    left: Vec<ItemId>,
    right: Vec<ItemId>,
    li: usize,
    ri: usize,
    merged: Vec<ItemId>,
}

impl ActiveMerge {
    fn new(task: MergeTask, work: &[ItemId]) -> Self {
        ActiveMerge {
            task,
            left: work[task.lo..task.mid].to_vec(),
            right: work[task.mid..task.hi].to_vec(),
            li: 0,
            ri: 0,
            merged: Vec::with_capacity(task.hi - task.lo),
        }
    }

    fn heads(&self) -> (Option<ItemId>, Option<ItemId>) {
        (self.left.get(self.li).copied(), self.right.get(self.ri).copied())
    }

    fn take_left(&mut self) -> ItemId {
        let id = self.left[self.li];
        self.li += 1;
        self.merged.push(id);
        id
    }

    fn take_right(&mut self) -> ItemId {
        let id = self.right[self.ri];
        self.ri += 1;
        self.merged.push(id);
        id
    }
}

#[derive(Debug, Clone)]
pub struct MergeSortController {
    work: Vec<ItemId>,
    schedule: Vec<MergeTask>,
    next_task: usize,
    active: Option<ActiveMerge>,
    replaying: bool,
    complete: bool,
}

impl MergeSortController {
    /// Start (or restart) from the top over a fixed order.
    pub fn new(order: &[ItemId]) -> Self {
        MergeSortController {
            work: order.to_vec(),
            schedule: merge_schedule(order.len()),
            next_task: 0,
            active: None,
            replaying: true,
            complete: false,
        }
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Leave replay mode. Called once a new decision has been supplied.
    pub fn exit_replay(&mut self) {
        self.replaying = false;
    }

    /// The outstanding comparison, if the controller is suspended on one.
    pub fn pending(&self, cache: &ComparisonCache) -> Option<(ItemId, ItemId)> {
        let active = self.active.as_ref()?;
        match active.heads() {
            (Some(left), Some(right)) if cache.winner_between(left, right).is_none() => Some((left, right)),
            _ => None,
        }
    }

    /// Current working order. Fully sorted once `is_complete()`.
    pub fn order(&self) -> &[ItemId] {
        &self.work
    }

    /// Advance by exactly one placement, or report why that is impossible.
    pub fn step(&mut self, cache: &ComparisonCache) -> ControllerStep {
        loop {
            if self.complete {
                return ControllerStep::Complete;
            }

            let Some(active) = self.active.as_mut() else {
                match self.schedule.get(self.next_task) {
                    Some(&task) => {
                        self.active = Some(ActiveMerge::new(task, &self.work));
                        self.next_task += 1;
                    }
                    None => self.complete = true,
                }
                continue;
            };

            let placed = match active.heads() {
                (Some(left), Some(right)) => match cache.winner_between(left, right) {
                    Some(winner) if winner == left => active.take_left(),
                    Some(_) => active.take_right(),
                    None => return ControllerStep::Compare { left, right },
                },
                (Some(_), None) => active.take_left(),
                (None, Some(_)) => active.take_right(),
                (None, None) => {
                    let MergeTask { lo, hi, .. } = active.task;
                    let merged = std::mem::take(&mut active.merged);
                    self.work[lo..hi].copy_from_slice(&merged);
                    self.active = None;
                    continue;
                }
            };

            return ControllerStep::Placed {
                item: placed,
                replayed: self.replaying,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ComparisonKey;

    /// Drive to completion, answering with `prefer` (lower value wins).
    fn sort_with(order: &[ItemId], prefer: impl Fn(ItemId) -> i64) -> (Vec<ItemId>, Vec<(ItemId, ItemId)>) {
        let mut controller = MergeSortController::new(order);
        let mut cache = ComparisonCache::new();
        let mut asked = Vec::new();
        loop {
            match controller.step(&cache) {
                ControllerStep::Placed { .. } => {}
                ControllerStep::Compare { left, right } => {
                    asked.push((left, right));
                    let winner = if prefer(left) <= prefer(right) { left } else { right };
                    cache.set(ComparisonKey::new(left, right), winner).unwrap();
                    controller.exit_replay();
                }
                ControllerStep::Complete => return (controller.order().to_vec(), asked),
            }
        }
    }

    #[test]
    fn test_schedule_matches_recursion() {
        let schedule = merge_schedule(5);
        let triples: Vec<(usize, usize, usize)> = schedule.iter().map(|t| (t.lo, t.mid, t.hi)).collect();
        // sort(0,5): mid 2 -> sort(0,2) -> merge(0,1,2); sort(2,5): mid 3 -> merge(3,4,5), merge(2,3,5)
        assert_eq!(triples, vec![(0, 1, 2), (3, 4, 5), (2, 3, 5), (0, 2, 5)]);
        assert!(merge_schedule(0).is_empty());
        assert!(merge_schedule(1).is_empty());
    }

    #[test]
    fn test_sorts_by_preference() {
        let order = vec![5, 3, 8, 1, 9, 2, 7];
        let (sorted, _) = sort_with(&order, |id| id);
        assert_eq!(sorted, vec![1, 2, 3, 5, 7, 8, 9]);
    }

    #[test]
    fn test_first_questions_follow_recursion() {
        let (_, asked) = sort_with(&[10, 20, 30, 40], |id| id);
        assert_eq!(asked[0], (10, 20));
        assert_eq!(asked[1], (30, 40));
    }

    #[test]
    fn test_suspends_until_answered() {
        let mut controller = MergeSortController::new(&[1, 2]);
        let cache = ComparisonCache::new();
        assert_eq!(controller.step(&cache), ControllerStep::Compare { left: 1, right: 2 });
        assert_eq!(controller.step(&cache), ControllerStep::Compare { left: 1, right: 2 });
        assert_eq!(controller.pending(&cache), Some((1, 2)));
    }

    #[test]
    fn test_replay_from_full_cache_asks_nothing() {
        let order = vec![4, 2, 6, 1, 3];
        let (sorted, asked) = sort_with(&order, |id| id);

        let mut cache = ComparisonCache::new();
        for (a, b) in &asked {
            cache.set(ComparisonKey::new(*a, *b), (*a).min(*b)).unwrap();
        }

        let mut controller = MergeSortController::new(&order);
        loop {
            match controller.step(&cache) {
                ControllerStep::Placed { replayed, .. } => assert!(replayed),
                ControllerStep::Compare { .. } => panic!("replay should not ask"),
                ControllerStep::Complete => break,
            }
        }
        assert_eq!(controller.order(), sorted.as_slice());
    }

    #[test]
    fn test_trivial_inputs_complete_immediately() {
        let cache = ComparisonCache::new();
        assert_eq!(MergeSortController::new(&[]).step(&cache), ControllerStep::Complete);
        let mut single = MergeSortController::new(&[7]);
        assert_eq!(single.step(&cache), ControllerStep::Complete);
        assert_eq!(single.order(), &[7]);
    }
}
