/// Sort session orchestrator.
///
/// Pure computation: no async, no IO. The caller asks for the next `Step`,
/// shows the two items to a human (or anything else), and feeds the winner
/// back with `resolve`. Persistence and progress display are delegated to a
/// `SessionObserver`.
///
/// Items are identified by caller-provided `i64` IDs.
use std::collections::HashSet;

use rand::Rng;

use crate::cache::{ComparisonCache, ComparisonKey};
use crate::codec::{self, SerializedState, StateView};
use crate::controller::{ControllerStep, MergeSortController};
use crate::error::SortError;
use crate::history::{History, HistorySnapshot};
use crate::progress::{compute_total_battles, percent_complete};
use crate::randomizer::shuffled_order;
use crate::types::{ComparisonRequest, Item, ItemId, ProgressUpdate, Step};

/// Host callbacks. All methods default to no-ops.
pub trait SessionObserver {
    /// Counters changed.
    fn on_progress(&mut self, _update: ProgressUpdate) {}

    /// State changed and should be persisted by the host.
    fn on_save(&mut self, _state: &SerializedState) {}

    /// The in-flight recursion was discarded (undo, reset or removal).
    /// The next `step()` replays from the top.
    fn on_restart(&mut self) {}
}

/// Observer that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

pub struct SortSession<O: SessionObserver = NoopObserver> {
    /// Working item list. Shrinks on removal.
    items: Vec<Item>,
    /// Fixed at first start; only removal edits it.
    shuffled_order: Vec<ItemId>,
    cache: ComparisonCache,
    comparison_count: usize,
    total_battles: usize,
    settled_count: usize,
    history: History,
    controller: MergeSortController,
    completion_reported: bool,
    observer: O,
}

fn check_unique(items: &[Item]) -> Result<(), SortError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.id) {
            return Err(SortError::DuplicateItemId(item.id));
        }
    }
    Ok(())
}

impl SortSession<NoopObserver> {
    /// Start a fresh session. This is the only place a shuffle happens.
    pub fn new<R: Rng + ?Sized>(items: Vec<Item>, rng: &mut R) -> Result<Self, SortError> {
        check_unique(&items)?;
        let ids: Vec<ItemId> = items.iter().map(|item| item.id).collect();
        let order = shuffled_order(&ids, rng);
        let total_battles = compute_total_battles(items.len());

        tracing::debug!(items = items.len(), total_battles, "starting new sort session");

        Ok(SortSession {
            controller: MergeSortController::new(&order),
            items,
            shuffled_order: order,
            cache: ComparisonCache::new(),
            comparison_count: 0,
            total_battles,
            settled_count: 0,
            history: History::new(),
            completion_reported: false,
            observer: NoopObserver,
        })
    }

    /// Resume from a persisted blob, validated against the current items.
    ///
    /// Falls back to a fresh (shuffled) session when the blob carries no
    /// usable order. Current items the blob never saw are appended to the
    /// stored order in input order.
    pub fn resume<R: Rng + ?Sized>(
        items: Vec<Item>,
        state: &SerializedState,
        rng: &mut R,
    ) -> Result<Self, SortError> {
        check_unique(&items)?;
        let decoded = codec::deserialize(state, &items);
        if decoded.shuffled_order.is_empty() {
            tracing::debug!("saved state has no usable order, starting fresh");
            return Self::new(items, rng);
        }

        let mut order = decoded.shuffled_order;
        let known: HashSet<ItemId> = order.iter().copied().collect();
        let appended: Vec<ItemId> = items
            .iter()
            .map(|item| item.id)
            .filter(|id| !known.contains(id))
            .collect();
        if !appended.is_empty() {
            tracing::debug!(count = appended.len(), "appending items not present in saved order");
        }
        order.extend(appended);

        let total_battles = if decoded.total_battles == 0 {
            compute_total_battles(items.len())
        } else {
            decoded.total_battles
        };

        tracing::debug!(
            items = items.len(),
            cached = decoded.cache.len(),
            settled = decoded.settled_count,
            "resuming sort session"
        );

        Ok(SortSession {
            controller: MergeSortController::new(&order),
            items,
            shuffled_order: order,
            comparison_count: decoded.cache.len(),
            cache: decoded.cache,
            total_battles,
            settled_count: decoded.settled_count,
            history: decoded.history,
            completion_reported: false,
            observer: NoopObserver,
        })
    }
}

impl<O: SessionObserver> SortSession<O> {
    /// Replace the observer, keeping all state.
    pub fn with_observer<P: SessionObserver>(self, observer: P) -> SortSession<P> {
        SortSession {
            items: self.items,
            shuffled_order: self.shuffled_order,
            cache: self.cache,
            comparison_count: self.comparison_count,
            total_battles: self.total_battles,
            settled_count: self.settled_count,
            history: self.history,
            controller: self.controller,
            completion_reported: self.completion_reported,
            observer,
        }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn shuffled_order(&self) -> &[ItemId] {
        &self.shuffled_order
    }

    pub fn cache(&self) -> &ComparisonCache {
        &self.cache
    }

    pub fn comparison_count(&self) -> usize {
        self.comparison_count
    }

    pub fn total_battles(&self) -> usize {
        self.total_battles
    }

    pub fn settled_count(&self) -> usize {
        self.settled_count
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.controller.is_complete()
    }

    pub fn percent_complete(&self) -> u8 {
        percent_complete(self.settled_count, self.total_battles, self.is_complete())
    }

    pub fn progress(&self) -> ProgressUpdate {
        ProgressUpdate {
            comparison_count: self.comparison_count,
            percent_complete: self.percent_complete(),
        }
    }

    /// Encode the current state for the host to store.
    pub fn to_state(&self) -> SerializedState {
        codec::serialize(&StateView {
            items: &self.items,
            cache: &self.cache,
            history: &self.history,
            shuffled_order: &self.shuffled_order,
            total_battles: self.total_battles,
            settled_count: self.settled_count,
        })
    }

    fn notify_progress(&mut self) {
        let update = self.progress();
        self.observer.on_progress(update);
    }

    fn notify_save(&mut self) {
        let state = self.to_state();
        self.observer.on_save(&state);
    }

    fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            cache: self.cache.clone(),
            comparison_count: self.comparison_count,
            settled_count: self.settled_count,
            total_battles: self.total_battles,
        }
    }

    /// Discard the in-flight recursion, report the new state, then ask the
    /// host to drive again. The controller is rebuilt first so callbacks
    /// never see the old run's completion.
    fn restart(&mut self) {
        tracing::debug!(cached = self.cache.len(), "restarting merge sort from the top");
        self.controller = MergeSortController::new(&self.shuffled_order);
        self.completion_reported = false;
        self.notify_progress();
        self.notify_save();
        self.observer.on_restart();
    }

    fn request(&self, left: ItemId, right: ItemId) -> Step {
        match (self.item(left), self.item(right)) {
            (Some(l), Some(r)) => Step::Compare(ComparisonRequest {
                left: l.clone(),
                right: r.clone(),
            }),
            // The order only ever holds ids from `items`.
            _ => unreachable!("comparison references an item outside the session"),
        }
    }

    fn final_order(&self) -> Vec<Item> {
        self.controller
            .order()
            .iter()
            .filter_map(|&id| self.item(id).cloned())
            .collect()
    }

    /// Run until the next unresolved comparison or completion.
    ///
    /// While a comparison is outstanding this returns the same request again.
    pub fn step(&mut self) -> Step {
        loop {
            match self.controller.step(&self.cache) {
                ControllerStep::Placed { replayed, .. } => {
                    if !replayed {
                        self.settled_count += 1;
                        self.notify_progress();
                        self.notify_save();
                    }
                }
                ControllerStep::Compare { left, right } => return self.request(left, right),
                ControllerStep::Complete => {
                    if !self.completion_reported {
                        self.completion_reported = true;
                        tracing::debug!(comparisons = self.comparison_count, "sort complete");
                        self.notify_progress();
                        self.notify_save();
                    }
                    return Step::Complete(self.final_order());
                }
            }
        }
    }

    /// Commit a decision for the outstanding comparison and continue.
    ///
    /// `winner` must be one of the two candidates; anything else is rejected
    /// and nothing is recorded.
    pub fn resolve(&mut self, winner: ItemId) -> Result<Step, SortError> {
        // Make sure the controller has reached its suspension point.
        if let Step::Complete(_) = self.step() {
            return Err(SortError::NoPendingComparison);
        }
        let (left, right) = self
            .controller
            .pending(&self.cache)
            .ok_or(SortError::NoPendingComparison)?;
        if winner != left && winner != right {
            return Err(SortError::WinnerNotCandidate { winner, left, right });
        }

        self.controller.exit_replay();
        let snapshot = self.snapshot();
        self.history.push(snapshot);
        self.cache.set(ComparisonKey::new(left, right), winner)?;
        self.comparison_count += 1;

        tracing::debug!(left, right, winner, count = self.comparison_count, "decision recorded");

        Ok(self.step())
    }

    /// Drive to completion with a synchronous decision provider.
    ///
    /// The provider receives `(left, right)` and returns the winner's id.
    pub fn run_with<F>(&mut self, mut provider: F) -> Result<Vec<Item>, SortError>
    where
        F: FnMut(&Item, &Item) -> ItemId,
    {
        let mut step = self.step();
        loop {
            match step {
                Step::Complete(order) => return Ok(order),
                Step::Compare(request) => {
                    let winner = provider(&request.left, &request.right);
                    step = self.resolve(winner)?;
                }
            }
        }
    }

    /// Restore the state from before the most recent change.
    ///
    /// Cache entries that mention items removed since the snapshot was taken
    /// are pruned and `comparison_count` is recounted from the cache. Removed
    /// items are never brought back.
    pub fn undo(&mut self) -> Result<(), SortError> {
        let snapshot = self.history.pop().ok_or(SortError::NothingToUndo)?;

        self.cache = snapshot.cache;
        self.comparison_count = snapshot.comparison_count;
        self.settled_count = snapshot.settled_count;
        self.total_battles = snapshot.total_battles;

        let current: HashSet<ItemId> = self.items.iter().map(|item| item.id).collect();
        let pruned = self.cache.retain_items(|id| current.contains(&id));
        if pruned > 0 {
            tracing::debug!(pruned, "undo dropped cached decisions for removed items");
        }
        // Every recorded decision is exactly one cache entry.
        self.comparison_count = self.cache.len();

        tracing::debug!(count = self.comparison_count, "undo");
        self.restart();
        Ok(())
    }

    /// Take an item out of the session mid-sort.
    pub fn remove_item(&mut self, id: ItemId) -> Result<(), SortError> {
        let position = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(SortError::UnknownItem(id))?;

        let snapshot = self.snapshot();
        self.history.push(snapshot);

        self.items.remove(position);
        self.shuffled_order.retain(|&other| other != id);
        let dropped = self.cache.delete_all_referencing(id);
        self.comparison_count = self.cache.len();

        tracing::debug!(id, dropped, remaining = self.items.len(), "item removed");
        self.restart();
        Ok(())
    }

    /// Throw away every decision and start over with a new shuffle.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let ids: Vec<ItemId> = self.items.iter().map(|item| item.id).collect();
        self.shuffled_order = shuffled_order(&ids, rng);
        self.cache = ComparisonCache::new();
        self.comparison_count = 0;
        self.total_battles = compute_total_battles(self.items.len());
        self.settled_count = 0;
        self.history.clear();

        tracing::debug!(items = self.items.len(), "session reset");
        self.restart();
    }
}
