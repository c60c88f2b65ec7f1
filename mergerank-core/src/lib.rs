/// mergerank-core: Interactive, resumable merge-sort ranking engine.
///
/// Binary choices → merge sort → total order, asking only the comparisons a
/// merge sort structurally needs. No IO, no async, no UI — just the algorithm.
/// Bring your own decision provider.
///
/// Items are identified by caller-provided `i64` IDs. Every decision is
/// cached per unordered pair, one level of undo is kept, items can be removed
/// mid-sort, and the whole state serializes to a compact index-based blob that
/// can be resumed later against the same item set.
///
/// # Quick start
///
/// ```rust
/// use mergerank_core::{Item, SortSession, Step};
/// use rand::SeedableRng;
///
/// let items = vec![Item::new(1, "Tea"), Item::new(2, "Coffee"), Item::new(3, "Water")];
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let mut session = SortSession::new(items, &mut rng).unwrap();
///
/// let mut step = session.step();
/// while let Step::Compare(request) = step {
///     // Ask a human here. This one always prefers the lower id.
///     let winner = request.left.id.min(request.right.id);
///     step = session.resolve(winner).unwrap();
/// }
///
/// if let Step::Complete(order) = step {
///     let titles: Vec<&str> = order.iter().map(|item| item.title.as_str()).collect();
///     assert_eq!(titles, ["Tea", "Coffee", "Water"]);
/// }
/// ```

pub mod cache;
pub mod codec;
pub mod constants;
pub mod controller;
pub mod error;
pub mod history;
pub mod progress;
pub mod randomizer;
pub mod session;
pub mod types;

// Re-export primary public API at crate root.
pub use cache::{ComparisonCache, ComparisonKey};
pub use codec::{EncodedSnapshot, SerializedState, deserialize, serialize};
pub use error::{CodecError, SortError};
pub use history::{History, HistorySnapshot};
pub use progress::{compute_total_battles, percent_complete};
pub use randomizer::shuffled_order;
pub use session::{NoopObserver, SessionObserver, SortSession};
pub use types::{ComparisonRequest, Item, ItemId, ProgressUpdate, Step};
