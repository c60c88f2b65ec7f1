/// Highest fraction of `total_battles` shown before the sort actually finishes.
///
/// `total_battles` overcounts real work whenever cached answers are reused, so
/// the settled ratio can reach 1.0 while comparisons are still outstanding.
/// Capping at 99% keeps "100%" reserved for a finished sort.
pub const MAX_PERCENT_BEFORE_COMPLETE: usize = 99;

/// Number of undo snapshots retained. Only the state immediately before the
/// most recent change can be restored.
pub const HISTORY_DEPTH: usize = 1;

/// Version tag written into every serialized state blob.
/// Bump when the layout of `SerializedState` changes incompatibly.
pub const STATE_FORMAT_VERSION: u32 = 1;
