use crate::types::ItemId;

/// Errors returned by session operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SortError {
    /// Two input items share an id.
    #[error("duplicate item id: {0}")]
    DuplicateItemId(ItemId),

    /// The id is not part of the session's current item set.
    #[error("unknown item id: {0}")]
    UnknownItem(ItemId),

    /// A decision named an item that is not one of the two candidates.
    #[error("winner {winner} is not one of the compared items ({left}, {right})")]
    WinnerNotCandidate {
        winner: ItemId,
        left: ItemId,
        right: ItemId,
    },

    /// `resolve` was called while no comparison was outstanding.
    #[error("no comparison is waiting for a decision")]
    NoPendingComparison,

    /// The undo history is empty.
    #[error("nothing to undo")]
    NothingToUndo,
}

/// Errors from the text layer of the persistence codec.
///
/// Decoding an already-parsed `SerializedState` never fails; only turning
/// text into one can.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("state blob is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("state blob version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}
