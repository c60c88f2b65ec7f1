/// Persistence codec: compact, index-based session state for storage-constrained hosts.
///
/// Ids are written once in `item_index`; everything else refers to positions
/// in that list. Decoding resolves positions through the blob's own
/// `item_index` and then keeps only ids present in the caller's current item
/// set, so a stale blob degrades to a smaller consistent state instead of
/// failing.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::cache::{ComparisonCache, ComparisonKey};
use crate::constants::STATE_FORMAT_VERSION;
use crate::error::CodecError;
use crate::history::{History, HistorySnapshot};
use crate::types::{IdMap, Item, ItemId};

/// `[index_a, index_b, index_winner]` into `SerializedState::item_index`.
pub type ChoiceTriple = [usize; 3];

/// One encoded undo snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncodedSnapshot {
    pub choices: Vec<ChoiceTriple>,
    pub comparison_count: usize,
    pub settled_count: usize,
    pub total_battles: usize,
}

/// Opaque persisted blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerializedState {
    pub version: u32,
    pub item_index: Vec<ItemId>,
    pub choices: Vec<ChoiceTriple>,
    pub history_choices: Vec<EncodedSnapshot>,
    pub shuffled_order_indexes: Vec<usize>,
    pub total_battles: usize,
    pub settled_count: usize,
}

impl Default for SerializedState {
    fn default() -> Self {
        SerializedState {
            version: STATE_FORMAT_VERSION,
            item_index: Vec::new(),
            choices: Vec::new(),
            history_choices: Vec::new(),
            shuffled_order_indexes: Vec::new(),
            total_battles: 0,
            settled_count: 0,
        }
    }
}

impl SerializedState {
    pub fn to_json(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a blob. Fails on malformed JSON or a version newer than this
    /// build understands.
    pub fn from_json(text: &str) -> Result<Self, CodecError> {
        let state: SerializedState = serde_json::from_str(text)?;
        if state.version > STATE_FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion {
                found: state.version,
                supported: STATE_FORMAT_VERSION,
            });
        }
        Ok(state)
    }

    /// True if the blob holds nothing worth resuming.
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty() && self.shuffled_order_indexes.is_empty()
    }
}

/// Session state reconstructed from a blob, already filtered to the current items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedState {
    pub cache: ComparisonCache,
    pub history: History,
    pub shuffled_order: Vec<ItemId>,
    pub total_battles: usize,
    pub settled_count: usize,
}

/// Borrowed view of everything `serialize` needs.
pub struct StateView<'a> {
    pub items: &'a [Item],
    pub cache: &'a ComparisonCache,
    pub history: &'a History,
    pub shuffled_order: &'a [ItemId],
    pub total_battles: usize,
    pub settled_count: usize,
}

fn encode_cache(cache: &ComparisonCache, id_map: &IdMap) -> Vec<ChoiceTriple> {
    cache
        .iter()
        .filter_map(|(key, winner)| {
            let (a, b) = key.ids();
            Some([id_map.to_idx(a)?, id_map.to_idx(b)?, id_map.to_idx(winner)?])
        })
        .collect()
}

/// Encode session state against the current item list.
///
/// Entries that mention ids no longer in `items` are skipped.
pub fn serialize(view: &StateView<'_>) -> SerializedState {
    let id_map = IdMap::from_ids(view.items.iter().map(|item| item.id));

    let history_choices = view
        .history
        .snapshots()
        .iter()
        .map(|snapshot| EncodedSnapshot {
            choices: encode_cache(&snapshot.cache, &id_map),
            comparison_count: snapshot.comparison_count,
            settled_count: snapshot.settled_count,
            total_battles: snapshot.total_battles,
        })
        .collect();

    SerializedState {
        version: STATE_FORMAT_VERSION,
        item_index: view.items.iter().map(|item| item.id).collect(),
        choices: encode_cache(view.cache, &id_map),
        history_choices,
        shuffled_order_indexes: view
            .shuffled_order
            .iter()
            .filter_map(|&id| id_map.to_idx(id))
            .collect(),
        total_battles: view.total_battles,
        settled_count: view.settled_count,
    }
}

struct Resolver {
    blob: IdMap,
    current: HashSet<ItemId>,
    dropped: usize,
}

impl Resolver {
    fn id(&self, idx: usize) -> Option<ItemId> {
        self.blob.to_id(idx).filter(|id| self.current.contains(id))
    }

    fn cache(&mut self, triples: &[ChoiceTriple]) -> ComparisonCache {
        let mut cache = ComparisonCache::new();
        for &[a, b, winner] in triples {
            let resolved = match (self.id(a), self.id(b), self.id(winner)) {
                (Some(a), Some(b), Some(winner)) if a != b => cache.set(ComparisonKey::new(a, b), winner).is_ok(),
                _ => false,
            };
            if !resolved {
                self.dropped += 1;
            }
        }
        cache
    }
}

/// Decode `state` against `current_items`. Never fails.
///
/// Anything that does not resolve to a current item (out-of-range indices,
/// removed ids, winners outside their pair, duplicated order entries) is
/// dropped. A blob from a newer format version decodes to an empty state.
pub fn deserialize(state: &SerializedState, current_items: &[Item]) -> DecodedState {
    if state.version > STATE_FORMAT_VERSION {
        tracing::warn!(
            "ignoring state blob version {} (supported: {})",
            state.version,
            STATE_FORMAT_VERSION
        );
        return DecodedState::default();
    }

    let mut resolver = Resolver {
        blob: IdMap::from_ids(state.item_index.iter().copied()),
        current: current_items.iter().map(|item| item.id).collect(),
        dropped: 0,
    };

    let cache = resolver.cache(&state.choices);

    let mut history = History::new();
    for encoded in &state.history_choices {
        let snapshot_cache = resolver.cache(&encoded.choices);
        // Dropped entries no longer count as decisions.
        let comparison_count = encoded.comparison_count.min(snapshot_cache.len());
        history.push(HistorySnapshot {
            cache: snapshot_cache,
            comparison_count,
            settled_count: encoded.settled_count,
            total_battles: encoded.total_battles,
        });
    }

    let mut seen = HashSet::new();
    let mut shuffled_order = Vec::with_capacity(state.shuffled_order_indexes.len());
    for &idx in &state.shuffled_order_indexes {
        match resolver.id(idx) {
            Some(id) if seen.insert(id) => shuffled_order.push(id),
            _ => resolver.dropped += 1,
        }
    }

    if resolver.dropped > 0 {
        tracing::warn!("dropped {} unresolvable entries while decoding state", resolver.dropped);
    }

    DecodedState {
        cache,
        history,
        shuffled_order,
        total_battles: state.total_battles,
        settled_count: state.settled_count,
    }
}
