use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Caller-provided item identifier. Stable and unique within a session.
pub type ItemId = i64;

/// A single entity being ranked.
///
/// Ordering and equality of the sort only ever look at `id`; `title` and
/// `image_url` are payload carried through for the host to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    #[serde(default, rename = "imageUrl", alias = "image_url", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Item {
    pub fn new(id: ItemId, title: impl Into<String>) -> Self {
        Item {
            id,
            title: title.into(),
            image_url: None,
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// The two items the engine needs a decision on.
///
/// `left` is the head of the left merge run, `right` the head of the right run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRequest {
    pub left: Item,
    pub right: Item,
}

impl ComparisonRequest {
    /// True if `id` is one of the two candidates.
    pub fn involves(&self, id: ItemId) -> bool {
        self.left.id == id || self.right.id == id
    }
}

/// What the session needs next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The sort is suspended until the caller resolves this comparison.
    Compare(ComparisonRequest),
    /// The sort finished. Items are ordered most- to least-preferred.
    Complete(Vec<Item>),
}

impl Step {
    pub fn is_complete(&self) -> bool {
        matches!(self, Step::Complete(_))
    }
}

/// Payload of the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Decisions recorded in the cache.
    pub comparison_count: usize,
    /// 0..=100. Only reaches 100 once the sort has completed.
    pub percent_complete: u8,
}

/// Maps between caller i64 IDs and positions in an item list.
pub(crate) struct IdMap {
    ids: Vec<ItemId>,
    id_to_idx: HashMap<ItemId, usize>,
}

impl IdMap {
    /// Build from ids, keeping the first position of any repeated id.
    pub fn from_ids(ids: impl IntoIterator<Item = ItemId>) -> Self {
        let ids: Vec<ItemId> = ids.into_iter().collect();
        let mut id_to_idx = HashMap::with_capacity(ids.len());
        for (idx, &id) in ids.iter().enumerate() {
            id_to_idx.entry(id).or_insert(idx);
        }
        IdMap { ids, id_to_idx }
    }

    pub fn to_idx(&self, id: ItemId) -> Option<usize> {
        self.id_to_idx.get(&id).copied()
    }

    pub fn to_id(&self, idx: usize) -> Option<ItemId> {
        self.ids.get(idx).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_map_round_trip() {
        let map = IdMap::from_ids([40, 10, 30]);
        assert_eq!(map.to_idx(10), Some(1));
        assert_eq!(map.to_id(2), Some(30));
        assert_eq!(map.to_idx(99), None);
        assert_eq!(map.to_id(3), None);
    }

    #[test]
    fn test_item_json_uses_image_url_camel_case() {
        let item = Item::new(7, "Seven").with_image("http://img/7.png");
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"imageUrl\""));

        let back: Item = serde_json::from_str(r#"{"id":7,"title":"Seven","image_url":"x"}"#).unwrap();
        assert_eq!(back.image_url.as_deref(), Some("x"));
    }

    #[test]
    fn test_request_involves() {
        let req = ComparisonRequest { left: Item::new(1, "a"), right: Item::new(2, "b") };
        assert!(req.involves(1));
        assert!(req.involves(2));
        assert!(!req.involves(3));
    }
}
