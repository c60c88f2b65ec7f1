/// Item list loading: --items file, --item inline args, or stdin.
use mergerank_core::{Item, ItemId};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal};
use std::path::Path;

use crate::bail;

/// Where answers come from when stdin already carried the item list.
const TTY_PATH: &str = "/dev/tty";

/// One entry of a JSON items file: a bare title or a full object.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawItem {
    Title(String),
    Full {
        id: Option<ItemId>,
        title: String,
        #[serde(default, alias = "imageUrl")]
        image_url: Option<String>,
    },
}

/// An item before it has its final id.
struct Entry {
    id: Option<ItemId>,
    title: String,
    image_url: Option<String>,
}

impl Entry {
    fn titled(title: &str) -> Self {
        Entry { id: None, title: title.to_string(), image_url: None }
    }
}

/// Items plus whether stdin was spent reading them.
pub struct LoadedItems {
    pub items: Vec<Item>,
    pub from_stdin: bool,
}

/// Stable id for the `occurrence`-th entry with this title.
///
/// Derived from the title alone, so inserting, deleting or reordering lines
/// in an items file leaves every other item's id (and its cached answers)
/// intact across runs.
fn title_id(title: &str, occurrence: usize) -> ItemId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(title.as_bytes());
    if occurrence > 0 {
        hasher.update(&[0]);
        hasher.update(occurrence.to_string().as_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    i64::from_le_bytes(bytes) & i64::MAX
}

/// Give every id-less entry its title id, then reject any id used twice.
fn assign_ids(entries: Vec<Entry>) -> Result<Vec<Item>, String> {
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    let mut first_use: HashMap<ItemId, usize> = HashMap::new();
    let mut items: Vec<Item> = Vec::with_capacity(entries.len());

    for (pos, entry) in entries.into_iter().enumerate() {
        let id = match entry.id {
            Some(id) => id,
            None => {
                let seen = occurrences.entry(entry.title.clone()).or_insert(0);
                let id = title_id(&entry.title, *seen);
                *seen += 1;
                id
            }
        };

        if let Some(&earlier) = first_use.get(&id) {
            return Err(format!(
                "Item {} (\"{}\") reuses id {id}, already taken by item {} (\"{}\")",
                pos + 1,
                entry.title,
                earlier + 1,
                items[earlier].title,
            ));
        }
        first_use.insert(id, pos);
        items.push(Item { id, title: entry.title, image_url: entry.image_url });
    }
    Ok(items)
}

fn parse_entries(content: &str) -> Result<Vec<Entry>, String> {
    let trimmed = content.trim();
    if trimmed.starts_with('[') {
        let raw: Vec<RawItem> = serde_json::from_str(trimmed)
            .map_err(|e| format!("File looks like JSON but failed to parse: {e}"))?;
        Ok(raw
            .into_iter()
            .filter_map(|raw| match raw {
                RawItem::Title(title) if title.trim().is_empty() => None,
                RawItem::Title(title) => Some(Entry::titled(title.trim())),
                RawItem::Full { id, title, image_url } => Some(Entry { id, title, image_url }),
            })
            .collect())
    } else {
        Ok(trimmed.lines().map(str::trim).filter(|s| !s.is_empty()).map(Entry::titled).collect())
    }
}

/// Parse a string as either a JSON array (of titles or item objects) or plain
/// text, one title per line. Items without an explicit id get a title id.
pub fn parse_items_from_str(content: &str) -> Result<Vec<Item>, String> {
    assign_ids(parse_entries(content)?)
}

/// Load items from all sources. Ids are assigned across file and inline items
/// together so a clash between them is reported like any other.
pub fn load_items(file: Option<&Path>, inline: &[String]) -> LoadedItems {
    let mut entries = Vec::new();

    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| bail(format!("Failed to read items file {}: {e}", path.display())));
        entries = parse_entries(&content).unwrap_or_else(|e| bail(e));
    }

    entries.extend(inline.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).map(Entry::titled));

    // From stdin (only if no file and no inline items)
    let mut from_stdin = false;
    if entries.is_empty() {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            bail("No items provided. Use --items <file>, --item <name>, or pipe items via stdin.");
        }
        let content = stdin
            .lock()
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .unwrap_or_else(|e| bail(format!("Failed to read from stdin: {e}")))
            .join("\n");
        entries = parse_entries(&content).unwrap_or_else(|e| bail(e));
        from_stdin = true;
    }

    let items = assign_ids(entries).unwrap_or_else(|e| bail(e));
    if items.is_empty() {
        bail("Need at least 1 item to rank, got 0");
    }
    LoadedItems { items, from_stdin }
}

/// Open the answer stream. Stdin is at EOF once it has delivered the items,
/// so answers then come from the controlling terminal instead.
pub fn answer_reader(items_from_stdin: bool) -> Result<Box<dyn BufRead>, String> {
    if items_from_stdin {
        open_answers(Path::new(TTY_PATH)).map_err(|e| {
            format!("Items were read from stdin and no terminal is available for answers ({e}). Use --items <file> instead.")
        })
    } else {
        Ok(Box::new(io::stdin().lock()))
    }
}

fn open_answers(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    Ok(Box::new(BufReader::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergerank_core::{SortSession, Step};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn titles(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    fn id_of(items: &[Item], title: &str) -> ItemId {
        items.iter().find(|i| i.title == title).map(|i| i.id).unwrap()
    }

    #[test]
    fn test_plain_lines_are_trimmed() {
        let items = parse_items_from_str("  Pizza\n\nSushi \n Tacos").unwrap();
        assert_eq!(titles(&items), vec!["Pizza", "Sushi", "Tacos"]);
        assert!(items.iter().all(|i| i.id >= 0));
    }

    #[test]
    fn test_ids_survive_inserted_and_reordered_lines() {
        let before = parse_items_from_str("Pizza\nSushi\nTacos").unwrap();
        let after = parse_items_from_str("Ramen\nTacos\nPizza\nSushi").unwrap();
        for title in ["Pizza", "Sushi", "Tacos"] {
            assert_eq!(id_of(&before, title), id_of(&after, title), "{title}");
        }
    }

    #[test]
    fn test_repeated_titles_get_distinct_ids() {
        let items = parse_items_from_str("Tea\nTea\nCoffee").unwrap();
        assert_ne!(items[0].id, items[1].id);
        // The first occurrence keeps the plain title id.
        assert_eq!(items[0].id, parse_items_from_str("Tea").unwrap()[0].id);
    }

    #[test]
    fn test_json_titles() {
        let items = parse_items_from_str(r#"["A", "", "C"]"#).unwrap();
        assert_eq!(titles(&items), vec!["A", "C"]);
        assert_eq!(items[1].id, parse_items_from_str("C").unwrap()[0].id);
    }

    #[test]
    fn test_json_objects_keep_ids_and_images() {
        let items = parse_items_from_str(
            r#"[{"id": 40, "title": "Forty", "imageUrl": "http://x/40.png"}, {"title": "No id"}]"#,
        )
        .unwrap();
        assert_eq!(items[0].id, 40);
        assert_eq!(items[0].image_url.as_deref(), Some("http://x/40.png"));
        assert_eq!(items[1].id, title_id("No id", 0));
        assert!(items[1].image_url.is_none());
    }

    #[test]
    fn test_mixed_json_ids_do_not_collide() {
        // The second entry sits at position 1 but must not take id 1.
        let items = parse_items_from_str(r#"[{"id": 1, "title": "First"}, {"title": "Second"}]"#).unwrap();
        assert_eq!(items.len(), 2);
        assert_ne!(items[0].id, items[1].id);
    }

    #[test]
    fn test_duplicate_explicit_id_names_both_items() {
        let err = parse_items_from_str(r#"[{"id": 7, "title": "Seven"}, "Free", {"id": 7, "title": "Also seven"}]"#)
            .unwrap_err();
        assert!(err.contains("Item 3 (\"Also seven\")"), "{err}");
        assert!(err.contains("id 7"), "{err}");
        assert!(err.contains("item 1 (\"Seven\")"), "{err}");
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(parse_items_from_str("[1, 2").is_err());
    }

    #[test]
    fn test_inline_items_join_file_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.txt");
        std::fs::write(&path, "a\nb\n").unwrap();

        let loaded = load_items(Some(&path), &["c".to_string(), " ".to_string()]);
        assert!(!loaded.from_stdin);
        assert_eq!(titles(&loaded.items), vec!["a", "b", "c"]);
        assert_eq!(id_of(&loaded.items, "c"), title_id("c", 0));
    }

    #[test]
    fn test_edited_items_file_resumes_cached_answers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.txt");
        std::fs::write(&path, "Pizza\nSushi\nTacos\nCurry\n").unwrap();

        let items = load_items(Some(&path), &[]).items;
        let mut session = SortSession::new(items, &mut StdRng::seed_from_u64(3)).unwrap();
        for _ in 0..2 {
            if let Step::Compare(req) = session.step() {
                session.resolve(req.left.id).unwrap();
            }
        }
        let title_pairs = |s: &SortSession| -> Vec<(String, String, String)> {
            s.cache()
                .iter()
                .map(|(key, winner)| {
                    let (a, b) = key.ids();
                    let title = |id| s.item(id).map(|i| i.title.clone()).unwrap();
                    (title(a), title(b), title(winner))
                })
                .collect()
        };
        let answered = title_pairs(&session);
        let state = session.to_state();

        // Insert a line above the existing titles.
        std::fs::write(&path, "Ramen\nPizza\nSushi\nTacos\nCurry\n").unwrap();
        let items = load_items(Some(&path), &[]).items;
        let resumed = SortSession::resume(items, &state, &mut StdRng::seed_from_u64(4)).unwrap();

        assert_eq!(resumed.comparison_count(), 2);
        assert_eq!(title_pairs(&resumed), answered);
        assert_eq!(resumed.items().len(), 5);
    }

    #[test]
    fn test_answers_read_from_given_terminal_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tty");
        std::fs::write(&path, "1\nu\n").unwrap();

        let lines: Vec<String> = open_answers(&path).unwrap().lines().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["1", "u"]);
    }

    #[test]
    fn test_missing_terminal_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_answers(&dir.path().join("no-such-tty")).is_err());
    }
}
