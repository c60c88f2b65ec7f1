/// State file: where the CLI keeps a session between runs.
///
/// The engine only hands out `SerializedState` blobs; this module decides
/// where they live. Items removed by the user are stored next to the blob so
/// they stay removed when the items file is read again on the next run.
use mergerank_core::{ItemId, ProgressUpdate, SerializedState, SessionObserver};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedRanking {
    pub removed: Vec<ItemId>,
    pub state: SerializedState,
}

/// Read a saved ranking. Missing or unreadable files mean "start clean".
pub fn load(path: &Path) -> Option<SavedRanking> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("could not read state file {}: {e}; starting fresh", path.display());
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(saved) => Some(saved),
        Err(e) => {
            tracing::warn!("state file {} is malformed: {e}; starting fresh", path.display());
            None
        }
    }
}

/// Write through a temporary sibling so a crash never leaves half a file.
pub fn write(path: &Path, saved: &SavedRanking) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(saved)?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)
}

/// Session observer that persists every save and logs progress.
pub struct StateWriter {
    path: Option<PathBuf>,
    pub removed: Vec<ItemId>,
}

impl StateWriter {
    pub fn new(path: Option<PathBuf>, removed: Vec<ItemId>) -> Self {
        StateWriter { path, removed }
    }
}

impl SessionObserver for StateWriter {
    fn on_progress(&mut self, update: ProgressUpdate) {
        tracing::debug!(
            comparisons = update.comparison_count,
            percent = update.percent_complete,
            "progress"
        );
    }

    fn on_save(&mut self, state: &SerializedState) {
        let Some(path) = &self.path else { return };
        let saved = SavedRanking {
            removed: self.removed.clone(),
            state: state.clone(),
        };
        if let Err(e) = write(path, &saved) {
            tracing::warn!("failed to save state to {}: {e}", path.display());
        }
    }

    fn on_restart(&mut self) {
        tracing::debug!("replaying saved decisions");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let saved = SavedRanking {
            removed: vec![3],
            state: SerializedState {
                item_index: vec![1, 2],
                choices: vec![[0, 1, 1]],
                shuffled_order_indexes: vec![1, 0],
                total_battles: 2,
                ..SerializedState::default()
            },
        };
        write(&path, &saved).unwrap();
        assert_eq!(load(&path), Some(saved));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        assert_eq!(load(&path), None);

        std::fs::write(&path, "{ definitely not json").unwrap();
        assert_eq!(load(&path), None);
    }

    #[test]
    fn test_observer_writes_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut writer = StateWriter::new(Some(path.clone()), vec![9]);
        writer.on_save(&SerializedState::default());

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.removed, vec![9]);
    }
}
