use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::view_state::PersistedView;

/// Per-document persisted view state keyed by fingerprint.
pub trait ViewStore {
    fn read(&self, fingerprint: &str) -> Result<Option<PersistedView>, StoreError>;

    fn write(&mut self, fingerprint: &str, view: &PersistedView) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub fingerprint: String,
    #[serde(flatten)]
    pub view: PersistedView,
}

/// JSON-backed view history, most recently written entry last. Entries
/// are never dropped automatically.
#[derive(Debug, Serialize, Deserialize)]
pub struct ViewHistory {
    files: Vec<HistoryEntry>,
    #[serde(skip)]
    file_path: Option<PathBuf>,
}

impl ViewHistory {
    pub fn ephemeral() -> Self {
        Self {
            files: Vec::new(),
            file_path: None,
        }
    }

    pub fn with_file(file_path: &Path) -> Self {
        Self {
            files: Vec::new(),
            file_path: Some(file_path.to_path_buf()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("folioview").join("view_history.json"))
    }

    pub fn load_or_ephemeral(file_path: Option<&Path>) -> Self {
        match file_path {
            Some(path) => Self::load_from_file(path).unwrap_or_else(|e| {
                log::error!("Failed to load view history from {}: {}", path.display(), e);
                Self::with_file(path)
            }),
            None => Self::ephemeral(),
        }
    }

    pub fn load_from_file(file_path: &Path) -> Result<Self, StoreError> {
        if file_path.exists() {
            let content = fs::read_to_string(file_path)?;
            let mut history: Self = serde_json::from_str(&content)?;
            history.file_path = Some(file_path.to_path_buf());
            Ok(history)
        } else {
            Ok(Self::with_file(file_path))
        }
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.file_path else {
            // Ephemeral history stays in memory
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, fingerprint: &str) -> Option<&PersistedView> {
        self.files
            .iter()
            .find(|entry| entry.fingerprint == fingerprint)
            .map(|entry| &entry.view)
    }

    /// Insert or replace an entry, moving it to the most recent position.
    pub fn upsert(&mut self, fingerprint: &str, view: PersistedView) {
        self.files.retain(|entry| entry.fingerprint != fingerprint);
        self.files.push(HistoryEntry {
            fingerprint: fingerprint.to_string(),
            view,
        });
    }

    /// Entries ordered from most to least recently viewed.
    pub fn recent(&self) -> Vec<&HistoryEntry> {
        let mut entries: Vec<&HistoryEntry> = self.files.iter().collect();
        entries.sort_by(|a, b| b.view.last_viewed.cmp(&a.view.last_viewed));
        entries
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ViewStore for ViewHistory {
    fn read(&self, fingerprint: &str) -> Result<Option<PersistedView>, StoreError> {
        Ok(self.get(fingerprint).cloned())
    }

    fn write(&mut self, fingerprint: &str, view: &PersistedView) -> Result<(), StoreError> {
        self.upsert(fingerprint, view.clone());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn viewed(page: i64, minutes_ago: i64) -> PersistedView {
        PersistedView {
            page: Some(page),
            last_viewed: Some(Utc::now() - Duration::minutes(minutes_ago)),
            ..Default::default()
        }
    }

    #[test]
    fn write_then_reload_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("history.json");

        let mut history = ViewHistory::with_file(&path);
        let view = PersistedView {
            page: Some(5),
            zoom: Some("page-width".into()),
            ..Default::default()
        };
        history.write("abc", &view).unwrap();

        let reloaded = ViewHistory::load_or_ephemeral(Some(&path));
        assert_eq!(reloaded.read("abc").unwrap(), Some(view));
        assert_eq!(reloaded.read("missing").unwrap(), None);
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(ViewHistory::load_from_file(&path).is_err());
        let history = ViewHistory::load_or_ephemeral(Some(&path));
        assert!(history.is_empty());
    }

    #[test]
    fn old_documents_are_kept() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let mut history = ViewHistory::with_file(&path);
        let first = PersistedView {
            page: Some(5),
            zoom: Some("page-width".into()),
            last_viewed: Some(Utc::now() - Duration::days(400)),
            ..Default::default()
        };
        history.write("abc", &first).unwrap();
        for i in 0..250 {
            history.write(&format!("doc{i}"), &viewed(2, i)).unwrap();
        }

        let reloaded = ViewHistory::load_or_ephemeral(Some(&path));
        assert_eq!(reloaded.len(), 251);
        assert_eq!(reloaded.read("abc").unwrap(), Some(first));
    }

    #[test]
    fn upsert_replaces_existing_entry() {
        let mut history = ViewHistory::ephemeral();
        history.upsert("abc", viewed(1, 5));
        history.upsert("abc", viewed(9, 0));
        assert_eq!(history.len(), 1);
        assert_eq!(history.get("abc").and_then(|v| v.page), Some(9));
    }

    #[test]
    fn recent_lists_newest_first() {
        let mut history = ViewHistory::ephemeral();
        history.upsert("old", viewed(1, 30));
        history.upsert("new", viewed(1, 1));
        history.upsert("mid", viewed(1, 10));
        let order: Vec<&str> = history
            .recent()
            .iter()
            .map(|e| e.fingerprint.as_str())
            .collect();
        assert_eq!(order, ["new", "mid", "old"]);
    }

    #[test]
    fn ephemeral_history_never_touches_disk() {
        let mut history = ViewHistory::ephemeral();
        history.write("abc", &viewed(3, 0)).unwrap();
        assert_eq!(history.read("abc").unwrap().and_then(|v| v.page), Some(3));
    }
}
