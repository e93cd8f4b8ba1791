use std::fs;
use std::path::{Path, PathBuf};

use super::KeyValueStore;
use crate::error::ChatError;

/// File-backed store keeping one JSON file per key.
///
/// # Example
/// ```no_run
/// use chatdeck::storage::{FileKeyValueStore, KeyValueStore};
///
/// let store = FileKeyValueStore::new(chatdeck::config::default_data_dir());
/// store.set("chatSessions", "{}")?;
/// # Ok::<(), chatdeck::error::ChatError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    base_dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", normalize_label(key)))
    }

    fn ensure_parent(path: &Path) -> Result<(), ChatError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ChatError> {
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ChatError::Storage(format!("{}: {err}", path.display()))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ChatError> {
        let path = self.key_path(key);
        Self::ensure_parent(&path)?;
        // Write beside the target and rename so readers never see a torn snapshot.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ChatError> {
        let path = self.key_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ChatError::Storage(format!("{}: {err}", path.display()))),
        }
    }
}

fn normalize_label(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else {
            out.push('-');
        }
    }
    if out.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        out
    }
}
