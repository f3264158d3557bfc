//! JSON file persistence shared by the history, progress and score stores.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;

/// Milliseconds since the Unix epoch
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Read a JSON file, falling back to the default value.
///
/// A missing file is normal on first run. An unreadable or corrupt file is
/// logged and replaced on the next save.
pub(crate) fn load_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        tracing::debug!("{:?} does not exist, starting empty", path);
        return T::default();
    }

    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read {:?}: {}", path, e);
            return T::default();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to parse {:?}: {}", path, e);
            T::default()
        }
    }
}

/// Write a value as pretty JSON, creating parent directories
pub(crate) fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(value)?;

    // Write with explicit sync to ensure data reaches disk
    let mut file = fs::File::create(path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;

    tracing::debug!("Saved {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let value: Vec<u32> = load_json(&dir.path().join("missing.json"));
        assert!(value.is_empty());
    }

    #[test]
    fn test_corrupt_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let value: Vec<u32> = load_json(&path);
        assert!(value.is_empty());
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("values.json");
        save_json(&path, &vec![1u32, 2, 3]).unwrap();
        let value: Vec<u32> = load_json(&path);
        assert_eq!(value, vec![1, 2, 3]);
    }
}
