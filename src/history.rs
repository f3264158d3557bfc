//! Saved translations with favorites and search.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cipher::{Cipher, CipherKind};
use crate::error::{Error, Result};
use crate::store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    TextToMorse,
    MorseToText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub id: u64,
    pub original_text: String,
    pub morse_code: String,
    pub timestamp_ms: u64,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub cipher: CipherKind,
    #[serde(default)]
    pub cipher_key: Option<String>,
}

impl TranslationRecord {
    /// The cipher that produced this record
    pub fn cipher(&self) -> Cipher {
        Cipher::from_parts(self.cipher, self.cipher_key.as_deref())
    }

    fn matches(&self, needle: &str) -> bool {
        self.original_text.to_lowercase().contains(needle)
            || self.morse_code.to_lowercase().contains(needle)
    }
}

/// A translation about to be stored
#[derive(Debug, Clone)]
pub struct NewTranslation {
    pub original_text: String,
    pub morse_code: String,
    pub direction: Direction,
    pub cipher: Cipher,
}

/// JSON-backed translation history, oldest entry first on disk
#[derive(Debug)]
pub struct HistoryStore {
    entries: Vec<TranslationRecord>,
    path: PathBuf,
    max_entries: usize,
}

impl HistoryStore {
    /// Default location inside the application data directory
    pub fn default_path(data_dir: &Path) -> PathBuf {
        data_dir.join("history.json")
    }

    pub fn open(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        let path = path.into();
        let entries: Vec<TranslationRecord> = store::load_json(&path);
        tracing::debug!("Loaded {} history entries from {:?}", entries.len(), path);

        let mut history = Self {
            entries,
            path,
            max_entries: max_entries.max(1),
        };
        history.apply_retention();
        history
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, translation: NewTranslation) -> Result<TranslationRecord> {
        let id = self.entries.iter().map(|e| e.id).max().map_or(1, |max| max + 1);
        let record = TranslationRecord {
            id,
            original_text: translation.original_text,
            morse_code: translation.morse_code,
            timestamp_ms: store::now_ms(),
            is_favorite: false,
            direction: translation.direction,
            cipher: translation.cipher.kind(),
            cipher_key: translation.cipher.key(),
        };

        self.entries.push(record.clone());
        self.apply_retention();
        self.persist()?;
        tracing::debug!("Saved translation {}", id);
        Ok(record)
    }

    /// All records, newest first
    pub fn all(&self) -> Vec<&TranslationRecord> {
        self.newest_first(|_| true)
    }

    pub fn favorites(&self) -> Vec<&TranslationRecord> {
        self.newest_first(|e| e.is_favorite)
    }

    /// Case-insensitive substring match on the text or the Morse code
    pub fn search(&self, query: &str) -> Vec<&TranslationRecord> {
        let needle = query.to_lowercase();
        self.newest_first(|e| e.matches(&needle))
    }

    pub fn get(&self, id: u64) -> Option<&TranslationRecord> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn set_favorite(&mut self, id: u64, favorite: bool) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(Error::NotFound { id })?;
        entry.is_favorite = favorite;
        self.persist()
    }

    pub fn delete(&mut self, id: u64) -> Result<TranslationRecord> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(Error::NotFound { id })?;
        let removed = self.entries.remove(index);
        self.persist()?;
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist()
    }

    fn newest_first(&self, keep: impl Fn(&TranslationRecord) -> bool) -> Vec<&TranslationRecord> {
        let mut records: Vec<&TranslationRecord> = self.entries.iter().filter(|e| keep(e)).collect();
        // Stable sort keeps insertion order for equal timestamps, so reverse it first
        records.reverse();
        records.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        records
    }

    fn apply_retention(&mut self) {
        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(0..excess);
        }
    }

    fn persist(&self) -> Result<()> {
        store::save_json(&self.path, &self.entries)
    }
}
