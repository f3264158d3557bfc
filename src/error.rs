//! Error type shared by the stores, settings and playback drivers.
//!
//! Translation and cipher functions are total and never produce these.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing a settings/history file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored file could not be serialized or parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A substitution key shorter than the 26-letter alphabet.
    #[error("Substitution key must have 26 characters, got {len}")]
    InvalidKey { len: usize },

    /// A shift outside the range offered to users.
    #[error("Shift must be between 0 and 25, got {shift}")]
    InvalidShift { shift: i32 },

    /// No stored record carries this id.
    #[error("No entry with id {id}")]
    NotFound { id: u64 },

    #[error("Could not determine the {0} directory")]
    NoDataDir(&'static str),

    /// The audio device could not be opened or stopped responding.
    #[error("Audio error: {0}")]
    Audio(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
