//! Morse code translation, classical ciphers, playback timing and
//! practice drills.

pub mod cipher;
pub mod config;
pub mod cw;
pub mod error;
pub mod games;
pub mod history;
pub mod learn;
pub mod playback;
mod store;

pub use error::{Error, Result};
