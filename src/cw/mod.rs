//! Morse code translation and timing.

mod alphabet;
mod timing;
mod translator;

pub use alphabet::{alphabet, Alphabet, WORD_SEPARATOR};
pub use timing::{
    dit_duration_ms, morse_timing, speed_for_wpm, total_duration_ms, wpm_for_speed, MorseTiming,
    TimingKind, BASE_WPM, DASH_DURATION_MS, DOT_DURATION_MS, LETTER_GAP_MS, SYMBOL_GAP_MS,
    WORD_GAP_MS,
};
pub use translator::{
    char_to_morse, is_valid_morse, morse_to_char, morse_to_text, split_morse_into_chars,
    text_to_morse,
};
