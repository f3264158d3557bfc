use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base durations at speed multiplier 1.0, in milliseconds
pub const DOT_DURATION_MS: u64 = 100;
pub const DASH_DURATION_MS: u64 = 300;
pub const SYMBOL_GAP_MS: u64 = 100;
pub const LETTER_GAP_MS: u64 = 300;
pub const WORD_GAP_MS: u64 = 700;

/// WPM that a 100ms dot corresponds to under the PARIS standard
pub const BASE_WPM: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingKind {
    Dot,
    Dash,
    SymbolGap,
    LetterGap,
    WordGap,
}

impl TimingKind {
    /// Whether the output (tone, lamp, motor) is on for this unit
    pub fn is_keyed(self) -> bool {
        matches!(self, TimingKind::Dot | TimingKind::Dash)
    }

    fn base_ms(self) -> u64 {
        match self {
            TimingKind::Dot => DOT_DURATION_MS,
            TimingKind::Dash => DASH_DURATION_MS,
            TimingKind::SymbolGap => SYMBOL_GAP_MS,
            TimingKind::LetterGap => LETTER_GAP_MS,
            TimingKind::WordGap => WORD_GAP_MS,
        }
    }
}

/// One step of a playback sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorseTiming {
    pub kind: TimingKind,
    pub duration_ms: u64,
}

impl MorseTiming {
    fn scaled(kind: TimingKind, speed: f32) -> Self {
        Self {
            kind,
            duration_ms: (kind.base_ms() as f32 / speed) as u64,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Derive the playback sequence for a Morse string
///
/// Every dot and dash is followed by a symbol gap; a space yields a letter
/// gap and `/` a word gap. Other characters are skipped. Durations are the
/// base constants divided by `speed_multiplier`; a multiplier that is not a
/// positive finite number is treated as 1.0.
pub fn morse_timing(code: &str, speed_multiplier: f32) -> Vec<MorseTiming> {
    let speed = if speed_multiplier.is_finite() && speed_multiplier > 0.0 {
        speed_multiplier
    } else {
        1.0
    };

    let mut timings = Vec::with_capacity(code.len() * 2);
    for symbol in code.chars() {
        match symbol {
            '.' => {
                timings.push(MorseTiming::scaled(TimingKind::Dot, speed));
                timings.push(MorseTiming::scaled(TimingKind::SymbolGap, speed));
            }
            '-' => {
                timings.push(MorseTiming::scaled(TimingKind::Dash, speed));
                timings.push(MorseTiming::scaled(TimingKind::SymbolGap, speed));
            }
            ' ' => timings.push(MorseTiming::scaled(TimingKind::LetterGap, speed)),
            '/' => timings.push(MorseTiming::scaled(TimingKind::WordGap, speed)),
            _ => {}
        }
    }
    timings
}

/// Total playback length of a sequence in milliseconds
pub fn total_duration_ms(timings: &[MorseTiming]) -> u64 {
    timings.iter().map(|t| t.duration_ms).sum()
}

/// Calculate dit duration in milliseconds from WPM
///
/// Standard Morse timing: 1 word = 50 dit-lengths
/// "PARIS" is the standard word used for WPM measurement
/// dit duration in ms = 1200 / WPM
pub fn dit_duration_ms(wpm: f32) -> f32 {
    1200.0 / wpm
}

/// Speed multiplier that plays the base table at `wpm`
pub fn speed_for_wpm(wpm: f32) -> f32 {
    wpm / BASE_WPM
}

/// WPM equivalent of a speed multiplier
pub fn wpm_for_speed(speed_multiplier: f32) -> f32 {
    speed_multiplier * BASE_WPM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_dot() {
        let timings = morse_timing(".", 1.0);
        assert_eq!(
            timings,
            vec![
                MorseTiming { kind: TimingKind::Dot, duration_ms: DOT_DURATION_MS },
                MorseTiming { kind: TimingKind::SymbolGap, duration_ms: SYMBOL_GAP_MS },
            ]
        );
    }

    #[test]
    fn test_letter_and_word_gaps() {
        let kinds: Vec<TimingKind> = morse_timing(".- / -", 1.0).iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TimingKind::Dot,
                TimingKind::SymbolGap,
                TimingKind::Dash,
                TimingKind::SymbolGap,
                TimingKind::LetterGap,
                TimingKind::WordGap,
                TimingKind::LetterGap,
                TimingKind::Dash,
                TimingKind::SymbolGap,
            ]
        );
    }

    #[test]
    fn test_speed_multiplier_scales_durations() {
        let fast = morse_timing("-", 2.0);
        assert_eq!(fast[0].duration_ms, 150);
        assert_eq!(fast[1].duration_ms, 50);

        let slow = morse_timing(" ", 0.5);
        assert_eq!(slow[0].duration_ms, 600);

        // Truncated, not rounded
        let odd = morse_timing("/", 3.0);
        assert_eq!(odd[0].duration_ms, 233);
    }

    #[test]
    fn test_invalid_speed_falls_back_to_base() {
        for speed in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert_eq!(morse_timing(".", speed)[0].duration_ms, DOT_DURATION_MS);
        }
    }

    #[test]
    fn test_other_characters_are_skipped() {
        assert!(morse_timing("SOS", 1.0).is_empty());
        assert!(morse_timing("", 1.0).is_empty());
    }

    #[test]
    fn test_sequence_is_restartable() {
        let timings = morse_timing("... --- ...", 1.0);
        let first: u64 = total_duration_ms(&timings);
        let second: u64 = total_duration_ms(&timings);
        assert_eq!(first, second);
        // 6 dots, 3 dashes, 9 symbol gaps, 2 letter gaps
        assert_eq!(first, 6 * 100 + 3 * 300 + 9 * 100 + 2 * 300);
    }

    #[test]
    fn test_dit_duration_at_common_speeds() {
        // At 12 WPM, dit should be 100ms
        assert!((dit_duration_ms(12.0) - 100.0).abs() < 0.1);

        // At 20 WPM, dit should be 60ms
        assert!((dit_duration_ms(20.0) - 60.0).abs() < 0.1);

        // At 25 WPM, dit should be 48ms
        assert!((dit_duration_ms(25.0) - 48.0).abs() < 0.1);
    }

    #[test]
    fn test_wpm_speed_conversion() {
        assert!((speed_for_wpm(24.0) - 2.0).abs() < 1e-6);
        assert!((wpm_for_speed(0.5) - 6.0).abs() < 1e-6);
        let dot = morse_timing(".", speed_for_wpm(20.0))[0].duration_ms;
        assert_eq!(dot, dit_duration_ms(20.0) as u64);
    }
}
