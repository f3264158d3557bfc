use crate::cw::MorseTiming;

/// Two short pulses
pub const SUCCESS_PATTERN: [u64; 4] = [0, 100, 50, 100];

/// Three long pulses
pub const ERROR_PATTERN: [u64; 6] = [0, 200, 100, 200, 100, 200];

/// Convert a timing sequence into a vibration waveform.
///
/// The waveform alternates off and on durations in milliseconds, starting
/// with the (possibly zero) wait before the first pulse, which is the
/// layout vibration motors take. Consecutive gaps are merged and trailing
/// silence is dropped.
pub fn vibration_waveform(timings: &[MorseTiming]) -> Vec<u64> {
    let mut pattern = Vec::new();
    let mut off_ms = 0;

    for timing in timings {
        if timing.kind.is_keyed() {
            pattern.push(off_ms);
            pattern.push(timing.duration_ms);
            off_ms = 0;
        } else {
            off_ms += timing.duration_ms;
        }
    }

    pattern
}
