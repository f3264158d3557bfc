use std::f32::consts::TAU;
use std::path::Path;

use crate::cw::MorseTiming;
use crate::error::Result;

/// Tone pitch used for Morse playback, in Hz
pub const DEFAULT_FREQUENCY: f32 = 800.0;

/// Sample rate used for offline rendering
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Rise and fall time of the keying envelope, in seconds
const RAMP_SECONDS: f32 = 0.005;

/// Sine oscillator keyed through a linear envelope, so tones start and
/// stop without clicks
pub struct SidetoneGenerator {
    phase: f32,
    step: f32,
    sample_rate: f32,
    frequency: f32,
    volume: f32,
    envelope: f32,
    ramp: f32,
}

impl SidetoneGenerator {
    pub fn new(frequency: f32, volume: f32, sample_rate: f32) -> Self {
        let mut generator = Self {
            phase: 0.0,
            step: 0.0,
            sample_rate,
            frequency,
            volume: volume.clamp(0.0, 1.0),
            envelope: 0.0,
            ramp: 0.0,
        };
        generator.set_sample_rate(sample_rate);
        generator
    }

    /// Next sample, with the envelope moving toward on or off
    pub fn next_sample(&mut self, key_down: bool) -> f32 {
        let target = if key_down { 1.0 } else { 0.0 };
        self.envelope = if key_down {
            (self.envelope + self.ramp).min(target)
        } else {
            (self.envelope - self.ramp).max(target)
        };

        let sample = self.phase.sin() * self.envelope * self.volume;
        self.phase = (self.phase + self.step) % TAU;
        sample
    }

    /// Render a whole timing sequence to mono samples
    ///
    /// Keyed units produce tone, gaps produce silence (after the decay
    /// tail of the previous tone). Each unit occupies exactly
    /// `duration_ms * sample_rate / 1000` samples.
    pub fn render(&mut self, timings: &[MorseTiming]) -> Vec<f32> {
        let rate = self.sample_rate as u64;
        let total: u64 = timings.iter().map(|t| t.duration_ms * rate / 1000).sum();
        let mut samples = Vec::with_capacity(total as usize);

        for timing in timings {
            let count = timing.duration_ms * rate / 1000;
            let keyed = timing.kind.is_keyed();
            for _ in 0..count {
                samples.push(self.next_sample(keyed));
            }
        }
        samples
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.ramp = 1.0 / (RAMP_SECONDS * sample_rate);
        self.step = TAU * self.frequency / sample_rate;
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

/// Write mono samples as a 16-bit PCM WAV file
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(value)?;
    }
    writer.finalize()?;

    tracing::debug!("Wrote {} samples to {:?}", samples.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cw::{morse_timing, TimingKind};

    #[test]
    fn test_silent_when_key_up() {
        let mut tone = SidetoneGenerator::new(DEFAULT_FREQUENCY, 1.0, 8000.0);
        for _ in 0..100 {
            assert_eq!(tone.next_sample(false).abs(), 0.0);
        }
    }

    #[test]
    fn test_envelope_ramps_up() {
        let mut tone = SidetoneGenerator::new(DEFAULT_FREQUENCY, 1.0, 8000.0);
        // 5ms attack at 8kHz is 40 samples
        let early: f32 = (0..10).map(|_| tone.next_sample(true).abs()).fold(0.0, f32::max);
        let later: f32 = (0..200).map(|_| tone.next_sample(true).abs()).fold(0.0, f32::max);
        assert!(early < 0.3);
        assert!(later > 0.9);
    }

    #[test]
    fn test_render_lengths() {
        let mut tone = SidetoneGenerator::new(DEFAULT_FREQUENCY, 0.5, 8000.0);
        let timings = morse_timing(".", 1.0);
        let samples = tone.render(&timings);
        // 100ms dot + 100ms gap at 8kHz
        assert_eq!(samples.len(), 1600);
        let peak = samples[..800].iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        assert!(peak > 0.4 && peak <= 0.5);
        // Well past the decay tail the gap is silent
        assert!(samples[1000..].iter().all(|s| s.abs() == 0.0));
    }

    #[test]
    fn test_render_gap_only_is_silent() {
        let mut tone = SidetoneGenerator::new(DEFAULT_FREQUENCY, 1.0, 8000.0);
        let timings = [MorseTiming { kind: TimingKind::WordGap, duration_ms: 700 }];
        let samples = tone.render(&timings);
        assert_eq!(samples.len(), 5600);
        assert!(samples.iter().all(|s| s.abs() == 0.0));
    }

    #[test]
    fn test_write_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sos.wav");
        let mut tone = SidetoneGenerator::new(DEFAULT_FREQUENCY, 1.0, 8000.0);
        let samples = tone.render(&morse_timing("... --- ...", 2.0));
        assert_eq!(tone.sample_rate(), 8000.0);
        write_wav(&path, &samples, tone.sample_rate() as u32).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 8000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len() as usize, samples.len());
    }
}
