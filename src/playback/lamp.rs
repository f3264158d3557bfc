use std::io::{self, Write};

use super::KeySink;

/// Terminal stand-in for a flashlight: redraws a lamp glyph on one line
#[derive(Debug, Clone, Default)]
pub struct ConsoleLamp;

impl ConsoleLamp {
    fn draw(&self, on: bool) {
        let glyph = if on { "\r[\u{25CF}]" } else { "\r[ ]" };
        let mut out = io::stdout().lock();
        // A closed stdout only loses the visual, playback timing is unaffected
        let _ = out.write_all(glyph.as_bytes());
        let _ = out.flush();
    }
}

impl KeySink for ConsoleLamp {
    fn key_down(&mut self) {
        self.draw(true);
    }

    fn key_up(&mut self) {
        self.draw(false);
    }
}
