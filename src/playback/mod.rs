//! Drives output devices from a Morse timing sequence.
//!
//! The only contract an output needs is [`KeySink`]: it is keyed down for
//! the length of every dot and dash and left up during gaps. Scheduling,
//! cancellation and progress live here so that every device behaves the
//! same way.

#[cfg(feature = "audio")]
mod audio;
mod lamp;
mod sidetone;
mod vibration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::cw::MorseTiming;

#[cfg(feature = "audio")]
pub use audio::{AudioEngineHandle, DeviceInfo, ToneKey};
pub use lamp::ConsoleLamp;
pub use sidetone::{write_wav, SidetoneGenerator, DEFAULT_FREQUENCY, DEFAULT_SAMPLE_RATE};
pub use vibration::{vibration_waveform, ERROR_PATTERN, SUCCESS_PATTERN};

/// Speed multiplier used when demonstrating a single character in lessons
pub const LESSON_SPEED: f32 = 0.8;

/// An output that can be switched on and off
pub trait KeySink {
    fn key_down(&mut self);
    fn key_up(&mut self);
}

impl<S: KeySink + ?Sized> KeySink for Box<S> {
    fn key_down(&mut self) {
        (**self).key_down();
    }

    fn key_up(&mut self) {
        (**self).key_up();
    }
}

/// Wait for `duration` unless a stop arrives first. Returns true if stopped.
fn wait_or_stop(stop_rx: &Receiver<()>, duration: Duration) -> bool {
    match stop_rx.recv_timeout(duration) {
        Err(RecvTimeoutError::Timeout) => false,
        // A message or a dropped sender both mean stop
        Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
    }
}

/// Play a sequence on the current thread.
///
/// `on_progress(done, total)` is called after every unit. The sink is
/// always left keyed up. Returns true if the whole sequence was played.
pub fn play_blocking<S, F>(
    timings: &[MorseTiming],
    sink: &mut S,
    stop_rx: &Receiver<()>,
    mut on_progress: F,
) -> bool
where
    S: KeySink + ?Sized,
    F: FnMut(usize, usize),
{
    let total = timings.len();

    for (index, timing) in timings.iter().enumerate() {
        let stopped = if timing.kind.is_keyed() {
            sink.key_down();
            let stopped = wait_or_stop(stop_rx, timing.duration());
            sink.key_up();
            stopped
        } else {
            wait_or_stop(stop_rx, timing.duration())
        };

        if stopped {
            tracing::debug!("Playback stopped after {}/{} units", index, total);
            return false;
        }

        on_progress(index + 1, total);
    }

    true
}

/// Shared view of a running playback
#[derive(Debug)]
pub struct Progress {
    done: AtomicUsize,
    total: usize,
    finished: AtomicBool,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
            finished: AtomicBool::new(false),
        }
    }

    /// Units played so far
    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Played fraction between 0.0 and 1.0
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.done() as f32 / self.total as f32
    }

    /// Whether the worker has exited, by completion or by stop
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

struct Playback {
    stop_tx: Sender<()>,
    progress: Arc<Progress>,
    /// Taken by `wait()`, which joins without holding the player lock
    worker: Option<JoinHandle<bool>>,
}

impl Playback {
    fn stop(mut self) -> bool {
        let _ = self.stop_tx.try_send(());
        self.worker.take().map(join_worker).unwrap_or(false)
    }
}

fn join_worker(worker: JoinHandle<bool>) -> bool {
    match worker.join() {
        Ok(completed) => completed,
        Err(_) => {
            tracing::error!("Playback worker panicked");
            false
        }
    }
}

/// Plays timing sequences on a background thread, one at a time.
///
/// Starting a new sequence stops the one in progress first. Dropping the
/// player stops playback.
pub struct Player<S> {
    sink: S,
    current: Mutex<Option<Playback>>,
}

impl<S> Player<S>
where
    S: KeySink + Clone + Send + 'static,
{
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            current: Mutex::new(None),
        }
    }

    /// Start playing `timings`, replacing any playback in progress
    pub fn play(&self, timings: Vec<MorseTiming>) -> Arc<Progress> {
        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            previous.stop();
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let progress = Arc::new(Progress::new(timings.len()));
        let worker_progress = Arc::clone(&progress);
        let mut sink = self.sink.clone();

        tracing::debug!("Starting playback of {} units", timings.len());
        let worker = thread::spawn(move || {
            let completed = play_blocking(&timings, &mut sink, &stop_rx, |done, _| {
                worker_progress.done.store(done, Ordering::Relaxed);
            });
            worker_progress.finished.store(true, Ordering::Release);
            completed
        });

        *current = Some(Playback {
            stop_tx,
            progress: Arc::clone(&progress),
            worker: Some(worker),
        });
        progress
    }

    /// Stop the current playback, if any
    pub fn stop(&self) {
        if let Some(playback) = self.current.lock().take() {
            playback.stop();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .map(|p| !p.progress.is_finished())
            .unwrap_or(false)
    }

    /// Block until the current playback ends. Returns true if it completed.
    ///
    /// `stop()` from another thread still interrupts a waited playback.
    pub fn wait(&self) -> bool {
        let worker = self.current.lock().as_mut().and_then(|p| p.worker.take());
        match worker {
            Some(worker) => join_worker(worker),
            None => false,
        }
    }
}

impl<S> Drop for Player<S> {
    fn drop(&mut self) {
        if let Some(playback) = self.current.get_mut().take() {
            playback.stop();
        }
    }
}
