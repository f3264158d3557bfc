use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use super::{KeySink, SidetoneGenerator};
use crate::error::{Error, Result};

/// Output device name as reported by the host
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub is_default: bool,
}

/// Commands sent to the audio thread
enum AudioCommand {
    Start {
        device: Option<String>,
        reply: Sender<std::result::Result<(), String>>,
    },
    Stop,
    Shutdown,
}

/// Handle to the audio thread that owns the cpal output stream.
///
/// Streams are not `Send`, so they live on a dedicated thread; the handle
/// only holds a command channel and the shared key state.
pub struct AudioEngineHandle {
    command_tx: Sender<AudioCommand>,
    is_key_down: Arc<AtomicBool>,
}

impl AudioEngineHandle {
    /// Create a new audio engine handle and spawn the audio thread
    pub fn new(frequency: f32, volume: f32) -> Self {
        let (command_tx, command_rx) = bounded::<AudioCommand>(16);
        let is_key_down = Arc::new(AtomicBool::new(false));
        let is_key_down_clone = Arc::clone(&is_key_down);

        thread::spawn(move || {
            audio_thread(command_rx, is_key_down_clone, frequency, volume);
        });

        Self {
            command_tx,
            is_key_down,
        }
    }

    /// List available audio output devices
    pub fn list_output_devices() -> Vec<DeviceInfo> {
        let host = cpal::default_host();
        let default_name = host.default_output_device().and_then(|d| d.name().ok());

        host.output_devices()
            .map(|devices| {
                devices
                    .filter_map(|d| d.name().ok())
                    .map(|name| DeviceInfo {
                        is_default: default_name.as_deref() == Some(name.as_str()),
                        name,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Open the output stream, on the default device when `device` is None
    pub fn start(&self, device: Option<String>) -> Result<()> {
        let (reply_tx, reply_rx) = bounded(1);
        self.command_tx
            .send(AudioCommand::Start {
                device,
                reply: reply_tx,
            })
            .map_err(|_| Error::Audio("Audio thread not responding".to_string()))?;

        reply_rx
            .recv()
            .map_err(|_| Error::Audio("Audio thread not responding".to_string()))?
            .map_err(Error::Audio)
    }

    /// Close the output stream
    pub fn stop(&self) -> Result<()> {
        self.command_tx
            .send(AudioCommand::Stop)
            .map_err(|_| Error::Audio("Audio thread not responding".to_string()))
    }

    /// A cloneable key that switches this engine's tone
    pub fn key(&self) -> ToneKey {
        ToneKey {
            is_key_down: Arc::clone(&self.is_key_down),
        }
    }
}

impl Drop for AudioEngineHandle {
    fn drop(&mut self) {
        self.is_key_down.store(false, Ordering::Relaxed);
        let _ = self.command_tx.send(AudioCommand::Shutdown);
    }
}

/// Keys the sidetone of an [`AudioEngineHandle`]
#[derive(Debug, Clone)]
pub struct ToneKey {
    is_key_down: Arc<AtomicBool>,
}

impl KeySink for ToneKey {
    fn key_down(&mut self) {
        self.is_key_down.store(true, Ordering::Relaxed);
    }

    fn key_up(&mut self) {
        self.is_key_down.store(false, Ordering::Relaxed);
    }
}

/// Audio thread that owns the cpal Stream (not Send)
fn audio_thread(
    command_rx: Receiver<AudioCommand>,
    is_key_down: Arc<AtomicBool>,
    frequency: f32,
    volume: f32,
) {
    let mut output_stream: Option<Stream> = None;

    tracing::debug!("Sidetone: freq={} Hz, volume={}", frequency, volume);
    let sidetone = Arc::new(Mutex::new(SidetoneGenerator::new(frequency, volume, 48000.0)));

    loop {
        match command_rx.recv() {
            Ok(AudioCommand::Start { device, reply }) => {
                tracing::info!("Starting audio output on {:?}", device.as_deref().unwrap_or("default"));
                output_stream = None;

                let result = create_output_stream(device.as_deref(), Arc::clone(&sidetone), Arc::clone(&is_key_down))
                    .and_then(|stream| {
                        stream.play().map_err(|e| e.to_string())?;
                        Ok(stream)
                    });

                let status = match result {
                    Ok(stream) => {
                        output_stream = Some(stream);
                        Ok(())
                    }
                    Err(e) => {
                        tracing::error!("Failed to start audio output: {}", e);
                        Err(e)
                    }
                };
                let _ = reply.send(status);
            }
            Ok(AudioCommand::Stop) => {
                output_stream = None;
            }
            Ok(AudioCommand::Shutdown) | Err(_) => {
                drop(output_stream.take());
                break;
            }
        }
    }
}

fn find_output_device(device_name: Option<&str>) -> std::result::Result<Device, String> {
    let host = cpal::default_host();

    if let Some(name) = device_name {
        let devices: Vec<_> = host.output_devices().map_err(|e| e.to_string())?.collect();

        devices
            .iter()
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .cloned()
            .or_else(|| {
                tracing::warn!("Output device '{}' not found, using default", name);
                host.default_output_device()
            })
            .ok_or_else(|| format!("Output device '{}' not found", name))
    } else {
        host.default_output_device()
            .ok_or_else(|| "No default output device".to_string())
    }
}

/// Create an audio output stream carrying the sidetone
fn create_output_stream(
    device_name: Option<&str>,
    sidetone: Arc<Mutex<SidetoneGenerator>>,
    is_key_down: Arc<AtomicBool>,
) -> std::result::Result<Stream, String> {
    let device = find_output_device(device_name)?;
    let config = device.default_output_config().map_err(|e| e.to_string())?;

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;
    sidetone.lock().set_sample_rate(sample_rate);

    match config.sample_format() {
        cpal::SampleFormat::F32 => build_output_stream::<f32>(&device, &config.into(), sidetone, is_key_down, channels),
        cpal::SampleFormat::I16 => build_output_stream::<i16>(&device, &config.into(), sidetone, is_key_down, channels),
        cpal::SampleFormat::U16 => build_output_stream::<u16>(&device, &config.into(), sidetone, is_key_down, channels),
        _ => Err("Unsupported output sample format".to_string()),
    }
}

fn build_output_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
    device: &Device,
    config: &StreamConfig,
    sidetone: Arc<Mutex<SidetoneGenerator>>,
    is_key_down: Arc<AtomicBool>,
    channels: usize,
) -> std::result::Result<Stream, String> {
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let key_down = is_key_down.load(Ordering::Relaxed);
                let mut sidetone = sidetone.lock();

                for frame in data.chunks_mut(channels) {
                    let value = T::from_sample(sidetone.next_sample(key_down));
                    for channel in frame.iter_mut() {
                        *channel = value;
                    }
                }
            },
            |err| tracing::error!("Output stream error: {}", err),
            None,
        )
        .map_err(|e| e.to_string())
}
