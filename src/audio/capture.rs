use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::time::Instant;

use super::{Frame, FrameSource};

/// Callback chunks buffered between the audio thread and the polling loop.
/// Chunks arriving while the channel is full are dropped.
const CHANNEL_CAPACITY: usize = 64;

/// Live microphone input, reframed into fixed-size mono frames.
///
/// The cpal stream stops when this value is dropped, so the device is
/// released on every exit path of the loop that owns it.
pub struct MicrophoneSource {
    _stream: cpal::Stream,
    rx: Receiver<Vec<f32>>,
    pending: Vec<f32>,
    chunk_size: usize,
    sample_rate: u32,
    started: Instant,
}

impl MicrophoneSource {
    pub fn open(device_name: Option<&str>, sample_rate: u32, chunk_size: usize) -> Result<Self> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => host
                .input_devices()
                .context("Failed to enumerate input devices")?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .with_context(|| format!("Input device not found: {}", name))?,
            None => host
                .default_input_device()
                .context("No default input device available")?,
        };

        let default_config = device
            .default_input_config()
            .context("Failed to query default input config")?;
        let channels = default_config.channels();
        let sample_format = default_config.sample_format();

        let rate = if rate_supported(&device, sample_rate) {
            sample_rate
        } else {
            let fallback = default_config.sample_rate().0;
            log::warn!(
                "Device does not support {} Hz, using its default {} Hz",
                sample_rate,
                fallback
            );
            fallback
        };

        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (tx, rx) = bounded(CHANNEL_CAPACITY);
        let stream = build_input_stream(&device, &config, sample_format, channels as usize, tx)?;
        stream.play().context("Failed to start input stream")?;

        log::info!(
            "Capturing from '{}': {} Hz, {} channel(s), {:?}",
            device.name().unwrap_or_else(|_| "unknown".into()),
            rate,
            channels,
            sample_format
        );

        Ok(Self {
            _stream: stream,
            rx,
            pending: Vec::with_capacity(chunk_size * 2),
            chunk_size,
            sample_rate: rate,
            started: Instant::now(),
        })
    }
}

impl FrameSource for MicrophoneSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        while self.pending.len() < self.chunk_size {
            let chunk = self
                .rx
                .recv()
                .context("Input stream closed unexpectedly")?;
            self.pending.extend_from_slice(&chunk);
        }

        let samples: Vec<f32> = self.pending.drain(..self.chunk_size).collect();
        Ok(Some(Frame {
            samples,
            timestamp: self.started.elapsed().as_secs_f64(),
        }))
    }
}

/// Print the names of all input devices on the default host.
pub fn list_input_devices() -> Result<()> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());
    println!("Input devices:");
    for device in host.input_devices().context("Failed to enumerate input devices")? {
        let name = device.name().unwrap_or_else(|_| "unknown".into());
        let marker = if Some(&name) == default_name.as_ref() { "*" } else { " " };
        println!(" {} {}", marker, name);
    }
    Ok(())
}

fn rate_supported(device: &cpal::Device, want: u32) -> bool {
    match device.supported_input_configs() {
        Ok(mut configs) => configs.any(|c| {
            c.min_sample_rate().0 <= want && want <= c.max_sample_rate().0
        }),
        Err(_) => false,
    }
}

fn build_input_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    channels: usize,
    tx: Sender<Vec<f32>>,
) -> Result<cpal::Stream> {
    // Glitches are expected under real-time load, log only
    let err_fn = |e: cpal::StreamError| log::debug!("Input stream error: {}", e);

    let stream = match sample_format {
        cpal::SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _| forward_mono(data, channels, &tx),
            err_fn,
            None,
        )?,
        cpal::SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _| {
                let converted: Vec<f32> = data.iter().map(|&s| s as f32 / 32768.0).collect();
                forward_mono(&converted, channels, &tx);
            },
            err_fn,
            None,
        )?,
        cpal::SampleFormat::U16 => device.build_input_stream(
            config,
            move |data: &[u16], _| {
                let converted: Vec<f32> = data
                    .iter()
                    .map(|&s| (s as f32 / 65535.0) * 2.0 - 1.0)
                    .collect();
                forward_mono(&converted, channels, &tx);
            },
            err_fn,
            None,
        )?,
        other => anyhow::bail!("Unsupported input sample format: {:?}", other),
    };
    Ok(stream)
}

fn forward_mono(data: &[f32], channels: usize, tx: &Sender<Vec<f32>>) {
    let mono = downmix(data, channels);
    if let Err(TrySendError::Full(_)) = tx.try_send(mono) {
        log::trace!("Capture overrun, dropped {} samples", data.len() / channels.max(1));
    }
}

/// Average interleaved channels into one.
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
