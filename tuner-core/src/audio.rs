//! # Audio Capture Module
//!
//! This module handles real-time microphone capture using CPAL (Cross-Platform Audio Library).
//! The stream callback chops incoming audio into fixed-size mono frames and
//! hands them to the analysis loop over a bounded channel.
//!
//! ## Features
//! - Default input device selection
//! - Prefers mono 32-bit float near 44.1 kHz, falls back to the device default
//! - Multi-channel input reduced to its first channel
//! - Never blocks the audio callback: frames are dropped when the analysis lags

use crate::AudioFrame;
use crate::config::NOMINAL_SAMPLE_RATE;
use crate::error::TunerError;
use crate::scheduler::FrameSource;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SupportedStreamConfig, SupportedStreamConfigRange};
use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info};

/// Frames buffered between the callback and the analysis loop.
const FRAME_QUEUE_DEPTH: usize = 8;

/// Live microphone stream exposed as a [`FrameSource`].
///
/// Dropping it stops the stream and releases the device.
pub struct MicrophoneSource {
    stream: cpal::Stream,
    frames: Receiver<Vec<f32>>,
    sample_rate: u32,
}

impl FrameSource for MicrophoneSource {
    fn pull_frame(&mut self) -> Option<AudioFrame> {
        self.frames
            .try_recv()
            .ok()
            .map(|samples| AudioFrame::new(samples, self.sample_rate))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Drop for MicrophoneSource {
    fn drop(&mut self) {
        if let Err(e) = self.stream.pause() {
            error!(error = %e, "error pausing input stream");
        }
    }
}

impl std::fmt::Debug for MicrophoneSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicrophoneSource")
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

/// Opens the default input device and starts capturing.
///
/// # Arguments
/// * `frame_size` - Samples per emitted frame
///
/// # Returns
/// * `Ok(source)` - Running capture
/// * `Err(TunerError::CaptureUnavailable)` - No device, permission denied, or no usable format
pub fn open_microphone(frame_size: usize) -> Result<MicrophoneSource, TunerError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| TunerError::CaptureUnavailable("no input device available".into()))?;

    match device.name() {
        Ok(name) => info!(device = %name, "using audio input device"),
        Err(e) => info!(error = %e, "using unnamed audio input device"),
    }

    let supported = select_config(&device)?;
    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels() as usize;
    let config: cpal::StreamConfig = supported.into();

    info!(sample_rate, channels, frame_size, "selected input configuration");

    let (sender, frames) = crossbeam_channel::bounded(FRAME_QUEUE_DEPTH);
    let mut framer = Framer::new(frame_size, channels, sender);

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| framer.push(data),
            |err| error!(error = %err, "an error occurred on the audio stream"),
            None,
        )
        .map_err(|e| TunerError::CaptureUnavailable(e.to_string()))?;

    stream.play().map_err(|e| TunerError::CaptureUnavailable(e.to_string()))?;

    Ok(MicrophoneSource {
        stream,
        frames,
        sample_rate,
    })
}

/// Picks a mono f32 configuration near the target rate, or the device's
/// default configuration when that is f32.
fn select_config(device: &cpal::Device) -> Result<SupportedStreamConfig, TunerError> {
    let configs = device
        .supported_input_configs()
        .map_err(|e| TunerError::CaptureUnavailable(e.to_string()))?
        .collect::<Vec<_>>();

    if let Some(range) = find_supported_config(configs, NOMINAL_SAMPLE_RATE) {
        let rate = NOMINAL_SAMPLE_RATE.clamp(range.min_sample_rate().0, range.max_sample_rate().0);
        return Ok(range.with_sample_rate(cpal::SampleRate(rate)));
    }

    let default = device
        .default_input_config()
        .map_err(|e| TunerError::CaptureUnavailable(e.to_string()))?;
    if default.sample_format() == SampleFormat::F32 {
        Ok(default)
    } else {
        Err(TunerError::CaptureUnavailable(format!(
            "no f32 input format (device default is {:?})",
            default.sample_format()
        )))
    }
}

/// Finds the mono 32-bit float configuration whose rate range lies closest to `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == SampleFormat::F32)
        .min_by_key(|c| {
            let min = c.min_sample_rate().0;
            let max = c.max_sample_rate().0;
            if (min..=max).contains(&target_rate) {
                0
            } else {
                target_rate.abs_diff(min).min(target_rate.abs_diff(max))
            }
        })
}

/// Accumulates interleaved callback data into fixed-size mono frames.
struct Framer {
    frame_size: usize,
    channels: usize,
    pending: Vec<f32>,
    sender: Sender<Vec<f32>>,
}

impl Framer {
    fn new(frame_size: usize, channels: usize, sender: Sender<Vec<f32>>) -> Self {
        Self {
            frame_size: frame_size.max(1),
            channels: channels.max(1),
            pending: Vec::with_capacity(frame_size * 2),
            sender,
        }
    }

    fn push(&mut self, data: &[f32]) {
        self.pending
            .extend(data.iter().step_by(self.channels).copied());

        while self.pending.len() >= self.frame_size {
            let frame: Vec<f32> = self.pending.drain(..self.frame_size).collect();
            // A full queue means the analysis is behind; drop rather than block.
            let _ = self.sender.try_send(frame);
        }
    }
}
