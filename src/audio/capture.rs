use std::sync::Arc;

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};

use super::{PcmFormat, SampleBuffer};

/// Out-of-band notifications from the capture stream, polled by the render
/// thread. Audio data itself goes straight into the `SampleBuffer` from the
/// device callback.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    StreamError(String),
}

/// Live audio input feeding a shared `SampleBuffer` from the device callback
/// thread.
pub struct AudioCapture {
    #[allow(dead_code)]
    stream: Stream,
    sample_rate: u32,
    events: Receiver<CaptureEvent>,
}

impl AudioCapture {
    /// Opens the default input device (or the named one) and starts pushing
    /// interleaved stereo samples into `buffer`.
    pub fn new(buffer: Arc<SampleBuffer>, device_name: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => host
                .input_devices()?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| anyhow::anyhow!("No input device named {name}"))?,
            None => host
                .default_input_device()
                .ok_or_else(|| anyhow::anyhow!("No input device available"))?,
        };

        let config = device
            .default_input_config()
            .map_err(|e| anyhow::anyhow!("Failed to get default input config: {}", e))?;

        info!(
            "Using audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );
        info!("Audio config: {:?}", config);

        let sample_rate = config.sample_rate().0;
        let (event_sender, events) = crossbeam_channel::unbounded();

        let stream = Self::create_input_stream(&device, &config.into(), buffer, event_sender)?;
        stream.play()?;

        Ok(Self {
            stream,
            sample_rate,
            events,
        })
    }

    fn create_input_stream(
        device: &Device,
        config: &StreamConfig,
        buffer: Arc<SampleBuffer>,
        events: Sender<CaptureEvent>,
    ) -> Result<Stream> {
        let channels = config.channels as usize;
        info!(
            "Creating input stream with {} channels at {} Hz",
            channels, config.sample_rate.0
        );

        let error_events = events.clone();
        let stream = device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| match channels {
                1 => buffer.add_pcm_samples(PcmFormat::Mono, data),
                2 => buffer.add_pcm_samples(PcmFormat::StereoInterleaved, data),
                _ => {
                    // Downmix to stereo by keeping the first two channels.
                    let stereo: Vec<f32> = data
                        .chunks(channels)
                        .flat_map(|frame| [frame[0], frame[1]])
                        .collect();
                    buffer.add_pcm_samples(PcmFormat::StereoInterleaved, &stereo);
                }
            },
            move |err| {
                warn!("Audio stream error: {}", err);
                let _ = error_events.send(CaptureEvent::StreamError(err.to_string()));
            },
            None,
        )?;

        Ok(stream)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Drains any pending capture events without blocking.
    pub fn poll_events(&self) -> Vec<CaptureEvent> {
        self.events.try_iter().collect()
    }
}
