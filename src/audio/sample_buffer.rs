use std::sync::Mutex;

use super::PcmFormat;

/// Thread-safe staging buffer between the audio producer thread and the
/// render thread.
///
/// Samples are stored interleaved stereo (`[L, R, L, R, ...]`) regardless of
/// the input format. The buffer grows between drains and is fully consumed on
/// each read, so consumers must tolerate variable-length batches: a delayed
/// render frame simply observes a larger one.
pub struct SampleBuffer {
    samples_interleaved: Mutex<Vec<f32>>,
}

impl SampleBuffer {
    pub const CHANNELS_PER_SAMPLE: usize = 2;

    pub fn new() -> Self {
        Self {
            samples_interleaved: Mutex::new(Vec::new()),
        }
    }

    /// Appends PCM samples to the pending buffer. Mono input is duplicated
    /// into both stereo channels.
    ///
    /// Called from the audio producer thread; the critical section is a plain
    /// append so the capture callback is never stalled behind analysis work.
    pub fn add_pcm_samples(&self, format: PcmFormat, samples: &[f32]) {
        if format == PcmFormat::Mono {
            let mut interleaved = Vec::with_capacity(samples.len() * 2);
            for &sample in samples {
                interleaved.push(sample);
                interleaved.push(sample);
            }
            self.add_pcm_samples(PcmFormat::StereoInterleaved, &interleaved);
            return;
        }

        let mut pending = self
            .samples_interleaved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        pending.extend_from_slice(samples);
    }

    /// Drains the entire pending buffer, or returns `None` when nothing has
    /// been appended since the last drain (callers skip the frame).
    pub fn take_samples(&self) -> Option<Vec<f32>> {
        let mut pending = self
            .samples_interleaved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if pending.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut *pending))
    }

    pub fn pending_len(&self) -> usize {
        self.samples_interleaved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}
