//! Rodio adapter for the sound ring consumer.

use cadence_core::audio::{SoundConsumer, SOUND_SAMPLE_RATE};
use rodio::Source;

/// Samples pulled from the ring per refill. Small enough that the
/// watermark sees the fill level often, large enough to keep the
/// per-call overhead off the sample path.
const CHUNK_LEN: usize = 512;

/// Streaming audio source draining the sound ring.
///
/// Rodio polls this from its playback thread, which makes that thread
/// the ring's real-time consumer context. Samples are pulled a chunk at
/// a time through [`SoundConsumer::fill`]; the ring itself supplies
/// silence, ramps, and flat underrun output, so `next` never returns
/// `None` and never blocks.
pub struct RingSource {
    consumer: SoundConsumer,
    chunk: Vec<i16>,
    pos: usize,
}

impl RingSource {
    pub fn new(consumer: SoundConsumer) -> Self {
        Self {
            consumer,
            chunk: vec![0; CHUNK_LEN],
            pos: CHUNK_LEN,
        }
    }
}

impl Iterator for RingSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.pos == self.chunk.len() {
            self.consumer.fill(&mut self.chunk);
            self.pos = 0;
        }
        let s = self.chunk[self.pos];
        self.pos += 1;
        Some(s as f32 / 32768.0)
    }
}

impl Source for RingSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SOUND_SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<std::time::Duration> {
        None
    }
}
