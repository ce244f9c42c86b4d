//! Lock-free sound sample ring
//!
//! Audio flows through a power-of-two circular buffer shared between two
//! execution contexts: the emulation loop writes samples in fixed-size
//! blocks, and the platform's real-time audio callback drains them one by
//! one at its own cadence. No lock is ever taken between the two sides;
//! each offset is written by exactly one side, and the producer publishes
//! new data only at block granularity, after the whole block's contents
//! are in place.
//!
//! Failure degrades instead of propagating. If the producer outruns the
//! consumer it drops the oldest unread block (bounded latency over
//! completeness); if the consumer starves it emits flat output at the
//! last sample value. Transitions between silence and playback always go
//! through a bounded-step ramp so neither start, stop, nor underrun
//! produces an audible click.
//!
//! The consumer also tracks the minimum number of filled blocks it
//! observed during the current one-second window. The pacing loop feeds
//! that watermark back into the virtual clock once per second, which
//! keeps the producer and consumer rates locked together over long runs
//! without any shared high-resolution clock.
//!
//! Samples live in the ring in the biased `u16` domain (0x8000 = center)
//! until their block completes, at which point they are normalized to
//! native signed form in place. The consumer hands out `i16`.

mod output;
mod ring;

pub use output::SoundConsumer;
pub use ring::{SoundProducer, WriteGrant};

use std::sync::Arc;

/// Device sample rate in Hz, the rate of the emulated sound hardware.
pub const SOUND_SAMPLE_RATE: u32 = 22255;

/// Center line of the biased sample domain; silence.
pub const SAMPLE_CENTER: u16 = 0x8000;

/// Largest change between consecutive ramp output samples, in the biased
/// domain.
pub const RAMP_STEP: u16 = 0x0040;

/// Filled blocks of lookahead required before playback starts. Absorbs
/// producer jitter at stream start.
pub const START_LOOKAHEAD_BLOCKS: u32 = 8;

/// Fill watermark the per-second feedback steers toward. Higher and sound
/// lags the emulation; lower and it pauses.
pub const TARGET_MIN_FILLED_BLOCKS: u32 = 3;

/// Ring geometry: a power-of-two count of power-of-two-length blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingConfig {
    pub block_len_log2: u32,
    pub block_count_log2: u32,
}

impl RingConfig {
    /// Samples per block, the producer's unit of publication.
    pub const fn block_len(&self) -> u32 {
        1 << self.block_len_log2
    }

    /// Number of blocks in the ring.
    pub const fn block_count(&self) -> u32 {
        1 << self.block_count_log2
    }

    /// Total ring capacity in samples.
    pub const fn ring_len(&self) -> u32 {
        1 << (self.block_len_log2 + self.block_count_log2)
    }

    pub(crate) const fn block_mask(&self) -> u32 {
        self.block_len() - 1
    }

    pub(crate) const fn ring_mask(&self) -> u32 {
        self.ring_len() - 1
    }

    /// Out-of-range sentinel marking the fill watermark as unset.
    pub(crate) const fn watermark_unset(&self) -> u32 {
        self.block_count() + 1
    }
}

impl Default for RingConfig {
    /// 16 blocks of 512 samples: 8192 samples, about 0.37 s at the device
    /// rate.
    fn default() -> Self {
        Self {
            block_len_log2: 9,
            block_count_log2: 4,
        }
    }
}

/// Allocate a ring and split it into its two single-owner handles.
///
/// The producer belongs to the emulation loop, the consumer to the
/// platform audio callback; neither is otherwise shared.
pub fn channel(config: RingConfig) -> (SoundProducer, SoundConsumer) {
    let shared = Arc::new(ring::RingState::new(config));
    (
        SoundProducer::new(Arc::clone(&shared)),
        SoundConsumer::new(shared),
    )
}
