//! Consumer side: the real-time callback.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::ring::{ramp_step, RingState};
use super::{SAMPLE_CENTER, START_LOOKAHEAD_BLOCKS};
use crate::logging::{log, LogCategory, LogLevel};

/// Consumer handle, driven by the platform audio subsystem.
///
/// [`SoundConsumer::fill`] is the body of the real-time callback: hand it
/// the device's destination buffer and it fills every sample, from ring
/// data when available and from ramps or flat repeats when not. It never
/// blocks and takes no locks.
pub struct SoundConsumer {
    shared: Arc<RingState>,
}

impl SoundConsumer {
    pub(crate) fn new(shared: Arc<RingState>) -> Self {
        Self { shared }
    }

    /// Fill `dst` completely with native signed samples.
    ///
    /// Repeats until the destination is full:
    /// 1. Stopping? Ramp toward the center line and treat the ring as
    ///    drained for this pass.
    /// 2. Not started yet? Wait for enough lookahead blocks, then ramp
    ///    from silence to the first real sample before playing.
    /// 3. Destination full? Record the fill level as a watermark
    ///    candidate and return.
    /// 4. Ring empty? Flat-fill with the last emitted value, record a
    ///    zero watermark, and return — an underrun is a degraded output,
    ///    not an error.
    /// 5. Otherwise copy the largest contiguous run available and go
    ///    again; this is how buffer wraparound and long destinations are
    ///    handled.
    pub fn fill(&mut self, dst: &mut [i16]) {
        let shared = &self.shared;
        let config = shared.config;
        let ring_mask = config.ring_mask();

        let mut play = shared.play_offset.load(Ordering::Relaxed);
        let mut value = shared.last_value.load(Ordering::Relaxed);
        let mut pos = 0usize;

        loop {
            let fill = shared.fill_offset.load(Ordering::Acquire);
            let mut to_play = fill.wrapping_sub(play);
            let filled_blocks = to_play >> config.block_len_log2;

            if !shared.want_playing.load(Ordering::Acquire) {
                ramp(&mut value, SAMPLE_CENTER, dst, &mut pos);
                to_play = 0;
            } else if !shared.has_started.load(Ordering::Relaxed) {
                if filled_blocks < START_LOOKAHEAD_BLOCKS {
                    // Not enough lookahead to absorb jitter yet
                    to_play = 0;
                } else {
                    let first = shared.cells[(play & ring_mask) as usize].load(Ordering::Relaxed);
                    let target = first.wrapping_add(SAMPLE_CENTER);
                    ramp(&mut value, target, dst, &mut pos);
                    if value == target {
                        shared.has_started.store(true, Ordering::Relaxed);
                        log(LogCategory::Audio, LogLevel::Debug, || {
                            "start ramp complete, playing".to_string()
                        });
                    }
                }
            }

            if pos == dst.len() {
                if filled_blocks < shared.min_filled_blocks.load(Ordering::Relaxed) {
                    shared
                        .min_filled_blocks
                        .store(filled_blocks, Ordering::Relaxed);
                }
                break;
            } else if to_play == 0 {
                // Underrun (or stop/start transition with space left):
                // hold the line flat at the last value
                let flat = value.wrapping_sub(SAMPLE_CENTER) as i16;
                for sample in &mut dst[pos..] {
                    *sample = flat;
                }
                pos = dst.len();
                shared.min_filled_blocks.store(0, Ordering::Relaxed);
                log(LogCategory::Audio, LogLevel::Trace, || {
                    "underrun, flat output".to_string()
                });
                break;
            } else {
                let contig = config.ring_len() - (play & ring_mask);
                let n = to_play.min(contig).min((dst.len() - pos) as u32);

                for i in 0..n {
                    let cell = &shared.cells[(play.wrapping_add(i) & ring_mask) as usize];
                    dst[pos + i as usize] = cell.load(Ordering::Relaxed) as i16;
                }
                value = (dst[pos + n as usize - 1] as u16).wrapping_add(SAMPLE_CENTER);
                play = play.wrapping_add(n);
                pos += n as usize;
                shared.play_offset.store(play, Ordering::Release);
            }
        }

        shared.last_value.store(value, Ordering::Relaxed);
    }
}

/// Emit ramp samples into `dst` until `value` reaches `target` or the
/// destination fills. Every step is bounded; the last step snaps exactly.
fn ramp(value: &mut u16, target: u16, dst: &mut [i16], pos: &mut usize) {
    while *value != target && *pos < dst.len() {
        *value = ramp_step(*value, target);
        dst[*pos] = value.wrapping_sub(SAMPLE_CENTER) as i16;
        *pos += 1;
    }
}
