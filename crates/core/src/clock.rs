//! Virtual machine clock
//!
//! Maps the host's millisecond clock onto discrete virtual "ticks" at a
//! fractional target rate. The default rate is 60.14742 ticks per second,
//! the vertical-retrace rate of the emulated hardware.
//!
//! # Fixed-point accumulation
//!
//! A tick period of 1000 / 60.14742 ms is not a whole number of
//! milliseconds, so the clock keeps the deadline of the next tick as an
//! integer millisecond plus a 16-bit fraction. Advancing by one tick adds a
//! constant step to the fraction and carries the overflow into the integer
//! part. This tracks the target rate to sub-millisecond precision with no
//! floating point on the per-tick path.
//!
//! # Discontinuities
//!
//! Host time is not trusted to be well behaved. A forward jump larger than
//! the stall threshold (a suspended process, a debugger pause) counts as a
//! single lost tick and the deadline is rebased, rather than bursting
//! through hundreds of catch-up ticks. A backward jump larger than the
//! threshold rebases without counting anything. Both thresholds are tuned
//! constants, not load-bearing values.

use std::time::Instant;

use crate::logging::{log, LogCategory, LogLevel};

/// Number of fractional bits in the tick deadline accumulator.
pub const TICK_FRAC_BITS: u32 = 16;

const TICK_FRAC_MASK: u32 = (1 << TICK_FRAC_BITS) - 1;

/// Fractional milliseconds added per tick for the default 60.14742 Hz rate:
/// round(1000 / 60.14742 * 2^16).
pub const DEFAULT_TICK_STEP: u32 = 1_089_590;

/// Forward jumps beyond this many milliseconds count as a stall, backward
/// jumps beyond it as a clock regression. Either way pacing state is rebased
/// instead of replayed.
pub const DISCONTINUITY_MS: u32 = 256;

/// Source of host time in milliseconds.
///
/// The value is expected to wrap; all clock arithmetic is wraparound-safe.
/// Production code uses [`HostClock`]; tests drive [`VirtualClock`] and
/// [`crate::pacing::PacingLoop`] with synthetic sequences.
pub trait TimeSource {
    fn now_ms(&self) -> u32;
}

/// [`TimeSource`] backed by [`Instant`], measuring from its creation.
pub struct HostClock {
    start: Instant,
}

impl HostClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for HostClock {
    fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}

/// Fixed-point virtual clock and elapsed-tick counter.
pub struct VirtualClock {
    /// Most recent wall-clock value seen by `advance`
    last_ms: u32,
    /// Integer milliseconds of the next tick deadline
    next_due_ms: u32,
    /// Fractional part of the deadline, below `2^TICK_FRAC_BITS`
    frac: u32,
    /// Deadline increment per tick, in fractional milliseconds
    step: u32,
    /// Virtual ticks elapsed since start; increments only, wraps at `u32::MAX`
    ticks: u32,
}

impl VirtualClock {
    /// Clock at the default 60.14742 Hz tick rate.
    pub fn new() -> Self {
        Self::with_step(DEFAULT_TICK_STEP)
    }

    /// Clock for another target rate. The stall/regression policy is
    /// unchanged; only the fixed-point step is rederived.
    pub fn with_tick_hz(hz: f64) -> Self {
        let step = (1000.0 / hz * f64::from(1u32 << TICK_FRAC_BITS)).round() as u32;
        Self::with_step(step)
    }

    fn with_step(step: u32) -> Self {
        Self {
            last_ms: 0,
            next_due_ms: 0,
            frac: 0,
            step,
            ticks: 0,
        }
    }

    /// Restart pacing from `now_ms`. The tick counter is preserved.
    pub fn reset(&mut self, now_ms: u32) {
        self.last_ms = now_ms;
        self.rebase();
    }

    /// Virtual ticks elapsed since start.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Most recent wall-clock millisecond value seen.
    pub fn last_ms(&self) -> u32 {
        self.last_ms
    }

    /// Integer millisecond deadline of the next tick.
    pub fn next_due_ms(&self) -> u32 {
        self.next_due_ms
    }

    /// Poll the clock with the current wall-clock time.
    ///
    /// Returns true if virtual time advanced (one or more ticks became due,
    /// or a stall was converted into a single lost tick). Returns false when
    /// the deadline has not been reached or the wall clock moved backward.
    pub fn advance(&mut self, now_ms: u32) -> bool {
        if now_ms == self.last_ms {
            return false;
        }
        self.last_ms = now_ms;

        let diff = now_ms.wrapping_sub(self.next_due_ms) as i32;
        if diff >= 0 {
            if diff as u32 > DISCONTINUITY_MS {
                // Emulation was interrupted; charge one tick and rebase
                // rather than replaying the whole gap as an audio/video burst.
                self.ticks = self.ticks.wrapping_add(1);
                self.rebase();
                log(LogCategory::Clock, LogLevel::Debug, || {
                    format!("stall of {} ms, counted as one tick", diff)
                });
            } else {
                loop {
                    self.ticks = self.ticks.wrapping_add(1);
                    self.advance_deadline();
                    if (now_ms.wrapping_sub(self.next_due_ms) as i32) < 0 {
                        break;
                    }
                }
            }
            true
        } else {
            if diff < -(DISCONTINUITY_MS as i32) {
                // Wall clock moved backward; rebase without counting.
                self.rebase();
                log(LogCategory::Clock, LogLevel::Debug, || {
                    format!("clock set back {} ms, pacing rebased", -diff)
                });
            }
            false
        }
    }

    /// Push the next tick deadline one tick-period later without counting a
    /// tick. Used by the per-second audio feedback when the sound buffer is
    /// running too full.
    pub fn delay_one_step(&mut self) {
        self.advance_deadline();
    }

    /// Count one tick as elapsed immediately, without moving the deadline.
    /// Used by the per-second audio feedback when the sound buffer is
    /// running low.
    pub fn credit_tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
    }

    fn advance_deadline(&mut self) {
        self.frac += self.step;
        self.next_due_ms = self.next_due_ms.wrapping_add(self.frac >> TICK_FRAC_BITS);
        self.frac &= TICK_FRAC_MASK;
    }

    fn rebase(&mut self) {
        self.next_due_ms = self.last_ms;
        self.frac = 0;
        self.advance_deadline();
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}
