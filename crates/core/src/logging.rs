//! Centralized logging configuration for the pacing core.
//!
//! The hot paths this crate owns (the tick loop and the real-time audio
//! consumer) cannot afford formatting, locking, or I/O unless a message is
//! actually wanted, so logging goes through a global, atomically-read
//! configuration with lazy message construction:
//!
//! - **LogConfig**: thread-safe global configuration using atomic operations
//! - **LogLevel**: hierarchical levels (Off < Error < Warn < Info < Debug < Trace)
//! - **LogCategory**: one per subsystem (Clock, Audio, Video, Pacing)
//! - **log()**: common entry point; the message closure runs only when the
//!   category/level combination is enabled
//!
//! The emit path takes no locks, so it is safe to call from the audio
//! thread.
//!
//! # Usage
//!
//! ```rust
//! use cadence_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Audio, LogLevel::Debug, || {
//!     format!("underrun, {} samples flat-filled", 128)
//! });
//! ```

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn to_u8(self) -> u8 {
        self as u8
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LogLevel::Off => "OFF",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// Log category for the core's subsystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Virtual clock (stalls, regressions, feedback nudges)
    Clock,
    /// Sound ring buffer (overflow, underrun, start/stop transitions)
    Audio,
    /// Framebuffer conversion and palette rebuilds
    Video,
    /// Pacing loop (tick scheduling, second boundaries)
    Pacing,
}

impl LogCategory {
    fn label(self) -> &'static str {
        match self {
            LogCategory::Clock => "clock",
            LogCategory::Audio => "audio",
            LogCategory::Video => "video",
            LogCategory::Pacing => "pacing",
        }
    }
}

/// Global logging configuration
pub struct LogConfig {
    /// Global log level (applies to all categories unless overridden)
    global_level: AtomicU8,
    /// Clock-specific log level
    clock_level: AtomicU8,
    /// Audio-specific log level
    audio_level: AtomicU8,
    /// Video-specific log level
    video_level: AtomicU8,
    /// Pacing-specific log level
    pacing_level: AtomicU8,
}

impl LogConfig {
    /// Create a new LogConfig with all logging disabled
    fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            clock_level: AtomicU8::new(LogLevel::Off as u8),
            audio_level: AtomicU8::new(LogLevel::Off as u8),
            video_level: AtomicU8::new(LogLevel::Off as u8),
            pacing_level: AtomicU8::new(LogLevel::Off as u8),
        }
    }

    /// Get the global singleton instance
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(LogConfig::new)
    }

    /// Set the global log level (applies to all categories unless overridden)
    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level.to_u8(), Ordering::Relaxed);
    }

    /// Get the global log level
    pub fn get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    fn category_slot(&self, category: LogCategory) -> &AtomicU8 {
        match category {
            LogCategory::Clock => &self.clock_level,
            LogCategory::Audio => &self.audio_level,
            LogCategory::Video => &self.video_level,
            LogCategory::Pacing => &self.pacing_level,
        }
    }

    /// Set log level for a specific category
    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.category_slot(category)
            .store(level.to_u8(), Ordering::Relaxed);
    }

    /// Get log level for a specific category
    pub fn get_level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.category_slot(category).load(Ordering::Relaxed))
    }

    /// Check if a message should be logged for the given category and level
    ///
    /// Returns true if:
    /// 1. The category-specific level is set and >= the message level, OR
    /// 2. The category-specific level is Off AND the global level >= the message level
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        let category_level = self.get_level(category);
        if category_level != LogLevel::Off {
            level <= category_level
        } else {
            level <= self.get_global_level()
        }
    }

    /// Reset all logging to Off
    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        self.set_level(LogCategory::Clock, LogLevel::Off);
        self.set_level(LogCategory::Audio, LogLevel::Off);
        self.set_level(LogCategory::Video, LogLevel::Off);
        self.set_level(LogCategory::Pacing, LogLevel::Off);
    }
}

/// Log a message with lazy evaluation.
///
/// The closure is only invoked when the category/level combination is
/// enabled, so callers may format freely on hot paths.
pub fn log<F>(category: LogCategory, level: LogLevel, message: F)
where
    F: FnOnce() -> String,
{
    if LogConfig::global().should_log(category, level) {
        eprintln!("[{}/{}] {}", category.label(), level.label(), message());
    }
}
