//! Presentation layout: scale modes and panning
//!
//! The converted frame is handed to the renderer together with X/Y scale
//! factors and a pan offset. The renderer itself is out of scope; this
//! module only computes the numbers it consumes.

use serde::{Deserialize, Serialize};

/// How the emulated screen is fitted to the host surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleMode {
    /// No scaling, 1:1 pixels
    Unscaled,
    /// Scale both axes by host width / source width
    FitWidth,
    /// Scale both axes by host height / source height
    FitHeight,
    /// Independent axis scales filling the host surface exactly
    Stretch,
}

impl ScaleMode {
    /// Get the name of the mode for display
    pub fn name(&self) -> &str {
        match self {
            ScaleMode::Unscaled => "Unscaled",
            ScaleMode::FitWidth => "Fit Width",
            ScaleMode::FitHeight => "Fit Height",
            ScaleMode::Stretch => "Stretch",
        }
    }

    /// Cycle to the next mode in the sequence
    pub fn next(&self) -> Self {
        match self {
            ScaleMode::Unscaled => ScaleMode::FitWidth,
            ScaleMode::FitWidth => ScaleMode::FitHeight,
            ScaleMode::FitHeight => ScaleMode::Stretch,
            ScaleMode::Stretch => ScaleMode::Unscaled,
        }
    }
}

impl Default for ScaleMode {
    fn default() -> Self {
        ScaleMode::Unscaled
    }
}

/// Scale factors and pan offset positioning the emulated screen on the
/// host surface.
///
/// The pan follows a focus point (normally the emulated pointer) and is
/// clamped so the visible region never leaves the scaled source bounds:
/// `-(src * scale - host) <= pan <= 0` per axis, or exactly 0 when the
/// scaled source already fits.
#[derive(Debug, Clone)]
pub struct DisplayLayout {
    host_width: usize,
    host_height: usize,
    src_width: usize,
    src_height: usize,
    mode: ScaleMode,
    scale_x: f32,
    scale_y: f32,
    pan_x: i32,
    pan_y: i32,
}

impl DisplayLayout {
    pub fn new(host_width: usize, host_height: usize, src_width: usize, src_height: usize) -> Self {
        let mut layout = Self {
            host_width,
            host_height,
            src_width,
            src_height,
            mode: ScaleMode::Unscaled,
            scale_x: 1.0,
            scale_y: 1.0,
            pan_x: 0,
            pan_y: 0,
        };
        layout.set_mode(ScaleMode::Unscaled);
        layout
    }

    pub fn mode(&self) -> ScaleMode {
        self.mode
    }

    pub fn scale_x(&self) -> f32 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f32 {
        self.scale_y
    }

    pub fn pan_x(&self) -> i32 {
        self.pan_x
    }

    pub fn pan_y(&self) -> i32 {
        self.pan_y
    }

    /// Switch scale mode, recomputing the factors and resetting the pan.
    pub fn set_mode(&mut self, mode: ScaleMode) {
        self.mode = mode;
        let (sx, sy) = match mode {
            ScaleMode::Unscaled => (1.0, 1.0),
            ScaleMode::FitWidth => {
                let s = self.host_width as f32 / self.src_width as f32;
                (s, s)
            }
            ScaleMode::FitHeight => {
                let s = self.host_height as f32 / self.src_height as f32;
                (s, s)
            }
            ScaleMode::Stretch => (
                self.host_width as f32 / self.src_width as f32,
                self.host_height as f32 / self.src_height as f32,
            ),
        };
        self.scale_x = sx;
        self.scale_y = sy;
        self.pan_x = 0;
        self.pan_y = 0;
    }

    /// Advance to the next scale mode.
    pub fn cycle_mode(&mut self) {
        self.set_mode(self.mode.next());
    }

    /// Re-center the view on a focus point given in source pixels,
    /// clamping so the visible region stays within the scaled source.
    pub fn update_pan(&mut self, focus_x: usize, focus_y: usize) {
        self.pan_x = Self::clamped_pan(
            self.host_width,
            self.src_width,
            self.scale_x,
            focus_x,
        );
        self.pan_y = Self::clamped_pan(
            self.host_height,
            self.src_height,
            self.scale_y,
            focus_y,
        );
    }

    fn clamped_pan(host: usize, src: usize, scale: f32, focus: usize) -> i32 {
        let max_scroll = src as f32 * scale - host as f32;
        if max_scroll <= 0.0 {
            // Scaled source fits entirely; nothing to pan
            return 0;
        }
        let pan = host as f32 / 2.0 - focus as f32 * scale;
        pan.clamp(-max_scroll, 0.0) as i32
    }
}
