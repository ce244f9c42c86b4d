mod audio_out;
mod present;
mod settings;

use cadence_core::audio::{self, RingConfig};
use cadence_core::clock::HostClock;
use cadence_core::logging::{LogConfig, LogLevel};
use cadence_core::pacing::PacingLoop;
use cadence_core::video::layout::DisplayLayout;
use cadence_core::video::FrameConverter;
use cadence_core::Machine;
use cadence_testcard::{TestCardMachine, SCREEN_HEIGHT, SCREEN_WIDTH};
use log::{error, info, warn};
use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};
use rodio::OutputStream;
use settings::Settings;

fn main() {
    env_logger::init();

    // The core's own per-category logging is off unless asked for;
    // CADENCE_LOG=debug etc. turns it on globally
    if let Ok(value) = std::env::var("CADENCE_LOG") {
        match LogLevel::from_str(&value) {
            Some(level) => LogConfig::global().set_global_level(level),
            None => warn!("unrecognized CADENCE_LOG value: {}", value),
        }
    }

    let mut settings = Settings::load();

    let mut machine = match TestCardMachine::new(settings.testcard) {
        Ok(m) => m,
        Err(e) => {
            error!("bad test card configuration: {}", e);
            return;
        }
    };

    let mut window = match Window::new(
        "Cadence",
        settings.window_width,
        settings.window_height,
        WindowOptions::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            error!("failed to create window: {}", e);
            return;
        }
    };

    // Audio: a failed device never aborts the emulator, it just runs mute
    let (mut producer, consumer) = audio::channel(RingConfig::default());
    let mut _audio_stream = None;
    if settings.audio_enabled {
        match OutputStream::try_default() {
            Ok((stream, handle)) => match handle.play_raw(audio_out::RingSource::new(consumer)) {
                Ok(()) => {
                    producer.start();
                    _audio_stream = Some(stream);
                }
                Err(e) => warn!("failed to start audio playback: {}, sound disabled", e),
            },
            Err(e) => warn!("failed to open audio device: {}, sound disabled", e),
        }
    }

    let mut converter = FrameConverter::new(SCREEN_WIDTH, machine.pixel_format());
    let mut layout = DisplayLayout::new(
        settings.window_width,
        settings.window_height,
        SCREEN_WIDTH,
        SCREEN_HEIGHT,
    );
    layout.set_mode(settings.scale_mode);

    let mut frame = vec![0u16; SCREEN_WIDTH * SCREEN_HEIGHT];
    let mut host_buffer = vec![0u32; settings.window_width * settings.window_height];
    let mut audio_scratch: Vec<u16> = Vec::new();
    let mut pacing = PacingLoop::new(HostClock::new());

    info!(
        "running test card at {:?}, {} scaling",
        machine.pixel_format(),
        layout.mode().name()
    );

    while window.is_open() && !window.is_key_down(Key::Escape) {
        // Tab cycles the scale mode, P the palette
        if window.is_key_pressed(Key::Tab, KeyRepeat::No) {
            layout.cycle_mode();
            settings.scale_mode = layout.mode();
            info!("scale mode: {}", layout.mode().name());
            if let Err(e) = settings.save() {
                warn!("failed to save settings: {}", e);
            }
        }
        if window.is_key_pressed(Key::P, KeyRepeat::No) {
            machine.cycle_palette();
        }

        // Pan follows the pointer when the scaled source overflows the
        // window
        if let Some((mx, my)) = window.get_mouse_pos(MouseMode::Clamp) {
            let focus_x = (mx / layout.scale_x()) as usize;
            let focus_y = (my / layout.scale_y()) as usize;
            layout.update_pan(focus_x, focus_y);
        }

        // One tick of emulation, then hand its output to the glue
        if let Err(e) = machine.run_tick() {
            error!("machine fault: {}", e);
            break;
        }
        machine.drain_audio(&mut audio_scratch);
        if producer.is_playing() {
            producer.write(&audio_scratch);
        }
        audio_scratch.clear();

        if let Some(palette) = machine.take_palette_update() {
            converter.set_palette(&palette);
        }
        let dirty = machine.take_dirty_region();
        if !dirty.is_empty() {
            converter.convert_rows(
                machine.framebuffer(),
                &mut frame,
                SCREEN_WIDTH,
                dirty.top,
                dirty.bottom,
            );
        }

        present::compose(
            &frame,
            SCREEN_WIDTH,
            SCREEN_HEIGHT,
            &layout,
            &mut host_buffer,
            settings.window_width,
            settings.window_height,
        );
        if let Err(e) =
            window.update_with_buffer(&host_buffer, settings.window_width, settings.window_height)
        {
            error!("window update error: {}", e);
            break;
        }

        // Spin out the rest of the tick; fires the per-second audio
        // feedback on the way
        let feedback = if producer.is_playing() {
            Some(&mut producer)
        } else {
            None
        };
        pacing.wait_for_next_tick(feedback);
    }

    if producer.is_playing() && !producer.stop() {
        warn!("audio stop ramp timed out");
    }
    if let Err(e) = settings.save() {
        warn!("failed to save settings: {}", e);
    }
}
