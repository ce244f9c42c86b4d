//! End-to-end tests of the pacing/audio/video glue: producer and
//! consumer against one ring, the clock feedback loop, and dirty-row
//! conversion, wired together the way a frontend wires them.

use cadence_core::audio::{
    channel, RingConfig, SAMPLE_CENTER, SOUND_SAMPLE_RATE, START_LOOKAHEAD_BLOCKS,
};
use cadence_core::clock::VirtualClock;
use cadence_core::video::{FrameConverter, PixelFormat};
use cadence_core::Palette;

/// 4096-sample ring of 512-sample blocks.
fn small_ring() -> RingConfig {
    RingConfig {
        block_len_log2: 9,
        block_count_log2: 3,
    }
}

#[test]
fn test_sustained_overflow_keeps_offsets_sane() {
    // Producer writes 10 blocks with no consumer activity into an
    // 8-block ring. Writes 9 and 10 must take the rewind path; the ring
    // must end up holding the 7 oldest blocks plus the newest one, and
    // the fill level must never exceed the ring.
    let (mut producer, mut consumer) = channel(small_ring());
    producer.start();

    let block_len = small_ring().block_len() as usize;
    for b in 0..10u16 {
        let block = vec![SAMPLE_CENTER.wrapping_add(b); block_len];
        producer.write(&block);
        assert!(
            producer.filled_blocks() <= small_ring().block_count(),
            "fill level exceeded the ring after block {}",
            b
        );
    }

    // Drain everything and check which blocks survived
    let mut dst = vec![0i16; small_ring().ring_len() as usize];
    consumer.fill(&mut dst);

    for (i, &sample) in dst.iter().enumerate() {
        let block = i / block_len;
        let expect = if block < 7 { block as i16 } else { 9 };
        assert_eq!(sample, expect, "sample {} in block {}", i, block);
    }
}

#[test]
fn test_feedback_loop_holds_fill_level() {
    // Ten simulated seconds of the real wiring: the clock paces ticks,
    // each tick produces its slice of samples, a fake device callback
    // drains at the device rate, and the per-second feedback nudges the
    // clock. The fill level must neither run away nor collapse.
    const SAMPLES_PER_TICK: usize = 370; // ~= 22255 / 60.15
    const CALLBACK_PERIOD_MS: u32 = 23;
    const CALLBACK_LEN: usize = 512; // ~= 22255 * 0.023

    let (mut producer, mut consumer) = channel(RingConfig::default());
    let mut clock = VirtualClock::new();
    clock.reset(0);
    producer.start();

    let tone: Vec<u16> = (0..SAMPLES_PER_TICK)
        .map(|i| SAMPLE_CENTER.wrapping_add(if i % 60 < 30 { 0x200 } else { 0 }))
        .collect();

    let mut emulated_to = 0u32;
    let mut heard_tone = false;

    for now in 1..=10_000u32 {
        if clock.advance(now) {
            while emulated_to < clock.ticks() {
                producer.write(&tone);
                emulated_to += 1;
            }
        }
        if now % CALLBACK_PERIOD_MS == 0 {
            let mut dst = [0i16; CALLBACK_LEN];
            consumer.fill(&mut dst);
            heard_tone |= dst.iter().any(|&s| s == 0x200);
        }
        if now % 1000 == 0 {
            producer.second_notify(&mut clock);
        }
    }

    assert!(heard_tone, "playback never started");
    assert!(
        producer.filled_blocks() <= RingConfig::default().block_count(),
        "fill level ran away"
    );
    // Production kept pace with the device within the feedback's reach:
    // ~601 paced ticks, less the steps the correction withheld while it
    // drained the start-up overfill toward the target watermark
    assert!(
        (585..=615).contains(&clock.ticks()),
        "tick count drifted: {}",
        clock.ticks()
    );
}

#[test]
fn test_stop_from_another_thread_reaches_silence() {
    let (mut producer, mut consumer) = channel(small_ring());
    producer.start();

    let block_len = small_ring().block_len() as usize;
    let loud = vec![SAMPLE_CENTER.wrapping_add(0x2000); block_len];
    for _ in 0..START_LOOKAHEAD_BLOCKS {
        producer.write(&loud);
    }

    // Fake device thread: keeps the callback cadence going until told
    // to quit, like a real audio subsystem would
    let done = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let done_flag = std::sync::Arc::clone(&done);
    let device = std::thread::spawn(move || {
        while !done_flag.load(std::sync::atomic::Ordering::Relaxed) {
            let mut dst = [0i16; 256];
            consumer.fill(&mut dst);
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    });

    std::thread::sleep(std::time::Duration::from_millis(30));
    let silent = producer.stop();
    done.store(true, std::sync::atomic::Ordering::Relaxed);
    device.join().unwrap();

    assert!(silent, "stop ramp never reached the center line");
}

#[test]
fn test_dirty_rows_match_full_conversion() {
    const WIDTH: usize = 64;
    const HEIGHT: usize = 48;

    let comps: Vec<u16> = (0..256).map(|i| (i as u16) << 8).collect();
    let palette = Palette {
        reds: comps.clone(),
        greens: comps.clone(),
        blues: comps,
    };

    let mut conv = FrameConverter::new(WIDTH, PixelFormat::EightBpp);
    conv.set_palette(&palette);

    // Deterministic pattern with row-to-row variation
    let src: Vec<u8> = (0..WIDTH * HEIGHT)
        .map(|i| ((i * 7 + i / WIDTH) % 256) as u8)
        .collect();

    let mut full = vec![0u16; WIDTH * HEIGHT];
    conv.convert(&src, &mut full, WIDTH * HEIGHT);

    // Reconvert in three dirty-row batches into a separate buffer
    let mut partial = vec![0u16; WIDTH * HEIGHT];
    for (top, bottom) in [(0, 10), (10, 37), (37, HEIGHT)] {
        conv.convert_rows(&src, &mut partial, WIDTH, top, bottom);
    }

    assert_eq!(partial, full);
}

#[test]
fn test_sample_rate_constant_matches_device() {
    // The frontend opens the device at this rate; the tick slice size
    // used above is derived from it
    assert_eq!(SOUND_SAMPLE_RATE, 22255);
}
