//! End-to-end scrubbing behavior through the public engine API.

use strata::prelude::*;

fn surface_with(tag: f32, samples: Vec<i16>) -> ControlSurface {
    let mut surface = ControlSurface::new();
    surface.set_knob(0, tag);
    surface.set_knob(1, 1.0 - tag);
    surface.set_audio_samples(samples);
    surface.set_active_mode(Some("echo".to_string()));
    surface
}

#[test]
fn capture_rewind_and_reverse_scenario() {
    // max history 3; capture A, B, C, D.
    let settings = EngineSettings {
        max_history_size: 3,
        ..Default::default()
    };
    let mut engine = RewindEngine::from_settings(&settings);

    for (tag, label) in [(0.1, "A"), (0.2, "B"), (0.3, "C"), (0.4, "D")] {
        let mut surface = surface_with(tag, vec![(tag * 1000.0) as i16]);
        surface.set_active_mode(Some(label.to_string()));
        assert!(engine.capture_frame(&surface, || None));
    }

    // A evicted; history holds [B, C, D] with the cursor at the tail.
    assert_eq!(engine.history_size(), 3);
    assert_eq!(engine.current_index(), 2);
    assert_eq!(
        engine.store().entry_at(0).unwrap().controls.active_mode.as_deref(),
        Some("B")
    );

    let mut surface = ControlSurface::new();

    // Two rewinds land on B.
    assert!(engine.rewind(&mut surface));
    assert!(engine.rewind(&mut surface));
    assert_eq!(engine.current_index(), 0);
    assert_eq!(surface.active_mode(), Some("B"));
    assert_eq!(surface.knob(0), 0.2);
    assert_eq!(engine.playback_mode(), PlaybackMode::ManualStep);

    // Rewinding past the oldest entry flips into reverse playback from the
    // tail, restoring D.
    assert!(engine.rewind(&mut surface));
    assert_eq!(engine.playback_mode(), PlaybackMode::ReversePlayback);
    assert_eq!(engine.current_index(), 2);
    assert_eq!(surface.active_mode(), Some("D"));
}

#[test]
fn jump_to_frame_restores_every_field() {
    let mut engine = RewindEngine::default();

    let recorded = surface_with(0.6, vec![42, -17, 9000]);
    engine.capture_frame(&recorded, || None);
    engine.capture_frame(&surface_with(0.9, vec![1]), || None);

    let mut live = ControlSurface::new();
    assert!(engine.jump_to_frame(&mut live, 0));

    let entry = engine.store().entry_at(0).unwrap();
    assert_eq!(live.knobs(), &entry.controls.knobs);
    assert_eq!(live.trigger(), entry.controls.trigger);
    assert_eq!(live.audio_samples(), entry.controls.audio_samples);
    assert_eq!(
        live.active_mode(),
        entry.controls.active_mode.as_deref()
    );

    // The restored buffer is a copy; mutating the live surface leaves
    // history untouched.
    live.set_audio_samples(vec![0]);
    assert_eq!(
        engine.store().entry_at(0).unwrap().controls.audio_samples,
        vec![42, -17, 9000]
    );
}

#[test]
fn jump_out_of_range_is_a_failed_noop() {
    let mut engine = RewindEngine::default();
    engine.capture_frame(&surface_with(0.5, vec![]), || None);

    let mut surface = ControlSurface::new();
    assert!(!engine.jump_to_frame(&mut surface, 5));
    assert_eq!(engine.current_index(), 0);
    assert_eq!(engine.playback_mode(), PlaybackMode::Live);
}

#[test]
fn capture_with_cursor_in_the_past_discards_the_future() {
    let mut store = FrameStore::new(10);
    let mut surface = ControlSurface::new();
    let mut playback = PlaybackController::new();

    for tag in [0.1, 0.2, 0.3, 0.4] {
        store.capture(surface_with(tag, vec![]).snapshot(), None);
    }
    assert!(playback.jump_to_frame(&mut store, &mut surface, 1));

    store.capture(surface_with(0.9, vec![]).snapshot(), None);

    // cursor was k=1; result is length k+2 with old[k] then the new entry.
    assert_eq!(store.len(), 3);
    assert_eq!(store.entry_at(1).unwrap().controls.knobs[0], 0.2);
    assert_eq!(store.entry_at(2).unwrap().controls.knobs[0], 0.9);
    assert_eq!(store.cursor_index(), 2);
}

#[test]
fn manual_step_suppresses_engine_captures() {
    let mut engine = RewindEngine::default();
    for tag in [0.1, 0.2, 0.3, 0.4] {
        engine.capture_frame(&surface_with(tag, vec![]), || None);
    }

    let mut surface = ControlSurface::new();
    assert!(engine.jump_to_frame(&mut surface, 1));
    assert!(!engine.capture_frame(&surface_with(0.9, vec![]), || None));
    assert_eq!(engine.history_size(), 4);

    // Stepping forward to the tail goes live again and capture resumes.
    assert!(engine.fast_forward(&mut surface));
    assert!(engine.fast_forward(&mut surface));
    assert_eq!(engine.playback_mode(), PlaybackMode::Live);
    assert!(engine.capture_frame(&surface_with(0.9, vec![]), || None));
    assert_eq!(engine.history_size(), 5);
}

#[test]
fn reverse_loop_cycles_until_cancelled_by_fast_forward() {
    let mut engine = RewindEngine::default();
    for tag in [0.1, 0.2, 0.3] {
        engine.capture_frame(&surface_with(tag, vec![]), || None);
    }

    let mut surface = ControlSurface::new();
    engine.set_reverse_loop(true);

    let mut seen = Vec::new();
    for _ in 0..8 {
        engine.tick(&mut surface);
        assert_eq!(engine.playback_mode(), PlaybackMode::ReversePlayback);
        seen.push(engine.current_index());
    }
    assert_eq!(seen, vec![1, 0, 2, 1, 0, 2, 1, 0]);

    assert!(engine.fast_forward(&mut surface));
    assert_eq!(engine.playback_mode(), PlaybackMode::Live);
    assert_eq!(engine.current_index(), 2);
    assert_eq!(surface.knob(0), 0.3);
}

#[test]
fn sampled_capture_records_pixels_only_on_recording_ticks() {
    let settings = EngineSettings {
        capture_interval: 3,
        ..Default::default()
    };
    let mut engine = RewindEngine::from_settings(&settings);

    let mut pixel_reads = 0;
    for _ in 0..9 {
        engine.capture_frame(&surface_with(0.5, vec![]), || {
            pixel_reads += 1;
            Some(FramePixels {
                width: 2,
                height: 1,
                data: vec![255; 8],
            })
        });
    }

    assert_eq!(engine.history_size(), 3);
    assert_eq!(pixel_reads, 3);
    assert!(engine.store().entry_at(2).unwrap().pixels.is_some());
}
