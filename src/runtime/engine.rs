//! Per-tick driver facade tying the frame store and the playback state
//! machine together. This is the surface the input-handling layer and the
//! render loop talk to; individual drawing modes never touch history
//! directly.

use log::info;

use crate::config::EngineSettings;
use crate::control::ControlSurface;
use crate::runtime::history::{FramePixels, FrameStore};
use crate::runtime::playback::{PlaybackController, PlaybackMode};

pub struct RewindEngine {
    store: FrameStore,
    playback: PlaybackController,
}

impl Default for RewindEngine {
    fn default() -> Self {
        Self::new(FrameStore::default())
    }
}

impl RewindEngine {
    pub fn new(store: FrameStore) -> Self {
        Self {
            store,
            playback: PlaybackController::new(),
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        let mut store = FrameStore::new(settings.max_history_size);
        store.set_capture_interval(settings.capture_interval);

        let playback = PlaybackController::with_options(
            settings.reverse_speed,
            settings.reverse_loop,
        );

        info!(
            "rewind engine ready: history={} interval={}",
            settings.max_history_size, settings.capture_interval
        );

        Self { store, playback }
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn playback_mode(&self) -> PlaybackMode {
        self.playback.mode()
    }

    /// Called unconditionally once per tick by the driver. An entry is only
    /// recorded while live (scrubbing or reverse playback must not truncate
    /// the very history being walked) and only on sampling ticks; `pixels`
    /// runs just when an entry is actually recorded.
    pub fn capture_frame(
        &mut self,
        surface: &ControlSurface,
        pixels: impl FnOnce() -> Option<FramePixels>,
    ) -> bool {
        if !self.playback.is_live() {
            return false;
        }

        self.store.capture_sampled(surface.snapshot(), pixels)
    }

    /// Advances reverse playback when active. Call once per tick, after
    /// [`RewindEngine::capture_frame`].
    pub fn tick(&mut self, surface: &mut ControlSurface) {
        self.playback
            .update_reverse_playback(&mut self.store, surface);
    }

    pub fn rewind(&mut self, surface: &mut ControlSurface) -> bool {
        self.playback.rewind(&mut self.store, surface)
    }

    pub fn fast_forward(&mut self, surface: &mut ControlSurface) -> bool {
        self.playback.fast_forward(&mut self.store, surface)
    }

    pub fn jump_to_frame(
        &mut self,
        surface: &mut ControlSurface,
        index: usize,
    ) -> bool {
        self.playback
            .jump_to_frame(&mut self.store, surface, index)
    }

    pub fn set_reverse_loop(&mut self, enabled: bool) {
        self.playback.set_reverse_loop(enabled);
    }

    pub fn stop_reverse_playback(&mut self) {
        self.playback.stop_reverse_playback();
    }

    pub fn can_rewind(&self) -> bool {
        !self.store.is_empty()
    }

    pub fn can_fast_forward(&self) -> bool {
        self.store.can_step_forward()
            || self.playback.mode() == PlaybackMode::ReversePlayback
    }

    pub fn current_index(&self) -> isize {
        self.store.cursor_index()
    }

    pub fn history_size(&self) -> usize {
        self.store.len()
    }

    pub fn set_max_history_size(&mut self, max_size: usize) {
        self.store.set_max_size(max_size);
    }

    pub fn set_capture_interval(&mut self, interval: u32) {
        self.store.set_capture_interval(interval);
    }

    pub fn clear_history(&mut self) {
        self.store.clear();
        self.playback.stop_reverse_playback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_with_knob(value: f32) -> ControlSurface {
        let mut surface = ControlSurface::new();
        surface.set_knob(0, value);
        surface
    }

    #[test]
    fn capture_is_suppressed_while_scrubbing() {
        let mut engine = RewindEngine::new(FrameStore::new(8));
        let mut surface = surface_with_knob(0.1);

        assert!(engine.capture_frame(&surface, || None));
        surface.set_knob(0, 0.2);
        assert!(engine.capture_frame(&surface, || None));

        assert!(engine.rewind(&mut surface));
        assert_eq!(engine.playback_mode(), PlaybackMode::ManualStep);

        surface.set_knob(0, 0.9);
        assert!(!engine.capture_frame(&surface, || None));
        assert_eq!(engine.history_size(), 2);
    }

    #[test]
    fn capture_resumes_after_returning_to_live() {
        let mut engine = RewindEngine::new(FrameStore::new(8));
        let mut surface = surface_with_knob(0.1);

        engine.capture_frame(&surface, || None);
        engine.capture_frame(&surface, || None);
        engine.rewind(&mut surface);
        assert!(engine.fast_forward(&mut surface));
        assert_eq!(engine.playback_mode(), PlaybackMode::Live);

        assert!(engine.capture_frame(&surface, || None));
        assert_eq!(engine.history_size(), 3);
    }

    #[test]
    fn tick_only_advances_during_reverse_playback() {
        let mut engine = RewindEngine::new(FrameStore::new(8));
        let mut surface = surface_with_knob(0.5);

        for _ in 0..3 {
            engine.capture_frame(&surface, || None);
        }

        engine.tick(&mut surface);
        assert_eq!(engine.current_index(), 2);

        engine.set_reverse_loop(true);
        engine.tick(&mut surface);
        assert_eq!(engine.current_index(), 1);
    }

    #[test]
    fn availability_flags_track_cursor_and_mode() {
        let mut engine = RewindEngine::new(FrameStore::new(8));
        let mut surface = surface_with_knob(0.5);

        assert!(!engine.can_rewind());
        assert!(!engine.can_fast_forward());

        engine.capture_frame(&surface, || None);
        engine.capture_frame(&surface, || None);
        assert!(engine.can_rewind());
        assert!(!engine.can_fast_forward());

        engine.rewind(&mut surface);
        assert!(engine.can_fast_forward());

        engine.set_reverse_loop(true);
        assert!(engine.can_fast_forward());
    }

    #[test]
    fn from_settings_applies_bounds_and_speed() {
        let settings = EngineSettings {
            max_history_size: 4,
            capture_interval: 2,
            reverse_speed: 3,
            ..Default::default()
        };
        let mut engine = RewindEngine::from_settings(&settings);
        let surface = surface_with_knob(0.5);

        for _ in 0..12 {
            engine.capture_frame(&surface, || None);
        }

        assert_eq!(engine.history_size(), 4);
        assert_eq!(engine.playback().reverse_speed(), 3);
        assert_eq!(engine.store().capture_interval(), 2);
    }
}
