//! Rewind / fast-forward / reverse-playback state machine over a
//! [`FrameStore`].
//!
//! All navigation returns `bool`: `false` means "nothing happened" (empty or
//! out-of-range history). Nothing here panics or returns an error; a failed
//! scrub must never be able to take down the render loop.

use log::debug;

use crate::control::ControlSurface;
use crate::runtime::history::FrameStore;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PlaybackMode {
    /// Normal forward rendering; the store keeps capturing in the background.
    #[default]
    Live,
    /// The user has stepped into history; new captures are suppressed.
    ManualStep,
    /// Automatic continuous stepping backward through history, once per tick.
    ReversePlayback,
}

#[derive(Debug)]
pub struct PlaybackController {
    mode: PlaybackMode,
    reverse_speed: usize,
    reverse_loop: bool,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::with_options(1, false)
    }

    /// Starts Live; `reverse_loop` only takes effect once reverse playback
    /// is entered.
    pub fn with_options(reverse_speed: usize, reverse_loop: bool) -> Self {
        Self {
            mode: PlaybackMode::Live,
            reverse_speed: reverse_speed.max(1),
            reverse_loop,
        }
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_live(&self) -> bool {
        self.mode == PlaybackMode::Live
    }

    pub fn reverse_speed(&self) -> usize {
        self.reverse_speed
    }

    pub fn set_reverse_speed(&mut self, speed: usize) {
        self.reverse_speed = speed.max(1);
    }

    pub fn reverse_loop(&self) -> bool {
        self.reverse_loop
    }

    /// Steps one entry into the past and restores it onto the surface.
    ///
    /// Rewinding past the oldest entry does not fail: with the cursor already
    /// at 0 (or unset) and a non-empty history, this auto-starts continuous
    /// reverse playback from the tail instead.
    pub fn rewind(
        &mut self,
        store: &mut FrameStore,
        surface: &mut ControlSurface,
    ) -> bool {
        if store.is_empty() {
            return false;
        }

        let cursor = store.cursor_index();

        if cursor > 0 {
            let target = (cursor - 1) as usize;
            store.seek(target);
            Self::restore_entry(store, surface, target);
            self.mode = PlaybackMode::ManualStep;
            return true;
        }

        // Rewinding past the oldest manual step wraps into continuous
        // reverse playback from the tail.
        let tail = store.len() - 1;
        store.seek(tail);
        Self::restore_entry(store, surface, tail);
        self.mode = PlaybackMode::ReversePlayback;
        debug!("rewind past start; entering reverse playback");
        true
    }

    /// Steps one entry forward. While in reverse playback this instead
    /// cancels it: the cursor jumps to the tail and the mode returns to Live.
    pub fn fast_forward(
        &mut self,
        store: &mut FrameStore,
        surface: &mut ControlSurface,
    ) -> bool {
        if self.mode == PlaybackMode::ReversePlayback {
            if store.is_empty() {
                self.mode = PlaybackMode::Live;
                return false;
            }
            let tail = store.len() - 1;
            store.seek(tail);
            Self::restore_entry(store, surface, tail);
            self.mode = PlaybackMode::Live;
            return true;
        }

        if !store.can_step_forward() {
            return false;
        }

        let target = (store.cursor_index() + 1) as usize;
        store.seek(target);
        Self::restore_entry(store, surface, target);

        self.mode = if target == store.len() - 1 {
            PlaybackMode::Live
        } else {
            PlaybackMode::ManualStep
        };
        true
    }

    /// Advances reverse playback by one tick: decrements the cursor by
    /// `reverse_speed` (clamped at 0) and restores the entry it lands on.
    /// At index 0 the walk either wraps to the tail (`reverse_loop`) or ends,
    /// returning to Live. An empty store is not an error; reverse playback
    /// simply waits for frames.
    pub fn update_reverse_playback(
        &mut self,
        store: &mut FrameStore,
        surface: &mut ControlSurface,
    ) {
        if self.mode != PlaybackMode::ReversePlayback {
            return;
        }

        if store.is_empty() {
            return;
        }

        let cursor = store.cursor_index();

        if cursor <= 0 {
            if self.reverse_loop {
                let tail = store.len() - 1;
                store.seek(tail);
                Self::restore_entry(store, surface, tail);
            } else {
                self.mode = PlaybackMode::Live;
                debug!("reverse playback reached oldest frame; going live");
            }
            return;
        }

        let target = (cursor as usize).saturating_sub(self.reverse_speed);
        store.seek(target);
        Self::restore_entry(store, surface, target);
    }

    /// Toggles looping reverse playback, entering or leaving the
    /// ReversePlayback state immediately.
    pub fn set_reverse_loop(&mut self, enabled: bool) {
        self.reverse_loop = enabled;
        if enabled {
            self.mode = PlaybackMode::ReversePlayback;
        } else if self.mode == PlaybackMode::ReversePlayback {
            self.mode = PlaybackMode::Live;
        }
    }

    pub fn stop_reverse_playback(&mut self) {
        if self.mode == PlaybackMode::ReversePlayback {
            self.mode = PlaybackMode::Live;
        }
    }

    /// Absolute seek. Out of range is a no-op returning `false`. Landing on
    /// the tail resumes Live; anywhere else is a manual step.
    pub fn jump_to_frame(
        &mut self,
        store: &mut FrameStore,
        surface: &mut ControlSurface,
        index: usize,
    ) -> bool {
        if !store.seek(index) {
            return false;
        }

        Self::restore_entry(store, surface, index);

        self.mode = if index == store.len() - 1 {
            PlaybackMode::Live
        } else {
            PlaybackMode::ManualStep
        };
        true
    }

    fn restore_entry(
        store: &FrameStore,
        surface: &mut ControlSurface,
        index: usize,
    ) {
        if let Some(entry) = store.entry_at(index) {
            surface.restore(&entry.controls);
        }
    }
}
