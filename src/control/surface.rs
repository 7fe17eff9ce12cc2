//! The live control surface: the mutable state every drawing mode reads once
//! per tick, and the thing the playback engine overwrites when scrubbing
//! through history.

use serde::{Deserialize, Serialize};

/// Number of continuous control values on the surface.
pub const NUM_KNOBS: usize = 7;

/// Live, mutable control state. Owned by the driver and passed by `&mut` to
/// anything that needs to read or restore it; there is deliberately no global
/// instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlSurface {
    knobs: [f32; NUM_KNOBS],
    trigger: bool,
    audio_samples: Vec<i16>,
    active_mode: Option<String>,
}

impl ControlSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn knob(&self, index: usize) -> f32 {
        self.knobs.get(index).copied().unwrap_or(0.0)
    }

    pub fn knobs(&self) -> &[f32; NUM_KNOBS] {
        &self.knobs
    }

    /// Values are clamped to [0, 1]; out-of-range indices are ignored.
    pub fn set_knob(&mut self, index: usize, value: f32) {
        if let Some(knob) = self.knobs.get_mut(index) {
            *knob = value.clamp(0.0, 1.0);
        }
    }

    pub fn trigger(&self) -> bool {
        self.trigger
    }

    pub fn set_trigger(&mut self, on: bool) {
        self.trigger = on;
    }

    pub fn audio_samples(&self) -> &[i16] {
        &self.audio_samples
    }

    pub fn set_audio_samples(&mut self, samples: Vec<i16>) {
        self.audio_samples = samples;
    }

    pub fn active_mode(&self) -> Option<&str> {
        self.active_mode.as_deref()
    }

    pub fn set_active_mode(&mut self, mode: Option<String>) {
        self.active_mode = mode;
    }

    /// Copies the full surface state into an immutable snapshot. The audio
    /// buffer is cloned; later mutation of the live buffer never alters a
    /// snapshot that has already been taken.
    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            knobs: self.knobs,
            trigger: self.trigger,
            audio_samples: self.audio_samples.clone(),
            active_mode: self.active_mode.clone(),
        }
    }

    /// Restore contract: assigns every field from the snapshot, including the
    /// audio buffer, so modes that derive visuals from audio see historically
    /// consistent input while scrubbing.
    pub fn restore(&mut self, snapshot: &ControlSnapshot) {
        self.knobs = snapshot.knobs;
        self.trigger = snapshot.trigger;
        self.audio_samples = snapshot.audio_samples.clone();
        self.active_mode = snapshot.active_mode.clone();
    }
}

/// Immutable copy of the control surface at a single instant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    pub knobs: [f32; NUM_KNOBS],
    pub trigger: bool,
    pub audio_samples: Vec<i16>,
    pub active_mode: Option<String>,
}
