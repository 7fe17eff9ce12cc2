//! Bounded, truncatable history of captured frames.
//!
//! Each entry pairs a [`ControlSnapshot`] with the pixels that were on screen
//! when it was taken (pixels may be absent when GPU readback failed; the
//! control state is still recorded). History is strictly linear: appending
//! while the cursor sits in the past discards everything after the cursor
//! first, the same way an editor discards redo state after a fresh edit.

use std::collections::VecDeque;
use std::time::Instant;

use crate::control::ControlSnapshot;

pub const DEFAULT_MAX_HISTORY: usize = 60;

/// CPU-side RGBA8 pixel buffer with a top-left image origin.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePixels {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FramePixels {
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub captured_at: Instant,
    pub pixels: Option<FramePixels>,
    pub controls: ControlSnapshot,
}

/// Ring of [`HistoryEntry`] values with a current-position cursor.
///
/// The cursor is `-1` only while the store is empty; otherwise it always
/// addresses a valid entry. Entries are never mutated after creation; they
/// only leave the store through front eviction, branch-discard truncation, or
/// `clear`.
#[derive(Debug)]
pub struct FrameStore {
    entries: VecDeque<HistoryEntry>,
    cursor: isize,
    max_size: usize,
    capture_interval: u32,
    sample_counter: u32,
}

impl Default for FrameStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl FrameStore {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size.max(1)),
            cursor: -1,
            max_size: max_size.max(1),
            capture_interval: 1,
            sample_counter: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn cursor_index(&self) -> isize {
        self.cursor
    }

    pub fn entry_at(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn can_step_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_step_forward(&self) -> bool {
        !self.is_empty() && self.cursor < self.entries.len() as isize - 1
    }

    /// Appends a new entry at the cursor, discarding any entries after it
    /// (branch-discard), then evicts from the front until the store fits its
    /// bound. The cursor always lands on the new tail.
    pub fn capture(
        &mut self,
        controls: ControlSnapshot,
        pixels: Option<FramePixels>,
    ) {
        if self.cursor >= 0 {
            self.entries.truncate((self.cursor + 1) as usize);
        }

        self.entries.push_back(HistoryEntry {
            captured_at: Instant::now(),
            pixels,
            controls,
        });

        while self.entries.len() > self.max_size {
            self.entries.pop_front();
        }

        self.cursor = self.entries.len() as isize - 1;
    }

    /// Sampling interval in ticks; with an interval of N only every Nth call
    /// to [`FrameStore::capture_sampled`] records an entry. This is the
    /// primary lever for keeping steady-state readback cost low relative to
    /// render rate.
    pub fn set_capture_interval(&mut self, interval: u32) {
        self.capture_interval = interval.max(1);
    }

    pub fn capture_interval(&self) -> u32 {
        self.capture_interval
    }

    /// True when the next [`FrameStore::capture_sampled`] call will record.
    pub fn should_sample(&self) -> bool {
        self.sample_counter % self.capture_interval == 0
    }

    /// Like [`FrameStore::capture`] but honoring the sampling interval.
    /// Returns whether an entry was recorded. The `pixels` closure is only
    /// invoked on recording ticks so skipped ticks cost nothing.
    pub fn capture_sampled(
        &mut self,
        controls: ControlSnapshot,
        pixels: impl FnOnce() -> Option<FramePixels>,
    ) -> bool {
        let sample = self.should_sample();
        self.sample_counter = self.sample_counter.wrapping_add(1);

        if sample {
            self.capture(controls, pixels());
        }

        sample
    }

    /// Shrinking below the current length evicts from the front immediately
    /// and clamps the cursor into range.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size.max(1);

        let mut evicted = 0isize;
        while self.entries.len() > self.max_size {
            self.entries.pop_front();
            evicted += 1;
        }

        if !self.entries.is_empty() {
            self.cursor = (self.cursor - evicted)
                .clamp(0, self.entries.len() as isize - 1);
        } else {
            self.cursor = -1;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = -1;
        self.sample_counter = 0;
    }

    /// Moves the cursor to `index` if it addresses an existing entry.
    pub(crate) fn seek(&mut self, index: usize) -> bool {
        if index < self.entries.len() {
            self.cursor = index as isize;
            true
        } else {
            false
        }
    }
}
