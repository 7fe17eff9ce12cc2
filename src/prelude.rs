pub use crate::config::EngineSettings;
pub use crate::control::{ControlSnapshot, ControlSurface, NUM_KNOBS};
pub use crate::control::midi_controls::{MidiControls, list_midi_ports};
pub use crate::framework::logging::init_logger;
pub use crate::io::audio::{AudioInput, list_audio_devices};
pub use crate::render::capture::{PixelCapture, WgpuPixelCapture};
pub use crate::render::feedback::{CompositeParams, FeedbackCompositor};
pub use crate::render::frame::Frame;
pub use crate::render::gpu::GpuContext;
pub use crate::runtime::engine::RewindEngine;
pub use crate::runtime::export::{
    load_snapshot, save_snapshot, write_entry_png,
};
pub use crate::runtime::history::{
    DEFAULT_MAX_HISTORY, FramePixels, FrameStore, HistoryEntry,
};
pub use crate::runtime::playback::{PlaybackController, PlaybackMode};
pub use crate::runtime::registry::{ModeInfo, ModeRegistry};

pub use log::{debug, error, info, trace, warn};
