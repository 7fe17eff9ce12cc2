pub mod config;
pub mod control;
pub mod framework;
pub mod io;
pub mod prelude;
pub mod render;
pub mod runtime;

pub use crate::config::EngineSettings;
pub use crate::control::{ControlSnapshot, ControlSurface, NUM_KNOBS};
pub use crate::framework::logging::init_logger;
pub use crate::render::capture::{PixelCapture, WgpuPixelCapture};
pub use crate::render::feedback::{CompositeParams, FeedbackCompositor};
pub use crate::render::frame::Frame;
pub use crate::render::gpu::GpuContext;
pub use crate::runtime::engine::RewindEngine;
pub use crate::runtime::history::{
    DEFAULT_MAX_HISTORY, FramePixels, FrameStore, HistoryEntry,
};
pub use crate::runtime::playback::{PlaybackController, PlaybackMode};
pub use crate::runtime::registry::{ModeInfo, ModeRegistry};
