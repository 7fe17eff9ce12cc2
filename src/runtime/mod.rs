pub mod engine;
pub mod export;
pub mod history;
pub mod playback;
pub mod registry;
