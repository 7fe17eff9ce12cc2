pub mod midi_controls;
pub mod surface;

pub use midi_controls::*;
pub use surface::*;
