pub mod capture;
pub mod feedback;
pub mod frame;
pub mod gpu;
