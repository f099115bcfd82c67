//! CLI command implementations.

pub mod cancel;
pub mod common;
pub mod devices;
pub mod estimate;
pub mod result;
pub mod sample;
pub mod status;
pub mod wait;
