//! CLI command implementations.

mod device;
pub mod ingest;
pub mod local;
pub mod quality;
pub mod train;

pub use device::{TrainBackend, init_device};
