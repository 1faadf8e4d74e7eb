pub mod algorithms;
pub mod compatibility;
pub mod config;
pub mod data_loader;
pub mod detected_points;
pub mod error;
pub mod frame_buffer;
pub mod io;
pub mod metrics;
pub mod region;
pub mod stages;
pub mod sweep;
pub mod types;
pub mod visualization;

pub use algorithms::AlgorithmRegistry;
pub use config::SweepConfig;
pub use error::{BenchError, Result};
pub use sweep::Sweep;
