pub mod config;
pub mod detectors;
pub mod error;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod signal;
pub mod synth;

pub use config::*;
pub use detectors::*;
pub use error::*;
pub use metrics::*;
pub use pipeline::*;
pub use signal::*;
