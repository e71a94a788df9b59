pub mod config;
pub mod genes;
pub mod protocol;

pub use config::*;
pub use genes::*;
pub use protocol::*;

/// Version of the metrics line format written by drivers
pub const RECORD_FORMAT_VERSION: u32 = 1;
