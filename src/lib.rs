//! Library crate for portsweep: a concurrent TCP connect port scanner.
pub mod config;
pub mod error;
pub mod latch;
pub mod probe;
pub mod scanner;
pub mod types;

pub use error::{ConfigError, ScanError};
