use thiserror::Error;

/// Errors surfaced by the scan engine.
///
/// Individual port failures are never errors; a port that cannot be
/// connected to is simply not reported as open.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The scan was cancelled. `open` holds the ports confirmed open before
    /// cancellation took effect, sorted ascending.
    #[error("scan cancelled after finding {} open port(s)", open.len())]
    Cancelled { open: Vec<u16> },
}

impl ScanError {
    /// Open ports gathered before the error, sorted ascending.
    pub fn partial(&self) -> &[u16] {
        match self {
            ScanError::Cancelled { open } => open,
        }
    }
}

/// Invalid scan parameters, rejected before any probe is attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("target is required")]
    EmptyTarget,

    #[error("invalid port range {start}-{end} (need 1 <= start <= end <= 65535)")]
    InvalidRange { start: u32, end: u32 },

    #[error("workers must be > 0")]
    InvalidWorkers,

    #[error("timeout must be > 0ms")]
    InvalidTimeout,

    #[error("invalid port value: {0}")]
    ParsePort(String),
}
