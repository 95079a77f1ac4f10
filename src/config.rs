use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Highest port value accepted as a range bound.
pub const MAX_PORT: u32 = 65_535;

/// Half-open port range `[start, end)`. `start == end` is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    /// Build a range, enforcing `1 <= start <= end <= 65535`.
    pub fn new(start: u32, end: u32) -> Result<Self, ConfigError> {
        if start < 1 || end > MAX_PORT || start > end {
            return Err(ConfigError::InvalidRange { start, end });
        }
        Ok(Self {
            start: start as u16,
            end: end as u16,
        })
    }

    pub fn len(&self) -> usize {
        usize::from(self.end.saturating_sub(self.start))
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, port: u16) -> bool {
        self.ports().contains(&port)
    }

    pub fn ports(&self) -> Range<u16> {
        self.start..self.end
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Parse `START-END` (end exclusive), e.g. `1-1024`.
impl FromStr for PortRange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| ConfigError::ParsePort(s.to_string()))?;
        PortRange::new(parse_port_str(a.trim())?, parse_port_str(b.trim())?)
    }
}

fn parse_port_str(s: &str) -> Result<u32, ConfigError> {
    s.parse::<u32>()
        .map_err(|_| ConfigError::ParsePort(s.to_string()))
}

/// Validated parameters for one scan invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub target: String,
    pub range: PortRange,
    pub workers: usize,
    pub timeout: Duration,
}

impl ScanConfig {
    /// Check raw user input. Nothing is scanned if this fails.
    pub fn validate(
        target: &str,
        start: u32,
        end: u32,
        workers: usize,
        timeout_ms: u64,
    ) -> Result<Self, ConfigError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(ConfigError::EmptyTarget);
        }
        let range = PortRange::new(start, end)?;
        if workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(Self {
            target: target.to_string(),
            range,
            workers,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}
