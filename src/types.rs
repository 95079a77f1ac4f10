use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::{format_description::well_known, OffsetDateTime};

use crate::config::ScanConfig;

/// Outcome of one scan, as rendered to the console or written as JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub target: String,
    /// First port scanned.
    pub start: u16,
    /// One past the last port scanned.
    pub end: u16,
    pub workers: usize,
    pub timeout_ms: u64,
    pub open_ports: Vec<u16>,
    pub cancelled: bool,
    pub started_at: String,
    pub elapsed_ms: u64,
}

impl ScanReport {
    pub fn new(cfg: &ScanConfig, started_at: OffsetDateTime) -> Self {
        Self {
            target: cfg.target.clone(),
            start: cfg.range.start,
            end: cfg.range.end,
            workers: cfg.workers,
            timeout_ms: millis(cfg.timeout),
            open_ports: Vec::new(),
            cancelled: false,
            started_at: rfc3339(started_at),
            elapsed_ms: 0,
        }
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_carries_config_and_serializes() {
        let cfg = ScanConfig::validate("127.0.0.1", 20, 30, 4, 250).unwrap();
        let mut report = ScanReport::new(&cfg, OffsetDateTime::UNIX_EPOCH);
        report.open_ports = vec![22];

        assert_eq!(report.started_at, "1970-01-01T00:00:00Z");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["target"], "127.0.0.1");
        assert_eq!(json["end"], 30);
        assert_eq!(json["timeout_ms"], 250);
        assert_eq!(json["open_ports"], serde_json::json!([22]));
    }

    #[test]
    fn millis_saturates_instead_of_wrapping() {
        assert_eq!(millis(Duration::from_millis(1_500)), 1_500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}
