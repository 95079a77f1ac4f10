use portsweep::config::{PortRange, ScanConfig};
use portsweep::ConfigError;

#[test]
fn range_shorthand_matches_flags() {
    let parsed: PortRange = "1-1024".parse().expect("parse ok");
    let cfg = ScanConfig::validate("localhost", 1, 1024, 500, 500).unwrap();
    assert_eq!(parsed, cfg.range);
    assert_eq!(parsed.to_string(), "1-1024");
}

#[test]
fn out_of_bounds_range_rejected() {
    assert_eq!(
        ScanConfig::validate("localhost", 0, 10, 1, 1),
        Err(ConfigError::InvalidRange { start: 0, end: 10 })
    );
    assert_eq!(
        ScanConfig::validate("localhost", 1, 65_536, 1, 1),
        Err(ConfigError::InvalidRange { start: 1, end: 65_536 })
    );
}

#[test]
fn missing_target_rejected_before_scanning() {
    assert_eq!(
        ScanConfig::validate("", 1, 1024, 500, 500),
        Err(ConfigError::EmptyTarget)
    );
    assert_eq!(
        ScanConfig::validate(" \t", 1, 1024, 500, 500),
        Err(ConfigError::EmptyTarget)
    );
}
