use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use portsweep::config::{PortRange, ScanConfig};
use portsweep::types::{self, ScanReport};
use portsweep::{scanner, ScanError};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::{info, warn};
use time::OffsetDateTime;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// portsweep — concurrent TCP connect port scanner.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "portsweep",
    version,
    about = "Concurrent TCP connect port scanner with a bounded worker pool.",
    long_about = None
)]
struct Cli {
    /// IP or hostname to scan (must be non-empty).
    #[arg(long, default_value = "")]
    target: String,

    /// First port to scan.
    #[arg(long, default_value_t = 1)]
    start: u32,

    /// Port to stop at (exclusive).
    #[arg(long, default_value_t = 1024)]
    end: u32,

    /// Port range as START-END (END exclusive); overrides --start/--end.
    #[arg(long)]
    range: Option<String>,

    /// Number of concurrent workers.
    #[arg(long, default_value_t = 500)]
    workers: usize,

    /// Per-connection timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = 500)]
    timeout_ms: u64,

    /// Cancel the whole scan after this many milliseconds.
    #[arg(long = "max-duration-ms")]
    max_duration_ms: Option<u64>,

    /// Probe ports one at a time instead of using the worker pool.
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// Write results as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = match config_from_cli(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", format!("Error: {e}").red());
            return Ok(ExitCode::from(2));
        }
    };

    println!("{}", format!("Scanning target: {}", cfg.target).cyan());
    println!("{}", format!("Starting from port: {}", cfg.range.start).green());
    println!("{}", format!("Ending before port: {}", cfg.range.end).green());
    if cli.sequential {
        println!("{}", "Workers: 1 (sequential)".yellow());
    } else {
        println!("{}", format!("Workers: {}", cfg.workers).yellow());
    }
    println!("{}", format!("Timeout: {:?}", cfg.timeout).magenta());

    let cancel = CancellationToken::new();

    // Ctrl-C cancels the scan.
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling scan");
            cancel_ctrlc.cancel();
        }
    });

    if let Some(ms) = cli.max_duration_ms {
        let cancel_deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            info!("scan deadline of {ms}ms reached");
            cancel_deadline.cancel();
        });
    }

    let mut report = ScanReport::new(&cfg, OffsetDateTime::now_utc());
    let started = Instant::now();
    let outcome = if cli.sequential {
        scanner::scan_range_sequential(&cancel, &cfg.target, cfg.range, cfg.timeout).await
    } else {
        scanner::scan_range(&cancel, &cfg.target, cfg.range, cfg.workers, cfg.timeout).await
    };
    report.elapsed_ms = types::millis(started.elapsed());

    let code = match outcome {
        Ok(open) => {
            report.open_ports = open;
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", format!("Error encountered: {e}").red());
            let ScanError::Cancelled { open } = e;
            report.open_ports = open;
            report.cancelled = true;
            ExitCode::from(130)
        }
    };

    print_open_ports(&report);

    if let Some(path) = cli.output.as_deref() {
        match write_report_json(path, &report) {
            Ok(()) => println!("Wrote JSON results to {}", path.display()),
            Err(e) => eprintln!("{}", format!("{e:#}").red()),
        }
    }

    Ok(code)
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn config_from_cli(cli: &Cli) -> Result<ScanConfig, portsweep::ConfigError> {
    let (start, end) = match cli.range.as_deref() {
        Some(r) => {
            let range: PortRange = r.parse()?;
            (u32::from(range.start), u32::from(range.end))
        }
        None => (cli.start, cli.end),
    };
    ScanConfig::validate(&cli.target, start, end, cli.workers, cli.timeout_ms)
}

fn print_open_ports(report: &ScanReport) {
    if report.open_ports.is_empty() {
        println!(
            "{}",
            format!("No open ports found in {}-{}", report.start, report.end).yellow()
        );
        return;
    }
    println!(
        "{}",
        format!("Open ports ({}):", report.open_ports.len()).green()
    );
    for port in &report.open_ports {
        println!("{}", format!("{}:{} open", report.target, port).cyan());
    }
}

fn write_report_json(path: &Path, report: &ScanReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("failed to write JSON to {}", path.display()))?;
    Ok(())
}
