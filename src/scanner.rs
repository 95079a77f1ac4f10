use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, trace};
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::PortRange;
use crate::error::ScanError;
use crate::latch::{Latch, LatchGuard};
use crate::probe::{Prober, TcpProber};

type JobQueue = Arc<Mutex<mpsc::Receiver<u16>>>;

/// Scan `range` on `host` with `workers` concurrent TCP connect probes.
///
/// - Ports are fed to the workers in ascending order through a queue holding
///   at most `workers` pending ports.
/// - Each connect attempt is bounded by `timeout`.
/// - Cancellation is cooperative: a probe already in flight finishes, no new
///   probe starts once `cancel` fires.
///
/// Returns the open ports sorted ascending. If `cancel` fired during the scan
/// the ports found so far are returned inside [`ScanError::Cancelled`].
pub async fn scan_range(
    cancel: &CancellationToken,
    host: &str,
    range: PortRange,
    workers: usize,
    timeout: Duration,
) -> Result<Vec<u16>, ScanError> {
    scan_range_with(TcpProber, cancel, host, range, workers, timeout).await
}

/// Same as [`scan_range`], with an explicit [`Prober`].
pub async fn scan_range_with<P: Prober>(
    prober: P,
    cancel: &CancellationToken,
    host: &str,
    range: PortRange,
    workers: usize,
    timeout: Duration,
) -> Result<Vec<u16>, ScanError> {
    if range.is_empty() {
        return finish(cancel, Vec::new());
    }

    let workers = workers.max(1);
    let started = Instant::now();
    debug!("scanning {host} ports {range} with {workers} workers, timeout {timeout:?}");

    let host: Arc<str> = Arc::from(host);
    let prober = Arc::new(prober);
    let (job_tx, job_rx) = mpsc::channel::<u16>(workers);
    let job_rx: JobQueue = Arc::new(Mutex::new(job_rx));
    // Room for every port in the range, so a worker never blocks on publishing.
    let (result_tx, mut result_rx) = mpsc::channel::<u16>(range.len());
    let latch = Latch::new(workers);

    for id in 0..workers {
        tokio::spawn(worker(
            id,
            prober.clone(),
            host.clone(),
            timeout,
            job_rx.clone(),
            result_tx.clone(),
            cancel.clone(),
            latch.guard(),
        ));
    }

    tokio::spawn(feed(range, job_tx, cancel.clone()));

    tokio::spawn(async move {
        latch.wait().await;
        drop(result_tx);
    });

    let mut open = Vec::new();
    while let Some(port) = result_rx.recv().await {
        open.push(port);
    }
    open.sort_unstable();

    debug!(
        "scan of {host} finished in {}ms, {} open",
        started.elapsed().as_millis(),
        open.len()
    );
    finish(cancel, open)
}

/// Probe each port of `range` one after another on the calling task.
pub async fn scan_range_sequential(
    cancel: &CancellationToken,
    host: &str,
    range: PortRange,
    timeout: Duration,
) -> Result<Vec<u16>, ScanError> {
    scan_range_sequential_with(TcpProber, cancel, host, range, timeout).await
}

pub async fn scan_range_sequential_with<P: Prober>(
    prober: P,
    cancel: &CancellationToken,
    host: &str,
    range: PortRange,
    timeout: Duration,
) -> Result<Vec<u16>, ScanError> {
    let mut open = Vec::new();
    for port in range.ports() {
        if cancel.is_cancelled() {
            info!("sequential scan of {host} cancelled before port {port}");
            return Err(ScanError::Cancelled { open });
        }
        if prober.probe(host, port, timeout).await {
            debug!("{host}:{port} open");
            open.push(port);
        }
    }
    finish(cancel, open)
}

#[allow(clippy::too_many_arguments)]
async fn worker<P: Prober>(
    id: usize,
    prober: Arc<P>,
    host: Arc<str>,
    timeout: Duration,
    jobs: JobQueue,
    results: mpsc::Sender<u16>,
    cancel: CancellationToken,
    _done: LatchGuard,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                trace!("worker {id} cancelled");
                return;
            }
            port = next_job(&jobs) => port,
        };
        let Some(port) = next else {
            trace!("worker {id} drained");
            return;
        };

        if prober.probe(&host, port, timeout).await {
            debug!("{host}:{port} open");
            if results.send(port).await.is_err() {
                return;
            }
        }
    }
}

async fn next_job(jobs: &Mutex<mpsc::Receiver<u16>>) -> Option<u16> {
    jobs.lock().await.recv().await
}

/// Enqueue every port in ascending order. Dropping `jobs` on return closes
/// the work queue, on completion and on cancellation alike.
async fn feed(range: PortRange, jobs: mpsc::Sender<u16>, cancel: CancellationToken) {
    for port in range.ports() {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("feeder stopped before port {port}");
                return;
            }
            sent = jobs.send(port) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
}

fn finish(cancel: &CancellationToken, open: Vec<u16>) -> Result<Vec<u16>, ScanError> {
    if cancel.is_cancelled() {
        info!("scan cancelled with {} open port(s) found", open.len());
        Err(ScanError::Cancelled { open })
    } else {
        Ok(open)
    }
}
