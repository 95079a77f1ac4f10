use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Countdown of live workers. `wait` resolves once the count reaches zero.
#[derive(Debug, Clone)]
pub struct Latch {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    remaining: AtomicUsize,
    done: Notify,
}

impl Latch {
    pub fn new(count: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                remaining: AtomicUsize::new(count),
                done: Notify::new(),
            }),
        }
    }

    pub fn remaining(&self) -> usize {
        self.inner.remaining.load(Ordering::Acquire)
    }

    /// Decrement once. The call that takes the count to zero wakes all waiters.
    pub fn count_down(&self) {
        let prev = self
            .inner
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if prev == Ok(1) {
            self.inner.done.notify_waiters();
        }
    }

    /// Guard that counts down exactly once when dropped, whatever the exit path.
    pub fn guard(&self) -> LatchGuard {
        LatchGuard {
            latch: self.clone(),
        }
    }

    pub async fn wait(&self) {
        loop {
            // Register interest before checking, so a count_down between the
            // check and the await is not missed.
            let notified = self.inner.done.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.remaining() == 0 {
                return;
            }
            notified.await;
        }
    }
}

pub struct LatchGuard {
    latch: Latch,
}

impl Drop for LatchGuard {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn zero_count_is_already_open() {
        Latch::new(0).wait().await;
    }

    #[tokio::test]
    async fn waits_for_every_guard() {
        let latch = Latch::new(3);
        let guards: Vec<_> = (0..3).map(|_| latch.guard()).collect();

        let waiter = tokio::spawn({
            let latch = latch.clone();
            async move { latch.wait().await }
        });

        for g in guards {
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert!(!waiter.is_finished());
            drop(g);
        }
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("latch released")
            .unwrap();
        assert_eq!(latch.remaining(), 0);
    }

    #[test]
    fn count_down_saturates_at_zero() {
        let latch = Latch::new(1);
        latch.count_down();
        latch.count_down();
        assert_eq!(latch.remaining(), 0);
    }
}
