//! Cancellable wait for a late-bound condition.
//!
//! # Data Flow
//! ```text
//! loop:
//!     arm wake-up (Notify)
//!     probe()      → Some(value)  ⇒ done
//!     is_valid()   → false        ⇒ give up (navigation superseded)
//!     wait for wake-up or the poll interval, whichever comes first
//! ```
//!
//! The interval is a fallback for producers that never notify.

use std::time::Duration;

use tokio::sync::Notify;

use crate::navigation::components::ViewInstance;
use crate::routing::record::RouteRecord;

/// Wait until `probe` yields a value, as long as `is_valid` holds.
pub async fn wait_until<T>(
    mut probe: impl FnMut() -> Option<T>,
    is_valid: impl Fn() -> bool,
    wake: &Notify,
    interval: Duration,
) -> Option<T> {
    loop {
        let notified = wake.notified();
        if let Some(value) = probe() {
            return Some(value);
        }
        if !is_valid() {
            return None;
        }
        tokio::select! {
            _ = notified => {}
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

/// Wait for the view layer to register an instance in `slot`.
pub async fn wait_for_instance(
    record: &RouteRecord,
    slot: &str,
    is_valid: impl Fn() -> bool,
    interval: Duration,
) -> Option<ViewInstance> {
    wait_until(|| record.instance(slot), is_valid, record.registrations(), interval).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_returns_immediately_when_ready() {
        let wake = Notify::new();
        let got = wait_until(|| Some(3), || true, &wake, Duration::from_secs(60)).await;
        assert_eq!(got, Some(3));
    }

    #[tokio::test]
    async fn test_gives_up_when_invalid() {
        let wake = Notify::new();
        let got: Option<u8> = wait_until(|| None, || false, &wake, Duration::from_secs(60)).await;
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn test_wakes_on_notify() {
        let wake = Arc::new(Notify::new());
        let ready = Arc::new(AtomicBool::new(false));
        let probes = AtomicUsize::new(0);

        let notifier = {
            let wake = Arc::clone(&wake);
            let ready = Arc::clone(&ready);
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                ready.store(true, Ordering::SeqCst);
                wake.notify_waiters();
            })
        };

        let got = wait_until(
            || {
                probes.fetch_add(1, Ordering::SeqCst);
                ready.load(Ordering::SeqCst).then_some("ok")
            },
            || true,
            &wake,
            Duration::from_secs(60),
        )
        .await;
        notifier.await.unwrap();
        assert_eq!(got, Some("ok"));
        assert!(probes.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_without_notify() {
        let wake = Notify::new();
        let mut remaining = 3;
        let got = wait_until(
            || {
                remaining -= 1;
                (remaining == 0).then_some(())
            },
            || true,
            &wake,
            Duration::from_millis(16),
        )
        .await;
        assert_eq!(got, Some(()));
    }
}
