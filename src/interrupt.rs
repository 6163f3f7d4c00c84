use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::warn;

/// 128 + SIGINT, as a shell reports it.
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Default)]
struct Inner {
    raised: AtomicBool,
    notify: Notify,
}

/// Cooperative Ctrl-C handling.
///
/// Once raised it stays raised for the rest of the run; callers check it at
/// their own boundaries instead of being torn down mid-write. A second
/// Ctrl-C exits the process immediately.
#[derive(Clone, Default)]
pub struct Interrupt {
    inner: Arc<Inner>,
}

impl Interrupt {
    /// Take over Ctrl-C for this process and return the handle it raises.
    pub fn install() -> Self {
        let interrupt = Self::default();
        let handle = interrupt.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("cannot listen for Ctrl-C: {e}");
                    break;
                }
                if handle.is_raised() {
                    warn!("interrupted twice; exiting");
                    std::process::exit(EXIT_INTERRUPTED);
                }
                warn!("interrupted; finishing up without further tracker changes (Ctrl-C again to exit now)");
                handle.raise();
            }
        });
        interrupt
    }

    pub fn raise(&self) {
        self.inner.raised.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_raised(&self) -> bool {
        self.inner.raised.load(Ordering::SeqCst)
    }

    /// Resolves once the interrupt has been raised.
    pub async fn raised(&self) {
        let notified = self.inner.notify.notified();
        if self.is_raised() {
            return;
        }
        notified.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_clear_and_stays_raised() {
        let interrupt = Interrupt::default();
        assert!(!interrupt.is_raised());
        interrupt.raise();
        assert!(interrupt.is_raised());
        assert!(interrupt.clone().is_raised());
    }

    #[tokio::test]
    async fn raised_wakes_waiters() {
        let interrupt = Interrupt::default();
        let waiter = interrupt.clone();
        let task = tokio::spawn(async move { waiter.raised().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        interrupt.raise();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("waiter woke")
            .unwrap();
    }

    #[tokio::test]
    async fn raised_returns_immediately_when_already_set() {
        let interrupt = Interrupt::default();
        interrupt.raise();
        tokio::time::timeout(Duration::from_millis(100), interrupt.raised())
            .await
            .expect("no wait");
    }
}
