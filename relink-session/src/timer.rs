/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! One-shot timer slots.
//!
//! Each [`TimerSlot`] owns at most one live scheduled task. Re-arming aborts
//! any previously scheduled instance before spawning a new one, so a slot can
//! never fire twice for one arming and no timer kind ever has two live
//! instances.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A cancellable one-shot scheduled task.
///
/// Requires a Tokio runtime context when armed.
#[derive(Debug, Default)]
pub(crate) struct TimerSlot {
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    /// Creates an empty, unarmed slot.
    pub(crate) fn new() -> Self {
        Self { handle: None }
    }

    /// Schedules `action` to run after `delay`, cancelling any previously
    /// scheduled instance first.
    pub(crate) fn arm<F>(&mut self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        }));
    }

    /// Aborts the scheduled instance, if any.
    pub(crate) fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether an instance is currently scheduled.
    ///
    /// A finished task still counts as disarmed.
    #[cfg(test)]
    pub(crate) fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_armed_timer_fires_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut slot = TimerSlot::new();

        let counter = Arc::clone(&fired);
        slot.arm(Duration::from_millis(10), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(slot.is_armed());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!slot.is_armed());
    }

    #[tokio::test]
    async fn test_rearm_cancels_previous_instance() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut slot = TimerSlot::new();

        for _ in 0..3 {
            let counter = Arc::clone(&fired);
            slot.arm(Duration::from_millis(20), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_prevents_firing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut slot = TimerSlot::new();

        let counter = Arc::clone(&fired);
        slot.arm(Duration::from_millis(10), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        slot.cancel();
        assert!(!slot.is_armed());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
