use tokio::sync::{Mutex, Notify};

use swarm_domain::CallResult;

/// A single-shot completion primitive keyed by call id.
///
/// The call driver awaits [`CallSignal::wait`] while the media bridge (or,
/// in the simulated path, the driver itself) calls [`CallSignal::fulfill`]
/// exactly once. A second fulfillment is a no-op, matching the idempotency
/// contract of the original `asyncio.Event`-backed completion signal.
#[derive(Debug, Default)]
pub struct CallSignal {
    notify: Notify,
    result: Mutex<Option<CallResult>>,
}

impl CallSignal {
    pub fn new() -> Self {
        Self {
            notify: Notify::new(),
            result: Mutex::new(None),
        }
    }

    pub async fn fulfill(&self, result: CallResult) {
        let mut guard = self.result.lock().await;
        if guard.is_some() {
            return;
        }
        *guard = Some(result);
        drop(guard);
        self.notify.notify_waiters();
    }

    /// Blocks until the signal has been fulfilled, returning the result.
    pub async fn wait(&self) -> CallResult {
        loop {
            {
                let guard = self.result.lock().await;
                if let Some(result) = guard.as_ref() {
                    return result.clone();
                }
            }
            self.notify.notified().await;
        }
    }

    pub async fn is_fulfilled(&self) -> bool {
        self.result.lock().await.is_some()
    }
}
