use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation token shared across the orchestrator and every
/// agent. There is no preemption (§9 design notes): a blocked operation
/// checks `is_cancelled()` or races `cancelled()` against its own future at
/// its own suspension points.
///
/// # Examples
///
/// ```
/// use attest_core::cancellation::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<tokio::sync::Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let already_cancelled = self.cancelled.swap(true, Ordering::SeqCst);
        if !already_cancelled {
            self.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation has been requested; resolves immediately
    /// if it already has been.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::CancellationToken;

    #[tokio::test]
    async fn unit_cancelled_resolves_immediately_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        tokio::time::timeout(std::time::Duration::from_millis(50), token.cancelled())
            .await
            .expect("cancelled() should resolve without waiting");
    }

    #[tokio::test]
    async fn functional_cancel_wakes_pending_waiters() {
        let token = CancellationToken::new();
        let waiter_token = token.clone();
        let waiter = tokio::spawn(async move {
            waiter_token.cancelled().await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        token.cancel();
        tokio::time::timeout(std::time::Duration::from_millis(200), waiter)
            .await
            .expect("waiter should complete")
            .expect("waiter task should not panic");
    }
}
