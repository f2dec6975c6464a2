//! Cooperative cancellation for waits.
//!
//! A [`CancelHandle`] flips a shared flag; every [`CancelToken`] cloned from
//! it observes the change. Tokens whose handle is gone never fire.

use tokio::sync::watch;

/// Owner side: call [`CancelHandle::cancel`] to stop in-flight waits.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Observer side, passed to the wait loop.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelHandle {
    #[must_use]
    pub fn pair() -> (Self, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancelToken { rx })
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl CancelToken {
    /// A token that is never cancelled.
    #[must_use]
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; pends forever if the handle
    /// was dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::never()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_waiting_token() {
        let (handle, token) = CancelHandle::pair();
        let waiter = tokio::spawn(async move { token.cancelled().await });

        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("token should fire")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancel_before_wait_is_seen() {
        let (handle, token) = CancelHandle::pair();
        handle.cancel();
        assert!(token.is_cancelled());
        assert!(handle.token().is_cancelled());
        token.cancelled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_token_does_not_fire() {
        let token = CancelToken::never();
        let fired = tokio::time::timeout(Duration::from_secs(60), token.cancelled()).await;
        assert!(fired.is_err());
        assert!(!token.is_cancelled());
    }
}
