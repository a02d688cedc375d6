// Poller stop signal

use tokio::sync::watch;

/// Observed by the polling task; flips once when tracking ends
#[derive(Clone)]
pub struct StopToken {
    rx: watch::Receiver<bool>,
}

impl StopToken {
    /// Check if stop was requested
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the stop signal
    pub async fn wait(&mut self) {
        // Sender dropped means the poller itself is gone
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

/// Held by the poller
pub struct StopSender {
    tx: watch::Sender<bool>,
}

impl StopSender {
    /// Signal stop; repeated calls are no-ops
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn token(&self) -> StopToken {
        StopToken {
            rx: self.tx.subscribe(),
        }
    }
}

/// Create a stop channel
pub fn stop_channel() -> (StopSender, StopToken) {
    let (tx, rx) = watch::channel(false);
    (StopSender { tx }, StopToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_is_idempotent_and_wakes_waiters() {
        let (sender, mut token) = stop_channel();
        assert!(!token.is_stopped());

        let waiter = tokio::spawn(async move {
            token.wait().await;
            token.is_stopped()
        });

        sender.stop();
        sender.stop();

        assert!(waiter.await.unwrap());
        assert!(sender.token().is_stopped());
    }
}
