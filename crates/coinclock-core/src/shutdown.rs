//! Cooperative shutdown signal shared by the daemon and the HTTP server.

use tokio::sync::watch;

/// Creates a connected trigger/listener pair.
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownTrigger { sender }, Shutdown { receiver })
}

/// Owner side: requests shutdown.
#[derive(Debug)]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    /// A new listener observing this trigger.
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Listener side, cloned into every task that must stop on shutdown.
///
/// Dropping the trigger counts as a shutdown request, so an orphaned
/// listener never waits forever.
#[derive(Debug, Clone)]
pub struct Shutdown {
    receiver: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow() || self.receiver.has_changed().is_err()
    }

    /// Resolves once shutdown has been requested.
    pub async fn triggered(&mut self) {
        // Err means the trigger was dropped.
        let _ = self.receiver.wait_for(|requested| *requested).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn listener_wakes_when_triggered() {
        let (trigger, mut shutdown) = channel();
        assert!(!shutdown.is_triggered());

        let waiter = tokio::spawn(async move {
            shutdown.triggered().await;
            shutdown.is_triggered()
        });

        trigger.trigger();
        let observed = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("listener should wake")
            .expect("task should not panic");
        assert!(observed);
    }

    #[tokio::test]
    async fn late_subscribers_see_an_earlier_trigger() {
        let (trigger, _shutdown) = channel();
        trigger.trigger();
        trigger.trigger();

        let mut late = trigger.subscribe();
        assert!(late.is_triggered());
        tokio::time::timeout(Duration::from_millis(100), late.triggered())
            .await
            .expect("already triggered");
    }

    #[tokio::test]
    async fn dropping_the_trigger_releases_listeners() {
        let (trigger, mut shutdown) = channel();
        drop(trigger);

        assert!(shutdown.is_triggered());
        tokio::time::timeout(Duration::from_millis(100), shutdown.triggered())
            .await
            .expect("dropped trigger should release the listener");
    }
}
