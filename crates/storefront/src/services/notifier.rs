//! Cart change broadcast.
//!
//! Successful cart mutations call [`CartNotifier::notify`] with the owner's
//! token; anything that shows cart state (the SSE stream behind the header
//! badge) subscribes for one token and re-reads that cart when woken. Changes
//! to other visitors' carts never reach a subscription.

use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use tipsy_tank_core::SessionToken;

/// Buffered signals per subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 64;

/// "This visitor's cart changed, re-read it."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartChanged {
    pub token: SessionToken,
}

/// Fan-out of [`CartChanged`] signals. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CartNotifier {
    sender: broadcast::Sender<CartChanged>,
}

impl Default for CartNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CartNotifier {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Signal that `token`'s cart changed. Never blocks; a no-op without listeners.
    pub fn notify(&self, token: &SessionToken) {
        // Err only means nobody is listening.
        let _ = self.sender.send(CartChanged {
            token: token.clone(),
        });
    }

    /// Start listening for changes to `token`'s cart. Dropping the
    /// subscription detaches it.
    #[must_use]
    pub fn subscribe(&self, token: SessionToken) -> CartSubscription {
        CartSubscription {
            token,
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A live registration with a [`CartNotifier`] for one visitor.
#[derive(Debug)]
pub struct CartSubscription {
    token: SessionToken,
    receiver: broadcast::Receiver<CartChanged>,
}

impl CartSubscription {
    /// The visitor this subscription follows.
    #[must_use]
    pub const fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Wait for the next change to this visitor's cart.
    ///
    /// Signals that piled up while the subscriber was busy collapse into one.
    /// A lag overflow counts as a change, since the dropped signals may have
    /// been ours. Returns `false` once the notifier is gone.
    pub async fn changed(&mut self) -> bool {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.token != self.token => {}
                Ok(_) | Err(RecvError::Lagged(_)) => {
                    self.drain();
                    return true;
                }
                Err(RecvError::Closed) => return false,
            }
        }
    }

    fn drain(&mut self) {
        loop {
            match self.receiver.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    /// The subscription as a stream yielding one item per (coalesced) change.
    pub fn into_stream(self) -> impl Stream<Item = CartChanged> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            if subscription.changed().await {
                let change = CartChanged {
                    token: subscription.token.clone(),
                };
                Some((change, subscription))
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;

    #[test]
    fn test_notify_without_listeners_is_noop() {
        let notifier = CartNotifier::new();
        assert_eq!(notifier.subscriber_count(), 0);
        notifier.notify(&SessionToken::generate());
    }

    #[tokio::test]
    async fn test_every_subscription_for_the_token_is_woken() {
        let notifier = CartNotifier::new();
        let token = SessionToken::generate();
        let mut tab_a = notifier.subscribe(token.clone());
        let mut tab_b = notifier.subscribe(token.clone());

        notifier.notify(&token);
        assert!(tab_a.changed().await);
        assert!(tab_b.changed().await);
    }

    #[tokio::test]
    async fn test_other_visitors_changes_are_not_delivered() {
        let notifier = CartNotifier::new();
        let alice = SessionToken::generate();
        let bob = SessionToken::generate();
        let mut bob_sub = notifier.subscribe(bob.clone());

        notifier.notify(&alice);
        let woke = tokio::time::timeout(Duration::from_millis(50), bob_sub.changed()).await;
        assert!(woke.is_err(), "alice's change reached bob");

        notifier.notify(&alice);
        notifier.notify(&bob);
        assert!(bob_sub.changed().await);
    }

    #[tokio::test]
    async fn test_bursts_coalesce() {
        let notifier = CartNotifier::new();
        let token = SessionToken::generate();
        let mut sub = notifier.subscribe(token.clone());
        for _ in 0..(CHANNEL_CAPACITY * 2) {
            notifier.notify(&token);
        }

        assert!(sub.changed().await);
        let again = tokio::time::timeout(Duration::from_millis(50), sub.changed()).await;
        assert!(again.is_err(), "burst should collapse into one change");
    }

    #[tokio::test]
    async fn test_dropping_subscription_detaches() {
        let notifier = CartNotifier::new();
        let sub = notifier.subscribe(SessionToken::generate());
        assert_eq!(notifier.subscriber_count(), 1);
        drop(sub);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_stream_ends_when_notifier_dropped() {
        let notifier = CartNotifier::new();
        let token = SessionToken::generate();
        let stream = notifier.subscribe(token.clone()).into_stream();
        notifier.notify(&SessionToken::generate());
        notifier.notify(&token);
        drop(notifier);

        let items: Vec<_> = stream.collect().await;
        assert_eq!(items, vec![CartChanged { token }]);
    }
}
