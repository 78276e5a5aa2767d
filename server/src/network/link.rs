//! Delayed FIFO links.
//!
//! A link holds every message for a fixed delay after it was sent and then
//! forwards it to its target channel. Messages are never reordered: each one
//! waits until `sent_at + delay`, and they are released in send order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::time::{sleep_until, Instant};

/// Counts messages that were sent on a link but not yet fully handled.
///
/// The receiver of a message calls [`InFlight::exit`] once it is done with
/// it, after sending any messages the handling produced.
#[derive(Debug, Default)]
pub struct InFlight {
    count: AtomicUsize,
    notify: Notify,
}

impl InFlight {
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn enter(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn exit(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Wait until nothing is in flight.
    pub async fn settled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Sending half of a link with a fixed delay.
#[derive(Debug)]
pub struct DelayedLink<T> {
    tx: mpsc::UnboundedSender<(Instant, T)>,
    delay: Duration,
    in_flight: Arc<InFlight>,
}

impl<T: Send + 'static> DelayedLink<T> {
    /// Spawn the forwarding task that delivers into `target`.
    pub fn spawn(
        delay: Duration,
        target: mpsc::UnboundedSender<T>,
        in_flight: Arc<InFlight>,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<(Instant, T)>();
        let counter = in_flight.clone();

        tokio::spawn(async move {
            while let Some((sent_at, message)) = rx.recv().await {
                sleep_until(sent_at + delay).await;
                if target.send(message).is_err() {
                    counter.exit();
                    // Nothing queued behind it can be delivered either
                    rx.close();
                    while rx.recv().await.is_some() {
                        counter.exit();
                    }
                    break;
                }
            }
        });

        Self {
            tx,
            delay,
            in_flight,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Queue a message. Returns false if the link is closed.
    pub fn send(&self, message: T) -> bool {
        self.in_flight.enter();
        if self.tx.send((Instant::now(), message)).is_err() {
            self.in_flight.exit();
            return false;
        }
        true
    }
}
