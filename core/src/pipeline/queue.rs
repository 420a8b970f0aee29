use crate::sensor::Detection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

/// Item carried from the detection feed to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum IngressMessage {
    Detection(Detection),
    /// Consumer drains everything queued before this and then stops.
    Shutdown,
}

/// Result of one bounded wait on the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Message(IngressMessage),
    Timeout,
    /// Every producer handle has been dropped.
    Closed,
    Interrupted,
}

/// Producer side. Cheap to clone; safe to use from non-async callbacks since
/// sends never block.
#[derive(Debug, Clone)]
pub struct IngressHandle {
    tx: mpsc::UnboundedSender<IngressMessage>,
    interrupt: Arc<Notify>,
}

impl IngressHandle {
    /// Returns `false` once the consumer is gone.
    pub fn push(&self, detection: Detection) -> bool {
        self.tx.send(IngressMessage::Detection(detection)).is_ok()
    }

    /// Enqueues each detection of one notification individually, in order.
    /// Returns how many were enqueued.
    pub fn push_batch<I>(&self, batch: I) -> usize
    where
        I: IntoIterator<Item = Detection>,
    {
        batch
            .into_iter()
            .take_while(|detection| self.push(*detection))
            .count()
    }

    pub fn shutdown(&self) -> bool {
        self.tx.send(IngressMessage::Shutdown).is_ok()
    }

    /// Asks the consumer to stop at its next wake-up without draining the
    /// queue. Open windows are still flushed.
    pub fn interrupt(&self) {
        self.interrupt.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side, owned by the driver.
#[derive(Debug)]
pub struct IngressQueue {
    rx: mpsc::UnboundedReceiver<IngressMessage>,
    interrupt: Arc<Notify>,
}

impl IngressQueue {
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Received {
        tokio::select! {
            biased;
            _ = self.interrupt.notified() => Received::Interrupted,
            result = tokio::time::timeout(timeout, self.rx.recv()) => match result {
                Ok(Some(message)) => Received::Message(message),
                Ok(None) => Received::Closed,
                Err(_) => Received::Timeout,
            },
        }
    }
}

pub fn ingress_channel() -> (IngressHandle, IngressQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    let interrupt = Arc::new(Notify::new());
    (
        IngressHandle {
            tx,
            interrupt: interrupt.clone(),
        },
        IngressQueue { rx, interrupt },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn batch_preserves_order() {
        let (handle, mut queue) = ingress_channel();
        let batch = vec![Detection::new(1, 10.0, 20.0), Detection::new(2, 11.0, 21.0)];
        assert_eq!(handle.push_batch(batch.clone()), 2);

        for expected in batch {
            assert_eq!(
                queue.recv_timeout(Duration::from_secs(1)).await,
                Received::Message(IngressMessage::Detection(expected))
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn empty_queue_times_out() {
        let (_handle, mut queue) = ingress_channel();
        assert_eq!(
            queue.recv_timeout(Duration::from_secs(1)).await,
            Received::Timeout
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_producers_close_the_queue() {
        let (handle, mut queue) = ingress_channel();
        handle.shutdown();
        drop(handle);
        assert_eq!(
            queue.recv_timeout(Duration::from_secs(1)).await,
            Received::Message(IngressMessage::Shutdown)
        );
        assert_eq!(
            queue.recv_timeout(Duration::from_secs(1)).await,
            Received::Closed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_wins_over_pending_items() {
        let (handle, mut queue) = ingress_channel();
        handle.push(Detection::new(1, 10.0, 20.0));
        handle.interrupt();
        assert_eq!(
            queue.recv_timeout(Duration::from_secs(1)).await,
            Received::Interrupted
        );
    }

    #[tokio::test(start_paused = true)]
    async fn push_fails_after_consumer_drops() {
        let (handle, queue) = ingress_channel();
        drop(queue);
        assert!(handle.is_closed());
        assert!(!handle.push(Detection::new(1, 10.0, 20.0)));
        assert_eq!(handle.push_batch(vec![Detection::new(1, 1.0, 1.0)]), 0);
    }
}
