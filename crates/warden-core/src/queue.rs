//! Bounded hand-off of admin actions from request workers to the
//! simulation thread.
//!
//! Workers call [`ActionQueue::submit`], which never blocks. The simulation
//! loop drains the [`ActionReceiver`] once per tick, in submission order.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use warden_types::ScheduledAction;

/// Why an action could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The queue is at capacity.
    #[error("action queue is full")]
    Full,
    /// The simulation loop has stopped.
    #[error("action queue is closed")]
    Closed,
}

/// Create a queue holding at most `capacity` pending actions (minimum 1).
pub fn action_queue(capacity: usize) -> (ActionQueue, ActionReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ActionQueue { tx }, ActionReceiver { rx })
}

/// Submitting side, cloned into every request worker.
#[derive(Debug, Clone)]
pub struct ActionQueue {
    tx: mpsc::Sender<ScheduledAction>,
}

impl ActionQueue {
    /// Queue an action without waiting.
    pub fn submit(&self, action: ScheduledAction) -> Result<(), QueueError> {
        self.tx.try_send(action).map_err(|err| match err {
            TrySendError::Full(_) => QueueError::Full,
            TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}

/// Draining side, owned by the simulation loop.
#[derive(Debug)]
pub struct ActionReceiver {
    rx: mpsc::Receiver<ScheduledAction>,
}

impl ActionReceiver {
    /// Take up to `max` pending actions, oldest first, without waiting.
    pub fn drain(&mut self, max: usize) -> Vec<ScheduledAction> {
        let mut batch = Vec::new();
        while batch.len() < max {
            match self.rx.try_recv() {
                Ok(action) => batch.push(action),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        batch
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use warden_types::{AdminAction, PlayerId};

    fn heal(name: &str) -> ScheduledAction {
        ScheduledAction {
            target: PlayerId::from_name(name),
            action: AdminAction::Heal,
        }
    }

    #[test]
    fn fifo_order() {
        let (queue, mut receiver) = action_queue(8);
        queue.submit(heal("a")).unwrap();
        queue.submit(heal("b")).unwrap();
        queue.submit(heal("c")).unwrap();

        let batch = receiver.drain(2);
        assert_eq!(batch, vec![heal("a"), heal("b")]);
        assert_eq!(receiver.drain(10), vec![heal("c")]);
        assert!(receiver.drain(10).is_empty());
    }

    #[test]
    fn full_queue_rejects_without_blocking() {
        let (queue, _receiver) = action_queue(1);
        queue.submit(heal("a")).unwrap();
        assert_eq!(queue.submit(heal("b")), Err(QueueError::Full));
    }

    #[test]
    fn closed_queue_rejects() {
        let (queue, receiver) = action_queue(4);
        drop(receiver);
        assert_eq!(queue.submit(heal("a")), Err(QueueError::Closed));
    }
}
