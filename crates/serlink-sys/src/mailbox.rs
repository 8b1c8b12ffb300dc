use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use parking_lot::Mutex;

use crate::{tick, TimedOut, Timeout};

struct Shared<T> {
    /// Taken by `delete`. Dropping the last sender wakes blocked
    /// readers once the queue drains; blocked puts poll the slot.
    tx: Mutex<Option<Sender<T>>>,
    rx: Receiver<T>,
    capacity: usize,
}

/// Fixed-capacity FIFO handed between execution contexts.
///
/// Clones share one queue. `try_put` is safe from contexts that must
/// never block; a full queue is reported, never waited on. Deleting the
/// mailbox lets queued values drain, then blocked `get` calls wake with
/// [`TimedOut`]; a `put` blocked on a full queue wakes with [`TimedOut`]
/// within one tick.
pub struct Mailbox<T> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Mailbox {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Mailbox<T> {
    /// Creates a queue holding at most `capacity` values.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Mailbox {
            shared: Some(Arc::new(Shared {
                tx: Mutex::new(Some(tx)),
                rx,
                capacity,
            })),
        }
    }

    /// Handle that owns no queue.
    pub fn invalid() -> Self {
        Mailbox { shared: None }
    }

    pub fn is_valid(&self) -> bool {
        self.shared.is_some()
    }

    /// Nulls this handle without affecting other clones.
    pub fn invalidate(&mut self) {
        self.shared = None;
    }

    /// Closes the queue for every clone. Later puts fail, blocked puts
    /// wake within one tick, and gets drain what was queued before
    /// reporting [`TimedOut`].
    pub fn delete(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.tx.lock().take();
        }
    }

    fn sender(&self) -> Option<Sender<T>> {
        self.shared.as_ref()?.tx.lock().clone()
    }

    /// Enqueues within `timeout`, returning how long the put waited.
    ///
    /// Waits in one-tick slices, rechecking the sender slot between
    /// them so a concurrent `delete` wakes a blocked put.
    pub fn put(&self, mut value: T, timeout: Timeout) -> Result<Duration, TimedOut> {
        let started = Instant::now();
        let deadline = timeout.bound().map(|bound| started + bound);
        let slice = tick::duration_from_ticks(1);
        loop {
            let Some(tx) = self.sender() else {
                return Err(TimedOut);
            };
            let wait = match deadline {
                None => slice,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(TimedOut);
                    }
                    slice.min(deadline - now)
                }
            };
            match tx.send_timeout(value, wait) {
                Ok(()) => return Ok(started.elapsed()),
                Err(SendTimeoutError::Timeout(returned)) => value = returned,
                Err(SendTimeoutError::Disconnected(_)) => return Err(TimedOut),
            }
        }
    }

    /// Enqueues only if a slot is free right now. Never blocks.
    pub fn try_put(&self, value: T) -> bool {
        match self.sender() {
            Some(tx) => tx.try_send(value).is_ok(),
            None => false,
        }
    }

    /// Dequeues within `timeout`, returning the value and how long the
    /// get waited.
    pub fn get(&self, timeout: Timeout) -> Result<(T, Duration), TimedOut> {
        let shared = self.shared.as_ref().ok_or(TimedOut)?;
        let started = Instant::now();
        let value = match timeout.bound() {
            None => shared.rx.recv().map_err(|_| TimedOut)?,
            Some(bound) => shared.rx.recv_timeout(bound).map_err(|_| TimedOut)?,
        };
        Ok((value, started.elapsed()))
    }

    /// Dequeues only if a value is immediately available. Never blocks.
    pub fn try_get(&self) -> Option<T> {
        self.shared.as_ref()?.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.shared.as_ref().map_or(0, |shared| shared.rx.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.as_ref().map_or(0, |shared| shared.capacity)
    }
}
