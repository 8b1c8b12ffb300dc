use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::{TimedOut, Timeout};

struct State {
    count: u32,
    closed: bool,
}

struct Shared {
    state: Mutex<State>,
    available: Condvar,
}

/// Counting semaphore with bounded waits.
///
/// Clones share one counter. Deleting the semaphore wakes every waiter
/// with [`TimedOut`], the same answer an elapsed wait gives.
pub struct Semaphore {
    shared: Option<Arc<Shared>>,
}

impl Clone for Semaphore {
    fn clone(&self) -> Self {
        Semaphore {
            shared: self.shared.clone(),
        }
    }
}

impl Semaphore {
    pub fn new(initial: u32) -> Self {
        Semaphore {
            shared: Some(Arc::new(Shared {
                state: Mutex::new(State {
                    count: initial,
                    closed: false,
                }),
                available: Condvar::new(),
            })),
        }
    }

    /// Handle that owns no semaphore.
    pub fn invalid() -> Self {
        Semaphore { shared: None }
    }

    pub fn is_valid(&self) -> bool {
        self.shared.is_some()
    }

    /// Nulls this handle without affecting other clones.
    pub fn invalidate(&mut self) {
        self.shared = None;
    }

    /// Closes the semaphore for every clone and wakes all waiters.
    pub fn delete(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.state.lock().closed = true;
            shared.available.notify_all();
        }
    }

    /// Takes one unit within `timeout`, returning how long the take
    /// actually waited.
    pub fn wait(&self, timeout: Timeout) -> Result<Duration, TimedOut> {
        let shared = self.shared.as_ref().ok_or(TimedOut)?;
        let started = Instant::now();
        let deadline = timeout.bound().map(|bound| started + bound);

        let mut state = shared.state.lock();
        loop {
            if state.closed {
                return Err(TimedOut);
            }
            if state.count > 0 {
                state.count -= 1;
                return Ok(started.elapsed());
            }
            match deadline {
                None => shared.available.wait(&mut state),
                Some(deadline) => {
                    if shared
                        .available
                        .wait_until(&mut state, deadline)
                        .timed_out()
                    {
                        // A release can race the deadline; take it if so.
                        if !state.closed && state.count > 0 {
                            state.count -= 1;
                            return Ok(started.elapsed());
                        }
                        return Err(TimedOut);
                    }
                }
            }
        }
    }

    /// Takes one unit only if it is immediately available.
    pub fn try_wait(&self) -> bool {
        let Some(shared) = self.shared.as_ref() else {
            return false;
        };
        let mut state = shared.state.lock();
        if !state.closed && state.count > 0 {
            state.count -= 1;
            true
        } else {
            false
        }
    }

    /// Returns one unit, waking a waiter. False when the handle is
    /// invalid or the semaphore was deleted.
    pub fn release(&self) -> bool {
        let Some(shared) = self.shared.as_ref() else {
            return false;
        };
        let mut state = shared.state.lock();
        if state.closed {
            return false;
        }
        state.count = state.count.saturating_add(1);
        shared.available.notify_one();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn counts_down_then_blocks() {
        let sem = Semaphore::new(2);
        assert!(sem.wait(Timeout::Forever).is_ok());
        assert!(sem.wait(Timeout::Forever).is_ok());
        assert!(!sem.try_wait());
        assert_eq!(sem.wait(Timeout::from_millis(20)).err(), Some(TimedOut));
    }

    #[test]
    fn release_wakes_a_waiter() {
        let sem = Semaphore::new(0);
        let waiter = sem.clone();
        let handle = thread::spawn(move || waiter.wait(Timeout::Forever));

        thread::sleep(Duration::from_millis(20));
        assert!(sem.release());
        assert!(handle.join().unwrap().is_ok());
    }

    #[test]
    fn bounded_wait_spans_the_full_budget() {
        let sem = Semaphore::new(0);
        let started = Instant::now();
        assert_eq!(sem.wait(Timeout::from_millis(30)).err(), Some(TimedOut));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn delete_wakes_waiters_with_timeout() {
        let mut sem = Semaphore::new(0);
        let waiter = sem.clone();
        let handle = thread::spawn(move || waiter.wait(Timeout::Forever));

        thread::sleep(Duration::from_millis(20));
        sem.delete();
        assert_eq!(handle.join().unwrap().err(), Some(TimedOut));
    }

    #[test]
    fn release_fails_once_deleted() {
        let mut sem = Semaphore::new(0);
        let other = sem.clone();
        sem.delete();
        assert!(!other.release());
        assert!(!other.try_wait());
    }

    #[test]
    fn invalid_handle_reports_timeout() {
        let sem = Semaphore::invalid();
        assert!(!sem.is_valid());
        assert_eq!(sem.wait(Timeout::from_millis(5)).err(), Some(TimedOut));
        assert!(!sem.release());
    }
}
