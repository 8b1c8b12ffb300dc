use std::sync::Arc;

use crate::{TimedOut, Timeout};

pub type MutexGuard<'a, T> = parking_lot::MutexGuard<'a, T>;

/// Cloneable mutex handle with bounded locking.
///
/// Clones share one lock. Unlocking is the guard going out of scope,
/// not a separate call.
pub struct Mutex<T> {
    shared: Option<Arc<parking_lot::Mutex<T>>>,
}

impl<T> Clone for Mutex<T> {
    fn clone(&self) -> Self {
        Mutex {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Mutex<T> {
    pub fn new(value: T) -> Self {
        Mutex {
            shared: Some(Arc::new(parking_lot::Mutex::new(value))),
        }
    }

    /// Handle that owns no lock.
    pub fn invalid() -> Self {
        Mutex { shared: None }
    }

    pub fn is_valid(&self) -> bool {
        self.shared.is_some()
    }

    /// Nulls this handle without affecting other clones.
    pub fn invalidate(&mut self) {
        self.shared = None;
    }

    /// Deletes this handle. The lock itself is reclaimed once the last
    /// clone drops; waiters on other clones keep working until then.
    pub fn delete(&mut self) {
        self.invalidate();
    }

    /// Acquires the lock within `timeout`. An invalid handle reports
    /// [`TimedOut`].
    pub fn lock(&self, timeout: Timeout) -> Result<MutexGuard<'_, T>, TimedOut> {
        let shared = self.shared.as_ref().ok_or(TimedOut)?;
        match timeout.bound() {
            None => Ok(shared.lock()),
            Some(bound) => shared.try_lock_for(bound).ok_or(TimedOut),
        }
    }

    /// Acquires the lock only if it is free right now.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        self.shared.as_ref()?.try_lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn guard_gives_access_and_releases_on_drop() {
        let mutex = Mutex::new(0u32);
        {
            let mut guard = mutex.lock(Timeout::Forever).unwrap();
            *guard += 1;
        }
        assert_eq!(*mutex.lock(Timeout::Forever).unwrap(), 1);
    }

    #[test]
    fn bounded_lock_times_out_while_held() {
        let mutex = Mutex::new(());
        let contender = mutex.clone();

        let guard = mutex.lock(Timeout::Forever).unwrap();
        let waited = thread::spawn(move || contender.lock(Timeout::from_millis(30)).is_err())
            .join()
            .unwrap();
        assert!(waited);

        drop(guard);
        assert!(mutex.lock(Timeout::from_millis(30)).is_ok());
    }

    #[test]
    fn try_lock_never_blocks() {
        let mutex = Mutex::new(());
        let guard = mutex.lock(Timeout::Forever).unwrap();
        assert!(mutex.try_lock().is_none());
        drop(guard);
        assert!(mutex.try_lock().is_some());
    }

    #[test]
    fn invalid_handle_reports_timeout() {
        let mutex = Mutex::<u32>::invalid();
        assert!(!mutex.is_valid());
        assert_eq!(mutex.lock(Timeout::Forever).err(), Some(TimedOut));
        assert!(mutex.try_lock().is_none());
    }

    #[test]
    fn invalidate_only_nulls_the_local_handle() {
        let mutex = Mutex::new(7u32);
        let mut other = mutex.clone();
        other.invalidate();
        assert!(!other.is_valid());
        assert_eq!(*mutex.lock(Timeout::Forever).unwrap(), 7);

        let mut deleted = mutex.clone();
        deleted.delete();
        assert!(!deleted.is_valid());
        assert_eq!(*mutex.lock(Timeout::Forever).unwrap(), 7);
    }

    #[test]
    fn contended_lock_waits_at_least_the_budget() {
        let mutex = Mutex::new(());
        let contender = mutex.clone();
        let _guard = mutex.lock(Timeout::Forever).unwrap();

        let handle = thread::spawn(move || {
            let started = std::time::Instant::now();
            let result = contender.lock(Timeout::from_millis(30));
            (result.is_err(), started.elapsed())
        });
        let (timed_out, elapsed) = handle.join().unwrap();
        assert!(timed_out);
        assert!(elapsed >= Duration::from_millis(30));
    }
}
