//! Reentrant lock with bounded acquisition.

use std::cell::RefCell;
use std::time::Duration;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// A reentrant mutex whose acquisition gives up after `timeout`.
///
/// The owning thread may lock again while already holding the guard. Data
/// sits in a `RefCell`, so callers must drop any `borrow_mut` before running
/// code that can re-enter. Failing to acquire within the timeout means some
/// holder is stuck; that is reported and the calling thread panics.
pub(crate) struct TimedReentrantLock<T> {
    name: &'static str,
    timeout: Duration,
    inner: ReentrantMutex<RefCell<T>>,
}

impl<T> TimedReentrantLock<T> {
    pub(crate) fn new(name: &'static str, timeout: Duration, value: T) -> Self {
        Self {
            name,
            timeout,
            inner: ReentrantMutex::new(RefCell::new(value)),
        }
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Acquire the lock.
    ///
    /// # Panics
    ///
    /// Panics if the lock cannot be acquired within the configured timeout.
    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, RefCell<T>> {
        match self.inner.try_lock_for(self.timeout) {
            Some(guard) => guard,
            None => {
                log::error!(
                    "Timed out after {:?} waiting for {} lock; a holder appears stuck",
                    self.timeout,
                    self.name
                );
                panic!(
                    "{} lock not acquired within {:?} (possible deadlock)",
                    self.name, self.timeout
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_reentrant_acquisition() {
        let lock = TimedReentrantLock::new("test", Duration::from_millis(100), 0u32);
        let outer = lock.lock();
        *outer.borrow_mut() += 1;
        {
            let inner = lock.lock();
            *inner.borrow_mut() += 1;
        }
        assert_eq!(*outer.borrow(), 2);
    }

    #[test]
    fn test_timeout_panics() {
        let lock = Arc::new(TimedReentrantLock::new(
            "test",
            Duration::from_millis(20),
            (),
        ));
        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                let _guard = lock.lock();
                held_tx.send(()).unwrap();
                release_rx.recv().unwrap();
            })
        };
        held_rx.recv().unwrap();

        let waiter = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                let _guard = lock.lock();
            })
        };
        assert!(waiter.join().is_err());

        release_tx.send(()).unwrap();
        holder.join().unwrap();
        assert_eq!(lock.timeout(), Duration::from_millis(20));
    }
}
