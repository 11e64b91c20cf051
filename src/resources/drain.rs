//! In-flight reader barrier.
//!
//! Render passes take a [`ReadLease`] while they read a realization. Unloading
//! waits on [`DrainBarrier::wait_drained`] until every lease is returned, so
//! a realization is never released underneath a pass that is still using it.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
pub struct DrainBarrier {
    readers: Mutex<usize>,
    drained: Condvar,
}

impl DrainBarrier {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers one in-flight reader.
    #[must_use]
    pub fn enter(self: &Arc<Self>) -> ReadLease {
        *self.readers.lock() += 1;
        ReadLease {
            barrier: Arc::clone(self),
        }
    }

    #[must_use]
    pub fn active_readers(&self) -> usize {
        *self.readers.lock()
    }

    /// Blocks until no lease is outstanding.
    ///
    /// Calling this while the current thread holds a lease deadlocks.
    pub fn wait_drained(&self) {
        let mut readers = self.readers.lock();
        while *readers > 0 {
            self.drained.wait(&mut readers);
        }
    }

    fn leave(&self) {
        let mut readers = self.readers.lock();
        *readers -= 1;
        if *readers == 0 {
            self.drained.notify_all();
        }
    }
}

/// RAII token for one in-flight reader.
#[derive(Debug)]
pub struct ReadLease {
    barrier: Arc<DrainBarrier>,
}

impl Drop for ReadLease {
    fn drop(&mut self) {
        self.barrier.leave();
    }
}
