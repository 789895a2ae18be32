//! Single-writer guard for the flat-file data store.
//!
//! The store is read wholesale and replaced atomically (write-to-temp then
//! rename), so readers never need coordination. Writers must hold this lock
//! for the full read-mutate-replace cycle; a second writer fails fast with
//! [`MetricsError::WriteInProgress`] instead of queuing. The lock is owned
//! and injected by the storage-access component, not held as ambient state.

use crate::error::{MetricsError, Result};
use std::sync::{Mutex, MutexGuard, TryLockError};

#[derive(Debug, Default)]
pub struct StoreLock {
    inner: Mutex<()>,
}

pub struct WriteGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl StoreLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail-fast acquire: never blocks waiting for the current writer.
    pub fn try_acquire(&self) -> Result<WriteGuard<'_>> {
        match self.inner.try_lock() {
            Ok(guard) => Ok(WriteGuard { _guard: guard }),
            Err(TryLockError::WouldBlock) => Err(MetricsError::WriteInProgress),
            // A poisoned lock means a writer panicked mid-cycle; the atomic
            // replace semantics keep the file intact, so writing may resume.
            Err(TryLockError::Poisoned(poisoned)) => Ok(WriteGuard {
                _guard: poisoned.into_inner(),
            }),
        }
    }
}
