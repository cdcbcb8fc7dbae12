use std::marker::PhantomData;

use crate::error::SyncError;

/// A pluggable lock guarding the submit-and-dispatch sequence.
///
/// Implementations only need blocking `acquire` and `release`; callers go
/// through [`SyncGuard`], which pairs them on every exit path.
pub trait SyncProvider: Send + Sync {
    /// Blocks until the calling thread holds the lock.
    fn acquire(&self) -> Result<(), SyncError>;

    /// Releases the lock.
    ///
    /// # Safety
    ///
    /// The calling thread must currently hold the lock through a successful
    /// [`acquire`](Self::acquire) that has not been released yet.
    unsafe fn release(&self);

    /// Short name used in diagnostics.
    fn kind(&self) -> &'static str;

    /// Gives up any resources shared with other processes.
    ///
    /// The lock stays usable by this process until it is dropped.
    fn close(&self) {}
}

/// Holds a [`SyncProvider`] locked until dropped.
///
/// Not `Send`: the lock must be released by the thread that acquired it.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct SyncGuard<'a> {
    provider: &'a dyn SyncProvider,
    _not_send: PhantomData<*const ()>,
}

impl<'a> SyncGuard<'a> {
    pub fn acquire(provider: &'a dyn SyncProvider) -> Result<Self, SyncError> {
        provider.acquire()?;
        Ok(Self {
            provider,
            _not_send: PhantomData,
        })
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        // SAFETY: a guard only exists after `acquire` succeeded on this thread,
        // and this is the single release paired with it.
        unsafe { self.provider.release() }
    }
}
