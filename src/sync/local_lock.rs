use parking_lot::RawMutex;
use parking_lot::lock_api::RawMutex as _;

use crate::error::SyncError;
use crate::sync::sync_provider::SyncProvider;

/// In-process lock shared by every thread that submits to one logger.
pub struct LocalLock {
    raw: RawMutex,
}

impl LocalLock {
    #[must_use]
    pub const fn new() -> Self {
        Self { raw: RawMutex::INIT }
    }
}

impl Default for LocalLock {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncProvider for LocalLock {
    #[inline]
    fn acquire(&self) -> Result<(), SyncError> {
        self.raw.lock();
        Ok(())
    }

    #[inline]
    unsafe fn release(&self) {
        // SAFETY: forwarded from the caller's contract.
        unsafe { self.raw.unlock() }
    }

    fn kind(&self) -> &'static str {
        "local"
    }
}

impl std::fmt::Debug for LocalLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalLock")
            .field("locked", &self.raw.is_locked())
            .finish()
    }
}
