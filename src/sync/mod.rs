//! Mutual exclusion around one dispatch cycle.
//!
//! A [`SyncProvider`] is held by the logger and acquired for the whole
//! filter-and-dispatch sequence of every event. [`LocalLock`] serializes the
//! threads of one process; [`SharedMemoryLock`] serializes every process that
//! opens it under the same key.

pub mod local_lock;
#[cfg(unix)]
pub mod shm_lock;
pub mod sync_provider;

pub use local_lock::LocalLock;
#[cfg(unix)]
pub use shm_lock::SharedMemoryLock;
pub use sync_provider::{SyncGuard, SyncProvider};
