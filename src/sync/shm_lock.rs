use std::cell::UnsafeCell;
use std::fs::File;
use std::mem::{self, MaybeUninit};
use std::num::NonZeroUsize;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::mman::{MapFlags, ProtFlags, mmap, munmap, shm_open, shm_unlink};
use nix::sys::stat::Mode;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::sync::sync_provider::SyncProvider;

/// Published by the creator once the mutex is initialized.
const STATE_READY: u32 = 0x5348_4c4b;
/// Published by the last process to detach, right before unlinking.
const STATE_RETIRED: u32 = 0x5245_5449;

/// Polls while waiting for a creator to finish setting a segment up.
const ATTACH_POLLS: u32 = 2_000;
const ATTACH_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Times a retired segment is replaced before giving up.
const REOPEN_ATTEMPTS: u32 = 8;

/// Longest key accepted, leaving room for the leading `/` within `NAME_MAX`.
const MAX_KEY_LEN: usize = 250;

/// Layout of the shared memory segment.
#[repr(C)]
struct Segment {
    state: AtomicU32,
    /// Number of live attachments; changed only while holding `mutex`.
    attached: AtomicU32,
    mutex: UnsafeCell<libc::pthread_mutex_t>,
}

const SEGMENT_LEN: NonZeroUsize = match NonZeroUsize::new(mem::size_of::<Segment>()) {
    Some(len) => len,
    None => panic!("segment layout is empty"),
};

/// A process-shared, robust pthread mutex living in POSIX shared memory.
///
/// Every process that opens the same key serializes on one mutex, whether or
/// not the processes are related.
///
/// # Ownership
///
/// * The process whose exclusive create of the segment succeeds initializes
///   the mutex and publishes it; everybody else waits for that.
/// * Each attachment bumps a counter kept in the segment, under the mutex.
/// * [`close`](SyncProvider::close) (or drop) decrements it. The process that
///   brings it to zero marks the segment retired and unlinks it; a process
///   racing to attach at that point sees "retired" and creates a fresh one.
/// * A process that dies while holding the mutex leaves it "owner dead"; the
///   next acquirer repairs it and carries on. A process that dies without
///   detaching is never subtracted, so its segment outlives the survivors
///   until removed by hand (`/dev/shm/<key>` on Linux).
pub struct SharedMemoryLock {
    name: String,
    segment: NonNull<Segment>,
    created: bool,
    detached: AtomicBool,
}

// SAFETY: the segment is only accessed through atomics and the process-shared
// pthread mutex, both of which are safe to use from any thread.
unsafe impl Send for SharedMemoryLock {}
// SAFETY: see above.
unsafe impl Sync for SharedMemoryLock {}

impl SharedMemoryLock {
    /// Creates the segment for `key`, or attaches to the one already there.
    ///
    /// `key` may be given with or without its leading `/`.
    pub fn open(key: &str) -> Result<Self, SyncError> {
        let name = segment_name(key)?;

        for _ in 0..REOPEN_ATTEMPTS {
            let flags = OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_RDWR;
            match shm_open(name.as_str(), flags, Mode::S_IRUSR | Mode::S_IWUSR) {
                Ok(fd) => return Self::create(name, File::from(fd)),
                Err(Errno::EEXIST) => {
                    if let Some(lock) = Self::attach(&name)? {
                        return Ok(lock);
                    }
                    debug!(name = %name, "shared lock segment retired while attaching, recreating");
                }
                Err(source) => return Err(SyncError::Open { name, source }),
            }
        }
        Err(SyncError::AttachTimeout(name))
    }

    fn create(name: String, file: File) -> Result<Self, SyncError> {
        let segment = match Self::initialize(&name, &file) {
            Ok(segment) => segment,
            Err(err) => {
                let _ = shm_unlink(name.as_str());
                return Err(err);
            }
        };

        // SAFETY: the mapping is valid and was just initialized by us.
        let seg = unsafe { segment.as_ref() };
        seg.attached.store(1, Ordering::Relaxed);
        seg.state.store(STATE_READY, Ordering::Release);
        debug!(name = %name, "created shared lock segment");

        Ok(Self {
            name,
            segment,
            created: true,
            detached: AtomicBool::new(false),
        })
    }

    fn initialize(name: &str, file: &File) -> Result<NonNull<Segment>, SyncError> {
        file.set_len(SEGMENT_LEN.get() as u64)
            .map_err(|source| SyncError::Resize {
                name: name.to_string(),
                source,
            })?;
        let segment = map_segment(name, file)?;

        // SAFETY: fresh mapping of a zero-filled segment nobody else can use
        // until STATE_READY is published.
        if let Err(err) = unsafe { init_mutex(segment.as_ref().mutex.get()) } {
            // SAFETY: unmapping the region mapped just above.
            unsafe { unmap_segment(segment) };
            return Err(err);
        }
        Ok(segment)
    }

    /// Returns `None` when the segment vanished or retired under us.
    fn attach(name: &str) -> Result<Option<Self>, SyncError> {
        let fd = match shm_open(name, OFlag::O_RDWR, Mode::S_IRUSR | Mode::S_IWUSR) {
            Ok(fd) => fd,
            Err(Errno::ENOENT) => return Ok(None),
            Err(source) => {
                return Err(SyncError::Open {
                    name: name.to_string(),
                    source,
                });
            }
        };
        let file = File::from(fd);

        if !poll_until(|| file.metadata().is_ok_and(|m| m.len() >= SEGMENT_LEN.get() as u64)) {
            return Err(SyncError::AttachTimeout(name.to_string()));
        }
        let segment = map_segment(name, &file)?;
        // SAFETY: the mapping covers a whole `Segment`.
        let seg = unsafe { segment.as_ref() };

        if !poll_until(|| seg.state.load(Ordering::Acquire) != 0) {
            // SAFETY: unmapping our own mapping.
            unsafe { unmap_segment(segment) };
            return Err(SyncError::AttachTimeout(name.to_string()));
        }

        let lock = Self {
            name: name.to_string(),
            segment,
            created: false,
            // Nothing to give back until the count is bumped below.
            detached: AtomicBool::new(true),
        };
        if seg.state.load(Ordering::Acquire) == STATE_RETIRED {
            return Ok(None);
        }

        lock.acquire()?;
        let live = seg.state.load(Ordering::Acquire) == STATE_READY;
        if live {
            seg.attached.fetch_add(1, Ordering::AcqRel);
            lock.detached.store(false, Ordering::Release);
        }
        // SAFETY: acquired just above on this thread.
        unsafe { lock.release() };

        Ok(live.then_some(lock))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this process created the segment.
    #[must_use]
    pub fn is_creator(&self) -> bool {
        self.created
    }

    /// Attachments currently recorded in the segment, across all processes.
    #[must_use]
    pub fn attached(&self) -> u32 {
        self.segment().attached.load(Ordering::Acquire)
    }

    fn segment(&self) -> &Segment {
        // SAFETY: the mapping lives until `drop`.
        unsafe { self.segment.as_ref() }
    }

    fn mutex(&self) -> *mut libc::pthread_mutex_t {
        self.segment().mutex.get()
    }
}

impl SyncProvider for SharedMemoryLock {
    fn acquire(&self) -> Result<(), SyncError> {
        // SAFETY: the mutex was initialized before STATE_READY was published
        // and stays mapped until drop.
        let rc = unsafe { libc::pthread_mutex_lock(self.mutex()) };
        match rc {
            0 => Ok(()),
            #[cfg(target_os = "linux")]
            libc::EOWNERDEAD => {
                // SAFETY: we hold the mutex in the owner-dead state.
                let rc = unsafe { libc::pthread_mutex_consistent(self.mutex()) };
                if rc != 0 {
                    // SAFETY: still held by us.
                    unsafe { libc::pthread_mutex_unlock(self.mutex()) };
                    return Err(SyncError::Mutex {
                        call: "pthread_mutex_consistent",
                        code: rc,
                    });
                }
                warn!(name = %self.name, "previous holder of the shared log lock died, recovered");
                Ok(())
            }
            code => Err(SyncError::Mutex {
                call: "pthread_mutex_lock",
                code,
            }),
        }
    }

    unsafe fn release(&self) {
        // SAFETY: caller holds the mutex.
        unsafe { libc::pthread_mutex_unlock(self.mutex()) };
    }

    fn kind(&self) -> &'static str {
        "shared-memory"
    }

    fn close(&self) {
        if self.detached.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(err) = self.acquire() {
            warn!(name = %self.name, %err, "cannot lock shared segment to detach");
            return;
        }

        let seg = self.segment();
        let remaining = seg.attached.fetch_sub(1, Ordering::AcqRel).saturating_sub(1);
        if remaining == 0 {
            seg.state.store(STATE_RETIRED, Ordering::Release);
            match shm_unlink(self.name.as_str()) {
                Ok(()) | Err(Errno::ENOENT) => debug!(name = %self.name, "removed shared lock segment"),
                Err(err) => warn!(name = %self.name, %err, "cannot unlink shared lock segment"),
            }
        }
        // SAFETY: acquired above.
        unsafe { self.release() };
    }
}

impl Drop for SharedMemoryLock {
    fn drop(&mut self) {
        self.close();
        // SAFETY: no guard can outlive `&self`, so nobody is using the mapping.
        unsafe { unmap_segment(self.segment) };
    }
}

impl std::fmt::Debug for SharedMemoryLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMemoryLock")
            .field("name", &self.name)
            .field("created", &self.created)
            .field("attached", &self.attached())
            .finish()
    }
}

fn segment_name(key: &str) -> Result<String, SyncError> {
    let bare = key.strip_prefix('/').unwrap_or(key);
    if bare.is_empty() || bare.len() > MAX_KEY_LEN || bare.contains('/') || bare.contains('\0') {
        return Err(SyncError::InvalidName(key.to_string()));
    }
    Ok(format!("/{bare}"))
}

fn poll_until(mut ready: impl FnMut() -> bool) -> bool {
    for _ in 0..ATTACH_POLLS {
        if ready() {
            return true;
        }
        thread::sleep(ATTACH_POLL_INTERVAL);
    }
    ready()
}

fn map_segment(name: &str, file: &File) -> Result<NonNull<Segment>, SyncError> {
    // SAFETY: shared read/write mapping of a descriptor we own, at least
    // SEGMENT_LEN bytes long.
    let ptr = unsafe {
        mmap(
            None,
            SEGMENT_LEN,
            ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
            MapFlags::MAP_SHARED,
            file,
            0,
        )
    }
    .map_err(|source| SyncError::Map {
        name: name.to_string(),
        source,
    })?;
    Ok(ptr.cast())
}

/// # Safety
///
/// `segment` must come from [`map_segment`] and not be used afterwards.
unsafe fn unmap_segment(segment: NonNull<Segment>) {
    // SAFETY: forwarded from the caller.
    if let Err(err) = unsafe { munmap(segment.cast(), SEGMENT_LEN.get()) } {
        warn!(%err, "cannot unmap shared lock segment");
    }
}

/// # Safety
///
/// `mutex` must point to writable memory no other thread or process uses yet.
unsafe fn init_mutex(mutex: *mut libc::pthread_mutex_t) -> Result<(), SyncError> {
    fn check(call: &'static str, code: i32) -> Result<(), SyncError> {
        if code == 0 { Ok(()) } else { Err(SyncError::Mutex { call, code }) }
    }

    let mut attr = MaybeUninit::<libc::pthread_mutexattr_t>::uninit();
    // SAFETY: initializing the attribute object in place.
    check("pthread_mutexattr_init", unsafe {
        libc::pthread_mutexattr_init(attr.as_mut_ptr())
    })?;
    let attr = attr.as_mut_ptr();

    // SAFETY: `attr` is initialized; `mutex` is valid per the caller.
    let result = unsafe {
        check(
            "pthread_mutexattr_setpshared",
            libc::pthread_mutexattr_setpshared(attr, libc::PTHREAD_PROCESS_SHARED),
        )
        .and_then(|()| set_robust(attr))
        .and_then(|()| check("pthread_mutex_init", libc::pthread_mutex_init(mutex, attr)))
    };

    // SAFETY: `attr` was initialized above and is no longer needed.
    unsafe { libc::pthread_mutexattr_destroy(attr) };
    result
}

#[cfg(target_os = "linux")]
unsafe fn set_robust(attr: *mut libc::pthread_mutexattr_t) -> Result<(), SyncError> {
    // SAFETY: `attr` is an initialized attribute object.
    match unsafe { libc::pthread_mutexattr_setrobust(attr, libc::PTHREAD_MUTEX_ROBUST) } {
        0 => Ok(()),
        code => Err(SyncError::Mutex {
            call: "pthread_mutexattr_setrobust",
            code,
        }),
    }
}

#[cfg(not(target_os = "linux"))]
unsafe fn set_robust(_attr: *mut libc::pthread_mutexattr_t) -> Result<(), SyncError> {
    Ok(())
}
