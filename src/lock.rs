use crate::{FaultHandler, SmallFreeList, Span};

use core::ptr::NonNull;

/// Pool lock: wrapper struct containing a mutex-locked [`SmallFreeList`].
///
/// This is the synchronization adapter for sharing a pool between threads:
/// every entry point takes the lock for the duration of the call.
///
/// # Example
/// ```rust
/// # use smallpool::*;
/// let pool = SmallFreeList::new(8, PanicOnFault);
/// let locked = pool.lock::<spin::Mutex<()>>();
/// ```
#[derive(Debug)]
pub struct PoolLock<R: lock_api::RawMutex, H: FaultHandler>(
    pub lock_api::Mutex<R, SmallFreeList<H>>,
);

impl<R: lock_api::RawMutex, H: FaultHandler> PoolLock<R, H> {
    /// Lock the mutex and access the inner [`SmallFreeList`].
    pub fn pool(&self) -> lock_api::MutexGuard<'_, R, SmallFreeList<H>> {
        self.0.lock()
    }

    /// Donates a block of memory to the list.
    ///
    /// # Safety
    /// As for [`SmallFreeList::insert`].
    pub unsafe fn insert(&self, memory: Span) {
        self.0.lock().insert(memory)
    }

    /// Allocates one node. See [`SmallFreeList::allocate`].
    ///
    /// # Safety
    /// As for [`SmallFreeList::allocate`].
    pub unsafe fn allocate(&self) -> NonNull<u8> {
        self.0.lock().allocate()
    }

    /// Returns a node to the list.
    ///
    /// # Safety
    /// As for [`SmallFreeList::deallocate`].
    pub unsafe fn deallocate(&self, ptr: NonNull<u8>) {
        self.0.lock().deallocate(ptr)
    }

    /// Returns the total number of free nodes.
    pub fn capacity(&self) -> usize {
        self.0.lock().capacity()
    }
}
