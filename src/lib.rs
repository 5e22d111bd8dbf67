#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]

mod chunk;
mod debug;
#[cfg(feature = "lock_api")]
mod lock;
mod span;

pub use debug::{AllocatorInfo, Fault, FaultHandler, PanicOnFault};
#[cfg(feature = "lock_api")]
pub use lock::PoolLock;
pub use span::Span;

use chunk::{Chunk, ChunkList};

use core::ptr::{null_mut, NonNull};

// Chunk memory layout:
//   HEADER: Chunk (2 * ptr + 3 bytes) | pad to MAX_ALIGNMENT | SLOT * no_nodes
// Slot layout (debug builds; fences are empty in release):
//   FENCE: alignment bytes | NODE: node_size bytes | FENCE: alignment bytes
// A free slot's first byte is the index of the next free slot in its chunk;
// the chunk's own `no_nodes` is the chain terminator.

/// The strictest fundamental alignment of the platform.
///
/// Chunk headers and node arrays are placed at `MAX_ALIGNMENT`-aligned
/// addresses, which is what lets any node size up to `MAX_ALIGNMENT` come
/// out properly aligned. Donated memory must be aligned to this.
pub const MAX_ALIGNMENT: usize = core::mem::align_of::<u128>();

/// Offset from a chunk's header to its node array.
pub(crate) const MEMORY_OFFSET: usize =
    (core::mem::size_of::<Chunk>() + MAX_ALIGNMENT - 1) / MAX_ALIGNMENT * MAX_ALIGNMENT;

/// Maximum nodes per chunk, capped by the one-byte free-chain indices.
pub(crate) const CHUNK_MAX_NODES: usize = u8::MAX as usize;

/// Returns the alignment of nodes of the given size: the size itself up to
/// [`MAX_ALIGNMENT`], beyond which stricter alignment is never required.
#[inline]
pub const fn alignment_for(node_size: usize) -> usize {
    if node_size < MAX_ALIGNMENT { node_size } else { MAX_ALIGNMENT }
}

/// Size of the guard regions flanking each node. Zero in release builds; a
/// multiple of the node's alignment so slot strides preserve alignment.
const fn fence_size(node_size: usize) -> usize {
    if cfg!(debug_assertions) { alignment_for(node_size) } else { 0 }
}

/// A free list of many small, equally-sized memory nodes.
///
/// The list is a sub-allocator: it owns no memory of its own and instead
/// carves blocks donated via [`insert`](SmallFreeList::insert) into chunks
/// of up to 255 node slots each. [`allocate`](SmallFreeList::allocate) and
/// [`deallocate`](SmallFreeList::deallocate) run in amortized constant time,
/// using two one-chunk caches for locality and a bidirectional list walk on
/// cache misses.
///
/// Caller errors at deallocation (foreign, misaligned, or double-freed
/// pointers, overwritten fence bytes) are routed to the injected
/// [`FaultHandler`]; [`PanicOnFault`] is the ordinary choice.
///
/// The list is single-threaded. Wrap it with
/// [`lock`](SmallFreeList::lock) to share it across threads.
pub struct SmallFreeList<H: FaultHandler = PanicOnFault> {
    /// The user-specified fault handler.
    handler: H,

    /// Chunks that have served at least one allocation.
    used: ChunkList,
    /// Chunks no allocation has touched yet.
    unused: ChunkList,

    /// The chunk the next allocation is served from, when not null.
    alloc_chunk: *mut Chunk,
    /// The chunk the next deallocation is expected near, when not null.
    dealloc_chunk: *mut Chunk,

    /// Effective slot stride: node size plus both fences.
    slot_size: usize,
    /// Size of one guard region, zero in release builds.
    fence: usize,
    /// Total free nodes across all chunks.
    capacity: usize,
}

unsafe impl<H: FaultHandler + Send> Send for SmallFreeList<H> {}

impl<H: FaultHandler> core::fmt::Debug for SmallFreeList<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SmallFreeList")
            .field("node_size", &self.node_size())
            .field("capacity", &self.capacity)
            .field("alloc_chunk", &self.alloc_chunk)
            .field("dealloc_chunk", &self.dealloc_chunk)
            .finish()
    }
}

impl<H: FaultHandler> SmallFreeList<H> {
    /// The smallest supported node size: a node must hold one chain index.
    pub const MIN_ELEMENT_SIZE: usize = 1;
    /// The weakest alignment a node can have.
    pub const MIN_ELEMENT_ALIGNMENT: usize = 1;

    /// Returns an empty list for nodes of `node_size` bytes.
    ///
    /// No memory is usable until [`insert`](SmallFreeList::insert) donates
    /// some.
    ///
    /// # Panics
    /// Panics if `node_size` is smaller than
    /// [`MIN_ELEMENT_SIZE`](SmallFreeList::MIN_ELEMENT_SIZE).
    pub const fn new(node_size: usize, handler: H) -> Self {
        assert!(node_size >= Self::MIN_ELEMENT_SIZE, "node size is too small");

        let fence = fence_size(node_size);
        Self {
            handler,
            used: ChunkList::new(),
            unused: ChunkList::new(),
            alloc_chunk: null_mut(),
            dealloc_chunk: null_mut(),
            slot_size: node_size + 2 * fence,
            fence,
            capacity: 0,
        }
    }

    /// Returns a list for nodes of `node_size` bytes, seeded with `memory`.
    ///
    /// # Safety
    /// As for [`insert`](SmallFreeList::insert).
    pub unsafe fn with_memory(node_size: usize, handler: H, memory: Span) -> Self {
        let mut list = Self::new(node_size, handler);
        list.insert(memory);
        list
    }

    /// Donates a block of memory for the list to carve into nodes.
    ///
    /// The block is subdivided into as many full 255-node chunks as fit; a
    /// residual tail large enough for a chunk header and at least one slot
    /// becomes a final partial chunk, and anything smaller is wasted.
    /// [`capacity`](SmallFreeList::capacity) grows by the number of nodes
    /// materialized.
    ///
    /// The list only borrows the block: it is never freed, and the donor
    /// must keep it alive for as long as the list (or any list it is moved
    /// or swapped into) is in use.
    ///
    /// # Panics
    /// Panics if the block is not [`MAX_ALIGNMENT`]-aligned or too small to
    /// produce a single node.
    ///
    /// # Safety
    /// - The memory within `memory` must be valid for reads and writes, and
    ///   must not be accessed by anything but this list (and its allocation
    ///   holders) while the list is in use.
    /// - `memory` must not overlap any previously donated block.
    pub unsafe fn insert(&mut self, memory: Span) {
        assert!(!memory.contains(null_mut()), "donated memory covers the null address!");

        let (base, acme) = match memory.get_base_acme() {
            Some(base_acme) => base_acme,
            None => panic!("donated memory is empty"),
        };
        let size = acme as usize - base as usize;

        assert!(base as usize % MAX_ALIGNMENT == 0, "donated memory is misaligned");

        debug::fill(base, size, debug::INTERNAL_MEMORY);

        let chunk_unit = MEMORY_OFFSET + self.slot_size * CHUNK_MAX_NODES;
        let full_chunks = size / chunk_unit;

        let mut mem = base;
        for _ in 0..full_chunks {
            let chunk = Chunk::create(mem, self.slot_size, CHUNK_MAX_NODES as u8);
            self.unused.insert(chunk);
            mem = mem.add(chunk_unit);
        }

        let mut tail_nodes = 0;
        let remainder = size % chunk_unit;
        if remainder >= MEMORY_OFFSET + self.slot_size {
            tail_nodes = (remainder - MEMORY_OFFSET) / self.slot_size;
            let chunk = Chunk::create(mem, self.slot_size, tail_nodes as u8);
            self.unused.insert(chunk);
        }

        let inserted = full_chunks * CHUNK_MAX_NODES + tail_nodes;
        assert!(inserted > 0, "donated memory is too small");
        self.capacity += inserted;

        self.scan_for_errors();
    }

    /// Allocates one node of [`node_size`](SmallFreeList::node_size) bytes,
    /// aligned to [`alignment`](SmallFreeList::alignment).
    ///
    /// The node's contents are unspecified.
    ///
    /// # Panics
    /// Panics if the list is empty; allocating with zero
    /// [`capacity`](SmallFreeList::capacity) is a contract violation, not a
    /// recoverable condition.
    ///
    /// # Safety
    /// Every prior [`insert`](SmallFreeList::insert) and
    /// [`deallocate`](SmallFreeList::deallocate) call must have upheld its
    /// contract, and all donated memory must still be valid.
    pub unsafe fn allocate(&mut self) -> NonNull<u8> {
        assert!(self.capacity > 0, "allocate on an empty list");

        if self.alloc_chunk.is_null() || (*self.alloc_chunk).capacity == 0 {
            let found = self.find_chunk(1);
            debug_assert!(found);
        }
        debug_assert!(!self.alloc_chunk.is_null() && (*self.alloc_chunk).capacity > 0);

        let node = Chunk::pop_free(self.alloc_chunk, self.slot_size);
        self.capacity -= 1;

        self.scan_for_errors();

        let user = debug::fill_new(node, self.node_size(), self.fence);
        NonNull::new_unchecked(user)
    }

    /// Returns a node to the list.
    ///
    /// The owning chunk is located through the deallocation cache, falling
    /// back to a bidirectional walk of the used chunks. A pointer this list
    /// never produced, a pointer off its slot grid, a node freed twice, or
    /// an overwritten fence is reported to the fault handler (the latter
    /// two in debug builds only).
    ///
    /// # Safety
    /// `ptr` must have been returned by [`allocate`](SmallFreeList::allocate)
    /// on this list and not deallocated since. In debug builds violations
    /// are caught and reported instead.
    pub unsafe fn deallocate(&mut self, ptr: NonNull<u8>) {
        let ptr = ptr.as_ptr();
        // wrapping: a foreign pointer may sit at the edge of its allocation
        let node = ptr.wrapping_sub(self.fence);

        let chunk = match self.chunk_for(node) {
            Some(chunk) => chunk,
            None => self.handler.fault(self.info(), Fault::ForeignPointer, ptr),
        };

        let offset = node as usize - Chunk::node_array(chunk) as usize;
        if offset % self.slot_size != 0 {
            self.handler.fault(self.info(), Fault::MisalignedPointer, ptr);
        }

        #[cfg(debug_assertions)]
        {
            if Chunk::contains(chunk, self.slot_size, node) {
                self.handler.fault(self.info(), Fault::DoubleFree, ptr);
            }
            if let Some(byte) = debug::fence_overwrite(ptr, self.node_size(), self.fence) {
                self.handler.fault(self.info(), Fault::FenceOverwrite, byte);
            }
        }

        debug::fill(ptr, self.node_size(), debug::FREED_MEMORY);

        Chunk::push_free(chunk, node, (offset / self.slot_size) as u8);
        self.capacity += 1;

        self.scan_for_errors();
    }

    /// Prepares the list to serve allocations from a chunk with at least
    /// `n` free nodes, returning whether one was found.
    ///
    /// This is a hint: call it before a burst of `n` allocations to make
    /// them all hit one chunk. `find_chunk(1)` never fails on a non-empty
    /// list; [`allocate`](SmallFreeList::allocate) relies on that.
    pub fn find_chunk(&mut self, n: usize) -> bool {
        debug_assert!(self.capacity >= n && n <= CHUNK_MAX_NODES);

        unsafe {
            if !self.alloc_chunk.is_null() && (*self.alloc_chunk).capacity as usize >= n {
                return true;
            }

            if !self.unused.is_empty() {
                // promote a fresh chunk; its whole capacity is free
                let chunk = self.used.splice_first(&mut self.unused);
                self.alloc_chunk = chunk;
                if self.dealloc_chunk.is_null() {
                    self.dealloc_chunk = chunk;
                }
                return true;
            }

            debug_assert!(!self.dealloc_chunk.is_null());
            if self.dealloc_chunk.is_null() {
                return false;
            }
            if (*self.dealloc_chunk).capacity as usize >= n {
                self.alloc_chunk = self.dealloc_chunk;
                return true;
            }

            let mut forward = (*self.dealloc_chunk).next;
            let mut backward = (*self.dealloc_chunk).prev;
            loop {
                if (*forward).capacity as usize >= n {
                    self.alloc_chunk = forward;
                    return true;
                }
                if (*backward).capacity as usize >= n {
                    self.alloc_chunk = backward;
                    return true;
                }
                if forward == backward {
                    return false;
                }
                forward = (*forward).next;
                backward = (*backward).prev;
            }
        }
    }

    /// Locates the chunk whose node array contains `node`, walking outward
    /// from the deallocation cache. `None` means the pointer is foreign.
    fn chunk_for(&mut self, node: *mut u8) -> Option<*mut Chunk> {
        unsafe {
            if !self.dealloc_chunk.is_null()
                && Chunk::covers(self.dealloc_chunk, self.slot_size, node)
            {
                return Some(self.dealloc_chunk);
            }
            if !self.alloc_chunk.is_null() && Chunk::covers(self.alloc_chunk, self.slot_size, node)
            {
                self.dealloc_chunk = self.alloc_chunk;
                return Some(self.alloc_chunk);
            }

            if self.dealloc_chunk.is_null() {
                return None;
            }

            let mut forward = (*self.dealloc_chunk).next;
            let mut backward = (*self.dealloc_chunk).prev;
            loop {
                if Chunk::covers(forward, self.slot_size, node) {
                    self.dealloc_chunk = forward;
                    return Some(forward);
                }
                if Chunk::covers(backward, self.slot_size, node) {
                    self.dealloc_chunk = backward;
                    return Some(backward);
                }
                if forward == backward {
                    return None;
                }
                forward = (*forward).next;
                backward = (*backward).prev;
            }
        }
    }

    /// Returns the total number of free nodes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the configured node size. Fences are excluded.
    #[inline]
    pub fn node_size(&self) -> usize {
        self.slot_size - 2 * self.fence
    }

    /// Returns the alignment of every node this list hands out.
    #[inline]
    pub fn alignment(&self) -> usize {
        alignment_for(self.node_size())
    }

    fn info(&self) -> AllocatorInfo {
        AllocatorInfo {
            name: "smallpool::SmallFreeList",
            allocator: self as *const _ as *const (),
        }
    }

    /// Wrap in [`PoolLock`], a mutex-locked wrapper struct using
    /// [`lock_api`].
    ///
    /// # Examples
    /// ```
    /// # use smallpool::*;
    /// use spin::Mutex;
    /// let pool = SmallFreeList::new(8, PanicOnFault);
    /// let locked = pool.lock::<Mutex<()>>();
    /// assert_eq!(locked.capacity(), 0);
    /// ```
    #[cfg(feature = "lock_api")]
    pub const fn lock<R: lock_api::RawMutex>(self) -> PoolLock<R, H> {
        PoolLock(lock_api::Mutex::new(self))
    }

    #[cfg(not(debug_assertions))]
    fn scan_for_errors(&self) {}

    /// Asserts the structural invariants: the capacity sum, and per chunk a
    /// duplicate-free chain of exactly `capacity` links plus sane circular
    /// list pointers. Runs after every mutating call in debug builds.
    #[cfg(debug_assertions)]
    fn scan_for_errors(&self) {
        unsafe {
            let mut total = 0usize;

            for list in [&self.used, &self.unused] {
                let first = list.first();
                if first.is_null() {
                    continue;
                }

                let mut chunk = first;
                loop {
                    let mut seen = [false; 256];
                    let mut length = 0usize;
                    let mut index = (*chunk).first_free;
                    while index != (*chunk).no_nodes {
                        assert!(index < (*chunk).no_nodes, "free chain index out of range");
                        assert!(!seen[index as usize], "free chain repeats an index");
                        seen[index as usize] = true;
                        length += 1;
                        index = *Chunk::node_array(chunk).add(index as usize * self.slot_size);
                    }
                    assert_eq!(length, (*chunk).capacity as usize, "free chain length mismatch");
                    total += (*chunk).capacity as usize;

                    assert_eq!((*(*chunk).next).prev, chunk);
                    assert_eq!((*(*chunk).prev).next, chunk);

                    chunk = (*chunk).next;
                    if chunk == first {
                        break;
                    }
                }
            }

            assert_eq!(total, self.capacity, "capacity does not match the chunks");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::alloc::Layout;

    /// Leaks a `MAX_ALIGNMENT`-aligned block, like a page allocator would
    /// hand the pool's owner.
    fn arena(size: usize) -> Span {
        let layout = Layout::from_size_align(size, MAX_ALIGNMENT).unwrap();
        let memory = unsafe { std::alloc::alloc(layout) };
        assert!(!memory.is_null());
        Span::from_base_size(memory, size)
    }

    /// Nodes materialized from a block of `size` bytes at slot stride
    /// `slot_size`.
    fn nodes_in(size: usize, slot_size: usize) -> usize {
        let chunk_unit = MEMORY_OFFSET + slot_size * CHUNK_MAX_NODES;
        let mut nodes = size / chunk_unit * CHUNK_MAX_NODES;
        let remainder = size % chunk_unit;
        if remainder >= MEMORY_OFFSET + slot_size {
            nodes += (remainder - MEMORY_OFFSET) / slot_size;
        }
        nodes
    }

    #[test]
    fn basic_alloc_dealloc() {
        let mut list = SmallFreeList::new(8, PanicOnFault);
        assert_eq!(list.capacity(), 0);
        assert_eq!(list.node_size(), 8);
        assert_eq!(list.alignment(), 8);

        unsafe { list.insert(arena(4096)) };

        let expected = nodes_in(4096, list.slot_size);
        assert_eq!(list.capacity(), expected);

        let mut nodes: Vec<NonNull<u8>> =
            (0..expected).map(|_| unsafe { list.allocate() }).collect();
        assert_eq!(list.capacity(), 0);

        for node in &nodes {
            assert_eq!(node.as_ptr() as usize % list.alignment(), 0);
        }

        // pairwise disjoint: every two nodes are at least a slot apart
        let mut addresses: Vec<usize> = nodes.iter().map(|n| n.as_ptr() as usize).collect();
        addresses.sort_unstable();
        for pair in addresses.windows(2) {
            assert!(pair[1] - pair[0] >= list.slot_size);
        }

        while let Some(node) = nodes.pop() {
            unsafe { list.deallocate(node) };
        }
        assert_eq!(list.capacity(), expected);
    }

    #[test]
    fn reuse_is_lifo_within_a_chunk() {
        let mut list = SmallFreeList::new(16, PanicOnFault);
        unsafe { list.insert(arena(2048)) };

        let p1 = unsafe { list.allocate() };
        let _p2 = unsafe { list.allocate() };
        let _p3 = unsafe { list.allocate() };

        unsafe { list.deallocate(p1) };
        assert_eq!(unsafe { list.allocate() }, p1);
    }

    #[test]
    fn multi_chunk_exhaustion_and_refill() {
        let mut list = SmallFreeList::new(32, PanicOnFault);
        let chunk_unit = MEMORY_OFFSET + list.slot_size * CHUNK_MAX_NODES;
        unsafe { list.insert(arena(3 * chunk_unit)) };
        assert_eq!(list.capacity(), 3 * CHUNK_MAX_NODES);

        let nodes: Vec<NonNull<u8>> =
            (0..3 * CHUNK_MAX_NODES).map(|_| unsafe { list.allocate() }).collect();
        assert_eq!(list.capacity(), 0);

        // free every other node, then take them all back
        let mut freed = 0;
        for (i, node) in nodes.iter().enumerate() {
            if i % 2 == 1 {
                unsafe { list.deallocate(*node) };
                freed += 1;
            }
        }
        assert_eq!(list.capacity(), freed);

        for _ in 0..freed {
            unsafe { list.allocate() };
        }
        assert_eq!(list.capacity(), 0);
    }

    #[test]
    #[should_panic(expected = "empty list")]
    fn allocate_on_an_exhausted_list_panics() {
        let mut list = SmallFreeList::new(32, PanicOnFault);
        let chunk_unit = MEMORY_OFFSET + list.slot_size * CHUNK_MAX_NODES;
        unsafe { list.insert(arena(chunk_unit)) };

        for _ in 0..CHUNK_MAX_NODES {
            unsafe { list.allocate() };
        }
        unsafe { list.allocate() };
    }

    #[test]
    #[should_panic(expected = "too small")]
    fn insert_without_room_for_a_node_panics() {
        let mut list = SmallFreeList::new(64, PanicOnFault);
        unsafe { list.insert(arena(MEMORY_OFFSET)) };
    }

    #[test]
    fn deallocation_cache_and_walk_find_the_owner() {
        let mut list = SmallFreeList::new(16, PanicOnFault);
        let chunk_unit = MEMORY_OFFSET + 4 * list.slot_size;
        for _ in 0..3 {
            unsafe { list.insert(arena(chunk_unit)) };
        }
        assert_eq!(list.capacity(), 12);

        // three used chunks of four nodes each
        let nodes: Vec<NonNull<u8>> = (0..12).map(|_| unsafe { list.allocate() }).collect();

        // nodes[0] belongs to the first promoted chunk, nodes[4] to the second
        unsafe { list.deallocate(nodes[0]) };
        unsafe { list.deallocate(nodes[4]) };

        // served straight from the deallocation cache
        assert_eq!(unsafe { list.allocate() }, nodes[4]);
        // cache chunk is full again; only the walk can find the other node
        assert_eq!(unsafe { list.allocate() }, nodes[0]);
        assert_eq!(list.capacity(), 0);
    }

    #[test]
    fn find_chunk_prepares_a_burst() {
        let mut list = SmallFreeList::new(8, PanicOnFault);
        let chunk_unit = MEMORY_OFFSET + 8 * list.slot_size;
        unsafe { list.insert(arena(chunk_unit)) };
        unsafe { list.insert(arena(chunk_unit)) };

        // drain the first promoted chunk
        for _ in 0..8 {
            unsafe { list.allocate() };
        }

        // the second chunk is still unused and can serve a burst of eight
        assert!(list.find_chunk(8));
        for _ in 0..8 {
            unsafe { list.allocate() };
        }
        assert_eq!(list.capacity(), 0);
    }

    #[test]
    fn swap_transfers_chunk_ownership() {
        let mut a = SmallFreeList::new(8, PanicOnFault);
        let mut b = SmallFreeList::new(8, PanicOnFault);
        unsafe {
            a.insert(arena(1024));
            b.insert(arena(1024));
        }
        let expected = a.capacity();

        let pa = unsafe { a.allocate() };
        let pb = unsafe { b.allocate() };

        core::mem::swap(&mut a, &mut b);

        // each list now owns the other's chunks, caches included
        unsafe {
            a.deallocate(pb);
            b.deallocate(pa);
        }
        assert_eq!(a.capacity(), expected);
        assert_eq!(b.capacity(), expected);
    }

    #[test]
    fn moved_lists_keep_serving() {
        let mut list = SmallFreeList::new(8, PanicOnFault);
        unsafe { list.insert(arena(1024)) };
        let p = unsafe { list.allocate() };

        let mut moved = list;
        unsafe { moved.deallocate(p) };
        assert_eq!(unsafe { moved.allocate() }, p);
    }

    #[test]
    #[should_panic(expected = "not allocated by")]
    fn foreign_pointers_are_reported() {
        let mut list = SmallFreeList::new(8, PanicOnFault);
        unsafe { list.insert(arena(1024)) };
        let _p = unsafe { list.allocate() };

        let mut local = 0u64;
        unsafe { list.deallocate(NonNull::from(&mut local).cast()) };
    }

    #[test]
    #[should_panic(expected = "node boundary")]
    fn misaligned_pointers_are_reported() {
        let mut list = SmallFreeList::new(8, PanicOnFault);
        unsafe { list.insert(arena(1024)) };
        let p = unsafe { list.allocate() };

        unsafe { list.deallocate(NonNull::new_unchecked(p.as_ptr().add(1))) };
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "double free")]
    fn double_frees_are_reported() {
        let mut list = SmallFreeList::new(8, PanicOnFault);
        unsafe { list.insert(arena(1024)) };
        let p = unsafe { list.allocate() };

        unsafe { list.deallocate(p) };
        unsafe { list.deallocate(p) };
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "fence bytes")]
    fn fence_overwrites_are_reported() {
        let mut list = SmallFreeList::new(8, PanicOnFault);
        unsafe { list.insert(arena(1024)) };
        let p = unsafe { list.allocate() };

        unsafe {
            // scribble one byte past the node
            *p.as_ptr().add(list.node_size()) = 0;
            list.deallocate(p);
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    fn debug_fill_patterns() {
        let mut list = SmallFreeList::new(64, PanicOnFault);
        let memory = arena(4096);
        let (base, _) = memory.get_base_acme().unwrap();
        unsafe { list.insert(memory) };

        // everything but the headers and chain links holds the internal
        // pattern; probe the second byte of the first slot
        let first_slot = unsafe { base.add(MEMORY_OFFSET) };
        unsafe {
            assert_eq!(*first_slot.add(1), debug::INTERNAL_MEMORY);
        }

        let p = unsafe { list.allocate() };
        let node_size = list.node_size();
        let fence = list.fence;
        unsafe {
            for i in 0..node_size {
                assert_eq!(*p.as_ptr().add(i), debug::NEW_MEMORY);
            }
            for i in 0..fence {
                assert_eq!(*p.as_ptr().sub(fence).add(i), debug::FENCE_MEMORY);
                assert_eq!(*p.as_ptr().add(node_size + i), debug::FENCE_MEMORY);
            }

            list.deallocate(p);
            for i in 0..node_size {
                assert_eq!(*p.as_ptr().add(i), debug::FREED_MEMORY);
            }
        }
    }

    #[test]
    fn with_memory_seeds_the_list() {
        let mut list = unsafe { SmallFreeList::with_memory(8, PanicOnFault, arena(1024)) };
        assert!(list.capacity() > 0);
        let p = unsafe { list.allocate() };
        unsafe { list.deallocate(p) };
    }
}
