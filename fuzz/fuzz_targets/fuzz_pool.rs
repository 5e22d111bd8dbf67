#![no_main]

use std::alloc::{alloc, dealloc, Layout};
use std::ptr::NonNull;

use smallpool::{PanicOnFault, SmallFreeList, Span, MAX_ALIGNMENT};

use libfuzzer_sys::fuzz_target;

use libfuzzer_sys::arbitrary::Arbitrary;

#[derive(Arbitrary, Debug)]
enum Actions {
    /// Donate a fresh block of `kib` KiB
    Insert { kib: u8 },
    /// Allocate up to `count` nodes
    Allocate { count: u8 },
    /// Deallocate the ith outstanding allocation
    Deallocate { index: u8 },
    /// Hint an upcoming burst of allocations
    FindChunk { n: u8 },
}
use Actions::*;

fuzz_target!(|input: (u8, Vec<Actions>)| {
    let (node_size_seed, actions) = input;
    // power-of-two node sizes, 1 through 64
    let node_size = 1usize << (node_size_seed % 7);

    let mut pool = SmallFreeList::new(node_size, PanicOnFault);
    let mut outstanding: Vec<NonNull<u8>> = vec![];
    let mut arenas: Vec<(*mut u8, Layout)> = vec![];

    for action in actions {
        match action {
            Insert { kib } => {
                if kib == 0 || arenas.len() >= 16 {
                    continue;
                }

                let size = kib as usize * 1024;
                let layout = Layout::from_size_align(size, MAX_ALIGNMENT).unwrap();
                let memory = unsafe { alloc(layout) };
                assert!(!memory.is_null());

                let before = pool.capacity();
                unsafe { pool.insert(Span::from_base_size(memory, size)) };
                assert!(pool.capacity() > before);

                arenas.push((memory, layout));
            }
            Allocate { count } => {
                for _ in 0..count {
                    if pool.capacity() == 0 {
                        break;
                    }

                    let node = unsafe { pool.allocate() };
                    assert!(node.as_ptr() as usize % pool.alignment() == 0);
                    assert!(!outstanding.contains(&node));
                    unsafe { node.as_ptr().write_bytes(0x5a, node_size) };

                    outstanding.push(node);
                }
            }
            Deallocate { index } => {
                if outstanding.is_empty() {
                    continue;
                }

                let node = outstanding.swap_remove(index as usize % outstanding.len());
                let before = pool.capacity();
                unsafe { pool.deallocate(node) };
                assert!(pool.capacity() == before + 1);
            }
            FindChunk { n } => {
                let n = n as usize % 255 + 1;
                if n <= pool.capacity() {
                    pool.find_chunk(n);
                }
            }
        }
    }

    // Free any remaining allocations.
    for node in outstanding {
        unsafe { pool.deallocate(node) };
    }

    drop(pool);
    for (memory, layout) in arenas {
        unsafe { dealloc(memory, layout) };
    }
});
