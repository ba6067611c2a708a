//! Collector driver
//!
//! The entry point the mutator calls when a bump allocation would overrun
//! `fromspace_end`. Runs one stop-the-world Cheney-style copying collection:
//! evacuate every root, breadth-first scan the copies for further pointers,
//! then swap from-space and to-space and report whether the collection freed
//! enough room for the allocation that triggered it.

use crate::error::{FatalReason, fatal};
use crate::evacuate::evacuate;
use crate::space::{self, free_ptr, fromspace_begin, fromspace_end, rootstack_begin};
use crate::stats;
use crate::tag;

/// Run one collection.
///
/// `rootstack_top` points one past the last live root-stack slot (the same
/// convention the mutator uses for its own stack pointer); the collector
/// walks downward from there to `rootstack_begin` inclusive. `bytes_needed`
/// is the allocation that triggered this collection; if the space reclaimed
/// cannot satisfy it, this is a fatal out-of-memory condition.
///
/// # Safety
/// `initialize` must have been called first. Every tuple pointer reachable
/// from the mutator must already be on the root stack below `rootstack_top`;
/// the collector trusts the caller to have spilled all live registers to it.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn collect(rootstack_top: *mut i64, bytes_needed: u64) {
    unsafe {
        let begin = rootstack_begin;
        if (rootstack_top as usize) < (begin as usize) {
            fatal(FatalReason::RootStackUnderflow {
                top: rootstack_top as i64,
                begin: begin as i64,
            });
        }

        let bytes_before_collection = (free_ptr as usize - fromspace_begin as usize) as u64;

        let (to_begin, _to_end) = space::tospace_bounds();
        let mut scan = to_begin;
        let mut next_free = to_begin;

        // Seed to-space by evacuating every live root, deepest-first (this
        // fixes the BFS order tests assert on).
        let mut root = rootstack_top;
        while root > begin {
            root = root.sub(1);
            evacuate(root, &mut next_free, true);
        }

        // Cheney scan: walk the copies already made, copying whatever they
        // point to, until the scan pointer catches up with the allocation
        // pointer.
        while scan < next_free {
            let t = *scan;
            let len = tag::length(t);
            let mask = tag::pointer_mask(t);
            for k in 0..len {
                if (mask >> k) & 1 == 1 {
                    let slot = scan.add(1 + k as usize);
                    evacuate(slot, &mut next_free, false);
                }
            }
            scan = scan.add((len + 1) as usize);
        }

        let bytes_live = (next_free as usize - to_begin as usize) as u64;
        stats::record_collection(bytes_before_collection, bytes_live);

        space::swap_spaces(next_free);

        let available_bytes = (fromspace_end as usize - free_ptr as usize) as u64;
        if available_bytes < bytes_needed {
            fatal(FatalReason::OutOfMemory {
                bytes_needed,
                bytes_available: available_bytes,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    unsafe fn push_root(root_sp: &mut *mut i64, tuple: *mut i64) {
        unsafe {
            **root_sp = tuple as i64;
            *root_sp = root_sp.add(1);
        }
    }

    #[test]
    #[serial(gc_globals)]
    fn single_tuple_survives_and_root_is_rewritten() {
        unsafe {
            space::initialize(64, 1024);

            // Allocate tuple A: length 2, no pointers.
            let a = free_ptr;
            *a = 5; // tag
            *a.add(1) = 0xff5723;
            *a.add(2) = 0x04829ec;
            free_ptr = a.add(3);

            let mut root_sp = rootstack_begin;
            push_root(&mut root_sp, a);

            collect(root_sp, 0);

            assert_eq!(free_ptr, fromspace_begin.add(3));
            assert_eq!(*fromspace_begin, 5);
            assert_eq!(*fromspace_begin.add(1), 0xff5723);
            assert_eq!(*fromspace_begin.add(2), 0x04829ec);

            let new_root_value = *rootstack_begin;
            assert_eq!(new_root_value, fromspace_begin as i64);
        }
    }

    #[test]
    #[serial(gc_globals)]
    fn dead_tuple_is_dropped_and_shared_referent_is_not_duplicated() {
        unsafe {
            space::initialize(64, 1024);

            // Tuple C: length 1, no pointers.
            let c = free_ptr;
            *c = (1i64 << 1) | 1;
            *c.add(1) = 0x53fb00a267;
            free_ptr = c.add(2);

            // Tuple A: length 3, element 0 points at C.
            let a = free_ptr;
            *a = (1i64 << 7) | (3i64 << 1) | 1;
            *a.add(1) = c as i64;
            *a.add(2) = 0xfee982f5723u64 as i64;
            *a.add(3) = 0x04829ec002;
            free_ptr = a.add(4);

            // Tuple B: length 2, element 1 points at C.
            let b = free_ptr;
            *b = (2i64 << 7) | (2i64 << 1) | 1;
            *b.add(1) = 0x3538a0b9d;
            *b.add(2) = c as i64;
            free_ptr = b.add(3);

            // Tuple D: length 3, all pointers (unreachable, never rooted).
            let d = free_ptr;
            *d = (7i64 << 7) | (3i64 << 1) | 1;
            *d.add(1) = a as i64;
            *d.add(2) = b as i64;
            *d.add(3) = c as i64;
            free_ptr = d.add(4);

            let mut root_sp = rootstack_begin;
            push_root(&mut root_sp, a);
            push_root(&mut root_sp, b);

            collect(root_sp, 0);

            // BFS order seeded by top-down root scan: B first, then A, then C.
            assert_eq!(free_ptr, fromspace_begin.add(9));

            let b_new = fromspace_begin;
            let a_new = b_new.add(3);
            let c_new = a_new.add(4);

            assert_eq!(*a_new.add(1), c_new as i64);
            assert_eq!(*b_new.add(2), c_new as i64);

            let root_slots = std::slice::from_raw_parts(rootstack_begin, 2);
            assert_eq!(root_slots[0], a_new as i64);
            assert_eq!(root_slots[1], b_new as i64);
        }
    }

    #[test]
    #[serial(gc_globals)]
    fn nested_chain_all_survive_in_order() {
        unsafe {
            space::initialize(64, 1024);

            let d = free_ptr;
            *d = 1; // length 0
            free_ptr = d.add(1);

            let c = free_ptr;
            *c = (1i64 << 7) | (1i64 << 1) | 1;
            *c.add(1) = d as i64;
            free_ptr = c.add(2);

            let b = free_ptr;
            *b = (1i64 << 7) | (1i64 << 1) | 1;
            *b.add(1) = c as i64;
            free_ptr = b.add(2);

            let a = free_ptr;
            *a = (1i64 << 7) | (1i64 << 1) | 1;
            *a.add(1) = b as i64;
            free_ptr = a.add(2);

            let mut root_sp = rootstack_begin;
            push_root(&mut root_sp, a);

            collect(root_sp, 0);

            let a_new = fromspace_begin;
            let b_new = a_new.add(2);
            let c_new = b_new.add(2);
            let d_new = c_new.add(2);

            assert_eq!(free_ptr, d_new.add(1));
            assert_eq!(*a_new.add(1), b_new as i64);
            assert_eq!(*b_new.add(1), c_new as i64);
            assert_eq!(*c_new.add(1), d_new as i64);
        }
    }

    #[test]
    #[serial(gc_globals)]
    fn idempotent_collect_preserves_layout() {
        unsafe {
            space::initialize(64, 1024);

            let a = free_ptr;
            *a = 5;
            *a.add(1) = 1;
            *a.add(2) = 2;
            free_ptr = a.add(3);

            let mut root_sp = rootstack_begin;
            push_root(&mut root_sp, a);

            collect(root_sp, 0);
            let free_after_first = free_ptr;
            let root_after_first = *rootstack_begin;

            // Root stack still has the same (rewritten) root on top; collect again.
            let root_sp2 = rootstack_begin.add(1);
            collect(root_sp2, 0);

            assert_eq!(free_ptr, free_after_first);
            assert_eq!(*rootstack_begin, root_after_first);
        }
    }

    #[test]
    #[serial(gc_globals)]
    fn empty_root_stack_yields_empty_heap() {
        unsafe {
            space::initialize(64, 1024);
            collect(rootstack_begin, 0);
            assert_eq!(free_ptr, fromspace_begin);
        }
    }

    #[test]
    #[serial(gc_globals)]
    fn null_root_entries_are_skipped() {
        unsafe {
            space::initialize(64, 1024);

            let a = free_ptr;
            *a = 1; // length 0
            free_ptr = a.add(1);

            let mut root_sp = rootstack_begin;
            // A null root entry, then the live one.
            *root_sp = 0;
            root_sp = root_sp.add(1);
            push_root(&mut root_sp, a);

            collect(root_sp, 0);

            assert_eq!(free_ptr, fromspace_begin.add(1));
            let root_slots = std::slice::from_raw_parts(rootstack_begin, 2);
            assert_eq!(root_slots[0], 0);
            assert_eq!(root_slots[1], fromspace_begin as i64);
        }
    }

    #[test]
    #[serial(gc_globals)]
    #[should_panic(expected = "root-stack top")]
    fn collect_rejects_top_below_base() {
        unsafe {
            space::initialize(64, 1024);
            collect(rootstack_begin.sub(1), 0);
        }
    }

    #[test]
    #[serial(gc_globals)]
    #[should_panic(expected = "freed only")]
    fn insufficient_capacity_after_collection_is_fatal() {
        unsafe {
            space::initialize(8, 64);

            let a = free_ptr;
            *a = 1;
            free_ptr = a.add(1);

            let mut root_sp = rootstack_begin;
            push_root(&mut root_sp, a);

            // Demand more bytes than the 7 remaining free slots can supply.
            collect(root_sp, 1_000_000);
        }
    }
}
