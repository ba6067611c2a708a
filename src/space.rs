//! Heap spaces, root stack, and collector initialization
//!
//! Publishes the four symbols the compiler's generated code indexes directly
//! (`free_ptr`, `fromspace_begin`, `fromspace_end`, `rootstack_begin`) as
//! `#[no_mangle]` raw-pointer statics rather than hiding them behind an
//! opaque context struct (the mutator's bump-allocation fast path reads and
//! writes them inline, so they must live at fixed, named addresses).
//!
//! `tospace_begin`/`tospace_end` are the collector's own bookkeeping; the
//! mutator never sees them directly, only their effect after a `collect`
//! swap makes the old to-space the new from-space.

use std::alloc::{Layout, alloc_zeroed};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{FatalReason, fatal};

/// Next bump-allocation site in the active space.
///
/// # Safety
/// Only the mutator (before a collection) and [`crate::collector::collect`]
/// (after one) ever write this; it is never written concurrently.
#[unsafe(no_mangle)]
#[allow(non_upper_case_globals)]
pub static mut free_ptr: *mut i64 = std::ptr::null_mut();

/// Base address of the active (from-)space.
#[unsafe(no_mangle)]
#[allow(non_upper_case_globals)]
pub static mut fromspace_begin: *mut i64 = std::ptr::null_mut();

/// One past the last usable slot of the active (from-)space.
#[unsafe(no_mangle)]
#[allow(non_upper_case_globals)]
pub static mut fromspace_end: *mut i64 = std::ptr::null_mut();

/// Base address of the root stack.
#[unsafe(no_mangle)]
#[allow(non_upper_case_globals)]
pub static mut rootstack_begin: *mut i64 = std::ptr::null_mut();

/// Base address of the inactive (to-)space. Not part of the mutator ABI.
static mut TOSPACE_BEGIN: *mut i64 = std::ptr::null_mut();
/// One past the last usable slot of the inactive (to-)space.
static mut TOSPACE_END: *mut i64 = std::ptr::null_mut();

/// Size in bytes of each of the two equally sized heap spaces, recorded so a
/// post-collection capacity check can compare against it.
static HEAP_SIZE_BYTES: AtomicUsize = AtomicUsize::new(0);

fn round_up_to_word(size: usize) -> usize {
    size.div_ceil(8) * 8
}

/// Allocate and zero a region of `bytes` (already word-rounded), or report a
/// fatal allocation failure naming `what`.
fn alloc_zeroed_region(bytes: usize, what: &'static str) -> *mut i64 {
    if bytes == 0 {
        fatal(FatalReason::ZeroSizedRegion { what });
    }
    // SAFETY: `bytes` is nonzero and a multiple of 8 (word rounding is
    // applied by every caller), so the layout is valid for an i64 array.
    let layout = Layout::from_size_align(bytes, align_of::<i64>())
        .unwrap_or_else(|_| fatal(FatalReason::AllocationFailed { what, bytes }));
    let ptr = unsafe { alloc_zeroed(layout) };
    if ptr.is_null() {
        fatal(FatalReason::AllocationFailed { what, bytes });
    }
    ptr as *mut i64
}

/// Allocate the root stack and the two heap spaces, and publish the active
/// pointers.
///
/// Both `root_stack_bytes` and `heap_bytes` are rounded up to a multiple of
/// 8 before allocation. Call this exactly once, before any mutator
/// allocation or `collect` call.
///
/// # Safety
/// Must be called before any other collector function, and must not be
/// called concurrently with itself or with `collect`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn initialize(root_stack_bytes: u64, heap_bytes: u64) {
    let root_stack_bytes = round_up_to_word(root_stack_bytes as usize);
    let heap_bytes = round_up_to_word(heap_bytes as usize);

    let rootstack = alloc_zeroed_region(root_stack_bytes, "root stack");
    let from_base = alloc_zeroed_region(heap_bytes, "from-space");
    let to_base = alloc_zeroed_region(heap_bytes, "to-space");

    HEAP_SIZE_BYTES.store(heap_bytes, Ordering::Relaxed);

    unsafe {
        rootstack_begin = rootstack;

        fromspace_begin = from_base;
        fromspace_end = from_base.byte_add(heap_bytes);
        free_ptr = from_base;

        // Computed from `to_base`, not read back from the (still
        // uninitialized) TOSPACE_END: doing the latter would silently
        // capture garbage on the first call.
        TOSPACE_BEGIN = to_base;
        TOSPACE_END = to_base.byte_add(heap_bytes);
    }
}

/// Current bounds and size of the inactive (to-)space. Used by the collector
/// driver during a Cheney scan and by the post-swap bookkeeping.
pub fn tospace_bounds() -> (*mut i64, *mut i64) {
    unsafe { (TOSPACE_BEGIN, TOSPACE_END) }
}

/// Size in bytes of each heap space, as recorded at `initialize`.
pub fn heap_size_bytes() -> usize {
    HEAP_SIZE_BYTES.load(Ordering::Relaxed)
}

/// Swap the roles of from-space and to-space: the space just scanned into
/// becomes the new active space, and the old active space (now logically
/// dead) becomes the space the next collection scans into.
///
/// # Safety
/// Must only be called from within `collect`, after the Cheney scan has
/// finished copying every reachable tuple out of the old from-space.
pub unsafe fn swap_spaces(new_free: *mut i64) {
    unsafe {
        let heap_bytes = HEAP_SIZE_BYTES.load(Ordering::Relaxed);
        let old_from_begin = fromspace_begin;
        let old_from_end = fromspace_end;

        fromspace_begin = TOSPACE_BEGIN;
        fromspace_end = TOSPACE_BEGIN.byte_add(heap_bytes);
        free_ptr = new_free;

        TOSPACE_BEGIN = old_from_begin;
        TOSPACE_END = old_from_end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn round_up_rounds_to_next_multiple_of_eight() {
        assert_eq!(round_up_to_word(1023), 1024);
        assert_eq!(round_up_to_word(1024), 1024);
        assert_eq!(round_up_to_word(0), 0);
        assert_eq!(round_up_to_word(120), 120);
        assert_eq!(round_up_to_word(121), 128);
    }

    // Global heap statics are process-wide state, so tests that call
    // `initialize` must not interleave.
    #[test]
    #[serial(gc_globals)]
    fn initialize_publishes_word_rounded_bounds() {
        unsafe {
            initialize(120, 1023);

            assert_eq!(
                (fromspace_end as usize) - (fromspace_begin as usize),
                1024
            );
            assert_eq!(free_ptr, fromspace_begin);
            assert_eq!(heap_size_bytes(), 1024);

            let (to_begin, to_end) = tospace_bounds();
            assert_eq!((to_end as usize) - (to_begin as usize), 1024);
            assert_ne!(to_begin, fromspace_begin);
        }
    }

    #[test]
    #[serial(gc_globals)]
    #[should_panic(expected = "root stack")]
    fn initialize_rejects_zero_sized_root_stack() {
        unsafe {
            initialize(0, 64);
        }
    }
}
