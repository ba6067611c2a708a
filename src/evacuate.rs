//! Evacuator
//!
//! Copies a single tuple from from-space to to-space, or recognizes it has
//! already been copied and redirects the caller to the existing copy. This
//! is the only place a tuple's bytes move; [`crate::collector::collect`]
//! calls it once per root-stack slot and once per pointer field uncovered
//! during the Cheney scan.

use crate::error::{FatalReason, fatal};
use crate::tag::{self, MAX_TUPLE_LEN};

/// Outcome of one call to [`evacuate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvacuationResult {
    /// The tuple was copied for the first time; `*slot` now holds its new address.
    Copied,
    /// The tuple had already been copied in an earlier call; `*slot` was
    /// rewritten to the established forwarding address.
    AlreadyCopied,
    /// `*slot` was null and `allow_null` permitted that (root-stack scanning only).
    Null,
}

/// Evacuate the tuple referenced by `*slot`, if any.
///
/// `next_free` is the current to-space bump pointer; on a first-time copy it
/// is advanced past the freshly copied tuple. `allow_null` must be `true`
/// only while walking the root stack (§4.4 step 2); every other call site
/// (scanning pointer fields inside an already-copied tuple) passes `false`,
/// because a pointer-tagged element slot holding null is a corrupted heap.
///
/// # Safety
/// `slot` must point to a live word holding either null or a valid pointer
/// to a tag slot in the current from-space. `*next_free` must point into
/// to-space with enough room for the tuple if it has not yet been copied.
pub unsafe fn evacuate(
    slot: *mut i64,
    next_free: &mut *mut i64,
    allow_null: bool,
) -> EvacuationResult {
    let p = unsafe { *slot };
    if p == 0 {
        if allow_null {
            return EvacuationResult::Null;
        }
        fatal(FatalReason::UnexpectedNull { slot: slot as i64 });
    }

    let old_addr = p as *mut i64;
    let t = unsafe { *old_addr };

    if tag::is_copied(t) {
        let fwd = tag::forwarding_address(t);
        unsafe {
            *slot = fwd;
        }
        return EvacuationResult::AlreadyCopied;
    }

    let len = tag::length(t);
    if len > MAX_TUPLE_LEN {
        fatal(FatalReason::CorruptTagLength {
            addr: p,
            len,
        });
    }
    let words = (len + 1) as usize;

    let new_addr = *next_free;
    unsafe {
        // Copy before installing the forwarding tag: the forwarding store
        // overwrites the tag word, and that tag must already be safely
        // preserved at `new_addr` by the time it happens.
        std::ptr::copy_nonoverlapping(old_addr, new_addr, words);
        *next_free = new_addr.add(words);
        tag::install_forwarding(old_addr, new_addr as i64);
        *slot = new_addr as i64;
    }

    EvacuationResult::Copied
}
