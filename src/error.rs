//! Fatal error reporting
//!
//! The collector never recovers from a broken invariant: once a tag is
//! corrupted, a root is out of range, or to-space runs out, there is no safe
//! way to resume the mutator. Every such condition funnels through [`fatal`]
//! so the failure is reported consistently instead of scattered `panic!`
//! call sites with ad hoc messages.
//!
//! `fatal` writes a diagnostic line to stderr naming the violated condition
//! and, where available, the offending address, then panics. Panicking
//! (rather than `std::process::abort`) lets tests assert on these conditions
//! with `#[should_panic]` while still terminating a real mutator process
//! the moment `collect` unwinds past the FFI boundary.

use std::fmt;

/// A single fatal condition, named so call sites stay uniform and testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalReason {
    /// `initialize` was asked for a zero-sized heap or root stack.
    ZeroSizedRegion { what: &'static str },
    /// The two heap spaces could not be allocated.
    AllocationFailed { what: &'static str, bytes: usize },
    /// A tag's length field exceeds [`crate::tag::MAX_TUPLE_LEN`].
    CorruptTagLength { addr: i64, len: u32 },
    /// `collect` was called with a root-stack top below the root-stack base.
    RootStackUnderflow { top: i64, begin: i64 },
    /// A null pointer was read from a slot where nulls are not permitted
    /// (an element slot whose pointer-mask bit is set).
    UnexpectedNull { slot: i64 },
    /// The live set after a collection does not fit in to-space.
    OutOfMemory {
        bytes_needed: u64,
        bytes_available: u64,
    },
}

impl fmt::Display for FatalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalReason::ZeroSizedRegion { what } => {
                write!(f, "{what} size must be nonzero")
            }
            FatalReason::AllocationFailed { what, bytes } => {
                write!(f, "failed to allocate {bytes} bytes for {what}")
            }
            FatalReason::CorruptTagLength { addr, len } => {
                write!(
                    f,
                    "tuple at {addr:#x} has length {len}, exceeding the maximum of {}",
                    crate::tag::MAX_TUPLE_LEN
                )
            }
            FatalReason::RootStackUnderflow { top, begin } => {
                write!(
                    f,
                    "root-stack top {top:#x} is below root-stack base {begin:#x}"
                )
            }
            FatalReason::UnexpectedNull { slot } => {
                write!(f, "slot at {slot:#x} is null where a pointer was required")
            }
            FatalReason::OutOfMemory {
                bytes_needed,
                bytes_available,
            } => {
                write!(
                    f,
                    "collection freed only {bytes_available} bytes, needed {bytes_needed}"
                )
            }
        }
    }
}

/// Report `reason` to stderr and terminate the collection.
///
/// # Panics
/// Always panics, after writing the diagnostic line.
pub fn fatal(reason: FatalReason) -> ! {
    eprintln!("gc: fatal: {reason}");
    panic!("gc: fatal: {reason}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_name_the_condition() {
        let reason = FatalReason::CorruptTagLength {
            addr: 0x1000,
            len: 51,
        };
        let msg = reason.to_string();
        assert!(msg.contains("51"));
        assert!(msg.contains("0x1000"));
        assert!(msg.contains("50"));
    }

    #[test]
    #[should_panic(expected = "root-stack top")]
    fn fatal_panics() {
        fatal(FatalReason::RootStackUnderflow { top: 0, begin: 8 });
    }
}
