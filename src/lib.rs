//! A stop-the-world, semi-space copying garbage collector for AOT-compiled
//! tuple-based code.
//!
//! Compiled programs allocate fixed-shape tuples by bumping [`space::free_ptr`]
//! and call [`collector::collect`] whenever an allocation would overrun
//! [`space::fromspace_end`]. The collector walks the root stack, evacuates
//! every reachable tuple into the inactive space with a breadth-first Cheney
//! scan, then swaps the two spaces so the copy becomes the new active heap.
//!
//! Key design principles:
//! - The four pointers the compiler's generated code indexes directly
//!   (`free_ptr`, `fromspace_begin`, `fromspace_end`, `rootstack_begin`) are
//!   published as raw `#[no_mangle]` statics, not hidden behind a context
//!   struct.
//! - A tuple's liveness and shape live entirely in its 64-bit tag word; there
//!   is no separate type-descriptor table.
//! - Collection is never concurrent with the mutator: every global here is a
//!   plain static, not an atomic guarding cross-thread access.

pub mod collector;
pub mod error;
pub mod evacuate;
pub mod space;
pub mod stats;
pub mod tag;

#[cfg(feature = "diagnostics")]
pub mod diagnostics;
#[cfg(feature = "diagnostics")]
pub mod report;
#[cfg(not(feature = "diagnostics"))]
#[path = "report_stub.rs"]
pub mod report;

pub use collector::collect;
pub use error::{FatalReason, fatal};
pub use space::{
    free_ptr, fromspace_begin, fromspace_end, heap_size_bytes, initialize, rootstack_begin,
};
pub use stats::{CollectionStats, stats};
pub use tag::{MAX_TUPLE_LEN, encode_live, is_pointer};
