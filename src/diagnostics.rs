//! Runtime diagnostics for production debugging
//!
//! Provides a SIGQUIT (`kill -3`) handler that dumps heap and collection
//! statistics to stderr, similar to a JVM thread dump. Useful for inspecting
//! a long-running mutator process without stopping it.
//!
//! ## Usage
//!
//! Send SIGQUIT to a running process built against this collector:
//! ```bash
//! kill -3 <pid>
//! ```
//!
//! The process dumps diagnostics to stderr and continues running.
//!
//! Gated behind the `diagnostics` feature; see `report_stub.rs` for the
//! no-op symbols published when it is disabled.

#![cfg(feature = "diagnostics")]

use std::sync::Once;

use crate::space;
use crate::stats;

static SIGNAL_HANDLER_INIT: Once = Once::new();

/// Install the SIGQUIT signal handler for diagnostics.
///
/// Safe to call multiple times (idempotent). Not called automatically by
/// `initialize`, since installing a signal handler is an observable,
/// process-wide side effect the embedder should opt into explicitly.
pub fn install_signal_handler() {
    SIGNAL_HANDLER_INIT.call_once(|| {
        #[cfg(unix)]
        {
            unsafe {
                let _ = signal_hook::low_level::register(signal_hook::consts::SIGQUIT, || {
                    dump_diagnostics();
                });
            }
        }

        #[cfg(not(unix))]
        {
            // Signal handling not supported on non-Unix platforms;
            // dump_diagnostics() can still be called directly.
        }
    });
}

/// Dump heap and collection diagnostics to stderr.
///
/// Can be called directly from code or triggered via SIGQUIT.
pub fn dump_diagnostics() {
    use std::io::Write;

    let mut out = std::io::stderr().lock();
    let s = stats::stats();

    let _ = writeln!(out, "\n=== GC Diagnostics ===");
    let _ = writeln!(out, "Timestamp: {:?}", std::time::SystemTime::now());

    let _ = writeln!(out, "\n[Heap]");
    let _ = writeln!(out, "  Space size:     {} bytes", space::heap_size_bytes());
    unsafe {
        let _ = writeln!(out, "  fromspace_begin: {:?}", space::fromspace_begin);
        let _ = writeln!(out, "  fromspace_end:   {:?}", space::fromspace_end);
        let _ = writeln!(out, "  free_ptr:        {:?}", space::free_ptr);
    }

    let _ = writeln!(out, "\n[Collections]");
    let _ = writeln!(out, "  Collections run: {}", s.collections_run);
    let _ = writeln!(out, "  Bytes live:      {}", s.bytes_live);
    let _ = writeln!(out, "  Bytes reclaimed: {}", s.bytes_reclaimed);
    let _ = writeln!(out, "  Peak bytes live: {}", s.peak_bytes_live);

    let _ = writeln!(out, "\n=== End Diagnostics ===\n");
}
