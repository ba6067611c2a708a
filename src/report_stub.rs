//! Stub module for the at-exit report when the "diagnostics" feature is
//! disabled.
//!
//! Publishes the same no-op symbol so a binary linked against this crate
//! builds identically regardless of which features were enabled.

/// No-op at-exit report when diagnostics is disabled.
///
/// # Safety
/// Always safe to call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gc_report() {
    // No-op: diagnostics feature not enabled.
}
