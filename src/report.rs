//! At-exit collection report
//!
//! Dumps collection statistics when the mutator finishes, controlled by the
//! `GC_REPORT` env var:
//! - Unset → no report, zero cost
//! - `1` → human-readable to stderr
//! - `json` → JSON to stderr
//! - `json:/path` → JSON to file
//!
//! ## Feature flag
//!
//! This module requires the `diagnostics` feature (enabled by default). When
//! disabled, `report_stub.rs` provides a no-op FFI symbol instead.

#![cfg(feature = "diagnostics")]

use std::io::Write;
use std::sync::OnceLock;

use crate::space;
use crate::stats::{self, CollectionStats};

// =============================================================================
// Report configuration (parsed from GC_REPORT)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportDestination {
    Stderr,
    File(String),
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub format: ReportFormat,
    pub destination: ReportDestination,
}

impl ReportConfig {
    /// Parse from the `GC_REPORT` environment variable.
    pub fn from_env() -> Option<Self> {
        let val = std::env::var("GC_REPORT").ok()?;
        if val.is_empty() {
            return None;
        }

        match val.as_str() {
            "0" => None,
            "1" => Some(ReportConfig {
                format: ReportFormat::Human,
                destination: ReportDestination::Stderr,
            }),
            "json" => Some(ReportConfig {
                format: ReportFormat::Json,
                destination: ReportDestination::Stderr,
            }),
            s if s.starts_with("json:") => Some(ReportConfig {
                format: ReportFormat::Json,
                destination: ReportDestination::File(s[5..].to_string()),
            }),
            _ => {
                eprintln!("Warning: GC_REPORT='{val}' not recognized, ignoring");
                None
            }
        }
    }
}

static REPORT_CONFIG: OnceLock<Option<ReportConfig>> = OnceLock::new();

fn get_report_config() -> &'static Option<ReportConfig> {
    REPORT_CONFIG.get_or_init(ReportConfig::from_env)
}

// =============================================================================
// Report data
// =============================================================================

#[derive(Debug)]
pub struct ReportData {
    pub heap_size_bytes: usize,
    pub stats: CollectionStats,
}

fn collect_report_data() -> ReportData {
    ReportData {
        heap_size_bytes: space::heap_size_bytes(),
        stats: stats::stats(),
    }
}

// =============================================================================
// Formatting
// =============================================================================

fn format_human(data: &ReportData) -> String {
    let mut out = String::new();
    out.push_str("=== GC REPORT ===\n");
    out.push_str(&format!("Space size:      {} bytes\n", data.heap_size_bytes));
    out.push_str(&format!("Collections run: {}\n", data.stats.collections_run));
    out.push_str(&format!("Bytes live:      {}\n", data.stats.bytes_live));
    out.push_str(&format!("Bytes reclaimed: {}\n", data.stats.bytes_reclaimed));
    out.push_str(&format!("Peak bytes live: {}\n", data.stats.peak_bytes_live));
    out.push_str("==================\n");
    out
}

#[cfg(feature = "report-json")]
fn format_json(data: &ReportData) -> String {
    let mut map = serde_json::Map::new();
    map.insert(
        "heap_size_bytes".into(),
        serde_json::Value::Number((data.heap_size_bytes as u64).into()),
    );
    map.insert(
        "collections_run".into(),
        serde_json::Value::Number(data.stats.collections_run.into()),
    );
    map.insert(
        "bytes_live".into(),
        serde_json::Value::Number(data.stats.bytes_live.into()),
    );
    map.insert(
        "bytes_reclaimed".into(),
        serde_json::Value::Number(data.stats.bytes_reclaimed.into()),
    );
    map.insert(
        "peak_bytes_live".into(),
        serde_json::Value::Number(data.stats.peak_bytes_live.into()),
    );

    let obj = serde_json::Value::Object(map);
    serde_json::to_string(&obj).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(not(feature = "report-json"))]
fn format_json(data: &ReportData) -> String {
    eprintln!(
        "Warning: GC_REPORT=json requires the 'report-json' feature. Falling back to human format."
    );
    format_human(data)
}

// =============================================================================
// Emit
// =============================================================================

fn emit_report() {
    let config = match get_report_config() {
        Some(c) => c,
        None => return,
    };

    let data = collect_report_data();

    let output = match config.format {
        ReportFormat::Human => format_human(&data),
        ReportFormat::Json => format_json(&data),
    };

    match &config.destination {
        ReportDestination::Stderr => {
            let _ = std::io::stderr().write_all(output.as_bytes());
        }
        ReportDestination::File(path) => {
            if let Ok(mut f) = std::fs::File::create(path) {
                let _ = f.write_all(output.as_bytes());
            } else {
                eprintln!("Warning: could not write report to {path}");
                let _ = std::io::stderr().write_all(output.as_bytes());
            }
        }
    }
}

// =============================================================================
// FFI entry point
// =============================================================================

/// At-exit report, called from generated main after the mutator finishes.
///
/// # Safety
/// Safe to call from any context.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gc_report() {
    emit_report();
}
