//! Output rendering for CLI commands.
//!
//! Every command produces one result value. In JSON mode it is written to
//! stdout as a single pretty-printed document; in pretty mode a short human
//! summary goes to stdout and progress chatter to stderr.

use std::io::{self, IsTerminal};

use serde::Serialize;
use zpl_labels_print_client::{PrintReport, PrintStatus, PrinterStatus, StatusClass};

// ── Output format ───────────────────────────────────────────────────────

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Human-readable text.
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, or pretty for terminals and JSON for pipes.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── JSON ────────────────────────────────────────────────────────────────

/// Write `value` to stdout as pretty JSON.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── Print runs ──────────────────────────────────────────────────────────

/// Render the final report of a `print` run.
pub(crate) fn print_report(report: &PrintReport, format: Format) -> anyhow::Result<()> {
    match format {
        Format::Json => print_json(report)?,
        Format::Pretty => {
            let tag = match report.class {
                StatusClass::Success => "ok",
                StatusClass::Partial => "partial",
                StatusClass::Failure => "failed",
            };
            println!("[{tag}] {}", report.message);
            if let Some(c) = report.counts {
                println!(
                    "  total={} successful={} failed={}",
                    c.total, c.successful, c.failed
                );
            }
            if !report.failed_labels.is_empty() {
                println!("  not printed: {}", report.failed_labels.join(", "));
            }
        }
    }
    Ok(())
}

/// Progress line for an intermediate orchestrator status (stderr).
pub(crate) fn print_progress(status: &PrintStatus) {
    if !status.message.is_empty() && status.phase.is_busy() {
        eprintln!("{}", status.message);
    }
}

/// Render a printer status answer.
pub(crate) fn print_printer_status(status: &PrinterStatus, format: Format) -> anyhow::Result<()> {
    match format {
        Format::Json => print_json(status)?,
        Format::Pretty => {
            let state = if status.is_online { "online" } else { "offline" };
            let addr = status.ip_address.as_deref().unwrap_or("unknown address");
            println!(
                "{} printer {state} at {addr} (checked {})",
                status.printer_type, status.last_check
            );
        }
    }
    Ok(())
}

// ── Summary line ────────────────────────────────────────────────────────

/// Print `n item(s)` style summaries to stderr.
pub(crate) fn print_summary(count: usize, noun: &str, verb: &str) {
    let s = if count == 1 { "" } else { "s" };
    eprintln!("{count} {noun}{s} {verb}");
}
