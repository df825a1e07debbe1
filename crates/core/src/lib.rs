//! Coupon-label encoding core.
//!
//! Turns [`LabelRecord`]s into ZPL II frames and sequenced batch requests.
//! The main entry points are [`encode`] for a single label, [`assemble`] for
//! a batch, and [`GeometrySpec::builtin`] for the label layouts.
//!
//! Everything in this crate is pure and synchronous: no I/O, no logging.

#![warn(missing_docs)]

/// Batch assembly into gateway requests.
pub mod batch;
/// Content templates used by geometry fields.
pub mod content;
/// Error types.
pub mod error;
/// `^FH` hex escaping for field data.
pub mod escape;
/// Structural frame check.
pub mod frame;
/// Label geometry tables.
pub mod geometry;
/// HTML and Labelary previews.
pub mod preview;
/// Label source records.
pub mod record;
/// Upstream batch-service adapter.
pub mod source;
/// Template engine.
pub mod template;
/// Physical-length to printer-dot conversion.
pub mod units;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Records
pub use record::{LabelRecord, RecordField, validate_records};
pub use source::BatchSource;

// Geometry
pub use geometry::{GeometrySpec, TextEncoding, load_geometry_from_str};

// Encoding
pub use template::{ProtocolFrame, batch_document, encode};

// Batch
pub use batch::{BatchEntry, BatchPrintRequest, PrinterType, assemble};

// Errors
pub use error::LabelError;

// Units
pub use units::{cm_to_dots, scale};
