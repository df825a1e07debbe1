//! Template engine: one label record plus a geometry table in, one ZPL frame
//! out.
//!
//! Encoding is pure and deterministic. Every coordinate is resolved through
//! the geometry's [`Resolver`](crate::geometry), so the same table serves any
//! printer resolution.

use std::fmt;

use crate::content::render_template;
use crate::escape::{escape_field_data, needs_hex_escape};
use crate::frame::{FRAME_END, FRAME_START};
use crate::geometry::{FieldKind, Font, GeometrySpec, Resolver};
use crate::record::LabelRecord;

/// Separator between frames in a multi-label document.
pub const FRAME_SEPARATOR: &str = "\n\n";

/// QR model 2 with error correction level Q, manual data input.
const QR_DATA_PREFIX: &str = "QA,";

/// A generated ZPL document for one label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolFrame(String);

impl ProtocolFrame {
    /// The frame text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the frame, returning its text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ProtocolFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProtocolFrame {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ProtocolFrame> for String {
    fn from(frame: ProtocolFrame) -> Self {
        frame.0
    }
}

// ── Encoding ────────────────────────────────────────────────────────────

/// Encode `record` with `geometry` for a printer at `dpi`.
///
/// The record is expected to have passed
/// [`LabelRecord::validate`]; encoding itself never fails.
pub fn encode(record: &LabelRecord, geometry: &GeometrySpec, dpi: u32) -> ProtocolFrame {
    let r = Resolver::new(geometry, dpi);
    let mut out = Vec::with_capacity(geometry.fields.len() + 8);

    out.push(FRAME_START.to_string());
    if let Some(encoding) = geometry.text_encoding {
        out.push(encoding.directive().to_string());
    }
    out.push("^PON".to_string());
    out.push(format!("^PW{}", r.width()));
    out.push(format!("^LL{}", r.height()));
    out.push(format!("~SD{}", geometry.darkness));

    let mut current_font: Option<(u32, Option<u32>)> = None;
    for field in &geometry.fields {
        let (x, y) = (r.x(&field.x), r.y(&field.y));
        match &field.kind {
            FieldKind::Text { font, content } => {
                let resolved = resolve_font(&r, font);
                if current_font != Some(resolved) {
                    out.push(font_directive(resolved));
                    current_font = Some(resolved);
                }
                let data = render_template(content, record);
                out.push(format!("^FO{x},{y}{}^FS", field_data("", &data)));
            }
            FieldKind::QrCode {
                magnification,
                content,
            } => {
                let data = render_template(content, record);
                out.push(format!(
                    "^FO{x},{y}^BQN,2,{}{}^FS",
                    r.scalar(*magnification),
                    field_data(QR_DATA_PREFIX, &data)
                ));
            }
            FieldKind::Rule { width, thickness } => {
                let t = r.scalar(*thickness);
                out.push(format!("^FO{x},{y}^GB{},{t},{t},B,0^FS", r.scalar(*width)));
            }
        }
    }

    out.push(FRAME_END.to_string());
    ProtocolFrame(out.join("\n"))
}

/// Encode every record and join the frames into one document.
pub fn batch_document(records: &[LabelRecord], geometry: &GeometrySpec, dpi: u32) -> String {
    records
        .iter()
        .map(|r| encode(r, geometry, dpi).into_string())
        .collect::<Vec<_>>()
        .join(FRAME_SEPARATOR)
}

fn resolve_font(r: &Resolver, font: &Font) -> (u32, Option<u32>) {
    (r.scalar(font.height), font.width.map(|w| r.scalar(w)))
}

fn font_directive((height, width): (u32, Option<u32>)) -> String {
    match width {
        Some(w) => format!("^CF0,{height},{w}"),
        None => format!("^CF0,{height}"),
    }
}

/// `^FD` block for `data`, preceded by `^FH` when the data carries control
/// characters.
fn field_data(prefix: &str, data: &str) -> String {
    if needs_hex_escape(data) {
        format!("^FH^FD{prefix}{}", escape_field_data(data))
    } else {
        format!("^FD{prefix}{data}")
    }
}
