//! Human-viewable previews of encoded labels.
//!
//! [`render_html`] lays the same geometry table out as an HTML print
//! document (one page per label, positioned in centimetres). [`labelary_url`]
//! points at the public Labelary renderer for a single frame.

use std::fmt::Write as _;

use crate::content::render_template;
use crate::geometry::{FieldKind, GeometrySpec, Resolver};
use crate::record::LabelRecord;
use crate::template::ProtocolFrame;
use crate::units::{CM_PER_INCH, cm_to_inches, dots_per_mm};

/// Labelary rendering endpoint.
pub const LABELARY_BASE_URL: &str = "http://api.labelary.com/v1/printers";

/// Resolution previews are laid out at before converting back to cm.
const PREVIEW_DPI: u32 = 203;

/// Labelary URL rendering `frame` as a PNG.
pub fn labelary_url(frame: &ProtocolFrame, geometry: &GeometrySpec, dpi: u32) -> String {
    let width = cm_to_inches(geometry.width.to_cm());
    let height = cm_to_inches(geometry.height.to_cm());
    format!(
        "{LABELARY_BASE_URL}/{}dpmm/labels/{}x{}/0/{}",
        dots_per_mm(dpi),
        trim_float(width),
        trim_float(height),
        urlencoding::encode(frame.as_str())
    )
}

/// Render `records` as a printable HTML document.
pub fn render_html(records: &[LabelRecord], geometry: &GeometrySpec) -> String {
    let r = Resolver::new(geometry, PREVIEW_DPI);
    let cm = |dots: u32| f64::from(dots) / f64::from(PREVIEW_DPI) * CM_PER_INCH;
    let (w, h) = (geometry.width.to_cm(), geometry.height.to_cm());

    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <style>\n@page {{ size: {w:.2}cm {h:.2}cm; margin: 0; }}\n\
         body {{ margin: 0; font-family: Arial, sans-serif; }}\n\
         .label {{ position: relative; width: {w:.2}cm; height: {h:.2}cm; \
         overflow: hidden; page-break-after: always; }}\n\
         .field {{ position: absolute; white-space: nowrap; line-height: 1; }}\n\
         .qr {{ position: absolute; border: 1px solid #000; font-size: 6pt; \
         display: flex; align-items: center; justify-content: center; }}\n\
         .rule {{ position: absolute; background: #000; }}\n\
         </style>\n</head>\n<body>\n",
        escape_html(&geometry.name)
    );

    for record in records {
        let _ = writeln!(out, "<div class=\"label\" data-id=\"{}\">", escape_html(&record.id));
        for field in &geometry.fields {
            let (x, y) = (cm(r.x(&field.x)), cm(r.y(&field.y)));
            match &field.kind {
                FieldKind::Text { font, content } => {
                    let size = cm(r.scalar(font.height));
                    let _ = writeln!(
                        out,
                        "  <div class=\"field\" style=\"left: {x:.2}cm; top: {y:.2}cm; \
                         font-size: {size:.2}cm;\">{}</div>",
                        escape_html(&render_template(content, record))
                    );
                }
                FieldKind::QrCode {
                    magnification,
                    content,
                } => {
                    // Model 2 version 1 is 21 modules wide at one dot per module.
                    let side = cm(21 * r.scalar(*magnification));
                    let _ = writeln!(
                        out,
                        "  <div class=\"qr\" style=\"left: {x:.2}cm; top: {y:.2}cm; \
                         width: {side:.2}cm; height: {side:.2}cm;\">{}</div>",
                        escape_html(&render_template(content, record))
                    );
                }
                FieldKind::Rule { width, thickness } => {
                    let _ = writeln!(
                        out,
                        "  <div class=\"rule\" style=\"left: {x:.2}cm; top: {y:.2}cm; \
                         width: {:.2}cm; height: {:.2}cm;\"></div>",
                        cm(r.scalar(*width)),
                        cm(r.scalar(*thickness))
                    );
                }
            }
        }
        out.push_str("</div>\n");
    }
    out.push_str("</body>\n</html>\n");
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Format with up to two decimals, dropping trailing zeros.
fn trim_float(v: f64) -> String {
    let s = format!("{v:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{LEGACY_4X2, STANDARD};
    use crate::template::encode;

    fn record() -> LabelRecord {
        LabelRecord {
            id: "QA0001".into(),
            product: "Tom & Jerry <Oil>".into(),
            part_no: "GTX-1L".into(),
            grade: "15W-40".into(),
            size: "1L".into(),
            net_qty: "1 pcs".into(),
            pkd: "2024-01-01".into(),
            mrp: "450".into(),
            amount: "100".into(),
            letter: Some("T".into()),
        }
    }

    #[test]
    fn labelary_url_uses_dots_per_mm_and_inches() {
        let g = GeometrySpec::builtin(LEGACY_4X2).unwrap();
        let f = encode(&record(), &g, 203);
        let url = labelary_url(&f, &g, 203);
        assert!(
            url.starts_with("http://api.labelary.com/v1/printers/8dpmm/labels/4x2/0/%5EXA"),
            "{url}"
        );
        assert!(!url.contains('\n'));
    }

    #[test]
    fn labelary_url_for_metric_stock() {
        let g = GeometrySpec::builtin(STANDARD).unwrap();
        let f = encode(&record(), &g, 300);
        // 8.5cm = 3.35in, 5.5cm = 2.17in
        assert!(labelary_url(&f, &g, 300).contains("/12dpmm/labels/3.35x2.17/0/"));
    }

    #[test]
    fn html_has_one_page_per_label_and_escapes_text() {
        let mut second = record();
        second.id = "QA0002".into();
        let g = GeometrySpec::builtin(STANDARD).unwrap();
        let html = render_html(&[record(), second], &g);
        assert_eq!(html.matches("<div class=\"label\"").count(), 2);
        assert!(html.contains("Product: Tom &amp; Jerry &lt;Oil&gt;"));
        assert!(!html.contains("<Oil>"));
        assert!(html.contains("size: 8.50cm 5.50cm"));
    }

    #[test]
    fn html_draws_rules_for_blank_stock() {
        let g = GeometrySpec::builtin(LEGACY_4X2).unwrap();
        let html = render_html(&[record()], &g);
        assert_eq!(html.matches("class=\"rule\"").count(), 2);
        assert_eq!(html.matches("class=\"qr\"").count(), 2);
    }
}
