//! Built-in geometry tables.

use super::{
    Bands, DEFAULT_DARKNESS, Edge, FieldKind, FieldPlacement, Font, GeometrySpec, Length, Offset,
    Scalar, TextEncoding,
};
use crate::units::LEGACY_BASE_DPI;

/// 8.5cm x 5.5cm stock with pre-printed header and footer artwork.
pub const STANDARD: &str = "standard";
/// 4in x 2in blank stock; rules are drawn by the printer.
pub const LEGACY_4X2: &str = "legacy-4x2";
/// 2in x 1.5in blank stock.
pub const COMPACT_2X1_5: &str = "compact-2x1.5";

/// Every built-in geometry name.
pub const BUILTIN_NAMES: &[&str] = &[STANDARD, LEGACY_4X2, COMPACT_2X1_5];

pub(super) fn by_name(name: &str) -> Option<GeometrySpec> {
    match name {
        STANDARD => Some(standard()),
        LEGACY_4X2 => Some(legacy_4x2()),
        COMPACT_2X1_5 => Some(compact_2x1_5()),
        _ => None,
    }
}

// ── Field helpers ───────────────────────────────────────────────────────

fn text(id: &str, x: Offset, y: Offset, font: Font, content: &str) -> FieldPlacement {
    FieldPlacement {
        id: id.to_string(),
        x,
        y,
        kind: FieldKind::Text {
            font,
            content: content.to_string(),
        },
    }
}

fn qr(id: &str, x: Offset, y: Offset, magnification: Scalar) -> FieldPlacement {
    FieldPlacement {
        id: id.to_string(),
        x,
        y,
        kind: FieldKind::QrCode {
            magnification,
            content: "{id}".to_string(),
        },
    }
}

fn rule(id: &str, x: u32, y: u32, width: u32, thickness: u32) -> FieldPlacement {
    FieldPlacement {
        id: id.to_string(),
        x: Offset::Baseline(x),
        y: Offset::Baseline(y),
        kind: FieldKind::Rule {
            width: Scalar::Baseline(width),
            thickness: Scalar::Baseline(thickness),
        },
    }
}

/// Fixed-height font; width follows the height.
fn fixed(height: u32) -> Font {
    Font {
        height: Scalar::Fixed(height),
        width: None,
    }
}

/// Square font authored at the base resolution.
fn baseline(size: u32) -> Font {
    Font {
        height: Scalar::Baseline(size),
        width: Some(Scalar::Baseline(size)),
    }
}

fn at(x: u32, y: u32) -> (Offset, Offset) {
    (Offset::Baseline(x), Offset::Baseline(y))
}

fn baseline_text(id: &str, (x, y): (Offset, Offset), size: u32, content: &str) -> FieldPlacement {
    text(id, x, y, baseline(size), content)
}

fn baseline_qr(id: &str, (x, y): (Offset, Offset), magnification: u32) -> FieldPlacement {
    qr(id, x, y, Scalar::Baseline(magnification))
}

// ── Tables ──────────────────────────────────────────────────────────────

pub(super) fn standard() -> GeometrySpec {
    let body = |rows: u32| Offset::at(Edge::Body, &[0.18]).rows(rows);
    let left = || Offset::start(&[0.25]);
    let body_font = fixed(30);

    GeometrySpec {
        name: STANDARD.to_string(),
        width: Length::Cm(8.5),
        height: Length::Cm(5.5),
        base_dpi: LEGACY_BASE_DPI,
        bands: Some(Bands {
            header_cm: 1.0,
            body_cm: 2.8,
            footer_gap_cm: 0.62,
        }),
        pitch_cm: 0.36,
        darkness: DEFAULT_DARKNESS,
        text_encoding: Some(TextEncoding::Utf8),
        fields: vec![
            // Body, left column
            text("product", left(), body(0), body_font, "Product: {product}"),
            text("part_no", left(), body(1), body_font, "Part No: {part_no}"),
            text("grade", left(), body(2), body_font, "Grade: {grade}"),
            text("net_qty", left(), body(3), body_font, "Net Qty: {net_qty}"),
            text(
                "mrp",
                left(),
                body(4),
                body_font,
                "MRP: ₹{mrp} (Incl. of all taxes)",
            ),
            // Body, right column
            text(
                "letter",
                Offset::end(&[-0.25, -0.8]),
                body(0),
                fixed(55),
                "{letter}",
            ),
            text(
                "size",
                Offset::end(&[-0.25, -2.5]),
                body(2),
                body_font,
                "Size: {size}",
            ),
            text(
                "pkd",
                Offset::end(&[-0.25, -3.2]),
                body(3),
                body_font,
                "PKD: {pkd}",
            ),
            // Footer
            qr(
                "qr_left",
                Offset::start(&[0.3]),
                Offset::at(Edge::Footer, &[]),
                Scalar::Fixed(3),
            ),
            text(
                "unique_id",
                Offset::at(Edge::Center, &[-1.8]),
                Offset::at(Edge::Footer, &[0.85]),
                fixed(26),
                "{id}",
            ),
            qr(
                "qr_right",
                Offset::end(&[-2.2]),
                Offset::at(Edge::Footer, &[]),
                Scalar::Fixed(3),
            ),
            text(
                "amount",
                Offset::end(&[-0.15, -1.0]),
                Offset::at(Edge::Footer, &[0.3]),
                fixed(40),
                "{amount}",
            ),
        ],
    }
}

fn legacy_4x2() -> GeometrySpec {
    GeometrySpec {
        name: LEGACY_4X2.to_string(),
        width: Length::Inches(4.0),
        height: Length::Inches(2.0),
        base_dpi: LEGACY_BASE_DPI,
        bands: None,
        pitch_cm: 0.0,
        darkness: DEFAULT_DARKNESS,
        text_encoding: None,
        fields: vec![
            rule("rule_top", 20, 20, 772, 2),
            baseline_text("product", at(35, 35), 32, "Product: {product}"),
            baseline_text("letter", at(740, 35), 60, "{letter}"),
            baseline_text("part_no", at(35, 75), 24, "Part No: {part_no}"),
            baseline_text("grade", at(35, 105), 24, "Grade: {grade}"),
            baseline_text("size", at(460, 105), 24, "Size: {size}"),
            baseline_text("net_qty", at(35, 135), 24, "Net Qty: {net_qty}"),
            baseline_text("pkd", at(460, 135), 24, "PKD: {pkd}"),
            baseline_text("mrp", at(35, 165), 24, "MRP: ₹{mrp}"),
            baseline_text("tax_note", at(200, 168), 18, "(Incl.of all taxes)"),
            rule("rule_mid", 20, 205, 772, 2),
            baseline_qr("qr_left", at(35, 220), 3),
            baseline_text("unique_id", at(220, 268), 28, "{id}"),
            baseline_qr("qr_right", at(540, 220), 3),
            baseline_text("amount", at(700, 238), 40, "₹{amount}"),
        ],
    }
}

fn compact_2x1_5() -> GeometrySpec {
    GeometrySpec {
        name: COMPACT_2X1_5.to_string(),
        width: Length::Inches(2.0),
        height: Length::Inches(1.5),
        base_dpi: LEGACY_BASE_DPI,
        bands: None,
        pitch_cm: 0.0,
        darkness: DEFAULT_DARKNESS,
        text_encoding: None,
        fields: vec![
            rule("rule_top", 10, 10, 386, 1),
            baseline_text("product", at(15, 18), 24, "Product: {product}"),
            baseline_text("part_no", at(15, 45), 18, "Part No: {part_no}"),
            baseline_text("grade", at(15, 65), 18, "Grade: {grade}"),
            baseline_text("size", at(200, 65), 18, "Size: {size}"),
            baseline_text("net_qty", at(15, 85), 18, "Net Qty: {net_qty}"),
            baseline_text("pkd", at(200, 85), 18, "PKD: {pkd}"),
            baseline_text("mrp", at(15, 105), 18, "MRP: ₹{mrp}"),
            rule("rule_mid", 10, 130, 386, 1),
            baseline_qr("qr_left", at(15, 140), 3),
            baseline_text("unique_id", at(120, 198), 18, "{id}"),
            baseline_qr("qr_right", at(280, 140), 3),
            baseline_text("amount", at(346, 150), 22, "₹{amount}"),
        ],
    }
}
