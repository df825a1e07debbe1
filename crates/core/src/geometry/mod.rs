//! Label geometries: physical size plus a table of field placements.
//!
//! A [`GeometrySpec`] is pure data. The template engine walks its field
//! table and resolves every coordinate through [`crate::units`], so adding
//! a label size means adding a table (in code via [`builtin`], or as JSON via
//! [`load_geometry_from_str`]), never new encoding code.

mod builtin;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::content::{check_template, template_fields};
use crate::error::LabelError;
use crate::record::RecordField;
use crate::units::{LEGACY_BASE_DPI, Scaler, cm_to_dots, inches_to_cm, inches_to_dots};

pub use builtin::{BUILTIN_NAMES, COMPACT_2X1_5, LEGACY_4X2, STANDARD};

/// Highest `~SD` darkness value.
pub const MAX_DARKNESS: u32 = 30;

/// Darkness emitted when a geometry does not specify one.
pub const DEFAULT_DARKNESS: u32 = 15;

/// A named label template variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySpec {
    /// Variant name (e.g. `standard`).
    pub name: String,
    /// Physical label width.
    pub width: Length,
    /// Physical label height.
    pub height: Length,
    /// Resolution [`Offset::Baseline`] and [`Scalar::Baseline`] values were
    /// authored at.
    #[serde(default = "default_base_dpi")]
    pub base_dpi: u32,
    /// Header/body/footer bands; required by `body` and `footer` anchors.
    #[serde(default)]
    pub bands: Option<Bands>,
    /// Row pitch for stacked text fields, in centimetres.
    #[serde(default)]
    pub pitch_cm: f64,
    /// Print darkness (`~SD`).
    #[serde(default = "default_darkness")]
    pub darkness: u32,
    /// Character-set directive emitted ahead of the fields, if any.
    #[serde(default)]
    pub text_encoding: Option<TextEncoding>,
    /// Field placements, emitted in order.
    pub fields: Vec<FieldPlacement>,
}

fn default_base_dpi() -> u32 {
    LEGACY_BASE_DPI
}

fn default_darkness() -> u32 {
    DEFAULT_DARKNESS
}

/// A physical length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Length {
    /// Centimetres.
    Cm(f64),
    /// Inches.
    Inches(f64),
}

impl Length {
    /// Length in printer dots at `dpi`.
    pub fn to_dots(self, dpi: u32) -> u32 {
        match self {
            Length::Cm(cm) => cm_to_dots(cm, dpi),
            Length::Inches(inches) => inches_to_dots(inches, dpi),
        }
    }

    /// Length in centimetres.
    pub fn to_cm(self) -> f64 {
        match self {
            Length::Cm(cm) => cm,
            Length::Inches(inches) => inches_to_cm(inches),
        }
    }
}

/// Vertical bands of a label whose header and footer carry pre-printed
/// artwork.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    /// Pre-printed header height.
    pub header_cm: f64,
    /// Dynamic body height.
    pub body_cm: f64,
    /// Pre-printed strip between body and the footer's dynamic area.
    pub footer_gap_cm: f64,
}

/// Character-set directive for a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    /// `^CI28`: field data is UTF-8 (needed for `₹`).
    Utf8,
}

impl TextEncoding {
    /// The directive emitted at the top of the frame.
    pub fn directive(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "^CI28",
        }
    }
}

/// One positioned element of a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPlacement {
    /// Field identifier, unique within the geometry.
    pub id: String,
    /// Horizontal origin.
    pub x: Offset,
    /// Vertical origin.
    pub y: Offset,
    /// What is drawn at the origin.
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// The element drawn by a [`FieldPlacement`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// A text field.
    Text {
        /// Font size.
        font: Font,
        /// Content template.
        content: String,
    },
    /// A QR code (`^BQN,2,<magnification>`, error correction Q).
    QrCode {
        /// Module magnification.
        magnification: Scalar,
        /// Content template for the payload.
        content: String,
    },
    /// A horizontal rule drawn with `^GB`, for variants printed on blank stock.
    Rule {
        /// Rule length.
        width: Scalar,
        /// Line thickness.
        thickness: Scalar,
    },
}

/// Font size for scalable font `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Font {
    /// Character height.
    pub height: Scalar,
    /// Character width; the printer derives it from the height when absent.
    #[serde(default)]
    pub width: Option<Scalar>,
}

/// A size in dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scalar {
    /// Dots at any resolution.
    Fixed(u32),
    /// Dots at the geometry's base resolution, rescaled to the target.
    Baseline(u32),
}

/// A coordinate along one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Offset {
    /// Distance from an anchor: each term (centimetres, signed) is converted
    /// to dots separately, then `rows` times the geometry pitch is added.
    Cm {
        /// Anchor the terms are measured from.
        from: Edge,
        /// Signed centimetre terms.
        #[serde(default)]
        terms: Vec<f64>,
        /// Whole rows of pitch.
        #[serde(default)]
        rows: u32,
    },
    /// Dots at the geometry's base resolution.
    Baseline(u32),
}

impl Offset {
    /// Offset from the start edge.
    pub fn start(terms: &[f64]) -> Self {
        Offset::at(Edge::Start, terms)
    }

    /// Offset measured back from the end edge (terms are usually negative).
    pub fn end(terms: &[f64]) -> Self {
        Offset::at(Edge::End, terms)
    }

    /// Offset from `from`.
    pub fn at(from: Edge, terms: &[f64]) -> Self {
        Offset::Cm {
            from,
            terms: terms.to_vec(),
            rows: 0,
        }
    }

    /// Add `rows` rows of pitch to a centimetre offset.
    pub fn rows(self, rows: u32) -> Self {
        match self {
            Offset::Cm { from, terms, .. } => Offset::Cm { from, terms, rows },
            other => other,
        }
    }
}

/// Anchors for [`Offset::Cm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Left or top edge.
    Start,
    /// Right or bottom edge.
    End,
    /// Midpoint of the axis.
    Center,
    /// Top of the body band (vertical only).
    Body,
    /// Top of the footer's dynamic area (vertical only).
    Footer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// Resolves geometry-relative values to dots for one resolution.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resolver {
    dpi: u32,
    scaler: Scaler,
    width: u32,
    height: u32,
    body: u32,
    footer: u32,
    pitch: u32,
}

impl Resolver {
    pub(crate) fn new(geometry: &GeometrySpec, dpi: u32) -> Self {
        let (body, footer) = match geometry.bands {
            Some(b) => {
                let header = cm_to_dots(b.header_cm, dpi);
                (
                    header,
                    header + cm_to_dots(b.body_cm, dpi) + cm_to_dots(b.footer_gap_cm, dpi),
                )
            }
            None => (0, 0),
        };
        Self {
            dpi,
            scaler: Scaler::new(dpi, geometry.base_dpi),
            width: geometry.width.to_dots(dpi),
            height: geometry.height.to_dots(dpi),
            body,
            footer,
            pitch: cm_to_dots(geometry.pitch_cm, dpi),
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn x(&self, offset: &Offset) -> u32 {
        self.offset(offset, Axis::X)
    }

    pub(crate) fn y(&self, offset: &Offset) -> u32 {
        self.offset(offset, Axis::Y)
    }

    pub(crate) fn scalar(&self, value: Scalar) -> u32 {
        match value {
            Scalar::Fixed(v) => v,
            Scalar::Baseline(v) => self.scaler.apply(v),
        }
    }

    fn offset(&self, offset: &Offset, axis: Axis) -> u32 {
        match offset {
            Offset::Baseline(v) => self.scaler.apply(*v),
            Offset::Cm { from, terms, rows } => {
                let extent = match axis {
                    Axis::X => self.width,
                    Axis::Y => self.height,
                };
                let anchor = match from {
                    Edge::Start => 0,
                    Edge::End => extent,
                    Edge::Center => extent.div_ceil(2),
                    Edge::Body => self.body,
                    Edge::Footer => self.footer,
                };
                let mut dots = i64::from(anchor);
                for term in terms {
                    let magnitude = i64::from(cm_to_dots(term.abs(), self.dpi));
                    if *term < 0.0 {
                        dots -= magnitude;
                    } else {
                        dots += magnitude;
                    }
                }
                dots += i64::from(*rows) * i64::from(self.pitch);
                u32::try_from(dots.max(0)).unwrap_or(u32::MAX)
            }
        }
    }
}

impl GeometrySpec {
    /// Look up a built-in geometry by name.
    pub fn builtin(name: &str) -> Result<GeometrySpec, LabelError> {
        builtin::by_name(name).ok_or_else(|| LabelError::UnknownGeometry(name.to_string()))
    }

    /// The `standard` 8.5cm x 5.5cm geometry.
    pub fn standard() -> GeometrySpec {
        builtin::standard()
    }

    /// Names of the built-in geometries.
    pub fn builtin_names() -> &'static [&'static str] {
        BUILTIN_NAMES
    }

    /// Replace the character-set directive.
    pub fn with_text_encoding(mut self, encoding: Option<TextEncoding>) -> Self {
        self.text_encoding = encoding;
        self
    }

    /// Replace the print darkness, clamped to the printer maximum.
    pub fn with_darkness(mut self, darkness: u32) -> Self {
        self.darkness = darkness.min(MAX_DARKNESS);
        self
    }

    /// Label width in dots at `dpi` (`^PW`).
    pub fn width_dots(&self, dpi: u32) -> u32 {
        self.width.to_dots(dpi)
    }

    /// Label height in dots at `dpi` (`^LL`).
    pub fn height_dots(&self, dpi: u32) -> u32 {
        self.height.to_dots(dpi)
    }

    /// Record fields the table's text and QR templates reference, each once,
    /// in order of first appearance.
    pub fn record_fields(&self) -> Vec<RecordField> {
        let mut seen = HashSet::new();
        self.fields
            .iter()
            .filter_map(|f| match &f.kind {
                FieldKind::Text { content, .. } | FieldKind::QrCode { content, .. } => {
                    Some(template_fields(content))
                }
                FieldKind::Rule { .. } => None,
            })
            .flatten()
            .filter(|field| seen.insert(*field))
            .collect()
    }

    /// Check the table is internally consistent.
    pub fn validate(&self) -> Result<(), LabelError> {
        let invalid = |msg: String| LabelError::InvalidGeometry(format!("{}: {msg}", self.name));

        if self.name.trim().is_empty() {
            return Err(LabelError::InvalidGeometry("name must not be empty".into()));
        }
        let (w, h) = (self.width.to_cm(), self.height.to_cm());
        if !(w.is_finite() && w > 0.0 && h.is_finite() && h > 0.0) {
            return Err(invalid(format!("dimensions must be positive ({w} x {h} cm)")));
        }
        if self.base_dpi == 0 {
            return Err(invalid("base_dpi must be > 0".into()));
        }
        if self.darkness > MAX_DARKNESS {
            return Err(invalid(format!(
                "darkness {} exceeds {MAX_DARKNESS}",
                self.darkness
            )));
        }
        if !self.pitch_cm.is_finite() || self.pitch_cm < 0.0 {
            return Err(invalid("pitch_cm must be >= 0".into()));
        }
        if let Some(b) = self.bands {
            let parts = [b.header_cm, b.body_cm, b.footer_gap_cm];
            if parts.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(invalid("bands must be non-negative".into()));
            }
            if parts.iter().sum::<f64>() > h {
                return Err(invalid(format!("bands exceed label height ({h} cm)")));
            }
        }
        if self.fields.is_empty() {
            return Err(invalid("no fields".into()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.id.as_str()) {
                return Err(invalid(format!("duplicate field id '{}'", field.id)));
            }
            self.check_offset(&field.x, Axis::X)
                .and_then(|()| self.check_offset(&field.y, Axis::Y))
                .map_err(|msg| invalid(format!("field '{}': {msg}", field.id)))?;
            match &field.kind {
                FieldKind::Text { content, .. } => check_template(content),
                FieldKind::QrCode { content, .. } => {
                    if content.trim() == format!("{{{}}}", RecordField::Id) {
                        Ok(())
                    } else {
                        Err(format!(
                            "QR payload must be exactly {{id}}, found '{content}'"
                        ))
                    }
                }
                FieldKind::Rule { .. } => Ok(()),
            }
            .map_err(|msg| invalid(format!("field '{}': {msg}", field.id)))?;
        }
        Ok(())
    }

    fn check_offset(&self, offset: &Offset, axis: Axis) -> Result<(), String> {
        let Offset::Cm { from, terms, rows } = offset else {
            return Ok(());
        };
        if terms.iter().any(|t| !t.is_finite()) {
            return Err("offset terms must be finite".into());
        }
        if *rows > 0 && self.pitch_cm <= 0.0 {
            return Err("rows used without a pitch".into());
        }
        match from {
            Edge::Body | Edge::Footer if axis == Axis::X => {
                Err(format!("{from:?} anchor is vertical only"))
            }
            Edge::Body | Edge::Footer if self.bands.is_none() => {
                Err(format!("{from:?} anchor requires bands"))
            }
            _ => Ok(()),
        }
    }
}

/// Load and validate a geometry table from JSON.
pub fn load_geometry_from_str(s: &str) -> Result<GeometrySpec, LabelError> {
    let geometry: GeometrySpec = serde_json::from_str(s)?;
    geometry.validate()?;
    Ok(geometry)
}
