//! Physical-length to printer-dot conversion.
//!
//! Label stock is specified in centimetres (or inches); printer firmware
//! addresses everything in dots. Every coordinate a template emits passes
//! through this module, so one template set serves any resolution.

/// Centimetres per inch.
pub const CM_PER_INCH: f64 = 2.54;

/// Resolution the legacy baseline-dot templates were authored at.
pub const LEGACY_BASE_DPI: u32 = 203;

/// Convert a physical length in centimetres to printer dots.
///
/// `round(length_cm / 2.54 * dpi)`. Negative and non-finite lengths clamp to
/// zero so the function stays total and monotonic in both arguments.
pub fn cm_to_dots(length_cm: f64, dpi: u32) -> u32 {
    if !length_cm.is_finite() || length_cm <= 0.0 {
        return 0;
    }
    let dots = (length_cm / CM_PER_INCH * f64::from(dpi)).round();
    if dots >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        dots as u32
    }
}

/// Convert a physical length in inches to printer dots: `round(inches * dpi)`.
///
/// Clamps like [`cm_to_dots`].
pub fn inches_to_dots(inches: f64, dpi: u32) -> u32 {
    if !inches.is_finite() || inches <= 0.0 {
        return 0;
    }
    let dots = (inches * f64::from(dpi)).round();
    if dots >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        dots as u32
    }
}

/// Return a function rescaling dots authored at `base_dpi` to `dpi`.
///
/// ```
/// let s = zpl_labels_core::units::scale(300, 203);
/// assert_eq!(s(203), 300);
/// assert_eq!(s(0), 0);
/// ```
pub fn scale(dpi: u32, base_dpi: u32) -> impl Fn(u32) -> u32 {
    let scaler = Scaler::new(dpi, base_dpi);
    move |v| scaler.apply(v)
}

/// Rescales baseline dots to a target resolution.
///
/// Same computation as [`scale`], as a value that can be stored in structs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scaler {
    dpi: u32,
    base_dpi: u32,
}

impl Scaler {
    /// Scaler from `base_dpi` to `dpi`. A zero base is treated as the target
    /// resolution (identity).
    pub fn new(dpi: u32, base_dpi: u32) -> Self {
        let base_dpi = if base_dpi == 0 { dpi.max(1) } else { base_dpi };
        Self { dpi, base_dpi }
    }

    /// `round(v * dpi / base_dpi)`, rounding half away from zero.
    pub fn apply(&self, v: u32) -> u32 {
        let num = u64::from(v) * u64::from(self.dpi);
        let base = u64::from(self.base_dpi);
        let scaled = (2 * num + base) / (2 * base);
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }
}

/// Convert inches to centimetres.
pub fn inches_to_cm(inches: f64) -> f64 {
    inches * CM_PER_INCH
}

/// Convert centimetres to inches.
pub fn cm_to_inches(cm: f64) -> f64 {
    cm / CM_PER_INCH
}

/// Printer resolution in dots per millimetre (6, 8, 12 or 24 for the usual
/// 152/203/300/600 dpi heads).
pub fn dots_per_mm(dpi: u32) -> u32 {
    (f64::from(dpi) / (CM_PER_INCH * 10.0)).round() as u32
}
