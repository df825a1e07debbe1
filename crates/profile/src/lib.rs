//! Printer profile definitions and validation for ZPL coupon labels.
//!
//! A profile pins down the physical printer a batch is encoded for: its
//! resolution, the darkness it should print at, and the printhead limits a
//! label geometry has to fit inside.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest printer resolution accepted for encoding.
pub const MIN_DPI: u32 = 100;
/// Highest printer resolution accepted for encoding.
pub const MAX_DPI: u32 = 600;
pub use zpl_labels_core::geometry::MAX_DARKNESS;

/// Errors that can occur when loading or applying a printer profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// JSON deserialization failed.
    #[error("invalid profile JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A required field value is out of its valid range.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The name of the field that failed validation.
        field: String,
        /// A human-readable explanation of why the field value is invalid.
        reason: String,
    },

    /// A label does not fit the printhead or maximum label length.
    #[error(
        "label {width_dots}x{height_dots} dots does not fit printer '{profile}' ({limit})"
    )]
    LabelTooLarge {
        /// Profile id the label was checked against.
        profile: String,
        /// Label width in dots.
        width_dots: u32,
        /// Label height in dots.
        height_dots: u32,
        /// Which limit was exceeded.
        limit: String,
    },
}

/// A printer profile for a ZPL label printer (or class of printers).
///
/// # Example
/// ```
/// let profile = zpl_labels_profile::Profile {
///     id: "zd220-203".into(),
///     schema_version: "1.0.0".into(),
///     dpi: 203,
///     darkness: Some(15),
///     page: Some(zpl_labels_profile::Page {
///         width_dots: Some(832),
///         height_dots: None,
///     }),
///     default_geometry: Some("standard".into()),
/// };
/// assert!(profile.check_fit(679, 439).is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// Unique profile identifier (e.g., `"zd220-203"`).
    pub id: String,
    /// Profile schema version for forward compatibility (e.g., `"1.0.0"`).
    pub schema_version: String,
    /// Print resolution in dots per inch (typically 203, 300, or 600).
    pub dpi: u32,
    /// Darkness to emit with `~SD`; overrides the geometry's own value.
    #[serde(default)]
    pub darkness: Option<u32>,
    /// Printhead width and maximum label length.
    #[serde(default)]
    pub page: Option<Page>,
    /// Geometry used when the caller does not name one.
    #[serde(default)]
    pub default_geometry: Option<String>,
}

/// Printhead limits for a printer profile.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Page {
    /// Printhead width in dots.
    pub width_dots: Option<u32>,
    /// Maximum label length in dots.
    pub height_dots: Option<u32>,
}

impl Profile {
    /// A bare profile for `dpi` with no limits or overrides.
    pub fn for_dpi(dpi: u32) -> Self {
        Self {
            id: format!("generic-{dpi}"),
            schema_version: "1.0.0".into(),
            dpi,
            darkness: None,
            page: None,
            default_geometry: None,
        }
    }

    /// Check that a label of the given dot dimensions fits this printer.
    pub fn check_fit(&self, width_dots: u32, height_dots: u32) -> Result<(), ProfileError> {
        let Some(page) = &self.page else {
            return Ok(());
        };
        let too_large = |limit: String| ProfileError::LabelTooLarge {
            profile: self.id.clone(),
            width_dots,
            height_dots,
            limit,
        };
        if let Some(max) = page.width_dots
            && width_dots > max
        {
            return Err(too_large(format!("printhead width {max} dots")));
        }
        if let Some(max) = page.height_dots
            && height_dots > max
        {
            return Err(too_large(format!("maximum length {max} dots")));
        }
        Ok(())
    }

    /// Check field ranges: non-blank `id`, `schema_version` and
    /// `default_geometry`, `dpi` within [`MIN_DPI`]..=[`MAX_DPI`], `darkness`
    /// at most [`MAX_DARKNESS`], and non-zero page limits.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let blank = [
            ("id", Some(self.id.as_str())),
            ("schema_version", Some(self.schema_version.as_str())),
            ("default_geometry", self.default_geometry.as_deref()),
        ];
        for (field, value) in blank {
            if value.is_some_and(|v| v.trim().is_empty()) {
                return Err(invalid(field, "must not be empty".into()));
            }
        }

        if self.dpi < MIN_DPI {
            return Err(invalid(
                "dpi",
                format!("{} is below minimum supported DPI ({MIN_DPI})", self.dpi),
            ));
        }
        if self.dpi > MAX_DPI {
            return Err(invalid(
                "dpi",
                format!("{} exceeds maximum supported DPI ({MAX_DPI})", self.dpi),
            ));
        }
        if let Some(d) = self.darkness.filter(|&d| d > MAX_DARKNESS) {
            return Err(invalid(
                "darkness",
                format!("{d} exceeds maximum darkness ({MAX_DARKNESS})"),
            ));
        }

        let page = self.page.clone().unwrap_or_default();
        for (field, value) in [
            ("page.width_dots", page.width_dots),
            ("page.height_dots", page.height_dots),
        ] {
            if value == Some(0) {
                return Err(invalid(field, "must be > 0".into()));
            }
        }
        Ok(())
    }
}

/// Load a [`Profile`] from JSON and [`validate`](Profile::validate) it.
pub fn load_profile_from_str(s: &str) -> Result<Profile, ProfileError> {
    let profile: Profile = serde_json::from_str(s)?;
    profile.validate()?;
    Ok(profile)
}

fn invalid(field: &str, reason: String) -> ProfileError {
    ProfileError::InvalidField {
        field: field.to_string(),
        reason,
    }
}
