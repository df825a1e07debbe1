//! Typed errors for label encoding and batch assembly.

/// Errors raised before or while turning label records into a batch.
///
/// Validation variants ([`EmptyBatch`](LabelError::EmptyBatch),
/// [`MissingUniqueId`](LabelError::MissingUniqueId),
/// [`BatchTooLarge`](LabelError::BatchTooLarge)) are raised before any frame
/// is generated. [`InvalidFrame`](LabelError::InvalidFrame) is raised when a
/// generated frame fails the structural check.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    /// The batch contains no labels.
    #[error("batch contains no labels")]
    EmptyBatch,

    /// A record has an empty or missing unique identifier.
    #[error("label #{position} has no unique identifier")]
    MissingUniqueId {
        /// 1-based position of the record in the batch.
        position: usize,
    },

    /// The batch exceeds the configured size ceiling.
    #[error("batch of {count} labels exceeds the limit of {max}")]
    BatchTooLarge {
        /// Number of labels submitted.
        count: usize,
        /// Configured ceiling.
        max: usize,
    },

    /// A generated frame is not delimited by `^XA` / `^XZ`.
    #[error("generated frame for label #{sequence} ({unique_id}) is malformed")]
    InvalidFrame {
        /// Sequence number of the offending label.
        sequence: u32,
        /// Unique identifier of the offending label.
        unique_id: String,
    },

    /// A geometry table is inconsistent.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A geometry name is not one of the built-in variants.
    #[error("unknown geometry '{0}'")]
    UnknownGeometry(String),

    /// JSON input could not be deserialized.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl LabelError {
    /// Returns `true` for errors caused by the submitted records rather than
    /// by the encoder or its configuration.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LabelError::EmptyBatch
                | LabelError::MissingUniqueId { .. }
                | LabelError::BatchTooLarge { .. }
        )
    }
}
