//! Gateway response types and outcome classification.

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Status string of a batch the gateway finished processing.
pub const STATUS_COMPLETED: &str = "completed";

/// Per-label status string for a printed label.
pub const LABEL_PRINTED: &str = "printed";

/// Response body of the batch print endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// `completed` when the gateway processed the batch.
    pub status: String,
    /// Human-readable summary.
    #[serde(default)]
    pub message: Option<String>,
    /// Counts and per-label outcomes.
    #[serde(default)]
    pub result: Option<PrintJobResult>,
}

/// Outcome of one batch as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintJobResult {
    /// Batch identifier echoed back.
    pub batch_id: u64,
    /// Labels in the batch.
    pub total_labels: u32,
    /// Labels the printer accepted.
    pub successful_prints: u32,
    /// Labels that failed.
    pub failed_prints: u32,
    /// `true` when the gateway ran without a physical printer.
    #[serde(default)]
    pub simulated: bool,
    /// Per-label outcomes, in sequence order.
    #[serde(default)]
    pub details: Vec<LabelOutcome>,
}

/// Outcome of a single label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelOutcome {
    /// Sequence number from the request.
    pub sequence: u32,
    /// Unique coupon number from the request.
    pub unique_num: String,
    /// `printed` or `failed`.
    pub status: String,
}

impl LabelOutcome {
    /// Returns `true` if the label was printed.
    pub fn is_printed(&self) -> bool {
        self.status == LABEL_PRINTED
    }
}

/// Classification of a consistent [`PrintJobResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Every label printed.
    AllPrinted,
    /// Some, but not all, labels printed.
    Partial,
    /// No label printed.
    NonePrinted,
}

impl PrintJobResult {
    /// Check that the counts add up.
    pub fn check_consistency(&self) -> Result<(), DispatchError> {
        let sum = u64::from(self.successful_prints) + u64::from(self.failed_prints);
        if sum != u64::from(self.total_labels) {
            return Err(DispatchError::InconsistentResult(format!(
                "{} successful + {} failed != {} total",
                self.successful_prints, self.failed_prints, self.total_labels
            )));
        }
        Ok(())
    }

    /// Classify the result.
    ///
    /// A result with zero successful prints is [`JobOutcome::NonePrinted`],
    /// including an empty one.
    pub fn outcome(&self) -> JobOutcome {
        if self.successful_prints == 0 {
            JobOutcome::NonePrinted
        } else if self.successful_prints >= self.total_labels {
            JobOutcome::AllPrinted
        } else {
            JobOutcome::Partial
        }
    }

    /// Unique numbers of the labels reported as not printed.
    pub fn failed_labels(&self) -> impl Iterator<Item = &str> {
        self.details
            .iter()
            .filter(|d| !d.is_printed())
            .map(|d| d.unique_num.as_str())
    }
}

impl GatewayResponse {
    /// Extract a consistent job result, rejecting gateway-reported failures.
    pub fn into_result(self) -> Result<PrintJobResult, DispatchError> {
        if self.status != STATUS_COMPLETED {
            return Err(DispatchError::Gateway {
                status: self.status,
                message: self.message.unwrap_or_default(),
            });
        }
        let result = self.result.ok_or_else(|| {
            DispatchError::InconsistentResult("completed response without a result".into())
        })?;
        result.check_consistency()?;
        Ok(result)
    }
}
