//! Batch assembly: ordered records in, sequenced gateway request out.

use serde::{Deserialize, Serialize};

use crate::error::LabelError;
use crate::frame;
use crate::geometry::GeometrySpec;
use crate::record::{LabelRecord, validate_records};
use crate::template::encode;

/// Printer family a batch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterType {
    /// ZPL thermal printers.
    #[default]
    Zpl,
}

/// One label in a batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// 1-based position in the batch.
    pub sequence: u32,
    /// Unique coupon number.
    #[serde(rename = "unique_num")]
    pub unique_id: String,
    /// ZPL frame for the label.
    #[serde(rename = "zpl_code")]
    pub frame: String,
}

/// Request body for the gateway's batch print endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPrintRequest {
    /// Batch identifier.
    pub batch_id: u64,
    /// Target printer family.
    pub printer_type: PrinterType,
    /// Labels in print order.
    pub labels: Vec<BatchEntry>,
}

impl BatchPrintRequest {
    /// Number of labels in the request.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if the request carries no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Validate, encode and sequence `records`.
///
/// Either every record produces a structurally valid frame, or no request is
/// returned.
pub fn assemble(
    batch_id: u64,
    records: &[LabelRecord],
    geometry: &GeometrySpec,
    dpi: u32,
) -> Result<BatchPrintRequest, LabelError> {
    validate_records(records)?;

    let labels = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let sequence = u32::try_from(i + 1).map_err(|_| LabelError::BatchTooLarge {
                count: records.len(),
                max: u32::MAX as usize,
            })?;
            let zpl = encode(record, geometry, dpi).into_string();
            if !frame::validate(&zpl) {
                return Err(LabelError::InvalidFrame {
                    sequence,
                    unique_id: record.id.clone(),
                });
            }
            Ok(BatchEntry {
                sequence,
                unique_id: record.id.clone(),
                frame: zpl,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BatchPrintRequest {
        batch_id,
        printer_type: PrinterType::Zpl,
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::STANDARD;

    fn record(id: &str) -> LabelRecord {
        LabelRecord {
            id: id.into(),
            product: "Castrol GTX".into(),
            part_no: "GTX-1L".into(),
            grade: "15W-40".into(),
            size: "1L".into(),
            net_qty: "1 pcs".into(),
            pkd: "2024-01-01".into(),
            mrp: "450".into(),
            amount: "100".into(),
            letter: None,
        }
    }

    #[test]
    fn sequences_are_contiguous_from_one() {
        let records: Vec<_> = (1..=4).map(|i| record(&format!("QA000{i}"))).collect();
        let g = GeometrySpec::builtin(STANDARD).unwrap();
        let req = assemble(7, &records, &g, 203).unwrap();
        assert_eq!(req.batch_id, 7);
        assert_eq!(req.len(), 4);
        for (i, entry) in req.labels.iter().enumerate() {
            assert_eq!(entry.sequence as usize, i + 1);
            assert_eq!(entry.unique_id, records[i].id);
            assert!(frame::validate(&entry.frame));
        }
    }

    #[test]
    fn empty_batch_rejected() {
        let g = GeometrySpec::builtin(STANDARD).unwrap();
        assert!(matches!(
            assemble(1, &[], &g, 203),
            Err(LabelError::EmptyBatch)
        ));
    }

    #[test]
    fn missing_id_reports_position() {
        let g = GeometrySpec::builtin(STANDARD).unwrap();
        let records = vec![record("QA0001"), record("  ")];
        assert!(matches!(
            assemble(1, &records, &g, 203),
            Err(LabelError::MissingUniqueId { position: 2 })
        ));
    }

    #[test]
    fn wire_format_field_names() {
        let g = GeometrySpec::builtin(STANDARD).unwrap();
        let req = assemble(42, &[record("QA0001")], &g, 203).unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["batch_id"], 42);
        assert_eq!(json["printer_type"], "zpl");
        assert_eq!(json["labels"][0]["sequence"], 1);
        assert_eq!(json["labels"][0]["unique_num"], "QA0001");
        assert!(json["labels"][0]["zpl_code"].as_str().unwrap().starts_with("^XA"));
    }
}
