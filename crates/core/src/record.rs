//! Label source records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LabelError;

/// One printable coupon label, as supplied by the product/batch service.
///
/// Records are read-only inputs: the encoder never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRecord {
    /// Unique coupon number; encoded in both QR codes and as text.
    pub id: String,
    /// Product name.
    pub product: String,
    /// Manufacturer part number.
    pub part_no: String,
    /// Product grade (e.g. `15W-40`).
    pub grade: String,
    /// Pack size (e.g. `1L`).
    pub size: String,
    /// Net quantity text (e.g. `1 pcs`).
    pub net_qty: String,
    /// Packing date.
    pub pkd: String,
    /// Maximum retail price.
    pub mrp: String,
    /// Coupon amount payable to the holder.
    pub amount: String,
    /// Large glyph printed in the top-right corner.
    #[serde(default)]
    pub letter: Option<String>,
}

impl LabelRecord {
    /// Check the record can be encoded. `position` is its 1-based index in
    /// the batch and is reported back on failure.
    pub fn validate(&self, position: usize) -> Result<(), LabelError> {
        if self.id.trim().is_empty() {
            return Err(LabelError::MissingUniqueId { position });
        }
        Ok(())
    }

    /// Value of `field` for template substitution.
    pub fn field(&self, field: RecordField) -> &str {
        match field {
            RecordField::Id => &self.id,
            RecordField::Product => &self.product,
            RecordField::PartNo => &self.part_no,
            RecordField::Grade => &self.grade,
            RecordField::Size => &self.size,
            RecordField::NetQty => &self.net_qty,
            RecordField::Pkd => &self.pkd,
            RecordField::Mrp => &self.mrp,
            RecordField::Amount => &self.amount,
            RecordField::Letter => self.letter.as_deref().unwrap_or(""),
        }
    }
}

/// Validate every record in order, failing on the first bad one.
pub fn validate_records(records: &[LabelRecord]) -> Result<(), LabelError> {
    if records.is_empty() {
        return Err(LabelError::EmptyBatch);
    }
    records
        .iter()
        .enumerate()
        .try_for_each(|(i, r)| r.validate(i + 1))
}

/// Record fields addressable from geometry content templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    /// `{id}`
    Id,
    /// `{product}`
    Product,
    /// `{part_no}`
    PartNo,
    /// `{grade}`
    Grade,
    /// `{size}`
    Size,
    /// `{net_qty}`
    NetQty,
    /// `{pkd}`
    Pkd,
    /// `{mrp}`
    Mrp,
    /// `{amount}`
    Amount,
    /// `{letter}`
    Letter,
}

impl RecordField {
    /// Every field, in declaration order.
    pub const ALL: [RecordField; 10] = [
        RecordField::Id,
        RecordField::Product,
        RecordField::PartNo,
        RecordField::Grade,
        RecordField::Size,
        RecordField::NetQty,
        RecordField::Pkd,
        RecordField::Mrp,
        RecordField::Amount,
        RecordField::Letter,
    ];

    /// Placeholder name used inside `{...}`.
    pub fn placeholder(self) -> &'static str {
        match self {
            RecordField::Id => "id",
            RecordField::Product => "product",
            RecordField::PartNo => "part_no",
            RecordField::Grade => "grade",
            RecordField::Size => "size",
            RecordField::NetQty => "net_qty",
            RecordField::Pkd => "pkd",
            RecordField::Mrp => "mrp",
            RecordField::Amount => "amount",
            RecordField::Letter => "letter",
        }
    }
}

impl FromStr for RecordField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordField::ALL
            .into_iter()
            .find(|f| f.placeholder() == s)
            .ok_or_else(|| format!("unknown placeholder '{{{s}}}'"))
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.placeholder())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn blank_id_rejected_with_position() {
        assert!(record("QA0001").validate(1).is_ok());
        match record("   ").validate(3) {
            Err(LabelError::MissingUniqueId { position }) => assert_eq!(position, 3),
            other => panic!("expected MissingUniqueId, got {other:?}"),
        }
    }

    #[test]
    fn validate_records_reports_first_bad_record() {
        assert!(matches!(
            validate_records(&[]),
            Err(LabelError::EmptyBatch)
        ));
        let batch = vec![record("A"), record(""), record("")];
        assert!(matches!(
            validate_records(&batch),
            Err(LabelError::MissingUniqueId { position: 2 })
        ));
    }

    #[test]
    fn deserializes_upstream_camel_case() {
        let json = r#"{
            "id": "QA0001", "product": "Castrol GTX", "partNo": "GTX-1L",
            "grade": "15W-40", "size": "1L", "netQty": "1 pcs",
            "pkd": "2024-01-01", "mrp": "450", "amount": "100"
        }"#;
        let r: LabelRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r, record("QA0001"));
        assert_eq!(r.field(RecordField::Letter), "");
    }

    #[test]
    fn placeholders_parse_back() {
        for f in RecordField::ALL {
            assert_eq!(f.placeholder().parse::<RecordField>(), Ok(f));
        }
        assert!("price".parse::<RecordField>().is_err());
    }
}
