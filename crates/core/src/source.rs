//! Adapter for the upstream product/batch service.
//!
//! The batch service returns one product and the list of coupon codes minted
//! for it; every code becomes one [`LabelRecord`].

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::record::LabelRecord;

/// Batch payload as served by the product/batch service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSource {
    /// Batch identifier; becomes the print request's `batch_id`.
    pub batch_id: u64,
    /// Product every coupon in the batch belongs to.
    pub product: ProductDetails,
    /// Coupon codes, in print order.
    pub qr_codes: Vec<CouponCode>,
    /// Quantity the batch was created with.
    #[serde(default)]
    pub total_quantity: Option<u64>,
    /// Generation timestamp as reported upstream.
    #[serde(default)]
    pub generated_at: Option<String>,
}

/// Product master data carried by a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    /// Display name.
    pub product_name: String,
    /// Part number.
    pub part_no: String,
    /// Grade.
    pub grade: String,
    /// Pieces per inner pack.
    pub net_qty_inner: Number,
    /// Pack size; absent for some products.
    #[serde(default)]
    pub size1: Option<String>,
    /// Packing date.
    pub pkd_date: String,
    /// Inner-pack MRP.
    pub mrp_inner: Number,
    /// Coupon value payable to the mechanic, when the product has one.
    #[serde(default)]
    pub mechanic_coupon_inner: Option<Number>,
}

/// A minted coupon code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponCode {
    /// Unique coupon number.
    pub unique_num: String,
    /// Database id of the coupon.
    #[serde(default)]
    pub coupon_id: Option<u64>,
    /// Coupon lifecycle status upstream.
    #[serde(default)]
    pub status: Option<String>,
}

impl BatchSource {
    /// Build one label record per coupon code, preserving order.
    pub fn to_records(&self) -> Vec<LabelRecord> {
        let p = &self.product;
        let size = match p.size1.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => "N/A".to_string(),
        };
        let mrp = format_number(&p.mrp_inner);
        let amount = p
            .mechanic_coupon_inner
            .as_ref()
            .map(format_number)
            .unwrap_or_else(|| mrp.clone());
        let letter = p
            .product_name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect::<String>());

        self.qr_codes
            .iter()
            .map(|code| LabelRecord {
                id: code.unique_num.clone(),
                product: p.product_name.clone(),
                part_no: p.part_no.clone(),
                grade: p.grade.clone(),
                size: size.clone(),
                net_qty: format!("{} pcs", format_number(&p.net_qty_inner)),
                pkd: p.pkd_date.clone(),
                mrp: mrp.clone(),
                amount: amount.clone(),
                letter: letter.clone(),
            })
            .collect()
    }
}

/// Render a JSON number the way it is printed on the label: integral values
/// without a fractional part.
fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"{
        "batch_id": 42,
        "product": {
            "product_name": "castrol GTX",
            "part_no": "GTX-1L",
            "grade": "15W-40",
            "net_qty_inner": 1,
            "size1": null,
            "pkd_date": "2024-01-01",
            "mrp_inner": 450.0,
            "mechanic_coupon_inner": 100
        },
        "qr_codes": [
            { "coupon_id": 1, "unique_num": "QA0001", "qr_code_base64": "...", "status": "new" },
            { "coupon_id": 2, "unique_num": "QA0002", "qr_code_base64": "...", "status": "new" }
        ],
        "total_quantity": 2,
        "generated_at": "2024-01-01T10:00:00"
    }"#;

    #[test]
    fn maps_every_code_in_order() {
        let src: BatchSource = serde_json::from_str(SOURCE).unwrap();
        let records = src.to_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "QA0001");
        assert_eq!(records[1].id, "QA0002");

        let r = &records[0];
        assert_eq!(r.product, "castrol GTX");
        assert_eq!(r.size, "N/A");
        assert_eq!(r.net_qty, "1 pcs");
        assert_eq!(r.mrp, "450");
        assert_eq!(r.amount, "100");
        assert_eq!(r.letter.as_deref(), Some("C"));
    }

    #[test]
    fn amount_falls_back_to_mrp() {
        let mut src: BatchSource = serde_json::from_str(SOURCE).unwrap();
        src.product.mechanic_coupon_inner = None;
        src.product.size1 = Some("5L".into());
        let r = &src.to_records()[0];
        assert_eq!(r.amount, "450");
        assert_eq!(r.size, "5L");
    }

    #[test]
    fn fractional_prices_keep_decimals() {
        let n: Number = serde_json::from_str("449.5").unwrap();
        assert_eq!(format_number(&n), "449.5");
    }
}
