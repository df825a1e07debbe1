//! Shared test helpers for `zpl_labels_core` integration tests.

#![allow(unreachable_pub)]

use zpl_labels_core::LabelRecord;

/// Resolutions every geometry is exercised at.
#[allow(dead_code)]
pub const DPIS: [u32; 5] = [152, 203, 300, 600, 1];

/// The reference coupon record.
pub fn qa0001() -> LabelRecord {
    LabelRecord {
        id: "QA0001".into(),
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

/// `n` records with ids `QA0001..`.
#[allow(dead_code)]
pub fn records(n: usize) -> Vec<LabelRecord> {
    (1..=n)
        .map(|i| LabelRecord {
            id: format!("QA{i:04}"),
            ..qa0001()
        })
        .collect()
}
