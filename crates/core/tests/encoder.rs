//! End-to-end encoder tests across every built-in geometry.

mod common;

use common::{DPIS, qa0001, records};
use zpl_labels_core::frame::{self, FRAME_END, FRAME_START};
use zpl_labels_core::geometry::{COMPACT_2X1_5, LEGACY_4X2, STANDARD};
use zpl_labels_core::{
    GeometrySpec, LabelError, LabelRecord, TextEncoding, assemble, batch_document, encode,
};

fn builtins() -> Vec<GeometrySpec> {
    GeometrySpec::builtin_names()
        .iter()
        .map(|n| GeometrySpec::builtin(n).unwrap())
        .collect()
}

// ─── Frame structure ─────────────────────────────────────────────────────────

#[test]
fn qa0001_standard_frame() {
    let g = GeometrySpec::builtin(STANDARD).unwrap();
    let frame = encode(&qa0001(), &g, 203);
    let s = frame.as_str();
    assert!(s.starts_with(FRAME_START));
    assert!(s.ends_with(FRAME_END));
    // two QR payloads and the human-readable id
    assert_eq!(s.matches("QA0001").count(), 3, "{s}");
}

#[test]
fn every_geometry_validates_at_every_dpi() {
    let mut odd = qa0001();
    odd.product = "Mobil ^Super~ 3000_X".into();
    odd.letter = Some("M".into());
    for g in builtins() {
        for dpi in DPIS {
            for record in [qa0001(), odd.clone()] {
                let f = encode(&record, &g, dpi);
                assert!(frame::validate(f.as_str()), "{} @ {dpi}", g.name);
                assert_eq!(f.as_str().matches(FRAME_END).count(), 1);
            }
        }
    }
}

#[test]
fn unique_id_appears_in_every_representation() {
    for g in builtins() {
        let s = encode(&qa0001(), &g, 203).into_string();
        assert_eq!(s.matches("^FDQA,QA0001^FS").count(), 2, "{}", g.name);
        assert_eq!(s.matches("^FDQA0001^FS").count(), 1, "{}", g.name);
    }
}

#[test]
fn encoding_is_deterministic() {
    for g in builtins() {
        let a = encode(&qa0001(), &g, 300);
        let b = encode(&qa0001(), &g.clone(), 300);
        assert_eq!(a, b);
    }
}

#[test]
fn text_encoding_directive_follows_geometry() {
    let standard = GeometrySpec::builtin(STANDARD).unwrap();
    assert!(encode(&qa0001(), &standard, 203).as_str().contains("^CI28"));
    let without = standard.with_text_encoding(None);
    assert!(!encode(&qa0001(), &without, 203).as_str().contains("^CI28"));

    let legacy = GeometrySpec::builtin(LEGACY_4X2).unwrap();
    assert!(!encode(&qa0001(), &legacy, 203).as_str().contains("^CI28"));
    let with = legacy.with_text_encoding(Some(TextEncoding::Utf8));
    assert!(encode(&qa0001(), &with, 203).as_str().starts_with("^XA\n^CI28\n"));
}

#[test]
fn page_size_tracks_resolution() {
    let g = GeometrySpec::builtin(COMPACT_2X1_5).unwrap();
    assert!(encode(&qa0001(), &g, 203).as_str().contains("^PW406\n^LL305"));
    assert!(encode(&qa0001(), &g, 600).as_str().contains("^PW1200\n^LL900"));
}

#[test]
fn darkness_override() {
    let g = GeometrySpec::builtin(STANDARD).unwrap().with_darkness(22);
    assert!(encode(&qa0001(), &g, 203).as_str().contains("\n~SD22\n"));
}

// ─── Batch assembly ──────────────────────────────────────────────────────────

#[test]
fn assemble_preserves_order_and_ids() {
    let input = records(25);
    let g = GeometrySpec::builtin(STANDARD).unwrap();
    let req = assemble(99, &input, &g, 203).unwrap();
    assert_eq!(req.labels.len(), input.len());
    let sequences: Vec<u32> = req.labels.iter().map(|l| l.sequence).collect();
    assert_eq!(sequences, (1..=25).collect::<Vec<_>>());
    for (entry, record) in req.labels.iter().zip(&input) {
        assert_eq!(entry.unique_id, record.id);
        assert_eq!(entry.frame, encode(record, &g, 203).into_string());
    }
}

#[test]
fn assemble_rejects_before_encoding() {
    let g = GeometrySpec::builtin(STANDARD).unwrap();
    let mut input = records(3);
    input[2].id.clear();
    let err = assemble(1, &input, &g, 203).unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(err, LabelError::MissingUniqueId { position: 3 }));
    assert!(matches!(
        assemble(1, &[], &g, 203),
        Err(LabelError::EmptyBatch)
    ));
}

#[test]
fn records_deserialize_from_camel_case() {
    let json = r#"[{"id":"QA0001","product":"Castrol GTX","partNo":"GTX-1L",
        "grade":"15W-40","size":"1L","netQty":"1 pcs","pkd":"2024-01-01",
        "mrp":"450","amount":"100"}]"#;
    let parsed: Vec<LabelRecord> = serde_json::from_str(json).unwrap();
    assert_eq!(parsed, vec![qa0001()]);
}

#[test]
fn batch_document_matches_individual_frames() {
    let input = records(3);
    let g = GeometrySpec::builtin(LEGACY_4X2).unwrap();
    let doc = batch_document(&input, &g, 203);
    let expected: Vec<String> = input
        .iter()
        .map(|r| encode(r, &g, 203).into_string())
        .collect();
    assert_eq!(doc, expected.join("\n\n"));
}
