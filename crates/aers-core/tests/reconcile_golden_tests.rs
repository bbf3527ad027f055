//! End-to-end merge behavior over wire-format JSON patches, the way they
//! arrive from the generation collaborator.

use aers_core::models::{
    AdverseEventPatch, ConcomitantProduct, IdentityProfile, ReportPatch, ReporterInfoPatch,
};
use aers_core::{apply_section_edit, completion, merge, ReportData, SectionEdit};
use proptest::prelude::*;

fn patch_from_json(json: &str) -> ReportPatch {
    serde_json::from_str(json).unwrap()
}

#[test]
fn merge_null_leaves_never_clear_values() {
    let mut report = ReportData::new();
    report.adverse_event.description_narrative = Some("Rash".into());
    report.suspect_product.name = Some("lisinopril".into());

    // A generator reply commonly echoes untouched leaves as null
    let patch = patch_from_json(
        r#"{
            "adverse_event": {
                "description_narrative": null,
                "event_onset_date": "2026-08-01"
            },
            "suspect_product": { "name": null, "dose": "20 mg" }
        }"#,
    );

    let merged = merge(&report, &patch);
    assert_eq!(
        merged.adverse_event.description_narrative.as_deref(),
        Some("Rash")
    );
    assert_eq!(
        merged.adverse_event.event_onset_date.as_deref(),
        Some("2026-08-01")
    );
    assert_eq!(merged.suspect_product.name.as_deref(), Some("lisinopril"));
    assert_eq!(merged.suspect_product.dose.as_deref(), Some("20 mg"));
}

#[test]
fn merge_omitted_sections_survive_untouched() {
    let mut report = ReportData::new();
    report.patient_info.age = Some(45);
    report.concomitant_products = vec![ConcomitantProduct {
        name: "metformin".into(),
    }];
    report.product_available = Some(true);

    let patch = patch_from_json(r#"{"adverse_event": {"relevant_tests": "CBC normal"}}"#);

    let merged = merge(&report, &patch);
    assert_eq!(merged.patient_info.age, Some(45));
    assert_eq!(merged.concomitant_products.len(), 1);
    assert_eq!(merged.product_available, Some(true));
    assert_eq!(
        merged.adverse_event.relevant_tests.as_deref(),
        Some("CBC normal")
    );
}

#[test]
fn merge_result_is_always_full_shape() {
    let patch = patch_from_json(r#"{"patient_info": {"age": 30}}"#);
    let merged = merge(&ReportData::new(), &patch);

    let json = serde_json::to_value(&merged).unwrap();
    for key in [
        "patient_info",
        "adverse_event",
        "suspect_product",
        "concomitant_products",
        "reporter_info",
        "product_available",
    ] {
        assert!(json.get(key).is_some(), "missing section key: {}", key);
    }
    assert!(json["reporter_info"].get("email").is_some());
}

#[test]
fn identity_fields_dominant_through_repeated_merges() {
    let profile = IdentityProfile::named("Jane", "Doe", "jane@example.com");
    let mut report = ReportData::with_reporter(&profile);

    for attempt in ["bogus@example.com", "other@example.com"] {
        let patch = ReportPatch {
            reporter_info: Some(ReporterInfoPatch {
                first_name: Some("Janet".into()),
                email: Some(attempt.into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        report = merge(&report, &patch);
    }

    assert_eq!(report.reporter_info.first_name.as_deref(), Some("Jane"));
    assert_eq!(
        report.reporter_info.email.as_deref(),
        Some("jane@example.com")
    );
}

#[test]
fn section_edit_then_merge_keeps_the_edit() {
    let mut report = ReportData::new();
    report.adverse_event.description_narrative = Some("Rash".into());

    let mut edited = report.adverse_event.clone();
    edited.description_narrative = Some("Severe rash on both arms".into());
    report = apply_section_edit(&report, SectionEdit::AdverseEvent(edited));

    // A later patch that does not touch the narrative must not undo the edit
    let patch = ReportPatch {
        adverse_event: Some(AdverseEventPatch {
            event_onset_date: Some("2026-08-01".into()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let merged = merge(&report, &patch);
    assert_eq!(
        merged.adverse_event.description_narrative.as_deref(),
        Some("Severe rash on both arms")
    );
}

#[test]
fn completion_is_monotonic_under_additive_patches() {
    let mut report = ReportData::new();
    let steps = [
        r#"{"adverse_event": {"description_narrative": "Nausea"}}"#,
        r#"{"patient_info": {"age": 52, "sex": "Female"}}"#,
        r#"{"suspect_product": {"name": "atorvastatin", "dose": "40 mg"}}"#,
        r#"{"product_available": true}"#,
    ];

    let mut last = completion(&report);
    assert_eq!(last, 0);
    for step in steps {
        report = merge(&report, &patch_from_json(step));
        let now = completion(&report);
        assert!(now >= last, "completion regressed: {} -> {}", last, now);
        last = now;
    }
    assert!(last > 0);
}

proptest! {
    #[test]
    fn split_join_roundtrip(items in prop::collection::vec("[a-zA-Z][a-zA-Z ]{0,10}[a-zA-Z]", 0..8)) {
        let joined = aers_core::reconcile::join_delimited(&items);
        let split = aers_core::reconcile::split_delimited(&joined);
        prop_assert_eq!(split, items);
    }

    #[test]
    fn merge_never_lowers_completion(narrative in "[a-z]{1,20}", dose in "[0-9]{1,3} mg") {
        let mut report = ReportData::new();
        report.adverse_event.description_narrative = Some(narrative);
        let before = completion(&report);

        let patch = ReportPatch {
            suspect_product: Some(aers_core::models::SuspectProductPatch {
                dose: Some(dose),
                ..Default::default()
            }),
            ..Default::default()
        };
        let after = completion(&merge(&report, &patch));
        prop_assert!(after >= before);
    }
}
