//! Report reconciliation engine.
//!
//! Two independent writers mutate one record: the generation collaborator
//! (through sparse [`ReportPatch`] values) and the human (through wholesale
//! section edits in the form). [`merge`] reconciles the first kind,
//! [`apply_section_edit`] the second. Both are pure functions: no I/O, no
//! logging, no mutation of their inputs.

use crate::models::{
    AdverseEvent, AdverseEventPatch, ConcomitantProduct, PatientInfo, PatientInfoPatch,
    ReportData, ReportPatch, ReporterInfo, ReporterInfoPatch, SuspectProduct,
    SuspectProductPatch,
};

/// Merge a collaborator patch into the current record.
///
/// Object sections merge key-wise: a leaf supplied by the patch wins, an
/// absent leaf keeps the current value. The identity-derived reporter fields
/// (first name, last name, email, country) are read-dominant: the current
/// value survives whenever it is non-empty. List-valued top-level fields are
/// replaced wholesale only when the patch defines them. The result is always
/// full-shape.
pub fn merge(current: &ReportData, patch: &ReportPatch) -> ReportData {
    ReportData {
        patient_info: match &patch.patient_info {
            Some(p) => merge_patient(&current.patient_info, p),
            None => current.patient_info.clone(),
        },
        adverse_event: match &patch.adverse_event {
            Some(p) => merge_adverse_event(&current.adverse_event, p),
            None => current.adverse_event.clone(),
        },
        suspect_product: match &patch.suspect_product {
            Some(p) => merge_suspect_product(&current.suspect_product, p),
            None => current.suspect_product.clone(),
        },
        concomitant_products: patch
            .concomitant_products
            .clone()
            .unwrap_or_else(|| current.concomitant_products.clone()),
        reporter_info: match &patch.reporter_info {
            Some(p) => merge_reporter(&current.reporter_info, p),
            None => current.reporter_info.clone(),
        },
        product_available: patch.product_available.or(current.product_available),
    }
}

fn merge_patient(current: &PatientInfo, patch: &PatientInfoPatch) -> PatientInfo {
    PatientInfo {
        initials: patch.initials.clone().or_else(|| current.initials.clone()),
        age: patch.age.or(current.age),
        dob: patch.dob.clone().or_else(|| current.dob.clone()),
        sex: patch.sex.or(current.sex),
        weight: patch.weight.or(current.weight),
        weight_unit: patch.weight_unit.or(current.weight_unit),
        race: patch.race.clone().unwrap_or_else(|| current.race.clone()),
        ethnicity: patch.ethnicity.or(current.ethnicity),
        allergies: patch.allergies.clone().or_else(|| current.allergies.clone()),
        medical_conditions: patch
            .medical_conditions
            .clone()
            .or_else(|| current.medical_conditions.clone()),
        other_info: patch.other_info.clone().or_else(|| current.other_info.clone()),
    }
}

fn merge_adverse_event(current: &AdverseEvent, patch: &AdverseEventPatch) -> AdverseEvent {
    AdverseEvent {
        problem_type: patch
            .problem_type
            .clone()
            .unwrap_or_else(|| current.problem_type.clone()),
        outcomes: patch.outcomes.clone().unwrap_or_else(|| current.outcomes.clone()),
        event_onset_date: patch
            .event_onset_date
            .clone()
            .or_else(|| current.event_onset_date.clone()),
        description_narrative: patch
            .description_narrative
            .clone()
            .or_else(|| current.description_narrative.clone()),
        relevant_tests: patch
            .relevant_tests
            .clone()
            .or_else(|| current.relevant_tests.clone()),
        additional_comments: patch
            .additional_comments
            .clone()
            .or_else(|| current.additional_comments.clone()),
    }
}

fn merge_suspect_product(current: &SuspectProduct, patch: &SuspectProductPatch) -> SuspectProduct {
    SuspectProduct {
        name: patch.name.clone().or_else(|| current.name.clone()),
        product_type: patch
            .product_type
            .clone()
            .unwrap_or_else(|| current.product_type.clone()),
        ndc_number: patch.ndc_number.clone().or_else(|| current.ndc_number.clone()),
        manufacturer: patch
            .manufacturer
            .clone()
            .or_else(|| current.manufacturer.clone()),
        lot_number: patch.lot_number.clone().or_else(|| current.lot_number.clone()),
        expiration_date: patch
            .expiration_date
            .clone()
            .or_else(|| current.expiration_date.clone()),
        dose: patch.dose.clone().or_else(|| current.dose.clone()),
        quantity_taken: patch
            .quantity_taken
            .clone()
            .or_else(|| current.quantity_taken.clone()),
        frequency: patch.frequency.clone().or_else(|| current.frequency.clone()),
        route: patch.route.clone().or_else(|| current.route.clone()),
        therapy_start_date: patch
            .therapy_start_date
            .clone()
            .or_else(|| current.therapy_start_date.clone()),
        therapy_end_date: patch
            .therapy_end_date
            .clone()
            .or_else(|| current.therapy_end_date.clone()),
        therapy_ongoing: patch.therapy_ongoing.or(current.therapy_ongoing),
        reason_for_use: patch
            .reason_for_use
            .clone()
            .or_else(|| current.reason_for_use.clone()),
        problem_resolved_after_stopping: patch
            .problem_resolved_after_stopping
            .or(current.problem_resolved_after_stopping),
        problem_returned_after_restarting: patch
            .problem_returned_after_restarting
            .or(current.problem_returned_after_restarting),
    }
}

fn merge_reporter(current: &ReporterInfo, patch: &ReporterInfoPatch) -> ReporterInfo {
    ReporterInfo {
        // Identity-derived fields are read-dominant: the generator only
        // fills them when nothing is there yet.
        first_name: dominant(&current.first_name, &patch.first_name),
        last_name: dominant(&current.last_name, &patch.last_name),
        email: dominant(&current.email, &patch.email),
        country: dominant(&current.country, &patch.country),
        phone: patch.phone.clone().or_else(|| current.phone.clone()),
        address: patch.address.clone().or_else(|| current.address.clone()),
        city: patch.city.clone().or_else(|| current.city.clone()),
        state: patch.state.clone().or_else(|| current.state.clone()),
        zip_code: patch.zip_code.clone().or_else(|| current.zip_code.clone()),
        reported_to_manufacturer: patch
            .reported_to_manufacturer
            .or(current.reported_to_manufacturer),
        permission_to_share_identity: patch
            .permission_to_share_identity
            .or(current.permission_to_share_identity),
    }
}

/// Current value wins unless it is absent or empty.
fn dominant(current: &Option<String>, patch: &Option<String>) -> Option<String> {
    match current {
        Some(s) if !s.is_empty() => current.clone(),
        _ => patch.clone(),
    }
}

/// A user-initiated wholesale replacement of one record section.
///
/// Unlike a merge, a section edit is an explicit human decision and is
/// authoritative: no read-dominant rule applies.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionEdit {
    PatientInfo(PatientInfo),
    AdverseEvent(AdverseEvent),
    SuspectProduct(SuspectProduct),
    ConcomitantProducts(Vec<ConcomitantProduct>),
    ReporterInfo(ReporterInfo),
    ProductAvailable(Option<bool>),
}

impl SectionEdit {
    /// Human-readable section name, used in logs.
    pub fn section_name(&self) -> &'static str {
        match self {
            SectionEdit::PatientInfo(_) => "patient_info",
            SectionEdit::AdverseEvent(_) => "adverse_event",
            SectionEdit::SuspectProduct(_) => "suspect_product",
            SectionEdit::ConcomitantProducts(_) => "concomitant_products",
            SectionEdit::ReporterInfo(_) => "reporter_info",
            SectionEdit::ProductAvailable(_) => "product_available",
        }
    }
}

/// Replace one section of the record with a user-edited value.
pub fn apply_section_edit(current: &ReportData, edit: SectionEdit) -> ReportData {
    let mut next = current.clone();
    match edit {
        SectionEdit::PatientInfo(v) => next.patient_info = v,
        SectionEdit::AdverseEvent(v) => next.adverse_event = v,
        SectionEdit::SuspectProduct(v) => next.suspect_product = v,
        SectionEdit::ConcomitantProducts(v) => next.concomitant_products = v,
        SectionEdit::ReporterInfo(v) => next.reporter_info = v,
        SectionEdit::ProductAvailable(v) => next.product_available = v,
    }
    next
}

/// Parse delimited free text from the form editor back into a list.
///
/// Contract: comma-separated free text round-trips to a list of trimmed,
/// non-empty strings, order-preserving.
pub fn split_delimited(text: &str) -> Vec<String> {
    text.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Inverse of [`split_delimited`] for pre-filling the form editor.
pub fn join_delimited(items: &[String]) -> String {
    items.join(", ")
}

/// The fixed set of fields that count toward completion. Reporter info is
/// excluded: it is identity-derived, not user-authored.
const MANDATORY_FIELD_COUNT: u32 = 21;

/// Percentage of mandatory fields filled, rounded to the nearest integer.
///
/// A field counts as filled when it is non-null, non-empty-string, and (for
/// lists) non-empty. Monotonically non-decreasing under merges that only add
/// values.
pub fn completion(report: &ReportData) -> u8 {
    let p = &report.patient_info;
    let e = &report.adverse_event;
    let s = &report.suspect_product;

    let filled = [
        filled_str(&p.initials),
        p.age.is_some(),
        filled_str(&p.dob),
        p.sex.is_some(),
        p.weight.is_some(),
        !p.race.is_empty(),
        p.ethnicity.is_some(),
        filled_str(&p.allergies),
        filled_str(&p.medical_conditions),
        !e.problem_type.is_empty(),
        !e.outcomes.is_empty(),
        filled_str(&e.event_onset_date),
        filled_str(&e.description_narrative),
        filled_str(&s.name),
        filled_str(&s.manufacturer),
        filled_str(&s.dose),
        filled_str(&s.route),
        filled_str(&s.therapy_start_date),
        filled_str(&s.reason_for_use),
        !report.concomitant_products.is_empty(),
        report.product_available.is_some(),
    ]
    .iter()
    .filter(|&&f| f)
    .count() as u32;

    ((filled * 100 + MANDATORY_FIELD_COUNT / 2) / MANDATORY_FIELD_COUNT) as u8
}

fn filled_str(value: &Option<String>) -> bool {
    matches!(value, Some(s) if !s.is_empty())
}
