//! Typed partial-record structures produced by the generation collaborator.
//!
//! A [`ReportPatch`] is sparse on two levels: a whole section may be absent,
//! and any leaf inside a present section may be absent. Absent (or JSON
//! `null`) always means "no value supplied": a patch can set fields but can
//! never clear one. Shape validation against the collaborator contract (all
//! six top-level keys present) happens at the parsing boundary, before a
//! patch is ever handed to the reconciliation engine.

use serde::{Deserialize, Serialize};

use super::report::{ConcomitantProduct, Ethnicity, ProblemReturned, Sex, WeightUnit};

/// Top-level section keys a collaborator response must carry.
pub const REQUIRED_SECTIONS: [&str; 6] = [
    "patient_info",
    "adverse_event",
    "suspect_product",
    "concomitant_products",
    "reporter_info",
    "product_available",
];

/// Sparse update to the full record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportPatch {
    pub patient_info: Option<PatientInfoPatch>,
    pub adverse_event: Option<AdverseEventPatch>,
    pub suspect_product: Option<SuspectProductPatch>,
    /// Replaces the whole list when present.
    pub concomitant_products: Option<Vec<ConcomitantProduct>>,
    pub reporter_info: Option<ReporterInfoPatch>,
    /// Replaces the availability flag when present.
    pub product_available: Option<bool>,
}

impl ReportPatch {
    /// A patch that changes nothing.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatientInfoPatch {
    pub initials: Option<String>,
    pub age: Option<u32>,
    pub dob: Option<String>,
    pub sex: Option<Sex>,
    pub weight: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
    pub race: Option<Vec<String>>,
    pub ethnicity: Option<Ethnicity>,
    pub allergies: Option<String>,
    pub medical_conditions: Option<String>,
    pub other_info: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdverseEventPatch {
    pub problem_type: Option<Vec<String>>,
    pub outcomes: Option<Vec<String>>,
    pub event_onset_date: Option<String>,
    pub description_narrative: Option<String>,
    pub relevant_tests: Option<String>,
    pub additional_comments: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SuspectProductPatch {
    pub name: Option<String>,
    pub product_type: Option<Vec<String>>,
    pub ndc_number: Option<String>,
    pub manufacturer: Option<String>,
    pub lot_number: Option<String>,
    pub expiration_date: Option<String>,
    pub dose: Option<String>,
    pub quantity_taken: Option<String>,
    pub frequency: Option<String>,
    pub route: Option<String>,
    pub therapy_start_date: Option<String>,
    pub therapy_end_date: Option<String>,
    pub therapy_ongoing: Option<bool>,
    pub reason_for_use: Option<String>,
    pub problem_resolved_after_stopping: Option<bool>,
    pub problem_returned_after_restarting: Option<ProblemReturned>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReporterInfoPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub reported_to_manufacturer: Option<bool>,
    pub permission_to_share_identity: Option<bool>,
}
