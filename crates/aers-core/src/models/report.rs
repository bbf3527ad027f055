//! Report models for the adverse-event record.
//!
//! The record mirrors the FDA MedWatch 3500B consumer form: five named
//! sections plus a product-availability flag. Every section and field key
//! exists on every value of [`ReportData`]; sparseness is expressed with
//! `None`/empty, never with a missing key.

use serde::{Deserialize, Serialize};

/// Section E - about the person who had the problem.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientInfo {
    /// Patient's initials, e.g. "J.D."
    pub initials: Option<String>,
    /// Age in years.
    pub age: Option<u32>,
    /// Date of birth, YYYY-MM-DD.
    pub dob: Option<String>,
    pub sex: Option<Sex>,
    pub weight: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
    /// Zero or more race designations.
    pub race: Vec<String>,
    pub ethnicity: Option<Ethnicity>,
    /// Free text list of known allergies.
    pub allergies: Option<String>,
    /// Free text list of known medical conditions.
    pub medical_conditions: Option<String>,
    /// Tobacco use, pregnancy, alcohol use, and similar.
    pub other_info: Option<String>,
}

/// Sex at birth.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    Lbs,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Ethnicity {
    #[serde(rename = "Hispanic or Latino")]
    HispanicOrLatino,
    #[serde(rename = "Not Hispanic or Latino")]
    NotHispanicOrLatino,
    Unknown,
}

/// Section A - about the problem.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdverseEvent {
    /// Kind of problem, e.g. "Side effect", "Product quality problem".
    pub problem_type: Vec<String>,
    /// Outcome of the event, e.g. "Hospitalization", "Life-threatening".
    pub outcomes: Vec<String>,
    /// Date the problem started, YYYY-MM-DD.
    pub event_onset_date: Option<String>,
    /// Standardized description of what happened. Set from the user's
    /// disambiguation choice, then elaborated by the generator.
    pub description_narrative: Option<String>,
    /// Relevant tests or lab results.
    pub relevant_tests: Option<String>,
    pub additional_comments: Option<String>,
}

/// Section C - about the product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SuspectProduct {
    pub name: Option<String>,
    /// e.g. "Prescription", "Over-the-Counter", "Compounded".
    pub product_type: Vec<String>,
    /// National Drug Code, if available.
    pub ndc_number: Option<String>,
    pub manufacturer: Option<String>,
    pub lot_number: Option<String>,
    /// YYYY-MM-DD.
    pub expiration_date: Option<String>,
    /// Strength, e.g. "20 mg".
    pub dose: Option<String>,
    /// e.g. "2 pills".
    pub quantity_taken: Option<String>,
    /// e.g. "twice daily".
    pub frequency: Option<String>,
    /// e.g. "by mouth", "on the skin".
    pub route: Option<String>,
    pub therapy_start_date: Option<String>,
    pub therapy_end_date: Option<String>,
    pub therapy_ongoing: Option<bool>,
    /// The condition the product was used to treat.
    pub reason_for_use: Option<String>,
    pub problem_resolved_after_stopping: Option<bool>,
    pub problem_returned_after_restarting: Option<ProblemReturned>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProblemReturned {
    Yes,
    No,
    #[serde(rename = "Didn't restart")]
    DidntRestart,
}

/// Section E items 11 & 12 - another product the patient was taking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConcomitantProduct {
    pub name: String,
}

/// Section F - about the person filling out this form.
///
/// `first_name`, `last_name`, `email` and `country` are identity-derived:
/// seeded from the verified identity profile and read-dominant under merge.
/// The remaining fields are user-optional; the generator must not invent
/// values for them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReporterInfo {
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
    /// True if the reporter checked the do-NOT-share box.
    pub permission_to_share_identity: Option<bool>,
}

/// The complete adverse-event record under construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportData {
    pub patient_info: PatientInfo,
    pub adverse_event: AdverseEvent,
    pub suspect_product: SuspectProduct,
    pub concomitant_products: Vec<ConcomitantProduct>,
    pub reporter_info: ReporterInfo,
    /// Section B - does the user still have the product?
    pub product_available: Option<bool>,
}

impl ReportData {
    /// Empty record, every key present and unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty record pre-seeded with identity-derived reporter fields.
    pub fn with_reporter(profile: &IdentityProfile) -> Self {
        let mut report = Self::default();
        report.seed_reporter(profile);
        report
    }

    /// Populate reporter fields from the identity profile.
    ///
    /// Seeding happens only when the reporter name is still empty, so a
    /// record carried across a re-authentication is never overwritten.
    pub fn seed_reporter(&mut self, profile: &IdentityProfile) {
        if self.reporter_info.first_name.is_some() || self.reporter_info.last_name.is_some() {
            return;
        }
        self.reporter_info = ReporterInfo {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone: profile.phone.clone(),
            email: profile.email.clone(),
            address: profile.address.clone(),
            city: profile.city.clone(),
            state: profile.state.clone(),
            zip_code: profile.zip_code.clone(),
            country: profile.country.clone(),
            reported_to_manufacturer: profile.reported_to_manufacturer,
            permission_to_share_identity: profile.permission_to_share_identity,
        };
    }

    /// Serialize to canonical JSON (stable field order from the struct
    /// definitions) for digesting and persistence.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Profile data exposed by the identity provider after verification.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdentityProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub reported_to_manufacturer: Option<bool>,
    pub permission_to_share_identity: Option<bool>,
}

impl IdentityProfile {
    /// Minimal profile as produced by most sign-in flows.
    pub fn named(first: &str, last: &str, email: &str) -> Self {
        Self {
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            email: Some(email.to_string()),
            ..Self::default()
        }
    }
}
