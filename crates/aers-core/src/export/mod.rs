//! Report export.
//!
//! When the flow reaches review the record is serialized to a complete,
//! self-describing document. Every section key is always present; a partial
//! or lossy export is never produced.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::ReportData;
use crate::reconcile;

/// Export format version.
pub const FORMAT_VERSION: &str = "aers-3500b-draft/1";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Self-describing export envelope around the full record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub metadata: ExportMetadata,
    /// The complete record, full-shape.
    pub report: ReportData,
}

/// Export metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Export format version.
    pub format_version: String,
    /// Export timestamp, RFC 3339.
    pub exported_at: String,
    /// Completion percentage at export time.
    pub completion_percent: u8,
    /// Hash algorithm used for the digest.
    pub hash_algorithm: String,
    /// Hex digest of the canonical report JSON.
    pub report_digest: String,
}

impl ReportDocument {
    /// Build the export document for a record.
    pub fn from_report(report: &ReportData) -> Result<Self, ExportError> {
        let canonical = report.to_canonical_json()?;
        let digest = hex::encode(Sha256::digest(canonical.as_bytes()));

        Ok(Self {
            metadata: ExportMetadata {
                format_version: FORMAT_VERSION.to_string(),
                exported_at: chrono::Utc::now().to_rfc3339(),
                completion_percent: reconcile::completion(report),
                hash_algorithm: "SHA-256".to_string(),
                report_digest: digest,
            },
            report: report.clone(),
        })
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Verify the embedded digest against the embedded record.
    pub fn verify_digest(&self) -> Result<bool, ExportError> {
        let canonical = self.report.to_canonical_json()?;
        Ok(hex::encode(Sha256::digest(canonical.as_bytes())) == self.metadata.report_digest)
    }
}

/// Dated download filename, e.g. `aers_report_2026-08-23.json`.
pub fn suggested_filename() -> String {
    format!("aers_report_{}.json", chrono::Utc::now().format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_is_full_shape() {
        let mut report = ReportData::new();
        report.adverse_event.description_narrative = Some("Rash".into());

        let doc = ReportDocument::from_report(&report).unwrap();
        let json: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();

        assert_eq!(json["metadata"]["format_version"], FORMAT_VERSION);
        for key in [
            "patient_info",
            "adverse_event",
            "suspect_product",
            "concomitant_products",
            "reporter_info",
            "product_available",
        ] {
            assert!(json["report"].get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_digest_verifies() {
        let mut report = ReportData::new();
        report.suspect_product.name = Some("ibuprofen".into());

        let mut doc = ReportDocument::from_report(&report).unwrap();
        assert!(doc.verify_digest().unwrap());

        // Tampering breaks the digest
        doc.report.suspect_product.name = Some("acetaminophen".into());
        assert!(!doc.verify_digest().unwrap());
    }

    #[test]
    fn test_suggested_filename_shape() {
        let name = suggested_filename();
        assert!(name.starts_with("aers_report_"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "aers_report_2026-08-23.json".len());
    }
}
