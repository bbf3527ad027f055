//! Prompts for the report-generation collaborator.
//!
//! The collaborator interviews the user one question at a time and answers in
//! a fixed JSON envelope. The instruction below is rebuilt every turn around
//! the current record, so the model always sees what is already filled in.

use aers_core::ReportData;

/// System instruction, independent of the current record.
pub const SYSTEM_PROMPT: &str = r#"You are the AERS Reporting Agent, helping a consumer report a medication side effect for an FDA MedWatch 3500B form.

Rules:
- Ask about ONE missing piece of information at a time, in plain language.
- Never invent values. Only record what the user actually said.
- Omit or set to null any field the user has not provided. Never clear a field that already has a value.
- The reporter's first name, last name, email and country come from their verified account. Do not ask for them and do not change them.
- When the user first describes a symptom, offer standardized medical terms for it through the "suggestions" array and ask them to pick one. Do not update the report until they confirm a term.
- When the user confirms a term ("... best describes my symptom"), record it as the event description and continue with the interview.
- When every remaining question has been asked and answered (or declined), end your message with exactly: The report is now complete."#;

/// Wire contract reminder appended to every instruction.
pub const RESPONSE_FORMAT: &str = r#"Respond with a single JSON object:
{
  "response_to_user": "<your next message to the user>",
  "updated_report_data": { "patient_info": ..., "adverse_event": ..., "suspect_product": ..., "concomitant_products": ..., "reporter_info": ..., "product_available": ... },
  "suggestions": ["<standardized term>", ...]
}
"updated_report_data" must always contain all six keys. "suggestions" is empty except when offering terms."#;

/// One line per unanswered mandatory field, for steering the next question.
pub fn missing_field_summary(report: &ReportData) -> String {
    let p = &report.patient_info;
    let e = &report.adverse_event;
    let s = &report.suspect_product;

    let mut missing: Vec<&str> = Vec::new();
    let mut check = |absent: bool, label: &'static str| {
        if absent {
            missing.push(label);
        }
    };

    check(e.description_narrative.is_none(), "what happened (event description)");
    check(e.event_onset_date.is_none(), "when the problem started");
    check(e.problem_type.is_empty(), "the type of problem");
    check(e.outcomes.is_empty(), "the outcome of the event");
    check(s.name.is_none(), "the name of the product");
    check(s.dose.is_none(), "the dose taken");
    check(s.route.is_none(), "how the product was taken");
    check(s.therapy_start_date.is_none(), "when the user started the product");
    check(s.reason_for_use.is_none(), "why the product was being used");
    check(s.manufacturer.is_none(), "the product manufacturer");
    check(p.initials.is_none(), "the patient's initials");
    check(p.age.is_none() && p.dob.is_none(), "the patient's age or date of birth");
    check(p.sex.is_none(), "the patient's sex");
    check(p.weight.is_none(), "the patient's weight");
    check(p.allergies.is_none(), "known allergies");
    check(p.medical_conditions.is_none(), "existing medical conditions");
    check(
        report.concomitant_products.is_empty(),
        "other products being taken",
    );
    check(report.product_available.is_none(), "whether the product is still available");

    if missing.is_empty() {
        "All mandatory information has been collected.".to_string()
    } else {
        let lines: Vec<String> = missing.iter().map(|m| format!("- {}", m)).collect();
        format!("Still missing:\n{}", lines.join("\n"))
    }
}

/// Full per-turn instruction: rules, today's date, the current record and
/// what is still missing.
pub fn build_system_instruction(report: &ReportData, today: &str) -> String {
    let record_json =
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
    format!(
        "{}\n\nToday's date is {}.\n\nCurrent report data:\n{}\n\n{}\n\n{}",
        SYSTEM_PROMPT,
        today,
        record_json,
        missing_field_summary(report),
        RESPONSE_FORMAT
    )
}
