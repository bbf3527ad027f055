//! Parsing and validation of collaborator responses.
//!
//! Responses arrive as free text that should contain one JSON envelope. The
//! envelope is located by brace scanning (models sometimes wrap it in prose),
//! then validated against the wire contract before anything typed is built.
//! A malformed response is rejected here, so the session only ever sees
//! patches that can merge safely.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use aers_core::models::{ReportPatch, REQUIRED_SECTIONS};

#[derive(Error, Debug)]
pub enum ReplyError {
    #[error("no JSON object found in response")]
    NoJson,

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("response is missing \"{0}\"")]
    MissingField(&'static str),

    #[error("contract violation: {0}")]
    ContractViolation(String),
}

/// A validated collaborator response.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    /// The message to show (and transcribe) for the user.
    pub message: String,
    /// Sparse record update. Empty when the reply only asked a question or
    /// offered suggestions.
    pub patch: ReportPatch,
    /// Standardized terms for a forced single-choice decision.
    pub suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireReply {
    response_to_user: Option<String>,
    #[serde(default)]
    updated_report_data: Option<Value>,
    #[serde(default)]
    suggestions: Vec<String>,
}

/// Parse raw model output into a validated [`AgentReply`].
pub fn parse_agent_reply(raw: &str) -> Result<AgentReply, ReplyError> {
    // Locate the envelope even when the model adds surrounding prose
    let start = raw.find('{').ok_or(ReplyError::NoJson)?;
    let end = raw.rfind('}').ok_or(ReplyError::NoJson)?;
    if end < start {
        return Err(ReplyError::NoJson);
    }

    let wire: WireReply = serde_json::from_str(&raw[start..=end])?;

    let message = wire
        .response_to_user
        .filter(|m| !m.trim().is_empty())
        .ok_or(ReplyError::MissingField("response_to_user"))?;

    let patch = match wire.updated_report_data {
        None | Some(Value::Null) => ReportPatch::empty(),
        Some(Value::Object(map)) => {
            for key in REQUIRED_SECTIONS {
                if !map.contains_key(key) {
                    return Err(ReplyError::ContractViolation(format!(
                        "updated_report_data is missing section \"{}\"",
                        key
                    )));
                }
            }
            for key in map.keys() {
                if !REQUIRED_SECTIONS.contains(&key.as_str()) {
                    return Err(ReplyError::ContractViolation(format!(
                        "updated_report_data has unknown section \"{}\"",
                        key
                    )));
                }
            }
            serde_json::from_value(Value::Object(map))?
        }
        Some(other) => {
            return Err(ReplyError::ContractViolation(format!(
                "updated_report_data must be an object, got {}",
                json_type_name(&other)
            )))
        }
    };

    Ok(AgentReply {
        message,
        patch,
        suggestions: wire.suggestions,
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
