//! Collaborator interface and test doubles.
//!
//! The session core never talks to a model directly; a host hands each
//! [`CollaboratorRequest`] to something implementing [`Collaborator`] and
//! feeds the reply back as an event. The doubles here let the full flow run
//! without inference: [`MockAgent`] follows a small symptom table, and
//! [`ScriptedAgent`] replays a fixed sequence of replies.

use std::collections::VecDeque;
use std::sync::Mutex;

use thiserror::Error;

use aers_core::models::{AdverseEventPatch, ReportPatch};
use aers_core::session::{CollaboratorRequest, COMPLETION_PHRASE, CONFIRMATION_MARKER};
use aers_core::{completion, Role};

use crate::reply::{AgentReply, ReplyError};

#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Reply(#[from] ReplyError),

    #[error("inference error: {0}")]
    Inference(String),
}

/// Something that can answer one collaborator request.
pub trait Collaborator {
    fn respond(&self, request: &CollaboratorRequest) -> Result<AgentReply, CollaboratorError>;
}

/// Keyword to standardized-term table for symptom disambiguation.
const SYMPTOM_TERMS: &[(&str, &[&str])] = &[
    ("rash", &["Rash", "Hives", "Contact dermatitis", "Eczema"]),
    ("headache", &["Headache", "Migraine", "Tension headache"]),
    ("nausea", &["Nausea", "Vomiting", "Stomach upset"]),
    ("dizzy", &["Dizziness", "Vertigo", "Lightheadedness"]),
    ("tired", &["Fatigue", "Drowsiness", "Lethargy"]),
];

/// Deterministic stand-in for the generation collaborator.
///
/// First symptom description gets term suggestions; a confirmation turn
/// records the chosen term; once the record is fully filled the reply ends
/// with the completion sentinel.
pub struct MockAgent;

impl MockAgent {
    fn last_human_text(request: &CollaboratorRequest) -> &str {
        request
            .context
            .iter()
            .rev()
            .find(|t| t.role == Role::Human)
            .map(|t| t.text.as_str())
            .unwrap_or_default()
    }
}

impl Collaborator for MockAgent {
    fn respond(&self, request: &CollaboratorRequest) -> Result<AgentReply, CollaboratorError> {
        let text = Self::last_human_text(request);

        if text.contains(CONFIRMATION_MARKER) {
            // `I confirm that "<term>" best describes my symptom.`
            let term = text
                .split('"')
                .nth(1)
                .ok_or_else(|| CollaboratorError::Inference("no quoted term".into()))?;
            return Ok(AgentReply {
                message: format!("Thank you, I've recorded \"{}\". When did it start?", term),
                patch: ReportPatch {
                    adverse_event: Some(AdverseEventPatch {
                        description_narrative: Some(term.to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                suggestions: vec![],
            });
        }

        if request.context.len() == 1 {
            let lower = text.to_lowercase();
            for (keyword, terms) in SYMPTOM_TERMS {
                if lower.contains(keyword) {
                    return Ok(AgentReply {
                        message: "Which of these terms best describes your symptom?".into(),
                        patch: ReportPatch::empty(),
                        suggestions: terms.iter().map(|t| t.to_string()).collect(),
                    });
                }
            }
        }

        if completion(&request.report) == 100 {
            return Ok(AgentReply {
                message: format!("Thank you for the details. {}", COMPLETION_PHRASE),
                patch: ReportPatch::empty(),
                suggestions: vec![],
            });
        }

        Ok(AgentReply {
            message: "Thanks. Could you tell me a bit more?".into(),
            patch: ReportPatch::empty(),
            suggestions: vec![],
        })
    }
}

/// Replays a fixed queue of replies, one per request.
pub struct ScriptedAgent {
    replies: Mutex<VecDeque<Result<AgentReply, CollaboratorError>>>,
}

impl ScriptedAgent {
    pub fn new(replies: Vec<Result<AgentReply, CollaboratorError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
        }
    }

    /// Shortcut for a reply that only says something.
    pub fn say(message: &str) -> Result<AgentReply, CollaboratorError> {
        Ok(AgentReply {
            message: message.to_string(),
            patch: ReportPatch::empty(),
            suggestions: vec![],
        })
    }
}

impl Collaborator for ScriptedAgent {
    fn respond(&self, _request: &CollaboratorRequest) -> Result<AgentReply, CollaboratorError> {
        self.replies
            .lock()
            .map_err(|_| CollaboratorError::Transport("script lock poisoned".into()))?
            .pop_front()
            .unwrap_or_else(|| Err(CollaboratorError::Transport("script exhausted".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aers_core::models::Turn;
    use aers_core::ReportData;

    fn request_with(texts: &[&str]) -> CollaboratorRequest {
        CollaboratorRequest {
            turn_index: 0,
            context: texts.iter().map(|t| Turn::human(*t)).collect(),
            report: ReportData::new(),
            attachments: vec![],
        }
    }

    #[test]
    fn test_mock_suggests_on_first_symptom() {
        let reply = MockAgent
            .respond(&request_with(&["I have a bad rash on my arm"]))
            .unwrap();
        assert_eq!(reply.suggestions.len(), 4);
        assert!(reply.suggestions.contains(&"Hives".to_string()));
        assert_eq!(reply.patch, ReportPatch::empty());
    }

    #[test]
    fn test_mock_records_confirmed_term() {
        let reply = MockAgent
            .respond(&request_with(&[
                "I have a rash",
                "I confirm that \"Hives\" best describes my symptom.",
            ]))
            .unwrap();
        assert!(reply.suggestions.is_empty());
        assert_eq!(
            reply
                .patch
                .adverse_event
                .unwrap()
                .description_narrative
                .as_deref(),
            Some("Hives")
        );
    }

    #[test]
    fn test_scripted_agent_plays_in_order() {
        let agent = ScriptedAgent::new(vec![
            ScriptedAgent::say("first"),
            Err(CollaboratorError::Transport("boom".into())),
        ]);
        let req = request_with(&["hi"]);

        assert_eq!(agent.respond(&req).unwrap().message, "first");
        assert!(agent.respond(&req).is_err());
        // Exhausted scripts also fail
        assert!(agent.respond(&req).is_err());
    }
}
