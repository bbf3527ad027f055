//! Full conversation flows driven through the session machine with scripted
//! and mock collaborators standing in for inference.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use aers_core::models::{
    AdverseEventPatch, IdentityProfile, ReportPatch, SuspectProductPatch,
};
use aers_core::session::{
    IdentityProvider, Session, SessionEvent, SessionSignal, View,
};
use aers_core::{Database, ReportDocument};
use aers_llm::{AgentReply, Collaborator, CollaboratorError, ScriptedAgent};

/// Identity the test can switch on and off mid-flow.
#[derive(Clone)]
struct SharedIdentity(Arc<Mutex<Option<IdentityProfile>>>);

impl SharedIdentity {
    fn signed_out() -> Self {
        Self(Arc::new(Mutex::new(None)))
    }

    fn signed_in(profile: IdentityProfile) -> Self {
        Self(Arc::new(Mutex::new(Some(profile))))
    }

    fn sign_in(&self, profile: IdentityProfile) {
        *self.0.lock().unwrap() = Some(profile);
    }
}

impl IdentityProvider for SharedIdentity {
    fn current(&self) -> Option<IdentityProfile> {
        self.0.lock().unwrap().clone()
    }
}

fn jane() -> IdentityProfile {
    IdentityProfile::named("Jane", "Doe", "jane@example.com")
}

fn new_session(identity: SharedIdentity) -> (Session, Arc<Mutex<Database>>) {
    let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
    (Session::new(db.clone(), Box::new(identity)), db)
}

/// Play the host: answer every collaborator call with the agent and feed the
/// result back in, until no call is outstanding. Returns the non-call
/// signals in the order they were emitted.
fn drive(
    session: &mut Session,
    agent: &dyn Collaborator,
    initial: Vec<SessionSignal>,
) -> Vec<SessionSignal> {
    let mut queue: VecDeque<SessionSignal> = initial.into();
    let mut observed = Vec::new();

    while let Some(signal) = queue.pop_front() {
        match signal {
            SessionSignal::CallCollaborator(request) => {
                let turn_index = request.turn_index;
                let event = match agent.respond(&request) {
                    Ok(reply) => SessionEvent::CollaboratorReply {
                        turn_index,
                        message: reply.message,
                        patch: reply.patch,
                        suggestions: reply.suggestions,
                    },
                    Err(_) => SessionEvent::CollaboratorFailed { turn_index },
                };
                queue.extend(session.handle_event(event).unwrap());
            }
            other => observed.push(other),
        }
    }
    observed
}

fn reply(message: &str, patch: ReportPatch, suggestions: &[&str]) -> Result<AgentReply, CollaboratorError> {
    Ok(AgentReply {
        message: message.to_string(),
        patch,
        suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
    })
}

#[test]
fn rash_report_end_to_end() {
    let (mut session, _db) = new_session(SharedIdentity::signed_in(jane()));
    let agent = ScriptedAgent::new(vec![
        reply(
            "Which of these terms best describes your symptom?",
            ReportPatch::empty(),
            &["Skin irritation", "Rash", "Hives"],
        ),
        reply(
            "Recorded. When did the rash start?",
            ReportPatch {
                adverse_event: Some(AdverseEventPatch {
                    description_narrative: Some("Rash".into()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            &[],
        ),
        reply(
            "Thank you for the details. The report is now complete.",
            ReportPatch {
                adverse_event: Some(AdverseEventPatch {
                    event_onset_date: Some("2026-08-01".into()),
                    ..Default::default()
                }),
                suspect_product: Some(SuspectProductPatch {
                    name: Some("lisinopril".into()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            &[],
        ),
    ]);

    let signals = session
        .handle_event(SessionEvent::StartReport {
            description: "I have a rash".into(),
            attachments: vec![],
        })
        .unwrap();
    let observed = drive(&mut session, &agent, signals);

    // The re-ranked choices put the closest term first
    let SessionSignal::PresentSuggestions(choices) = &observed[0] else {
        panic!("expected suggestions, got {:?}", observed[0]);
    };
    assert_eq!(choices[0], "Rash");
    assert!(session.input_locked());
    // Record untouched until the user decides
    assert!(session.report().adverse_event.description_narrative.is_none());

    let signals = session
        .handle_event(SessionEvent::SuggestionChosen {
            term: "Rash".into(),
        })
        .unwrap();
    drive(&mut session, &agent, signals);
    assert_eq!(
        session.report().adverse_event.description_narrative.as_deref(),
        Some("Rash")
    );

    let signals = session
        .handle_event(SessionEvent::UserTurn {
            text: "It started August 1st. I take lisinopril.".into(),
            attachments: vec![],
        })
        .unwrap();
    let observed = drive(&mut session, &agent, signals);

    assert_eq!(observed, vec![SessionSignal::ReportComplete]);
    assert_eq!(session.view(), View::Review);
    assert_eq!(
        session.report().suspect_product.name.as_deref(),
        Some("lisinopril")
    );
    // Identity seeding survived the whole flow
    assert_eq!(
        session.report().reporter_info.email.as_deref(),
        Some("jane@example.com")
    );

    let doc = ReportDocument::from_report(session.report()).unwrap();
    assert!(doc.verify_digest().unwrap());
    assert!(doc.metadata.completion_percent > 0);
}

#[test]
fn deferred_start_replays_after_identity_verification() {
    let identity = SharedIdentity::signed_out();
    let (mut session, db) = new_session(identity.clone());

    let signals = session
        .handle_event(SessionEvent::StartReport {
            description: "I've been very nauseous since starting a new pill".into(),
            attachments: vec![],
        })
        .unwrap();

    assert!(signals.is_empty());
    assert_eq!(session.view(), View::IdentityGate);
    assert!(db.lock().unwrap().has_pending_action().unwrap());

    identity.sign_in(jane());
    let signals = session
        .handle_event(SessionEvent::IdentityEstablished)
        .unwrap();

    assert_eq!(session.view(), View::Conversation);
    let SessionSignal::CallCollaborator(request) = &signals[0] else {
        panic!("expected collaborator call, got {:?}", signals[0]);
    };
    assert_eq!(
        request.context[0].text,
        "I've been very nauseous since starting a new pill"
    );
    assert_eq!(
        request.report.reporter_info.first_name.as_deref(),
        Some("Jane")
    );
    // The slot is read-once
    assert!(!db.lock().unwrap().has_pending_action().unwrap());
}

#[test]
fn verification_without_stored_action_lands_home() {
    let identity = SharedIdentity::signed_out();
    let (mut session, db) = new_session(identity.clone());

    session
        .handle_event(SessionEvent::StartReport {
            description: "dizzy".into(),
            attachments: vec![],
        })
        .unwrap();
    assert_eq!(session.view(), View::IdentityGate);

    // The slot expires behind the session's back
    db.lock().unwrap().clear_pending_action().unwrap();

    identity.sign_in(jane());
    let signals = session
        .handle_event(SessionEvent::IdentityEstablished)
        .unwrap();

    // Nothing to replay: back to the landing screen, no call issued
    assert!(signals.is_empty());
    assert_eq!(session.view(), View::Landing);
    assert!(!session.input_locked());
}

#[test]
fn connection_failure_keeps_session_usable() {
    let (mut session, _db) = new_session(SharedIdentity::signed_in(jane()));
    let agent = ScriptedAgent::new(vec![
        Err(CollaboratorError::Transport("timeout".into())),
        ScriptedAgent::say("Let's try again. What happened?"),
    ]);

    let signals = session
        .handle_event(SessionEvent::StartReport {
            description: "I have a headache".into(),
            attachments: vec![],
        })
        .unwrap();
    drive(&mut session, &agent, signals);

    let last = session.transcript().display_view().last().unwrap().clone();
    assert!(last.text.contains("trouble connecting"));
    assert!(!session.input_locked());

    // The user can simply send another turn
    let signals = session
        .handle_event(SessionEvent::UserTurn {
            text: "Still here".into(),
            attachments: vec![],
        })
        .unwrap();
    drive(&mut session, &agent, signals);
    let last = session.transcript().display_view().last().unwrap().clone();
    assert_eq!(last.text, "Let's try again. What happened?");
}

#[test]
fn blank_suggestions_degrade_to_normal_turn() {
    let (mut session, _db) = new_session(SharedIdentity::signed_in(jane()));
    let agent = ScriptedAgent::new(vec![reply(
        "Noted.",
        ReportPatch {
            adverse_event: Some(AdverseEventPatch {
                description_narrative: Some("Fatigue".into()),
                ..Default::default()
            }),
            ..Default::default()
        },
        // Nothing usable after trimming and dedup
        &["   ", ""],
    )]);

    let signals = session
        .handle_event(SessionEvent::StartReport {
            description: "so tired lately".into(),
            attachments: vec![],
        })
        .unwrap();
    let observed = drive(&mut session, &agent, signals);

    assert!(observed.is_empty());
    assert!(session.pending_suggestions().is_none());
    // The patch still merged
    assert_eq!(
        session.report().adverse_event.description_narrative.as_deref(),
        Some("Fatigue")
    );
}

#[test]
fn malformed_model_output_never_reaches_the_record() {
    let raw = r#"{"response_to_user": "ok", "updated_report_data": {"adverse_event": {"description_narrative": "Rash"}}}"#;
    // Missing five of the six required sections
    assert!(aers_llm::parse_agent_reply(raw).is_err());

    // The host maps a parse failure to a failed call; the record is untouched
    let (mut session, _db) = new_session(SharedIdentity::signed_in(jane()));
    let signals = session
        .handle_event(SessionEvent::StartReport {
            description: "rash".into(),
            attachments: vec![],
        })
        .unwrap();
    let before = session.report().clone();

    let SessionSignal::CallCollaborator(request) = &signals[0] else {
        panic!("expected collaborator call");
    };
    session
        .handle_event(SessionEvent::CollaboratorFailed {
            turn_index: request.turn_index,
        })
        .unwrap();
    assert_eq!(session.report(), &before);
}

#[test]
fn draft_roundtrip_through_store() {
    let (mut session, db) = new_session(SharedIdentity::signed_in(jane()));
    let agent = ScriptedAgent::new(vec![reply(
        "When did it start?",
        ReportPatch {
            adverse_event: Some(AdverseEventPatch {
                description_narrative: Some("Migraine".into()),
                ..Default::default()
            }),
            ..Default::default()
        },
        &[],
    )]);

    let signals = session
        .handle_event(SessionEvent::StartReport {
            description: "bad headaches".into(),
            attachments: vec![],
        })
        .unwrap();
    drive(&mut session, &agent, signals);

    let draft = session.snapshot();
    let draft_id = draft.draft_id.clone();
    db.lock().unwrap().insert_draft(&draft).unwrap();

    let stored = db.lock().unwrap().get_draft(&draft_id).unwrap().unwrap();
    let (mut revived, _db2) = new_session(SharedIdentity::signed_in(jane()));
    revived.resume(stored);

    assert_eq!(revived.view(), View::Conversation);
    assert_eq!(
        revived.report().adverse_event.description_narrative.as_deref(),
        Some("Migraine")
    );
    assert_eq!(
        revived.transcript().display_view().len(),
        session.transcript().display_view().len()
    );
}
