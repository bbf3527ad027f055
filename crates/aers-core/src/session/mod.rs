//! Session state machine.
//!
//! The session owns the record, the transcript and the current view, and is
//! driven entirely by [`SessionEvent`]s. It performs no transport itself:
//! when a collaborator call is needed it emits
//! [`SessionSignal::CallCollaborator`] and the host answers later with a
//! `CollaboratorReply` (or `CollaboratorFailed`) event carrying the request's
//! turn index. Stale indices are discarded, so a response that arrives after
//! a newer request can never corrupt the record.

mod transcript;

pub use transcript::{Transcript, GREETING};

use std::sync::{Arc, Mutex};

use log::{debug, warn};
use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{
    AttachmentMeta, AttachmentPayload, DraftStatus, IdentityProfile, PendingAction, ReportData,
    ReportDraft, ReportPatch, Turn,
};
use crate::reconcile::{self, SectionEdit};
use crate::suggest;

/// The sole signal that a conversation is done: this exact substring,
/// case-sensitive, in the agent's latest message.
pub const COMPLETION_PHRASE: &str = "The report is now complete.";

/// Marker embedded in a resubmitted disambiguation choice so the
/// collaborator treats it as a resolved selection, not a fresh symptom.
pub const CONFIRMATION_MARKER: &str = "best describes my symptom";

const CONNECTION_TROUBLE: &str =
    "I'm sorry, I seem to be having trouble connecting. Please try again in a moment.";
const ATTACHMENT_TROUBLE: &str = "There was an error reading a file. Please try again.";
const FORM_UPDATE_ACK: &str = "I see you've updated some information in the form. \
     Let me continue with any remaining questions based on what you've provided.";
const DEFAULT_START_TEXT: &str = "I'd like to report a side effect.";

/// Which screen the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Landing,
    /// Verification is mid-flight: a stored action is queued awaiting the
    /// identity result. Entered when a session opens over an occupied slot.
    Authenticating,
    Conversation,
    Review,
    /// Waiting for the user to verify their identity before proceeding.
    IdentityGate,
}

/// Read access to the current identity. Injected so tests can substitute a
/// fake provider.
pub trait IdentityProvider {
    fn current(&self) -> Option<IdentityProfile>;
}

/// Everything that can happen to a session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The user asked to start a report from the landing screen.
    StartReport {
        description: String,
        attachments: Vec<AttachmentPayload>,
    },
    /// The identity provider reported a verified identity.
    IdentityEstablished,
    /// The identity provider reported sign-out.
    IdentityLost,
    /// A free-text turn from the user during the conversation.
    UserTurn {
        text: String,
        attachments: Vec<AttachmentPayload>,
    },
    /// The host failed to read an attachment before sending.
    AttachmentReadFailed,
    /// A parsed collaborator response for the call tagged `turn_index`.
    CollaboratorReply {
        turn_index: u64,
        message: String,
        patch: ReportPatch,
        suggestions: Vec<String>,
    },
    /// Transport or contract failure for the call tagged `turn_index`.
    CollaboratorFailed { turn_index: u64 },
    /// The user picked a term from the disambiguation choices.
    SuggestionChosen { term: String },
    /// The user saved a section in the form editor.
    SectionEdited(SectionEdit),
    /// Explicit restart.
    Reset,
}

/// Work the host must carry out after an event is handled.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSignal {
    /// Invoke the generation collaborator with this request.
    CallCollaborator(CollaboratorRequest),
    /// Surface a forced single-choice decision to the user.
    PresentSuggestions(Vec<String>),
    /// The completion sentinel was seen; the record is ready for review.
    ReportComplete,
    /// Transient notice outside the transcript (e.g. a failed file read).
    Notify { message: String },
}

/// A request to the generation collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct CollaboratorRequest {
    /// Monotonically increasing guard; replies carrying an older index are
    /// discarded.
    pub turn_index: u64,
    /// Context turns, local-only turns already excluded.
    pub context: Vec<Turn>,
    /// The record as of this request.
    pub report: ReportData,
    pub attachments: Vec<AttachmentPayload>,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("input is locked while a collaborator call or disambiguation is outstanding")]
    InputLocked,

    #[error("no disambiguation is awaiting a choice")]
    NoPendingSuggestions,

    #[error("event is not valid on the {0:?} screen")]
    WrongView(View),

    #[error("store error: {0}")]
    Store(#[from] DbError),

    #[error("store lock poisoned")]
    StoreLock,
}

pub type SessionResult<T> = Result<T, SessionError>;

/// One user's report-building session.
pub struct Session {
    view: View,
    report: ReportData,
    transcript: Transcript,
    pending_suggestions: Option<Vec<String>>,
    in_flight: Option<u64>,
    next_turn_index: u64,
    identity: Box<dyn IdentityProvider>,
    db: Arc<Mutex<Database>>,
}

impl Session {
    pub fn new(db: Arc<Mutex<Database>>, identity: Box<dyn IdentityProvider>) -> Self {
        let report = match identity.current() {
            Some(profile) => ReportData::with_reporter(&profile),
            None => ReportData::new(),
        };
        // An occupied slot means the process restarted mid-verification; the
        // queued action is replayed once identity is established.
        let view = match db.lock() {
            Ok(guard) if guard.has_pending_action().unwrap_or(false) => View::Authenticating,
            _ => View::Landing,
        };
        Self {
            view,
            report,
            transcript: Transcript::new(),
            pending_suggestions: None,
            in_flight: None,
            next_turn_index: 0,
            identity,
            db,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn report(&self) -> &ReportData {
        &self.report
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Completion percentage of the current record.
    pub fn completion(&self) -> u8 {
        reconcile::completion(&self.report)
    }

    /// Choices awaiting the user, if a disambiguation is unresolved.
    pub fn pending_suggestions(&self) -> Option<&[String]> {
        self.pending_suggestions.as_deref()
    }

    /// Free-text input is disabled while a call is outstanding or a
    /// disambiguation is unresolved.
    pub fn input_locked(&self) -> bool {
        self.in_flight.is_some() || self.pending_suggestions.is_some()
    }

    /// Advance the machine by one event.
    pub fn handle_event(&mut self, event: SessionEvent) -> SessionResult<Vec<SessionSignal>> {
        match event {
            SessionEvent::StartReport {
                description,
                attachments,
            } => self.start_report(description, attachments),
            SessionEvent::IdentityEstablished => self.identity_established(),
            SessionEvent::IdentityLost => self.identity_lost(),
            SessionEvent::UserTurn { text, attachments } => self.user_turn(text, attachments),
            SessionEvent::AttachmentReadFailed => Ok(vec![SessionSignal::Notify {
                message: ATTACHMENT_TROUBLE.to_string(),
            }]),
            SessionEvent::CollaboratorReply {
                turn_index,
                message,
                patch,
                suggestions,
            } => self.collaborator_reply(turn_index, message, patch, suggestions),
            SessionEvent::CollaboratorFailed { turn_index } => {
                self.collaborator_failed(turn_index)
            }
            SessionEvent::SuggestionChosen { term } => self.suggestion_chosen(term),
            SessionEvent::SectionEdited(edit) => self.section_edited(edit),
            SessionEvent::Reset => self.reset(),
        }
    }

    fn start_report(
        &mut self,
        description: String,
        attachments: Vec<AttachmentPayload>,
    ) -> SessionResult<Vec<SessionSignal>> {
        if self.view != View::Landing {
            return Err(SessionError::WrongView(self.view));
        }

        let Some(profile) = self.identity.current() else {
            // Defer until identity is verified. Attachments survive only as
            // metadata; the payloads are gone after the redirect.
            let files: Vec<AttachmentMeta> =
                attachments.iter().map(|a| a.meta.clone()).collect();
            let action = PendingAction {
                description,
                files,
            };
            self.locked_db()?.store_pending_action(&action)?;
            debug!("no identity; pending action stored, entering identity gate");
            self.view = View::IdentityGate;
            return Ok(vec![]);
        };

        self.report = ReportData::with_reporter(&profile);
        let text = start_text(&description, attachments.len());
        self.transcript.append(Turn::human(text));
        self.view = View::Conversation;
        Ok(vec![self.issue_call(attachments)])
    }

    fn identity_established(&mut self) -> SessionResult<Vec<SessionSignal>> {
        let Some(profile) = self.identity.current() else {
            return Ok(vec![]);
        };
        self.report.seed_reporter(&profile);

        // Verification may complete in the same process (IdentityGate), in a
        // fresh one that found the slot occupied (Authenticating), or after
        // the slot check raced (Landing). All three consume the slot.
        if !matches!(
            self.view,
            View::IdentityGate | View::Authenticating | View::Landing
        ) {
            return Ok(vec![]);
        }

        let action = {
            let mut db = self.locked_db()?;
            db.restore_and_clear_pending_action()?
        };

        match action {
            Some(action) => {
                if !action.files.is_empty() {
                    // Documented limitation: content never persisted.
                    warn!(
                        "replaying pending action without {} attachment(s)",
                        action.files.len()
                    );
                }
                self.report = ReportData::with_reporter(&profile);
                self.transcript
                    .append(Turn::human(start_text(&action.description, 0)));
                self.view = View::Conversation;
                Ok(vec![self.issue_call(Vec::new())])
            }
            None => {
                self.view = View::Landing;
                Ok(vec![])
            }
        }
    }

    fn identity_lost(&mut self) -> SessionResult<Vec<SessionSignal>> {
        // While waiting for verification, "no identity yet" is the normal
        // state and must not wipe the queued action.
        if matches!(
            self.view,
            View::Landing | View::IdentityGate | View::Authenticating
        ) {
            return Ok(vec![]);
        }
        debug!("identity lost; forcing session reset");
        self.reset()
    }

    fn user_turn(
        &mut self,
        text: String,
        attachments: Vec<AttachmentPayload>,
    ) -> SessionResult<Vec<SessionSignal>> {
        if self.view != View::Conversation {
            return Err(SessionError::WrongView(self.view));
        }
        if self.input_locked() {
            return Err(SessionError::InputLocked);
        }
        if text.trim().is_empty() && attachments.is_empty() {
            return Ok(vec![]);
        }

        let turn_text = if text.trim().is_empty() {
            format!("I've uploaded {} file(s).", attachments.len())
        } else {
            text
        };
        self.transcript.append(Turn::human(turn_text));
        Ok(vec![self.issue_call(attachments)])
    }

    fn collaborator_reply(
        &mut self,
        turn_index: u64,
        message: String,
        patch: ReportPatch,
        suggestions: Vec<String>,
    ) -> SessionResult<Vec<SessionSignal>> {
        if self.in_flight != Some(turn_index) {
            debug!("discarding stale collaborator reply (turn {})", turn_index);
            return Ok(vec![]);
        }
        self.in_flight = None;

        self.transcript.append(Turn::agent(message.clone()));

        if !suggestions.is_empty() {
            let query = self.transcript.last_human_text().unwrap_or_default();
            let ranked = suggest::rank_suggestions(query, &suggestions);
            if !ranked.is_empty() {
                // Record stays untouched until the user picks a term.
                self.pending_suggestions = Some(ranked.clone());
                return Ok(vec![SessionSignal::PresentSuggestions(ranked)]);
            }
            // Zero usable candidates: degrade to a normal turn.
        }

        self.report = reconcile::merge(&self.report, &patch);

        if message.contains(COMPLETION_PHRASE) {
            self.view = View::Review;
            return Ok(vec![SessionSignal::ReportComplete]);
        }
        Ok(vec![])
    }

    fn collaborator_failed(&mut self, turn_index: u64) -> SessionResult<Vec<SessionSignal>> {
        if self.in_flight != Some(turn_index) {
            debug!("discarding stale collaborator failure (turn {})", turn_index);
            return Ok(vec![]);
        }
        self.in_flight = None;
        self.transcript.append(Turn::agent(CONNECTION_TROUBLE));
        Ok(vec![])
    }

    fn suggestion_chosen(&mut self, term: String) -> SessionResult<Vec<SessionSignal>> {
        if self.pending_suggestions.is_none() {
            return Err(SessionError::NoPendingSuggestions);
        }
        self.pending_suggestions = None;

        // Phrased so the collaborator recognizes a resolved selection and
        // does not re-enter the disambiguation branch.
        self.transcript.append(Turn::human(format!(
            "I confirm that \"{}\" {}.",
            term, CONFIRMATION_MARKER
        )));
        Ok(vec![self.issue_call(Vec::new())])
    }

    fn section_edited(&mut self, edit: SectionEdit) -> SessionResult<Vec<SessionSignal>> {
        debug!("user edited section {}", edit.section_name());
        self.report = reconcile::apply_section_edit(&self.report, edit);

        if self.view == View::Conversation && !self.transcript.is_pristine() {
            self.transcript.append(Turn::agent(FORM_UPDATE_ACK));
        }
        Ok(vec![])
    }

    fn reset(&mut self) -> SessionResult<Vec<SessionSignal>> {
        self.view = View::Landing;
        self.report = match self.identity.current() {
            Some(profile) => ReportData::with_reporter(&profile),
            None => ReportData::new(),
        };
        self.transcript.reset();
        self.pending_suggestions = None;
        self.in_flight = None;
        self.locked_db()?.clear_pending_action()?;
        Ok(vec![])
    }

    fn issue_call(&mut self, attachments: Vec<AttachmentPayload>) -> SessionSignal {
        let turn_index = self.next_turn_index;
        self.next_turn_index += 1;
        self.in_flight = Some(turn_index);

        SessionSignal::CallCollaborator(CollaboratorRequest {
            turn_index,
            context: self.transcript.context_view(),
            report: self.report.clone(),
            attachments,
        })
    }

    /// Durable snapshot of this session.
    pub fn snapshot(&self) -> ReportDraft {
        let status = if self.view == View::Review {
            DraftStatus::Complete
        } else {
            DraftStatus::InProgress
        };
        ReportDraft::new(self.report.clone(), self.transcript.snapshot(), status)
    }

    /// Continue a previously saved session.
    pub fn resume(&mut self, draft: ReportDraft) {
        self.report = draft.report;
        self.transcript = Transcript::restore(draft.transcript);
        self.pending_suggestions = None;
        self.in_flight = None;
        self.view = match draft.status {
            DraftStatus::Complete => View::Review,
            DraftStatus::InProgress => View::Conversation,
        };
    }

    fn locked_db(&self) -> SessionResult<std::sync::MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| SessionError::StoreLock)
    }
}

fn start_text(description: &str, attachment_count: usize) -> String {
    if !description.trim().is_empty() {
        description.to_string()
    } else if attachment_count > 0 {
        format!("I've uploaded {} file(s).", attachment_count)
    } else {
        DEFAULT_START_TEXT.to_string()
    }
}
