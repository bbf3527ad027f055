//! Generation-collaborator interface for the AERS intake core.
//!
//! This crate holds everything model-facing: the per-turn instruction built
//! around the current record, the wire-contract parser that turns raw model
//! output into validated replies, and the [`Collaborator`] trait the host
//! implements over its transport of choice. Inference itself stays outside
//! the core; the test doubles here drive the full session flow without it.

pub mod agent;
pub mod prompts;
pub mod reply;

pub use agent::{Collaborator, CollaboratorError, MockAgent, ScriptedAgent};
pub use prompts::{build_system_instruction, missing_field_summary, SYSTEM_PROMPT};
pub use reply::{parse_agent_reply, AgentReply, ReplyError};
