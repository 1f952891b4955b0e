//! Domain models for Launchpad.
//!
//! ## Submodules
//!
//! - [`query_key`] - Cache keys, domains, and key constructors
//! - [`session`] - Chat session id derivation
//! - [`resource`] - Wire models for startups, analyses, questions, notifications

pub mod query_key;
mod resource;
mod session;

pub use query_key::{Domain, KeyPart, QueryKey, QueryKeyPrefix, keys};
pub use resource::{
    Analysis, AnalysisStatus, ChatRequest, NewStartup, Notification, Question, QuestionAnswer,
    Startup, UnreadCount, UploadedArtifact,
};
pub use session::{ChatSession, derive_session_id};
