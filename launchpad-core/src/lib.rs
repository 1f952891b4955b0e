// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Launchpad Core
//!
//! Core types shared by every Launchpad crate:
//!
//! - [`QueryKey`] - Structural identifiers for cached reads, with prefix matching
//! - [`keys`] - Key constructors for startups, analyses, questions, notifications
//! - [`derive_session_id`] / [`ChatSession`] - Deterministic chat session ids
//! - Wire models ([`Startup`], [`Analysis`], [`Question`], [`Notification`], ...)
//! - [`CoreError`]

pub mod error;
pub mod models;

pub use error::CoreError;

pub use models::{
    // Keys
    Domain,
    KeyPart,
    QueryKey,
    QueryKeyPrefix,
    keys,
    // Sessions
    ChatSession,
    derive_session_id,
    // Resources
    Analysis,
    AnalysisStatus,
    ChatRequest,
    NewStartup,
    Notification,
    Question,
    QuestionAnswer,
    Startup,
    UnreadCount,
    UploadedArtifact,
};
