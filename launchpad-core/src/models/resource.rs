//! Wire models for the backend's resource collections.
//!
//! These mirror the JSON the service returns. Unknown fields are kept in
//! `extra` so nothing the server adds is silently lost when a value is
//! re-serialized (e.g. by the CLI's JSON output).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

// ============================================================================
// Startups
// ============================================================================

/// A startup submitted for analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Startup {
    /// Server-assigned id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form pitch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Industry or sector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// Funding stage (e.g. "seed").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Fields this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body for creating a startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStartup {
    /// Display name.
    pub name: String,
    /// Free-form pitch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Industry or sector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// Funding stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl NewStartup {
    /// Creates a body with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Checks the body before it is sent.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidData("startup name must not be empty".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Analyses & Questions
// ============================================================================

/// Lifecycle of an analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Queued, not yet started.
    #[default]
    Pending,
    /// Currently running.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

impl AnalysisStatus {
    /// Returns true once the analysis can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One analysis of a startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Server-assigned id.
    pub id: String,
    /// Startup this analysis belongs to.
    pub startup_id: String,
    /// Run state.
    #[serde(default)]
    pub status: AnalysisStatus,
    /// Overall score, once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Summary text, once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Fields this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A follow-up question about a startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Server-assigned id.
    pub id: String,
    /// Startup this question belongs to.
    pub startup_id: String,
    /// Question text.
    pub text: String,
    /// The user's answer, if given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Fields this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Question {
    /// Returns true if the question has a non-blank answer.
    pub fn is_answered(&self) -> bool {
        self.answer.as_deref().is_some_and(|a| !a.trim().is_empty())
    }
}

/// Body for answering a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    /// Answer text.
    pub answer: String,
}

// ============================================================================
// Notifications
// ============================================================================

/// A user notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Server-assigned id.
    pub id: String,
    /// Short title.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub message: String,
    /// Whether the user has seen it.
    #[serde(default)]
    pub read: bool,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Unread notification counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    /// Number of unread notifications.
    pub count: u64,
}

// ============================================================================
// Uploads & Chat
// ============================================================================

/// A stored upload, as described by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedArtifact {
    /// Storage path or reference.
    pub path: String,
    /// URL the artifact can be fetched from.
    pub url: String,
}

/// Body of a streaming chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The resource being discussed.
    pub resource_id: String,
    /// The user's message.
    pub message: String,
    /// Transcript to append to.
    pub session_id: String,
    /// Optional extra context for the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}
