//! Typed endpoints of the Launchpad backend.

use launchpad_core::{
    Analysis, NewStartup, Notification, Question, QuestionAnswer, Startup, UnreadCount,
    UploadedArtifact,
};
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::error::RequestError;
use crate::gateway::{RequestGateway, UploadFile, UploadForm};

/// Default upload endpoint.
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "/uploads";

/// Builds an endpoint path from raw segments, percent-encoding each one so an
/// id can never add path levels or a query string.
fn endpoint(segments: &[&str]) -> Result<String, RequestError> {
    let mut url = Url::parse("http://localhost/")?;
    url.path_segments_mut()
        .map_err(|()| RequestError::InvalidUrl("base cannot hold a path".into()))?
        .clear()
        .extend(segments);
    Ok(url.path().to_string())
}

/// Thin typed wrapper over [`RequestGateway`].
#[derive(Debug, Clone)]
pub struct LaunchpadApi {
    gateway: RequestGateway,
    upload_endpoint: String,
}

impl LaunchpadApi {
    /// Creates the API facade.
    pub fn new(gateway: RequestGateway) -> Self {
        Self {
            gateway,
            upload_endpoint: DEFAULT_UPLOAD_ENDPOINT.to_string(),
        }
    }

    /// Overrides the upload endpoint.
    #[must_use]
    pub fn with_upload_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.upload_endpoint = endpoint.into();
        self
    }

    /// Returns the underlying gateway.
    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    // ========================================================================
    // Startups
    // ========================================================================

    /// Lists the current user's startups.
    pub async fn list_startups(&self) -> Result<Vec<Startup>, RequestError> {
        self.gateway.get("/startups").await
    }

    /// Fetches one startup.
    pub async fn get_startup(&self, id: &str) -> Result<Startup, RequestError> {
        self.gateway.get(&endpoint(&["startups", id])?).await
    }

    /// Creates a startup.
    #[instrument(skip(self, startup), fields(name = %startup.name))]
    pub async fn create_startup(&self, startup: &NewStartup) -> Result<Startup, RequestError> {
        startup.validate()?;
        self.gateway.post("/startups", startup).await
    }

    /// Deletes a startup.
    pub async fn delete_startup(&self, id: &str) -> Result<(), RequestError> {
        let _: Option<Value> = self.gateway.delete(&endpoint(&["startups", id])?).await?;
        Ok(())
    }

    // ========================================================================
    // Analyses & Questions
    // ========================================================================

    /// Lists analyses of a startup.
    pub async fn list_analyses(&self, startup_id: &str) -> Result<Vec<Analysis>, RequestError> {
        self.gateway
            .get(&endpoint(&["startups", startup_id, "analyses"])?)
            .await
    }

    /// Starts a new analysis.
    pub async fn run_analysis(&self, startup_id: &str) -> Result<Analysis, RequestError> {
        self.gateway
            .post(
                &endpoint(&["startups", startup_id, "analyses"])?,
                &Value::Object(Default::default()),
            )
            .await
    }

    /// Lists follow-up questions for a startup.
    pub async fn list_questions(&self, startup_id: &str) -> Result<Vec<Question>, RequestError> {
        self.gateway
            .get(&endpoint(&["startups", startup_id, "questions"])?)
            .await
    }

    /// Answers a question.
    pub async fn answer_question(
        &self,
        question_id: &str,
        answer: &str,
    ) -> Result<Question, RequestError> {
        let body = QuestionAnswer {
            answer: answer.to_string(),
        };
        self.gateway
            .put(&endpoint(&["questions", question_id])?, &body)
            .await
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Lists notifications.
    pub async fn list_notifications(
        &self,
        unread_only: bool,
    ) -> Result<Vec<Notification>, RequestError> {
        let endpoint = if unread_only {
            "/notifications?unread_only=true"
        } else {
            "/notifications"
        };
        self.gateway.get(endpoint).await
    }

    /// Returns the unread notification count.
    pub async fn unread_count(&self) -> Result<UnreadCount, RequestError> {
        self.gateway.get("/notifications/unread-count").await
    }

    /// Marks one notification read.
    pub async fn mark_read(&self, notification_id: &str) -> Result<(), RequestError> {
        let _: Option<Value> = self
            .gateway
            .patch::<_, Value>(&endpoint(&["notifications", notification_id, "read"])?, None)
            .await?;
        Ok(())
    }

    /// Marks every notification read.
    pub async fn mark_all_read(&self) -> Result<(), RequestError> {
        let _: Option<Value> = self
            .gateway
            .post("/notifications/read-all", &Value::Object(Default::default()))
            .await?;
        Ok(())
    }

    // ========================================================================
    // Uploads
    // ========================================================================

    /// Uploads a document for a startup.
    pub async fn upload_document(
        &self,
        startup_id: &str,
        file: UploadFile,
    ) -> Result<UploadedArtifact, RequestError> {
        let form = UploadForm::new(file).field("startup_id", startup_id);
        self.gateway.upload(&self.upload_endpoint, form, None).await
    }
}
