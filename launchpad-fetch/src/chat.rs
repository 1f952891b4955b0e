//! Streaming chat about a startup.

use launchpad_core::{ChatRequest, ChatSession};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::RequestError;
use crate::stream::{FragmentStream, StreamingProtocolClient};

/// Default chat endpoint.
pub const DEFAULT_CHAT_ENDPOINT: &str = "/chat/stream";

/// Sends chat messages and streams back the reply.
#[derive(Debug, Clone)]
pub struct ChatClient {
    streaming: StreamingProtocolClient,
    endpoint: String,
}

impl ChatClient {
    /// Creates a chat client posting to `endpoint`.
    pub fn new(streaming: StreamingProtocolClient, endpoint: impl Into<String>) -> Self {
        Self {
            streaming,
            endpoint: endpoint.into(),
        }
    }

    /// Sends `message` in `session` and streams the reply.
    pub async fn send(
        &self,
        session: &ChatSession,
        message: &str,
        context: Option<Value>,
    ) -> Result<FragmentStream, RequestError> {
        self.send_with_cancel(session, message, context, CancellationToken::new())
            .await
    }

    /// Like [`send`](Self::send), stopping when `cancel` fires.
    pub async fn send_with_cancel(
        &self,
        session: &ChatSession,
        message: &str,
        context: Option<Value>,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, RequestError> {
        let request = ChatRequest {
            resource_id: session.startup_id.clone(),
            message: message.to_string(),
            session_id: session.session_id.clone(),
            context,
        };
        debug!(session = %session, "Sending chat message");
        self.streaming
            .open_stream_with_cancel(&self.endpoint, &request, cancel)
            .await
    }
}
