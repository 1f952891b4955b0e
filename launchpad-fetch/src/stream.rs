//! Streaming text responses.
//!
//! A streaming call is a single POST whose body arrives as raw text over a
//! chunked response. There is no event framing: each transport delivery is
//! decoded and yielded as one fragment, and concatenating fragments in
//! order rebuilds the message. Fragment boundaries carry no meaning.
//!
//! The credential is attached once, when the call opens. A failure status is
//! reported from [`StreamingProtocolClient::open_stream`] itself, so a
//! rejected call never yields a fragment. Mid-stream transport errors end
//! the sequence with an error; nothing is retried or replayed.

use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use crate::auth::TokenProvider;
use crate::error::RequestError;
use crate::gateway::{RequestGateway, error_from_body};

/// A lazy, finite, non-restartable sequence of text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, RequestError>> + Send>>;

// ============================================================================
// UTF-8 Decoder
// ============================================================================

/// Incremental UTF-8 decoder.
///
/// A multi-byte character split across two deliveries is held back until
/// its remaining bytes arrive. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes as much of the buffered input as possible.
    ///
    /// Returns `None` when nothing complete is available yet.
    pub fn push(&mut self, bytes: &[u8]) -> Option<String> {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // Incomplete trailing sequence
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }

        if out.is_empty() { None } else { Some(out) }
    }

    /// Flushes bytes left at end of input.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(tail)
    }
}

// ============================================================================
// Fragment Decoding
// ============================================================================

struct DecodeState<S> {
    body: S,
    decoder: Utf8Decoder,
    cancel: CancellationToken,
    finished: bool,
}

/// Turns a stream of byte chunks into a stream of text fragments.
///
/// One fragment per chunk that completes at least one character. The
/// sequence ends quietly when `cancel` fires, dropping `body`.
pub fn decode_fragments<S, B, E>(
    body: S,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<String, RequestError>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<RequestError>,
{
    let state = DecodeState {
        body,
        decoder: Utf8Decoder::new(),
        cancel,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }

        loop {
            let next = tokio::select! {
                biased;
                () = state.cancel.cancelled() => {
                    debug!("Stream cancelled by consumer");
                    return None;
                }
                next = state.body.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    if let Some(text) = state.decoder.push(chunk.as_ref()) {
                        return Some((Ok(text), state));
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e.into()), state));
                }
                None => {
                    state.finished = true;
                    debug!("Stream reached end of body");
                    return state.decoder.finish().map(|tail| (Ok(tail), state));
                }
            }
        }
    })
}

// ============================================================================
// Streaming Protocol Client
// ============================================================================

/// Opens streaming POST calls.
#[derive(Debug, Clone)]
pub struct StreamingProtocolClient {
    http: Client,
    base_url: String,
    tokens: TokenProvider,
}

impl StreamingProtocolClient {
    /// Creates a client over `http`.
    pub fn new(http: Client, base_url: &str, tokens: TokenProvider) -> Result<Self, RequestError> {
        Url::parse(base_url)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// Shares a gateway's client, base URL and credentials.
    pub fn from_gateway(gateway: &RequestGateway) -> Self {
        Self {
            http: gateway.http().clone(),
            base_url: gateway.base_url().to_string(),
            tokens: gateway.tokens().clone(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Opens a streaming call.
    ///
    /// Fails with [`RequestError::Http`] when the server rejects the call;
    /// no fragment is produced in that case.
    pub async fn open_stream<B>(&self, endpoint: &str, body: &B) -> Result<FragmentStream, RequestError>
    where
        B: Serialize + ?Sized,
    {
        self.open_stream_with_cancel(endpoint, body, CancellationToken::new())
            .await
    }

    /// Opens a streaming call that ends when `cancel` fires.
    ///
    /// Cancelling before the response arrives fails with
    /// [`RequestError::Cancelled`]; cancelling afterwards ends the fragment
    /// sequence without an error and releases the connection.
    #[instrument(skip(self, body, cancel), fields(endpoint = %endpoint))]
    pub async fn open_stream_with_cancel<B>(
        &self,
        endpoint: &str,
        body: &B,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, RequestError>
    where
        B: Serialize + ?Sized,
    {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/plain"));
        headers.extend(self.tokens.auth_header().await.into_headers());

        let request = self
            .http
            .post(self.url(endpoint))
            .headers(headers)
            .body(serde_json::to_vec(body)?)
            .send();

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RequestError::Cancelled),
            response = request => response?,
        };

        let response = ensure_success(response).await?;
        debug!("Stream opened");
        Ok(Box::pin(decode_fragments(
            Box::pin(response.bytes_stream()),
            cancel,
        )))
    }
}

async fn ensure_success(response: Response) -> Result<Response, RequestError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    debug!(status = %status, "Stream rejected");
    let body = response.bytes().await.unwrap_or_default();
    Err(error_from_body(status, &body))
}

/// Drains a fragment stream into one string.
pub async fn collect_fragments(mut fragments: FragmentStream) -> Result<String, RequestError> {
    let mut text = String::new();
    while let Some(fragment) = fragments.next().await {
        text.push_str(&fragment?);
    }
    Ok(text)
}

// ============================================================================
// Tests
// ============================================================================
