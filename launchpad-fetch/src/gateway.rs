//! Unary request gateway.
//!
//! Every call builds `base_url + endpoint`, attaches a freshly fetched
//! credential, and normalizes the outcome into `Ok(T)` or a
//! [`RequestError`]. The gateway never touches the query cache; invalidation
//! after a successful mutation is the mutation coordinator's job.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::auth::TokenProvider;
use crate::context::ClientSettings;
use crate::error::RequestError;

// ============================================================================
// Upload Form
// ============================================================================

/// Binary file for a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// File name sent in the part's disposition.
    pub file_name: String,
    /// Raw bytes, sent as-is.
    pub bytes: Vec<u8>,
    /// MIME type; the transport default is used when `None`.
    pub mime: Option<String>,
}

impl UploadFile {
    /// Creates a file part without an explicit MIME type.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            mime: None,
        }
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// Multipart body: one file plus accompanying text fields.
#[derive(Debug, Clone)]
pub struct UploadForm {
    /// Name of the file field.
    pub file_field: String,
    /// The file.
    pub file: UploadFile,
    /// Extra text fields, e.g. the target resource id.
    pub fields: Vec<(String, String)>,
}

impl UploadForm {
    /// Creates a form whose file goes in the `file` field.
    pub fn new(file: UploadFile) -> Self {
        Self {
            file_field: "file".to_string(),
            file,
            fields: Vec::new(),
        }
    }

    /// Adds a text field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    fn into_multipart(self) -> Result<Form, RequestError> {
        let mut part = Part::bytes(self.file.bytes).file_name(self.file.file_name);
        if let Some(mime) = self.file.mime {
            part = part
                .mime_str(&mime)
                .map_err(|e| RequestError::Parse(format!("invalid MIME type {mime}: {e}")))?;
        }

        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        Ok(form.part(self.file_field, part))
    }
}

// ============================================================================
// Request Gateway
// ============================================================================

/// Issues unary JSON calls and multipart uploads against the backend.
#[derive(Debug, Clone)]
pub struct RequestGateway {
    http: Client,
    base_url: String,
    tokens: TokenProvider,
}

impl RequestGateway {
    /// Creates a gateway with its own HTTP client.
    pub fn new(settings: &ClientSettings, tokens: TokenProvider) -> Result<Self, RequestError> {
        Self::with_client(settings.build_client()?, &settings.base_url, tokens)
    }

    /// Creates a gateway over an existing client.
    pub fn with_client(
        http: Client,
        base_url: &str,
        tokens: TokenProvider,
    ) -> Result<Self, RequestError> {
        Url::parse(base_url)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// Returns the configured base URL (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the credential source.
    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Builds the absolute URL for an endpoint.
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Performs a JSON call.
    ///
    /// Headers are `Content-Type: application/json`, then the credential,
    /// then `extra_headers`; later sources win. The body is dropped for GET
    /// and DELETE.
    #[instrument(skip(self, body, extra_headers), fields(method = %method, endpoint = %endpoint))]
    pub async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = self.tokens.auth_header().await;
        headers.extend(auth.into_headers());
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut builder = self
            .http
            .request(method.clone(), self.url(endpoint))
            .headers(headers);

        if let Some(body) = body {
            if method == Method::GET || method == Method::DELETE {
                debug!("Dropping body for bodiless method");
            } else {
                builder = builder.body(serde_json::to_vec(body)?);
            }
        }

        debug!("Sending request");
        let response = builder.send().await?;
        read_json(response).await
    }

    /// GET `endpoint`.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, RequestError> {
        self.request::<T, ()>(Method::GET, endpoint, None, None).await
    }

    /// POST a JSON body.
    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, endpoint, Some(body), None).await
    }

    /// PUT a JSON body.
    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, endpoint, Some(body), None).await
    }

    /// PATCH with an optional JSON body.
    pub async fn patch<T, B>(&self, endpoint: &str, body: Option<&B>) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, endpoint, body, None).await
    }

    /// DELETE `endpoint`.
    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, RequestError> {
        self.request::<T, ()>(Method::DELETE, endpoint, None, None).await
    }

    /// POSTs a multipart form.
    ///
    /// Same credential and error handling as [`request`](Self::request), but
    /// the body is never JSON-encoded and no `Content-Type` is set here so
    /// the transport can add the multipart boundary.
    #[instrument(skip(self, form, extra_headers), fields(endpoint = %endpoint, file = %form.file.file_name))]
    pub async fn upload<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: UploadForm,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, RequestError> {
        let mut headers = self.tokens.auth_header().await.into_headers();
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }
        headers.remove(CONTENT_TYPE);

        debug!(bytes = form.file.bytes.len(), "Sending upload");
        let response = self
            .http
            .post(self.url(endpoint))
            .headers(headers)
            .multipart(form.into_multipart()?)
            .send()
            .await?;
        read_json(response).await
    }
}

// ============================================================================
// Response Handling
// ============================================================================

/// Reads a response into `T`, or into a normalized error on failure status.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RequestError> {
    let status = response.status();
    debug!(status = %status, "Response received");

    let bytes = response.bytes().await?;
    if !status.is_success() {
        return Err(error_from_body(status, &bytes));
    }

    // 204 and other empty successes decode as JSON null, so `()` and
    // `Option<_>` targets work.
    let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &bytes
    };
    serde_json::from_slice(body).map_err(RequestError::from)
}

/// Builds an [`RequestError::Http`] from a failure response body.
///
/// Looks for a string `message` or `detail` field. A `detail` array of
/// validation errors (`[{"loc": [...], "msg": "..."}]`) is flattened to
/// `"field: msg"` entries. Anything else falls back to `"HTTP <status>"`.
pub fn error_from_body(status: StatusCode, body: &[u8]) -> RequestError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|payload| extract_message(&payload))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    RequestError::http(status, message)
}

fn extract_message(payload: &Value) -> Option<String> {
    for field in ["message", "detail"] {
        match payload.get(field) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Array(items)) => {
                let joined = items
                    .iter()
                    .filter_map(validation_entry)
                    .collect::<Vec<_>>()
                    .join("; ");
                if !joined.is_empty() {
                    return Some(joined);
                }
            }
            _ => {}
        }
    }
    None
}

fn validation_entry(item: &Value) -> Option<String> {
    let msg = item.get("msg")?.as_str()?;
    let field = item
        .get("loc")
        .and_then(Value::as_array)
        .and_then(|loc| loc.last())
        .map(|last| match last {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    Some(match field {
        Some(field) => format!("{field}: {msg}"),
        None => msg.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticIdentity;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn gateway(server: &MockServer, tokens: TokenProvider) -> RequestGateway {
        RequestGateway::with_client(Client::new(), &server.uri(), tokens).unwrap()
    }

    fn authed() -> TokenProvider {
        TokenProvider::new(Arc::new(StaticIdentity::new("tok")))
    }

    #[test]
    fn test_url_joining() {
        let gw = RequestGateway::with_client(
            Client::new(),
            "https://api.example.com/v1/",
            TokenProvider::anonymous(),
        )
        .unwrap();
        assert_eq!(gw.url("/startups"), "https://api.example.com/v1/startups");
        assert_eq!(gw.url("startups"), "https://api.example.com/v1/startups");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = RequestGateway::with_client(Client::new(), "not a url", TokenProvider::anonymous())
            .unwrap_err();
        assert!(matches!(err, RequestError::InvalidUrl(_)));
    }

    #[test]
    fn test_error_message_extraction() {
        let err = error_from_body(StatusCode::NOT_FOUND, br#"{"detail":"not found"}"#);
        assert_eq!(err.user_message(), "not found");

        let err = error_from_body(StatusCode::BAD_REQUEST, br#"{"message":"bad","detail":"x"}"#);
        assert_eq!(err.user_message(), "bad");

        let err = error_from_body(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>");
        assert_eq!(err.user_message(), "HTTP 500");

        let err = error_from_body(StatusCode::BAD_GATEWAY, br#"{"error":"x"}"#);
        assert_eq!(err.user_message(), "HTTP 502");
    }

    #[test]
    fn test_validation_detail_is_field_specific() {
        let body = json!({"detail": [
            {"loc": ["body", "name"], "msg": "field required"},
            {"loc": ["body", "stage"], "msg": "invalid choice"}
        ]});
        let err = error_from_body(
            StatusCode::UNPROCESSABLE_ENTITY,
            body.to_string().as_bytes(),
        );
        assert_eq!(err.user_message(), "name: field required; stage: invalid choice");
        assert_eq!(err.status(), Some(422));
    }

    #[tokio::test]
    async fn test_get_sends_json_content_type_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/startups"))
            .and(header("authorization", "Bearer tok"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "s1"}])))
            .expect(1)
            .mount(&server)
            .await;

        let value: Value = gateway(&server, authed()).get("/startups").await.unwrap();
        assert_eq!(value, json!([{"id": "s1"}]));
    }

    #[tokio::test]
    async fn test_anonymous_call_has_no_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/public"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let _: Value = gateway(&server, TokenProvider::anonymous())
            .get("/public")
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        assert!(received[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_extra_headers_win() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/startups"))
            .and(header("authorization", "Bearer override"))
            .and(body_json(json!({"name": "Acme"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "s1"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut extra = HeaderMap::new();
        extra.insert("authorization", HeaderValue::from_static("Bearer override"));
        let _: Value = gateway(&server, authed())
            .request(Method::POST, "/startups", Some(&json!({"name": "Acme"})), Some(extra))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_omits_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/startups/s1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let gw = gateway(&server, authed());
        let _: () = gw
            .request(Method::DELETE, "/startups/s1", Some(&json!({"ignored": true})), None)
            .await
            .unwrap();

        let received: Vec<Request> = server.received_requests().await.unwrap();
        assert!(received[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_not_found_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/startups/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "not found"})))
            .mount(&server)
            .await;

        let err = gateway(&server, authed())
            .get::<Value>("/startups/missing")
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::Http { status: 404, ref message } if message == "not found"));
    }

    #[tokio::test]
    async fn test_server_error_unparseable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boom"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let err = gateway(&server, authed()).get::<Value>("/boom").await.unwrap_err();
        assert!(matches!(err, RequestError::Http { status: 500, ref message } if message == "HTTP 500"));
    }

    #[tokio::test]
    async fn test_success_with_invalid_json_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weird"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = gateway(&server, authed()).get::<Value>("/weird").await.unwrap_err();
        assert!(matches!(err, RequestError::Parse(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Bind then drop a listener so the port is closed
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let uri = format!("http://127.0.0.1:{port}");
        let gw = RequestGateway::with_client(Client::new(), &uri, authed()).unwrap();

        let err = gw.get::<Value>("/startups").await.unwrap_err();
        assert!(matches!(err, RequestError::Network(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_upload_is_multipart_not_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/uploads"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"path": "decks/s1/deck.pdf", "url": "https://cdn/deck.pdf"})),
            )
            .mount(&server)
            .await;

        let bytes = vec![0x25, 0x50, 0x44, 0x46, 0x00, 0xff];
        let form = UploadForm::new(UploadFile::new("deck.pdf", bytes.clone()).with_mime("application/pdf"))
            .field("startup_id", "s1");

        let mut extra = HeaderMap::new();
        extra.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let artifact: launchpad_core::UploadedArtifact = gateway(&server, authed())
            .upload("/uploads", form, Some(extra))
            .await
            .unwrap();
        assert_eq!(artifact.path, "decks/s1/deck.pdf");

        let received = server.received_requests().await.unwrap();
        let content_type = received[0].headers["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));

        // Binary payload arrives untouched
        let body = &received[0].body;
        assert!(body.windows(bytes.len()).any(|w| w == bytes.as_slice()));
        assert!(String::from_utf8_lossy(body).contains("name=\"startup_id\""));
    }
}
