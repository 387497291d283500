use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::tokens::{RefreshedToken, TokenPair, TokenStore};
use crate::config::{Config, ConfigError};
use crate::domain::{ContactInfo, DashboardStats, Feedback, Resource};
use crate::storage::KeyValueStore;

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const MAX_ERROR_BODY: usize = 8 * 1024; // 8KB

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error! status: {status} - {body}")]
    Http { status: u16, body: String },
    #[error("Authentication failed. Please login again.")]
    AuthenticationFailed,
    #[error("No refresh token available")]
    NoRefreshToken,
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Failed to read upload '{}': {source}", path.display())]
    Upload {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("Local store error: {0:#}")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Store(err)
    }
}

impl ApiError {
    /// True when the server could not be reached at all, as opposed to
    /// answering with an error.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Timeout | ApiError::Network(_))
    }
}

/// List endpoints answer either `{results: [...]}` or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Paged { results: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Paged { results } => results,
            Listing::Bare(items) => items,
        }
    }
}

enum Body {
    Empty,
    Json(serde_json::Value),
    /// Rebuilt into a fresh `multipart::Form` on every attempt, since a sent
    /// form cannot be replayed.
    Multipart(Vec<FormPart>),
}

enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

struct ApiRequest {
    method: Method,
    url: Url,
    body: Body,
    authenticated: bool,
}

struct Inner {
    http: reqwest::Client,
    base_url: Url,
    public_url: Url,
    timeout: Duration,
    tokens: TokenStore,
}

/// Client for the remote content API.
///
/// Cheap to clone. Bearer tokens live in the local store so they survive
/// restarts; a 401 triggers one refresh and one retry, never more.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    pub fn new(
        base_url: Url,
        public_url: Url,
        timeout: Duration,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                http: reqwest::Client::new(),
                base_url,
                public_url,
                timeout,
                tokens: TokenStore::new(store),
            }),
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.api_url()?,
            config.public_url()?,
            config.request_timeout(),
            store,
        ))
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Obtain and persist an access/refresh token pair.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "username": username,
            "password": password.expose_secret(),
        });
        let request = self.request(Method::POST, "token/", Body::Json(body), false)?;
        let text = self.execute(&request).await?;
        let pair: TokenPair = serde_json::from_str(&text)?;
        self.inner
            .tokens
            .save(&pair.access, Some(&pair.refresh))
            .await?;
        tracing::info!(username = %username, "Obtained API tokens");
        Ok(())
    }

    /// Exchange the stored refresh token for a new access token.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        self.refresh_access().await.map(|_| ())
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.inner.tokens.clear().await?;
        Ok(())
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(self.inner.tokens.access().await, Ok(Some(_)))
    }

    async fn refresh_access(&self) -> Result<SecretString, ApiError> {
        let refresh = self
            .inner
            .tokens
            .refresh()
            .await?
            .ok_or(ApiError::NoRefreshToken)?;
        let body = serde_json::json!({ "refresh": refresh.expose_secret() });
        let request = self.request(Method::POST, "token/refresh/", Body::Json(body), false)?;

        // Sent directly: a 401 here must not start another refresh.
        let response = self.send_once(&request, None).await?;
        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }
        let token: RefreshedToken = serde_json::from_str(&read_limited_text(response).await?)?;
        self.inner
            .tokens
            .save(&token.access, token.refresh.as_deref())
            .await?;
        tracing::debug!("Access token refreshed");
        Ok(SecretString::from(token.access))
    }

    // ========================================================================
    // Content resources
    // ========================================================================

    pub async fn list<T: Resource>(&self) -> Result<Vec<T>, ApiError> {
        let request = self.request(Method::GET, T::KIND.endpoint(), Body::Empty, true)?;
        let text = self.execute(&request).await?;
        Ok(serde_json::from_str::<Listing<T>>(&text)?.into_vec())
    }

    pub async fn get<T: Resource>(&self, id: i64) -> Result<T, ApiError> {
        let request = self.request(Method::GET, &item_path::<T>(id), Body::Empty, true)?;
        let text = self.execute(&request).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn create<T: Resource>(&self, item: &T) -> Result<T, ApiError> {
        let body = resource_body(item).await?;
        let request = self.request(Method::POST, T::KIND.endpoint(), body, true)?;
        let text = self.execute(&request).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn update<T: Resource>(&self, id: i64, item: &T) -> Result<T, ApiError> {
        let body = resource_body(item).await?;
        let request = self.request(Method::PUT, &item_path::<T>(id), body, true)?;
        let text = self.execute(&request).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn delete<T: Resource>(&self, id: i64) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &item_path::<T>(id), Body::Empty, true)?;
        self.execute(&request).await?;
        Ok(())
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        let request = self.request(Method::GET, "dashboard/", Body::Empty, true)?;
        let text = self.execute(&request).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Answer a feedback message. The server marks it resolved.
    pub async fn respond_feedback(&self, id: i64, response: &str) -> Result<(), ApiError> {
        let body = Body::Json(serde_json::json!({ "response": response }));
        let path = format!("{}respond/", item_path::<Feedback>(id));
        let request = self.request(Method::POST, &path, body, true)?;
        self.execute(&request).await?;
        Ok(())
    }

    pub async fn update_contact_info(
        &self,
        id: i64,
        info: &ContactInfo,
    ) -> Result<ContactInfo, ApiError> {
        let body = Body::Json(serde_json::to_value(info)?);
        let request = self.request(Method::PUT, &format!("contact-info/{id}/"), body, true)?;
        let text = self.execute(&request).await?;
        Ok(serde_json::from_str(&text)?)
    }

    // ========================================================================
    // Public (unauthenticated) endpoints
    // ========================================================================

    pub async fn public_list<T: Resource>(&self) -> Result<Vec<T>, ApiError> {
        let url = self.inner.public_url.join(T::KIND.endpoint())?;
        let request = ApiRequest {
            method: Method::GET,
            url,
            body: Body::Empty,
            authenticated: false,
        };
        let text = self.execute(&request).await?;
        Ok(serde_json::from_str::<Listing<T>>(&text)?.into_vec())
    }

    pub async fn contact_info(&self) -> Result<Vec<ContactInfo>, ApiError> {
        let url = self.inner.public_url.join("contact-info/")?;
        let request = ApiRequest {
            method: Method::GET,
            url,
            body: Body::Empty,
            authenticated: false,
        };
        let text = self.execute(&request).await?;
        Ok(serde_json::from_str::<Listing<ContactInfo>>(&text)?.into_vec())
    }

    pub async fn submit_feedback(&self, feedback: &Feedback) -> Result<(), ApiError> {
        let url = self.inner.public_url.join("feedback/submit/")?;
        let body = serde_json::json!({
            "name": feedback.name,
            "email": feedback.email,
            "message": feedback.message,
        });
        let request = ApiRequest {
            method: Method::POST,
            url,
            body: Body::Json(body),
            authenticated: false,
        };
        self.execute(&request).await?;
        Ok(())
    }

    // ========================================================================
    // Transport
    // ========================================================================

    fn request(
        &self,
        method: Method,
        path: &str,
        body: Body,
        authenticated: bool,
    ) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest {
            method,
            url: self.inner.base_url.join(path)?,
            body,
            authenticated,
        })
    }

    /// Send `request`, refreshing the access token once on 401.
    async fn execute(&self, request: &ApiRequest) -> Result<String, ApiError> {
        let access = if request.authenticated {
            let token = self.inner.tokens.access().await?;
            if token.is_none() {
                tracing::warn!(url = %request.url, "No access token found, sending unauthenticated");
            }
            token
        } else {
            None
        };

        let response = self.send_once(request, access.as_ref()).await?;
        let status = response.status();
        if status.is_success() {
            return read_limited_text(response).await;
        }

        let body = read_error_body(response).await;
        tracing::error!(status = status.as_u16(), url = %request.url, body = %body, "API error");

        if status == StatusCode::UNAUTHORIZED && request.authenticated {
            return self.refresh_and_retry(request).await;
        }

        Err(ApiError::Http {
            status: status.as_u16(),
            body,
        })
    }

    async fn refresh_and_retry(&self, request: &ApiRequest) -> Result<String, ApiError> {
        let access = match self.refresh_access().await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "Token refresh failed");
                self.inner.tokens.end_session().await;
                return Err(ApiError::AuthenticationFailed);
            }
        };

        let response = self.send_once(request, Some(&access)).await?;
        let status = response.status();
        if status.is_success() {
            return read_limited_text(response).await;
        }

        let body = read_error_body(response).await;
        tracing::error!(status = status.as_u16(), url = %request.url, body = %body, "API error after token refresh");
        if status == StatusCode::UNAUTHORIZED {
            self.inner.tokens.end_session().await;
            return Err(ApiError::AuthenticationFailed);
        }
        Err(ApiError::Http {
            status: status.as_u16(),
            body,
        })
    }

    async fn send_once(
        &self,
        request: &ApiRequest,
        access: Option<&SecretString>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), request.url.clone());

        if let Some(token) = access {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()));
        }

        builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(value)?),
            // No explicit content type: reqwest adds the multipart boundary.
            Body::Multipart(parts) => builder.multipart(build_form(parts)),
        };

        tracing::debug!(method = %request.method, url = %request.url, "API request");
        tokio::time::timeout(self.inner.timeout, builder.send())
            .await
            .map_err(|_| ApiError::Timeout)?
            .map_err(|e| {
                tracing::error!(url = %request.url, error = %e, "API request failed");
                ApiError::Network(e)
            })
    }
}

fn item_path<T: Resource>(id: i64) -> String {
    format!("{}{}/", T::KIND.endpoint(), id)
}

/// JSON for plain records; multipart when the record carries a file to upload.
async fn resource_body<T: Resource>(item: &T) -> Result<Body, ApiError> {
    let value = serde_json::to_value(item)?;
    let (Some(field), Some(path)) = (T::UPLOAD_FIELD, item.upload()) else {
        return Ok(Body::Json(value));
    };

    let mut parts = Vec::new();
    if let serde_json::Value::Object(map) = value {
        for (name, v) in map {
            if name == field {
                continue;
            }
            let text = match v {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            parts.push(FormPart::Text { name, value: text });
        }
    }
    parts.push(read_upload(field, path).await?);
    Ok(Body::Multipart(parts))
}

async fn read_upload(field: &str, path: &Path) -> Result<FormPart, ApiError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Upload {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(FormPart::File {
        name: field.to_string(),
        file_name,
        bytes,
    })
}

fn build_form(parts: &[FormPart]) -> reqwest::multipart::Form {
    parts
        .iter()
        .fold(reqwest::multipart::Form::new(), |form, part| match part {
            FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
            FormPart::File {
                name,
                file_name,
                bytes,
            } => form.part(
                name.clone(),
                reqwest::multipart::Part::bytes(bytes.clone()).file_name(file_name.clone()),
            ),
        })
}

/// Read a response body, refusing anything over [`MAX_RESPONSE_SIZE`].
async fn read_limited_text(response: reqwest::Response) -> Result<String, ApiError> {
    if response
        .content_length()
        .is_some_and(|len| len > MAX_RESPONSE_SIZE as u64)
    {
        return Err(ApiError::ResponseTooLarge(MAX_RESPONSE_SIZE));
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > MAX_RESPONSE_SIZE {
            return Err(ApiError::ResponseTooLarge(MAX_RESPONSE_SIZE));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Body of an error response, cut at [`MAX_ERROR_BODY`] bytes. Read
/// failures give whatever arrived before them.
async fn read_error_body(response: reqwest::Response) -> String {
    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while bytes.len() < MAX_ERROR_BODY {
        match stream.next().await {
            Some(Ok(chunk)) => bytes.extend_from_slice(&chunk),
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Failed to read error body");
                break;
            }
            None => break,
        }
    }
    bytes.truncate(MAX_ERROR_BODY);
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Download, Faq, FormFields, News};
    use crate::storage::{MemoryStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SESSION_LOGGED_IN_KEY};
    use wiremock::matchers::{
        body_json, body_string_contains, header, header_regex, method, path,
    };
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer, store: Arc<MemoryStore>) -> ApiClient {
        let base = Url::parse(&format!("{}/api/", server.uri())).unwrap();
        let public = base.join("public/").unwrap();
        ApiClient::new(base, public, Duration::from_secs(5), store)
    }

    fn faq_json(id: i64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "question": "How do I join?",
            "category": "membership",
            "answer": "Visit any branch."
        })
    }

    #[tokio::test]
    async fn test_list_accepts_paged_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/faqs/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "results": [faq_json(1), faq_json(2)] })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(MemoryStore::new())).await;
        let faqs: Vec<Faq> = client.list().await.unwrap();
        assert_eq!(faqs.len(), 2);
        assert_eq!(faqs[1].id, Some(2));
    }

    #[tokio::test]
    async fn test_list_accepts_bare_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/faqs/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([faq_json(3)])))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(MemoryStore::new())).await;
        let faqs: Vec<Faq> = client.list().await.unwrap();
        assert_eq!(faqs.len(), 1);
    }

    #[tokio::test]
    async fn test_bearer_token_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/faqs/"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store.set(ACCESS_TOKEN_KEY, "abc").await.unwrap();
        let client = client_for(&server, store).await;
        let faqs: Vec<Faq> = client.list().await.unwrap();
        assert!(faqs.is_empty());
    }

    #[tokio::test]
    async fn test_login_persists_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token/"))
            .and(body_json(
                serde_json::json!({ "username": "admin", "password": "admin123" }),
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access": "a1", "refresh": "r1" })),
            )
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let client = client_for(&server, store.clone()).await;
        client
            .login("admin", &SecretString::from("admin123".to_string()))
            .await
            .unwrap();

        assert_eq!(store.raw(ACCESS_TOKEN_KEY).as_deref(), Some("a1"));
        assert_eq!(store.raw(REFRESH_TOKEN_KEY).as_deref(), Some("r1"));
        assert!(client.is_authenticated().await);

        client.logout().await.unwrap();
        assert_eq!(store.raw(ACCESS_TOKEN_KEY), None);
        assert!(!client.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_http_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/news/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(MemoryStore::new())).await;
        let err = client.list::<News>().await.unwrap_err();
        match err {
            ApiError::Http { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_401_refreshes_once_and_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/faqs/"))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/faqs/"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([faq_json(1)])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/token/refresh/"))
            .and(body_json(serde_json::json!({ "refresh": "r1" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access": "fresh" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store.set(ACCESS_TOKEN_KEY, "stale").await.unwrap();
        store.set(REFRESH_TOKEN_KEY, "r1").await.unwrap();

        let client = client_for(&server, store.clone()).await;
        let faqs: Vec<Faq> = client.list().await.unwrap();
        assert_eq!(faqs.len(), 1);
        assert_eq!(store.raw(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
        assert_eq!(store.raw(REFRESH_TOKEN_KEY).as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_session_without_looping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/news/"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/token/refresh/"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store.set(ACCESS_TOKEN_KEY, "stale").await.unwrap();
        store.set(REFRESH_TOKEN_KEY, "expired").await.unwrap();
        store.set(SESSION_LOGGED_IN_KEY, "true").await.unwrap();

        let client = client_for(&server, store.clone()).await;
        let err = client.list::<News>().await.unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationFailed));
        assert_eq!(store.raw(ACCESS_TOKEN_KEY), None);
        assert_eq!(store.raw(REFRESH_TOKEN_KEY), None);
        assert_eq!(store.raw(SESSION_LOGGED_IN_KEY), None);
    }

    #[tokio::test]
    async fn test_retry_401_after_refresh_is_final() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/news/"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access": "fresh" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store.set(REFRESH_TOKEN_KEY, "r1").await.unwrap();
        let client = client_for(&server, store.clone()).await;

        let err = client.list::<News>().await.unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationFailed));
        assert_eq!(store.raw(ACCESS_TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn test_401_without_refresh_token_fails_fast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/news/"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/token/refresh/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(MemoryStore::new())).await;
        let err = client.list::<News>().await.unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn test_create_json_sets_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/faqs/"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(201).set_body_json(faq_json(9)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(MemoryStore::new())).await;
        let faq = Faq::from_form(
            &FormFields::new()
                .with("question", "How do I join?")
                .with("category", "membership")
                .with("answer", "Visit any branch."),
        )
        .unwrap();
        let created = client.create(&faq).await.unwrap();
        assert_eq!(created.id, Some(9));
    }

    #[tokio::test]
    async fn test_upload_sent_as_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/downloads/"))
            .and(header_regex("content-type", "^multipart/form-data; boundary="))
            .and(body_string_contains("Annual report 2025"))
            .and(body_string_contains("%PDF-1.4"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": 5,
                "title": "Annual report 2025",
                "file_type": "financial_report",
                "description": "",
                "file": "/media/downloads/report.pdf"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let file = std::env::temp_dir().join(format!("sacco-upload-{}.pdf", std::process::id()));
        std::fs::write(&file, b"%PDF-1.4 test").unwrap();

        let client = client_for(&server, Arc::new(MemoryStore::new())).await;
        let download = Download::from_form(
            &FormFields::new()
                .with("title", "Annual report 2025")
                .with("file_type", "financial_report")
                .with("upload", file.display().to_string()),
        )
        .unwrap();
        let created = client.create(&download).await.unwrap();
        assert_eq!(created.id, Some(5));
        assert_eq!(created.file.as_deref(), Some("/media/downloads/report.pdf"));

        std::fs::remove_file(&file).ok();
    }

    #[tokio::test]
    async fn test_missing_upload_file_is_reported() {
        let server = MockServer::start().await;
        let client = client_for(&server, Arc::new(MemoryStore::new())).await;
        let download = Download::from_form(
            &FormFields::new()
                .with("title", "Ghost")
                .with("file_type", "other")
                .with("upload", "/no/such/file.pdf"),
        )
        .unwrap();
        assert!(matches!(
            client.create(&download).await,
            Err(ApiError::Upload { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/faqs/4/"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(MemoryStore::new())).await;
        client.delete::<Faq>(4).await.unwrap();
    }

    #[tokio::test]
    async fn test_public_submit_feedback_is_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/public/feedback/submit/"))
            .and(body_json(serde_json::json!({
                "name": "Jane",
                "email": "jane@x.com",
                "message": "Hello there!"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store.set(ACCESS_TOKEN_KEY, "abc").await.unwrap();
        let client = client_for(&server, store).await;
        let feedback =
            Feedback::new("Jane", "jane@x.com", "Hello there!", chrono::Utc::now()).unwrap();
        client.submit_feedback(&feedback).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dashboard/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_news": 4,
                "total_faqs": 2,
                "total_members": 120
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(MemoryStore::new())).await;
        let stats = client.dashboard_stats().await.unwrap();
        assert_eq!(stats.total_news, 4);
        assert_eq!(stats.total_faqs, 2);
        assert_eq!(stats.total_gallery, 0);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let base = Url::parse("http://127.0.0.1:9/api/").unwrap();
        let client = ApiClient::new(
            base.clone(),
            base.join("public/").unwrap(),
            Duration::from_secs(5),
            Arc::new(MemoryStore::new()),
        );
        let err = client.list::<News>().await.unwrap_err();
        assert!(err.is_unreachable());
    }

    #[tokio::test]
    async fn test_respond_feedback_posts_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/feedback/12/respond/"))
            .and(header("authorization", "Bearer abc"))
            .and(body_json(serde_json::json!({ "response": "We open on Monday." })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Response sent successfully"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store.set(ACCESS_TOKEN_KEY, "abc").await.unwrap();
        let client = client_for(&server, store).await;
        client
            .respond_feedback(12, "We open on Monday.")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_body_is_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/faqs/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(100_000)))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(MemoryStore::new())).await;
        match client.list::<Faq>().await.unwrap_err() {
            ApiError::Http { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), MAX_ERROR_BODY);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
