//! The authenticated request pipeline.
//!
//! Every call to the service goes through [`RequestPipeline::send`], which
//! attaches the current bearer token, merges caller headers, performs exactly
//! one HTTP exchange and turns the response into either the caller's type or
//! an [`ApiError`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{AbortRegistration, Abortable};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::SessionView;
use crate::config::Config;

use super::{ApiError, ApiResult};

// ============================================================================
// Constants
// ============================================================================

/// Default per-request timeout in seconds, used when the config has none.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const JSON_CONTENT_TYPE: &str = "application/json";

// ============================================================================
// Outbound request
// ============================================================================

/// One call to the service, consumed by `RequestPipeline::send`.
pub struct OutboundRequest {
    endpoint: String,
    method: Method,
    body: Option<Value>,
    extra_headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    cancel: Option<AbortRegistration>,
}

impl OutboundRequest {
    /// `endpoint` is a path (optionally with a query string) relative to the
    /// configured base URL.
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            body: None,
            extra_headers: Vec::new(),
            timeout: None,
            cancel: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    /// Attach a JSON body
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` and attach it
    pub fn json<B: Serialize>(self, body: &B) -> ApiResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("body could not be encoded: {}", e)))?;
        Ok(self.body(value))
    }

    /// Add a header. Caller headers win over the pipeline defaults, except
    /// `Authorization`, which only the pipeline sets.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    /// Override the pipeline's default timeout for this call
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Make this call cancellable through the `AbortHandle` paired with `registration`
    pub fn cancel_with(mut self, registration: AbortRegistration) -> Self {
        self.cancel = Some(registration);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> &Method {
        &self.method
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// A request ready to go out, with its credential already attached
struct Prepared {
    builder: RequestBuilder,
    endpoint: String,
    after: Duration,
    cancel: Option<AbortRegistration>,
}

/// Sends requests on behalf of whoever is signed in.
///
/// Clone is cheap - the reqwest client and the session handle are shared.
#[derive(Clone)]
pub struct RequestPipeline {
    client: Client,
    base_url: String,
    session: Arc<dyn SessionView>,
    default_timeout: Duration,
}

impl RequestPipeline {
    pub fn new(base_url: impl Into<String>, session: Arc<dyn SessionView>) -> ApiResult<Self> {
        // The cookie store carries the service's session cookie on every call,
        // independent of the bearer token.
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(concat!("coachline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            session,
            default_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn from_config(config: &Config, session: Arc<dyn SessionView>) -> ApiResult<Self> {
        Ok(Self::new(config.api_base_url.clone(), session)?.with_timeout(config.request_timeout()))
    }

    /// Set the timeout used by requests that do not set their own
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, endpoint: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if endpoint.starts_with('/') {
            format!("{}{}", base, endpoint)
        } else {
            format!("{}/{}", base, endpoint)
        }
    }

    /// Perform `request` and decode the response as `T`.
    ///
    /// The credential is read here, when `send` is called, not when the
    /// returned future is first polled; signing out afterwards does not
    /// affect this request. `204 No Content` resolves to `T` built from JSON
    /// `null`, which suits `()`, `Option<_>` and `serde_json::Value`.
    pub fn send<T: DeserializeOwned>(
        &self,
        request: OutboundRequest,
    ) -> impl Future<Output = ApiResult<T>> {
        let credential = self.session.current_credential();
        let prepared = self.prepare(request, credential.as_deref());

        async move {
            let Prepared {
                builder,
                endpoint,
                after,
                cancel,
            } = prepared?;

            let exchange = tokio::time::timeout(after, Self::exchange(builder, &endpoint, after));
            let outcome = match cancel {
                Some(registration) => match Abortable::new(exchange, registration).await {
                    Ok(outcome) => outcome,
                    Err(_aborted) => {
                        debug!(endpoint = %endpoint, "Request cancelled");
                        return Err(ApiError::Cancelled {
                            endpoint: endpoint.clone(),
                        });
                    }
                },
                None => exchange.await,
            };

            let (status, bytes) = match outcome {
                Ok(result) => result?,
                Err(_elapsed) => {
                    warn!(endpoint = %endpoint, timeout_ms = after.as_millis() as u64, "Request timed out");
                    return Err(ApiError::Timeout { endpoint, after });
                }
            };

            Self::normalize(&endpoint, status, &bytes)
        }
    }

    /// Build the HTTP request with the given credential
    fn prepare(&self, request: OutboundRequest, credential: Option<&str>) -> ApiResult<Prepared> {
        let OutboundRequest {
            endpoint,
            method,
            body,
            extra_headers,
            timeout,
            cancel,
        } = request;

        let headers = build_headers(credential, &extra_headers)?;

        debug!(
            method = %method,
            endpoint = %endpoint,
            authenticated = credential.is_some(),
            "Sending request"
        );

        let mut builder = self
            .client
            .request(method, self.url_for(&endpoint))
            .headers(headers);
        if let Some(body) = body {
            let bytes = serde_json::to_vec(&body).map_err(|e| {
                ApiError::InvalidRequest(format!("body could not be encoded: {}", e))
            })?;
            builder = builder.body(bytes);
        }

        Ok(Prepared {
            builder,
            endpoint,
            after: timeout.unwrap_or(self.default_timeout),
            cancel,
        })
    }

    /// Issue the request and read the whole body
    async fn exchange(
        builder: RequestBuilder,
        endpoint: &str,
        after: Duration,
    ) -> ApiResult<(StatusCode, Vec<u8>)> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, endpoint, after))?;

        let status = response.status();
        debug!(endpoint = endpoint, status = status.as_u16(), "Received response");

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_transport(e, endpoint, after))?;
        Ok((status, bytes.to_vec()))
    }

    /// Turn a status and body into the caller's value or an error
    fn normalize<T: DeserializeOwned>(endpoint: &str, status: StatusCode, bytes: &[u8]) -> ApiResult<T> {
        if !status.is_success() {
            warn!(endpoint = endpoint, status = status.as_u16(), "Request failed");
            return Err(ApiError::from_response(status, bytes));
        }

        let decode_error = |source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        };

        if status == StatusCode::NO_CONTENT || bytes.is_empty() {
            return serde_json::from_value(Value::Null).map_err(decode_error);
        }

        serde_json::from_slice(bytes).map_err(decode_error)
    }
}

/// Check that an id can be spliced into a path as a single segment
pub(crate) fn path_segment(id: &str) -> ApiResult<&str> {
    let valid = !matches!(id, "" | "." | "..")
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(id)
    } else {
        Err(ApiError::InvalidRequest(format!("invalid id {:?}", id)))
    }
}

/// Merge the default headers, the caller's headers and the credential.
///
/// Caller headers replace defaults of the same name. A caller-supplied
/// `Authorization` is always dropped, so the header is present exactly when a
/// credential is.
fn build_headers(credential: Option<&str>, extra: &[(String, String)]) -> ApiResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ApiError::InvalidRequest(format!("invalid header name {:?}", name)))?;
        if name == header::AUTHORIZATION {
            warn!("Ignoring caller-supplied Authorization header");
            continue;
        }
        let value = HeaderValue::from_str(value).map_err(|_| {
            ApiError::InvalidRequest(format!("invalid value for header {}", name))
        })?;
        headers.insert(name, value);
    }

    if let Some(token) = credential {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            ApiError::InvalidRequest("credential contains characters not allowed in a header".to_string())
        })?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionState;

    fn extra(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_headers_without_credential() {
        let headers = build_headers(None, &[]).unwrap();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/json");
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_headers_with_credential() {
        let headers = build_headers(Some("tok123"), &[]).unwrap();
        let auth: Vec<_> = headers.get_all(header::AUTHORIZATION).iter().collect();
        assert_eq!(auth.len(), 1);
        assert_eq!(auth[0], "Bearer tok123");
        assert!(auth[0].is_sensitive());
    }

    #[test]
    fn test_caller_overrides_defaults() {
        let headers = build_headers(
            None,
            &extra(&[("Content-Type", "application/merge-patch+json"), ("X-Trace", "abc")]),
        )
        .unwrap();
        assert_eq!(
            headers.get(header::CONTENT_TYPE).unwrap(),
            "application/merge-patch+json"
        );
        assert_eq!(headers.get("x-trace").unwrap(), "abc");
    }

    #[test]
    fn test_caller_cannot_touch_authorization() {
        let headers = build_headers(Some("real"), &extra(&[("authorization", "Bearer forged")])).unwrap();
        let auth: Vec<_> = headers.get_all(header::AUTHORIZATION).iter().collect();
        assert_eq!(auth, vec!["Bearer real"]);

        let headers = build_headers(None, &extra(&[("Authorization", "Bearer forged")])).unwrap();
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_invalid_headers_rejected() {
        assert!(matches!(
            build_headers(None, &extra(&[("bad header", "x")])),
            Err(ApiError::InvalidRequest(_))
        ));
        assert!(matches!(
            build_headers(None, &extra(&[("x-ok", "line\nbreak")])),
            Err(ApiError::InvalidRequest(_))
        ));
        assert!(matches!(
            build_headers(Some("tok\r\nen"), &[]),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_path_segment() {
        assert_eq!(path_segment("5f0c6c1e-6a53-4a0e").unwrap(), "5f0c6c1e-6a53-4a0e");
        assert!(path_segment("").is_err());
        assert!(path_segment("../auth/me").is_err());
        assert!(path_segment("1?limit=9").is_err());
        assert!(path_segment("a b").is_err());
        assert!(path_segment("..").is_err());
        assert!(path_segment("v1.2").is_ok());
    }

    #[test]
    fn test_url_for_joins_paths() {
        let session = SessionState::new();
        let pipeline = RequestPipeline::new("http://localhost:8000/", Arc::new(session)).unwrap();
        assert_eq!(pipeline.url_for("/sessions"), "http://localhost:8000/sessions");
        assert_eq!(pipeline.url_for("sessions/1"), "http://localhost:8000/sessions/1");
        assert_eq!(
            pipeline.url_for("/admin/users/?limit=20&offset=0"),
            "http://localhost:8000/admin/users/?limit=20&offset=0"
        );
    }

    #[test]
    fn test_normalize_no_content() {
        let unit: ApiResult<()> = RequestPipeline::normalize("/auth/logout", StatusCode::NO_CONTENT, b"");
        assert!(unit.is_ok());

        let value: Value = RequestPipeline::normalize("/x", StatusCode::NO_CONTENT, b"ignored").unwrap();
        assert_eq!(value, Value::Null);

        let opt: Option<Vec<String>> = RequestPipeline::normalize("/x", StatusCode::OK, b"").unwrap();
        assert!(opt.is_none());
    }

    #[test]
    fn test_normalize_failure_is_structured() {
        let err = RequestPipeline::normalize::<Value>("/x", StatusCode::UNAUTHORIZED, b"")
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert!(err.body().unwrap().is_empty());
    }

    #[test]
    fn test_normalize_decode_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Token {
            #[allow(dead_code)]
            access_token: String,
        }
        let err = RequestPipeline::normalize::<Token>("/auth/login", StatusCode::OK, br#"{"nope": 1}"#)
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode { ref endpoint, .. } if endpoint == "/auth/login"));

        let err = RequestPipeline::normalize::<Token>("/auth/login", StatusCode::NO_CONTENT, b"")
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[test]
    fn test_request_builders() {
        let req = OutboundRequest::put("/sessions/1/cancel")
            .header("X-Trace", "1")
            .timeout(Duration::from_secs(2));
        assert_eq!(req.method(), &Method::PUT);
        assert_eq!(req.endpoint(), "/sessions/1/cancel");
        assert_eq!(req.timeout, Some(Duration::from_secs(2)));

        let req = OutboundRequest::post("/auth/login")
            .json(&serde_json::json!({"email": "a@b.c"}))
            .unwrap();
        assert_eq!(req.body.unwrap()["email"], "a@b.c");
    }
}
