//! Authenticated REST client: current user and notices.

use anyhow::Context;
use chrono::NaiveDateTime;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::session::UserProfile;

/// Request timeout for every call.
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Timestamp format used by the server (no zone, no fraction).
const API_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ── Wire models ─────────────────────────────────────────────────────

/// Error payload carried by non-2xx responses.
///
/// `message` is required: a body without it counts as malformed.
#[derive(Debug, Clone, Deserialize)]
pub struct RestError {
    pub message: String,
}

/// A single notice board entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Notice {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    /// Publication time in the server's `yyyy-MM-ddTHH:mm:ss` format.
    #[serde(default, deserialize_with = "opt_api_datetime")]
    pub created_at: Option<NaiveDateTime>,
}

fn opt_api_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => NaiveDateTime::parse_from_str(&raw, API_DATE_FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

// ── Outcome taxonomy ────────────────────────────────────────────────

/// How a fetch can fail. No variant is retried.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered non-2xx with a well-formed error body.
    #[error("{message}")]
    Rest { message: String },
    /// No usable response: connectivity, timeout, or an unreadable body.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx whose error body failed to parse. User-facing this is a
    /// transport failure; the distinction exists for diagnostics.
    #[error("malformed error body (status {status})")]
    MalformedErrorBody { status: u16 },
}

impl ApiError {
    /// What the user sees. Server messages pass through verbatim; anything
    /// without a well-formed message collapses to a generic line, with the
    /// cause left to the log.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rest { message } => message.clone(),
            Self::Transport(_) | Self::MalformedErrorBody { .. } => {
                "Sorry, can't fetch data".to_string()
            }
        }
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// REST client for one authentication context.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Build a client for the given server. When a non-empty token is
    /// supplied, every request carries it verbatim in `Authorization`.
    pub fn new(server_url: &str, auth_token: Option<&str>) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = auth_token.filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(token)
                .context("auth token is not a valid header value")?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            base_url: server_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// `GET /user`: the signed-in user's profile.
    pub async fn fetch_current_user(&self) -> Result<UserProfile, ApiError> {
        self.get_json("user").await
    }

    /// `GET /notices`: the notice board.
    pub async fn fetch_notices(&self) -> Result<Vec<Notice>, ApiError> {
        self.get_json("notices").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.http.get(self.endpoint(path)).send().await?;
        let status = resp.status();

        if status.is_success() {
            return Ok(resp.json().await?);
        }

        let body = resp.bytes().await?;
        match serde_json::from_slice::<RestError>(&body) {
            Ok(rest) => Err(ApiError::Rest {
                message: rest.message,
            }),
            Err(parse_err) => {
                tracing::debug!(
                    status = status.as_u16(),
                    "error body did not parse: {parse_err}"
                );
                Err(ApiError::MalformedErrorBody {
                    status: status.as_u16(),
                })
            }
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn authed(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Some("abc123")).unwrap()
    }

    #[tokio::test]
    async fn fetch_user_parses_sparse_body_with_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 1,
                "first_name": "A",
            })))
            .mount(&server)
            .await;

        let profile = authed(&server).fetch_current_user().await.unwrap();
        assert_eq!(profile.id, 1);
        assert_eq!(profile.first_name, "A");
        assert_eq!(profile.last_name, "");
        assert_eq!(profile.admission_year, 0);
        assert!(!profile.is_admin);
    }

    #[tokio::test]
    async fn auth_header_is_sent_verbatim() {
        let server = MockServer::start().await;
        // The mock only matches when Authorization carries the raw token,
        // unprefixed. A missed match fails the expect(1) on server drop.
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("Authorization", "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        authed(&server).fetch_current_user().await.unwrap();
    }

    #[tokio::test]
    async fn rest_error_message_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"message": "unauthorized"})),
            )
            .mount(&server)
            .await;

        let err = authed(&server).fetch_current_user().await.unwrap_err();
        match &err {
            ApiError::Rest { message } => assert_eq!(message, "unauthorized"),
            other => panic!("expected Rest, got {other:?}"),
        }
        assert_eq!(err.user_message(), "unauthorized");
    }

    #[tokio::test]
    async fn non_json_error_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = authed(&server).fetch_current_user().await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedErrorBody { status: 500 }));
        assert_eq!(err.user_message(), "Sorry, can't fetch data");
    }

    #[tokio::test]
    async fn error_body_without_message_field_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(serde_json::json!({"code": 9})),
            )
            .mount(&server)
            .await;

        let err = authed(&server).fetch_current_user().await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedErrorBody { status: 403 }));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_failure() {
        // Grab a port that was live and no longer is.
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let client = ApiClient::new(&uri, Some("abc123")).unwrap();
        let err = client.fetch_current_user().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(err.user_message(), "Sorry, can't fetch data");
    }

    #[tokio::test]
    async fn fetch_notices_parses_timestamps() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"title": "Holiday", "message": "Campus closed", "created_at": "2016-04-09T18:30:00"},
                {"title": "Exam", "message": "Hall A"},
            ])))
            .mount(&server)
            .await;

        let notices = authed(&server).fetch_notices().await.unwrap();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].title, "Holiday");
        let ts = notices[0].created_at.unwrap();
        assert_eq!(
            ts,
            NaiveDateTime::parse_from_str("2016-04-09T18:30:00", API_DATE_FORMAT).unwrap()
        );
        assert!(notices[1].created_at.is_none());
    }

    #[tokio::test]
    async fn notices_share_the_error_contract() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notices"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"message": "unauthorized"})),
            )
            .mount(&server)
            .await;

        let err = authed(&server).fetch_notices().await.unwrap_err();
        assert!(matches!(err, ApiError::Rest { .. }));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = ApiClient::new("https://campus.example.edu/api/v1/", None).unwrap();
        assert_eq!(
            client.endpoint("user"),
            "https://campus.example.edu/api/v1/user"
        );
    }

    #[test]
    fn token_with_control_characters_is_rejected() {
        let result = ApiClient::new("https://campus.example.edu", Some("bad\ntoken"));
        assert!(result.is_err());
    }

    #[test]
    fn empty_token_builds_unauthenticated_client() {
        let client = ApiClient::new("https://campus.example.edu", Some(""));
        assert!(client.is_ok());
    }
}
