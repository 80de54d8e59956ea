use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default backend base URL (override via config or --api)
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080/api";

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Canonical login response shape.
///
/// The backend signals success with a boolean flag in the body, not
/// with the HTTP status: `{"success": bool, "message"?, "role"?, "token"?}`.
/// Non-2xx responses whose body still parses as this shape are treated
/// as authentication failures; anything else is a network-class error.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Server answered and reported the login as failed
    #[error("{}", .message.as_deref().unwrap_or("Login failed"))]
    Rejected { message: Option<String> },

    /// Server claimed success but the payload is unusable
    #[error("Malformed response from server")]
    MalformedResponse,

    /// Request could not complete or the body was not the expected JSON
    #[error("Connection error. Please try again.")]
    Network(#[source] reqwest::Error),
}

/// Outcome of a successful login call: everything needed to build a Session.
#[derive(Debug)]
pub struct LoginSuccess {
    pub role: String,
    pub token: String,
    pub message: Option<String>,
}

/// Thin typed client over the authentication backend.
pub struct AuthApi {
    base_url: String,
    http: reqwest::Client,
}

impl AuthApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST credentials to `{base}/login`. Exactly one request per call;
    /// no retries, no client-side timeout beyond the transport's.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSuccess, AuthError> {
        let url = format!("{}/login", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(AuthError::Network)?;

        let status = response.status();
        let body: LoginResponse = response.json().await.map_err(AuthError::Network)?;

        if !body.success || !status.is_success() {
            tracing::debug!("Login rejected (status {})", status);
            return Err(AuthError::Rejected {
                message: body.message,
            });
        }

        match (body.role, body.token) {
            (Some(role), Some(token)) => Ok(LoginSuccess {
                role,
                token,
                message: body.message,
            }),
            _ => {
                tracing::warn!("Success response missing role or token");
                Err(AuthError::MalformedResponse)
            }
        }
    }

    /// GET `{base}/health`. Diagnostic only; the result is logged by the
    /// caller and never blocks the UI.
    pub async fn health(&self) -> Result<serde_json::Value, AuthError> {
        let url = format!("{}/health", self.base_url);

        self.http
            .get(&url)
            .send()
            .await
            .map_err(AuthError::Network)?
            .json()
            .await
            .map_err(AuthError::Network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_login_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "username": "demo",
                "password": "demo"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "role": "admin",
                "token": "abc123",
                "message": "Login successful!"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = AuthApi::new(server.uri());
        let out = api.login("demo", "demo").await.unwrap();

        assert_eq!(out.role, "admin");
        assert_eq!(out.token, "abc123");
        assert_eq!(out.message.as_deref(), Some("Login successful!"));
    }

    #[tokio::test]
    async fn test_login_rejected_with_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "message": "Invalid credentials"
            })))
            .mount(&server)
            .await;

        let api = AuthApi::new(server.uri());
        match api.login("demo", "wrong").await {
            Err(AuthError::Rejected { message }) => {
                assert_eq!(message.as_deref(), Some("Invalid credentials"));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_rejected_on_error_status() {
        let server = MockServer::start().await;

        // Backends that signal failure via HTTP status still get a
        // consistent auth error as long as the body parses
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "success": false
            })))
            .mount(&server)
            .await;

        let api = AuthApi::new(server.uri());
        match api.login("demo", "demo").await {
            Err(AuthError::Rejected { message }) => assert!(message.is_none()),
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_without_token_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "role": "admin"
            })))
            .mount(&server)
            .await;

        let api = AuthApi::new(server.uri());
        assert!(matches!(
            api.login("demo", "demo").await,
            Err(AuthError::MalformedResponse)
        ));
    }

    #[tokio::test]
    async fn test_non_json_body_is_network_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let api = AuthApi::new(server.uri());
        assert!(matches!(
            api.login("demo", "demo").await,
            Err(AuthError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Nothing listens here
        let api = AuthApi::new("http://127.0.0.1:1");
        assert!(matches!(
            api.login("demo", "demo").await,
            Err(AuthError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_health_returns_json() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "UP"
            })))
            .mount(&server)
            .await;

        let api = AuthApi::new(server.uri());
        let health = api.health().await.unwrap();
        assert_eq!(health["status"], "UP");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = AuthApi::new("http://localhost:8080/api/");
        assert_eq!(api.base_url(), "http://localhost:8080/api");
    }
}
