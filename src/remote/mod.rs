//! HTTP client for the retail API.
//!
//! Only the calls the offline store needs: submitting queued records,
//! refreshing the flavor catalog, and logging in and out.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::config::RemoteConfig;
use crate::error::StewardError;
use crate::queue::QueueName;
use crate::session::Session;
use crate::sync::Submitter;

/// Endpoint that accepts records from a queue.
#[must_use]
pub const fn submit_endpoint(queue: QueueName) -> &'static str {
    match queue {
        QueueName::Inventory => "/inventory/daily/bulk",
        QueueName::Sales => "/sales/daily",
        QueueName::Receipts => "/inventory/receipts/bulk",
    }
}

/// Blocking API client carrying the session's bearer token.
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for the configured API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &RemoteConfig, session: &Session) -> Result<Self, StewardError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("steward/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: session.token.clone(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Value, StewardError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);

        if status == StatusCode::UNAUTHORIZED {
            return Err(StewardError::Unauthorized(
                error_detail(&body).unwrap_or("session expired").to_string(),
            ));
        }

        if !status.is_success() {
            let detail = error_detail(&body).unwrap_or("Something went wrong");
            return Err(StewardError::Remote(format!("{status}: {detail}")));
        }

        Ok(body)
    }

    /// Log in and return the new session.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for bad credentials and `Remote` for other
    /// failures.
    pub fn login(&self, username: &str, password: &str) -> Result<Session, StewardError> {
        let body = self.send(
            self.http
                .post(self.url("/auth/login"))
                .json(&json!({ "username": username, "password": password })),
        )?;

        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| StewardError::Remote("login response has no access_token".to_string()))?;

        tracing::info!(username, "logged in");
        Ok(Session::new(token.to_string(), body.get("user").cloned()))
    }

    /// Tell the API the session is over.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn logout(&self) -> Result<(), StewardError> {
        self.send(self.http.post(self.url("/auth/logout")))?;
        Ok(())
    }

    /// Fetch the full flavor catalog.
    ///
    /// # Errors
    ///
    /// Returns `Remote` if the request fails or the body is not a list.
    pub fn fetch_flavors(&self) -> Result<Vec<Value>, StewardError> {
        match self.send(self.http.get(self.url("/flavors")))? {
            Value::Array(items) => Ok(items),
            _ => Err(StewardError::Remote(
                "flavor catalog response is not a list".to_string(),
            )),
        }
    }
}

impl Submitter for ApiClient {
    fn submit(&self, queue: QueueName, payload: &Value) -> Result<(), StewardError> {
        self.send(self.http.post(self.url(submit_endpoint(queue))).json(payload))?;
        Ok(())
    }
}

fn error_detail(body: &Value) -> Option<&str> {
    body.get("detail").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// Serve one canned response and hand back the raw request.
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/v1", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                request.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();
            request.push_str(&String::from_utf8(body).unwrap());

            stream.write_all(response.as_bytes()).unwrap();
            request
        });

        (url, handle)
    }

    fn client(url: &str, token: Option<&str>) -> ApiClient {
        let config = RemoteConfig {
            api_url: url.to_string(),
            timeout_secs: 5,
        };
        let session = Session {
            token: token.map(ToString::to_string),
            user: None,
        };
        ApiClient::new(&config, &session).unwrap()
    }

    #[test]
    fn test_submit_endpoints() {
        assert_eq!(submit_endpoint(QueueName::Inventory), "/inventory/daily/bulk");
        assert_eq!(submit_endpoint(QueueName::Sales), "/sales/daily");
        assert_eq!(submit_endpoint(QueueName::Receipts), "/inventory/receipts/bulk");
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let api = client("http://localhost:8000/api/v1/", None);
        assert_eq!(api.url("/flavors"), "http://localhost:8000/api/v1/flavors");
    }

    #[test]
    fn test_submit_posts_payload_with_token() {
        let (url, server) = serve_once("201 Created", r#"{"id": 77}"#);
        let api = client(&url, Some("tok-1"));

        api.submit(QueueName::Sales, &json!({"branch_id": 2, "total": 310}))
            .unwrap();

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /api/v1/sales/daily HTTP/1.1"));
        assert!(request.to_lowercase().contains("authorization: bearer tok-1"));
        assert!(request.contains(r#""total":310"#));
    }

    #[test]
    fn test_unauthorized_status() {
        let (url, server) = serve_once("401 Unauthorized", r#"{"detail": "Token expired"}"#);
        let api = client(&url, Some("old"));

        let err = api.submit(QueueName::Inventory, &json!({})).unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, StewardError::Unauthorized(ref msg) if msg == "Token expired"));
    }

    #[test]
    fn test_error_status_uses_detail() {
        let (url, server) = serve_once("422 Unprocessable Entity", r#"{"detail": "date required"}"#);
        let api = client(&url, None);

        let err = api.submit(QueueName::Receipts, &json!({})).unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, StewardError::Remote(ref msg) if msg.ends_with("date required")));
    }

    #[test]
    fn test_login_builds_session() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"access_token": "new-token", "user": {"username": "fe1", "role": "flavor_expert"}}"#,
        );
        let api = client(&url, None);

        let session = api.login("fe1", "secret").unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("POST /api/v1/auth/login"));
        assert_eq!(session.token.as_deref(), Some("new-token"));
        assert_eq!(session.username(), Some("fe1"));
    }

    #[test]
    fn test_fetch_flavors() {
        let (url, server) = serve_once("200 OK", r#"[{"id": 1, "name": "Vanilla"}]"#);
        let api = client(&url, Some("tok"));

        let flavors = api.fetch_flavors().unwrap();
        server.join().unwrap();

        assert_eq!(flavors, vec![json!({"id": 1, "name": "Vanilla"})]);
    }

    #[test]
    fn test_fetch_flavors_rejects_non_list() {
        let (url, server) = serve_once("200 OK", r#"{"items": []}"#);
        let api = client(&url, Some("tok"));

        assert!(matches!(api.fetch_flavors(), Err(StewardError::Remote(_))));
        server.join().unwrap();
    }

    #[test]
    fn test_unreachable_server_is_remote_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let api = client(&url, None);
        assert!(matches!(
            api.submit(QueueName::Sales, &json!({})),
            Err(StewardError::Remote(_))
        ));
    }
}
