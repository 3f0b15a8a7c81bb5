//! Remote verification against the PageFreezer comparison service.
//!
//! The service fetches both pages itself, so only URLs are sent. The HTTP
//! call sits behind [`Transport`]; [`ReqwestTransport`] is the real one.

use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://api1.pagefreezer.com/v1/api/utils/diff/compare";
const USER_AGENT: &str = "pagediff/0.1 (+https://github.com/pagediff)";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageFreezerConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for PageFreezerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug)]
pub enum VerifyError {
    InvalidUrl { input: String, reason: url::ParseError },
    MissingApiKey,
    /// The HTTP client could not be constructed.
    Client(String),
    /// Transport failure: connect, TLS, timeout.
    Http(String),
    Status { status: u16, body: String },
    Decode(serde_json::Error),
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyError::InvalidUrl { input, reason } => {
                write!(f, "invalid url {input:?}: {reason}")
            }
            VerifyError::MissingApiKey => write!(f, "no PageFreezer api key configured"),
            VerifyError::Client(msg) => write!(f, "http client setup failed: {msg}"),
            VerifyError::Http(msg) => write!(f, "request failed: {msg}"),
            VerifyError::Status { status, body } => {
                write!(f, "service answered {status}: {body}")
            }
            VerifyError::Decode(err) => write!(f, "response is not json: {err}"),
        }
    }
}

impl std::error::Error for VerifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VerifyError::InvalidUrl { reason, .. } => Some(reason),
            VerifyError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport {
    fn post_json(&self, url: &str, api_key: &str, body: &Value) -> Result<HttpResponse, VerifyError>;
}

pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, VerifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VerifyError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn post_json(&self, url: &str, api_key: &str, body: &Value) -> Result<HttpResponse, VerifyError> {
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header("x-api-key", api_key)
            .json(body)
            .send()
            .map_err(|e| VerifyError::Http(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| VerifyError::Http(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

pub struct PageFreezer<T = ReqwestTransport> {
    endpoint: String,
    api_key: String,
    transport: T,
}

impl PageFreezer<ReqwestTransport> {
    pub fn from_config(config: &PageFreezerConfig) -> Result<Self, VerifyError> {
        let (endpoint, api_key) = checked_settings(config)?;
        let transport = ReqwestTransport::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            endpoint,
            api_key,
            transport,
        })
    }
}

impl<T: Transport> PageFreezer<T> {
    pub fn with_transport(config: &PageFreezerConfig, transport: T) -> Result<Self, VerifyError> {
        let (endpoint, api_key) = checked_settings(config)?;
        Ok(Self {
            endpoint,
            api_key,
            transport,
        })
    }

    /// Asks the service to compare the pages at `a_url` and `b_url` and
    /// returns its JSON answer untouched.
    pub fn compare(&self, a_url: &str, b_url: &str) -> Result<Value, VerifyError> {
        let a = parse_absolute(a_url)?;
        let b = parse_absolute(b_url)?;
        let body = request_body(&a, &b);
        log::debug!(target: "net.pagefreezer", "comparing {a} with {b}");

        let resp = self.transport.post_json(&self.endpoint, &self.api_key, &body)?;
        if !resp.is_success() {
            log::warn!(target: "net.pagefreezer", "service answered {}", resp.status);
            return Err(VerifyError::Status {
                status: resp.status,
                body: resp.body,
            });
        }
        log::trace!(target: "net.pagefreezer", "{} byte response", resp.body.len());
        serde_json::from_str(&resp.body).map_err(VerifyError::Decode)
    }
}

/// Endpoint and api key, once both are known to be usable.
fn checked_settings(config: &PageFreezerConfig) -> Result<(String, String), VerifyError> {
    let api_key = match config.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => return Err(VerifyError::MissingApiKey),
    };
    let endpoint = parse_absolute(&config.endpoint)?;
    Ok((endpoint.to_string(), api_key))
}

fn parse_absolute(input: &str) -> Result<Url, VerifyError> {
    // `Url::parse` only accepts absolute URLs.
    Url::parse(input.trim()).map_err(|reason| VerifyError::InvalidUrl {
        input: input.to_string(),
        reason,
    })
}

fn request_body(a: &Url, b: &Url) -> Value {
    json!({
        "source": "url",
        "url1": a.as_str(),
        "url2": b.as_str(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeTransport {
        response: HttpResponse,
        seen: RefCell<Vec<(String, String, Value)>>,
    }

    impl FakeTransport {
        fn answering(status: u16, body: &str) -> Self {
            Self {
                response: HttpResponse {
                    status,
                    body: body.to_string(),
                },
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for &FakeTransport {
        fn post_json(&self, url: &str, api_key: &str, body: &Value) -> Result<HttpResponse, VerifyError> {
            self.seen
                .borrow_mut()
                .push((url.to_string(), api_key.to_string(), body.clone()));
            Ok(self.response.clone())
        }
    }

    fn config() -> PageFreezerConfig {
        PageFreezerConfig {
            api_key: Some("secret".to_string()),
            ..PageFreezerConfig::default()
        }
    }

    #[test]
    fn sends_urls_and_returns_body_unchanged() {
        let fake = FakeTransport::answering(200, r#"{"status":"ok","result":{"diff":[]}}"#);
        let client = PageFreezer::with_transport(&config(), &fake).expect("client");
        let value = client
            .compare("https://example.com/a", "https://example.com/b")
            .expect("compare");
        assert_eq!(value, json!({"status": "ok", "result": {"diff": []}}));

        let seen = fake.seen.borrow();
        assert_eq!(seen.len(), 1);
        let (url, key, body) = &seen[0];
        assert_eq!(url, DEFAULT_ENDPOINT);
        assert_eq!(key, "secret");
        assert_eq!(
            body,
            &json!({
                "source": "url",
                "url1": "https://example.com/a",
                "url2": "https://example.com/b",
            })
        );
    }

    #[test]
    fn relative_urls_fail_before_any_request() {
        let fake = FakeTransport::answering(200, "{}");
        let client = PageFreezer::with_transport(&config(), &fake).expect("client");
        let err = client
            .compare("/a.html", "https://example.com/b")
            .expect_err("relative url");
        assert!(matches!(err, VerifyError::InvalidUrl { .. }));
        assert!(fake.seen.borrow().is_empty());
    }

    #[test]
    fn missing_or_blank_key_is_rejected() {
        let fake = FakeTransport::answering(200, "{}");
        let mut cfg = PageFreezerConfig::default();
        assert!(matches!(
            PageFreezer::with_transport(&cfg, &fake),
            Err(VerifyError::MissingApiKey)
        ));
        cfg.api_key = Some("  ".to_string());
        assert!(matches!(
            PageFreezer::with_transport(&cfg, &fake),
            Err(VerifyError::MissingApiKey)
        ));
    }

    #[test]
    fn error_status_carries_body() {
        let fake = FakeTransport::answering(403, "forbidden");
        let client = PageFreezer::with_transport(&config(), &fake).expect("client");
        match client.compare("https://a.test/", "https://b.test/") {
            Err(VerifyError::Status { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_a_decode_error() {
        let fake = FakeTransport::answering(200, "<html>");
        let client = PageFreezer::with_transport(&config(), &fake).expect("client");
        assert!(matches!(
            client.compare("https://a.test/", "https://b.test/"),
            Err(VerifyError::Decode(_))
        ));
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let cfg: PageFreezerConfig =
            serde_json::from_str(r#"{"api_key":"k"}"#).expect("config");
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.api_key.as_deref(), Some("k"));
    }
}
