use std::fmt;
use std::time::Duration;

use ofrest_core::{classify, ClientConfig, Reply};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;
use urlencoding::encode;

use crate::{
    ClientError, Groups, Messages, Muc, Result, SecurityAuditLog, Sessions, System, Users,
};

/// Query parameters; only parameters with a value are listed.
pub type Query<'q> = [(&'q str, String)];

/// Openfire REST API Client
///
/// Holds the server address and an HTTP client preconfigured with the
/// shared secret and the certificate policy. Resource handles such as
/// [`Client::users`] borrow it and add their endpoint path.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    http: HttpClient,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.config.host)
            .field("verify_ssl", &self.config.verify_ssl)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new client from connection settings
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut secret = HeaderValue::from_str(&config.secret)?;
        secret.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, secret);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()?;

        Ok(Self { config, http })
    }

    /// Shortcut for [`Client::new`] with default settings
    pub fn connect(host: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(host, secret))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn groups(&self) -> Groups<'_> {
        Groups::new(self)
    }

    pub fn muc(&self) -> Muc<'_> {
        Muc::new(self)
    }

    pub fn sessions(&self) -> Sessions<'_> {
        Sessions::new(self)
    }

    pub fn messages(&self) -> Messages<'_> {
        Messages::new(self)
    }

    pub fn system(&self) -> System<'_> {
        System::new(self)
    }

    pub fn security_audit_log(&self) -> SecurityAuditLog<'_> {
        SecurityAuditLog::new(self)
    }

    /// Issue one request and classify the response.
    #[tracing::instrument(level = "debug", skip(self, query, body), fields(status))]
    pub fn submit(
        &self,
        method: Method,
        path: &str,
        query: &Query<'_>,
        body: Option<&Value>,
    ) -> Result<Reply> {
        let url = self.config.url(path);

        let mut request = self.http.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send()?;
        let status = response.status().as_u16();
        tracing::Span::current().record("status", status);
        let bytes = response.bytes()?;

        classify(status, &bytes).map_err(|e| {
            tracing::warn!("Request to {} failed: {}", url, e);
            ClientError::Api(e)
        })
    }

    /// GET returning the decoded envelope
    pub(crate) fn get(&self, path: &str, query: &Query<'_>) -> Result<Value> {
        self.submit(Method::GET, path, query, None)
            .map(Reply::into_value)
    }

    /// Request whose reply body is not needed
    pub(crate) fn send(
        &self,
        method: Method,
        path: &str,
        query: &Query<'_>,
        body: Option<&Value>,
    ) -> Result<()> {
        self.submit(method, path, query, body)?;
        Ok(())
    }
}

/// Join path segments onto an endpoint, percent-encoding each segment.
pub(crate) fn join(endpoint: &str, segments: &[&str]) -> String {
    let mut path = endpoint.to_string();
    for segment in segments {
        path.push('/');
        path.push_str(&encode(segment));
    }
    path
}

/// Endpoint with its last segment removed, e.g. `/v1/users` -> `/v1`.
pub(crate) fn parent(endpoint: &str) -> &str {
    endpoint.rsplit_once('/').map_or("", |(head, _)| head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        assert_eq!(join("/v1/users", &["alice", "roster"]), "/v1/users/alice/roster");
        assert_eq!(join("/v1/users", &[]), "/v1/users");
    }

    #[test]
    fn test_join_encodes_segments() {
        assert_eq!(join("/v1/users", &["ops#2"]), "/v1/users/ops%232");
        assert_eq!(join("/v1/users", &["a?b"]), "/v1/users/a%3Fb");
        assert_eq!(
            join("/v1/users", &["alice", "roster", "bob@example.org/laptop"]),
            "/v1/users/alice/roster/bob%40example.org%2Flaptop"
        );
    }

    #[test]
    fn test_parent() {
        assert_eq!(parent("/plugins/restapi/v1/users"), "/plugins/restapi/v1");
        assert_eq!(parent("users"), "");
    }

    #[test]
    fn test_invalid_secret_rejected() {
        let err = Client::connect("http://localhost:9090", "bad\nsecret").unwrap_err();
        assert!(matches!(err, ClientError::InvalidCredential(_)));
    }

    #[test]
    fn test_debug_hides_secret() {
        let client = Client::connect("http://localhost:9090", "topsecret").unwrap();
        assert!(!format!("{:?}", client).contains("topsecret"));
    }
}
