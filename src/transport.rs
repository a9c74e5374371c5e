//! Trait for a Transport that carries transit requests to the service

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;
use zeroize::Zeroize;

use crate::errors::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// A request ready to be sent
///
/// Header values (the token) and the body (encoded plaintext) are wiped when the request is
/// dropped. Copies an HTTP stack makes while sending are outside this crate's reach and are
/// not wiped.
pub struct TransportRequest {
    pub method: Method,
    /// Path relative to the server url, e.g. `v1/transit/encrypt/my-key`
    pub path: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl TransportRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl TransportRequest {
    fn wipe(&mut self) {
        for (_, value) in self.headers.iter_mut() {
            value.zeroize();
        }
        self.body.zeroize();
    }
}

impl Drop for TransportRequest {
    fn drop(&mut self) {
        self.wipe();
    }
}

// Header values carry the token and the body carries plaintext so neither is printed
impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field(
                "headers",
                &self.headers.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            )
            .field("body_len", &self.body.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub reason: String,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a single request and return whatever the server answered with.
    ///
    /// Non-2xx statuses are *not* errors at this layer. An `Err` means no HTTP response
    /// was received at all (DNS failure, refused connection, timeout).
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl Transport for Box<dyn Transport> {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}

/// The default [`Transport`], an HTTP client bound to a single server url
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: with_trailing_slash(base_url),
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

// Url::join drops the last path segment of a base without a trailing slash, so a server
// mounted under a prefix (http://host/vault) would otherwise lose it.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, mut request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = self.base_url.join(&request.path)?;

        let mut builder = self.client.request(request.method.into(), url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        let response = builder
            .body(std::mem::take(&mut request.body))
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        Ok(TransportResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body: body.to_vec(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::{with_trailing_slash, HttpTransport, Method, TransportRequest, TransportResponse};
    use std::time::Duration;
    use url::Url;

    #[test]
    fn test_base_url_keeps_prefix() {
        let transport = HttpTransport::new(
            Url::parse("http://192.168.20.20:8200/vault").unwrap(),
            Duration::from_secs(2),
        )
        .unwrap();

        assert_eq!(
            transport
                .base_url()
                .join("v1/transit/encrypt/thingtransport_test")
                .unwrap()
                .as_str(),
            "http://192.168.20.20:8200/vault/v1/transit/encrypt/thingtransport_test"
        );
    }

    #[test]
    fn test_bare_host_gets_root_path() {
        let url = with_trailing_slash(Url::parse("http://192.168.20.20:8200").unwrap());

        assert_eq!(url.as_str(), "http://192.168.20.20:8200/");
    }

    #[test]
    fn test_request_debug_hides_secrets() {
        let request = TransportRequest {
            method: Method::Post,
            path: "v1/transit/encrypt/key".into(),
            headers: vec![("X-Vault-Token", "s3cr3t".into())],
            body: b"{\"plaintext\":\"c2VjcmV0\"}".to_vec(),
        };

        let printed = format!("{:?}", request);

        assert!(printed.contains("X-Vault-Token"));
        assert!(!printed.contains("s3cr3t"));
        assert!(!printed.contains("c2VjcmV0"));
    }

    #[test]
    fn test_wipe_clears_token_and_body() {
        let mut request = TransportRequest {
            method: Method::Post,
            path: "v1/transit/encrypt/key".into(),
            headers: vec![("X-Vault-Token", "s3cr3t".into())],
            body: b"{\"plaintext\":\"c2VjcmV0\"}".to_vec(),
        };

        request.wipe();

        assert_eq!(request.header("X-Vault-Token"), Some(""));
        assert!(request.body.is_empty());
        assert_eq!(request.path, "v1/transit/encrypt/key");
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let request = TransportRequest {
            method: Method::Post,
            path: String::new(),
            headers: vec![("Content-Type", "application/json".into())],
            body: vec![],
        };

        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("x-vault-token"), None);
    }

    #[test]
    fn test_only_2xx_is_success() {
        let response = |status| TransportResponse {
            status,
            reason: String::new(),
            body: vec![],
        };

        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(301).is_success());
        assert!(!response(404).is_success());
        assert!(!response(500).is_success());
    }
}
