use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;
use zeroize::{Zeroize, Zeroizing};

use crate::client_options::{ClientOptions, ADDR_ENV, TOKEN_ENV};
use crate::diagnostics::{DiagnosticSink, TracingSink, TransitEvent};
use crate::errors::TransitError;
use crate::payload::{
    build_decrypt_payload, build_encrypt_payload, decode, DecryptedData, EncryptedData,
    TransitResponse,
};
use crate::transit_encrypts::TransitEncrypts;
use crate::transport::{HttpTransport, Method, Transport, TransportRequest};

pub const TOKEN_HEADER: &str = "X-Vault-Token";

/// A client for the transit encrypt and decrypt endpoints
///
/// The token needs the following (or more granular) access on the server:
///
/// ```hcl
/// path "transit/encrypt/*" {
///   capabilities = ["create", "update"]
/// }
///
/// path "transit/decrypt/*" {
///   capabilities = ["create", "update"]
/// }
/// ```
pub struct TransitClient<T = HttpTransport> {
    server_url: Url,
    token: Zeroizing<String>,
    api_version: String,
    transport: T,
    sink: Arc<dyn DiagnosticSink>,
}

fn parse_server_url(server_url: &str) -> Result<Url, TransitError> {
    let url = Url::parse(server_url)?;

    if url.cannot_be_a_base() {
        return Err(TransitError::Config(format!(
            "server url cannot be used as a base: {}",
            server_url
        )));
    }

    Ok(url)
}

fn require_non_empty(what: &str, value: &str) -> Result<(), TransitError> {
    if value.is_empty() {
        return Err(TransitError::InvalidRequest(format!("{} must not be empty", what)));
    }
    Ok(())
}

/// Key names are spliced into the request path, so anything url resolution would rewrite
/// (dot segments, `?`, `#`, backslashes) is refused.
fn require_key_path(what: &str, value: &str) -> Result<(), TransitError> {
    require_non_empty(what, value)?;

    if value.contains(&['?', '#', '\\'][..]) {
        return Err(TransitError::InvalidRequest(format!(
            "{} must not contain '?', '#' or '\\': {}",
            what, value
        )));
    }

    for segment in value.split('/') {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        if segment.is_empty() || decoded == "." || decoded == ".." {
            return Err(TransitError::InvalidRequest(format!(
                "{} has an empty or relative path segment: {}",
                what, value
            )));
        }
    }

    Ok(())
}

fn has_context(context: Option<&[u8]>) -> bool {
    matches!(context, Some(c) if !c.is_empty())
}

fn lookup_var(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, TransitError> {
    lookup(name).ok_or_else(|| TransitError::Config(format!("{} is not set", name)))
}

fn parse_response<R: DeserializeOwned>(body: &[u8]) -> Result<R, TransitError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(TransitError::ResponseShape(String::from(
            "empty response from server",
        )));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| TransitError::ResponseShape(format!("unexpected response body: {}", e)))?;

    // Derived deserializers also accept sequences, so insist on mappings explicitly
    if !value.is_object() {
        return Err(TransitError::ResponseShape(String::from(
            "response body is not a JSON object",
        )));
    }
    if matches!(value.get("data"), Some(data) if !data.is_null() && !data.is_object()) {
        return Err(TransitError::ResponseShape(String::from(
            "data is not a JSON object",
        )));
    }

    serde_json::from_value(value)
        .map_err(|e| TransitError::ResponseShape(format!("unexpected response body: {}", e)))
}

impl TransitClient<HttpTransport> {
    /// Create a client that talks to `server_url` (e.g. `http://192.168.20.20:8200`) over HTTP
    pub fn new(server_url: &str, token: impl Into<String>) -> Result<Self, TransitError> {
        Self::with_options(server_url, token, ClientOptions::default())
    }

    pub fn with_options(
        server_url: &str,
        token: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, TransitError> {
        let url = parse_server_url(server_url)?;
        let transport = HttpTransport::new(url.clone(), options.timeout())
            .map_err(|e| TransitError::Config(format!("failed to build http client: {}", e)))?;

        Ok(Self::assemble(url, token.into(), transport, &options))
    }

    /// Create a client from the `VAULT_ADDR` and `VAULT_TOKEN` environment variables
    pub fn from_env() -> Result<Self, TransitError> {
        Self::from_env_with_options(ClientOptions::default())
    }

    pub fn from_env_with_options(options: ClientOptions) -> Result<Self, TransitError> {
        Self::from_lookup(|name| std::env::var(name).ok(), options)
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        options: ClientOptions,
    ) -> Result<Self, TransitError> {
        let server_url = lookup_var(&lookup, ADDR_ENV)?;
        let token = lookup_var(&lookup, TOKEN_ENV)?;

        Self::with_options(&server_url, token, options)
    }
}

impl<T: Transport> TransitClient<T> {
    /// Create a client that sends every request through `transport`
    pub fn with_transport(
        server_url: &str,
        token: impl Into<String>,
        transport: T,
    ) -> Result<Self, TransitError> {
        Self::with_transport_and_options(server_url, token, transport, ClientOptions::default())
    }

    /// Like [`TransitClient::with_transport`]. The timeout in `options` is left to the transport.
    pub fn with_transport_and_options(
        server_url: &str,
        token: impl Into<String>,
        transport: T,
        options: ClientOptions,
    ) -> Result<Self, TransitError> {
        let url = parse_server_url(server_url)?;

        Ok(Self::assemble(url, token.into(), transport, &options))
    }

    fn assemble(server_url: Url, token: String, transport: T, options: &ClientOptions) -> Self {
        Self {
            server_url,
            token: Zeroizing::new(token),
            api_version: options.api_version().trim_matches('/').to_string(),
            transport,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the default [`TracingSink`] with another diagnostic sink
    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    // The token copy is owned by the request, which wipes it on drop
    fn request_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            (TOKEN_HEADER, self.token.to_string()),
            ("Content-Type", String::from("application/json")),
        ]
    }

    /// Send `payload` to `path` (relative to the api version) and parse the JSON response
    async fn command<P, R>(&self, path: &str, method: Method, payload: &P) -> Result<R, TransitError>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let body = serde_json::to_vec(payload)
            .map_err(|e| TransitError::InvalidRequest(format!("failed to encode payload: {}", e)))?;
        let path = format!("{}/{}", self.api_version, path);

        self.sink.record(&TransitEvent::RequestSent {
            method,
            path: &path,
            body_len: body.len(),
        });

        let request = TransportRequest {
            method,
            path,
            headers: self.request_headers(),
            body,
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                self.sink.record(&TransitEvent::TransportFailed {
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };

        self.sink.record(&TransitEvent::ResponseReceived {
            status: response.status,
            body_len: response.body.len(),
        });

        if !response.is_success() {
            self.sink.record(&TransitEvent::ServiceFailed {
                status: response.status,
                reason: &response.reason,
            });
            return Err(TransitError::Service {
                status: response.status,
                reason: response.reason,
            });
        }

        let mut body = response.body;
        let parsed = parse_response(&body);
        body.zeroize();

        parsed
    }
}

impl<T> fmt::Debug for TransitClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitClient")
            .field("server_url", &self.server_url.as_str())
            .field("api_version", &self.api_version)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl<T: Transport> TransitEncrypts for TransitClient<T> {
    async fn encrypt(
        &self,
        key_name: &str,
        plaintext: &[u8],
        context: Option<&[u8]>,
    ) -> Result<String, TransitError> {
        require_key_path("key name", key_name)?;

        self.sink.record(&TransitEvent::EncryptRequested {
            key: key_name,
            plaintext_len: plaintext.len(),
            has_context: has_context(context),
        });

        let payload = build_encrypt_payload(plaintext, context);

        let response: TransitResponse<EncryptedData> = self
            .command(&format!("transit/encrypt/{}", key_name), Method::Post, &payload)
            .await?;

        response.into_data()?.ciphertext.ok_or_else(|| {
            TransitError::ResponseShape(String::from("ciphertext not returned"))
        })
    }

    async fn decrypt(
        &self,
        key_path: &str,
        ciphertext: &str,
        context: Option<&[u8]>,
    ) -> Result<Vec<u8>, TransitError> {
        require_key_path("key path", key_path)?;
        require_non_empty("ciphertext", ciphertext)?;

        self.sink.record(&TransitEvent::DecryptRequested {
            key: key_path,
            ciphertext_len: ciphertext.len(),
            has_context: has_context(context),
        });

        let payload = build_decrypt_payload(ciphertext, context);

        let response: TransitResponse<DecryptedData> = self
            .command(&format!("transit/decrypt/{}", key_path), Method::Post, &payload)
            .await?;

        let data = response.into_data()?;
        let encoded = data.plaintext.as_deref().ok_or_else(|| {
            TransitError::ResponseShape(String::from("plaintext not returned"))
        })?;

        Ok(decode(encoded)?)
    }
}
