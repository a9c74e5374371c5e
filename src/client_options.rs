use std::time::Duration;

/// Environment variable holding the server url, e.g. `http://192.168.20.20:8200`
pub const ADDR_ENV: &str = "VAULT_ADDR";
/// Environment variable holding the token used for every request
pub const TOKEN_ENV: &str = "VAULT_TOKEN";

/// The options for configuring a [`TransitClient`](crate::TransitClient)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    timeout: Duration,
    api_version: String,
}

impl ClientOptions {
    /// Configure how long the default transport waits for a whole request to complete
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the api version prefix placed in front of every request path
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            api_version: String::from("v1"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ClientOptions;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();

        assert_eq!(options.timeout(), Duration::from_secs(5));
        assert_eq!(options.api_version(), "v1");
    }

    #[test]
    fn test_overrides() {
        let options = ClientOptions::default()
            .with_timeout(Duration::from_secs(2))
            .with_api_version("v2");

        assert_eq!(options.timeout(), Duration::from_secs(2));
        assert_eq!(options.api_version(), "v2");
    }
}
