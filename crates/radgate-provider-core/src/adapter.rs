use std::collections::HashMap;
use std::time::Duration;

use radgate_common::GatewayError;
use radgate_protocol::{ProviderRequest, ProviderResult};

/// How the adapter attaches credentials to outbound requests (spec
/// §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    ApiKey,
    Custom,
}

/// Static configuration for one adapter instance. An adapter is pure
/// with respect to this: no shared mutable state between calls beyond
/// the pooled HTTP client.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub credential: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub custom_headers: HashMap<String, String>,
    pub auth_scheme: AuthScheme,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credential: credential.into(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
            custom_headers: HashMap::new(),
            auth_scheme: AuthScheme::Bearer,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_scheme = scheme;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.insert(key.into(), value.into());
        self
    }
}

/// Contract every vendor adapter implements (spec §4.1). Safe for
/// concurrent use; the connection pool is reused across calls.
/// Streaming responses pin one upstream connection for the life of
/// the stream.
#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(
        &self,
        request: ProviderRequest,
        provider_model: &str,
    ) -> Result<ProviderResult, GatewayError>;
}
