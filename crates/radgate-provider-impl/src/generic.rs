use async_trait::async_trait;
use radgate_common::GatewayError;
use radgate_protocol::{ProviderRequest, ProviderResult};
use radgate_provider_core::{PricingTable, ProviderAdapter, ProviderConfig};

use crate::openai::OpenAiCompatAdapter;

/// Same OpenAI-shaped wire format but with a configurable auth scheme
/// (`bearer | api-key | custom`, spec §4.1/§6 `GENERIC_*` family) for
/// arbitrary OpenAI-compatible backends that aren't OpenAI itself.
pub struct GenericCompatAdapter {
    inner: OpenAiCompatAdapter,
}

impl GenericCompatAdapter {
    pub fn new(name: impl Into<String>, config: ProviderConfig, pricing: PricingTable) -> Result<Self, wreq::Error> {
        Ok(Self { inner: OpenAiCompatAdapter::new(name, config, pricing)? })
    }
}

#[async_trait]
impl ProviderAdapter for GenericCompatAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn execute(&self, request: ProviderRequest, provider_model: &str) -> Result<ProviderResult, GatewayError> {
        self.inner.execute(request, provider_model).await
    }
}
