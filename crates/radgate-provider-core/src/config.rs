use crate::adapter::ProviderConfig;

/// Name under which an adapter is registered with the dispatcher and
/// reported as `provider` on `UsageRecord`/`Attempt` (spec §3).
pub type ProviderName = String;

/// One configured adapter instance plus the name it's registered
/// under — the unit `apps/radgate`'s bootstrap assembles from env vars
/// and hands to `radgate-dispatch`.
#[derive(Debug, Clone)]
pub struct NamedProviderConfig {
    pub name: ProviderName,
    pub config: ProviderConfig,
}

impl NamedProviderConfig {
    pub fn new(name: impl Into<String>, config: ProviderConfig) -> Self {
        Self { name: name.into(), config }
    }
}
