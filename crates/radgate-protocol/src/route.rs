use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostTier {
    Low,
    Medium,
    High,
}

/// One weighted failover target (spec §3). Weights break ties by
/// registration order, not by value — two fallbacks at the same
/// weight keep whatever order they were registered in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackRoute {
    pub provider: String,
    pub provider_model: String,
    pub weight: u8,
}

/// Routing table entry, keyed by canonical name (spec §4.2). Aliases
/// and canonicals live in disjoint namespaces; a disabled route fails
/// resolution even when an alias still matches it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRoute {
    pub canonical: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub provider: String,
    pub provider_model: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub cost_tier: CostTier,
    #[serde(default)]
    pub fallbacks: Vec<FallbackRoute>,
}

fn default_true() -> bool {
    true
}
