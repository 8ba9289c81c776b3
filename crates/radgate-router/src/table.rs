use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use radgate_protocol::{FallbackRoute, ModelRoute};

use crate::error::RouterError;

/// Immutable routing snapshot. Aliases and canonicals live in
/// disjoint namespaces (spec §3 invariant); `Register` rejects any
/// name collision across either namespace.
#[derive(Debug, Clone, Default)]
pub struct RouterTable {
    canonical: HashMap<String, ModelRoute>,
    alias_to_canonical: HashMap<String, String>,
}

fn norm(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl RouterTable {
    pub fn empty() -> Self {
        Self::default()
    }

    fn name_taken(&self, name: &str) -> bool {
        self.canonical.contains_key(name) || self.alias_to_canonical.contains_key(name)
    }

    pub fn register(&mut self, route: ModelRoute) -> Result<(), RouterError> {
        let canonical = norm(&route.canonical);
        if self.name_taken(&canonical) {
            return Err(RouterError::Collision(route.canonical));
        }
        for alias in &route.aliases {
            let alias_norm = norm(alias);
            if self.name_taken(&alias_norm) {
                return Err(RouterError::Collision(alias.clone()));
            }
        }
        for alias in &route.aliases {
            self.alias_to_canonical.insert(norm(alias), canonical.clone());
        }
        self.canonical.insert(canonical, route);
        Ok(())
    }

    fn lookup_canonical(&self, name: &str) -> Option<String> {
        let normalized = norm(name);
        if self.canonical.contains_key(&normalized) {
            return Some(normalized);
        }
        self.alias_to_canonical.get(&normalized).cloned()
    }

    pub fn resolve(&self, name: &str) -> Result<&ModelRoute, RouterError> {
        let canonical = self
            .lookup_canonical(name)
            .ok_or_else(|| RouterError::NotFound(name.to_string()))?;
        let route = self.canonical.get(&canonical).expect("index consistency");
        if !route.enabled {
            return Err(RouterError::Disabled(route.canonical.clone()));
        }
        Ok(route)
    }

    /// Ordered by descending weight, ties broken by registration order
    /// (spec §4.2) — `sort_by` is stable, so equal weights keep the
    /// order they appear in `route.fallbacks`.
    pub fn fallbacks(&self, name: &str) -> Result<Vec<FallbackRoute>, RouterError> {
        let route = self.resolve(name)?;
        let mut fallbacks = route.fallbacks.clone();
        fallbacks.sort_by(|a, b| b.weight.cmp(&a.weight));
        Ok(fallbacks)
    }

    pub fn enable(&mut self, name: &str) -> Result<(), RouterError> {
        self.set_enabled(name, true)
    }

    pub fn disable(&mut self, name: &str) -> Result<(), RouterError> {
        self.set_enabled(name, false)
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), RouterError> {
        let canonical = self
            .lookup_canonical(name)
            .ok_or_else(|| RouterError::NotFound(name.to_string()))?;
        let route = self.canonical.get_mut(&canonical).expect("index consistency");
        route.enabled = enabled;
        Ok(())
    }

    pub fn list(&self) -> Vec<&ModelRoute> {
        self.canonical.values().collect()
    }

    /// Ships the common OpenAI/Anthropic/Gemini aliases (spec §4.2).
    /// An external JSON table loaded at boot takes precedence over
    /// this when configured.
    pub fn with_defaults() -> Self {
        let mut table = Self::empty();
        let _ = table.register(ModelRoute {
            canonical: "claude-3-5-sonnet".into(),
            aliases: vec!["sonnet".into(), "claude-3-5-sonnet-latest".into()],
            provider: "anthropic".into(),
            provider_model: "claude-3-5-sonnet-20241022".into(),
            enabled: true,
            capabilities: vec!["chat".into(), "messages".into()],
            cost_tier: radgate_protocol::route::CostTier::High,
            fallbacks: vec![],
        });
        let _ = table.register(ModelRoute {
            canonical: "claude-3-haiku".into(),
            aliases: vec!["haiku".into()],
            provider: "anthropic".into(),
            provider_model: "claude-3-haiku-20240307".into(),
            enabled: true,
            capabilities: vec!["chat".into(), "messages".into()],
            cost_tier: radgate_protocol::route::CostTier::Low,
            fallbacks: vec![],
        });
        let _ = table.register(ModelRoute {
            canonical: "gpt-4o".into(),
            aliases: vec!["gpt4o".into()],
            provider: "openai".into(),
            provider_model: "gpt-4o".into(),
            enabled: true,
            capabilities: vec!["chat".into(), "responses".into()],
            cost_tier: radgate_protocol::route::CostTier::Medium,
            fallbacks: vec![FallbackRoute {
                provider: "openai".into(),
                provider_model: "gpt-4o-mini".into(),
                weight: 50,
            }],
        });
        let _ = table.register(ModelRoute {
            canonical: "gpt-4o-mini".into(),
            aliases: vec!["gpt4o-mini".into()],
            provider: "openai".into(),
            provider_model: "gpt-4o-mini".into(),
            enabled: true,
            capabilities: vec!["chat".into()],
            cost_tier: radgate_protocol::route::CostTier::Low,
            fallbacks: vec![],
        });
        let _ = table.register(ModelRoute {
            canonical: "gemini-1.5-pro".into(),
            aliases: vec!["gemini-pro".into()],
            provider: "gemini".into(),
            provider_model: "gemini-1.5-pro".into(),
            enabled: true,
            capabilities: vec!["chat".into()],
            cost_tier: radgate_protocol::route::CostTier::Medium,
            fallbacks: vec![],
        });
        table
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let routes: Vec<ModelRoute> = serde_json::from_str(json)?;
        let mut table = Self::empty();
        for route in routes {
            if table.register(route.clone()).is_err() {
                tracing::warn!(canonical = %route.canonical, "skipping colliding route from external table");
            }
        }
        Ok(table)
    }
}

/// Single RW-style handle over the table: many concurrent resolutions,
/// exclusive edits (spec §5). Backed by `ArcSwap`, the same
/// single-writer/many-reader snapshot idiom the gateway state uses for
/// its provider registry.
pub struct ModelRouter {
    table: ArcSwap<RouterTable>,
}

impl ModelRouter {
    pub fn new(table: RouterTable) -> Self {
        Self { table: ArcSwap::from_pointee(table) }
    }

    pub fn with_defaults() -> Self {
        Self::new(RouterTable::with_defaults())
    }

    pub fn snapshot(&self) -> Arc<RouterTable> {
        self.table.load_full()
    }

    pub fn resolve(&self, name: &str) -> Result<ModelRoute, RouterError> {
        self.table.load().resolve(name).cloned()
    }

    pub fn fallbacks(&self, name: &str) -> Result<Vec<FallbackRoute>, RouterError> {
        self.table.load().fallbacks(name)
    }

    /// Replaces the whole table, e.g. after loading `RAD_MODEL_TABLE`.
    pub fn replace(&self, table: RouterTable) {
        self.table.store(Arc::new(table));
    }

    pub fn mutate(&self, f: impl FnOnce(&mut RouterTable)) {
        let mut next = (**self.table.load()).clone();
        f(&mut next);
        self.table.store(Arc::new(next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_canonical_case_insensitively() {
        let router = ModelRouter::with_defaults();
        let route = router.resolve("GPT-4O").unwrap();
        assert_eq!(route.canonical, "gpt-4o");
    }

    #[test]
    fn resolves_alias() {
        let router = ModelRouter::with_defaults();
        let route = router.resolve("sonnet").unwrap();
        assert_eq!(route.canonical, "claude-3-5-sonnet");
    }

    #[test]
    fn disabled_route_fails_resolution_even_via_alias() {
        let router = ModelRouter::with_defaults();
        router.mutate(|t| t.disable("claude-3-5-sonnet").unwrap());
        assert!(matches!(router.resolve("sonnet"), Err(RouterError::Disabled(_))));
    }

    #[test]
    fn unknown_name_is_not_found() {
        let router = ModelRouter::with_defaults();
        assert!(matches!(router.resolve("nope"), Err(RouterError::NotFound(_))));
    }

    #[test]
    fn fallbacks_ordered_by_descending_weight() {
        let mut table = RouterTable::empty();
        table
            .register(ModelRoute {
                canonical: "m".into(),
                aliases: vec![],
                provider: "p".into(),
                provider_model: "m".into(),
                enabled: true,
                capabilities: vec![],
                cost_tier: radgate_protocol::route::CostTier::Low,
                fallbacks: vec![
                    FallbackRoute { provider: "a".into(), provider_model: "a".into(), weight: 10 },
                    FallbackRoute { provider: "b".into(), provider_model: "b".into(), weight: 50 },
                    FallbackRoute { provider: "c".into(), provider_model: "c".into(), weight: 50 },
                ],
            })
            .unwrap();
        let router = ModelRouter::new(table);
        let fallbacks = router.fallbacks("m").unwrap();
        assert_eq!(fallbacks[0].provider, "b");
        assert_eq!(fallbacks[1].provider, "c");
        assert_eq!(fallbacks[2].provider, "a");
    }

    #[test]
    fn register_rejects_alias_canonical_collision() {
        let mut table = RouterTable::empty();
        table
            .register(ModelRoute {
                canonical: "a".into(),
                aliases: vec!["x".into()],
                provider: "p".into(),
                provider_model: "a".into(),
                enabled: true,
                capabilities: vec![],
                cost_tier: radgate_protocol::route::CostTier::Low,
                fallbacks: vec![],
            })
            .unwrap();
        let result = table.register(ModelRoute {
            canonical: "x".into(),
            aliases: vec![],
            provider: "p".into(),
            provider_model: "x".into(),
            enabled: true,
            capabilities: vec![],
            cost_tier: radgate_protocol::route::CostTier::Low,
            fallbacks: vec![],
        });
        assert!(result.is_err());
    }
}
