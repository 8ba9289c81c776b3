use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelPrice {
    pub input_price_per_1k: f64,
    pub output_price_per_1k: f64,
}

/// Model -> price map used by adapters to compute `cost_total` (spec
/// §4.1). Loadable from a JSON file (`RAD_PRICING_FILE`); a model with
/// no row here yields `cost_total: None`, never a priced zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingTable {
    prices: HashMap<String, ModelPrice>,
}

impl PricingTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn insert(&mut self, model: impl Into<String>, price: ModelPrice) {
        self.prices.insert(model.into(), price);
    }

    pub fn get(&self, model: &str) -> Option<ModelPrice> {
        self.prices.get(model).copied()
    }

    /// `(prompt_tokens/1000)*in + (completion_tokens/1000)*out`,
    /// rounded to 6 decimal places. `None` when the model has no
    /// pricing row.
    pub fn cost_total(&self, model: &str, prompt_tokens: u64, completion_tokens: u64) -> Option<f64> {
        let price = self.get(model)?;
        let raw = (prompt_tokens as f64 / 1000.0) * price.input_price_per_1k
            + (completion_tokens as f64 / 1000.0) * price.output_price_per_1k;
        Some((raw * 1_000_000.0).round() / 1_000_000.0)
    }

    /// A small built-in default table for well-known models, used when
    /// no `RAD_PRICING_FILE` is configured.
    pub fn with_defaults() -> Self {
        let mut table = Self::default();
        table.insert("gpt-4o", ModelPrice { input_price_per_1k: 0.0025, output_price_per_1k: 0.01 });
        table.insert("gpt-4o-mini", ModelPrice { input_price_per_1k: 0.00015, output_price_per_1k: 0.0006 });
        table.insert(
            "claude-3-5-sonnet-20241022",
            ModelPrice { input_price_per_1k: 0.003, output_price_per_1k: 0.015 },
        );
        table.insert(
            "claude-3-haiku-20240307",
            ModelPrice { input_price_per_1k: 0.00025, output_price_per_1k: 0.00125 },
        );
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_yields_none_not_zero() {
        let table = PricingTable::empty();
        assert_eq!(table.cost_total("unknown-model", 1000, 1000), None);
    }

    #[test]
    fn computes_cost_rounded_to_six_decimals() {
        let mut table = PricingTable::empty();
        table.insert("m", ModelPrice { input_price_per_1k: 0.003, output_price_per_1k: 0.015 });
        let cost = table.cost_total("m", 1234, 567).unwrap();
        let expected = (1234.0 / 1000.0) * 0.003 + (567.0 / 1000.0) * 0.015;
        assert!((cost - expected).abs() < 1e-9);
    }
}
