//! Concrete `ProviderAdapter` implementations (spec §4.1): an
//! OpenAI-compatible adapter, an Anthropic adapter, and a
//! configurable generic-compat adapter, all sharing one pooled
//! `wreq::Client`.

mod anthropic;
mod generic;
mod http_client;
mod openai;
mod sse;

pub use anthropic::AnthropicAdapter;
pub use generic::GenericCompatAdapter;
pub use http_client::{build_client, classify_wreq_error};
pub use openai::OpenAiCompatAdapter;
