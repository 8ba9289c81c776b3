//! Vendor-neutral wire types shared by the provider adapters, the
//! dispatcher, and the gateway (spec §3 `ProviderRequest`/
//! `ProviderResult`/`ModelRoute`/`Attempt`/`UsageRecord`), plus the
//! AG-UI event shape (spec §3/§4.5).

pub mod agui;
pub mod attempt;
pub mod request;
pub mod response;
pub mod route;
pub mod usage;

pub use agui::{AgUiEvent, AgUiEventKind};
pub use attempt::{Attempt, AttemptOutcome};
pub use request::{ApiType, ChatMessage, ContentPart, MessageRole, ProviderRequest, RequestPayload};
pub use response::{Choice, ProviderResult, ResponseOutput, StreamError, StreamFrame};
pub use route::{FallbackRoute, ModelRoute};
pub use usage::{ResponseStatus, Usage, UsageRecord};
