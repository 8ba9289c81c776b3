use clap::Parser;

/// Bootstrap configuration, `CLI > ENV` precedence on every field via
/// clap's `env` feature (spec.md §6's enumerated `RAD_*` variables).
#[derive(Debug, Clone, Parser)]
#[command(name = "radgate", version, about = "LLM API gateway: auth, routing, retry/failover dispatch, usage accounting")]
pub struct CliArgs {
    /// Bind address, e.g. `:8090` or `127.0.0.1:8090`.
    #[arg(long, env = "RAD_LISTEN_ADDR", default_value = ":8090")]
    pub listen_addr: String,

    /// `tracing-subscriber` env-filter directive, e.g. `info` or `radgate=debug`.
    #[arg(long, env = "RAD_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Comma-separated bootstrap API keys, seeded as unrestricted active keys.
    #[arg(long, env = "RAD_API_KEYS", default_value = "")]
    pub api_keys: String,

    /// Model routing table JSON file. Falls back to `RouterTable::with_defaults()` when unset.
    #[arg(long, env = "RAD_MODEL_TABLE")]
    pub model_table: Option<String>,

    /// Per-model pricing JSON file. Models absent from it yield `cost_total: None`.
    #[arg(long, env = "RAD_PRICING_FILE")]
    pub pricing_file: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,
    #[arg(long, env = "OPENAI_TIMEOUT", default_value_t = 60)]
    pub openai_timeout_secs: u64,
    #[arg(long, env = "OPENAI_MAX_RETRIES", default_value_t = 2)]
    pub openai_max_retries: u32,

    #[arg(long, env = "ANTHROPIC_API_KEY")]
    pub anthropic_api_key: Option<String>,
    #[arg(long, env = "ANTHROPIC_BASE_URL", default_value = "https://api.anthropic.com")]
    pub anthropic_base_url: String,
    #[arg(long, env = "ANTHROPIC_TIMEOUT", default_value_t = 60)]
    pub anthropic_timeout_secs: u64,
    #[arg(long, env = "ANTHROPIC_MAX_RETRIES", default_value_t = 2)]
    pub anthropic_max_retries: u32,

    #[arg(long, env = "GENERIC_BASE_URL")]
    pub generic_base_url: Option<String>,
    #[arg(long, env = "GENERIC_API_KEY")]
    pub generic_api_key: Option<String>,
    #[arg(long, env = "GENERIC_AUTH_TYPE", default_value = "bearer")]
    pub generic_auth_type: String,
    #[arg(long, env = "GENERIC_AUTH_HEADER")]
    pub generic_auth_header: Option<String>,
    #[arg(long, env = "GENERIC_AUTH_PREFIX")]
    pub generic_auth_prefix: Option<String>,
    #[arg(long, env = "GENERIC_CUSTOM_HEADERS")]
    pub generic_custom_headers: Option<String>,
    #[arg(long, env = "GENERIC_TIMEOUT", default_value_t = 60)]
    pub generic_timeout_secs: u64,
    #[arg(long, env = "GENERIC_MAX_RETRIES", default_value_t = 2)]
    pub generic_max_retries: u32,

    /// Required in strict mode: ≥32 chars, signs access tokens.
    #[arg(long, env = "JWT_ACCESS_SECRET")]
    pub jwt_access_secret: Option<String>,
    /// Required in strict mode: ≥32 chars, signs refresh tokens.
    #[arg(long, env = "JWT_REFRESH_SECRET")]
    pub jwt_refresh_secret: Option<String>,

    /// Reject a startup with missing/short JWT secrets instead of
    /// falling back to an insecure development default.
    #[arg(long, env = "RAD_STRICT", default_value_t = false)]
    pub strict: bool,
}
