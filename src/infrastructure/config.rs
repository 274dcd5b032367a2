use crate::domain::facility::Scope;
use serde::Deserialize;

/// Base URL baked in at build time, if the build environment set one.
pub const BUILD_API_BASE_URL: Option<&str> = option_env!("NEOCARE_API_BASE_URL");
pub const FALLBACK_API_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiSettings,
    pub cache: CacheSettings,
    pub retry: RetrySettings,
    pub server: ServerSettings,
    pub session: SessionSettings,
    pub realtime: RealtimeSettings,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    Live,
    Mock,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_ms: u64,
    pub mode: ApiMode,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    pub path: String,
    pub prefix: String,
    pub default_ttl_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    pub role: String,
    pub auth_token: Option<String>,
    pub facility: Option<String>,
    pub scope: Option<Scope>,
    pub timeframe: Option<String>,
    pub period: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RealtimeSettings {
    pub enabled: bool,
    pub endpoint: Option<String>,
}

fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("api.base_url", BUILD_API_BASE_URL.unwrap_or(FALLBACK_API_BASE_URL))?
        .set_default("api.timeout_ms", 30_000)?
        .set_default("api.mode", "live")?
        .set_default("cache.path", "data/client-store.json")?
        .set_default("cache.prefix", "neocare360_cache_")?
        .set_default("cache.default_ttl_ms", 300_000)?
        .set_default("retry.max_attempts", 3)?
        .set_default("retry.delay_ms", 1_000)?
        .set_default("server.bind", "0.0.0.0:8080")?
        .set_default("session.role", "viewer")?
        .set_default("realtime.enabled", false)
}

/// Defaults, then `config/neocare360.*` if present, then `NEOCARE__*` env vars.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = defaults()?
        .add_source(config::File::with_name("config/neocare360").required(false))
        .add_source(
            config::Environment::with_prefix("NEOCARE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
