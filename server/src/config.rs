use hub_api::config::{BackendConfig, env_default};

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// Bearer used for backend writes instead of the caller's own token.
    pub service_token: Option<String>,
    pub backend: BackendConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind: env_default("HUB_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            service_token: env_default("HUB_SERVICE_TOKEN"),
            backend: BackendConfig::from_env(),
        }
    }
}
