use hub_api::config::{BackendConfig, env_default};
use log::LevelFilter;

#[derive(Debug, Default, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    pub backend: BackendConfig,
    /// Pre-issued id token; skips the password sign-in.
    pub id_token: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Event selected on startup.
    pub event_id: Option<String>,
}

impl AppSettings {
    pub fn load() -> Self {
        Self {
            full_screen: false,
            log_level: env_default("HUB_LOG").and_then(|level| level.parse().ok()),
            backend: BackendConfig::from_env(),
            id_token: env_default("HUB_ID_TOKEN"),
            email: env_default("HUB_EMAIL"),
            password: env_default("HUB_PASSWORD"),
            event_id: env_default("HUB_EVENT"),
        }
    }

    /// Email and password, when both are configured.
    pub fn credentials(&self) -> Option<(String, String)> {
        Some((self.email.clone()?, self.password.clone()?))
    }
}
