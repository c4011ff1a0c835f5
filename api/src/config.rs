use std::env;
use std::time::Duration;

pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_POLL_SECS: u64 = 3;

/// Connection settings for the managed backend.
///
/// Every URL is overridable so the local emulator (or a mock server in
/// tests) can stand in for the hosted services.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub project_id: String,
    pub api_key: Option<String>,
    pub firestore_url: String,
    pub auth_url: String,
    /// Image upload endpoint, e.g. `https://api.cloudinary.com/v1_1/<cloud>/image/upload`.
    pub upload_url: Option<String>,
    pub upload_preset: Option<String>,
    pub poll_interval: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            project_id: "esports-club".to_string(),
            api_key: None,
            firestore_url: DEFAULT_FIRESTORE_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            upload_url: None,
            upload_preset: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
        }
    }
}

impl BackendConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let poll_secs = env_default("HUB_POLL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_POLL_SECS);
        Self {
            project_id: env_default("HUB_PROJECT_ID").unwrap_or(defaults.project_id),
            api_key: env_default("HUB_API_KEY"),
            firestore_url: env_default("HUB_FIRESTORE_URL").unwrap_or(defaults.firestore_url),
            auth_url: env_default("HUB_AUTH_URL").unwrap_or(defaults.auth_url),
            upload_url: env_default("HUB_UPLOAD_URL"),
            upload_preset: env_default("HUB_UPLOAD_PRESET"),
            poll_interval: Duration::from_secs(poll_secs),
        }
    }

    /// Base of every document path: `.../projects/<id>/databases/(default)/documents`.
    pub fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.firestore_url.trim_end_matches('/'),
            self.project_id
        )
    }
}

/// Trimmed, non-empty value of an environment variable.
pub fn env_default(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
