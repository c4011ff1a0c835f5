use crate::error::ServerError;
use crate::routes::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use hub_api::client::ApiError;

/// A caller whose bearer token verified and whose profile has the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub uid: String,
    pub token: String,
}

pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ServerError::Unauthenticated("missing bearer token".into()))?
            .to_string();

        let account = state.backend.verify_token(&token).await.map_err(|e| match e {
            ApiError::Unauthorized(msg) => ServerError::Unauthenticated(msg),
            other => ServerError::from(other),
        })?;

        let profile = state.backend.user_profile(&account.uid).await?;
        if !profile.is_some_and(|p| p.is_admin()) {
            tracing::warn!(uid = %account.uid, "non-admin caller rejected");
            return Err(ServerError::Forbidden);
        }

        Ok(AdminUser { uid: account.uid, token })
    }
}
