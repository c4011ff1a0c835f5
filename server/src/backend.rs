use async_trait::async_trait;
use hub_api::client::{ApiResult, AuthAccount, HubApi};
use hub_api::{Collection, Event, Match, MatchUpdate, ReviewStatus, Role, UserProfile};

/// Everything the REST layer needs from the managed backend.
///
/// Writes carry the caller's token; an implementation may substitute its
/// own service credential.
#[async_trait]
pub trait AdminBackend: Send + Sync {
    async fn verify_token(&self, token: &str) -> ApiResult<AuthAccount>;
    async fn user_profile(&self, uid: &str) -> ApiResult<Option<UserProfile>>;

    async fn set_user_role(&self, token: &str, uid: &str, role: Role) -> ApiResult<()>;
    async fn set_team_status(&self, token: &str, team_id: &str, status: ReviewStatus) -> ApiResult<()>;
    async fn update_match(&self, token: &str, match_id: &str, update: &MatchUpdate) -> ApiResult<()>;
    async fn delete_chat_message(&self, token: &str, message_id: &str) -> ApiResult<()>;
    async fn review_registration(&self, token: &str, registration_id: &str, decision: ReviewStatus) -> ApiResult<()>;

    async fn event(&self, event_id: &str) -> ApiResult<Event>;
    async fn event_matches(&self, event_id: &str) -> ApiResult<Vec<Match>>;
}

/// [`AdminBackend`] over the hosted services.
pub struct HubBackend {
    api: HubApi,
    service_token: Option<String>,
}

impl HubBackend {
    pub fn new(api: HubApi, service_token: Option<String>) -> Self {
        Self { api, service_token }
    }

    fn writer(&self, caller_token: &str) -> HubApi {
        let token = self.service_token.as_deref().unwrap_or(caller_token);
        self.api.clone().with_id_token(token)
    }
}

#[async_trait]
impl AdminBackend for HubBackend {
    async fn verify_token(&self, token: &str) -> ApiResult<AuthAccount> {
        self.api.lookup_account(token).await
    }

    async fn user_profile(&self, uid: &str) -> ApiResult<Option<UserProfile>> {
        let reader = match &self.service_token {
            Some(token) => self.api.clone().with_id_token(token.as_str()),
            None => self.api.clone(),
        };
        reader.user_profile(uid).await
    }

    async fn set_user_role(&self, token: &str, uid: &str, role: Role) -> ApiResult<()> {
        self.writer(token).set_user_role(uid, role).await
    }

    async fn set_team_status(&self, token: &str, team_id: &str, status: ReviewStatus) -> ApiResult<()> {
        self.writer(token).set_team_status(team_id, status).await
    }

    async fn update_match(&self, token: &str, match_id: &str, update: &MatchUpdate) -> ApiResult<()> {
        self.writer(token).update_match(match_id, update).await
    }

    async fn delete_chat_message(&self, token: &str, message_id: &str) -> ApiResult<()> {
        self.writer(token).delete_chat_message(message_id).await
    }

    async fn review_registration(&self, token: &str, registration_id: &str, decision: ReviewStatus) -> ApiResult<()> {
        self.writer(token).review_registration(registration_id, decision).await
    }

    async fn event(&self, event_id: &str) -> ApiResult<Event> {
        self.api.get(Collection::Events, event_id).await
    }

    async fn event_matches(&self, event_id: &str) -> ApiResult<Vec<Match>> {
        self.api.event_matches(event_id).await
    }
}
