use crate::state::messages::{NetworkRequest, NetworkResponse};
use hub_api::client::{ApiResult, AuthSession, HubApi};
use log::{debug, error};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

pub struct NetworkWorker {
    client: HubApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
}

impl NetworkWorker {
    pub fn new(
        client: HubApi,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            self.start_loading_animation().await;

            let result = match request {
                NetworkRequest::SignIn { email, password } => self.handle_sign_in(&email, &password).await,
                NetworkRequest::ResumeSession { id_token } => self.handle_resume_session(id_token).await,
                NetworkRequest::SetTeamStatus { team_id, status } => {
                    debug!("setting team {team_id} to {}", status.label());
                    self.client
                        .set_team_status(&team_id, status)
                        .await
                        .map(|()| done(format!("Team {}", status.label())))
                }
                NetworkRequest::ReviewRegistration { registration_id, decision } => {
                    debug!("reviewing registration {registration_id}: {}", decision.label());
                    self.client
                        .review_registration(&registration_id, decision)
                        .await
                        .map(|()| done(format!("Registration {}", decision.label())))
                }
                NetworkRequest::UpdateMatch { match_id, update } => {
                    debug!("updating match {match_id}: {update:?}");
                    self.client
                        .update_match(&match_id, &update)
                        .await
                        .map(|()| done("Match updated".to_string()))
                }
            };

            debug!("network request complete");
            self.stop_loading_animation(result.is_ok()).await;

            let response = result.unwrap_or_else(|err| NetworkResponse::Error {
                message: err.to_string(),
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle_sign_in(&mut self, email: &str, password: &str) -> ApiResult<NetworkResponse> {
        debug!("signing in as {email}");
        let session = self.client.sign_in(email, password).await?;
        // Later admin writes go out with the signed-in token.
        self.client = self.client.clone().with_id_token(session.id_token.clone());
        let profile = self.client.user_profile(&session.uid).await?;
        Ok(NetworkResponse::SignedIn { session, profile })
    }

    async fn handle_resume_session(&mut self, id_token: String) -> ApiResult<NetworkResponse> {
        debug!("verifying configured id token");
        let account = self.client.lookup_account(&id_token).await?;
        let profile = self.client.user_profile(&account.uid).await?;
        let session = AuthSession {
            id_token,
            uid: account.uid,
            email: account.email,
            display_name: account.display_name,
            ..AuthSession::default()
        };
        Ok(NetworkResponse::SignedIn { session, profile })
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}

fn done(message: String) -> NetworkResponse {
    NetworkResponse::ActionDone { message }
}
