use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use hub_api::client::AuthSession;
use hub_api::{ChatMessage, Event, Match, MatchUpdate, NewsPost, Registration, ReviewStatus, Rule, SiteConfig, Team, UserProfile};

/// One-shot backend calls handled by the network worker.
#[derive(Debug, Clone)]
pub enum NetworkRequest {
    SignIn { email: String, password: String },
    /// Verify a pre-issued id token and load its profile.
    ResumeSession { id_token: String },
    SetTeamStatus { team_id: String, status: ReviewStatus },
    ReviewRegistration { registration_id: String, decision: ReviewStatus },
    UpdateMatch { match_id: String, update: MatchUpdate },
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    SignedIn { session: AuthSession, profile: Option<UserProfile> },
    ActionDone { message: String },
    Error { message: String },
}

/// Snapshot pushed by a live subscription task. Each replaces the whole
/// collection in app state.
#[derive(Debug)]
pub enum LiveUpdate {
    Events(Vec<Event>),
    Teams(Vec<Team>),
    Registrations(Vec<Registration>),
    Matches(Vec<Match>),
    News(Vec<NewsPost>),
    Rules(Vec<Rule>),
    SiteConfig(SiteConfig),
    Error { source: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub enum ChatCommand {
    Send { body: String },
    Delete { message_id: String },
    /// Switch the worker to a signed-in identity.
    Identify { token: String, author: String, uid: String },
}

#[derive(Debug)]
pub enum ChatEvent {
    Snapshot(Vec<ChatMessage>),
    Sent,
    Deleted { message_id: String },
    Error(String),
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}
