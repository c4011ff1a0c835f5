use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AdminPane, AppState, Session};
use crate::state::messages::{ChatCommand, LiveUpdate, NetworkRequest};
use hub_api::client::AuthSession;
use hub_api::{ChatMessage, MatchUpdate, ReviewStatus, UserProfile};
use log::info;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Events,
    Bracket,
    Standings,
    Chat,
    News,
    Admin,
    Help,
}

/// Which side of a match a score key applies to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Side {
    A,
    B,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    /// Event id to select once the events feed first arrives.
    pending_event: Option<String>,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        if let Some(level) = settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        Self {
            pending_event: settings.event_id.clone(),
            state: AppState::new(),
            settings,
        }
    }

    // -----------------------------------------------------------------------
    // Live snapshots: every one replaces its collection and re-derives views
    // -----------------------------------------------------------------------

    pub fn on_live_update(&mut self, update: LiveUpdate) {
        match update {
            LiveUpdate::Events(events) => {
                self.state.events.load(events);
                if let Some(id) = self.pending_event.take()
                    && !self.state.events.select_by_id(&id)
                {
                    self.state.last_error = Some(format!("event {id} not found"));
                }
                self.state.recompute();
            }
            LiveUpdate::Teams(teams) => self.state.teams = teams,
            LiveUpdate::Registrations(registrations) => self.state.registrations = registrations,
            LiveUpdate::Matches(matches) => {
                self.state.matches = matches;
                self.state.recompute();
            }
            LiveUpdate::News(posts) => self.state.news.load_posts(posts),
            LiveUpdate::Rules(rules) => self.state.news.load_rules(rules),
            LiveUpdate::SiteConfig(site) => self.state.site = site,
            LiveUpdate::Error { source, message } => {
                self.state.last_error = Some(format!("{source}: {message}"));
            }
        }
    }

    pub fn select_next_event(&mut self) {
        self.state.events.next();
        self.state.recompute();
    }

    pub fn select_prev_event(&mut self) {
        self.state.events.prev();
        self.state.recompute();
    }

    // -----------------------------------------------------------------------
    // Network response handlers
    // -----------------------------------------------------------------------

    pub fn on_signed_in(&mut self, session: &AuthSession, profile: Option<UserProfile>) {
        let session = Session::from_auth(session, profile);
        info!("signed in as {} (admin: {})", session.display_name(), session.is_admin());
        self.state.status_message = Some(format!("Signed in as {}", session.display_name()));
        self.state.session = Some(session);
    }

    pub fn on_action_done(&mut self, message: String) {
        self.state.last_error = None;
        self.state.status_message = Some(message);
    }

    pub fn on_error(&mut self, message: String) {
        self.state.last_error = Some(message);
    }

    // -----------------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------------

    pub fn on_chat_snapshot(&mut self, messages: Vec<ChatMessage>) {
        self.state.chat.apply_snapshot(messages);
    }

    pub fn on_chat_deleted(&mut self, message_id: &str) {
        self.state.chat.push_system(format!("message {message_id} removed"));
    }

    pub fn on_chat_error(&mut self, message: String) {
        self.state.chat.online = false;
        self.state.chat.push_system(format!("chat error: {message}"));
    }

    pub fn start_composing(&mut self) {
        if !self.state.site.chat_enabled {
            self.state.chat.push_system("chat is disabled by the organisers");
            return;
        }
        if self.state.session.is_none() {
            self.state.chat.push_system("sign in to chat (HUB_EMAIL / HUB_PASSWORD)");
            return;
        }
        self.state.chat.composing = true;
    }

    pub fn chat_submit(&mut self) -> Option<ChatCommand> {
        if !self.state.site.chat_enabled {
            self.state.chat.composing = false;
            self.state.chat.input.clear();
            return None;
        }
        let body = self.state.chat.submit_input()?;
        Some(ChatCommand::Send { body })
    }

    pub fn chat_delete_selected(&mut self) -> Option<ChatCommand> {
        if !self.state.is_admin() {
            return None;
        }
        let message_id = self.state.chat.selected_message_id()?.to_string();
        self.state.chat.selected = None;
        Some(ChatCommand::Delete { message_id })
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        if self.state.active_tab == MenuItem::Chat {
            self.state.chat.scroll_offset = 0;
        }
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Admin edits. Each returns the backend write to queue, applying the
    // change locally first so the screen does not wait for the next poll.
    // -----------------------------------------------------------------------

    pub fn adjust_score(&mut self, side: Side, delta: i32) -> Option<NetworkRequest> {
        if !self.state.is_admin() {
            return None;
        }
        let current = self.state.bracket.selected_match()?.clone();
        let score = match side {
            Side::A => current.score_a,
            Side::B => current.score_b,
        };
        let score = score.saturating_add_signed(delta);
        let update = match side {
            Side::A => MatchUpdate { score_a: Some(score), ..MatchUpdate::default() },
            Side::B => MatchUpdate { score_b: Some(score), ..MatchUpdate::default() },
        };
        self.apply_local(&current.id, &update);
        Some(NetworkRequest::UpdateMatch { match_id: current.id, update })
    }

    pub fn cycle_match_status(&mut self) -> Option<NetworkRequest> {
        if !self.state.is_admin() {
            return None;
        }
        let current = self.state.bracket.selected_match()?.clone();
        let update = MatchUpdate { status: Some(current.status.cycle()), ..MatchUpdate::default() };
        self.apply_local(&current.id, &update);
        Some(NetworkRequest::UpdateMatch { match_id: current.id, update })
    }

    fn apply_local(&mut self, match_id: &str, update: &MatchUpdate) {
        if let Some(m) = self.state.matches.iter_mut().find(|m| m.id == match_id) {
            if let Some(score) = update.score_a {
                m.score_a = score;
            }
            if let Some(score) = update.score_b {
                m.score_b = score;
            }
            if let Some(status) = update.status {
                m.status = status;
            }
        }
        self.state.recompute();
    }

    /// Approve or reject whatever is selected in the admin queue.
    pub fn admin_review(&mut self, decision: ReviewStatus) -> Option<NetworkRequest> {
        if !self.state.is_admin() {
            return None;
        }
        let selected = self.state.admin.selected;
        match self.state.admin.pane {
            AdminPane::Registrations => {
                let registration = self.state.pending_registrations().get(selected)?.id.clone();
                Some(NetworkRequest::ReviewRegistration { registration_id: registration, decision })
            }
            AdminPane::Teams => {
                let team_id = self.state.event_teams().get(selected)?.id.clone();
                Some(NetworkRequest::SetTeamStatus { team_id, status: decision })
            }
        }
    }

    pub fn admin_down(&mut self) {
        let len = match self.state.admin.pane {
            AdminPane::Registrations => self.state.pending_registrations().len(),
            AdminPane::Teams => self.state.event_teams().len(),
        };
        self.state.admin.down(len);
    }
}
