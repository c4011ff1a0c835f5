use crate::app::MenuItem;
use hub_api::bracket::{BracketGroup, group_matches};
use hub_api::client::AuthSession;
use hub_api::standings::{TeamStanding, compute_standings, standings_by_group};
use hub_api::{ChatMessage, Event, Match, NewsPost, Registration, ReviewStatus, Rule, SiteConfig, Team, UserProfile, validate_chat_body};
use std::collections::HashSet;

/// Most chat messages kept on screen; older ones fall off the top.
pub const MAX_CHAT_HISTORY: usize = 200;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct EventsState {
    pub events: Vec<Event>,
    pub selected: usize,
}

impl EventsState {
    /// Replace the event list, keeping the same event selected when it survives.
    pub fn load(&mut self, mut events: Vec<Event>) {
        let keep = self.selected_event().map(|e| e.id.clone());
        events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
        self.events = events;
        self.selected = 0;
        if let Some(id) = keep {
            self.select_by_id(&id);
        }
    }

    pub fn selected_event(&self) -> Option<&Event> {
        self.events.get(self.selected)
    }

    pub fn select_by_id(&mut self, id: &str) -> bool {
        match self.events.iter().position(|e| e.id == id) {
            Some(pos) => {
                self.selected = pos;
                true
            }
            None => false,
        }
    }

    pub fn next(&mut self) {
        if self.selected + 1 < self.events.len() {
            self.selected += 1;
        }
    }

    pub fn prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Bracket
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct BracketState {
    pub groups: Vec<BracketGroup>,
    pub selected_group: usize,
    pub selected_round: usize,
    pub selected_match: usize,
    /// Vertical scroll offset for when matches exceed terminal height.
    pub scroll_offset: u16,
}

impl BracketState {
    /// Store freshly grouped matches, clamping the selection into range.
    pub fn load(&mut self, groups: Vec<BracketGroup>) {
        self.groups = groups;
        self.selected_group = self.selected_group.min(self.groups.len().saturating_sub(1));
        self.clamp_round();
    }

    pub fn current_group(&self) -> Option<&BracketGroup> {
        self.groups.get(self.selected_group)
    }

    pub fn selected_match(&self) -> Option<&Match> {
        self.current_group()?
            .rounds
            .get(self.selected_round)?
            .matches
            .get(self.selected_match)
    }

    pub fn cycle_group(&mut self) {
        if !self.groups.is_empty() {
            self.selected_group = (self.selected_group + 1) % self.groups.len();
            self.selected_round = 0;
            self.selected_match = 0;
            self.scroll_offset = 0;
        }
    }

    pub fn next_round(&mut self) {
        if self.selected_round + 1 < self.round_count() {
            self.selected_round += 1;
            self.clamp_match();
        }
    }

    pub fn prev_round(&mut self) {
        self.selected_round = self.selected_round.saturating_sub(1);
        self.clamp_match();
    }

    pub fn match_down(&mut self) {
        if self.selected_match + 1 < self.matches_in_round() {
            self.selected_match += 1;
        }
    }

    pub fn match_up(&mut self) {
        self.selected_match = self.selected_match.saturating_sub(1);
    }

    fn round_count(&self) -> usize {
        self.current_group().map_or(0, |g| g.rounds.len())
    }

    fn matches_in_round(&self) -> usize {
        self.current_group()
            .and_then(|g| g.rounds.get(self.selected_round))
            .map_or(0, |r| r.matches.len())
    }

    fn clamp_round(&mut self) {
        self.selected_round = self.selected_round.min(self.round_count().saturating_sub(1));
        self.clamp_match();
    }

    fn clamp_match(&mut self) {
        self.selected_match = self.selected_match.min(self.matches_in_round().saturating_sub(1));
    }
}

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct StandingsState {
    pub overall: Vec<TeamStanding>,
    pub groups: Vec<(String, Vec<TeamStanding>)>,
    /// `None` shows the overall table, `Some(i)` the i-th group's.
    pub selected_group: Option<usize>,
    pub scroll_offset: u16,
}

impl StandingsState {
    pub fn load(&mut self, matches: &[Match]) {
        self.overall = compute_standings(matches);
        self.groups = standings_by_group(matches);
        if self.selected_group.is_some_and(|i| i >= self.groups.len()) {
            self.selected_group = None;
        }
    }

    /// Overall, then each group in turn, then back to overall.
    pub fn cycle_view(&mut self) {
        self.selected_group = match self.selected_group {
            None if !self.groups.is_empty() => Some(0),
            Some(i) if i + 1 < self.groups.len() => Some(i + 1),
            _ => None,
        };
        self.scroll_offset = 0;
    }

    pub fn visible(&self) -> (&str, &[TeamStanding]) {
        match self.selected_group.and_then(|i| self.groups.get(i)) {
            Some((name, table)) => (name.as_str(), table.as_slice()),
            None => ("Overall", self.overall.as_slice()),
        }
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
    /// Local notices (send failures, moderation results). Never sent.
    pub notices: Vec<String>,
    pub input: String,
    pub composing: bool,
    pub scroll_offset: u16,
    /// Index into `messages` picked for moderation.
    pub selected: Option<usize>,
    pub online: bool,
}

impl ChatState {
    /// Replace the visible history with a live snapshot: ordered by send time
    /// then id, one entry per id, newest `MAX_CHAT_HISTORY` kept.
    pub fn apply_snapshot(&mut self, mut messages: Vec<ChatMessage>) {
        let keep = self.selected_message_id().map(str::to_string);

        let mut seen = HashSet::new();
        messages.retain(|m| m.id.is_empty() || seen.insert(m.id.clone()));
        messages.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then_with(|| a.id.cmp(&b.id)));
        if messages.len() > MAX_CHAT_HISTORY {
            let remove_count = messages.len() - MAX_CHAT_HISTORY;
            messages.drain(0..remove_count);
        }

        self.messages = messages;
        self.online = true;
        self.selected = keep.and_then(|id| self.messages.iter().position(|m| m.id == id));
    }

    /// Take the composed message if it is sendable; otherwise leave a notice.
    pub fn submit_input(&mut self) -> Option<String> {
        let result = validate_chat_body(&self.input);
        self.composing = false;
        self.input.clear();
        self.scroll_offset = 0;
        match result {
            Ok(body) => Some(body),
            Err(reason) => {
                self.push_system(reason);
                None
            }
        }
    }

    pub fn push_system(&mut self, body: impl Into<String>) {
        let body = body.into();
        if self.notices.last() == Some(&body) {
            return;
        }
        self.notices.push(body);
        if self.notices.len() > 20 {
            self.notices.remove(0);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = match self.selected {
            None => self.messages.len().checked_sub(1),
            Some(i) => Some(i.saturating_sub(1)),
        };
    }

    pub fn select_next(&mut self) {
        self.selected = match self.selected {
            Some(i) if i + 1 < self.messages.len() => Some(i + 1),
            _ => None,
        };
    }

    pub fn selected_message_id(&self) -> Option<&str> {
        self.messages.get(self.selected?).map(|m| m.id.as_str())
    }
}

// ---------------------------------------------------------------------------
// News and rules
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct NewsState {
    pub posts: Vec<NewsPost>,
    pub rules: Vec<Rule>,
    pub show_rules: bool,
    pub scroll_offset: u16,
}

impl NewsState {
    pub fn load_posts(&mut self, mut posts: Vec<NewsPost>) {
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at).then_with(|| a.title.cmp(&b.title)));
        self.posts = posts;
    }

    pub fn load_rules(&mut self, mut rules: Vec<Rule>) {
        rules.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.title.cmp(&b.title)));
        self.rules = rules;
    }
}

// ---------------------------------------------------------------------------
// Admin review queue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdminPane {
    #[default]
    Registrations,
    Teams,
}

#[derive(Debug, Default)]
pub struct AdminState {
    pub pane: AdminPane,
    pub selected: usize,
}

impl AdminState {
    pub fn toggle_pane(&mut self) {
        self.pane = match self.pane {
            AdminPane::Registrations => AdminPane::Teams,
            AdminPane::Teams => AdminPane::Registrations,
        };
        self.selected = 0;
    }

    pub fn down(&mut self, len: usize) {
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Signed-in user
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub profile: Option<UserProfile>,
}

impl Session {
    pub fn from_auth(session: &AuthSession, profile: Option<UserProfile>) -> Self {
        Self {
            uid: session.uid.clone(),
            email: session.email.clone(),
            profile,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(UserProfile::is_admin)
    }

    pub fn wrote(&self, message: &ChatMessage) -> bool {
        !self.uid.is_empty() && message.uid == self.uid
    }

    /// Name shown next to chat messages.
    pub fn display_name(&self) -> String {
        self.profile
            .as_ref()
            .map(|p| p.display_name.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| self.email.split('@').next().filter(|n| !n.is_empty()).map(str::to_string))
            .unwrap_or_else(|| "guest".to_string())
    }
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub last_error: Option<String>,
    pub status_message: Option<String>,
    pub session: Option<Session>,
    pub site: SiteConfig,
    pub teams: Vec<Team>,
    pub registrations: Vec<Registration>,
    pub matches: Vec<Match>,
    pub events: EventsState,
    pub bracket: BracketState,
    pub standings: StandingsState,
    pub chat: ChatState,
    pub news: NewsState,
    pub admin: AdminState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_admin)
    }

    pub fn selected_event_id(&self) -> Option<&str> {
        self.events.selected_event().map(|e| e.id.as_str())
    }

    /// Matches belonging to the selected event.
    pub fn event_matches(&self) -> Vec<Match> {
        let Some(event_id) = self.selected_event_id() else {
            return Vec::new();
        };
        self.matches.iter().filter(|m| m.event_id == event_id).cloned().collect()
    }

    pub fn event_teams(&self) -> Vec<&Team> {
        let event_id = self.selected_event_id().unwrap_or_default();
        self.teams.iter().filter(|t| t.event_id == event_id).collect()
    }

    /// Registrations still waiting on an admin, for the selected event.
    pub fn pending_registrations(&self) -> Vec<&Registration> {
        let event_id = self.selected_event_id().unwrap_or_default();
        self.registrations
            .iter()
            .filter(|r| r.event_id == event_id && r.status == ReviewStatus::Pending)
            .collect()
    }

    /// Rebuild bracket and standings for the selected event.
    pub fn recompute(&mut self) {
        let matches = self.event_matches();
        self.bracket.load(group_matches(&matches));
        self.standings.load(&matches);
    }
}
