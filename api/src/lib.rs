pub mod bracket;
pub mod client;
pub mod config;
pub mod firestore;
pub mod registration;
pub mod standings;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Collections: names as stored in the managed backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Events,
    Teams,
    Registrations,
    Matches,
    News,
    Rules,
    LiveChat,
    Users,
    Config,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Events => "events",
            Collection::Teams => "teams",
            Collection::Registrations => "registrations",
            Collection::Matches => "matches",
            Collection::News => "news",
            Collection::Rules => "rules",
            Collection::LiveChat => "live_chat",
            Collection::Users => "users",
            Collection::Config => "config",
        }
    }
}

/// Id of the single document in `config` that holds site-wide settings.
pub const SITE_CONFIG_ID: &str = "site";

// ---------------------------------------------------------------------------
// Domain types. Every field defaults so half-filled documents still load
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Upcoming,
    Ongoing,
    Completed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    #[serde(skip_serializing)]
    pub id: String,
    pub name: String,
    pub game: String,
    pub date: String,
    /// Team capacity. Zero means no limit.
    pub max_teams: u32,
    pub description: String,
    pub status: EventStatus,
}

/// Review state shared by teams and registrations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Team {
    #[serde(skip_serializing)]
    pub id: String,
    pub name: String,
    #[serde(alias = "tournamentId")]
    pub event_id: String,
    pub captain: String,
    pub members: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub status: ReviewStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Registration {
    #[serde(skip_serializing)]
    pub id: String,
    #[serde(alias = "tournamentId")]
    pub event_id: String,
    pub team_name: String,
    pub captain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captain_email: Option<String>,
    pub members: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub status: ReviewStatus,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_time")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Registration {
    /// The team document created when this registration is approved.
    pub fn to_team(&self) -> Team {
        Team {
            id: String::new(),
            name: self.team_name.trim().to_string(),
            event_id: self.event_id.clone(),
            captain: self.captain.clone(),
            members: self.members.clone(),
            logo_url: self.logo_url.clone(),
            status: ReviewStatus::Approved,
        }
    }
}

/// Match lifecycle. The backend has used two spellings for the live and
/// finished states over time; both are accepted. Stored documents with any
/// other status decode as pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Pending,
    Ongoing,
    Completed,
}

impl<'de> Deserialize<'de> for MatchStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(MatchStatus::parse).unwrap_or_default())
    }
}

impl MatchStatus {
    /// Exact parse of a known spelling, case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(MatchStatus::Pending),
            "ongoing" | "live" => Some(MatchStatus::Ongoing),
            "completed" | "finished" => Some(MatchStatus::Completed),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        *self == MatchStatus::Completed
    }

    /// Next status in the admin cycle: pending → ongoing → completed → pending.
    pub fn cycle(self) -> Self {
        match self {
            MatchStatus::Pending => MatchStatus::Ongoing,
            MatchStatus::Ongoing => MatchStatus::Completed,
            MatchStatus::Completed => MatchStatus::Pending,
        }
    }

    pub fn short_label(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "SCH",
            MatchStatus::Ongoing => "LIVE",
            MatchStatus::Completed => "FNL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Match {
    #[serde(skip_serializing)]
    pub id: String,
    #[serde(alias = "tournamentId")]
    pub event_id: String,
    #[serde(alias = "team1")]
    pub team_a: String,
    #[serde(alias = "team2")]
    pub team_b: String,
    #[serde(deserialize_with = "round_or_default")]
    pub round: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(alias = "score1")]
    pub score_a: u32,
    #[serde(alias = "score2")]
    pub score_b: u32,
    pub status: MatchStatus,
}

impl Default for Match {
    fn default() -> Self {
        Self {
            id: String::new(),
            event_id: String::new(),
            team_a: String::new(),
            team_b: String::new(),
            round: 1,
            group: None,
            score_a: 0,
            score_b: 0,
            status: MatchStatus::Pending,
        }
    }
}

impl Match {
    /// Winning side's team name, if the match is completed and decisive.
    pub fn winner(&self) -> Option<&str> {
        if !self.status.is_completed() {
            return None;
        }
        match self.score_a.cmp(&self.score_b) {
            std::cmp::Ordering::Greater => Some(self.team_a.as_str()),
            std::cmp::Ordering::Less => Some(self.team_b.as_str()),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Partial match write used by admin score updates. Unlike stored matches,
/// an unknown status here is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_a: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_b: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "strict_status")]
    pub status: Option<MatchStatus>,
}

impl MatchUpdate {
    pub fn is_empty(&self) -> bool {
        self.score_a.is_none() && self.score_b.is_none() && self.status.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsPost {
    #[serde(skip_serializing)]
    pub id: String,
    pub title: String,
    pub body: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_time")]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rule {
    #[serde(skip_serializing)]
    pub id: String,
    pub title: String,
    pub body: String,
    pub order: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatMessage {
    #[serde(skip_serializing)]
    pub id: String,
    pub author: String,
    pub uid: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_time")]
    pub sent_at: Option<DateTime<Utc>>,
}

pub const MAX_CHAT_BODY: usize = 500;

/// Trim a chat body and check it is sendable.
pub fn validate_chat_body(body: &str) -> Result<String, String> {
    let body = body.trim();
    if body.is_empty() {
        return Err("message is empty".to_string());
    }
    if body.chars().count() > MAX_CHAT_BODY {
        return Err(format!("message is longer than {MAX_CHAT_BODY} characters"));
    }
    Ok(body.to_string())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Anything but "admin" is a plain user.
impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw {
            Some(role) if role.trim().eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::User,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(skip_serializing)]
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteConfig {
    #[serde(skip_serializing)]
    pub id: String,
    pub livestream_url: Option<String>,
    pub chat_enabled: bool,
    pub announcement: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            id: SITE_CONFIG_ID.to_string(),
            livestream_url: None,
            chat_enabled: true,
            announcement: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient field decoders
// ---------------------------------------------------------------------------

/// Timestamps arrive as RFC 3339 strings; anything else is treated as absent.
fn lenient_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

fn strict_status<'de, D>(deserializer: D) -> Result<Option<MatchStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => MatchStatus::parse(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown match status `{raw}`"))),
    }
}

/// Rounds are sometimes stored as strings ("2") by hand-edited documents.
fn round_or_default<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let round = match raw {
        Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    Ok(round.unwrap_or(1))
}
