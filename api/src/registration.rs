//! Checks a team registration has to pass before it is submitted.

use crate::{Event, EventStatus, Registration, ReviewStatus, Team};
use std::collections::HashSet;
use thiserror::Error;

pub const MAX_TEAM_NAME: usize = 48;
pub const MAX_ROSTER: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("team name is required")]
    MissingTeamName,
    #[error("team name is longer than {MAX_TEAM_NAME} characters")]
    TeamNameTooLong,
    #[error("captain is required")]
    MissingCaptain,
    #[error("roster must list between 1 and {MAX_ROSTER} members")]
    RosterSize,
    #[error("{0} is listed twice on the roster")]
    DuplicateMember(String),
    #[error("{0} is full")]
    EventFull(String),
    #[error("{0} has already finished")]
    EventClosed(String),
    #[error("a team named {0} is already entered")]
    NameTaken(String),
}

/// Approved teams of `event`; only these count against its capacity.
fn approved_count(event: &Event, teams: &[Team]) -> u32 {
    let count = teams
        .iter()
        .filter(|t| t.event_id == event.id && t.status == ReviewStatus::Approved)
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Remaining capacity of an event, or `None` when it has no limit.
pub fn spots_left(event: &Event, teams: &[Team]) -> Option<u32> {
    if event.max_teams == 0 {
        return None;
    }
    Some(event.max_teams.saturating_sub(approved_count(event, teams)))
}

/// Validate a registration draft against the event and what is already
/// entered for it. The first failing check is returned.
pub fn validate_registration(
    event: &Event,
    teams: &[Team],
    registrations: &[Registration],
    draft: &Registration,
) -> Result<(), RegistrationError> {
    let name = draft.team_name.trim();
    if name.is_empty() {
        return Err(RegistrationError::MissingTeamName);
    }
    if name.chars().count() > MAX_TEAM_NAME {
        return Err(RegistrationError::TeamNameTooLong);
    }
    if draft.captain.trim().is_empty() {
        return Err(RegistrationError::MissingCaptain);
    }

    let members: Vec<&str> = draft
        .members
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .collect();
    if members.is_empty() || members.len() > MAX_ROSTER {
        return Err(RegistrationError::RosterSize);
    }
    let mut seen = HashSet::new();
    for member in &members {
        if !seen.insert(member.to_lowercase()) {
            return Err(RegistrationError::DuplicateMember(member.to_string()));
        }
    }

    if event.status == EventStatus::Completed {
        return Err(RegistrationError::EventClosed(event.name.clone()));
    }
    if spots_left(event, teams) == Some(0) {
        return Err(RegistrationError::EventFull(event.name.clone()));
    }

    let wanted = name.to_lowercase();
    let team_clash = teams.iter().any(|t| {
        t.event_id == event.id
            && t.status != ReviewStatus::Rejected
            && t.name.trim().to_lowercase() == wanted
    });
    let registration_clash = registrations.iter().any(|r| {
        r.event_id == event.id
            && r.status != ReviewStatus::Rejected
            && r.team_name.trim().to_lowercase() == wanted
    });
    if team_clash || registration_clash {
        return Err(RegistrationError::NameTaken(name.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(max_teams: u32) -> Event {
        Event {
            id: "spring".into(),
            name: "Spring Cup".into(),
            max_teams,
            ..Event::default()
        }
    }

    fn team(name: &str, status: ReviewStatus) -> Team {
        Team {
            name: name.into(),
            event_id: "spring".into(),
            status,
            ..Team::default()
        }
    }

    fn draft(name: &str, members: &[&str]) -> Registration {
        Registration {
            event_id: "spring".into(),
            team_name: name.into(),
            captain: "Ana".into(),
            members: members.iter().map(|m| m.to_string()).collect(),
            ..Registration::default()
        }
    }

    #[test]
    fn accepts_a_complete_draft() {
        let ok = validate_registration(&event(8), &[], &[], &draft("Night Owls", &["Ana", "Bo"]));
        assert_eq!(ok, Ok(()));
    }

    #[test]
    fn rejects_missing_fields() {
        let e = event(0);
        assert_eq!(
            validate_registration(&e, &[], &[], &draft("  ", &["Ana"])),
            Err(RegistrationError::MissingTeamName)
        );
        assert_eq!(
            validate_registration(&e, &[], &[], &draft(&"x".repeat(MAX_TEAM_NAME + 1), &["Ana"])),
            Err(RegistrationError::TeamNameTooLong)
        );
        let mut no_captain = draft("Owls", &["Ana"]);
        no_captain.captain = " ".into();
        assert_eq!(
            validate_registration(&e, &[], &[], &no_captain),
            Err(RegistrationError::MissingCaptain)
        );
    }

    #[test]
    fn roster_bounds_and_duplicates() {
        let e = event(0);
        assert_eq!(
            validate_registration(&e, &[], &[], &draft("Owls", &[" "])),
            Err(RegistrationError::RosterSize)
        );
        let eleven: Vec<String> = (0..11).map(|i| format!("p{i}")).collect();
        let names: Vec<&str> = eleven.iter().map(String::as_str).collect();
        assert_eq!(
            validate_registration(&e, &[], &[], &draft("Owls", &names)),
            Err(RegistrationError::RosterSize)
        );
        assert_eq!(
            validate_registration(&e, &[], &[], &draft("Owls", &["Ana", "ana "])),
            Err(RegistrationError::DuplicateMember("ana".into()))
        );
    }

    #[test]
    fn capacity_counts_only_approved_teams() {
        let e = event(2);
        let teams = vec![
            team("A", ReviewStatus::Approved),
            team("B", ReviewStatus::Pending),
            team("C", ReviewStatus::Rejected),
        ];
        assert_eq!(spots_left(&e, &teams), Some(1));
        assert_eq!(validate_registration(&e, &teams, &[], &draft("D", &["Ana"])), Ok(()));

        let full = vec![team("A", ReviewStatus::Approved), team("B", ReviewStatus::Approved)];
        assert_eq!(spots_left(&e, &full), Some(0));
        assert_eq!(
            validate_registration(&e, &full, &[], &draft("D", &["Ana"])),
            Err(RegistrationError::EventFull("Spring Cup".into()))
        );
        assert_eq!(spots_left(&event(0), &full), None);
    }

    #[test]
    fn completed_event_is_closed() {
        let mut e = event(0);
        e.status = EventStatus::Completed;
        assert_eq!(
            validate_registration(&e, &[], &[], &draft("Owls", &["Ana"])),
            Err(RegistrationError::EventClosed("Spring Cup".into()))
        );
    }

    #[test]
    fn names_must_be_unique_per_event() {
        let e = event(0);
        let teams = vec![team("Night Owls", ReviewStatus::Approved), team("Foxes", ReviewStatus::Rejected)];
        let pending = vec![draft("Badgers", &["Cy"])];

        assert_eq!(
            validate_registration(&e, &teams, &pending, &draft(" night owls", &["Ana"])),
            Err(RegistrationError::NameTaken("night owls".into()))
        );
        assert_eq!(
            validate_registration(&e, &teams, &pending, &draft("BADGERS", &["Ana"])),
            Err(RegistrationError::NameTaken("BADGERS".into()))
        );
        assert_eq!(validate_registration(&e, &teams, &pending, &draft("Foxes", &["Ana"])), Ok(()));

        let mut elsewhere = team("Hawks", ReviewStatus::Approved);
        elsewhere.event_id = "autumn".into();
        assert_eq!(validate_registration(&e, &[elsewhere], &[], &draft("Hawks", &["Ana"])), Ok(()));
    }
}
