//! Bracket view of a tournament: matches bucketed by group, then by round.
//!
//! There is no advancement logic here. Admins enter every match by hand, so
//! the bracket is only ever a regrouping of what is stored.

use crate::Match;
use serde::Serialize;
use std::collections::BTreeMap;

/// Label used for matches that carry no group.
pub const DEFAULT_GROUP: &str = "Main Bracket";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BracketRound {
    pub number: u32,
    pub label: String,
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BracketGroup {
    pub name: String,
    pub rounds: Vec<BracketRound>,
}

impl BracketGroup {
    pub fn match_count(&self) -> usize {
        self.rounds.iter().map(|r| r.matches.len()).sum()
    }
}

/// Normalized group label: trimmed, with blank or missing mapped to the default.
pub fn group_label(group: Option<&str>) -> String {
    match group.map(str::trim) {
        Some(g) if !g.is_empty() => g.to_string(),
        _ => DEFAULT_GROUP.to_string(),
    }
}

/// Display label for the round at `position` of `total` rounds in a group.
pub fn round_label(position: usize, total: usize, number: u32) -> String {
    if position + 1 == total {
        "Finals".to_string()
    } else if position + 2 == total {
        "Semi-Finals".to_string()
    } else {
        format!("Round {number}")
    }
}

/// Partition matches by group label, then by ascending round number.
///
/// Groups come out in label order; matches keep their input order inside a
/// round.
pub fn group_matches(matches: &[Match]) -> Vec<BracketGroup> {
    let mut groups: BTreeMap<String, BTreeMap<u32, Vec<Match>>> = BTreeMap::new();
    for m in matches {
        groups
            .entry(group_label(m.group.as_deref()))
            .or_default()
            .entry(m.round)
            .or_default()
            .push(m.clone());
    }

    groups
        .into_iter()
        .map(|(name, rounds)| {
            let total = rounds.len();
            let rounds = rounds
                .into_iter()
                .enumerate()
                .map(|(position, (number, matches))| BracketRound {
                    number,
                    label: round_label(position, total, number),
                    matches,
                })
                .collect();
            BracketGroup { name, rounds }
        })
        .collect()
}
