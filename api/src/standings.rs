//! League table derived from completed matches.
//!
//! Standings are never stored. Every snapshot of the match list is folded
//! from scratch, so a corrected score simply produces a corrected table.

use crate::bracket::group_label;
use crate::Match;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const POINTS_WIN: u32 = 3;
pub const POINTS_DRAW: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStanding {
    pub team: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i64,
    pub points: u32,
}

impl TeamStanding {
    fn new(team: &str) -> Self {
        Self { team: team.to_string(), ..Self::default() }
    }

    fn record(&mut self, scored: u32, conceded: u32) {
        self.played = self.played.saturating_add(1);
        self.goals_for = self.goals_for.saturating_add(scored);
        self.goals_against = self.goals_against.saturating_add(conceded);
        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => {
                self.wins = self.wins.saturating_add(1);
                self.points = self.points.saturating_add(POINTS_WIN);
            }
            std::cmp::Ordering::Less => self.losses = self.losses.saturating_add(1),
            std::cmp::Ordering::Equal => {
                self.draws = self.draws.saturating_add(1);
                self.points = self.points.saturating_add(POINTS_DRAW);
            }
        }
    }
}

/// Build the league table for one tournament's matches.
///
/// Only completed matches count. Teams are created on first appearance (side
/// A before side B), and the stable sort keeps that order for teams tied on
/// points, goal difference and goals scored.
pub fn compute_standings<'a, I>(matches: I) -> Vec<TeamStanding>
where
    I: IntoIterator<Item = &'a Match>,
{
    let mut table: Vec<TeamStanding> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for m in matches {
        if !m.status.is_completed() {
            continue;
        }
        let (a, b) = (m.team_a.trim(), m.team_b.trim());
        if a.is_empty() || b.is_empty() {
            log::debug!("skipping completed match {} with a blank team", m.id);
            continue;
        }

        let ia = slot(&mut table, &mut index, a);
        table[ia].record(m.score_a, m.score_b);
        let ib = slot(&mut table, &mut index, b);
        table[ib].record(m.score_b, m.score_a);
    }

    for row in &mut table {
        row.goal_difference = i64::from(row.goals_for) - i64::from(row.goals_against);
    }

    table.sort_by(|x, y| {
        y.points
            .cmp(&x.points)
            .then_with(|| y.goal_difference.cmp(&x.goal_difference))
            .then_with(|| y.goals_for.cmp(&x.goals_for))
    });
    table
}

fn slot(table: &mut Vec<TeamStanding>, index: &mut HashMap<String, usize>, team: &str) -> usize {
    if let Some(&i) = index.get(team) {
        return i;
    }
    table.push(TeamStanding::new(team));
    index.insert(team.to_string(), table.len() - 1);
    table.len() - 1
}

/// Standings per bracket group, groups ordered by label.
pub fn standings_by_group(matches: &[Match]) -> Vec<(String, Vec<TeamStanding>)> {
    let mut groups: BTreeMap<String, Vec<&Match>> = BTreeMap::new();
    for m in matches {
        groups.entry(group_label(m.group.as_deref())).or_default().push(m);
    }
    groups
        .into_iter()
        .map(|(name, ms)| (name, compute_standings(ms)))
        .filter(|(_, table)| !table.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatchStatus;

    fn game(a: &str, b: &str, sa: u32, sb: u32, status: MatchStatus) -> Match {
        Match {
            id: format!("{a}-{b}"),
            team_a: a.to_string(),
            team_b: b.to_string(),
            score_a: sa,
            score_b: sb,
            status,
            ..Match::default()
        }
    }

    fn done(a: &str, b: &str, sa: u32, sb: u32) -> Match {
        game(a, b, sa, sb, MatchStatus::Completed)
    }

    #[test]
    fn huge_scores_saturate() {
        let table = compute_standings(&[done("A", "B", u32::MAX, 0), done("A", "B", u32::MAX, 1)]);
        assert_eq!(table[0].team, "A");
        assert_eq!(table[0].goals_for, u32::MAX);
        assert_eq!(table[0].goal_difference, i64::from(u32::MAX) - 1);
        assert_eq!(table[0].points, 6);
        assert_eq!(table[1].goals_against, u32::MAX);
    }

    #[test]
    fn single_decisive_match() {
        let table = compute_standings(&[done("A", "B", 2, 1)]);
        assert_eq!(
            table,
            vec![
                TeamStanding {
                    team: "A".into(),
                    played: 1,
                    wins: 1,
                    draws: 0,
                    losses: 0,
                    goals_for: 2,
                    goals_against: 1,
                    goal_difference: 1,
                    points: 3,
                },
                TeamStanding {
                    team: "B".into(),
                    played: 1,
                    wins: 0,
                    draws: 0,
                    losses: 1,
                    goals_for: 1,
                    goals_against: 2,
                    goal_difference: -1,
                    points: 0,
                },
            ]
        );
    }

    #[test]
    fn draw_keeps_input_order() {
        let table = compute_standings(&[done("A", "B", 1, 1)]);
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].team, "A");
        assert_eq!(table[1].team, "B");
        for row in &table {
            assert_eq!(row.points, 1);
            assert_eq!(row.wins, 0);
            assert_eq!(row.draws, 1);
            assert_eq!(row.goal_difference, 0);
        }

        let swapped = compute_standings(&[done("B", "A", 1, 1)]);
        assert_eq!(swapped[0].team, "B");
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let none: Vec<Match> = Vec::new();
        assert!(compute_standings(&none).is_empty());
    }

    #[test]
    fn unfinished_matches_do_not_count() {
        let matches = vec![
            done("A", "B", 3, 0),
            game("C", "D", 5, 0, MatchStatus::Ongoing),
            game("A", "C", 0, 9, MatchStatus::Pending),
        ];
        let table = compute_standings(&matches);
        let teams: Vec<&str> = table.iter().map(|r| r.team.as_str()).collect();
        assert_eq!(teams, vec!["A", "B"]);
        assert_eq!(table[0].played, 1);
        assert_eq!(table[0].goals_for, 3);
    }

    #[test]
    fn tie_breaks_points_then_difference_then_goals() {
        let matches = vec![
            done("A", "X", 1, 0), // A: 3pts, +1, 1 gf
            done("B", "X", 3, 2), // B: 3pts, +1, 3 gf
            done("C", "X", 4, 0), // C: 3pts, +4
            done("D", "X", 1, 1), // D: 1pt
        ];
        let table = compute_standings(&matches);
        let order: Vec<&str> = table.iter().map(|r| r.team.as_str()).collect();
        assert_eq!(order, vec!["C", "B", "A", "D", "X"]);
    }

    #[test]
    fn fully_tied_teams_keep_first_appearance_order() {
        let matches = vec![done("Q", "Z", 2, 0), done("P", "Z", 2, 0)];
        let table = compute_standings(&matches);
        assert_eq!(table[0].team, "Q");
        assert_eq!(table[1].team, "P");
    }

    #[test]
    fn points_and_goal_difference_hold_for_every_row() {
        let matches = vec![
            done("A", "B", 2, 1),
            done("B", "C", 0, 0),
            done("C", "A", 5, 2),
            done("A", "B", 1, 1),
            game("B", "C", 7, 0, MatchStatus::Ongoing),
        ];
        let table = compute_standings(&matches);
        for row in &table {
            assert_eq!(
                row.goal_difference,
                i64::from(row.goals_for) - i64::from(row.goals_against)
            );
            assert_eq!(row.played, row.wins + row.draws + row.losses);
        }

        let total: u32 = table.iter().map(|r| r.points).sum();
        let decisive = matches.iter().filter(|m| m.status.is_completed() && m.score_a != m.score_b).count() as u32;
        let draws = matches.iter().filter(|m| m.status.is_completed() && m.score_a == m.score_b).count() as u32;
        assert_eq!(total, decisive * 3 + draws * 2);
    }

    #[test]
    fn names_are_trimmed_and_blank_sides_skipped() {
        let matches = vec![done(" A ", "B", 1, 0), done("A", "  ", 4, 0)];
        let table = compute_standings(&matches);
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].team, "A");
        assert_eq!(table[0].played, 1);
    }

    #[test]
    fn grouped_standings_split_by_label() {
        let mut g1 = done("A", "B", 1, 0);
        g1.group = Some("Group A".into());
        let mut g2 = done("C", "D", 0, 2);
        g2.group = Some("Group B".into());
        let mut pending = game("E", "F", 0, 0, MatchStatus::Pending);
        pending.group = Some("Group C".into());

        let grouped = standings_by_group(&[g2, g1, pending]);
        let labels: Vec<&str> = grouped.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["Group A", "Group B"]);
        assert_eq!(grouped[1].1[0].team, "D");
    }
}
