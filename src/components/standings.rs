use hub_api::standings::TeamStanding;
use tui::layout::Constraint;
use tui::style::{Color, Modifier, Style};
use tui::text::Line;
use tui::widgets::{Block, Row, Table};

const HEADER: [&str; 10] = ["#", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts"];

/// League table for one standings view, in the order it was computed.
pub fn standings_table<'a>(standings: &'a [TeamStanding], block: Block<'a>) -> Table<'a> {
    let header = Row::new(HEADER.map(Line::from))
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let rows = standings.iter().enumerate().map(|(i, s)| {
        let style = if i == 0 && s.points > 0 {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::White)
        };
        Row::new(vec![
            (i + 1).to_string(),
            s.team.clone(),
            s.played.to_string(),
            s.wins.to_string(),
            s.draws.to_string(),
            s.losses.to_string(),
            s.goals_for.to_string(),
            s.goals_against.to_string(),
            signed(s.goal_difference),
            s.points.to_string(),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(4),
    ];

    Table::new(rows, widths).header(header).block(block).column_spacing(1)
}

/// Goal difference with an explicit sign for positive values.
pub fn signed(value: i64) -> String {
    if value > 0 { format!("+{value}") } else { value.to_string() }
}
