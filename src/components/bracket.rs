use hub_api::bracket::BracketGroup;
use hub_api::{Match, MatchStatus};
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::widgets::Widget;

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

/// Rows per match cell: side-A line, status line, side-B line.
pub const MATCH_HEIGHT: u16 = 3;

/// Blank rows between stacked cells in the busiest round.
const CELL_GAP: u16 = 1;

/// Width of the connector zone drawn between adjacent round columns.
pub const CONNECTOR_WIDTH: u16 = 3;

/// Widest a match cell gets on large terminals.
const CELL_W_FULL: u16 = 24;

/// Narrowest usable cell; below this the round is skipped.
const CELL_W_MIN: u16 = 12;

// ---------------------------------------------------------------------------
// MatchCell / BracketGrid: pre-computed positions for one group
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MatchCell {
    /// Row of the status line, relative to the top of the bracket.
    pub center_row: u16,
    /// Starting column of the cell, relative to the bracket origin.
    pub col: u16,
    pub round_idx: usize,
    pub match_idx: usize,
}

/// Column layout for one bracket group: one column per round, left to right.
///
/// Every round splits the full bracket height into equal slots, one per
/// match, so a round with half as many matches sits centred between the
/// pairs that feed it.
#[derive(Debug, Clone)]
pub struct BracketGrid {
    pub cells: Vec<MatchCell>,
    pub round_cols: Vec<u16>,
    /// Match count per round, in round order.
    pub round_sizes: Vec<usize>,
    pub cell_width: u16,
    pub total_height: u16,
}

impl BracketGrid {
    pub fn compute(group: &BracketGroup, width: u16) -> Self {
        let round_sizes: Vec<usize> = group.rounds.iter().map(|r| r.matches.len()).collect();
        let rounds = round_sizes.len().max(1) as u16;

        let connector_total = CONNECTOR_WIDTH * rounds.saturating_sub(1);
        let per_col = width.saturating_sub(connector_total) / rounds;
        let cell_width = per_col.clamp(CELL_W_MIN, CELL_W_FULL);
        let stride = cell_width + CONNECTOR_WIDTH;
        let round_cols: Vec<u16> = (0..round_sizes.len()).map(|i| stride * i as u16).collect();

        let busiest = round_sizes.iter().copied().max().unwrap_or(0) as u16;
        let total_height = busiest * (MATCH_HEIGHT + CELL_GAP);

        let mut cells = Vec::new();
        for (round_idx, &count) in round_sizes.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let slot = total_height / count as u16;
            for match_idx in 0..count {
                cells.push(MatchCell {
                    center_row: slot * match_idx as u16 + slot / 2,
                    col: round_cols[round_idx],
                    round_idx,
                    match_idx,
                });
            }
        }

        Self { cells, round_cols, round_sizes, cell_width, total_height }
    }

    /// Largest useful scroll offset when `visible` rows are on screen.
    pub fn max_scroll(&self, visible: u16) -> u16 {
        self.total_height.saturating_sub(visible)
    }

    pub fn cells_for_round(&self, round_idx: usize) -> impl Iterator<Item = &MatchCell> {
        self.cells.iter().filter(move |c| c.round_idx == round_idx)
    }

    /// Rounds `r` and `r + 1` are joined with connectors only when the later
    /// round has exactly half the matches, i.e. it reads as a knockout step.
    pub fn feeds_next(&self, round_idx: usize) -> bool {
        match (self.round_sizes.get(round_idx), self.round_sizes.get(round_idx + 1)) {
            (Some(&here), Some(&next)) => next > 0 && here == next * 2,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// BracketView widget
// ---------------------------------------------------------------------------

/// Renders one bracket group as round columns joined by box-drawing lines.
pub struct BracketView<'a> {
    pub group: &'a BracketGroup,
    pub grid: &'a BracketGrid,
    pub selected_round: usize,
    pub selected_match: usize,
    pub scroll_offset: u16,
}

impl Widget for BracketView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < CELL_W_MIN || area.height < MATCH_HEIGHT + 1 {
            return;
        }

        // Header row carries the round labels; the grid starts below it.
        let header_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        for (round_idx, round) in self.group.rounds.iter().enumerate() {
            let x = area.x + self.grid.round_cols[round_idx];
            if x >= area.x + area.width {
                break;
            }
            let avail = (area.x + area.width - x).min(self.grid.cell_width) as usize;
            let label: String = round.label.chars().take(avail).collect();
            buf.set_string(x, area.y, label, header_style);
        }
        let body = Rect::new(area.x, area.y + 1, area.width, area.height - 1);
        let scroll = self.scroll_offset.min(self.grid.max_scroll(body.height));

        for cell in &self.grid.cells {
            let Some(m) = self.group.rounds[cell.round_idx].matches.get(cell.match_idx) else {
                continue;
            };
            let selected = cell.round_idx == self.selected_round && cell.match_idx == self.selected_match;
            draw_match_cell(m, cell, self.grid.cell_width, selected, body, scroll, buf);
        }

        for round_idx in 0..self.grid.round_sizes.len() {
            if !self.grid.feeds_next(round_idx) {
                continue;
            }
            let children: Vec<&MatchCell> = self.grid.cells_for_round(round_idx).collect();
            let conn_x = body.x + self.grid.round_cols[round_idx] + self.grid.cell_width;
            for (j, parent) in self.grid.cells_for_round(round_idx + 1).enumerate() {
                let (Some(top), Some(bot)) = (children.get(2 * j), children.get(2 * j + 1)) else {
                    continue;
                };
                draw_connector(top.center_row, parent.center_row, bot.center_row, conn_x, body, scroll, buf);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Drawing helpers
// ---------------------------------------------------------------------------

/// Bracket-relative row to absolute screen row, or `None` when scrolled out.
fn screen_y(bracket_row: u16, scroll: u16, area: Rect) -> Option<u16> {
    let rel = bracket_row.checked_sub(scroll)?;
    (rel < area.height).then_some(area.y + rel)
}

fn draw_match_cell(
    m: &Match,
    cell: &MatchCell,
    width: u16,
    selected: bool,
    area: Rect,
    scroll: u16,
    buf: &mut Buffer,
) {
    let x = area.x + cell.col;
    if x >= area.x + area.width {
        return;
    }
    let avail = (area.x + area.width - x) as usize;

    let base = if selected {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        Style::default().fg(Color::Gray)
    };
    let winner = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);
    let dim = Style::default().fg(Color::Indexed(240));
    let live = Style::default().fg(Color::Rgb(0, 122, 195));

    let rows = [cell.center_row.saturating_sub(1), cell.center_row, cell.center_row + 1];
    for (slot, row) in rows.into_iter().enumerate() {
        let Some(sy) = screen_y(row, scroll, area) else {
            continue;
        };
        let (text, style) = match slot {
            0 => (format_side_line(&m.team_a, m.score_a, width as usize), side_style(m, &m.team_a, base, winner)),
            2 => (format_side_line(&m.team_b, m.score_b, width as usize), side_style(m, &m.team_b, base, winner)),
            _ => (
                format_status_line(m.status, width as usize),
                if m.status == MatchStatus::Ongoing { live } else { dim },
            ),
        };
        let clipped: String = text.chars().take(avail).collect();
        buf.set_string(x, sy, clipped, style);
    }
}

fn side_style(m: &Match, team: &str, base: Style, winner: Style) -> Style {
    if m.winner() == Some(team) { winner } else { base }
}

/// `"name........ score "` padded to exactly `width` columns.
pub fn format_side_line(team: &str, score: u32, width: usize) -> String {
    let name = if team.trim().is_empty() { "TBD" } else { team.trim() };
    let name_w = width.saturating_sub(5);
    let name: String = name.chars().take(name_w).collect();
    let line = format!("{name:<name_w$} {score:>3} ");
    line.chars().take(width).collect()
}

pub fn format_status_line(status: MatchStatus, width: usize) -> String {
    let raw = format!(" {}", status.short_label());
    format!("{raw:<width$}").chars().take(width).collect()
}

/// Join two feeder matches to the match they lead into.
///
/// ```text
///  top    ──┐
///           │
///  parent   ├──
///           │
///  bottom ──┘
/// ```
fn draw_connector(r_top: u16, r_mid: u16, r_bot: u16, conn_x: u16, area: Rect, scroll: u16, buf: &mut Buffer) {
    let style = Style::default().fg(Color::Indexed(240));
    let limit_x = area.x + area.width;
    let (col_a, col_b, col_c) = (conn_x, conn_x + 1, conn_x + 2);

    let mut put = |x: u16, row: u16, ch: char| {
        if x < limit_x
            && let Some(sy) = screen_y(row, scroll, area)
        {
            put_char(buf, x, sy, ch, style);
        }
    };

    put(col_a, r_top, '─');
    put(col_b, r_top, '┐');
    for row in (r_top + 1)..r_bot {
        put(col_b, row, '│');
    }
    put(col_b, r_mid, '├');
    put(col_c, r_mid, '─');
    put(col_a, r_bot, '─');
    put(col_b, r_bot, '┘');
}

fn put_char(buf: &mut Buffer, x: u16, y: u16, ch: char, style: Style) {
    if let Some(cell) = buf.cell_mut((x, y)) {
        cell.set_char(ch);
        cell.set_style(style);
    }
}
