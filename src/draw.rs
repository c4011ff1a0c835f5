use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::bracket::{BracketGrid, BracketView};
use crate::components::standings::standings_table;
use crate::state::app_state::AdminPane;
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;
use hub_api::registration::spots_left;
use hub_api::{EventStatus, ReviewStatus};

static TABS: &[&str; 6] = &["Events", "Bracket", "Standings", "Chat", "News", "Admin"];

const HELP_TEXT: &str = "\
Global      q quit   1-6 tabs   ? help   f full screen   \" logs
Events      j/k select event   Enter open bracket
Bracket     h/l round   j/k match   g next group   PgUp/PgDn scroll
            admin: ] [ score A +/-   } { score B +/-   s cycle status
Standings   g overall / per group
Chat        i or Enter type   Esc cancel   j/k select   admin: d delete
News        r news / rules   j/k scroll
Admin       Tab registrations / teams   j/k select   a approve   x reject";

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let drawn = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
            draw_status(f, layout.status, app);
        }

        match app.state.active_tab {
            MenuItem::Events => draw_events(f, layout.main, app),
            MenuItem::Bracket => draw_bracket(f, layout.main, app),
            MenuItem::Standings => draw_standings(f, layout.main, app),
            MenuItem::Chat => draw_chat(f, layout.main, app),
            MenuItem::News => draw_news(f, layout.main, app),
            MenuItem::Admin => draw_admin(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });
    if let Err(e) = drawn {
        log::error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Events | MenuItem::Help => 0,
        MenuItem::Bracket => 1,
        MenuItem::Standings => 2,
        MenuItem::Chat => 3,
        MenuItem::News => 4,
        MenuItem::Admin => 5,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

/// Bottom line: selected event, signed-in user, then the latest error or
/// confirmation.
fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let event = app
        .state
        .events
        .selected_event()
        .map_or_else(|| "no event".to_string(), |e| e.name.clone());
    let user = match &app.state.session {
        Some(s) if s.is_admin() => format!("{} (admin)", s.display_name()),
        Some(s) => s.display_name(),
        None => "guest".to_string(),
    };

    let mut spans = vec![
        Span::styled(format!(" {event} "), Style::default().fg(Color::Black).bg(Color::Gray)),
        Span::styled(format!(" {user} "), Style::default().fg(Color::Gray)),
    ];
    if let Some(err) = app.state.last_error.as_deref() {
        spans.push(Span::styled(err.to_string(), Style::default().fg(Color::Red)));
    } else if let Some(msg) = app.state.status_message.as_deref() {
        spans.push(Span::styled(msg.to_string(), Style::default().fg(Color::Green)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_events(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Events ");
    let events = &app.state.events.events;
    if events.is_empty() {
        draw_placeholder(f, area, "Waiting for events...");
        return;
    }

    let [list_area, detail_area] =
        Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(area);

    let items: Vec<ListItem> = events
        .iter()
        .map(|e| {
            let status_style = match e.status {
                EventStatus::Ongoing => Style::default().fg(Color::Green),
                EventStatus::Completed => Style::default().fg(Color::DarkGray),
                _ => Style::default().fg(Color::Yellow),
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<11}", e.date), Style::default().fg(Color::Gray)),
                Span::raw(e.name.clone()),
                Span::styled(format!("  {}", e.game), status_style),
            ]))
        })
        .collect();
    let mut list_state = ListState::default().with_selected(Some(app.state.events.selected));
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, list_area, &mut list_state);

    let Some(event) = app.state.events.selected_event() else {
        return;
    };
    let teams = app.state.event_teams();
    let approved: Vec<_> = teams.iter().filter(|t| t.status == ReviewStatus::Approved).collect();
    let capacity = match spots_left(event, &app.state.teams) {
        Some(left) => format!("{} / {} teams, {left} spots left", approved.len(), event.max_teams),
        None => format!("{} teams, open entry", approved.len()),
    };

    let mut lines = vec![
        Line::from(Span::styled(event.name.clone(), Style::default().add_modifier(Modifier::BOLD))),
        Line::from(format!("{}  {}  {:?}", event.game, event.date, event.status)),
        Line::from(capacity),
        Line::from(""),
    ];
    lines.extend(event.description.lines().map(|l| Line::from(l.to_string())));
    lines.push(Line::from(""));
    for team in approved {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}", team.name), Style::default().fg(Color::White)),
            Span::styled(format!("  captain {}", team.captain), Style::default().fg(Color::DarkGray)),
        ]));
    }

    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(default_border(Color::DarkGray).title(" Details ")),
        detail_area,
    );
}

fn draw_bracket(f: &mut Frame, area: Rect, app: &App) {
    let bracket = &app.state.bracket;
    let title = match bracket.current_group() {
        Some(g) if bracket.groups.len() > 1 => {
            format!(" Bracket: {} ({}/{}) ", g.name, bracket.selected_group + 1, bracket.groups.len())
        }
        Some(g) => format!(" Bracket: {} ", g.name),
        None => " Bracket ".to_string(),
    };
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(group) = bracket.current_group() else {
        let msg = if app.state.events.selected_event().is_some() {
            "No matches scheduled for this event yet."
        } else {
            "Select an event first."
        };
        f.render_widget(
            Paragraph::new(msg).style(Style::default().fg(Color::DarkGray)).alignment(Alignment::Center),
            inner,
        );
        return;
    };

    let [grid_area, footer] = Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);
    let grid = BracketGrid::compute(group, grid_area.width);
    f.render_widget(
        BracketView {
            group,
            grid: &grid,
            selected_round: bracket.selected_round,
            selected_match: bracket.selected_match,
            scroll_offset: bracket.scroll_offset,
        },
        grid_area,
    );

    let hint = match bracket.selected_match() {
        Some(m) if app.state.is_admin() => format!(
            "{} {}-{} {}  [{}]   ][ score A  }}{{ score B  s status",
            m.team_a,
            m.score_a,
            m.score_b,
            m.team_b,
            m.status.short_label()
        ),
        Some(m) => format!("{} {}-{} {}  [{}]", m.team_a, m.score_a, m.score_b, m.team_b, m.status.short_label()),
        None => String::new(),
    };
    f.render_widget(Paragraph::new(hint).style(Style::default().fg(Color::Gray)), footer);
}

fn draw_standings(f: &mut Frame, area: Rect, app: &App) {
    let (label, table) = app.state.standings.visible();
    let title = if app.state.standings.groups.len() > 1 {
        format!(" Standings: {label} (g to switch) ")
    } else {
        format!(" Standings: {label} ")
    };
    let block = default_border(Color::White).title(title);
    if table.is_empty() {
        let inner = block.inner(area);
        f.render_widget(block, area);
        f.render_widget(
            Paragraph::new("No completed matches yet.")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }
    f.render_widget(standings_table(table, block), area);
}

fn draw_chat(f: &mut Frame, area: Rect, app: &App) {
    let chat = &app.state.chat;
    let block = default_border(Color::White).title(" Chat ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width == 0 || inner.height < 3 {
        return;
    }

    let [messages_area, input_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(3)]).areas(inner);

    let mut lines = Vec::new();
    let status = if chat.online { "online" } else { "offline" };
    let mut header = vec![
        Span::styled("status ", Style::default().fg(Color::DarkGray)),
        Span::styled(status, Style::default().fg(if chat.online { Color::Green } else { Color::Red })),
    ];
    if let Some(url) = app.state.site.livestream_url.as_deref() {
        header.push(Span::styled("  live ", Style::default().fg(Color::DarkGray)));
        header.push(Span::styled(url.to_string(), Style::default().fg(Color::Cyan)));
    }
    lines.push(Line::from(header));
    if let Some(announcement) = app.state.site.announcement.as_deref() {
        lines.push(Line::from(Span::styled(announcement.to_string(), Style::default().fg(Color::Yellow))));
    }
    lines.push(Line::from(""));

    let session = app.state.session.as_ref();
    for (i, msg) in chat.messages.iter().enumerate() {
        let time = msg.sent_at.map_or_else(|| "--:--".to_string(), |t| t.format("%H:%M").to_string());
        let prefix = format!("[{time}] {}: ", msg.author);
        let author_color = if session.is_some_and(|s| s.wrote(msg)) { Color::Cyan } else { Color::Gray };
        let style = if chat.selected == Some(i) {
            Style::default().fg(Color::White).add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(Color::White)
        };
        let body_width = messages_area.width.saturating_sub(prefix.chars().count() as u16).max(8) as usize;
        let clipped: String = msg.body.chars().take(body_width).collect();
        lines.push(Line::from(vec![
            Span::styled(prefix, style.fg(author_color)),
            Span::styled(clipped, style),
        ]));
    }
    for notice in &chat.notices {
        lines.push(Line::from(Span::styled(format!("* {notice}"), Style::default().fg(Color::DarkGray))));
    }

    let visible = messages_area.height as usize;
    let total = lines.len();
    let offset = chat.scroll_offset as usize;
    let end = total.saturating_sub(offset);
    let start = end.saturating_sub(visible);
    let window = if start < end { lines[start..end].to_vec() } else { Vec::new() };
    f.render_widget(Paragraph::new(window), messages_area);

    let (mode, input, input_style) = if !app.state.site.chat_enabled {
        ("disabled", "Chat is disabled by the organisers.".to_string(), Style::default().fg(Color::Red))
    } else if chat.composing {
        ("typing", format!("> {}_", chat.input), Style::default().fg(Color::Yellow))
    } else {
        (
            "idle",
            "Press Enter/i to type. Esc cancel. j/k select.".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    };
    let input_block = default_border(Color::DarkGray).title(format!(" {mode} "));
    let input_inner = input_block.inner(input_area);
    f.render_widget(input_block, input_area);
    f.render_widget(Paragraph::new(input).style(input_style), input_inner);
}

fn draw_news(f: &mut Frame, area: Rect, app: &App) {
    let news = &app.state.news;
    let mut lines = Vec::new();
    let title = if news.show_rules {
        for rule in &news.rules {
            lines.push(Line::from(Span::styled(
                format!("{}. {}", rule.order, rule.title),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.extend(rule.body.lines().map(|l| Line::from(format!("   {l}"))));
            lines.push(Line::from(""));
        }
        " Rules (r for news) "
    } else {
        for post in &news.posts {
            let when = post
                .published_at
                .map_or_else(String::new, |t| t.format("%Y-%m-%d").to_string());
            lines.push(Line::from(vec![
                Span::styled(post.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {when}  {}", post.author), Style::default().fg(Color::DarkGray)),
            ]));
            lines.extend(post.body.lines().map(|l| Line::from(l.to_string())));
            lines.push(Line::from(""));
        }
        " News (r for rules) "
    };

    if lines.is_empty() {
        draw_placeholder(f, area, "Nothing posted yet.");
        return;
    }

    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((news.scroll_offset, 0))
            .block(default_border(Color::White).title(title)),
        area,
    );
}

fn draw_admin(f: &mut Frame, area: Rect, app: &App) {
    if !app.state.is_admin() {
        draw_placeholder(f, area, "Admin tools need an account with the admin role.");
        return;
    }

    let admin = &app.state.admin;
    let (title, items): (&str, Vec<ListItem>) = match admin.pane {
        AdminPane::Registrations => (
            " Pending registrations (Tab for teams) ",
            app.state
                .pending_registrations()
                .into_iter()
                .map(|r| {
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("{:<24}", r.team_name)),
                        Span::styled(
                            format!(" captain {}  {} members", r.captain, r.members.len()),
                            Style::default().fg(Color::Gray),
                        ),
                    ]))
                })
                .collect(),
        ),
        AdminPane::Teams => (
            " Teams (Tab for registrations) ",
            app.state
                .event_teams()
                .into_iter()
                .map(|t| {
                    let style = match t.status {
                        ReviewStatus::Approved => Style::default().fg(Color::Green),
                        ReviewStatus::Rejected => Style::default().fg(Color::Red),
                        ReviewStatus::Pending => Style::default().fg(Color::Yellow),
                    };
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("{:<24}", t.name)),
                        Span::styled(format!(" {}", t.status.label()), style),
                    ]))
                })
                .collect(),
        ),
    };

    if items.is_empty() {
        draw_placeholder(f, area, "Nothing to review for this event.");
        return;
    }

    let mut list_state = ListState::default().with_selected(Some(admin.selected));
    let list = List::new(items)
        .block(default_border(Color::White).title(title).title_bottom(" a approve  x reject "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_help(f: &mut Frame, area: Rect) {
    f.render_widget(
        Paragraph::new(HELP_TEXT).block(default_border(Color::White).title(" Help (Esc to close) ")),
        area,
    );
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray));
    f.render_widget(logs, area);
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    let block = default_border(Color::DarkGray);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        inner,
    );
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
