use crate::app::{App, MenuItem, Side};
use crate::state::messages::{ChatCommand, NetworkRequest};
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use hub_api::ReviewStatus;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    chat_commands: &mpsc::Sender<ChatCommand>,
) {
    let mut guard = app.lock().await;
    let mut request: Option<NetworkRequest> = None;
    let mut chat: Option<ChatCommand> = None;

    // While composing, every printable key goes into the input line.
    if guard.state.active_tab == MenuItem::Chat && guard.state.chat.composing {
        match (key_event.code, key_event.modifiers) {
            (Char('c'), KeyModifiers::CONTROL) => {
                crate::cleanup_terminal();
                std::process::exit(0);
            }
            (KeyCode::Esc, _) => {
                guard.state.chat.composing = false;
                guard.state.chat.input.clear();
            }
            (KeyCode::Enter, _) => chat = guard.chat_submit(),
            (KeyCode::Backspace, _) => {
                guard.state.chat.input.pop();
            }
            (Char(c), _) => guard.state.chat.input.push(c),
            _ => {}
        }
    } else {
        match (guard.state.active_tab, key_event.code, key_event.modifiers) {
            // Quit
            (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
                crate::cleanup_terminal();
                std::process::exit(0);
            }

            // Tab switching
            (_, Char('1'), _) => guard.update_tab(MenuItem::Events),
            (_, Char('2'), _) => guard.update_tab(MenuItem::Bracket),
            (_, Char('3'), _) => guard.update_tab(MenuItem::Standings),
            (_, Char('4'), _) => guard.update_tab(MenuItem::Chat),
            (_, Char('5'), _) => guard.update_tab(MenuItem::News),
            (_, Char('6'), _) => guard.update_tab(MenuItem::Admin),
            (_, Char('?'), _) => guard.update_tab(MenuItem::Help),
            (MenuItem::Help, KeyCode::Esc, _) => guard.exit_help(),

            // Events
            (MenuItem::Events, Char('j') | KeyCode::Down, _) => guard.select_next_event(),
            (MenuItem::Events, Char('k') | KeyCode::Up, _) => guard.select_prev_event(),
            (MenuItem::Events, KeyCode::Enter, _) => guard.update_tab(MenuItem::Bracket),

            // Bracket navigation
            (MenuItem::Bracket, Char('l') | KeyCode::Right, _) => guard.state.bracket.next_round(),
            (MenuItem::Bracket, Char('h') | KeyCode::Left, _) => guard.state.bracket.prev_round(),
            (MenuItem::Bracket, Char('j') | KeyCode::Down, _) => guard.state.bracket.match_down(),
            (MenuItem::Bracket, Char('k') | KeyCode::Up, _) => guard.state.bracket.match_up(),
            (MenuItem::Bracket, Char('g'), _) => guard.state.bracket.cycle_group(),
            (MenuItem::Bracket, KeyCode::PageDown, _) => {
                guard.state.bracket.scroll_offset = guard.state.bracket.scroll_offset.saturating_add(4);
            }
            (MenuItem::Bracket, KeyCode::PageUp, _) => {
                guard.state.bracket.scroll_offset = guard.state.bracket.scroll_offset.saturating_sub(4);
            }

            // Bracket scoring (admin)
            (MenuItem::Bracket, Char(']'), _) => request = guard.adjust_score(Side::A, 1),
            (MenuItem::Bracket, Char('['), _) => request = guard.adjust_score(Side::A, -1),
            (MenuItem::Bracket, Char('}'), _) => request = guard.adjust_score(Side::B, 1),
            (MenuItem::Bracket, Char('{'), _) => request = guard.adjust_score(Side::B, -1),
            (MenuItem::Bracket, Char('s'), _) => request = guard.cycle_match_status(),

            // Standings
            (MenuItem::Standings, Char('g'), _) => guard.state.standings.cycle_view(),

            // Chat
            (MenuItem::Chat, Char('i') | KeyCode::Enter, _) => guard.start_composing(),
            (MenuItem::Chat, Char('k') | KeyCode::Up, _) => guard.state.chat.select_prev(),
            (MenuItem::Chat, Char('j') | KeyCode::Down, _) => guard.state.chat.select_next(),
            (MenuItem::Chat, Char('d'), _) => chat = guard.chat_delete_selected(),

            // News and rules
            (MenuItem::News, Char('r'), _) => {
                guard.state.news.show_rules = !guard.state.news.show_rules;
                guard.state.news.scroll_offset = 0;
            }
            (MenuItem::News, Char('j') | KeyCode::Down, _) => {
                guard.state.news.scroll_offset = guard.state.news.scroll_offset.saturating_add(1);
            }
            (MenuItem::News, Char('k') | KeyCode::Up, _) => {
                guard.state.news.scroll_offset = guard.state.news.scroll_offset.saturating_sub(1);
            }

            // Admin queue
            (MenuItem::Admin, KeyCode::Tab, _) => guard.state.admin.toggle_pane(),
            (MenuItem::Admin, Char('j') | KeyCode::Down, _) => guard.admin_down(),
            (MenuItem::Admin, Char('k') | KeyCode::Up, _) => guard.state.admin.up(),
            (MenuItem::Admin, Char('a'), _) => request = guard.admin_review(ReviewStatus::Approved),
            (MenuItem::Admin, Char('x'), _) => request = guard.admin_review(ReviewStatus::Rejected),

            // Global
            (_, Char('f'), _) => guard.toggle_full_screen(),
            (_, Char('"'), _) => guard.toggle_show_logs(),

            _ => {}
        }
    }

    drop(guard);
    if let Some(request) = request {
        let _ = network_requests.send(request).await;
    }
    if let Some(command) = chat {
        let _ = chat_commands.send(command).await;
    }
}
