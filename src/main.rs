mod app;
mod components;
mod draw;
mod keys;
mod register;
mod state;
mod ui;

use crate::app::App;
use crate::register::RegisterArgs;
use crate::state::app_settings::AppSettings;
use crate::state::chat::ChatWorker;
use crate::state::live::LiveFeeds;
use crate::state::messages::{ChatCommand, ChatEvent, LiveUpdate, NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use hub_api::client::HubApi;
use log::{error, info};
use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = AppSettings::load();
    if handle_cli_args(&settings).await? {
        return Ok(());
    }

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal();

    tui_logger::init_logger(log::LevelFilter::Info)?;
    tui_logger::set_default_level(log::LevelFilter::Info);

    let every = settings.backend.poll_interval;
    let mut api = HubApi::new(settings.backend.clone());
    if let Some(token) = settings.id_token.as_deref() {
        api = api.with_id_token(token);
    }
    let startup_sign_in = match (settings.id_token.clone(), settings.credentials()) {
        (Some(id_token), _) => Some(NetworkRequest::ResumeSession { id_token }),
        (None, Some((email, password))) => Some(NetworkRequest::SignIn { email, password }),
        (None, None) => None,
    };
    let app = Arc::new(Mutex::new(App::new(settings)));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);
    let (chat_cmd_tx, chat_cmd_rx) = mpsc::channel::<ChatCommand>(100);
    let (chat_evt_tx, chat_evt_rx) = mpsc::channel::<ChatEvent>(100);
    let (live_tx, live_rx) = mpsc::channel::<LiveUpdate>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread
    let network_worker = NetworkWorker::new(api.clone(), network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    // Chat thread
    let chat_worker = ChatWorker {
        api: api.clone(),
        every,
        author: "guest".to_string(),
        uid: String::new(),
        commands: chat_cmd_rx,
        events: chat_evt_tx,
    };
    let chat_task = tokio::spawn(chat_worker.run());

    // One live subscription per collection
    let feeds = LiveFeeds::start(&api, every, live_tx.clone());

    // Sign in on startup when a token or credentials are configured
    if let Some(request) = startup_sign_in {
        let _ = network_req_tx.send(request).await;
    }
    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    let channels = Channels {
        network_requests: network_req_tx,
        chat_commands: chat_cmd_tx,
        live_updates: live_tx,
    };
    main_ui_loop(
        terminal,
        app,
        api,
        feeds,
        channels,
        ui_event_rx,
        network_resp_rx,
        chat_evt_rx,
        live_rx,
    )
    .await;

    input_handler.abort();
    network_task.abort();
    chat_task.abort();

    Ok(())
}

/// Handle non-interactive invocations. Returns true when the TUI should not start.
async fn handle_cli_args(settings: &AppSettings) -> anyhow::Result<bool> {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return Ok(false);
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            Ok(true)
        }
        "-V" | "--version" => {
            println!("esports-hub {}", env!("CARGO_PKG_VERSION"));
            Ok(true)
        }
        "register" => {
            let parsed = match RegisterArgs::parse(args) {
                Ok(parsed) => parsed,
                Err(e) => {
                    eprintln!("{e}\n\n{}", usage_text());
                    std::process::exit(2);
                }
            };
            let team = parsed.team_name.clone();
            let id = register::run(parsed, settings).await?;
            println!("Registration for {team} submitted ({id}); an organiser will review it.");
            Ok(true)
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "esports-hub - campus esports club terminal hub

Usage:
  esports-hub
  esports-hub register <event-id> <team> --captain NAME [--email E] [--member NAME]... [--logo PATH]
  esports-hub --help
  esports-hub --version

Environment:
  HUB_PROJECT_ID       Backend project id
  HUB_API_KEY          Backend API key
  HUB_FIRESTORE_URL    Document API base URL
  HUB_AUTH_URL         Auth API base URL
  HUB_UPLOAD_URL       Image upload endpoint for team logos
  HUB_UPLOAD_PRESET    Upload preset name
  HUB_ID_TOKEN         Pre-issued id token
  HUB_EMAIL            Sign-in email
  HUB_PASSWORD         Sign-in password
  HUB_EVENT            Event selected on startup
  HUB_POLL_SECS        Live query interval in seconds (default 3)
  HUB_LOG              Log level shown in the log pane"
}

struct Channels {
    network_requests: mpsc::Sender<NetworkRequest>,
    chat_commands: mpsc::Sender<ChatCommand>,
    live_updates: mpsc::Sender<LiveUpdate>,
}

#[allow(clippy::too_many_arguments)]
async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    api: HubApi,
    mut feeds: LiveFeeds,
    channels: Channels,
    mut ui_events: mpsc::Receiver<UiEvent>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
    mut chat_events: mpsc::Receiver<ChatEvent>,
    mut live_updates: mpsc::Receiver<LiveUpdate>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &channels).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw =
                    handle_network_response(response, &app, &api, &mut feeds, &channels, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(chat_event) = chat_events.recv() => {
                let should_redraw = handle_chat_response(chat_event, &app).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(update) = live_updates.recv() => {
                let mut app_guard = app.lock().await;
                app_guard.on_live_update(update);
                if !loading.is_loading {
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }
        }
    }
}

async fn handle_ui_event(ui_event: UiEvent, app: &Arc<Mutex<App>>, channels: &Channels) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            info!("esports-hub {} started", env!("CARGO_PKG_VERSION"));
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, &channels.network_requests, &channels.chat_commands).await;
            true
        }
        UiEvent::Resize => true,
    }
}

async fn handle_chat_response(response: ChatEvent, app: &Arc<Mutex<App>>) -> bool {
    let mut guard = app.lock().await;
    match response {
        ChatEvent::Snapshot(messages) => guard.on_chat_snapshot(messages),
        ChatEvent::Sent => {}
        ChatEvent::Deleted { message_id } => guard.on_chat_deleted(&message_id),
        ChatEvent::Error(message) => guard.on_chat_error(message),
    }
    true
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    api: &HubApi,
    feeds: &mut LiveFeeds,
    channels: &Channels,
    loading: &mut LoadingState,
) -> bool {
    match response {
        NetworkResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
            return true;
        }
        NetworkResponse::SignedIn { session, profile } => {
            let mut guard = app.lock().await;
            guard.on_signed_in(&session, profile);
            let author = guard.state.session.as_ref().map(|s| s.display_name()).unwrap_or_default();
            let every = guard.settings.backend.poll_interval;
            drop(guard);

            // Rules may hide documents from anonymous readers, so resubscribe
            // with the session token.
            let signed_in = api.clone().with_id_token(session.id_token.clone());
            feeds.restart(&signed_in, every, channels.live_updates.clone());
            let _ = channels
                .chat_commands
                .send(ChatCommand::Identify { token: session.id_token, author, uid: session.uid })
                .await;
        }
        NetworkResponse::ActionDone { message } => {
            let mut guard = app.lock().await;
            guard.on_action_done(message);
        }
        NetworkResponse::Error { message } => {
            error!("Network error: {message}");
            let mut guard = app.lock().await;
            guard.on_error(message);
        }
    }
    !loading.is_loading
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        let polled = tokio::task::spawn_blocking(|| {
            if crossterm_event::poll(Duration::from_millis(250)).unwrap_or(false) {
                crossterm_event::read().ok()
            } else {
                None
            }
        })
        .await;

        let Ok(Some(event)) = polled else {
            continue;
        };
        let ui_event = match event {
            Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
            Event::Resize(_, _) => Some(UiEvent::Resize),
            _ => None,
        };

        if let Some(ui_event) = ui_event
            && ui_events.send(ui_event).await.is_err()
        {
            break;
        }
    }
}

fn setup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::Hide);
    let _ = execute!(stdout, terminal::EnterAlternateScreen);
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = terminal::enable_raw_mode();
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
