//! App: event loop for the roster shell.
//!
//! Architecture:
//! - `App` owns the `SessionController` and all widget state.
//! - A `tokio::mpsc` channel carries `AppMessage` events in from the terminal
//!   reader, fetch tasks and the roster store's change feed.
//! - Key presses become `Action`s; `dispatch` applies them to the session.
//! - After every message the visible page is re-projected from the store, so
//!   `draw` never has to touch async state.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    widgets::Block,
    Frame, Terminal,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, trace, warn};

use roster_core::error::AcquisitionError;
use roster_core::history::{make_address, MAX_ENTRIES};
use roster_core::model::{EnrichedPlayer, RosterSnapshot};
use roster_core::prefs::Preferences;
use roster_core::view::{self, PageView, ViewState};
use roster_core::{EnrichedRoster, SessionController};

use crate::{
    action::{Action, Pane},
    components::{history_list, player_detail, player_table, server_info},
    target::parse_target,
    theme::Palette,
    widgets::{
        filter_input::{FilterAction, FilterInput},
        status_bar::{self, InputMode},
        toast,
    },
};

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    /// A fetch task finished.
    Fetched {
        ticket: u64,
        host: String,
        port: u16,
        result: Result<RosterSnapshot, AcquisitionError>,
    },
    /// The roster store was replaced or enriched.
    RosterChanged,
}

pub struct App {
    session: SessionController,
    prefs: Preferences,
    prefs_path: PathBuf,
    palette: Palette,
    default_port: u16,
    initial_target: Option<String>,

    mode: InputMode,
    focus: Pane,
    target_input: FilterInput,
    name_input: FilterInput,
    id_input: FilterInput,
    rename_input: FilterInput,

    history_cursor: usize,
    player_cursor: usize,
    info_scroll: u16,

    // Re-projected from the store after every message.
    page: PageView,
    info_text: String,
    selected: Option<EnrichedPlayer>,

    /// Address of the fetch currently in flight, for the status bar.
    fetching: Option<String>,
    tx: Option<mpsc::Sender<AppMessage>>,
    should_quit: bool,
}

impl App {
    pub fn new(
        session: SessionController,
        prefs: Preferences,
        prefs_path: PathBuf,
        default_port: u16,
        initial_target: Option<String>,
    ) -> Self {
        let palette = Palette::for_theme(prefs.theme);
        Self {
            session,
            prefs,
            prefs_path,
            palette,
            default_port,
            initial_target,
            mode: InputMode::Normal,
            focus: Pane::Players,
            target_input: FilterInput::new(">", "host[:port]  (e to edit)"),
            name_input: FilterInput::new("/", "name"),
            id_input: FilterInput::new("#", "id"),
            rename_input: FilterInput::new("✎", "display name"),
            history_cursor: 0,
            player_cursor: 0,
            info_scroll: 0,
            page: view::project(&EnrichedRoster::default(), &ViewState::default()),
            info_text: String::new(),
            selected: None,
            fetching: None,
            tx: None,
            should_quit: false,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("[tui] terminal ready, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);
        self.tx = Some(tx.clone());

        // ── Background task: keyboard events ──────────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: roster change feed → AppMessage ─────────────────
        let roster_tx = tx.clone();
        let mut roster_events = self.session.store().subscribe();
        tokio::spawn(async move {
            loop {
                match roster_events.recv().await {
                    Ok(ev) => {
                        trace!("[tui] roster event {:?}", ev);
                        if roster_tx.send(AppMessage::RosterChanged).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("[tui] roster feed lagged by {} events", n);
                        if roster_tx.send(AppMessage::RosterChanged).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        if let Some(target) = self.initial_target.take() {
            self.target_input.set_value(&target);
            self.start_fetch(&target);
        }

        // Notification expiry.
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    const MAX_DRAIN: usize = 256;
                    let mut redraw = self.handle_message(msg).await;
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN {
                        let Ok(next) = rx.try_recv() else { break };
                        drained += 1;
                        redraw |= self.handle_message(next).await;
                    }
                    needs_redraw = redraw;
                }
                _ = toast_tick.tick() => {
                    let before = self.session.notifications().len();
                    self.session.tick();
                    needs_redraw = self.session.notifications().len() != before;
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        info!("[tui] exiting");

        Ok(())
    }

    // ── Message handler ───────────────────────────────────────────────────────

    /// Returns `true` if the message requires a redraw.
    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                if key.kind == KeyEventKind::Release {
                    return false;
                }
                for action in self.handle_key(key) {
                    self.dispatch(action).await;
                }
                true
            }
            AppMessage::Event(Event::Resize(_, _)) => true,
            AppMessage::Event(_) => false,
            AppMessage::Fetched {
                ticket,
                host,
                port,
                result,
            } => {
                // Failures are already turned into a notification by the session.
                match self
                    .session
                    .complete_acquisition(ticket, &host, port, result)
                    .await
                {
                    Ok(Some(_)) => {
                        self.fetching = None;
                        self.player_cursor = 0;
                        self.info_scroll = 0;
                        self.history_cursor = 0;
                    }
                    Ok(None) => return false,
                    Err(_) => self.fetching = None,
                }
                self.refresh().await;
                true
            }
            AppMessage::RosterChanged => {
                self.refresh().await;
                true
            }
        }
    }

    /// Re-project the page, server info and selected player from the store.
    async fn refresh(&mut self) {
        let roster = self.session.roster().await;
        self.page = self.session.project(&roster);
        self.info_text = server_info::render_info(&roster.dynamic_info);
        self.selected = self
            .session
            .selected_id()
            .and_then(|id| roster.get(id).cloned());
        self.player_cursor = self
            .player_cursor
            .min(self.page.rows.len().saturating_sub(1));
    }

    fn start_fetch(&mut self, input: &str) {
        let Some(tx) = self.tx.clone() else {
            return;
        };
        let (host, port) = parse_target(input, self.default_port);
        let client = self.session.client();
        let ticket = self.session.begin_acquisition();
        self.fetching = Some(make_address(&host, port));
        info!("[tui] fetching {}:{} (ticket {})", host, port, ticket);
        tokio::spawn(async move {
            let result = client.fetch_roster(&host, port).await;
            let _ = tx
                .send(AppMessage::Fetched {
                    ticket,
                    host,
                    port,
                    result,
                })
                .await;
        });
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return vec![Action::Quit];
        }

        match self.mode {
            InputMode::Target => match self.target_input.handle_key(key) {
                FilterAction::Confirmed => {
                    self.mode = InputMode::Normal;
                    vec![Action::Fetch(self.target_input.text().to_string())]
                }
                FilterAction::Cancelled => {
                    self.mode = InputMode::Normal;
                    vec![]
                }
                _ => vec![],
            },
            InputMode::SearchName => match self.name_input.handle_key(key) {
                FilterAction::Changed(q) => vec![Action::SearchName(q)],
                FilterAction::Confirmed | FilterAction::Cancelled => {
                    self.mode = InputMode::Normal;
                    vec![]
                }
                FilterAction::None => vec![],
            },
            InputMode::SearchId => match self.id_input.handle_key(key) {
                FilterAction::Changed(q) => vec![Action::SearchId(q)],
                FilterAction::Confirmed | FilterAction::Cancelled => {
                    self.mode = InputMode::Normal;
                    vec![]
                }
                FilterAction::None => vec![],
            },
            InputMode::Rename => match self.rename_input.handle_key(key) {
                FilterAction::Confirmed => {
                    self.mode = InputMode::Normal;
                    vec![Action::Rename(self.rename_input.text().to_string())]
                }
                FilterAction::Cancelled => {
                    self.mode = InputMode::Normal;
                    vec![]
                }
                _ => vec![],
            },
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => vec![Action::Quit],
                KeyCode::Char('e') | KeyCode::Char('i') => vec![Action::EditTarget],
                KeyCode::Char('/') => vec![Action::OpenSearchName],
                KeyCode::Char('#') => vec![Action::OpenSearchId],
                KeyCode::Tab => vec![Action::FocusNext],
                KeyCode::BackTab => vec![Action::FocusPrev],
                KeyCode::Char('1') => vec![Action::FocusPane(Pane::History)],
                KeyCode::Char('2') => vec![Action::FocusPane(Pane::Server)],
                KeyCode::Char('3') => vec![Action::FocusPane(Pane::Players)],
                KeyCode::Up | KeyCode::Char('k') => vec![Action::MoveUp],
                KeyCode::Down | KeyCode::Char('j') => vec![Action::MoveDown],
                KeyCode::Char(']') | KeyCode::PageDown => vec![Action::NextPage],
                KeyCode::Char('[') | KeyCode::PageUp => vec![Action::PrevPage],
                KeyCode::Enter => vec![Action::Activate],
                KeyCode::Esc => vec![Action::ClearSelection],
                KeyCode::Char('r') => vec![Action::StartRename],
                KeyCode::Char('d') => vec![Action::ForgetEntry],
                KeyCode::Char('D') => vec![Action::ClearHistory],
                KeyCode::Char('t') => vec![Action::ToggleTheme],
                KeyCode::Char('x') => vec![Action::DismissToast],
                _ => vec![],
            },
        }
    }

    fn history_address(&self) -> Option<String> {
        self.session
            .history()
            .list()
            .get(self.history_cursor)
            .map(|e| e.address.clone())
    }

    async fn dispatch(&mut self, action: Action) {
        match action {
            Action::EditTarget => {
                self.mode = InputMode::Target;
                self.target_input.activate();
            }
            Action::Fetch(input) => self.start_fetch(&input),

            Action::FocusNext => self.focus = self.focus.next(),
            Action::FocusPrev => self.focus = self.focus.prev(),
            Action::FocusPane(pane) => self.focus = pane,
            Action::MoveUp => match self.focus {
                Pane::History => self.history_cursor = self.history_cursor.saturating_sub(1),
                Pane::Server => self.info_scroll = self.info_scroll.saturating_sub(1),
                Pane::Players => self.player_cursor = self.player_cursor.saturating_sub(1),
            },
            Action::MoveDown => match self.focus {
                Pane::History => {
                    let last = self.session.history().list().len().saturating_sub(1);
                    self.history_cursor = (self.history_cursor + 1).min(last);
                }
                Pane::Server => {
                    let last = self.info_text.lines().count().saturating_sub(1) as u16;
                    self.info_scroll = (self.info_scroll + 1).min(last);
                }
                Pane::Players => {
                    let last = self.page.rows.len().saturating_sub(1);
                    self.player_cursor = (self.player_cursor + 1).min(last);
                }
            },
            Action::NextPage => {
                self.session.next_page();
                self.player_cursor = 0;
                self.refresh().await;
            }
            Action::PrevPage => {
                self.session.prev_page();
                self.player_cursor = 0;
                self.refresh().await;
            }
            Action::Activate => match self.focus {
                Pane::History => {
                    if let Some(address) = self.history_address() {
                        self.target_input.set_value(&address);
                        self.start_fetch(&address);
                    }
                }
                Pane::Players => {
                    let id = self.page.rows.get(self.player_cursor).map(|p| p.id());
                    let next = if id == self.session.selected_id() { None } else { id };
                    self.session.select(next);
                    self.refresh().await;
                }
                Pane::Server => {}
            },
            Action::ClearSelection => {
                self.session.select(None);
                self.refresh().await;
            }

            Action::OpenSearchName => {
                self.mode = InputMode::SearchName;
                self.focus = Pane::Players;
                self.name_input.activate();
            }
            Action::OpenSearchId => {
                self.mode = InputMode::SearchId;
                self.focus = Pane::Players;
                self.id_input.activate();
            }
            Action::SearchName(q) => {
                self.session.set_search_name(q);
                self.player_cursor = 0;
                self.refresh().await;
            }
            Action::SearchId(q) => {
                self.session.set_search_id(q);
                self.player_cursor = 0;
                self.refresh().await;
            }

            Action::StartRename => {
                if self.focus != Pane::History {
                    return;
                }
                let current = self
                    .session
                    .history()
                    .list()
                    .get(self.history_cursor)
                    .map(|e| e.custom_name.clone().unwrap_or_default());
                if let Some(name) = current {
                    self.rename_input.set_value(&name);
                    self.rename_input.activate();
                    self.mode = InputMode::Rename;
                }
            }
            Action::Rename(name) => {
                let Some(entry) = self.session.history().list().get(self.history_cursor) else {
                    return;
                };
                let (address, logo) = (entry.address.clone(), entry.logo_ref.clone());
                self.session
                    .history_mut()
                    .set_metadata(&address, Some(name), logo);
            }
            Action::ForgetEntry => {
                if self.focus != Pane::History {
                    return;
                }
                if let Some(address) = self.history_address() {
                    self.session.history_mut().remove(&address);
                    let last = self.session.history().list().len().saturating_sub(1);
                    self.history_cursor = self.history_cursor.min(last);
                }
            }
            Action::ClearHistory => {
                if self.focus == Pane::History {
                    self.session.history_mut().clear();
                    self.history_cursor = 0;
                }
            }

            Action::DismissToast => {
                self.session.notifications_mut().dismiss_newest();
            }
            Action::ToggleTheme => {
                self.prefs.theme = self.prefs.theme.toggled();
                self.palette = Palette::for_theme(self.prefs.theme);
                if let Err(e) = self.prefs.save(&self.prefs_path) {
                    warn!("[tui] could not save preferences: {}", e);
                }
                info!("[tui] theme -> {}", self.prefs.theme.label());
            }
            Action::Quit => self.should_quit = true,
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    fn draw(&self, frame: &mut Frame) {
        let palette = &self.palette;
        let area = frame.area();
        frame.render_widget(Block::default().style(palette.base()), area);

        let [top, body, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);
        self.target_input.draw(frame, top, palette);

        let [left, right] =
            Layout::horizontal([Constraint::Percentage(34), Constraint::Min(0)]).areas(body);

        let history_h = (self.session.history().list().len().max(1) + 2).min(MAX_ENTRIES + 2);
        let [history_area, info_area] =
            Layout::vertical([Constraint::Length(history_h as u16), Constraint::Min(0)])
                .areas(left);
        history_list::draw(
            frame,
            history_area,
            self.session.history().list(),
            self.history_cursor,
            self.focus == Pane::History,
            palette,
        );
        server_info::draw(
            frame,
            info_area,
            &self.info_text,
            self.info_scroll,
            self.focus == Pane::Server,
            palette,
        );

        let [search, table, detail] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(8),
        ])
        .areas(right);
        let [name_area, id_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Min(0)]).areas(search);
        self.name_input.draw(frame, name_area, palette);
        self.id_input.draw(frame, id_area, palette);

        player_table::draw(
            frame,
            table,
            &self.page,
            self.player_cursor,
            self.session.selected_id(),
            self.focus == Pane::Players,
            palette,
        );
        player_detail::draw(frame, detail, self.selected.as_ref(), palette);

        if self.mode == InputMode::Rename {
            self.rename_input.draw(frame, top, palette);
        }

        status_bar::draw(
            frame,
            status,
            self.mode,
            &self.page,
            self.fetching.as_deref(),
            palette,
        );
        toast::draw(frame, body, self.session.notifications(), palette);
    }
}
