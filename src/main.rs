//! TETRION - terminal front end
//!
//! Owns the real clock and the keyboard, feeds the engine once per frame and
//! renders the result.

mod keys;
mod ui;

use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use keys::{Command, KeyBindings, KeyTracker};
use ratatui::{Frame, Terminal, backend::CrosstermBackend};
use std::{
    io::{self, stdout},
    path::PathBuf,
    time::{Duration, Instant},
};
use tetrion::highscores::{HighScores, MAX_NAME_LEN};
use tetrion::session::{GameSession, SessionEvent};
use tetrion::settings::Settings;

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

/// Input delay after game over to prevent accidental skipping
const GAME_OVER_INPUT_DELAY: Duration = Duration::from_secs(1);

/// How long a clear message stays on screen
const MESSAGE_DURATION: Duration = Duration::from_millis(1500);

/// Which screen the application is on
enum Screen {
    Title,
    Playing,
    Paused,
    /// Game over with a qualifying score, waiting for a name
    NameEntry { name: String, ended_at: Instant },
    GameOver { ended_at: Instant },
}

/// Whether the main loop should keep going
#[derive(PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Application state
struct App {
    settings: Settings,
    keys: KeyTracker,
    session: GameSession,
    screen: Screen,
    high_scores: HighScores,
    high_scores_path: Option<PathBuf>,
    /// Last clear label and when it was shown; the renderer fades it out
    message: Option<(String, Instant)>,
    last_tick: Instant,
}

/// Get the tetrion temp directory, creating it if needed
fn tetrion_temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("tetrion");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn main() -> io::Result<()> {
    // Generate session ID for this instance
    let session_id: u32 = rand::random();

    // Setup tracing to log file
    let log_dir = tetrion_temp_dir();
    let log_file = format!("{:08x}.log", session_id);
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "tetrion=debug".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .init();

    tracing::info!(
        "TETRION starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let settings = Settings::load();
    let high_scores_path = HighScores::default_path();
    let high_scores = high_scores_path
        .as_deref()
        .map(HighScores::load)
        .unwrap_or_default();

    // Setup terminal
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if release_events {
        execute!(
            stdout(),
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
    }
    tracing::debug!(release_events, "keyboard setup");

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(settings, high_scores, high_scores_path, release_events);
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    if release_events {
        execute!(stdout(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    if let Err(e) = app.settings.save() {
        eprintln!("Warning: Could not save settings: {}", e);
    }

    if result.is_ok() {
        let score = app.session.score();
        println!("\nThanks for playing TETRION!");
        println!("Final Score: {}", score.points);
        println!("Level: {} | Lines: {}", score.level, score.lines);
    }

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|frame| app.render(frame))?;

        // Drain every pending event before advancing the game
        if event::poll(FRAME_DURATION)? {
            loop {
                if let Event::Key(key) = event::read()? {
                    if app.handle_key(key, Instant::now()) == Flow::Quit {
                        return Ok(());
                    }
                }
                if !event::poll(Duration::ZERO)? {
                    break;
                }
            }
        }

        app.tick(Instant::now());
    }
}

impl App {
    fn new(
        settings: Settings,
        high_scores: HighScores,
        high_scores_path: Option<PathBuf>,
        release_events: bool,
    ) -> Self {
        let bindings = KeyBindings::from_settings(&settings.keys);
        Self {
            session: GameSession::new(settings.rules()),
            keys: KeyTracker::new(bindings, release_events),
            settings,
            screen: Screen::Title,
            high_scores,
            high_scores_path,
            message: None,
            last_tick: Instant::now(),
        }
    }

    fn render(&self, frame: &mut Frame) {
        if let Screen::Title = self.screen {
            ui::render_title(frame, self.settings.gameplay.starting_level, &self.high_scores);
            return;
        }

        let message = self
            .message
            .as_ref()
            .filter(|(_, shown)| shown.elapsed() < MESSAGE_DURATION)
            .map(|(text, _)| text.as_str());
        ui::render_game(frame, &self.session, self.settings.gameplay.show_ghost, message);

        let points = self.session.score().points;
        match &self.screen {
            Screen::Paused => ui::render_overlay(frame, "PAUSED", "Press P to resume"),
            Screen::NameEntry { name, .. } => ui::render_name_entry(frame, points, name),
            Screen::GameOver { .. } => ui::render_game_over(frame, points, &self.high_scores),
            Screen::Title | Screen::Playing => {}
        }
    }

    /// Start a fresh game with the current settings
    fn start_game(&mut self, now: Instant) {
        self.session = GameSession::new(self.settings.rules());
        tracing::info!(level = self.settings.gameplay.starting_level, "game started");
        self.resume_play(now);
    }

    /// Restart the current game at its starting level
    fn restart_game(&mut self, now: Instant) {
        self.session.reset();
        tracing::info!("game restarted");
        self.resume_play(now);
    }

    fn resume_play(&mut self, now: Instant) {
        self.keys.clear();
        self.keys.snapshot(now);
        self.message = None;
        self.last_tick = now;
        self.screen = Screen::Playing;
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        if key.kind == KeyEventKind::Release {
            if let Screen::Playing = self.screen {
                self.keys.key_up(key.code);
            }
            return Flow::Continue;
        }
        let repeat = key.kind == KeyEventKind::Repeat;
        let command = self.keys.bindings().command(key.code);

        match &mut self.screen {
            Screen::Title => match key.code {
                KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                    self.settings.gameplay.cycle_starting_level();
                }
                KeyCode::Enter | KeyCode::Char(' ') => self.start_game(now),
                KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
                _ => {}
            },
            Screen::Playing => match command {
                Some(Command::Pause) if !repeat => {
                    self.keys.clear();
                    self.screen = Screen::Paused;
                }
                Some(Command::Restart) if !repeat => self.restart_game(now),
                Some(Command::Quit) => self.screen = Screen::Title,
                Some(_) => {}
                None => self.keys.key_down(key.code, repeat, now),
            },
            Screen::Paused => match command {
                Some(Command::Pause) if !repeat => {
                    self.last_tick = now;
                    self.screen = Screen::Playing;
                }
                Some(Command::Restart) => self.restart_game(now),
                Some(Command::Quit) => self.screen = Screen::Title,
                _ => {}
            },
            Screen::NameEntry { name, ended_at } => {
                if ended_at.elapsed() < GAME_OVER_INPUT_DELAY {
                    return Flow::Continue;
                }
                match key.code {
                    KeyCode::Char(c) if c.is_ascii_alphanumeric() && name.chars().count() < MAX_NAME_LEN => {
                        name.push(c.to_ascii_uppercase());
                    }
                    KeyCode::Backspace => {
                        name.pop();
                    }
                    KeyCode::Enter => {
                        let name = std::mem::take(name);
                        self.save_high_score(&name);
                        self.screen = Screen::GameOver { ended_at: now };
                    }
                    KeyCode::Esc => self.screen = Screen::GameOver { ended_at: now },
                    _ => {}
                }
            }
            Screen::GameOver { ended_at } => {
                if ended_at.elapsed() < GAME_OVER_INPUT_DELAY {
                    return Flow::Continue;
                }
                match key.code {
                    KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('r') => self.restart_game(now),
                    KeyCode::Esc | KeyCode::Char('q') => self.screen = Screen::Title,
                    _ => {}
                }
            }
        }

        Flow::Continue
    }

    /// Advance the game by the real time since the last frame
    fn tick(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_tick);
        self.last_tick = now;
        if !matches!(self.screen, Screen::Playing) {
            return;
        }

        let input = self.keys.snapshot(now);
        let result = self.session.update(&input, elapsed);

        for event in &result.events {
            match event {
                SessionEvent::Locked(lock) => {
                    if let Some(label) = lock.clear.label() {
                        self.message = Some((label, now));
                    }
                }
                SessionEvent::LevelUp(level) => {
                    self.message = Some((format!("Level {level}!"), now));
                }
                _ => {}
            }
        }

        if result.game_over {
            let points = self.session.score().points;
            self.screen = if self.high_scores.qualifies(points) {
                Screen::NameEntry {
                    name: self.settings.player.name.clone(),
                    ended_at: now,
                }
            } else {
                Screen::GameOver { ended_at: now }
            };
        }
    }

    /// Record the finished game under `name` and persist the table
    fn save_high_score(&mut self, name: &str) {
        let points = self.session.score().points;
        if !self.high_scores.record_now(points, name) {
            return;
        }
        self.settings.player.name = name.to_string();

        let Some(path) = &self.high_scores_path else {
            tracing::warn!("no data directory, high score not saved");
            return;
        };
        match self.high_scores.save(path) {
            Ok(()) => tracing::info!(points, player = name, path = %path.display(), "high score saved"),
            Err(e) => tracing::warn!("could not save high scores: {}", e),
        }
    }
}
