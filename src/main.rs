//! # llmviz CLI Entry Point
//!
//! ## Overview
//!
//! llmviz is a terminal catalog of short animated explainers for LLM
//! systems concepts. Each module plays a scripted simulation step by step,
//! with play/pause, single-step, reset and speed controls.
//!
//! ## Usage
//!
//! ```bash
//! # Browse the built-in catalog
//! llmviz
//!
//! # Open a module straight away at double speed
//! llmviz --module speculative-decoding --speed 2
//!
//! # Use a custom catalog and write debug logs to a file
//! RUST_LOG=llmviz=debug llmviz --catalog ./catalog.json --log-file llmviz.log
//!
//! # Print the catalog and exit
//! llmviz --list
//! ```
//!
//! ## Key Bindings
//!
//! ### Sidebar
//! - `j` / `Down`, `k` / `Up` - Move selection
//! - `Enter` - Open the selected module
//! - `/` - Search modules
//! - `c` - Customize the menu
//!
//! ### Panel
//! - `Space` / `p` - Play or pause
//! - `n` - Step once
//! - `r` - Reset
//! - `+` / `-` - Faster or slower
//! - `Esc` - Back to the sidebar
//!
//! ### Anywhere
//! - `t` - Next theme
//! - `i` - About
//! - `Tab` - Switch pane
//! - `q` - Quit

use llmviz::catalog::{builtin, Registry};
use llmviz::ui::{self, App, Config, KeyOutcome, Theme};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::fs::File;
use std::io::{self, Write};
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Trait for reading terminal events (allows dependency injection for testing)
trait EventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>>;
}

/// Production event reader that uses crossterm's event polling + read
struct CrosstermEventReader;

impl EventReader for CrosstermEventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if event::poll(timeout).context("Failed to poll for events")? {
            Ok(Some(
                event::read().context("Failed to read keyboard event")?,
            ))
        } else {
            Ok(None)
        }
    }
}

/// llmviz - step-by-step animated explainers of how LLMs run
#[derive(Parser, Debug)]
#[command(name = "llmviz")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Animated explainers of LLM systems concepts", long_about = None)]
struct Args {
    /// Load modules from a JSON catalog instead of the built-in one
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Config file to read and write (default: ~/.config/llmviz/config.json)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Open this module at startup
    #[arg(short, long, value_name = "ID")]
    module: Option<String>,

    /// Playback speed multiplier (0.25 to 4)
    #[arg(short, long, value_name = "FACTOR")]
    speed: Option<f64>,

    /// Print the catalog and exit
    #[arg(long)]
    list: bool,

    /// Write logs to this file (filter with RUST_LOG, default "info")
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up panic hook to ensure terminal is restored on panic
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Try to restore terminal state
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);

        // Call the original panic hook
        original_hook(panic_info);
    }));

    // Run the application and ensure cleanup happens
    let result = run_application(args).await;

    // Restore panic hook
    let _ = panic::take_hook();

    result
}

/// Install a file-backed tracing subscriber. Nothing is logged to the
/// terminal, which is owned by the TUI.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger: {e}"))
}

fn load_registry(catalog: Option<&Path>) -> Result<Registry> {
    match catalog {
        Some(path) => Registry::from_json_file(path),
        None => builtin::registry().context("Built-in catalog is invalid"),
    }
}

fn print_catalog(registry: &Registry, out: &mut impl Write) -> Result<()> {
    for module in registry.iter() {
        writeln!(
            out,
            "{:<24} {:<20} {} ({} steps)",
            module.id,
            module.category,
            module.title,
            module.content.script.len()
        )
        .context("Failed to write catalog listing")?;
    }
    Ok(())
}

/// Build the shell from the loaded config and command-line overrides.
fn build_app(registry: Registry, config: &Config, args: &Args) -> Result<App> {
    let theme = Theme::by_name(&config.theme).unwrap_or_else(|| {
        warn!(theme = %config.theme, "unknown theme, using default");
        Theme::default_theme()
    });
    let speed = args.speed.unwrap_or(config.speed);

    let mut app = App::new(registry, config.menu.clone(), theme.clone(), speed);

    if let Some(id) = &args.module {
        if !app.open_module(id) {
            bail!("Unknown module: {id} (run with --list to see available modules)");
        }
    }

    Ok(app)
}

async fn run_application(args: Args) -> Result<()> {
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let registry = load_registry(args.catalog.as_deref())?;

    if args.list {
        let stdout = io::stdout();
        return print_catalog(&registry, &mut stdout.lock());
    }

    let mut config = Config::load(args.config.as_deref());
    let mut app = build_app(registry, &config, &args)?;
    info!(modules = app.registry.len(), theme = %app.theme.name, "starting");

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode for terminal")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to setup terminal")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    // Run the app and ensure cleanup happens even on error
    let mut event_reader = CrosstermEventReader;
    let run_result = run_app(
        &mut terminal,
        &mut app,
        &mut event_reader,
        &mut config,
        args.config.as_deref(),
    )
    .await;

    // Restore terminal (always runs, even if run_app failed)
    let cleanup_result = cleanup_terminal(&mut terminal);

    // Return the first error that occurred, or Ok if both succeeded
    run_result?;
    cleanup_result?;

    Ok(())
}

/// Clean up terminal state
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;

    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to restore terminal")?;

    terminal.show_cursor().context("Failed to show cursor")?;

    Ok(())
}

/// Copy a settings change into the config and write it out. A failed write
/// is reported in the status line and does not stop the app.
fn persist(app: &mut App, config: &mut Config, path: Option<&Path>, outcome: KeyOutcome) {
    match outcome {
        KeyOutcome::ThemeChanged => config.theme = app.theme.name.to_string(),
        KeyOutcome::SpeedChanged => config.speed = app.speed(),
        KeyOutcome::MenuSaved(selection) => config.menu = Some(selection),
        KeyOutcome::Ignored | KeyOutcome::Handled => return,
    }

    if let Err(e) = config.save(path) {
        warn!(error = %format!("{e:#}"), "failed to save config");
        app.status = Some(format!("Could not save settings: {e}"));
    }
}

async fn run_app<B>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_reader: &mut dyn EventReader,
    config: &mut Config,
    config_path: Option<&Path>,
) -> Result<()>
where
    B: Backend,
    B::Error: Send + Sync + 'static,
{
    loop {
        // Apply steps delivered by the cadence task since the last frame
        app.process_ticks();

        terminal
            .draw(|f| ui::render(f, app))
            .context("Failed to draw terminal UI")?;

        // Poll faster while a playback is animating
        let poll_timeout = if app
            .active
            .as_ref()
            .is_some_and(|panel| panel.playback.is_running())
        {
            Duration::from_millis(16) // ~60fps while playing
        } else {
            Duration::from_millis(100)
        };

        let event = match event_reader.read_event(poll_timeout)? {
            Some(e) => e,
            None => continue,
        };

        if let Event::Key(key) = event {
            let outcome = ui::handle_key(app, key);
            persist(app, config, config_path, outcome);
        }

        if app.should_quit {
            break;
        }
    }

    info!("quitting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use llmviz::playback::PlaybackState;
    use ratatui::backend::TestBackend;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    /// Mock event reader for testing that returns a predetermined sequence of events
    struct MockEventReader {
        events: VecDeque<Event>,
    }

    impl MockEventReader {
        fn new(events: Vec<Event>) -> Self {
            Self {
                events: VecDeque::from(events),
            }
        }
    }

    impl EventReader for MockEventReader {
        fn read_event(&mut self, _timeout: Duration) -> Result<Option<Event>> {
            Ok(self.events.pop_front())
        }
    }

    /// Helper to create a key event
    fn key_event(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    fn args() -> Args {
        Args {
            catalog: None,
            config: None,
            module: None,
            speed: None,
            list: false,
            log_file: None,
        }
    }

    fn test_app() -> App {
        let registry = builtin::registry().unwrap();
        build_app(registry, &Config::default(), &args()).unwrap()
    }

    #[test]
    fn test_mock_event_reader() {
        let events = vec![key_event(KeyCode::Char('a')), key_event(KeyCode::Enter)];

        let mut reader = MockEventReader::new(events);

        assert!(matches!(
            reader.read_event(Duration::from_millis(10)).unwrap(),
            Some(Event::Key(KeyEvent {
                code: KeyCode::Char('a'),
                ..
            }))
        ));
        assert!(matches!(
            reader.read_event(Duration::from_millis(10)).unwrap(),
            Some(Event::Key(KeyEvent {
                code: KeyCode::Enter,
                ..
            }))
        ));

        // Should return None when no more events
        assert!(reader
            .read_event(Duration::from_millis(10))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_crossterm_event_reader_type() {
        let _reader: Box<dyn EventReader> = Box::new(CrosstermEventReader);
    }

    #[test]
    fn test_args_parsing() {
        let args = Args::try_parse_from([
            "llmviz",
            "--module",
            "kv-cache",
            "--speed",
            "2",
            "--log-file",
            "/tmp/llmviz.log",
        ])
        .unwrap();
        assert_eq!(args.module.as_deref(), Some("kv-cache"));
        assert_eq!(args.speed, Some(2.0));
        assert_eq!(args.log_file, Some(PathBuf::from("/tmp/llmviz.log")));
        assert!(!args.list);
    }

    #[test]
    fn test_args_parsing_defaults() {
        let args = Args::try_parse_from(["llmviz"]).unwrap();
        assert!(args.catalog.is_none());
        assert!(args.config.is_none());
        assert!(args.speed.is_none());
    }

    #[test]
    fn test_print_catalog() {
        let registry = builtin::registry().unwrap();
        let mut out = Vec::new();
        print_catalog(&registry, &mut out).unwrap();

        let listing = String::from_utf8(out).unwrap();
        assert_eq!(listing.lines().count(), registry.len());
        assert!(listing.contains("kv-cache"));
        assert!(listing.contains("steps)"));
    }

    #[test]
    fn test_build_app_unknown_module() {
        let registry = builtin::registry().unwrap();
        let args = Args {
            module: Some("no-such-module".to_string()),
            ..args()
        };
        let err = build_app(registry, &Config::default(), &args).unwrap_err();
        assert!(err.to_string().contains("Unknown module: no-such-module"));
    }

    #[test]
    fn test_build_app_applies_config() {
        let registry = builtin::registry().unwrap();
        let config = Config {
            theme: "Nord".to_string(),
            speed: 2.0,
            menu: None,
        };
        let app = build_app(registry, &config, &args()).unwrap();
        assert_eq!(app.theme.name, "Nord");
        assert_eq!(app.speed(), 2.0);

        // Command line wins over the config file
        let registry = builtin::registry().unwrap();
        let args = Args {
            speed: Some(0.5),
            ..args()
        };
        let app = build_app(registry, &config, &args).unwrap();
        assert_eq!(app.speed(), 0.5);
    }

    #[tokio::test]
    async fn test_run_application_missing_catalog() {
        let args = Args {
            catalog: Some(PathBuf::from("/nonexistent/catalog.json")),
            ..args()
        };

        let result = run_application(args).await;
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Failed to read catalog file"));
    }

    #[tokio::test]
    async fn test_run_app_opens_and_plays_module() {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let mut app = test_app();
        let mut reader = MockEventReader::new(vec![
            key_event(KeyCode::Enter),
            key_event(KeyCode::Char(' ')),
            key_event(KeyCode::Char('q')),
        ]);
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let mut config = Config::default();

        run_app(
            &mut terminal,
            &mut app,
            &mut reader,
            &mut config,
            Some(&config_path),
        )
        .await
        .unwrap();

        assert!(app.should_quit);
        let panel = app.active.as_ref().unwrap();
        assert_eq!(panel.module_id, app.registry.ids()[0]);
        assert_eq!(panel.playback.state(), PlaybackState::Running);
        // Nothing persisted for plain navigation
        assert!(!config_path.exists());
    }

    #[tokio::test]
    async fn test_run_app_persists_theme_and_menu() {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let mut app = test_app();
        let mut reader = MockEventReader::new(vec![
            key_event(KeyCode::Char('t')),
            key_event(KeyCode::Char('c')),
            key_event(KeyCode::Char(' ')),
            key_event(KeyCode::Enter),
            key_event(KeyCode::Char('q')),
        ]);
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let mut config = Config::default();

        run_app(
            &mut terminal,
            &mut app,
            &mut reader,
            &mut config,
            Some(&config_path),
        )
        .await
        .unwrap();

        let saved = Config::load_from(&config_path).unwrap();
        assert_eq!(saved.theme, "Catppuccin Latte");
        let menu = saved.menu.unwrap();
        assert_eq!(menu.modules.len(), app.registry.len() - 1);
        assert!(!menu.modules.contains(&app.registry.ids()[0]));
    }
}
