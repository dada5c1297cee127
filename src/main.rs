// podflow - live topology of eBPF-traced pod connections
// Replays JSON-lines capture streams into a workload-grouped flow map

mod app;
mod flow;
mod graph;
mod session;
mod theme;
mod ui;
mod viewport;

use anyhow::{Context, Result};
use app::{
    config::DEFAULT_REFRESH_MS,
    event::{handle_key_event, handle_mouse_event},
    AppState,
};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Margin, Terminal};
use session::{CaptureSessions, SessionRequest};
use std::{io, path::PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "podflow", version, about = "Live terminal map of traced pod connections")]
struct Cli {
    /// JSON-lines capture source, `-` for stdin (repeatable, one session each)
    #[arg(short, long = "source", value_name = "PATH")]
    sources: Vec<String>,

    /// Keep reading sources after end of file
    #[arg(short, long)]
    follow: bool,

    /// UI refresh interval in milliseconds
    #[arg(long, default_value_t = DEFAULT_REFRESH_MS)]
    refresh_ms: u64,

    /// Directory for the rolling log file (defaults to the system temp dir)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-only logging; the terminal belongs to the TUI
fn init_logging(cli: &Cli) -> Result<WorkerGuard> {
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let log_dir = cli
        .log_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("podflow"));
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "podflow.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(guard)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(&cli)?;
    info!(sources = cli.sources.len(), follow = cli.follow, "Starting podflow");

    let mut app = AppState::new(Box::new(CaptureSessions::new()), cli.follow, cli.refresh_ms);
    for source in &cli.sources {
        if let Err(e) = app.start_session(SessionRequest::from_source(source.clone())) {
            warn!(%source, error = %e, "Failed to start session");
            app.error_banner = Some(e.to_string());
        }
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        warn!(error = %err, "podflow exited with an error");
        println!("Error: {:?}", err);
    }
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
) -> Result<()> {
    // Size the layout surface before the first batch lands
    let size = terminal.size()?;
    let area = ratatui::layout::Rect::new(0, 0, size.width, size.height);
    app.set_map_area(ui::flow_map_area(area).inner(Margin::new(1, 1)));

    loop {
        app.on_tick();
        app.update_frame_time();
        terminal.draw(|f| ui::draw(f, app))?;

        if !app.running {
            return Ok(());
        }

        if event::poll(app.refresh_config.ui_interval())? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key_event(app, key.code);
                }
                Event::Mouse(mouse) => handle_mouse_event(app, mouse),
                _ => {}
            }
        }
    }
}
