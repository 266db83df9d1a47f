mod app;
mod cache;
mod cli;
mod config;
mod dispatch;
mod input;
mod k8s;
mod model;
mod provider;
mod selection;
mod simulated;
mod ui;
mod views;

use anyhow::{Context, Result};
use app::{App, AppCommand};
use cache::JsonSelectionCache;
use clap::Parser;
use cli::CliArgs;
use config::{ProviderKind, Settings};
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use dispatch::{Completion, Dispatcher};
use futures::StreamExt;
use k8s::LiveProvider;
use provider::ClusterOperations;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use simulated::SimulatedProvider;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, args.log_file.as_deref())?;

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(provider) = args.provider {
        settings.provider = provider;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        settings.call_timeout = Duration::from_secs(timeout_secs.max(1));
    }
    match &settings.source {
        Some(path) => info!("loaded config from {}", path.display()),
        None => info!("no config file found, using defaults"),
    }

    let inventory = Arc::new(settings.inventory.clone());
    let provider: Arc<dyn ClusterOperations> = match settings.provider {
        ProviderKind::Live => Arc::new(LiveProvider::new()),
        ProviderKind::Simulated => Arc::new(SimulatedProvider::new(
            Arc::clone(&inventory),
            settings.simulated_latency,
        )),
    };
    let cache = JsonSelectionCache::new(
        settings
            .cache_path
            .clone()
            .unwrap_or_else(cache::default_cache_path),
    );
    debug!("selection cache at {}", cache.path().display());

    let (completion_tx, completion_rx) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher::new(provider, completion_tx, settings.call_timeout);
    let mut app = App::new(inventory, dispatcher, Box::new(cache));

    run(&mut app, completion_rx).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    // Raw mode owns stdout and stderr, so logs only ever go to a file.
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .try_init();
        }
        None => {
            let _ = builder.with_writer(io::sink).try_init();
        }
    }

    Ok(())
}

async fn run(app: &mut App, completions: mpsc::UnboundedReceiver<Completion>) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, completions).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    mut completions: mpsc::UnboundedReceiver<Completion>,
) -> Result<()> {
    let mut reader = EventStream::new();

    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            debug!("action={action:?}");
                            if app.apply_action(action) == AppCommand::Quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        app.set_status(format!("terminal event error: {error}"));
                    }
                    None => {
                        info!("terminal event stream closed");
                        break;
                    }
                }
            }
            maybe_completion = completions.recv() => {
                if let Some(completion) = maybe_completion {
                    app.on_completion(completion);
                }
            }
        }
    }

    Ok(())
}
