//! pia-console: terminal front-end for the PiaAGI backends.
//!
//! Usage: `pia-console [route]`, e.g. `pia-console /pes/prompts` or `pia-console /cml`.
//! Logs go to a daily file under `PIA_LOG_DIR` (default `logs`), never to the terminal.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pia_console_ui::{event_channel, ui, App, Dispatcher};
use pia_core::{Backends, ConsoleConfig, Route};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging() -> WorkerGuard {
    let dir = std::env::var("PIA_LOG_DIR").unwrap_or_else(|_| "logs".into());
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "pia-console.log"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    guard
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let _log_guard = init_logging();

    let config = ConsoleConfig::load()?;
    let backends = Backends::from_config(&config)?;
    tracing::info!(api = %config.api_base_url, cml = %config.cml_base_url, "pia-console starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;
    let (tx, rx) = event_channel();
    let dispatcher = Dispatcher::new(runtime.handle().clone(), backends.clone(), tx);

    let mut app = App::new(config.app_name.clone(), backends.pes.clone());
    if let Some(path) = std::env::args().nth(1) {
        match Route::parse(&path) {
            Some(route) => {
                let jobs = app.navigate(route);
                dispatcher.spawn_all(app.generation(), jobs);
            }
            None => return Err(format!("unknown route '{}'", path).into()),
        }
    }

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let outcome = run(&mut terminal, &mut app, &dispatcher, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    tracing::info!("pia-console stopped");
    outcome.map_err(Into::into)
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    dispatcher: &Dispatcher,
    mut rx: pia_console_ui::bridge::EventReceiver,
) -> std::io::Result<()> {
    loop {
        while let Ok(envelope) = rx.try_recv() {
            let jobs = app.apply(envelope);
            dispatcher.spawn_all(app.generation(), jobs);
        }
        if app.should_quit() {
            return Ok(());
        }

        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                let jobs = app.handle_key(key);
                dispatcher.spawn_all(app.generation(), jobs);
            }
        }
    }
}
