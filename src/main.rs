//! Agent Monitor - real-time dashboard for lead-generation agents
//!
//! Polls the agent backend for every job given on the command line and shows
//! their progress, logs and notifications in the terminal.

use std::io;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use eyre::WrapErr;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use agent_monitor::api::HttpBackend;
use agent_monitor::app::App;
use agent_monitor::cli::Cli;
use agent_monitor::event::EventHandler;
use agent_monitor::monitor::{AgentMonitor, MonitorCallbacks};

const LOG_FILE: &str = "agent-monitor.log";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let _guard = init_tracing(&cli)?;

    let monitor_config = cli.monitor_config()?;
    let jobs = cli.jobs().wrap_err("invalid --job argument")?;
    let backend = HttpBackend::with_timeout(cli.backend_url.clone(), cli.request_timeout())?;
    info!(backend = backend.base_url(), jobs = jobs.len(), "starting agent monitor");

    let (monitor, notifications) = AgentMonitor::new(Arc::new(backend), monitor_config, MonitorCallbacks::default());
    for job in jobs {
        monitor.register(job).await;
    }

    let app_config = cli.app_config();
    let mut event_handler = EventHandler::new(app_config.tick_rate());
    let mut app = App::new(app_config, monitor, notifications);

    let mut terminal = setup_terminal()?;
    let result = app.run(&mut terminal, &mut event_handler).await;
    restore_terminal()?;

    result
}

/// Log to a file; the terminal belongs to the dashboard.
fn init_tracing(cli: &Cli) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&cli.log_dir)
        .wrap_err_with(|| format!("cannot create log directory {}", cli.log_dir.display()))?;
    let file_appender = tracing_appender::rolling::never(&cli.log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&cli.log_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        .try_init()?;

    Ok(guard)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(io::stdout()))?)
}

fn restore_terminal() -> Result<()> {
    crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    crossterm::terminal::disable_raw_mode()?;

    Ok(())
}
