//! LazyIssues - A terminal-based user interface for a REST issue tracker
//!
//! This application provides a TUI for browsing, searching and creating
//! issues directly from the terminal.

mod api;
mod app;
mod config;
mod error;
mod events;
mod logging;
mod tasks;
mod ui;

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::{auth, ApiEndpoints, ApiError, AuthContext, IssueClient, Session};
use crate::app::{App, Effect};
use crate::config::{Config, TOKEN_ENV};
use crate::error::AppError;
use crate::events::EventHandler;
use crate::tasks::{ApiMessage, TaskSpawner};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Terminal client for a REST issue tracker.
#[derive(Debug, Parser)]
#[command(name = "lazyissues", version, about)]
struct Cli {
    /// Base URL of the issues API (e.g. http://localhost:5000/api).
    #[arg(long)]
    api_url: Option<String>,

    /// Base URL of the web application, used to open issues in the browser.
    #[arg(long)]
    web_url: Option<String>,

    /// Bearer token to use instead of the one stored in the keyring.
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    /// Keyring profile the token is stored under.
    #[arg(long, default_value = "default")]
    profile: String,

    /// Path to the configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage the stored session token.
    #[command(subcommand)]
    Auth(AuthCommand),
}

#[derive(Debug, Subcommand)]
enum AuthCommand {
    /// Store a bearer token in the OS keyring.
    Login {
        /// The bearer token issued by the identity provider.
        #[arg(long)]
        token: String,
        /// Display name shown in the header.
        #[arg(long)]
        user: Option<String>,
    },
    /// Remove the stored token.
    Logout,
    /// Show whether a token is stored.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init()?;

    let result = run(cli);
    logging::shutdown();

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!(error = %e, "Exiting with error");
            eprintln!("{}", e.user_message());
            if let Some(action) = e.suggested_action() {
                eprintln!("{}", action);
            }
            if let Some(dir) = logging::log_directory() {
                eprintln!("Logs: {}", dir.display());
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run(mut cli: Cli) -> error::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command.take() {
        Some(Command::Auth(command)) => run_auth(command, &cli, &mut config),
        None => run_tui(&cli, &config),
    }
}

fn run_auth(command: AuthCommand, cli: &Cli, config: &mut Config) -> error::Result<()> {
    let profile = cli.profile.as_str();
    match command {
        AuthCommand::Login { token, user } => {
            let token = token.trim();
            if token.is_empty() {
                return Err(AppError::other("Token cannot be empty"));
            }
            auth::store_token(profile, token)?;
            if let Some(user) = user {
                config.user_name = Some(user);
                match &cli.config {
                    Some(path) => config.save_to(path)?,
                    None => config.save()?,
                }
            }
            info!(profile, "Token stored");
            println!("Signed in (profile '{}')", profile);
        }
        AuthCommand::Logout => {
            auth::delete_token(profile)?;
            info!(profile, "Token removed");
            println!("Signed out (profile '{}')", profile);
        }
        AuthCommand::Status => {
            if !auth::has_token(profile) {
                return Err(ApiError::NotSignedIn.into());
            }
            match &config.user_name {
                Some(user) => println!("Signed in as {} (profile '{}')", user, profile),
                None => println!("Signed in (profile '{}')", profile),
            }
        }
    }
    Ok(())
}

/// Pick the session token: command line or environment first, then the keyring.
fn resolve_session(cli: &Cli, config: &Config) -> Option<Session> {
    let token = match cli.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => match auth::get_token(&cli.profile) {
            Ok(token) => token,
            Err(e) => {
                debug!(error = %e, profile = %cli.profile, "No stored token");
                return None;
            }
        },
    };

    let session = Session::new(token);
    Some(match &config.user_name {
        Some(user) => session.with_user(user.clone()),
        None => session,
    })
}

fn run_tui(cli: &Cli, config: &Config) -> error::Result<()> {
    let api_url = config.resolve_api_url(cli.api_url.as_deref());
    let web_url = config.resolve_web_url(cli.web_url.as_deref());

    let client = IssueClient::new(
        ApiEndpoints::from_base(&api_url),
        Duration::from_secs(config.settings.request_timeout_secs),
    )?;

    let auth = match resolve_session(cli, config) {
        Some(session) => AuthContext::with_session(session),
        None => AuthContext::new(),
    };
    info!(api = %api_url, web = %web_url, signed_in = auth.is_signed_in(), "Starting TUI");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let spawner = TaskSpawner::new(tx, client);
    let mut app = App::new(auth, web_url, config.settings.date_format.clone());
    let events = EventHandler::with_tick_rate(config.settings.tick_rate_ms);

    install_panic_hook();
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut app, &events, &spawner, &mut rx);
    restore_terminal(&mut terminal)?;

    result
}

fn event_loop(
    terminal: &mut Tui,
    app: &mut App,
    events: &EventHandler,
    spawner: &TaskSpawner,
    rx: &mut mpsc::UnboundedReceiver<ApiMessage>,
) -> error::Result<()> {
    loop {
        run_effects(app, spawner);
        terminal.draw(|frame| app.view(frame))?;

        let event = events.next()?;
        app.update(event);

        while let Ok(message) = rx.try_recv() {
            app.handle_api_message(message);
        }

        if app.should_quit() {
            info!("Leaving event loop");
            return Ok(());
        }
    }
}

fn run_effects(app: &mut App, spawner: &TaskSpawner) {
    for effect in app.take_effects() {
        match effect {
            Effect::FetchIssues {
                request_id,
                session,
            } => spawner.spawn_fetch_issues(request_id, session),
            Effect::CreateIssue {
                request_id,
                session,
                draft,
            } => spawner.spawn_create_issue(request_id, session, draft),
            Effect::OpenUrl(url) => {
                if let Err(e) = open::that(&url) {
                    warn!(%url, error = %e, "Failed to open browser");
                    app.notify_error(format!("Could not open {}", url));
                }
            }
        }
    }
}

fn setup_terminal() -> error::Result<Tui> {
    enable_raw_mode().map_err(|e| AppError::terminal(format!("failed to enable raw mode: {}", e)))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| AppError::terminal(format!("failed to enter alternate screen: {}", e)))?;
    Terminal::new(CrosstermBackend::new(stdout))
        .map_err(|e| AppError::terminal(format!("failed to create terminal: {}", e)))
}

fn restore_terminal(terminal: &mut Tui) -> error::Result<()> {
    disable_raw_mode().map_err(|e| AppError::terminal(format!("failed to disable raw mode: {}", e)))?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .map_err(|e| AppError::terminal(format!("failed to leave alternate screen: {}", e)))?;
    terminal.show_cursor()?;
    Ok(())
}

/// Restore the terminal before the default panic output is printed.
fn install_panic_hook() {
    let original = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original(info);
    }));
}
