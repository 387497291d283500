use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use secrecy::SecretString;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sacco_admin::api::{ApiClient, ApiError};
use sacco_admin::auth::{AuthError, AuthGuard};
use sacco_admin::config::{Backend, Config};
use sacco_admin::console::AdminConsole;
use sacco_admin::domain::{FormFields, ResourceKind};
use sacco_admin::notify::Notifier;
use sacco_admin::render;
use sacco_admin::repository::RepositoryError;
use sacco_admin::resource::{Prompt, ResourceError};
use sacco_admin::storage::{Database, DatabaseError, KeyValueStore};

/// Get the config directory path (~/.config/sacco-admin/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("sacco-admin"))
}

#[derive(Parser, Debug)]
#[command(name = "sacco-admin", about = "Admin back-office for the SACCO website")]
struct Args {
    /// Config file (default: <data-dir>/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the local store
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Override the configured backend
    #[arg(long, value_enum, global = true)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start an admin session. The password is typed without echo on a
    /// terminal, or read as one line from piped stdin.
    Login {
        #[arg(long, default_value = "admin")]
        username: String,
    },
    /// End the admin session
    Logout,
    /// Show session and backend status
    Status,
    /// Change admin username and password. Passwords are prompted
    /// without echo.
    Account {
        /// New username (keep the current one by passing it again)
        #[arg(long)]
        username: String,
    },
    /// List records of one content type
    List { kind: ResourceKind },
    /// Add a record: --field name=value, repeated
    Add {
        kind: ResourceKind,
        #[arg(long = "field", short = 'f', value_name = "NAME=VALUE")]
        fields: Vec<String>,
    },
    /// Change fields of an existing record
    Edit {
        kind: ResourceKind,
        id: i64,
        #[arg(long = "field", short = 'f', value_name = "NAME=VALUE")]
        fields: Vec<String>,
    },
    /// Delete a record after confirmation
    Delete {
        kind: ResourceKind,
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Feedback inbox; --view opens (and marks read) one message,
    /// --reply answers one
    Feedback {
        #[arg(long, value_name = "ID", conflicts_with = "reply")]
        view: Option<i64>,
        #[arg(long, value_name = "ID", requires = "message")]
        reply: Option<i64>,
        /// Reply text for --reply
        #[arg(long, requires = "reply")]
        message: Option<String>,
    },
    /// Submit the public contact form
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
    /// Content counts and unread feedback
    Dashboard,
    /// Listing as the public website sees it
    Public { kind: ResourceKind },
    /// Show branch contact details, or update one entry
    ContactInfo {
        #[arg(long, value_name = "ID", requires = "fields")]
        id: Option<i64>,
        #[arg(long = "field", short = 'f', value_name = "NAME=VALUE")]
        fields: Vec<String>,
    },
    /// Show or set the homepage hero image
    Hero { path: Option<PathBuf> },
}

impl Command {
    /// Commands open to website visitors.
    fn is_public(&self) -> bool {
        match self {
            Command::Login { .. } | Command::Contact { .. } | Command::Public { .. } => true,
            Command::ContactInfo { id, .. } => id.is_none(),
            _ => false,
        }
    }
}

/// Confirmation read from the terminal.
struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&self, message: &str) -> bool {
        match read_line(&format!("{} [y/N] ", message)) {
            Ok(answer) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read confirmation");
                false
            }
        }
    }
}

struct AssumeYes;

impl Prompt for AssumeYes {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

fn read_line(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    std::io::stderr().flush().ok();
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn read_secret(prompt: &str) -> Result<SecretString> {
    if !std::io::stdin().is_terminal() {
        return Ok(SecretString::from(read_line(prompt)?));
    }
    eprint!("{}", prompt);
    std::io::stderr().flush().ok();
    enable_raw_mode().context("Failed to switch the terminal to raw mode")?;
    let typed = read_hidden_line();
    let _ = disable_raw_mode();
    eprintln!();
    Ok(SecretString::from(typed?))
}

/// Collect key presses up to Enter without echoing them. Raw mode must be on.
fn read_hidden_line() -> Result<String> {
    let mut line = String::new();
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = event::read().context("Failed to read from terminal")?
        else {
            continue;
        };
        if kind != KeyEventKind::Press {
            continue;
        }
        match code {
            KeyCode::Enter => return Ok(line),
            KeyCode::Backspace => {
                line.pop();
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                anyhow::bail!("Interrupted")
            }
            KeyCode::Char(c) => line.push(c),
            _ => {}
        }
    }
}

fn login_required() -> ! {
    eprintln!("Please log in to continue: sacco-admin login");
    std::process::exit(1);
}

/// True when `err` comes from the server rejecting our tokens.
fn is_auth_failure(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<ResourceError>()
            .is_some_and(ResourceError::is_auth_failure)
            || cause
                .downcast_ref::<RepositoryError>()
                .is_some_and(RepositoryError::is_auth_failure)
            || matches!(
                cause.downcast_ref::<ApiError>(),
                Some(ApiError::AuthenticationFailed)
            )
    })
}

fn prepare_data_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).context("Failed to create data directory")?;
        println!("Created data directory: {}", dir.display());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)) {
            tracing::warn!(
                path = %dir.display(),
                error = %e,
                "Failed to set data directory permissions to 0700"
            );
        }
    }
    Ok(())
}

fn print_banners(notifier: &Notifier) {
    for banner in notifier.drain() {
        println!("{}", render::banner(&banner));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let data_dir = match &args.data_dir {
        Some(dir) => dir.clone(),
        None => get_config_dir()?,
    };
    prepare_data_dir(&data_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| data_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?
        .with_env_overrides();
    if let Some(backend) = args.backend {
        config.backend = backend;
    }

    let db_path = data_dir.join("store.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!("Error: The local store is locked by another sacco-admin process.");
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };
    let store: Arc<dyn KeyValueStore> = Arc::new(db);

    let api = ApiClient::from_config(&config, store.clone()).context("Invalid API URL")?;
    let guard = AuthGuard::new(store.clone(), config.session_lifetime());
    guard
        .credentials()
        .ensure_default()
        .await
        .context("Failed to initialise admin account")?;

    if !args.command.is_public() {
        match guard.require().await {
            Ok(()) => {}
            Err(AuthError::LoginRequired) => login_required(),
            Err(e) => return Err(e.into()),
        }
    }

    let notifier = Notifier::new(config.notification_timeout());
    let console = AdminConsole::new(config.backend, store, api.clone(), notifier.clone());

    let outcome = run(args.command, &config, &guard, &api, &console).await;
    print_banners(&notifier);
    match outcome {
        Err(e) if is_auth_failure(&e) => login_required(),
        outcome => outcome,
    }
}

async fn run(
    command: Command,
    config: &Config,
    guard: &AuthGuard,
    api: &ApiClient,
    console: &AdminConsole,
) -> Result<()> {
    match command {
        Command::Login { username } => {
            let password = read_secret("Password: ")?;
            match guard.login(&username, &password).await {
                Ok(()) => println!("Logged in as {}", username),
                Err(AuthError::InvalidCredentials) => {
                    eprintln!("Invalid username or password");
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
            if config.backend == Backend::Remote {
                if let Err(e) = api.login(&username, &password).await {
                    tracing::warn!(error = %e, "API login failed");
                    eprintln!("Warning: could not obtain API tokens: {}", e);
                }
            }
        }
        Command::Logout => {
            guard.logout().await?;
            println!("Logged out");
        }
        Command::Status => {
            println!("Backend:  {:?}", config.backend);
            println!("API:      {}", config.api_url()?);
            if let Some(expiry) = guard.session_expiry().await? {
                println!("Session:  valid until {}", expiry.format("%Y-%m-%d %H:%M UTC"));
            }
            println!(
                "Tokens:   {}",
                if api.is_authenticated().await { "present" } else { "none" }
            );
            let pending = console.desk().pending().await;
            if pending > 0 {
                println!("Outbox:   {} feedback message(s) waiting to be sent", pending);
            }
        }
        Command::Account { username } => {
            let current = read_secret("Current password: ")?;
            let new_password = read_secret("New password: ")?;
            let confirm = read_secret("Confirm new password: ")?;
            match guard
                .change_credentials(&current, &username, &new_password, &confirm)
                .await
            {
                Ok(change) if change.relogin_required => {
                    println!("Credentials updated. Please log in again with the new username.")
                }
                Ok(_) => println!("Credentials updated successfully!"),
                Err(e @ (AuthError::WrongPassword | AuthError::Validation(_))) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::List { kind } => {
            if let Some(Some(table)) = report(console.list(kind).await)? {
                print_table(kind, &table);
            }
        }
        Command::Add { kind, fields } => {
            let form = FormFields::parse_pairs(fields.iter().map(String::as_str))?;
            if let Some(Some(id)) = report(console.create(kind, &form).await)? {
                println!("Saved {} #{}", kind.label().to_lowercase(), id);
            }
        }
        Command::Edit { kind, id, fields } => {
            let form = FormFields::parse_pairs(fields.iter().map(String::as_str))?;
            report(console.edit(kind, id, &form).await)?;
        }
        Command::Delete { kind, id, yes } => {
            let prompt: &dyn Prompt = if yes { &AssumeYes } else { &StdinPrompt };
            report(console.delete(kind, id, prompt).await)?;
        }
        Command::Feedback {
            reply: Some(id),
            message,
            ..
        } => {
            let text = message.unwrap_or_default();
            match report(console.reply_feedback(id, &text).await)? {
                Some(Some(_)) => println!("Replied to feedback message #{}", id),
                Some(None) => println!("No feedback message #{}", id),
                None => {}
            }
        }
        Command::Feedback { view: Some(id), .. } => {
            match report(console.view_feedback(id).await)? {
                Some(Some(item)) => print!("{}", render::feedback(&item)),
                Some(None) => println!("No feedback message #{}", id),
                None => {}
            }
        }
        Command::Feedback { view: None, .. } => {
            if let Some(items) = report(console.desk().inbox().await)? {
                let table = render::Table::from_items(&items);
                print_table(ResourceKind::Feedback, &table);
            }
        }
        Command::Contact {
            name,
            email,
            message,
        } => match console.desk().submit_contact(&name, &email, &message).await {
            Ok(reply) => println!("{}", reply),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        Command::Dashboard => {
            print!("{}", render::dashboard(&console.dashboard().await));
            if config.backend == Backend::Remote {
                match api.dashboard_stats().await {
                    Ok(stats) => println!(
                        "Server reports: {} news, {} FAQs, {} downloads, {} gallery items, {} new feedback",
                        stats.total_news,
                        stats.total_faqs,
                        stats.total_downloads,
                        stats.total_gallery,
                        stats.new_feedback_count
                    ),
                    Err(e) => tracing::debug!(error = %e, "Server dashboard unavailable"),
                }
            }
        }
        Command::Public { kind } => {
            if let Some(Some(table)) = report(console.public(kind).await)? {
                print_table(kind, &table);
            }
        }
        Command::ContactInfo { id: Some(id), fields } => {
            let form = FormFields::parse_pairs(fields.iter().map(String::as_str))?;
            let updated = console.update_contact_info(id, &form).await?;
            println!("Updated contact entry #{}", updated.id.unwrap_or(id));
        }
        Command::ContactInfo { id: None, .. } => {
            for info in console.contact_info().await? {
                println!(
                    "#{} {} ({}): {} | {} | {}{}",
                    info.id.unwrap_or_default(),
                    info.name,
                    info.branch,
                    info.phone,
                    info.email,
                    info.address,
                    info.working_hours
                        .map(|h| format!(" | {}", h))
                        .unwrap_or_default()
                );
            }
        }
        Command::Hero { path: Some(path) } => {
            console.set_hero_image(&path).await?;
        }
        Command::Hero { path: None } => match console.hero_image().await? {
            Some(path) => println!("{}", path),
            None => println!("No hero image set"),
        },
    }
    Ok(())
}

/// Flatten a console outcome for the CLI.
///
/// Failures the console already announced through a banner become `None`.
/// An ended session stays an error so the command exits asking for login.
fn report<T>(outcome: Result<T, ResourceError>) -> Result<Option<T>> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_auth_failure() => Err(e.into()),
        Err(ResourceError::Cancelled) => {
            println!("Cancelled");
            Ok(None)
        }
        Err(e @ ResourceError::NotFound { .. }) => {
            eprintln!("{}", e);
            Ok(None)
        }
        Err(ResourceError::Validation(_) | ResourceError::Repository(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn print_table(kind: ResourceKind, table: &render::Table) {
    if table.is_empty() {
        println!("No {} found.", kind.plural().to_lowercase());
    } else {
        print!("{}", table.render());
    }
}
