use std::fmt;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use quiz_core::quiz::CompletionPolicy;
use services::{AppServices, Clock, QuizCatalog, QuizService, RemoteConfig};
use tracing::{info, warn};
use ui::{App, UiApp, build_app_context};

const RECENT_RESULTS: u32 = 10;

#[derive(Debug)]
enum ArgsError {
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Parser, Debug)]
#[command(name = "quiz", version, about = "Scenario-based quizzes with resumable progress")]
struct Cli {
    /// Local database for the progress mirror and finished results.
    #[arg(long = "db", env = "QUIZ_DB_URL", default_value = "sqlite://quiz.sqlite3", global = true)]
    db_url: String,

    /// Player name; progress is stored per user.
    #[arg(long = "user", env = "QUIZ_USERNAME", default_value = "player", global = true)]
    username: String,

    /// Base URL of the remote progress API. Without it the app runs offline.
    #[arg(long = "api-url", env = "QUIZ_API_BASE_URL", global = true)]
    api_url: Option<String>,

    /// Bearer token for the remote progress API.
    #[arg(long = "api-token", env = "QUIZ_API_TOKEN", global = true, hide_env_values = true)]
    api_token: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Launch the desktop app (default).
    Ui,
    /// Print the available quizzes and recent results.
    List,
}

impl Cli {
    fn remote_config(&self) -> Option<RemoteConfig> {
        match (self.api_url.as_deref(), self.api_token.as_deref()) {
            (Some(url), Some(token)) if !url.trim().is_empty() && !token.trim().is_empty() => {
                Some(RemoteConfig::new(url.trim(), token.trim()))
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!("remote progress API needs both --api-url and --api-token; running offline");
                None
            }
            _ => None,
        }
    }
}

struct DesktopApp {
    services: AppServices,
}

impl UiApp for DesktopApp {
    fn username(&self) -> String {
        self.services.username().to_string()
    }

    fn is_offline(&self) -> bool {
        self.services.is_offline()
    }

    fn catalog(&self) -> Arc<QuizCatalog> {
        self.services.catalog()
    }

    fn quiz_service(&self) -> Arc<QuizService> {
        self.services.quiz_service()
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn describe_rules(policy: &CompletionPolicy) -> String {
    match policy {
        CompletionPolicy::Percentage(policy) => {
            format!("pass with {}% correct", policy.pass_percent)
        }
        CompletionPolicy::Threshold(policy) => format!(
            "reach {} / {} / {} XP per tier",
            policy.basic_min, policy.intermediate_min, policy.advanced_min
        ),
    }
}

async fn list(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    println!("Quizzes:");
    for entry in services.catalog().entries() {
        println!(
            "  {:<18} {} ({}, {}s per question)",
            entry.quiz_id(),
            entry.title(),
            describe_rules(&entry.config.completion),
            entry.config.time_limit.as_secs()
        );
    }

    let rows = services
        .quiz_service()
        .history(None, RECENT_RESULTS)
        .await?;
    println!();
    if rows.is_empty() {
        println!("No finished quizzes for {}.", services.username());
        return Ok(());
    }
    println!("Recent results for {}:", services.username());
    for row in rows {
        let result = &row.result;
        println!(
            "  {}  {:<18} {:<10} score {:>3}%  {} XP",
            result.completed_at.format("%Y-%m-%d %H:%M"),
            result.quiz_name,
            result.status,
            result.score,
            result.experience
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Ui);

    if cli.db_url.trim().is_empty() {
        return Err(ArgsError::InvalidDbUrl { raw: cli.db_url }.into());
    }
    let db_url = normalize_sqlite_url(cli.db_url.clone());
    let remote = cli.remote_config();

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&db_url)?;
    let services = AppServices::new_sqlite(&db_url, Clock::system(), &cli.username, remote).await?;
    info!(db = %db_url, user = %services.username(), offline = services.is_offline(), "services ready");

    match command {
        Command::Ui => {
            let app: Arc<dyn UiApp> = Arc::new(DesktopApp { services });
            let context = build_app_context(&app);

            // On macOS, Dioxus/tao can default to an always-on-top window in some dev setups.
            let desktop_cfg = DesktopConfig::new().with_window(
                WindowBuilder::new()
                    .with_title("Scenario Quiz")
                    .with_always_on_top(false),
            );

            LaunchBuilder::desktop()
                .with_cfg(desktop_cfg)
                .with_context(context)
                .launch(App);
            Ok(())
        }
        Command::List => list(&services).await,
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
