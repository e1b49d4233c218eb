use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use autodidact::api::ApiClient;
use autodidact::app::{App, AppEvent};
use autodidact::config::{Config, API_URL_ENV};
use autodidact::ui;

/// Get the config directory path (~/.config/autodidact/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("autodidact"))
}

/// Sends logs to `autodidact.log` in the config directory so they do not
/// draw over the TUI. Falls back to stderr if the file cannot be opened.
fn init_tracing(config_dir: &std::path::Path) {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("autodidact=info"))
    };

    let log_path = config_dir.join("autodidact.log");
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .init();
            tracing::warn!(path = %log_path.display(), error = %e, "Cannot open log file, logging to stderr");
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "autodidact", about = "Terminal client for an LLM-backed learning syllabus")]
struct Args {
    /// Config file (default: ~/.config/autodidact/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend base URL, overrides config and AUTODIDACT_API_URL
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Preferred LLM model name
    #[arg(long, value_name = "NAME")]
    model: Option<String>,

    /// Start with completed topics visible
    #[arg(long)]
    show_completed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = std::fs::metadata(&config_dir) {
            let mut perms = metadata.permissions();
            perms.set_mode(0o700);
            // best effort; a shared config dir still works
            let _ = std::fs::set_permissions(&config_dir, perms);
        }
    }

    init_tracing(&config_dir);

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let env_url = std::env::var(API_URL_ENV).ok();
    config.apply_api_url_overrides(args.api_url.as_deref(), env_url.as_deref());
    if let Some(model) = args.model {
        config.default_model = Some(model);
    }
    if args.show_completed {
        config.show_completed = true;
    }

    let api = ApiClient::new(&config.api_base_url, config.request_timeout())
        .with_context(|| format!("Invalid backend URL '{}'", config.api_base_url))?;
    tracing::info!(base_url = %api.base_url(), "Starting autodidact");

    let mut app = App::new(api, &config);
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    ui::run(&mut app, event_tx, event_rx).await?;

    tracing::info!("Exited cleanly");
    Ok(())
}
