//! catalog-feed binary entrypoint kept minimal. The full runtime lives in `app`.

use std::fmt;
use std::sync::OnceLock;

use catalog_feed::{app, args, config};
use clap::Parser;

/// Log timestamp formatter: `YYYY-MM-DD-T HH:MM:SS` in local time.
struct CatalogTimer;

impl tracing_subscriber::fmt::time::FormatTime for CatalogTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let ts = chrono::Local::now().format("%Y-%m-%d-T %H:%M:%S");
        write!(w, "{ts}")
    }
}

/// Keeps the non-blocking log writer alive for the process lifetime.
static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// What: Initialize tracing, writing to `~/.config/catalog-feed/logs/catalog-feed.log`.
///
/// Inputs:
/// - `level`: Default filter when `RUST_LOG` is unset
/// - `to_stderr`: Log to stderr instead of the file (dump mode)
///
/// Details:
/// - Falls back to stderr when the log file cannot be opened.
fn init_logging(level: &str, to_stderr: bool) {
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
    };
    let mut log_path = config::logs_dir();
    log_path.push("catalog-feed.log");
    let file = if to_stderr {
        None
    } else {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| eprintln!("catalog-feed: cannot open {}: {e}", log_path.display()))
            .ok()
    };
    if let Some(file) = file {
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_target(false)
            .with_ansi(false)
            .with_writer(non_blocking)
            .with_timer(CatalogTimer)
            .init();
        let _ = LOG_GUARD.set(guard);
        tracing::info!(path = %log_path.display(), "logging initialized");
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_target(false)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .with_timer(CatalogTimer)
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = args::Args::parse();
    init_logging(&args::determine_log_level(&cli), cli.dump.is_some());

    let mut settings = config::settings();
    cli.apply_to(&mut settings);
    let key = cli.query_key(&settings);
    let ranking = cli.ranking();
    tracing::info!(
        api = %settings.api_base_url,
        kind = key.kind.as_config_key(),
        ?ranking,
        "catalog-feed starting"
    );

    if let Some(pages) = cli.dump {
        if let Err(err) = args::handle_dump(&settings, key, ranking, pages).await {
            tracing::error!(error = %err, "dump failed");
            eprintln!("catalog-feed: {err}");
            std::process::exit(1);
        }
        return;
    }

    if let Err(err) = app::run(settings, key, ranking).await {
        tracing::error!(error = ?err, "Application error");
        eprintln!("catalog-feed: {err}");
    }
    tracing::info!("catalog-feed exited");
}
