//! TollVault CLI server
//!
//! ```sh
//! # Run with default config (~/.config/tollvault/config.toml)
//! tollvault
//!
//! # Custom config path, no browser
//! tollvault --config /etc/tollvault/config.toml --headless
//!
//! # Validate config and database without serving
//! tollvault --check
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use tollvault::config::AppConfig;
use tollvault::infrastructure::browser::open_in_browser;
use tollvault::server::{init_tracing, ServerHandle, ServerOptions};

/// TollVault: toll-collection CSV analytics dashboard.
#[derive(Parser, Debug)]
#[command(
    name = "tollvault",
    version,
    about = "Toll-collection CSV analytics dashboard with a Telegram bot",
    long_about = "TollVault ingests daily toll CSV exports into a SQLite ledger and \
                  reports revenue, GST and fare-slab counts.\n\n\
                  Default config: ~/.config/tollvault/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "TOLLVAULT_CONFIG")]
    config: Option<PathBuf>,

    /// Override the HTTP listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Do not open the dashboard in a browser.
    #[arg(long)]
    headless: bool,

    /// Validate the configuration and database, then exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(tollvault::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(mut cfg) => {
            if let Some(ref level) = cli.log_level {
                cfg.logging.level = level.clone();
            }
            init_tracing(&cfg);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new(
                    cli.log_level.as_deref().unwrap_or("info"),
                ))
                .init();
            error!("Failed to load config from {}: {}", config_path.display(), e);
            if cli.check {
                return Err(e.into());
            }
            error!("Using default configuration.");
            AppConfig::default()
        }
    };

    if let Some(port) = cli.port {
        info!("CLI override: port = {}", port);
        config.server.port = port;
    }

    // ── Check mode ─────────────────────────────────────────────
    if cli.check {
        let db_config = tollvault::DatabaseConfig::sqlite(&config.database.path);
        let db = tollvault::open_ledger_store(&db_config).await?;
        db.close().await?;

        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Address     : {}:{}", config.server.host, config.server.port);
        println!("   Database    : {}", config.database.path);
        println!("   Uploads     : {}", config.storage.uploads_dir.display());
        println!(
            "   Telegram    : {}",
            if config.telegram.is_enabled() { "enabled" } else { "disabled" }
        );
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let dashboard_url = config.dashboard_url();
    let handle = ServerHandle::start(ServerOptions {
        config,
        config_path,
    })
    .await?;

    handle.install_signal_handler();

    if !cli.headless {
        let dashboard_url = dashboard_url.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            let _ = open_in_browser(&dashboard_url);
        });
    }

    info!("🚀 Dashboard at {}. Press Ctrl+C to shut down.", dashboard_url);

    handle.wait().await;

    Ok(())
}
