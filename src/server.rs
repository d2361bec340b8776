//! Server runtime.
//!
//! [`ServerHandle`] owns the full lifecycle: ledger store, services,
//! Telegram bot, HTTP server, background tasks and graceful shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::{IngestService, ReportService};
use crate::config::{default_config_path, AppConfig};
use crate::domain::LedgerRepository;
use crate::infrastructure::database::{open_ledger_store, DatabaseConfig, SeaOrmLedgerRepository};
use crate::infrastructure::storage::UploadArchive;
use crate::interfaces::bot::{spawn_bot_poller, BotContext};
use crate::interfaces::http::{create_router, AppState};
use crate::notifications::{create_event_bus, spawn_upload_notifier, SharedEventBus, TelegramLink};
use crate::support::shutdown::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Where settings saved from the web UI are written.
    pub config_path: PathBuf,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            config_path: default_config_path(),
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running TollVault server.
///
/// ```rust,no_run
/// use tollvault::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub event_bus: SharedEventBus,
    pub ledger: Arc<dyn LedgerRepository>,
    pub telegram: TelegramLink,
    /// Address the HTTP server is bound to.
    pub local_addr: SocketAddr,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: JoinHandle<()>,
    background: Vec<JoinHandle<()>>,
    bot: Arc<BotContext>,
}

/// The global recorder can only be installed once per process; restarts reuse it.
fn prometheus_handle() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("📊 Prometheus metrics recorder installed");
    Ok(PROM_HANDLE.get_or_init(|| handle).clone())
}

impl ServerHandle {
    /// Open the ledger, start the bot and bind the HTTP server.
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        info!("Starting TollVault...");

        let metrics = prometheus_handle()?;

        // ── Ledger store ───────────────────────────────────────
        let db_config = DatabaseConfig::sqlite(&app_cfg.database.path);
        info!("Database: {}", db_config.url);
        let db = open_ledger_store(&db_config).await?;
        let ledger: Arc<dyn LedgerRepository> = Arc::new(SeaOrmLedgerRepository::new(db.clone()));

        // ── Services ───────────────────────────────────────────
        let event_bus = create_event_bus();
        let ingest = Arc::new(IngestService::new(ledger.clone(), event_bus.clone()));
        let reports = ReportService::new(ledger.clone());
        let archive = UploadArchive::new(app_cfg.storage.uploads_dir.clone());
        info!("📁 Uploads archived under {}", archive.root().display());

        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── Telegram ───────────────────────────────────────────
        let telegram = TelegramLink::new();
        telegram.configure(&app_cfg.telegram).await;

        let config = Arc::new(RwLock::new(app_cfg.clone()));
        let mut background = Vec::new();
        background.push(spawn_upload_notifier(
            &event_bus,
            telegram.clone(),
            shutdown_signal.clone(),
        ));
        let bot_ctx = Arc::new(BotContext {
            link: telegram.clone(),
            ingest: ingest.clone(),
            reports: reports.clone(),
            archive: archive.clone(),
            database_path: PathBuf::from(&app_cfg.database.path),
        });
        background.push(spawn_bot_poller(bot_ctx.clone(), shutdown_signal.clone()));

        // ── HTTP server ────────────────────────────────────────
        let state = AppState {
            db: db.clone(),
            ledger: ledger.clone(),
            ingest,
            reports,
            archive,
            telegram: telegram.clone(),
            config,
            config_path: Arc::new(opts.config_path),
            metrics,
            started_at: Arc::new(Instant::now()),
        };
        let router = create_router(state);

        let addr = format!("{}:{}", app_cfg.server.host, app_cfg.server.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!("HTTP server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 HTTP server received shutdown signal");
        });
        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("HTTP server error: {}", e);
            }
        });

        info!("🚀 TollVault started");

        Ok(Self {
            event_bus,
            ledger,
            telegram,
            local_addr,
            db,
            shutdown,
            api_task,
            background,
            bot: bot_ctx,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install SIGTERM / Ctrl-C listeners that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait until shutdown has been triggered and every task has stopped.
    pub async fn wait(self) {
        let Self {
            db,
            shutdown,
            api_task,
            background,
            ..
        } = self;

        shutdown.signal().wait().await;

        shutdown
            .run_cleanup(async move {
                match api_task.await {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => error!("HTTP server task panicked: {}", e),
                }
                for task in background {
                    if let Err(e) = task.await {
                        error!("Background task panicked: {}", e);
                    }
                }
            })
            .await;

        if let Err(e) = db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("✅ Database connection closed");
        }
        info!("👋 TollVault shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down TollVault...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing from the configured level; `RUST_LOG` wins when set.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
