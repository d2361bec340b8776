//! HTTP router with Swagger UI

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::common::ApiResponse;
use super::modules::{
    analytics, dashboard, health, metrics as metrics_endpoint, settings, uploads,
};
use crate::application::{IngestService, ReportService};
use crate::config::SharedConfig;
use crate::domain::{LedgerRepository, PeriodRow, SlabCounts};
use crate::infrastructure::storage::UploadArchive;
use crate::notifications::TelegramLink;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Everything the handlers need. Each module extracts its own slice via
/// `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub ledger: Arc<dyn LedgerRepository>,
    pub ingest: Arc<IngestService>,
    pub reports: ReportService,
    pub archive: UploadArchive,
    pub telegram: TelegramLink,
    pub config: SharedConfig,
    pub config_path: Arc<PathBuf>,
    pub metrics: PrometheusHandle,
    pub started_at: Arc<Instant>,
}

impl FromRef<AppState> for dashboard::DashboardState {
    fn from_ref(s: &AppState) -> Self {
        Self {
            reports: s.reports.clone(),
            config: s.config.clone(),
        }
    }
}

impl FromRef<AppState> for uploads::UploadState {
    fn from_ref(s: &AppState) -> Self {
        Self {
            ingest: Arc::clone(&s.ingest),
            archive: s.archive.clone(),
        }
    }
}

impl FromRef<AppState> for analytics::AnalyticsState {
    fn from_ref(s: &AppState) -> Self {
        Self {
            reports: s.reports.clone(),
        }
    }
}

impl FromRef<AppState> for settings::SettingsState {
    fn from_ref(s: &AppState) -> Self {
        Self {
            config: s.config.clone(),
            config_path: Arc::clone(&s.config_path),
            telegram: s.telegram.clone(),
        }
    }
}

impl FromRef<AppState> for health::HealthState {
    fn from_ref(s: &AppState) -> Self {
        Self {
            db: s.db.clone(),
            telegram: s.telegram.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<AppState> for metrics_endpoint::MetricsState {
    fn from_ref(s: &AppState) -> Self {
        Self {
            handle: s.metrics.clone(),
            ledger: Arc::clone(&s.ledger),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        analytics::get_analytics,
        analytics::get_history,
        settings::get_settings,
        settings::save_settings,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            health::ComponentHealth,
            analytics::AnalyticsResponse,
            SlabCounts,
            PeriodRow,
            settings::SettingsDto,
            settings::SettingsResponse,
        )
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Analytics", description = "Revenue, GST and slab reports over the toll ledger"),
        (name = "Settings", description = "Telegram and storage settings"),
    ),
    info(
        title = "TollVault API",
        version = "0.1.0",
        description = "Toll-collection CSV analytics"
    )
)]
pub struct ApiDoc;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let pages = Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/history", get(dashboard::history))
        .route("/settings", get(dashboard::settings));

    let forms = Router::new()
        .route("/upload", post(uploads::upload_csv))
        .route("/reset", post(uploads::clear_last_upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let api = Router::new()
        .route("/analytics", get(analytics::get_analytics))
        .route("/history", get(analytics::get_history))
        .route(
            "/settings",
            get(settings::get_settings).post(settings::save_settings),
        );

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .merge(pages)
        .merge(forms)
        .nest("/api", api)
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics_endpoint::prometheus_metrics))
        .layer(middleware::from_fn(metrics_endpoint::http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::infrastructure::database::{open_ledger_store, DatabaseConfig, SeaOrmLedgerRepository};
    use crate::notifications::create_event_bus;
    use axum::body::Body;
    use axum::http::{header, Request, Response, StatusCode};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use tokio::sync::RwLock;
    use tower::Service;

    const BOUNDARY: &str = "tollvault-test-boundary";

    struct TestApp {
        dir: tempfile::TempDir,
        router: Router,
    }

    async fn app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("ledger.db").to_string_lossy().into_owned();
        let db = open_ledger_store(&DatabaseConfig::sqlite(&db_path)).await.unwrap();

        let ledger: Arc<dyn LedgerRepository> = Arc::new(SeaOrmLedgerRepository::new(db.clone()));
        let event_bus = create_event_bus();
        let config = AppConfig::default();

        let state = AppState {
            db,
            ledger: ledger.clone(),
            ingest: Arc::new(IngestService::new(ledger.clone(), event_bus)),
            reports: ReportService::new(ledger.clone()),
            archive: UploadArchive::new(dir.path().join("uploads")),
            telegram: TelegramLink::new(),
            config: Arc::new(RwLock::new(config)),
            config_path: Arc::new(dir.path().join("config.toml")),
            metrics: PrometheusBuilder::new().build_recorder().handle(),
            started_at: Arc::new(Instant::now()),
        };
        TestApp {
            router: create_router(state),
            dir,
        }
    }

    async fn send(app: &TestApp, req: Request<Body>) -> Response<Body> {
        let mut svc = app.router.clone().into_service();
        svc.call(req).await.unwrap()
    }

    async fn get(app: &TestApp, uri: &str) -> Response<Body> {
        send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn body_text(resp: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(resp: Response<Body>) -> Value {
        serde_json::from_str(&body_text(resp).await).unwrap()
    }

    fn upload_request(filename: &str, csv: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"csvfile\"; filename=\"{filename}\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {csv}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    const SAMPLE: &str = "ENROLMENT_NO_DATE,TOTAL_AMOUNT_CHARGED,GST_AMOUNT,OPERATOR_ID,RESIDENT_NAME\n\
                          A,125,10,OP1,Alice\n\
                          B,75,5,OP2,Bob\n\
                          A,125,10,OP1,Alice";

    #[tokio::test]
    async fn health_reports_ok() {
        let app = app().await;
        let resp = get(&app, "/health").await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["database"]["status"], "ok");
        assert_eq!(json["telegram"], "disabled");
    }

    #[tokio::test]
    async fn upload_then_analytics() {
        let app = app().await;

        let resp = send(&app, upload_request("toll.csv", SAMPLE)).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/");

        let json = body_json(get(&app, "/api/analytics").await).await;
        assert_eq!(json["revenue"], 200.0);
        assert_eq!(json["gst"], 15.0);
        assert_eq!(json["slabs"]["Count125"], 1);
        assert_eq!(json["slabs"]["Count75"], 1);
        assert_eq!(json["slabs"]["Count0"], 0);

        let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
        let archived = app.dir.path().join("uploads").join(&today).join("toll.csv");
        assert!(archived.exists());

        let json = body_json(get(&app, "/api/history?period=day").await).await;
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Period"], today);
        assert_eq!(rows[0]["Total"], 2);
        assert_eq!(rows[0]["GST"], 15.0);
    }

    #[tokio::test]
    async fn upload_with_missing_column_is_rejected() {
        let app = app().await;
        let resp = send(
            &app,
            upload_request("bad.csv", "ENROLMENT_NO_DATE,GST_AMOUNT\nA,10"),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_text(resp).await,
            "CSV error: missing column: TOTAL_AMOUNT_CHARGED"
        );
        let json = body_json(get(&app, "/api/analytics").await).await;
        assert_eq!(json["revenue"], 0.0);
    }

    #[tokio::test]
    async fn upload_without_file_field_is_bad_request() {
        let app = app().await;
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--{BOUNDARY}--\r\n"
        );
        let req = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        assert_eq!(send(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reset_clears_latest_batch() {
        let app = app().await;
        send(&app, upload_request("toll.csv", SAMPLE)).await;

        let req = Request::builder()
            .method("POST")
            .uri("/reset")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, req).await.status(), StatusCode::SEE_OTHER);

        let json = body_json(get(&app, "/api/analytics").await).await;
        assert_eq!(json["revenue"], 0.0);
    }

    #[tokio::test]
    async fn history_validates_dates_but_not_period() {
        let app = app().await;

        let resp = get(&app, "/api/history?from=yesterday").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);

        let resp = get(&app, "/api/history?period=decade&from=&to=").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, serde_json::json!([]));

        let resp = get(&app, "/history?period=month").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("<option value=\"month\" selected>"));
    }

    #[tokio::test]
    async fn dashboard_page_renders() {
        let app = app().await;
        let resp = get(&app, "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("Dashboard · TollVault"));
        assert!(html.contains("<b>₹0.00</b>"));
    }

    #[tokio::test]
    async fn settings_round_trip_through_config_file() {
        let app = app().await;

        let json = body_json(get(&app, "/api/settings").await).await;
        assert_eq!(json["data"]["settings"]["port"], 8080);

        let update = serde_json::json!({
            "telegram_token": "",
            "admin_chat_id": 42,
            "port": 9090,
            "db_path": "ledger.db",
            "uploads_dir": "uploads",
        });
        let req = Request::builder()
            .method("POST")
            .uri("/api/settings")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(update.to_string()))
            .unwrap();
        let resp = send(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"]["restart_required"], true);
        assert!(json["data"]["bot_username"].is_null());

        let saved = AppConfig::load(&app.dir.path().join("config.toml")).unwrap();
        assert_eq!(saved.server.port, 9090);
        assert_eq!(saved.telegram.admin_chat_id, 42);
    }

    #[tokio::test]
    async fn unwritable_config_file_keeps_live_settings() {
        let app = app().await;
        // a directory where the file should be makes the write fail
        std::fs::create_dir(app.dir.path().join("config.toml")).unwrap();

        let update = serde_json::json!({
            "telegram_token": "",
            "admin_chat_id": 7,
            "port": 9191,
            "db_path": "ledger.db",
            "uploads_dir": "uploads",
        });
        let req = Request::builder()
            .method("POST")
            .uri("/api/settings")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(update.to_string()))
            .unwrap();
        let resp = send(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(get(&app, "/api/settings").await).await;
        assert_eq!(json["data"]["settings"]["port"], 8080);
        assert_eq!(json["data"]["settings"]["admin_chat_id"], 0);
    }

    #[tokio::test]
    async fn settings_rejects_invalid_values() {
        let app = app().await;
        let req = Request::builder()
            .method("POST")
            .uri("/api/settings")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"telegram_token": "nope", "port": 0, "db_path": "", "uploads_dir": "u"}"#,
            ))
            .unwrap();

        let resp = send(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!app.dir.path().join("config.toml").exists());
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_text() {
        let app = app().await;
        let resp = get(&app, "/metrics").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }

    #[test]
    fn openapi_lists_report_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/analytics"));
        assert!(doc.paths.paths.contains_key("/api/history"));
        assert!(doc.paths.paths.contains_key("/api/settings"));
    }
}
