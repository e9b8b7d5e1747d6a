//! # intake: business diagnosis intake service
//!
//! `intake` is a small HTTP service behind a marketing site for policy-fund consulting. Visitors
//! submit a short contact form (a *lead*) and, later, a detailed *diagnosis* questionnaire that
//! may carry two documents: a business registration certificate and a credit report. The
//! service stores both kinds of submission, keeps the uploaded documents, notifies an operator
//! through a Telegram bot and serves the site's static files.
//!
//! ## Request Flow
//!
//! Every route under `/api` is handled by [`api::handlers`]. Submissions are decoded (JSON, or
//! `multipart/form-data` through the in-house [`multipart`] decoder), documents are written by
//! the [`storage::UploadSink`], the record is appended to its [`storage::Submissions`] file and
//! the response is sent. The operator notification is dispatched on a detached task
//! ([`notifications::dispatch`]) so a slow or failing Telegram API never affects the caller.
//!
//! Anything outside `/api` is answered from the configured static directory.
//!
//! ## Persistence
//!
//! There is no database. Leads, diagnoses and notification settings are each one JSON file,
//! rewritten atomically on every change; see [`storage`] for the failure semantics.
//!
//! ## Configuration
//!
//! See [`config`]. Telemetry is initialised in `main` through [`telemetry::init_telemetry`].

pub mod api;
pub mod config;
pub mod errors;
pub mod multipart;
pub mod notifications;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    routing::{delete, get, post},
};
use bon::Builder;
pub use config::Config;
use notifications::{Notifier, TelegramNotifier};
use std::sync::Arc;
use storage::{SettingsStore, SubmissionKind, Submissions, UploadSink};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info};

/// Application state shared across all request handlers.
///
/// Every store is created once at startup and shared by handle; handlers never construct
/// their own.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .diagnoses(diagnoses)
///     .leads(leads)
///     .settings(settings)
///     .uploads(uploads)
///     .notifier(notifier)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub diagnoses: Arc<Submissions>,
    pub leads: Arc<Submissions>,
    pub settings: Arc<SettingsStore>,
    pub uploads: Arc<UploadSink>,
    pub notifier: Arc<dyn Notifier>,
}

/// Open every store, creating missing files and directories.
///
/// `notifier` replaces the Telegram notifier when given.
async fn setup_state(config: &Config, notifier: Option<Arc<dyn Notifier>>) -> anyhow::Result<AppState> {
    let diagnoses = Arc::new(Submissions::new(SubmissionKind::Diagnosis, config.storage.diagnoses_path()));
    let leads = Arc::new(Submissions::new(SubmissionKind::Lead, config.storage.leads_path()));
    let settings = Arc::new(SettingsStore::new(config.storage.settings_path()));
    let uploads = Arc::new(UploadSink::new(&config.storage.uploads_dir));

    diagnoses.ensure_exists().await.context("Failed to initialise diagnoses file")?;
    leads.ensure_exists().await.context("Failed to initialise leads file")?;
    settings
        .ensure_exists()
        .await
        .context("Failed to initialise notification settings file")?;
    uploads.ensure_dir().await.context("Failed to create uploads directory")?;

    let notifier: Arc<dyn Notifier> = match notifier {
        Some(notifier) => notifier,
        None => Arc::new(TelegramNotifier::new(&config.telegram, settings.clone()).context("Failed to build Telegram client")?),
    };

    Ok(AppState::builder()
        .config(config.clone())
        .diagnoses(diagnoses)
        .leads(leads)
        .settings(settings)
        .uploads(uploads)
        .notifier(notifier)
        .build())
}

/// Permissive CORS for the site's own forms: any origin, the methods the API uses,
/// and a `Content-Type` request header.
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the application router.
///
/// - `/api/*`: submission, listing, deletion and notification-settings endpoints
/// - everything else: static files from `config.static_dir`
///
/// Request bodies are capped at `limits.max_body_size`. CORS is applied when enabled, and
/// every request is traced.
pub fn build_router(state: AppState) -> Router {
    use api::handlers::{leads, static_assets, submissions, telegram};

    let api_routes = Router::new()
        // Leads (first-stage contact form)
        .route("/submit-lead", post(leads::submit_lead))
        .route("/leads", get(leads::list_leads))
        .route("/leads/{id}", delete(leads::delete_lead))
        // Diagnoses (detailed questionnaire with documents)
        .route("/submit", post(submissions::submit_diagnosis))
        .route("/submissions", get(submissions::list_submissions))
        .route("/submissions/{id}", delete(submissions::delete_submission))
        // Operator notification settings
        .route(
            "/telegram-config",
            get(telegram::get_telegram_config).post(telegram::update_telegram_config),
        )
        .route("/telegram-test", post(telegram::send_test_notification));

    let body_limit = state.config.limits.max_body_size;
    let enable_cors = state.config.enable_cors;

    let router = Router::new()
        .nest("/api", api_routes)
        .fallback(static_assets::serve_static_file)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    let router = if enable_cors { router.layer(create_cors_layer()) } else { router };

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// The HTTP server with its stores opened.
///
/// 1. **Create**: [`Application::new`] opens the stores and builds the router
/// 2. **Serve**: [`Application::serve`] binds the port and handles requests until shutdown
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application that notifies through Telegram
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_notifier(config, None).await
    }

    /// Create a new application, optionally overriding the notifier
    pub async fn new_with_notifier(config: Config, notifier: Option<Arc<dyn Notifier>>) -> anyhow::Result<Self> {
        debug!("Starting intake with configuration: {:#?}", config);

        let state = setup_state(&config, notifier).await?;
        let router = build_router(state);

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Intake server listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::test_utils::*;
    use axum::http::{HeaderName, HeaderValue, StatusCode};

    #[tokio::test]
    async fn test_startup_creates_storage_files() {
        let app = create_test_app().await;
        let storage = &app.config.storage;

        assert_eq!(std::fs::read_to_string(storage.diagnoses_path()).unwrap(), "[]");
        assert_eq!(std::fs::read_to_string(storage.leads_path()).unwrap(), "[]");
        assert!(storage.settings_path().exists());
        assert!(storage.uploads_dir.is_dir());
    }

    #[tokio::test]
    async fn test_cors_preflight_is_answered() {
        let app = create_test_app().await;

        let response = app
            .server
            .method(axum::http::Method::OPTIONS, "/api/submit-lead")
            .add_header(HeaderName::from_static("origin"), HeaderValue::from_static("https://example.com"))
            .add_header(
                HeaderName::from_static("access-control-request-method"),
                HeaderValue::from_static("POST"),
            )
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("access-control-allow-origin"), "*");
        let methods = response.header("access-control-allow-methods");
        let methods = methods.to_str().unwrap();
        for method in ["GET", "POST", "DELETE", "PUT", "OPTIONS"] {
            assert!(methods.contains(method), "missing {method} in {methods}");
        }
    }

    #[tokio::test]
    async fn test_cors_headers_on_simple_request() {
        let app = create_test_app().await;

        let response = app
            .server
            .get("/api/leads")
            .add_header(HeaderName::from_static("origin"), HeaderValue::from_static("https://example.com"))
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("access-control-allow-origin"), "*");
    }

    #[tokio::test]
    async fn test_body_limit_is_enforced() {
        let app = create_test_app_with(|config| config.limits.max_body_size = 64).await;

        let response = app
            .server
            .post("/api/submit-lead")
            .content_type("application/json")
            .bytes(format!(r#"{{"companyName": "{}"}}"#, "x".repeat(200)).into())
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert!(app.leads().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_api_route_falls_through_to_static_404() {
        let app = create_test_app().await;

        let response = app.server.get("/api/does-not-exist").await;

        response.assert_status_not_found();
        response.assert_text("Not Found");
    }
}
