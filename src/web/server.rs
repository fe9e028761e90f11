//! HTTP server implementation for the web front-end.
//!
//! Serves the task JSON API, the `day` and `about` pages and their static
//! assets from the configured web root.

use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{
        Method, StatusCode, Uri,
        header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION},
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Datelike, Local};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use super::assets::{self, AssetKind, NO_STORE};
use crate::config::Config;
use crate::db::Database;
use crate::error::Error;
use crate::types::{PROPERTY_ID, Task, TaskId};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const DAY_PAGE: &str = "day.html";
const ABOUT_PAGE: &str = "about.html";

/// Web server state shared across handlers.
#[derive(Clone)]
pub struct WebServer {
    /// Task store.
    db: Database,
    /// Port the server listens on.
    port: u16,
    /// Directory holding the pages and their assets.
    web_root: Arc<PathBuf>,
}

impl WebServer {
    /// Create a server from the `web_port` and `web_root` configuration entries.
    pub fn new(config: &Config, db: Database) -> anyhow::Result<Self> {
        let port = config.web_port()?;
        let web_root = config.web_root()?.to_path_buf();
        Ok(Self::with_root(db, port, web_root))
    }

    pub fn with_root(db: Database, port: u16, web_root: impl Into<PathBuf>) -> Self {
        Self {
            db,
            port,
            web_root: Arc::new(web_root.into()),
        }
    }

    /// Get the database reference.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Get the configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn web_root(&self) -> &FsPath {
        &self.web_root
    }

    /// Build the request router.
    pub fn router(&self) -> Router {
        build_router(self.clone())
    }

    /// Listen on all interfaces until Ctrl-C.
    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Web server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Interrupt received, shutting down"),
        Err(e) => {
            error!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!(code = ?self.code, "{}", self.message);
        let body = json!({ "error": self.message });
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(CONTENT_TYPE, JSON_CONTENT_TYPE), (CACHE_CONTROL, NO_STORE)],
            body.to_string(),
        )
            .into_response()
    }
}

type HandlerResult = Result<Response, Error>;

fn json_response(value: &Value) -> Response {
    (
        [(CONTENT_TYPE, JSON_CONTENT_TYPE), (CACHE_CONTROL, NO_STORE)],
        value.to_string(),
    )
        .into_response()
}

fn success_response() -> Response {
    json_response(&json!({ "success": "true" }))
}

fn not_found() -> Response {
    StatusCode::NOT_FOUND.into_response()
}

/// Parse a path segment made of ASCII digits only.
fn parse_id(segment: &str) -> Option<TaskId> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

/// Redirect to today's page.
async fn root() -> Response {
    let today = Local::now().date_naive();
    let location = format!(
        "/day?year={:04}&month={:02}&day={:02}",
        today.year(),
        today.month(),
        today.day()
    );
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}

#[derive(serde::Serialize)]
struct InfoResponse {
    name: &'static str,
    version: &'static str,
    build_type: &'static str,
    git_hash: &'static str,
}

async fn api_info() -> Response {
    let info = InfoResponse {
        name: crate::NAME,
        version: crate::VERSION,
        build_type: crate::build_type(),
        git_hash: crate::GIT_HASH,
    };
    json_response(&json!(info))
}

async fn api_task_get(State(state): State<WebServer>, Path(id): Path<String>) -> HandlerResult {
    let Some(id) = parse_id(&id) else {
        return Ok(not_found());
    };
    match state.db().find_by_id::<Value>(id)? {
        Some(task) => Ok(json_response(&task)),
        None => Ok(not_found()),
    }
}

async fn api_task_delete(State(state): State<WebServer>, Path(id): Path<String>) -> HandlerResult {
    let Some(id) = parse_id(&id) else {
        return Ok(not_found());
    };
    state.db().delete_by_id(id)?;
    Ok(success_response())
}

async fn api_tasks_for_day(
    State(state): State<WebServer>,
    Path((year, month, day)): Path<(String, String, String)>,
) -> HandlerResult {
    if !(is_digits(&year, 4) && is_digits(&month, 2) && is_digits(&day, 2)) {
        return Ok(not_found());
    }
    let mut tasks = Vec::new();
    state
        .db()
        .visit_for_day(&format!("{}-{}-{}", year, month, day), |task: Value| {
            tasks.push(task);
            true
        })?;
    Ok(json_response(&Value::Array(tasks)))
}

/// Insert or update a task. The body is read as JSON whatever its declared type.
async fn api_task_post(State(state): State<WebServer>, body: Bytes) -> HandlerResult {
    let value: Value = serde_json::from_slice(&body).map_err(Error::json_shape)?;
    if value.get(PROPERTY_ID).is_some() {
        state.db().update_json(&value)?;
    } else {
        let task = Task::from_json(&value)?;
        let id = state.db().insert(&task)?;
        debug!(id, "Inserted task");
    }
    Ok(success_response())
}

/// Query parameters of the day page.
#[derive(Debug, Deserialize)]
struct DayParams {
    year: Option<String>,
    month: Option<String>,
    day: Option<String>,
}

async fn day_page(State(state): State<WebServer>, Query(params): Query<DayParams>) -> HandlerResult {
    let valid = matches!(
        (&params.year, &params.month, &params.day),
        (Some(y), Some(m), Some(d)) if is_digits(y, 4) && is_digits(m, 2) && is_digits(d, 2)
    );
    if !valid {
        return Ok(not_found());
    }
    assets::serve(state.web_root(), FsPath::new(DAY_PAGE), AssetKind::Html).await
}

async fn about_page(State(state): State<WebServer>) -> HandlerResult {
    assets::serve(state.web_root(), FsPath::new(ABOUT_PAGE), AssetKind::Html).await
}

/// Static assets, anything else is not found.
async fn fallback(State(state): State<WebServer>, method: Method, uri: Uri) -> HandlerResult {
    debug!(%method, %uri, "Fallback");
    if method != Method::GET {
        return Ok(not_found());
    }
    match assets::match_asset(uri.path()) {
        Some((kind, relative)) => assets::serve(state.web_root(), &relative, kind).await,
        None => Ok(not_found()),
    }
}

fn build_router(state: WebServer) -> Router {
    Router::new()
        // Pages
        .route("/", get(root))
        .route("/day", get(day_page))
        .route("/about", get(about_page))
        // JSON API
        .route("/api/info", get(api_info))
        .route("/api/task", post(api_task_post))
        .route("/api/task/id/{id}", get(api_task_get).delete(api_task_delete))
        .route("/api/tasks/{year}/{month}/{day}/", get(api_tasks_for_day))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
