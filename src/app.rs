#![cfg(not(tarpaulin_include))]

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::Local;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::analytics::{TimeRange, dashboard_summary, geographic_analytics, time_analytics};
use crate::config::AdminConfig;
use crate::downloader::{self, ExportFormat, export_filename};
use crate::error::LoaderError;
use crate::filter::{FilterOptions, ITEMS_PER_PAGE, Page, UserQuery, filter_users, paginate};
use crate::loader::PaginatedUsers;
use crate::report::render_report;
use crate::store::{DocumentStore, JsonFileStore};
use crate::user::UserRecord;

pub struct AppState<S> {
    loader: Arc<PaginatedUsers<S>>,
}

impl<S> AppState<S> {
    pub fn new(loader: Arc<PaginatedUsers<S>>) -> Self {
        AppState { loader }
    }
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<usize>,
    per_page: Option<usize>,
}

#[derive(Deserialize)]
struct RangeQuery {
    range: Option<TimeRange>,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: String,
    message: String,
}

#[derive(Serialize)]
struct TableResponse {
    #[serde(flatten)]
    page: Page<UserRecord>,
    filters: FilterOptions,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            status: "error".to_string(),
            message: message.into(),
        }),
    )
        .into_response()
}

fn loader_error_response(err: LoaderError) -> Response {
    let status = match err {
        LoaderError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        LoaderError::ReadFailure(_) => StatusCode::BAD_GATEWAY,
        LoaderError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    };
    error_response(status, err.to_string())
}

/// Routes of the admin API over `state`.
pub fn router<S: DocumentStore>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/api/users", get(list_users::<S>))
        .route("/api/users/more", post(load_more::<S>))
        .route("/api/users/refresh", post(refresh::<S>))
        .route("/api/users/table", get(user_table::<S>))
        .route("/api/analytics/summary", get(summary::<S>))
        .route("/api/analytics/time", get(time_based::<S>))
        .route("/api/analytics/geographic", get(geographic::<S>))
        .route("/api/export/csv", get(export_csv::<S>))
        .route("/api/export/excel", get(export_excel::<S>))
        .route("/api/export/xlsx", get(export_xlsx::<S>))
        .route("/api/report", get(report::<S>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Open the database export, load the first page, follow live changes and
/// serve the API on `127.0.0.1:<port>`.
pub async fn run(config: AdminConfig) -> Result<(), Box<dyn Error>> {
    let store = JsonFileStore::open(&config.data_file);
    match &store {
        Ok(store) => info!("Reading users from {}", store.path().display()),
        Err(e) => warn!("Database unavailable: {e}"),
    }
    let loader = Arc::new(PaginatedUsers::from_init(store, config.loader.clone()));

    if let Err(e) = loader.load_initial().await {
        warn!("Starting without users: {e}");
    }
    let _live = loader.spawn_live_updates().unwrap_or_else(|e| {
        warn!("Live updates unavailable: {e}");
        None
    });

    let app = router(Arc::new(AppState::new(loader)));

    let addr = format!("127.0.0.1:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn list_users<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    Json(state.loader.snapshot())
}

async fn load_more<S: DocumentStore>(State(state): State<Arc<AppState<S>>>) -> Response {
    match state.loader.load_more().await {
        Ok(()) => Json(state.loader.snapshot()).into_response(),
        Err(e) => loader_error_response(e),
    }
}

async fn refresh<S: DocumentStore>(State(state): State<Arc<AppState<S>>>) -> Response {
    match state.loader.refresh().await {
        Ok(()) => Json(state.loader.snapshot()).into_response(),
        Err(e) => loader_error_response(e),
    }
}

async fn user_table<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<UserQuery>,
    Query(paging): Query<PageQuery>,
) -> impl IntoResponse {
    let users = state.loader.snapshot().users;
    let filtered = filter_users(&users, &query);
    let page = paginate(
        &filtered,
        paging.page.unwrap_or(1),
        paging.per_page.unwrap_or(ITEMS_PER_PAGE),
    );

    Json(TableResponse {
        page,
        filters: FilterOptions::from_users(&users),
    })
}

async fn summary<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    let users = state.loader.snapshot().users;
    Json(dashboard_summary(&users, &Local::now()))
}

async fn time_based<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<RangeQuery>,
) -> impl IntoResponse {
    let users = state.loader.snapshot().users;
    let range = params.range.unwrap_or_default();
    Json(time_analytics(&users, range, &Local::now()))
}

async fn geographic<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    let users = state.loader.snapshot().users;
    Json(geographic_analytics(&users))
}

fn filtered_users<S: DocumentStore>(
    state: &AppState<S>,
    query: &UserQuery,
) -> Vec<UserRecord> {
    filter_users(&state.loader.snapshot().users, query)
}

fn download(format: ExportFormat, body: impl Into<axum::body::Body>) -> Response {
    let filename = export_filename(format, Local::now().date_naive());
    (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body.into(),
    )
        .into_response()
}

async fn export_csv<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<UserQuery>,
) -> Response {
    let users = filtered_users(&state, &query);
    download(ExportFormat::Csv, downloader::to_csv(&users, &Local))
}

async fn export_excel<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<UserQuery>,
) -> Response {
    let users = filtered_users(&state, &query);
    download(ExportFormat::Excel, downloader::to_excel_csv(&users, &Local))
}

async fn export_xlsx<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<UserQuery>,
) -> Response {
    let users = filtered_users(&state, &query);
    match downloader::to_xlsx(&users, &Local) {
        Ok(bytes) => download(ExportFormat::Xlsx, bytes),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn report<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<UserQuery>,
) -> Response {
    let users = filtered_users(&state, &query);
    match render_report(&users, &Local::now()) {
        Ok(html) => Html(html).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
