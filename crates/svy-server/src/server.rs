//! Web routes for the interactive converter.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;

use polars::prelude::{AnyValue, DataFrame};
use svy_ingest::any_to_string;
use svy_report::{DEFAULT_SHEET_NAME, xlsx_bytes};
use svy_transform::preview;

use crate::error::ApiError;
use crate::session::Session;

/// Uploads above this size are rejected outright.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Preview rows shown when the page does not ask for a specific count.
const DEFAULT_PREVIEW_ROWS: usize = 10;

const DEFAULT_OUTPUT_FILENAME: &str = "output.xlsx";

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Shared state: the single interactive session of this process.
#[derive(Clone, Default)]
pub struct AppState {
    session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/upload", post(upload))
        .route("/api/preview", get(preview_rows))
        .route("/api/labels", post(set_labels))
        .route("/api/select", post(set_selection))
        .route("/api/download", get(download))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn run(state: AppState, addr: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "survey converter listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// One column of the loaded dataset, as shown in the interface.
#[derive(Serialize)]
struct ColumnInfo {
    name: String,
    label: Option<String>,
    coded_values: usize,
}

/// Tabular preview of the current view.
#[derive(Serialize)]
struct TablePreview {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Full dataset summary returned after upload and after each transform.
#[derive(Serialize)]
struct DatasetResponse {
    columns: Vec<ColumnInfo>,
    total_rows: usize,
    labels_applied: bool,
    selection_applied: bool,
    preview: TablePreview,
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DatasetResponse>, ApiError> {
    let mut bytes: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| ApiError::bad_request(format!("malformed upload: {error}")))?
    {
        let take = field.name() == Some("file") || bytes.is_none();
        if take {
            let data = field
                .bytes()
                .await
                .map_err(|error| ApiError::bad_request(format!("malformed upload: {error}")))?;
            bytes = Some(data.to_vec());
        }
    }
    let bytes = bytes.ok_or_else(|| ApiError::bad_request("no file in upload"))?;

    let mut session = state.session.lock().await;
    session.load(&bytes)?;
    dataset_response(&session).map(Json)
}

#[derive(Deserialize)]
struct PreviewQuery {
    rows: Option<usize>,
}

async fn preview_rows(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<TablePreview>, ApiError> {
    let session = state.session.lock().await;
    let frame = session.current().ok_or_else(ApiError::no_dataset)?;
    Ok(Json(table_preview(
        frame,
        query.rows.unwrap_or(DEFAULT_PREVIEW_ROWS),
    )))
}

#[derive(Deserialize)]
struct LabelsRequest {
    apply: bool,
}

async fn set_labels(
    State(state): State<AppState>,
    Json(request): Json<LabelsRequest>,
) -> Result<Json<DatasetResponse>, ApiError> {
    let mut session = state.session.lock().await;
    if !session.is_loaded() {
        return Err(ApiError::no_dataset());
    }
    session.set_value_labels(request.apply)?;
    dataset_response(&session).map(Json)
}

#[derive(Deserialize)]
struct SelectRequest {
    #[serde(default)]
    columns: Vec<String>,
}

async fn set_selection(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<DatasetResponse>, ApiError> {
    let mut session = state.session.lock().await;
    if !session.is_loaded() {
        return Err(ApiError::no_dataset());
    }
    session.set_selection(request.columns)?;
    dataset_response(&session).map(Json)
}

#[derive(Deserialize)]
struct DownloadQuery {
    filename: Option<String>,
}

async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let session = state.session.lock().await;
    let frame = session.current().ok_or_else(ApiError::no_dataset)?;
    let bytes = xlsx_bytes(frame, DEFAULT_SHEET_NAME)?;

    let filename = sanitize_filename(query.filename.as_deref());
    info!(filename = %filename, size = bytes.len(), "serving spreadsheet download");
    let headers = [
        (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// Build the dataset summary from the session.
fn dataset_response(session: &Session) -> Result<DatasetResponse, ApiError> {
    let source = session.source().ok_or_else(ApiError::no_dataset)?;
    let current = session.current().ok_or_else(ApiError::no_dataset)?;

    let columns = source
        .frame
        .get_column_names()
        .iter()
        .map(|name| ColumnInfo {
            name: name.to_string(),
            label: source.metadata.label_for(name.as_str()).map(str::to_string),
            coded_values: source
                .metadata
                .value_labels
                .get(name.as_str())
                .map(svy_ingest::ValueLabels::len)
                .unwrap_or(0),
        })
        .collect();

    Ok(DatasetResponse {
        columns,
        total_rows: current.height(),
        labels_applied: session.labels_applied(),
        selection_applied: session.selection().is_some(),
        preview: table_preview(current, DEFAULT_PREVIEW_ROWS),
    })
}

/// Render the first rows of the frame as display strings.
fn table_preview(frame: &DataFrame, rows: usize) -> TablePreview {
    let head = preview(frame, rows);
    let columns: Vec<String> = head
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let series = head.get_columns();
    let mut table_rows = Vec::with_capacity(head.height());
    for row_idx in 0..head.height() {
        let mut row = Vec::with_capacity(series.len());
        for column in series {
            row.push(any_to_string(column.get(row_idx).unwrap_or(AnyValue::Null)));
        }
        table_rows.push(row);
    }

    TablePreview {
        columns,
        rows: table_rows,
    }
}

/// The download filename is user text with no extension rules; only strip
/// characters that would break the disposition header.
fn sanitize_filename(filename: Option<&str>) -> String {
    let cleaned: String = filename
        .unwrap_or(DEFAULT_OUTPUT_FILENAME)
        .chars()
        .filter(|ch| !ch.is_control() && *ch != '"')
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        DEFAULT_OUTPUT_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}
