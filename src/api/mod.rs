pub mod logs;
pub mod tables;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::warn;
use serde_json::json;

use crate::logfiles::LogStore;
use crate::storage::TableStore;

/// Shared handler state. The stores are the only cross-request resources;
/// the parsing and generation pipeline itself holds no shared state.
#[derive(Clone)]
pub struct AppState {
	pub store: Arc<TableStore>,
	pub logs: Arc<LogStore>,
	/// Upload size cap; also applied as the request body limit
	pub max_upload_bytes: usize,
}

/// Build the full application router. The state's `max_upload_bytes` caps the
/// multipart body; the upload handler maps the resulting limit error to the
/// size-specific rejection.
pub fn router(state: AppState) -> Router {
	let max_upload_bytes = state.max_upload_bytes;
	Router::new()
		.route("/api/v1/", get(api_index))
		.route("/api/v1/tables/upload", post(tables::upload_csv))
		.route("/api/v1/tables/{table_name}", get(tables::get_table))
		.route("/api/v1/tables/{table_name}/export", get(tables::export_table))
		.route("/api/v1/tables/download/{file_name}", get(tables::download_sql))
		.route("/api/v1/logs", get(logs::recent))
		.route("/api/v1/logs/errors", get(logs::recent_errors))
		.route("/api/v1/logs/stats", get(logs::stats))
		.route("/api/v1/logs/cleanup", post(logs::cleanup))
		.fallback(not_found)
		.layer(DefaultBodyLimit::max(max_upload_bytes))
		.with_state(state)
}

async fn api_index() -> Response {
	let routes = json!([
		{ "method": "POST", "path": "/api/v1/tables/upload", "description": "Upload a CSV file" },
		{ "method": "GET", "path": "/api/v1/tables/{tableName}", "description": "Get table data" },
		{ "method": "GET", "path": "/api/v1/tables/{tableName}/export", "description": "Export table data as SQL" },
		{ "method": "GET", "path": "/api/v1/tables/download/{fileName}", "description": "Download generated SQL file" },
		{ "method": "GET", "path": "/api/v1/logs", "description": "View recent logs" },
		{ "method": "GET", "path": "/api/v1/logs/errors", "description": "View recent errors only" },
		{ "method": "GET", "path": "/api/v1/logs/stats", "description": "View logs statistics" },
		{ "method": "POST", "path": "/api/v1/logs/cleanup", "description": "Clean old log files" },
	]);

	(
		StatusCode::OK,
		Json(json!({
			"success": true,
			"message": "Welcome to csv2sql",
			"data": routes,
		})),
	)
		.into_response()
}

async fn not_found(uri: Uri) -> Response {
	warn!("route not found: {}", uri.path());
	(
		StatusCode::NOT_FOUND,
		Json(json!({
			"success": false,
			"error": format!("Route {} not found", uri.path()),
		})),
	)
		.into_response()
}
