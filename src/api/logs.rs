use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, info};
use serde::Deserialize;
use serde_json::json;

use crate::api::AppState;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
	pub hours: Option<i64>,
}

fn failure(message: &str) -> Response {
	(
		StatusCode::INTERNAL_SERVER_ERROR,
		Json(json!({ "success": false, "error": message })),
	)
		.into_response()
}

/// Log lines from today's files within the last `hours` hours (default 24).
pub async fn recent(State(state): State<AppState>, Query(q): Query<LogsQuery>) -> Response {
	let hours = q.hours.unwrap_or(24);
	match state.logs.recent_lines(hours) {
		Ok(lines) => {
			let count = lines.len();
			(
				StatusCode::OK,
				Json(json!({
					"success": true,
					"data": lines,
					"hours": hours,
					"count": count,
				})),
			)
				.into_response()
		}
		Err(e) => {
			error!("failed to read recent logs: {}", e);
			failure("Failed to read logs")
		}
	}
}

/// Same window as [`recent`], error-level lines only.
pub async fn recent_errors(State(state): State<AppState>, Query(q): Query<LogsQuery>) -> Response {
	let hours = q.hours.unwrap_or(24);
	match state.logs.recent_errors(hours) {
		Ok(lines) => {
			let count = lines.len();
			(
				StatusCode::OK,
				Json(json!({
					"success": true,
					"data": lines,
					"hours": hours,
					"count": count,
				})),
			)
				.into_response()
		}
		Err(e) => {
			error!("failed to read recent errors: {}", e);
			failure("Failed to read logs")
		}
	}
}

pub async fn stats(State(state): State<AppState>) -> Response {
	match state.logs.stats() {
		Ok(stats) => {
			let total = stats.len();
			(
				StatusCode::OK,
				Json(json!({
					"success": true,
					"data": stats,
					"totalFiles": total,
				})),
			)
				.into_response()
		}
		Err(e) => {
			error!("failed to collect log stats: {}", e);
			failure("Failed to collect log statistics")
		}
	}
}

/// One-shot prune of log files older than the retention window.
pub async fn cleanup(State(state): State<AppState>) -> Response {
	match state.logs.cleanup() {
		Ok(removed) => {
			info!("log cleanup removed {} files", removed);
			(
				StatusCode::OK,
				Json(json!({
					"success": true,
					"message": "Logs cleaned successfully",
					"removed": removed,
				})),
			)
				.into_response()
		}
		Err(e) => {
			error!("log cleanup failed: {}", e);
			failure("Failed to clean logs")
		}
	}
}
