use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use log::{error, info, warn};
use serde_json::json;

use crate::api::AppState;
use crate::ingest::{self, ParseError};
use crate::sqlgen;
use crate::storage::StorageError;

fn reject(status: StatusCode, message: &str) -> Response {
	(
		status,
		Json(json!({ "success": false, "error": message })),
	)
		.into_response()
}

/// The body limit surfaces as a 413 while the multipart stream is read; it
/// has to keep the size-specific message rather than the generic one.
fn reject_multipart(e: &MultipartError) -> Response {
	if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
		return reject(
			StatusCode::BAD_REQUEST,
			"File too large. Maximum size is 10MB.",
		);
	}
	reject(StatusCode::BAD_REQUEST, "File upload error")
}

/// Multipart CSV upload: a `file` part plus an optional `tableName` text
/// part. The parsed and normalized rows replace any prior content stored
/// under the table name.
pub async fn upload_csv(State(state): State<AppState>, mut multipart: Multipart) -> Response {
	let mut file_name: Option<String> = None;
	let mut file_bytes: Option<axum::body::Bytes> = None;
	let mut table_name: Option<String> = None;

	loop {
		match multipart.next_field().await {
			Ok(Some(field)) => {
				let part = field.name().map(str::to_string);
				match part.as_deref() {
					Some("file") => {
						file_name = field.file_name().map(str::to_string);
						match field.bytes().await {
							Ok(b) => file_bytes = Some(b),
							Err(e) => {
								warn!("failed to read uploaded file: {}", e);
								return reject_multipart(&e);
							}
						}
					}
					Some("tableName") => match field.text().await {
						Ok(t) => table_name = Some(t),
						Err(e) => {
							warn!("failed to read tableName field: {}", e);
							return reject(StatusCode::BAD_REQUEST, "File upload error");
						}
					},
					_ => {}
				}
			}
			Ok(None) => break,
			Err(e) => {
				warn!("malformed multipart body: {}", e);
				return reject_multipart(&e);
			}
		}
	}

	let Some(bytes) = file_bytes else {
		return reject(StatusCode::BAD_REQUEST, "No file uploaded");
	};

	// extension gate; content sniffing is deliberately not attempted
	let is_csv = file_name
		.as_deref()
		.and_then(|n| n.rsplit('.').next())
		.is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
	if !is_csv {
		warn!("rejected upload with name {:?}", file_name);
		return reject(
			StatusCode::BAD_REQUEST,
			"Invalid file format. Only CSV allowed.",
		);
	}

	let table_name =
		table_name.unwrap_or_else(|| format!("table_{}", Utc::now().timestamp_millis()));
	if !sqlgen::is_valid_table_name(&table_name) {
		warn!("rejected invalid table name {:?}", table_name);
		return reject(
			StatusCode::BAD_REQUEST,
			"Invalid table name. Only alphanumeric characters and underscores allowed.",
		);
	}

	info!(
		"upload for table {} ({} bytes, file {:?})",
		table_name,
		bytes.len(),
		file_name
	);

	let records = match ingest::parse_csv(bytes.as_ref()) {
		Ok(records) => records,
		Err(e @ (ParseError::EmptyInput | ParseError::InconsistentColumns { .. })) => {
			warn!("rejected CSV for table {}: {}", table_name, e);
			return reject(StatusCode::BAD_REQUEST, &e.to_string());
		}
		Err(e) => {
			warn!("unreadable CSV for table {}: {}", table_name, e);
			return reject(StatusCode::BAD_REQUEST, &e.to_string());
		}
	};

	if let Err(e) = state.store.save_table(&table_name, &records) {
		error!("failed to save table {}: {}", table_name, e);
		return reject(
			StatusCode::INTERNAL_SERVER_ERROR,
			"Internal server error during file upload",
		);
	}

	(
		StatusCode::OK,
		Json(json!({
			"success": true,
			"tableName": table_name,
			"rows": records.len(),
		})),
	)
		.into_response()
}

pub async fn get_table(
	State(state): State<AppState>,
	Path(table_name): Path<String>,
) -> Response {
	if !sqlgen::is_valid_table_name(&table_name) {
		return reject(StatusCode::BAD_REQUEST, "Invalid table name");
	}

	match state.store.load_table(&table_name) {
		Ok(data) => (
			StatusCode::OK,
			Json(json!({ "success": true, "data": data })),
		)
			.into_response(),
		Err(StorageError::TableNotFound(_)) => reject(StatusCode::NOT_FOUND, "Table not found"),
		Err(e) => {
			error!("failed to load table {}: {}", table_name, e);
			reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
		}
	}
}

/// Regenerate the SQL script for a stored table, write it next to the data
/// and answer with a download URL built from the request `Host` header. The
/// script is never cached; every export call rebuilds it from the stored
/// record set.
pub async fn export_table(
	State(state): State<AppState>,
	Path(table_name): Path<String>,
	headers: HeaderMap,
) -> Response {
	if !sqlgen::is_valid_table_name(&table_name) {
		return reject(StatusCode::BAD_REQUEST, "Invalid table name");
	}

	let records = match state.store.load_table(&table_name) {
		Ok(records) => records,
		Err(StorageError::TableNotFound(_)) => {
			return reject(StatusCode::NOT_FOUND, "Table not found");
		}
		Err(e) => {
			error!("failed to load table {}: {}", table_name, e);
			return reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
		}
	};

	let sql = sqlgen::generate_sql(&table_name, &records);

	let file_name = match state.store.write_sql(&table_name, &sql) {
		Ok(name) => name,
		Err(e) => {
			error!("failed to write SQL file for {}: {}", table_name, e);
			return reject(
				StatusCode::INTERNAL_SERVER_ERROR,
				"Internal server error during export",
			);
		}
	};

	let host = headers
		.get(header::HOST)
		.and_then(|v| v.to_str().ok())
		.unwrap_or("localhost");
	let download_url = format!("http://{}/api/v1/tables/download/{}", host, file_name);

	info!("exported table {} to {}", table_name, file_name);
	(
		StatusCode::OK,
		Json(json!({ "success": true, "downloadUrl": download_url })),
	)
		.into_response()
}

pub async fn download_sql(
	State(state): State<AppState>,
	Path(file_name): Path<String>,
) -> Response {
	match state.store.read_sql(&file_name) {
		Ok((safe_name, bytes)) => {
			info!("serving download of {}", safe_name);
			(
				StatusCode::OK,
				[
					(header::CONTENT_TYPE, "application/sql".to_string()),
					(
						header::CONTENT_DISPOSITION,
						format!("attachment; filename=\"{}\"", safe_name),
					),
				],
				bytes,
			)
				.into_response()
		}
		Err(StorageError::InvalidFileType) => reject(StatusCode::BAD_REQUEST, "Invalid file type"),
		Err(StorageError::FileNotFound(_)) => reject(StatusCode::NOT_FOUND, "File not found"),
		Err(e) => {
			error!("failed to serve {}: {}", file_name, e);
			reject(
				StatusCode::INTERNAL_SERVER_ERROR,
				"Internal server error during download",
			)
		}
	}
}
