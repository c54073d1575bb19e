//! Exercises of the log query and pruning endpoints against seeded daily
//! log files.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, SecondsFormat, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use csv2sql::api::{self, AppState};
use csv2sql::logfiles::{ERROR_FILE_PREFIX, LOG_FILE_PREFIX, LogStore};
use csv2sql::storage::TableStore;

fn app(dir: &Path) -> Router {
	let store = Arc::new(TableStore::new(dir.join("data")).expect("table store"));
	fs::create_dir_all(dir.join("logs")).expect("logs dir");
	let logs = Arc::new(LogStore::new(dir.join("logs"), 7));
	api::router(AppState {
		store,
		logs,
		max_upload_bytes: 10 * 1024 * 1024,
	})
}

fn seed_line(dir: &Path, prefix: &str, age_hours: i64, level: &str, msg: &str) {
	let ts = Utc::now() - Duration::hours(age_hours);
	let file = dir.join("logs").join(format!(
		"{}{}.log",
		prefix,
		Utc::now().date_naive().format("%Y-%m-%d")
	));
	let line = format!(
		"{} [{}] [seed] {}\n",
		ts.to_rfc3339_opts(SecondsFormat::Millis, true),
		level,
		msg
	);
	let existing = fs::read_to_string(&file).unwrap_or_default();
	fs::write(&file, existing + &line).expect("seed log line");
}

async fn body_json(resp: axum::response::Response) -> Value {
	let bytes = resp.into_body().collect().await.expect("body").to_bytes();
	serde_json::from_slice(&bytes).expect("json body")
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
	app.clone()
		.oneshot(
			Request::builder()
				.uri(uri)
				.body(Body::empty())
				.expect("request"),
		)
		.await
		.expect("response")
}

#[tokio::test]
async fn recent_logs_filter_by_hours() {
	let dir = tempfile::tempdir().expect("tempdir");
	let app = app(dir.path());

	seed_line(dir.path(), LOG_FILE_PREFIX, 0, "INFO", "fresh entry");
	seed_line(dir.path(), LOG_FILE_PREFIX, 6, "INFO", "older entry");

	let resp = get(&app, "/api/v1/logs?hours=2").await;
	assert_eq!(resp.status(), StatusCode::OK);
	let json = body_json(resp).await;
	assert_eq!(json["success"], true);
	assert_eq!(json["hours"], 2);
	assert_eq!(json["count"], 1);
	assert!(
		json["data"][0]
			.as_str()
			.unwrap_or_default()
			.contains("fresh entry")
	);
}

#[tokio::test]
async fn default_window_is_24_hours() {
	let dir = tempfile::tempdir().expect("tempdir");
	let app = app(dir.path());

	seed_line(dir.path(), LOG_FILE_PREFIX, 6, "INFO", "within a day");

	let resp = get(&app, "/api/v1/logs").await;
	let json = body_json(resp).await;
	assert_eq!(json["hours"], 24);
	assert_eq!(json["count"], 1);
}

#[tokio::test]
async fn errors_endpoint_filters_level() {
	let dir = tempfile::tempdir().expect("tempdir");
	let app = app(dir.path());

	seed_line(dir.path(), LOG_FILE_PREFIX, 0, "INFO", "all good");
	seed_line(dir.path(), ERROR_FILE_PREFIX, 0, "ERROR", "something broke");

	let resp = get(&app, "/api/v1/logs/errors").await;
	let json = body_json(resp).await;
	assert_eq!(json["count"], 1);
	assert!(
		json["data"][0]
			.as_str()
			.unwrap_or_default()
			.contains("something broke")
	);
}

#[tokio::test]
async fn stats_reports_per_file_counts() {
	let dir = tempfile::tempdir().expect("tempdir");
	let app = app(dir.path());

	seed_line(dir.path(), LOG_FILE_PREFIX, 0, "INFO", "a");
	seed_line(dir.path(), LOG_FILE_PREFIX, 0, "WARN", "b");
	seed_line(dir.path(), LOG_FILE_PREFIX, 0, "ERROR", "c");

	let resp = get(&app, "/api/v1/logs/stats").await;
	let json = body_json(resp).await;
	assert_eq!(json["success"], true);
	assert_eq!(json["totalFiles"], 1);

	let file = format!(
		"{}{}.log",
		LOG_FILE_PREFIX,
		Utc::now().date_naive().format("%Y-%m-%d")
	);
	let stats = &json["data"][file.as_str()];
	assert_eq!(stats["lines"], 3);
	assert_eq!(stats["info"], 1);
	assert_eq!(stats["warnings"], 1);
	assert_eq!(stats["errors"], 1);
}

#[tokio::test]
async fn cleanup_endpoint_reports_removals() {
	let dir = tempfile::tempdir().expect("tempdir");
	let app = app(dir.path());

	// freshly seeded files sit inside the retention window
	seed_line(dir.path(), LOG_FILE_PREFIX, 0, "INFO", "keep me");

	let resp = app
		.clone()
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/api/v1/logs/cleanup")
				.body(Body::empty())
				.expect("request"),
		)
		.await
		.expect("cleanup");
	assert_eq!(resp.status(), StatusCode::OK);
	let json = body_json(resp).await;
	assert_eq!(json["success"], true);
	assert_eq!(json["removed"], 0);
}
