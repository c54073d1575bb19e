pub mod api;
pub mod config;
pub mod ingest;
pub mod logfiles;
pub mod sqlgen;
pub mod storage;

use std::sync::Arc;

use anyhow::Context;
use log::{error, info};

use crate::logfiles::LogStore;
use crate::storage::TableStore;

/// Wire up the stores, schedule the midnight log pruning task and serve the
/// HTTP API until the process is stopped.
pub async fn run(settings: config::Settings) -> anyhow::Result<()> {
	let store =
		Arc::new(TableStore::new(&settings.data_dir).context("failed to create data directories")?);
	let logs = Arc::new(LogStore::new(
		&settings.logs_dir,
		settings.log_retention_days,
	));

	spawn_log_cleanup(logs.clone());

	let state = api::AppState {
		store,
		logs,
		max_upload_bytes: settings.max_upload_bytes,
	};
	let app = api::router(state);

	let addr = format!("{}:{}", settings.host, settings.port);
	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.with_context(|| format!("failed to bind {}", addr))?;
	info!("listening on http://{}", addr);

	axum::serve(listener, app).await?;
	Ok(())
}

/// Prune old log files once per day at local midnight, mirroring the manual
/// cleanup endpoint.
fn spawn_log_cleanup(logs: Arc<LogStore>) {
	tokio::spawn(async move {
		loop {
			let now = chrono::Local::now();
			let next_midnight = (now + chrono::Duration::days(1))
				.date_naive()
				.and_hms_opt(0, 0, 0)
				.expect("midnight is a valid time");
			let wait = (next_midnight - now.naive_local())
				.to_std()
				.unwrap_or_else(|_| std::time::Duration::from_secs(60));

			tokio::time::sleep(wait).await;

			match logs.cleanup() {
				Ok(removed) => info!("scheduled log cleanup removed {} files", removed),
				Err(e) => error!("scheduled log cleanup failed: {}", e),
			}
		}
	});
}
