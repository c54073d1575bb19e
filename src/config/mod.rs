use log::Level;
use serde::Deserialize;
use thiserror::Error;

/// Runtime configuration for csv2sql.
///
/// Values are loaded from (in order): `/etc/csv2sql/config.json`, a
/// `csv2sql/config.json` file in the user config folder (optional), and
/// environment variables prefixed with `C2S_` (e.g. `C2S_PORT`).
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(default)]
pub struct Settings {
	pub host: String,
	pub port: u16,
	/// Directory holding `<table>.json` files and the `sql/` export folder
	pub data_dir: String,
	/// Directory receiving the daily log files
	pub logs_dir: String,
	/// Upload size cap in bytes (the multipart body limit)
	pub max_upload_bytes: usize,
	/// Log files older than this many days are pruned
	pub log_retention_days: i64,
	pub log_level: Level,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			port: 3000,
			data_dir: "data".to_string(),
			logs_dir: "logs".to_string(),
			max_upload_bytes: 10 * 1024 * 1024,
			log_retention_days: 7,
			log_level: Level::Info,
		}
	}
}

#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("configuration error: {0}")]
	Config(#[from] config::ConfigError),
}

pub fn load() -> Result<Settings, SettingsError> {
	let mut builder = config::Config::builder()
		.add_source(config::File::with_name("/etc/csv2sql/config.json").required(false));

	if let Some(folder) = dirs::config_dir() {
		let user_config_path = folder.join("csv2sql").join("config.json");
		builder = builder.add_source(config::File::from(user_config_path).required(false));
	}

	builder = builder.add_source(config::Environment::with_prefix("C2S").separator("__"));

	let cfg = builder.build()?;

	let mut s: Settings = cfg.try_deserialize()?;

	// Prefer direct environment variables when present; some environments set
	// env vars in ways the `config` crate doesn't map as expected.
	if let Ok(h) = std::env::var("C2S_HOST") {
		if !h.is_empty() {
			s.host = h;
		}
	}
	if let Ok(p) = std::env::var("C2S_PORT") {
		if let Ok(parsed) = p.parse::<u16>() {
			s.port = parsed;
		}
	}
	if let Ok(d) = std::env::var("C2S_DATA_DIR") {
		if !d.is_empty() {
			s.data_dir = d;
		}
	}
	if let Ok(l) = std::env::var("C2S_LOGS_DIR") {
		if !l.is_empty() {
			s.logs_dir = l;
		}
	}
	if let Ok(m) = std::env::var("C2S_MAX_UPLOAD_BYTES") {
		if let Ok(parsed) = m.parse::<usize>() {
			s.max_upload_bytes = parsed;
		}
	}
	if let Ok(r) = std::env::var("C2S_LOG_RETENTION_DAYS") {
		if let Ok(parsed) = r.parse::<i64>() {
			s.log_retention_days = parsed;
		}
	}
	if let Ok(l) = std::env::var("C2S_LOG_LEVEL") {
		if !l.is_empty() {
			if let Ok(parsed) = l.parse::<Level>() {
				s.log_level = parsed;
			}
		}
	}

	Ok(s)
}
