use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use fern::colors::{Color, ColoredLevelConfig};
use log::{LevelFilter, info};
use serde::Serialize;

/// Stem of the daily general log file; the date and `.log` suffix follow.
pub const LOG_FILE_PREFIX: &str = "csv2sql_";
/// Stem of the daily error-only log file.
pub const ERROR_FILE_PREFIX: &str = "errors_";

/// Install the process-wide logger: colored lines on stdout plus two
/// UTC-date-rotated files under `logs_dir`, one receiving everything and one
/// receiving error-level records only. Line shape is
/// `<RFC3339> [<LEVEL>] [<target>] <message>`, which the query endpoints
/// parse back.
pub fn init_logging(logs_dir: &Path, level: LevelFilter) -> Result<(), fern::InitError> {
	fs::create_dir_all(logs_dir)?;

	let colors = ColoredLevelConfig::new()
		.info(Color::Cyan)
		.warn(Color::Yellow)
		.error(Color::Red)
		.debug(Color::Magenta)
		.trace(Color::White);

	let stdout = fern::Dispatch::new()
		.format(move |out, message, record| {
			out.finish(format_args!(
				"{} [{}] [{}] {}",
				Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
				colors.color(record.level()),
				record.target(),
				message
			))
		})
		.chain(std::io::stdout());

	let general_file = fern::Dispatch::new()
		.format(|out, message, record| {
			out.finish(format_args!(
				"{} [{}] [{}] {}",
				Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
				record.level(),
				record.target(),
				message
			))
		})
		.chain(
			// rotation date must match the UTC date LogStore queries by
			fern::DateBased::new(logs_dir.join(LOG_FILE_PREFIX), "%Y-%m-%d.log").utc_time(),
		);

	// separate error feed for monitoring
	let error_file = fern::Dispatch::new()
		.level(LevelFilter::Error)
		.format(|out, message, record| {
			out.finish(format_args!(
				"{} [{}] [{}] {}",
				Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
				record.level(),
				record.target(),
				message
			))
		})
		.chain(
			fern::DateBased::new(logs_dir.join(ERROR_FILE_PREFIX), "%Y-%m-%d.log").utc_time(),
		);

	fern::Dispatch::new()
		.level(level)
		.chain(stdout)
		.chain(general_file)
		.chain(error_file)
		.apply()?;

	Ok(())
}

/// Per-file statistics reported by the logs stats endpoint.
#[derive(Debug, Serialize)]
pub struct LogFileStats {
	pub size: String,
	pub lines: usize,
	pub errors: usize,
	pub warnings: usize,
	pub info: usize,
	#[serde(rename = "lastModified")]
	pub last_modified: String,
}

/// Read-side companion to the fern sink: queries and prunes the daily log
/// files that `init_logging` writes.
pub struct LogStore {
	logs_dir: PathBuf,
	retention_days: i64,
}

impl LogStore {
	pub fn new<P: AsRef<Path>>(logs_dir: P, retention_days: i64) -> Self {
		Self {
			logs_dir: logs_dir.as_ref().to_path_buf(),
			retention_days,
		}
	}

	fn daily_files(&self, date: NaiveDate) -> [PathBuf; 2] {
		let suffix = date.format("%Y-%m-%d");
		[
			self.logs_dir.join(format!("{}{}.log", LOG_FILE_PREFIX, suffix)),
			self.logs_dir.join(format!("{}{}.log", ERROR_FILE_PREFIX, suffix)),
		]
	}

	/// Lines from today's general and error files whose leading timestamp
	/// falls within the last `hours` hours, sorted. Lines without a parseable
	/// timestamp are skipped.
	pub fn recent_lines(&self, hours: i64) -> std::io::Result<Vec<String>> {
		let cutoff = Utc::now() - Duration::hours(hours);
		let mut out = Vec::new();

		for path in self.daily_files(Utc::now().date_naive()) {
			if !path.exists() {
				continue;
			}
			let content = fs::read_to_string(&path)?;
			for line in content.lines() {
				let line = line.trim();
				if line.is_empty() {
					continue;
				}
				if let Some(ts) = line.split_whitespace().next() {
					if let Ok(parsed) = DateTime::parse_from_rfc3339(ts) {
						if parsed.with_timezone(&Utc) > cutoff {
							out.push(line.to_string());
						}
					}
				}
			}
		}

		out.sort();
		Ok(out)
	}

	/// Same window as [`recent_lines`], filtered to error-level lines.
	pub fn recent_errors(&self, hours: i64) -> std::io::Result<Vec<String>> {
		let lines = self.recent_lines(hours)?;
		Ok(lines.into_iter().filter(|l| l.contains("[ERROR]")).collect())
	}

	/// Size, line and per-level counts for every `.log` file in the
	/// directory, keyed by file name.
	pub fn stats(&self) -> std::io::Result<BTreeMap<String, LogFileStats>> {
		let mut out = BTreeMap::new();

		for entry in fs::read_dir(&self.logs_dir)? {
			let entry = entry?;
			let name = entry.file_name().to_string_lossy().to_string();
			if !name.ends_with(".log") {
				continue;
			}

			let meta = entry.metadata()?;
			let content = fs::read_to_string(entry.path())?;
			let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();

			let modified: DateTime<Utc> = meta.modified()?.into();
			out.insert(
				name,
				LogFileStats {
					size: format!("{:.2}KB", meta.len() as f64 / 1024.0),
					lines: lines.len(),
					errors: lines.iter().filter(|l| l.contains("[ERROR]")).count(),
					warnings: lines.iter().filter(|l| l.contains("[WARN]")).count(),
					info: lines.iter().filter(|l| l.contains("[INFO]")).count(),
					last_modified: modified.to_rfc3339_opts(SecondsFormat::Millis, true),
				},
			);
		}

		Ok(out)
	}

	/// Delete `.log` files whose mtime is older than the retention window.
	/// Returns the number of files removed.
	pub fn cleanup(&self) -> std::io::Result<usize> {
		let cutoff = Utc::now() - Duration::days(self.retention_days);
		let mut removed = 0;

		for entry in fs::read_dir(&self.logs_dir)? {
			let entry = entry?;
			let name = entry.file_name().to_string_lossy().to_string();
			if !name.ends_with(".log") {
				continue;
			}
			let modified: DateTime<Utc> = entry.metadata()?.modified()?.into();
			if modified < cutoff {
				fs::remove_file(entry.path())?;
				info!("removed old log file {}", name);
				removed += 1;
			}
		}

		Ok(removed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn write_line(dir: &Path, file: &str, ts: DateTime<Utc>, level: &str, msg: &str) {
		let line = format!(
			"{} [{}] [test] {}\n",
			ts.to_rfc3339_opts(SecondsFormat::Millis, true),
			level,
			msg
		);
		let path = dir.join(file);
		let existing = fs::read_to_string(&path).unwrap_or_default();
		fs::write(&path, existing + &line).expect("write log line");
	}

	fn today_file(prefix: &str) -> String {
		format!("{}{}.log", prefix, Utc::now().date_naive().format("%Y-%m-%d"))
	}

	#[test]
	fn recent_lines_respects_cutoff() {
		let dir = tempfile::tempdir().expect("tempdir");
		let store = LogStore::new(dir.path(), 7);
		let file = today_file(LOG_FILE_PREFIX);

		write_line(dir.path(), &file, Utc::now(), "INFO", "fresh");
		write_line(
			dir.path(),
			&file,
			Utc::now() - Duration::hours(48),
			"INFO",
			"stale",
		);

		let lines = store.recent_lines(24).expect("recent");
		assert_eq!(lines.len(), 1);
		assert!(lines[0].contains("fresh"));
	}

	#[test]
	fn error_filter_only_keeps_errors() {
		let dir = tempfile::tempdir().expect("tempdir");
		let store = LogStore::new(dir.path(), 7);
		let file = today_file(LOG_FILE_PREFIX);

		write_line(dir.path(), &file, Utc::now(), "INFO", "ok");
		write_line(dir.path(), &file, Utc::now(), "ERROR", "boom");

		let errors = store.recent_errors(24).expect("errors");
		assert_eq!(errors.len(), 1);
		assert!(errors[0].contains("boom"));
	}

	#[test]
	fn unparseable_lines_are_skipped() {
		let dir = tempfile::tempdir().expect("tempdir");
		let store = LogStore::new(dir.path(), 7);
		let file = today_file(LOG_FILE_PREFIX);

		fs::write(dir.path().join(&file), "not a log line\n").expect("write");
		write_line(dir.path(), &file, Utc::now(), "INFO", "ok");

		let lines = store.recent_lines(24).expect("recent");
		assert_eq!(lines.len(), 1);
	}

	#[test]
	fn stats_counts_levels() {
		let dir = tempfile::tempdir().expect("tempdir");
		let store = LogStore::new(dir.path(), 7);
		let file = today_file(LOG_FILE_PREFIX);

		write_line(dir.path(), &file, Utc::now(), "INFO", "a");
		write_line(dir.path(), &file, Utc::now(), "WARN", "b");
		write_line(dir.path(), &file, Utc::now(), "ERROR", "c");

		let stats = store.stats().expect("stats");
		let s = stats.get(&file).expect("file stats");
		assert_eq!(s.lines, 3);
		assert_eq!(s.info, 1);
		assert_eq!(s.warnings, 1);
		assert_eq!(s.errors, 1);
	}

	#[test]
	fn cleanup_ignores_fresh_files() {
		let dir = tempfile::tempdir().expect("tempdir");
		let store = LogStore::new(dir.path(), 7);
		let file = today_file(LOG_FILE_PREFIX);

		write_line(dir.path(), &file, Utc::now(), "INFO", "a");
		fs::write(dir.path().join("notes.txt"), "keep").expect("write");

		// freshly written files are inside the retention window
		let removed = store.cleanup().expect("cleanup");
		assert_eq!(removed, 0);
		assert!(dir.path().join(&file).exists());
		assert!(dir.path().join("notes.txt").exists());
	}
}
