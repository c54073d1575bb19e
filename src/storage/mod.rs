use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::ingest::Record;

/// Failures from the flat-file table store. `TableNotFound` and
/// `FileNotFound` map to 404s at the HTTP layer, `InvalidFileType` to a 400.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("table '{0}' not found")]
	TableNotFound(String),
	#[error("file '{0}' not found")]
	FileNotFound(String),
	#[error("invalid file type")]
	InvalidFileType,
	#[error("storage I/O error: {0}")]
	Io(#[from] std::io::Error),
	#[error("corrupt table data: {0}")]
	Json(#[from] serde_json::Error),
}

/// Flat-file storage: one pretty-printed JSON array per table under
/// `data_dir`, generated SQL scripts under `data_dir/sql`. Each upload fully
/// replaces prior content for its table name; there is no locking, so two
/// concurrent uploads to the same name race with last-writer-wins.
pub struct TableStore {
	data_dir: PathBuf,
	sql_dir: PathBuf,
}

impl TableStore {
	pub fn new<P: AsRef<Path>>(data_dir: P) -> std::io::Result<Self> {
		let data_dir = data_dir.as_ref().to_path_buf();
		let sql_dir = data_dir.join("sql");
		fs::create_dir_all(&data_dir)?;
		fs::create_dir_all(&sql_dir)?;
		Ok(Self { data_dir, sql_dir })
	}

	fn table_path(&self, table_name: &str) -> PathBuf {
		self.data_dir.join(format!("{}.json", table_name))
	}

	/// Persist the full record set for a table, replacing prior content.
	/// Writes go to a temp file first and are renamed into place so a
	/// crashed request never leaves a half-written table behind.
	pub fn save_table(&self, table_name: &str, records: &[Record]) -> Result<(), StorageError> {
		let json = serde_json::to_vec_pretty(records)?;
		let path = self.table_path(table_name);
		write_atomic(&path, &json)?;
		info!(
			"saved table {} ({} rows, {} bytes)",
			table_name,
			records.len(),
			json.len()
		);
		Ok(())
	}

	pub fn load_table(&self, table_name: &str) -> Result<Vec<Record>, StorageError> {
		let path = self.table_path(table_name);
		if !path.exists() {
			warn!("table {} not found at {}", table_name, path.display());
			return Err(StorageError::TableNotFound(table_name.to_string()));
		}
		let bytes = fs::read(&path)?;
		Ok(serde_json::from_slice(&bytes)?)
	}

	/// Write an export script to `data_dir/sql/<table>.sql`, overwriting any
	/// previous export, and return the file name for URL construction.
	pub fn write_sql(&self, table_name: &str, sql: &str) -> Result<String, StorageError> {
		let file_name = format!("{}.sql", table_name);
		write_atomic(&self.sql_dir.join(&file_name), sql.as_bytes())?;
		info!("wrote SQL export {} ({} bytes)", file_name, sql.len());
		Ok(file_name)
	}

	/// Read a previously exported script for download. The name is reduced to
	/// its basename before touching the filesystem and anything that is not a
	/// `.sql` file is rejected.
	pub fn read_sql(&self, file_name: &str) -> Result<(String, Vec<u8>), StorageError> {
		let safe_name = Path::new(file_name)
			.file_name()
			.and_then(|n| n.to_str())
			.ok_or(StorageError::InvalidFileType)?
			.to_string();

		let is_sql = Path::new(&safe_name)
			.extension()
			.is_some_and(|ext| ext.eq_ignore_ascii_case("sql"));
		if !is_sql {
			warn!("refused download of non-sql file {}", safe_name);
			return Err(StorageError::InvalidFileType);
		}

		let path = self.sql_dir.join(&safe_name);
		if !path.exists() {
			return Err(StorageError::FileNotFound(safe_name));
		}
		let bytes = fs::read(&path)?;
		Ok((safe_name, bytes))
	}
}

fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
	let tmp = path.with_extension("tmp");
	{
		let mut f = fs::File::create(&tmp)?;
		f.write_all(contents)?;
		f.sync_all()?;
	}
	fs::rename(&tmp, path)
}
