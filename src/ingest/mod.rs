pub mod clean;
pub mod parser;
pub mod separator;

use serde_json::Value;
use thiserror::Error;

/// One normalized CSV row: an ordered column-name → value mapping.
///
/// `serde_json`'s `preserve_order` feature is enabled, so the map keeps the
/// column order of the source file and that order survives the JSON round
/// trip through the table store.
pub type Record = serde_json::Map<String, Value>;

pub use clean::{clean_value, collapse_whitespace};
pub use parser::{parse_csv, parse_csv_str, validate_columns};
pub use separator::detect_separator;

/// Failures produced while turning a CSV byte stream into records. All of
/// these are terminal for the request they occur in; callers must surface
/// them rather than persisting a partial record set.
#[derive(Debug, Error)]
pub enum ParseError {
	#[error("CSV is empty or has no usable data")]
	EmptyInput,
	#[error("CSV has inconsistent columns: row {row} has {got} columns, expected {expected}")]
	InconsistentColumns {
		row: usize,
		expected: usize,
		got: usize,
	},
	#[error("failed to read CSV input: {0}")]
	Io(#[from] std::io::Error),
	#[error("malformed CSV: {0}")]
	Csv(#[from] csv::Error),
}
