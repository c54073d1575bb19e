use std::io::Read;

use log::debug;
use serde_json::Value;

use crate::ingest::clean::{clean_value, collapse_whitespace};
use crate::ingest::separator::detect_separator;
use crate::ingest::{ParseError, Record};

/// Parse a CSV byte stream into normalized records.
///
/// The first line is sniffed for the delimiter, header keys are normalized
/// (BOM stripped, trimmed, whitespace runs collapsed to underscores) and
/// every value is run through [`clean_value`]. The full row sequence is
/// materialized before the column-count consistency check runs, so a failure
/// never leaves a partial record set in the caller's hands.
pub fn parse_csv<R: Read>(mut reader: R) -> Result<Vec<Record>, ParseError> {
	let mut raw = Vec::new();
	reader.read_to_end(&mut raw)?;
	let text = String::from_utf8_lossy(&raw);
	parse_csv_str(&text)
}

/// Parse CSV text already held in memory. See [`parse_csv`].
pub fn parse_csv_str(input: &str) -> Result<Vec<Record>, ParseError> {
	let first_line = input.lines().next().unwrap_or("");
	let separator = detect_separator(first_line);
	debug!("detected separator {:?}", separator as char);

	// flexible: rows with diverging field counts must reach our own
	// consistency check instead of erroring inside the reader
	let mut rdr = csv::ReaderBuilder::new()
		.has_headers(true)
		.delimiter(separator)
		.flexible(true)
		.from_reader(input.as_bytes());

	let headers: Vec<String> = rdr.headers()?.iter().map(normalize_key).collect();

	let mut out = Vec::new();
	for result in rdr.records() {
		let row = result?;
		let mut record = Record::new();
		for (idx, field) in row.iter().enumerate() {
			let key = match headers.get(idx) {
				Some(h) => h.clone(),
				// extra trailing fields get positional keys so the
				// consistency check sees the real column count
				None => format!("_{}", idx),
			};
			// duplicate normalized keys collapse here, last write wins
			record.insert(key, Value::String(clean_value(field)));
		}
		out.push(record);
	}

	validate_columns(&out)?;
	Ok(out)
}

/// Normalize a raw header cell into a column name: strip a leading BOM, trim
/// surrounding whitespace, collapse internal whitespace runs to underscores.
fn normalize_key(raw: &str) -> String {
	let stripped = raw.strip_prefix('\u{feff}').unwrap_or(raw);
	collapse_whitespace(stripped.trim())
}

/// Post-pass consistency check: the record set must be non-empty and every
/// record must carry the same column count as the first one. Column names
/// are deliberately not compared, only counts.
pub fn validate_columns(records: &[Record]) -> Result<(), ParseError> {
	let first = records.first().ok_or(ParseError::EmptyInput)?;
	let expected = first.len();

	for (idx, record) in records.iter().enumerate().skip(1) {
		if record.len() != expected {
			return Err(ParseError::InconsistentColumns {
				row: idx + 1,
				expected,
				got: record.len(),
			});
		}
	}

	Ok(())
}
