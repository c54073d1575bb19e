use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::ingest::{Record, collapse_whitespace};

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

/// True iff `name` is non-empty and matches `^[A-Za-z0-9_]+$`. Gates both the
/// table identifier and, through it, the `<table>.json` / `<table>.sql` file
/// stems; the generation path assumes a pre-validated name and does not
/// re-check it.
pub fn is_valid_table_name(name: &str) -> bool {
	NAME_RE.is_match(name)
}

/// Build the SQL export script for a table: a `CREATE TABLE` statement
/// followed by one `INSERT` per record, newline-joined.
///
/// Column order is the key order of the first record. When no column is
/// literally named `id`, a synthetic auto-increment `id` is prepended and a
/// 1-based row index injected; the caller's records are never mutated. An
/// empty record set yields an empty string. Output is deterministic and
/// byte-identical across repeated calls for the same input.
pub fn generate_sql(table_name: &str, records: &[Record]) -> String {
	if records.is_empty() {
		debug!("no records for table {}, emitting empty script", table_name);
		return String::new();
	}

	let mut columns: Vec<String> = records[0].keys().cloned().collect();

	let with_ids: Vec<Record>;
	let rows: &[Record] = if columns.iter().any(|c| c == "id") {
		records
	} else {
		columns.insert(0, "id".to_string());
		with_ids = records
			.iter()
			.enumerate()
			.map(|(idx, record)| {
				let mut row = Record::new();
				row.insert("id".to_string(), Value::from(idx as u64 + 1));
				for (k, v) in record {
					row.insert(k.clone(), v.clone());
				}
				row
			})
			.collect();
		&with_ids
	};

	let mut script = format!("CREATE TABLE {} (\n", table_name);
	let clauses: Vec<String> = columns
		.iter()
		.map(|col| {
			if col == "id" {
				"  id INT PRIMARY KEY AUTO_INCREMENT".to_string()
			} else {
				// currency/percentage heuristic: keep the display name in a
				// COMMENT so it survives identifier normalization
				let comment = if needs_comment(col) {
					format!(" COMMENT '{}'", col)
				} else {
					String::new()
				};
				format!("  `{}` VARCHAR(255){}", collapse_whitespace(col), comment)
			}
		})
		.collect();
	script.push_str(&clauses.join(",\n"));
	script.push_str("\n);\n\n");

	let column_list = columns
		.iter()
		.map(|c| format!("`{}`", collapse_whitespace(c)))
		.collect::<Vec<_>>()
		.join(", ");

	let inserts: Vec<String> = rows
		.iter()
		.map(|row| {
			let values: Vec<String> = columns
				.iter()
				.map(|col| {
					if col == "id" {
						bare_text(row.get(col))
					} else {
						// values were escaped by the cleaner upstream;
						// wrapping only, no re-escaping
						format!("'{}'", bare_text(row.get(col)))
					}
				})
				.collect();
			format!(
				"INSERT INTO {} ({}) VALUES ({});",
				table_name,
				column_list,
				values.join(", ")
			)
		})
		.collect();
	script.push_str(&inserts.join("\n"));

	info!(
		"generated SQL for table {} ({} rows, {} chars)",
		table_name,
		rows.len(),
		script.len()
	);
	script
}

fn needs_comment(col: &str) -> bool {
	col.contains('%')
		|| col.contains('(')
		|| col.contains(')')
		|| col.to_ascii_lowercase().contains("fcfa")
}

fn bare_text(value: Option<&Value>) -> String {
	match value {
		Some(Value::String(s)) => s.clone(),
		Some(Value::Number(n)) => n.to_string(),
		Some(Value::Null) | None => String::new(),
		Some(other) => other.to_string(),
	}
}
