use unicode_normalization::UnicodeNormalization;

/// Clean a single cell value for use inside a SQL string literal.
///
/// The value is NFKD-decomposed, every character outside printable ASCII
/// (0x20–0x7E) is dropped, and each single quote is doubled. Dropping the
/// combining marks left over from decomposition means `é` becomes `e`;
/// non-Latin scripts are stripped entirely. This is lossy on purpose and the
/// contract downstream SQL generation relies on, so do not "fix" it.
pub fn clean_value(value: &str) -> String {
	if value.is_empty() {
		return String::new();
	}

	let ascii: String = value
		.nfkd()
		.filter(|c| (' '..='\u{7e}').contains(c))
		.collect();

	ascii.replace('\'', "''")
}

/// Collapse every run of whitespace into a single underscore. Used for
/// header keys and for SQL identifiers derived from them.
pub fn collapse_whitespace(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	let mut in_run = false;

	for c in s.chars() {
		if c.is_whitespace() {
			if !in_run {
				out.push('_');
			}
			in_run = true;
		} else {
			out.push(c);
			in_run = false;
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_stays_empty() {
		assert_eq!(clean_value(""), "");
	}

	#[test]
	fn doubles_single_quotes() {
		assert_eq!(clean_value("O'Brien"), "O''Brien");
		assert_eq!(clean_value("it's a 'test'"), "it''s a ''test''");
	}

	#[test]
	fn strips_diacritics_to_ascii() {
		// NFKD splits é into e + combining acute; the accent is outside
		// printable ASCII and gets dropped
		assert_eq!(clean_value("café"), "cafe");
		assert_eq!(clean_value("Ångström"), "Angstrom");
	}

	#[test]
	fn drops_non_ascii_scripts() {
		assert_eq!(clean_value("prix 1000 FCFA — 你好"), "prix 1000 FCFA  ");
	}

	#[test]
	fn keeps_printable_ascii_verbatim() {
		assert_eq!(clean_value("plain value 123 !@#"), "plain value 123 !@#");
	}

	#[test]
	fn collapses_whitespace_runs() {
		assert_eq!(collapse_whitespace("first name"), "first_name");
		assert_eq!(collapse_whitespace("a  \t b"), "a_b");
		assert_eq!(collapse_whitespace("nospace"), "nospace");
	}
}
