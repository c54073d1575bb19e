/// Delimiter candidates, tried in declaration order. Ties resolve to the
/// earliest candidate, so a line with no delimiter at all yields a comma.
const CANDIDATES: [u8; 3] = [b',', b';', b'\t'];

/// Pick the delimiter that splits the first line of a CSV payload into the
/// most fields. There is no error path: every candidate splits any line into
/// at least one field, so the comma wins by default.
pub fn detect_separator(first_line: &str) -> u8 {
	let mut separator = b',';
	let mut max_count = 0;

	for &sep in CANDIDATES.iter() {
		let count = first_line.split(sep as char).count();
		if count > max_count {
			max_count = count;
			separator = sep;
		}
	}

	separator
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn semicolon_wins_on_count() {
		assert_eq!(detect_separator("a;b;c"), b';');
	}

	#[test]
	fn tab_wins_on_count() {
		assert_eq!(detect_separator("a\tb\tc\td"), b'\t');
	}

	#[test]
	fn tie_resolves_to_comma() {
		// comma and semicolon both yield 2 fields; comma is declared first
		assert_eq!(detect_separator("a,b;c"), b',');
	}

	#[test]
	fn no_delimiter_defaults_to_comma() {
		assert_eq!(detect_separator("justoneword"), b',');
		assert_eq!(detect_separator(""), b',');
	}
}
