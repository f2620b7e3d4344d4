//! Corpus tests.
//!
//! A corpus file holds any number of entries:
//!
//! ```text
//! ==================
//! Entry name
//! ==================
//!
//! source text
//!
//! ---
//!
//! (source_file (word))
//! ```
//!
//! [`run_corpus`] parses each input and compares the tree's S-expression with
//! the expected one, ignoring layout differences.

use thiserror::Error;
use tracing::debug;

use crate::language::{Language, LanguageError};
use crate::parser::Parser;

/// Errors in the corpus file itself. Failing entries are not errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CorpusError {
	#[error("line {line}: header is never closed")]
	UnterminatedHeader { line: usize },
	#[error("entry {name:?} has no `---` separator")]
	MissingSeparator { name: String },
	#[error(transparent)]
	Language(#[from] LanguageError),
}

/// One named input with its expected tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
	pub name: String,
	pub input: String,
	pub expected: String,
}

/// The result of running one [`CorpusEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusOutcome {
	pub name: String,
	/// Normalized expected S-expression.
	pub expected: String,
	/// Normalized S-expression of the parsed input.
	pub actual: String,
}

impl CorpusOutcome {
	pub fn passed(&self) -> bool {
		self.expected == self.actual
	}
}

fn is_rule(line: &str, ch: char) -> bool {
	let line = line.trim_end();
	line.len() >= 3 && line.chars().all(|c| c == ch)
}

fn join_trimmed(lines: &[&str]) -> String {
	lines
		.join("\n")
		.trim_matches(|c| c == '\n' || c == '\r')
		.to_string()
}

/// Splits a corpus file into entries.
pub fn parse_corpus(text: &str) -> Result<Vec<CorpusEntry>, CorpusError> {
	let lines: Vec<&str> = text.lines().collect();
	let mut entries = Vec::new();
	let mut i = lines.iter().position(|line| is_rule(line, '=')).unwrap_or(lines.len());

	while i < lines.len() {
		let header = i;
		i += 1;
		let name_start = i;
		while i < lines.len() && !is_rule(lines[i], '=') {
			i += 1;
		}
		if i == lines.len() {
			return Err(CorpusError::UnterminatedHeader { line: header + 1 });
		}
		let name = join_trimmed(&lines[name_start..i]).trim().to_string();
		i += 1;

		let input_start = i;
		while i < lines.len() && !is_rule(lines[i], '-') {
			if is_rule(lines[i], '=') {
				return Err(CorpusError::MissingSeparator { name });
			}
			i += 1;
		}
		if i == lines.len() {
			return Err(CorpusError::MissingSeparator { name });
		}
		let input = join_trimmed(&lines[input_start..i]);
		i += 1;

		let expected_start = i;
		while i < lines.len() && !is_rule(lines[i], '=') {
			i += 1;
		}
		let expected = join_trimmed(&lines[expected_start..i]);

		entries.push(CorpusEntry {
			name,
			input,
			expected,
		});
	}

	Ok(entries)
}

/// Collapses whitespace in an S-expression so layout does not matter.
pub fn normalize_sexp(sexp: &str) -> String {
	let mut out = String::with_capacity(sexp.len());
	let mut pending_space = false;
	for ch in sexp.chars() {
		if ch.is_whitespace() {
			pending_space = true;
			continue;
		}
		if pending_space && ch != ')' && !out.is_empty() && !out.ends_with('(') {
			out.push(' ');
		}
		pending_space = false;
		out.push(ch);
	}
	out
}

/// Parses every entry of a corpus file with `language`.
pub fn run_corpus(language: &Language, text: &str) -> Result<Vec<CorpusOutcome>, CorpusError> {
	let mut parser = Parser::new();
	parser.set_language(language)?;

	let mut outcomes = Vec::new();
	for entry in parse_corpus(text)? {
		let actual = parser
			.parse(&entry.input)
			.map(|tree| tree.root_node().to_sexp())
			.unwrap_or_default();
		let outcome = CorpusOutcome {
			expected: normalize_sexp(&entry.expected),
			actual: normalize_sexp(&actual),
			name: entry.name,
		};
		debug!(entry = outcome.name, passed = outcome.passed(), "Corpus entry");
		outcomes.push(outcome);
	}
	Ok(outcomes)
}
