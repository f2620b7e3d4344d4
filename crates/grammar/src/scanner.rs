//! External scanner for the context sensitive Red tokens.
//!
//! * `hexa`: 2 to 8 digits `0-9A-F` followed by `h`, then a delimiter
//! * `_infix_op`: an operator with whitespace on both sides
//! * `raw_string`: `%{...}%`, with any number of `%` on both ends
//! * `multiline_string`: `{...}` with nested braces and `^` escapes
//!
//! Nothing is produced at end of input or while `error_sentinel` is valid.
//! A failed attempt at one token never moves the position seen by the next.

use std::ops::Range;

use tracing::trace;

use crate::kinds::NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum ExternalToken {
	InfixOp,
	Hexa,
	RawString,
	MultilineString,
	ErrorSentinel,
}

impl ExternalToken {
	pub fn kind(self) -> NodeKind {
		match self {
			ExternalToken::InfixOp => NodeKind::InfixOp,
			ExternalToken::Hexa => NodeKind::Hexa,
			ExternalToken::RawString => NodeKind::RawString,
			ExternalToken::MultilineString => NodeKind::MultilineString,
			ExternalToken::ErrorSentinel => NodeKind::ErrorSentinel,
		}
	}
}

/// The set of external tokens the parser accepts at a position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ValidTokens(u8);

impl ValidTokens {
	pub const NONE: Self = Self(0);
	/// Tokens that start a literal.
	pub const LITERAL: Self = Self::NONE
		.with(ExternalToken::Hexa)
		.with(ExternalToken::RawString)
		.with(ExternalToken::MultilineString);
	/// The operator of an infix expression.
	pub const INFIX: Self = Self::NONE.with(ExternalToken::InfixOp);

	#[cfg(test)]
	pub const fn all() -> Self {
		Self(0b1_1111)
	}

	pub const fn with(self, token: ExternalToken) -> Self {
		Self(self.0 | 1 << token as u8)
	}

	pub const fn contains(self, token: ExternalToken) -> bool {
		self.0 & (1 << token as u8) != 0
	}
}

/// A token recognised by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Scanned {
	pub token: ExternalToken,
	pub range: Range<usize>,
}

/// Character cursor over the source text.
#[derive(Debug, Clone, Copy)]
struct Cursor<'a> {
	text: &'a str,
	pos: usize,
	start: usize,
	end: usize,
}

impl<'a> Cursor<'a> {
	fn new(text: &'a str, pos: usize) -> Self {
		Self {
			text,
			pos,
			start: pos,
			end: pos,
		}
	}

	fn lookahead(&self) -> Option<char> {
		self.text[self.pos..].chars().next()
	}

	fn eof(&self) -> bool {
		self.pos >= self.text.len()
	}

	fn advance(&mut self) {
		if let Some(ch) = self.lookahead() {
			self.pos += ch.len_utf8();
		}
	}

	/// Advances past leading whitespace, which is not part of the token.
	fn skip_spaces(&mut self) {
		while self.lookahead().is_some_and(char::is_whitespace) {
			self.advance();
		}
		self.start = self.pos;
	}

	fn mark_end(&mut self) {
		self.end = self.pos;
	}

	fn finish(self, token: ExternalToken) -> Scanned {
		Scanned {
			token,
			range: self.start..self.end,
		}
	}
}

/// Scanner state carried between tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Scanner {
	/// Number of `%` around the most recent raw string.
	delimiter_length: u32,
}

impl Scanner {
	pub const SERIALIZED_LEN: usize = 4;

	pub fn new() -> Self {
		Self::default()
	}

	pub fn reset(&mut self) {
		self.delimiter_length = 0;
	}

	#[cfg(test)]
	pub fn delimiter_length(&self) -> u32 {
		self.delimiter_length
	}

	pub fn serialize(&self) -> [u8; Self::SERIALIZED_LEN] {
		self.delimiter_length.to_le_bytes()
	}

	/// Restores state written by [`serialize`](Self::serialize). A buffer of
	/// the wrong length resets the scanner.
	pub fn deserialize(&mut self, buffer: &[u8]) {
		self.reset();
		if let Ok(bytes) = <[u8; Self::SERIALIZED_LEN]>::try_from(buffer) {
			self.delimiter_length = u32::from_le_bytes(bytes);
		}
	}

	/// Scans an external token at byte offset `pos` of `text`.
	pub fn scan(&mut self, text: &str, pos: usize, valid: ValidTokens) -> Option<Scanned> {
		let cursor = Cursor::new(text, pos);
		if cursor.eof() || valid.contains(ExternalToken::ErrorSentinel) {
			return None;
		}

		let mut scanned = None;
		if valid.contains(ExternalToken::Hexa) {
			scanned = scan_hexa(cursor);
		}
		if scanned.is_none() && valid.contains(ExternalToken::InfixOp) {
			scanned = scan_infix_op(cursor);
		}
		if scanned.is_none() && valid.contains(ExternalToken::RawString) {
			scanned = self.scan_raw_string(cursor);
		}
		if scanned.is_none() && valid.contains(ExternalToken::MultilineString) {
			scanned = scan_multiline_string(cursor);
		}

		if let Some(scanned) = &scanned {
			trace!(token = ?scanned.token, start = scanned.range.start, end = scanned.range.end, "Scanned external token");
		}
		scanned
	}

	/// `(%+)\{.*?\}\1`, or to end of input when unterminated.
	fn scan_raw_string(&mut self, mut cursor: Cursor<'_>) -> Option<Scanned> {
		cursor.skip_spaces();

		let mut left = 0u32;
		while cursor.lookahead() == Some('%') {
			cursor.advance();
			left += 1;
		}
		if left == 0 || cursor.lookahead() != Some('{') {
			return None;
		}
		cursor.advance();

		// Count of `%` seen since the last `}`; `None` when not after a `}`.
		let mut closing: Option<u32> = None;
		loop {
			if cursor.eof() || closing == Some(left) {
				cursor.mark_end();
				self.delimiter_length = left;
				return Some(cursor.finish(ExternalToken::RawString));
			}
			let ch = cursor.lookahead();
			closing = match (closing, ch) {
				(Some(count), Some('%')) => Some(count + 1),
				(_, Some('}')) => Some(0),
				_ => None,
			};
			cursor.advance();
		}
	}
}

fn scan_hexa(mut cursor: Cursor<'_>) -> Option<Scanned> {
	cursor.skip_spaces();

	let mut count = 0;
	while count < 8 && cursor.lookahead().is_some_and(|ch| matches!(ch, '0'..='9' | 'A'..='F')) {
		cursor.advance();
		count += 1;
	}
	if count < 2 || cursor.lookahead() != Some('h') {
		return None;
	}
	cursor.advance();
	if !cursor.lookahead().is_none_or(is_delimiter) {
		return None;
	}
	cursor.mark_end();
	Some(cursor.finish(ExternalToken::Hexa))
}

fn is_delimiter(ch: char) -> bool {
	ch.is_whitespace() || matches!(ch, '[' | ']' | '(' | ')' | '{' | '}' | '"' | ';' | '/')
}

fn scan_infix_op(mut cursor: Cursor<'_>) -> Option<Scanned> {
	if !cursor.lookahead().is_some_and(char::is_whitespace) {
		return None;
	}
	cursor.skip_spaces();

	match cursor.lookahead()? {
		'=' => {
			cursor.advance();
			if cursor.lookahead() == Some('=') {
				cursor.advance();
			}
		}
		'<' => {
			cursor.advance();
			if matches!(cursor.lookahead(), Some('=' | '<' | '>')) {
				cursor.advance();
			}
		}
		'>' => {
			cursor.advance();
			match cursor.lookahead() {
				Some('=') => cursor.advance(),
				Some('>') => {
					cursor.advance();
					if cursor.lookahead() == Some('>') {
						cursor.advance();
					}
				}
				_ => {}
			}
		}
		'+' | '-' | '*' | '/' => cursor.advance(),
		_ => return None,
	}

	if !cursor.lookahead().is_some_and(char::is_whitespace) {
		return None;
	}
	cursor.mark_end();
	Some(cursor.finish(ExternalToken::InfixOp))
}

fn scan_multiline_string(mut cursor: Cursor<'_>) -> Option<Scanned> {
	cursor.skip_spaces();
	if cursor.lookahead() != Some('{') {
		return None;
	}
	cursor.advance();

	let mut depth = 1usize;
	while let Some(ch) = cursor.lookahead() {
		match ch {
			'{' => depth += 1,
			'}' => {
				depth -= 1;
				if depth == 0 {
					cursor.advance();
					break;
				}
			}
			'^' => {
				cursor.advance();
				// `^^`, `^{` and `^}` are escapes; anything else is read normally.
				if !matches!(cursor.lookahead(), Some('^' | '{' | '}')) {
					continue;
				}
			}
			_ => {}
		}
		cursor.advance();
	}
	cursor.mark_end();
	Some(cursor.finish(ExternalToken::MultilineString))
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	use super::*;

	fn scan(text: &str, valid: ValidTokens) -> Option<(ExternalToken, &str)> {
		Scanner::new()
			.scan(text, 0, valid)
			.map(|scanned| (scanned.token, &text[scanned.range]))
	}

	#[rstest]
	#[case::two_digits("FFh ", Some("FFh"))]
	#[case::eight_digits("DEADBEEFh]", Some("DEADBEEFh"))]
	#[case::at_end("10h", Some("10h"))]
	#[case::nine_digits("123456789h", None)]
	#[case::one_digit("Fh", None)]
	#[case::lowercase("each", None)]
	#[case::word_continues("12hours", None)]
	fn test_hexa(#[case] input: &str, #[case] expected: Option<&str>) {
		let scanned = scan(input, ValidTokens::LITERAL).filter(|(token, _)| *token == ExternalToken::Hexa);
		assert_eq!(scanned.map(|(_, text)| text), expected);
	}

	#[rstest]
	#[case::add(" + 1", Some("+"))]
	#[case::equal(" == 1", Some("=="))]
	#[case::not_equal(" <> 1", Some("<>"))]
	#[case::shift(" >>> 1", Some(">>>"))]
	#[case::less_equal(" <= 1", Some("<="))]
	#[case::newline_before("\n* 2", Some("*"))]
	#[case::no_space_before("+ 1", None)]
	#[case::no_space_after(" -1", None)]
	#[case::at_end(" +", None)]
	#[case::not_an_operator(" % 1", None)]
	fn test_infix_op(#[case] input: &str, #[case] expected: Option<&str>) {
		let scanned = scan(input, ValidTokens::INFIX);
		assert_eq!(scanned.map(|(_, text)| text), expected);
	}

	#[test]
	fn test_infix_after_failed_hexa() {
		let valid = ValidTokens::INFIX.with(ExternalToken::Hexa);
		assert_eq!(scan(" AB + 1", valid), None);
		assert_eq!(scan(" + 1", valid), Some((ExternalToken::InfixOp, "+")));
	}

	#[rstest]
	#[case::single("%{a}b}% rest", "%{a}b}%")]
	#[case::double("%%{a}%b}%% rest", "%%{a}%b}%%")]
	#[case::braces_inside("%{{x}}% rest", "%{{x}}%")]
	#[case::unterminated("%{never closed", "%{never closed")]
	fn test_raw_string(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(scan(input, ValidTokens::LITERAL), Some((ExternalToken::RawString, expected)));
	}

	#[test]
	fn test_raw_string_records_delimiter() {
		let mut scanner = Scanner::new();
		scanner.scan("%%%{x}%%%", 0, ValidTokens::LITERAL);
		assert_eq!(scanner.delimiter_length(), 3);
	}

	#[rstest]
	#[case::simple("{abc} x", "{abc}")]
	#[case::nested("{a {b} c} x", "{a {b} c}")]
	#[case::escaped_brace("{a ^} b} x", "{a ^} b}")]
	#[case::escaped_caret("{a ^^} x", "{a ^^}")]
	#[case::other_escape("{a ^/ b} x", "{a ^/ b}")]
	#[case::unterminated("{open", "{open")]
	fn test_multiline_string(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(
			scan(input, ValidTokens::LITERAL),
			Some((ExternalToken::MultilineString, expected))
		);
	}

	#[test]
	fn test_nothing_at_end_or_during_recovery() {
		assert_eq!(scan("", ValidTokens::all()), None);
		assert_eq!(scan("FFh", ValidTokens::all()), None);
		assert_eq!(
			scan("FFh", ValidTokens::LITERAL.with(ExternalToken::ErrorSentinel)),
			None
		);
	}

	#[test]
	fn test_state_round_trip() {
		let mut scanner = Scanner::new();
		scanner.scan("%%{x}%%", 0, ValidTokens::LITERAL);
		let buffer = scanner.serialize();

		let mut restored = Scanner::new();
		restored.deserialize(&buffer);
		assert_eq!(restored, scanner);

		restored.deserialize(&buffer[..2]);
		assert_eq!(restored, Scanner::new());
	}

	#[test]
	fn test_valid_tokens() {
		assert!(ValidTokens::LITERAL.contains(ExternalToken::Hexa));
		assert!(!ValidTokens::LITERAL.contains(ExternalToken::InfixOp));
		assert!(ValidTokens::all().contains(ExternalToken::ErrorSentinel));
		assert_eq!(ExternalToken::Hexa.kind(), NodeKind::Hexa);
	}
}
