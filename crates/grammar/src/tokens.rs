//! Lexical rules.
//!
//! [`lex`] picks, among the tokens the caller accepts at a position, the one
//! with the longest match. Ties go to the higher lexical precedence, then to
//! literal strings over patterns, then to the earlier entry in [`Token::ALL`].

use std::sync::LazyLock;

use regex::Regex;

use crate::kinds::NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
	Number,
	Pair,
	Money,
	Tuple,
	Time,
	Date,
	Email,
	Issue,
	Ref,
	Tag,
	Word,
	Include,
	CharOpen,
	DoubleQuote,
	Slash,
	Percent,
	EscapedValueOpen,
	Quote,
	Colon,
	Base2Open,
	Base16Prefix,
	Base16Open,
	Base64Open,
	MapOpen,
	LParen,
	LBracket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Lexeme {
	pub token: Token,
	pub len: usize,
}

impl Token {
	pub const ALL: [Token; 26] = [
		Token::Number,
		Token::Pair,
		Token::Money,
		Token::Tuple,
		Token::Time,
		Token::Date,
		Token::Email,
		Token::Issue,
		Token::Ref,
		Token::Tag,
		Token::Word,
		Token::Include,
		Token::CharOpen,
		Token::DoubleQuote,
		Token::Slash,
		Token::Percent,
		Token::EscapedValueOpen,
		Token::Quote,
		Token::Colon,
		Token::Base2Open,
		Token::Base16Prefix,
		Token::Base16Open,
		Token::Base64Open,
		Token::MapOpen,
		Token::LParen,
		Token::LBracket,
	];

	/// The fixed spelling of a literal token.
	pub fn literal(self) -> Option<&'static str> {
		let text = match self {
			Token::Include => "#include",
			Token::CharOpen => "#\"",
			Token::DoubleQuote => "\"",
			Token::Slash => "/",
			Token::Percent => "%",
			Token::EscapedValueOpen => "#(",
			Token::Quote => "'",
			Token::Colon => ":",
			Token::Base2Open => "2#{",
			Token::Base16Prefix => "16",
			Token::Base16Open => "#{",
			Token::Base64Open => "64#{",
			Token::MapOpen => "#[",
			Token::LParen => "(",
			Token::LBracket => "[",
			_ => return None,
		};
		Some(text)
	}

	/// The node kind of the leaf this token produces.
	pub fn kind(self) -> NodeKind {
		match self {
			Token::Number => NodeKind::Number,
			Token::Pair => NodeKind::Pair,
			Token::Money => NodeKind::Money,
			Token::Tuple => NodeKind::Tuple,
			Token::Time => NodeKind::Time,
			Token::Date => NodeKind::Date,
			Token::Email => NodeKind::Email,
			Token::Issue => NodeKind::Issue,
			Token::Ref => NodeKind::Ref,
			Token::Tag => NodeKind::Tag,
			Token::Word => NodeKind::Word,
			Token::Include => NodeKind::HashInclude,
			Token::CharOpen => NodeKind::CharOpen,
			Token::DoubleQuote => NodeKind::DoubleQuote,
			Token::Slash => NodeKind::Slash,
			Token::Percent => NodeKind::Percent,
			Token::EscapedValueOpen => NodeKind::EscapedValueOpen,
			Token::Quote => NodeKind::Quote,
			Token::Colon => NodeKind::Colon,
			Token::Base2Open => NodeKind::Base2Open,
			Token::Base16Prefix => NodeKind::Base16Prefix,
			Token::Base16Open => NodeKind::Base16Open,
			Token::Base64Open => NodeKind::Base64Open,
			Token::MapOpen => NodeKind::MapOpen,
			Token::LParen => NodeKind::LParen,
			Token::LBracket => NodeKind::LBracket,
		}
	}

	fn precedence(self) -> u8 {
		match self {
			Token::Date | Token::Tag => 2,
			Token::Time => 1,
			_ => 0,
		}
	}

	fn match_len(self, rest: &str) -> Option<usize> {
		if self == Token::Base16Prefix {
			// "16" is only a token as the prefix of a base-16 binary.
			return rest.starts_with("16#{").then_some(2);
		}
		if let Some(text) = self.literal() {
			return rest.starts_with(text).then_some(text.len());
		}
		let regex = match self {
			Token::Number => &PATTERNS.number,
			Token::Pair => &PATTERNS.pair,
			Token::Money => &PATTERNS.money,
			Token::Tuple => &PATTERNS.tuple,
			Token::Time => &PATTERNS.time,
			Token::Date => &PATTERNS.date,
			Token::Email => &PATTERNS.email,
			Token::Issue => &PATTERNS.issue,
			Token::Ref => &PATTERNS.reference,
			Token::Tag => &PATTERNS.tag,
			Token::Word => &PATTERNS.word,
			_ => return None,
		};
		regex.find(rest).map(|m| m.end()).filter(|&len| len > 0)
	}
}

/// Lexes the token at the start of `rest`, considering only tokens for which
/// `valid` holds.
pub(crate) fn lex(rest: &str, valid: impl Fn(Token) -> bool) -> Option<Lexeme> {
	let mut best: Option<(Lexeme, (usize, u8, bool))> = None;
	for token in Token::ALL {
		if !valid(token) {
			continue;
		}
		let Some(len) = token.match_len(rest) else {
			continue;
		};
		let rank = (len, token.precedence(), token.literal().is_some());
		if best.is_none_or(|(_, best_rank)| rank > best_rank) {
			best = Some((Lexeme { token, len }, rank));
		}
	}
	best.map(|(lexeme, _)| lexeme)
}

/// Maps a keyword spelling to its anonymous kind.
pub(crate) fn keyword(text: &str) -> Option<NodeKind> {
	let kind = match text {
		"true" => NodeKind::True,
		"false" => NodeKind::False,
		"while" => NodeKind::WhileLower,
		"While" => NodeKind::WhileTitle,
		"WHILE" => NodeKind::WhileUpper,
		"loop" => NodeKind::LoopLower,
		"LOOP" => NodeKind::LoopUpper,
		"Loop" => NodeKind::LoopTitle,
		"func" => NodeKind::FuncLower,
		"Func" => NodeKind::FuncTitle,
		"FUNC" => NodeKind::FuncUpper,
		"function" => NodeKind::FunctionLower,
		"Function" => NodeKind::FunctionTitle,
		"FUNCTION" => NodeKind::FunctionUpper,
		_ => return None,
	};
	Some(kind)
}

/// Length of a run of slashes (`/`, `//`, ...), which forms a word.
pub(crate) fn slashes_len(rest: &str) -> usize {
	prefix_len(&PATTERNS.slashes, rest)
}

/// Length of a refinement name following `/`.
pub(crate) fn refinement_name_len(rest: &str) -> usize {
	prefix_len(&PATTERNS.refinement_name, rest)
}

/// Length of an unquoted file name following `%`.
pub(crate) fn file_content_len(rest: &str) -> usize {
	prefix_len(&PATTERNS.file_content, rest)
}

/// Length of plain string text up to the next escape, quote or line break.
pub(crate) fn string_content_len(rest: &str) -> usize {
	prefix_len(&PATTERNS.string_content, rest)
}

/// Length of a `^` escape, or zero if `rest` does not start with a valid one.
pub(crate) fn escaped_char_len(rest: &str) -> usize {
	prefix_len(&PATTERNS.escaped_char, rest)
}

/// Length of the name inside `#(...)`.
pub(crate) fn escaped_value_name_len(rest: &str) -> usize {
	prefix_len(&PATTERNS.escaped_value_name, rest)
}

/// Length of one base-2 byte: eight binary digits, whitespace allowed between.
pub(crate) fn base2_byte_len(rest: &str) -> usize {
	prefix_len(&PATTERNS.base2_byte, rest)
}

/// Length of one base-16 byte.
pub(crate) fn base16_byte_len(rest: &str) -> usize {
	prefix_len(&PATTERNS.base16_byte, rest)
}

/// Length of one base-64 digit.
pub(crate) fn base64_digit_len(rest: &str) -> usize {
	prefix_len(&PATTERNS.base64_digit, rest)
}

/// Length of a `;` comment, excluding the line break.
pub(crate) fn comment_len(rest: &str) -> usize {
	if !rest.starts_with(';') {
		return 0;
	}
	rest.find('\n').unwrap_or(rest.len())
}

fn prefix_len(regex: &Regex, rest: &str) -> usize {
	regex.find(rest).map_or(0, |m| m.end())
}

struct Patterns {
	number: Regex,
	pair: Regex,
	money: Regex,
	tuple: Regex,
	time: Regex,
	date: Regex,
	email: Regex,
	issue: Regex,
	reference: Regex,
	tag: Regex,
	word: Regex,
	slashes: Regex,
	refinement_name: Regex,
	file_content: Regex,
	string_content: Regex,
	escaped_char: Regex,
	escaped_value_name: Regex,
	base2_byte: Regex,
	base16_byte: Regex,
	base64_digit: Regex,
}

fn anchored(pattern: &str) -> Regex {
	Regex::new(&format!("^(?:{pattern})")).expect("token patterns are valid regexes")
}

const DIGITS: &str = "[0-9]+(?:'[0-9]+)*";
const FRACTION: &str = r"\.[0-9]{1,9}";
const ZONE: &str = "(?:Z|[-+](?:[0-9]{4}|[0-9]{1,2}(?::[0-9]{2})?))";
const BYTE: &str = "(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|0?[1-9][0-9]|0?0?[0-9])";

fn date_pattern() -> String {
	let year = "[0-9]{3,4}";
	let day = "[0-9]{1,2}";
	let month = "(?:[0-9]{1,2}|(?i:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?))";
	let time = format!("[T/][0-9]+:[0-9]+(?:{FRACTION}|:[0-9]+(?:{FRACTION})?)?(?:{ZONE})?");

	let ymd_dash = format!("{year}-{month}-{day}");
	let ymd_slash = format!("{year}/{month}/{day}");
	let dmy_dash = format!("{day}-{month}-(?:{year}|{day})");
	let dmy_slash = format!("{day}/{month}/(?:{year}|{day})");
	let week = format!("{year}-(?:W[0-9]{{2}}(?:-[1-9])?|[0-9]{{3}})");
	let compact = format!("[0-9]{{8}}T(?:[0-9]{{6}}(?:{FRACTION})?(?:{ZONE})?|[0-9]{{4}}Z)");

	format!("(?:{ymd_dash}|{ymd_slash}|{dmy_dash}|{dmy_slash}|{week})(?:{time})?|{compact}")
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
	number: anchored(&format!(
		r"[-+]?(?:(?i:1\.#inf|1\.#nan)|{DIGITS}(?:\.{DIGITS})?(?:[eE](?:[-+]?[0-9]+)?)?)%?"
	)),
	pair: anchored(&format!("[-+]?{DIGITS}[xX][-+]?{DIGITS}")),
	money: anchored(&format!(r"[-+]?(?:[A-Za-z]{{3}})?\${DIGITS}(?:\.[0-9]+)?")),
	tuple: anchored(&format!(r"{BYTE}(?:\.{BYTE}){{2,11}}")),
	time: anchored(&format!("[0-9]+:[0-9]+(?:{FRACTION}|:[0-9]+(?:{FRACTION})?)?")),
	date: anchored(&date_pattern()),
	email: anchored(r#"[^\s\[\]\(\)\{\}@;:<"]+@[^\s\[\]\(\)\{\}@;:<"]*"#),
	issue: anchored(r#"#[^\s\[\]\(\)\{\}@;"<>:]+"#),
	reference: anchored(r#"@[^\s\[\]\(\)\{\}@#\$;,'"=<>\^]*"#),
	tag: anchored(r#"<[^\s\[\]\(\)\{\};"<>=](?:"[^"\n]*"|'[^'\n]*'|[^>\n])*>"#),
	word: anchored(r##"[^\s\d'/\\,\[\]\(\)\{\}"#%\$@:;][^\s/\\,\[\]\(\)\{\}"#%\$@:;]*"##),
	slashes: anchored("/+"),
	refinement_name: anchored(r##"[^\s/\\,\[\]\(\)\{\}"#%\$@:;<>]+"##),
	file_content: anchored(r#"[^\s\[\]\(\)\{\}@:;"]+"#),
	string_content: anchored(r#"[^\^"\n]+"#),
	escaped_char: anchored(
		r#"\^(?:[/\-~^{}"]|[a-fA-F]|\((?:null|back|tab|line|page|esc|del)\)|\([0-9a-fA-F]{1,6}\))"#,
	),
	escaped_value_name: anchored(r"[A-Za-z\-!]{3,20}"),
	base2_byte: anchored(r"(?:[01]\s*){8}"),
	base16_byte: anchored("[0-9a-fA-F]{2}"),
	base64_digit: anchored("[A-Za-z0-9+/]"),
});

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	use super::*;

	fn lex_all(rest: &str) -> Option<(Token, &str)> {
		lex(rest, |_| true).map(|lexeme| (lexeme.token, &rest[..lexeme.len]))
	}

	#[rstest]
	#[case::integer("42 ", Token::Number, "42")]
	#[case::separators("1'000'000", Token::Number, "1'000'000")]
	#[case::signed("-12.5", Token::Number, "-12.5")]
	#[case::exponent("1.5e10", Token::Number, "1.5e10")]
	#[case::percent("50%]", Token::Number, "50%")]
	#[case::infinity("1.#INF", Token::Number, "1.#INF")]
	#[case::nan("-1.#nan", Token::Number, "-1.#nan")]
	#[case::pair("10x20", Token::Pair, "10x20")]
	#[case::money("$1'000.50", Token::Money, "$1'000.50")]
	#[case::currency("-USD$20", Token::Money, "-USD$20")]
	#[case::tuple("1.2.3", Token::Tuple, "1.2.3")]
	#[case::color("255.255.255.0", Token::Tuple, "255.255.255.0")]
	#[case::time("12:30", Token::Time, "12:30")]
	#[case::time_seconds("12:30:45.123", Token::Time, "12:30:45.123")]
	#[case::iso_date("2024-01-15", Token::Date, "2024-01-15")]
	#[case::month_name("15-Jan-2024", Token::Date, "15-Jan-2024")]
	#[case::slash_date("2024/1/5", Token::Date, "2024/1/5")]
	#[case::date_time("2024-01-15/10:30:00+08:00", Token::Date, "2024-01-15/10:30:00+08:00")]
	#[case::week("2024-W05-3", Token::Date, "2024-W05-3")]
	#[case::ordinal("2024-123", Token::Date, "2024-123")]
	#[case::compact("20240115T103000Z", Token::Date, "20240115T103000Z")]
	#[case::email("user@example.com", Token::Email, "user@example.com")]
	#[case::issue("#abc-123", Token::Issue, "#abc-123")]
	#[case::reference("@name ", Token::Ref, "@name")]
	#[case::tag("<a href=\"x\">", Token::Tag, "<a href=\"x\">")]
	#[case::word("print ", Token::Word, "print")]
	#[case::operator_word("+ ", Token::Word, "+")]
	#[case::word_stops_at_colon("name:", Token::Word, "name")]
	#[case::word_stops_at_quote("ab\"c", Token::Word, "ab")]
	#[case::word_stops_at_hash("ab#c", Token::Word, "ab")]
	#[case::include("#include %a.red", Token::Include, "#include")]
	#[case::char_open("#\"a\"", Token::CharOpen, "#\"")]
	#[case::map_open("#[a 1]", Token::MapOpen, "#[")]
	#[case::escaped_value_open("#(none)", Token::EscapedValueOpen, "#(")]
	#[case::base2("2#{0101}", Token::Base2Open, "2#{")]
	#[case::base16_prefix("16#{FF}", Token::Base16Prefix, "16")]
	#[case::base16("#{FF}", Token::Base16Open, "#{")]
	#[case::base64("64#{AA==}", Token::Base64Open, "64#{")]
	fn test_token_shapes(#[case] input: &str, #[case] token: Token, #[case] text: &str) {
		assert_eq!(lex_all(input), Some((token, text)));
	}

	#[test]
	fn test_longer_issue_beats_include() {
		assert_eq!(lex_all("#includes"), Some((Token::Issue, "#includes")));
	}

	#[test]
	fn test_sixteen_alone_is_a_number() {
		assert_eq!(lex_all("16 "), Some((Token::Number, "16")));
	}

	#[test]
	fn test_number_wins_tie_with_word() {
		assert_eq!(lex_all("-1 "), Some((Token::Number, "-1")));
		assert_eq!(lex_all("- "), Some((Token::Word, "-")));
	}

	#[test]
	fn test_invalid_tuple_byte_falls_back() {
		assert_eq!(lex_all("256.1.1"), Some((Token::Number, "256.1")));
	}

	#[test]
	fn test_validity_filter() {
		let lexeme = lex("12:30", |token| token != Token::Time);
		assert_eq!(lexeme, Some(Lexeme { token: Token::Number, len: 2 }));
		assert_eq!(lex("]", |_| true), None);
	}

	#[test]
	fn test_keywords() {
		assert_eq!(keyword("true"), Some(NodeKind::True));
		assert_eq!(keyword("FUNCTION"), Some(NodeKind::FunctionUpper));
		assert_eq!(keyword("wHILE"), None);
	}

	#[test]
	fn test_helper_lengths() {
		assert_eq!(slashes_len("// x"), 2);
		assert_eq!(refinement_name_len("only]"), 4);
		assert_eq!(refinement_name_len("only#x"), 4);
		assert_eq!(refinement_name_len("only\"x"), 4);
		assert_eq!(file_content_len("dir/file.red]"), 12);
		assert_eq!(string_content_len("abc^/def\""), 3);
		assert_eq!(escaped_char_len("^(tab)"), 6);
		assert_eq!(escaped_char_len("^(41)"), 5);
		assert_eq!(escaped_char_len("^q"), 0);
		assert_eq!(escaped_value_name_len("none)"), 4);
		assert_eq!(base2_byte_len("0101 0101}"), 9);
		assert_eq!(base16_byte_len("fF"), 2);
		assert_eq!(base64_digit_len("=="), 0);
		assert_eq!(comment_len("; note\nnext"), 6);
	}
}
