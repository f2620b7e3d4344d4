//! Node kinds, fields and external tokens of the Red grammar.
//!
//! [`NodeKind`] discriminants are the symbols stored in the language table;
//! [`SYMBOLS`] holds their metadata in the same order.

use red_syntax::{FieldId, Symbol, SymbolMetadata};
use strum::{EnumCount, EnumIter, FromRepr, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter, FromRepr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[repr(u16)]
pub enum NodeKind {
	End = 0,
	#[strum(serialize = "#include")]
	HashInclude,
	#[strum(serialize = "true")]
	True,
	#[strum(serialize = "false")]
	False,
	#[strum(serialize = "(")]
	LParen,
	#[strum(serialize = ",")]
	Comma,
	#[strum(serialize = ")")]
	RParen,
	#[strum(serialize = "#\"")]
	CharOpen,
	#[strum(serialize = "\"")]
	DoubleQuote,
	#[strum(serialize = "/")]
	Slash,
	#[strum(serialize = "%")]
	Percent,
	#[strum(serialize = "#(")]
	EscapedValueOpen,
	#[strum(serialize = "'")]
	Quote,
	#[strum(serialize = ":")]
	Colon,
	#[strum(serialize = "2#{")]
	Base2Open,
	#[strum(serialize = "}")]
	RBrace,
	#[strum(serialize = "16")]
	Base16Prefix,
	#[strum(serialize = "#{")]
	Base16Open,
	#[strum(serialize = "64#{")]
	Base64Open,
	#[strum(serialize = "=")]
	Equals,
	#[strum(serialize = "#[")]
	MapOpen,
	#[strum(serialize = "]")]
	RBracket,
	#[strum(serialize = "[")]
	LBracket,
	#[strum(serialize = "while")]
	WhileLower,
	#[strum(serialize = "While")]
	WhileTitle,
	#[strum(serialize = "WHILE")]
	WhileUpper,
	#[strum(serialize = "loop")]
	LoopLower,
	#[strum(serialize = "LOOP")]
	LoopUpper,
	#[strum(serialize = "Loop")]
	LoopTitle,
	#[strum(serialize = "func")]
	FuncLower,
	#[strum(serialize = "Func")]
	FuncTitle,
	#[strum(serialize = "FUNC")]
	FuncUpper,
	#[strum(serialize = "function")]
	FunctionLower,
	#[strum(serialize = "Function")]
	FunctionTitle,
	#[strum(serialize = "FUNCTION")]
	FunctionUpper,
	#[strum(serialize = "_infix_op")]
	InfixOp,
	Hexa,
	RawString,
	MultilineString,
	ErrorSentinel,
	SourceFile,
	Include,
	Comment,
	Infix,
	Boolean,
	Number,
	Pair,
	Point,
	Money,
	Tuple,
	Time,
	Date,
	Char,
	Ref,
	Issue,
	Refinement,
	Email,
	File,
	FileContent,
	String,
	StringContent,
	EscapedChar,
	EscapedValue,
	Word,
	LitWord,
	GetWord,
	SetWord,
	Path,
	LitPath,
	GetPath,
	SetPath,
	Binary,
	Map,
	Tag,
	Block,
	Paren,
	While,
	Loop,
	Function,
}

impl NodeKind {
	pub const fn symbol(self) -> Symbol {
		self as Symbol
	}

	/// Kind name as it appears in trees.
	pub fn name(self) -> &'static str {
		self.into()
	}

	/// The control form introduced by a keyword spelling.
	pub const fn control_form(self) -> Option<NodeKind> {
		match self {
			Self::WhileLower | Self::WhileTitle | Self::WhileUpper => Some(Self::While),
			Self::LoopLower | Self::LoopUpper | Self::LoopTitle => Some(Self::Loop),
			Self::FuncLower
			| Self::FuncTitle
			| Self::FuncUpper
			| Self::FunctionLower
			| Self::FunctionTitle
			| Self::FunctionUpper => Some(Self::Function),
			_ => None,
		}
	}
}

pub const FIELD_LEFT: FieldId = 1;
pub const FIELD_OPERATOR: FieldId = 2;
pub const FIELD_RIGHT: FieldId = 3;

pub const FIELDS: &[&str] = &["left", "operator", "right"];

pub const EXTERNAL_TOKENS: &[&str] = &[
	"_infix_op",
	"hexa",
	"raw_string",
	"multiline_string",
	"error_sentinel",
];

const fn anon(name: &'static str) -> SymbolMetadata {
	SymbolMetadata::anonymous(name)
}

const fn named(name: &'static str) -> SymbolMetadata {
	SymbolMetadata::named(name)
}

/// Symbol metadata, indexed by [`NodeKind`] discriminant.
pub const SYMBOLS: &[SymbolMetadata] = &[
	SymbolMetadata::hidden("end", false),
	anon("#include"),
	anon("true"),
	anon("false"),
	anon("("),
	anon(","),
	anon(")"),
	anon("#\""),
	anon("\""),
	anon("/"),
	anon("%"),
	anon("#("),
	anon("'"),
	anon(":"),
	anon("2#{"),
	anon("}"),
	anon("16"),
	anon("#{"),
	anon("64#{"),
	anon("="),
	anon("#["),
	anon("]"),
	anon("["),
	anon("while"),
	anon("While"),
	anon("WHILE"),
	anon("loop"),
	anon("LOOP"),
	anon("Loop"),
	anon("func"),
	anon("Func"),
	anon("FUNC"),
	anon("function"),
	anon("Function"),
	anon("FUNCTION"),
	SymbolMetadata::hidden("_infix_op", true),
	named("hexa"),
	named("raw_string"),
	named("multiline_string"),
	named("error_sentinel"),
	named("source_file"),
	named("include"),
	named("comment"),
	named("infix"),
	named("boolean"),
	named("number"),
	named("pair"),
	named("point"),
	named("money"),
	named("tuple"),
	named("time"),
	named("date"),
	named("char"),
	named("ref"),
	named("issue"),
	named("refinement"),
	named("email"),
	named("file"),
	named("file_content"),
	named("string"),
	named("string_content"),
	named("escaped_char"),
	named("escaped_value"),
	named("word"),
	named("lit_word"),
	named("get_word"),
	named("set_word"),
	named("path"),
	named("lit_path"),
	named("get_path"),
	named("set_path"),
	named("binary"),
	named("map"),
	named("tag"),
	named("block"),
	named("paren"),
	named("while"),
	named("loop"),
	named("function"),
];

const _: () = assert!(SYMBOLS.len() == NodeKind::COUNT);
