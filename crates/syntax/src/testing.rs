//! A tiny whitespace-separated grammar for exercising the generic machinery.
//!
//! * every chunk becomes a `word`, the first one tagged with the `head` field
//! * `,` becomes an anonymous token
//! * `!` becomes an error node
//! * `?` becomes a missing `word`

use std::ptr;

use crate::language::{
	ERROR_SYMBOL, LANGUAGE_VERSION, LanguageFn, LanguageTable, MIN_COMPATIBLE_LANGUAGE_VERSION,
	SymbolMetadata, TABLE_LAYOUT, TABLE_MAGIC,
};
use crate::tree::NodeData;

const SYMBOLS: &[SymbolMetadata] = &[
	SymbolMetadata::hidden("end", false),
	SymbolMetadata::named("document"),
	SymbolMetadata::named("word"),
	SymbolMetadata::anonymous(","),
];

fn parse(text: &str) -> NodeData {
	let mut children = Vec::new();
	let mut offset = 0;
	for chunk in text.split_inclusive(char::is_whitespace) {
		let trimmed = chunk.trim_end();
		let range = offset..offset + trimmed.len();
		offset += chunk.len();
		let node = match trimmed {
			"" => continue,
			"," => NodeData::leaf(3, range),
			"!" => NodeData::error(range, Vec::new()),
			"?" => NodeData::missing(2, range.start),
			_ => NodeData::leaf(2, range),
		};
		let node = if children.is_empty() && node.symbol() != ERROR_SYMBOL {
			node.with_field(1)
		} else {
			node
		};
		children.push(node);
	}
	NodeData::branch(1, 0..text.len(), children)
}

static TABLE: LanguageTable = table(LANGUAGE_VERSION);
static OLD_TABLE: LanguageTable = table(MIN_COMPATIBLE_LANGUAGE_VERSION);
static ANCIENT_TABLE: LanguageTable = table(MIN_COMPATIBLE_LANGUAGE_VERSION - 1);
static FOREIGN_TABLE: [u32; 4] = [LANGUAGE_VERSION, 0, 0, 0];
// Written by a build whose `NodeData` had a different shape.
static SKEWED_TABLE: LanguageTable = LanguageTable {
	layout: TABLE_LAYOUT ^ 0x10,
	..table(LANGUAGE_VERSION)
};

const fn table(abi_version: u32) -> LanguageTable {
	LanguageTable {
		magic: TABLE_MAGIC,
		abi_version,
		layout: TABLE_LAYOUT,
		name: "test",
		symbols: SYMBOLS,
		fields: &["head"],
		external_tokens: &[],
		parse,
	}
}

extern "C" fn test_language() -> *const () {
	ptr::from_ref(&TABLE).cast()
}

extern "C" fn old_language() -> *const () {
	ptr::from_ref(&OLD_TABLE).cast()
}

extern "C" fn ancient_language() -> *const () {
	ptr::from_ref(&ANCIENT_TABLE).cast()
}

extern "C" fn foreign_language() -> *const () {
	ptr::from_ref(&FOREIGN_TABLE).cast()
}

extern "C" fn skewed_language() -> *const () {
	ptr::from_ref(&SKEWED_TABLE).cast()
}

extern "C" fn null_language() -> *const () {
	ptr::null()
}

pub(crate) const TEST_LANGUAGE: LanguageFn = unsafe { LanguageFn::from_raw(test_language) };
pub(crate) const OLD_LANGUAGE: LanguageFn = unsafe { LanguageFn::from_raw(old_language) };
pub(crate) const ANCIENT_LANGUAGE: LanguageFn = unsafe { LanguageFn::from_raw(ancient_language) };
pub(crate) const FOREIGN_LANGUAGE: LanguageFn = unsafe { LanguageFn::from_raw(foreign_language) };
pub(crate) const SKEWED_LANGUAGE: LanguageFn = unsafe { LanguageFn::from_raw(skewed_language) };
pub(crate) const NULL_LANGUAGE: LanguageFn = unsafe { LanguageFn::from_raw(null_language) };
