//! The Red grammar.
//!
//! Bundles the language table for [Red](https://www.red-lang.org) and exports
//! it two ways: the [`LANGUAGE`] constant for static linking, and the
//! `red_syntax_language_red` symbol for loading the `cdylib` build at runtime
//! with [`red_syntax::load_grammar`]. The library must be built by the same
//! toolchain as the host loading it.
//!
//! ```
//! let language = red_grammar::verify_grammar_loads().expect("Error loading Red grammar");
//! let mut parser = red_syntax::Parser::new();
//! parser.set_language(&language).expect("compatible ABI");
//! let tree = parser.parse("print 1 + 2").expect("language is set");
//! assert_eq!(
//! 	tree.root_node().to_sexp(),
//! 	"(source_file (word) (infix left: (number) right: (number)))"
//! );
//! ```

mod config;
pub mod kinds;
mod rules;
mod scanner;
mod tokens;

use std::ptr;

pub use config::{LANGUAGES_TOML, display_name, language_configs};
pub use kinds::NodeKind;
use red_syntax::{
	GrammarLoadFailure, LANGUAGE_VERSION, Language, LanguageFn, LanguageTable, TABLE_LAYOUT, TABLE_MAGIC,
	verify_language,
};

/// Grammar name used for the exported symbol and library file.
pub const GRAMMAR_NAME: &str = "red";

static TABLE: LanguageTable = LanguageTable {
	magic: TABLE_MAGIC,
	abi_version: LANGUAGE_VERSION,
	layout: TABLE_LAYOUT,
	name: GRAMMAR_NAME,
	symbols: kinds::SYMBOLS,
	fields: kinds::FIELDS,
	external_tokens: kinds::EXTERNAL_TOKENS,
	parse: rules::parse,
};

/// Returns a pointer to the Red language table.
#[unsafe(no_mangle)]
pub extern "C" fn red_syntax_language_red() -> *const () {
	ptr::from_ref(&TABLE).cast()
}

/// The accessor for the Red language table.
// SAFETY: `red_syntax_language_red` takes no arguments and returns a pointer to static data.
pub const LANGUAGE: LanguageFn = unsafe { LanguageFn::from_raw(red_syntax_language_red) };

/// Confirms the Red language object can be obtained.
pub fn verify_grammar_loads() -> Result<Language, GrammarLoadFailure> {
	verify_language(display_name(), LANGUAGE)
}
