// Grammar loading runs inside host processes - diagnostics go through tracing, not stderr
#![deny(clippy::print_stderr)]

//! Language handles and syntax trees for statically bundled grammars.
//!
//! A grammar artifact exports an accessor ([`LanguageFn`]) returning a raw
//! pointer to its [`LanguageTable`]. This crate wraps that pointer into a
//! [`Language`], drives the grammar's parse entry point through a [`Parser`]
//! and exposes the resulting [`Tree`].
//!
//! # Architecture
//!
//! * [`language`]: ABI-versioned language tables and the opaque [`Language`] handle
//! * [`parser`]: Binds a language and produces trees
//! * [`tree`]: Immutable syntax trees, positions and S-expressions
//! * [`loader`]: Grammar artifacts loaded from shared libraries
//! * [`verify`]: The grammar-load self test
//! * [`config`]: Language metadata from `languages.toml`
//! * [`node_types`]: Node kind listing for tooling
//! * [`corpus`]: Corpus test files pairing source text with expected trees

pub mod config;
pub mod corpus;
pub mod language;
pub mod loader;
pub mod node_types;
pub mod parser;
pub mod tree;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{LanguageConfig, LanguageConfigError, LanguageConfigs};
pub use corpus::{CorpusEntry, CorpusError, CorpusOutcome, parse_corpus, run_corpus};
pub use language::{
	ERROR_SYMBOL, FieldId, LANGUAGE_VERSION, Language, LanguageError, LanguageFn, LanguageTable,
	MIN_COMPATIBLE_LANGUAGE_VERSION, Symbol, SymbolMetadata, TABLE_LAYOUT, TABLE_MAGIC,
};
pub use loader::{GrammarError, grammar_library_name, grammar_search_paths, load_grammar, load_grammar_from_dirs, load_grammar_from_path};
pub use node_types::{NodeType, node_types, node_types_json};
pub use parser::Parser;
pub use tree::{Node, NodeData, Point, Tree};
pub use verify::{GrammarLoadFailure, verify_language};
