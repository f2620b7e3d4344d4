//! The grammar-load self test.
//!
//! A grammar crate calls [`verify_language`] with its accessor to confirm the
//! compiled language object can be obtained. The check is side-effect free
//! and may run any number of times, from any thread.

use thiserror::Error;
use tracing::{debug, error};

use crate::language::{Language, LanguageFn};

/// The grammar's accessor did not produce a usable language object.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Error loading {grammar} grammar")]
pub struct GrammarLoadFailure {
	/// Human-readable grammar name, e.g. `Red`.
	pub grammar: String,
}

/// Obtains the language object behind `language_fn`.
///
/// Fails with [`GrammarLoadFailure`] if the accessor yields nothing usable.
/// Only loading is checked; the ABI version is left to
/// [`Parser::set_language`](crate::Parser::set_language).
pub fn verify_language(grammar: &str, language_fn: LanguageFn) -> Result<Language, GrammarLoadFailure> {
	match Language::new(language_fn) {
		Some(language) => {
			debug!(
				grammar,
				abi = language.abi_version(),
				kinds = language.node_kind_count(),
				"Grammar loads"
			);
			Ok(language)
		}
		None => {
			error!(grammar, "Grammar accessor returned no language");
			Err(GrammarLoadFailure {
				grammar: grammar.to_string(),
			})
		}
	}
}
