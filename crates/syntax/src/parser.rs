//! Parser driver.

use tracing::{debug, warn};

use crate::language::{LANGUAGE_VERSION, Language, LanguageError, MIN_COMPATIBLE_LANGUAGE_VERSION};
use crate::tree::Tree;

/// Runs a language's parse entry point over complete source texts.
///
/// Every call re-parses from scratch. Malformed input never fails the parse;
/// it shows up as error and missing nodes in the returned tree.
#[derive(Debug, Default)]
pub struct Parser {
	language: Option<Language>,
}

impl Parser {
	pub fn new() -> Self {
		Self::default()
	}

	/// Binds a language.
	///
	/// # Errors
	///
	/// Returns [`LanguageError::Version`] if the table's ABI version is outside
	/// [`MIN_COMPATIBLE_LANGUAGE_VERSION`]`..=`[`LANGUAGE_VERSION`]. The parser
	/// keeps its previous language in that case.
	pub fn set_language(&mut self, language: &Language) -> Result<(), LanguageError> {
		let version = language.abi_version();
		if !(MIN_COMPATIBLE_LANGUAGE_VERSION..=LANGUAGE_VERSION).contains(&version) {
			warn!(language = language.name(), version, "Rejected incompatible language");
			return Err(LanguageError::Version { version });
		}
		self.language = Some(*language);
		Ok(())
	}

	pub fn language(&self) -> Option<Language> {
		self.language
	}

	/// Parses `text`, or returns `None` if no language has been set.
	pub fn parse(&mut self, text: impl AsRef<str>) -> Option<Tree> {
		let language = self.language?;
		let text = text.as_ref();
		let root = (language.parse_fn())(text);
		let tree = Tree::new(language, text, root);
		debug!(
			language = language.name(),
			bytes = text.len(),
			has_error = tree.root_node().has_error(),
			"Parsed source"
		);
		Some(tree)
	}
}
