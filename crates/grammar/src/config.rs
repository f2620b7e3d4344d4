//! Language metadata bundled with the grammar.

use std::sync::LazyLock;

use red_syntax::{LanguageConfig, LanguageConfigs};
use tracing::warn;

use crate::GRAMMAR_NAME;

/// The bundled `languages.toml`.
pub const LANGUAGES_TOML: &str = include_str!("../languages.toml");

const FALLBACK_DISPLAY_NAME: &str = "Red";

static CONFIGS: LazyLock<LanguageConfigs> = LazyLock::new(|| {
	LanguageConfigs::from_toml(LANGUAGES_TOML).unwrap_or_else(|err| {
		warn!(error = %err, "Bundled languages.toml is invalid");
		LanguageConfigs::default()
	})
});

/// Language entries from the bundled `languages.toml`.
pub fn language_configs() -> &'static LanguageConfigs {
	&CONFIGS
}

/// Human-readable grammar name used in diagnostics.
pub fn display_name() -> &'static str {
	CONFIGS
		.language_for_name(GRAMMAR_NAME)
		.map_or(FALLBACK_DISPLAY_NAME, LanguageConfig::display_name)
}
