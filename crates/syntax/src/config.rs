//! Language metadata from `languages.toml`.
//!
//! ```toml
//! [[language]]
//! name = "red"
//! display-name = "Red"
//! scope = "source.red"
//! file-types = ["red", "reds"]
//! comment-token = ";"
//! injection-regex = "^(red|reds)$"
//! ```

use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur when loading language configurations.
#[derive(Debug, Error)]
pub enum LanguageConfigError {
	#[error("failed to read languages.toml: {0}")]
	Io(#[from] std::io::Error),
	#[error("failed to parse languages.toml: {0}")]
	Toml(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize)]
struct LanguagesFile {
	#[serde(default)]
	language: Vec<LanguageConfigRaw>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct LanguageConfigRaw {
	name: String,
	display_name: Option<String>,
	grammar: Option<String>,
	scope: Option<String>,
	#[serde(default)]
	file_types: Vec<String>,
	comment_token: Option<String>,
	injection_regex: Option<String>,
}

/// Metadata for one language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
	/// Language name (e.g. "red").
	pub name: String,
	/// Scope name used by highlighters (e.g. "source.red").
	pub scope: Option<String>,
	/// File extensions, without the dot.
	pub file_types: Vec<String>,
	/// Line comment token.
	pub comment_token: Option<String>,
	/// Injection regex for matching code block languages.
	pub injection_regex: Option<Regex>,
	display_name: Option<String>,
	grammar: Option<String>,
}

impl From<LanguageConfigRaw> for LanguageConfig {
	fn from(raw: LanguageConfigRaw) -> Self {
		let injection_regex = raw.injection_regex.and_then(|r| {
			Regex::new(&r)
				.map_err(|e| warn!(language = raw.name, regex = r, error = %e, "Invalid injection regex"))
				.ok()
		});
		Self {
			name: raw.name,
			scope: raw.scope,
			file_types: raw.file_types,
			comment_token: raw.comment_token,
			injection_regex,
			display_name: raw.display_name,
			grammar: raw.grammar,
		}
	}
}

impl LanguageConfig {
	/// Human-readable name, falling back to [`name`](Self::name).
	pub fn display_name(&self) -> &str {
		self.display_name.as_deref().unwrap_or(&self.name)
	}

	/// Grammar library name, falling back to [`name`](Self::name).
	pub fn grammar_name(&self) -> &str {
		self.grammar.as_deref().unwrap_or(&self.name)
	}

	/// Whether an injection label (e.g. a markdown fence tag) selects this language.
	pub fn matches_injection(&self, label: &str) -> bool {
		self.injection_regex
			.as_ref()
			.is_some_and(|regex| regex.is_match(label))
	}
}

/// The set of languages declared in a `languages.toml`.
#[derive(Debug, Clone, Default)]
pub struct LanguageConfigs {
	languages: Vec<LanguageConfig>,
}

impl LanguageConfigs {
	pub fn from_toml(text: &str) -> Result<Self, LanguageConfigError> {
		let file: LanguagesFile = toml::from_str(text)?;
		Ok(Self {
			languages: file.language.into_iter().map(LanguageConfig::from).collect(),
		})
	}

	pub fn load(path: &Path) -> Result<Self, LanguageConfigError> {
		let text = std::fs::read_to_string(path)?;
		Self::from_toml(&text)
	}

	pub fn iter(&self) -> impl Iterator<Item = &LanguageConfig> {
		self.languages.iter()
	}

	pub fn len(&self) -> usize {
		self.languages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.languages.is_empty()
	}

	pub fn language_for_name(&self, name: &str) -> Option<&LanguageConfig> {
		self.languages.iter().find(|lang| lang.name == name)
	}

	/// Finds the language whose file types include the path's extension.
	pub fn language_for_path(&self, path: &Path) -> Option<&LanguageConfig> {
		let ext = path.extension()?.to_str()?;
		self.languages
			.iter()
			.find(|lang| lang.file_types.iter().any(|ft| ft.eq_ignore_ascii_case(ext)))
	}

	pub fn language_for_injection(&self, label: &str) -> Option<&LanguageConfig> {
		self.languages.iter().find(|lang| lang.matches_injection(label))
	}
}
