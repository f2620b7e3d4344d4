//! Grammar loading from shared libraries.
//!
//! A grammar crate is named `<name>-grammar` and built as a `cdylib`, so cargo
//! emits it as `lib<name>_grammar.so` (`.dylib`, or `<name>_grammar.dll`). It
//! exports `red_syntax_language_<name>` with the [`LanguageFn`] ABI. Loading
//! resolves that symbol and wraps the table it returns. Libraries are never
//! unloaded, so the resulting [`Language`] stays valid for the life of the
//! process.
//!
//! The table holds Rust types, so only libraries built by the same toolchain
//! as the host can be loaded. [`Language::new`] refuses tables whose layout
//! fingerprint differs.
//!
//! # Search paths
//!
//! In order:
//!
//! * `$RED_SYNTAX_RUNTIME/grammars`
//! * `$XDG_CACHE_HOME/red-syntax/grammars` (or `~/.cache/red-syntax/grammars`)
//! * `$XDG_DATA_HOME/red-syntax/grammars` (or `~/.local/share/red-syntax/grammars`)
//! * `grammars/` next to the running executable

use std::mem;
use std::path::{Path, PathBuf};

use libloading::Library;
use thiserror::Error;
use tracing::{debug, info};

use crate::language::{Language, LanguageFn};

/// Environment variable naming an extra runtime directory.
pub const RUNTIME_ENV: &str = "RED_SYNTAX_RUNTIME";

/// Errors that can occur when loading a grammar.
#[derive(Error, Debug)]
pub enum GrammarError {
	/// Grammar library not found in any search path.
	#[error("grammar not found: {0}")]
	NotFound(String),

	/// Failed to load the dynamic library.
	#[error("failed to load grammar library: {0}")]
	LoadError(String),

	/// Grammar library exists but doesn't export the expected symbol.
	#[error("grammar library missing language function: {0}")]
	MissingSymbol(String),

	/// The language function returned null or an unrecognised table.
	#[error("grammar library returned no language: {0}")]
	NullLanguage(String),

	/// Filesystem I/O error.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

/// Loads a grammar by name from the default search paths.
pub fn load_grammar(name: &str) -> Result<Language, GrammarError> {
	load_grammar_from_dirs(name, &grammar_search_paths())
}

/// Loads a grammar by name from the first directory that contains its library.
pub fn load_grammar_from_dirs(name: &str, dirs: &[PathBuf]) -> Result<Language, GrammarError> {
	let lib_name = grammar_library_name(name);

	for dir in dirs {
		let lib_path = dir.join(&lib_name);
		if lib_path.exists() {
			return load_grammar_from_path(&lib_path, name);
		}
		debug!(grammar = name, dir = %dir.display(), "Grammar not in search path");
	}

	Err(GrammarError::NotFound(name.to_string()))
}

/// Loads a grammar from a specific library path.
pub fn load_grammar_from_path(path: &Path, name: &str) -> Result<Language, GrammarError> {
	if !path.is_file() {
		return Err(GrammarError::Io(std::io::Error::new(
			std::io::ErrorKind::NotFound,
			format!("{} is not a file", path.display()),
		)));
	}

	// SAFETY: loading a grammar library runs its initialisers; grammar
	// libraries are trusted artifacts.
	let library = unsafe { Library::new(path) }
		.map_err(|e| GrammarError::LoadError(format!("{}: {e}", path.display())))?;

	let symbol = language_symbol_name(name);
	// SAFETY: grammar accessors take no arguments and return a table pointer.
	let accessor = unsafe { library.get::<unsafe extern "C" fn() -> *const ()>(symbol.as_bytes()) }
		.map(|accessor| *accessor)
		.map_err(|e| GrammarError::MissingSymbol(format!("{symbol}: {e}")))?;

	// SAFETY: `accessor` was resolved from the library under the accessor name,
	// and the library is kept loaded below.
	let language_fn = unsafe { LanguageFn::from_raw(accessor) };
	let language = Language::new(language_fn)
		.ok_or_else(|| GrammarError::NullLanguage(format!("{}: {symbol}", path.display())))?;

	// The table lives inside the library.
	mem::forget(library);

	info!(grammar = name, path = %path.display(), abi = language.abi_version(), "Loaded grammar");
	Ok(language)
}

/// Returns the platform-specific library filename for a grammar, as cargo
/// names the `cdylib` of a crate called `<name>-grammar`.
pub fn grammar_library_name(name: &str) -> String {
	let safe_name = name.replace('-', "_");
	#[cfg(target_os = "macos")]
	{
		format!("lib{safe_name}_grammar.dylib")
	}
	#[cfg(target_os = "windows")]
	{
		format!("{safe_name}_grammar.dll")
	}
	#[cfg(not(any(target_os = "macos", target_os = "windows")))]
	{
		format!("lib{safe_name}_grammar.so")
	}
}

fn language_symbol_name(name: &str) -> String {
	format!("red_syntax_language_{}", name.replace('-', "_"))
}

/// Returns directories to search for compiled grammar libraries.
pub fn grammar_search_paths() -> Vec<PathBuf> {
	let mut dirs = Vec::new();

	if let Some(runtime) = std::env::var_os(RUNTIME_ENV) {
		dirs.push(PathBuf::from(runtime).join("grammars"));
	}

	if let Some(cache) = cache_dir() {
		dirs.push(cache.join("grammars"));
	}

	if let Some(data) = data_local_dir() {
		dirs.push(data.join("red-syntax").join("grammars"));
	}

	if let Ok(exe) = std::env::current_exe()
		&& let Some(dir) = exe.parent()
	{
		dirs.push(dir.join("grammars"));
	}

	dirs
}

/// Returns the cache directory: `~/.cache/red-syntax/`.
fn cache_dir() -> Option<PathBuf> {
	#[cfg(unix)]
	{
		std::env::var_os("XDG_CACHE_HOME")
			.map(PathBuf::from)
			.or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache")))
			.map(|p| p.join("red-syntax"))
	}
	#[cfg(windows)]
	{
		std::env::var_os("LOCALAPPDATA").map(|p| PathBuf::from(p).join("red-syntax").join("cache"))
	}
	#[cfg(not(any(unix, windows)))]
	{
		None
	}
}

/// Returns the platform-specific local data directory.
fn data_local_dir() -> Option<PathBuf> {
	#[cfg(unix)]
	{
		std::env::var_os("XDG_DATA_HOME")
			.map(PathBuf::from)
			.or_else(|| {
				std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share"))
			})
	}
	#[cfg(windows)]
	{
		std::env::var_os("LOCALAPPDATA").map(PathBuf::from)
	}
	#[cfg(not(any(unix, windows)))]
	{
		None
	}
}
