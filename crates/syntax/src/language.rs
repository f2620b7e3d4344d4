//! Language tables and handles.
//!
//! A grammar artifact describes itself with a static [`LanguageTable`]: its
//! symbols, fields, external tokens and parse entry point. The artifact hands
//! the table out through an exported accessor with the [`LanguageFn`] ABI, and
//! [`Language::new`] turns the raw pointer it returns into a handle.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr::{self, NonNull};

use thiserror::Error;
pub use tree_sitter_language::LanguageFn;

use crate::tree::NodeData;

/// ABI version written by grammars built against this crate.
pub const LANGUAGE_VERSION: u32 = 15;

/// Oldest table ABI a [`Parser`](crate::Parser) still accepts.
pub const MIN_COMPATIBLE_LANGUAGE_VERSION: u32 = 13;

/// Marker at the start of every [`LanguageTable`].
///
/// Shared libraries may export an accessor with the expected name but a
/// different table layout; the marker lets [`Language::new`] refuse them.
pub const TABLE_MAGIC: [u8; 8] = *b"REDSYNTX";

/// Shape of the types a grammar shares with this crate, stored in every
/// [`LanguageTable`].
///
/// `LanguageTable`, `SymbolMetadata` and `NodeData` are Rust types crossing a
/// shared-library boundary, so a grammar library is only sound when it was
/// built by the same compiler as the host. The fingerprint catches the common
/// mismatch (a different size or alignment); it cannot see a reordering that
/// keeps the sizes, so the toolchain requirement still stands.
pub const TABLE_LAYOUT: u32 = layout_fingerprint();

const fn layout_fingerprint() -> u32 {
	let table = size_of::<LanguageTable>() as u32;
	let metadata = size_of::<SymbolMetadata>() as u32;
	let node = size_of::<NodeData>() as u32;
	let align = align_of::<NodeData>() as u32;
	(table << 20) ^ (metadata << 12) ^ (node << 4) ^ align
}

/// Numeric node kind.
pub type Symbol = u16;

/// Numeric field name. Zero means "no field".
pub type FieldId = u16;

/// Symbol used for error nodes produced during recovery.
pub const ERROR_SYMBOL: Symbol = Symbol::MAX;

/// Per-symbol metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolMetadata {
	/// Node kind name, or the literal text for anonymous tokens.
	pub name: &'static str,
	/// Whether the node is named (as opposed to a literal token).
	pub named: bool,
	/// Whether the node appears in trees. Hidden rules start with `_`.
	pub visible: bool,
}

impl SymbolMetadata {
	/// Metadata for a visible named node.
	pub const fn named(name: &'static str) -> Self {
		Self {
			name,
			named: true,
			visible: true,
		}
	}

	/// Metadata for a visible literal token.
	pub const fn anonymous(name: &'static str) -> Self {
		Self {
			name,
			named: false,
			visible: true,
		}
	}

	/// Metadata for a node that never shows up in S-expressions.
	pub const fn hidden(name: &'static str, named: bool) -> Self {
		Self {
			name,
			named,
			visible: false,
		}
	}
}

/// Static description of a grammar.
///
/// The layout is fixed so a table reached through a raw pointer can be
/// checked ([`TABLE_MAGIC`], `abi_version`, [`TABLE_LAYOUT`]) before anything
/// else is read.
#[repr(C)]
pub struct LanguageTable {
	/// Must equal [`TABLE_MAGIC`].
	pub magic: [u8; 8],
	/// ABI version the table was written for.
	pub abi_version: u32,
	/// Must equal [`TABLE_LAYOUT`].
	pub layout: u32,
	/// Grammar name, e.g. `red`.
	pub name: &'static str,
	/// Symbol metadata indexed by [`Symbol`].
	pub symbols: &'static [SymbolMetadata],
	/// Field names; field id `n` is stored at index `n - 1`.
	pub fields: &'static [&'static str],
	/// Names of tokens produced by the grammar's external scanner.
	pub external_tokens: &'static [&'static str],
	/// Parses a complete source text into its root node.
	pub parse: fn(&str) -> NodeData,
}

/// The fixed-layout prefix of a [`LanguageTable`].
#[repr(C)]
#[derive(Clone, Copy)]
struct TableHeader {
	magic: [u8; 8],
	_abi_version: u32,
	layout: u32,
}

/// An opaque handle to a grammar's [`LanguageTable`].
#[derive(Clone, Copy)]
pub struct Language(&'static LanguageTable);

impl Language {
	/// Invokes a grammar accessor and wraps the table it returns.
	///
	/// Returns `None` when the accessor returns null, or a pointer that does not
	/// start with [`TABLE_MAGIC`] and [`TABLE_LAYOUT`]. The table's ABI version
	/// is not checked here; [`Parser::set_language`](crate::Parser::set_language)
	/// does that.
	pub fn new(language_fn: LanguageFn) -> Option<Self> {
		// SAFETY: `LanguageFn` can only be built (unsafely) from a grammar accessor,
		// which takes no arguments and returns a pointer to static data or null.
		let raw = unsafe { (language_fn.into_raw())() };
		let table = NonNull::new(raw.cast_mut())?;

		// SAFETY: every table layout this crate may be handed starts with at least
		// sixteen readable bytes, and the read makes no alignment assumption.
		let header = unsafe { table.cast::<TableHeader>().read_unaligned() };
		if header.magic != TABLE_MAGIC || header.layout != TABLE_LAYOUT {
			return None;
		}

		// SAFETY: the magic and layout identify a `LanguageTable`, which lives for the rest
		// of the process (static data, or a library that is never unloaded).
		Some(Self(unsafe { table.cast::<LanguageTable>().as_ref() }))
	}

	/// Returns the grammar name.
	pub fn name(&self) -> &'static str {
		self.0.name
	}

	/// Returns the ABI version the table was written for.
	pub fn abi_version(&self) -> u32 {
		self.0.abi_version
	}

	/// Number of symbols, not counting [`ERROR_SYMBOL`].
	pub fn node_kind_count(&self) -> usize {
		self.0.symbols.len()
	}

	/// Returns the kind name for a symbol.
	pub fn node_kind_for_id(&self, id: Symbol) -> Option<&'static str> {
		if id == ERROR_SYMBOL {
			return Some("ERROR");
		}
		self.metadata(id).map(|meta| meta.name)
	}

	/// Looks up a symbol by kind name. Returns `0` when there is none.
	pub fn id_for_node_kind(&self, kind: &str, named: bool) -> Symbol {
		if named && kind == "ERROR" {
			return ERROR_SYMBOL;
		}
		self.0
			.symbols
			.iter()
			.position(|meta| meta.name == kind && meta.named == named)
			.and_then(|idx| Symbol::try_from(idx).ok())
			.unwrap_or(0)
	}

	/// Whether the symbol is a named node.
	pub fn node_kind_is_named(&self, id: Symbol) -> bool {
		id == ERROR_SYMBOL || self.metadata(id).is_some_and(|meta| meta.named)
	}

	/// Whether the symbol is visible in trees.
	pub fn node_kind_is_visible(&self, id: Symbol) -> bool {
		id == ERROR_SYMBOL || self.metadata(id).is_some_and(|meta| meta.visible)
	}

	/// Number of distinct field names.
	pub fn field_count(&self) -> usize {
		self.0.fields.len()
	}

	/// Returns the field name for an id. Field ids start at `1`.
	pub fn field_name_for_id(&self, id: FieldId) -> Option<&'static str> {
		let idx = usize::from(id).checked_sub(1)?;
		self.0.fields.get(idx).copied()
	}

	/// Looks up a field id by name.
	pub fn field_id_for_name(&self, name: &str) -> Option<FieldId> {
		self.0
			.fields
			.iter()
			.position(|field| *field == name)
			.and_then(|idx| FieldId::try_from(idx + 1).ok())
	}

	/// Names of tokens produced by the grammar's external scanner.
	pub fn external_token_names(&self) -> &'static [&'static str] {
		self.0.external_tokens
	}

	pub(crate) fn parse_fn(&self) -> fn(&str) -> NodeData {
		self.0.parse
	}

	fn metadata(&self, id: Symbol) -> Option<&'static SymbolMetadata> {
		self.0.symbols.get(usize::from(id))
	}
}

impl PartialEq for Language {
	fn eq(&self, other: &Self) -> bool {
		ptr::eq(self.0, other.0)
	}
}

impl Eq for Language {}

impl Hash for Language {
	fn hash<H: Hasher>(&self, state: &mut H) {
		ptr::hash(self.0, state);
	}
}

impl fmt::Debug for Language {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Language")
			.field("name", &self.name())
			.field("abi_version", &self.abi_version())
			.field("node_kind_count", &self.node_kind_count())
			.finish()
	}
}

/// Errors raised when binding a language to a parser.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LanguageError {
	/// The table's ABI version is outside the supported range.
	#[error(
		"incompatible language version {version}, expected {}..={}",
		MIN_COMPATIBLE_LANGUAGE_VERSION,
		LANGUAGE_VERSION
	)]
	Version {
		/// Version found in the table.
		version: u32,
	},
}
