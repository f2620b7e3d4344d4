//! Node kind listing, in the shape of tree-sitter's `node-types.json`.

use serde::Serialize;

use crate::language::{Language, Symbol};

/// One visible node kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeType {
	#[serde(rename = "type")]
	pub kind: &'static str,
	pub named: bool,
}

/// Lists the visible node kinds of `language`, named kinds first.
///
/// Kinds spelled the same way by several symbols (case variants of a keyword,
/// for instance) are listed once.
pub fn node_types(language: &Language) -> Vec<NodeType> {
	let mut types: Vec<NodeType> = Vec::new();
	for id in 0..language.node_kind_count() {
		let Ok(id) = Symbol::try_from(id) else {
			break;
		};
		if !language.node_kind_is_visible(id) {
			continue;
		}
		let Some(kind) = language.node_kind_for_id(id) else {
			continue;
		};
		let ty = NodeType {
			kind,
			named: language.node_kind_is_named(id),
		};
		if !types.contains(&ty) {
			types.push(ty);
		}
	}
	types.sort_by_key(|ty| !ty.named);
	types
}

/// Pretty JSON array of [`node_types`].
pub fn node_types_json(language: &Language) -> serde_json::Result<String> {
	serde_json::to_string_pretty(&node_types(language))
}
