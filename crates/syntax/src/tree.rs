//! Syntax trees.
//!
//! Grammars build a [`NodeData`] hierarchy; the [`Parser`](crate::Parser)
//! pairs it with the source text and the [`Language`] to form a [`Tree`].
//! [`Node`] is a cheap borrowed view used for all queries.

use std::fmt::{self, Write as _};
use std::mem;
use std::ops::Range;

use crate::language::{ERROR_SYMBOL, FieldId, Language, Symbol};

/// A zero-based `(row, column)` position. Columns count bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
	pub row: usize,
	pub column: usize,
}

impl Point {
	pub const fn new(row: usize, column: usize) -> Self {
		Self { row, column }
	}
}

impl fmt::Display for Point {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "({}, {})", self.row, self.column)
	}
}

/// Owned node storage produced by a grammar's parse entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
	symbol: Symbol,
	range: Range<usize>,
	field: Option<FieldId>,
	missing: bool,
	children: Vec<NodeData>,
}

impl NodeData {
	/// A node without children.
	pub fn leaf(symbol: Symbol, range: Range<usize>) -> Self {
		Self::branch(symbol, range, Vec::new())
	}

	/// A node with children.
	pub fn branch(symbol: Symbol, range: Range<usize>, children: Vec<NodeData>) -> Self {
		Self {
			symbol,
			range,
			field: None,
			missing: false,
			children,
		}
	}

	/// An error node covering text the grammar could not place.
	pub fn error(range: Range<usize>, children: Vec<NodeData>) -> Self {
		Self::branch(ERROR_SYMBOL, range, children)
	}

	/// A zero-width node standing in for a token that was expected but absent.
	pub fn missing(symbol: Symbol, at: usize) -> Self {
		let mut node = Self::leaf(symbol, at..at);
		node.missing = true;
		node
	}

	/// Tags the node with a field of its parent.
	pub fn with_field(mut self, field: FieldId) -> Self {
		self.field = Some(field);
		self
	}

	pub fn symbol(&self) -> Symbol {
		self.symbol
	}

	pub fn byte_range(&self) -> Range<usize> {
		self.range.clone()
	}

	pub fn children(&self) -> &[NodeData] {
		&self.children
	}

	pub fn is_error(&self) -> bool {
		self.symbol == ERROR_SYMBOL
	}

	pub fn is_missing(&self) -> bool {
		self.missing
	}
}

// Long infix chains nest as deeply as they are long, so children are released
// from a heap stack instead of by recursion.
impl Drop for NodeData {
	fn drop(&mut self) {
		let mut pending = mem::take(&mut self.children);
		while let Some(mut node) = pending.pop() {
			pending.append(&mut node.children);
		}
	}
}

/// A parsed source text.
#[derive(Clone)]
pub struct Tree {
	language: Language,
	source: String,
	root: NodeData,
	line_starts: Vec<usize>,
}

impl Tree {
	pub(crate) fn new(language: Language, source: &str, root: NodeData) -> Self {
		let line_starts = std::iter::once(0)
			.chain(source.match_indices('\n').map(|(idx, _)| idx + 1))
			.collect();
		Self {
			language,
			source: source.to_owned(),
			root,
			line_starts,
		}
	}

	pub fn root_node(&self) -> Node<'_> {
		Node {
			tree: self,
			data: &self.root,
		}
	}

	pub fn language(&self) -> Language {
		self.language
	}

	/// The text this tree was parsed from.
	pub fn source(&self) -> &str {
		&self.source
	}

	fn point_for_byte(&self, byte: usize) -> Point {
		let row = self
			.line_starts
			.partition_point(|&start| start <= byte)
			.saturating_sub(1);
		Point::new(row, byte - self.line_starts[row])
	}
}

impl fmt::Debug for Tree {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{{Tree {}}}", self.root_node().to_sexp())
	}
}

/// A borrowed view of one node in a [`Tree`].
#[derive(Clone, Copy)]
pub struct Node<'tree> {
	tree: &'tree Tree,
	data: &'tree NodeData,
}

impl<'tree> Node<'tree> {
	pub fn kind(&self) -> &'static str {
		self.tree
			.language
			.node_kind_for_id(self.data.symbol)
			.unwrap_or("")
	}

	pub fn kind_id(&self) -> Symbol {
		self.data.symbol
	}

	pub fn is_named(&self) -> bool {
		self.tree.language.node_kind_is_named(self.data.symbol)
	}

	pub fn is_visible(&self) -> bool {
		self.tree.language.node_kind_is_visible(self.data.symbol)
	}

	pub fn is_error(&self) -> bool {
		self.data.is_error()
	}

	pub fn is_missing(&self) -> bool {
		self.data.missing
	}

	/// Whether this node or any descendant is an error or missing node.
	pub fn has_error(&self) -> bool {
		let mut pending = vec![self.data];
		while let Some(data) = pending.pop() {
			if data.is_error() || data.missing {
				return true;
			}
			pending.extend(&data.children);
		}
		false
	}

	/// Name of the field this node fills in its parent.
	pub fn field_name(&self) -> Option<&'static str> {
		self.data
			.field
			.and_then(|id| self.tree.language.field_name_for_id(id))
	}

	pub fn start_byte(&self) -> usize {
		self.data.range.start
	}

	pub fn end_byte(&self) -> usize {
		self.data.range.end
	}

	pub fn byte_range(&self) -> Range<usize> {
		self.data.byte_range()
	}

	pub fn start_position(&self) -> Point {
		self.tree.point_for_byte(self.data.range.start)
	}

	pub fn end_position(&self) -> Point {
		self.tree.point_for_byte(self.data.range.end)
	}

	/// The source text covered by this node.
	pub fn utf8_text(&self) -> &'tree str {
		&self.tree.source[self.data.byte_range()]
	}

	pub fn child_count(&self) -> usize {
		self.data.children.len()
	}

	pub fn child(&self, idx: usize) -> Option<Node<'tree>> {
		self.data.children.get(idx).map(|data| self.wrap(data))
	}

	pub fn children(&self) -> impl ExactSizeIterator<Item = Node<'tree>> + DoubleEndedIterator + use<'tree> {
		let tree = self.tree;
		self.data
			.children
			.iter()
			.map(move |data| Node { tree, data })
	}

	pub fn named_children(&self) -> impl Iterator<Item = Node<'tree>> + use<'tree> {
		self.children().filter(Node::is_named)
	}

	pub fn named_child_count(&self) -> usize {
		self.named_children().count()
	}

	pub fn named_child(&self, idx: usize) -> Option<Node<'tree>> {
		self.named_children().nth(idx)
	}

	/// Returns the first child tagged with `name`.
	pub fn child_by_field_name(&self, name: &str) -> Option<Node<'tree>> {
		let id = self.tree.language.field_id_for_name(name)?;
		self.data
			.children
			.iter()
			.find(|data| data.field == Some(id))
			.map(|data| self.wrap(data))
	}

	/// Returns the smallest node that spans `start..end`.
	pub fn descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Node<'tree>> {
		if start < self.start_byte() || end > self.end_byte() {
			return None;
		}
		let mut node = *self;
		'descend: loop {
			for child in node.children() {
				if child.start_byte() <= start && end <= child.end_byte() && child.byte_range() != node.byte_range() {
					node = child;
					continue 'descend;
				}
			}
			return Some(node);
		}
	}

	/// Renders the node as an S-expression of its named descendants.
	///
	/// Fields print as `name: (kind ...)`, missing tokens as `(MISSING "x")`
	/// and missing named nodes as `(MISSING kind)`.
	pub fn to_sexp(&self) -> String {
		enum Step<'a> {
			Open(Node<'a>, Option<&'static str>),
			Close,
		}

		let mut out = String::new();
		let mut pending = vec![Step::Open(*self, None)];
		while let Some(step) = pending.pop() {
			let (node, field) = match step {
				Step::Open(node, field) => (node, field),
				Step::Close => {
					out.push(')');
					continue;
				}
			};
			if node.is_error() || node.is_missing() || (node.is_visible() && node.is_named()) {
				node.open_sexp(&mut out, field);
				pending.push(Step::Close);
			}
			pending.extend(node.children().rev().map(|child| Step::Open(child, child.field_name())));
		}
		out
	}

	fn open_sexp(&self, out: &mut String, field: Option<&str>) {
		if !out.is_empty() && !out.ends_with('(') {
			out.push(' ');
		}
		if let Some(field) = field {
			let _ = write!(out, "{field}: ");
		}
		out.push('(');
		if !self.is_missing() {
			out.push_str(self.kind());
		} else if self.is_named() {
			let _ = write!(out, "MISSING {}", self.kind());
		} else {
			let _ = write!(out, "MISSING {:?}", self.kind());
		}
	}

	fn wrap(&self, data: &'tree NodeData) -> Node<'tree> {
		Node {
			tree: self.tree,
			data,
		}
	}
}

impl fmt::Debug for Node<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{{Node {} {} - {}}}",
			self.kind(),
			self.start_position(),
			self.end_position()
		)
	}
}

impl PartialEq for Node<'_> {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::eq(self.data, other.data)
	}
}

impl Eq for Node<'_> {}
