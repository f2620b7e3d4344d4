//! Syntactic rules of the Red grammar.
//!
//! A recursive-descent parser over the lexical rules in [`crate::tokens`] and
//! the external scanner. It never fails: text no rule accepts becomes an
//! `ERROR` node and absent closing tokens become zero-width `MISSING` nodes.
//!
//! ```text
//! source_file  = { include | expression }
//! expression   = paren | block | while | loop | function | simple
//! simple       = literal | infix
//! infix        = simple _infix_op simple          (left associative)
//! while        = ("while" | "While" | "WHILE") block block
//! loop         = ("loop" | "Loop" | "LOOP") simple block
//! function     = ("func" | "function" | ...) block block
//! ```
//!
//! Whitespace and `;` comments may appear between any two tokens; comments are
//! kept as children of the enclosing node.

use red_syntax::NodeData;
use tracing::trace;

use crate::kinds::{FIELD_LEFT, FIELD_OPERATOR, FIELD_RIGHT, NodeKind};
use crate::scanner::{Scanner, ValidTokens};
use crate::tokens::{self, Lexeme, Token};

/// Deepest nesting of blocks, parens, maps and path elements built as nodes.
/// Anything nested deeper becomes a single flat `ERROR` node.
const MAX_NESTING: usize = 128;

/// Parses a complete Red source text.
pub(crate) fn parse(source: &str) -> NodeData {
	RuleParser::new(source).source_file()
}

/// Which rules may start at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
	/// Top level: includes and all expressions.
	Statement,
	/// Block contents: all expressions.
	Expression,
	/// Paren contents and the `loop` operand: literals and infix expressions.
	Simple,
	/// Map entries.
	Literal,
	/// Right after `/` in a path.
	PathElement,
}

impl Context {
	fn allows_complex(self) -> bool {
		matches!(self, Context::Statement | Context::Expression)
	}

	fn allows_infix(self) -> bool {
		matches!(self, Context::Statement | Context::Expression | Context::Simple)
	}

	fn allows_token(self, token: Token) -> bool {
		match token {
			Token::Include | Token::LParen | Token::LBracket => false,
			Token::Money
			| Token::Time
			| Token::Date
			| Token::Email
			| Token::Slash
			| Token::EscapedValueOpen => self != Context::PathElement,
			_ => true,
		}
	}
}

struct Checkpoint {
	pos: usize,
	scanner: [u8; Scanner::SERIALIZED_LEN],
}

struct RuleParser<'a> {
	source: &'a str,
	pos: usize,
	scanner: Scanner,
	depth: usize,
}

fn wrap_error(node: NodeData) -> NodeData {
	NodeData::error(node.byte_range(), vec![node])
}

fn is_kind(node: &NodeData, kinds: &[NodeKind]) -> bool {
	NodeKind::from_repr(node.symbol()).is_some_and(|kind| kinds.contains(&kind))
}

impl<'a> RuleParser<'a> {
	fn new(source: &'a str) -> Self {
		Self {
			source,
			pos: 0,
			scanner: Scanner::new(),
			depth: 0,
		}
	}

	fn rest(&self) -> &'a str {
		&self.source[self.pos..]
	}

	fn at(&self, text: &str) -> bool {
		self.rest().starts_with(text)
	}

	fn peek(&self) -> Option<char> {
		self.rest().chars().next()
	}

	fn eof(&self) -> bool {
		self.pos >= self.source.len()
	}

	fn checkpoint(&self) -> Checkpoint {
		Checkpoint {
			pos: self.pos,
			scanner: self.scanner.serialize(),
		}
	}

	fn rewind(&mut self, checkpoint: Checkpoint) {
		self.pos = checkpoint.pos;
		self.scanner.deserialize(&checkpoint.scanner);
	}

	/// Runs a rule one nesting level deeper, or returns `None` at [`MAX_NESTING`].
	fn nested<T>(&mut self, rule: impl FnOnce(&mut Self) -> T) -> Option<T> {
		if self.depth >= MAX_NESTING {
			return None;
		}
		self.depth += 1;
		let result = rule(self);
		self.depth -= 1;
		Some(result)
	}

	/// Consumes a bracketed region up to its matching closer without building it.
	fn too_deep(&mut self) -> NodeData {
		let start = self.pos;
		let mut open = 0usize;
		let mut end = self.source.len();
		for (offset, ch) in self.rest().char_indices() {
			match ch {
				'[' | '(' => open += 1,
				']' | ')' => {
					open = open.saturating_sub(1);
					if open == 0 {
						end = start + offset + 1;
						break;
					}
				}
				_ => {}
			}
		}
		self.pos = end;
		trace!(start, end, "Nesting too deep");
		NodeData::error(start..end, Vec::new())
	}

	fn leaf(&mut self, kind: NodeKind, len: usize) -> NodeData {
		let start = self.pos;
		self.pos += len;
		NodeData::leaf(kind.symbol(), start..self.pos)
	}

	/// A leaf for an anonymous token spelled like its kind name.
	fn token(&mut self, kind: NodeKind) -> NodeData {
		self.leaf(kind, kind.name().len())
	}

	/// The closing token `kind` if present, else a missing one.
	fn expect(&mut self, kind: NodeKind) -> NodeData {
		if self.at(kind.name()) {
			self.token(kind)
		} else {
			NodeData::missing(kind.symbol(), self.pos)
		}
	}

	fn node(&self, kind: NodeKind, start: usize, children: Vec<NodeData>) -> NodeData {
		NodeData::branch(kind.symbol(), start..self.pos, children)
	}

	/// Skips whitespace, collecting comments into `children`.
	fn extras(&mut self, children: &mut Vec<NodeData>) {
		loop {
			let trimmed = self.rest().trim_start();
			self.pos = self.source.len() - trimmed.len();
			let len = tokens::comment_len(trimmed);
			if len == 0 {
				return;
			}
			children.push(self.leaf(NodeKind::Comment, len));
		}
	}

	fn source_file(mut self) -> NodeData {
		let children = self.sequence(None, Context::Statement);
		NodeData::branch(NodeKind::SourceFile.symbol(), 0..self.source.len(), children)
	}

	/// Expressions up to `close`, or to end of input at the top level.
	fn sequence(&mut self, close: Option<NodeKind>, context: Context) -> Vec<NodeData> {
		let mut children = Vec::new();
		loop {
			self.extras(&mut children);
			if let Some(close) = close
				&& self.at(close.name())
			{
				children.push(self.token(close));
				break;
			}
			if self.eof() {
				if let Some(close) = close {
					children.push(self.expect(close));
				}
				break;
			}
			let node = match self.expression(context) {
				Some(node) => node,
				None => self.recover(),
			};
			children.push(node);
		}
		children
	}

	/// Turns text at the current position that starts no rule into an error.
	fn recover(&mut self) -> NodeData {
		let start = self.pos;
		let stray = match self.peek() {
			Some(']') => Some(NodeKind::RBracket),
			Some(')') => Some(NodeKind::RParen),
			Some('}') => Some(NodeKind::RBrace),
			Some(',') => Some(NodeKind::Comma),
			_ => None,
		};
		if let Some(kind) = stray {
			let leaf = self.token(kind);
			trace!(start, kind = kind.name(), "Stray token");
			return NodeData::error(start..self.pos, vec![leaf]);
		}

		let mut chars = self.rest().char_indices();
		let mut end = self.source.len();
		chars.next();
		for (offset, ch) in chars {
			if ch.is_whitespace() || "[](){};\"".contains(ch) {
				end = start + offset;
				break;
			}
		}
		self.pos = end;
		trace!(start, end, "Unrecognised input");
		NodeData::error(start..end, Vec::new())
	}

	fn expression(&mut self, context: Context) -> Option<NodeData> {
		let start = self.pos;
		if self.at("[") {
			let block = self.block();
			return Some(self.admit_complex(context, block));
		}
		if self.at("(") {
			if let Some(point) = self.point() {
				return Some(self.infix_chain(context, start, point));
			}
			let paren = self.paren();
			return Some(self.admit_complex(context, paren));
		}
		if self.at_include() {
			let include = self.include();
			return Some(if context == Context::Statement {
				include
			} else {
				wrap_error(include)
			});
		}

		let node = self.literal(context)?;
		if is_kind(&node, &[NodeKind::While, NodeKind::Loop, NodeKind::Function]) {
			return Some(node);
		}
		Some(self.infix_chain(context, start, node))
	}

	fn admit_complex(&self, context: Context, node: NodeData) -> NodeData {
		if context.allows_complex() {
			node
		} else {
			wrap_error(node)
		}
	}

	fn at_include(&self) -> bool {
		self.at("#include")
			&& tokens::lex(self.rest(), |token| matches!(token, Token::Include | Token::Issue))
				.is_some_and(|lexeme| lexeme.token == Token::Include)
	}

	/// Folds `left (op right)*` into left-associative infix nodes.
	fn infix_chain(&mut self, context: Context, start: usize, mut left: NodeData) -> NodeData {
		if !context.allows_infix() || left.is_error() {
			return left;
		}
		loop {
			let checkpoint = self.checkpoint();
			let Some(op) = self.scanner.scan(self.source, self.pos, ValidTokens::INFIX) else {
				break;
			};
			self.pos = op.range.end;
			let operator = NodeData::leaf(op.token.kind().symbol(), op.range).with_field(FIELD_OPERATOR);

			let mut comments = Vec::new();
			self.extras(&mut comments);
			let right = match self.literal(Context::Simple) {
				Some(right) if !right.is_error() => right,
				_ => {
					self.rewind(checkpoint);
					break;
				}
			};

			let mut children = vec![left.with_field(FIELD_LEFT), operator];
			children.extend(comments);
			children.push(right.with_field(FIELD_RIGHT));
			left = self.node(NodeKind::Infix, start, children);
		}
		left
	}

	fn literal(&mut self, context: Context) -> Option<NodeData> {
		if self.at("(") {
			return match context {
				Context::PathElement => None,
				_ => self.point(),
			};
		}
		if context != Context::PathElement
			&& let Some(scanned) = self.scanner.scan(self.source, self.pos, ValidTokens::LITERAL)
		{
			self.pos = scanned.range.end;
			return Some(NodeData::leaf(scanned.token.kind().symbol(), scanned.range));
		}

		let Lexeme { token, len } = tokens::lex(self.rest(), |token| context.allows_token(token))?;
		let node = match token {
			Token::Word => self.word_form(context, len),
			Token::Slash => self.slash_form(),
			Token::Quote => self.prefixed_word(NodeKind::Quote, NodeKind::LitWord, NodeKind::LitPath, context),
			Token::Colon => self.prefixed_word(NodeKind::Colon, NodeKind::GetWord, NodeKind::GetPath, context),
			Token::CharOpen => self.char(),
			Token::DoubleQuote => self.string(),
			Token::Percent => self.file(),
			Token::EscapedValueOpen => self.escaped_value(),
			Token::Base2Open | Token::Base16Prefix | Token::Base16Open | Token::Base64Open => {
				self.binary(token)
			}
			Token::MapOpen => self.map(),
			Token::Include | Token::LParen | Token::LBracket => return None,
			_ => self.leaf(token.kind(), len),
		};
		Some(node)
	}

	/// A word, possibly a keyword, a set-word, a path or a control form.
	fn word_form(&mut self, context: Context, len: usize) -> NodeData {
		let start = self.pos;
		let rest = self.rest();
		let bare = !rest[len..].starts_with([':', '/']);

		if bare && let Some(keyword) = tokens::keyword(&rest[..len]) {
			match keyword.control_form() {
				None => {
					let leaf = self.leaf(keyword, len);
					return self.node(NodeKind::Boolean, start, vec![leaf]);
				}
				Some(form) if context.allows_complex() => {
					let checkpoint = self.checkpoint();
					if let Some(node) = self.control_form(keyword, form, len) {
						return node;
					}
					self.rewind(checkpoint);
				}
				Some(_) => {}
			}
		}

		let word = self.leaf(NodeKind::Word, len);
		if context != Context::PathElement && self.at(":") {
			let colon = self.token(NodeKind::Colon);
			return self.node(NodeKind::SetWord, start, vec![word, colon]);
		}
		let Some((slash, element)) = self.path_part() else {
			return word;
		};
		let mut children = vec![word, slash, element];
		if context != Context::PathElement && self.at(":") {
			children.push(self.token(NodeKind::Colon));
			return self.node(NodeKind::SetPath, start, children);
		}
		self.node(NodeKind::Path, start, children)
	}

	/// `/` immediately followed by a path element.
	fn path_part(&mut self) -> Option<(NodeData, NodeData)> {
		if !self.at("/") {
			return None;
		}
		let checkpoint = self.checkpoint();
		self.nested(|parser| {
			let slash = parser.token(NodeKind::Slash);
			match parser.literal(Context::PathElement) {
				Some(element) if !element.is_error() => Some((slash, element)),
				_ => {
					parser.rewind(checkpoint);
					None
				}
			}
		})
		.flatten()
	}

	fn control_form(&mut self, keyword: NodeKind, form: NodeKind, len: usize) -> Option<NodeData> {
		let start = self.pos;
		let mut children = vec![self.leaf(keyword, len)];
		self.extras(&mut children);
		if form == NodeKind::Loop {
			let operand_start = self.pos;
			let operand = self.literal(Context::Simple).filter(|node| !node.is_error())?;
			children.push(self.infix_chain(Context::Simple, operand_start, operand));
		} else {
			children.push(self.block_only()?);
		}
		self.extras(&mut children);
		children.push(self.block_only()?);
		Some(self.node(form, start, children))
	}

	fn block_only(&mut self) -> Option<NodeData> {
		self.at("[").then(|| self.block())
	}

	/// `'word`, `:word` and their path forms.
	fn prefixed_word(
		&mut self,
		prefix: NodeKind,
		word_kind: NodeKind,
		path_kind: NodeKind,
		context: Context,
	) -> NodeData {
		let start = self.pos;
		let prefix = self.token(prefix);
		let len = match tokens::lex(self.rest(), |token| token == Token::Word) {
			Some(lexeme) => lexeme.len,
			None => tokens::slashes_len(self.rest()),
		};
		if len == 0 {
			return NodeData::error(start..self.pos, vec![prefix]);
		}
		let word = self.leaf(NodeKind::Word, len);

		if context != Context::PathElement
			&& let Some((slash, element)) = self.path_part()
		{
			return self.node(path_kind, start, vec![prefix, word, slash, element]);
		}
		self.node(word_kind, start, vec![prefix, word])
	}

	/// `/name` is a refinement; a bare run of slashes is a word.
	fn slash_form(&mut self) -> NodeData {
		let start = self.pos;
		let name = tokens::refinement_name_len(&self.rest()[1..]);
		if name > 0 {
			let slash = self.token(NodeKind::Slash);
			self.pos += name;
			return self.node(NodeKind::Refinement, start, vec![slash]);
		}
		let len = tokens::slashes_len(self.rest());
		self.leaf(NodeKind::Word, len)
	}

	fn char(&mut self) -> NodeData {
		let start = self.pos;
		let mut children = vec![self.token(NodeKind::CharOpen)];
		let escape = tokens::escaped_char_len(self.rest());
		if escape > 0 {
			children.push(self.leaf(NodeKind::EscapedChar, escape));
		} else {
			match self.peek() {
				Some(ch) if ch != '"' && ch != '^' => self.pos += ch.len_utf8(),
				_ => {
					if self.at("\"") {
						children.push(self.token(NodeKind::DoubleQuote));
					}
					return NodeData::error(start..self.pos, children);
				}
			}
		}
		children.push(self.expect(NodeKind::DoubleQuote));
		self.node(NodeKind::Char, start, children)
	}

	fn string(&mut self) -> NodeData {
		let start = self.pos;
		let mut children = vec![self.token(NodeKind::DoubleQuote)];
		loop {
			match self.peek() {
				Some('"') => {
					children.push(self.token(NodeKind::DoubleQuote));
					break;
				}
				None | Some('\n') => {
					children.push(self.expect(NodeKind::DoubleQuote));
					break;
				}
				Some('^') => {
					let len = tokens::escaped_char_len(self.rest());
					if len > 0 {
						children.push(self.leaf(NodeKind::EscapedChar, len));
					} else {
						let caret = self.pos;
						self.pos += 1;
						children.push(NodeData::error(caret..self.pos, Vec::new()));
					}
				}
				Some(_) => {
					let len = tokens::string_content_len(self.rest());
					children.push(self.leaf(NodeKind::StringContent, len));
				}
			}
		}
		self.node(NodeKind::String, start, children)
	}

	fn file(&mut self) -> NodeData {
		let start = self.pos;
		let percent = self.token(NodeKind::Percent);
		let content = if self.at("\"") {
			self.string()
		} else {
			match tokens::file_content_len(self.rest()) {
				0 => NodeData::missing(NodeKind::FileContent.symbol(), self.pos),
				len => self.leaf(NodeKind::FileContent, len),
			}
		};
		self.node(NodeKind::File, start, vec![percent, content])
	}

	fn escaped_value(&mut self) -> NodeData {
		let start = self.pos;
		let mut children = vec![self.token(NodeKind::EscapedValueOpen)];
		let name = tokens::escaped_value_name_len(self.rest());
		self.pos += name;
		if name == 0 {
			if self.at(")") {
				children.push(self.token(NodeKind::RParen));
			}
			return NodeData::error(start..self.pos, children);
		}
		children.push(self.expect(NodeKind::RParen));
		self.node(NodeKind::EscapedValue, start, children)
	}

	fn binary(&mut self, token: Token) -> NodeData {
		let start = self.pos;
		let mut children = Vec::new();
		if token == Token::Base16Prefix {
			children.push(self.token(NodeKind::Base16Prefix));
		}
		let (open, digits): (NodeKind, fn(&str) -> usize) = match token {
			Token::Base2Open => (NodeKind::Base2Open, tokens::base2_byte_len),
			Token::Base64Open => (NodeKind::Base64Open, tokens::base64_digit_len),
			_ => (NodeKind::Base16Open, tokens::base16_byte_len),
		};
		children.push(self.token(open));

		loop {
			self.extras(&mut children);
			if self.at("}") || self.eof() {
				children.push(self.expect(NodeKind::RBrace));
				break;
			}
			if open == NodeKind::Base64Open && self.at("=") {
				children.push(self.token(NodeKind::Equals));
				continue;
			}
			let len = digits(self.rest());
			if len > 0 {
				self.pos += len;
				continue;
			}
			let bad_start = self.pos;
			let bad = self
				.rest()
				.find(|ch: char| ch.is_whitespace() || ch == '}' || ch == ';')
				.unwrap_or(self.rest().len());
			self.pos += bad;
			children.push(NodeData::error(bad_start..self.pos, Vec::new()));
		}
		self.node(NodeKind::Binary, start, children)
	}

	/// `#[key value ...]`. A key without a value is an error.
	fn map(&mut self) -> NodeData {
		self.nested(Self::map_entries).unwrap_or_else(|| self.too_deep())
	}

	fn map_entries(&mut self) -> NodeData {
		let start = self.pos;
		let mut children = vec![self.token(NodeKind::MapOpen)];
		children.extend(self.sequence(Some(NodeKind::RBracket), Context::Literal));

		let is_entry = |node: &NodeData| {
			!node.is_error()
				&& !node.is_missing()
				&& !is_kind(node, &[NodeKind::MapOpen, NodeKind::RBracket, NodeKind::Comment])
		};
		if children.iter().filter(|node| is_entry(node)).count() % 2 == 1
			&& let Some(last) = children.iter().rposition(is_entry)
		{
			let node = children.remove(last);
			children.insert(last, wrap_error(node));
		}
		self.node(NodeKind::Map, start, children)
	}

	/// `(x, y)` or `(x, y, z)` with numeric coordinates.
	fn point(&mut self) -> Option<NodeData> {
		let start = self.pos;
		let checkpoint = self.checkpoint();
		let mut children = vec![self.token(NodeKind::LParen)];
		for index in 0..3 {
			if index > 0 {
				self.extras(&mut children);
				if index == 2 && self.at(")") {
					break;
				}
				if !self.at(",") {
					self.rewind(checkpoint);
					return None;
				}
				children.push(self.token(NodeKind::Comma));
			}
			self.extras(&mut children);
			let Some(number) = tokens::lex(self.rest(), |token| token == Token::Number) else {
				self.rewind(checkpoint);
				return None;
			};
			children.push(self.leaf(NodeKind::Number, number.len));
		}
		self.extras(&mut children);
		if !self.at(")") {
			self.rewind(checkpoint);
			return None;
		}
		children.push(self.token(NodeKind::RParen));
		Some(self.node(NodeKind::Point, start, children))
	}

	fn paren(&mut self) -> NodeData {
		self.nested(|parser| {
			parser.enclosed(NodeKind::Paren, NodeKind::LParen, NodeKind::RParen, Context::Simple)
		})
		.unwrap_or_else(|| self.too_deep())
	}

	fn block(&mut self) -> NodeData {
		self.nested(|parser| {
			parser.enclosed(NodeKind::Block, NodeKind::LBracket, NodeKind::RBracket, Context::Expression)
		})
		.unwrap_or_else(|| self.too_deep())
	}

	fn enclosed(&mut self, kind: NodeKind, open: NodeKind, close: NodeKind, context: Context) -> NodeData {
		let start = self.pos;
		let mut children = vec![self.token(open)];
		children.extend(self.sequence(Some(close), context));
		self.node(kind, start, children)
	}

	/// `#include` followed by a file.
	fn include(&mut self) -> NodeData {
		let start = self.pos;
		let mut children = vec![self.token(NodeKind::HashInclude)];
		let checkpoint = self.checkpoint();
		self.extras(&mut children);
		if self.at("%") {
			children.push(self.file());
		} else {
			self.rewind(checkpoint);
			children.truncate(1);
			children.push(NodeData::missing(NodeKind::File.symbol(), self.pos));
		}
		self.node(NodeKind::Include, start, children)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use red_syntax::{Parser, Point, Tree};
	use rstest::rstest;

	use super::MAX_NESTING;

	fn parse_tree(source: &str) -> Tree {
		let language = crate::verify_grammar_loads().expect("grammar loads");
		let mut parser = Parser::new();
		parser.set_language(&language).expect("compatible");
		parser.parse(source).expect("language is set")
	}

	fn sexp(source: &str) -> String {
		parse_tree(source).root_node().to_sexp()
	}

	#[rstest]
	#[case::words("print 1", "(source_file (word) (number))")]
	#[case::set_word("x: 10", "(source_file (set_word (word)) (number))")]
	#[case::lit_and_get_word("'a :b", "(source_file (lit_word (word)) (get_word (word)))")]
	#[case::nested_path("a/b/c", "(source_file (path (word) (path (word) (word))))")]
	#[case::number_element("a/1", "(source_file (path (word) (number)))")]
	#[case::string_element("a/b/\"k\"", "(source_file (path (word) (path (word) (string (string_content)))))")]
	#[case::set_path("a/b: 1", "(source_file (set_path (word) (word)) (number))")]
	#[case::lit_and_get_path("'a/b :a/b", "(source_file (lit_path (word) (word)) (get_path (word) (word)))")]
	#[case::booleans("true false", "(source_file (boolean) (boolean))")]
	#[case::keyword_as_set_word("true: 1", "(source_file (set_word (word)) (number))")]
	#[case::block_and_paren("[a (b)]", "(source_file (block (word) (paren (word))))")]
	#[case::point("(1, 2)", "(source_file (point (number) (number)))")]
	#[case::point_3d("(1, 2, 3)", "(source_file (point (number) (number) (number)))")]
	#[case::refinement("/local", "(source_file (refinement))")]
	#[case::slashes("//", "(source_file (word))")]
	#[case::scalars(
		"$10 10x20 1.2.3 12:30 2024-01-15",
		"(source_file (money) (pair) (tuple) (time) (date))"
	)]
	#[case::references("<b> @ref #issue me@home.org", "(source_file (tag) (ref) (issue) (email))")]
	#[case::hexa("FFh", "(source_file (hexa))")]
	#[case::strings("%{raw}% {multi}", "(source_file (raw_string) (multiline_string))")]
	#[case::string_escapes("\"a^/b\"", "(source_file (string (string_content) (escaped_char) (string_content)))")]
	#[case::chars("#\"a\" #\"^/\"", "(source_file (char) (char (escaped_char)))")]
	#[case::escaped_value("#(none)", "(source_file (escaped_value))")]
	#[case::binaries(
		"2#{00001111} #{FF00} 16#{ab} 64#{SGVsbG8=}",
		"(source_file (binary) (binary) (binary) (binary))"
	)]
	#[case::binary_comment("#{FF ; high\n00}", "(source_file (binary (comment)))")]
	#[case::map("#[a 1 b 2]", "(source_file (map (word) (number) (word) (number)))")]
	#[case::file("%lib/util.red", "(source_file (file (file_content)))")]
	#[case::quoted_file("%\"my file.red\"", "(source_file (file (string (string_content))))")]
	#[case::include("#include %lib.red", "(source_file (include (file (file_content))))")]
	#[case::comment("a ; note\nb", "(source_file (word) (comment) (word))")]
	fn test_rules(#[case] source: &str, #[case] expected: &str) {
		assert_eq!(sexp(source), expected);
	}

	#[rstest]
	#[case::left_associative(
		"1 + 2 * 3",
		"(source_file (infix left: (infix left: (number) right: (number)) right: (number)))"
	)]
	#[case::comparison("a <> b", "(source_file (infix left: (word) right: (word)))")]
	#[case::no_space_is_no_operator("a -1", "(source_file (word) (number))")]
	#[case::in_paren("(x * 2)", "(source_file (paren (infix left: (word) right: (number))))")]
	#[case::complex_right_operand("a + [b]", "(source_file (word) (word) (block (word)))")]
	fn test_infix(#[case] source: &str, #[case] expected: &str) {
		assert_eq!(sexp(source), expected);
	}

	#[rstest]
	#[case::while_loop("while [a] [b]", "(source_file (while (block (word)) (block (word))))")]
	#[case::loop_count("loop 3 [a]", "(source_file (loop (number) (block (word))))")]
	#[case::loop_infix("LOOP n + 1 [a]", "(source_file (loop (infix left: (word) right: (number)) (block (word))))")]
	#[case::function(
		"f: func [x] [x]",
		"(source_file (set_word (word)) (function (block (word)) (block (word))))"
	)]
	#[case::function_spelling("Function [] []", "(source_file (function (block) (block)))")]
	#[case::incomplete_form("while x", "(source_file (word) (word))")]
	#[case::form_in_paren(
		"(while [a] [b])",
		"(source_file (paren (word) (ERROR (block (word))) (ERROR (block (word)))))"
	)]
	fn test_control_forms(#[case] source: &str, #[case] expected: &str) {
		assert_eq!(sexp(source), expected);
	}

	#[rstest]
	#[case::unclosed_block("[a", "(source_file (block (word) (MISSING \"]\")))")]
	#[case::stray_closer("a ]", "(source_file (word) (ERROR))")]
	#[case::unclosed_string("\"abc", "(source_file (string (string_content) (MISSING \"\\\"\")))")]
	#[case::odd_map("#[a]", "(source_file (map (ERROR (word))))")]
	#[case::nested_include(
		"[#include %a]",
		"(source_file (block (ERROR (include (file (file_content))))))"
	)]
	#[case::include_without_file("#include", "(source_file (include (MISSING file)))")]
	#[case::lone_colon(":", "(source_file (ERROR))")]
	#[case::file_without_name("% x", "(source_file (file (MISSING file_content)) (word))")]
	#[case::bad_escape("\"^q\"", "(source_file (string (ERROR) (string_content)))")]
	fn test_recovery(#[case] source: &str, #[case] expected: &str) {
		let tree = parse_tree(source);
		assert_eq!(tree.root_node().to_sexp(), expected);
		assert!(tree.root_node().has_error());
	}

	#[test]
	fn test_clean_tree() {
		let tree = parse_tree("Red [Title: \"demo\"]\nprint [1 + 2]\n");
		assert!(!tree.root_node().has_error());
	}

	#[test]
	fn test_empty_source() {
		let tree = parse_tree("");
		let root = tree.root_node();
		assert_eq!(root.to_sexp(), "(source_file)");
		assert_eq!(root.byte_range(), 0..0);
	}

	#[test]
	fn test_root_spans_trailing_whitespace() {
		let tree = parse_tree("  a  \n");
		assert_eq!(tree.root_node().byte_range(), 0..6);
		assert_eq!(tree.root_node().child(0).map(|node| node.byte_range()), Some(2..3));
	}

	#[test]
	fn test_infix_fields() {
		let tree = parse_tree("total + 1");
		let infix = tree.root_node().named_child(0).expect("infix");

		assert_eq!(infix.kind(), "infix");
		let left = infix.child_by_field_name("left").expect("left");
		let operator = infix.child_by_field_name("operator").expect("operator");
		let right = infix.child_by_field_name("right").expect("right");
		assert_eq!(left.utf8_text(), "total");
		assert_eq!(operator.utf8_text(), "+");
		assert_eq!(operator.kind(), "_infix_op");
		assert!(!operator.is_visible());
		assert_eq!(right.utf8_text(), "1");
	}

	#[test]
	fn test_positions() {
		let tree = parse_tree("a\n  b: 1");
		let set_word = tree.root_node().named_child(1).expect("set_word");

		assert_eq!(set_word.kind(), "set_word");
		assert_eq!(set_word.utf8_text(), "b:");
		assert_eq!(set_word.start_position(), Point::new(1, 2));
		assert_eq!(set_word.end_position(), Point::new(1, 4));
	}

	#[test]
	fn test_keyword_tokens_are_anonymous() {
		let tree = parse_tree("while [a] [b]");
		let form = tree.root_node().child(0).expect("while");
		let keyword = form.child(0).expect("keyword");

		assert_eq!(keyword.kind(), "while");
		assert!(!keyword.is_named());
		assert!(form.is_named());
	}

	#[test]
	fn test_multibyte_text() {
		let tree = parse_tree("\"héllo\" wörd");
		let root = tree.root_node();
		assert_eq!(root.to_sexp(), "(source_file (string (string_content)) (word))");
		assert_eq!(root.named_child(1).map(|node| node.utf8_text()), Some("wörd"));
	}

	#[test]
	fn test_nesting_at_limit() {
		let source = format!("{}x{}", "[".repeat(MAX_NESTING), "]".repeat(MAX_NESTING));
		let tree = parse_tree(&source);
		let root = tree.root_node();
		assert!(!root.has_error());
		assert_eq!(root.to_sexp().matches("(block").count(), MAX_NESTING);
	}

	#[rstest]
	#[case::blocks("[", "]", "(block")]
	#[case::parens("(", ")", "(paren")]
	#[case::maps("#[", "]", "(map")]
	fn test_deep_nesting_becomes_error(#[case] open: &str, #[case] close: &str, #[case] kind: &str) {
		let depth = 10_000;
		let source = format!("{}{} after", open.repeat(depth), close.repeat(depth));
		let tree = parse_tree(&source);
		let root = tree.root_node();

		assert!(root.has_error());
		assert_eq!(root.byte_range(), 0..source.len());
		let sexp = root.to_sexp();
		assert_eq!(sexp.matches(kind).count(), MAX_NESTING);
		assert!(sexp.ends_with(" (word))"), "{sexp}");
	}

	#[test]
	fn test_unclosed_deep_nesting_runs_to_end() {
		let source = "[".repeat(5_000);
		let tree = parse_tree(&source);
		let root = tree.root_node();
		assert!(root.has_error());
		assert_eq!(root.byte_range(), 0..source.len());
		assert_eq!(root.to_sexp().matches("(block").count(), MAX_NESTING);
	}

	#[test]
	fn test_long_path_continues_as_refinements() {
		let source = vec!["a"; 1_000].join("/");
		let tree = parse_tree(&source);
		let root = tree.root_node();
		assert!(!root.has_error());
		assert_eq!(root.to_sexp().matches("(path").count(), MAX_NESTING);
		assert_eq!(root.named_child_count(), 1_000 - MAX_NESTING);
	}

	#[test]
	fn test_long_infix_chain() {
		let source = vec!["1"; 50_000].join(" + ");
		let tree = parse_tree(&source);
		let root = tree.root_node();
		assert!(!root.has_error());
		assert_eq!(root.named_child_count(), 1);
		assert_eq!(root.to_sexp().matches("(infix").count(), 49_999);
	}
}
