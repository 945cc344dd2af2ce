//! Turning renderer output into trees.

use crate::{builder::VNode, error::ParseError, tree::Tree};

/// A markup parsing service.
///
/// The returned tree's top-level nodes are the fragment's top-level nodes.
pub trait Parser {
	/// # Errors
	///
	/// Iff the markup can't be parsed at all. Parsers should be as lenient as the platform they stand in for.
	fn parse(&mut self, markup: &str) -> Result<Tree, ParseError>;

	/// Parses several independent fragments, ideally in a single pass over the platform parser.
	fn parse_batch(&mut self, fragments: &[&str]) -> Vec<Result<Tree, ParseError>> {
		fragments.iter().map(|fragment| self.parse(fragment)).collect()
	}
}

/// What a renderer produces.
#[derive(Debug)]
pub enum Content {
	Markup(String),
	Tree(Tree),
}

impl Content {
	/// Markup is trimmed before parsing, so that surrounding whitespace doesn't count as extra root nodes.
	///
	/// # Errors
	///
	/// Iff parsing fails.
	pub fn into_tree(self, parser: &mut dyn Parser) -> Result<Tree, ParseError> {
		match self {
			Content::Markup(markup) => parser.parse(markup.trim()),
			Content::Tree(tree) => Ok(tree),
		}
	}
}

impl From<&str> for Content {
	fn from(markup: &str) -> Self {
		Self::Markup(markup.to_owned())
	}
}

impl From<String> for Content {
	fn from(markup: String) -> Self {
		Self::Markup(markup)
	}
}

impl From<Tree> for Content {
	fn from(tree: Tree) -> Self {
		Self::Tree(tree)
	}
}

impl From<VNode> for Content {
	fn from(node: VNode) -> Self {
		Self::Tree(node.into_tree().0)
	}
}
