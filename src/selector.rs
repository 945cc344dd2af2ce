//! The CSS selector subset the in-memory document understands.
//!
//! Supported: type and universal selectors, `#id`, `.class`, `[attr]`, `[attr=value]` (quoted or bare),
//! compounds of these, descendant (` `) and child (`>`) combinators, and selector lists (`,`).

use crate::{
	error::ParseError,
	tree::{Namespace, NodeId, Tree},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector(Vec<Complex>);

#[derive(Clone, Debug, PartialEq, Eq)]
struct Complex {
	/// Left to right.
	compounds: Vec<Compound>,
	/// `combinators[i]` sits between `compounds[i]` and `compounds[i + 1]`.
	combinators: Vec<Combinator>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Combinator {
	Descendant,
	Child,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
	tag: Option<String>,
	id: Option<String>,
	classes: Vec<String>,
	attributes: Vec<(String, Option<String>)>,
}

struct Cursor<'a> {
	source: &'a str,
	chars: Vec<char>,
	position: usize,
}

impl<'a> Cursor<'a> {
	fn peek(&self) -> Option<char> {
		self.chars.get(self.position).copied()
	}

	fn error(&self, reason: &'static str) -> ParseError {
		ParseError::Selector {
			selector: self.source.to_owned(),
			reason,
		}
	}

	/// Returns whether anything was skipped.
	fn skip_whitespace(&mut self) -> bool {
		let start = self.position;
		while self.peek().map_or(false, char::is_whitespace) {
			self.position += 1;
		}
		self.position != start
	}

	fn ident(&mut self) -> Result<String, ParseError> {
		let start = self.position;
		while self.peek().map_or(false, |c| c.is_alphanumeric() || c == '-' || c == '_') {
			self.position += 1;
		}
		if start == self.position {
			return Err(self.error("expected an identifier"));
		}
		Ok(self.chars[start..self.position].iter().collect())
	}

	fn attribute_value(&mut self) -> Result<String, ParseError> {
		match self.peek() {
			Some(quote @ ('"' | '\'')) => {
				self.position += 1;
				let start = self.position;
				while self.peek().map_or(false, |c| c != quote) {
					self.position += 1;
				}
				if self.peek().is_none() {
					return Err(self.error("unterminated string"));
				}
				let value = self.chars[start..self.position].iter().collect();
				self.position += 1;
				Ok(value)
			}
			_ => self.ident(),
		}
	}

	fn compound(&mut self) -> Result<Compound, ParseError> {
		let mut compound = Compound::default();
		let mut empty = true;
		loop {
			match self.peek() {
				Some('*') if empty => self.position += 1,
				Some(c) if empty && (c.is_alphabetic() || c == '-' || c == '_') => compound.tag = Some(self.ident()?),
				Some('#') => {
					self.position += 1;
					compound.id = Some(self.ident()?);
				}
				Some('.') => {
					self.position += 1;
					compound.classes.push(self.ident()?);
				}
				Some('[') => {
					self.position += 1;
					self.skip_whitespace();
					let name = self.ident()?;
					self.skip_whitespace();
					let value = if self.peek() == Some('=') {
						self.position += 1;
						self.skip_whitespace();
						let value = self.attribute_value()?;
						self.skip_whitespace();
						Some(value)
					} else {
						None
					};
					if self.peek() != Some(']') {
						return Err(self.error("expected `]`"));
					}
					self.position += 1;
					compound.attributes.push((name, value));
				}
				_ => break,
			}
			empty = false;
		}
		if empty {
			return Err(self.error("expected a simple selector"));
		}
		Ok(compound)
	}

	fn complex(&mut self) -> Result<Complex, ParseError> {
		let mut complex = Complex {
			compounds: vec![self.compound()?],
			combinators: Vec::new(),
		};
		loop {
			let spaced = self.skip_whitespace();
			let combinator = match self.peek() {
				None | Some(',') => break,
				Some('>') => {
					self.position += 1;
					self.skip_whitespace();
					Combinator::Child
				}
				Some(_) if spaced => Combinator::Descendant,
				Some(_) => return Err(self.error("unexpected character")),
			};
			complex.combinators.push(combinator);
			complex.compounds.push(self.compound()?);
		}
		Ok(complex)
	}
}

impl Selector {
	/// # Errors
	///
	/// Iff `source` uses syntax outside the supported subset.
	pub fn parse(source: &str) -> Result<Self, ParseError> {
		let mut cursor = Cursor {
			source,
			chars: source.chars().collect(),
			position: 0,
		};
		let mut alternatives = Vec::new();
		loop {
			cursor.skip_whitespace();
			alternatives.push(cursor.complex()?);
			match cursor.peek() {
				None => break,
				Some(',') => cursor.position += 1,
				Some(_) => return Err(cursor.error("unexpected character")),
			}
		}
		Ok(Self(alternatives))
	}

	#[must_use]
	pub fn matches(&self, tree: &Tree, node: NodeId) -> bool {
		self.0.iter().any(|complex| complex.matches_from(tree, complex.compounds.len() - 1, node))
	}
}

impl Complex {
	fn matches_from(&self, tree: &Tree, index: usize, node: NodeId) -> bool {
		if !self.compounds[index].matches(tree, node) {
			return false;
		}
		if index == 0 {
			return true;
		}
		match self.combinators[index - 1] {
			Combinator::Child => tree.parent(node).map_or(false, |parent| self.matches_from(tree, index - 1, parent)),
			Combinator::Descendant => {
				let mut current = tree.parent(node);
				while let Some(ancestor) = current {
					if self.matches_from(tree, index - 1, ancestor) {
						return true;
					}
					current = tree.parent(ancestor);
				}
				false
			}
		}
	}
}

impl Compound {
	fn matches(&self, tree: &Tree, node: NodeId) -> bool {
		let element = match tree.element(node) {
			Some(element) => element,
			None => return false,
		};
		if let Some(tag) = &self.tag {
			let matched = match element.namespace {
				Namespace::Html => element.tag.eq_ignore_ascii_case(tag),
				Namespace::Svg | Namespace::MathMl => &element.tag == tag,
			};
			if !matched {
				return false;
			}
		}
		if self.id.is_some() && element.attributes.get("id") != self.id.as_deref() {
			return false;
		}
		if !self.classes.is_empty() {
			let classes = element.attributes.get("class").unwrap_or_default();
			if !self.classes.iter().all(|class| classes.split_whitespace().any(|c| c == class)) {
				return false;
			}
		}
		self.attributes.iter().all(|(name, value)| match (element.attributes.get(name), value) {
			(Some(actual), Some(expected)) => actual == expected,
			(Some(_), None) => true,
			(None, _) => false,
		})
	}
}
