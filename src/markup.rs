//! A lenient HTML fragment parser for the in-memory document.
//!
//! This is not a conforming HTML5 parser. It knows void elements, raw text elements, comments, character references and
//! foreign (SVG/MathML) content, and otherwise builds exactly the tree the tags describe.

use crate::{
	error::ParseError,
	parse::Parser,
	tree::{Attributes, Element, Namespace, NodeId, NodeKind, Tree},
};
use tracing::{error, warn};

const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

pub(crate) fn is_void(tag: &str) -> bool {
	VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

pub(crate) fn is_raw_text(tag: &str) -> bool {
	tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style")
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MarkupParser;

struct StartTag {
	name: String,
	attributes: Vec<(String, String)>,
	self_closing: bool,
	len: usize,
}

impl Parser for MarkupParser {
	fn parse(&mut self, markup: &str) -> Result<Tree, ParseError> {
		let mut tree = Tree::new();
		let mut open: Vec<NodeId> = Vec::new();
		let mut position = 0;

		while position < markup.len() {
			let rest = &markup[position..];
			if let Some(comment) = rest.strip_prefix("<!--") {
				let end = comment.find("-->").ok_or(ParseError::UnterminatedComment(position))?;
				let node = tree.create_comment(&comment[..end]);
				place(&mut tree, &open, node);
				position += 4 + end + 3;
			} else if rest.starts_with("</") {
				let end = rest.find('>').ok_or(ParseError::UnterminatedTag(position))?;
				let name = rest[2..end].trim();
				match open.iter().rposition(|&node| tree.element(node).map_or(false, |e| e.tag.eq_ignore_ascii_case(name))) {
					Some(index) => open.truncate(index),
					None => warn!(position, "Ignoring unmatched end tag."),
				}
				position += end + 1;
			} else if rest.starts_with("<!") || rest.starts_with("<?") {
				let end = rest.find('>').ok_or(ParseError::UnterminatedTag(position))?;
				position += end + 1;
			} else if starts_tag(rest) {
				let start = start_tag(rest).ok_or(ParseError::UnterminatedTag(position))?;
				position += start.len;

				let parent = open.last().and_then(|&parent| tree.element(parent));
				let namespace = if start.name.eq_ignore_ascii_case("svg") {
					Namespace::Svg
				} else if start.name.eq_ignore_ascii_case("math") {
					Namespace::MathMl
				} else {
					parent.map_or(Namespace::Html, |parent| match parent.namespace {
						Namespace::Svg if parent.tag == "foreignObject" => Namespace::Html,
						namespace => namespace,
					})
				};
				let html = namespace == Namespace::Html;
				let tag = if html { start.name.to_ascii_lowercase() } else { start.name };
				let attributes: Attributes = start
					.attributes
					.into_iter()
					.map(|(name, value)| (if html { name.to_ascii_lowercase() } else { name }, value))
					.collect();

				let node = tree.create(NodeKind::Element(Element {
					tag: tag.clone(),
					namespace,
					attributes,
				}));
				place(&mut tree, &open, node);

				if start.self_closing || (html && is_void(&tag)) {
					continue;
				}
				if html && is_raw_text(&tag) {
					let rest = &markup[position..];
					let close = format!("</{}", tag);
					let end = rest.to_ascii_lowercase().find(&close).unwrap_or(rest.len());
					if end > 0 {
						let text = tree.create_text(&rest[..end]);
						place(&mut tree, &[node], text);
					}
					position += end;
					if let Some(gt) = markup[position..].find('>') {
						position += gt + 1;
					} else {
						position = markup.len();
					}
					continue;
				}
				open.push(node);
			} else {
				let end = next_tag_start(rest).unwrap_or(rest.len());
				let node = tree.create_text(decode_entities(&rest[..end]));
				place(&mut tree, &open, node);
				position += end;
			}
		}
		Ok(tree)
	}
}

fn place(tree: &mut Tree, open: &[NodeId], node: NodeId) {
	let result = match open.last() {
		Some(&parent) => tree.append_child(parent, node),
		None => tree.push_top_level(node),
	};
	if let Err(error) = result {
		error!("Could not place parsed node: {}", error);
	}
}

fn starts_tag(text: &str) -> bool {
	let mut chars = text.chars();
	chars.next() == Some('<') && chars.next().map_or(false, |c| c.is_ascii_alphabetic())
}

/// Byte offset of the next `<` (after the first character) that begins markup.
fn next_tag_start(text: &str) -> Option<usize> {
	text.char_indices().skip(1).map(|(i, _)| i).find(|&i| {
		let rest = &text[i..];
		starts_tag(rest) || rest.starts_with("</") || rest.starts_with("<!") || rest.starts_with("<?")
	})
}

fn start_tag(text: &str) -> Option<StartTag> {
	let bytes = text.as_bytes();
	let is_space = |b: u8| b.is_ascii_whitespace();
	let mut i = 1;
	while i < bytes.len() && !is_space(bytes[i]) && bytes[i] != b'/' && bytes[i] != b'>' {
		i += 1;
	}
	let name = text[1..i].to_owned();
	let mut attributes = Vec::new();

	loop {
		while i < bytes.len() && is_space(bytes[i]) {
			i += 1;
		}
		match bytes.get(i)? {
			b'>' => {
				return Some(StartTag {
					name,
					attributes,
					self_closing: false,
					len: i + 1,
				})
			}
			b'/' if bytes.get(i + 1) == Some(&b'>') => {
				return Some(StartTag {
					name,
					attributes,
					self_closing: true,
					len: i + 2,
				})
			}
			b'/' => {
				i += 1;
				continue;
			}
			_ => (),
		}

		let name_start = i;
		while i < bytes.len() && !is_space(bytes[i]) && !matches!(bytes[i], b'=' | b'>' | b'/') {
			i += 1;
		}
		let attribute_name = text[name_start..i].to_owned();
		while i < bytes.len() && is_space(bytes[i]) {
			i += 1;
		}
		let value = if bytes.get(i) == Some(&b'=') {
			i += 1;
			while i < bytes.len() && is_space(bytes[i]) {
				i += 1;
			}
			match bytes.get(i)? {
				&quote @ (b'"' | b'\'') => {
					let end = text[i + 1..].find(quote as char)? + i + 1;
					let value = decode_entities(&text[i + 1..end]);
					i = end + 1;
					value
				}
				_ => {
					let start = i;
					while i < bytes.len() && !is_space(bytes[i]) && bytes[i] != b'>' {
						i += 1;
					}
					decode_entities(&text[start..i])
				}
			}
		} else {
			String::new()
		};
		attributes.push((attribute_name, value));
	}
}

/// Decodes the named references HTML markup most commonly uses, and numeric ones.
#[must_use]
pub fn decode_entities(text: &str) -> String {
	if !text.contains('&') {
		return text.to_owned();
	}
	let mut decoded = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(ampersand) = rest.find('&') {
		decoded.push_str(&rest[..ampersand]);
		rest = &rest[ampersand..];
		let reference = rest
			.find(';')
			.filter(|&semicolon| semicolon <= 10)
			.and_then(|semicolon| decode_reference(&rest[1..semicolon]).map(|c| (c, semicolon)));
		match reference {
			Some((c, semicolon)) => {
				decoded.push(c);
				rest = &rest[semicolon + 1..];
			}
			None => {
				decoded.push('&');
				rest = &rest[1..];
			}
		}
	}
	decoded.push_str(rest);
	decoded
}

fn decode_reference(name: &str) -> Option<char> {
	match name {
		"amp" => Some('&'),
		"lt" => Some('<'),
		"gt" => Some('>'),
		"quot" => Some('"'),
		"apos" => Some('\''),
		"nbsp" => Some('\u{a0}'),
		_ => {
			let number = name.strip_prefix('#')?;
			let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
				Some(hex) => u32::from_str_radix(hex, 16).ok()?,
				None => number.parse().ok()?,
			};
			char::from_u32(code)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{decode_entities, MarkupParser};
	use crate::{parse::Parser, tree::Namespace};

	#[test]
	fn fragments() {
		let tree = MarkupParser
			.parse(r#"<ul id=list><li key="1" class='a'>One &amp; two</li><li checked>x<br>y</li></ul><!-- note --><p>tail"#)
			.unwrap();
		assert_eq!(tree.top_level().len(), 3);
		let list = tree.top_level()[0];
		assert_eq!(tree.attribute(list, "id"), Some("list"));
		let items = tree.children(list);
		assert_eq!(items.len(), 2);
		assert_eq!(tree.text_content(items[0]), "One & two");
		assert_eq!(tree.attribute(items[1], "checked"), Some(""));
		assert_eq!(tree.children(items[1]).len(), 3);
		assert_eq!(tree.outer_markup(tree.top_level()[1]), "<!-- note -->");
		assert_eq!(tree.text_content(tree.top_level()[2]), "tail");
	}

	#[test]
	fn foreign_content_keeps_case() {
		let tree = MarkupParser.parse(r#"<DIV><svg viewBox="0 0 1 1"><foreignObject><P>x</P></foreignObject></svg></DIV>"#).unwrap();
		let div = tree.root().unwrap();
		assert_eq!(tree.element(div).unwrap().tag, "div");
		let svg = tree.children(div)[0];
		assert_eq!(tree.element(svg).unwrap().namespace, Namespace::Svg);
		assert_eq!(tree.attribute(svg, "viewBox"), Some("0 0 1 1"));
		let foreign = tree.children(svg)[0];
		assert_eq!(tree.element(foreign).unwrap().tag, "foreignObject");
		let p = tree.children(foreign)[0];
		assert_eq!(tree.element(p).unwrap().namespace, Namespace::Html);
		assert_eq!(tree.element(p).unwrap().tag, "p");
	}

	#[test]
	fn raw_text_and_stray_brackets() {
		let tree = MarkupParser.parse("<script>if (a < b) {}</script><p>1 < 2</p>").unwrap();
		assert_eq!(tree.text_content(tree.top_level()[0]), "if (a < b) {}");
		assert_eq!(tree.text_content(tree.top_level()[1]), "1 < 2");
	}

	#[test]
	fn errors() {
		assert!(MarkupParser.parse("<p><!-- open").is_err());
		assert!(MarkupParser.parse("<p class=\"x").is_err());
		assert_eq!(decode_entities("&#x41;&#66;&bogus;&"), "AB&bogus;&");
	}
}
