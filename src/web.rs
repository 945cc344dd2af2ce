//! The browser document.

use crate::{
	dom::Dom,
	error::{DomError, ParseError},
	events::{dispatch, SharedListeners},
	load,
	parse::Parser,
	tree::{Namespace, NodeId, NodeKind, Tree, Vid},
};
use js_sys::Reflect;
use std::rc::Rc;
use tracing::{trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{CharacterData, Document, Element, Event, HtmlTemplateElement, Node};

fn platform(error: JsValue) -> DomError {
	DomError::Platform(format!("{:?}", error))
}

fn child_nodes_of(node: &Node) -> Vec<Node> {
	let list = node.child_nodes();
	(0..list.length()).filter_map(|i| list.item(i)).collect()
}

fn as_element<'a>(node: &'a Node) -> Result<&'a Element, DomError> {
	node.dyn_ref::<Element>().ok_or_else(|| DomError::NotAnElement(format!("{:?}", node)))
}

/// A [`Dom`] backed by a `web_sys` [`Document`].
#[derive(Clone, Debug)]
pub struct WebDom {
	document: Document,
	parser: TemplateParser,
}

impl WebDom {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self {
			parser: TemplateParser::new(document.clone()),
			document,
		}
	}

	/// The current window's document, if there is one.
	#[must_use]
	pub fn from_window() -> Option<Self> {
		web_sys::window()?.document().map(Self::new)
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	fn create(&self, source: &Tree, node: NodeId, created: &mut dyn FnMut(Vid, &Node)) -> Result<Node, DomError> {
		let live: Node = match source.kind(node) {
			NodeKind::Element(element) => {
				let live = match element.namespace {
					Namespace::Html => self.document.create_element(&element.tag),
					namespace => self.document.create_element_ns(Some(namespace.uri()), &element.tag),
				}
				.map_err(platform)?;
				for attribute in &element.attributes {
					live.set_attribute(&attribute.name, &attribute.value).map_err(platform)?;
				}
				live.into()
			}
			NodeKind::Text(text) => self.document.create_text_node(text).into(),
			NodeKind::Comment(comment) => self.document.create_comment(comment).into(),
		};
		created(source.vid(node), &live);
		for &child in source.children(node) {
			let child = self.create(source, child, created)?;
			live.append_child(&child).map_err(platform)?;
		}
		Ok(live)
	}
}

impl Dom for WebDom {
	type Node = Node;
	type Delegate = Closure<dyn Fn(Event)>;

	fn element_by_id(&self, id: &str) -> Option<Node> {
		self.document.get_element_by_id(id).map(Node::from)
	}

	fn parent(&self, node: &Node) -> Option<Node> {
		node.parent_node()
	}

	fn next_sibling(&self, node: &Node) -> Option<Node> {
		node.next_sibling()
	}

	fn child_nodes(&self, node: &Node) -> Vec<Node> {
		child_nodes_of(node)
	}

	fn child_at(&self, parent: &Node, index: usize) -> Option<Node> {
		u32::try_from(index).ok().and_then(|index| parent.child_nodes().item(index))
	}

	fn attribute(&self, node: &Node, name: &str) -> Option<String> {
		node.dyn_ref::<Element>()?.get_attribute(name)
	}

	fn attribute_names(&self, node: &Node) -> Vec<String> {
		match node.dyn_ref::<Element>() {
			Some(element) => element.get_attribute_names().iter().filter_map(|name| name.as_string()).collect(),
			None => Vec::new(),
		}
	}

	fn matches(&self, node: &Node, selector: &str) -> bool {
		match node.dyn_ref::<Element>().map(|element| element.matches(selector)) {
			Some(Ok(matches)) => matches,
			Some(Err(error)) => {
				warn!(selector, ?error, "Invalid selector.");
				false
			}
			None => false,
		}
	}

	fn insert_before(&mut self, parent: &Node, child: &Node, reference: Option<&Node>) -> Result<(), DomError> {
		parent.insert_before(child, reference).map(drop).map_err(platform)
	}

	fn remove(&mut self, node: &Node) -> Result<(), DomError> {
		match node.parent_node() {
			Some(parent) => parent.remove_child(node).map(drop).map_err(platform),
			None => Ok(()),
		}
	}

	fn replace(&mut self, old: &Node, new: &Node) -> Result<(), DomError> {
		let parent = old.parent_node().ok_or_else(|| DomError::Detached(format!("{:?}", old)))?;
		parent.replace_child(new, old).map(drop).map_err(platform)
	}

	fn set_value(&mut self, node: &Node, value: &str) -> Result<(), DomError> {
		let data = node.dyn_ref::<CharacterData>().ok_or_else(|| DomError::NotCharacterData(format!("{:?}", node)))?;
		data.set_data(value);
		Ok(())
	}

	fn set_attribute(&mut self, node: &Node, name: &str, value: &str) -> Result<(), DomError> {
		as_element(node)?.set_attribute(name, value).map_err(platform)
	}

	fn remove_attribute(&mut self, node: &Node, name: &str) -> Result<(), DomError> {
		as_element(node)?.remove_attribute(name).map_err(platform)
	}

	fn set_value_property(&mut self, node: &Node, value: &str) -> Result<(), DomError> {
		Reflect::set(node, &JsValue::from_str("value"), &JsValue::from_str(value)).map(drop).map_err(platform)
	}

	fn set_checked_property(&mut self, node: &Node, checked: bool) -> Result<(), DomError> {
		Reflect::set(node, &JsValue::from_str("checked"), &JsValue::from_bool(checked)).map(drop).map_err(platform)
	}

	fn materialize(&mut self, source: &Tree, node: NodeId, created: &mut dyn FnMut(Vid, &Node)) -> Result<Node, DomError> {
		self.create(source, node, created)
	}

	fn parser(&mut self) -> &mut dyn Parser {
		&mut self.parser
	}

	/// Callbacks receive the browser event as [`Event::native`](crate::events::Event::native) and decide about default actions themselves.
	fn delegate(&mut self, listeners: &SharedListeners<Node>) -> Closure<dyn Fn(Event)> {
		let listeners = Rc::clone(listeners);
		let dom = self.clone();
		Closure::wrap(Box::new(move |event: Event| {
			let root = event.current_target().and_then(|target| target.dyn_into::<Node>().ok());
			let target = event.target().and_then(|target| target.dyn_into::<Node>().ok());
			if let (Some(root), Some(target)) = (root, target) {
				let handled = dispatch(&listeners, &dom, &root, &event.type_(), &target, Some(&event));
				trace!(handled, "Delegated event.");
			}
		}) as Box<dyn Fn(Event)>)
	}

	fn attach_delegate(&mut self, root: &Node, event_type: &str, delegate: &Closure<dyn Fn(Event)>) -> Result<(), DomError> {
		trace!(event_type, "Attaching delegate.");
		root.add_event_listener_with_callback(event_type, delegate.as_ref().unchecked_ref()).map_err(platform)
	}

	fn detach_delegate(&mut self, root: &Node, event_type: &str, delegate: &Closure<dyn Fn(Event)>) -> Result<(), DomError> {
		trace!(event_type, "Detaching delegate.");
		root.remove_event_listener_with_callback(event_type, delegate.as_ref().unchecked_ref()).map_err(platform)
	}
}

/// Parses markup with the browser's own parser by assigning it to a `<template>`.
///
/// Unlike a `<div>`, a template keeps table-section roots such as `<tr>` and `<td>`.
#[derive(Clone, Debug)]
pub struct TemplateParser {
	document: Document,
}

impl TemplateParser {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self { document }
	}

	fn template(&self, markup: &str) -> Result<HtmlTemplateElement, ParseError> {
		let template = self
			.document
			.create_element("template")
			.map_err(|error| ParseError::Platform(format!("{:?}", error)))?
			.dyn_into::<HtmlTemplateElement>()
			.map_err(|element| ParseError::Platform(format!("not a template: {:?}", element)))?;
		template.set_inner_html(markup);
		Ok(template)
	}
}

impl Parser for TemplateParser {
	fn parse(&mut self, markup: &str) -> Result<Tree, ParseError> {
		let template = self.template(markup)?;
		Ok(load::load_fragment(&template.content()))
	}

	/// Nests one template per fragment in a single outer template, so the browser parses the whole batch at once.
	///
	/// Falls back to parsing one by one if a fragment breaks out of its template.
	fn parse_batch(&mut self, fragments: &[&str]) -> Vec<Result<Tree, ParseError>> {
		let markup: String = fragments.iter().map(|fragment| format!("<template>{}</template>", fragment)).collect();
		let outer = match self.template(&markup) {
			Ok(outer) => outer,
			Err(error) => return fragments.iter().map(|_| Err(error.clone())).collect(),
		};
		let content: Node = outer.content().into();
		let inner: Vec<HtmlTemplateElement> = child_nodes_of(&content)
			.into_iter()
			.filter_map(|node| node.dyn_into::<HtmlTemplateElement>().ok())
			.collect();
		if inner.len() != fragments.len() {
			warn!(expected = fragments.len(), parsed = inner.len(), "Batch parse misaligned. Parsing fragments one by one.");
			return fragments.iter().map(|fragment| self.parse(fragment)).collect();
		}
		trace!(fragments = fragments.len(), "Parsed batch.");
		inner.iter().map(|template| Ok(load::load_fragment(&template.content()))).collect()
	}
}
