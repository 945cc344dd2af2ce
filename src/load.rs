//! Reading live `web_sys` nodes into a [`Tree`].

use crate::tree::{Element as TreeElement, Namespace, NodeId, NodeKind, Tree};
use tracing::{error, warn};
use wasm_bindgen::JsCast;
use web_sys::{Comment, Element, Node, NodeList, Text};

/// Loads every child of `parent` (usually a `DocumentFragment`) as a top-level node of a new tree.
#[must_use]
pub fn load_fragment(parent: &Node) -> Tree {
	let mut tree = Tree::new();
	for child in nodes(&parent.child_nodes()) {
		if let Some(child) = load_node(&mut tree, &child) {
			if let Err(error) = tree.push_top_level(child) {
				error!("Could not place loaded node: {}", error);
			}
		}
	}
	tree
}

/// Copies `node` and its descendants into `tree` as a detached subtree.
///
/// Node types other than elements, text and comments are skipped with a warning.
pub fn load_node(tree: &mut Tree, node: &Node) -> Option<NodeId> {
	if let Some(element) = node.dyn_ref::<Element>() {
		let copy = tree.create(NodeKind::Element(load_element(element)));
		for child in nodes(&node.child_nodes()) {
			if let Some(child) = load_node(tree, &child) {
				if let Err(error) = tree.append_child(copy, child) {
					error!("Could not place loaded node: {}", error);
				}
			}
		}
		Some(copy)
	} else if let Some(text) = node.dyn_ref::<Text>() {
		Some(tree.create_text(text.data()))
	} else if let Some(comment) = node.dyn_ref::<Comment>() {
		Some(tree.create_comment(comment.data()))
	} else {
		warn!(node_type = node.node_type(), "Skipping unsupported node.");
		None
	}
}

/// The element itself, without children.
#[must_use]
pub fn load_element(element: &Element) -> TreeElement {
	let namespace = Namespace::from_uri(element.namespace_uri().as_deref());
	let attributes = element
		.get_attribute_names()
		.iter()
		.filter_map(|name| name.as_string())
		.filter_map(|name| element.get_attribute(&name).map(|value| (name, value)))
		.collect();
	TreeElement {
		tag: element.local_name(),
		namespace,
		attributes,
	}
}

fn nodes(list: &NodeList) -> impl Iterator<Item = Node> + '_ {
	(0..list.length()).filter_map(move |i| list.item(i))
}
