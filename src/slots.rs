//! Finding declared child components in rendered content.

use crate::tree::{Attributes, NodeId, NodeKind, Tree};
use tracing::warn;

/// Attribute naming the component class that owns an element's subtree.
pub const DEFAULT_COMPONENT_ATTRIBUTE: &str = "data-component";

/// An element that asks for a child component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
	/// The anchor id the child will render into.
	pub id: String,
	/// The ownership attribute's value, or else the custom tag name.
	pub class_name: String,
	pub attributes: Attributes,
}

/// Collects the slots below `root` in document order.
///
/// An element is a slot if its tag is one of `child_tags` (ASCII case-insensitive) or if it carries `component_attribute`.
/// The scan doesn't descend into slots, since their content belongs to the child.
#[must_use]
pub fn scan(tree: &Tree, root: NodeId, child_tags: &[String], component_attribute: &str) -> Vec<Slot> {
	let mut slots = Vec::new();
	let mut stack: Vec<NodeId> = tree.children(root).iter().rev().copied().collect();
	while let Some(node) = stack.pop() {
		let element = match tree.kind(node) {
			NodeKind::Element(element) => element,
			NodeKind::Text(_) | NodeKind::Comment(_) => continue,
		};

		let class_name = element.attributes.get(component_attribute).map(str::to_owned).or_else(|| {
			child_tags
				.iter()
				.any(|tag| tag.eq_ignore_ascii_case(&element.tag))
				.then(|| element.tag.clone())
		});
		match (class_name, element.attributes.get("id")) {
			(Some(class_name), Some(id)) => slots.push(Slot {
				id: id.to_owned(),
				class_name,
				attributes: element.attributes.clone(),
			}),
			(Some(class_name), None) => warn!(%class_name, "Child component marker without `id` skipped."),
			(None, _) => stack.extend(tree.children(node).iter().rev()),
		}
	}
	slots
}

#[cfg(test)]
mod tests {
	use super::{scan, DEFAULT_COMPONENT_ATTRIBUTE};
	use crate::builder::VNode;

	#[test]
	fn tags_and_attributes() {
		let (tree, root) = VNode::element("div")
			.child(VNode::element("Todo-Item").attr("id", "a").child(VNode::element("todo-item").attr("id", "nested")))
			.child(VNode::element("section").child(VNode::element("div").attr("id", "b").attr("data-component", "Counter")))
			.child(VNode::element("todo-item"))
			.into_tree();
		let slots = scan(&tree, root, &["todo-item".to_owned()], DEFAULT_COMPONENT_ATTRIBUTE);
		let found: Vec<_> = slots.iter().map(|s| (s.id.as_str(), s.class_name.as_str())).collect();
		assert_eq!(found, [("a", "Todo-Item"), ("b", "Counter")]);
	}
}
