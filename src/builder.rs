//! Owned node descriptions, for renderers that build their content directly instead of returning markup.

use crate::tree::{Attributes, Element, Namespace, NodeId, NodeKind, Tree};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VNode {
	Element {
		tag: String,
		namespace: Namespace,
		attributes: Attributes,
		children: Vec<VNode>,
	},
	Text(String),
	Comment(String),
}

impl VNode {
	#[must_use]
	pub fn element(tag: impl Into<String>) -> Self {
		Self::Element {
			tag: tag.into(),
			namespace: Namespace::Html,
			attributes: Attributes::new(),
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn svg(tag: impl Into<String>) -> Self {
		Self::Element {
			tag: tag.into(),
			namespace: Namespace::Svg,
			attributes: Attributes::new(),
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn text(text: impl Into<String>) -> Self {
		Self::Text(text.into())
	}

	#[must_use]
	pub fn comment(comment: impl Into<String>) -> Self {
		Self::Comment(comment.into())
	}

	/// Has no effect on text and comments.
	#[must_use]
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		if let Self::Element { attributes, .. } = &mut self {
			attributes.set(name, value);
		}
		self
	}

	#[must_use]
	pub fn key(self, key: impl Into<String>) -> Self {
		self.attr(crate::diff::KEY_ATTRIBUTE, key)
	}

	/// Has no effect on text and comments.
	#[must_use]
	pub fn child(mut self, child: impl Into<VNode>) -> Self {
		if let Self::Element { children, .. } = &mut self {
			children.push(child.into());
		}
		self
	}

	#[must_use]
	pub fn children(self, children: impl IntoIterator<Item = VNode>) -> Self {
		children.into_iter().fold(self, Self::child)
	}

	/// Creates this description as a detached subtree of `tree`.
	pub fn build(&self, tree: &mut Tree) -> NodeId {
		match self {
			VNode::Element {
				tag,
				namespace,
				attributes,
				children,
			} => {
				let element = tree.create(NodeKind::Element(Element {
					tag: tag.clone(),
					namespace: *namespace,
					attributes: attributes.clone(),
				}));
				for child in children {
					let child = child.build(tree);
					// Both nodes were just created, so this can't be a cycle.
					let _ = tree.append_child(element, child);
				}
				element
			}
			VNode::Text(text) => tree.create_text(text.clone()),
			VNode::Comment(comment) => tree.create_comment(comment.clone()),
		}
	}

	/// Builds a new tree with this node as its root.
	#[must_use]
	pub fn into_tree(self) -> (Tree, NodeId) {
		let mut tree = Tree::new();
		let root = self.build(&mut tree);
		let _ = tree.set_root(root);
		(tree, root)
	}
}

impl From<&str> for VNode {
	fn from(text: &str) -> Self {
		Self::text(text)
	}
}

impl From<String> for VNode {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}
