//! The document seam.
//!
//! [`Dom`] is implemented by the in-memory [`Tree`] and, for the browser, by [`WebDom`](crate::web::WebDom).
//! Everything above this trait, the differ and the component lifecycle included, is platform-independent.

use crate::{
	error::DomError,
	events::SharedListeners,
	parse::Parser,
	selector::Selector,
	tree::{NodeId, Tree, Vid},
};
use core::fmt::Debug;
use std::rc::Rc;
use tracing::warn;

/// A mutable document that patches can be applied to.
///
/// Node handles are cheap to clone and compare by identity.
pub trait Dom {
	type Node: Clone + PartialEq + Debug;

	/// Platform listener object dispatching into a [`ListenerRegistry`](crate::events::ListenerRegistry).
	type Delegate;

	fn element_by_id(&self, id: &str) -> Option<Self::Node>;
	fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
	fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;

	fn child_at(&self, parent: &Self::Node, index: usize) -> Option<Self::Node> {
		self.child_nodes(parent).into_iter().nth(index)
	}

	/// [`None`] for anything that isn't an element.
	fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
	fn attribute_names(&self, node: &Self::Node) -> Vec<String>;

	fn element_id(&self, node: &Self::Node) -> Option<String> {
		self.attribute(node, "id")
	}

	/// Whether `node` is an element matching the CSS `selector`.
	fn matches(&self, node: &Self::Node, selector: &str) -> bool;

	/// Inserts or moves `child`.
	///
	/// # Errors
	///
	/// The mutating methods fail if the platform rejects the operation or a handle is stale.
	fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>) -> Result<(), DomError>;

	fn insert_at(&mut self, parent: &Self::Node, child: &Self::Node, index: usize) -> Result<(), DomError> {
		let reference = self.child_at(parent, index);
		self.insert_before(parent, child, reference.as_ref())
	}

	fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError> {
		self.insert_before(parent, child, None)
	}

	fn remove(&mut self, node: &Self::Node) -> Result<(), DomError>;
	fn replace(&mut self, old: &Self::Node, new: &Self::Node) -> Result<(), DomError>;

	/// Exchanges the document positions of `a` and `b`.
	fn swap(&mut self, a: &Self::Node, b: &Self::Node) -> Result<(), DomError> {
		if a == b {
			return Ok(());
		}
		let parent_a = self.parent(a).ok_or_else(|| DomError::Detached(format!("{:?}", a)))?;
		let parent_b = self.parent(b).ok_or_else(|| DomError::Detached(format!("{:?}", b)))?;
		let after_a = self.next_sibling(a);
		if after_a.as_ref() == Some(b) {
			return self.insert_before(&parent_a, b, Some(a));
		}
		if self.next_sibling(b).as_ref() == Some(a) {
			return self.insert_before(&parent_b, a, Some(b));
		}
		self.insert_before(&parent_b, a, Some(b))?;
		self.insert_before(&parent_a, b, after_a.as_ref())
	}

	fn clear_children(&mut self, node: &Self::Node) -> Result<(), DomError> {
		for child in self.child_nodes(node) {
			self.remove(&child)?;
		}
		Ok(())
	}

	/// Sets the character data of a text or comment node.
	fn set_value(&mut self, node: &Self::Node, value: &str) -> Result<(), DomError>;
	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;
	fn remove_attribute(&mut self, node: &Self::Node, name: &str) -> Result<(), DomError>;

	/// Writes the live `value` property of a form control.
	fn set_value_property(&mut self, node: &Self::Node, value: &str) -> Result<(), DomError>;
	/// Writes the live `checked` property of a form control.
	fn set_checked_property(&mut self, node: &Self::Node, checked: bool) -> Result<(), DomError>;

	/// Creates a detached copy of `node` (and its descendants) out of `source`.
	///
	/// `created` is called once per created node with the correlation id of its origin.
	fn materialize(&mut self, source: &Tree, node: NodeId, created: &mut dyn FnMut(Vid, &Self::Node)) -> Result<Self::Node, DomError>;

	/// The document's default parsing service.
	fn parser(&mut self) -> &mut dyn Parser;

	/// Releases nodes that were removed from the document. Runs at the end of every render pass.
	///
	/// Platforms with their own garbage collection leave this alone.
	fn reclaim(&mut self) {}

	fn delegate(&mut self, listeners: &SharedListeners<Self::Node>) -> Self::Delegate;

	/// Attaching the same delegate for the same event type twice has no additional effect.
	fn attach_delegate(&mut self, root: &Self::Node, event_type: &str, delegate: &Self::Delegate) -> Result<(), DomError>;
	fn detach_delegate(&mut self, root: &Self::Node, event_type: &str, delegate: &Self::Delegate) -> Result<(), DomError>;
}

impl Dom for Tree {
	type Node = NodeId;
	type Delegate = SharedListeners<NodeId>;

	fn element_by_id(&self, id: &str) -> Option<NodeId> {
		Tree::element_by_id(self, id)
	}

	fn parent(&self, node: &NodeId) -> Option<NodeId> {
		Tree::parent(self, *node)
	}

	fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
		Tree::next_sibling(self, *node)
	}

	fn child_nodes(&self, node: &NodeId) -> Vec<NodeId> {
		if self.contains(*node) {
			self.children(*node).to_vec()
		} else {
			Vec::new()
		}
	}

	fn child_at(&self, parent: &NodeId, index: usize) -> Option<NodeId> {
		self.contains(*parent).then(|| self.children(*parent).get(index).copied()).flatten()
	}

	fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
		Tree::attribute(self, *node, name).map(str::to_owned)
	}

	fn attribute_names(&self, node: &NodeId) -> Vec<String> {
		self.element(*node).map_or_else(Vec::new, |element| element.attributes.names().map(str::to_owned).collect())
	}

	fn matches(&self, node: &NodeId, selector: &str) -> bool {
		match Selector::parse(selector) {
			Ok(selector) => selector.matches(self, *node),
			Err(error) => {
				warn!("{}", error);
				false
			}
		}
	}

	fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: Option<&NodeId>) -> Result<(), DomError> {
		Tree::insert_before(self, *parent, *child, reference.copied())
	}

	fn insert_at(&mut self, parent: &NodeId, child: &NodeId, index: usize) -> Result<(), DomError> {
		Tree::insert_at(self, *parent, *child, index)
	}

	fn remove(&mut self, node: &NodeId) -> Result<(), DomError> {
		Tree::remove(self, *node)
	}

	fn replace(&mut self, old: &NodeId, new: &NodeId) -> Result<(), DomError> {
		Tree::replace(self, *old, *new)
	}

	fn swap(&mut self, a: &NodeId, b: &NodeId) -> Result<(), DomError> {
		Tree::swap(self, *a, *b)
	}

	fn clear_children(&mut self, node: &NodeId) -> Result<(), DomError> {
		Tree::clear_children(self, *node)
	}

	fn set_value(&mut self, node: &NodeId, value: &str) -> Result<(), DomError> {
		Tree::set_value(self, *node, value)
	}

	fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
		Tree::set_attribute(self, *node, name, value)
	}

	fn remove_attribute(&mut self, node: &NodeId, name: &str) -> Result<(), DomError> {
		Tree::remove_attribute(self, *node, name).map(drop)
	}

	fn set_value_property(&mut self, node: &NodeId, value: &str) -> Result<(), DomError> {
		Tree::set_value_property(self, *node, value)
	}

	fn set_checked_property(&mut self, node: &NodeId, checked: bool) -> Result<(), DomError> {
		Tree::set_checked_property(self, *node, checked)
	}

	fn materialize(&mut self, source: &Tree, node: NodeId, created: &mut dyn FnMut(Vid, &NodeId)) -> Result<NodeId, DomError> {
		let copy = self.import(source, node);
		for node in self.descendants(copy) {
			created(self.vid(node), &node);
		}
		Ok(copy)
	}

	fn parser(&mut self) -> &mut dyn Parser {
		&mut self.parser
	}

	/// Frees unreachable nodes, which invalidates handles to them.
	fn reclaim(&mut self) {
		self.collect_garbage();
	}

	fn delegate(&mut self, listeners: &SharedListeners<NodeId>) -> SharedListeners<NodeId> {
		Rc::clone(listeners)
	}

	fn attach_delegate(&mut self, root: &NodeId, event_type: &str, delegate: &SharedListeners<NodeId>) -> Result<(), DomError> {
		if !self.contains(*root) {
			return Err(DomError::Stale(root.to_string()));
		}
		let delegates = self.delegates.entry(*root).or_insert_with(Vec::new);
		if !delegates.iter().any(|(t, d)| t == event_type && Rc::ptr_eq(d, delegate)) {
			delegates.push((event_type.to_owned(), Rc::clone(delegate)));
		}
		Ok(())
	}

	fn detach_delegate(&mut self, root: &NodeId, event_type: &str, delegate: &SharedListeners<NodeId>) -> Result<(), DomError> {
		if let Some(delegates) = self.delegates.get_mut(root) {
			delegates.retain(|(t, d)| !(t == event_type && Rc::ptr_eq(d, delegate)));
		}
		Ok(())
	}
}
