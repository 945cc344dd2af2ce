//! An arena-backed document tree.
//!
//! A [`Tree`] is used in two roles: as a component's private snapshot of what the live document should look like,
//! and (natively, or in tests) as the live document itself.
//!
//! Nodes are addressed through [`NodeId`]s, which are only meaningful for the [`Tree`] that created them.
//! Removing or replacing a node detaches it without freeing it, like in a browser DOM,
//! so that it can be re-inserted later. [`Tree::collect_garbage`] reclaims everything unreachable.

use crate::{error::DomError, events::SharedListeners, markup::MarkupParser};
use core::{
	fmt::{self, Write as _},
	slice,
	sync::atomic::{AtomicU64, Ordering},
};
use hashbrown::HashMap;
use tracing::trace;

static NEXT_VID: AtomicU64 = AtomicU64::new(1);

/// A correlation id, stamped onto each node when it is created.
///
/// Unlike [`NodeId`]s, these survive [`Tree::import`], which is how a component finds the live counterpart of a snapshot node.
/// They are not attributes and never take part in comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vid(u64);
impl Vid {
	#[must_use]
	pub fn fresh() -> Self {
		Self(NEXT_VID.fetch_add(1, Ordering::Relaxed))
	}
}

/// Handle of a node inside one [`Tree`].
///
/// Slots are reused after [`Tree::collect_garbage`]. The generation makes stale handles fail instead of aliasing the new node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
	index: u32,
	generation: u32,
}
impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.generation {
			0 => write!(f, "#{}", self.index),
			generation => write!(f, "#{}.{}", self.index, generation),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
	#[default]
	Html,
	Svg,
	MathMl,
}
impl Namespace {
	#[must_use]
	pub fn uri(self) -> &'static str {
		match self {
			Namespace::Html => "http://www.w3.org/1999/xhtml",
			Namespace::Svg => "http://www.w3.org/2000/svg",
			Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
		}
	}

	/// Anything unknown is treated as HTML.
	#[must_use]
	pub fn from_uri(uri: Option<&str>) -> Self {
		match uri {
			Some("http://www.w3.org/2000/svg") => Namespace::Svg,
			Some("http://www.w3.org/1998/Math/MathML") => Namespace::MathMl,
			_ => Namespace::Html,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
	pub tag: String,
	pub namespace: Namespace,
	pub attributes: Attributes,
}
impl Element {
	#[must_use]
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			namespace: Namespace::Html,
			attributes: Attributes::new(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
	Element(Element),
	Text(String),
	Comment(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
	pub name: String,
	pub value: String,
}

/// An ordered attribute list with unique names.
///
/// Equality ignores order.
#[derive(Clone, Debug, Default, Eq)]
pub struct Attributes(Vec<Attribute>);
impl Attributes {
	#[must_use]
	pub fn new() -> Self {
		Self(Vec::new())
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.iter().find(|a| a.name == name).map(|a| a.value.as_str())
	}

	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.0.iter().any(|a| a.name == name)
	}

	/// Returns the previous value, if any.
	pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
		let name = name.into();
		let value = value.into();
		match self.0.iter_mut().find(|a| a.name == name) {
			Some(existing) => Some(core::mem::replace(&mut existing.value, value)),
			None => {
				self.0.push(Attribute { name, value });
				None
			}
		}
	}

	pub fn remove(&mut self, name: &str) -> Option<String> {
		let index = self.0.iter().position(|a| a.name == name)?;
		Some(self.0.remove(index).value)
	}

	pub fn iter(&self) -> slice::Iter<'_, Attribute> {
		self.0.iter()
	}

	pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
		self.0.iter().map(|a| a.name.as_str())
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl PartialEq for Attributes {
	fn eq(&self, other: &Self) -> bool {
		self.0.len() == other.0.len() && self.0.iter().all(|a| other.get(&a.name) == Some(a.value.as_str()))
	}
}
impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		let mut attributes = Self::new();
		for (name, value) in iter {
			attributes.set(name, value);
		}
		attributes
	}
}
impl<'a> IntoIterator for &'a Attributes {
	type Item = &'a Attribute;
	type IntoIter = slice::Iter<'a, Attribute>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// Live form-control state that shadows the `value` and `checked` attributes once written.
#[derive(Clone, Debug, Default)]
struct FormState {
	value: Option<String>,
	checked: Option<bool>,
}

#[derive(Clone, Debug)]
struct Slot {
	kind: NodeKind,
	vid: Vid,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	form: FormState,
}

#[derive(Clone, Copy)]
enum Place {
	Child(NodeId, usize),
	Top(usize),
}

#[derive(Clone, Default)]
pub struct Tree {
	slots: Vec<Option<Slot>>,
	generations: Vec<u32>,
	free: Vec<u32>,
	top: Vec<NodeId>,
	pub(crate) delegates: HashMap<NodeId, Vec<(String, SharedListeners<NodeId>)>>,
	pub(crate) parser: MarkupParser,
}

impl fmt::Debug for Tree {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut markup = String::new();
		for &top in &self.top {
			self.write_markup(top, &mut markup)?;
		}
		f.debug_struct("Tree").field("nodes", &self.len()).field("markup", &markup).finish()
	}
}

impl Tree {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	fn alloc(&mut self, kind: NodeKind, vid: Vid) -> NodeId {
		let slot = Slot {
			kind,
			vid,
			parent: None,
			children: Vec::new(),
			form: FormState::default(),
		};
		if let Some(index) = self.free.pop() {
			self.slots[index as usize] = Some(slot);
			NodeId {
				index,
				generation: self.generations[index as usize],
			}
		} else {
			#[allow(clippy::cast_possible_truncation)]
			let id = NodeId {
				index: self.slots.len() as u32,
				generation: 0,
			};
			self.slots.push(Some(slot));
			self.generations.push(0);
			id
		}
	}

	/// Creates a detached node with a fresh correlation id.
	pub fn create(&mut self, kind: NodeKind) -> NodeId {
		self.alloc(kind, Vid::fresh())
	}

	pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
		self.create(NodeKind::Element(Element::new(tag)))
	}

	pub fn create_element_ns(&mut self, tag: impl Into<String>, namespace: Namespace) -> NodeId {
		self.create(NodeKind::Element(Element {
			tag: tag.into(),
			namespace,
			attributes: Attributes::new(),
		}))
	}

	pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
		self.create(NodeKind::Text(text.into()))
	}

	pub fn create_comment(&mut self, comment: impl Into<String>) -> NodeId {
		self.create(NodeKind::Comment(comment.into()))
	}

	fn is_current(&self, id: NodeId) -> bool {
		self.generations.get(id.index as usize) == Some(&id.generation)
	}

	fn try_slot(&self, id: NodeId) -> Result<&Slot, DomError> {
		self.is_current(id)
			.then(|| self.slots[id.index as usize].as_ref())
			.flatten()
			.ok_or_else(|| DomError::Stale(id.to_string()))
	}

	fn try_slot_mut(&mut self, id: NodeId) -> Result<&mut Slot, DomError> {
		if !self.is_current(id) {
			return Err(DomError::Stale(id.to_string()));
		}
		self.slots[id.index as usize].as_mut().ok_or_else(|| DomError::Stale(id.to_string()))
	}

	/// # Panics
	///
	/// Iff `id` does not belong to this tree (anymore).
	fn slot(&self, id: NodeId) -> &Slot {
		match self.try_slot(id) {
			Ok(slot) => slot,
			Err(error) => panic!("{}", error),
		}
	}

	/// Whether `id` refers to a node that hasn't been reclaimed.
	#[must_use]
	pub fn contains(&self, id: NodeId) -> bool {
		self.try_slot(id).is_ok()
	}

	/// Number of nodes held by the arena, attached or not.
	#[must_use]
	pub fn len(&self) -> usize {
		self.slots.len() - self.free.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// # Panics
	///
	/// Iff `id` is stale. The same applies to the other infallible accessors.
	#[must_use]
	pub fn kind(&self, id: NodeId) -> &NodeKind {
		&self.slot(id).kind
	}

	#[must_use]
	pub fn element(&self, id: NodeId) -> Option<&Element> {
		match self.try_slot(id).ok()?.kind {
			NodeKind::Element(ref element) => Some(element),
			NodeKind::Text(_) | NodeKind::Comment(_) => None,
		}
	}

	#[must_use]
	pub fn is_element(&self, id: NodeId) -> bool {
		self.element(id).is_some()
	}

	#[must_use]
	pub fn vid(&self, id: NodeId) -> Vid {
		self.slot(id).vid
	}

	#[must_use]
	pub fn parent(&self, id: NodeId) -> Option<NodeId> {
		self.try_slot(id).ok()?.parent
	}

	#[must_use]
	pub fn children(&self, id: NodeId) -> &[NodeId] {
		&self.slot(id).children
	}

	/// Nodes that are attached but have no parent, in document order.
	#[must_use]
	pub fn top_level(&self) -> &[NodeId] {
		&self.top
	}

	/// The first top-level node.
	#[must_use]
	pub fn root(&self) -> Option<NodeId> {
		self.top.first().copied()
	}

	pub fn push_top_level(&mut self, id: NodeId) -> Result<(), DomError> {
		self.detach(id)?;
		self.top.push(id);
		Ok(())
	}

	/// Makes `id` the only top-level node. Previous top-level nodes are detached.
	pub fn set_root(&mut self, id: NodeId) -> Result<(), DomError> {
		self.detach(id)?;
		self.top.clear();
		self.top.push(id);
		Ok(())
	}

	#[must_use]
	pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
		self.element(id)?.attributes.get(name)
	}

	#[must_use]
	pub fn element_id(&self, id: NodeId) -> Option<&str> {
		self.attribute(id, "id")
	}

	/// Character data of a text or comment node.
	#[must_use]
	pub fn value(&self, id: NodeId) -> Option<&str> {
		match &self.try_slot(id).ok()?.kind {
			NodeKind::Text(value) | NodeKind::Comment(value) => Some(value),
			NodeKind::Element(_) => None,
		}
	}

	fn place(&self, id: NodeId) -> Result<Place, DomError> {
		match self.try_slot(id)?.parent {
			Some(parent) => {
				let index = self
					.try_slot(parent)?
					.children
					.iter()
					.position(|&c| c == id)
					.ok_or_else(|| DomError::NotAChild {
						parent: parent.to_string(),
						child: id.to_string(),
					})?;
				Ok(Place::Child(parent, index))
			}
			None => self.top.iter().position(|&t| t == id).map(Place::Top).ok_or_else(|| DomError::Detached(id.to_string())),
		}
	}

	fn siblings_mut(&mut self, place: Place) -> Result<&mut Vec<NodeId>, DomError> {
		match place {
			Place::Child(parent, _) => Ok(&mut self.try_slot_mut(parent)?.children),
			Place::Top(_) => Ok(&mut self.top),
		}
	}

	#[must_use]
	pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
		match self.place(id).ok()? {
			Place::Child(parent, index) => self.slot(parent).children.get(index + 1).copied(),
			Place::Top(index) => self.top.get(index + 1).copied(),
		}
	}

	/// Whether `ancestor` is `node` or one of its ancestors.
	#[must_use]
	pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
		let mut current = Some(node);
		while let Some(id) = current {
			if id == ancestor {
				return true;
			}
			current = self.parent(id);
		}
		false
	}

	/// Detaches `node` from its parent (or the top level). Detached nodes stay alive.
	pub fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
		let parent = self.try_slot(node)?.parent;
		match parent {
			Some(parent) => self.try_slot_mut(parent)?.children.retain(|&c| c != node),
			None => self.top.retain(|&t| t != node),
		}
		self.try_slot_mut(node)?.parent = None;
		Ok(())
	}

	/// Inserts (or moves) `child` into `parent` before `reference`, or at the end if `reference` is [`None`].
	pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<(), DomError> {
		self.try_slot(parent)?;
		self.try_slot(child)?;
		if self.is_inclusive_ancestor(child, parent) {
			return Err(DomError::Hierarchy {
				parent: parent.to_string(),
				child: child.to_string(),
			});
		}
		if reference == Some(child) {
			return Ok(());
		}
		self.detach(child)?;
		let siblings = &mut self.try_slot_mut(parent)?.children;
		let index = match reference {
			Some(reference) => siblings.iter().position(|&c| c == reference).ok_or_else(|| DomError::NotAChild {
				parent: parent.to_string(),
				child: reference.to_string(),
			})?,
			None => siblings.len(),
		};
		siblings.insert(index, child);
		self.try_slot_mut(child)?.parent = Some(parent);
		Ok(())
	}

	pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
		self.insert_before(parent, child, None)
	}

	/// Inserts `child` so that it ends up before whatever currently sits at `index` (or at the end).
	pub fn insert_at(&mut self, parent: NodeId, child: NodeId, index: usize) -> Result<(), DomError> {
		let reference = self.try_slot(parent)?.children.get(index).copied();
		self.insert_before(parent, child, reference)
	}

	/// Same as [`Tree::detach`]; named after the DOM operation.
	pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
		self.detach(node)
	}

	/// Puts `new` where `old` is and detaches `old`.
	pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), DomError> {
		if old == new {
			return Ok(());
		}
		self.try_slot(new)?;
		if self.is_inclusive_ancestor(new, old) {
			return Err(DomError::Hierarchy {
				parent: old.to_string(),
				child: new.to_string(),
			});
		}
		self.detach(new)?;
		let place = self.place(old)?;
		let parent = match place {
			Place::Child(parent, index) => {
				self.try_slot_mut(parent)?.children[index] = new;
				Some(parent)
			}
			Place::Top(index) => {
				self.top[index] = new;
				None
			}
		};
		self.try_slot_mut(new)?.parent = parent;
		self.try_slot_mut(old)?.parent = None;
		Ok(())
	}

	/// Exchanges the positions of two attached nodes, neither of which may contain the other.
	pub fn swap(&mut self, a: NodeId, b: NodeId) -> Result<(), DomError> {
		if a == b {
			return Ok(());
		}
		if self.is_inclusive_ancestor(a, b) || self.is_inclusive_ancestor(b, a) {
			return Err(DomError::Hierarchy {
				parent: a.to_string(),
				child: b.to_string(),
			});
		}
		let (place_a, place_b) = (self.place(a)?, self.place(b)?);
		let index = |place: Place| match place {
			Place::Child(_, index) | Place::Top(index) => index,
		};
		let parent = |place: Place| match place {
			Place::Child(parent, _) => Some(parent),
			Place::Top(_) => None,
		};
		self.siblings_mut(place_a)?[index(place_a)] = b;
		self.siblings_mut(place_b)?[index(place_b)] = a;
		self.try_slot_mut(a)?.parent = parent(place_b);
		self.try_slot_mut(b)?.parent = parent(place_a);
		Ok(())
	}

	/// Detaches every child of `node`. They stay allocated until [`Tree::collect_garbage`].
	pub fn clear_children(&mut self, node: NodeId) -> Result<(), DomError> {
		let children = core::mem::take(&mut self.try_slot_mut(node)?.children);
		for child in children {
			self.try_slot_mut(child)?.parent = None;
		}
		Ok(())
	}

	pub fn set_value(&mut self, node: NodeId, value: impl Into<String>) -> Result<(), DomError> {
		match &mut self.try_slot_mut(node)?.kind {
			NodeKind::Text(current) | NodeKind::Comment(current) => {
				*current = value.into();
				Ok(())
			}
			NodeKind::Element(_) => Err(DomError::NotCharacterData(node.to_string())),
		}
	}

	fn element_mut(&mut self, node: NodeId) -> Result<&mut Element, DomError> {
		match &mut self.try_slot_mut(node)?.kind {
			NodeKind::Element(element) => Ok(element),
			NodeKind::Text(_) | NodeKind::Comment(_) => Err(DomError::NotAnElement(node.to_string())),
		}
	}

	pub fn set_attribute(&mut self, node: NodeId, name: impl Into<String>, value: impl Into<String>) -> Result<(), DomError> {
		self.element_mut(node)?.attributes.set(name, value);
		Ok(())
	}

	pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
		Ok(self.element_mut(node)?.attributes.remove(name))
	}

	/// The live `value` property: the last value written through [`Tree::set_value_property`], otherwise the `value` attribute.
	#[must_use]
	pub fn value_property(&self, node: NodeId) -> Option<&str> {
		let slot = self.try_slot(node).ok()?;
		slot.form.value.as_deref().or_else(|| self.attribute(node, "value"))
	}

	/// The live `checked` property: the last value written through [`Tree::set_checked_property`], otherwise whether the `checked` attribute is present.
	#[must_use]
	pub fn checked_property(&self, node: NodeId) -> bool {
		match self.try_slot(node) {
			Ok(slot) => slot.form.checked.unwrap_or_else(|| self.element(node).map_or(false, |e| e.attributes.contains("checked"))),
			Err(_) => false,
		}
	}

	pub fn set_value_property(&mut self, node: NodeId, value: impl Into<String>) -> Result<(), DomError> {
		self.element_mut(node)?;
		self.try_slot_mut(node)?.form.value = Some(value.into());
		Ok(())
	}

	pub fn set_checked_property(&mut self, node: NodeId, checked: bool) -> Result<(), DomError> {
		self.element_mut(node)?;
		self.try_slot_mut(node)?.form.checked = Some(checked);
		Ok(())
	}

	/// Deep-copies `node` out of `source` into this tree as a detached subtree.
	///
	/// Correlation ids are kept, so the copy still answers to the [`Vid`]s of the original.
	/// Live form state is not copied.
	pub fn import(&mut self, source: &Tree, node: NodeId) -> NodeId {
		let slot = source.slot(node);
		let copy = self.alloc(slot.kind.clone(), slot.vid);
		for &child in &slot.children {
			let child = self.import(source, child);
			if let Ok(child_slot) = self.try_slot_mut(child) {
				child_slot.parent = Some(copy);
			}
			if let Ok(copy_slot) = self.try_slot_mut(copy) {
				copy_slot.children.push(child);
			}
		}
		copy
	}

	/// Preorder traversal of `node` and everything below it.
	#[must_use]
	pub fn descendants(&self, node: NodeId) -> Descendants<'_> {
		Descendants { tree: self, stack: vec![node] }
	}

	/// Finds an attached element by its `id` attribute.
	#[must_use]
	pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
		self.top.iter().flat_map(|&top| self.descendants(top)).find(|&node| self.element_id(node) == Some(id))
	}

	/// Concatenated text of all text nodes below `node`.
	#[must_use]
	pub fn text_content(&self, node: NodeId) -> String {
		self.descendants(node)
			.filter_map(|n| match self.kind(n) {
				NodeKind::Text(text) => Some(text.as_str()),
				NodeKind::Element(_) | NodeKind::Comment(_) => None,
			})
			.collect()
	}

	/// Whether `a` in `self` and `b` in `other` have equal kinds, attributes and values all the way down.
	#[must_use]
	pub fn same_structure(&self, a: NodeId, other: &Tree, b: NodeId) -> bool {
		let (slot_a, slot_b) = (self.slot(a), other.slot(b));
		slot_a.kind == slot_b.kind
			&& slot_a.children.len() == slot_b.children.len()
			&& slot_a.children.iter().zip(&slot_b.children).all(|(&a, &b)| self.same_structure(a, other, b))
	}

	/// Frees every node that can't be reached from the top level. Returns how many were freed.
	///
	/// Handles to freed nodes become stale.
	pub fn collect_garbage(&mut self) -> usize {
		let mut reachable = vec![false; self.slots.len()];
		for &top in &self.top {
			for node in self.descendants(top) {
				reachable[node.index as usize] = true;
			}
		}
		let mut freed = 0;
		for (index, slot) in self.slots.iter_mut().enumerate() {
			if slot.is_some() && !reachable[index] {
				*slot = None;
				self.generations[index] = self.generations[index].wrapping_add(1);
				#[allow(clippy::cast_possible_truncation)]
				let index = index as u32;
				self.free.push(index);
				freed += 1;
			}
		}
		let generations = &self.generations;
		self.delegates
			.retain(|node, _| generations[node.index as usize] == node.generation && reachable[node.index as usize]);
		trace!(freed, "Collected detached nodes.");
		freed
	}

	/// Serialises `node` itself.
	#[must_use]
	pub fn outer_markup(&self, node: NodeId) -> String {
		let mut markup = String::new();
		// Writing into a `String` can't fail.
		let _ = self.write_markup(node, &mut markup);
		markup
	}

	/// Serialises the children of `node`.
	#[must_use]
	pub fn inner_markup(&self, node: NodeId) -> String {
		let mut markup = String::new();
		for &child in self.children(node) {
			let _ = self.write_markup(child, &mut markup);
		}
		markup
	}

	fn write_markup(&self, node: NodeId, out: &mut String) -> fmt::Result {
		let slot = self.slot(node);
		match &slot.kind {
			NodeKind::Text(text) => {
				let raw = slot.parent.and_then(|p| self.element(p)).map_or(false, |p| crate::markup::is_raw_text(&p.tag));
				if raw {
					out.push_str(text);
				} else {
					escape(text, false, out);
				}
			}
			NodeKind::Comment(comment) => write!(out, "<!--{}-->", comment)?,
			NodeKind::Element(element) => {
				write!(out, "<{}", element.tag)?;
				for attribute in &element.attributes {
					write!(out, " {}=\"", attribute.name)?;
					escape(&attribute.value, true, out);
					out.push('"');
				}
				out.push('>');
				if element.namespace == Namespace::Html && crate::markup::is_void(&element.tag) {
					return Ok(());
				}
				for &child in &slot.children {
					self.write_markup(child, out)?;
				}
				write!(out, "</{}>", element.tag)?;
			}
		}
		Ok(())
	}
}

fn escape(text: &str, attribute: bool, out: &mut String) {
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' if !attribute => out.push_str("&lt;"),
			'>' if !attribute => out.push_str("&gt;"),
			'"' if attribute => out.push_str("&quot;"),
			c => out.push(c),
		}
	}
}

pub struct Descendants<'a> {
	tree: &'a Tree,
	stack: Vec<NodeId>,
}
impl<'a> Iterator for Descendants<'a> {
	type Item = NodeId;

	fn next(&mut self) -> Option<Self::Item> {
		let node = self.stack.pop()?;
		if let Ok(slot) = self.tree.try_slot(node) {
			self.stack.extend(slot.children.iter().rev());
		}
		Some(node)
	}
}

#[cfg(test)]
mod tests {
	use super::Tree;
	use crate::error::DomError;

	#[test]
	fn freed_slots_are_reused_without_aliasing() {
		let mut tree = Tree::new();
		let root = tree.create_element("div");
		tree.push_top_level(root).unwrap();
		let old = tree.create_element("p");
		tree.append_child(root, old).unwrap();
		tree.remove(old).unwrap();
		assert_eq!(tree.len(), 2);

		assert_eq!(tree.collect_garbage(), 1);
		assert_eq!(tree.len(), 1);
		assert!(!tree.contains(old));

		let new = tree.create_element("span");
		assert_ne!(new, old);
		assert!(tree.element(old).is_none());
		assert!(matches!(tree.append_child(root, old), Err(DomError::Stale(_))));
		tree.append_child(root, new).unwrap();
		assert_eq!(tree.outer_markup(root), "<div><span></span></div>");
	}
}
