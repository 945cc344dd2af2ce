//! Tree comparison and patch application.
//!
//! [`TreeComparator`] turns two trees into a list of [`Patch`]es that, applied in order, transform the first into the second.
//! The same list can be replayed onto any [`Dom`] by remapping its node references, see [`apply_patches_with`].

use crate::{
	dom::Dom,
	error::DomError,
	tree::{Attributes, NodeId, NodeKind, Tree},
};
use core::fmt;
use hashbrown::HashMap;
use tracing::{trace, trace_span};

/// Children with equal values of this attribute are considered the same across renders.
pub const KEY_ATTRIBUTE: &str = "key";

/// One atomic edit.
///
/// `target` always refers to the tree that is being transformed.
/// The `replacement` of insertions refers to the tree that is transformed into, the `replacement` of a swap to the transformed tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Patch<N = NodeId> {
	/// Inserts `replacement` into `target` at `index`, counted in the child list as it is when this patch is applied.
	InsertBefore { target: N, replacement: N, index: usize },
	Remove { target: N },
	Swap { target: N, replacement: N },
	AppendChild { target: N, replacement: N },
	/// `target` is [`None`] iff there was nothing to compare against.
	Replace { target: Option<N>, replacement: N },
	SetValue { target: N, value: String },
	/// Carries the complete new attribute set. Application computes the delta.
	SetAttributes { target: N, attributes: Attributes },
}

/// What a node reference in a [`Patch`] is used for, as seen by a mapping function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRole {
	/// An existing node that is changed, removed or used as parent.
	Target,
	/// A node to be newly inserted.
	Inserted,
	/// An existing node that changes places with the target.
	Swapped,
}

impl<N> Patch<N> {
	#[must_use]
	pub fn target(&self) -> Option<&N> {
		match self {
			Patch::InsertBefore { target, .. }
			| Patch::Remove { target }
			| Patch::Swap { target, .. }
			| Patch::AppendChild { target, .. }
			| Patch::SetValue { target, .. }
			| Patch::SetAttributes { target, .. } => Some(target),
			Patch::Replace { target, .. } => target.as_ref(),
		}
	}

	/// Remaps every node reference through `f`, target first.
	///
	/// If `f` returns [`None`] for any of them, the whole patch is dropped and `Ok(None)` is returned.
	///
	/// # Errors
	///
	/// Iff `f` fails.
	pub fn try_map<M, E>(&self, mut f: impl FnMut(NodeRole, &N) -> Result<Option<M>, E>) -> Result<Option<Patch<M>>, E> {
		macro_rules! map {
			($role:expr, $node:expr) => {
				match f($role, $node)? {
					Some(mapped) => mapped,
					None => return Ok(None),
				}
			};
		}

		Ok(Some(match self {
			Patch::InsertBefore { target, replacement, index } => Patch::InsertBefore {
				target: map!(NodeRole::Target, target),
				replacement: map!(NodeRole::Inserted, replacement),
				index: *index,
			},
			Patch::Remove { target } => Patch::Remove {
				target: map!(NodeRole::Target, target),
			},
			Patch::Swap { target, replacement } => Patch::Swap {
				target: map!(NodeRole::Target, target),
				replacement: map!(NodeRole::Swapped, replacement),
			},
			Patch::AppendChild { target, replacement } => Patch::AppendChild {
				target: map!(NodeRole::Target, target),
				replacement: map!(NodeRole::Inserted, replacement),
			},
			Patch::Replace { target, replacement } => Patch::Replace {
				target: match target {
					Some(target) => Some(map!(NodeRole::Target, target)),
					None => None,
				},
				replacement: map!(NodeRole::Inserted, replacement),
			},
			Patch::SetValue { target, value } => Patch::SetValue {
				target: map!(NodeRole::Target, target),
				value: value.clone(),
			},
			Patch::SetAttributes { target, attributes } => Patch::SetAttributes {
				target: map!(NodeRole::Target, target),
				attributes: attributes.clone(),
			},
		}))
	}
}

/// How a pair of nodes is compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComparePolicy {
	/// Structural comparison.
	Diff,
	/// Leave the pair alone.
	Skip,
	/// Replace without looking inside.
	Replace,
	/// Compare only the attributes of two elements.
	Attributes,
}

/// A node as presented to a comparison policy.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
	pub tree: &'a Tree,
	pub id: NodeId,
}
impl<'a> NodeRef<'a> {
	#[must_use]
	pub fn kind(self) -> &'a NodeKind {
		self.tree.kind(self.id)
	}

	#[must_use]
	pub fn attribute(self, name: &str) -> Option<&'a str> {
		self.tree.attribute(self.id, name)
	}

	#[must_use]
	pub fn element_id(self) -> Option<&'a str> {
		self.tree.element_id(self.id)
	}

	#[must_use]
	pub fn key(self) -> Option<&'a str> {
		self.attribute(KEY_ATTRIBUTE)
	}
}
impl fmt::Debug for NodeRef<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "NodeRef({})", self.id)
	}
}

/// Computes the patches between two trees, asking `policy` about every node pair it visits.
pub struct TreeComparator<'a, P> {
	a: &'a Tree,
	b: &'a Tree,
	policy: P,
	patches: Vec<Patch>,
}

impl<'a, P> TreeComparator<'a, P>
where
	P: FnMut(NodeRef<'a>, NodeRef<'a>) -> ComparePolicy,
{
	pub fn new(a: &'a Tree, b: &'a Tree, policy: P) -> Self {
		Self {
			a,
			b,
			policy,
			patches: Vec::new(),
		}
	}

	/// Compares `a_root` (in the first tree) with `b_root` (in the second tree).
	///
	/// A missing `a_root` yields a single replacement.
	#[must_use]
	pub fn diff(mut self, a_root: Option<NodeId>, b_root: NodeId) -> Vec<Patch> {
		let span = trace_span!("Diffing trees", ?a_root, %b_root);
		let _enter = span.enter();
		match a_root {
			Some(a_root) => self.diff_node(a_root, b_root),
			None => self.patches.push(Patch::Replace {
				target: None,
				replacement: b_root,
			}),
		}
		trace!(patches = self.patches.len(), "Diff complete.");
		self.patches
	}

	fn diff_node(&mut self, a: NodeId, b: NodeId) {
		let (tree_a, tree_b) = (self.a, self.b);
		match (self.policy)(NodeRef { tree: tree_a, id: a }, NodeRef { tree: tree_b, id: b }) {
			ComparePolicy::Diff => (),
			ComparePolicy::Skip => {
				trace!(%a, "Skipping node.");
				return;
			}
			ComparePolicy::Replace => {
				self.patches.push(Patch::Replace {
					target: Some(a),
					replacement: b,
				});
				return;
			}
			ComparePolicy::Attributes => {
				if let (NodeKind::Element(element_a), NodeKind::Element(element_b)) = (tree_a.kind(a), tree_b.kind(b)) {
					self.diff_attributes(a, &element_a.attributes, &element_b.attributes);
				}
				return;
			}
		}

		match (tree_a.kind(a), tree_b.kind(b)) {
			(NodeKind::Element(element_a), NodeKind::Element(element_b)) if element_a.tag == element_b.tag && element_a.namespace == element_b.namespace => {
				let span = trace_span!("Diffing element", %a, tag = %element_a.tag);
				let _enter = span.enter();
				if !tree_a.children(a).is_empty() || !tree_b.children(b).is_empty() {
					self.diff_children(a, b);
				}
				self.diff_attributes(a, &element_a.attributes, &element_b.attributes);
			}
			(NodeKind::Text(value_a), NodeKind::Text(value_b)) | (NodeKind::Comment(value_a), NodeKind::Comment(value_b)) => {
				if value_a != value_b {
					if cfg!(feature = "dangerous-logging") {
						trace!(%a, ?value_a, ?value_b, "Value changed.");
					}
					self.patches.push(Patch::SetValue {
						target: a,
						value: value_b.clone(),
					});
				}
			}
			_ => {
				trace!(%a, "Node kind or tag changed. Replacing it.");
				self.patches.push(Patch::Replace {
					target: Some(a),
					replacement: b,
				});
			}
		}
	}

	fn diff_attributes(&mut self, a: NodeId, attributes_a: &Attributes, attributes_b: &Attributes) {
		if attributes_a != attributes_b {
			self.patches.push(Patch::SetAttributes {
				target: a,
				attributes: attributes_b.clone(),
			});
		}
	}

	/// Keyed reconciliation of two child lists.
	///
	/// `working` mirrors the order the first child list will have once the swaps emitted so far are applied.
	/// Insertion indices are `i + insertions - deletions`, which is the number of children already settled.
	#[allow(clippy::too_many_lines)]
	fn diff_children(&mut self, parent_a: NodeId, parent_b: NodeId) {
		let (tree_a, tree_b) = (self.a, self.b);
		let mut working = tree_a.children(parent_a).to_vec();
		let children_b = tree_b.children(parent_b);

		let (mut i, mut j) = (0, 0);
		let (mut insertions, mut deletions) = (0_usize, 0_usize);
		let mut keys_a: Option<HashMap<&'a str, usize>> = None;
		let mut keys_b: Option<HashMap<&'a str, usize>> = None;

		while i < working.len() && j < children_b.len() {
			let (child_a, child_b) = (working[i], children_b[j]);
			let settled = i + insertions - deletions;

			match (tree_a.is_element(child_a), tree_b.is_element(child_b)) {
				(false, false) => {
					self.diff_node(child_a, child_b);
					i += 1;
					j += 1;
				}
				(false, true) => {
					self.patches.push(Patch::Remove { target: child_a });
					deletions += 1;
					i += 1;
				}
				(true, false) => {
					self.patches.push(Patch::InsertBefore {
						target: parent_a,
						replacement: child_b,
						index: settled,
					});
					insertions += 1;
					j += 1;
				}
				(true, true) => {
					let key_a = tree_a.attribute(child_a, KEY_ATTRIBUTE);
					let key_b = tree_b.attribute(child_b, KEY_ATTRIBUTE);
					if key_a == key_b {
						self.diff_node(child_a, child_b);
						i += 1;
						j += 1;
						continue;
					}

					let keys_a = keys_a.get_or_insert_with(|| key_index(tree_a, &working[i..], i));
					let keys_b = keys_b.get_or_insert_with(|| key_index(tree_b, &children_b[j..], j));
					let b_in_a = key_b.and_then(|key| keys_a.get(key).copied()).filter(|&position| position > i);
					let a_in_b = key_a.and_then(|key| keys_b.get(key).copied()).map_or(false, |position| position > j);

					match (b_in_a, a_in_b) {
						(Some(position), true) => {
							trace!(?key_a, ?key_b, "Swapping keyed children.");
							self.patches.push(Patch::Swap {
								target: child_a,
								replacement: working[position],
							});
							working.swap(i, position);
							if let Some(key) = key_a {
								keys_a.insert(key, position);
							}
							if let Some(key) = key_b {
								keys_a.insert(key, i);
							}
							self.diff_node(working[i], child_b);
							i += 1;
							j += 1;
						}
						(None, false) => {
							self.patches.push(Patch::Replace {
								target: Some(child_a),
								replacement: child_b,
							});
							i += 1;
							j += 1;
						}
						(None, true) => {
							self.patches.push(Patch::InsertBefore {
								target: parent_a,
								replacement: child_b,
								index: settled,
							});
							insertions += 1;
							j += 1;
						}
						(Some(_), false) => {
							self.patches.push(Patch::Remove { target: child_a });
							deletions += 1;
							i += 1;
						}
					}
				}
			}
		}

		for &rest in &working[i..] {
			self.patches.push(Patch::Remove { target: rest });
		}
		for &rest in &children_b[j..] {
			self.patches.push(Patch::AppendChild {
				target: parent_a,
				replacement: rest,
			});
		}
	}
}

/// First position of each key among `nodes`, offset by `offset`.
fn key_index<'t>(tree: &'t Tree, nodes: &[NodeId], offset: usize) -> HashMap<&'t str, usize> {
	let mut index = HashMap::new();
	for (i, &node) in nodes.iter().enumerate() {
		if let Some(key) = tree.attribute(node, KEY_ATTRIBUTE) {
			index.entry(key).or_insert(offset + i);
		}
	}
	index
}

/// Structural diff of `a_root` against `b_root`, without any policy.
#[must_use]
pub fn diff(a: &Tree, a_root: NodeId, b: &Tree, b_root: NodeId) -> Vec<Patch> {
	TreeComparator::new(a, b, |_, _| ComparePolicy::Diff).diff(Some(a_root), b_root)
}

/// Applies already-mapped patches in order.
///
/// # Errors
///
/// Stops at the first patch the document rejects. Earlier patches stay applied.
pub fn apply_patches<D: Dom>(dom: &mut D, patches: impl IntoIterator<Item = Patch<D::Node>>) -> Result<(), DomError> {
	for patch in patches {
		apply_patch(dom, patch)?;
	}
	Ok(())
}

/// Maps each patch through `mapping`, then applies it. Patches mapped to [`None`] are skipped.
///
/// # Errors
///
/// Stops at the first error from `mapping` or the document. Earlier patches stay applied.
pub fn apply_patches_with<D, F>(dom: &mut D, patches: &[Patch], mut mapping: F) -> Result<(), DomError>
where
	D: Dom,
	F: FnMut(&mut D, &Patch) -> Result<Option<Patch<D::Node>>, DomError>,
{
	let span = trace_span!("Applying patches", patches = patches.len());
	let _enter = span.enter();
	for patch in patches {
		match mapping(dom, patch)? {
			Some(mapped) => apply_patch(dom, mapped)?,
			None => trace!(?patch, "Skipped patch without counterpart."),
		}
	}
	Ok(())
}

/// # Errors
///
/// Iff the document rejects the edit, or on a [`Patch::Replace`] without target.
pub fn apply_patch<D: Dom>(dom: &mut D, patch: Patch<D::Node>) -> Result<(), DomError> {
	match patch {
		Patch::InsertBefore { target, replacement, index } => dom.insert_at(&target, &replacement, index),
		Patch::Remove { target } => dom.remove(&target),
		Patch::Swap { target, replacement } => dom.swap(&target, &replacement),
		Patch::AppendChild { target, replacement } => dom.append_child(&target, &replacement),
		Patch::Replace {
			target: Some(target),
			replacement,
		} => dom.replace(&target, &replacement),
		Patch::Replace { target: None, replacement } => Err(DomError::Detached(format!("{:?}", replacement))),
		Patch::SetValue { target, value } => dom.set_value(&target, &value),
		Patch::SetAttributes { target, attributes } => sync_attributes(dom, &target, &attributes),
	}
}

/// Makes the attributes of `target` equal to `attributes`.
///
/// `value` and `checked` are also written to the live properties, since the attributes only hold initial values once a user interacted with the control.
/// A removed `checked` attribute unchecks the control.
///
/// # Errors
///
/// Iff the document rejects a write.
pub fn sync_attributes<D: Dom>(dom: &mut D, target: &D::Node, attributes: &Attributes) -> Result<(), DomError> {
	for attribute in attributes {
		match attribute.name.as_str() {
			"value" => dom.set_value_property(target, &attribute.value)?,
			"checked" => dom.set_checked_property(target, true)?,
			_ => (),
		}
		if dom.attribute(target, &attribute.name).as_deref() != Some(attribute.value.as_str()) {
			dom.set_attribute(target, &attribute.name, &attribute.value)?;
		}
	}
	for name in dom.attribute_names(target) {
		if !attributes.contains(&name) {
			if name == "checked" {
				dom.set_checked_property(target, false)?;
			}
			dom.remove_attribute(target, &name)?;
		}
	}
	Ok(())
}

impl Tree {
	/// Replays `patches`, computed against this tree, importing inserted nodes from `source`.
	///
	/// A [`Patch::Replace`] without target makes the imported node this tree's root.
	///
	/// # Errors
	///
	/// Iff a patch doesn't fit this tree.
	pub fn apply_patches_from(&mut self, source: &Tree, patches: &[Patch]) -> Result<(), DomError> {
		for patch in patches {
			if let Patch::Replace { target: None, replacement } = patch {
				let root = self.import(source, *replacement);
				self.set_root(root)?;
				continue;
			}
			let mapped = patch.try_map(|role, &node| -> Result<_, DomError> {
				Ok(Some(match role {
					NodeRole::Inserted => self.import(source, node),
					NodeRole::Target | NodeRole::Swapped => node,
				}))
			})?;
			if let Some(mapped) = mapped {
				apply_patch(self, mapped)?;
			}
		}
		Ok(())
	}
}
