//! The component lifecycle.
//!
//! A [`Component`] owns a private snapshot of what it last rendered.
//! Each render diffs that snapshot against the renderer's new output and replays the resulting patch list twice:
//! once onto the live document (through the correlation table from [`Vid`]s to live nodes) and once onto the snapshot itself.
//!
//! Subtrees of child components are never touched by their parent, and delegated listeners survive any number of renders.

use crate::{
	diff::{apply_patches_with, ComparePolicy, NodeRef, NodeRole, Patch, TreeComparator},
	dom::Dom,
	error::{DomError, ListenerError, ParseError, RenderError},
	events::{Event, ListenerId, ListenerRegistry, SharedListeners},
	parse::{Content, Parser},
	registry::ChildFactory,
	slots::{self, DEFAULT_COMPONENT_ATTRIBUTE},
	tree::{NodeId, Tree, Vid},
};
use core::{cell::RefCell, fmt};
use hashbrown::{HashMap, HashSet};
use std::rc::Rc;
use tracing::{debug, instrument, trace, trace_span, warn};

/// Produces a component's content. The hooks default to doing nothing.
pub trait Renderer {
	fn render(&mut self) -> Content;

	/// Runs before [`Renderer::render`] on every render pass.
	fn before_render(&mut self) {}
	/// Runs after the live document, listeners and children have been updated.
	fn after_render(&mut self) {}
	fn on_start(&mut self) {}
	fn on_stop(&mut self) {}
}

impl<F, C> Renderer for F
where
	F: FnMut() -> C,
	C: Into<Content>,
{
	fn render(&mut self) -> Content {
		self().into()
	}
}

pub struct Component<D: Dom> {
	id: String,
	renderer: Box<dyn Renderer>,
	stopped: bool,
	rendering: bool,
	snapshot: Option<Tree>,
	correlation: HashMap<Vid, D::Node>,
	children: Vec<Component<D>>,
	/// Ids of children created from slots, as opposed to added through [`Component::add_child`].
	dynamic: HashSet<String>,
	child_tags: Vec<String>,
	component_attribute: String,
	listeners: SharedListeners<D::Node>,
	delegate: Option<D::Delegate>,
	/// Where the delegate is currently attached.
	listening: Option<D::Node>,
	/// Ids of children removed since the last render. Their slots are replaced on the next diff.
	released: HashSet<String>,
	factory: Option<Rc<dyn ChildFactory<D>>>,
	parser: Option<Box<dyn Parser>>,
}

impl<D: Dom> fmt::Debug for Component<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Component")
			.field("id", &self.id)
			.field("stopped", &self.stopped)
			.field("rendering", &self.rendering)
			.field("snapshot", &self.snapshot)
			.field("children", &self.children)
			.field("dynamic", &self.dynamic)
			.field("listeners", &self.listeners.try_borrow().map(|l| l.len()).ok())
			.finish()
	}
}

impl<D: Dom> Component<D> {
	/// Creates a stopped component that will render into the element with id `id`.
	pub fn new(id: impl Into<String>, renderer: impl Renderer + 'static) -> Self {
		Self {
			id: id.into(),
			renderer: Box::new(renderer),
			stopped: true,
			rendering: false,
			snapshot: None,
			correlation: HashMap::new(),
			children: Vec::new(),
			dynamic: HashSet::new(),
			child_tags: Vec::new(),
			component_attribute: DEFAULT_COMPONENT_ATTRIBUTE.to_owned(),
			listeners: Rc::new(RefCell::new(ListenerRegistry::new())),
			delegate: None,
			listening: None,
			released: HashSet::new(),
			factory: None,
			parser: None,
		}
	}

	/// Custom element names that declare a child component of the same class.
	#[must_use]
	pub fn with_child_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.child_tags = tags.into_iter().map(Into::into).collect();
		self
	}

	/// Dynamically created children inherit this factory unless they bring their own.
	#[must_use]
	pub fn with_factory(mut self, factory: impl ChildFactory<D> + 'static) -> Self {
		self.factory = Some(Rc::new(factory));
		self
	}

	/// Parses this component's markup with `parser` instead of the document's.
	#[must_use]
	pub fn with_parser(mut self, parser: impl Parser + 'static) -> Self {
		self.parser = Some(Box::new(parser));
		self
	}

	/// Replaces the default ownership attribute `data-component`.
	#[must_use]
	pub fn with_component_attribute(mut self, name: impl Into<String>) -> Self {
		self.component_attribute = name.into();
		self
	}

	#[must_use]
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Re-anchors this component. The next render starts over as a first render.
	pub fn set_id(&mut self, id: impl Into<String>) {
		self.id = id.into();
		self.snapshot = None;
		self.correlation.clear();
	}

	#[must_use]
	pub fn is_stopped(&self) -> bool {
		self.stopped
	}

	/// What this component last rendered, if it rendered since it was started.
	#[must_use]
	pub fn snapshot(&self) -> Option<&Tree> {
		self.snapshot.as_ref()
	}

	#[must_use]
	pub fn children(&self) -> &[Component<D>] {
		&self.children
	}

	#[must_use]
	pub fn child(&self, id: &str) -> Option<&Component<D>> {
		self.children.iter().find(|child| child.id == id)
	}

	pub fn child_mut(&mut self, id: &str) -> Option<&mut Component<D>> {
		self.children.iter_mut().find(|child| child.id == id)
	}

	/// Marks the component as running, renders it from scratch and then starts its children.
	///
	/// # Errors
	///
	/// Iff a render fails, see [`Component::render`].
	#[instrument(skip(self, dom), fields(id = %self.id))]
	pub fn start(&mut self, dom: &mut D) -> Result<(), RenderError> {
		self.start_with(dom, None)
	}

	fn start_with(&mut self, dom: &mut D, prepared: Option<Tree>) -> Result<(), RenderError> {
		if !self.stopped {
			trace!("Already running.");
			return Ok(());
		}
		self.stopped = false;
		self.snapshot = None;
		self.correlation.clear();
		self.released.clear();
		self.set_listening(true);
		self.render_with(dom, prepared)?;
		for child in &mut self.children {
			child.start(dom)?;
		}
		self.rebind_slots(dom);
		self.renderer.on_start();
		Ok(())
	}

	/// Stops children first, then this component. Stopped components ignore [`Component::render`].
	#[instrument(skip(self), fields(id = %self.id))]
	pub fn stop(&mut self) {
		if self.stopped {
			return;
		}
		for child in &mut self.children {
			child.stop();
		}
		self.stopped = true;
		self.set_listening(false);
		self.renderer.on_stop();
	}

	fn set_listening(&self, active: bool) {
		match self.listeners.try_borrow_mut() {
			Ok(mut listeners) => listeners.set_active(active),
			Err(_) => warn!(active, "Listener registry is busy. Activity not updated."),
		}
	}

	/// Brings the live document in line with the renderer's current output.
	///
	/// Does nothing while stopped, while the anchor element is missing from `dom` or while already rendering.
	///
	/// # Errors
	///
	/// Iff the output doesn't have exactly one root node, doesn't parse, or the document rejects a patch.
	/// In the latter case the live document is left partially patched; stop and restart the component to remount it.
	#[instrument(skip(self, dom), fields(id = %self.id))]
	pub fn render(&mut self, dom: &mut D) -> Result<(), RenderError> {
		self.render_with(dom, None)
	}

	fn render_with(&mut self, dom: &mut D, prepared: Option<Tree>) -> Result<(), RenderError> {
		if self.stopped {
			debug!("Ignoring render of stopped component.");
			return Ok(());
		}
		if self.rendering {
			warn!("Dropping re-entrant render.");
			return Ok(());
		}
		let anchor = match dom.element_by_id(&self.id) {
			Some(anchor) => anchor,
			None => {
				debug!("Anchor element is missing. Skipping render.");
				return Ok(());
			}
		};

		self.rendering = true;
		let result = self.render_pass(dom, anchor, prepared);
		self.rendering = false;
		result
	}

	fn build(&mut self, dom: &mut D, content: Content) -> Result<Tree, ParseError> {
		match &mut self.parser {
			Some(parser) => content.into_tree(parser.as_mut()),
			None => content.into_tree(dom.parser()),
		}
	}

	fn render_pass(&mut self, dom: &mut D, anchor: D::Node, prepared: Option<Tree>) -> Result<(), RenderError> {
		let saved: HashMap<String, D::Node> = self
			.children
			.iter()
			.filter_map(|child| dom.element_by_id(&child.id).map(|root| (child.id.clone(), root)))
			.collect();

		let mut new_tree = match prepared {
			Some(tree) => tree,
			None => {
				self.renderer.before_render();
				let content = self.renderer.render();
				self.build(dom, content)?
			}
		};
		let new_root = match *new_tree.top_level() {
			[root] => root,
			ref roots => return Err(RenderError::RootCount(roots.len())),
		};
		if new_tree.is_element(new_root) {
			new_tree.set_attribute(new_root, "id", self.id.clone())?;
		} else {
			warn!("Component root is not an element. The component will lose its anchor.");
		}

		let mut snapshot = self.snapshot.take().unwrap_or_default();
		let mounted = snapshot.root().and_then(|root| self.correlation.get(&snapshot.vid(root)));
		if snapshot.root().is_some() && mounted != Some(&anchor) {
			debug!("Anchor element was replaced from outside. Remounting.");
			snapshot = Tree::new();
			self.correlation.clear();
		}
		let patches = if snapshot.root().is_none() {
			dom.clear_children(&anchor)?;
			TreeComparator::new(&snapshot, &new_tree, |_, _| ComparePolicy::Replace).diff(None, new_root)
		} else {
			let child_ids: HashSet<String> = self.children.iter().map(|child| child.id.clone()).collect();
			let released = &self.released;
			TreeComparator::new(&snapshot, &new_tree, |a, b| slot_policy(&child_ids, released, a, b)).diff(snapshot.root(), new_root)
		};
		self.released.clear();
		trace!(patches = patches.len(), "Applying patches to the live document.");

		{
			let correlation = &mut self.correlation;
			let (snapshot, new_tree, saved, anchor) = (&snapshot, &new_tree, &saved, &anchor);
			apply_patches_with(dom, &patches, |dom, patch| {
				if let Patch::Replace { target: None, replacement } = patch {
					let live = dom.materialize(new_tree, *replacement, &mut |vid, node| {
						correlation.insert(vid, node.clone());
					})?;
					return Ok(Some(Patch::Replace {
						target: Some(anchor.clone()),
						replacement: live,
					}));
				}
				patch.try_map(|role, &node| -> Result<Option<D::Node>, DomError> {
					match role {
						NodeRole::Inserted => dom
							.materialize(new_tree, node, &mut |vid, live| {
								correlation.insert(vid, live.clone());
							})
							.map(Some),
						NodeRole::Target | NodeRole::Swapped => Ok(live_counterpart(&*dom, snapshot, saved, correlation, node)),
					}
				})
			})?;
		}

		snapshot.apply_patches_from(&new_tree, &patches)?;
		snapshot.collect_garbage();
		let reachable: HashSet<Vid> = snapshot
			.top_level()
			.iter()
			.flat_map(|&top| snapshot.descendants(top))
			.map(|node| snapshot.vid(node))
			.collect();
		self.correlation.retain(|vid, _| reachable.contains(vid));
		self.snapshot = Some(snapshot);

		for (id, root) in &saved {
			match dom.element_by_id(id) {
				Some(current) if &current == root => (),
				Some(current) => {
					debug!(child = %id, "Restoring child component subtree.");
					dom.replace(&current, root)?;
				}
				None => trace!(child = %id, "Child anchor is gone."),
			}
		}
		dom.reclaim();

		self.attach_listeners(dom)?;
		self.reconcile_children(dom, &new_tree, new_root)?;
		match self.listeners.try_borrow_mut() {
			Ok(mut listeners) => listeners.set_child_anchors(self.children.iter().map(|child| child.id.clone())),
			Err(_) => warn!("Listener registry is busy. Child anchors not updated."),
		}
		self.rebind_slots(dom);

		self.renderer.after_render();
		Ok(())
	}

	fn attach_listeners(&mut self, dom: &mut D) -> Result<(), DomError> {
		let event_types = self.listeners.borrow().event_types();
		if event_types.is_empty() {
			return Ok(());
		}
		let root = match dom.element_by_id(&self.id) {
			Some(root) => root,
			None => return Ok(()),
		};
		if self.listening.as_ref() != Some(&root) {
			self.detach_listeners(dom)?;
		}
		let listeners = &self.listeners;
		let delegate = self.delegate.get_or_insert_with(|| dom.delegate(listeners));
		for event_type in event_types {
			dom.attach_delegate(&root, &event_type, delegate)?;
		}
		self.listening = Some(root);
		Ok(())
	}

	/// Takes the delegate off the element it was last attached to, for example a root that was replaced.
	fn detach_listeners(&mut self, dom: &mut D) -> Result<(), DomError> {
		if let (Some(root), Some(delegate)) = (self.listening.take(), &self.delegate) {
			let event_types = self.listeners.borrow().event_types();
			for event_type in event_types {
				dom.detach_delegate(&root, &event_type, delegate)?;
			}
		}
		Ok(())
	}

	/// Child roots replace the slot elements this component rendered for them,
	/// so the correlation entries of those slots are pointed at the live child roots.
	fn rebind_slots(&mut self, dom: &D) {
		let snapshot = match &self.snapshot {
			Some(snapshot) => snapshot,
			None => return,
		};
		for child in &self.children {
			if let (Some(slot), Some(live)) = (snapshot.element_by_id(&child.id), dom.element_by_id(&child.id)) {
				self.correlation.insert(snapshot.vid(slot), live);
			}
		}
	}

	fn reconcile_children(&mut self, dom: &mut D, tree: &Tree, root: NodeId) -> Result<(), RenderError> {
		let span = trace_span!("Reconciling dynamic children");
		let _enter = span.enter();

		let slots = slots::scan(tree, root, &self.child_tags, &self.component_attribute);
		let present: HashSet<&str> = slots.iter().map(|slot| slot.id.as_str()).collect();

		let gone: Vec<String> = self.dynamic.iter().filter(|id| !present.contains(id.as_str())).cloned().collect();
		for id in gone {
			self.dynamic.remove(&id);
			if let Some(index) = self.children.iter().position(|child| child.id == id) {
				let mut child = self.children.remove(index);
				child.stop();
				child.detach_listeners(dom)?;
				debug!(child = %id, "Removed dynamic child.");
			}
		}

		let mut created = Vec::new();
		for slot in &slots {
			if let Some(child) = self.children.iter_mut().find(|child| child.id == slot.id) {
				if let (true, Some(factory)) = (self.dynamic.contains(&slot.id), &self.factory) {
					factory.update(child, &slot.class_name, &slot.attributes);
				}
				continue;
			}
			let factory = match &self.factory {
				Some(factory) => Rc::clone(factory),
				None => {
					warn!(class_name = %slot.class_name, "No child factory configured. Slot left empty.");
					continue;
				}
			};
			match factory.create(&slot.class_name, &slot.id, &slot.attributes) {
				Some(mut child) => {
					if child.id != slot.id {
						warn!(expected = %slot.id, actual = %child.id, "Re-anchoring child created with a different id.");
						child.set_id(slot.id.clone());
					}
					if child.factory.is_none() {
						child.factory = Some(factory);
					}
					created.push(child);
				}
				None => warn!(class_name = %slot.class_name, "Unresolved child component class. Slot left empty."),
			}
		}
		if created.is_empty() {
			return Ok(());
		}

		// Markup of all new children goes through the document's parser in one batch.
		let mut pending = Vec::with_capacity(created.len());
		let mut fragments = Vec::new();
		for child in &mut created {
			child.renderer.before_render();
			match child.renderer.render() {
				Content::Markup(markup) if child.parser.is_none() => {
					pending.push(None);
					fragments.push(markup);
				}
				content => pending.push(Some(content)),
			}
		}
		let mut parsed = {
			let fragments: Vec<&str> = fragments.iter().map(|fragment| fragment.trim()).collect();
			dom.parser().parse_batch(&fragments).into_iter()
		};

		for (mut child, content) in created.into_iter().zip(pending) {
			let tree = match content {
				Some(content) => child.build(dom, content)?,
				None => parsed
					.next()
					.ok_or_else(|| ParseError::Platform("batch parser returned too few results".to_owned()))??,
			};
			debug!(child = %child.id, "Starting dynamic child.");
			self.dynamic.insert(child.id.clone());
			let started = child.start_with(dom, Some(tree));
			self.children.push(child);
			started?;
		}
		Ok(())
	}

	/// Starts or stops `child` to match this component, then re-renders.
	///
	/// A child with the same id is stopped and replaced.
	///
	/// # Errors
	///
	/// Iff starting the child or re-rendering fails.
	pub fn add_child(&mut self, dom: &mut D, mut child: Component<D>) -> Result<(), RenderError> {
		if let Some(index) = self.children.iter().position(|c| c.id == child.id) {
			warn!(child = %child.id, "Replacing child with the same id.");
			let mut replaced = self.children.remove(index);
			replaced.stop();
			replaced.detach_listeners(dom)?;
		}
		if self.stopped {
			child.stop();
			self.children.push(child);
			return Ok(());
		}
		let started = child.start(dom);
		self.children.push(child);
		started?;
		self.render(dom)
	}

	/// Stops and releases the child with id `id`, detaches its listeners, then re-renders.
	///
	/// The re-render replaces the child's content with whatever this component now renders in its place.
	/// While this component is stopped, that happens on its next start.
	///
	/// # Errors
	///
	/// Iff detaching the child's listeners or re-rendering fails. The child is removed regardless.
	pub fn remove_child(&mut self, dom: &mut D, id: &str) -> Result<Option<Component<D>>, RenderError> {
		let index = match self.children.iter().position(|child| child.id == id) {
			Some(index) => index,
			None => return Ok(None),
		};
		self.rebind_slots(dom);
		let mut child = self.children.remove(index);
		child.stop();
		self.dynamic.remove(id);
		self.released.insert(id.to_owned());
		child.detach_listeners(dom)?;
		self.render(dom)?;
		Ok(Some(child))
	}

	/// Registers a delegated listener for `event_type` events on elements inside this component matching `selector`.
	///
	/// Events from inside child components are not delivered.
	///
	/// # Errors
	///
	/// Iff there are too many listeners for `event_type` or attaching the delegate fails.
	pub fn add_listener(
		&mut self,
		dom: &mut D,
		event_type: &str,
		selector: &str,
		callback: impl Fn(&Event<D::Node>) + 'static,
	) -> Result<ListenerId, ListenerError> {
		let id = self.listeners.borrow_mut().add(event_type, selector, Rc::new(callback))?;
		if !self.stopped {
			self.attach_listeners(dom)?;
		}
		Ok(id)
	}

	/// Returns whether `id` was registered. Delegates for event types without remaining listeners are detached.
	///
	/// # Errors
	///
	/// Iff detaching a delegate fails.
	pub fn remove_listener(&mut self, dom: &mut D, id: ListenerId) -> Result<bool, ListenerError> {
		let (removed, unused) = {
			let mut listeners = self.listeners.borrow_mut();
			let removed = listeners.remove(id);
			(removed, listeners.drain_unused())
		};
		if let (Some(delegate), Some(root)) = (&self.delegate, &self.listening) {
			for event_type in unused {
				dom.detach_delegate(root, &event_type, delegate)?;
			}
		}
		Ok(removed)
	}
}

fn slot_policy(child_ids: &HashSet<String>, released: &HashSet<String>, a: NodeRef<'_>, b: NodeRef<'_>) -> ComparePolicy {
	if a.element_id().map_or(false, |id| released.contains(id)) {
		return ComparePolicy::Replace;
	}
	let slot_a = a.element_id().filter(|id| child_ids.contains(*id));
	let slot_b = b.element_id().filter(|id| child_ids.contains(*id));
	match (slot_a, slot_b) {
		(Some(a), Some(b)) if a == b => ComparePolicy::Skip,
		(None, None) => ComparePolicy::Diff,
		_ => ComparePolicy::Replace,
	}
}

/// Child roots win over the correlation table, since a child's first render replaces the slot element its parent created.
fn live_counterpart<D: Dom>(
	dom: &D,
	snapshot: &Tree,
	saved: &HashMap<String, D::Node>,
	correlation: &HashMap<Vid, D::Node>,
	node: NodeId,
) -> Option<D::Node> {
	let id = snapshot.element_id(node);
	if let Some(root) = id.and_then(|id| saved.get(id)) {
		return Some(root.clone());
	}
	if let Some(live) = correlation.get(&snapshot.vid(node)) {
		return Some(live.clone());
	}
	let live = id.and_then(|id| dom.element_by_id(id));
	if live.is_none() {
		trace!(%node, "No live counterpart.");
	}
	live
}

/// A shared handle for callers that need to render a component from the outside, like a model subscription.
pub struct Shared<D: Dom>(Rc<RefCell<Component<D>>>);

impl<D: Dom> Clone for Shared<D> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<D: Dom> fmt::Debug for Shared<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0.try_borrow() {
			Ok(component) => f.debug_tuple("Shared").field(&*component).finish(),
			Err(_) => f.write_str("Shared(<rendering>)"),
		}
	}
}

impl<D: Dom> Shared<D> {
	#[must_use]
	pub fn new(component: Component<D>) -> Self {
		Self(Rc::new(RefCell::new(component)))
	}

	/// Renders, unless the component is already borrowed (for example because it's rendering), in which case the call is dropped.
	///
	/// # Errors
	///
	/// See [`Component::render`].
	pub fn render(&self, dom: &mut D) -> Result<(), RenderError> {
		match self.0.try_borrow_mut() {
			Ok(mut component) => component.render(dom),
			Err(_) => {
				warn!("Component is busy. Dropping render.");
				Ok(())
			}
		}
	}

	/// # Errors
	///
	/// See [`Component::start`].
	pub fn start(&self, dom: &mut D) -> Result<(), RenderError> {
		self.with_mut(|component| component.start(dom)).unwrap_or(Ok(()))
	}

	pub fn stop(&self) {
		self.with_mut(Component::stop);
	}

	/// Runs `f` on the component, or returns [`None`] if it's busy.
	pub fn with_mut<R>(&self, f: impl FnOnce(&mut Component<D>) -> R) -> Option<R> {
		match self.0.try_borrow_mut() {
			Ok(mut component) => Some(f(&mut component)),
			Err(_) => {
				warn!("Component is busy.");
				None
			}
		}
	}

	/// Runs `f` on the component, or returns [`None`] if it's being mutated.
	pub fn with<R>(&self, f: impl FnOnce(&Component<D>) -> R) -> Option<R> {
		self.0.try_borrow().ok().map(|component| f(&component))
	}
}
