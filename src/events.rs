//! Delegated event listeners.
//!
//! A component registers `(event type, selector, callback)` triples here.
//! Only one platform listener (the [`Dom::Delegate`]) per component is attached to its root element for each event type in use;
//! it resolves the actual callback on dispatch.

use crate::{
	dom::Dom,
	error::ListenerError,
	rc_hash_map::RcHashMap,
};
use core::{cell::RefCell, fmt};
use hashbrown::HashSet;
use std::rc::Rc;
use tracing::{error, trace, trace_span, warn};

pub type Callback<N> = Rc<dyn Fn(&Event<N>)>;
pub type SharedListeners<N> = Rc<RefCell<ListenerRegistry<N>>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

/// What a callback is told about the event it handles.
#[derive(Clone, Debug)]
pub struct Event<N> {
	pub event_type: String,
	/// Where the event originated.
	pub target: N,
	/// The nearest inclusive ancestor of `target` that matched the listener's selector.
	pub current_target: N,
	/// The component root the delegate is attached to.
	pub root: N,
	/// The browser's event object, for key codes, `preventDefault()` and the like.
	/// [`None`] for events fired at an in-memory [`Tree`](crate::tree::Tree).
	pub native: Option<web_sys::Event>,
}

struct Listener<N> {
	id: ListenerId,
	event_type: String,
	selector: String,
	callback: Callback<N>,
}

pub struct ListenerRegistry<N> {
	listeners: Vec<Listener<N>>,
	by_type: RcHashMap<String, u16, Vec<ListenerId>>,
	child_anchors: HashSet<String>,
	active: bool,
	next_id: u32,
}

impl<N> Default for ListenerRegistry<N> {
	fn default() -> Self {
		Self {
			listeners: Vec::new(),
			by_type: RcHashMap::new(),
			child_anchors: HashSet::new(),
			active: false,
			next_id: 0,
		}
	}
}

impl<N> fmt::Debug for ListenerRegistry<N> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ListenerRegistry")
			.field(
				"listeners",
				&self.listeners.iter().map(|l| (l.id, l.event_type.as_str(), l.selector.as_str())).collect::<Vec<_>>(),
			)
			.field("child_anchors", &self.child_anchors)
			.field("active", &self.active)
			.finish()
	}
}

impl<N: Clone + PartialEq> ListenerRegistry<N> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// # Errors
	///
	/// Iff there are already 65535 listeners for `event_type`.
	pub fn add(&mut self, event_type: &str, selector: &str, callback: Callback<N>) -> Result<ListenerId, ListenerError> {
		let id = ListenerId(self.next_id);
		self.by_type
			.increment_or_insert_with(event_type.to_owned(), Vec::new)
			.map_err(|_| ListenerError::Saturated(event_type.to_owned()))?
			.push(id);
		self.next_id = self.next_id.wrapping_add(1);
		self.listeners.push(Listener {
			id,
			event_type: event_type.to_owned(),
			selector: selector.to_owned(),
			callback,
		});
		Ok(id)
	}

	/// Returns whether `id` was registered.
	///
	/// The event type stays known until [`ListenerRegistry::drain_unused`].
	pub fn remove(&mut self, id: ListenerId) -> bool {
		let index = match self.listeners.iter().position(|l| l.id == id) {
			Some(index) => index,
			None => return false,
		};
		let listener = self.listeners.remove(index);
		match self.by_type.weak_decrement(listener.event_type.as_str()) {
			Ok(Some(ids)) => ids.retain(|&i| i != id),
			Ok(None) | Err(_) => error!("Listener index out of sync for event type {:?}.", listener.event_type),
		}
		true
	}

	/// Forgets event types without listeners and returns them, so that their delegates can be detached.
	pub fn drain_unused(&mut self) -> Vec<String> {
		self.by_type.drain_weak().into_iter().map(|(event_type, _)| event_type).collect()
	}

	/// Event types with at least one listener.
	#[must_use]
	pub fn event_types(&self) -> Vec<String> {
		self.by_type.strong_keys().cloned().collect()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.listeners.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.listeners.is_empty()
	}

	/// Element ids whose subtrees belong to child components. Events from inside them are ignored.
	pub fn set_child_anchors(&mut self, ids: impl IntoIterator<Item = String>) {
		self.child_anchors = ids.into_iter().collect();
	}

	/// Inactive registries (those of stopped components) resolve nothing.
	pub fn set_active(&mut self, active: bool) {
		self.active = active;
	}

	#[must_use]
	pub fn is_active(&self) -> bool {
		self.active
	}

	/// Finds every callback responsible for an `event_type` event from `target` that bubbled up to `root`,
	/// in registration order, each with the nearest node that matched its selector.
	pub fn resolve<D: Dom<Node = N>>(&self, dom: &D, root: &N, event_type: &str, target: &N) -> Vec<(Callback<N>, N)> {
		let ids = match self.by_type.get(event_type) {
			Some(ids) if self.active => ids,
			_ => return Vec::new(),
		};

		let mut path = Vec::new();
		let mut current = Some(target.clone());
		while let Some(node) = current {
			if &node == root {
				path.push(node);
				break;
			}
			if dom.element_id(&node).map_or(false, |id| self.child_anchors.contains(&id)) {
				trace!("Ignoring event from within a child component.");
				return Vec::new();
			}
			current = dom.parent(&node);
			path.push(node);
		}
		if path.last() != Some(root) {
			return Vec::new();
		}

		ids.iter()
			.filter_map(|id| self.listeners.iter().find(|l| l.id == *id))
			.filter_map(|listener| {
				path.iter()
					.find(|node| dom.matches(node, &listener.selector))
					.map(|node| (Rc::clone(&listener.callback), node.clone()))
			})
			.collect()
	}
}

/// Resolves and invokes the callbacks for one event. Returns how many listeners handled it.
///
/// The registry isn't borrowed while the callbacks run.
pub fn dispatch<D: Dom>(
	listeners: &SharedListeners<D::Node>,
	dom: &D,
	root: &D::Node,
	event_type: &str,
	target: &D::Node,
	native: Option<&web_sys::Event>,
) -> usize {
	let span = trace_span!("Dispatching event", event_type);
	let _enter = span.enter();

	let resolved = match listeners.try_borrow() {
		Ok(registry) => registry.resolve(dom, root, event_type, target),
		Err(_) => {
			warn!("Listener registry is busy. Dropping event.");
			return 0;
		}
	};
	for (callback, current_target) in &resolved {
		callback(&Event {
			event_type: event_type.to_owned(),
			target: target.clone(),
			current_target: current_target.clone(),
			root: root.clone(),
			native: native.cloned(),
		});
	}
	resolved.len()
}

impl crate::tree::Tree {
	/// Fires an event at `target` and lets it bubble through every delegate on its ancestors.
	///
	/// Returns how many listeners handled it.
	pub fn dispatch(&self, target: crate::tree::NodeId, event_type: &str) -> usize {
		let mut handled = 0;
		let mut current = Some(target);
		while let Some(node) = current {
			if let Some(delegates) = self.delegates.get(&node) {
				for (delegate_type, listeners) in delegates {
					if delegate_type == event_type {
						handled += dispatch(listeners, self, &node, event_type, &target, None);
					}
				}
			}
			current = self.parent(node);
		}
		handled
	}
}
