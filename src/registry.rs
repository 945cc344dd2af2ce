//! Resolving declared child component classes.

use crate::{component::Component, dom::Dom, tree::Attributes};
use core::fmt;
use hashbrown::HashMap;
use tracing::trace;

/// Creates child components for the slots a parent renders.
pub trait ChildFactory<D: Dom> {
	/// Returns [`None`] iff `class_name` isn't known. The parent then leaves the slot empty.
	///
	/// The returned component should be anchored at `id`.
	fn create(&self, class_name: &str, id: &str, attributes: &Attributes) -> Option<Component<D>>;

	/// Called on each parent render for a child this factory created earlier and whose slot is still present.
	fn update(&self, child: &mut Component<D>, class_name: &str, attributes: &Attributes) {
		let _ = (child, class_name, attributes);
	}
}

impl<D, F> ChildFactory<D> for F
where
	D: Dom,
	F: Fn(&str, &str, &Attributes) -> Option<Component<D>>,
{
	fn create(&self, class_name: &str, id: &str, attributes: &Attributes) -> Option<Component<D>> {
		self(class_name, id, attributes)
	}
}

type Constructor<D> = Box<dyn Fn(&str, &Attributes) -> Component<D>>;

/// An explicit class name → constructor table.
///
/// Lookup tries the exact name first and then falls back to an ASCII case-insensitive match,
/// since HTML tag names reach the factory lowercased.
pub struct Registry<D: Dom> {
	constructors: HashMap<String, Constructor<D>>,
}

impl<D: Dom> Default for Registry<D> {
	fn default() -> Self {
		Self {
			constructors: HashMap::new(),
		}
	}
}

impl<D: Dom> fmt::Debug for Registry<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.constructors.keys()).finish()
	}
}

impl<D: Dom> Registry<D> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// `constructor` receives the anchor id and the slot's attributes.
	pub fn register(&mut self, class_name: impl Into<String>, constructor: impl Fn(&str, &Attributes) -> Component<D> + 'static) -> &mut Self {
		self.constructors.insert(class_name.into(), Box::new(constructor));
		self
	}

	#[must_use]
	pub fn with(mut self, class_name: impl Into<String>, constructor: impl Fn(&str, &Attributes) -> Component<D> + 'static) -> Self {
		self.register(class_name, constructor);
		self
	}

	#[must_use]
	pub fn contains(&self, class_name: &str) -> bool {
		self.lookup(class_name).is_some()
	}

	fn lookup(&self, class_name: &str) -> Option<&Constructor<D>> {
		self.constructors.get(class_name).or_else(|| {
			self.constructors
				.iter()
				.find(|(name, _)| name.eq_ignore_ascii_case(class_name))
				.map(|(_, constructor)| constructor)
		})
	}
}

impl<D: Dom> ChildFactory<D> for Registry<D> {
	fn create(&self, class_name: &str, id: &str, attributes: &Attributes) -> Option<Component<D>> {
		let constructor = self.lookup(class_name)?;
		trace!(class_name, id, "Constructing child component.");
		Some(constructor(id, attributes))
	}
}

#[cfg(test)]
mod tests {
	use super::{ChildFactory, Registry};
	use crate::{component::Component, tree::Attributes, tree::Tree};

	#[test]
	fn case_insensitive_fallback() {
		let registry = Registry::<Tree>::new()
			.with("TodoItem", |id, _| Component::new(id, || "<li></li>"))
			.with("todoitem", |id, _| Component::new(format!("{}-lower", id), || "<li></li>"));
		let attributes = Attributes::new();

		let exact = registry.create("todoitem", "x", &attributes).unwrap();
		assert_eq!(exact.id(), "x-lower");
		let exact = registry.create("TodoItem", "x", &attributes).unwrap();
		assert_eq!(exact.id(), "x");
		assert!(registry.create("TODOITEM", "x", &attributes).is_some());
		assert!(registry.create("Missing", "x", &attributes).is_none());
	}
}
