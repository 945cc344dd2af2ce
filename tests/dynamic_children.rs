mod common;

use common::{body_markup, document, init};
use patchwork_dom::{tree::Attributes, ChildFactory, Component, Registry, Tree};
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};

fn items(ids: &[&str]) -> String {
	let items: String = ids.iter().map(|id| format!("<todo-item id=\"{0}\" key=\"{0}\" label=\"{0}\"></todo-item>", id)).collect();
	format!("<ul>{}</ul>", items)
}

fn todo_registry(created: &Rc<Cell<u32>>) -> Registry<Tree> {
	let created = Rc::clone(created);
	Registry::new().with("todo-item", move |id, attributes: &Attributes| {
		created.set(created.get() + 1);
		let label = attributes.get("label").unwrap_or_default().to_owned();
		Component::new(id, move || format!("<li>{}</li>", label))
	})
}

#[test]
fn created_and_removed_with_their_slots() {
	init();
	let mut page = document("<div id=\"app\"></div>");
	let markup = Rc::new(RefCell::new(items(&["a", "b"])));
	let created = Rc::new(Cell::new(0));
	let mut app = Component::new("app", {
		let markup = Rc::clone(&markup);
		move || markup.borrow().clone()
	})
	.with_child_tags(["todo-item"])
	.with_factory(todo_registry(&created));

	app.start(&mut page).unwrap();
	assert_eq!(created.get(), 2);
	assert_eq!(body_markup(&page), "<ul id=\"app\"><li id=\"a\">a</li><li id=\"b\">b</li></ul>");
	assert!(app.children().iter().all(|child| !child.is_stopped()));

	let b = page.element_by_id("b").unwrap();
	*markup.borrow_mut() = items(&["b", "c"]);
	app.render(&mut page).unwrap();

	assert_eq!(created.get(), 3);
	let ids: Vec<_> = app.children().iter().map(Component::id).collect();
	assert_eq!(ids, ["b", "c"]);
	assert_eq!(page.element_by_id("b"), Some(b), "surviving child keeps its subtree");
	assert!(page.element_by_id("a").is_none());
	assert_eq!(body_markup(&page), "<ul id=\"app\"><li id=\"b\">b</li><li id=\"c\">c</li></ul>");
}

#[test]
fn ownership_attribute_and_unresolved_classes() {
	init();
	let mut page = document("<div id=\"app\"></div>");
	let registry = Registry::new().with("Counter", |id, _: &Attributes| Component::new(id, || "<output>0</output>"));
	let mut app = Component::new(
		"app",
		|| "<div><span id=\"one\" data-component=\"counter\"></span><span id=\"two\" data-component=\"Missing\"></span><span data-component=\"Counter\"></span></div>",
	)
	.with_factory(registry);
	app.start(&mut page).unwrap();

	assert_eq!(app.children().len(), 1);
	assert!(app.child("one").is_some());
	assert_eq!(
		body_markup(&page),
		"<div id=\"app\"><output id=\"one\">0</output><span id=\"two\" data-component=\"Missing\"></span><span data-component=\"Counter\"></span></div>"
	);
}

#[test]
fn custom_ownership_attribute() {
	init();
	let mut page = document("<div id=\"app\"></div>");
	let mut app = Component::new("app", || "<div><p id=\"x\" is=\"Para\"></p><p id=\"y\" data-component=\"Para\"></p></div>")
		.with_component_attribute("is")
		.with_factory(|class_name: &str, id: &str, _: &Attributes| {
			(class_name == "Para").then(|| Component::new(id, || "<p>para</p>"))
		});
	app.start(&mut page).unwrap();
	let ids: Vec<_> = app.children().iter().map(Component::id).collect();
	assert_eq!(ids, ["x"]);
}

#[test]
fn nested_child_is_not_replaced_on_parent_update() {
	init();
	let mut page = document("<div id=\"app\"></div>");
	let title = Rc::new(RefCell::new("v1"));
	let child_renders = Rc::new(Cell::new(0));
	let registry = {
		let child_renders = Rc::clone(&child_renders);
		Registry::new().with("panel", move |id, _: &Attributes| {
			let child_renders = Rc::clone(&child_renders);
			Component::new(id, move || {
				child_renders.set(child_renders.get() + 1);
				"<section><h2>panel</h2></section>"
			})
		})
	};
	let mut app = Component::new("app", {
		let title = Rc::clone(&title);
		move || format!("<main><h1>{}</h1><panel id=\"p\" title=\"{}\"></panel></main>", title.borrow(), title.borrow())
	})
	.with_child_tags(["panel"])
	.with_factory(registry);
	app.start(&mut page).unwrap();
	let panel = page.element_by_id("p").unwrap();

	*title.borrow_mut() = "v2";
	app.render(&mut page).unwrap();

	assert_eq!(page.element_by_id("p"), Some(panel));
	assert_eq!(child_renders.get(), 1);
	assert_eq!(
		body_markup(&page),
		"<main id=\"app\"><h1>v2</h1><section id=\"p\"><h2>panel</h2></section></main>"
	);
}

#[test]
fn grandchildren_use_the_inherited_factory() {
	init();
	let mut page = document("<div id=\"app\"></div>");
	let registry = Registry::new()
		.with("outer", |id, _: &Attributes| {
			Component::new(id, || "<div><span id=\"inner-1\" data-component=\"inner\"></span></div>")
		})
		.with("inner", |id, _: &Attributes| Component::new(id, || "<em>inner</em>"));
	let mut app = Component::new("app", || "<div><div id=\"outer-1\" data-component=\"outer\"></div></div>").with_factory(registry);
	app.start(&mut page).unwrap();

	let outer = app.child("outer-1").unwrap();
	assert!(outer.child("inner-1").is_some());
	assert_eq!(
		body_markup(&page),
		"<div id=\"app\"><div id=\"outer-1\"><em id=\"inner-1\">inner</em></div></div>"
	);
}

struct Tracking {
	updates: Rc<RefCell<Vec<String>>>,
}

impl ChildFactory<Tree> for Tracking {
	fn create(&self, _class_name: &str, id: &str, _attributes: &Attributes) -> Option<Component<Tree>> {
		Some(Component::new(id, || "<i></i>"))
	}

	fn update(&self, child: &mut Component<Tree>, _class_name: &str, attributes: &Attributes) {
		self.updates
			.borrow_mut()
			.push(format!("{}={}", child.id(), attributes.get("n").unwrap_or_default()));
	}
}

#[test]
fn known_children_are_updated() {
	init();
	let mut page = document("<div id=\"app\"></div>");
	let n = Rc::new(Cell::new(1));
	let updates = Rc::new(RefCell::new(Vec::new()));
	let mut app = Component::new("app", {
		let n = Rc::clone(&n);
		move || format!("<div><b id=\"w\" data-component=\"W\" n=\"{}\"></b></div>", n.get())
	})
	.with_factory(Tracking {
		updates: Rc::clone(&updates),
	});

	app.start(&mut page).unwrap();
	assert!(updates.borrow().is_empty());
	n.set(2);
	app.render(&mut page).unwrap();
	assert_eq!(*updates.borrow(), ["w=2"]);
}
