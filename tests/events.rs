mod common;

use common::{document, init};
use patchwork_dom::{Component, NodeId, Tree};
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};

fn recorder() -> (Rc<RefCell<Vec<NodeId>>>, impl Fn(&patchwork_dom::Event<NodeId>) + 'static) {
	let seen = Rc::new(RefCell::new(Vec::new()));
	let callback = {
		let seen = Rc::clone(&seen);
		move |event: &patchwork_dom::Event<NodeId>| seen.borrow_mut().push(event.current_target)
	};
	(seen, callback)
}

/// Finds the first element below `root` with the given tag.
fn find(page: &Tree, root: NodeId, tag: &str) -> NodeId {
	page.descendants(root).find(|&node| page.element(node).map_or(false, |e| e.tag == tag)).unwrap()
}

#[test]
fn leaf_and_nested_targets() {
	init();
	let mut page = document("<div id=\"app\"></div>");
	let mut app = Component::new("app", || "<ul><li class=\"item\"><a href=\"#\"><span>go</span></a></li><li>plain</li></ul>");
	app.start(&mut page).unwrap();

	let (links, on_link) = recorder();
	let (items, on_item) = recorder();
	app.add_listener(&mut page, "click", "a[href]", on_link).unwrap();
	app.add_listener(&mut page, "click", "li.item", on_item).unwrap();

	let root = page.element_by_id("app").unwrap();
	let a = find(&page, root, "a");
	let span = find(&page, root, "span");
	let text = page.children(span)[0];

	let item = page.children(root)[0];
	assert_eq!(page.dispatch(text, "click"), 2);
	assert_eq!(*links.borrow(), [a]);
	assert_eq!(*items.borrow(), [item]);

	let plain = page.children(root)[1];
	assert_eq!(page.dispatch(plain, "click"), 0);
	assert_eq!(page.dispatch(text, "input"), 0);

	assert_eq!(page.dispatch(item, "click"), 1);
	assert_eq!(*links.borrow(), [a]);
	assert_eq!(*items.borrow(), [item, item]);
}

#[test]
fn listeners_survive_root_replacement() {
	init();
	let mut page = document("<div id=\"app\"></div>");
	let tag = Rc::new(RefCell::new("div"));
	let mut app = Component::new("app", {
		let tag = Rc::clone(&tag);
		move || format!("<{0}><button>ok</button></{0}>", tag.borrow())
	});
	app.start(&mut page).unwrap();

	let clicks = Rc::new(Cell::new(0));
	app.add_listener(&mut page, "click", "button", {
		let clicks = Rc::clone(&clicks);
		move |_: &patchwork_dom::Event<NodeId>| clicks.set(clicks.get() + 1)
	})
	.unwrap();

	*tag.borrow_mut() = "section";
	app.render(&mut page).unwrap();
	let root = page.element_by_id("app").unwrap();
	assert_eq!(page.element(root).unwrap().tag, "section");

	let button = page.children(root)[0];
	assert_eq!(page.dispatch(button, "click"), 1);
	assert_eq!(clicks.get(), 1);

	// Re-rendering doesn't attach a second delegate.
	app.render(&mut page).unwrap();
	page.dispatch(button, "click");
	assert_eq!(clicks.get(), 2);
}

#[test]
fn events_from_child_components_are_isolated() {
	init();
	let mut page = document("<div id=\"app\"></div>");
	let mut app = Component::new("app", || "<main><button>parent</button><div id=\"child\"></div></main>");
	app.start(&mut page).unwrap();
	app.add_child(&mut page, Component::new("child", || "<div><button>child</button></div>")).unwrap();

	let (parent_clicks, on_parent) = recorder();
	let (child_clicks, on_child) = recorder();
	app.add_listener(&mut page, "click", "button", on_parent).unwrap();
	app.child_mut("child").unwrap().add_listener(&mut page, "click", "button", on_child).unwrap();

	let child_root = page.element_by_id("child").unwrap();
	let child_button = page.children(child_root)[0];
	assert_eq!(page.dispatch(child_button, "click"), 1);
	assert_eq!(*child_clicks.borrow(), [child_button]);
	assert!(parent_clicks.borrow().is_empty());

	let root = page.element_by_id("app").unwrap();
	let parent_button = page.children(root)[0];
	assert_eq!(page.dispatch(parent_button, "click"), 1);
	assert_eq!(*parent_clicks.borrow(), [parent_button]);
	assert_eq!(child_clicks.borrow().len(), 1);
}

#[test]
fn removed_listeners_stop_firing() {
	init();
	let mut page = document("<div id=\"app\"></div>");
	let mut app = Component::new("app", || "<p><b>x</b></p>");
	app.start(&mut page).unwrap();

	let (seen, callback) = recorder();
	let id = app.add_listener(&mut page, "mouseover", "b", callback).unwrap();
	let b = page.children(page.element_by_id("app").unwrap())[0];
	assert_eq!(page.dispatch(b, "mouseover"), 1);

	assert!(app.remove_listener(&mut page, id).unwrap());
	assert!(!app.remove_listener(&mut page, id).unwrap());
	assert_eq!(page.dispatch(b, "mouseover"), 0);
	assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn listeners_added_before_start_attach_on_render() {
	init();
	let mut page = document("<div id=\"app\"></div>");
	let mut app = Component::new("app", || "<p>x</p>");
	let (seen, callback) = recorder();
	app.add_listener(&mut page, "click", "p", callback).unwrap();

	let p = page.element_by_id("app").unwrap();
	assert_eq!(page.dispatch(p, "click"), 0);

	app.start(&mut page).unwrap();
	let p = page.element_by_id("app").unwrap();
	assert_eq!(page.dispatch(p, "click"), 1);
	assert_eq!(*seen.borrow(), [p]);
}

#[test]
fn every_matching_listener_fires_in_registration_order() {
	init();
	let mut page = document("<div id=\"app\"></div>");
	let mut app = Component::new("app", || "<nav><a href=\"#\">home</a></nav>");
	app.start(&mut page).unwrap();

	let order = Rc::new(RefCell::new(Vec::new()));
	for (name, selector) in [("first", "a"), ("outer", "nav"), ("second", "a[href]")] {
		let order = Rc::clone(&order);
		app.add_listener(&mut page, "click", selector, move |event: &patchwork_dom::Event<NodeId>| {
			order.borrow_mut().push((name, event.current_target));
		})
		.unwrap();
	}

	let nav = page.element_by_id("app").unwrap();
	let a = page.children(nav)[0];
	let text = page.children(a)[0];
	assert_eq!(page.dispatch(text, "click"), 3);
	assert_eq!(*order.borrow(), [("first", a), ("outer", nav), ("second", a)]);
}

#[test]
fn stopped_component_listeners_are_inert() {
	init();
	let mut page = document("<div id=\"app\"></div>");
	let mut app = Component::new("app", || "<p>x</p>");
	app.start(&mut page).unwrap();
	let (seen, callback) = recorder();
	app.add_listener(&mut page, "click", "p", callback).unwrap();

	let p = page.element_by_id("app").unwrap();
	assert_eq!(page.dispatch(p, "click"), 1);

	app.stop();
	assert_eq!(page.dispatch(p, "click"), 0);
	assert_eq!(seen.borrow().len(), 1);

	app.start(&mut page).unwrap();
	let p = page.element_by_id("app").unwrap();
	assert_eq!(page.dispatch(p, "click"), 1);
	assert_eq!(seen.borrow().len(), 2);
}
