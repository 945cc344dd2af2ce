#![cfg(target_arch = "wasm32")]

use patchwork_dom::{web::WebDom, Component, Event};
use std::{cell::Cell, rc::Rc};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlElement, HtmlInputElement, Node};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

fn init() {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}
}

fn mount(id: &str) -> WebDom {
	let document = window().unwrap().document().unwrap();
	let anchor = document.create_element("div").unwrap();
	anchor.set_id(id);
	document.body().unwrap().append_child(&anchor).unwrap();
	WebDom::new(document)
}

fn button(dom: &WebDom, id: &str) -> HtmlElement {
	dom.document().get_element_by_id(id).unwrap().dyn_into().unwrap()
}

#[wasm_bindgen_test]
fn click() {
	init();
	let mut dom = mount("click-app");
	let mut app = Component::new("click-app", || r#"<div><button id="test-button"><b>Click</b></button></div>"#);
	app.start(&mut dom).unwrap();

	let click_count = Rc::new(Cell::new(0));
	app.add_listener(&mut dom, "click", "button", {
		let click_count = Rc::clone(&click_count);
		move |event: &Event<Node>| {
			assert_eq!(event.event_type, "click");
			click_count.set(click_count.get() + 1);
		}
	})
	.unwrap();

	assert_eq!(click_count.get(), 0);
	button(&dom, "test-button").click();
	assert_eq!(click_count.get(), 1);

	// Re-rendering must neither drop nor duplicate the delegate.
	app.render(&mut dom).unwrap();
	button(&dom, "test-button").click();
	assert_eq!(click_count.get(), 2);
}

#[wasm_bindgen_test]
fn child_events_stay_with_the_child() {
	init();
	let mut dom = mount("isolation-app");
	let mut app = Component::new(
		"isolation-app",
		|| r#"<div><button id="parent-button">parent</button><div id="isolation-child"></div></div>"#,
	);
	app.start(&mut dom).unwrap();
	app.add_child(
		&mut dom,
		Component::new("isolation-child", || r#"<p><button id="child-button">child</button></p>"#),
	)
	.unwrap();

	let parent_clicks = Rc::new(Cell::new(0));
	app.add_listener(&mut dom, "click", "button", {
		let parent_clicks = Rc::clone(&parent_clicks);
		move |_: &Event<Node>| parent_clicks.set(parent_clicks.get() + 1)
	})
	.unwrap();

	button(&dom, "child-button").click();
	assert_eq!(parent_clicks.get(), 0);
	button(&dom, "parent-button").click();
	assert_eq!(parent_clicks.get(), 1);
}

#[wasm_bindgen_test]
fn default_actions_are_left_to_callbacks() {
	init();
	let mut dom = mount("default-app");
	let mut app = Component::new(
		"default-app",
		|| r#"<form><input id="kept" type="checkbox"><input id="cancelled" type="checkbox"></form>"#,
	);
	app.start(&mut dom).unwrap();

	let seen_native = Rc::new(Cell::new(0));
	app.add_listener(&mut dom, "click", "input", {
		let seen_native = Rc::clone(&seen_native);
		move |event: &Event<Node>| {
			let native = event.native.as_ref().unwrap();
			seen_native.set(seen_native.get() + 1);
			if event.target.dyn_ref::<HtmlInputElement>().map_or(false, |input| input.id() == "cancelled") {
				native.prevent_default();
			}
		}
	})
	.unwrap();

	let checkbox = |id: &str| -> HtmlInputElement { dom.document().get_element_by_id(id).unwrap().dyn_into().unwrap() };
	checkbox("kept").click();
	checkbox("cancelled").click();
	assert_eq!(seen_native.get(), 2);
	assert!(checkbox("kept").checked());
	assert!(!checkbox("cancelled").checked());
}
