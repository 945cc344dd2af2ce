#![cfg(target_arch = "wasm32")]

use patchwork_dom::{
	web::{TemplateParser, WebDom},
	Component, Parser,
};
use std::{cell::RefCell, rc::Rc};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, Element};

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

fn root(dom: &WebDom, id: &str) -> Element {
	dom.document().get_element_by_id(id).unwrap()
}

#[wasm_bindgen_test]
fn create_and_update() {
	init();
	let mut dom = mount("create-app");
	let markup = Rc::new(RefCell::new(
		r#"<ul><li key="1">item-1</li><li key="2">item-2</li><li key="4">item-4</li></ul>"#.to_owned(),
	));
	let mut app = Component::new("create-app", {
		let markup = Rc::clone(&markup);
		move || markup.borrow().clone()
	});
	app.start(&mut dom).unwrap();
	assert_eq!(root(&dom, "create-app").tag_name(), "UL");

	let item_4 = root(&dom, "create-app").last_element_child().unwrap();
	*markup.borrow_mut() = r#"<ul><li key="1">item-1</li><li key="2">item-2</li><li key="3">item-3</li><li key="4">item-4</li></ul>"#.to_owned();
	app.render(&mut dom).unwrap();

	let list = root(&dom, "create-app");
	assert_eq!(list.text_content().unwrap(), "item-1item-2item-3item-4");
	assert_eq!(list.last_element_child().unwrap(), item_4);
}

#[wasm_bindgen_test]
fn identical_render_changes_nothing() {
	init();
	let mut dom = mount("identical-app");
	let mut app = Component::new("identical-app", || r#"<p class="x">same <!-- note --></p>"#);
	app.start(&mut dom).unwrap();
	let before = root(&dom, "identical-app");
	app.render(&mut dom).unwrap();
	assert_eq!(root(&dom, "identical-app"), before);
	assert_eq!(before.outer_html(), r#"<p class="x" id="identical-app">same <!-- note --></p>"#);
}

#[wasm_bindgen_test]
fn template_parser_keeps_table_rows() {
	init();
	let document = window().unwrap().document().unwrap();
	let mut parser = TemplateParser::new(document);

	let tree = parser.parse("<tr><td>cell</td></tr>").unwrap();
	let row = tree.root().unwrap();
	assert_eq!(tree.element(row).unwrap().tag, "tr");
	assert_eq!(tree.text_content(row), "cell");

	let batch = parser.parse_batch(&["<td>a</td>", "<svg><circle r=\"1\"></circle></svg>"]);
	assert_eq!(batch.len(), 2);
	let first = batch[0].as_ref().unwrap();
	assert_eq!(first.element(first.root().unwrap()).unwrap().tag, "td");
	let second = batch[1].as_ref().unwrap();
	let svg = second.root().unwrap();
	assert_eq!(second.element(svg).unwrap().namespace, patchwork_dom::tree::Namespace::Svg);
}
