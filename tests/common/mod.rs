#![allow(dead_code)]

use patchwork_dom::{markup::MarkupParser, NodeId, Parser, Tree};
use tracing_subscriber::filter::LevelFilter;

pub fn init() {
	let _ = tracing_subscriber::fmt().with_max_level(LevelFilter::TRACE).with_test_writer().try_init();
}

/// Parses a single-rooted fragment.
pub fn parse(markup: &str) -> (Tree, NodeId) {
	let tree = MarkupParser.parse(markup).unwrap();
	let root = tree.root().unwrap();
	assert_eq!(tree.top_level().len(), 1, "expected one root in {:?}", markup);
	(tree, root)
}

/// An in-memory page with `<body>` as its root.
pub fn document(body: &str) -> Tree {
	MarkupParser.parse(&format!("<body>{}</body>", body)).unwrap()
}

pub fn body_markup(document: &Tree) -> String {
	document.inner_markup(document.root().unwrap())
}
