//! A keyed virtual DOM differ and a component runtime on top of it.
//!
//! Each [`Component`] renders into a private snapshot [`Tree`], diffs it against the previous snapshot with a
//! [`TreeComparator`](diff::TreeComparator) and replays the same patch list onto the live document.
//! The document is abstracted as [`Dom`], implemented by [`Tree`] itself (natively and in tests) and by [`WebDom`](web::WebDom) in the browser.

#![doc(html_root_url = "https://docs.rs/patchwork-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod builder;
pub mod component;
pub mod diff;
pub mod dom;
pub mod error;
pub mod events;
pub mod load;
pub mod markup;
pub mod parse;
pub mod rc_hash_map;
pub mod registry;
pub mod selector;
pub mod slots;
pub mod tree;
pub mod web;

pub use builder::VNode;
pub use component::{Component, Renderer, Shared};
pub use diff::{ComparePolicy, Patch, TreeComparator};
pub use dom::Dom;
pub use error::{DomError, ListenerError, ParseError, RenderError};
pub use events::{Event, ListenerId};
pub use parse::{Content, Parser};
pub use registry::{ChildFactory, Registry};
pub use tree::{NodeId, Tree};
