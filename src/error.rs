//! Error types.
//!
//! Only conditions that abort an operation are surfaced here.
//! Everything that a render can step over (a missing anchor, an unresolvable child class, a patch without live counterpart…)
//! is reported through [`tracing`] instead.

use thiserror::Error;

/// A document operation failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
	#[error("node {0} does not exist (anymore)")]
	Stale(String),
	#[error("node {child} is not a child of {parent}")]
	NotAChild { parent: String, child: String },
	#[error("inserting node {child} into {parent} would create a cycle")]
	Hierarchy { parent: String, child: String },
	#[error("node {0} is detached and has no parent to be replaced or swapped in")]
	Detached(String),
	#[error("node {0} is not an element")]
	NotAnElement(String),
	#[error("node {0} carries no character data")]
	NotCharacterData(String),
	#[error("platform error: {0}")]
	Platform(String),
}

/// Markup or a selector could not be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
	#[error("unterminated comment starting at byte {0}")]
	UnterminatedComment(usize),
	#[error("unterminated tag starting at byte {0}")]
	UnterminatedTag(usize),
	#[error("invalid selector {selector:?}: {reason}")]
	Selector { selector: String, reason: &'static str },
	#[error("platform error: {0}")]
	Platform(String),
}

/// A render pass was aborted.
///
/// A pass that fails after patching started leaves the live document partially patched.
/// Stop and restart the component to remount it.
#[derive(Debug, Error)]
pub enum RenderError {
	#[error("a renderer must produce exactly one root node, but produced {0}")]
	RootCount(usize),
	#[error(transparent)]
	Parse(#[from] ParseError),
	#[error(transparent)]
	Dom(#[from] DomError),
}

/// A listener could not be registered or unregistered.
#[derive(Debug, Error)]
pub enum ListenerError {
	#[error("too many (more than 65k) listeners for event type {0:?}")]
	Saturated(String),
	#[error(transparent)]
	Dom(#[from] DomError),
}
