#[cfg(any(test, feature = "dom-snapshot"))]
pub mod dom_snapshot;
pub mod dom_utils;
pub mod head;
pub mod serialize;
pub mod traverse;

mod dom_builder;
mod types;

pub use crate::dom_builder::{ParseError, build_dom};
pub use crate::dom_utils::visible_text;
pub use crate::serialize::{inner_html, to_html, to_pretty_html};
pub use crate::types::Node;
