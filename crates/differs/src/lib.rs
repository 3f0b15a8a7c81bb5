//! Diffing two captures of a web page.
//!
//! Strategies range from a length comparison up to [`html_diff_render`],
//! which rebuilds the new page with every change marked inline. See
//! [`Strategy`] for the full list and [`run_strategy`] to pick one by name.

pub mod config;
pub mod error;
pub mod pair;
pub mod regions;
pub mod render;
pub mod shield;
pub mod strategies;

pub use crate::config::{ConfigError, DiffConfig};
pub use crate::error::DiffError;
pub use crate::strategies::{
    Body, DiffOutput, SideBySideText, Strategy, UnknownStrategy, compare_length, compute_dmp_diff,
    decode_bodies, extract_visible_text, html_diff_render, html_differ, html_source_diff, html_text_diff,
    html_tree_diff, identical_bytes, pagefreezer, run_strategy, side_by_side_text,
};
pub use text_diff::{ChangeKind, DiffOp, Payload, Segment};
