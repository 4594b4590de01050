#![doc(html_root_url = "https://docs.rs/hover-list/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A list of hoverable items, rendered either through [`lignin`] VDOM diffing (plain or memoized) or by direct DOM manipulation.
//!
//! [`hover`] holds the reconciliation rule every renderer shares, [`mount`] wires it to the DOM.

pub use lignin;

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod config;
pub mod diff;
pub mod direct;
pub mod hover;
pub mod list;
pub mod mount;
mod rc_hash_map;
pub mod view;

pub use config::{ConfigError, ListConfig, Variant};
pub use hover::{HoverEvent, HoverState, ItemId, Transition};
pub use list::{HoverListView, Item};
pub use mount::{init_logging, HoverList, HoverListMount};
