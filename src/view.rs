//! Renders a [`HoverListView`] snapshot as a [`lignin`] VDOM frame.
//!
//! Frames borrow from locals and are handed to a continuation instead of being returned.
//! Renderers keep the [`HoverState`] they last rendered and re-render that frame for the next diff.

use crate::{
	hover::{HoverState, ItemId},
	list::HoverListView,
};
use lignin::{web::Event, Attribute, CallbackRef, Element, ElementCreationOptions, EventBinding, EventBindingOptions, Node, ThreadBound};
use tracing::{instrument, trace};

/// Tag name of each item element, upper case as reported by `Element.tagName` for HTML.
pub const ITEM_TAG: &str = "DIV";
/// Carries the item identifier's text on each element.
pub const ITEM_ATTRIBUTE: &str = "data-item";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VdomMode {
	Plain,
	Memoized,
}

/// The stable callbacks of one item, registered once at mount time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemBindings {
	pub enter: CallbackRef<ThreadBound, fn(Event)>,
	pub leave: CallbackRef<ThreadBound, fn(Event)>,
}

/// Unique per identifier and highlight flag.
#[must_use]
pub fn memo_key(id: ItemId, highlighted: bool) -> u64 {
	(u64::from(id.index()) << 1) | u64::from(highlighted)
}

/// Renders one frame for `state` and passes it to `f`.
///
/// `bindings` must contain one entry per item, in item order.
#[instrument(skip(view, bindings, f))]
pub fn render_frame<R>(view: &HoverListView, state: HoverState, bindings: &[ItemBindings], mode: VdomMode, highlight_style: &str, f: impl FnOnce(&[Node<'_, ThreadBound>]) -> R) -> R {
	debug_assert_eq!(view.len(), bindings.len());

	let attributes: Vec<[Attribute<'_>; 2]> = view
		.items()
		.iter()
		.map(|item| {
			[
				Attribute { name: ITEM_ATTRIBUTE, value: &item.label },
				Attribute { name: "style", value: highlight_style },
			]
		})
		.collect();

	let event_bindings: Vec<[EventBinding<'_, ThreadBound>; 2]> = bindings
		.iter()
		.map(|bindings| {
			[
				EventBinding {
					name: "mouseenter",
					callback: bindings.enter,
					options: EventBindingOptions::new(),
				},
				EventBinding {
					name: "mouseleave",
					callback: bindings.leave,
					options: EventBindingOptions::new(),
				},
			]
		})
		.collect();

	let elements: Vec<Element<'_, ThreadBound>> = view
		.items()
		.iter()
		.zip(&attributes)
		.zip(&event_bindings)
		.map(|((item, attributes), event_bindings)| Element {
			name: ITEM_TAG,
			creation_options: ElementCreationOptions::new(),
			attributes: if state.is_highlighted(item.id) { &attributes[..] } else { &attributes[..1] },
			content: Node::Text { text: &item.label, dom_binding: None },
			event_bindings: &event_bindings[..],
		})
		.collect();

	let element_nodes: Vec<Node<'_, ThreadBound>> = elements.iter().map(|element| Node::HtmlElement { element, dom_binding: None }).collect();

	let memoized;
	let nodes: &[Node<'_, ThreadBound>] = match mode {
		VdomMode::Plain => &element_nodes,
		VdomMode::Memoized => {
			memoized = element_nodes
				.iter()
				.zip(view.items())
				.map(|(content, item)| Node::Memoized {
					state_key: memo_key(item.id, state.is_highlighted(item.id)),
					content,
				})
				.collect::<Vec<_>>();
			&memoized
		}
	};
	trace!("Rendered {} item(s).", nodes.len());
	f(nodes)
}
