//! The list without VDOM: elements are created once and only the items named by a [`Transition`] are restyled.

use crate::{
	hover::{HoverEvent, HoverState, ItemId, Transition},
	list::HoverListView,
	view::{ITEM_ATTRIBUTE, ITEM_TAG},
};
use core::{convert::TryInto, fmt::Debug};
use std::rc::Rc;
use tracing::{error, instrument, trace, trace_span};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

struct ItemNode {
	element: web_sys::HtmlElement,
	enter: Closure<dyn Fn()>,
	leave: Closure<dyn Fn()>,
}

pub struct DirectList {
	root: web_sys::Element,
	items: Vec<ItemNode>,
	highlight_style: String,
}
impl Debug for DirectList {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("DirectList").field("root", &self.root).field("items.len()", &self.items.len()).field("highlight_style", &self.highlight_style).finish()
	}
}
impl DirectList {
	/// Appends one element per item to `root` and attaches `mouseenter`/`mouseleave` listeners that call `dispatch`.
	///
	/// # Errors
	///
	/// Iff `root` has no owner document or an element can't be created, appended or bound.
	/// Elements created up to that point are removed again.
	#[instrument(skip(view, dispatch))]
	pub fn mount(root: web_sys::Element, view: &HoverListView, highlight_style: String, dispatch: Rc<dyn Fn(HoverEvent)>) -> Result<Self, JsValue> {
		let document = root.owner_document().ok_or_else(|| JsValue::from_str("hover-list: No owner document found for root element."))?;
		let mut list = Self {
			root,
			items: Vec::with_capacity(view.len()),
			highlight_style,
		};

		for item in view.items() {
			let span = trace_span!("Creating item", id = item.id.index());
			let _enter = span.enter();

			let element = document.create_element(ITEM_TAG)?.dyn_into::<web_sys::HtmlElement>()?;
			element.set_attribute(ITEM_ATTRIBUTE, &item.label)?;
			element.set_text_content(Some(&item.label));

			let id = item.id;
			let enter = {
				let dispatch = Rc::clone(&dispatch);
				Closure::wrap(Box::new(move || dispatch(HoverEvent::Enter(id))) as Box<dyn Fn()>)
			};
			let leave = {
				let dispatch = Rc::clone(&dispatch);
				Closure::wrap(Box::new(move || dispatch(HoverEvent::Leave(id))) as Box<dyn Fn()>)
			};
			element.add_event_listener_with_callback("mouseenter", enter.as_ref().unchecked_ref())?;
			element.add_event_listener_with_callback("mouseleave", leave.as_ref().unchecked_ref())?;

			list.root.append_child(&element)?;
			list.items.push(ItemNode { element, enter, leave });
		}

		let initial = Transition::between(HoverState::new(), view.state());
		list.restyle(initial, view.state());
		Ok(list)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.items.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Restyles the items that differ between `from` and `to`. Returns how many elements were touched.
	#[instrument(skip(self))]
	pub fn apply(&mut self, from: HoverState, to: HoverState) -> usize {
		self.restyle(Transition::between(from, to), to)
	}

	fn restyle(&self, transition: Transition, state: HoverState) -> usize {
		let mut touched = 0;
		for id in transition.changed_items() {
			let item = match self.item(id) {
				Some(item) => item,
				None => {
					error!("No element for item {}. Skipping.", id);
					continue;
				}
			};
			let result = if state.is_highlighted(id) {
				item.element.set_attribute("style", &self.highlight_style)
			} else {
				item.element.remove_attribute("style")
			};
			match result {
				Ok(()) => touched += 1,
				Err(error) => error!("Failed to restyle item {}: {:?}", id, error),
			}
		}
		trace!("Touched {} element(s).", touched);
		touched
	}

	fn item(&self, id: ItemId) -> Option<&ItemNode> {
		self.items.get(TryInto::<usize>::try_into(id.index()).ok()?)
	}

	/// Removes listeners and elements. Idempotent.
	#[instrument(skip(self))]
	pub fn unmount(&mut self) {
		for ItemNode { element, enter, leave } in self.items.drain(..) {
			let remove_listener = |name: &str, closure: &Closure<dyn Fn()>| {
				if let Err(error) = element.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref()) {
					error!("Failed to remove event listener {:?}: {:?}", name, error);
				}
			};
			remove_listener("mouseenter", &enter);
			remove_listener("mouseleave", &leave);
			element.remove();
		}
	}
}
impl Drop for DirectList {
	fn drop(&mut self) {
		self.unmount();
	}
}
