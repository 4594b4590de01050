//! Ties a [`HoverListView`], its per-item callbacks and a renderer to a DOM element.

use crate::{
	config::{ListConfig, Variant},
	diff::{DiffStats, DomDiffer},
	direct::DirectList,
	hover::{HoverEvent, HoverState, ItemId},
	list::HoverListView,
	view::{render_frame, ItemBindings, VdomMode},
};
use core::{
	cell::{Cell, RefCell},
	pin::Pin,
};
use lignin::{web::Event, CallbackRegistration};
use std::{
	rc::{Rc, Weak},
	sync::Once,
};
use tracing::{error, info, instrument, trace};
use wasm_bindgen::{prelude::wasm_bindgen, JsValue, UnwrapThrowExt};

/// Receiver of one item's callbacks. Pinned, since registrations point at it.
struct ItemSlot {
	id: ItemId,
	mount: Weak<MountInner>,
}
impl ItemSlot {
	fn on_enter(slot: *const Self, _: Event) {
		Self::report(slot, HoverEvent::Enter);
	}

	fn on_leave(slot: *const Self, _: Event) {
		Self::report(slot, HoverEvent::Leave);
	}

	fn report(slot: *const Self, event: fn(ItemId) -> HoverEvent) {
		//SAFETY: Registrations are dropped before the slots they point to.
		let slot = match unsafe { slot.as_ref() } {
			Some(slot) => slot,
			None => return error!("hover-list bug: Callback invoked without receiver."),
		};
		match slot.mount.upgrade() {
			Some(mount) => mount.dispatch(event(slot.id)),
			None => trace!("Ignoring event for item {} of a dropped list.", slot.id),
		}
	}
}

enum Renderer {
	Detached,
	Vdom {
		differ: DomDiffer,
		mode: VdomMode,
		/// What the DOM currently shows, or `None` before the first render.
		rendered: Option<HoverState>,
	},
	Direct {
		list: DirectList,
		rendered: HoverState,
	},
}

struct MountInner {
	config: ListConfig,
	highlight_style: String,
	renderer: RefCell<Renderer>,
	view: RefCell<HoverListView>,
	last_stats: Cell<DiffStats>,
	bindings: Vec<ItemBindings>,
	// Must drop before `slots`.
	registrations: Vec<[CallbackRegistration<ItemSlot, fn(Event)>; 2]>,
	slots: Vec<Pin<Box<ItemSlot>>>,
}
impl MountInner {
	/// Registers every item's callbacks. Nothing is rendered until a renderer is attached.
	fn new_detached(config: ListConfig) -> Rc<Self> {
		let view = HoverListView::new(config.item_count);
		Rc::new_cyclic(|weak: &Weak<MountInner>| {
			let slots: Vec<Pin<Box<ItemSlot>>> = view.items().iter().map(|item| Box::pin(ItemSlot { id: item.id, mount: weak.clone() })).collect();
			let registrations: Vec<[CallbackRegistration<ItemSlot, fn(Event)>; 2]> = slots
				.iter()
				.map(|slot| {
					[
						CallbackRegistration::<_, fn(Event)>::new(slot.as_ref(), ItemSlot::on_enter),
						CallbackRegistration::<_, fn(Event)>::new(slot.as_ref(), ItemSlot::on_leave),
					]
				})
				.collect();
			let bindings = registrations
				.iter()
				.map(|[enter, leave]| ItemBindings {
					enter: enter.to_ref_thread_bound(),
					leave: leave.to_ref_thread_bound(),
				})
				.collect();

			MountInner {
				highlight_style: config.highlight_style(),
				config,
				renderer: RefCell::new(Renderer::Detached),
				view: RefCell::new(view),
				last_stats: Cell::new(DiffStats::default()),
				bindings,
				registrations,
				slots,
			}
		})
	}

	/// Rendering doesn't dispatch events, so an event arriving during a render is a bug and throws.
	#[instrument(skip(self))]
	fn dispatch(&self, event: HoverEvent) {
		let transition = self
			.view
			.try_borrow_mut()
			.expect_throw("hover-list: Hover event received while the list was being rendered.")
			.dispatch(event);
		if transition.is_noop() {
			return trace!("No change.");
		}
		self.render();
	}

	/// Brings the DOM from the last rendered state to the current one.
	#[instrument(skip(self))]
	fn render(&self) {
		let mut renderer = self.renderer.try_borrow_mut().expect_throw("hover-list: Re-entrant render.");
		let view = self.view.borrow();
		let state = view.state();
		let depth_limit = self.config.depth_limit;

		let stats = match &mut *renderer {
			Renderer::Detached => return trace!("Not attached."),
			Renderer::Vdom { differ, mode, rendered } => {
				let mode = *mode;
				let stats = render_frame(&view, state, &self.bindings, mode, &self.highlight_style, |vdom_b| match *rendered {
					Some(previous) => render_frame(&view, previous, &self.bindings, mode, &self.highlight_style, |vdom_a| differ.update_child_nodes(vdom_a, vdom_b, depth_limit)),
					None => differ.update_child_nodes(&[], vdom_b, depth_limit),
				});
				*rendered = Some(state);
				stats
			}
			Renderer::Direct { list, rendered } => {
				let touched = list.apply(*rendered, state);
				*rendered = state;
				DiffStats {
					elements_changed: touched,
					..DiffStats::default()
				}
			}
		};
		info!(variant = self.config.variant.name(), hovered = ?state.hovered(), ?stats, "Rendered.");
		self.last_stats.set(stats);
	}
}
impl Drop for MountInner {
	fn drop(&mut self) {
		let view = self.view.get_mut();
		match self.renderer.get_mut() {
			Renderer::Vdom {
				differ,
				mode,
				rendered: Some(rendered),
			} => {
				let depth_limit = self.config.depth_limit;
				let stats = render_frame(view, *rendered, &self.bindings, *mode, &self.highlight_style, |vdom_a| differ.update_child_nodes(vdom_a, &[], depth_limit));
				trace!(?stats, "Cleared list.");
			}
			Renderer::Direct { list, .. } => list.unmount(),
			Renderer::Vdom { rendered: None, .. } | Renderer::Detached => (),
		}
		trace!("Dropping {} registration pair(s) and {} slot(s).", self.registrations.len(), self.slots.len());
	}
}

/// A mounted hover list. Dropping it removes the items from the DOM.
pub struct HoverListMount(Rc<MountInner>);
impl HoverListMount {
	/// Renders `config.item_count` items into `root`, which should be empty.
	///
	/// # Errors
	///
	/// Iff `config` is invalid or the DOM couldn't be set up.
	#[instrument(skip(config))]
	pub fn new(root: web_sys::Element, config: ListConfig) -> Result<Self, JsValue> {
		config.validate()?;
		let mount = Self(MountInner::new_detached(config));
		mount.attach(root)?;
		Ok(mount)
	}

	fn attach(&self, root: web_sys::Element) -> Result<(), JsValue> {
		let inner = &self.0;
		let renderer = match inner.config.variant {
			Variant::Plain => Renderer::Vdom {
				differ: DomDiffer::new_for_element_child_nodes(root),
				mode: VdomMode::Plain,
				rendered: None,
			},
			Variant::Memoized => Renderer::Vdom {
				differ: DomDiffer::new_for_element_child_nodes(root),
				mode: VdomMode::Memoized,
				rendered: None,
			},
			Variant::Direct => {
				let weak = Rc::downgrade(inner);
				let dispatch: Rc<dyn Fn(HoverEvent)> = Rc::new(move |event: HoverEvent| match weak.upgrade() {
					Some(inner) => inner.dispatch(event),
					None => trace!("Ignoring {:?} for a dropped list.", event),
				});
				let view = inner.view.borrow();
				Renderer::Direct {
					list: DirectList::mount(root, &view, inner.highlight_style.clone(), dispatch)?,
					rendered: view.state(),
				}
			}
		};
		*inner.renderer.borrow_mut() = renderer;
		inner.render();
		Ok(())
	}

	/// Applies `event` as if the item had reported it, then re-renders.
	pub fn dispatch(&self, event: HoverEvent) {
		self.0.dispatch(event);
	}

	#[must_use]
	pub fn state(&self) -> HoverState {
		self.0.view.borrow().state()
	}

	#[must_use]
	pub fn hovered(&self) -> Option<ItemId> {
		self.state().hovered()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.view.borrow().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.view.borrow().is_empty()
	}

	#[must_use]
	pub fn variant(&self) -> Variant {
		self.0.config.variant
	}

	/// Statistics of the most recent render.
	#[must_use]
	pub fn last_stats(&self) -> DiffStats {
		self.0.last_stats.get()
	}

	/// Distinct bound listener functions, for the VDOM variants.
	#[must_use]
	pub fn listener_count(&self) -> Option<usize> {
		match &*self.0.renderer.borrow() {
			Renderer::Vdom { differ, .. } => Some(differ.listener_count()),
			Renderer::Direct { .. } | Renderer::Detached => None,
		}
	}
}

/// A hover list for JavaScript hosts.
#[wasm_bindgen]
pub struct HoverList {
	mount: HoverListMount,
}
#[wasm_bindgen]
impl HoverList {
	/// `variant` is one of `"plain"`, `"memoized"` or `"direct"`. `item_count` defaults to 500.
	///
	/// # Errors
	///
	/// Iff `variant` or `item_count` is invalid or the DOM couldn't be set up.
	#[wasm_bindgen(constructor)]
	pub fn new(root: web_sys::Element, variant: &str, item_count: Option<u32>) -> Result<HoverList, JsValue> {
		let mut config = ListConfig::default().variant(variant.parse()?);
		if let Some(item_count) = item_count {
			config = config.item_count(item_count);
		}
		HoverListMount::new(root, config).map(|mount| Self { mount })
	}

	#[must_use]
	pub fn hovered(&self) -> Option<u32> {
		self.mount.hovered().map(ItemId::index)
	}

	pub fn enter(&self, id: u32) {
		self.mount.dispatch(HoverEvent::Enter(ItemId::new(id)));
	}

	pub fn leave(&self, id: u32) {
		self.mount.dispatch(HoverEvent::Leave(ItemId::new(id)));
	}

	/// Elements whose attributes or listeners changed during the last render.
	#[must_use]
	#[wasm_bindgen(js_name = updatedElements)]
	pub fn updated_elements(&self) -> usize {
		self.mount.last_stats().elements_changed
	}

	/// Elements the differ compared during the last render. Always 0 for `"direct"`.
	#[must_use]
	#[wasm_bindgen(js_name = diffedElements)]
	pub fn diffed_elements(&self) -> usize {
		self.mount.last_stats().elements_diffed
	}
}

/// Forwards `tracing` output to the browser console. Only the first call has an effect.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging() {
	static INIT: Once = Once::new();
	INIT.call_once(tracing_wasm::set_as_global_default);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn detached_list_tracks_hover() {
		let inner = MountInner::new_detached(ListConfig::default().item_count(5));
		inner.dispatch(HoverEvent::Enter(ItemId::new(3)));
		inner.dispatch(HoverEvent::Leave(ItemId::new(1)));
		assert_eq!(inner.view.borrow().hovered(), Some(ItemId::new(3)));
		assert_eq!(inner.last_stats.get(), DiffStats::default());
		assert_eq!(inner.bindings.len(), 5);
	}

	#[test]
	#[should_panic(expected = "while the list was being rendered")]
	fn event_during_render_throws() {
		let inner = MountInner::new_detached(ListConfig::default().item_count(5));
		let _rendering = inner.view.borrow();
		inner.dispatch(HoverEvent::Enter(ItemId::new(1)));
	}
}
