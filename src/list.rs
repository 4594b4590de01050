use crate::hover::{HoverEvent, HoverState, ItemId, Transition};
use core::convert::TryInto;
use tracing::{instrument, trace, warn};

/// One entry of the list. Its label is the identifier's text form, computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
	pub id: ItemId,
	pub label: String,
}

/// Owns a fixed, ordered set of [`Item`]s and the single [`HoverState`] shared between them.
///
/// Items never hold state themselves. They report [`HoverEvent`]s upwards through [`HoverListView::dispatch`]
/// and get their highlight flag from [`HoverListView::is_highlighted`].
#[derive(Debug, Clone)]
pub struct HoverListView {
	items: Vec<Item>,
	state: HoverState,
}
impl HoverListView {
	/// Creates `len` items with identifiers `0..len`.
	#[must_use]
	pub fn new(len: u32) -> Self {
		Self {
			items: (0..len)
				.map(|index| {
					let id = ItemId::new(index);
					Item { id, label: id.to_string() }
				})
				.collect(),
			state: HoverState::new(),
		}
	}

	#[must_use]
	pub fn items(&self) -> &[Item] {
		&self.items
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.items.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	#[must_use]
	pub fn state(&self) -> HoverState {
		self.state
	}

	#[must_use]
	pub fn hovered(&self) -> Option<ItemId> {
		self.state.hovered()
	}

	#[must_use]
	pub fn contains(&self, id: ItemId) -> bool {
		id.index().try_into().map_or(false, |index: usize| index < self.items.len())
	}

	#[must_use]
	pub fn is_highlighted(&self, id: ItemId) -> bool {
		self.state.is_highlighted(id)
	}

	/// Yields zero or one identifier.
	pub fn highlighted_items(&self) -> impl Iterator<Item = ItemId> + '_ {
		self.items.iter().map(|item| item.id).filter(move |&id| self.state.is_highlighted(id))
	}

	pub fn on_enter(&mut self, id: ItemId) -> Transition {
		self.dispatch(HoverEvent::Enter(id))
	}

	pub fn on_leave(&mut self, id: ItemId) -> Transition {
		self.dispatch(HoverEvent::Leave(id))
	}

	/// Events for identifiers outside this list are ignored.
	#[instrument(skip(self))]
	pub fn dispatch(&mut self, event: HoverEvent) -> Transition {
		if !self.contains(event.item()) {
			warn!("Ignoring event for unknown item {} (list has {} item(s)).", event.item(), self.len());
			return Transition::default();
		}
		let transition = self.state.apply(event);
		trace!(?transition, hovered = ?self.state.hovered());
		transition
	}
}
