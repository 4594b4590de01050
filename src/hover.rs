//! The hover reconciliation rule shared by every renderer.
//!
//! A [`HoverState`] records at most one hovered [`ItemId`].
//! Entering an item always hovers it, but leaving an item only clears the state if that item is still the hovered one.
//! Browsers don't guarantee that `mouseleave` on one item arrives before `mouseenter` on its neighbour,
//! so a late leave must never clear a newer hover.

use core::fmt::{self, Display, Formatter};

/// Stable identifier of one list item: its index at construction time.
///
/// Identifiers are compared as integers. Their text form is only used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u32);
impl ItemId {
	#[must_use]
	pub const fn new(index: u32) -> Self {
		Self(index)
	}

	#[must_use]
	pub const fn index(self) -> u32 {
		self.0
	}
}
impl Display for ItemId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		Display::fmt(&self.0, f)
	}
}

/// A pointer event reported by one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverEvent {
	Enter(ItemId),
	Leave(ItemId),
}
impl HoverEvent {
	#[must_use]
	pub fn item(self) -> ItemId {
		match self {
			HoverEvent::Enter(id) | HoverEvent::Leave(id) => id,
		}
	}
}

/// The items whose highlight changed because of one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transition {
	/// The item that lost its highlight, if any.
	pub cleared: Option<ItemId>,
	/// The item that gained its highlight, if any.
	pub highlighted: Option<ItemId>,
}
impl Transition {
	/// Compares two snapshots.
	#[must_use]
	pub fn between(from: HoverState, to: HoverState) -> Self {
		if from == to {
			Self::default()
		} else {
			Self {
				cleared: from.hovered(),
				highlighted: to.hovered(),
			}
		}
	}

	#[must_use]
	pub fn is_noop(&self) -> bool {
		self.cleared.is_none() && self.highlighted.is_none()
	}

	/// At most two items, cleared one first.
	pub fn changed_items(&self) -> impl Iterator<Item = ItemId> {
		self.cleared.into_iter().chain(self.highlighted)
	}
}

/// Which item, if any, is currently hovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverState {
	hovered: Option<ItemId>,
}
impl HoverState {
	#[must_use]
	pub const fn new() -> Self {
		Self { hovered: None }
	}

	#[must_use]
	pub const fn hovered(self) -> Option<ItemId> {
		self.hovered
	}

	#[must_use]
	pub fn is_highlighted(self, id: ItemId) -> bool {
		self.hovered == Some(id)
	}

	pub fn enter(&mut self, id: ItemId) -> Transition {
		let before = *self;
		self.hovered = Some(id);
		Transition::between(before, *self)
	}

	/// No-op unless `id` is the hovered item.
	pub fn leave(&mut self, id: ItemId) -> Transition {
		if self.hovered == Some(id) {
			self.hovered = None;
			Transition {
				cleared: Some(id),
				highlighted: None,
			}
		} else {
			Transition::default()
		}
	}

	pub fn apply(&mut self, event: HoverEvent) -> Transition {
		match event {
			HoverEvent::Enter(id) => self.enter(id),
			HoverEvent::Leave(id) => self.leave(id),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn enter_hovers() {
		let mut state = HoverState::new();
		let transition = state.enter(ItemId::new(3));
		assert_eq!(state.hovered(), Some(ItemId::new(3)));
		assert_eq!(
			transition,
			Transition {
				cleared: None,
				highlighted: Some(ItemId::new(3))
			}
		);
	}

	#[test]
	fn enter_is_idempotent() {
		let mut state = HoverState::new();
		state.enter(ItemId::new(3));
		assert!(state.enter(ItemId::new(3)).is_noop());
		assert_eq!(state.hovered(), Some(ItemId::new(3)));
	}

	#[test]
	fn enter_moves_highlight() {
		let mut state = HoverState::new();
		state.enter(ItemId::new(3));
		let transition = state.enter(ItemId::new(7));
		assert_eq!(transition.changed_items().collect::<Vec<_>>(), [ItemId::new(3), ItemId::new(7)]);
	}

	#[test]
	fn enter_then_leave_clears() {
		let mut state = HoverState::new();
		state.enter(ItemId::new(0));
		let transition = state.leave(ItemId::new(0));
		assert_eq!(state.hovered(), None);
		assert_eq!(transition.changed_items().collect::<Vec<_>>(), [ItemId::new(0)]);
	}

	#[test]
	fn stale_leave_is_ignored() {
		let mut state = HoverState::new();
		state.enter(ItemId::new(3));
		state.enter(ItemId::new(7));
		assert!(state.leave(ItemId::new(3)).is_noop());
		assert_eq!(state.hovered(), Some(ItemId::new(7)));
	}

	#[test]
	fn leave_without_hover_is_ignored() {
		let mut state = HoverState::new();
		assert!(state.leave(ItemId::new(12)).is_noop());
		assert_eq!(state, HoverState::new());
	}

	#[test]
	fn between_snapshots() {
		let mut a = HoverState::new();
		a.enter(ItemId::new(1));
		let mut b = a;
		b.enter(ItemId::new(2));
		assert_eq!(
			Transition::between(a, b),
			Transition {
				cleared: Some(ItemId::new(1)),
				highlighted: Some(ItemId::new(2))
			}
		);
		assert!(Transition::between(b, b).is_noop());
	}

	#[test]
	fn events_name_their_item() {
		assert_eq!(HoverEvent::Enter(ItemId::new(4)).item(), ItemId::new(4));
		assert_eq!(HoverEvent::Leave(ItemId::new(9)).item(), ItemId::new(9));
	}

	#[test]
	fn id_text() {
		assert_eq!(ItemId::new(499).to_string(), "499");
	}
}
