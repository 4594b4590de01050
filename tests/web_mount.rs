#![cfg(target_arch = "wasm32")]

use core::cell::RefCell;
use hover_list::{
	diff::DomDiffer,
	direct::DirectList,
	lignin::{web::Event, CallbackRegistration},
	view::{render_frame, ItemBindings, VdomMode},
	HoverEvent, HoverList, HoverListMount, HoverListView, ItemId, ListConfig, Variant,
};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, Element, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

const VARIANTS: [Variant; 3] = [Variant::Plain, Variant::Memoized, Variant::Direct];

fn root() -> Element {
	hover_list::init_logging();
	let document = window().unwrap().document().unwrap();
	let root = document.create_element("div").unwrap();
	document.body().unwrap().append_child(&root).unwrap();
	root
}

fn mount(root: &Element, variant: Variant) -> HoverListMount {
	HoverListMount::new(root.clone(), ListConfig::default().variant(variant)).unwrap()
}

fn item(root: &Element, index: u32) -> HtmlElement {
	root.children().item(index).unwrap().dyn_into().unwrap()
}

fn highlighted(root: &Element) -> Vec<u32> {
	(0..root.children().length()).filter(|&i| item(root, i).has_attribute("style")).collect()
}

fn pointer(root: &Element, index: u32, kind: &str) {
	item(root, index).dispatch_event(&web_sys::Event::new(kind).unwrap()).unwrap();
}

#[wasm_bindgen_test]
fn mounts_500_items() {
	for &variant in &VARIANTS {
		let root = root();
		let mount = mount(&root, variant);

		assert_eq!(mount.len(), 500);
		assert_eq!(root.children().length(), 500);
		let item = item(&root, 42);
		assert_eq!(item.tag_name(), "DIV");
		assert_eq!(item.text_content().as_deref(), Some("42"));
		assert_eq!(item.get_attribute("data-item").as_deref(), Some("42"));
		assert!(highlighted(&root).is_empty());
		root.remove();
	}
}

#[wasm_bindgen_test]
fn pointer_events_toggle_highlight() {
	for &variant in &VARIANTS {
		let root = root();
		let mount = mount(&root, variant);

		pointer(&root, 0, "mouseenter");
		assert_eq!(mount.hovered(), Some(ItemId::new(0)));
		assert_eq!(highlighted(&root), [0]);
		assert_eq!(item(&root, 0).get_attribute("style").as_deref(), Some("background-color: lightblue"));

		pointer(&root, 0, "mouseleave");
		assert_eq!(mount.hovered(), None);
		assert!(highlighted(&root).is_empty(), "{:?}", variant);
		root.remove();
	}
}

#[wasm_bindgen_test]
fn late_leave_keeps_newer_hover() {
	for &variant in &VARIANTS {
		let root = root();
		let mount = mount(&root, variant);

		pointer(&root, 3, "mouseenter");
		pointer(&root, 7, "mouseenter");
		pointer(&root, 3, "mouseleave");
		assert_eq!(mount.hovered(), Some(ItemId::new(7)));
		assert_eq!(highlighted(&root), [7], "{:?}", variant);
		root.remove();
	}
}

#[wasm_bindgen_test]
fn leave_without_hover_changes_nothing() {
	for &variant in &VARIANTS {
		let root = root();
		let mount = mount(&root, variant);
		let initial = mount.last_stats();

		pointer(&root, 12, "mouseleave");
		assert_eq!(mount.hovered(), None);
		assert_eq!(mount.last_stats(), initial);
		root.remove();
	}
}

#[wasm_bindgen_test]
fn memoized_diffs_only_changed_items() {
	let root = root();
	let mount = mount(&root, Variant::Memoized);
	assert_eq!(mount.last_stats().elements_created, 500);

	mount.dispatch(HoverEvent::Enter(ItemId::new(3)));
	let stats = mount.last_stats();
	assert_eq!((stats.elements_diffed, stats.elements_changed, stats.memoized_skipped), (1, 1, 499));

	mount.dispatch(HoverEvent::Enter(ItemId::new(7)));
	let stats = mount.last_stats();
	assert_eq!((stats.elements_diffed, stats.elements_changed, stats.memoized_skipped), (2, 2, 498));
	assert_eq!((stats.listeners_added, stats.listeners_removed), (0, 0));
	assert_eq!(highlighted(&root), [7]);
	root.remove();
}

#[wasm_bindgen_test]
fn plain_diffs_every_item() {
	let root = root();
	let mount = mount(&root, Variant::Plain);

	mount.dispatch(HoverEvent::Enter(ItemId::new(3)));
	let stats = mount.last_stats();
	assert_eq!((stats.elements_diffed, stats.elements_changed, stats.memoized_skipped), (500, 1, 0));

	mount.dispatch(HoverEvent::Enter(ItemId::new(4)));
	let stats = mount.last_stats();
	assert_eq!((stats.elements_diffed, stats.elements_changed), (500, 2));
	assert_eq!(highlighted(&root), [4]);
	root.remove();
}

#[wasm_bindgen_test]
fn direct_touches_at_most_two_items() {
	let root = root();
	let mount = mount(&root, Variant::Direct);

	mount.dispatch(HoverEvent::Enter(ItemId::new(3)));
	assert_eq!(mount.last_stats().elements_changed, 1);
	mount.dispatch(HoverEvent::Enter(ItemId::new(250)));
	assert_eq!(mount.last_stats().elements_changed, 2);
	assert_eq!(mount.last_stats().elements_diffed, 0);
	mount.dispatch(HoverEvent::Leave(ItemId::new(250)));
	assert_eq!(mount.last_stats().elements_changed, 1);
	assert!(highlighted(&root).is_empty());
	root.remove();
}

#[wasm_bindgen_test]
fn listeners_are_shared_per_callback() {
	let root = root();
	let mount = mount(&root, Variant::Plain);
	assert_eq!(mount.listener_count(), Some(1000));

	mount.dispatch(HoverEvent::Enter(ItemId::new(1)));
	assert_eq!(mount.listener_count(), Some(1000));
	root.remove();
}

#[wasm_bindgen_test]
fn dropping_clears_the_list() {
	for &variant in &VARIANTS {
		let root = root();
		let mount = mount(&root, variant);
		pointer(&root, 10, "mouseenter");

		drop(mount);
		assert_eq!(root.children().length(), 0, "{:?}", variant);
		root.remove();
	}
}

#[wasm_bindgen_test]
fn clearing_a_frame_frees_every_listener() {
	let root = root();
	let receiver = Box::pin(());
	let registrations: Vec<[CallbackRegistration<(), fn(Event)>; 2]> = (0..500)
		.map(|_| [CallbackRegistration::<_, fn(Event)>::new(receiver.as_ref(), |_, _| ()), CallbackRegistration::<_, fn(Event)>::new(receiver.as_ref(), |_, _| ())])
		.collect();
	let bindings: Vec<ItemBindings> = registrations
		.iter()
		.map(|[enter, leave]| ItemBindings {
			enter: enter.to_ref_thread_bound(),
			leave: leave.to_ref_thread_bound(),
		})
		.collect();
	let mut view = HoverListView::new(500);
	view.on_enter(ItemId::new(20));

	for &mode in &[VdomMode::Plain, VdomMode::Memoized] {
		let mut differ = DomDiffer::new_for_element_child_nodes(root.clone());
		render_frame(&view, view.state(), &bindings, mode, "background-color: red", |vdom| {
			let created = differ.update_child_nodes(&[], vdom, 8);
			assert_eq!((created.elements_created, created.listeners_added), (500, 1000));
			assert_eq!(differ.listener_count(), 1000);
			assert_eq!(differ.element().children().length(), 500);

			let cleared = differ.update_child_nodes(vdom, &[], 8);
			assert_eq!((cleared.elements_removed, cleared.listeners_removed), (500, 1000), "{:?}", mode);
		});
		assert_eq!(differ.listener_count(), 0, "{:?}", mode);
		assert_eq!(differ.element().child_nodes().length(), 0);
	}
	root.remove();
}

#[wasm_bindgen_test]
fn unmounted_direct_items_stop_reporting() {
	let root = root();
	let events = Rc::new(RefCell::new(Vec::new()));
	let dispatch: Rc<dyn Fn(HoverEvent)> = {
		let events = Rc::clone(&events);
		Rc::new(move |event: HoverEvent| events.borrow_mut().push(event))
	};
	let view = HoverListView::new(5);
	let list = DirectList::mount(root.clone(), &view, "background-color: red".to_owned(), Rc::clone(&dispatch)).unwrap();
	let retained = item(&root, 2);

	retained.dispatch_event(&web_sys::Event::new("mouseenter").unwrap()).unwrap();
	assert_eq!(*events.borrow(), [HoverEvent::Enter(ItemId::new(2))]);

	drop(list);
	assert_eq!(root.children().length(), 0);
	assert_eq!(Rc::strong_count(&dispatch), 1);
	retained.dispatch_event(&web_sys::Event::new("mouseenter").unwrap()).unwrap();
	retained.dispatch_event(&web_sys::Event::new("mouseleave").unwrap()).unwrap();
	assert_eq!(events.borrow().len(), 1);
	root.remove();
}

#[wasm_bindgen_test]
fn unknown_items_from_javascript_are_ignored() {
	let root = root();
	let list = HoverList::new(root.clone(), "memoized", Some(5)).unwrap();
	list.enter(2);
	list.enter(99);
	assert_eq!(list.hovered(), Some(2));
	assert_eq!(highlighted(&root), [2]);
	drop(list);
	root.remove();
}

#[wasm_bindgen_test]
fn javascript_export() {
	let root = root();
	assert!(HoverList::new(root.clone(), "memo", None).is_err());
	assert!(HoverList::new(root.clone(), "plain", Some(0)).is_err());
	assert_eq!(root.children().length(), 0);

	let list = HoverList::new(root.clone(), "Direct", Some(10)).unwrap();
	assert_eq!(root.children().length(), 10);
	list.enter(4);
	assert_eq!(list.hovered(), Some(4));
	assert_eq!(list.updated_elements(), 1);
	list.leave(3);
	assert_eq!(list.hovered(), Some(4));
	list.leave(4);
	assert_eq!(list.hovered(), None);

	drop(list);
	assert_eq!(root.children().length(), 0);
	root.remove();
}
