use crate::rc_hash_map::{CountSaturatedError, RcHashMap};
use core::{convert::TryInto, mem, slice};
use hashbrown::HashSet;
use js_sys::Function;
use lignin::{CallbackRef, EventBinding, Node, ThreadBound};
use tracing::{error, info, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};
use wasm_bindgen::{closure::Closure, throw_str, JsCast, JsValue, UnwrapThrowExt};

type EventCallbackRef = CallbackRef<ThreadBound, fn(lignin::web::Event)>;

/// What one [`DomDiffer::update_child_nodes`] call did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiffStats {
	pub elements_created: usize,
	/// Elements compared against their previous VDOM, whether or not anything changed.
	pub elements_diffed: usize,
	/// Diffed elements whose attributes or event listeners were modified.
	pub elements_changed: usize,
	pub elements_removed: usize,
	/// Memoized nodes whose state key matched, so their content wasn't visited.
	pub memoized_skipped: usize,
	pub listeners_added: usize,
	/// Includes the listeners of removed elements.
	pub listeners_removed: usize,
}

/// Attached to a specific [`web_sys::Element`] during instantiation, this `struct` can be used to update its [***childNodes***](https://developer.mozilla.org/en-US/docs/Web/API/Node/childNodes).
///
/// Only HTML elements, text, memoized and multi nodes are rendered. Other node kinds are logged and skipped,
/// and DOM bindings are ignored.
///
/// # Correct Use
///
/// `vdom_a` must be exactly what was last passed as `vdom_b`, or `&[]` for the first update.
/// Mismatches are repaired where possible and logged as errors.
///
/// Event listeners start throwing into [***JavaScript***](https://developer.mozilla.org/en-US/docs/Web/JavaScript)
/// once the instance is dropped, so clear the child nodes before that.
#[allow(clippy::type_complexity)]
#[derive(Debug)]
pub struct DomDiffer {
	handler_handles: RcHashMap<EventCallbackRef, u16, Function>,
	common_handler: Closure<dyn Fn(JsValue, web_sys::Event)>,
	element: web_sys::Element,
	event_listener_options_cache: [Option<web_sys::AddEventListenerOptions>; 8],
	stats: DiffStats,
}
impl DomDiffer {
	#[must_use]
	#[instrument]
	pub fn new_for_element_child_nodes(element: web_sys::Element) -> Self {
		Self {
			handler_handles: RcHashMap::new(),
			common_handler: Closure::wrap(Box::new(move |callback_ref: JsValue, event: web_sys::Event| {
				let span = trace_span!("common_handler", callback_ref = ?&callback_ref, event = ?&event);
				let _enter = span.enter();

				let callback_ref = unsafe { EventCallbackRef::from_js(&callback_ref) };
				let callback_ref = if cfg!(debug_assertions) {
					callback_ref.unwrap_or_else(move || panic!("hover-list bug: Invalid `CallbackRef` {:?}", callback_ref))
				} else {
					callback_ref.expect_throw("hover-list bug: Invalid `CallbackRef`. Compile with debug assertions to see the value.")
				};

				#[allow(clippy::non_ascii_literal)]
				let span = trace_span!("callback_ref.call(…)");
				let _enter = span.enter();
				callback_ref.call(event.into());
			})),
			element,
			event_listener_options_cache: [None, None, None, None, None, None, None, None],
			stats: DiffStats::default(),
		}
	}

	#[must_use]
	pub fn element(&self) -> &web_sys::Element {
		&self.element
	}

	/// Distinct callbacks that currently have a bound listener function.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.handler_handles.len()
	}

	#[instrument(skip(common_handler, handler_handles))]
	fn get_or_create_listener<'a>(common_handler: &Closure<dyn Fn(JsValue, web_sys::Event)>, handler_handles: &'a mut RcHashMap<EventCallbackRef, u16, Function>, callback_ref: EventCallbackRef) -> &'a Function {
		handler_handles
			.increment_or_insert_with(callback_ref, |callback_ref| common_handler.as_ref().unchecked_ref::<Function>().bind1(&JsValue::UNDEFINED, &callback_ref.into_js()))
			.expect_throw("Too many (more than 65k) active references to the same `CallbackRef`")
	}

	#[instrument(skip(event_listener_options_cache))]
	fn get_cached_add_event_listener_options(event_listener_options_cache: &mut [Option<web_sys::AddEventListenerOptions>; 8], options: lignin::EventBindingOptions) -> &web_sys::AddEventListenerOptions {
		let entry = event_listener_options_cache
			.get_mut(usize::from(options.capture()) + usize::from(options.once()) * 2 + usize::from(options.passive()) * 4)
			.unwrap_throw();

		if entry.is_none() {
			let mut web_options = web_sys::AddEventListenerOptions::new();
			web_options.capture(options.capture()).once(options.once()).passive(options.passive());
			*entry = Some(web_options);
		}

		entry.as_ref().unwrap_throw()
	}

	/// Applies the difference between `vdom_a` and `vdom_b` to the attached element's child nodes.
	///
	/// See [Correct Use](`DomDiffer`#correct-use).
	#[instrument(skip(self, vdom_a, vdom_b))]
	pub fn update_child_nodes(&mut self, vdom_a: &[Node<'_, ThreadBound>], vdom_b: &[Node<'_, ThreadBound>], depth_limit: usize) -> DiffStats {
		let element = self.element.clone();
		let child_nodes = self.element.child_nodes();
		let owner_document = self.element.owner_document().expect_throw("hover-list: No owner document found for root element.");
		let mut i = 0;
		self.diff_splice_node_list(&owner_document, vdom_a, vdom_b, &element, &child_nodes, &mut i, depth_limit);

		{
			let drain = self.handler_handles.drain_weak();
			trace!("Freed {} event listener function(s).", drain.count());
		}

		let stats = mem::take(&mut self.stats);
		info!(?stats, "Diff complete.");
		info!("Event listener function count/cached capacity: {}/{}", self.handler_handles.len(), self.handler_handles.capacity());
		if STATIC_MAX_LEVEL >= Level::WARN && stats.elements_diffed > 0 && stats.elements_changed * 10 < stats.elements_diffed {
			warn!(
				"Diffed {} element(s) to change {}.\n\
				Consider memoizing content that rarely changes.",
				stats.elements_diffed, stats.elements_changed
			);
		}
		stats
	}

	/// If `vdom_b` is empty, `next_sibling` is guaranteed unused.
	#[allow(clippy::too_many_arguments)]
	#[allow(clippy::too_many_lines)]
	#[instrument(skip(self, document, vdom_a, vdom_b, parent_element, dom_slice))]
	fn diff_splice_node_list(
		&mut self,
		document: &web_sys::Document,
		mut vdom_a: &[Node<'_, ThreadBound>],
		mut vdom_b: &[Node<'_, ThreadBound>],
		parent_element: &web_sys::Element,
		dom_slice: &web_sys::NodeList,
		i: &mut u32,
		depth_limit: usize,
	) {
		if depth_limit == 0 {
			return error!("Depth limit reached");
		}

		while !vdom_a.is_empty() && !vdom_b.is_empty() {
			*i += match (vdom_a[0], vdom_b[0]) {
				(Node::HtmlElement { element: e_1, .. }, Node::HtmlElement { element: e_2, .. }) if e_1.name == e_2.name && e_1.creation_options == e_2.creation_options => {
					let span = trace_span!("Diffing HTML element", tag = e_1.name);
					let _enter = span.enter();
					let node = match dom_slice.get(*i) {
						Some(node) => node,
						None => {
							error!("Expected <{}> beyond end of `web_sys::NodeList`. Switching to insertions.", e_1.name);
							self.discard_further_missing(vdom_a, depth_limit);
							return self.diff_splice_node_list(document, &[], vdom_b, parent_element, dom_slice, i, depth_limit);
						}
					};

					match node.dyn_ref::<web_sys::HtmlElement>() {
						Some(html_element) if html_element.tag_name() == e_1.name => {
							self.stats.elements_diffed += 1;
							if self.update_element(document, e_1, e_2, html_element, depth_limit) {
								self.stats.elements_changed += 1;
							}
							1
						}
						_ => {
							error!("Expected to update <{}> but found {:?}; Recreating the element.", e_1.name, node);
							self.replace(document, vdom_a[0], vdom_b[0], parent_element, dom_slice, i, depth_limit);
							0
						}
					}
				}

				(Node::Text { text: t_1, .. }, Node::Text { text: t_2, .. }) => {
					let span = if cfg!(feature = "dangerous-logging") {
						trace_span!("Diffing text node", t_1, t_2)
					} else {
						trace_span!("Diffing text node")
					};
					let _enter = span.enter();
					let node = match dom_slice.get(*i) {
						Some(node) => node,
						None => {
							error!("Expected text beyond end of `web_sys::NodeList`. Switching to insertions.");
							self.discard_further_missing(vdom_a, depth_limit);
							return self.diff_splice_node_list(document, &[], vdom_b, parent_element, dom_slice, i, depth_limit);
						}
					};

					match node.dyn_ref::<web_sys::Text>() {
						Some(text) => {
							if text.data() != t_1 {
								error!("Unexpected text data. Overwriting.");
								text.set_data(t_2);
							} else if t_1 != t_2 {
								text.set_data(t_2);
							}
							1
						}
						None => {
							error!("Expected to update `web_sys::Text` but found {:?}; Recreating the node.", node);
							self.replace(document, vdom_a[0], vdom_b[0], parent_element, dom_slice, i, depth_limit);
							0
						}
					}
				}

				(Node::Memoized { state_key: sk_1, content: c_1 }, Node::Memoized { state_key: sk_2, content: c_2 }) => {
					let span = trace_span!("Diffing memoized", sk_1, sk_2);
					let _enter = span.enter();
					if sk_1 == sk_2 {
						self.stats.memoized_skipped += 1;
						let dom_len: u32 = c_2.dom_len().try_into().unwrap_throw();
						trace!("State keys matched. Advancing past {} DOM node(s).", dom_len);
						dom_len
					} else {
						self.diff_splice_node_list(document, slice::from_ref(c_1), slice::from_ref(c_2), parent_element, dom_slice, i, depth_limit - 1);
						0
					}
				}

				(Node::Multi(n_1), Node::Multi(n_2)) => {
					let span = trace_span!("Diffing multi", "n_1.len()" = n_1.len(), "n_2.len()" = n_2.len());
					let _enter = span.enter();
					// Skip `depth_limit` check one level down if there are no items at all.
					if !n_1.is_empty() || !n_2.is_empty() {
						self.diff_splice_node_list(document, n_1, n_2, parent_element, dom_slice, i, depth_limit - 1);
					}
					0
				}

				// Mismatching nodes: Destroy and rebuild.
				(n_1, n_2) => {
					let span = trace_span!("Replace mismatching");
					let _enter = span.enter();
					if STATIC_MAX_LEVEL >= Level::WARN {
						if let (Node::HtmlElement { element: e_1, .. }, Node::HtmlElement { element: e_2, .. }) = (n_1, n_2) {
							if e_1.name.eq_ignore_ascii_case(e_2.name) {
								warn!("Recreating element due to different tag name casing: {:?} -> {:?}", e_1.name, e_2.name);
							}
						}
					}
					self.replace(document, n_1, n_2, parent_element, dom_slice, i, depth_limit);
					0
				}
			};

			vdom_a = &vdom_a[1..];
			vdom_b = &vdom_b[1..];
		}

		for (index, removed_node) in vdom_a.iter().enumerate() {
			match *removed_node {
				Node::HtmlElement { element, .. } => {
					let span = trace_span!("Removing HTML element", tag = element.name);
					let _enter = span.enter();
					self.decrement_handlers(removed_node, depth_limit);
					let node = match dom_slice.get(*i) {
						Some(node) => node,
						None => {
							error!("Expected to remove <{}> beyond end of `web_sys::NodeList`. Skipping further deletions here.", element.name);
							self.discard_further_missing(&vdom_a[index + 1..], depth_limit);
							break;
						}
					};

					match node.dyn_ref::<web_sys::HtmlElement>() {
						Some(html_element) if html_element.tag_name() == element.name => html_element.remove(),
						_ => {
							error!("Expected to remove <{}> but found {:?}; Removing the node anyway.", element.name, node);
							remove_node(&node);
						}
					}
					self.stats.elements_removed += 1;
				}

				Node::Text { .. } => {
					let span = trace_span!("Removing text node");
					let _enter = span.enter();
					let node = match dom_slice.get(*i) {
						Some(node) => node,
						None => {
							error!("Expected to remove text beyond end of `web_sys::NodeList`. Skipping further deletions here.");
							self.discard_further_missing(&vdom_a[index + 1..], depth_limit);
							break;
						}
					};

					match node.dyn_ref::<web_sys::Text>() {
						Some(text) => text.remove(),
						None => {
							error!("Expected to remove `web_sys::Text` but found {:?}; Removing the node anyway.", node);
							remove_node(&node);
						}
					}
				}

				Node::Memoized { state_key, content } => {
					let span = trace_span!("Removing memoized", state_key);
					let _enter = span.enter();
					self.diff_splice_node_list(document, slice::from_ref(content), &[], parent_element, dom_slice, i, depth_limit - 1);
				}

				Node::Multi(nodes) => {
					let span = trace_span!("Removing multi", "nodes.len()" = nodes.len());
					let _enter = span.enter();
					// May skip `depth_limit` check one level down.
					if !nodes.is_empty() {
						self.diff_splice_node_list(document, nodes, &[], parent_element, dom_slice, i, depth_limit - 1);
					}
				}

				ref unsupported => error!("Can't remove unsupported node {:?}. Skipping.", unsupported),
			}
		}

		let next_sibling = dom_slice.get(*i);
		let next_sibling = next_sibling.as_ref();
		for new_node in vdom_b {
			*i += match *new_node {
				Node::HtmlElement { element, .. } => {
					let &lignin::Element { name, creation_options, .. } = element;
					let span = trace_span!("Creating HTML element", name, ?creation_options);
					let _enter = span.enter();

					let dom_element = match match creation_options.is() {
						// This isn't entirely modern, but is well-supported.
						Some(is) => document.create_element_with_str(name, is),
						None => document.create_element(name),
					} {
						Ok(element) => element,
						Err(error) => {
							error!("Failed to create HTML element: {:?}", error);
							continue;
						}
					};
					let dom_element = match dom_element.dyn_into::<web_sys::HtmlElement>() {
						Ok(html_element) => html_element,
						Err(other) => {
							error!("Created <{}> is not a `web_sys::HtmlElement`: {:?}", name, other);
							continue;
						}
					};

					if let Err(error) = parent_element.insert_before(dom_element.as_ref(), next_sibling) {
						error!("Failed to insert HTML element: {:?}", error);
						continue;
					}

					self.update_element(
						document,
						&lignin::Element {
							name,
							creation_options,
							attributes: &[],
							content: Node::Multi(&[]),
							event_bindings: &[],
						},
						element,
						&dom_element,
						depth_limit,
					);
					self.stats.elements_created += 1;
					1
				}

				Node::Text { text, .. } => {
					let span = if cfg!(feature = "dangerous-logging") { trace_span!("Creating text node", text) } else { trace_span!("Creating text node") };
					let _enter = span.enter();
					let dom_text = document.create_text_node(text);
					if let Err(error) = parent_element.insert_before(dom_text.as_ref(), next_sibling) {
						error!("Failed to insert text node: {:?}", error);
						continue;
					}
					1
				}

				Node::Memoized { state_key, content } => {
					let span = trace_span!("Creating memoized", state_key);
					let _enter = span.enter();
					self.diff_splice_node_list(document, &[], slice::from_ref(content), parent_element, dom_slice, i, depth_limit - 1);
					0
				}

				Node::Multi(nodes) => {
					let span = trace_span!("Creating multi", "nodes.len()" = nodes.len());
					let _enter = span.enter();
					if !nodes.is_empty() {
						self.diff_splice_node_list(document, &[], nodes, parent_element, dom_slice, i, depth_limit - 1);
					}
					0
				}

				ref unsupported => {
					error!("Can't create unsupported node {:?}. Skipping.", unsupported);
					0
				}
			}
		}
	}

	#[allow(clippy::too_many_arguments)]
	fn replace(&mut self, document: &web_sys::Document, n_1: Node<'_, ThreadBound>, n_2: Node<'_, ThreadBound>, parent_element: &web_sys::Element, dom_slice: &web_sys::NodeList, i: &mut u32, depth_limit: usize) {
		self.diff_splice_node_list(document, slice::from_ref(&n_1), &[], parent_element, dom_slice, i, depth_limit);
		self.diff_splice_node_list(document, &[], slice::from_ref(&n_2), parent_element, dom_slice, i, depth_limit);
	}

	/// Releases the listener handles of VDOM nodes whose DOM counterparts went missing.
	#[instrument(skip(self, vdom_a))]
	fn discard_further_missing(&mut self, vdom_a: &[Node<'_, ThreadBound>], depth_limit: usize) {
		if !vdom_a.is_empty() {
			warn!("Discarding {} VDOM node(s) without DOM counterpart.", vdom_a.len());
		}
		for node in vdom_a {
			self.decrement_handlers(node, depth_limit);
		}
	}

	// Decrements the reference count for each event handler by 1 per reference in `node`.
	#[instrument(skip(self, node))]
	fn decrement_handlers(&mut self, node: &Node<'_, ThreadBound>, depth_limit: usize) {
		if depth_limit == 0 {
			return error!("Depth limit reached");
		}

		match *node {
			Node::HtmlElement { element, .. } => {
				for lignin::EventBinding { callback, .. } in element.event_bindings {
					match self.handler_handles.weak_decrement(callback) {
						Ok(Some(_)) => self.stats.listeners_removed += 1,
						Ok(None) => throw_str("Tried to decrement event binding that doesn't exist"),
						Err(CountSaturatedError) => throw_str("Tried to decrement handler reference more often than bound"),
					}
				}
				self.decrement_handlers(&element.content, depth_limit - 1);
			}
			Node::Memoized { content, .. } => self.decrement_handlers(content, depth_limit - 1),
			Node::Multi(nodes) => {
				for node in nodes {
					self.decrement_handlers(node, depth_limit - 1);
				}
			}
			_ => (),
		}
	}

	/// Returns whether attributes or event listeners were modified.
	#[allow(clippy::items_after_statements)]
	#[allow(clippy::similar_names)]
	#[instrument(skip(self, document, c_1, c_2, element))]
	fn update_element(
		&mut self,
		document: &web_sys::Document,
		&lignin::Element {
			name: n_1,
			creation_options: co_1,
			attributes: mut a_1,
			content: ref c_1,
			event_bindings: mut eb_1,
		}: &lignin::Element<ThreadBound>,
		&lignin::Element {
			name: n_2,
			creation_options: co_2,
			attributes: mut a_2,
			content: ref c_2,
			event_bindings: mut eb_2,
		}: &lignin::Element<ThreadBound>,
		element: &web_sys::Element,
		depth_limit: usize,
	) -> bool {
		debug_assert_eq!(n_1, n_2);
		debug_assert_eq!(co_1, co_2);

		#[instrument]
		fn remove_attribute(attributes: &web_sys::NamedNodeMap, &lignin::Attribute { name, value }: &lignin::Attribute) {
			match attributes.remove_named_item(name) {
				Err(error) => warn!("Could not remove attribute with name {:?}, value {:?}: {:?}", name, value, error),
				Ok(removed) => {
					if STATIC_MAX_LEVEL >= Level::WARN && removed.value() != value {
						warn!("Unexpected value of removed attribute {:?}: Expected {:?} but found {:?}", name, value, removed.value());
					}
				}
			}
		}

		#[instrument]
		fn add_attribute(document: &web_sys::Document, attributes: &web_sys::NamedNodeMap, &lignin::Attribute { name, value }: &lignin::Attribute) {
			let attribute = match document.create_attribute(name) {
				Ok(attribute) => attribute,
				Err(error) => return error!("Could not create attribute {:?}: {:?}", name, error),
			};
			if !value.is_empty() {
				attribute.set_value(value);
			}
			match attributes.set_named_item(&attribute) {
				Ok(None) => (),
				Err(error) => error!("Could not add attribute {:?}={:?}: {:?}", name, value, error),
				Ok(Some(replaced)) => error!("Attribute collision. Added attribute {:?}={:?} was {:?} before", name, value, replaced),
			}
		}

		while !a_1.is_empty() && a_1.first() == a_2.first() {
			a_1 = &a_1[1..];
			a_2 = &a_2[1..];
		}
		while !a_1.is_empty() && a_1.last() == a_2.last() {
			a_1 = &a_1[..a_1.len() - 1];
			a_2 = &a_2[..a_2.len() - 1];
		}
		let attributes_changed = !a_1.is_empty() || !a_2.is_empty();
		if attributes_changed {
			let attributes = element.attributes();
			for removed in a_1 {
				remove_attribute(&attributes, removed);
			}
			for added in a_2 {
				add_attribute(document, &attributes, added);
			}
		}

		if cfg!(debug_assertions) {
			for (i_a, eb_a) in eb_2.iter().enumerate() {
				for (i_b, eb_b) in eb_2.iter().enumerate() {
					if i_a != i_b && eb_a == eb_b {
						// See <https://developer.mozilla.org/en-US/docs/Web/API/EventTarget/addEventListener#multiple_identical_event_listeners>.
						throw_str(&format!("Duplicate event binding: {:#?}", eb_2));
					}
				}
			}
		}

		while !eb_1.is_empty() && eb_1.first() == eb_2.first() {
			eb_1 = &eb_1[1..];
			eb_2 = &eb_2[1..];
		}
		while !eb_1.is_empty() && eb_1.last() == eb_2.last() {
			eb_1 = &eb_1[..eb_1.len() - 1];
			eb_2 = &eb_2[..eb_2.len() - 1];
		}
		let listeners_changed = !eb_1.is_empty() || !eb_2.is_empty();
		if eb_1.is_empty() {
			for &added in eb_2 {
				self.add_event_listener(element, added);
			}
		} else if eb_2.is_empty() {
			for removed in eb_1 {
				self.remove_event_listener(element, removed);
			}
		} else {
			let mut added: HashSet<EventBinding<ThreadBound>> = eb_2.iter().copied().collect();
			for prior in eb_1 {
				if !added.remove(prior) {
					self.remove_event_listener(element, prior);
				}
			}
			for added in added {
				self.add_event_listener(element, added);
			}
		}

		self.diff_splice_node_list(document, slice::from_ref(c_1), slice::from_ref(c_2), element, &element.child_nodes(), &mut 0, depth_limit - 1);
		attributes_changed || listeners_changed
	}

	#[instrument(skip(self, element))]
	fn add_event_listener(&mut self, element: &web_sys::Element, lignin::EventBinding { name, callback, options }: lignin::EventBinding<ThreadBound>) {
		if let Err(error) = element.add_event_listener_with_callback_and_add_event_listener_options(
			name,
			Self::get_or_create_listener(&self.common_handler, &mut self.handler_handles, callback),
			Self::get_cached_add_event_listener_options(&mut self.event_listener_options_cache, options),
		) {
			error!("Failed to add event listener {:?}: {:?}", name, error);
		} else {
			self.stats.listeners_added += 1;
		}
	}

	#[instrument(skip(self, element))]
	fn remove_event_listener(&mut self, element: &web_sys::Element, removed: &lignin::EventBinding<ThreadBound>) {
		let &lignin::EventBinding { name, ref callback, options } = removed;
		let callback = self.handler_handles.weak_decrement(callback).unwrap_throw().unwrap_throw();
		if let Err(error) = element.remove_event_listener_with_callback_and_bool(name, callback, options.capture()) {
			error!("Failed to remove event listener {:?} ({:?}): {:?}", name, options, error);
		} else {
			self.stats.listeners_removed += 1;
		}
	}
}

fn remove_node(node: &web_sys::Node) {
	match node.parent_node() {
		Some(parent) => {
			if let Err(error) = parent.remove_child(node) {
				error!("Failed to remove the node: {:?}", error);
			}
		}
		None => error!("Could not find parent node of node to remove. Ignoring."),
	}
}
