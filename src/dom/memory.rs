//! In-memory DOM
//!
//! A small element tree implementing [`DomElement`] and
//! [`HostElement`](crate::bridge::HostElement). Used by tests, the demo binary
//! and any native host that has no real document.

use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tokio::sync::watch;

use super::{Document, DomElement, ElementRef, ReadyState, WiredFlag};
use crate::bridge::{HostElement, RenderRoot};
use crate::view::{escape_html, Callback, Event, EventKind, Node};

/// Counts render roots created, unmounted and render calls made for a tree
#[derive(Debug, Default)]
pub struct RootLedger {
    created: Cell<usize>,
    unmounted: Cell<usize>,
    renders: Cell<usize>,
}

impl RootLedger {
    pub fn created(&self) -> usize {
        self.created.get()
    }

    pub fn unmounted(&self) -> usize {
        self.unmounted.get()
    }

    /// Roots created and not yet unmounted
    pub fn live(&self) -> usize {
        self.created.get() - self.unmounted.get()
    }

    /// Total render calls across all roots
    pub fn renders(&self) -> usize {
        self.renders.get()
    }
}

#[derive(Clone)]
enum MemoryChild {
    Element(MemoryElement),
    Text(String),
}

struct ElementData {
    tag: String,
    attributes: RefCell<Vec<(String, String)>>,
    children: RefCell<Vec<MemoryChild>>,
    listeners: RefCell<Vec<(EventKind, Callback)>>,
    checked: Cell<bool>,
    wired: WiredFlag,
    ledger: Rc<RootLedger>,
}

/// Shared handle to an in-memory element
#[derive(Clone)]
pub struct MemoryElement {
    inner: Rc<ElementData>,
}

impl MemoryElement {
    /// Create a detached element with its own root ledger
    pub fn new(tag: &str) -> Self {
        Self::with_ledger(tag, Rc::new(RootLedger::default()))
    }

    /// Create a detached element sharing `ledger`
    pub fn with_ledger(tag: &str, ledger: Rc<RootLedger>) -> Self {
        Self {
            inner: Rc::new(ElementData {
                tag: tag.to_ascii_lowercase(),
                attributes: RefCell::new(Vec::new()),
                children: RefCell::new(Vec::new()),
                listeners: RefCell::new(Vec::new()),
                checked: Cell::new(false),
                wired: WiredFlag::new(),
                ledger,
            }),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(self, name: &str, value: &str) -> Self {
        DomElement::set_attribute(&self, name, value);
        self
    }

    /// Root ledger shared by this element's tree
    pub fn ledger(&self) -> Rc<RootLedger> {
        self.inner.ledger.clone()
    }

    pub fn append_child(&self, child: &MemoryElement) {
        self.inner
            .children
            .borrow_mut()
            .push(MemoryChild::Element(child.clone()));
    }

    pub fn append_text(&self, text: &str) {
        self.inner
            .children
            .borrow_mut()
            .push(MemoryChild::Text(text.to_string()));
    }

    /// Element children
    pub fn children(&self) -> Vec<MemoryElement> {
        self.inner
            .children
            .borrow()
            .iter()
            .filter_map(|child| match child {
                MemoryChild::Element(el) => Some(el.clone()),
                MemoryChild::Text(_) => None,
            })
            .collect()
    }

    /// All descendant elements in document order
    pub fn descendants(&self) -> Vec<MemoryElement> {
        let mut out = Vec::new();
        for child in self.children() {
            out.push(child.clone());
            out.extend(child.descendants());
        }
        out
    }

    /// First descendant with the given tag
    pub fn find_first(&self, tag: &str) -> Option<MemoryElement> {
        self.descendants()
            .into_iter()
            .find(|el| el.inner.tag.eq_ignore_ascii_case(tag))
    }

    /// This element or the first descendant with the given `id`
    pub fn find_id(&self, id: &str) -> Option<MemoryElement> {
        if self.has_id(id) {
            return Some(self.clone());
        }
        self.descendants().into_iter().find(|el| el.has_id(id))
    }

    fn has_id(&self, id: &str) -> bool {
        DomElement::get_attribute(self, "id").as_deref() == Some(id)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        DomElement::get_attribute(self, name).is_some()
    }

    pub fn is_same(&self, other: &MemoryElement) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of listeners registered for `kind`
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner
            .listeners
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    /// Deliver an event to this element's listeners.
    ///
    /// Listeners are collected before any is called, so a listener may
    /// re-render the tree it lives in.
    pub fn dispatch(&self, event: &Event) {
        if let Event::Change { checked } = event {
            self.inner.checked.set(*checked);
        }
        let kind = event.kind();
        let listeners: Vec<Callback> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, cb)| cb.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn click(&self) {
        self.dispatch(&Event::Click);
    }

    /// Serialized children
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.inner.children.borrow().iter() {
            match child {
                MemoryChild::Element(el) => out.push_str(&el.outer_html()),
                MemoryChild::Text(text) => out.push_str(&escape_html(text)),
            }
        }
        out
    }

    /// Serialized element including its own tag
    pub fn outer_html(&self) -> String {
        let mut node = Node::el(&self.inner.tag);
        for (name, value) in self.inner.attributes.borrow().iter() {
            node = node.attr(name, value.clone());
        }
        let open = node.to_html();
        let open = open.trim_end_matches(&format!("</{}>", self.inner.tag));
        if matches!(self.inner.tag.as_str(), "input" | "br" | "hr" | "img") {
            return open.to_string();
        }
        format!("{}{}</{}>", open, self.inner_html(), self.inner.tag)
    }

    fn build(node: &Node, ledger: &Rc<RootLedger>) -> MemoryChild {
        match node {
            Node::Text(text) => MemoryChild::Text(text.clone()),
            Node::Element(el) => {
                let element = MemoryElement::with_ledger(&el.tag, ledger.clone());
                for (name, value) in &el.attributes {
                    DomElement::set_attribute(&element, name, value);
                }
                if el.tag == "input" && el.attributes.iter().any(|(n, _)| n == "checked") {
                    element.inner.checked.set(true);
                }
                for (kind, callback) in &el.listeners {
                    element.add_listener(*kind, callback.clone());
                }
                {
                    let mut children = element.inner.children.borrow_mut();
                    for child in &el.children {
                        children.push(Self::build(child, ledger));
                    }
                }
                MemoryChild::Element(element)
            }
        }
    }

    fn clear(&self) {
        let old = std::mem::take(&mut *self.inner.children.borrow_mut());
        drop(old);
    }
}

impl DomElement for MemoryElement {
    fn tag_name(&self) -> String {
        self.inner.tag.clone()
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        self.inner
            .attributes
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let mut attributes = self.inner.attributes.borrow_mut();
        match attributes.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attribute(&self, name: &str) {
        self.inner.attributes.borrow_mut().retain(|(n, _)| n != name);
    }

    fn find_by_id(&self, id: &str) -> Option<ElementRef> {
        self.find_id(id).map(|el| Rc::new(el) as ElementRef)
    }

    fn text_content(&self) -> String {
        let mut out = String::new();
        for child in self.inner.children.borrow().iter() {
            match child {
                MemoryChild::Element(el) => out.push_str(&el.text_content()),
                MemoryChild::Text(text) => out.push_str(text),
            }
        }
        out
    }

    fn set_text_content(&self, text: &str) {
        self.clear();
        self.append_text(text);
    }

    fn replace_children(&self, children: Vec<Node>) {
        let built: Vec<MemoryChild> = children
            .iter()
            .map(|node| Self::build(node, &self.inner.ledger))
            .collect();
        let old = std::mem::replace(&mut *self.inner.children.borrow_mut(), built);
        drop(old);
    }

    fn add_listener(&self, kind: EventKind, callback: Callback) {
        self.inner.listeners.borrow_mut().push((kind, callback));
    }

    fn is_checked(&self) -> bool {
        self.inner.checked.get()
    }

    fn set_checked(&self, checked: bool) {
        self.inner.checked.set(checked);
    }

    fn try_wire(&self) -> bool {
        self.inner.wired.try_set()
    }
}

/// Render root drawing into a [`MemoryElement`]'s children
pub struct MemoryRoot {
    element: MemoryElement,
    ledger: Rc<RootLedger>,
    mounted: bool,
}

impl RenderRoot for MemoryRoot {
    fn render(&mut self, node: Node) {
        if !self.mounted {
            return;
        }
        self.ledger.renders.set(self.ledger.renders.get() + 1);
        self.element.replace_children(vec![node]);
    }

    fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.element.clear();
        self.ledger.unmounted.set(self.ledger.unmounted.get() + 1);
    }
}

impl HostElement for MemoryElement {
    fn create_root(&self) -> Box<dyn RenderRoot> {
        let ledger = self.ledger();
        ledger.created.set(ledger.created.get() + 1);
        Box::new(MemoryRoot {
            element: self.clone(),
            ledger,
            mounted: true,
        })
    }

    fn as_dom(&self) -> &dyn DomElement {
        self
    }
}

/// In-memory document with a controllable readiness signal
pub struct MemoryDocument {
    html: MemoryElement,
    body: MemoryElement,
    ready: watch::Sender<bool>,
}

impl MemoryDocument {
    /// A document that has already finished loading
    pub fn new() -> Self {
        let doc = Self::loading();
        doc.finish_loading();
        doc
    }

    /// A document still parsing; [`Document::ready`] waits for
    /// [`MemoryDocument::finish_loading`]
    pub fn loading() -> Self {
        let ledger = Rc::new(RootLedger::default());
        let html = MemoryElement::with_ledger("html", ledger.clone());
        let body = MemoryElement::with_ledger("body", ledger);
        html.append_child(&body);
        let (ready, _) = watch::channel(false);
        Self { html, body, ready }
    }

    /// Fire the one-time ready signal
    pub fn finish_loading(&self) {
        self.ready.send_replace(true);
    }

    /// The document element
    pub fn html(&self) -> &MemoryElement {
        &self.html
    }

    pub fn body_element(&self) -> &MemoryElement {
        &self.body
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Document for MemoryDocument {
    fn ready_state(&self) -> ReadyState {
        if *self.ready.borrow() {
            ReadyState::Complete
        } else {
            ReadyState::Loading
        }
    }

    async fn ready(&self) {
        let mut rx = self.ready.subscribe();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    fn body(&self) -> ElementRef {
        Rc::new(self.body.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_find_by_id_searches_descendants() {
        let body = MemoryElement::new("body");
        let section = MemoryElement::new("section");
        let button = MemoryElement::new("button").with_attribute("id", "try-api");
        section.append_child(&button);
        body.append_child(&section);

        let found = body.find_by_id("try-api").unwrap();
        assert_eq!(found.tag_name(), "button");
        assert!(body.find_by_id("missing").is_none());
    }

    #[test]
    fn test_replace_children_builds_tree_with_listeners() {
        let root = MemoryElement::new("div");
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        root.replace_children(vec![Node::el("button")
            .id("go")
            .on(EventKind::Click, Rc::new(move |_: &Event| counter.set(counter.get() + 1)))
            .with_text("Go")]);

        assert_eq!(root.inner_html(), r#"<button id="go">Go</button>"#);
        root.find_id("go").unwrap().click();
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_listener_may_rerender_its_own_tree() {
        let root = MemoryElement::new("div");
        let target = root.clone();
        root.replace_children(vec![Node::el("button").on(
            EventKind::Click,
            Rc::new(move |_: &Event| target.set_text_content("replaced")),
        )]);

        root.find_first("button").unwrap().click();
        assert_eq!(root.text_content(), "replaced");
    }

    #[test]
    fn test_change_event_updates_checked() {
        let input = MemoryElement::new("input");
        input.dispatch(&Event::Change { checked: true });
        assert!(input.is_checked());
    }

    #[test]
    fn test_checked_attribute_sets_property() {
        let root = MemoryElement::new("div");
        root.replace_children(vec![Node::el("input")
            .attr("type", "checkbox")
            .flag("checked", true)]);
        assert!(root.find_first("input").unwrap().is_checked());
    }

    #[test]
    fn test_root_ledger_tracks_roots() {
        let el = MemoryElement::new("z8-clock");
        let mut root = el.create_root();
        assert_eq!(el.ledger().live(), 1);

        root.render(Node::text("12:00:00"));
        assert_eq!(el.text_content(), "12:00:00");
        assert_eq!(el.ledger().renders(), 1);

        root.unmount();
        assert_eq!(el.ledger().live(), 0);
        assert_eq!(el.text_content(), "");

        // Rendering into an unmounted root is ignored
        root.render(Node::text("late"));
        assert_eq!(el.text_content(), "");
        assert_eq!(el.ledger().renders(), 1);
    }

    #[tokio::test]
    async fn test_document_ready_waits_for_signal() {
        let doc = Rc::new(MemoryDocument::loading());
        assert_eq!(doc.ready_state(), ReadyState::Loading);

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let waiter = doc.clone();
                let handle = tokio::task::spawn_local(async move {
                    waiter.ready().await;
                    true
                });
                tokio::task::yield_now().await;
                assert!(!handle.is_finished());

                doc.finish_loading();
                assert!(handle.await.unwrap());
            })
            .await;

        assert_eq!(doc.ready_state(), ReadyState::Complete);
    }

    #[test]
    fn test_wired_flag_on_element() {
        let el = MemoryElement::new("div");
        assert!(el.try_wire());
        assert!(!el.try_wire());
    }
}
