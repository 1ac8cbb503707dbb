//! Browser document and element bindings

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::oneshot;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{DocumentReadyState, Element, HtmlInputElement};

use z8_islands::bridge::{HostElement, RenderRoot};
use z8_islands::dom::memory::MemoryElement;
use z8_islands::dom::{Document, DomElement, ElementRef, ReadyState};
use z8_islands::view::{Callback, Event, EventKind, Node};

type Listener = Closure<dyn FnMut(web_sys::Event)>;

const KEY_PROPERTY: &str = "__z8_key";
const WIRED_PROPERTY: &str = "__z8_wired";

thread_local! {
    static NEXT_KEY: Cell<u32> = Cell::new(1);
    /// Listeners owned by the children an element rendered; replaced on every render
    static RENDERED: RefCell<HashMap<u32, Vec<Listener>>> = RefCell::new(HashMap::new());
    /// Listeners wired imperatively onto an element; kept for the page lifetime
    static WIRED: RefCell<HashMap<u32, Vec<Listener>>> = RefCell::new(HashMap::new());
}

/// Stable per-element key stored as an expando property
pub(crate) fn element_key(element: &Element) -> u32 {
    let existing = js_sys::Reflect::get(element, &JsValue::from_str(KEY_PROPERTY))
        .ok()
        .and_then(|v| v.as_f64());
    if let Some(key) = existing {
        return key as u32;
    }
    let key = NEXT_KEY.with(|next| {
        let key = next.get();
        next.set(key + 1);
        key
    });
    let _ = js_sys::Reflect::set(
        element,
        &JsValue::from_str(KEY_PROPERTY),
        &JsValue::from_f64(key as f64),
    );
    key
}

fn to_event(kind: EventKind, event: &web_sys::Event) -> Event {
    match kind {
        EventKind::Click => Event::Click,
        EventKind::Change => {
            let checked = event
                .target()
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                .map(|input| input.checked())
                .unwrap_or(false);
            Event::Change { checked }
        }
    }
}

fn listen(element: &Element, kind: EventKind, callback: Callback) -> Option<Listener> {
    let listener = Closure::wrap(Box::new(move |event: web_sys::Event| {
        callback(&to_event(kind, &event));
    }) as Box<dyn FnMut(web_sys::Event)>);
    let registered =
        element.add_event_listener_with_callback(kind.as_str(), listener.as_ref().unchecked_ref());
    match registered {
        Ok(()) => Some(listener),
        Err(e) => {
            tracing::warn!(event = kind.as_str(), error = ?e, "addEventListener failed");
            None
        }
    }
}

/// The browser document
#[derive(Clone)]
pub struct WebDocument {
    document: web_sys::Document,
}

impl WebDocument {
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    /// The window's document
    pub fn current() -> Option<Self> {
        web_sys::window()?.document().map(Self::new)
    }

    pub fn inner(&self) -> &web_sys::Document {
        &self.document
    }
}

#[async_trait(?Send)]
impl Document for WebDocument {
    fn ready_state(&self) -> ReadyState {
        match self.document.ready_state() {
            DocumentReadyState::Loading => ReadyState::Loading,
            DocumentReadyState::Interactive => ReadyState::Interactive,
            _ => ReadyState::Complete,
        }
    }

    async fn ready(&self) {
        if self.ready_state() != ReadyState::Loading {
            return;
        }
        let (tx, rx) = oneshot::channel::<()>();
        let on_ready = Closure::once_into_js(move || {
            let _ = tx.send(());
        });
        if let Err(e) = self
            .document
            .add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref())
        {
            tracing::warn!(error = ?e, "cannot wait for DOMContentLoaded");
            return;
        }
        let _ = rx.await;
    }

    fn body(&self) -> ElementRef {
        let root = self
            .document
            .body()
            .map(Element::from)
            .or_else(|| self.document.document_element());
        match root {
            Some(root) => Rc::new(WebElement::new(root)),
            // nothing to search in a document without a root element
            None => Rc::new(MemoryElement::new("body")),
        }
    }
}

/// A DOM element
#[derive(Clone)]
pub struct WebElement {
    element: Element,
}

impl WebElement {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    pub fn inner(&self) -> &Element {
        &self.element
    }

    fn build(
        &self,
        document: &web_sys::Document,
        node: Node,
        listeners: &mut Vec<Listener>,
    ) -> Option<web_sys::Node> {
        match node {
            Node::Text(text) => Some(document.create_text_node(&text).into()),
            Node::Element(el) => {
                let created = match document.create_element(&el.tag) {
                    Ok(created) => created,
                    Err(e) => {
                        tracing::warn!(tag = %el.tag, error = ?e, "createElement failed");
                        return None;
                    }
                };
                for (name, value) in &el.attributes {
                    let _ = created.set_attribute(name, value);
                    if name == "checked" {
                        if let Some(input) = created.dyn_ref::<HtmlInputElement>() {
                            input.set_checked(true);
                        }
                    }
                }
                for (kind, callback) in el.listeners {
                    listeners.extend(listen(&created, kind, callback));
                }
                for child in el.children {
                    if let Some(child) = self.build(document, child, listeners) {
                        let _ = created.append_child(&child);
                    }
                }
                Some(created.into())
            }
        }
    }

    fn clear(&self) {
        self.element.set_inner_html("");
        let key = element_key(&self.element);
        let released = RENDERED.with(|rendered| rendered.borrow_mut().remove(&key));
        drop(released);
    }
}

impl DomElement for WebElement {
    fn tag_name(&self) -> String {
        self.element.tag_name().to_ascii_lowercase()
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        self.element.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        if let Err(e) = self.element.set_attribute(name, value) {
            tracing::warn!(attribute = name, error = ?e, "setAttribute failed");
        }
    }

    fn remove_attribute(&self, name: &str) {
        let _ = self.element.remove_attribute(name);
    }

    fn find_by_id(&self, id: &str) -> Option<ElementRef> {
        if self.element.id() == id {
            return Some(Rc::new(self.clone()));
        }
        let selector = format!("[id=\"{}\"]", id.replace('\\', "\\\\").replace('"', "\\\""));
        match self.element.query_selector(&selector) {
            Ok(found) => found.map(|el| Rc::new(WebElement::new(el)) as ElementRef),
            Err(_) => None,
        }
    }

    fn text_content(&self) -> String {
        self.element.text_content().unwrap_or_default()
    }

    fn set_text_content(&self, text: &str) {
        self.element.set_text_content(Some(text));
    }

    fn replace_children(&self, children: Vec<Node>) {
        self.clear();
        let Some(document) = self.element.owner_document() else {
            return;
        };
        let mut listeners = Vec::new();
        for child in children {
            if let Some(node) = self.build(&document, child, &mut listeners) {
                let _ = self.element.append_child(&node);
            }
        }
        let key = element_key(&self.element);
        RENDERED.with(|rendered| rendered.borrow_mut().insert(key, listeners));
    }

    fn add_listener(&self, kind: EventKind, callback: Callback) {
        if let Some(listener) = listen(&self.element, kind, callback) {
            let key = element_key(&self.element);
            WIRED.with(|wired| wired.borrow_mut().entry(key).or_default().push(listener));
        }
    }

    fn is_checked(&self) -> bool {
        self.element
            .dyn_ref::<HtmlInputElement>()
            .map(|input| input.checked())
            .unwrap_or(false)
    }

    fn set_checked(&self, checked: bool) {
        if let Some(input) = self.element.dyn_ref::<HtmlInputElement>() {
            input.set_checked(checked);
        }
    }

    fn try_wire(&self) -> bool {
        let property = JsValue::from_str(WIRED_PROPERTY);
        let wired = js_sys::Reflect::get(&self.element, &property)
            .map(|v| v.is_truthy())
            .unwrap_or(false);
        if wired {
            return false;
        }
        let _ = js_sys::Reflect::set(&self.element, &property, &JsValue::TRUE);
        true
    }
}

impl HostElement for WebElement {
    fn create_root(&self) -> Box<dyn RenderRoot> {
        Box::new(DomRoot::new(self.clone()))
    }

    fn as_dom(&self) -> &dyn DomElement {
        self
    }
}

/// Render root drawing into an element's children
pub struct DomRoot {
    target: WebElement,
    mounted: bool,
}

impl DomRoot {
    pub fn new(target: WebElement) -> Self {
        Self {
            target,
            mounted: false,
        }
    }
}

impl RenderRoot for DomRoot {
    fn render(&mut self, node: Node) {
        self.target.replace_children(vec![node]);
        self.mounted = true;
    }

    fn unmount(&mut self) {
        if self.mounted {
            self.target.clear();
            self.mounted = false;
        }
    }
}

impl Drop for DomRoot {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn scratch() -> WebElement {
        let document = WebDocument::current().unwrap();
        let div = document.inner().create_element("div").unwrap();
        document.inner().body().unwrap().append_child(&div).unwrap();
        WebElement::new(div)
    }

    #[wasm_bindgen_test]
    fn test_replace_children_renders_and_dispatches() {
        let target = scratch();
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let on_click: Callback = Rc::new(move |_: &Event| counter.set(counter.get() + 1));
        target.replace_children(vec![Node::el("button")
            .id("go")
            .with_text("Go")
            .on(EventKind::Click, on_click)]);

        let button = target.find_by_id("go").unwrap();
        assert_eq!(button.text_content(), "Go");
        target
            .inner()
            .query_selector("#go")
            .unwrap()
            .unwrap()
            .dyn_into::<web_sys::HtmlElement>()
            .unwrap()
            .click();
        assert_eq!(clicks.get(), 1);

        target.replace_children(vec![Node::text("gone")]);
        assert!(target.find_by_id("go").is_none());
        assert_eq!(target.text_content(), "gone");
    }

    #[wasm_bindgen_test]
    fn test_try_wire_only_once() {
        let target = scratch();
        assert!(target.try_wire());
        assert!(!target.try_wire());
    }
}
