//! `customElements` bindings
//!
//! Every tag in the island registry is defined with the browser through a
//! small JS class whose lifecycle callbacks forward to the island adapters
//! kept here, one per element instance.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::Element;

use z8_islands::bridge::{CustomElement, ElementRegistry};
use z8_islands::capabilities::Host;

use crate::dom::{element_key, WebElement};

#[wasm_bindgen(inline_js = "
export function define_island(tag, observed, connected, disconnected, changed) {
    if (customElements.get(tag)) {
        return false;
    }
    customElements.define(tag, class extends HTMLElement {
        static get observedAttributes() { return observed; }
        connectedCallback() { connected(this); }
        disconnectedCallback() { disconnected(this); }
        attributeChangedCallback(name) { changed(this, name); }
    });
    return true;
}
")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn define_island(
        tag: &str,
        observed: js_sys::Array,
        connected: &JsValue,
        disconnected: &JsValue,
        changed: &JsValue,
    ) -> Result<bool, JsValue>;
}

thread_local! {
    static INSTANCES: RefCell<HashMap<u32, Box<dyn CustomElement>>> = RefCell::new(HashMap::new());
}

// Adapters are taken out of the table while a callback runs, so a render that
// connects nested islands never re-borrows it.
fn take(key: u32) -> Option<Box<dyn CustomElement>> {
    INSTANCES.with(|instances| instances.borrow_mut().remove(&key))
}

fn put(key: u32, instance: Box<dyn CustomElement>) {
    INSTANCES.with(|instances| instances.borrow_mut().insert(key, instance));
}

fn on_connected(registry: &ElementRegistry, host: &Host, element: Element) {
    let key = element_key(&element);
    let tag = element.tag_name().to_ascii_lowercase();
    let instance = take(key)
        .or_else(|| registry.create(&tag, Rc::new(WebElement::new(element)), host.clone()));
    if let Some(mut instance) = instance {
        instance.connected();
        put(key, instance);
    }
}

fn on_disconnected(element: Element) {
    let key = element_key(&element);
    if let Some(mut instance) = take(key) {
        instance.disconnected();
    }
}

fn on_attribute_changed(element: Element, name: String) {
    let key = element_key(&element);
    // attributes parsed before the first connect arrive with no adapter yet
    if let Some(mut instance) = take(key) {
        instance.attribute_changed(&name);
        put(key, instance);
    }
}

/// Define every registry tag with the browser. Already-defined tags are
/// skipped. Returns the number of tags newly defined.
pub fn define_custom_elements(host: &Host) -> usize {
    z8_islands::bridge::with_global(|registry| {
        let mut defined = 0;
        for tag in registry.tags() {
            let Some(definition) = registry.get(tag) else {
                continue;
            };
            let observed: js_sys::Array = definition
                .observed
                .iter()
                .map(|name| JsValue::from_str(name))
                .collect();

            let connected = {
                let host = host.clone();
                Closure::<dyn FnMut(Element)>::new(move |element: Element| {
                    z8_islands::bridge::with_global(|registry| {
                        on_connected(registry, &host, element)
                    });
                })
                .into_js_value()
            };
            let disconnected =
                Closure::<dyn FnMut(Element)>::new(on_disconnected).into_js_value();
            let changed =
                Closure::<dyn FnMut(Element, String)>::new(on_attribute_changed).into_js_value();

            match define_island(tag, observed, &connected, &disconnected, &changed) {
                Ok(true) => {
                    tracing::debug!(tag, "custom element defined");
                    defined += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(tag, error = ?e, "customElements.define failed")
                }
            }
        }
        defined
    })
}
