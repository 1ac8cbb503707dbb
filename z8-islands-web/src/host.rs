//! Browser capability implementations

use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::LocalBoxFuture;
use gloo_timers::callback::{Interval, Timeout};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use z8_islands::capabilities::{
    ClipboardWriter, Clock, ConnectivitySource, Host, HttpClient, HttpResponse, KeyValueStore,
    Spawner, Subscription, ThemeSurface, TimerHandle,
};
use z8_islands::error::{ClipboardError, FetchError, StorageError};

const DARK_QUERY: &str = "(prefers-color-scheme: dark)";

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

fn as_function(closure: &Closure<dyn FnMut()>) -> &js_sys::Function {
    closure.as_ref().unchecked_ref()
}

fn millis(duration: Duration) -> u32 {
    duration.as_millis().min(u32::MAX as u128) as u32
}

/// `window.localStorage`
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage(&self) -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or(StorageError::Unavailable)
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?
            .get_item(key)
            .map_err(|_| StorageError::Unavailable)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Rejected {
                key: key.to_string(),
                reason: describe(&e),
            })
    }
}

/// `navigator.clipboard.writeText`
pub struct NavigatorClipboard;

#[async_trait(?Send)]
impl ClipboardWriter for NavigatorClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let navigator = web_sys::window()
            .map(|w| w.navigator())
            .ok_or(ClipboardError::Unavailable)?;
        let clipboard = js_sys::Reflect::get(&navigator, &JsValue::from_str("clipboard"))
            .ok()
            .filter(|c| c.is_object())
            .ok_or(ClipboardError::Unavailable)?;
        let write = js_sys::Reflect::get(&clipboard, &JsValue::from_str("writeText"))
            .ok()
            .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
            .ok_or(ClipboardError::Unavailable)?;

        let promise = write
            .call1(&clipboard, &JsValue::from_str(text))
            .map_err(|e| ClipboardError::Denied(describe(&e)))?;
        let promise: js_sys::Promise = promise
            .dyn_into()
            .map_err(|_| ClipboardError::Unavailable)?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|e| ClipboardError::Denied(describe(&e)))
    }
}

/// `navigator.onLine` plus the window's `online`/`offline` events
pub struct WindowConnectivity;

impl ConnectivitySource for WindowConnectivity {
    fn is_online(&self) -> bool {
        web_sys::window()
            .map(|w| w.navigator().on_line())
            .unwrap_or(true)
    }

    fn subscribe(&self, listener: Rc<dyn Fn(bool)>) -> Subscription {
        let Some(window) = web_sys::window() else {
            return Subscription::new(|| {});
        };

        let on_online = {
            let listener = listener.clone();
            Closure::wrap(Box::new(move || listener(true)) as Box<dyn FnMut()>)
        };
        let on_offline = Closure::wrap(Box::new(move || listener(false)) as Box<dyn FnMut()>);
        for (event, callback) in [("online", &on_online), ("offline", &on_offline)] {
            let added = window.add_event_listener_with_callback(event, as_function(callback));
            if let Err(e) = added {
                tracing::warn!(event, error = %describe(&e), "connectivity listener not added");
            }
        }

        Subscription::new(move || {
            for (event, callback) in [("online", &on_online), ("offline", &on_offline)] {
                let removed =
                    window.remove_event_listener_with_callback(event, as_function(callback));
                if let Err(e) = removed {
                    tracing::warn!(
                        event,
                        error = %describe(&e),
                        "connectivity listener not removed"
                    );
                }
            }
        })
    }
}

/// Wall clock from chrono, timers from gloo
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn local_time(&self) -> String {
        chrono::Local::now().format("%H:%M:%S").to_string()
    }

    fn now_ms(&self) -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let timeout = Timeout::new(millis(delay), callback);
        TimerHandle::new(move || drop(timeout))
    }

    fn set_interval(&self, period: Duration, callback: Rc<dyn Fn()>) -> TimerHandle {
        let interval = Interval::new(millis(period), move || callback());
        TimerHandle::new(move || drop(interval))
    }
}

/// `fetch` through gloo-net
pub struct GlooHttp;

#[async_trait(?Send)]
impl HttpClient for GlooHttp {
    async fn get(&self, url: &str, accept: &str) -> Result<HttpResponse, FetchError> {
        let response = gloo_net::http::Request::get(url)
            .header("Accept", accept)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        let status_text = response.status_text();
        let content_type = response.headers().get("content-type");
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(HttpResponse {
            status,
            status_text,
            content_type,
            body,
        })
    }
}

/// `data-theme` on `<html>` and the color-scheme media query
pub struct DocumentTheme;

impl DocumentTheme {
    fn root(&self) -> Option<web_sys::Element> {
        web_sys::window()?.document()?.document_element()
    }
}

impl ThemeSurface for DocumentTheme {
    fn prefers_dark(&self) -> bool {
        web_sys::window()
            .and_then(|w| w.match_media(DARK_QUERY).ok().flatten())
            .map(|query| query.matches())
            .unwrap_or(false)
    }

    fn theme_attribute(&self) -> Option<String> {
        self.root()?.get_attribute("data-theme")
    }

    fn set_theme_attribute(&self, value: &str) {
        if let Some(root) = self.root() {
            let _ = root.set_attribute("data-theme", value);
        }
    }
}

/// Microtask-queue spawning
pub struct WasmSpawner;

impl Spawner for WasmSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// Capabilities backed by the current window
pub fn browser_host() -> Host {
    Host {
        store: Rc::new(LocalStorageStore),
        clipboard: Rc::new(NavigatorClipboard),
        connectivity: Rc::new(WindowConnectivity),
        clock: Rc::new(BrowserClock),
        http: Rc::new(GlooHttp),
        theme: Rc::new(DocumentTheme),
        spawner: Rc::new(WasmSpawner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_local_storage_round_trip() {
        let store = LocalStorageStore;
        store.set("z8_test_key", "on").unwrap();
        assert_eq!(store.get("z8_test_key").unwrap().as_deref(), Some("on"));
    }

    #[wasm_bindgen_test]
    fn test_theme_attribute_is_written_to_root() {
        let theme = DocumentTheme;
        theme.set_theme_attribute("cooperate");
        assert_eq!(theme.theme_attribute().as_deref(), Some("cooperate"));
    }

    #[wasm_bindgen_test]
    fn test_connectivity_listeners_detach_on_drop() {
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = seen.clone();
        let subscription =
            WindowConnectivity.subscribe(Rc::new(move |online| sink.borrow_mut().push(online)));

        let window = web_sys::window().unwrap();
        window.dispatch_event(&web_sys::Event::new("offline").unwrap()).unwrap();
        window.dispatch_event(&web_sys::Event::new("online").unwrap()).unwrap();
        assert_eq!(*seen.borrow(), vec![false, true]);

        drop(subscription);
        window.dispatch_event(&web_sys::Event::new("offline").unwrap()).unwrap();
        assert_eq!(seen.borrow().len(), 2);
    }

    #[wasm_bindgen_test]
    fn test_local_time_format() {
        let time = BrowserClock.local_time();
        assert_eq!(time.len(), 8);
        assert_eq!(time.as_bytes()[2], b':');
    }
}
