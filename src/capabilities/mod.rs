//! Host Capabilities
//!
//! Browser facilities the enhancement layer depends on, expressed as injected
//! traits so the loader, the bridge and the widgets run without a real browser:
//! - [`KeyValueStore`]: local storage
//! - [`ClipboardWriter`]: clipboard text writes
//! - [`ConnectivitySource`]: online/offline state and events
//! - [`Clock`]: local time, a monotonic counter, timeouts and intervals
//! - [`HttpClient`]: GET requests
//! - [`ThemeSurface`]: the document theme attribute and color-scheme preference
//! - [`Spawner`]: local (non-`Send`) task spawning on the event loop

pub mod memory;
#[cfg(not(target_arch = "wasm32"))]
pub mod native;

use async_trait::async_trait;
use futures_util::future::LocalBoxFuture;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use crate::error::{ClipboardError, FetchError, StorageError};

/// Persistent string key-value store (last write wins)
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Clipboard access
#[async_trait(?Send)]
pub trait ClipboardWriter {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Network connectivity state
pub trait ConnectivitySource {
    /// Current state
    fn is_online(&self) -> bool;

    /// Register a listener called with the new state on every transition.
    /// The listener stays registered until the returned guard is dropped.
    fn subscribe(&self, listener: Rc<dyn Fn(bool)>) -> Subscription;
}

/// Time source and timer scheduling
pub trait Clock {
    /// Local wall-clock time formatted `HH:MM:SS`
    fn local_time(&self) -> String;

    /// Monotonic milliseconds, for elapsed-time measurement
    fn now_ms(&self) -> f64;

    /// Run `callback` once after `delay`, unless the handle is dropped first
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle;

    /// Run `callback` every `period` until the handle is dropped
    fn set_interval(&self, period: Duration, callback: Rc<dyn Fn()>) -> TimerHandle;
}

/// A received HTTP response with its body already read
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    /// 2xx status
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Content type announces JSON
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false)
    }
}

/// HTTP GET capability
#[async_trait(?Send)]
pub trait HttpClient {
    async fn get(&self, url: &str, accept: &str) -> Result<HttpResponse, FetchError>;
}

/// The document-level theme attribute and the system color-scheme preference
pub trait ThemeSurface {
    /// `prefers-color-scheme: dark` matches
    fn prefers_dark(&self) -> bool;

    /// Current `data-theme` value on the document element
    fn theme_attribute(&self) -> Option<String>;

    /// Set `data-theme` on the document element
    fn set_theme_attribute(&self, value: &str);
}

/// Spawns futures on the single-threaded event loop
pub trait Spawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}

/// Cancels a scheduled timer when dropped
#[must_use = "dropping a TimerHandle cancels the timer"]
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancel now
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Unregisters a listener when dropped
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

/// The full set of capabilities handed to islands and page modules
#[derive(Clone)]
pub struct Host {
    pub store: Rc<dyn KeyValueStore>,
    pub clipboard: Rc<dyn ClipboardWriter>,
    pub connectivity: Rc<dyn ConnectivitySource>,
    pub clock: Rc<dyn Clock>,
    pub http: Rc<dyn HttpClient>,
    pub theme: Rc<dyn ThemeSurface>,
    pub spawner: Rc<dyn Spawner>,
}

impl Host {
    /// Spawn a local task through the host spawner
    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        self.spawner.spawn_local(Box::pin(task));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_response_classification() {
        let mut response = HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            content_type: Some("application/json; charset=utf-8".to_string()),
            body: "{}".to_string(),
        };
        assert!(response.ok());
        assert!(response.is_json());

        response.status = 404;
        response.content_type = Some("text/plain".to_string());
        assert!(!response.ok());
        assert!(!response.is_json());

        response.content_type = None;
        assert!(!response.is_json());
    }

    #[test]
    fn test_timer_handle_cancels_once() {
        let cancelled = Rc::new(Cell::new(0));
        let counter = cancelled.clone();
        let handle = TimerHandle::new(move || counter.set(counter.get() + 1));
        handle.cancel();
        assert_eq!(cancelled.get(), 1);

        let counter = cancelled.clone();
        drop(TimerHandle::new(move || counter.set(counter.get() + 1)));
        assert_eq!(cancelled.get(), 2);
    }

    #[test]
    fn test_subscription_unsubscribes_on_drop() {
        let active = Rc::new(Cell::new(true));
        let flag = active.clone();
        let subscription = Subscription::new(move || flag.set(false));
        assert!(active.get());
        drop(subscription);
        assert!(!active.get());
    }
}
