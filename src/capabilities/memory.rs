//! In-memory capabilities
//!
//! Deterministic implementations of every host capability: a map-backed
//! store, a recording clipboard, manually driven connectivity and clock, a
//! queue-backed HTTP client, and a theme surface writing to an in-memory
//! document element.

use async_trait::async_trait;
use chrono::{NaiveTime, Timelike};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;

use super::{
    ClipboardWriter, Clock, ConnectivitySource, HttpClient, HttpResponse, KeyValueStore,
    Subscription, ThemeSurface, TimerHandle,
};
use crate::dom::memory::MemoryElement;
use crate::dom::DomElement;
use crate::error::{ClipboardError, FetchError, StorageError};

/// Map-backed key-value store that can be switched off to simulate disabled
/// storage
#[derive(Debug)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
    available: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            values: RefCell::new(HashMap::new()),
            available: Cell::new(true),
        }
    }

    /// Make every read and write fail with [`StorageError::Unavailable`]
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    /// Read bypassing availability, for assertions
    pub fn peek(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if !self.available.get() {
            return Err(StorageError::Unavailable);
        }
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if !self.available.get() {
            return Err(StorageError::Unavailable);
        }
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Clipboard that records the last written text
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: RefCell<Option<String>>,
    deny: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject subsequent writes
    pub fn set_deny(&self, deny: bool) {
        self.deny.set(deny);
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

#[async_trait(?Send)]
impl ClipboardWriter for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.writes.set(self.writes.get() + 1);
        if self.deny.get() {
            return Err(ClipboardError::Denied("permission denied".to_string()));
        }
        *self.contents.borrow_mut() = Some(text.to_string());
        Ok(())
    }
}

type Listeners = Rc<RefCell<Vec<(u64, Rc<dyn Fn(bool)>)>>>;

/// Connectivity toggled by hand
pub struct ManualConnectivity {
    online: Cell<bool>,
    listeners: Listeners,
    next_id: Cell<u64>,
}

impl ManualConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: Cell::new(online),
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        }
    }

    /// Change state and notify listeners (only on an actual transition)
    pub fn set_online(&self, online: bool) {
        if self.online.replace(online) == online {
            return;
        }
        let listeners: Vec<Rc<dyn Fn(bool)>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(online);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl ConnectivitySource for ManualConnectivity {
    fn is_online(&self) -> bool {
        self.online.get()
    }

    fn subscribe(&self, listener: Rc<dyn Fn(bool)>) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));

        let listeners: Weak<RefCell<Vec<(u64, Rc<dyn Fn(bool)>)>>> = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().retain(|(lid, _)| *lid != id);
            }
        })
    }
}

enum TimerTask {
    Once(Option<Box<dyn FnOnce()>>),
    Every(Duration, Rc<dyn Fn()>),
}

struct Timer {
    id: u64,
    due_ms: f64,
    task: TimerTask,
}

struct ClockState {
    now_ms: f64,
    start: NaiveTime,
    timers: Vec<Timer>,
    next_id: u64,
}

/// Clock advanced explicitly by tests
pub struct ManualClock {
    state: Rc<RefCell<ClockState>>,
}

impl ManualClock {
    /// Clock whose local time starts at `start`
    pub fn new(start: NaiveTime) -> Self {
        Self {
            state: Rc::new(RefCell::new(ClockState {
                now_ms: 0.0,
                start,
                timers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Number of scheduled timers
    pub fn pending(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Move time forward, firing due timers in order
    pub fn advance(&self, by: Duration) {
        let target = self.state.borrow().now_ms + by.as_secs_f64() * 1000.0;
        loop {
            let fire = {
                let mut state = self.state.borrow_mut();
                let next = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due_ms <= target)
                    .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms))
                    .map(|(index, _)| index);
                let Some(index) = next else {
                    break;
                };
                let due = state.timers[index].due_ms;
                state.now_ms = due;
                match &mut state.timers[index].task {
                    TimerTask::Once(callback) => {
                        let callback = callback.take();
                        state.timers.remove(index);
                        callback.map(Fire::Once)
                    }
                    TimerTask::Every(period, callback) => {
                        let callback = callback.clone();
                        let period_ms = period.as_secs_f64() * 1000.0;
                        state.timers[index].due_ms = due + period_ms.max(1.0);
                        Some(Fire::Every(callback))
                    }
                }
            };
            match fire {
                Some(Fire::Once(callback)) => callback(),
                Some(Fire::Every(callback)) => callback(),
                None => {}
            }
        }
        self.state.borrow_mut().now_ms = target;
    }

    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        let due_ms = state.now_ms + delay.as_secs_f64() * 1000.0;
        state.timers.push(Timer { id, due_ms, task });

        let weak = Rc::downgrade(&self.state);
        TimerHandle::new(move || {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().timers.retain(|t| t.id != id);
            }
        })
    }
}

enum Fire {
    Once(Box<dyn FnOnce()>),
    Every(Rc<dyn Fn()>),
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default())
    }
}

impl Clock for ManualClock {
    fn local_time(&self) -> String {
        let state = self.state.borrow();
        let elapsed = chrono::Duration::milliseconds(state.now_ms as i64);
        let time = state.start + elapsed;
        format!("{:02}:{:02}:{:02}", time.hour(), time.minute(), time.second())
    }

    fn now_ms(&self) -> f64 {
        self.state.borrow().now_ms
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle {
        self.schedule(delay, TimerTask::Once(Some(callback)))
    }

    fn set_interval(&self, period: Duration, callback: Rc<dyn Fn()>) -> TimerHandle {
        self.schedule(period, TimerTask::Every(period, callback))
    }
}

type Reply = Result<HttpResponse, FetchError>;

enum Queued {
    Ready(Reply),
    Deferred(oneshot::Receiver<Reply>),
}

/// HTTP client answering from a queue of canned or deferred replies
#[derive(Default)]
pub struct QueuedHttp {
    queue: RefCell<VecDeque<Queued>>,
    requests: RefCell<Vec<String>>,
}

impl QueuedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an immediate response
    pub fn push_response(&self, response: HttpResponse) {
        self.queue.borrow_mut().push_back(Queued::Ready(Ok(response)));
    }

    /// Queue a JSON response with status 200
    pub fn push_json(&self, body: &str) {
        self.push_response(HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            content_type: Some("application/json".to_string()),
            body: body.to_string(),
        });
    }

    /// Queue an immediate failure
    pub fn push_error(&self, error: FetchError) {
        self.queue.borrow_mut().push_back(Queued::Ready(Err(error)));
    }

    /// Queue a reply that stays pending until the returned sender is used
    pub fn defer(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.queue.borrow_mut().push_back(Queued::Deferred(rx));
        tx
    }

    /// URLs requested so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl HttpClient for QueuedHttp {
    async fn get(&self, url: &str, _accept: &str) -> Result<HttpResponse, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        let next = self.queue.borrow_mut().pop_front();
        match next {
            Some(Queued::Ready(reply)) => reply,
            Some(Queued::Deferred(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(FetchError::Network("request aborted".to_string()))),
            None => Err(FetchError::Network("no response queued".to_string())),
        }
    }
}

/// Theme surface writing `data-theme` on an in-memory document element
pub struct MemoryTheme {
    element: MemoryElement,
    prefers_dark: Cell<bool>,
}

impl MemoryTheme {
    pub fn new(element: MemoryElement) -> Self {
        Self {
            element,
            prefers_dark: Cell::new(false),
        }
    }

    pub fn set_prefers_dark(&self, prefers_dark: bool) {
        self.prefers_dark.set(prefers_dark);
    }
}

impl ThemeSurface for MemoryTheme {
    fn prefers_dark(&self) -> bool {
        self.prefers_dark.get()
    }

    fn theme_attribute(&self) -> Option<String> {
        self.element.get_attribute("data-theme")
    }

    fn set_theme_attribute(&self, value: &str) {
        self.element.set_attribute("data-theme", value);
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use host::MemoryHost;

#[cfg(not(target_arch = "wasm32"))]
mod host {
    use super::*;
    use crate::capabilities::native::TokioSpawner;
    use crate::capabilities::Host;

    /// Every in-memory capability bundled with concrete handles, spawning on
    /// the current tokio `LocalSet`
    pub struct MemoryHost {
        pub store: Rc<MemoryStore>,
        pub clipboard: Rc<MemoryClipboard>,
        pub connectivity: Rc<ManualConnectivity>,
        pub clock: Rc<ManualClock>,
        pub http: Rc<QueuedHttp>,
        pub theme: Rc<MemoryTheme>,
        pub document_element: MemoryElement,
    }

    impl MemoryHost {
        pub fn new() -> Self {
            Self::with_document_element(MemoryElement::new("html"))
        }

        /// Theme writes go to `document_element`
        pub fn with_document_element(document_element: MemoryElement) -> Self {
            Self {
                store: Rc::new(MemoryStore::new()),
                clipboard: Rc::new(MemoryClipboard::new()),
                connectivity: Rc::new(ManualConnectivity::new(true)),
                clock: Rc::new(ManualClock::default()),
                http: Rc::new(QueuedHttp::new()),
                theme: Rc::new(MemoryTheme::new(document_element.clone())),
                document_element,
            }
        }

        pub fn host(&self) -> Host {
            Host {
                store: self.store.clone(),
                clipboard: self.clipboard.clone(),
                connectivity: self.connectivity.clone(),
                clock: self.clock.clone(),
                http: self.http.clone(),
                theme: self.theme.clone(),
                spawner: Rc::new(TokioSpawner),
            }
        }
    }

    impl Default for MemoryHost {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_roundtrip_and_unavailable() {
        let store = MemoryStore::new();
        store.set("z8_theme", "night").unwrap();
        assert_eq!(store.get("z8_theme").unwrap().as_deref(), Some("night"));

        store.set_available(false);
        assert_eq!(store.get("z8_theme"), Err(StorageError::Unavailable));
        assert!(store.set("z8_theme", "cooperate").is_err());
        assert_eq!(store.peek("z8_theme").as_deref(), Some("night"));
    }

    #[test]
    fn test_connectivity_notifies_until_unsubscribed() {
        let net = ManualConnectivity::new(true);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let sub = net.subscribe(Rc::new(move |online| sink.borrow_mut().push(online)));

        net.set_online(false);
        net.set_online(false);
        net.set_online(true);
        assert_eq!(*seen.borrow(), vec![false, true]);

        drop(sub);
        assert_eq!(net.listener_count(), 0);
        net.set_online(false);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_manual_clock_fires_timers_in_order() {
        let clock = ManualClock::default();
        let log = Rc::new(RefCell::new(Vec::new()));

        let sink = log.clone();
        let _late = clock.set_timeout(
            Duration::from_millis(1200),
            Box::new(move || sink.borrow_mut().push("timeout")),
        );
        let sink = log.clone();
        let _tick = clock.set_interval(
            Duration::from_millis(1000),
            Rc::new(move || sink.borrow_mut().push("tick")),
        );

        clock.advance(Duration::from_millis(2500));
        assert_eq!(*log.borrow(), vec!["tick", "timeout", "tick"]);
        assert_eq!(clock.now_ms(), 2500.0);
        assert_eq!(clock.local_time(), "12:00:02");
    }

    #[test]
    fn test_manual_clock_cancelled_timer_does_not_fire() {
        let clock = ManualClock::default();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let handle = clock.set_timeout(Duration::from_millis(10), Box::new(move || flag.set(true)));
        drop(handle);

        clock.advance(Duration::from_millis(100));
        assert!(!fired.get());
        assert_eq!(clock.pending(), 0);
    }

    #[tokio::test]
    async fn test_queued_http_replies_in_order() {
        let http = QueuedHttp::new();
        http.push_json(r#"{"ok":true}"#);
        http.push_error(FetchError::Timeout);

        let first = http.get("/api/hello", "application/json").await.unwrap();
        assert!(first.is_json());
        assert_eq!(
            http.get("/api/hello", "application/json").await,
            Err(FetchError::Timeout)
        );
        assert!(http.get("/api/hello", "application/json").await.is_err());
        assert_eq!(http.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_clipboard_records_and_denies() {
        let clipboard = MemoryClipboard::new();
        clipboard.write_text("pip install -e .").await.unwrap();
        assert_eq!(clipboard.contents().as_deref(), Some("pip install -e ."));

        clipboard.set_deny(true);
        assert!(clipboard.write_text("other").await.is_err());
        assert_eq!(clipboard.writes(), 2);
    }

    #[test]
    fn test_theme_surface_writes_document_element() {
        let html = MemoryElement::new("html");
        let theme = MemoryTheme::new(html.clone());
        theme.set_theme_attribute("night");
        assert_eq!(html.get_attribute("data-theme").as_deref(), Some("night"));
        assert_eq!(theme.theme_attribute().as_deref(), Some("night"));
    }
}
