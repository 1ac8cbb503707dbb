//! `about` module: renders the about layout into `#about-root` and wires its
//! toolbar, preference checkbox and latency demo

use async_trait::async_trait;
use std::cell::RefCell;
use std::rc::Rc;

use crate::capabilities::{Host, Subscription, TimerHandle};
use crate::dom::ElementRef;
use crate::loader::{PageContext, PageModule};
use crate::view::{Event, EventKind, Node};
use crate::widgets::clock::TICK;
use crate::widgets::copy_button::{
    DEFAULT_COPIED_LABEL, DEFAULT_LABEL, DEFAULT_TEXT, FAILED_LABEL, RESET_AFTER,
};
use crate::widgets::island_pref::{load_pref, save_pref, DEFAULT_STORAGE_KEY};
use crate::widgets::online_badge::badge;
use crate::widgets::ping::{benchmark, PingResult, DEFAULT_ENDPOINT};
use crate::widgets::theme::{apply_theme, current_theme, initial_theme, Theme};

pub const PING_NETWORK_ERROR_TEXT: &str = "Network error. See console.";

/// Timers and subscriptions owned by one wired root
struct AboutWiring {
    _clock: TimerHandle,
    _net: Subscription,
    _copy_reset: Rc<RefCell<Option<TimerHandle>>>,
}

pub struct AboutPage {
    host: Host,
    wirings: RefCell<Vec<AboutWiring>>,
}

impl AboutPage {
    pub fn new(host: Host) -> Self {
        Self {
            host,
            wirings: RefCell::new(Vec::new()),
        }
    }

    /// Stop the clock and connectivity updates of every wired root
    #[cfg(test)]
    pub(crate) fn cleanup(&self) {
        self.wirings.borrow_mut().clear();
    }

    fn wire(&self, root: &ElementRef) -> AboutWiring {
        let host = &self.host;
        root.replace_children(vec![layout()]);

        // theme
        apply_theme(host, initial_theme(host));
        if let Some(button) = root.find_by_id("about-theme") {
            let host = host.clone();
            button.add_listener(
                EventKind::Click,
                Rc::new(move |_event: &Event| {
                    let next = match current_theme(&host) {
                        Some(Theme::Night) => Theme::Cooperate,
                        _ => Theme::Night,
                    };
                    apply_theme(&host, next);
                }),
            );
        }

        // clipboard
        let copy_reset: Rc<RefCell<Option<TimerHandle>>> = Rc::default();
        if let Some(button) = root.find_by_id("about-copy") {
            let host = host.clone();
            let reset = copy_reset.clone();
            let target = button.clone();
            button.add_listener(
                EventKind::Click,
                Rc::new(move |_event: &Event| {
                    let host = host.clone();
                    let reset = reset.clone();
                    let target = target.clone();
                    host.clone().spawn(async move {
                        let label = match host.clipboard.write_text(DEFAULT_TEXT).await {
                            Ok(()) => DEFAULT_COPIED_LABEL,
                            Err(e) => {
                                tracing::warn!(error = %e, "clipboard write failed");
                                FAILED_LABEL
                            }
                        };
                        target.set_text_content(label);
                        let restore = target.clone();
                        let timer = host.clock.set_timeout(
                            RESET_AFTER,
                            Box::new(move || restore.set_text_content(DEFAULT_LABEL)),
                        );
                        *reset.borrow_mut() = Some(timer);
                    });
                }),
            );
        }

        // connectivity
        let net = root.find_by_id("about-net");
        let show_net = move |online: bool| {
            if let Some(net) = &net {
                let (class, text) = badge(online);
                net.set_attribute("class", class);
                net.set_text_content(text);
            }
        };
        show_net(host.connectivity.is_online());
        let net_subscription = host.connectivity.subscribe(Rc::new(show_net));

        // clock
        let clock_el = root.find_by_id("about-clock");
        let clock = host.clock.clone();
        let tick = move || {
            if let Some(el) = &clock_el {
                el.set_text_content(&clock.local_time());
            }
        };
        tick();
        let clock_timer = host.clock.set_interval(TICK, Rc::new(tick));

        // persisted preference
        if let Some(pref) = root.find_by_id("about-island-pref") {
            pref.set_checked(load_pref(host, DEFAULT_STORAGE_KEY));
            let host = host.clone();
            let target = pref.clone();
            pref.add_listener(
                EventKind::Change,
                Rc::new(move |_event: &Event| {
                    save_pref(&host, DEFAULT_STORAGE_KEY, target.is_checked());
                }),
            );
        }

        // latency benchmark
        let ping_parts = (root.find_by_id("about-ping"), root.find_by_id("about-ping-out"));
        if let (Some(button), Some(out)) = ping_parts {
            let host = host.clone();
            let target = button.clone();
            button.add_listener(
                EventKind::Click,
                Rc::new(move |_event: &Event| {
                    let host = host.clone();
                    let button = target.clone();
                    let out = out.clone();
                    button.set_disabled(true);
                    out.set_text_content("Pinging…");
                    host.clone().spawn(async move {
                        let result =
                            benchmark(host.http.as_ref(), host.clock.as_ref(), DEFAULT_ENDPOINT)
                                .await;
                        if result.is_network_error() {
                            out.set_text_content(PING_NETWORK_ERROR_TEXT);
                        } else {
                            let status_class = if (200..300).contains(&result.status) {
                                "badge badge-success"
                            } else {
                                "badge badge-error"
                            };
                            let pre = json_block(&result).map(|json| {
                                Node::el("pre")
                                    .class("bg-base-300 mt-2 p-3 rounded overflow-x-auto text-xs")
                                    .with_text(json)
                            });
                            let mut nodes = vec![
                                Node::el("span")
                                    .class(status_class)
                                    .with_text(result.status.to_string()),
                                Node::el("span")
                                    .class("badge badge-ghost ml-2")
                                    .with_text(format!("{} ms", result.ms)),
                            ];
                            nodes.extend(pre);
                            out.replace_children(nodes);
                        }
                        button.set_disabled(false);
                    });
                }),
            );
        }

        AboutWiring {
            _clock: clock_timer,
            _net: net_subscription,
            _copy_reset: copy_reset,
        }
    }
}

#[async_trait(?Send)]
impl PageModule for AboutPage {
    async fn run(&self, ctx: &PageContext) -> anyhow::Result<()> {
        let Some(root) = ctx.body.find_by_id("about-root") else {
            return Ok(());
        };
        if !root.try_wire() {
            tracing::debug!("about root already wired");
            return Ok(());
        }
        let wiring = self.wire(&root);
        self.wirings.borrow_mut().push(wiring);
        Ok(())
    }
}

/// Pretty JSON for the benchmark output. Bodies that are not a JSON object
/// or array, whatever their content type, show nothing.
fn json_block(result: &PingResult) -> Option<String> {
    result.pretty_json().or_else(|| {
        let parsed: serde_json::Value = serde_json::from_str(result.text()?).ok()?;
        if parsed.is_object() || parsed.is_array() {
            serde_json::to_string_pretty(&parsed).ok()
        } else {
            None
        }
    })
}

fn card(children: Vec<Node>) -> Node {
    Node::el("div")
        .class("card bg-base-200")
        .child(Node::el("div").class("card-body").children(children))
}

fn principle(icon: &str, text: &str) -> Node {
    Node::el("li")
        .class("flex items-start gap-3")
        .child(Node::el("span").with_text(icon))
        .child(Node::el("span").with_text(text))
}

/// Markup rendered into `#about-root`
pub fn layout() -> Node {
    let toolbar = Node::el("div")
        .class("mt-4 flex flex-wrap items-center justify-center gap-3")
        .child(Node::el("button").id("about-theme").class("btn btn-sm").with_text("Toggle theme"))
        .child(
            Node::el("button")
                .id("about-copy")
                .class("btn btn-sm btn-outline")
                .with_text(DEFAULT_LABEL),
        )
        .child(Node::el("span").id("about-net").class("badge badge-outline").with_text("…"))
        .child(
            Node::el("span")
                .class("badge badge-ghost")
                .child(Node::el("span").id("about-clock").with_text("--:--:--")),
        );

    let hero = Node::el("section")
        .class("hero bg-base-200 rounded-2xl p-8 md:p-12")
        .child(
            Node::el("div")
                .class("hero-content flex-col gap-4 text-center")
                .child(
                    Node::el("h1")
                        .class("text-4xl md:text-5xl font-extrabold tracking-tight")
                        .with_text("About Z8ter"),
                )
                .child(
                    Node::el("p")
                        .class("opacity-90 text-lg")
                        .with_text("Async Python, SSR-first. Small, fast, and convention-driven."),
                )
                .child(toolbar),
        );

    let what = card(vec![
        Node::el("h2").class("card-title").with_text("What is Z8ter?"),
        Node::el("p").class("opacity-80").with_text(
            "A minimal full-stack framework built on Starlette + Jinja2. File-based routing \
             for views, decorator-driven APIs, and a tiny per-page JS loader for just-enough \
             interactivity.",
        ),
    ]);

    let principles = card(vec![
        Node::el("h2").class("card-title").with_text("Principles"),
        Node::el("ul").class("space-y-2 text-sm").children([
            principle("📂", "Conventions over config"),
            principle("⚡", "Async-first, SSR-first"),
            principle("🧩", "Small surface area, sharp tools"),
        ]),
        Node::el("label")
            .class("label cursor-pointer mt-4")
            .child(Node::el("span").class("label-text").with_text("Remember I like islands"))
            .child(
                Node::el("input")
                    .id("about-island-pref")
                    .attr("type", "checkbox")
                    .class("toggle toggle-primary"),
            ),
    ]);

    let demos = card(vec![
        Node::el("h2").class("card-title").with_text("Client demos"),
        Node::el("p")
            .class("opacity-80")
            .with_text("Benchmark an API call locally and pretty-print the JSON."),
        Node::el("div").class("flex gap-3").child(
            Node::el("button")
                .id("about-ping")
                .class("btn btn-primary btn-sm")
                .with_text(format!("Benchmark {}", DEFAULT_ENDPOINT)),
        ),
        Node::el("div").id("about-ping-out").class("mt-3 text-sm"),
    ]);

    Node::el("div")
        .child(hero)
        .child(
            Node::el("section")
                .class("mt-10 grid md:grid-cols-2 gap-8")
                .child(what)
                .child(principles),
        )
        .child(Node::el("section").class("mt-10").child(demos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::memory::MemoryHost;
    use crate::capabilities::KeyValueStore;
    use crate::dom::memory::MemoryElement;
    use crate::dom::DomElement;
    use crate::capabilities::HttpResponse;
    use crate::error::FetchError;
    use crate::loader::PageIdentifier;
    use std::time::Duration;
    use tokio::task::LocalSet;

    fn setup() -> (MemoryHost, MemoryElement, AboutPage, PageContext) {
        let mem = MemoryHost::new();
        let body = MemoryElement::new("body");
        body.append_child(&MemoryElement::new("main").with_attribute("id", "about-root"));
        let page = AboutPage::new(mem.host());
        let ctx = PageContext::new(PageIdentifier::new("about"), Rc::new(body.clone()));
        (mem, body, page, ctx)
    }

    fn by_id(body: &MemoryElement, id: &str) -> MemoryElement {
        body.find_id(id).unwrap()
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_wiring_twice_attaches_handlers_once() {
        let (mem, body, page, ctx) = setup();
        page.run(&ctx).await.unwrap();
        let copy = by_id(&body, "about-copy");
        page.run(&ctx).await.unwrap();

        // second run neither re-rendered nor re-wired
        assert!(by_id(&body, "about-copy").is_same(&copy));
        assert_eq!(copy.listener_count(EventKind::Click), 1);
        assert_eq!(by_id(&body, "about-ping").listener_count(EventKind::Click), 1);
        assert_eq!(mem.connectivity.listener_count(), 1);
        assert_eq!(mem.clock.pending(), 1);
    }

    #[tokio::test]
    async fn test_toolbar_state() {
        let (mem, body, page, ctx) = setup();
        mem.store.set("z8_island_pref", "1").unwrap();
        page.run(&ctx).await.unwrap();

        assert_eq!(by_id(&body, "about-net").text_content(), "Online");
        assert_eq!(by_id(&body, "about-clock").text_content(), "12:00:00");
        assert!(by_id(&body, "about-island-pref").is_checked());

        mem.connectivity.set_online(false);
        let net = by_id(&body, "about-net");
        assert_eq!(net.text_content(), "Offline");
        assert_eq!(net.get_attribute("class").as_deref(), Some("badge badge-error"));

        mem.clock.advance(Duration::from_secs(2));
        assert_eq!(by_id(&body, "about-clock").text_content(), "12:00:02");

        by_id(&body, "about-island-pref").dispatch(&Event::Change { checked: false });
        assert_eq!(mem.store.peek("z8_island_pref").as_deref(), Some("0"));

        by_id(&body, "about-theme").click();
        assert_eq!(mem.document_element.get_attribute("data-theme").as_deref(), Some("night"));
        by_id(&body, "about-theme").click();
        assert_eq!(
            mem.document_element.get_attribute("data-theme").as_deref(),
            Some("cooperate")
        );

        page.cleanup();
        assert_eq!(mem.connectivity.listener_count(), 0);
        assert_eq!(mem.clock.pending(), 0);
    }

    #[tokio::test]
    async fn test_copy_and_ping() {
        LocalSet::new()
            .run_until(async {
                let (mem, body, page, ctx) = setup();
                page.run(&ctx).await.unwrap();

                by_id(&body, "about-copy").click();
                settle().await;
                assert_eq!(mem.clipboard.contents().as_deref(), Some("pip install -e ."));
                assert_eq!(by_id(&body, "about-copy").text_content(), "Copied!");
                mem.clock.advance(RESET_AFTER);
                assert_eq!(by_id(&body, "about-copy").text_content(), "Copy install");

                mem.http.push_json(r#"{"message":"hello"}"#);
                by_id(&body, "about-ping").click();
                settle().await;
                let out = by_id(&body, "about-ping-out");
                assert!(out.text_content().starts_with("200"));
                assert!(out.find_first("pre").is_some());
                assert!(!by_id(&body, "about-ping").has_attribute("disabled"));

                mem.http.push_error(FetchError::Timeout);
                by_id(&body, "about-ping").click();
                settle().await;
                assert_eq!(by_id(&body, "about-ping-out").text_content(), PING_NETWORK_ERROR_TEXT);
            })
            .await;
    }

    fn text_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            status_text: "Service Unavailable".to_string(),
            content_type: Some("text/plain".to_string()),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_ping_text_body_shows_no_json_block() {
        LocalSet::new()
            .run_until(async {
                let (mem, body, page, ctx) = setup();
                page.run(&ctx).await.unwrap();

                mem.http.push_response(text_response(503, "down"));
                by_id(&body, "about-ping").click();
                settle().await;
                let out = by_id(&body, "about-ping-out");
                assert_eq!(out.text_content(), "5030 ms");
                assert!(out.find_first("pre").is_none());
                assert_eq!(
                    out.find_first("span").unwrap().get_attribute("class").as_deref(),
                    Some("badge badge-error")
                );

                // JSON served as text still parses, like the browser's res.json()
                mem.http.push_response(text_response(200, r#"{"ok":true}"#));
                by_id(&body, "about-ping").click();
                settle().await;
                let pre = by_id(&body, "about-ping-out").find_first("pre").unwrap();
                assert!(pre.text_content().contains("\"ok\": true"));
            })
            .await;
    }

    #[tokio::test]
    async fn test_missing_root_is_noop() {
        let mem = MemoryHost::new();
        let body = Rc::new(MemoryElement::new("body"));
        let ctx = PageContext::new(PageIdentifier::new("about"), body);
        let page = AboutPage::new(mem.host());
        assert!(page.run(&ctx).await.is_ok());
        assert_eq!(mem.clock.pending(), 0);
    }
}
