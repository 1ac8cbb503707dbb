//! `<z8-ping>`: endpoint latency benchmark
//!
//! [`benchmark`] is shared by the island, the about page and the CLI.

use serde_json::Value;

use crate::bridge::{Attributes, Island, Link};
use crate::capabilities::{Clock, HttpClient};
use crate::view::{Event, EventKind, Node};

pub const DEFAULT_ENDPOINT: &str = "/api/hello";

/// Status reported when no response arrived
pub const NETWORK_ERROR_STATUS: i32 = -1;

/// One benchmark run
#[derive(Debug, Clone, PartialEq)]
pub struct PingResult {
    /// HTTP status, or [`NETWORK_ERROR_STATUS`]
    pub status: i32,
    /// Round-trip time in whole milliseconds
    pub ms: u64,
    /// Parsed JSON, or the text body as a JSON string. `None` when the body
    /// could not be read or parsed.
    pub body: Option<Value>,
}

impl PingResult {
    /// Status between 1 and 399
    pub fn ok(&self) -> bool {
        self.status > 0 && self.status < 400
    }

    pub fn is_network_error(&self) -> bool {
        self.status == NETWORK_ERROR_STATUS
    }

    /// Badge text for the status
    pub fn status_label(&self) -> String {
        if self.is_network_error() {
            "ERR".to_string()
        } else {
            self.status.to_string()
        }
    }

    /// JSON objects and arrays, pretty-printed
    pub fn pretty_json(&self) -> Option<String> {
        match &self.body {
            Some(value @ (Value::Object(_) | Value::Array(_))) => {
                serde_json::to_string_pretty(value).ok()
            }
            _ => None,
        }
    }

    /// Plain text bodies
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            Some(Value::String(text)) => Some(text),
            _ => None,
        }
    }
}

/// GET `endpoint` with `Accept: application/json` and time it. JSON is parsed
/// when the content type says so; anything else is kept as text.
pub async fn benchmark(http: &dyn HttpClient, clock: &dyn Clock, endpoint: &str) -> PingResult {
    let started = clock.now_ms();
    let result = http.get(endpoint, "application/json").await;
    let ms = (clock.now_ms() - started).max(0.0).round() as u64;

    match result {
        Ok(response) => {
            let body = if response.is_json() {
                serde_json::from_str(&response.body).ok()
            } else {
                Some(Value::String(response.body))
            };
            tracing::debug!(endpoint, status = response.status, ms, "ping finished");
            PingResult {
                status: i32::from(response.status),
                ms,
                body,
            }
        }
        Err(e) => {
            tracing::warn!(endpoint, error = %e, "ping failed");
            PingResult {
                status: NETWORK_ERROR_STATUS,
                ms,
                body: Some(serde_json::json!({ "error": "Network error" })),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PingConfig {
    pub endpoint: String,
}

#[derive(Default)]
pub struct Ping {
    loading: bool,
    result: Option<PingResult>,
}

impl Ping {
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<&PingResult> {
        self.result.as_ref()
    }
}

fn pre(text: impl Into<String>) -> Node {
    Node::el("pre")
        .class("bg-base-300 mt-2 p-3 rounded overflow-x-auto text-xs")
        .with_text(text)
}

impl Island for Ping {
    const TAG: &'static str = "z8-ping";
    const OBSERVED: &'static [&'static str] = &["endpoint"];
    type Config = PingConfig;

    fn config(attrs: &Attributes<'_>) -> PingConfig {
        PingConfig {
            endpoint: attrs.get_or("endpoint", DEFAULT_ENDPOINT),
        }
    }

    fn create(_link: &Link<Self>, _config: &PingConfig) -> Self {
        Ping::default()
    }

    fn view(&self, config: &PingConfig, link: &Link<Self>) -> Node {
        let endpoint = config.endpoint.clone();
        let on_click = link.callback(move |this, _event: &Event, link| {
            if this.loading {
                return;
            }
            this.loading = true;
            this.result = None;

            let host = link.host().clone();
            let endpoint = endpoint.clone();
            let task_link = link.clone();
            link.spawn(async move {
                let result = benchmark(host.http.as_ref(), host.clock.as_ref(), &endpoint).await;
                task_link.update(move |this| {
                    this.loading = false;
                    this.result = Some(result);
                });
            });
        });

        let label = if self.loading {
            "Pinging…".to_string()
        } else {
            format!("Benchmark {}", config.endpoint)
        };
        let button = Node::el("button")
            .class("btn btn-primary btn-sm")
            .attr("type", "button")
            .flag("disabled", self.loading)
            .on(EventKind::Click, on_click)
            .with_text(label);

        let mut output = Node::el("div").class("mt-3 text-sm");
        if let Some(result) = &self.result {
            let status_class = if result.ok() {
                "badge badge-success"
            } else {
                "badge badge-error"
            };
            output = output
                .child(
                    Node::el("div")
                        .class("flex items-center gap-2")
                        .child(
                            Node::el("span")
                                .class(status_class)
                                .with_text(result.status_label()),
                        )
                        .child(
                            Node::el("span")
                                .class("badge badge-ghost")
                                .with_text(format!("{} ms", result.ms)),
                        ),
                )
                .maybe_child(result.pretty_json().map(pre))
                .maybe_child(result.text().map(pre));
        }

        Node::el("div").child(button).child(output)
    }
}
