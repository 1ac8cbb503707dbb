//! `index` module: the "try the API" button

use async_trait::async_trait;
use std::rc::Rc;

use crate::capabilities::Host;
use crate::dom::ElementRef;
use crate::loader::{PageContext, PageModule};
use crate::view::{Event, EventKind, Node};
use crate::widgets::ping::DEFAULT_ENDPOINT;

pub const LOADING_TEXT: &str = "Loading…";
pub const NETWORK_ERROR_TEXT: &str = "Network error. Check console for details.";

/// Wires `#try-api` to fetch the hello endpoint into `#api-response`
pub struct IndexPage {
    host: Host,
}

impl IndexPage {
    pub fn new(host: Host) -> Self {
        Self { host }
    }
}

/// Fetch the hello endpoint and write the outcome into `out`
pub async fn show_api_response(host: &Host, out: &ElementRef) {
    out.set_text_content(LOADING_TEXT);

    let response = match host.http.get(DEFAULT_ENDPOINT, "application/json").await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "hello request failed");
            out.set_text_content(NETWORK_ERROR_TEXT);
            return;
        }
    };
    if !response.ok() {
        out.set_text_content(&format!("Error {}: {}", response.status, response.status_text));
        return;
    }

    let data: serde_json::Value = match serde_json::from_str(&response.body) {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(error = %e, "hello response is not JSON");
            out.set_text_content(NETWORK_ERROR_TEXT);
            return;
        }
    };
    let text = match data {
        serde_json::Value::String(text) => text,
        other => serde_json::to_string_pretty(&other).unwrap_or_default(),
    };
    out.replace_children(vec![Node::el("pre")
        .class("bg-base-300 p-3 rounded overflow-x-auto text-sm")
        .with_text(text)]);
}

#[async_trait(?Send)]
impl PageModule for IndexPage {
    async fn run(&self, ctx: &PageContext) -> anyhow::Result<()> {
        let (Some(button), Some(out)) = (
            ctx.body.find_by_id("try-api"),
            ctx.body.find_by_id("api-response"),
        ) else {
            tracing::debug!("index page has no API demo");
            return Ok(());
        };
        if !button.try_wire() {
            return Ok(());
        }

        let host = self.host.clone();
        button.add_listener(
            EventKind::Click,
            Rc::new(move |_event: &Event| {
                let host = host.clone();
                let out = out.clone();
                host.clone().spawn(async move { show_api_response(&host, &out).await });
            }),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::memory::MemoryHost;
    use crate::capabilities::HttpResponse;
    use crate::dom::memory::MemoryElement;
    use crate::dom::DomElement;
    use crate::error::FetchError;
    use crate::loader::PageIdentifier;
    use tokio::task::LocalSet;

    struct Fixture {
        mem: MemoryHost,
        body: MemoryElement,
        button: MemoryElement,
        out: MemoryElement,
    }

    fn fixture() -> Fixture {
        let body = MemoryElement::new("body");
        let button = MemoryElement::new("button").with_attribute("id", "try-api");
        let out = MemoryElement::new("div").with_attribute("id", "api-response");
        body.append_child(&button);
        body.append_child(&out);
        Fixture {
            mem: MemoryHost::new(),
            body,
            button,
            out,
        }
    }

    async fn run(f: &Fixture) {
        let ctx = PageContext::new(PageIdentifier::new("index"), Rc::new(f.body.clone()));
        IndexPage::new(f.mem.host()).run(&ctx).await.unwrap();
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_wiring_twice_attaches_once() {
        LocalSet::new()
            .run_until(async {
                let f = fixture();
                run(&f).await;
                run(&f).await;
                assert_eq!(f.button.listener_count(EventKind::Click), 1);

                f.mem.http.push_json(r#"{"message":"hi"}"#);
                f.button.click();
                settle().await;
                assert_eq!(f.mem.http.requests().len(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn test_success_renders_pretty_json() {
        LocalSet::new()
            .run_until(async {
                let f = fixture();
                run(&f).await;
                let reply = f.mem.http.defer();

                f.button.click();
                settle().await;
                assert_eq!(f.out.text_content(), "Loading…");

                reply
                    .send(Ok(HttpResponse {
                        status: 200,
                        status_text: "OK".to_string(),
                        content_type: Some("application/json".to_string()),
                        body: r#"{"message":"hi"}"#.to_string(),
                    }))
                    .unwrap();
                settle().await;

                let pre = f.out.find_first("pre").unwrap();
                assert_eq!(pre.text_content(), "{\n  \"message\": \"hi\"\n}");
                assert_eq!(
                    pre.get_attribute("class").as_deref(),
                    Some("bg-base-300 p-3 rounded overflow-x-auto text-sm")
                );
            })
            .await;
    }

    #[tokio::test]
    async fn test_error_status_and_network_failure() {
        LocalSet::new()
            .run_until(async {
                let f = fixture();
                run(&f).await;

                f.mem.http.push_response(HttpResponse {
                    status: 500,
                    status_text: "Internal Server Error".to_string(),
                    content_type: None,
                    body: String::new(),
                });
                f.button.click();
                settle().await;
                assert_eq!(f.out.text_content(), "Error 500: Internal Server Error");

                f.mem.http.push_error(FetchError::Network("refused".to_string()));
                f.button.click();
                settle().await;
                assert_eq!(f.out.text_content(), NETWORK_ERROR_TEXT);

                f.mem.http.push_json("{broken");
                f.button.click();
                settle().await;
                assert_eq!(f.out.text_content(), NETWORK_ERROR_TEXT);
            })
            .await;
    }

    #[tokio::test]
    async fn test_missing_elements_is_noop() {
        let mem = MemoryHost::new();
        let body = MemoryElement::new("body");
        let ctx = PageContext::new(PageIdentifier::new("index"), Rc::new(body));
        assert!(IndexPage::new(mem.host()).run(&ctx).await.is_ok());
    }
}
