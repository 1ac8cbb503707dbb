//! `<z8-copy-button>`: copies fixed text to the clipboard

use std::time::Duration;

use crate::bridge::{Attributes, Island, Link};
use crate::capabilities::TimerHandle;
use crate::view::{Event, EventKind, Node};

pub const DEFAULT_TEXT: &str = "pip install -e .";
pub const DEFAULT_LABEL: &str = "Copy install";
pub const DEFAULT_COPIED_LABEL: &str = "Copied!";
pub const FAILED_LABEL: &str = "Copy failed";

/// How long the copied/failed label stays up
pub const RESET_AFTER: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, PartialEq)]
pub struct CopyButtonConfig {
    pub text: String,
    pub label: String,
    pub copied_label: String,
}

pub struct CopyButton {
    /// Label shown instead of the configured one
    flash: Option<String>,
    reset: Option<TimerHandle>,
    label: String,
}

impl CopyButton {
    fn show(&mut self, label: String, link: &Link<Self>) {
        self.flash = Some(label);
        let reset_link = link.clone();
        self.reset = Some(link.host().clock.set_timeout(
            RESET_AFTER,
            Box::new(move || {
                reset_link.update(|this| {
                    this.flash = None;
                    this.reset = None;
                });
            }),
        ));
    }
}

impl Island for CopyButton {
    const TAG: &'static str = "z8-copy-button";
    const OBSERVED: &'static [&'static str] = &["text", "label", "copiedlabel", "copied-label"];
    type Config = CopyButtonConfig;

    fn config(attrs: &Attributes<'_>) -> CopyButtonConfig {
        CopyButtonConfig {
            text: attrs.get_or("text", DEFAULT_TEXT),
            label: attrs.get_or("label", DEFAULT_LABEL),
            copied_label: attrs.first_or(&["copiedLabel", "copied-label"], DEFAULT_COPIED_LABEL),
        }
    }

    fn create(_link: &Link<Self>, config: &CopyButtonConfig) -> Self {
        CopyButton {
            flash: None,
            reset: None,
            label: config.label.clone(),
        }
    }

    fn configure(&mut self, _link: &Link<Self>, config: &CopyButtonConfig) {
        // a new label replaces whatever is showing
        if self.label != config.label {
            self.label = config.label.clone();
            self.flash = None;
            self.reset = None;
        }
    }

    fn view(&self, config: &CopyButtonConfig, link: &Link<Self>) -> Node {
        let text = config.text.clone();
        let copied = config.copied_label.clone();
        let on_click = link.callback(move |this, _event: &Event, link| {
            this.reset = None;
            let clipboard = link.host().clipboard.clone();
            let text = text.clone();
            let copied = copied.clone();
            let task_link = link.clone();
            link.spawn(async move {
                let label = match clipboard.write_text(&text).await {
                    Ok(()) => copied,
                    Err(e) => {
                        tracing::warn!(error = %e, "clipboard write failed");
                        FAILED_LABEL.to_string()
                    }
                };
                let show_link = task_link.clone();
                task_link.update(move |this| this.show(label, &show_link));
            });
        });

        Node::el("button")
            .class("btn btn-sm btn-outline")
            .attr("type", "button")
            .on(EventKind::Click, on_click)
            .with_text(self.flash.as_deref().unwrap_or(&config.label))
    }

    fn unmount(&mut self) {
        self.reset = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::IslandElement;
    use crate::capabilities::memory::MemoryHost;
    use crate::dom::memory::MemoryElement;
    use crate::dom::DomElement;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_config_defaults_and_aliases() {
        let el = MemoryElement::new("z8-copy-button");
        let config = CopyButton::config(&Attributes::new(&el));
        assert_eq!(config.text, "pip install -e .");
        assert_eq!(config.label, "Copy install");
        assert_eq!(config.copied_label, "Copied!");

        el.set_attribute("copied-label", "Done");
        assert_eq!(CopyButton::config(&Attributes::new(&el)).copied_label, "Done");

        el.set_attribute("copiedlabel", "Yes");
        assert_eq!(CopyButton::config(&Attributes::new(&el)).copied_label, "Yes");
    }

    #[tokio::test]
    async fn test_copy_shows_copied_then_resets() {
        LocalSet::new()
            .run_until(async {
                let mem = MemoryHost::new();
                let el = MemoryElement::new(CopyButton::TAG).with_attribute("text", "cargo add z8");
                let mut island = IslandElement::<CopyButton>::new(Rc::new(el.clone()), mem.host());
                island.connected();
                assert_eq!(el.text_content(), "Copy install");

                el.find_first("button").unwrap().click();
                settle().await;
                assert_eq!(mem.clipboard.contents().as_deref(), Some("cargo add z8"));
                assert_eq!(el.text_content(), "Copied!");

                mem.clock.advance(Duration::from_millis(1199));
                assert_eq!(el.text_content(), "Copied!");
                mem.clock.advance(Duration::from_millis(1));
                assert_eq!(el.text_content(), "Copy install");
            })
            .await;
    }

    #[tokio::test]
    async fn test_copy_failure_label() {
        LocalSet::new()
            .run_until(async {
                let mem = MemoryHost::new();
                mem.clipboard.set_deny(true);
                let el = MemoryElement::new(CopyButton::TAG);
                let mut island = IslandElement::<CopyButton>::new(Rc::new(el.clone()), mem.host());
                island.connected();

                el.find_first("button").unwrap().click();
                settle().await;
                assert_eq!(el.text_content(), "Copy failed");
                mem.clock.advance(RESET_AFTER);
                assert_eq!(el.text_content(), "Copy install");
            })
            .await;
    }

    #[tokio::test]
    async fn test_disconnect_cancels_pending_reset() {
        LocalSet::new()
            .run_until(async {
                let mem = MemoryHost::new();
                let el = MemoryElement::new(CopyButton::TAG);
                let mut island = IslandElement::<CopyButton>::new(Rc::new(el.clone()), mem.host());
                island.connected();

                el.find_first("button").unwrap().click();
                settle().await;
                assert_eq!(mem.clock.pending(), 1);

                island.disconnected();
                assert_eq!(mem.clock.pending(), 0);
            })
            .await;
    }
}
