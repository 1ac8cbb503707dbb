//! `<z8-island-pref>`: a checkbox persisted to the key-value store

use crate::bridge::{Attributes, Island, Link};
use crate::capabilities::Host;
use crate::view::{Event, EventKind, Node};

pub const DEFAULT_STORAGE_KEY: &str = "z8_island_pref";
pub const DEFAULT_LABEL: &str = "Remember I like islands";

#[derive(Debug, Clone, PartialEq)]
pub struct IslandPrefConfig {
    pub storage_key: String,
    pub label: String,
}

/// Stored preference; unreadable storage counts as unchecked
pub fn load_pref(host: &Host, key: &str) -> bool {
    match host.store.get(key) {
        Ok(value) => value.as_deref() == Some("1"),
        Err(e) => {
            tracing::debug!(key, error = %e, "preference unreadable");
            false
        }
    }
}

/// Persist as `"1"`/`"0"`; failures are ignored
pub fn save_pref(host: &Host, key: &str, checked: bool) {
    if let Err(e) = host.store.set(key, if checked { "1" } else { "0" }) {
        tracing::debug!(key, error = %e, "preference not persisted");
    }
}

pub struct IslandPref {
    checked: bool,
    storage_key: String,
}

impl Island for IslandPref {
    const TAG: &'static str = "z8-island-pref";
    const OBSERVED: &'static [&'static str] = &["storagekey", "label"];
    type Config = IslandPrefConfig;

    fn config(attrs: &Attributes<'_>) -> IslandPrefConfig {
        IslandPrefConfig {
            storage_key: attrs.get_or("storageKey", DEFAULT_STORAGE_KEY),
            label: attrs.get_or("label", DEFAULT_LABEL),
        }
    }

    fn create(link: &Link<Self>, config: &IslandPrefConfig) -> Self {
        IslandPref {
            checked: load_pref(link.host(), &config.storage_key),
            storage_key: config.storage_key.clone(),
        }
    }

    fn configure(&mut self, link: &Link<Self>, config: &IslandPrefConfig) {
        if self.storage_key != config.storage_key {
            self.storage_key = config.storage_key.clone();
            self.checked = load_pref(link.host(), &self.storage_key);
        }
    }

    fn view(&self, config: &IslandPrefConfig, link: &Link<Self>) -> Node {
        let on_change = link.callback(|this, event: &Event, link| {
            if let Event::Change { checked } = event {
                this.checked = *checked;
                save_pref(link.host(), &this.storage_key, *checked);
            }
        });

        Node::el("label")
            .class("label cursor-pointer mt-2")
            .child(Node::el("span").class("label-text").with_text(config.label.as_str()))
            .child(
                Node::el("input")
                    .attr("type", "checkbox")
                    .class("toggle toggle-primary")
                    .flag("checked", self.checked)
                    .on(EventKind::Change, on_change),
            )
    }
}
