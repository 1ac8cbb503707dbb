//! Theme preference and the `<z8-theme-toggle>` island

use std::fmt;

use crate::bridge::{Attributes, Island, Link};
use crate::capabilities::Host;
use crate::view::{Event, EventKind, Node};

/// Storage key holding the chosen theme
pub const THEME_KEY: &str = "z8_theme";

/// Document theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    /// Dark
    Night,
    /// Light
    Cooperate,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Night => "night",
            Theme::Cooperate => "cooperate",
        }
    }

    /// Parse a stored value. Anything outside the vocabulary, including the
    /// retired `luxury`/`light` names, is unknown.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "night" => Some(Theme::Night),
            "cooperate" => Some(Theme::Cooperate),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Night => Theme::Cooperate,
            Theme::Cooperate => Theme::Night,
        }
    }

    /// Button label offering the other theme
    pub fn toggle_label(self) -> &'static str {
        match self {
            Theme::Night => "Use Light",
            Theme::Cooperate => "Use Dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set `data-theme` on the document and persist the choice. Storage failures
/// are ignored.
pub fn apply_theme(host: &Host, theme: Theme) {
    host.theme.set_theme_attribute(theme.as_str());
    if let Err(e) = host.store.set(THEME_KEY, theme.as_str()) {
        tracing::debug!(error = %e, "theme not persisted");
    }
}

/// Persisted theme, else the system color-scheme preference
pub fn initial_theme(host: &Host) -> Theme {
    match host.store.get(THEME_KEY) {
        Ok(Some(stored)) => {
            if let Some(theme) = Theme::parse(&stored) {
                return theme;
            }
            tracing::debug!(value = %stored, "ignoring unknown stored theme");
        }
        Ok(None) => {}
        Err(e) => tracing::debug!(error = %e, "theme storage unavailable"),
    }
    if host.theme.prefers_dark() {
        Theme::Night
    } else {
        Theme::Cooperate
    }
}

/// Theme currently applied to the document, if it is a known one
pub fn current_theme(host: &Host) -> Option<Theme> {
    host.theme
        .theme_attribute()
        .as_deref()
        .and_then(Theme::parse)
}

/// `<z8-theme-toggle>`: flips between night and cooperate
pub struct ThemeToggle {
    theme: Theme,
}

impl Island for ThemeToggle {
    const TAG: &'static str = "z8-theme-toggle";
    type Config = ();

    fn config(_attrs: &Attributes<'_>) {}

    fn create(link: &Link<Self>, _config: &()) -> Self {
        let theme = initial_theme(link.host());
        apply_theme(link.host(), theme);
        ThemeToggle { theme }
    }

    fn view(&self, _config: &(), link: &Link<Self>) -> Node {
        Node::el("button")
            .class("btn btn-sm")
            .attr("type", "button")
            .on(
                EventKind::Click,
                link.callback(|this, _event: &Event, link| {
                    this.theme = this.theme.toggled();
                    apply_theme(link.host(), this.theme);
                }),
            )
            .with_text(self.theme.toggle_label())
    }
}
