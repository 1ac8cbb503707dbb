//! Shipped islands
//!
//! | Tag | Attributes |
//! |---|---|
//! | `z8-theme-toggle` | |
//! | `z8-copy-button` | `text`, `label`, `copiedLabel` / `copied-label` |
//! | `z8-clock` | |
//! | `z8-online-badge` | |
//! | `z8-island-pref` | `storageKey`, `label` |
//! | `z8-ping` | `endpoint` |

pub mod clock;
pub mod copy_button;
pub mod island_pref;
pub mod online_badge;
pub mod ping;
pub mod theme;

pub use clock::Clock;
pub use copy_button::CopyButton;
pub use island_pref::IslandPref;
pub use online_badge::OnlineBadge;
pub use ping::{benchmark, Ping, PingResult};
pub use theme::{apply_theme, initial_theme, Theme, ThemeToggle, THEME_KEY};

use crate::bridge::ElementRegistry;

/// Define every shipped island. Already defined tags are left alone; returns
/// how many tags were newly defined.
pub fn define_all(registry: &ElementRegistry) -> usize {
    [
        registry.define::<ThemeToggle>(),
        registry.define::<CopyButton>(),
        registry.define::<Clock>(),
        registry.define::<OnlineBadge>(),
        registry.define::<IslandPref>(),
        registry.define::<Ping>(),
    ]
    .into_iter()
    .filter(|defined| *defined)
    .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_all_is_idempotent() {
        let registry = ElementRegistry::new();
        assert_eq!(define_all(&registry), 6);
        assert_eq!(define_all(&registry), 0);
        assert_eq!(
            registry.tags(),
            vec![
                "z8-clock",
                "z8-copy-button",
                "z8-island-pref",
                "z8-online-badge",
                "z8-ping",
                "z8-theme-toggle"
            ]
        );
    }
}
