//! Island element lifecycle adapter

use std::cell::RefCell;
use std::rc::Rc;

use super::{is_observed, AliveToken, Attributes, Core, Island, Link, RenderRoot};
use crate::capabilities::Host;
use crate::dom::DomElement;

/// A host element an island can be mounted on
pub trait HostElement: DomElement {
    /// Create a fresh render root targeting this element
    fn create_root(&self) -> Box<dyn RenderRoot>;

    /// This element as a plain [`DomElement`]
    fn as_dom(&self) -> &dyn DomElement;
}

/// Per-element lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Never connected
    Unattached,
    /// Connected, render root present
    Attached,
    /// Disconnected after being attached; a reconnect mounts afresh
    Disposed,
}

/// Object-safe lifecycle interface handed to hosts by the registry
pub trait CustomElement {
    fn tag(&self) -> &'static str;
    fn lifecycle(&self) -> LifecycleState;
    fn has_root(&self) -> bool;
    fn connected(&mut self);
    fn disconnected(&mut self);
    fn attribute_changed(&mut self, name: &str);
}

struct Mounted<I: Island> {
    core: Rc<Core<I>>,
    link: Link<I>,
}

/// Lifecycle adapter binding an [`Island`] to one host element
pub struct IslandElement<I: Island> {
    element: Rc<dyn HostElement>,
    host: Host,
    state: LifecycleState,
    mounted: Option<Mounted<I>>,
}

impl<I: Island> IslandElement<I> {
    pub fn new(element: Rc<dyn HostElement>, host: Host) -> Self {
        Self {
            element,
            host,
            state: LifecycleState::Unattached,
            mounted: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn has_root(&self) -> bool {
        self.mounted.is_some()
    }

    /// Configuration of the live mount
    pub fn config(&self) -> Option<I::Config> {
        self.mounted
            .as_ref()
            .map(|m| m.core.config.borrow().clone())
    }

    /// Read the live fragment state
    pub fn with_island<R>(&self, f: impl FnOnce(&I) -> R) -> Option<R> {
        let mounted = self.mounted.as_ref()?;
        let island = mounted.core.island.try_borrow().ok()?;
        Some(f(&island))
    }

    /// Link of the live mount
    pub fn link(&self) -> Option<Link<I>> {
        self.mounted.as_ref().map(|m| m.link.clone())
    }

    fn derive_config(&self) -> I::Config {
        I::config(&Attributes::new(self.element.as_dom()))
    }

    fn mount(&self) -> Mounted<I> {
        let root = self.element.create_root();
        let alive = AliveToken::new();
        let config = self.derive_config();
        let host = self.host.clone();

        let core = Rc::new_cyclic(|weak| {
            let link = Link {
                core: weak.clone(),
                alive: alive.clone(),
                host: host.clone(),
            };
            let island = I::create(&link, &config);
            Core {
                island: RefCell::new(island),
                config: RefCell::new(config),
                root: RefCell::new(root),
            }
        });

        let link = Link {
            core: Rc::downgrade(&core),
            alive,
            host,
        };
        tracing::debug!(tag = I::TAG, "island mounted");
        Mounted { core, link }
    }

    /// DOM connection
    pub fn connected(&mut self) {
        if self.mounted.is_none() {
            self.mounted = Some(self.mount());
        }
        if let Some(mounted) = &self.mounted {
            mounted.core.render(&mounted.link);
        }
        self.state = LifecycleState::Attached;
    }

    /// DOM disconnection
    pub fn disconnected(&mut self) {
        let Some(mounted) = self.mounted.take() else {
            return;
        };
        mounted.link.alive.dispose();
        if let Ok(mut island) = mounted.core.island.try_borrow_mut() {
            island.unmount();
        }
        mounted.core.root.borrow_mut().unmount();
        self.state = LifecycleState::Disposed;
        tracing::debug!(tag = I::TAG, "island unmounted");
    }

    /// Attribute mutation; ignored unless observed and attached
    pub fn attribute_changed(&mut self, name: &str) {
        if !is_observed(I::OBSERVED, name) {
            return;
        }
        let Some(mounted) = &self.mounted else {
            tracing::trace!(tag = I::TAG, attribute = name, "attribute change while detached");
            return;
        };

        let config = self.derive_config();
        *mounted.core.config.borrow_mut() = config.clone();
        if let Ok(mut island) = mounted.core.island.try_borrow_mut() {
            island.configure(&mounted.link, &config);
        }
        mounted.core.render(&mounted.link);
    }

    /// Set an attribute on the host element and deliver the change callback.
    /// For hosts without their own mutation callbacks.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.element.set_attribute(name, value);
        self.attribute_changed(name);
    }

    /// Remove an attribute and deliver the change callback
    pub fn remove_attribute(&mut self, name: &str) {
        self.element.remove_attribute(name);
        self.attribute_changed(name);
    }
}

impl<I: Island> CustomElement for IslandElement<I> {
    fn tag(&self) -> &'static str {
        I::TAG
    }

    fn lifecycle(&self) -> LifecycleState {
        self.state
    }

    fn has_root(&self) -> bool {
        IslandElement::has_root(self)
    }

    fn connected(&mut self) {
        IslandElement::connected(self);
    }

    fn disconnected(&mut self) {
        IslandElement::disconnected(self);
    }

    fn attribute_changed(&mut self, name: &str) {
        IslandElement::attribute_changed(self, name);
    }
}

impl<I: Island> Drop for IslandElement<I> {
    fn drop(&mut self) {
        self.disconnected();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::memory::MemoryHost;
    use crate::dom::memory::MemoryElement;
    use crate::view::{Event, EventKind, Node};

    /// Counter fragment: a label from attributes plus internal click count
    struct Counter {
        clicks: u32,
        configured: u32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct CounterConfig {
        label: String,
    }

    impl Island for Counter {
        const TAG: &'static str = "test-counter";
        const OBSERVED: &'static [&'static str] = &["label"];
        type Config = CounterConfig;

        fn config(attrs: &Attributes<'_>) -> CounterConfig {
            CounterConfig {
                label: attrs.get_or("label", "Count"),
            }
        }

        fn create(_link: &Link<Self>, _config: &CounterConfig) -> Self {
            Counter {
                clicks: 0,
                configured: 0,
            }
        }

        fn configure(&mut self, _link: &Link<Self>, _config: &CounterConfig) {
            self.configured += 1;
        }

        fn view(&self, config: &CounterConfig, link: &Link<Self>) -> Node {
            Node::el("button")
                .on(
                    EventKind::Click,
                    link.callback(|this, _event: &Event, _link| this.clicks += 1),
                )
                .with_text(format!("{}: {}", config.label, self.clicks))
        }
    }

    fn setup() -> (MemoryHost, MemoryElement, IslandElement<Counter>) {
        let mem = MemoryHost::new();
        let el = MemoryElement::new(Counter::TAG);
        let island = IslandElement::<Counter>::new(Rc::new(el.clone()), mem.host());
        (mem, el, island)
    }

    #[test]
    fn test_connect_creates_root_and_renders() {
        let (_mem, el, mut island) = setup();
        assert_eq!(island.state(), LifecycleState::Unattached);
        assert!(!island.has_root());

        island.connected();
        assert_eq!(island.state(), LifecycleState::Attached);
        assert!(island.has_root());
        assert_eq!(el.text_content(), "Count: 0");
        assert_eq!(el.ledger().live(), 1);
    }

    #[test]
    fn test_disconnect_disposes_root() {
        let (_mem, el, mut island) = setup();
        island.connected();
        let link = island.link().unwrap();

        island.disconnected();
        assert_eq!(island.state(), LifecycleState::Disposed);
        assert!(!island.has_root());
        assert!(!link.is_alive());
        assert_eq!(el.ledger().live(), 0);
        assert_eq!(el.text_content(), "");
    }

    #[test]
    fn test_reconnect_leaves_exactly_one_live_root() {
        let (_mem, el, mut island) = setup();
        island.connected();
        island.disconnected();
        island.connected();

        assert_eq!(island.state(), LifecycleState::Attached);
        assert_eq!(el.ledger().created(), 2);
        assert_eq!(el.ledger().unmounted(), 1);
        assert_eq!(el.ledger().live(), 1);
    }

    #[test]
    fn test_internal_state_survives_attribute_change_not_reconnect() {
        let (_mem, el, mut island) = setup();
        island.connected();
        el.find_first("button").unwrap().click();
        el.find_first("button").unwrap().click();
        assert_eq!(el.text_content(), "Count: 2");

        island.set_attribute("label", "Clicks");
        assert_eq!(el.text_content(), "Clicks: 2");
        assert_eq!(island.with_island(|c| c.configured), Some(1));

        island.disconnected();
        island.connected();
        assert_eq!(el.text_content(), "Clicks: 0");
    }

    #[test]
    fn test_attribute_change_while_detached_is_not_rendered() {
        let (_mem, el, mut island) = setup();
        island.connected();
        island.disconnected();
        let renders = el.ledger().renders();

        island.set_attribute("label", "Later");
        assert_eq!(el.ledger().renders(), renders);
        assert_eq!(el.text_content(), "");

        island.connected();
        assert_eq!(el.ledger().renders(), renders + 1);
        assert_eq!(el.text_content(), "Later: 0");
        assert_eq!(
            island.config(),
            Some(CounterConfig {
                label: "Later".to_string()
            })
        );
    }

    #[test]
    fn test_unobserved_attribute_is_ignored() {
        let (_mem, el, mut island) = setup();
        island.connected();
        let renders = el.ledger().renders();
        island.set_attribute("class", "wide");
        assert_eq!(el.ledger().renders(), renders);
    }

    #[test]
    fn test_attribute_change_reuses_root() {
        let (_mem, el, mut island) = setup();
        island.connected();
        island.set_attribute("LABEL", "Upper");
        island.set_attribute("label", "Lower");
        assert_eq!(el.ledger().created(), 1);
        assert_eq!(el.text_content(), "Lower: 0");
    }

    #[test]
    fn test_stale_callback_after_disconnect_does_nothing() {
        let (_mem, el, mut island) = setup();
        island.connected();
        let button = el.find_first("button").unwrap();
        island.disconnected();
        let renders = el.ledger().renders();

        button.click();
        assert_eq!(el.ledger().renders(), renders);
        assert_eq!(el.text_content(), "");
    }

    #[test]
    fn test_disconnect_before_connect_is_noop() {
        let (_mem, el, mut island) = setup();
        island.disconnected();
        assert_eq!(island.state(), LifecycleState::Unattached);
        assert_eq!(el.ledger().created(), 0);
    }
}
