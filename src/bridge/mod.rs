//! Island Bridge
//!
//! Mounts small reactive fragments ("islands") into server-rendered markup as
//! custom elements. An island is declared once by implementing [`Island`]; the
//! bridge supplies the lifecycle:
//!
//! - connect: create a render root and render from the element's attributes
//! - observed attribute change while attached: re-derive config, re-render into
//!   the same root (internal state is kept)
//! - disconnect: dispose the mount's [`AliveToken`], tear the root down and
//!   drop the fragment; a later reconnect starts over with fresh state
//!
//! Deferred work started by a fragment goes through [`Link`], whose updates are
//! discarded once the mount has been disposed.

mod attributes;
mod element;
mod registry;
mod root;

pub use attributes::{is_observed, Attributes};
pub use element::{CustomElement, HostElement, IslandElement, LifecycleState};
pub use registry::{define, with_global, ElementDefinition, ElementFactory, ElementRegistry};
pub use root::RenderRoot;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use crate::capabilities::Host;
use crate::view::{Callback, Event, Node};

/// A fragment mountable as a custom element
pub trait Island: Sized + 'static {
    /// Custom element tag name
    const TAG: &'static str;

    /// Attribute names whose changes trigger a re-render
    const OBSERVED: &'static [&'static str] = &[];

    /// Configuration derived from attributes
    type Config: Clone + fmt::Debug + PartialEq + 'static;

    /// Derive configuration, substituting documented defaults
    fn config(attrs: &Attributes<'_>) -> Self::Config;

    /// Build internal state for a fresh mount. Timers and subscriptions
    /// started here are owned by the returned value.
    fn create(link: &Link<Self>, config: &Self::Config) -> Self;

    /// Called after an observed attribute changed, before the re-render
    fn configure(&mut self, _link: &Link<Self>, _config: &Self::Config) {}

    /// Render current output
    fn view(&self, config: &Self::Config, link: &Link<Self>) -> Node;

    /// Called once when the mount is disposed
    fn unmount(&mut self) {}
}

/// Liveness flag shared by everything a single mount started
#[derive(Debug, Clone)]
pub struct AliveToken(Rc<Cell<bool>>);

impl AliveToken {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.get()
    }

    pub(crate) fn dispose(&self) {
        self.0.set(false);
    }
}

impl Default for AliveToken {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct Core<I: Island> {
    island: RefCell<I>,
    config: RefCell<I::Config>,
    root: RefCell<Box<dyn RenderRoot>>,
}

impl<I: Island> Core<I> {
    fn render(&self, link: &Link<I>) {
        let node = {
            let Ok(island) = self.island.try_borrow() else {
                tracing::warn!(tag = I::TAG, "render skipped while island is being updated");
                return;
            };
            let config = self.config.borrow();
            island.view(&config, link)
        };
        self.root.borrow_mut().render(node);
    }
}

/// Handle a mounted fragment uses to mutate its state and schedule work
pub struct Link<I: Island> {
    core: Weak<Core<I>>,
    alive: AliveToken,
    host: Host,
}

impl<I: Island> Clone for Link<I> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            alive: self.alive.clone(),
            host: self.host.clone(),
        }
    }
}

impl<I: Island> Link<I> {
    /// Host capabilities
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Whether the mount this link belongs to is still attached
    pub fn is_alive(&self) -> bool {
        self.alive.is_alive() && self.core.strong_count() > 0
    }

    pub fn alive_token(&self) -> AliveToken {
        self.alive.clone()
    }

    /// Mutate state and re-render.
    ///
    /// Returns `false` without touching anything when the mount has been
    /// disposed, which is how late async results are dropped.
    pub fn update(&self, f: impl FnOnce(&mut I)) -> bool {
        if !self.alive.is_alive() {
            tracing::debug!(tag = I::TAG, "discarding update for disposed island");
            return false;
        }
        let Some(core) = self.core.upgrade() else {
            return false;
        };
        {
            let Ok(mut island) = core.island.try_borrow_mut() else {
                tracing::warn!(tag = I::TAG, "re-entrant update ignored");
                return false;
            };
            f(&mut island);
        }
        core.render(self);
        true
    }

    /// Build an event callback that mutates state and re-renders
    pub fn callback(&self, f: impl Fn(&mut I, &Event, &Link<I>) + 'static) -> Callback {
        let link = self.clone();
        Rc::new(move |event: &Event| {
            let inner = link.clone();
            link.update(|island| f(island, event, &inner));
        })
    }

    /// Spawn a local task; results must be applied through [`Link::update`]
    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        self.host.spawn(task);
    }
}
