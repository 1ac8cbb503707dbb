//! Custom element registry
//!
//! Tag name → island definition. Defining a tag that already exists is a
//! silent no-op, so every module may define the islands it relies on without
//! coordinating. The global registry lives for the whole thread and is never
//! torn down.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{CustomElement, HostElement, Island, IslandElement};
use crate::capabilities::Host;

/// Constructs the lifecycle adapter for one element instance
pub type ElementFactory = Rc<dyn Fn(Rc<dyn HostElement>, Host) -> Box<dyn CustomElement>>;

/// A registered custom element
#[derive(Clone)]
pub struct ElementDefinition {
    pub tag: &'static str,
    pub observed: &'static [&'static str],
    factory: ElementFactory,
}

impl ElementDefinition {
    /// Definition for an [`Island`] type
    pub fn of<I: Island>() -> Self {
        Self {
            tag: I::TAG,
            observed: I::OBSERVED,
            factory: Rc::new(|element, host| -> Box<dyn CustomElement> {
                Box::new(IslandElement::<I>::new(element, host))
            }),
        }
    }

    /// Create an (unattached) element instance
    pub fn construct(&self, element: Rc<dyn HostElement>, host: Host) -> Box<dyn CustomElement> {
        (self.factory)(element, host)
    }
}

/// Valid custom element names are lower-case and contain a hyphen
pub fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && tag.contains('-')
        && tag.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_')
        })
}

/// Tag → definition table
#[derive(Default)]
pub struct ElementRegistry {
    definitions: RefCell<BTreeMap<&'static str, ElementDefinition>>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define an island tag. Returns `false` when the tag was already defined
    /// (or is not a valid custom element name); never fails.
    pub fn define<I: Island>(&self) -> bool {
        self.define_with(ElementDefinition::of::<I>())
    }

    pub fn define_with(&self, definition: ElementDefinition) -> bool {
        if !is_valid_tag(definition.tag) {
            tracing::warn!(tag = definition.tag, "invalid custom element name");
            return false;
        }
        let mut definitions = self.definitions.borrow_mut();
        if definitions.contains_key(definition.tag) {
            tracing::debug!(tag = definition.tag, "custom element already defined");
            return false;
        }
        tracing::debug!(tag = definition.tag, "custom element defined");
        definitions.insert(definition.tag, definition);
        true
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    /// Definition for a tag (tags match case-insensitively)
    pub fn get(&self, tag: &str) -> Option<ElementDefinition> {
        let tag = tag.to_ascii_lowercase();
        self.definitions.borrow().get(tag.as_str()).cloned()
    }

    /// Defined tags, sorted
    pub fn tags(&self) -> Vec<&'static str> {
        self.definitions.borrow().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.borrow().is_empty()
    }

    /// Construct the adapter for `element` when its tag is defined
    pub fn create(
        &self,
        tag: &str,
        element: Rc<dyn HostElement>,
        host: Host,
    ) -> Option<Box<dyn CustomElement>> {
        self.get(tag).map(|definition| definition.construct(element, host))
    }

    /// Upgrade and connect every defined island among `elements`, in the
    /// order given. Hosts without native custom elements pass their
    /// descendants in document order.
    pub fn upgrade_tree<E>(
        &self,
        elements: impl IntoIterator<Item = E>,
        host: &Host,
    ) -> Vec<Box<dyn CustomElement>>
    where
        E: HostElement + 'static,
    {
        let mut upgraded = Vec::new();
        for element in elements {
            let tag = element.tag_name();
            if let Some(mut custom) = self.create(&tag, Rc::new(element), host.clone()) {
                custom.connected();
                upgraded.push(custom);
            }
        }
        upgraded
    }
}

thread_local! {
    static GLOBAL: ElementRegistry = ElementRegistry::new();
}

/// Run `f` against the thread's global registry
pub fn with_global<R>(f: impl FnOnce(&ElementRegistry) -> R) -> R {
    GLOBAL.with(|registry| f(registry))
}

/// Define an island in the global registry (idempotent)
pub fn define<I: Island>() -> bool {
    with_global(|registry| registry.define::<I>())
}
