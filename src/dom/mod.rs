//! Document Abstraction
//!
//! The slice of the DOM the loader and imperative page modules touch: a
//! document with a readiness signal and a body, and elements that can be
//! searched, rewritten and wired with listeners.

pub mod memory;

use async_trait::async_trait;
use std::cell::Cell;
use std::rc::Rc;

use crate::view::{Callback, EventKind, Node};

/// Shared handle to a host element
pub type ElementRef = Rc<dyn DomElement>;

/// Document loading phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

/// The host document
#[async_trait(?Send)]
pub trait Document {
    /// Current loading phase
    fn ready_state(&self) -> ReadyState;

    /// Resolves once the document has finished parsing. Resolves immediately
    /// when the document is already past [`ReadyState::Loading`].
    async fn ready(&self);

    /// The root content element
    fn body(&self) -> ElementRef;
}

#[async_trait(?Send)]
impl<T: Document + ?Sized> Document for Rc<T> {
    fn ready_state(&self) -> ReadyState {
        (**self).ready_state()
    }

    async fn ready(&self) {
        (**self).ready().await
    }

    fn body(&self) -> ElementRef {
        (**self).body()
    }
}

/// An element in the host document
pub trait DomElement {
    fn tag_name(&self) -> String;

    fn get_attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str);
    fn remove_attribute(&self, name: &str);

    /// This element or the first descendant with the given `id`
    fn find_by_id(&self, id: &str) -> Option<ElementRef>;

    fn text_content(&self) -> String;
    fn set_text_content(&self, text: &str);

    /// Replace all children with the given view nodes, attaching their listeners
    fn replace_children(&self, children: Vec<Node>);

    fn add_listener(&self, kind: EventKind, callback: Callback);

    /// Checked state of a checkbox input
    fn is_checked(&self) -> bool;
    fn set_checked(&self, checked: bool);

    fn set_disabled(&self, disabled: bool) {
        if disabled {
            self.set_attribute("disabled", "");
        } else {
            self.remove_attribute("disabled");
        }
    }

    /// Check and set the element's [`WiredFlag`]. Returns `true` only the
    /// first time; callers return early on `false` without wiring anything.
    fn try_wire(&self) -> bool;
}

/// Idempotence marker for imperative initialization
#[derive(Debug, Default)]
pub struct WiredFlag(Cell<bool>);

impl WiredFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag, returning whether it was previously unset
    pub fn try_set(&self) -> bool {
        !self.0.replace(true)
    }

    pub fn is_set(&self) -> bool {
        self.0.get()
    }
}
