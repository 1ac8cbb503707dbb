//! Render roots
//!
//! A render root is the owned target a mounted fragment draws into. It exists
//! only while its element is attached.

use crate::view::Node;

/// Target a fragment's current output is drawn into
pub trait RenderRoot {
    /// Replace the root's content with `node`
    fn render(&mut self, node: Node);

    /// Tear down rendered content and release host resources (listeners)
    fn unmount(&mut self);
}
