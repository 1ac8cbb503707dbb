//! Compiled-in page modules
//!
//! - `common`: theme + island definitions, runs before every page
//! - `index`: the API demo button
//! - `about`: the about layout and its client-only toolbar

pub mod about;
pub mod common;
pub mod index;

pub use about::AboutPage;
pub use common::CommonPage;
pub use index::IndexPage;

use std::rc::Rc;

use crate::capabilities::Host;
use crate::loader::{ModuleRegistry, COMMON_MODULE};

/// Register the shipped page modules under their page identifiers
pub fn register_all(registry: &ModuleRegistry, host: &Host) {
    registry
        .register(COMMON_MODULE, Rc::new(CommonPage::new(host.clone())))
        .register("index", Rc::new(IndexPage::new(host.clone())))
        .register("about", Rc::new(AboutPage::new(host.clone())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::memory::MemoryHost;
    use crate::dom::memory::{MemoryDocument, MemoryElement};
    use crate::dom::DomElement;
    use crate::loader::{LoadOutcome, PageLoader};

    #[tokio::test]
    async fn test_shipped_modules_run_through_loader() {
        let mem = MemoryHost::new();
        let doc = MemoryDocument::new();
        doc.body_element().set_attribute("data-page", "about");
        doc.body_element()
            .append_child(&MemoryElement::new("main").with_attribute("id", "about-root"));

        let registry = ModuleRegistry::new();
        register_all(&registry, &mem.host());
        let loader = PageLoader::new(doc, registry);
        let report = loader.start().await;

        assert_eq!(report.common, LoadOutcome::Ran);
        assert_eq!(report.page, LoadOutcome::Ran);
        let root = loader.document().body_element().find_id("about-root").unwrap();
        assert!(root.find_id("about-ping").is_some());
        assert!(mem.document_element.get_attribute("data-theme").is_some());
    }
}
