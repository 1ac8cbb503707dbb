//! z8-islands demo
//!
//! Renders a page into an in-memory document, runs the page loader with the
//! shipped modules, upgrades the islands found in the markup and prints the
//! resulting HTML.
//!
//! Usage: `z8-islands [page-id]` (default `about`)

use std::rc::Rc;

use z8_islands::bridge;
use z8_islands::capabilities::memory::MemoryHost;
use z8_islands::config::Config;
use z8_islands::dom::memory::{MemoryDocument, MemoryElement};
use z8_islands::dom::DomElement;
use z8_islands::loader::{ModuleRegistry, PageLoader};

/// Server-rendered markup for a page
fn server_markup(page: &str, body: &MemoryElement) {
    match page {
        "index" => {
            body.append_child(&MemoryElement::new("button").with_attribute("id", "try-api"));
            body.append_child(&MemoryElement::new("div").with_attribute("id", "api-response"));
        }
        "about" => {
            body.append_child(&MemoryElement::new("main").with_attribute("id", "about-root"));
        }
        _ => {}
    }

    // islands declared in the markup, mounted independently of the loader
    let islands = MemoryElement::new("aside");
    islands.append_child(&MemoryElement::new("z8-theme-toggle"));
    islands.append_child(&MemoryElement::new("z8-clock"));
    islands.append_child(&MemoryElement::new("z8-online-badge"));
    islands.append_child(
        &MemoryElement::new("z8-copy-button").with_attribute("copied-label", "Copied to clipboard"),
    );
    islands.append_child(
        &MemoryElement::new("z8-island-pref").with_attribute("storageKey", "demo_pref"),
    );
    islands.append_child(&MemoryElement::new("z8-ping").with_attribute("endpoint", "/api/hello"));
    body.append_child(&islands);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();
    z8_islands::logging::init(&config.logging);

    tracing::info!("z8-islands demo v{}", env!("CARGO_PKG_VERSION"));

    let page = std::env::args().nth(1).unwrap_or_else(|| "about".to_string());

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async move {
            let doc = Rc::new(MemoryDocument::loading());
            let mem = MemoryHost::with_document_element(doc.html().clone());
            let host = mem.host();

            doc.body_element()
                .set_attribute(&config.loader.page_attribute, &page);
            server_markup(&page, doc.body_element());

            let registry = ModuleRegistry::with_base(config.loader.base_path.clone());
            z8_islands::pages::register_all(&registry, &host);
            tracing::debug!(modules = ?registry.paths(), "compiled page modules");
            if !registry.contains(&registry.path_for(&page)) {
                tracing::warn!(page = %page, "no compiled module for page; only common will run");
            }
            let loader = PageLoader::with_config(doc.clone(), registry, config.loader.clone());

            let startup = {
                let loader = Rc::new(loader);
                let task_loader = loader.clone();
                let task = tokio::task::spawn_local(async move { task_loader.start().await });
                doc.finish_loading();
                task.await?
            };
            tracing::info!(
                page = %startup.page_id,
                common = ?startup.common,
                module = ?startup.page,
                "startup finished"
            );

            let upgraded = bridge::with_global(|registry| {
                registry.upgrade_tree(doc.body_element().descendants(), &host)
            });
            tracing::info!(islands = upgraded.len(), "islands mounted");

            println!("{}", doc.html().outer_html());
            Ok::<(), anyhow::Error>(())
        })
        .await
}
