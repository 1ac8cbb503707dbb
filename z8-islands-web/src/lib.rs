//! z8-islands browser entry point
//!
//! Binds the loader and the island bridge to the real DOM: capabilities
//! come from `window`, islands are registered with `customElements`, and
//! pages without a compiled-in module are fetched with `import()`.

pub mod dom;
pub mod elements;
pub mod host;
pub mod logging;
pub mod modules;

use std::future::Future;

use wasm_bindgen::prelude::*;

use z8_islands::capabilities::Host;
use z8_islands::config::LoaderConfig;
use z8_islands::loader::{
    FallbackSource, ModuleRegistry, ModuleSource, PageLoader, StartupReport,
};

pub use dom::{DomRoot, WebDocument, WebElement};
pub use host::browser_host;
pub use modules::JsModuleSource;

/// Define the shipped islands and register every known tag with
/// `customElements`. Islands already in the markup upgrade immediately.
pub fn define_islands(host: &Host) -> usize {
    z8_islands::bridge::with_global(z8_islands::widgets::define_all);
    elements::define_custom_elements(host)
}

/// Define islands now, then return the loader run. Islands mount on their
/// own lifecycle callbacks whether or not page modules ever settle.
pub fn boot<S: ModuleSource + 'static>(
    document: WebDocument,
    source: S,
    host: &Host,
    config: LoaderConfig,
) -> impl Future<Output = StartupReport> {
    let defined = define_islands(host);
    tracing::debug!(islands = defined, "custom elements defined");
    let loader = PageLoader::with_config(document, source, config);
    async move { loader.start().await }
}

/// Runs once when the WASM module is instantiated
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    logging::init(tracing::Level::INFO);

    let Some(document) = WebDocument::current() else {
        tracing::error!("no document; nothing to enhance");
        return;
    };

    let host = browser_host();
    let config = LoaderConfig::default();
    let compiled = ModuleRegistry::with_base(config.base_path.clone());
    z8_islands::pages::register_all(&compiled, &host);
    let source = FallbackSource::new(compiled, JsModuleSource::new());

    let run = boot(document, source, &host, config);
    wasm_bindgen_futures::spawn_local(async move {
        let report = run.await;
        tracing::info!(
            page = %report.page_id,
            common = ?report.common,
            module = ?report.page,
            "page enhanced"
        );
    });
}
