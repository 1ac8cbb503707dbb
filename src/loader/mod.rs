//! Page Loader
//!
//! Reads the page identifier the server put on `<body>`, maps it to a module
//! path, and runs the `common` module followed by the page module once the
//! document is ready. Missing or failing modules are logged and skipped;
//! enhancement never breaks the page.

mod error;
mod module;
mod page_id;

pub use error::LoadError;
pub use module::{
    module_fn, FallbackSource, LoadedModule, ModuleRegistry, ModuleSource, PageContext, PageModule,
};
#[cfg(not(target_arch = "wasm32"))]
pub use module::StaticDirSource;
pub use page_id::{
    ModulePath, PageIdentifier, COMMON_MODULE, DEFAULT_PAGE_ID, PAGES_BASE_PATH, PAGE_ATTRIBUTE,
};

use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;

use crate::config::LoaderConfig;
use crate::dom::{Document, ReadyState};

/// What happened to one module during load-and-run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Entry point ran to completion
    Ran,
    /// Module loaded but has no entry point
    NoEntry,
    /// No module at the computed path
    Missing,
    /// Loading failed or the entry point returned an error or panicked
    Failed,
}

impl LoadOutcome {
    /// Module was found and nothing went wrong
    pub fn is_success(&self) -> bool {
        matches!(self, LoadOutcome::Ran | LoadOutcome::NoEntry)
    }
}

/// Result of a full startup sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    pub page_id: PageIdentifier,
    pub common: LoadOutcome,
    pub page: LoadOutcome,
}

/// Discovers and runs page modules for one document
pub struct PageLoader<D, S> {
    document: D,
    source: S,
    config: LoaderConfig,
}

impl<D: Document, S: ModuleSource> PageLoader<D, S> {
    pub fn new(document: D, source: S) -> Self {
        Self::with_config(document, source, LoaderConfig::default())
    }

    pub fn with_config(document: D, source: S, config: LoaderConfig) -> Self {
        Self {
            document,
            source,
            config,
        }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Page identifier from the body's page attribute
    pub fn resolve_page_identifier(&self) -> PageIdentifier {
        let raw = self
            .document
            .body()
            .get_attribute(&self.config.page_attribute);
        PageIdentifier::resolve_or(raw.as_deref(), &self.config.default_page)
    }

    /// Module location for an identifier
    pub fn identifier_to_path(&self, id: &PageIdentifier) -> ModulePath {
        ModulePath::with_base(&self.config.base_path, id)
    }

    /// Load the module for `id` and await its entry point. Never fails;
    /// problems are logged and reported in the outcome.
    pub async fn load_and_run(&self, id: &PageIdentifier) -> LoadOutcome {
        let path = self.identifier_to_path(id);
        match self.try_load_and_run(id, &path).await {
            Ok(outcome) => {
                tracing::debug!(page = %id, path = %path, ?outcome, "page module loaded");
                outcome
            }
            Err(LoadError::NotFound(_)) => {
                tracing::warn!(page = %id, path = %path, "missing page module");
                LoadOutcome::Missing
            }
            Err(e) => {
                tracing::error!(page = %id, path = %e.path(), error = %e, "page module failed");
                LoadOutcome::Failed
            }
        }
    }

    async fn try_load_and_run(
        &self,
        id: &PageIdentifier,
        path: &ModulePath,
    ) -> Result<LoadOutcome, LoadError> {
        let module = self.source.load(path).await?;
        let Some(entry) = module.entry else {
            return Ok(LoadOutcome::NoEntry);
        };

        let ctx = PageContext::new(id.clone(), self.document.body());
        let result = AssertUnwindSafe(entry.run(&ctx)).catch_unwind().await;
        match result {
            Ok(Ok(())) => Ok(LoadOutcome::Ran),
            Ok(Err(e)) => Err(LoadError::Entry {
                path: path.clone(),
                reason: format!("{:#}", e),
            }),
            Err(panic) => Err(LoadError::Entry {
                path: path.clone(),
                reason: panic_message(panic.as_ref()),
            }),
        }
    }

    /// Wait for the document, then run `common` and the page module in
    /// sequence. `common` fully settles before the page module is requested.
    pub async fn start(&self) -> StartupReport {
        if self.document.ready_state() == ReadyState::Loading {
            tracing::trace!("waiting for document ready");
            self.document.ready().await;
        }

        let page_id = self.resolve_page_identifier();
        tracing::info!(page = %page_id, "starting page enhancement");

        let common = self
            .load_and_run(&PageIdentifier::new(self.config.common_module.as_str()))
            .await;
        let page = self.load_and_run(&page_id).await;

        StartupReport {
            page_id,
            common,
            page,
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
