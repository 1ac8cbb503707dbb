//! # z8-islands
//!
//! Client-side enhancement for server-rendered pages.
//!
//! ## Features
//!
//! - **Page loader**: reads `data-page` from `<body>`, maps it to a module path
//!   and runs the shared `common` module followed by the page module, once
//! - **Island bridge**: mounts small reactive fragments as custom elements whose
//!   attributes are their configuration, with render roots created and torn
//!   down in lockstep with DOM attachment
//! - **Injected capabilities**: storage, clipboard, connectivity, clock, HTTP
//!   and theme are traits, so everything runs against an in-memory host in
//!   tests and against the browser in `z8-islands-web`
//!
//! ## Modules
//!
//! - [`loader`]: page identifier resolution, module sources, startup
//! - [`bridge`]: the [`Island`] trait, lifecycle adapter and element registry
//! - [`capabilities`]: host capability traits plus in-memory and native impls
//! - [`dom`]: the document abstraction and an in-memory document
//! - [`widgets`]: the shipped islands
//! - [`pages`]: the shipped page modules
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use z8_islands::capabilities::memory::MemoryHost;
//! use z8_islands::dom::memory::MemoryDocument;
//! use z8_islands::loader::{ModuleRegistry, PageLoader};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let local = tokio::task::LocalSet::new();
//!     local
//!         .run_until(async {
//!             let mem = MemoryHost::new();
//!             let registry = ModuleRegistry::new();
//!             z8_islands::pages::register_all(&registry, &mem.host());
//!
//!             let doc = Rc::new(MemoryDocument::new());
//!             let report = PageLoader::new(doc, registry).start().await;
//!             println!("page {} → {:?}", report.page_id, report.page);
//!         })
//!         .await;
//! }
//! ```

pub mod bridge;
pub mod capabilities;
pub mod config;
pub mod dom;
pub mod error;
pub mod loader;
pub mod logging;
pub mod pages;
pub mod view;
pub mod widgets;

// Re-export top-level types for convenience
pub use bridge::{
    AliveToken, Attributes, CustomElement, ElementRegistry, HostElement, Island, IslandElement,
    LifecycleState, Link, RenderRoot,
};

pub use capabilities::{
    ClipboardWriter, Clock, ConnectivitySource, Host, HttpClient, HttpResponse, KeyValueStore,
    Spawner, Subscription, ThemeSurface, TimerHandle,
};

pub use dom::{Document, DomElement, ElementRef, ReadyState, WiredFlag};

pub use error::{ClipboardError, FetchError, StorageError};

pub use loader::{
    LoadError, LoadOutcome, LoadedModule, ModulePath, ModuleRegistry, ModuleSource, PageContext,
    PageIdentifier, PageLoader, PageModule, StartupReport,
};

pub use config::{Config, ConfigError, LoaderConfig, LoggingConfig, PingConfig};

pub use view::{Callback, Event, EventKind, Node};
