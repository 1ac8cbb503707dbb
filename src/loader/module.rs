//! Page modules and the sources they are loaded from

use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;
use std::rc::Rc;

use super::{LoadError, ModulePath, PageIdentifier, PAGES_BASE_PATH};
use crate::dom::ElementRef;

/// Argument handed to a module's entry point.
///
/// Built fresh for every load; the identifier appears under both names.
#[derive(Clone)]
pub struct PageContext {
    pub page_id: PageIdentifier,
    pub id: PageIdentifier,
    pub body: ElementRef,
}

impl PageContext {
    pub fn new(id: PageIdentifier, body: ElementRef) -> Self {
        Self {
            page_id: id.clone(),
            id,
            body,
        }
    }
}

/// A page module entry point. The returned error is logged by the loader.
#[async_trait(?Send)]
pub trait PageModule {
    async fn run(&self, ctx: &PageContext) -> anyhow::Result<()>;
}

struct FnModule<F>(F);

#[async_trait(?Send)]
impl<F, Fut> PageModule for FnModule<F>
where
    F: Fn(PageContext) -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<()>> + 'static,
{
    async fn run(&self, ctx: &PageContext) -> anyhow::Result<()> {
        (self.0)(ctx.clone()).await
    }
}

/// Entry point from an async closure
pub fn module_fn<F, Fut>(f: F) -> Rc<dyn PageModule>
where
    F: Fn(PageContext) -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<()>> + 'static,
{
    Rc::new(FnModule(f))
}

/// A loaded module; modules without an entry point are valid and do nothing
#[derive(Clone, Default)]
pub struct LoadedModule {
    pub entry: Option<Rc<dyn PageModule>>,
}

impl LoadedModule {
    pub fn with_entry(entry: Rc<dyn PageModule>) -> Self {
        Self { entry: Some(entry) }
    }

    pub fn entry_less() -> Self {
        Self { entry: None }
    }
}

/// Resolves module paths to loaded modules
#[async_trait(?Send)]
pub trait ModuleSource {
    async fn load(&self, path: &ModulePath) -> Result<LoadedModule, LoadError>;
}

#[async_trait(?Send)]
impl<T: ModuleSource + ?Sized> ModuleSource for Rc<T> {
    async fn load(&self, path: &ModulePath) -> Result<LoadedModule, LoadError> {
        (**self).load(path).await
    }
}

#[async_trait(?Send)]
impl<'a, T: ModuleSource + ?Sized> ModuleSource for &'a T {
    async fn load(&self, path: &ModulePath) -> Result<LoadedModule, LoadError> {
        (**self).load(path).await
    }
}

/// In-process module table keyed by module path
pub struct ModuleRegistry {
    base_path: String,
    modules: RefCell<BTreeMap<ModulePath, LoadedModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::with_base(PAGES_BASE_PATH)
    }

    /// Registry computing paths under `base_path`
    pub fn with_base(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            modules: RefCell::new(BTreeMap::new()),
        }
    }

    /// Path a page identifier maps to in this registry
    pub fn path_for(&self, id: &str) -> ModulePath {
        ModulePath::with_base(&self.base_path, &PageIdentifier::new(id))
    }

    /// Register the module for a page identifier, replacing any previous one
    pub fn register(&self, id: &str, entry: Rc<dyn PageModule>) -> &Self {
        self.insert(self.path_for(id), LoadedModule::with_entry(entry));
        self
    }

    /// Register a module without an entry point
    pub fn register_entry_less(&self, id: &str) -> &Self {
        self.insert(self.path_for(id), LoadedModule::entry_less());
        self
    }

    pub fn insert(&self, path: ModulePath, module: LoadedModule) {
        tracing::trace!(path = %path, "module registered");
        self.modules.borrow_mut().insert(path, module);
    }

    pub fn contains(&self, path: &ModulePath) -> bool {
        self.modules.borrow().contains_key(path)
    }

    pub fn paths(&self) -> Vec<ModulePath> {
        self.modules.borrow().keys().cloned().collect()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl ModuleSource for ModuleRegistry {
    async fn load(&self, path: &ModulePath) -> Result<LoadedModule, LoadError> {
        self.modules
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(path.clone()))
    }
}

/// Tries `primary`, then `fallback` when the module is not found there.
/// Load errors from `primary` are not retried.
pub struct FallbackSource<A, B> {
    primary: A,
    fallback: B,
}

impl<A: ModuleSource, B: ModuleSource> FallbackSource<A, B> {
    pub fn new(primary: A, fallback: B) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait(?Send)]
impl<A: ModuleSource, B: ModuleSource> ModuleSource for FallbackSource<A, B> {
    async fn load(&self, path: &ModulePath) -> Result<LoadedModule, LoadError> {
        match self.primary.load(path).await {
            Err(LoadError::NotFound(_)) => self.fallback.load(path).await,
            other => other,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use static_dir::StaticDirSource;

#[cfg(not(target_arch = "wasm32"))]
mod static_dir {
    use super::*;
    use std::path::{Path, PathBuf};

    /// Resolves module paths against a directory of static files.
    ///
    /// Scripts cannot run natively, so existing files load as entry-less
    /// modules; the source answers "is this module deployed".
    #[derive(Debug, Clone)]
    pub struct StaticDirSource {
        root: PathBuf,
    }

    impl StaticDirSource {
        /// `root` is the directory serving `/` (so `/static/js/pages/x.js`
        /// lives at `<root>/static/js/pages/x.js`)
        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self { root: root.into() }
        }

        pub fn root(&self) -> &Path {
            &self.root
        }

        /// Filesystem location of a module path
        pub fn file_for(&self, path: &ModulePath) -> PathBuf {
            self.root.join(path.as_str().trim_start_matches('/'))
        }
    }

    #[async_trait(?Send)]
    impl ModuleSource for StaticDirSource {
        async fn load(&self, path: &ModulePath) -> Result<LoadedModule, LoadError> {
            let file = self.file_for(path);
            match tokio::fs::metadata(&file).await {
                Ok(meta) if meta.is_file() => Ok(LoadedModule::entry_less()),
                Ok(_) => Err(LoadError::NotFound(path.clone())),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(LoadError::NotFound(path.clone()))
                }
                Err(e) => Err(LoadError::Load {
                    path: path.clone(),
                    reason: e.to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_lookup() {
        let registry = ModuleRegistry::new();
        registry.register("about", module_fn(|_ctx| async { Ok(()) }));
        registry.register_entry_less("index");

        let about = registry.load(&registry.path_for("about")).await.unwrap();
        assert!(about.entry.is_some());
        let index = registry.load(&registry.path_for("index")).await.unwrap();
        assert!(index.entry.is_none());

        let missing = registry.path_for("nope");
        assert!(!registry.contains(&missing));
        let err = registry.load(&missing).await.err().unwrap();
        assert_eq!(err.path(), &missing);
        assert_eq!(err, LoadError::NotFound(missing));

        assert!(registry.contains(&registry.path_for("about")));
        assert_eq!(
            registry.paths(),
            vec![registry.path_for("about"), registry.path_for("index")]
        );
    }

    #[tokio::test]
    async fn test_fallback_source() {
        let primary = ModuleRegistry::new();
        primary.register_entry_less("index");
        let fallback = ModuleRegistry::new();
        fallback.register("about", module_fn(|_ctx| async { Ok(()) }));
        let source = FallbackSource::new(primary, fallback);

        let about = source.load(&ModulePath::from_identifier(&"about".into())).await;
        assert!(about.unwrap().entry.is_some());
        let index = source.load(&ModulePath::from_identifier(&"index".into())).await;
        assert!(index.unwrap().entry.is_none());
        let missing = source.load(&ModulePath::from_identifier(&"x".into())).await;
        assert!(matches!(missing, Err(LoadError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_static_dir_source() {
        let dir = tempfile::tempdir().unwrap();
        let pages = dir.path().join("static/js/pages/about");
        std::fs::create_dir_all(&pages).unwrap();
        std::fs::write(pages.join("widgets.js"), "export default () => {}").unwrap();

        let source = StaticDirSource::new(dir.path());
        let found = source
            .load(&ModulePath::from_identifier(&"about.widgets".into()))
            .await;
        assert!(found.is_ok());

        // a directory is not a module
        let dir_path = ModulePath::from_raw("/static/js/pages/about");
        assert!(matches!(source.load(&dir_path).await, Err(LoadError::NotFound(_))));

        let missing = source.load(&ModulePath::from_identifier(&"about".into())).await;
        assert!(matches!(missing, Err(LoadError::NotFound(_))));
    }
}
