//! Page modules served as ES modules
//!
//! Pages without a compiled-in module are looked up at their module path with
//! a dynamic `import()`. The module's default export, when it is a function,
//! becomes the entry point and receives `{ pageId, id, body }`.

use async_trait::async_trait;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use z8_islands::loader::{
    LoadError, LoadedModule, ModulePath, ModuleSource, PageContext, PageModule,
};

#[wasm_bindgen(inline_js = "export function import_module(path) { return import(path); }")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn import_module(path: &str) -> Result<js_sys::Promise, JsValue>;
}

/// Loads modules with `import()`
#[derive(Debug, Default, Clone)]
pub struct JsModuleSource;

impl JsModuleSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl ModuleSource for JsModuleSource {
    async fn load(&self, path: &ModulePath) -> Result<LoadedModule, LoadError> {
        let promise = import_module(path.as_str()).map_err(|e| LoadError::Load {
            path: path.clone(),
            reason: format!("{:?}", e),
        })?;
        // the browser reports a missing file and a broken module the same way
        let module = JsFuture::from(promise).await.map_err(|e| {
            tracing::debug!(path = %path, error = ?e, "import() rejected");
            LoadError::NotFound(path.clone())
        })?;

        let entry = js_sys::Reflect::get(&module, &JsValue::from_str("default"))
            .ok()
            .and_then(|value| value.dyn_into::<js_sys::Function>().ok());
        Ok(match entry {
            Some(function) => LoadedModule::with_entry(Rc::new(JsEntry { function })),
            None => LoadedModule::entry_less(),
        })
    }
}

struct JsEntry {
    function: js_sys::Function,
}

fn context_object(ctx: &PageContext) -> Result<js_sys::Object, JsValue> {
    let object = js_sys::Object::new();
    js_sys::Reflect::set(&object, &"pageId".into(), &ctx.page_id.as_str().into())?;
    js_sys::Reflect::set(&object, &"id".into(), &ctx.id.as_str().into())?;
    let body = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
        .map(JsValue::from)
        .unwrap_or(JsValue::NULL);
    js_sys::Reflect::set(&object, &"body".into(), &body)?;
    Ok(object)
}

#[async_trait(?Send)]
impl PageModule for JsEntry {
    async fn run(&self, ctx: &PageContext) -> anyhow::Result<()> {
        let arg = context_object(ctx)
            .map_err(|e| anyhow::anyhow!("building page context: {:?}", e))?;
        let result = self
            .function
            .call1(&JsValue::NULL, &arg)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        if let Some(promise) = result.dyn_ref::<js_sys::Promise>() {
            JsFuture::from(promise.clone())
                .await
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
        Ok(())
    }
}
