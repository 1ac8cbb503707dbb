//! `common` module: runs before every page

use async_trait::async_trait;

use crate::bridge;
use crate::capabilities::Host;
use crate::loader::{PageContext, PageModule};
use crate::widgets::{self, apply_theme, initial_theme};

/// Applies the initial theme and defines the shipped islands
pub struct CommonPage {
    host: Host,
}

impl CommonPage {
    pub fn new(host: Host) -> Self {
        Self { host }
    }
}

#[async_trait(?Send)]
impl PageModule for CommonPage {
    async fn run(&self, ctx: &PageContext) -> anyhow::Result<()> {
        apply_theme(&self.host, initial_theme(&self.host));
        let defined = bridge::with_global(widgets::define_all);
        tracing::debug!(page = %ctx.page_id, defined, "common module ready");
        Ok(())
    }
}
