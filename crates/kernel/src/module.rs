use async_trait::async_trait;
use orioz_db::Store;

use crate::report::Outcome;

/// Context provided to modules during seeding
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
    /// Session handle for the target database.
    pub store: &'a dyn Store,
}

/// A unit of bootstrap work: the collections it owns and an optional seed.
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module
    fn name(&self) -> &'static str;

    /// Collections this module owns, created in the order returned
    fn collections(&self) -> Vec<&'static str> {
        vec![]
    }

    /// Insert seed data. Called once every module's collections exist;
    /// must be safe to re-run.
    async fn seed(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<Option<Outcome>> {
        Ok(None)
    }
}
