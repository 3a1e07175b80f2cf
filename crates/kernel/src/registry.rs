use anyhow::Context;
use std::sync::Arc;

use crate::module::{InitCtx, Module};
use crate::report::{Outcome, Report};

/// Seed modules in registration order
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module; order of registration is order of execution
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.push(module);
    }

    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Every declared collection, first declaration wins
    pub fn collections(&self) -> Vec<&'static str> {
        let mut collections: Vec<&'static str> = Vec::new();
        for module in &self.modules {
            for collection in module.collections() {
                if !collections.contains(&collection) {
                    collections.push(collection);
                }
            }
        }
        collections
    }

    /// Create every declared collection, tolerating existing ones
    pub async fn ensure_collections(
        &self,
        ctx: &InitCtx<'_>,
        report: &mut Report,
    ) -> anyhow::Result<()> {
        let collections = self.collections();
        tracing::info!("ensuring collections in order: {:?}", collections);

        for collection in collections {
            let ensured = ctx
                .store
                .ensure_collection(collection)
                .await
                .with_context(|| format!("failed to create collection '{}'", collection))?;

            tracing::info!(
                collection,
                created = ensured.created(),
                "collection created or already exists"
            );
            report.push(Outcome::CollectionEnsured {
                collection: collection.to_string(),
                created: ensured.created(),
            });
        }

        Ok(())
    }

    /// Run each module's seed step in registration order
    pub async fn run_seeds(&self, ctx: &InitCtx<'_>, report: &mut Report) -> anyhow::Result<()> {
        tracing::info!("running seeds for {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "seeding module");

            let outcome = module
                .seed(ctx)
                .await
                .with_context(|| format!("failed to seed module '{}'", module.name()))?;

            if let Some(outcome) = outcome {
                report.push(outcome);
            }
        }

        Ok(())
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use async_trait::async_trait;
    use orioz_db::{MemoryStore, Store};

    struct TestModule {
        name: &'static str,
        collections: Vec<&'static str>,
    }

    #[async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        fn collections(&self) -> Vec<&'static str> {
            self.collections.clone()
        }

        async fn seed(&self, ctx: &InitCtx<'_>) -> anyhow::Result<Option<Outcome>> {
            ctx.store
                .insert_one(self.name, bson::doc! { "seeded": true })
                .await?;
            Ok(Some(Outcome::AdminCreated {
                email: format!("{}@test", self.name),
            }))
        }
    }

    struct FailingModule;

    #[async_trait]
    impl Module for FailingModule {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn seed(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<Option<Outcome>> {
            anyhow::bail!("boom")
        }
    }

    fn module(name: &'static str, collections: Vec<&'static str>) -> Arc<dyn Module> {
        Arc::new(TestModule { name, collections })
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert!(registry.modules().is_empty());
        assert!(registry.collections().is_empty());
    }

    #[test]
    fn collections_keep_registration_order_without_duplicates() {
        let mut registry = ModuleRegistry::new();
        registry.register(module("first", vec!["members", "events"]));
        registry.register(module("second", vec!["events", "news"]));

        assert_eq!(registry.collections(), vec!["members", "events", "news"]);
        assert_eq!(registry.module_count(), 2);
        assert!(registry.get_module("second").is_some());
        assert!(registry.get_module("third").is_none());
    }

    #[tokio::test]
    async fn ensure_collections_is_idempotent() {
        let mut registry = ModuleRegistry::new();
        registry.register(module("first", vec!["members", "events"]));
        let settings = Settings::default();
        let store = MemoryStore::new("test");
        let ctx = InitCtx {
            settings: &settings,
            store: &store,
        };

        let mut first = Report::new("test");
        registry.ensure_collections(&ctx, &mut first).await.unwrap();
        let mut second = Report::new("test");
        registry.ensure_collections(&ctx, &mut second).await.unwrap();

        assert_eq!(first.collections(), second.collections());
        assert!(second.outcomes.iter().all(|outcome| matches!(
            outcome,
            Outcome::CollectionEnsured { created: false, .. }
        )));
        assert_eq!(
            store.collection_names().await.unwrap(),
            vec!["members", "events"]
        );
    }

    #[tokio::test]
    async fn seeds_run_in_registration_order() {
        let mut registry = ModuleRegistry::new();
        registry.register(module("alpha", vec![]));
        registry.register(module("beta", vec![]));
        let settings = Settings::default();
        let store = MemoryStore::new("test");
        let ctx = InitCtx {
            settings: &settings,
            store: &store,
        };

        let mut report = Report::new("test");
        registry.run_seeds(&ctx, &mut report).await.unwrap();

        assert_eq!(
            report.outcomes,
            vec![
                Outcome::AdminCreated {
                    email: "alpha@test".to_string()
                },
                Outcome::AdminCreated {
                    email: "beta@test".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn seed_failure_names_the_module() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(FailingModule));
        let settings = Settings::default();
        let store = MemoryStore::new("test");
        let ctx = InitCtx {
            settings: &settings,
            store: &store,
        };

        let err = registry
            .run_seeds(&ctx, &mut Report::new("test"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "failed to seed module 'broken'");
    }
}
