//! Bootstrap sequence: application user, collections, seeds.

use anyhow::Context;
use bson::doc;
use orioz_db::{MongoStore, Store};
use orioz_kernel::{InitCtx, ModuleRegistry, Outcome, Report, Settings};
use serde::Serialize;

use crate::modules::{self, members::models::Role, members::MEMBERS_COLLECTION};

/// Open the configured MongoDB database.
pub async fn connect(settings: &Settings) -> anyhow::Result<MongoStore> {
    MongoStore::connect(
        &settings.database.uri,
        &settings.database.name,
        settings.database.timeout(),
    )
    .await
    .with_context(|| format!("failed to connect to database '{}'", settings.database.name))
}

/// Run the full bootstrap with every registered module.
pub async fn run(settings: &Settings, store: &dyn Store) -> anyhow::Result<Report> {
    let mut report = Report::new(store.database());
    run_into(settings, store, &mut report).await?;
    Ok(report)
}

/// Like [`run`], recording outcomes into `report` as each step completes.
///
/// On error `report` keeps the steps that finished before the failure.
pub async fn run_into(
    settings: &Settings,
    store: &dyn Store,
    report: &mut Report,
) -> anyhow::Result<()> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    run_with(settings, store, &registry, report).await
}

/// Run the bootstrap with an explicit registry.
pub async fn run_with(
    settings: &Settings,
    store: &dyn Store,
    registry: &ModuleRegistry,
    report: &mut Report,
) -> anyhow::Result<()> {
    tracing::info!(
        database = store.database(),
        modules = registry.module_count(),
        "bootstrap starting"
    );

    ensure_app_user(settings, store, report).await?;

    let ctx = InitCtx { settings, store };
    registry.ensure_collections(&ctx, report).await?;
    registry.run_seeds(&ctx, report).await?;

    tracing::info!(
        database = store.database(),
        steps = report.outcomes.len(),
        "bootstrap complete"
    );
    Ok(())
}

async fn ensure_app_user(
    settings: &Settings,
    store: &dyn Store,
    report: &mut Report,
) -> anyhow::Result<()> {
    if !settings.app_user.enabled {
        tracing::info!("application user creation disabled");
        report.push(Outcome::UserDisabled);
        return Ok(());
    }

    let user = settings.app_user.app_user();
    let ensured = store
        .ensure_user(&user)
        .await
        .with_context(|| format!("failed to create application user '{}'", user.name))?;

    tracing::info!(
        user = %user.name,
        role = %user.role,
        created = ensured.created(),
        "application user ensured"
    );
    report.push(if ensured.created() {
        Outcome::UserCreated { user: user.name }
    } else {
        Outcome::UserExists { user: user.name }
    });
    Ok(())
}

/// Read-only view of how far a database has been bootstrapped.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub database: String,
    pub collections: Vec<String>,
    pub missing: Vec<String>,
    pub admin_count: u64,
}

impl StoreStatus {
    pub fn is_bootstrapped(&self) -> bool {
        self.missing.is_empty() && self.admin_count > 0
    }
}

/// Inspect `store` without modifying it.
pub async fn status(store: &dyn Store) -> anyhow::Result<StoreStatus> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);

    let mut collections = store
        .collection_names()
        .await
        .with_context(|| "failed to list collections")?;
    collections.sort();

    let missing = registry
        .collections()
        .into_iter()
        .filter(|expected| !collections.iter().any(|c| c == expected))
        .map(str::to_string)
        .collect();

    let admin_count = store
        .count(MEMBERS_COLLECTION, doc! { "roles": Role::Admin.as_str() })
        .await
        .with_context(|| "failed to count ADMIN members")?;

    Ok(StoreStatus {
        database: store.database().to_string(),
        collections,
        missing,
        admin_count,
    })
}
