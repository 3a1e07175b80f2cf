pub mod models;

use anyhow::Context;
use async_trait::async_trait;
use bson::{doc, DateTime};
use orioz_db::DbError;
use orioz_kernel::settings::SeedStrategy;
use orioz_kernel::{InitCtx, Module, Outcome};

use models::{Member, Role};

pub const MEMBERS_COLLECTION: &str = "members";
const EMAIL_INDEX: &str = "email_unique";

/// Owns `members` and seeds the default administrator.
pub struct MembersModule;

impl MembersModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for MembersModule {
    fn name(&self) -> &'static str {
        "members"
    }

    fn collections(&self) -> Vec<&'static str> {
        vec![MEMBERS_COLLECTION]
    }

    async fn seed(&self, ctx: &InitCtx<'_>) -> anyhow::Result<Option<Outcome>> {
        let seed = &ctx.settings.admin;

        let existing = ctx
            .store
            .find_one(MEMBERS_COLLECTION, doc! { "roles": Role::Admin.as_str() })
            .await
            .with_context(|| "failed to look up existing ADMIN member")?;

        if let Some(existing) = existing {
            let email = existing.get_str("email").unwrap_or(&seed.email).to_string();
            tracing::info!(
                module = self.name(),
                email = %email,
                "ADMIN user already exists, skipping creation"
            );
            return Ok(Some(Outcome::AdminSkipped { email }));
        }

        let admin = Member::administrator(seed, DateTime::now())?;
        let document = admin
            .to_document()
            .with_context(|| "failed to encode default ADMIN member")?;

        let inserted = match seed.strategy {
            SeedStrategy::CheckThenInsert => {
                ctx.store
                    .insert_one(MEMBERS_COLLECTION, document)
                    .await
                    .with_context(|| "failed to insert default ADMIN member")?;
                true
            }
            SeedStrategy::InsertIfAbsent => {
                ctx.store
                    .ensure_unique_index(MEMBERS_COLLECTION, "email", EMAIL_INDEX)
                    .await
                    .with_context(|| format!("failed to create index '{}'", EMAIL_INDEX))?;
                match ctx
                    .store
                    .insert_if_absent(
                        MEMBERS_COLLECTION,
                        doc! { "email": seed.email.as_str() },
                        document,
                    )
                    .await
                {
                    Ok(inserted) => inserted,
                    // A concurrent upsert on the same email lost the index race.
                    Err(err) if err.is_duplicate_key() => false,
                    Err(err) => {
                        return Err(err).with_context(|| "failed to upsert default ADMIN member")
                    }
                }
            }
        };

        if inserted {
            tracing::info!(
                module = self.name(),
                email = %seed.email,
                strategy = ?seed.strategy,
                "default ADMIN user created"
            );
            return Ok(Some(Outcome::AdminCreated {
                email: seed.email.clone(),
            }));
        }

        // The upsert matched. Either a concurrent run seeded the ADMIN, or a
        // non-admin member already holds the seed email.
        let raced = ctx
            .store
            .find_one(MEMBERS_COLLECTION, doc! { "roles": Role::Admin.as_str() })
            .await
            .with_context(|| "failed to re-check for an ADMIN member")?;

        match raced {
            Some(existing) => {
                let email = existing.get_str("email").unwrap_or(&seed.email).to_string();
                tracing::info!(
                    module = self.name(),
                    email = %email,
                    "ADMIN user inserted concurrently, skipping creation"
                );
                Ok(Some(Outcome::AdminSkipped { email }))
            }
            None => {
                tracing::error!(
                    module = self.name(),
                    email = %seed.email,
                    "seed email belongs to a member without the ADMIN role"
                );
                Err(DbError::DuplicateKey {
                    operation: "upsert".to_string(),
                    message: format!(
                        "{}.email already holds {} without the ADMIN role",
                        MEMBERS_COLLECTION, seed.email
                    ),
                })
                .with_context(|| "failed to upsert default ADMIN member")
            }
        }
    }
}

/// Create a new instance of the members module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(MembersModule::new())
}
