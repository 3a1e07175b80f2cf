//! Session handle shared by every bootstrap step

use async_trait::async_trait;
use bson::Document;

use crate::DbError;

/// Database principal the application connects as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppUser {
    pub name: String,
    pub password: String,
    /// Built-in role granted on the target database, e.g. `readWrite`.
    pub role: String,
}

/// Result of an idempotent "create if missing" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensured {
    Created,
    Existing,
}

impl Ensured {
    pub fn created(self) -> bool {
        self == Self::Created
    }
}

/// Explicit handle to one target database.
///
/// Every operation is scoped to [`Store::database`]; nothing selects a
/// database through ambient state.
#[async_trait]
pub trait Store: Send + Sync {
    /// Name of the database this handle targets.
    fn database(&self) -> &str;

    /// Create `user` with its role on this database unless it already exists.
    async fn ensure_user(&self, user: &AppUser) -> Result<Ensured, DbError>;

    /// Create collection `name`; an existing collection is success.
    async fn ensure_collection(&self, name: &str) -> Result<Ensured, DbError>;

    /// Create a unique ascending index on `field`.
    async fn ensure_unique_index(
        &self,
        collection: &str,
        field: &str,
        index_name: &str,
    ) -> Result<(), DbError>;

    async fn collection_names(&self) -> Result<Vec<String>, DbError>;

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> Result<Option<Document>, DbError>;

    async fn count(&self, collection: &str, filter: Document) -> Result<u64, DbError>;

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), DbError>;

    /// Insert `document` only if nothing matches `filter`, atomically on the
    /// server. Returns whether a document was inserted.
    async fn insert_if_absent(
        &self,
        collection: &str,
        filter: Document,
        document: Document,
    ) -> Result<bool, DbError>;
}
