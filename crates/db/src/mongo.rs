//! MongoDB implementation of [`Store`]

use std::time::Duration;

use async_trait::async_trait;
use bson::{doc, Document};
use mongodb::{
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
    Client, Database, IndexModel,
};
use tracing::{debug, info};

use crate::error::{DUPLICATE_KEY, DUPLICATE_USER, NAMESPACE_EXISTS};
use crate::{AppUser, DbError, Ensured, Store};

/// Connection to one MongoDB database.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
    db_name: String,
}

impl MongoStore {
    /// Connect and verify the server answers `ping` on `db_name`.
    pub async fn connect(uri: &str, db_name: &str, timeout: Duration) -> Result<Self, DbError> {
        info!(database = db_name, "connecting to MongoDB");

        let client = Client::with_uri_str(with_timeouts(uri, timeout))
            .await
            .map_err(|e| classify("connect", e))?;

        let db = client.database(db_name);
        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| classify("ping", e))?;

        info!(database = db_name, "connected to MongoDB");

        Ok(Self {
            db,
            db_name: db_name.to_string(),
        })
    }

    fn documents(&self, collection: &str) -> mongodb::Collection<Document> {
        self.db.collection::<Document>(collection)
    }
}

#[async_trait]
impl Store for MongoStore {
    fn database(&self) -> &str {
        &self.db_name
    }

    async fn ensure_user(&self, user: &AppUser) -> Result<Ensured, DbError> {
        let reply = self
            .db
            .run_command(doc! {
                "usersInfo": { "user": user.name.as_str(), "db": self.db_name.as_str() }
            })
            .await
            .map_err(|e| classify("usersInfo", e))?;

        let exists = reply
            .get_array("users")
            .map(|users| !users.is_empty())
            .unwrap_or(false);
        if exists {
            return Ok(Ensured::Existing);
        }

        let command = doc! {
            "createUser": user.name.as_str(),
            "pwd": user.password.as_str(),
            "roles": [{ "role": user.role.as_str(), "db": self.db_name.as_str() }],
        };
        match self.db.run_command(command).await {
            Ok(_) => Ok(Ensured::Created),
            Err(e) if server_code(&e) == Some(DUPLICATE_USER) => Ok(Ensured::Existing),
            Err(e) => Err(classify("createUser", e)),
        }
    }

    async fn ensure_collection(&self, name: &str) -> Result<Ensured, DbError> {
        match self.db.create_collection(name).await {
            Ok(()) => Ok(Ensured::Created),
            Err(e) if server_code(&e) == Some(NAMESPACE_EXISTS) => Ok(Ensured::Existing),
            Err(e) => Err(classify("createCollection", e)),
        }
    }

    async fn ensure_unique_index(
        &self,
        collection: &str,
        field: &str,
        index_name: &str,
    ) -> Result<(), DbError> {
        let mut keys = Document::new();
        keys.insert(field, 1);

        let model = IndexModel::builder()
            .keys(keys)
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(index_name.to_string())
                    .build(),
            )
            .build();

        self.documents(collection)
            .create_index(model)
            .await
            .map_err(|e| classify("createIndexes", e))?;

        debug!(collection, index = index_name, "unique index in place");
        Ok(())
    }

    async fn collection_names(&self) -> Result<Vec<String>, DbError> {
        self.db
            .list_collection_names()
            .await
            .map_err(|e| classify("listCollections", e))
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> Result<Option<Document>, DbError> {
        self.documents(collection)
            .find_one(filter)
            .await
            .map_err(|e| classify("find", e))
    }

    async fn count(&self, collection: &str, filter: Document) -> Result<u64, DbError> {
        self.documents(collection)
            .count_documents(filter)
            .await
            .map_err(|e| classify("count", e))
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), DbError> {
        self.documents(collection)
            .insert_one(document)
            .await
            .map_err(|e| classify("insert", e))?;
        Ok(())
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        filter: Document,
        document: Document,
    ) -> Result<bool, DbError> {
        let update = doc! { "$setOnInsert": document };
        match self
            .documents(collection)
            .update_one(filter, update)
            .upsert(true)
            .await
        {
            Ok(result) => Ok(result.upserted_id.is_some()),
            // A concurrent upsert won the unique index.
            Err(e) if server_code(&e) == Some(DUPLICATE_KEY) => Ok(false),
            Err(e) => Err(classify("upsert", e)),
        }
    }
}

/// Bound server selection so an unreachable server fails fast.
pub fn with_timeouts(uri: &str, timeout: Duration) -> String {
    let millis = timeout.as_millis();
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{uri}{separator}serverSelectionTimeoutMS={millis}&connectTimeoutMS={millis}")
}

fn server_code(err: &MongoError) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        ErrorKind::Write(WriteFailure::WriteError(write)) => Some(write.code),
        _ => None,
    }
}

fn classify(operation: &str, err: MongoError) -> DbError {
    let message = err.to_string();
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::Io(_) => DbError::Connectivity(message),
        ErrorKind::Authentication { .. } => DbError::Permission {
            operation: operation.to_string(),
            message,
        },
        _ => match server_code(&err) {
            Some(code) => DbError::from_code(operation, code, message),
            None => DbError::Command {
                operation: operation.to_string(),
                message,
            },
        },
    }
}
