//! In-memory [`Store`] for dry runs and tests
//!
//! Filters support equality on top-level or dotted fields. An array field
//! matches when any element equals the filter value, as on the server.

use async_trait::async_trait;
use bson::{Bson, Document};
use tokio::sync::Mutex;

use crate::{AppUser, DbError, Ensured, Store};

#[derive(Debug, Default)]
struct Collection {
    name: String,
    documents: Vec<Document>,
    unique_fields: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    users: Vec<AppUser>,
    collections: Vec<Collection>,
}

impl State {
    fn collection_mut(&mut self, name: &str) -> &mut Collection {
        let position = match self.collections.iter().position(|c| c.name == name) {
            Some(position) => position,
            None => {
                self.collections.push(Collection {
                    name: name.to_string(),
                    ..Collection::default()
                });
                self.collections.len() - 1
            }
        };
        &mut self.collections[position]
    }

    fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name == name)
    }
}

impl Collection {
    fn check_unique(&self, document: &Document) -> Result<(), DbError> {
        for field in &self.unique_fields {
            let Some(value) = lookup(document, field) else {
                continue;
            };
            if self
                .documents
                .iter()
                .any(|existing| lookup(existing, field) == Some(value))
            {
                return Err(DbError::DuplicateKey {
                    operation: "insert".to_string(),
                    message: format!("{}.{field} already holds {value}", self.name),
                });
            }
        }
        Ok(())
    }
}

/// Store keeping one database entirely in memory.
#[derive(Debug)]
pub struct MemoryStore {
    db_name: String,
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new(db_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// Snapshot of every document in `collection`, in insertion order.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        let state = self.state.lock().await;
        state
            .collection(collection)
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }

    pub async fn users(&self) -> Vec<AppUser> {
        self.state.lock().await.users.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn database(&self) -> &str {
        &self.db_name
    }

    async fn ensure_user(&self, user: &AppUser) -> Result<Ensured, DbError> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|existing| existing.name == user.name) {
            return Ok(Ensured::Existing);
        }
        state.users.push(user.clone());
        Ok(Ensured::Created)
    }

    async fn ensure_collection(&self, name: &str) -> Result<Ensured, DbError> {
        let mut state = self.state.lock().await;
        if state.collection(name).is_some() {
            return Ok(Ensured::Existing);
        }
        state.collection_mut(name);
        Ok(Ensured::Created)
    }

    async fn ensure_unique_index(
        &self,
        collection: &str,
        field: &str,
        index_name: &str,
    ) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        let collection = state.collection_mut(collection);
        if collection.unique_fields.iter().any(|f| f == field) {
            return Ok(());
        }

        let mut seen: Vec<&Bson> = Vec::new();
        for document in &collection.documents {
            if let Some(value) = lookup(document, field) {
                if seen.contains(&value) {
                    return Err(DbError::DuplicateKey {
                        operation: "createIndexes".to_string(),
                        message: format!("{index_name} cannot be built, {value} repeats"),
                    });
                }
                seen.push(value);
            }
        }

        collection.unique_fields.push(field.to_string());
        Ok(())
    }

    async fn collection_names(&self) -> Result<Vec<String>, DbError> {
        let state = self.state.lock().await;
        Ok(state.collections.iter().map(|c| c.name.clone()).collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> Result<Option<Document>, DbError> {
        let state = self.state.lock().await;
        Ok(state.collection(collection).and_then(|c| {
            c.documents
                .iter()
                .find(|document| filter_matches(document, &filter))
                .cloned()
        }))
    }

    async fn count(&self, collection: &str, filter: Document) -> Result<u64, DbError> {
        let state = self.state.lock().await;
        let count = state.collection(collection).map_or(0, |c| {
            c.documents
                .iter()
                .filter(|document| filter_matches(document, &filter))
                .count()
        });
        Ok(count as u64)
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        let collection = state.collection_mut(collection);
        collection.check_unique(&document)?;
        collection.documents.push(document);
        Ok(())
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        filter: Document,
        document: Document,
    ) -> Result<bool, DbError> {
        let mut state = self.state.lock().await;
        let collection = state.collection_mut(collection);
        if collection.documents.iter().any(|d| filter_matches(d, &filter)) {
            return Ok(false);
        }

        // Upserts seed the new document with the filter's equality fields.
        let mut inserted = filter;
        for (key, value) in document {
            inserted.insert(key, value);
        }
        collection.check_unique(&inserted)?;
        collection.documents.push(inserted);
        Ok(true)
    }
}

fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }
    Some(current)
}

fn filter_matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(path, expected)| match lookup(document, path) {
        Some(Bson::Array(items)) => {
            items.contains(expected) || matches!(expected, Bson::Array(e) if e == items)
        }
        Some(actual) => actual == expected,
        None => matches!(expected, Bson::Null),
    })
}
