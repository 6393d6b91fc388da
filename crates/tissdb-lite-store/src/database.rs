//! The collection database.
//!
//! A [`Database`] is an explicitly owned value: it is opened from a
//! [`StoreConfig`], mutated through its methods, and written back to disk
//! after every mutation (or on [`Database::flush`]). Nothing is global.
//!
//! # Concurrency
//!
//! Collections live in a [`DashMap`]; each collection guards its documents
//! with its own `RwLock`, so queries against different collections never
//! contend. Saves are serialized so that concurrent mutations cannot
//! interleave partial snapshots on disk.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use tissdb_lite_query::{
    Condition, DocumentFilters, ExpressionError, Filter, QueryConfig, parse_statement,
};

use crate::config::StoreConfig;
use crate::document::{Document, document_id, merge_update, stamp_new};
use crate::error::{StoreError, StoreResult};
use crate::persistence::{DataFile, Snapshot};
use crate::remote::{QueryCommand, RemoteStore};

/// A named, ordered list of documents.
#[derive(Debug)]
pub struct Collection {
    name: String,
    documents: RwLock<Vec<Document>>,
}

impl Collection {
    fn new(name: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(documents),
        }
    }

    /// Collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Whether the collection holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Documents matching `condition`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation error; no partial result is returned.
    pub fn find(&self, condition: &Condition) -> StoreResult<Vec<Document>> {
        let documents = self.documents.read();
        if condition.is_match_all() {
            return Ok(documents.clone());
        }
        let mut matched = Vec::new();
        for doc in documents.iter() {
            if condition.matches(doc)? {
                matched.push(doc.clone());
            }
        }
        Ok(matched)
    }

    /// Documents matching `filter` (all documents when `None`).
    #[must_use]
    pub fn filter(&self, filter: Option<&Filter>) -> Vec<Document> {
        let documents = self.documents.read();
        match filter {
            Some(filter) => documents
                .iter()
                .filter(|doc| filter.matches(*doc))
                .cloned()
                .collect(),
            None => documents.clone(),
        }
    }

    /// Deep copy of every document.
    #[must_use]
    pub fn export(&self) -> Vec<Document> {
        self.documents.read().clone()
    }
}

/// An owned set of collections with optional persistence and an optional
/// remote store.
#[derive(Debug)]
pub struct Database {
    collections: DashMap<String, Arc<Collection>>,
    data_file: Option<DataFile>,
    save_lock: Mutex<()>,
    query_config: QueryConfig,
    remote: Option<Arc<dyn RemoteStore>>,
}

impl Database {
    /// Open a database, loading the data file when persistence is enabled.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the data directory cannot be created.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let (data_file, snapshot) = if config.persistence {
            let file = DataFile::new(config.data_file());
            let snapshot = file.load()?;
            (Some(file), snapshot)
        } else {
            (None, Snapshot::new())
        };

        let collections = DashMap::new();
        for (name, documents) in snapshot {
            collections.insert(name.clone(), Arc::new(Collection::new(name, documents)));
        }

        info!(
            collections = collections.len(),
            persistence = config.persistence,
            data_dir = %config.data_dir.display(),
            "opened database"
        );

        Ok(Self {
            collections,
            data_file,
            save_lock: Mutex::new(()),
            query_config: config.query.clone(),
            remote: None,
        })
    }

    /// A database that never touches disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            collections: DashMap::new(),
            data_file: None,
            save_lock: Mutex::new(()),
            query_config: QueryConfig::default(),
            remote: None,
        }
    }

    /// Attach a remote store for [`Database::execute_remote`].
    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Whether a remote store is attached.
    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Get a collection by name.
    #[must_use]
    pub fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.get(name).map(|r| Arc::clone(r.value()))
    }

    /// Get a collection or return `StoreError::CollectionNotFound`.
    pub fn require_collection(&self, name: &str) -> StoreResult<Arc<Collection>> {
        self.get_collection(name)
            .ok_or_else(|| StoreError::CollectionNotFound {
                name: name.to_owned(),
            })
    }

    /// Create an empty collection, replacing any existing one of that name.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the data file cannot be written.
    pub fn create_collection(&self, name: &str) -> StoreResult<()> {
        let replaced = self
            .collections
            .insert(name.to_owned(), Arc::new(Collection::new(name, Vec::new())))
            .is_some();
        debug!(collection = name, replaced, "created collection");
        self.persist()
    }

    /// Create the collection if it does not exist yet. Returns whether it was
    /// created.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the data file cannot be written.
    pub fn ensure_collection(&self, name: &str) -> StoreResult<bool> {
        let created = match self.collections.entry(name.to_owned()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(e) => {
                e.insert(Arc::new(Collection::new(name, Vec::new())));
                true
            }
        };
        if created {
            debug!(collection = name, "created collection on demand");
            self.persist()?;
        }
        Ok(created)
    }

    /// Collection names, sorted.
    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Insert a document, assigning `_id`, `_createdDate` and `_updatedDate`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CollectionNotFound` or a persistence error.
    pub fn insert(&self, name: &str, doc: Document) -> StoreResult<Document> {
        let collection = self.require_collection(name)?;
        let stamped = stamp_new(doc);
        collection.documents.write().push(stamped.clone());
        debug!(collection = name, id = document_id(&stamped), "inserted document");
        self.persist()?;
        Ok(stamped)
    }

    /// Insert several documents with a single save.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CollectionNotFound` or a persistence error.
    pub fn bulk_insert(&self, name: &str, docs: Vec<Document>) -> StoreResult<Vec<Document>> {
        let collection = self.require_collection(name)?;
        let stamped: Vec<Document> = docs.into_iter().map(stamp_new).collect();
        collection
            .documents
            .write()
            .extend(stamped.iter().cloned());
        debug!(collection = name, count = stamped.len(), "inserted documents");
        self.persist()?;
        Ok(stamped)
    }

    /// Documents of `name` matching `condition`. An empty condition returns
    /// every document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CollectionNotFound`, or `StoreError::Expression`
    /// if the condition fails to compile or evaluate.
    pub fn find(&self, name: &str, condition: &str) -> StoreResult<Vec<Document>> {
        let collection = self.require_collection(name)?;
        let condition = Condition::parse_with(condition, &self.query_config)?;
        let found = collection.find(&condition)?;
        debug!(
            collection = name,
            condition = %condition,
            matched = found.len(),
            "find"
        );
        Ok(found)
    }

    /// Run a `SELECT * FROM <collection> [WHERE <condition>]` statement.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Expression` for a statement without `FROM`, plus
    /// the errors of [`Database::find`].
    pub fn query(&self, statement: &str) -> StoreResult<Vec<Document>> {
        let statement = parse_statement(statement)?;
        self.find(&statement.collection, &statement.condition)
    }

    /// Merge `doc` over the stored document with the same `_id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MissingId`, `StoreError::CollectionNotFound`,
    /// `StoreError::ItemNotFound`, or a persistence error.
    pub fn update(&self, name: &str, doc: Document) -> StoreResult<Document> {
        let collection = self.require_collection(name)?;
        let id = document_id(&doc).ok_or(StoreError::MissingId)?.to_owned();
        let updated = {
            let mut documents = collection.documents.write();
            let stored = documents
                .iter_mut()
                .find(|d| document_id(d) == Some(id.as_str()))
                .ok_or_else(|| StoreError::ItemNotFound {
                    id: id.clone(),
                    collection: name.to_owned(),
                })?;
            merge_update(stored, doc);
            stored.clone()
        };
        debug!(collection = name, id = %id, "updated document");
        self.persist()?;
        Ok(updated)
    }

    /// Remove the document with `id`. Removing an absent id is not an error.
    /// Returns whether a document was removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CollectionNotFound` or a persistence error.
    pub fn remove(&self, name: &str, id: &str) -> StoreResult<bool> {
        let collection = self.require_collection(name)?;
        let removed = {
            let mut documents = collection.documents.write();
            let before = documents.len();
            documents.retain(|d| document_id(d) != Some(id));
            documents.len() != before
        };
        debug!(collection = name, id, removed, "remove");
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Deep copy of every document in `name`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CollectionNotFound`.
    pub fn export_collection(&self, name: &str) -> StoreResult<Vec<Document>> {
        Ok(self.require_collection(name)?.export())
    }

    /// Drop every collection.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the data file cannot be written.
    pub fn clear(&self) -> StoreResult<()> {
        self.collections.clear();
        info!("cleared database");
        self.persist()
    }

    /// Delegate a query to the attached remote store.
    ///
    /// The condition is compiled locally and shipped as a [`Filter`].
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Expression(ExpressionError::CapabilityUnavailable)`
    /// when no remote store is attached, other expression errors when the
    /// condition cannot be expressed as a filter, and whatever the remote
    /// store reports.
    pub fn execute_remote(&self, command: &QueryCommand) -> StoreResult<Vec<Document>> {
        let condition = Condition::parse_with(&command.condition, &self.query_config)?;
        let Some(remote) = &self.remote else {
            return Err(ExpressionError::CapabilityUnavailable.into());
        };
        let filter = condition.to_filter(Some(&DocumentFilters))?;
        debug!(
            collection = %command.collection,
            filter = ?filter.as_ref().map(ToString::to_string),
            "delegating query to remote store"
        );
        remote.query(&command.collection, filter.as_ref())
    }

    /// Write the current state to disk (no-op without persistence).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` or `StoreError::Serialization` on failure.
    pub fn flush(&self) -> StoreResult<()> {
        self.persist()
    }

    fn snapshot(&self) -> Snapshot {
        self.collections
            .iter()
            .map(|r| (r.key().clone(), r.value().export()))
            .collect()
    }

    /// Save after a mutation. The in-memory change is kept even if the save
    /// fails.
    fn persist(&self) -> StoreResult<()> {
        let Some(file) = &self.data_file else {
            return Ok(());
        };
        let _guard = self.save_lock.lock();
        file.save(&self.snapshot())
    }
}

impl RemoteStore for Database {
    fn query(&self, collection: &str, filter: Option<&Filter>) -> StoreResult<Vec<Document>> {
        Ok(self.require_collection(collection)?.filter(filter))
    }
}
