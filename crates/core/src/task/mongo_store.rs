//! MongoDB task storage implementation
//!
//! Tasks are stored as documents in a single collection. The native
//! `ObjectId` never leaves this module: every task handed back to callers
//! carries the id as its 24-character hex string, whichever operation
//! produced it.
//!
//! The connection is established once. `connect` may be called explicitly at
//! startup and is also awaited by every operation; concurrent first callers
//! share a single attempt, and its outcome (success or failure) is kept for
//! the lifetime of the store.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::{ClientOptions, ReturnDocument};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use super::model::{NewTask, Task, TaskPatch};
use super::repository::{sort_tasks, TaskRepository};
use super::stats::WeeklyStats;
use crate::{Error, Result};

const DEFAULT_DATABASE: &str = "dayplan";
const DEFAULT_COLLECTION: &str = "tasks";
const DEFAULT_SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for the MongoDB backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoConfig {
    pub uri: String,
    /// Database name; falls back to the URI's default database, then `dayplan`
    pub database: Option<String>,
    pub collection: String,
}

impl MongoConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: None,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }

    /// Read `MONGODB_URI`, `DAYPLAN_MONGODB_DATABASE` and
    /// `DAYPLAN_MONGODB_COLLECTION`
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            std::env::var("MONGODB_URI").ok(),
            std::env::var("DAYPLAN_MONGODB_DATABASE").ok(),
            std::env::var("DAYPLAN_MONGODB_COLLECTION").ok(),
        )
    }

    pub fn from_vars(
        uri: Option<String>,
        database: Option<String>,
        collection: Option<String>,
    ) -> Result<Self> {
        let uri = non_blank(uri)
            .ok_or_else(|| Error::Config("MONGODB_URI must be set".to_string()))?;
        Ok(Self {
            uri,
            database: non_blank(database),
            collection: non_blank(collection).unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Stored shape of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    #[serde(default)]
    description: String,
    date: String,
    start_time: String,
    end_time: String,
    #[serde(default)]
    completed: bool,
}

impl TaskDocument {
    fn new(id: ObjectId, input: NewTask) -> Self {
        let task = Task::from_new(id.to_hex(), input);
        Self {
            id,
            title: task.title,
            description: task.description,
            date: task.date,
            start_time: task.start_time,
            end_time: task.end_time,
            completed: task.completed,
        }
    }
}

impl From<TaskDocument> for Task {
    fn from(document: TaskDocument) -> Self {
        Self {
            id: document.id.to_hex(),
            title: document.title,
            description: document.description,
            date: document.date,
            start_time: document.start_time,
            end_time: document.end_time,
            completed: document.completed,
        }
    }
}

/// `$set` body holding only the supplied fields
fn patch_to_set(patch: &TaskPatch) -> Document {
    let mut set = Document::new();
    if let Some(title) = &patch.title {
        set.insert("title", title.as_str());
    }
    if let Some(description) = &patch.description {
        set.insert("description", description.as_str());
    }
    if let Some(date) = &patch.date {
        set.insert("date", date.as_str());
    }
    if let Some(start_time) = &patch.start_time {
        set.insert("startTime", start_time.as_str());
    }
    if let Some(end_time) = &patch.end_time {
        set.insert("endTime", end_time.as_str());
    }
    if let Some(completed) = patch.completed {
        set.insert("completed", completed);
    }
    set
}

/// One `$group` pass, so both counts come from the same set of documents
fn stats_pipeline(start_date: &str, end_date: &str) -> Vec<Document> {
    vec![
        doc! { "$match": { "date": { "$gte": start_date, "$lte": end_date } } },
        doc! {
            "$group": {
                "_id": null,
                "completed": { "$sum": { "$cond": [{ "$eq": ["$completed", true] }, 1, 0] } },
                "pending": { "$sum": { "$cond": [{ "$eq": ["$completed", true] }, 0, 1] } },
            }
        },
    ]
}

/// An empty range produces no group document
fn stats_from_group(group: Option<&Document>) -> WeeklyStats {
    let count = |key: &str| match group.and_then(|g| g.get(key)) {
        Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Double(n)) if *n >= 0.0 => *n as u64,
        _ => 0,
    };
    WeeklyStats::new(count("completed"), count("pending"))
}

/// Parse a task id; ids that are not ObjectId hex cannot exist in the store
fn parse_id(id: &str) -> Option<ObjectId> {
    match ObjectId::parse_str(id) {
        Ok(oid) => Some(oid),
        Err(_) => {
            debug!("Ignoring malformed task id {:?}", id);
            None
        }
    }
}

/// Durable task store backed by a MongoDB collection
pub struct MongoTaskStore {
    config: MongoConfig,
    collection: OnceCell<std::result::Result<Collection<TaskDocument>, String>>,
}

impl MongoTaskStore {
    /// Create a store; no I/O happens until `connect` or the first operation
    pub fn new(config: MongoConfig) -> Self {
        Self {
            config,
            collection: OnceCell::new(),
        }
    }

    /// Connect and ping the server, at most once per store
    pub async fn connect(&self) -> Result<()> {
        self.collection().await.map(|_| ())
    }

    async fn collection(&self) -> Result<Collection<TaskDocument>> {
        match self.collection.get_or_init(|| self.establish()).await {
            Ok(collection) => Ok(collection.clone()),
            Err(message) => Err(Error::Connection(message.clone())),
        }
    }

    async fn establish(&self) -> std::result::Result<Collection<TaskDocument>, String> {
        info!("Connecting to MongoDB");
        let result = self.open().await;
        match &result {
            Ok(collection) => info!(
                "Connected to MongoDB collection {}.{}",
                collection.namespace().db,
                collection.name()
            ),
            Err(e) => error!("Failed to connect to MongoDB: {}", e),
        }
        result.map_err(|e| e.to_string())
    }

    async fn open(&self) -> Result<Collection<TaskDocument>> {
        let mut options = ClientOptions::parse(&self.config.uri).await?;
        options
            .server_selection_timeout
            .get_or_insert(DEFAULT_SERVER_SELECTION_TIMEOUT);
        options.app_name.get_or_insert_with(|| "dayplan".to_string());

        let database = self
            .config
            .database
            .clone()
            .or_else(|| options.default_database.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let client = Client::with_options(options)?;
        let db = client.database(&database);
        db.run_command(doc! { "ping": 1 }).await?;

        Ok(db.collection::<TaskDocument>(&self.config.collection))
    }
}

#[async_trait]
impl TaskRepository for MongoTaskStore {
    fn backend(&self) -> &'static str {
        "mongo"
    }

    async fn list(&self, date: Option<&str>) -> Result<Vec<Task>> {
        let collection = self.collection().await?;
        let filter = match date {
            Some(date) => doc! { "date": date },
            None => Document::new(),
        };
        let documents: Vec<TaskDocument> = collection.find(filter).await?.try_collect().await?;
        let mut tasks: Vec<Task> = documents.into_iter().map(Task::from).collect();
        sort_tasks(&mut tasks);
        Ok(tasks)
    }

    async fn get(&self, id: &str) -> Result<Option<Task>> {
        let collection = self.collection().await?;
        let Some(oid) = parse_id(id) else {
            return Ok(None);
        };
        let document = collection.find_one(doc! { "_id": oid }).await?;
        Ok(document.map(Task::from))
    }

    async fn create(&self, input: NewTask) -> Result<Task> {
        let collection = self.collection().await?;
        let document = TaskDocument::new(ObjectId::new(), input);
        collection.insert_one(&document).await?;
        debug!("Created task {}", document.id);
        Ok(document.into())
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Option<Task>> {
        let collection = self.collection().await?;
        let Some(oid) = parse_id(id) else {
            return Ok(None);
        };
        let filter = doc! { "_id": oid };
        if patch.is_empty() {
            return Ok(collection.find_one(filter).await?.map(Task::from));
        }
        let document = collection
            .find_one_and_update(filter, doc! { "$set": patch_to_set(&patch) })
            .return_document(ReturnDocument::After)
            .await?;
        Ok(document.map(Task::from))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let collection = self.collection().await?;
        let Some(oid) = parse_id(id) else {
            return Ok(false);
        };
        let result = collection.delete_one(doc! { "_id": oid }).await?;
        if result.deleted_count > 0 {
            debug!("Deleted task {}", id);
        }
        Ok(result.deleted_count > 0)
    }

    async fn weekly_stats(&self, start_date: &str, end_date: &str) -> Result<WeeklyStats> {
        let collection = self.collection().await?;
        let mut cursor = collection
            .aggregate(stats_pipeline(start_date, end_date))
            .await?;
        let group = cursor.try_next().await?;
        Ok(stats_from_group(group.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;
    use std::sync::Arc;
    use std::time::Instant;

    const UNREACHABLE_URI: &str =
        "mongodb://127.0.0.1:9/?serverSelectionTimeoutMS=300&connectTimeoutMS=300";

    #[test]
    fn test_config_requires_uri() {
        let result = MongoConfig::from_vars(None, None, None);
        assert!(matches!(result, Err(Error::Config(_))));

        let blank = MongoConfig::from_vars(Some("  ".to_string()), None, None);
        assert!(matches!(blank, Err(Error::Config(_))));
    }

    #[test]
    fn test_config_defaults() {
        let config =
            MongoConfig::from_vars(Some("mongodb://localhost:27017".to_string()), None, None)
                .unwrap();
        assert_eq!(config, MongoConfig::new("mongodb://localhost:27017"));
        assert_eq!(config.collection, "tasks");
        assert!(config.database.is_none());

        let config = MongoConfig::from_vars(
            Some("mongodb://localhost:27017".to_string()),
            Some("planner".to_string()),
            Some("items".to_string()),
        )
        .unwrap();
        assert_eq!(config.database.as_deref(), Some("planner"));
        assert_eq!(config.collection, "items");
    }

    #[test]
    fn test_document_id_maps_to_hex_string() {
        let oid = ObjectId::new();
        let document = TaskDocument::new(
            oid,
            NewTask::new("Doing Homework", "2024-03-05", "09:00", "10:00"),
        );
        let task = Task::from(document);

        assert_eq!(task.id, oid.to_hex());
        assert_eq!(task.id.len(), 24);
        assert_eq!(task.description, "");
        assert!(!task.completed);
        assert_eq!(parse_id(&task.id), Some(oid));
    }

    #[test]
    fn test_document_field_names() {
        let document = TaskDocument::new(
            ObjectId::new(),
            NewTask::new("Doing Homework", "2024-03-05", "09:00", "10:00"),
        );
        let raw = bson::to_document(&document).unwrap();

        assert!(raw.get_object_id("_id").is_ok());
        assert_eq!(raw.get_str("startTime").unwrap(), "09:00");
        assert_eq!(raw.get_str("endTime").unwrap(), "10:00");
        assert!(!raw.get_bool("completed").unwrap());

        let back: TaskDocument = bson::from_document(raw).unwrap();
        assert_eq!(back, document);
    }

    #[test]
    fn test_document_without_optional_fields() {
        let raw = doc! {
            "_id": ObjectId::new(),
            "title": "Legacy",
            "date": "2024-03-05",
            "startTime": "09:00",
            "endTime": "10:00",
        };
        let document: TaskDocument = bson::from_document(raw).unwrap();
        assert_eq!(document.description, "");
        assert!(!document.completed);
    }

    #[test]
    fn test_patch_to_set_only_supplied_fields() {
        let set = patch_to_set(&TaskPatch::completed(true));
        assert_eq!(set, doc! { "completed": true });

        let patch = TaskPatch {
            title: Some("Renamed".to_string()),
            start_time: Some("11:00".to_string()),
            ..TaskPatch::default()
        };
        assert_eq!(
            patch_to_set(&patch),
            doc! { "title": "Renamed", "startTime": "11:00" }
        );
        assert!(patch_to_set(&TaskPatch::default()).is_empty());
    }

    #[test]
    fn test_stats_from_group_sums_counts() {
        let group = doc! { "_id": null, "completed": 2_i32, "pending": 0_i32 };
        let stats = stats_from_group(Some(&group));
        assert_eq!(stats, WeeklyStats::new(2, 0));
        assert_eq!(stats.completed + stats.pending, stats.total);

        let wide = doc! { "_id": null, "completed": 3_i64, "pending": 4_i64 };
        assert_eq!(stats_from_group(Some(&wide)).total, 7);

        assert_eq!(stats_from_group(None), WeeklyStats::default());
    }

    #[test]
    fn test_stats_pipeline_matches_inclusive_range() {
        let pipeline = stats_pipeline("2024-03-04", "2024-03-10");
        assert_eq!(pipeline.len(), 2);
        assert_eq!(
            pipeline[0],
            doc! { "$match": { "date": { "$gte": "2024-03-04", "$lte": "2024-03-10" } } }
        );
        assert!(pipeline[1].get_document("$group").is_ok());
    }

    #[test]
    fn test_malformed_id_is_not_found() {
        assert!(parse_id("not-an-object-id").is_none());
        assert!(parse_id("").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails_with_connection_error() {
        let store = MongoTaskStore::new(MongoConfig::new(UNREACHABLE_URI));

        let result = store.connect().await;
        assert!(matches!(result, Err(Error::Connection(_))));

        let list = store.list(None).await;
        assert!(matches!(list, Err(Error::Connection(_))));
    }

    #[tokio::test]
    async fn test_invalid_uri_fails_with_connection_error() {
        let store = MongoTaskStore::new(MongoConfig::new("not a uri"));
        assert!(matches!(store.connect().await, Err(Error::Connection(_))));
    }

    #[tokio::test]
    async fn test_connection_outcome_is_shared_and_memoized() {
        let store = Arc::new(MongoTaskStore::new(MongoConfig::new(UNREACHABLE_URI)));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.connect().await })
            })
            .collect();

        let mut messages = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Err(Error::Connection(message)) => messages.push(message),
                other => panic!("Expected connection error, got: {:?}", other),
            }
        }
        assert!(messages.windows(2).all(|pair| pair[0] == pair[1]));

        // The failure is remembered; no second server selection wait
        let started = Instant::now();
        assert!(store.get(&ObjectId::new().to_hex()).await.is_err());
        assert!(started.elapsed() < Duration::from_millis(200));
    }
}
