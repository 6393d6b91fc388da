//! The `POST /command` protocol.
//!
//! A request body is a JSON object whose `action` field selects the
//! operation; the remaining fields are the operation's arguments.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use tissdb_lite_store::{Database, Document, StoreError};

/// A decoded command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    /// Create (or reset) a collection.
    CreateCollection { collection_name: String },
    /// Insert one document, creating the collection if needed.
    Insert {
        collection_name: String,
        item: Document,
    },
    /// Find documents matching a condition.
    Find {
        collection_name: String,
        #[serde(default, rename = "condition_string")]
        condition: Option<String>,
    },
    /// Merge a document over the stored one with the same `_id`.
    Update {
        collection_name: String,
        item: Document,
    },
    /// Remove a document by id.
    Remove {
        collection_name: String,
        item_id: String,
    },
    /// Insert several documents.
    BulkInsert {
        collection_name: String,
        items: Vec<Document>,
    },
    /// Return every document of a collection.
    ExportCollection { collection_name: String },
    /// Drop every collection.
    DeleteDb,
    /// Run a `SELECT ... FROM ... [WHERE ...]` statement.
    Query { statement: String },
    #[serde(other)]
    Unknown,
}

/// Successful result of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Returned as `{"status":"success","data":...}`.
    Data(Value),
    /// Returned as `{"status":"success","message":...}`.
    Message(&'static str),
}

/// Errors surfaced to the client.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The body is not valid JSON.
    #[error("Invalid JSON body.")]
    InvalidJson,
    /// The `action` field is missing or not recognized.
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    /// The action is known but its arguments do not decode.
    #[error("Invalid arguments for {action}: {message}")]
    InvalidArguments { action: String, message: String },
    /// The store rejected the command.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommandError {
    /// HTTP status for this error.
    pub fn status(&self) -> http::StatusCode {
        match self {
            Self::InvalidJson => http::StatusCode::BAD_REQUEST,
            _ => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Decode the raw JSON body. An empty body decodes as `{}`.
pub fn parse_body(body: &[u8]) -> Result<Value, CommandError> {
    if body.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(body).map_err(|_| CommandError::InvalidJson)
}

/// Decode a command from a parsed body.
pub fn parse_command(body: Value) -> Result<Command, CommandError> {
    let Some(action) = body.get("action").and_then(Value::as_str).map(str::to_owned) else {
        let shown = body.get("action").map_or_else(|| "undefined".to_owned(), Value::to_string);
        return Err(CommandError::UnknownAction(shown));
    };
    match serde_json::from_value(body) {
        Ok(Command::Unknown) => Err(CommandError::UnknownAction(action)),
        Ok(command) => Ok(command),
        Err(e) => Err(CommandError::InvalidArguments {
            action,
            message: e.to_string(),
        }),
    }
}

/// Execute a command against the database.
pub fn execute(db: &Database, command: Command) -> Result<Outcome, CommandError> {
    debug!(command = ?command, "executing command");
    let outcome = match command {
        Command::CreateCollection { collection_name } => {
            db.create_collection(&collection_name)?;
            Outcome::Message("Collection created.")
        }
        Command::Insert {
            collection_name,
            item,
        } => {
            db.ensure_collection(&collection_name)?;
            Outcome::Data(Value::Object(db.insert(&collection_name, item)?))
        }
        Command::Find {
            collection_name,
            condition,
        } => documents(db.find(&collection_name, condition.as_deref().unwrap_or_default())?),
        Command::Update {
            collection_name,
            item,
        } => Outcome::Data(Value::Object(db.update(&collection_name, item)?)),
        Command::Remove {
            collection_name,
            item_id,
        } => {
            db.remove(&collection_name, &item_id)?;
            Outcome::Message("Item removed.")
        }
        Command::BulkInsert {
            collection_name,
            items,
        } => documents(db.bulk_insert(&collection_name, items)?),
        Command::ExportCollection { collection_name } => {
            documents(db.export_collection(&collection_name)?)
        }
        Command::DeleteDb => {
            db.clear()?;
            Outcome::Message("In-memory DB cleared.")
        }
        Command::Query { statement } => documents(db.query(&statement)?),
        Command::Unknown => return Err(CommandError::UnknownAction("unknown".to_owned())),
    };
    Ok(outcome)
}

fn documents(docs: Vec<Document>) -> Outcome {
    Outcome::Data(Value::Array(docs.into_iter().map(Value::Object).collect()))
}
