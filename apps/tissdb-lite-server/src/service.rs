//! Hyper `Service` serving the command protocol.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use serde_json::{Value, json};
use tracing::{debug, warn};

use tissdb_lite_store::Database;

use crate::command::{CommandError, Outcome, execute, parse_body, parse_command};

/// Path of the command endpoint.
pub const COMMAND_PATH: &str = "/command";

const CONTENT_TYPE: &str = "application/json";

/// Response type produced by [`CommandService`].
pub type CommandResponse = http::Response<Full<Bytes>>;

/// Hyper `Service` dispatching `POST /command` requests to a [`Database`].
#[derive(Debug, Clone)]
pub struct CommandService {
    db: Arc<Database>,
}

impl CommandService {
    /// Create a new service over a shared database.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl hyper::service::Service<http::Request<Incoming>> for CommandService {
    type Response = CommandResponse;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let db = Arc::clone(&self.db);

        Box::pin(async move {
            let (parts, incoming) = req.into_parts();
            let body = match incoming.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    warn!(error = %e, "failed to read request body");
                    return Ok(error_response(
                        http::StatusCode::BAD_REQUEST,
                        &format!("Failed to read request body: {e}"),
                    ));
                }
            };

            // Store operations block on file I/O.
            let response = tokio::task::spawn_blocking(move || {
                respond(&db, &parts.method, parts.uri.path(), &body)
            })
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "command task failed");
                error_response(http::StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
            });
            Ok(response)
        })
    }
}

/// Handle one request. The body is decoded before routing, so malformed
/// JSON is rejected with 400 on every path.
pub fn respond(db: &Database, method: &http::Method, path: &str, body: &[u8]) -> CommandResponse {
    let value = match parse_body(body) {
        Ok(value) => value,
        Err(err) => return command_error_response(&err),
    };

    if path != COMMAND_PATH || *method != http::Method::POST {
        debug!(%method, path, "no route");
        return error_response(http::StatusCode::NOT_FOUND, "Not Found");
    }

    match parse_command(value).and_then(|command| execute(db, command)) {
        Ok(Outcome::Data(data)) => json_response(
            http::StatusCode::OK,
            &json!({ "status": "success", "data": data }),
        ),
        Ok(Outcome::Message(message)) => json_response(
            http::StatusCode::OK,
            &json!({ "status": "success", "message": message }),
        ),
        Err(err) => command_error_response(&err),
    }
}

fn command_error_response(err: &CommandError) -> CommandResponse {
    debug!(error = %err, "command failed");
    error_response(err.status(), &err.to_string())
}

fn error_response(status: http::StatusCode, message: &str) -> CommandResponse {
    json_response(status, &json!({ "status": "error", "message": message }))
}

fn json_response(status: http::StatusCode, body: &Value) -> CommandResponse {
    let mut response = http::Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static(CONTENT_TYPE),
    );
    response
}
