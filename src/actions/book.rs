//! Book actions: authoring, publishing, and uploading files.
//! All of them require a session.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{payload, ActionReply, ActionResult, Actions, Escape, Redirect, Step};
use crate::dispatch::{AuthRequirement, HttpRequest, RawResponse, RequestBody, RequestDescriptor, UploadPart};
use crate::error::ActionError;
use crate::graphql::mutations;

/// Details entered when creating a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    pub name: String,
    pub description: String,
    pub publishing_rights: bool,
    pub categories: Vec<String>,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A book record as the backend returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub edition: Option<Value>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublishPayload {
    #[serde(default)]
    message: Option<String>,
}

/// Cover image and manuscript for one book
#[derive(Debug, Clone, PartialEq)]
pub struct UploadBundle {
    pub cover: UploadPart,
    pub manuscript: UploadPart,
}

impl Actions {
    /// Create a book record and return it.
    pub async fn add_book_details(&self, details: &BookDetails) -> ActionReply<Book> {
        self.settle("add_book_details", self.try_add_book_details(details).await)
    }

    async fn try_add_book_details(&self, details: &BookDetails) -> Step<ActionReply<Book>> {
        let variables = serde_json::to_value(details)
            .map_err(|e| ActionError::Validation(format!("Invalid book details: {}", e)))?;
        let descriptor = RequestDescriptor::trusted(mutations::ADD_BOOK_DETAILS)
            .auth(AuthRequirement::Required)
            .variables(variables)
            .build();
        let mut response = self.run(descriptor).await?;

        match payload::<Book>(&mut response, "addBookDetails")? {
            Some(book) => Ok(ActionReply::Done(ActionResult::ok_with("Success", book))),
            None => Err(ActionError::Business("Failed to save the book details".to_string()).into()),
        }
    }

    /// Publish a previously created book.
    pub async fn publish_book(&self, book_id: &str) -> ActionReply {
        self.settle("publish_book", self.try_publish_book(book_id).await)
    }

    async fn try_publish_book(&self, book_id: &str) -> Step<ActionReply> {
        let descriptor = RequestDescriptor::trusted(mutations::PUBLISH_BOOK)
            .auth(AuthRequirement::Required)
            .variables(json!({ "bookId": book_id }))
            .build();
        let mut response = self.run(descriptor).await?;

        let message = payload::<PublishPayload>(&mut response, "publishBook")?
            .and_then(|p| p.message)
            .unwrap_or_else(|| "success".to_string());
        Ok(ActionReply::Done(ActionResult::ok(message)))
    }

    /// Upload the cover, then the manuscript. Not transactional: when the
    /// manuscript fails the cover stays uploaded.
    pub async fn upload_files(&self, book_id: &str, files: UploadBundle) -> ActionReply {
        self.settle("upload_files", self.try_upload_files(book_id, files).await)
    }

    async fn try_upload_files(&self, book_id: &str, files: UploadBundle) -> Step<ActionReply> {
        let Some(session) = self.sessions.valid_session().await else {
            return Err(Escape::Redirect(Redirect::to(self.sessions.sign_in_redirect_target())));
        };
        let bearer = format!("Bearer {}", session.access_token);

        self.upload(self.upload_url("cover", book_id), &bearer, files.cover, "cover image")
            .await?;
        self.upload(self.upload_url("file", book_id), &bearer, files.manuscript, "book file")
            .await?;

        Ok(ActionReply::Done(ActionResult::ok("Success")))
    }

    fn upload_url(&self, kind: &str, book_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.upload_base_url.trim_end_matches('/'),
            kind,
            urlencoding::encode(book_id)
        )
    }

    async fn upload(&self, url: String, bearer: &str, part: UploadPart, what: &str) -> Result<(), ActionError> {
        debug!("Uploading {} ({} bytes) to {}", what, part.bytes.len(), url);
        let response = self
            .dispatcher
            .transport()
            .send(HttpRequest {
                url,
                headers: vec![
                    ("Authorization".to_string(), bearer.to_string()),
                    ("Accept".to_string(), "application/json".to_string()),
                ],
                body: RequestBody::Multipart(vec![part]),
            })
            .await?;

        if response.is_success() {
            return Ok(());
        }
        warn!("Upload of {} rejected with status {}", what, response.status);
        Err(ActionError::Business(upload_failure_message(&response, what)))
    }
}

/// The server's `message` if the reply carries one, else a generic line.
fn upload_failure_message(response: &RawResponse, what: &str) -> String {
    serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Failed to upload the {}", what))
}
