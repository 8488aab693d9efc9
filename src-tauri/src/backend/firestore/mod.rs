//! Document store client for the Cloud Firestore REST API (v1).

pub mod value;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use self::value::{decode_fields, encode_fields};
use super::{CredentialService, Document, DocumentStore, Fields};
use crate::error::{Result, VitalWatchError};

const PAGE_SIZE: u32 = 300;

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl RawDocument {
    fn into_document(self) -> Result<Document> {
        let id = document_id(&self.name)?;
        let fields = decode_fields(self.fields.as_ref())?;
        Ok(Document { id, fields })
    }
}

/// Last path segment of a full document resource name.
fn document_id(name: &str) -> Result<String> {
    name.rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
        .ok_or_else(|| VitalWatchError::Store(format!("Malformed document name: {}", name)))
}

/// Quote a field path segment when it is not a plain identifier.
fn field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn check_segment(kind: &str, segment: &str) -> Result<()> {
    if segment.is_empty() || segment.contains('/') {
        return Err(VitalWatchError::Store(format!(
            "Invalid {} '{}'",
            kind, segment
        )));
    }
    Ok(())
}

pub struct Firestore {
    client: reqwest::Client,
    documents_url: Option<String>,
    api_key: Option<String>,
    credentials: Arc<dyn CredentialService>,
}

impl Firestore {
    /// `documents_url` is the `.../databases/(default)/documents` root; `None`
    /// when no project is configured, in which case every call fails with a
    /// configuration error.
    pub fn new(
        documents_url: Option<String>,
        api_key: Option<String>,
        credentials: Arc<dyn CredentialService>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("VitalWatch/0.1")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client, using defaults: {}", e);
                reqwest::Client::new()
            });

        Self {
            client,
            documents_url,
            api_key,
            credentials,
        }
    }

    fn collection_url(&self, collection: &str) -> Result<Url> {
        check_segment("collection", collection)?;
        let base = self.documents_url.as_deref().ok_or_else(|| {
            VitalWatchError::Config(
                "Firebase project id is not configured. Add it in Settings.".to_string(),
            )
        })?;
        let mut url = Url::parse(base)
            .map_err(|e| VitalWatchError::Config(format!("Invalid Firestore URL '{}': {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| VitalWatchError::Config(format!("Invalid Firestore URL '{}'", base)))?
            .push(collection);
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    fn document_url(&self, collection: &str, id: &str) -> Result<Url> {
        check_segment("document id", id)?;
        let mut url = self.collection_url(collection)?;
        url.path_segments_mut()
            .map_err(|_| VitalWatchError::Store("Cannot build document URL".to_string()))?
            .push(id);
        Ok(url)
    }

    /// Send a request with the current bearer token. `Ok(None)` on 404.
    async fn send(&self, method: Method, url: Url, body: Option<Value>) -> Result<Option<Value>> {
        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(token) = self.credentials.id_token().await? {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        debug!("Firestore {} {}", method, url.path());
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| text.trim().to_string());
            warn!("Firestore {} {} failed: {} {}", method, url.path(), status, message);
            return Err(VitalWatchError::Store(format!("{} {}", status.as_u16(), message)));
        }

        if text.trim().is_empty() {
            return Ok(Some(Value::Object(Default::default())));
        }
        Ok(Some(serde_json::from_str(&text)?))
    }
}

#[async_trait]
impl DocumentStore for Firestore {
    async fn get_all(&self, collection: &str) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.collection_url(collection)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &PAGE_SIZE.to_string());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page: ListResponse = match self.send(Method::GET, url, None).await? {
                Some(body) => serde_json::from_value(body)?,
                None => break,
            };
            for raw in page.documents {
                documents.push(raw.into_document()?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Listed {} documents from {}", documents.len(), collection);
        Ok(documents)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let url = self.document_url(collection, id)?;
        match self.send(Method::GET, url, None).await? {
            Some(body) => {
                let raw: RawDocument = serde_json::from_value(body)?;
                raw.into_document().map(Some)
            }
            None => Ok(None),
        }
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String> {
        let url = self.collection_url(collection)?;
        let body = json!({ "fields": encode_fields(&fields) });
        let created = self
            .send(Method::POST, url, Some(body))
            .await?
            .ok_or_else(|| VitalWatchError::NotFound(format!("collection {}", collection)))?;
        let raw: RawDocument = serde_json::from_value(created)?;
        let id = document_id(&raw.name)?;
        info!("Added document {}/{}", collection, id);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let url = self.document_url(collection, id)?;
        let body = json!({ "fields": encode_fields(&fields) });
        self.send(Method::PATCH, url, Some(body))
            .await?
            .ok_or_else(|| VitalWatchError::NotFound(format!("{}/{}", collection, id)))?;
        info!("Wrote document {}/{}", collection, id);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut url = self.document_url(collection, id)?;
        {
            let mut query = url.query_pairs_mut();
            for key in fields.keys() {
                query.append_pair("updateMask.fieldPaths", &field_path(key));
            }
            query.append_pair("currentDocument.exists", "true");
        }
        let body = json!({ "fields": encode_fields(&fields) });
        self.send(Method::PATCH, url, Some(body))
            .await?
            .ok_or_else(|| VitalWatchError::NotFound(format!("{}/{}", collection, id)))?;
        info!("Updated document {}/{}", collection, id);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let url = self.document_url(collection, id)?;
        self.send(Method::DELETE, url, None).await?;
        info!("Deleted document {}/{}", collection, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryAuth;

    fn store(documents_url: Option<&str>, api_key: Option<&str>) -> Firestore {
        Firestore::new(
            documents_url.map(String::from),
            api_key.map(String::from),
            Arc::new(MemoryAuth::new()),
        )
    }

    const ROOT: &str = "https://firestore.googleapis.com/v1/projects/vital/databases/(default)/documents";

    #[test]
    fn test_document_url() {
        let fs = store(Some(ROOT), Some("AIza"));
        let url = fs.document_url("diagnosticTests", "abc123").unwrap();
        assert!(url
            .path()
            .ends_with("/databases/(default)/documents/diagnosticTests/abc123"));
        assert_eq!(url.query(), Some("key=AIza"));
    }

    #[test]
    fn test_rejects_slash_in_id() {
        let fs = store(Some(ROOT), None);
        assert!(fs.document_url("users", "a/b").is_err());
        assert!(fs.document_url("users", "").is_err());
    }

    #[test]
    fn test_unconfigured_project() {
        let fs = store(None, None);
        let err = fs.collection_url("alerts").unwrap_err();
        assert!(matches!(err, VitalWatchError::Config(_)));
    }

    #[test]
    fn test_document_id_from_name() {
        let name = "projects/vital/databases/(default)/documents/alerts/Xy12";
        assert_eq!(document_id(name).unwrap(), "Xy12");
        assert!(document_id("projects/vital/documents/").is_err());
    }

    #[test]
    fn test_field_path_quoting() {
        assert_eq!(field_path("result"), "result");
        assert_eq!(field_path("first_name2"), "first_name2");
        assert_eq!(field_path("blood-type"), "`blood-type`");
        assert_eq!(field_path("2fa"), "`2fa`");
    }

    #[test]
    fn test_list_response_parsing() {
        let body = json!({
            "documents": [{
                "name": "projects/vital/databases/(default)/documents/diagnosticTests/t1",
                "fields": {
                    "name": { "stringValue": "CBC" },
                    "result": { "stringValue": "Normal" },
                    "date": { "stringValue": "2025-01-01" }
                },
                "createTime": "2025-01-01T00:00:00Z",
                "updateTime": "2025-01-01T00:00:00Z"
            }],
            "nextPageToken": ""
        });
        let page: ListResponse = serde_json::from_value(body).unwrap();
        let docs: Vec<Document> = page
            .documents
            .into_iter()
            .map(|d| d.into_document().unwrap())
            .collect();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "t1");
        assert_eq!(docs[0].fields["result"], json!("Normal"));

        let empty: ListResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.documents.is_empty());
    }
}
