use crate::error::RecallError;
use crate::models::{Chunk, DocumentFingerprint};
use crate::store::ChunkStore;
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::sync::Arc;

pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com/v1";

/// Firestore REST adapter for the per-user document database.
///
/// Chunks live under `users/{user}/nodes/{document}/chunks`; one `commit`
/// call per document writes the node record and every chunk as a single
/// atomic batch, with a server-assigned `createdAt` timestamp. Read-back
/// coerces Firestore's loosely-typed value maps into [`Chunk`]s and drops
/// malformed records at this boundary instead of letting them reach scoring.
pub struct FirestoreStore {
    client: Arc<Client>,
    endpoint: String,
    project_id: String,
    user_id: String,
    auth_token: Option<String>,
}

impl FirestoreStore {
    pub fn new(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        user_id: impl Into<String>,
        auth_token: Option<String>,
    ) -> Self {
        Self {
            client: Arc::new(Client::new()),
            endpoint: endpoint.into(),
            project_id: project_id.into(),
            user_id: user_id.into(),
            auth_token,
        }
    }

    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/(default)/documents",
            self.project_id
        )
    }

    fn node_name(&self, document_id: &str) -> String {
        format!(
            "{}/users/{}/nodes/{}",
            self.documents_root(),
            self.user_id,
            document_id
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn run_query(&self, body: Value) -> Result<Vec<Value>, RecallError> {
        let url = format!(
            "{}/{}/users/{}:runQuery",
            self.endpoint,
            self.documents_root(),
            self.user_id
        );

        let response = self.authorized(self.client.post(url).json(&body)).send().await?;

        if !response.status().is_success() {
            return Err(RecallError::BackendResponse {
                backend: "firestore".to_string(),
                details: response.status().to_string(),
            });
        }

        let rows: Value = response.json().await?;
        Ok(rows.as_array().cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ChunkStore for FirestoreStore {
    async fn put_chunks(
        &self,
        document: &DocumentFingerprint,
        chunks: &[Chunk],
    ) -> Result<(), RecallError> {
        let node_name = self.node_name(&document.document_id);

        let mut writes = vec![json!({
            "update": {
                "name": node_name,
                "fields": {
                    "title": {"stringValue": document.title},
                    "sourcePath": {"stringValue": document.source_path},
                    "checksum": {"stringValue": document.checksum},
                    "ingestedAt": {"timestampValue": document.ingested_at.to_rfc3339()},
                }
            }
        })];

        for chunk in chunks {
            let chunk_id = make_chunk_id(&document.document_id, chunk.index, &chunk.text);
            let mut fields = json!({
                "text": {"stringValue": chunk.text},
                "idx": {"integerValue": chunk.index.to_string()},
            });
            if let Some(page) = chunk.page {
                fields["page"] = json!({"integerValue": page.to_string()});
            }

            writes.push(json!({
                "update": {
                    "name": format!("{node_name}/chunks/{chunk_id}"),
                    "fields": fields,
                },
                "updateTransforms": [
                    {"fieldPath": "createdAt", "setToServerValue": "REQUEST_TIME"}
                ]
            }));
        }

        let url = format!("{}/{}:commit", self.endpoint, self.documents_root());
        let response = self
            .authorized(self.client.post(url).json(&json!({"writes": writes})))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RecallError::BackendResponse {
                backend: "firestore".to_string(),
                details: response.status().to_string(),
            });
        }
        Ok(())
    }

    async fn list_chunks(&self) -> Result<Vec<Chunk>, RecallError> {
        let rows = self
            .run_query(json!({
                "structuredQuery": {
                    "from": [{"collectionId": "chunks", "allDescendants": true}],
                    "orderBy": [
                        {"field": {"fieldPath": "createdAt"}, "direction": "ASCENDING"}
                    ]
                }
            }))
            .await?;

        Ok(chunks_from_query_rows(&rows))
    }

    async fn documents(&self) -> Result<Vec<DocumentFingerprint>, RecallError> {
        let rows = self
            .run_query(json!({
                "structuredQuery": {
                    "from": [{"collectionId": "nodes"}]
                }
            }))
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.pointer("/document"))
            .filter_map(fingerprint_from_document)
            .collect())
    }
}

fn make_chunk_id(document_id: &str, index: u64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn chunks_from_query_rows(rows: &[Value]) -> Vec<Chunk> {
    rows.iter()
        .filter_map(|row| row.pointer("/document/fields"))
        .filter_map(chunk_from_fields)
        .collect()
}

/// Coerces one Firestore value map into a chunk; `None` for records with no
/// usable text or index.
fn chunk_from_fields(fields: &Value) -> Option<Chunk> {
    let text = fields
        .pointer("/text/stringValue")
        .and_then(Value::as_str)?
        .to_string();
    if text.is_empty() {
        return None;
    }

    let index = integer_field(fields, "idx")?;
    let page = integer_field(fields, "page").and_then(|value| u32::try_from(value).ok());

    Some(Chunk { text, index, page })
}

/// Firestore encodes integers as `{"integerValue": "42"}` with a string
/// payload; tolerate a bare JSON number as well.
fn integer_field(fields: &Value, name: &str) -> Option<u64> {
    let value = fields.pointer(&format!("/{name}/integerValue"))?;
    match value {
        Value::String(raw) => raw.parse().ok(),
        Value::Number(number) => number.as_u64(),
        _ => None,
    }
}

fn fingerprint_from_document(document: &Value) -> Option<DocumentFingerprint> {
    let name = document.pointer("/name").and_then(Value::as_str)?;
    let document_id = name.rsplit('/').next()?.to_string();
    let fields = document.pointer("/fields")?;

    let string_field = |key: &str| {
        fields
            .pointer(&format!("/{key}/stringValue"))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let ingested_at = fields
        .pointer("/ingestedAt/timestampValue")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())?
        .with_timezone(&chrono::Utc);

    Some(DocumentFingerprint {
        document_id,
        title: string_field("title")?,
        source_path: string_field("sourcePath")?,
        checksum: string_field("checksum")?,
        ingested_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_fields_coerce_into_a_chunk() {
        let fields = json!({
            "text": {"stringValue": "window text"},
            "idx": {"integerValue": "4"},
            "page": {"integerValue": "2"},
        });

        let chunk = chunk_from_fields(&fields).expect("fields should coerce");
        assert_eq!(chunk.text, "window text");
        assert_eq!(chunk.index, 4);
        assert_eq!(chunk.page, Some(2));
    }

    #[test]
    fn page_is_optional() {
        let fields = json!({
            "text": {"stringValue": "window text"},
            "idx": {"integerValue": "0"},
        });
        assert_eq!(chunk_from_fields(&fields).unwrap().page, None);
    }

    #[test]
    fn malformed_records_are_dropped() {
        let missing_text = json!({"idx": {"integerValue": "0"}});
        let empty_text = json!({
            "text": {"stringValue": ""},
            "idx": {"integerValue": "0"},
        });
        let bad_index = json!({
            "text": {"stringValue": "x"},
            "idx": {"integerValue": "not-a-number"},
        });

        assert!(chunk_from_fields(&missing_text).is_none());
        assert!(chunk_from_fields(&empty_text).is_none());
        assert!(chunk_from_fields(&bad_index).is_none());
    }

    #[test]
    fn query_rows_skip_non_document_entries() {
        // runQuery responses interleave documents with readTime-only rows
        let rows = vec![
            json!({"readTime": "2026-01-01T00:00:00Z"}),
            json!({
                "document": {
                    "name": "projects/p/databases/(default)/documents/users/u/nodes/d/chunks/c",
                    "fields": {
                        "text": {"stringValue": "kept"},
                        "idx": {"integerValue": "1"},
                    }
                }
            }),
        ];

        let chunks = chunks_from_query_rows(&rows);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "kept");
    }

    #[test]
    fn fingerprints_parse_from_node_documents() {
        let document = json!({
            "name": "projects/p/databases/(default)/documents/users/u/nodes/doc-9",
            "fields": {
                "title": {"stringValue": "manual.pdf"},
                "sourcePath": {"stringValue": "/data/manual.pdf"},
                "checksum": {"stringValue": "abc123"},
                "ingestedAt": {"timestampValue": "2026-08-01T12:00:00Z"},
            }
        });

        let fingerprint = fingerprint_from_document(&document).expect("node should parse");
        assert_eq!(fingerprint.document_id, "doc-9");
        assert_eq!(fingerprint.title, "manual.pdf");
    }

    #[test]
    fn chunk_ids_are_deterministic() {
        let first = make_chunk_id("doc", 0, "text");
        let second = make_chunk_id("doc", 0, "text");
        let other = make_chunk_id("doc", 1, "text");
        assert_eq!(first, second);
        assert_ne!(first, other);
    }
}
