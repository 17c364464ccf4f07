use crate::error::RecallError;
use crate::models::{Chunk, DocumentFingerprint};
use crate::store::ChunkStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// File-backed chunk store: one JSON file per document under a root
/// directory. Intended for offline CLI use and tests.
pub struct LocalStore {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentRecord {
    fingerprint: DocumentFingerprint,
    chunks: Vec<Chunk>,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn document_path(&self, document_id: &str) -> PathBuf {
        self.root.join(format!("{document_id}.json"))
    }

    async fn read_records(&self) -> Result<Vec<DocumentRecord>, RecallError> {
        let mut records = Vec::new();

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(records),
            Err(error) => return Err(error.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort_unstable();

        for path in paths {
            let bytes = fs::read(&path).await?;
            let record: DocumentRecord = serde_json::from_slice(&bytes)?;
            records.push(record);
        }

        // creation order across documents keeps tie-broken rankings stable
        records.sort_by(|left, right| {
            left.fingerprint
                .ingested_at
                .cmp(&right.fingerprint.ingested_at)
                .then_with(|| left.fingerprint.document_id.cmp(&right.fingerprint.document_id))
        });

        Ok(records)
    }
}

#[async_trait]
impl ChunkStore for LocalStore {
    async fn put_chunks(
        &self,
        document: &DocumentFingerprint,
        chunks: &[Chunk],
    ) -> Result<(), RecallError> {
        fs::create_dir_all(&self.root).await?;

        let record = DocumentRecord {
            fingerprint: document.clone(),
            chunks: chunks.to_vec(),
        };
        let payload = serde_json::to_vec_pretty(&record)?;

        // write-then-rename so a document's batch lands whole or not at all
        let target = self.document_path(&document.document_id);
        let staging = staging_path(&target);
        fs::write(&staging, payload).await?;
        fs::rename(&staging, &target).await?;
        Ok(())
    }

    async fn list_chunks(&self) -> Result<Vec<Chunk>, RecallError> {
        let records = self.read_records().await?;
        Ok(records
            .into_iter()
            .flat_map(|record| record.chunks)
            .collect())
    }

    async fn documents(&self) -> Result<Vec<DocumentFingerprint>, RecallError> {
        let records = self.read_records().await?;
        Ok(records.into_iter().map(|record| record.fingerprint).collect())
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn fingerprint(id: &str) -> DocumentFingerprint {
        DocumentFingerprint {
            document_id: id.to_string(),
            title: format!("{id}.pdf"),
            source_path: format!("/tmp/{id}.pdf"),
            checksum: "checksum".to_string(),
            ingested_at: Utc::now(),
        }
    }

    fn chunk(text: &str, index: u64) -> Chunk {
        Chunk {
            text: text.to_string(),
            index,
            page: Some(1),
        }
    }

    #[tokio::test]
    async fn chunks_round_trip_through_the_filesystem() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        let chunks = vec![chunk("first window", 0), chunk("second window", 1)];
        store.put_chunks(&fingerprint("doc-1"), &chunks).await.unwrap();

        let listed = store.list_chunks().await.unwrap();
        assert_eq!(listed, chunks);

        let documents = store.documents().await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].document_id, "doc-1");
    }

    #[tokio::test]
    async fn rewriting_a_document_replaces_its_batch() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let doc = fingerprint("doc-1");

        store
            .put_chunks(&doc, &[chunk("old", 0), chunk("older", 1)])
            .await
            .unwrap();
        store.put_chunks(&doc, &[chunk("new", 0)]).await.unwrap();

        let listed = store.list_chunks().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].text, "new");
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("missing"));
        assert!(store.list_chunks().await.unwrap().is_empty());
        assert!(store.documents().await.unwrap().is_empty());
    }
}
