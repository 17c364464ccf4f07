use crate::error::RecallError;
use crate::models::{Chunk, DocumentFingerprint};
use async_trait::async_trait;

/// Persistence boundary for ingested chunks.
///
/// `put_chunks` writes one document's chunks as a single batch; callers rely
/// on the batch being all-or-nothing where the backend supports it.
/// `list_chunks` returns every stored chunk across documents in creation
/// order, which is what keeps tie-broken rankings reproducible.
#[async_trait]
pub trait ChunkStore {
    async fn put_chunks(
        &self,
        document: &DocumentFingerprint,
        chunks: &[Chunk],
    ) -> Result<(), RecallError>;

    async fn list_chunks(&self) -> Result<Vec<Chunk>, RecallError>;

    async fn documents(&self) -> Result<Vec<DocumentFingerprint>, RecallError>;
}

#[async_trait]
impl<T> ChunkStore for Box<T>
where
    T: ChunkStore + Send + Sync + ?Sized,
{
    async fn put_chunks(
        &self,
        document: &DocumentFingerprint,
        chunks: &[Chunk],
    ) -> Result<(), RecallError> {
        (**self).put_chunks(document, chunks).await
    }

    async fn list_chunks(&self) -> Result<Vec<Chunk>, RecallError> {
        (**self).list_chunks().await
    }

    async fn documents(&self) -> Result<Vec<DocumentFingerprint>, RecallError> {
        (**self).documents().await
    }
}
