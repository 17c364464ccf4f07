pub mod chunking;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod recall;
pub mod retrieval;
pub mod store;
pub mod stores;

pub use chunking::{chunk_spans, chunk_text, ChunkingConfig};
pub use error::{IngestError, RecallError};
pub use extractor::{extract_document_text, ExtractedText, PageText, PdfExtractor};
pub use ingest::{
    build_chunks, discover_pdf_files, ingest_folder_best_effort, ingest_pdf_file,
    IngestedDocument, IngestionReport, SkippedPdf,
};
pub use llm::{GeminiClient, TextModel};
pub use models::{Chunk, DocumentFingerprint, RecallOptions, ScoredChunk};
pub use recall::{RecallAnswer, RecallPipeline, CONTEXT_SEPARATOR, EMPTY_CONTEXT};
pub use retrieval::{extract_keywords, rank};
pub use store::ChunkStore;
pub use stores::{FirestoreStore, LocalStore};
