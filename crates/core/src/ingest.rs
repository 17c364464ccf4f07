use crate::chunking::{chunk_spans, ChunkingConfig};
use crate::error::IngestError;
use crate::extractor::{extract_document_text, ExtractedText};
use crate::models::{Chunk, DocumentFingerprint, RecallOptions};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Splits extracted text into the document's chunk sequence.
///
/// Indices are 0-based and strictly increasing within the document. Each
/// chunk records the page containing its first character when the extraction
/// carried page structure.
pub fn build_chunks(
    extracted: &ExtractedText,
    options: &RecallOptions,
) -> Result<Vec<Chunk>, IngestError> {
    let config = ChunkingConfig::from(*options);
    let chars: Vec<char> = extracted.full_text.chars().collect();
    let spans = chunk_spans(chars.len(), config)?;

    Ok(spans
        .into_iter()
        .enumerate()
        .map(|(index, (start, end))| Chunk {
            text: chars[start..end].iter().collect(),
            index: index as u64,
            page: extracted.page_at(start),
        })
        .collect())
}

#[derive(Debug, Clone)]
pub struct IngestedDocument {
    pub fingerprint: DocumentFingerprint,
    pub chunks: Vec<Chunk>,
}

pub struct SkippedPdf {
    pub path: PathBuf,
    pub reason: String,
}

pub struct IngestionReport {
    pub documents: Vec<IngestedDocument>,
    pub skipped_files: Vec<SkippedPdf>,
}

impl IngestionReport {
    pub fn chunk_count(&self) -> usize {
        self.documents.iter().map(|doc| doc.chunks.len()).sum()
    }
}

/// Extracts and chunks a single PDF.
pub fn ingest_pdf_file(
    path: &Path,
    options: &RecallOptions,
) -> Result<IngestedDocument, IngestError> {
    let fingerprint = build_document_fingerprint(path)?;
    let extracted = extract_document_text(path)?;
    let chunks = build_chunks(&extracted, options)?;

    Ok(IngestedDocument {
        fingerprint,
        chunks,
    })
}

/// Ingests every PDF under `folder`, skipping unreadable files instead of
/// failing the whole run.
pub fn ingest_folder_best_effort(
    folder: &Path,
    options: &RecallOptions,
) -> Result<IngestionReport, IngestError> {
    let files = discover_pdf_files(folder);

    if files.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no pdf files found in {}",
            folder.display()
        )));
    }

    let mut documents = Vec::new();
    let mut skipped_files = Vec::new();

    for path in files {
        match ingest_pdf_file(&path, options) {
            Ok(document) => documents.push(document),
            Err(error) => skipped_files.push(SkippedPdf {
                path,
                reason: error.to_string(),
            }),
        }
    }

    Ok(IngestionReport {
        documents,
        skipped_files,
    })
}

fn build_document_fingerprint(path: &Path) -> Result<DocumentFingerprint, IngestError> {
    let checksum = digest_file(path)?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
        })?;

    Ok(DocumentFingerprint {
        document_id: generate_document_id(path),
        title: name.to_string(),
        source_path: path.to_string_lossy().to_string(),
        checksum,
        ingested_at: Utc::now(),
    })
}

fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}
