use crate::error::IngestError;
use base64::{engine::general_purpose::STANDARD, Engine};
use lopdf::Document;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

/// Extracted document text, with page structure when the source provided it.
///
/// The local PDF parser yields per-page text; the LLM fallback usually yields
/// one undifferentiated blob, in which case `pages` is empty and chunks built
/// from this text carry no page attribution.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub pages: Vec<PageText>,
    pub full_text: String,
}

impl ExtractedText {
    pub fn from_pages(pages: Vec<PageText>) -> Self {
        let full_text = pages
            .iter()
            .map(|page| page.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self { pages, full_text }
    }

    pub fn from_unpaged(text: impl Into<String>) -> Self {
        Self {
            pages: Vec::new(),
            full_text: text.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.full_text.trim().is_empty()
    }

    /// Page containing the given char offset of `full_text`, when known.
    ///
    /// Pages are joined with a single separator char, which is attributed to
    /// the page it follows.
    pub fn page_at(&self, char_offset: usize) -> Option<u32> {
        if self.pages.is_empty() {
            return None;
        }

        let mut consumed = 0;
        for page in &self.pages {
            // page text plus the joining newline
            let span = page.text.chars().count() + 1;
            if char_offset < consumed + span {
                return Some(page.number);
            }
            consumed += span;
        }
        self.pages.last().map(|page| page.number)
    }
}

#[derive(Debug, Clone, Serialize)]
struct LlmExtractRequest {
    pdf_base64: String,
    source_path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LlmExtractResponse {
    pages: Option<Vec<LlmExtractPage>>,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct LlmExtractPage {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExtractEndpointConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

pub trait PdfExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedText, IngestError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedText, IngestError> {
        let document =
            Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            let text = document
                .extract_text(&[page_no])
                .map_err(|error| IngestError::PdfParse(error.to_string()))?;

            if !text.trim().is_empty() {
                pages.push(PageText {
                    number: page_no,
                    text,
                });
            }
        }

        if pages.is_empty() {
            return Err(IngestError::PdfParse(format!(
                "pdf had no readable page text: {}",
                path.display()
            )));
        }

        Ok(ExtractedText::from_pages(pages))
    }
}

/// Extracts a PDF's text, falling back to the configured LLM extraction
/// endpoint when the local parser finds no readable text.
pub fn extract_document_text(path: &Path) -> Result<ExtractedText, IngestError> {
    let extracted = LopdfExtractor.extract(path);

    match extracted {
        Ok(text) => Ok(text),
        Err(IngestError::PdfParse(parse_error)) => match extract_with_llm(path) {
            Ok(Some(text)) => Ok(text),
            Ok(None) => Err(IngestError::PdfParse(parse_error)),
            Err(llm_error) => Err(IngestError::PdfParse(format!(
                "{parse_error}; llm extraction fallback failed: {llm_error}"
            ))),
        },
        Err(error) => Err(error),
    }
}

fn parse_llm_extract_config() -> Option<ExtractEndpointConfig> {
    let endpoint = std::env::var("LLM_EXTRACT_ENDPOINT").ok()?;
    let endpoint = endpoint.trim().to_string();
    if endpoint.is_empty() {
        return None;
    }

    let api_key = std::env::var("LLM_EXTRACT_API_KEY").ok().and_then(|value| {
        let key = value.trim().to_string();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    });

    Some(ExtractEndpointConfig { endpoint, api_key })
}

fn extract_with_llm(path: &Path) -> Result<Option<ExtractedText>, IngestError> {
    tokio::task::block_in_place(|| extract_with_llm_blocking(path))
}

fn extract_with_llm_blocking(path: &Path) -> Result<Option<ExtractedText>, IngestError> {
    let cfg = match parse_llm_extract_config() {
        Some(cfg) => cfg,
        None => return Ok(None),
    };

    let pdf = std::fs::read(path).map_err(IngestError::Io)?;
    let payload = LlmExtractRequest {
        pdf_base64: STANDARD.encode(pdf),
        source_path: path.to_string_lossy().to_string(),
    };

    let mut request = Client::new()
        .post(&cfg.endpoint)
        .header("content-type", "application/json")
        .json(&payload);

    if let Some(api_key) = cfg.api_key {
        request = request.bearer_auth(api_key);
    }

    let response = request.send()?;

    if !response.status().is_success() {
        return Err(IngestError::ExtractionFailed(format!(
            "llm extraction request to {} returned {}",
            cfg.endpoint,
            response.status()
        )));
    }

    let payload: LlmExtractResponse = response.json()?;
    let text = payload_to_text(&payload, path)?;

    if text.is_empty() {
        return Err(IngestError::ExtractionFailed(format!(
            "llm extraction response has no readable text: {}",
            path.display()
        )));
    }

    Ok(Some(text))
}

fn payload_to_text(
    payload: &LlmExtractResponse,
    path: &Path,
) -> Result<ExtractedText, IngestError> {
    if let Some(listed) = &payload.pages {
        let listed = listed
            .iter()
            .filter_map(|page| {
                let text = page.text.as_ref().map(|value| value.trim().to_string());
                text.and_then(|normalized| {
                    if normalized.is_empty() {
                        None
                    } else {
                        Some(PageText {
                            number: page.page.unwrap_or(1),
                            text: normalized,
                        })
                    }
                })
            })
            .collect::<Vec<_>>();

        if !listed.is_empty() {
            return Ok(ExtractedText::from_pages(listed));
        }
    }

    if let Some(raw_text) = &payload.text {
        let trimmed = raw_text.trim();
        if !trimmed.is_empty() {
            // whole-document extraction carries no page structure
            return Ok(ExtractedText::from_unpaged(trimmed));
        }
    }

    Err(IngestError::ExtractionFailed(format!(
        "llm extraction response was empty for {}",
        path.display()
    )))
}
