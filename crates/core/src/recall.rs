use crate::error::RecallError;
use crate::extractor::extract_document_text;
use crate::llm::TextModel;
use crate::models::{RecallOptions, ScoredChunk};
use crate::retrieval::rank;
use crate::store::ChunkStore;
use std::path::Path;

/// Separator between context chunks in the answer prompt.
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Context text used when the store holds no chunks.
pub const EMPTY_CONTEXT: &str = "No documents found.";

pub fn build_context(sources: &[ScoredChunk]) -> String {
    if sources.is_empty() {
        return EMPTY_CONTEXT.to_string();
    }

    sources
        .iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

pub fn answer_prompt(context: &str, question: &str) -> String {
    format!(
        "You are Cognistore AI. Use the provided context to answer the user's question. \
         If the context is empty or the answer isn't there, politely say you don't know \
         based on the uploaded documents.\n\nContext: {context}\n\nUser: {question}"
    )
}

pub fn summary_prompt(document_text: &str) -> String {
    format!(
        "You are a highly intelligent corporate assistant. Please read the following \
         document text and provide a concise, 2-sentence summary of the main decisions, \
         trade-offs, or insights.\n\nDocument Text:\n{document_text}"
    )
}

#[derive(Debug, Clone)]
pub struct RecallAnswer {
    pub text: String,
    pub sources: Vec<ScoredChunk>,
}

/// Question answering over a chunk store: load, rank, prompt, generate.
pub struct RecallPipeline<S, M> {
    store: S,
    model: M,
    options: RecallOptions,
}

impl<S, M> RecallPipeline<S, M>
where
    S: ChunkStore + Send + Sync,
    M: TextModel + Send + Sync,
{
    pub fn new(store: S, model: M) -> Self {
        Self {
            store,
            model,
            options: RecallOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RecallOptions) -> Self {
        self.options = options;
        self
    }

    /// Answers a question from the most relevant stored chunks.
    ///
    /// An empty store is not an error: the model is prompted with the
    /// no-context text and expected to decline politely.
    pub async fn answer(&self, question: &str) -> Result<RecallAnswer, RecallError> {
        if question.trim().is_empty() {
            return Err(RecallError::InvalidArgument(
                "question is empty".to_string(),
            ));
        }

        let chunks = self.store.list_chunks().await?;
        let sources = if chunks.is_empty() {
            Vec::new()
        } else {
            rank(question, &chunks, self.options.top_k)?
        };

        let context = build_context(&sources);
        let text = self
            .model
            .generate(&answer_prompt(&context, question))
            .await?;

        Ok(RecallAnswer { text, sources })
    }

    /// Extracts a PDF's text and asks the model for a two-sentence summary.
    pub async fn summarize(&self, path: &Path) -> Result<String, RecallError> {
        let extracted = extract_document_text(path)?;
        self.model
            .generate(&summary_prompt(&extracted.full_text))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Chunk, DocumentFingerprint};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeStore {
        chunks: Vec<Chunk>,
    }

    #[async_trait]
    impl ChunkStore for FakeStore {
        async fn put_chunks(
            &self,
            _document: &DocumentFingerprint,
            _chunks: &[Chunk],
        ) -> Result<(), RecallError> {
            Ok(())
        }

        async fn list_chunks(&self) -> Result<Vec<Chunk>, RecallError> {
            Ok(self.chunks.clone())
        }

        async fn documents(&self) -> Result<Vec<DocumentFingerprint>, RecallError> {
            Ok(Vec::new())
        }
    }

    struct FakeModel {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextModel for FakeModel {
        async fn generate(&self, prompt: &str) -> Result<String, RecallError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn chunk(text: &str, index: u64) -> Chunk {
        Chunk {
            text: text.to_string(),
            index,
            page: None,
        }
    }

    fn options(top_k: usize) -> RecallOptions {
        RecallOptions {
            top_k,
            ..RecallOptions::default()
        }
    }

    #[tokio::test]
    async fn answer_feeds_ranked_context_to_the_model() {
        let store = FakeStore {
            chunks: vec![
                chunk("nothing relevant here", 0),
                chunk("the hydraulic pump failed", 1),
            ],
        };
        let pipeline =
            RecallPipeline::new(store, FakeModel::new("It failed.")).with_options(options(1));

        let answer = pipeline.answer("why did the pump fail?").await.unwrap();

        assert_eq!(answer.text, "It failed.");
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].chunk.index, 1);

        let prompts = pipeline.model.prompts.lock().unwrap();
        assert!(prompts[0].contains("the hydraulic pump failed"));
        assert!(prompts[0].contains("why did the pump fail?"));
    }

    #[tokio::test]
    async fn answer_joins_multiple_chunks_with_the_separator() {
        let store = FakeStore {
            chunks: vec![chunk("pump manual", 0), chunk("pump diagram", 1)],
        };
        let pipeline = RecallPipeline::new(store, FakeModel::new("ok")).with_options(options(6));

        pipeline.answer("pump").await.unwrap();

        let prompts = pipeline.model.prompts.lock().unwrap();
        assert!(prompts[0].contains(&format!("pump manual{CONTEXT_SEPARATOR}pump diagram")));
    }

    #[tokio::test]
    async fn empty_store_prompts_with_no_context_text() {
        let store = FakeStore { chunks: Vec::new() };
        let pipeline = RecallPipeline::new(store, FakeModel::new("I don't know."));

        let answer = pipeline.answer("anything?").await.unwrap();

        assert!(answer.sources.is_empty());
        let prompts = pipeline.model.prompts.lock().unwrap();
        assert!(prompts[0].contains(EMPTY_CONTEXT));
    }

    #[tokio::test]
    async fn empty_question_is_rejected() {
        let store = FakeStore { chunks: Vec::new() };
        let pipeline = RecallPipeline::new(store, FakeModel::new("unused"));

        let result = pipeline.answer("   ").await;
        assert!(matches!(result, Err(RecallError::InvalidArgument(_))));
    }

    #[test]
    fn context_of_no_sources_is_the_placeholder() {
        assert_eq!(build_context(&[]), EMPTY_CONTEXT);
    }
}
