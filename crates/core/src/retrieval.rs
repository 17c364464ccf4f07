use crate::error::RecallError;
use crate::models::{Chunk, ScoredChunk};
use regex::Regex;

/// Queries contribute at most this many keywords to scoring.
pub const MAX_QUERY_KEYWORDS: usize = 12;

/// Tokens shorter than this are dropped during keyword extraction.
pub const MIN_KEYWORD_CHARS: usize = 3;

/// Lowercases the query and splits it into scoring keywords.
///
/// Tokens are runs of ASCII letters and digits; anything shorter than
/// [`MIN_KEYWORD_CHARS`] is discarded and only the first
/// [`MAX_QUERY_KEYWORDS`] survivors are kept, in query order. Repeated words
/// are deliberately NOT de-duplicated: each occurrence in the query counts
/// independently toward a chunk's score.
pub fn extract_keywords(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| token.len() >= MIN_KEYWORD_CHARS)
        .take(MAX_QUERY_KEYWORDS)
        .map(str::to_string)
        .collect()
}

fn keyword_pattern(keyword: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\b{}\b", regex::escape(keyword)))
}

/// Scores every chunk by whole-word keyword occurrences and returns the
/// top `k` by descending score.
///
/// Matching is whole-word: keyword `cat` matches `cat` but not `category`.
/// The sort is stable, so chunks with equal scores (commonly all zero) keep
/// their input order and the top-K slice is reproducible. Chunks that match
/// nothing score 0 and remain eligible for the output; an empty `chunks`
/// input yields an empty output.
pub fn rank(query: &str, chunks: &[Chunk], k: usize) -> Result<Vec<ScoredChunk>, RecallError> {
    if k == 0 {
        return Err(RecallError::InvalidArgument(
            "top_k must be positive".to_string(),
        ));
    }

    let patterns = extract_keywords(query)
        .iter()
        .map(|keyword| keyword_pattern(keyword))
        .collect::<Result<Vec<_>, _>>()?;

    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .map(|chunk| {
            let lowered = chunk.text.to_lowercase();
            let score = patterns
                .iter()
                .map(|pattern| pattern.find_iter(&lowered).count() as u64)
                .sum();
            ScoredChunk {
                chunk: chunk.clone(),
                score,
            }
        })
        .collect();

    scored.sort_by(|left, right| right.score.cmp(&left.score));
    scored.truncate(k);
    Ok(scored)
}
