use crate::error::IngestError;
use crate::models::RecallOptions;

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        let options = RecallOptions::default();
        Self {
            max_chars: options.chunk_max_chars,
            overlap_chars: options.chunk_overlap_chars,
        }
    }
}

impl From<RecallOptions> for ChunkingConfig {
    fn from(value: RecallOptions) -> Self {
        Self {
            max_chars: value.chunk_max_chars,
            overlap_chars: value.chunk_overlap_chars,
        }
    }
}

/// Window positions (in chars) for a text of `total_chars` length.
///
/// The window advances by `max_chars - overlap_chars`, clamped to at least 1
/// so an over-large overlap still makes forward progress. Emission stops as
/// soon as a window reaches the end of the text, so the final window is the
/// only one allowed to be short and no empty or fully duplicate trailing
/// window is produced.
pub fn chunk_spans(
    total_chars: usize,
    config: ChunkingConfig,
) -> Result<Vec<(usize, usize)>, IngestError> {
    if config.max_chars == 0 {
        return Err(IngestError::InvalidArgument(
            "chunk max_chars must be positive".to_string(),
        ));
    }

    let mut spans = Vec::new();
    if total_chars == 0 {
        return Ok(spans);
    }

    let step = config.max_chars.saturating_sub(config.overlap_chars).max(1);
    let mut start = 0;

    loop {
        let end = (start + config.max_chars).min(total_chars);
        spans.push((start, end));
        if end == total_chars {
            break;
        }
        start += step;
    }

    Ok(spans)
}

/// Splits `full_text` into overlapping windows of at most `max_chars` chars.
///
/// Empty input yields an empty sequence. Windows are measured in chars, not
/// bytes, so multi-byte text never splits inside a code point.
pub fn chunk_text(full_text: &str, config: ChunkingConfig) -> Result<Vec<String>, IngestError> {
    let chars: Vec<char> = full_text.chars().collect();
    let spans = chunk_spans(chars.len(), config)?;

    Ok(spans
        .into_iter()
        .map(|(start, end)| chars[start..end].iter().collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_chars: usize, overlap_chars: usize) -> ChunkingConfig {
        ChunkingConfig {
            max_chars,
            overlap_chars,
        }
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunks = chunk_text("", config(1_200, 200)).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn windows_advance_by_max_minus_overlap() {
        let chunks = chunk_text("abcdefghij", config(4, 1)).unwrap();
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn emission_stops_at_text_end() {
        // end == len on the first window; no short duplicate follows
        let chunks = chunk_text("abcd", config(4, 1)).unwrap();
        assert_eq!(chunks, vec!["abcd"]);
    }

    #[test]
    fn every_window_is_bounded_and_only_last_may_be_short() {
        let text = "x".repeat(1_000);
        let chunks = chunk_text(&text, config(300, 50)).unwrap();

        for chunk in &chunks[..chunks.len() - 1] {
            assert_eq!(chunk.len(), 300);
        }
        assert!(chunks.last().unwrap().len() <= 300);
    }

    #[test]
    fn overlap_at_least_max_still_terminates() {
        let chunks = chunk_text("abcdef", config(3, 3)).unwrap();
        // step clamps to 1, so windows slide one char at a time
        assert_eq!(chunks[0], "abc");
        assert_eq!(chunks[1], "bcd");
        assert_eq!(chunks.last().unwrap(), "def");
        assert_eq!(chunks.len(), 4);
    }

    #[test]
    fn overlap_larger_than_max_still_terminates() {
        let chunks = chunk_text("abcdef", config(2, 10)).unwrap();
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks.last().unwrap(), "ef");
    }

    #[test]
    fn zero_max_chars_is_rejected() {
        let result = chunk_text("abc", config(0, 0));
        assert!(matches!(result, Err(IngestError::InvalidArgument(_))));
    }

    #[test]
    fn concatenating_non_overlapping_prefixes_reconstructs_text() {
        let text: String = ('a'..='z').cycle().take(5_000).collect();
        let cfg = config(700, 150);
        let chunks = chunk_text(&text, cfg).unwrap();

        let step = cfg.max_chars - cfg.overlap_chars;
        let mut rebuilt = String::new();
        for (position, chunk) in chunks.iter().enumerate() {
            if position + 1 == chunks.len() {
                // the final window contributes everything past the previous step
                let already = position * step;
                rebuilt.extend(text.chars().skip(already).take(chunk.chars().count()));
            } else {
                rebuilt.extend(chunk.chars().take(step));
            }
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn windows_respect_char_boundaries() {
        let text = "héllo wörld, ünïcode text here";
        let chunks = chunk_text(text, config(7, 2)).unwrap();
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 7));
        assert_eq!(chunks[0], "héllo w");
    }
}
