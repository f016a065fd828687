//! Sliding-window text chunker.
//!
//! Splits document text into overlapping windows of `window_size` units,
//! each window starting `window_size - overlap` units after the previous
//! one. Units are either Unicode scalar values or whitespace-delimited
//! words (see [`ChunkUnit`]).
//!
//! Every chunk is an exact substring of the input. The final window may be
//! shorter than `window_size`; it is never padded and never dropped. Text
//! that fits in a single window comes back unchanged as the only chunk.
//!
//! # Example
//!
//! ```rust
//! use sidekick_core::chunk::chunk_text;
//! use sidekick_core::models::{ChunkUnit, ChunkingConfig};
//!
//! let cfg = ChunkingConfig { window_size: 4, overlap: 1, unit: ChunkUnit::Chars };
//! let chunks = chunk_text("abcdefghij", &cfg).unwrap();
//! assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
//! ```

use crate::error::{Error, Result};
use crate::models::{ChunkUnit, ChunkingConfig};

/// Reject parameters that cannot produce forward progress.
pub fn validate(config: &ChunkingConfig) -> Result<()> {
    if config.overlap >= config.window_size {
        return Err(Error::InvalidConfiguration(format!(
            "chunk overlap ({}) must be smaller than window size ({})",
            config.overlap, config.window_size
        )));
    }
    Ok(())
}

/// Split `text` into overlapping windows.
///
/// # Errors
///
/// [`Error::InvalidConfiguration`] when `overlap >= window_size`.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
    validate(config)?;

    // Byte spans of each unit; a chunk covers spans[i].start..spans[j].end.
    let spans = unit_spans(text, config.unit);

    if spans.len() <= config.window_size {
        return Ok(vec![text.to_string()]);
    }

    let step = config.window_size - config.overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + config.window_size).min(spans.len());
        let from = spans[start].0;
        let to = spans[end - 1].1;
        chunks.push(text[from..to].to_string());
        if end == spans.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

/// Byte `(start, end)` spans of every unit in `text`.
fn unit_spans(text: &str, unit: ChunkUnit) -> Vec<(usize, usize)> {
    match unit {
        ChunkUnit::Chars => text
            .char_indices()
            .map(|(i, c)| (i, i + c.len_utf8()))
            .collect(),
        ChunkUnit::Words => {
            let mut spans = Vec::new();
            let mut word_start: Option<usize> = None;
            for (i, c) in text.char_indices() {
                match (c.is_whitespace(), word_start) {
                    (true, Some(s)) => {
                        spans.push((s, i));
                        word_start = None;
                    }
                    (false, None) => word_start = Some(i),
                    _ => {}
                }
            }
            if let Some(s) = word_start {
                spans.push((s, text.len()));
            }
            spans
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(window_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            window_size,
            overlap,
            unit: ChunkUnit::Chars,
        }
    }

    fn words(window_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            window_size,
            overlap,
            unit: ChunkUnit::Words,
        }
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("Hello, world!", &chars(256, 32)).unwrap();
        assert_eq!(chunks, vec!["Hello, world!"]);
    }

    #[test]
    fn test_exact_window_single_chunk() {
        let chunks = chunk_text("abcd", &chars(4, 1)).unwrap();
        assert_eq!(chunks, vec!["abcd"]);
    }

    #[test]
    fn test_empty_text_single_chunk() {
        assert_eq!(chunk_text("", &chars(8, 2)).unwrap(), vec![""]);
        assert_eq!(chunk_text("", &words(8, 2)).unwrap(), vec![""]);
    }

    #[test]
    fn test_overlap_equal_window_rejected() {
        let err = chunk_text("anything", &chars(4, 4)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_overlap_larger_than_window_rejected() {
        let err = chunk_text("anything", &words(2, 10)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_zero_window_rejected() {
        let err = chunk_text("", &chars(0, 0)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_char_windows_advance_by_step() {
        let chunks = chunk_text("abcdefghij", &chars(4, 1)).unwrap();
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_final_chunk_shorter_and_kept() {
        let chunks = chunk_text("abcdefghijk", &chars(4, 0)).unwrap();
        assert_eq!(chunks, vec!["abcd", "efgh", "ijk"]);
    }

    #[test]
    fn test_zero_overlap_concatenates_to_input() {
        let text = "The quick brown fox jumps over the lazy dog";
        let chunks = chunk_text(text, &chars(7, 0)).unwrap();
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_multibyte_chars_counted_once() {
        let text = "┌──┐│é│└──┘";
        let chunks = chunk_text(text, &chars(4, 2)).unwrap();
        for c in &chunks {
            assert!(c.chars().count() <= 4);
            assert!(text.contains(c.as_str()));
        }
        assert!(chunks.last().unwrap().ends_with('┘'));
    }

    #[test]
    fn test_word_windows_are_substrings() {
        let text = "one two  three\tfour five\nsix seven";
        let chunks = chunk_text(text, &words(3, 1)).unwrap();
        assert_eq!(
            chunks,
            vec!["one two  three", "three\tfour five", "five\nsix seven"]
        );
    }

    #[test]
    fn test_word_short_text_keeps_whitespace() {
        let text = "  padded text \n";
        let chunks = chunk_text(text, &words(5, 1)).unwrap();
        assert_eq!(chunks, vec![text]);
    }

    #[test]
    fn test_consecutive_overlap_matches_config() {
        let text: String = (0..40).map(|i| format!("w{} ", i)).collect();
        let chunks = chunk_text(&text, &words(10, 3)).unwrap();
        for pair in chunks.windows(2) {
            let prev: Vec<&str> = pair[0].split_whitespace().collect();
            let next: Vec<&str> = pair[1].split_whitespace().collect();
            assert_eq!(&prev[prev.len() - 3..], &next[..3]);
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let c1 = chunk_text(text, &words(3, 1)).unwrap();
        let c2 = chunk_text(text, &words(3, 1)).unwrap();
        assert_eq!(c1, c2);
    }
}
