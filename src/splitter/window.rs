//! Fixed-size sliding window splitter.

use super::TextSplitter;
use crate::error::{DocchatError, Result};

/// Splits text into windows of `chunk_size` characters, each starting
/// `chunk_size - chunk_overlap` characters after the previous one.
///
/// Dropping the first `chunk_overlap` characters of every chunk but the first
/// and concatenating gives back the input exactly.
#[derive(Debug, Clone)]
pub struct WindowSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl WindowSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(DocchatError::Splitter(format!(
                "invalid window: size {}, overlap {}",
                chunk_size, chunk_overlap
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }
}

impl TextSplitter for WindowSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::with_capacity(chars.len() / step + 1);
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::char_len;

    /// Undo a window split.
    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let mut text = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                text.push_str(chunk);
            } else {
                text.extend(chunk.chars().skip(overlap));
            }
        }
        text
    }

    fn sample_texts() -> Vec<String> {
        vec![
            String::new(),
            "a".to_string(),
            "exactly ten".chars().take(10).collect(),
            "The quick brown fox jumps over the lazy dog. ".repeat(37),
            "Ünïcödé / 日本語のテキスト / emojis 🚀🚀🚀 mixed in. ".repeat(11),
            "line one\n\nline two\nline three\n".repeat(25),
        ]
    }

    #[test]
    fn test_reconstructs_original_text() {
        for (size, overlap) in [(10, 0), (10, 3), (100, 99), (1000, 100), (7, 1)] {
            let splitter = WindowSplitter::new(size, overlap).unwrap();
            for text in sample_texts() {
                let chunks = splitter.split(&text);
                assert_eq!(
                    reconstruct(&chunks, splitter.chunk_overlap),
                    text,
                    "size {} overlap {}",
                    size,
                    overlap
                );
            }
        }
    }

    #[test]
    fn test_chunk_lengths_bounded() {
        let splitter = WindowSplitter::new(50, 10).unwrap();
        for text in sample_texts() {
            let chunks = splitter.split(&text);
            for chunk in &chunks {
                assert!(char_len(chunk) <= 50);
            }
            // All but the last chunk are full windows.
            if chunks.len() > 1 {
                for chunk in &chunks[..chunks.len() - 1] {
                    assert_eq!(char_len(chunk), 50);
                }
            }
        }
    }

    #[test]
    fn test_adjacent_chunks_share_overlap() {
        let splitter = WindowSplitter::new(6, 2).unwrap();
        let chunks = splitter.split("abcdefghijkl");
        assert_eq!(chunks, vec!["abcdef", "efghij", "ijkl"]);
    }

    #[test]
    fn test_short_and_empty_text() {
        let splitter = WindowSplitter::new(1000, 100).unwrap();
        assert!(splitter.split("").is_empty());
        assert_eq!(splitter.split("short"), vec!["short"]);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(WindowSplitter::new(0, 0).is_err());
        assert!(WindowSplitter::new(10, 10).is_err());
        assert!(WindowSplitter::new(10, 11).is_err());
    }
}
