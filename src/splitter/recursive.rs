//! Separator-aware recursive splitter.
//!
//! Splits on the coarsest separator present (paragraphs, then lines, then
//! words, then characters) and merges the pieces back into chunks of at most
//! `chunk_size` characters, carrying trailing pieces over as overlap.

use super::{char_len, TextSplitter};
use crate::error::{DocchatError, Result};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize, separators: Vec<String>) -> Result<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(DocchatError::Splitter(format!(
                "invalid recursive split: size {}, overlap {}",
                chunk_size, chunk_overlap
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators,
        })
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        // Falls back to per-character splitting when nothing matches.
        let mut separator = "";
        let mut remaining: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                remaining = &[];
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut small_pieces: Vec<String> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                small_pieces.push(piece);
                continue;
            }

            if !small_pieces.is_empty() {
                chunks.extend(self.merge(&small_pieces));
                small_pieces.clear();
            }

            if remaining.is_empty() {
                // Only reachable for single characters when chunk_size is 1.
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_with(&piece, remaining));
            }
        }

        if !small_pieces.is_empty() {
            chunks.extend(self.merge(&small_pieces));
        }

        chunks
    }

    /// Merge pieces shorter than `chunk_size` into chunks.
    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                if let Some(chunk) = join_trimmed(&current) {
                    chunks.push(chunk);
                }
                // Keep at most `chunk_overlap` characters, and make room for the new piece.
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match current.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        if let Some(chunk) = join_trimmed(&current) {
            chunks.push(chunk);
        }

        chunks
    }
}

impl TextSplitter for RecursiveSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }
}

/// Split on `separator`, attaching each separator to the piece that follows it.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(text[start..idx].to_string());
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(text[start..].to_string());
    }
    pieces
}

fn join_trimmed(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::DEFAULT_SEPARATORS;

    fn splitter(size: usize, overlap: usize) -> RecursiveSplitter {
        RecursiveSplitter::new(
            size,
            overlap,
            DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_chunks_respect_max_size() {
        let text = "Know your customer rules apply to every account.\n\n".repeat(40)
            + &"averyveryverylongwordwithoutanyspaces".repeat(20);

        for (size, overlap) in [(1000, 100), (100, 20), (30, 5), (5, 0)] {
            let chunks = splitter(size, overlap).split(&text);
            assert!(!chunks.is_empty());
            for chunk in &chunks {
                assert!(char_len(chunk) <= size, "chunk of {} > {}", char_len(chunk), size);
                assert!(!chunk.trim().is_empty());
            }
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let text = "First paragraph here.\n\nSecond paragraph here.\n\nThird one.";
        let chunks = splitter(30, 0).split(text);
        assert_eq!(
            chunks,
            vec!["First paragraph here.", "Second paragraph here.", "Third one."]
        );
    }

    #[test]
    fn test_order_preserved() {
        let words: Vec<String> = (0..200).map(|i| format!("w{:03}", i)).collect();
        let text = words.join(" ");
        let chunks = splitter(40, 8).split(&text);

        let mut last_first_word = -1i32;
        for chunk in &chunks {
            let first: i32 = chunk.split_whitespace().next().unwrap()[1..].parse().unwrap();
            assert!(first > last_first_word);
            last_first_word = first;
        }
        assert!(chunks.last().unwrap().ends_with("w199"));
    }

    #[test]
    fn test_overlap_carries_trailing_words() {
        let text = "one two three four five six seven eight nine ten";
        let chunks = splitter(20, 10).split(text);
        assert!(chunks.len() > 1);
        // The last word of a chunk reappears at the start of the next one.
        let last_word = chunks[0].split_whitespace().last().unwrap();
        assert!(chunks[1].starts_with(last_word));
    }

    #[test]
    fn test_empty_text() {
        assert!(splitter(100, 10).split("").is_empty());
        assert!(splitter(100, 10).split("   \n\n  ").is_empty());
    }
}
