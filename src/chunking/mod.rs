//! Sentence-aware text splitting for document chunking.
//!
//! Sizes are measured in whitespace-separated words. Text is cut into sentences, then
//! sentences are packed greedily into chunks; each new chunk starts with the trailing
//! sentences of the previous one, up to `chunk_overlap` words.

use crate::error::{HowieError, Result};
use std::collections::VecDeque;

/// Splits text into overlapping chunks that end on sentence boundaries where possible.
#[derive(Debug, Clone, Copy)]
pub struct SentenceSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

#[derive(Debug, Clone)]
struct Piece {
    text: String,
    words: usize,
}

impl SentenceSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(HowieError::InvalidInput("chunk_size must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(HowieError::InvalidInput(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Split `text` into chunks. Whitespace-only input yields no chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let pieces = self.pieces(text);

        let mut chunks = Vec::new();
        let mut current: VecDeque<Piece> = VecDeque::new();
        let mut current_words = 0;

        for piece in pieces {
            if !current.is_empty() && current_words + piece.words > self.chunk_size {
                chunks.push(join(&current));

                let mut carried = VecDeque::new();
                let mut carried_words = 0;
                while let Some(last) = current.pop_back() {
                    if carried_words + last.words > self.chunk_overlap {
                        break;
                    }
                    carried_words += last.words;
                    carried.push_front(last);
                }
                // The carry must leave room for the incoming piece.
                while carried_words + piece.words > self.chunk_size {
                    match carried.pop_front() {
                        Some(first) => carried_words -= first.words,
                        None => break,
                    }
                }
                current = carried;
                current_words = carried_words;
            }

            current_words += piece.words;
            current.push_back(piece);
        }

        if !current.is_empty() {
            chunks.push(join(&current));
        }
        chunks
    }

    /// Sentences, with any sentence longer than a chunk cut into chunk-sized windows.
    fn pieces(&self, text: &str) -> Vec<Piece> {
        let mut pieces = Vec::new();
        for sentence in split_sentences(text) {
            let words: Vec<&str> = sentence.split_whitespace().collect();
            if words.len() <= self.chunk_size {
                pieces.push(Piece {
                    text: words.join(" "),
                    words: words.len(),
                });
            } else {
                for window in words.chunks(self.chunk_size) {
                    pieces.push(Piece {
                        text: window.join(" "),
                        words: window.len(),
                    });
                }
            }
        }
        pieces
    }
}

fn join(pieces: &VecDeque<Piece>) -> String {
    pieces
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut text at sentence terminators followed by whitespace, and at blank lines.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();

    for paragraph in text.split("\n\n") {
        let mut buf = String::new();
        let mut chars = paragraph.chars().peekable();
        while let Some(c) = chars.next() {
            buf.push(c);
            let at_boundary = matches!(c, '.' | '!' | '?')
                && chars.peek().map_or(true, |next| next.is_whitespace());
            if at_boundary {
                push_sentence(&mut sentences, &buf);
                buf.clear();
            }
        }
        push_sentence(&mut sentences, &buf);
    }

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !normalized.is_empty() {
        sentences.push(normalized);
    }
}
