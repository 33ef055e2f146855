//! `.tim` program image files.
//!
//! A plain-text exchange format for assembled programs:
//! - One 9-trit sign-string word per line, from address 0 upward
//! - `;` starts a comment
//! - Blank lines are ignored

use crate::ternary::Word;
use crate::cpu::{Memory, MemoryError};
use std::path::Path;
use thiserror::Error;

/// Largest number of words an image can place from address 0.
pub const MAX_IMAGE_WORDS: usize = Word::MAX as usize + 1;

/// A loaded program image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageFile {
    /// Program words, starting at address 0.
    pub words: Vec<Word>,
}

impl ImageFile {
    /// Create an image from a word list.
    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }

    /// Capture the first `len` words of memory, starting at address 0.
    pub fn from_memory(mem: &Memory, len: usize) -> Self {
        let words = (0..len.min(MAX_IMAGE_WORDS))
            .map(|addr| mem.read(Word::wrapping_from_i32(addr as i32)))
            .collect();
        Self { words }
    }

    /// A fresh memory holding this image at address 0.
    pub fn to_memory(&self) -> Result<Memory, MemoryError> {
        let mut mem = Memory::new();
        mem.load_program(0, &self.words)?;
        Ok(mem)
    }

    /// Get the number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Parse image text.
    pub fn parse(text: &str) -> Result<Self, ImageError> {
        let mut words = Vec::new();

        for (line_num, line) in text.lines().enumerate() {
            let trimmed = line.split(';').next().unwrap_or("").trim();
            if trimmed.is_empty() {
                continue;
            }

            let word = Word::parse(trimmed).map_err(|e| ImageError::Parse {
                line: line_num + 1,
                message: e.to_string(),
            })?;

            if words.len() == MAX_IMAGE_WORDS {
                return Err(ImageError::Parse {
                    line: line_num + 1,
                    message: format!("image exceeds {} words", MAX_IMAGE_WORDS),
                });
            }
            words.push(word);
        }

        Ok(Self { words })
    }

    /// Render image text, annotating each word with its address.
    pub fn render(&self) -> String {
        let mut out = String::from("; trivm image\n");
        out.push_str(&format!("; {} words\n\n", self.len()));

        for (addr, word) in self.words.iter().enumerate() {
            out.push_str(&format!("{} ; {:05}\n", word, addr));
        }
        out
    }
}

/// Load an image file from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<ImageFile, ImageError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ImageError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
    ImageFile::parse(&text)
}

/// Save an image file to disk.
pub fn save_image<P: AsRef<Path>>(path: P, image: &ImageFile) -> Result<(), ImageError> {
    std::fs::write(path.as_ref(), image.render())
        .map_err(|e| ImageError::Io(format!("{}: {}", path.as_ref().display(), e)))
}

/// Errors that can occur reading or writing image files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}
