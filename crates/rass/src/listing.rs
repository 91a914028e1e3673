use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use risky_asm::{ProgramImage, WORD_BYTES};

use crate::source::Line;

#[derive(Debug, Clone, Serialize)]
pub struct ListingEntry {
    pub line: usize,
    pub source: String,
    pub word: String,
    pub bytes: [u8; WORD_BYTES],
}

#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub instructions: usize,
    pub image_bytes: usize,
    pub entries: Vec<ListingEntry>,
}

/// Pair each source line with the word it produced. Padding is not listed.
pub fn build_listing(lines: &[Line], image: &ProgramImage) -> Listing {
    let entries = lines
        .iter()
        .zip(image.instructions())
        .enumerate()
        .map(|(line, (tokens, word))| ListingEntry {
            line,
            source: tokens.join(" "),
            word: word.to_string(),
            bytes: word.to_bytes(),
        })
        .collect();
    Listing {
        instructions: image.instruction_count(),
        image_bytes: image.byte_len(),
        entries,
    }
}

pub fn write_listing(path: &Path, listing: &Listing) -> Result<()> {
    let json = serde_json::to_string_pretty(listing)?;
    std::fs::write(path, json).with_context(|| format!("writing listing {}", path.display()))
}
