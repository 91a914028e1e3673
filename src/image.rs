use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

/// Words in one loadable program page.
pub const PROGRAM_WORDS: usize = 32768;
pub const WORD_BYTES: usize = 2;
pub const IMAGE_BYTES: usize = PROGRAM_WORDS * WORD_BYTES;

/// One encoded instruction. Byte 0 carries the opcode and primary nibbles,
/// byte 1 the operands or literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InstructionWord(pub u16);

impl InstructionWord {
    pub const ZERO: InstructionWord = InstructionWord(0);

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn to_bytes(self) -> [u8; WORD_BYTES] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for InstructionWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Encoded program padded to [`PROGRAM_WORDS`] words. Only built through
/// [`ProgramImage::from_words`], which keeps `instructions <= words.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramImage {
    words: Vec<InstructionWord>,
    instructions: usize,
}

impl ProgramImage {
    /// Wrap encoded words, appending zero words up to a full page. Programs
    /// longer than a page are kept as-is.
    pub fn from_words(mut words: Vec<InstructionWord>) -> Self {
        let instructions = words.len();
        if instructions < PROGRAM_WORDS {
            words.resize(PROGRAM_WORDS, InstructionWord::ZERO);
        }
        Self { words, instructions }
    }

    pub fn words(&self) -> &[InstructionWord] {
        &self.words
    }

    /// Words that came from source lines, excluding padding.
    pub fn instructions(&self) -> &[InstructionWord] {
        &self.words[..self.instructions]
    }

    pub fn instruction_count(&self) -> usize {
        self.instructions
    }

    pub fn padding(&self) -> usize {
        self.words.len() - self.instructions
    }

    /// Length in words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn byte_len(&self) -> usize {
        self.words.len() * WORD_BYTES
    }

    pub fn is_oversized(&self) -> bool {
        self.instructions > PROGRAM_WORDS
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for w in &self.words {
            out.extend_from_slice(&w.to_bytes());
        }
        out
    }

    pub fn write_to<W: Write>(&self, mut sink: W) -> io::Result<()> {
        sink.write_all(&self.to_bytes())?;
        sink.flush()
    }
}
