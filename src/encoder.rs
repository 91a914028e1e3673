use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::image::{InstructionWord, ProgramImage, PROGRAM_WORDS};
pub use crate::opcode::UnknownOpcode;
use crate::opcode::{resolve, Field};

/// Why a line with a known mnemonic could not be encoded.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
    #[error("empty instruction")]
    Empty,
    #[error("`{mnemonic}` takes {expected} arguments, found {found}")]
    MissingArguments {
        mnemonic: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{field} argument `{token}` is not an integer")]
    NotAnInteger { field: Field, token: String },
    #[error("{field} value {value} is outside 0..={max}")]
    OutOfRange { field: Field, value: String, max: i64 },
}

/// Failure to encode a single instruction.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InstrError {
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),
    #[error("malformed instruction: {0}")]
    Malformed(#[from] Malformed),
}

impl From<UnknownOpcode> for InstrError {
    fn from(err: UnknownOpcode) -> Self {
        InstrError::UnknownOpcode(err.0)
    }
}

/// Failure to encode a program; `line` is the 0-based index of the offending
/// source line.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("line {}: unknown opcode `{mnemonic}`", .line + 1)]
    UnknownOpcode { mnemonic: String, line: usize },
    #[error("line {}: malformed instruction: {reason}", .line + 1)]
    MalformedInstruction { line: usize, reason: Malformed },
}

impl EncodeError {
    pub fn at(line: usize, err: InstrError) -> Self {
        match err {
            InstrError::UnknownOpcode(mnemonic) => EncodeError::UnknownOpcode { mnemonic, line },
            InstrError::Malformed(reason) => EncodeError::MalformedInstruction { line, reason },
        }
    }

    pub fn line(&self) -> usize {
        match self {
            EncodeError::UnknownOpcode { line, .. } | EncodeError::MalformedInstruction { line, .. } => *line,
        }
    }
}

/// What to do with an argument that does not fit its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldPolicy {
    /// Keep `value mod width`, so `-1` becomes `15` in a nibble.
    #[default]
    Wrap,
    /// Reject anything outside `0..width`.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub field_policy: FieldPolicy,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    cfg: EncoderConfig,
}

impl Encoder {
    pub fn new(cfg: EncoderConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.cfg
    }

    /// Encode one tokenized line: mnemonic first, then its decimal arguments.
    /// Tokens past the opcode's arity are ignored.
    pub fn encode_instruction<S: AsRef<str>>(&self, tokens: &[S]) -> Result<InstructionWord, InstrError> {
        let (mnemonic, args) = tokens.split_first().ok_or(Malformed::Empty)?;
        let (op, class) = resolve(mnemonic.as_ref())?;
        if args.len() < class.arity() {
            return Err(Malformed::MissingArguments {
                mnemonic: op.mnemonic(),
                expected: class.arity(),
                found: args.len(),
            }
            .into());
        }

        let mut raw = u16::from(op.code()) << 12;
        for (field, token) in class.operands().zip(args) {
            raw |= self.field_value(field, token.as_ref())? << field.shift();
        }
        Ok(InstructionWord(raw))
    }

    fn field_value(&self, field: Field, token: &str) -> Result<u16, Malformed> {
        let int = DecimalArg::parse(token).ok_or_else(|| Malformed::NotAnInteger {
            field,
            token: token.to_string(),
        })?;
        let width = field.modulus();
        let fits = matches!(int.exact, Some(v) if (0..width).contains(&v));
        if self.cfg.field_policy == FieldPolicy::Strict && !fits {
            return Err(Malformed::OutOfRange {
                field,
                value: token.to_string(),
                max: width - 1,
            });
        }
        Ok((int.residue % width) as u16)
    }

    /// Encode every line in order and pad the result to a full program page.
    /// The first failing line aborts the whole program.
    pub fn encode_program<L, S>(&self, lines: &[L]) -> Result<ProgramImage, EncodeError>
    where
        L: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut words = Vec::with_capacity(lines.len().max(PROGRAM_WORDS));
        for (line, tokens) in lines.iter().enumerate() {
            let word = self
                .encode_instruction(tokens.as_ref())
                .map_err(|err| EncodeError::at(line, err))?;
            trace!(line, %word, "encoded instruction");
            words.push(word);
        }

        let image = ProgramImage::from_words(words);
        if image.is_oversized() {
            warn!(
                instructions = image.instruction_count(),
                limit = PROGRAM_WORDS,
                "program exceeds one page; image left unpadded"
            );
        } else {
            debug!(
                instructions = image.instruction_count(),
                padding = image.padding(),
                "program image padded"
            );
        }
        Ok(image)
    }
}

/// Signed decimal argument of any length. Every field width divides 256, so
/// the value is carried as its residue mod 256.
struct DecimalArg {
    residue: i64,
    /// `None` once the value no longer fits an `i64`.
    exact: Option<i64>,
}

impl DecimalArg {
    fn parse(token: &str) -> Option<Self> {
        let (sign, digits) = match token.as_bytes().first()? {
            b'-' => (-1, &token[1..]),
            b'+' => (1, &token[1..]),
            _ => (1, token),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let mut residue = 0i64;
        let mut magnitude = Some(0i64);
        for b in digits.bytes() {
            let d = i64::from(b - b'0');
            residue = (residue * 10 + d) % 256;
            magnitude = magnitude.and_then(|m| m.checked_mul(10)?.checked_add(d));
        }
        Some(Self {
            residue: (sign * residue).rem_euclid(256),
            exact: magnitude.map(|m| sign * m),
        })
    }
}

/// [`Encoder::encode_instruction`] with the default wrapping policy.
pub fn encode_instruction<S: AsRef<str>>(tokens: &[S]) -> Result<InstructionWord, InstrError> {
    Encoder::default().encode_instruction(tokens)
}

/// [`Encoder::encode_program`] with the default wrapping policy.
pub fn encode_program<L, S>(lines: &[L]) -> Result<ProgramImage, EncodeError>
where
    L: AsRef<[S]>,
    S: AsRef<str>,
{
    Encoder::default().encode_program(lines)
}
