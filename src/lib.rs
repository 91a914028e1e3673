pub mod encoder;
pub mod image;
pub mod opcode;

pub use encoder::{
    encode_instruction, encode_program, EncodeError, Encoder, EncoderConfig, FieldPolicy,
    InstrError, Malformed,
};
pub use image::{InstructionWord, ProgramImage, IMAGE_BYTES, PROGRAM_WORDS, WORD_BYTES};
pub use opcode::{resolve, ArgClass, Field, Fields, Opcode, UnknownOpcode};
