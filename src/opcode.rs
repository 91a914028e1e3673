use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// RISKY operation, stored in the high nibble of an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Opcode {
    Add = 0x0,
    Sub = 0x1,
    Mul = 0x2,
    Mod = 0x3,
    And = 0x4,
    Not = 0x5,
    Or = 0x6,
    Xor = 0x7,
    Sav = 0x8,
    Lod = 0x9,
    Cop = 0xA,
    Set = 0xB,
    Jmp = 0xC,
    Jif = 0xD,
    Equ = 0xE,
    Grt = 0xF,
}

impl Opcode {
    /// Every opcode, indexed by its numeric code.
    pub const ALL: [Opcode; 16] = [
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Mod,
        Opcode::And,
        Opcode::Not,
        Opcode::Or,
        Opcode::Xor,
        Opcode::Sav,
        Opcode::Lod,
        Opcode::Cop,
        Opcode::Set,
        Opcode::Jmp,
        Opcode::Jif,
        Opcode::Equ,
        Opcode::Grt,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Opcode> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn mnemonic(self) -> &'static str {
        TABLE[self as usize].mnemonic
    }

    pub fn class(self) -> ArgClass {
        TABLE[self as usize].class
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for Opcode {
    type Err = UnknownOpcode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve(s).map(|(op, _)| op)
    }
}

/// Operand shape of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgClass {
    /// primary, operand A, operand B
    Ternary,
    /// primary, operand A
    Binary,
    /// primary, 8-bit literal
    Literal,
    /// operand A, operand B; the primary nibble stays zero
    RawPair,
}

bitflags! {
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fields: u8 {
const PRIMARY = 1 << 0;
const OPERAND_A = 1 << 1;
const OPERAND_B = 1 << 2;
const LITERAL = 1 << 3;
}
}

impl ArgClass {
    pub const fn fields(self) -> Fields {
        match self {
            ArgClass::Ternary => Fields::PRIMARY
                .union(Fields::OPERAND_A)
                .union(Fields::OPERAND_B),
            ArgClass::Binary => Fields::PRIMARY.union(Fields::OPERAND_A),
            ArgClass::Literal => Fields::PRIMARY.union(Fields::LITERAL),
            ArgClass::RawPair => Fields::OPERAND_A.union(Fields::OPERAND_B),
        }
    }

    /// Number of argument tokens following the mnemonic.
    pub fn arity(self) -> usize {
        self.fields().bits().count_ones() as usize
    }

    /// Fields in the order their arguments appear on a source line.
    pub fn operands(self) -> impl Iterator<Item = Field> {
        let fields = self.fields();
        Field::ORDER
            .into_iter()
            .filter(move |f| fields.contains(f.flag()))
    }
}

/// A packed field of the 16-bit instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Primary,
    OperandA,
    OperandB,
    Literal,
}

impl Field {
    pub const ORDER: [Field; 4] = [Field::Primary, Field::OperandA, Field::OperandB, Field::Literal];

    pub const fn flag(self) -> Fields {
        match self {
            Field::Primary => Fields::PRIMARY,
            Field::OperandA => Fields::OPERAND_A,
            Field::OperandB => Fields::OPERAND_B,
            Field::Literal => Fields::LITERAL,
        }
    }

    /// Number of distinct values the field holds (16 for a nibble, 256 for a byte).
    pub const fn modulus(self) -> i64 {
        match self {
            Field::Literal => 256,
            _ => 16,
        }
    }

    /// Bit offset inside the big-endian 16-bit word.
    pub const fn shift(self) -> u32 {
        match self {
            Field::Primary => 8,
            Field::OperandA => 4,
            Field::OperandB | Field::Literal => 0,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Primary => "primary register",
            Field::OperandA => "operand A",
            Field::OperandB => "operand B",
            Field::Literal => "literal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OpcodeDesc {
    pub opcode: Opcode,
    pub mnemonic: &'static str,
    pub class: ArgClass,
}

const fn desc(opcode: Opcode, mnemonic: &'static str, class: ArgClass) -> OpcodeDesc {
    OpcodeDesc { opcode, mnemonic, class }
}

/// Indexed by opcode code.
pub const TABLE: [OpcodeDesc; 16] = [
    desc(Opcode::Add, "add", ArgClass::Ternary),
    desc(Opcode::Sub, "sub", ArgClass::Ternary),
    desc(Opcode::Mul, "mul", ArgClass::Ternary),
    desc(Opcode::Mod, "mod", ArgClass::Ternary),
    desc(Opcode::And, "and", ArgClass::Ternary),
    desc(Opcode::Not, "not", ArgClass::Binary),
    desc(Opcode::Or, "or", ArgClass::Ternary),
    desc(Opcode::Xor, "xor", ArgClass::Ternary),
    desc(Opcode::Sav, "sav", ArgClass::Ternary),
    desc(Opcode::Lod, "lod", ArgClass::Ternary),
    desc(Opcode::Cop, "cop", ArgClass::Binary),
    desc(Opcode::Set, "set", ArgClass::Literal),
    desc(Opcode::Jmp, "jmp", ArgClass::RawPair),
    desc(Opcode::Jif, "jif", ArgClass::Ternary),
    desc(Opcode::Equ, "equ", ArgClass::Ternary),
    desc(Opcode::Grt, "grt", ArgClass::Ternary),
];

const _: () = {
    let mut i = 0;
    while i < TABLE.len() {
        assert!(TABLE[i].opcode as usize == i, "opcode table out of order");
        i += 1;
    }
};

/// Mnemonic missing from [`TABLE`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown opcode `{0}`")]
pub struct UnknownOpcode(pub String);

/// Look up a mnemonic. Matching is exact; `ADD` is not `add`.
pub fn resolve(mnemonic: &str) -> Result<(Opcode, ArgClass), UnknownOpcode> {
    TABLE
        .iter()
        .find(|d| d.mnemonic == mnemonic)
        .map(|d| (d.opcode, d.class))
        .ok_or_else(|| UnknownOpcode(mnemonic.to_string()))
}
