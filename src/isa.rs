//! Instruction word decoding.
//!
//! An instruction word packs an opcode into its two lowest decimal digits and
//! one addressing-mode digit per parameter into the digits above, least
//! significant first. Decoding is a pure function of the word; the mapping
//! from opcode to behavior lives in the execution loop.

use crate::errors::VMError;

/// Addressing mode applied to a single instruction parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// The parameter word is a memory address holding the operand.
    Position,
    /// The parameter word is the operand itself.
    Immediate,
    /// The parameter word plus the relative base is the operand's address.
    Relative,
}

impl TryFrom<i64> for Mode {
    type Error = VMError;

    fn try_from(digit: i64) -> Result<Self, Self::Error> {
        match digit {
            0 => Ok(Self::Position),
            1 => Ok(Self::Immediate),
            2 => Ok(Self::Relative),
            _ => Err(VMError::InvalidMode { digit }),
        }
    }
}

/// The supported instruction table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpCode {
    /// ADD p1, p2, p3 ; mem[p3] = val(p1) + val(p2)
    Add = 1,
    /// MUL p1, p2, p3 ; mem[p3] = val(p1) * val(p2)
    Multiply = 2,
    /// IN p1 ; mem[p1] = next input value
    Input = 3,
    /// OUT p1 ; emit val(p1)
    Output = 4,
    /// JNZ p1, p2 ; if val(p1) != 0 then pos = val(p2)
    JumpIfTrue = 5,
    /// JZ p1, p2 ; if val(p1) == 0 then pos = val(p2)
    JumpIfFalse = 6,
    /// LT p1, p2, p3 ; mem[p3] = 1 if val(p1) < val(p2) else 0
    LessThan = 7,
    /// EQ p1, p2, p3 ; mem[p3] = 1 if val(p1) == val(p2) else 0
    Equals = 8,
    /// ARB p1 ; relative base += val(p1)
    AdjustRelativeBase = 9,
    /// HALT ; stop execution, keep memory
    Exit = 99,
}

impl OpCode {
    /// Returns the mnemonic used in traces and error messages.
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::Add => "ADD",
            OpCode::Multiply => "MUL",
            OpCode::Input => "IN",
            OpCode::Output => "OUT",
            OpCode::JumpIfTrue => "JNZ",
            OpCode::JumpIfFalse => "JZ",
            OpCode::LessThan => "LT",
            OpCode::Equals => "EQ",
            OpCode::AdjustRelativeBase => "ARB",
            OpCode::Exit => "HALT",
        }
    }
}

impl TryFrom<i64> for OpCode {
    type Error = VMError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Add),
            2 => Ok(Self::Multiply),
            3 => Ok(Self::Input),
            4 => Ok(Self::Output),
            5 => Ok(Self::JumpIfTrue),
            6 => Ok(Self::JumpIfFalse),
            7 => Ok(Self::LessThan),
            8 => Ok(Self::Equals),
            9 => Ok(Self::AdjustRelativeBase),
            99 => Ok(Self::Exit),
            _ => Err(VMError::InvalidOpcode {
                opcode: value,
                pos: 0,
            }),
        }
    }
}

/// A decoded instruction word: raw opcode plus per-parameter mode digits.
///
/// The opcode is kept raw so decoding stays total over every word whose mode
/// digits are valid; unknown opcodes are rejected at dispatch, where the
/// instruction position is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// The word modulo 100.
    pub opcode: i64,
    modes: Vec<Mode>,
}

impl Instruction {
    /// Decodes a raw memory word.
    ///
    /// Extracts successive base-100 digits above the opcode until the word is
    /// exhausted; each digit is the mode of the next parameter, parameter 1
    /// first. Returns [`VMError::InvalidMode`] for digits outside the mode
    /// table.
    pub fn decode(word: i64) -> Result<Self, VMError> {
        let opcode = word % 100;

        let mut modes = Vec::new();
        let mut factor = 100i64;
        while word >= factor {
            modes.push(Mode::try_from(word / factor % 10)?);
            factor = match factor.checked_mul(10) {
                Some(f) => f,
                None => break,
            };
        }

        Ok(Self { opcode, modes })
    }

    /// Returns the mode of the 1-based parameter `param`.
    ///
    /// Parameters beyond the decoded digits default to [`Mode::Position`].
    pub fn mode(&self, param: i64) -> Mode {
        self.modes
            .get(param as usize - 1)
            .copied()
            .unwrap_or(Mode::Position)
    }
}
