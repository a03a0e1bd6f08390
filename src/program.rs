//! Program representation and text parsing.
//!
//! A [`Program`] is the machine's memory at time zero. Executing it never
//! mutates it; every [`Machine`](crate::vm::Machine) works on its own copy,
//! so one parsed program can seed any number of concurrent runs.

use crate::errors::VMError;
use std::str::FromStr;

/// An Intcode program: the memory image a machine starts from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    memory: Vec<i64>,
}

impl Program {
    /// Creates a program from an already-decoded integer sequence.
    pub fn new(memory: Vec<i64>) -> Self {
        Self { memory }
    }

    /// Parses the comma-separated decimal text form.
    ///
    /// Surrounding whitespace is tolerated on the whole input and on each
    /// element. Empty input and non-integer elements yield
    /// [`VMError::MalformedProgram`].
    pub fn parse(source: &str) -> Result<Self, VMError> {
        source
            .trim()
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<i64>()
                    .map_err(|e| VMError::MalformedProgram {
                        reason: format!("invalid integer {part:?}: {e}"),
                    })
            })
            .collect::<Result<Vec<i64>, VMError>>()
            .map(Self::new)
    }

    /// Returns the initial memory image.
    pub fn memory(&self) -> &[i64] {
        &self.memory
    }

    /// Number of memory words in the image.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }
}

impl FromStr for Program {
    type Err = VMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Vec<i64>> for Program {
    fn from(memory: Vec<i64>) -> Self {
        Self::new(memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_program() {
        let program = Program::parse("1,0,0,0,99").unwrap();
        assert_eq!(program.memory(), &[1, 0, 0, 0, 99]);
        assert_eq!(program.len(), 5);
        assert!(!program.is_empty());
    }

    #[test]
    fn parse_negative_values() {
        let program = Program::parse("109,-1,104,-42,99").unwrap();
        assert_eq!(program.memory(), &[109, -1, 104, -42, 99]);
    }

    #[test]
    fn parse_tolerates_whitespace() {
        let program = Program::parse("  1, 2 ,3\n").unwrap();
        assert_eq!(program.memory(), &[1, 2, 3]);
    }

    #[test]
    fn parse_large_literals() {
        let program = Program::parse("104,1125899906842624,99").unwrap();
        assert_eq!(program.memory(), &[104, 1125899906842624, 99]);
    }

    #[test]
    fn parse_rejects_empty_input() {
        assert!(matches!(
            Program::parse("").unwrap_err(),
            VMError::MalformedProgram { .. }
        ));
    }

    #[test]
    fn parse_rejects_non_integer_elements() {
        assert!(matches!(
            Program::parse("1,x,3").unwrap_err(),
            VMError::MalformedProgram { .. }
        ));
        assert!(matches!(
            Program::parse("1,,3").unwrap_err(),
            VMError::MalformedProgram { .. }
        ));
    }

    #[test]
    fn from_str_round_trip() {
        let program: Program = "2,3,0,3,99".parse().unwrap();
        assert_eq!(program.memory(), &[2, 3, 0, 3, 99]);
    }
}
