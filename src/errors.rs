use thiserror::Error;

/// Errors that can occur while parsing or executing a program.
#[derive(Debug, Error)]
pub enum VMError {
    /// Program text failed to decode into an integer sequence.
    #[error("malformed program: {reason}")]
    MalformedProgram { reason: String },
    /// Decoded opcode is not part of the instruction table.
    #[error("invalid operation {opcode} at position {pos}")]
    InvalidOpcode { opcode: i64, pos: i64 },
    /// Addressing-mode digit above the opcode is not a known mode.
    #[error("invalid addressing mode digit {digit}")]
    InvalidMode { digit: i64 },
    /// Instruction pointer left program memory at fetch time.
    #[error("code position out of bounds: {pos} (len={len})")]
    OutOfBoundsFetch { pos: i64, len: usize },
    /// A parameter resolved to an address below zero.
    #[error("parameter {param} resolved to negative address {address}")]
    NegativeAddress { address: i64, param: i64 },
    /// Input instruction reached with no value available.
    #[error("unable to read input: {reason}")]
    InputUnavailable { reason: &'static str },
    /// Output instruction reached with no consumer left.
    #[error("unable to emit output: {reason}")]
    OutputUnavailable { reason: &'static str },
    /// Cancellation observed at an instruction boundary or while blocked on I/O.
    #[error("execution cancelled")]
    Cancelled,
}
