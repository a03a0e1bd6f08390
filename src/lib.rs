//! Channel-composable virtual machine for self-modifying Intcode programs.
//!
//! Executes a register-less, memory-addressed integer instruction set: a
//! program is a flat sequence of signed 64-bit words that is simultaneously
//! code and data, addressed through position, immediate and relative modes.
//!
//! # Architecture
//!
//! - **Memory**: an owned, growable `i64` array; writes past the end grow it
//!   zero-filled, reads past the end yield 0
//! - **Execution model**: a run-to-completion loop that suspends only on
//!   channel I/O, intended to be spawned as a task when machines compose
//! - **I/O**: one consumable input source (channel, callback or absent) and
//!   one bounded output channel the machine closes on termination
//! - **Composition**: independent machines wired output-to-input over
//!   bounded channels into series and feedback topologies
//!
//! # Modules
//!
//! - [`errors`]: parse and execution error types
//! - [`io`]: input sources, the output sink contract, and cancellation
//! - [`isa`]: instruction word decoding and the opcode table
//! - [`pipeline`]: multi-machine channel topologies
//! - [`program`]: the program image and text parsing
//! - [`vm`]: the machine and its execution loop

pub mod errors;
pub mod io;
pub mod isa;
pub mod pipeline;
pub mod program;
pub mod vm;
