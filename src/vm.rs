//! Core machine implementation.
//!
//! A [`Machine`] owns one growable memory image, an instruction pointer and a
//! relative-base register, and runs to completion inside a single async call.
//! The only suspension points are the Input and Output instructions, both of
//! which block on bounded channels and are raced against the cancellation
//! token. Multiple machines composed over channels therefore interleave under
//! the runtime without any shared state beyond the channels themselves.

use crate::errors::VMError;
use crate::io::{CancelToken, Input};
use crate::isa::{Instruction, Mode, OpCode};
use crate::program::Program;
use tokio::sync::mpsc;
use tracing::trace;

/// Buffer for the collect driver's output channel; outputs are drained
/// concurrently, so this only absorbs bursts.
const COLLECT_OUTPUT_BUFFER: usize = 64;

/// Execution configuration for one [`Machine::run`] call.
pub struct MachineOps {
    /// Source queried on each Input instruction.
    pub input: Input,
    /// Sink for Output instructions. The machine consumes the sender and
    /// drops it when execution terminates, closing the stream exactly once.
    pub output: Option<mpsc::Sender<i64>>,
    /// Observed before every instruction fetch and while blocked on I/O.
    pub cancel: Option<CancelToken>,
    /// Emit a `tracing` event per executed instruction.
    pub trace: bool,
}

impl Default for MachineOps {
    fn default() -> Self {
        Self {
            input: Input::Absent,
            output: None,
            cancel: None,
            trace: false,
        }
    }
}

/// One Intcode machine instance.
///
/// Construction copies the program image, so the source [`Program`] is never
/// mutated and can seed any number of machines.
pub struct Machine {
    memory: Vec<i64>,
    pos: i64,
    relative_base: i64,
}

impl Machine {
    /// Creates a machine positioned at the start of its own copy of `program`.
    pub fn new(program: &Program) -> Self {
        Self {
            memory: program.memory().to_vec(),
            pos: 0,
            relative_base: 0,
        }
    }

    /// Executes until the halt instruction, returning final memory.
    ///
    /// Fails fast on the first fault; there are no retries. Whatever the
    /// outcome, the output sender is dropped before this returns, so a
    /// consumer blocked on the channel always observes end-of-stream.
    pub async fn run(mut self, ops: MachineOps) -> Result<Vec<i64>, VMError> {
        let MachineOps {
            mut input,
            output,
            mut cancel,
            trace,
        } = ops;

        self.exec(&mut input, output.as_ref(), &mut cancel, trace)
            .await?;
        Ok(self.memory)
    }

    async fn exec(
        &mut self,
        input: &mut Input,
        output: Option<&mpsc::Sender<i64>>,
        cancel: &mut Option<CancelToken>,
        trace: bool,
    ) -> Result<(), VMError> {
        loop {
            // Fetch never grows memory; a pointer outside the current image
            // is fatal.
            if self.pos < 0 || self.pos >= self.memory.len() as i64 {
                return Err(VMError::OutOfBoundsFetch {
                    pos: self.pos,
                    len: self.memory.len(),
                });
            }

            if let Some(token) = cancel.as_ref() {
                if token.is_cancelled() {
                    return Err(VMError::Cancelled);
                }
            }

            let word = self.memory[self.pos as usize];
            let instr = Instruction::decode(word)?;
            let op = OpCode::try_from(instr.opcode).map_err(|_| VMError::InvalidOpcode {
                opcode: instr.opcode,
                pos: self.pos,
            })?;

            if trace {
                trace!(pos = self.pos, word, op = op.mnemonic(), "executing instruction");
            }

            match op {
                OpCode::Add => {
                    let v = self.value(&instr, 1)?.wrapping_add(self.value(&instr, 2)?);
                    self.store(&instr, 3, v)?;
                    self.pos += 4;
                }
                OpCode::Multiply => {
                    let v = self.value(&instr, 1)?.wrapping_mul(self.value(&instr, 2)?);
                    self.store(&instr, 3, v)?;
                    self.pos += 4;
                }
                OpCode::Input => {
                    let v = next_input(input, cancel).await?;
                    self.store(&instr, 1, v)?;
                    self.pos += 2;
                }
                OpCode::Output => {
                    let v = self.value(&instr, 1)?;
                    emit(output, cancel, v).await?;
                    self.pos += 2;
                }
                OpCode::JumpIfTrue => {
                    if self.value(&instr, 1)? != 0 {
                        self.pos = self.value(&instr, 2)?;
                    } else {
                        self.pos += 3;
                    }
                }
                OpCode::JumpIfFalse => {
                    if self.value(&instr, 1)? == 0 {
                        self.pos = self.value(&instr, 2)?;
                    } else {
                        self.pos += 3;
                    }
                }
                OpCode::LessThan => {
                    let v = (self.value(&instr, 1)? < self.value(&instr, 2)?) as i64;
                    self.store(&instr, 3, v)?;
                    self.pos += 4;
                }
                OpCode::Equals => {
                    let v = (self.value(&instr, 1)? == self.value(&instr, 2)?) as i64;
                    self.store(&instr, 3, v)?;
                    self.pos += 4;
                }
                OpCode::AdjustRelativeBase => {
                    let v = self.value(&instr, 1)?;
                    self.relative_base = self.relative_base.wrapping_add(v);
                    self.pos += 2;
                }
                OpCode::Exit => return Ok(()),
            }
        }
    }

    /// Reads memory at `addr`; addresses past the current length read as 0
    /// and never grow memory. Callers guarantee `addr >= 0`.
    fn load(&self, addr: i64) -> i64 {
        self.memory.get(addr as usize).copied().unwrap_or(0)
    }

    /// Computes the address the 1-based parameter `param` refers to.
    ///
    /// Immediate parameters have no address on the read path, so the slot
    /// `pos + param` itself is returned; as a write target the parameter word
    /// is used directly as the address (nominally legal, never emitted by the
    /// real instruction table).
    fn resolve(&self, instr: &Instruction, param: i64, write: bool) -> Result<i64, VMError> {
        let word = self.load(self.pos + param);

        let addr = match instr.mode(param) {
            Mode::Position => word,
            Mode::Immediate => {
                if write {
                    word
                } else {
                    self.pos + param
                }
            }
            Mode::Relative => word.wrapping_add(self.relative_base),
        };

        if addr < 0 {
            return Err(VMError::NegativeAddress {
                address: addr,
                param,
            });
        }
        Ok(addr)
    }

    /// Resolves parameter `param` for reading and returns the addressed value.
    fn value(&self, instr: &Instruction, param: i64) -> Result<i64, VMError> {
        Ok(self.load(self.resolve(instr, param, false)?))
    }

    /// Resolves parameter `param` as a write target and stores `value`,
    /// growing memory (zero-filled) to exactly accommodate the address.
    fn store(&mut self, instr: &Instruction, param: i64, value: i64) -> Result<(), VMError> {
        let addr = self.resolve(instr, param, true)? as usize;
        if addr >= self.memory.len() {
            self.memory.resize(addr + 1, 0);
        }
        self.memory[addr] = value;
        Ok(())
    }
}

async fn next_input(input: &mut Input, cancel: &mut Option<CancelToken>) -> Result<i64, VMError> {
    match cancel {
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(VMError::Cancelled),
            v = input.next() => v,
        },
        None => input.next().await,
    }
}

async fn emit(
    output: Option<&mpsc::Sender<i64>>,
    cancel: &mut Option<CancelToken>,
    value: i64,
) -> Result<(), VMError> {
    let Some(tx) = output else {
        return Err(VMError::OutputUnavailable {
            reason: "no output sink wired",
        });
    };

    let closed = |_| VMError::OutputUnavailable {
        reason: "output channel closed",
    };
    match cancel {
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(VMError::Cancelled),
            sent = tx.send(value) => sent.map_err(closed),
        },
        None => tx.send(value).await.map_err(closed),
    }
}

/// Final state of a run driven by [`execute_collect`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    /// Every value the program emitted, in program order.
    pub outputs: Vec<i64>,
    /// Memory contents at the halt instruction.
    pub memory: Vec<i64>,
}

/// Runs `program` on a spawned task, feeding `inputs` in order and draining
/// every output until the machine closes its sink.
///
/// This is the driver for non-interactive runs; machines that need a live
/// counterpart (pipelines, feedback loops, world simulations) are wired
/// through [`MachineOps`] directly.
pub async fn execute_collect(program: &Program, inputs: &[i64]) -> Result<Completion, VMError> {
    let (in_tx, in_rx) = mpsc::channel(inputs.len().max(1));
    let (out_tx, mut out_rx) = mpsc::channel(COLLECT_OUTPUT_BUFFER);

    let handle = tokio::spawn(Machine::new(program).run(MachineOps {
        input: Input::Channel(in_rx),
        output: Some(out_tx),
        ..MachineOps::default()
    }));

    for &v in inputs {
        // The machine may halt without consuming every queued value.
        if in_tx.send(v).await.is_err() {
            break;
        }
    }
    drop(in_tx);

    let mut outputs = Vec::new();
    while let Some(v) = out_rx.recv().await {
        outputs.push(v);
    }

    let memory = match handle.await {
        Ok(result) => result?,
        // The machine task is never aborted, so a join failure is a panic.
        Err(e) => std::panic::resume_unwind(e.into_panic()),
    };

    Ok(Completion { outputs, memory })
}
