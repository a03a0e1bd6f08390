//! Multi-machine channel topologies.
//!
//! Machines compose by wiring one instance's output channel to the next
//! instance's input channel, each running on its own spawned task. A
//! [`Chain`] covers the series case and, because the head sender stays with
//! the caller, the feedback case: loop the tail receiver's values back into
//! the head until the tail closes. Buffers are caller-sized; feedback loops
//! need at least 2 slots per stage so the final re-send cannot deadlock
//! against a machine that already halted.

use crate::errors::VMError;
use crate::io::Input;
use crate::program::Program;
use crate::vm::{Machine, MachineOps};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A series of machines wired output-to-input over bounded channels.
pub struct Chain {
    /// Feeds the first machine.
    pub input: mpsc::Sender<i64>,
    /// Emits the last machine's outputs; closes once that machine halts.
    pub output: mpsc::Receiver<i64>,
    handles: Vec<JoinHandle<Result<Vec<i64>, VMError>>>,
}

/// Spawns one copy of `program` per seed list, wired in series.
///
/// Each stage's input channel is primed with its seed values before the
/// machines start, so stage-specific configuration (phase settings and the
/// like) is consumed ahead of anything flowing through the chain. Channel
/// capacity is `buffer`, raised per stage if its seed list is longer.
///
/// Must be called from within a tokio runtime.
pub fn chain(program: &Program, seeds: &[Vec<i64>], buffer: usize) -> Chain {
    assert!(!seeds.is_empty(), "a chain needs at least one machine");

    let mut handles = Vec::with_capacity(seeds.len());
    let (head_tx, mut rx) = seeded_channel(&seeds[0], buffer);
    for seed in &seeds[1..] {
        let (tx, next_rx) = seeded_channel(seed, buffer);
        handles.push(spawn_stage(program, rx, tx));
        rx = next_rx;
    }

    let (tail_tx, tail_rx) = mpsc::channel(buffer.max(1));
    handles.push(spawn_stage(program, rx, tail_tx));

    Chain {
        input: head_tx,
        output: tail_rx,
        handles,
    }
}

fn seeded_channel(seed: &[i64], buffer: usize) -> (mpsc::Sender<i64>, mpsc::Receiver<i64>) {
    let (tx, rx) = mpsc::channel(buffer.max(seed.len()).max(1));
    for &v in seed {
        tx.try_send(v).expect("seed exceeds channel capacity");
    }
    (tx, rx)
}

fn spawn_stage(
    program: &Program,
    input: mpsc::Receiver<i64>,
    output: mpsc::Sender<i64>,
) -> JoinHandle<Result<Vec<i64>, VMError>> {
    tokio::spawn(Machine::new(program).run(MachineOps {
        input: Input::Channel(input),
        output: Some(output),
        ..MachineOps::default()
    }))
}

impl Chain {
    /// Waits for every machine to halt, returning final memories in stage
    /// order or the first failure.
    ///
    /// The caller's ends of the head and tail channels are closed first, so
    /// a machine still blocked on chain I/O observes disconnection instead
    /// of waiting forever.
    pub async fn join(self) -> Result<Vec<Vec<i64>>, VMError> {
        let Chain {
            input,
            output,
            handles,
        } = self;
        drop(input);
        drop(output);

        let mut memories = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(result) => memories.push(result?),
                // Machine tasks are never aborted, so a join failure is a panic.
                Err(e) => std::panic::resume_unwind(e.into_panic()),
            }
        }
        Ok(memories)
    }
}
