//! Machine I/O endpoints and cooperative cancellation.
//!
//! A machine consumes integers from an [`Input`] and emits integers to a
//! bounded `mpsc` sender it owns for the duration of the run; dropping the
//! sender on the way out is what closes the stream for downstream consumers.
//! Cancellation is a linked pair: the driver keeps the [`Canceller`], the
//! machine polls the [`CancelToken`] at every instruction boundary and races
//! it against blocking channel operations.

use crate::errors::VMError;
use std::future::pending;
use tokio::sync::{mpsc, watch};

/// Input endpoint polled once per Input instruction.
pub enum Input {
    /// Values arrive over a bounded channel; the machine suspends until one
    /// is ready. A closed channel reads as exhausted input.
    Channel(mpsc::Receiver<i64>),
    /// Synchronous callback invoked once per Input instruction; `None`
    /// aborts execution as exhausted input.
    Callback(Box<dyn FnMut() -> Option<i64> + Send>),
    /// Nothing wired. Only an error if an Input instruction is actually
    /// reached.
    Absent,
}

impl Input {
    /// Wraps a callback without the caller spelling out the boxing.
    pub fn callback<F>(f: F) -> Self
    where
        F: FnMut() -> Option<i64> + Send + 'static,
    {
        Input::Callback(Box::new(f))
    }

    /// Fetches the next input value, suspending on channel sources.
    pub(crate) async fn next(&mut self) -> Result<i64, VMError> {
        match self {
            Input::Channel(rx) => rx.recv().await.ok_or(VMError::InputUnavailable {
                reason: "input channel closed",
            }),
            Input::Callback(f) => f().ok_or(VMError::InputUnavailable {
                reason: "input callback exhausted",
            }),
            Input::Absent => Err(VMError::InputUnavailable {
                reason: "no input source wired",
            }),
        }
    }
}

impl From<mpsc::Receiver<i64>> for Input {
    fn from(rx: mpsc::Receiver<i64>) -> Self {
        Input::Channel(rx)
    }
}

/// Creates a linked cancellation pair.
///
/// The [`Canceller`] side belongs to the driver; the [`CancelToken`] is
/// handed to a machine (clones may be handed to several).
pub fn cancellation() -> (Canceller, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (Canceller { tx }, CancelToken { rx })
}

/// Driver-side handle that fires the cancellation.
pub struct Canceller {
    tx: watch::Sender<bool>,
}

impl Canceller {
    /// Signals every linked token. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Machine-side cancellation observer.
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Returns whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is signalled.
    ///
    /// If every [`Canceller`] is dropped without firing, the future stays
    /// pending: no cancellation can arrive anymore.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                pending::<()>().await;
            }
        }
    }
}
