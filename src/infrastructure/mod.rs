use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::quantum::QuantumCircuit;

/// Measurement outcomes of one circuit: classical bitstring -> occurrences.
pub type Counts = HashMap<String, u64>;

/// Execution backends supported out of the box
/// - Local: ideal statevector simulation with shot sampling.
/// - Noisy: statevector simulation with a symmetric readout bit-flip
///   channel, approximating superconducting-qubit readout
///   misclassification.
///
/// Cloud quantum devices are external collaborators: implement
/// [`QuantumBackend`] on a client for the device's job API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Noisy,
}

impl BackendKind {
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(BackendKind::Local),
            "noisy" => Ok(BackendKind::Noisy),
            other => Err(Error::UnknownBackendKind(other.to_string())),
        }
    }
}

/// Trait for circuit executors.
///
/// `run` executes each circuit for `shots` repetitions and returns one
/// [`Counts`] map per circuit. `max_experiments` is the number of circuits
/// the backend accepts in a single submission; callers batch accordingly.
pub trait QuantumBackend {
    fn run(&self, circuits: &[QuantumCircuit], shots: u32) -> Result<Vec<Counts>>;

    fn max_experiments(&self) -> usize;

    fn name(&self) -> &str;
}

pub mod local;
pub mod noisy;
pub use local::LocalSimulator;
pub use noisy::NoisySimulator;
