use std::time::Instant;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::infrastructure::{Counts, QuantumBackend};
use crate::quantum::QuantumCircuit;

const DEFAULT_MAX_EXPERIMENTS: usize = 75;
const DEFAULT_MAX_QUBITS: usize = 24;

/// Ideal statevector simulator with shot sampling.
///
/// Executes each circuit exactly, then draws `shots` basis states from the
/// final probability distribution and renders them through the circuit's
/// measurement wiring.
pub struct LocalSimulator {
    seed: Option<u64>,
    max_experiments: usize,
    max_qubits: usize,
}

impl LocalSimulator {
    pub fn new() -> Self {
        Self {
            seed: None,
            max_experiments: DEFAULT_MAX_EXPERIMENTS,
            max_qubits: DEFAULT_MAX_QUBITS,
        }
    }

    /// Fix the sampling seed for reproducible counts.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_experiments(mut self, max_experiments: usize) -> Self {
        self.max_experiments = max_experiments.max(1);
        self
    }

    fn rng_for(&self, circuit_index: usize) -> StdRng {
        match self.seed {
            // Decorrelate circuits within one submission.
            Some(seed) => {
                StdRng::seed_from_u64(seed.wrapping_add((circuit_index as u64).wrapping_mul(0x9e37_79b9)))
            }
            None => StdRng::from_entropy(),
        }
    }

    fn check(&self, circuit: &QuantumCircuit) -> Result<()> {
        if circuit.num_qubits() > self.max_qubits {
            return Err(Error::TooManyQubits {
                requested: circuit.num_qubits(),
                limit: self.max_qubits,
            });
        }
        Ok(())
    }
}

impl Default for LocalSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl QuantumBackend for LocalSimulator {
    fn run(&self, circuits: &[QuantumCircuit], shots: u32) -> Result<Vec<Counts>> {
        if shots == 0 {
            return Err(Error::ZeroShots);
        }
        let start = Instant::now();
        let mut results = Vec::with_capacity(circuits.len());
        for (index, circuit) in circuits.iter().enumerate() {
            self.check(circuit)?;
            let state = circuit.statevector()?;
            let probs = state.probabilities();
            let mut rng = self.rng_for(index);
            let mut counts = Counts::new();
            for _ in 0..shots {
                let outcome = draw_basis_index(&probs, &mut rng);
                let bits = circuit.outcome_bitstring(&state, outcome);
                *counts.entry(bits).or_insert(0) += 1;
            }
            results.push(counts);
        }
        debug!(
            "simulated {} circuits x {} shots in {}",
            circuits.len(),
            shots,
            humantime::format_duration(start.elapsed())
        );
        Ok(results)
    }

    fn max_experiments(&self) -> usize {
        self.max_experiments
    }

    fn name(&self) -> &str {
        "local_statevector"
    }
}

/// Sample one basis index from a probability distribution.
pub(crate) fn draw_basis_index<R: Rng>(probs: &[f64], rng: &mut R) -> usize {
    let r: f64 = rng.gen();
    let mut cumsum = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        cumsum += p;
        if r < cumsum {
            return i;
        }
    }
    probs.len() - 1
}
