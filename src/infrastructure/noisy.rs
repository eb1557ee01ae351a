use rand::distributions::Bernoulli;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::infrastructure::local::draw_basis_index;
use crate::infrastructure::{Counts, QuantumBackend};
use crate::quantum::QuantumCircuit;

/// Statevector simulator with a symmetric readout bit-flip channel.
///
/// Circuit evolution is ideal; each measured bit is flipped with
/// probability `readout_error` independently per shot. This is the dominant
/// error channel when discriminating superconducting-qubit IQ readout
/// clouds, which is the regime the clustering is evaluated on.
pub struct NoisySimulator {
    readout_error: f64,
    seed: Option<u64>,
    max_experiments: usize,
}

impl NoisySimulator {
    pub fn new(readout_error: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&readout_error) {
            return Err(Error::BadReadoutError(readout_error));
        }
        Ok(Self {
            readout_error,
            seed: None,
            max_experiments: 75,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng_for(&self, circuit_index: usize) -> StdRng {
        match self.seed {
            Some(seed) => {
                StdRng::seed_from_u64(seed.wrapping_add((circuit_index as u64).wrapping_mul(0x9e37_79b9)))
            }
            None => StdRng::from_entropy(),
        }
    }
}

impl QuantumBackend for NoisySimulator {
    fn run(&self, circuits: &[QuantumCircuit], shots: u32) -> Result<Vec<Counts>> {
        if shots == 0 {
            return Err(Error::ZeroShots);
        }
        let flip = Bernoulli::new(self.readout_error).expect("probability validated in new");
        let mut results = Vec::with_capacity(circuits.len());
        for (index, circuit) in circuits.iter().enumerate() {
            let state = circuit.statevector()?;
            let probs = state.probabilities();
            let mut rng = self.rng_for(index);
            let mut counts = Counts::new();
            for _ in 0..shots {
                let outcome = draw_basis_index(&probs, &mut rng);
                let num_clbits = circuit.num_clbits();
                let mut bits = vec![b'0'; num_clbits];
                for &(qubit, clbit) in circuit.measurements() {
                    let mut value = state.qubit_bit(outcome, qubit);
                    if rng.sample(flip) {
                        value ^= 1;
                    }
                    if value == 1 {
                        bits[num_clbits - 1 - clbit] = b'1';
                    }
                }
                let key = String::from_utf8(bits).expect("ascii bitstring");
                *counts.entry(key).or_insert(0) += 1;
            }
            results.push(counts);
        }
        Ok(results)
    }

    fn max_experiments(&self) -> usize {
        self.max_experiments
    }

    fn name(&self) -> &str {
        "noisy_statevector"
    }
}
