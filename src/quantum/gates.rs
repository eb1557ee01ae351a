//! Gate set for the swap-test circuits and its statevector application.

use super::{Complex, StateVector};
use crate::error::{Error, Result};

const NORM_TOLERANCE: f64 = 1e-6;

/// Operations the distance circuits are built from.
///
/// `Initialize` is product-state preparation: it loads a normalized real
/// amplitude vector into a sub-register that must still be in |0...0>,
/// which is how amplitude encoding enters the circuit. The first listed
/// qubit carries the least significant bit of the amplitude index.
#[derive(Debug, Clone)]
pub enum Gate {
    H {
        qubit: usize,
    },
    X {
        qubit: usize,
    },
    U3 {
        qubit: usize,
        theta: f64,
        phi: f64,
        lambda: f64,
    },
    CSwap {
        control: usize,
        target1: usize,
        target2: usize,
    },
    Initialize {
        qubits: Vec<usize>,
        amplitudes: Vec<f64>,
    },
}

impl Gate {
    /// Every qubit index this operation touches.
    pub fn qubits(&self) -> Vec<usize> {
        match self {
            Gate::H { qubit } | Gate::X { qubit } | Gate::U3 { qubit, .. } => vec![*qubit],
            Gate::CSwap {
                control,
                target1,
                target2,
            } => vec![*control, *target1, *target2],
            Gate::Initialize { qubits, .. } => qubits.clone(),
        }
    }

    /// Apply the operation to `state` in place.
    pub fn apply(&self, state: &mut StateVector) -> Result<()> {
        match self {
            Gate::H { qubit } => {
                let inv_sqrt2 = std::f64::consts::FRAC_1_SQRT_2;
                apply_single_qubit(state, *qubit, |a, b| {
                    ((a + b) * inv_sqrt2, (a - b) * inv_sqrt2)
                });
                Ok(())
            }
            Gate::X { qubit } => {
                apply_single_qubit(state, *qubit, |a, b| (b, a));
                Ok(())
            }
            Gate::U3 {
                qubit,
                theta,
                phi,
                lambda,
            } => {
                // U3(θ, φ, λ) = [[cos(θ/2), -e^{iλ} sin(θ/2)],
                //               [e^{iφ} sin(θ/2), e^{i(φ+λ)} cos(θ/2)]]
                let cos_half = (theta / 2.0).cos();
                let sin_half = (theta / 2.0).sin();
                let exp_phi = Complex::from_polar(1.0, *phi);
                let exp_lambda = Complex::from_polar(1.0, *lambda);
                let exp_sum = Complex::from_polar(1.0, phi + lambda);
                apply_single_qubit(state, *qubit, |a, b| {
                    (
                        a * cos_half - exp_lambda * b * sin_half,
                        exp_phi * a * sin_half + exp_sum * b * cos_half,
                    )
                });
                Ok(())
            }
            Gate::CSwap {
                control,
                target1,
                target2,
            } => {
                apply_cswap(state, *control, *target1, *target2);
                Ok(())
            }
            Gate::Initialize { qubits, amplitudes } => {
                apply_initialize(state, qubits, amplitudes)
            }
        }
    }
}

fn apply_single_qubit<F>(state: &mut StateVector, qubit: usize, transform: F)
where
    F: Fn(Complex, Complex) -> (Complex, Complex),
{
    let n = state.num_qubits;
    let dim = 1 << n;
    let mask = 1 << (n - 1 - qubit);

    for i in 0..dim {
        if i & mask == 0 {
            let j = i | mask;
            let (new_i, new_j) = transform(state.amplitudes[i], state.amplitudes[j]);
            state.amplitudes[i] = new_i;
            state.amplitudes[j] = new_j;
        }
    }
}

fn apply_cswap(state: &mut StateVector, control: usize, target1: usize, target2: usize) {
    let n = state.num_qubits;
    let dim = 1 << n;
    let control_mask = 1 << (n - 1 - control);
    let t1_mask = 1 << (n - 1 - target1);
    let t2_mask = 1 << (n - 1 - target2);

    for i in 0..dim {
        if i & control_mask != 0 {
            let bit1 = (i & t1_mask) != 0;
            let bit2 = (i & t2_mask) != 0;
            if bit1 != bit2 {
                let j = i ^ t1_mask ^ t2_mask;
                if i < j {
                    state.amplitudes.swap(i, j);
                }
            }
        }
    }
}

fn apply_initialize(state: &mut StateVector, qubits: &[usize], amplitudes: &[f64]) -> Result<()> {
    let n = state.num_qubits;
    let expected = 1usize << qubits.len();
    if amplitudes.len() != expected {
        return Err(Error::AmplitudeCount {
            qubits: qubits.len(),
            expected,
            found: amplitudes.len(),
        });
    }
    let norm: f64 = amplitudes.iter().map(|a| a * a).sum();
    if (norm - 1.0).abs() > NORM_TOLERANCE {
        return Err(Error::UnnormalizedAmplitudes { norm: norm.sqrt() });
    }

    let target_mask: usize = qubits.iter().map(|&q| 1usize << (n - 1 - q)).sum();
    for (i, amp) in state.amplitudes.iter().enumerate() {
        if i & target_mask != 0 && amp.norm_sq() > NORM_TOLERANCE * NORM_TOLERANCE {
            return Err(Error::PreparationTargetNotZero);
        }
    }

    // The register is a tensor factor while its qubits read |0>, so the
    // preparation distributes every surviving amplitude over the encoded
    // patterns.
    let dim = state.dim();
    let mut prepared = vec![Complex::ZERO; dim];
    for i in 0..dim {
        if i & target_mask != 0 {
            continue;
        }
        let base = state.amplitudes[i];
        if base.norm_sq() == 0.0 {
            continue;
        }
        for (pattern, &a) in amplitudes.iter().enumerate() {
            if a == 0.0 {
                continue;
            }
            let mut j = i;
            for (k, &q) in qubits.iter().enumerate() {
                if (pattern >> k) & 1 == 1 {
                    j |= 1 << (n - 1 - q);
                }
            }
            prepared[j] = prepared[j] + base * a;
        }
    }
    state.amplitudes = prepared;
    Ok(())
}
