//! Data preprocessing and swap-test circuit construction.
//!
//! Two encodings map a pair of feature vectors onto qubit registers:
//!
//! - `angle`: the first two features form a complex point whose phase
//!   angle drives a U3 rotation on one qubit per vector. With norm
//!   relevance a third feature adds a magnitude rotation.
//! - `probability`: the L2-normalized vector is amplitude-encoded into
//!   ceil(log2 d) qubits per register.
//!
//! In both cases an ancilla-controlled swap between the registers followed
//! by a second Hadamard turns register overlap into the ancilla's
//! excited-state probability: P(1) = (1 - |<x|y>|^2) / 2. That probability
//! is the distance the clustering consumes.

use std::f64::consts::PI;

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::infrastructure::Counts;
use crate::quantum::QuantumCircuit;

const EPS: f64 = 1e-12;

/// Data-to-qubit encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapType {
    Angle,
    #[default]
    Probability,
}

impl MapType {
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "angle" => Ok(MapType::Angle),
            "probability" => Ok(MapType::Probability),
            other => Err(Error::UnknownMapType(other.to_string())),
        }
    }
}

/// Preprocess raw points for the chosen encoding.
///
/// Angle encoding standardizes each feature column (zero mean, unit
/// variance); with `norm_relevance` on two-dimensional data a third column
/// of row norms scaled by the maximum norm is appended so magnitude
/// survives the phase mapping. Probability encoding L2-normalizes each
/// row.
pub fn preprocess(points: &Array2<f64>, map_type: MapType, norm_relevance: bool) -> Array2<f64> {
    match map_type {
        MapType::Angle => {
            let mut scaled = points.clone();
            for mut column in scaled.axis_iter_mut(Axis(1)) {
                let n = column.len() as f64;
                let mean = column.sum() / n;
                let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                if std > EPS {
                    column.mapv_inplace(|v| (v - mean) / std);
                } else {
                    column.mapv_inplace(|v| v - mean);
                }
            }
            if norm_relevance && scaled.ncols() == 2 {
                let norms: Vec<f64> = scaled
                    .axis_iter(Axis(0))
                    .map(|row| (row[0] * row[0] + row[1] * row[1]).sqrt())
                    .collect();
                let max_norm = norms.iter().cloned().fold(0.0_f64, f64::max);
                let mut with_norms = Array2::zeros((scaled.nrows(), 3));
                for (i, row) in scaled.axis_iter(Axis(0)).enumerate() {
                    with_norms[[i, 0]] = row[0];
                    with_norms[[i, 1]] = row[1];
                    with_norms[[i, 2]] = if max_norm > EPS {
                        norms[i] / max_norm
                    } else {
                        0.0
                    };
                }
                return with_norms;
            }
            scaled
        }
        MapType::Probability => {
            let mut normalized = points.clone();
            for mut row in normalized.axis_iter_mut(Axis(0)) {
                let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm > EPS {
                    row.mapv_inplace(|v| v / norm);
                }
            }
            normalized
        }
    }
}

/// Build the swap-test circuit estimating the distance between `x` and `y`.
pub fn swap_test_circuit(
    x: ArrayView1<f64>,
    y: ArrayView1<f64>,
    map_type: MapType,
    norm_relevance: bool,
) -> Result<QuantumCircuit> {
    if x.len() != y.len() {
        return Err(Error::FeatureMismatch {
            points: x.len(),
            centers: y.len(),
        });
    }
    match map_type {
        MapType::Angle => angle_swap_test(x, y, norm_relevance),
        MapType::Probability => probability_swap_test(x, y),
    }
}

fn angle_swap_test(
    x: ArrayView1<f64>,
    y: ArrayView1<f64>,
    norm_relevance: bool,
) -> Result<QuantumCircuit> {
    if x.len() < 2 {
        return Err(Error::TooFewFeatures(x.len()));
    }
    let theta_x = x[1].atan2(x[0]);
    let theta_y = y[1].atan2(y[0]);

    let mut qc = QuantumCircuit::new(3, 3, "swap_test");
    qc.h(0)?;
    qc.h(1)?;
    qc.h(2)?;
    qc.u3(theta_x, PI, PI, 1)?;
    if norm_relevance && x.len() >= 3 {
        qc.u3(x[2] * PI / 2.0, 0.0, 0.0, 1)?;
    }
    qc.u3(theta_y, PI, PI, 2)?;
    if norm_relevance && y.len() >= 3 {
        qc.u3(y[2] * PI / 2.0, 0.0, 0.0, 2)?;
    }
    qc.cswap(0, 1, 2)?;
    qc.h(0)?;
    qc.measure(0, 0)?;
    Ok(qc)
}

fn probability_swap_test(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Result<QuantumCircuit> {
    let register_qubits = register_width(x.len());
    let padded = 1usize << register_qubits;

    let amp_x = padded_unit_vector(x, padded)?;
    let amp_y = padded_unit_vector(y, padded)?;

    let total = 2 * register_qubits + 1;
    let mut qc = QuantumCircuit::new(total, total, "swap_test");
    qc.initialize(amp_x, (1..=register_qubits).collect())?;
    qc.initialize(amp_y, (register_qubits + 1..=2 * register_qubits).collect())?;
    qc.h(0)?;
    qc.cswap(0, 1, register_qubits + 1)?;
    qc.h(0)?;
    qc.measure(0, 0)?;
    Ok(qc)
}

/// Qubits needed to amplitude-encode a vector of `features` entries.
pub fn register_width(features: usize) -> usize {
    let mut qubits = 1;
    while (1usize << qubits) < features {
        qubits += 1;
    }
    qubits
}

fn padded_unit_vector(v: ArrayView1<f64>, padded: usize) -> Result<Vec<f64>> {
    let mut amplitudes = vec![0.0; padded];
    for (i, &value) in v.iter().enumerate() {
        amplitudes[i] = value;
    }
    let norm = amplitudes.iter().map(|a| a * a).sum::<f64>().sqrt();
    if norm < EPS {
        return Err(Error::ZeroVector);
    }
    for a in &mut amplitudes {
        *a /= norm;
    }
    Ok(amplitudes)
}

/// Estimated distance from a swap-test counts map: the fraction of shots
/// where the ancilla (classical bit 0) read 1. A missing key means the
/// ancilla never left the ground state.
pub fn distance_from_counts(counts: &Counts, shots: u32) -> f64 {
    let ones: u64 = counts
        .iter()
        .filter(|(key, _)| key.ends_with('1'))
        .map(|(_, &count)| count)
        .sum();
    ones as f64 / shots as f64
}
