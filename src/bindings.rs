//! Python surface for notebook-driven experiments.

use ndarray::Array2;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use crate::algorithms::{MapType, QuantumKMeans, QuantumKMeansConfig};
use crate::infrastructure::{BackendKind, LocalSimulator, NoisySimulator, QuantumBackend};

fn to_matrix(points: Vec<Vec<f64>>) -> PyResult<Array2<f64>> {
    let rows = points.len();
    let cols = points.first().map(Vec::len).unwrap_or(0);
    if points.iter().any(|row| row.len() != cols) {
        return Err(PyValueError::new_err("points must be rectangular"));
    }
    Array2::from_shape_vec((rows, cols), points.into_iter().flatten().collect())
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

fn cluster_on<B: QuantumBackend>(
    backend: B,
    config: QuantumKMeansConfig,
    points: Array2<f64>,
) -> PyResult<(Vec<usize>, Vec<Vec<f64>>, usize)> {
    let mut model = QuantumKMeans::with_config(backend, config);
    model
        .fit(&points)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    let summary = model
        .summary()
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok((summary.labels, summary.cluster_centers, summary.n_iter))
}

/// Fit quantum k-means and return (labels, cluster_centers, n_iter).
#[pyfunction(signature = (points, n_clusters=None, shots=None, map_type=None, backend=None, readout_error=None, seed=None))]
pub fn fit_predict(
    points: Vec<Vec<f64>>,
    n_clusters: Option<usize>,
    shots: Option<u32>,
    map_type: Option<String>,
    backend: Option<String>,
    readout_error: Option<f64>,
    seed: Option<u64>,
) -> PyResult<(Vec<usize>, Vec<Vec<f64>>, usize)> {
    let points = to_matrix(points)?;
    let map_type = MapType::from_str(map_type.as_deref().unwrap_or("probability"))
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    let kind = BackendKind::from_str(backend.as_deref().unwrap_or("local"))
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    let config = QuantumKMeansConfig {
        n_clusters: n_clusters.unwrap_or(2),
        shots: shots.unwrap_or(1024),
        map_type,
        seed,
        ..QuantumKMeansConfig::default()
    };

    match kind {
        BackendKind::Local => {
            let mut simulator = LocalSimulator::new();
            if let Some(seed) = seed {
                simulator = simulator.with_seed(seed);
            }
            cluster_on(simulator, config, points)
        }
        BackendKind::Noisy => {
            let mut simulator = NoisySimulator::new(readout_error.unwrap_or(0.0))
                .map_err(|e| PyValueError::new_err(e.to_string()))?;
            if let Some(seed) = seed {
                simulator = simulator.with_seed(seed);
            }
            cluster_on(simulator, config, points)
        }
    }
}

#[pymodule]
fn qkmeans(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(fit_predict, m)?)?;
    Ok(())
}
