//! Batched point-to-center distance estimation.

use std::time::Instant;

use log::debug;
use ndarray::{Array2, Axis};

use crate::algorithms::encoding::{distance_from_counts, swap_test_circuit, MapType};
use crate::error::{Error, Result};
use crate::infrastructure::QuantumBackend;
use crate::quantum::QuantumCircuit;

/// Estimate the distance from every point in `x` to every row of
/// `centers`, returning a `(n_centers, n_samples)` matrix.
///
/// One swap-test circuit is built per (point, center) pair and submitted
/// in chunks of `backend.max_experiments()` circuits, the way a job-based
/// device caps experiments per submission.
pub fn pairwise_distances<B: QuantumBackend + ?Sized>(
    x: &Array2<f64>,
    centers: &Array2<f64>,
    backend: &B,
    map_type: MapType,
    norm_relevance: bool,
    shots: u32,
) -> Result<Array2<f64>> {
    if x.nrows() == 0 {
        return Err(Error::EmptyInput("points"));
    }
    if centers.nrows() == 0 {
        return Err(Error::EmptyInput("centers"));
    }
    if x.ncols() != centers.ncols() {
        return Err(Error::FeatureMismatch {
            points: x.ncols(),
            centers: centers.ncols(),
        });
    }

    let start = Instant::now();
    let n_samples = x.nrows();
    let chunk = backend.max_experiments().max(1);
    let mut distances = Array2::zeros((centers.nrows(), n_samples));

    for (center_index, center) in centers.axis_iter(Axis(0)).enumerate() {
        let mut circuits: Vec<QuantumCircuit> = Vec::with_capacity(n_samples);
        for point in x.axis_iter(Axis(0)) {
            circuits.push(swap_test_circuit(point, center, map_type, norm_relevance)?);
        }
        let mut sample_index = 0;
        for batch in circuits.chunks(chunk) {
            let results = backend.run(batch, shots)?;
            for counts in &results {
                distances[[center_index, sample_index]] = distance_from_counts(counts, shots);
                sample_index += 1;
            }
        }
    }

    debug!(
        "estimated {} x {} distances on {} in {}",
        centers.nrows(),
        n_samples,
        backend.name(),
        humantime::format_duration(start.elapsed())
    );
    Ok(distances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::LocalSimulator;
    use ndarray::array;

    #[test]
    fn distance_matrix_has_centers_by_samples_shape() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [0.6, 0.8]];
        let centers = array![[1.0, 0.0], [0.0, 1.0]];
        let backend = LocalSimulator::new().with_seed(11);
        let d =
            pairwise_distances(&x, &centers, &backend, MapType::Probability, false, 512).unwrap();
        assert_eq!(d.dim(), (2, 3));
        // every swap-test distance sits in [0, 0.5] up to shot noise
        assert!(d.iter().all(|&v| (0.0..=0.55).contains(&v)));
    }

    #[test]
    fn points_match_their_own_center() {
        let x = array![[1.0, 0.0], [0.0, 1.0]];
        let backend = LocalSimulator::new().with_seed(5);
        let d = pairwise_distances(&x, &x, &backend, MapType::Probability, false, 512).unwrap();
        assert_eq!(d[[0, 0]], 0.0);
        assert_eq!(d[[1, 1]], 0.0);
        assert!(d[[0, 1]] > 0.3);
        assert!(d[[1, 0]] > 0.3);
    }

    #[test]
    fn small_batch_capacity_still_covers_all_pairs() {
        let x = array![[1.0, 0.0], [0.9, 0.1], [0.0, 1.0], [0.1, 0.9], [0.5, 0.5]];
        let centers = array![[1.0, 0.0]];
        let backend = LocalSimulator::new().with_seed(23).with_max_experiments(2);
        let d =
            pairwise_distances(&x, &centers, &backend, MapType::Probability, false, 256).unwrap();
        assert_eq!(d.dim(), (1, 5));
        assert_eq!(d[[0, 0]], 0.0);
        assert!(d[[0, 2]] > d[[0, 1]]);
    }

    #[test]
    fn mismatched_feature_counts_are_rejected() {
        let x = array![[1.0, 0.0]];
        let centers = array![[1.0, 0.0, 0.0]];
        let backend = LocalSimulator::new();
        assert!(matches!(
            pairwise_distances(&x, &centers, &backend, MapType::Probability, false, 64),
            Err(Error::FeatureMismatch { .. })
        ));
    }
}
