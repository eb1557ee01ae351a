//! Greedy qk-means++ seeding over quantum distance estimates.

use log::{debug, warn};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::algorithms::distance::pairwise_distances;
use crate::algorithms::encoding::MapType;
use crate::error::Result;
use crate::infrastructure::QuantumBackend;

/// Strategy for the first seeded center.
/// - Random: keep the uniformly drawn starting point.
/// - Far: once the second center is known, re-seed the first center from
///   the second's distance distribution so the pair starts spread out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialCenter {
    #[default]
    Random,
    Far,
}

/// Select `n_clusters` seed centers from `x` with the qk-means++ rule:
/// candidates are drawn proportionally to each point's distance to its
/// closest chosen center, and the candidate that shrinks the total
/// potential the most is kept. Returns the centers and their row indices
/// in `x`.
pub fn qkmeans_plusplus<B: QuantumBackend + ?Sized, R: Rng>(
    x: &Array2<f64>,
    n_clusters: usize,
    backend: &B,
    map_type: MapType,
    norm_relevance: bool,
    shots: u32,
    initial_center: InitialCenter,
    rng: &mut R,
) -> Result<(Array2<f64>, Vec<usize>)> {
    let n_samples = x.nrows();
    let n_features = x.ncols();

    // 2 + log(k) candidate draws per center, as in greedy k-means++
    let n_local_trials = 2 + (n_clusters as f64).ln() as usize;

    let first = rng.gen_range(0..n_samples);
    let mut centers = Array2::zeros((n_clusters, n_features));
    centers.row_mut(0).assign(&x.row(first));
    let mut indices = vec![first; n_clusters];

    let mut closest = center_distances(x, x.row(first).to_owned(), backend, map_type, norm_relevance, shots)?;
    let mut current_pot = closest.sum();
    debug!("seeded center 0 at row {first}, potential {current_pot}");

    for c in 1..n_clusters {
        let picked = pick_candidate(
            x,
            &closest,
            current_pot,
            n_local_trials,
            backend,
            map_type,
            norm_relevance,
            shots,
            rng,
        )?;
        centers.row_mut(c).assign(&x.row(picked.index));
        indices[c] = picked.index;
        closest = picked.closest;
        current_pot = picked.potential;
        debug!("seeded center {c} at row {}, potential {current_pot}", picked.index);

        if c == 1 && initial_center == InitialCenter::Far {
            // Restart the first center from the second one's distances.
            closest = center_distances(
                x,
                centers.row(1).to_owned(),
                backend,
                map_type,
                norm_relevance,
                shots,
            )?;
            current_pot = closest.sum();
            let picked = pick_candidate(
                x,
                &closest,
                current_pot,
                n_local_trials,
                backend,
                map_type,
                norm_relevance,
                shots,
                rng,
            )?;
            centers.row_mut(0).assign(&x.row(picked.index));
            indices[0] = picked.index;
            closest = picked.closest;
            current_pot = picked.potential;
            debug!("re-seeded center 0 at row {}, potential {current_pot}", picked.index);
        }
    }

    Ok((centers, indices))
}

struct Candidate {
    index: usize,
    potential: f64,
    closest: Array1<f64>,
}

#[allow(clippy::too_many_arguments)]
fn pick_candidate<B: QuantumBackend + ?Sized, R: Rng>(
    x: &Array2<f64>,
    closest: &Array1<f64>,
    current_pot: f64,
    n_local_trials: usize,
    backend: &B,
    map_type: MapType,
    norm_relevance: bool,
    shots: u32,
    rng: &mut R,
) -> Result<Candidate> {
    let cumsum = stable_cumsum(closest);
    let last = closest.len() - 1;
    let candidate_ids: Vec<usize> = (0..n_local_trials)
        .map(|_| {
            let target = rng.gen::<f64>() * current_pot;
            searchsorted(&cumsum, target).min(last)
        })
        .collect();

    let mut candidates = Array2::zeros((candidate_ids.len(), x.ncols()));
    for (row, &id) in candidate_ids.iter().enumerate() {
        candidates.row_mut(row).assign(&x.row(id));
    }
    let distances = pairwise_distances(x, &candidates, backend, map_type, norm_relevance, shots)?;

    let mut best: Option<Candidate> = None;
    for (row, distance_row) in distances.axis_iter(Axis(0)).enumerate() {
        let merged: Array1<f64> = closest
            .iter()
            .zip(distance_row.iter())
            .map(|(&a, &b)| a.min(b))
            .collect();
        let potential = merged.sum();
        if best.as_ref().map_or(true, |b| potential < b.potential) {
            best = Some(Candidate {
                index: candidate_ids[row],
                potential,
                closest: merged,
            });
        }
    }
    Ok(best.expect("at least one candidate is always drawn"))
}

fn center_distances<B: QuantumBackend + ?Sized>(
    x: &Array2<f64>,
    center: Array1<f64>,
    backend: &B,
    map_type: MapType,
    norm_relevance: bool,
    shots: u32,
) -> Result<Array1<f64>> {
    let center = center.insert_axis(Axis(0));
    let distances = pairwise_distances(x, &center, backend, map_type, norm_relevance, shots)?;
    Ok(distances.row(0).to_owned())
}

/// Cumulative sum with a consistency check against the direct total, per
/// the stable-cumsum contract the seeding rule relies on.
pub(crate) fn stable_cumsum(values: &Array1<f64>) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut acc = 0.0;
    for &v in values {
        acc += v;
        out.push(acc);
    }
    let total = values.sum();
    if (acc - total).abs() > 1e-8 * total.abs().max(1.0) {
        warn!("cumulative sum drifted from direct sum: {acc} vs {total}");
    }
    out
}

/// First index whose cumulative value reaches `target` (left insertion).
pub(crate) fn searchsorted(cumsum: &[f64], target: f64) -> usize {
    cumsum.partition_point(|&c| c < target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::LocalSimulator;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn blobs() -> Array2<f64> {
        array![
            [1.0, 0.05],
            [1.0, 0.1],
            [0.95, 0.05],
            [0.05, 1.0],
            [0.1, 1.0],
            [0.05, 0.95],
        ]
    }

    #[test]
    fn seeds_are_rows_of_the_input() {
        let x = blobs();
        let backend = LocalSimulator::new().with_seed(17);
        let mut rng = StdRng::seed_from_u64(4);
        let (centers, indices) = qkmeans_plusplus(
            &x,
            2,
            &backend,
            MapType::Probability,
            false,
            256,
            InitialCenter::Random,
            &mut rng,
        )
        .unwrap();
        assert_eq!(centers.dim(), (2, 2));
        assert_eq!(indices.len(), 2);
        for (row, &index) in indices.iter().enumerate() {
            assert!(index < x.nrows());
            for col in 0..x.ncols() {
                assert_eq!(centers[[row, col]], x[[index, col]]);
            }
        }
    }

    #[test]
    fn seeding_spreads_across_separated_blobs() {
        // duplicated points: within-blob distances are exactly zero, so the
        // second seed must come from the opposite blob
        let x = array![
            [1.0, 0.0],
            [1.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [0.0, 1.0],
            [0.0, 1.0],
        ];
        let backend = LocalSimulator::new().with_seed(29);
        let mut rng = StdRng::seed_from_u64(12);
        let (_, indices) = qkmeans_plusplus(
            &x,
            2,
            &backend,
            MapType::Probability,
            false,
            512,
            InitialCenter::Random,
            &mut rng,
        )
        .unwrap();
        let sides: Vec<bool> = indices.iter().map(|&i| i < 3).collect();
        assert_ne!(sides[0], sides[1]);
    }

    #[test]
    fn far_strategy_returns_valid_indices() {
        let x = blobs();
        let backend = LocalSimulator::new().with_seed(31);
        let mut rng = StdRng::seed_from_u64(7);
        let (centers, indices) = qkmeans_plusplus(
            &x,
            3,
            &backend,
            MapType::Probability,
            false,
            256,
            InitialCenter::Far,
            &mut rng,
        )
        .unwrap();
        assert_eq!(centers.dim(), (3, 2));
        assert!(indices.iter().all(|&i| i < x.nrows()));
    }

    #[test]
    fn cumsum_and_searchsorted_agree_on_boundaries() {
        let values = Array1::from(vec![0.2, 0.0, 0.3, 0.5]);
        let cumsum = stable_cumsum(&values);
        assert_eq!(cumsum.len(), 4);
        assert!((cumsum[3] - 1.0).abs() < 1e-12);

        assert_eq!(searchsorted(&cumsum, 0.0), 0);
        assert_eq!(searchsorted(&cumsum, 0.1), 0);
        assert_eq!(searchsorted(&cumsum, 0.25), 2);
        assert_eq!(searchsorted(&cumsum, 0.7), 3);
        // targets beyond the total fall off the end and get clipped upstream
        assert_eq!(searchsorted(&cumsum, 1.5), 4);
    }
}
