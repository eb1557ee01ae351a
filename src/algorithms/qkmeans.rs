//! Quantum k-means estimator.
//!
//! Classical Lloyd iterations with every point-to-centroid distance
//! estimated by a swap-test circuit on a [`QuantumBackend`]. The estimator
//! mirrors the usual fit/predict surface: configure, `fit` on a matrix of
//! row vectors, then read labels and centers or `predict` new points.

use std::time::Instant;

use log::{debug, info};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::algorithms::distance::pairwise_distances;
use crate::algorithms::encoding::{preprocess, MapType};
use crate::algorithms::seeding::{qkmeans_plusplus, InitialCenter};
use crate::algorithms::Algorithm;
use crate::error::{Error, Result};
use crate::infrastructure::QuantumBackend;

/// Centroid initialization method.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub enum Init {
    /// Greedy qk-means++ seeding over quantum distances.
    #[default]
    PlusPlus,
    /// `n_clusters` rows drawn at random from the data.
    Random,
    /// Caller-provided centers of shape (n_clusters, n_features), given in
    /// the preprocessed feature space.
    Explicit(Array2<f64>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantumKMeansConfig {
    pub n_clusters: usize,
    pub init: Init,
    /// Convergence threshold on the summed centroid movement between two
    /// consecutive iterations.
    pub tol: f64,
    pub max_iter: usize,
    pub map_type: MapType,
    pub norm_relevance: bool,
    pub initial_center: InitialCenter,
    pub shots: u32,
    /// Seed for centroid initialization; backends seed their own sampling.
    pub seed: Option<u64>,
}

impl Default for QuantumKMeansConfig {
    fn default() -> Self {
        Self {
            n_clusters: 2,
            init: Init::PlusPlus,
            tol: 1e-4,
            max_iter: 300,
            map_type: MapType::Probability,
            norm_relevance: false,
            initial_center: InitialCenter::Random,
            shots: 1024,
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Fitted {
    centers: Array2<f64>,
    labels: Array1<usize>,
    n_iter: usize,
}

/// Quantum k-means clustering over a circuit execution backend.
pub struct QuantumKMeans<B: QuantumBackend> {
    backend: B,
    config: QuantumKMeansConfig,
    fitted: Option<Fitted>,
}

impl<B: QuantumBackend> QuantumKMeans<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, QuantumKMeansConfig::default())
    }

    pub fn with_config(backend: B, config: QuantumKMeansConfig) -> Self {
        Self {
            backend,
            config,
            fitted: None,
        }
    }

    pub fn config(&self) -> &QuantumKMeansConfig {
        &self.config
    }

    /// Replace the configuration. Clears any previous fit.
    pub fn set_config(&mut self, config: QuantumKMeansConfig) {
        self.config = config;
        self.fitted = None;
    }

    pub fn cluster_centers(&self) -> Option<&Array2<f64>> {
        self.fitted.as_ref().map(|f| &f.centers)
    }

    pub fn labels(&self) -> Option<&Array1<usize>> {
        self.fitted.as_ref().map(|f| &f.labels)
    }

    pub fn n_iter(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.n_iter)
    }

    /// Cluster `x` (one sample per row).
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let k = self.config.n_clusters;
        if n_samples == 0 {
            return Err(Error::EmptyInput("points"));
        }
        if k == 0 || n_samples < k {
            return Err(Error::TooFewSamples {
                n_samples,
                n_clusters: k,
            });
        }

        let start = Instant::now();
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let points = preprocess(x, self.config.map_type, self.config.norm_relevance);
        let mut centers = self.initial_centers(&points, &mut rng)?;

        let mut labels = Array1::zeros(0);
        let mut n_iter = 0;
        for iteration in 0..self.config.max_iter {
            let distances = pairwise_distances(
                &points,
                &centers,
                &self.backend,
                self.config.map_type,
                self.config.norm_relevance,
                self.config.shots,
            )?;
            labels = argmin_per_sample(&distances);

            let new_centers = self.updated_centroids(&points, &labels, &centers);
            let movement: f64 = (&new_centers - &centers).sum();
            debug!("iteration {iteration}: centroid movement {movement}");

            let finished = movement.abs() < self.config.tol;
            centers = new_centers;
            n_iter += 1;
            if finished {
                break;
            }
        }

        info!(
            "fitted {k} clusters on {n_samples} samples in {n_iter} iterations ({})",
            humantime::format_duration(start.elapsed())
        );
        self.fitted = Some(Fitted {
            centers,
            labels,
            n_iter,
        });
        Ok(self)
    }

    /// Assign each sample in `x` to its closest fitted center. A weight
    /// per sample scales that sample's features before encoding.
    pub fn predict(&self, x: &Array2<f64>, sample_weight: Option<&[f64]>) -> Result<Array1<usize>> {
        let fitted = self.fitted.as_ref().ok_or(Error::NotFitted)?;
        let mut points = preprocess(x, self.config.map_type, self.config.norm_relevance);
        if let Some(weights) = sample_weight {
            if weights.len() != points.nrows() {
                return Err(Error::BadWeightCount {
                    expected: points.nrows(),
                    found: weights.len(),
                });
            }
            for (mut row, &w) in points.axis_iter_mut(Axis(0)).zip(weights.iter()) {
                row.mapv_inplace(|v| v * w);
            }
        }
        let distances = pairwise_distances(
            &points,
            &fitted.centers,
            &self.backend,
            self.config.map_type,
            self.config.norm_relevance,
            self.config.shots,
        )?;
        Ok(argmin_per_sample(&distances))
    }

    /// Fit and return the labels.
    pub fn fit_predict(&mut self, x: &Array2<f64>) -> Result<Array1<usize>> {
        self.fit(x)?;
        Ok(self
            .labels()
            .cloned()
            .unwrap_or_else(|| Array1::zeros(0)))
    }

    /// Serializable snapshot of the fitted model.
    pub fn summary(&self) -> Result<FitSummary> {
        let fitted = self.fitted.as_ref().ok_or(Error::NotFitted)?;
        Ok(FitSummary {
            backend: self.backend.name().to_string(),
            n_clusters: self.config.n_clusters,
            map_type: self.config.map_type,
            shots: self.config.shots,
            n_iter: fitted.n_iter,
            labels: fitted.labels.to_vec(),
            cluster_centers: fitted
                .centers
                .axis_iter(Axis(0))
                .map(|row| row.to_vec())
                .collect(),
        })
    }

    fn initial_centers(&self, points: &Array2<f64>, rng: &mut StdRng) -> Result<Array2<f64>> {
        let k = self.config.n_clusters;
        match &self.config.init {
            Init::PlusPlus => {
                let (centers, _) = qkmeans_plusplus(
                    points,
                    k,
                    &self.backend,
                    self.config.map_type,
                    self.config.norm_relevance,
                    self.config.shots,
                    self.config.initial_center,
                    rng,
                )?;
                Ok(centers)
            }
            Init::Random => {
                let rows: Vec<usize> = (0..points.nrows()).collect();
                let chosen: Vec<usize> = rows.choose_multiple(rng, k).cloned().collect();
                let mut centers = Array2::zeros((k, points.ncols()));
                for (row, &index) in chosen.iter().enumerate() {
                    centers.row_mut(row).assign(&points.row(index));
                }
                Ok(centers)
            }
            Init::Explicit(provided) => {
                if provided.nrows() != k || provided.ncols() != points.ncols() {
                    return Err(Error::BadInitShape {
                        expected_rows: k,
                        expected_cols: points.ncols(),
                        rows: provided.nrows(),
                        cols: provided.ncols(),
                    });
                }
                Ok(provided.clone())
            }
        }
    }

    /// Per-label means; an empty cluster keeps its previous centroid. With
    /// probability encoding the means are re-normalized so they stay valid
    /// amplitude vectors.
    fn updated_centroids(
        &self,
        points: &Array2<f64>,
        labels: &Array1<usize>,
        old_centers: &Array2<f64>,
    ) -> Array2<f64> {
        let k = self.config.n_clusters;
        let d = points.ncols();
        let mut sums = Array2::zeros((k, d));
        let mut counts = vec![0usize; k];
        for (i, row) in points.axis_iter(Axis(0)).enumerate() {
            let label = labels[i];
            counts[label] += 1;
            sums.row_mut(label).zip_mut_with(&row, |a, &b| *a += b);
        }

        let mut centers = Array2::zeros((k, d));
        for j in 0..k {
            if counts[j] == 0 {
                centers.row_mut(j).assign(&old_centers.row(j));
                continue;
            }
            let mut row = sums.row(j).to_owned();
            row.mapv_inplace(|v| v / counts[j] as f64);
            if self.config.map_type == MapType::Probability {
                let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm > 1e-12 {
                    row.mapv_inplace(|v| v / norm);
                }
            }
            centers.row_mut(j).assign(&row);
        }
        centers
    }
}

impl<B: QuantumBackend> Algorithm for QuantumKMeans<B> {
    type Input = Array2<f64>;
    type Output = Array1<usize>;

    fn run(&mut self, input: Array2<f64>) -> Result<Array1<usize>> {
        self.fit_predict(&input)
    }

    fn name(&self) -> String {
        String::from("Quantum k-Means")
    }

    fn description(&self) -> String {
        String::from(
            "Clusters signal vectors with swap-test distance estimation on a quantum backend",
        )
    }
}

/// JSON-friendly description of a fitted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitSummary {
    pub backend: String,
    pub n_clusters: usize,
    pub map_type: MapType,
    pub shots: u32,
    pub n_iter: usize,
    pub labels: Vec<usize>,
    pub cluster_centers: Vec<Vec<f64>>,
}

impl FitSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn argmin_per_sample(distances: &Array2<f64>) -> Array1<usize> {
    Array1::from_iter((0..distances.ncols()).map(|sample| {
        let mut best = 0;
        let mut best_value = f64::INFINITY;
        for (center, &value) in distances.column(sample).iter().enumerate() {
            if value < best_value {
                best_value = value;
                best = center;
            }
        }
        best
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::LocalSimulator;
    use ndarray::array;

    fn blobs() -> Array2<f64> {
        array![
            [1.0, 0.05],
            [1.0, 0.1],
            [0.95, 0.05],
            [0.9, 0.1],
            [0.05, 1.0],
            [0.1, 1.0],
            [0.05, 0.95],
            [0.1, 0.9],
        ]
    }

    fn seeded_model(seed: u64) -> QuantumKMeans<LocalSimulator> {
        let config = QuantumKMeansConfig {
            shots: 512,
            seed: Some(seed),
            ..QuantumKMeansConfig::default()
        };
        QuantumKMeans::with_config(LocalSimulator::new().with_seed(seed), config)
    }

    #[test]
    fn fit_separates_two_blobs() {
        let x = blobs();
        let mut model = seeded_model(21);
        model.fit(&x).unwrap();

        let labels = model.labels().unwrap();
        assert_eq!(labels.len(), 8);
        let first_blob = labels[0];
        for i in 1..4 {
            assert_eq!(labels[i], first_blob);
        }
        let second_blob = labels[4];
        assert_ne!(first_blob, second_blob);
        for i in 5..8 {
            assert_eq!(labels[i], second_blob);
        }
        assert!(model.n_iter().unwrap() >= 1);
        assert_eq!(model.cluster_centers().unwrap().dim(), (2, 2));
    }

    #[test]
    fn predict_assigns_new_points_to_nearest_blob() {
        let x = blobs();
        let mut model = seeded_model(33);
        model.fit(&x).unwrap();

        let labels = model.labels().unwrap().clone();
        let new_points = array![[0.97, 0.08], [0.08, 0.97]];
        let predicted = model.predict(&new_points, None).unwrap();
        assert_eq!(predicted[0], labels[0]);
        assert_eq!(predicted[1], labels[4]);
    }

    #[test]
    fn predict_before_fit_is_rejected() {
        let model = QuantumKMeans::new(LocalSimulator::new());
        let x = array![[1.0, 0.0]];
        assert!(matches!(model.predict(&x, None), Err(Error::NotFitted)));
    }

    #[test]
    fn too_few_samples_are_rejected() {
        let mut model = seeded_model(1);
        let x = array![[1.0, 0.0]];
        assert!(matches!(
            model.fit(&x),
            Err(Error::TooFewSamples {
                n_samples: 1,
                n_clusters: 2
            })
        ));
    }

    #[test]
    fn explicit_init_must_match_shape() {
        let mut config = QuantumKMeansConfig::default();
        config.init = Init::Explicit(array![[1.0, 0.0, 0.0]]);
        config.seed = Some(3);
        let mut model = QuantumKMeans::with_config(LocalSimulator::new().with_seed(3), config);
        let x = blobs();
        assert!(matches!(model.fit(&x), Err(Error::BadInitShape { .. })));
    }

    #[test]
    fn mismatched_sample_weights_are_rejected() {
        let x = blobs();
        let mut model = seeded_model(9);
        model.fit(&x).unwrap();
        let weights = vec![1.0; 3];
        assert!(matches!(
            model.predict(&x, Some(&weights)),
            Err(Error::BadWeightCount { .. })
        ));
    }

    #[test]
    fn run_behaves_like_fit_predict() {
        let x = blobs();
        let mut model = seeded_model(13);
        let labels = model.run(x.clone()).unwrap();
        assert_eq!(labels.len(), 8);
        assert_eq!(model.name(), "Quantum k-Means");
    }

    #[test]
    fn summary_serializes_to_json() {
        let x = blobs();
        let mut model = seeded_model(27);
        model.fit(&x).unwrap();
        let json = model.summary().unwrap().to_json().unwrap();
        assert!(json.contains("\"n_clusters\": 2"));
        assert!(json.contains("local_statevector"));
    }
}
