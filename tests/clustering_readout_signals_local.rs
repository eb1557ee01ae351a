//! End-to-end clustering runs on the bundled simulators, driven by small
//! IQ-plane readout datasets like the ones the estimator is evaluated on.

use ndarray::{array, Array2};

use qkmeans::{
    Algorithm, MapType, NoisySimulator, LocalSimulator, QuantumKMeans, QuantumKMeansConfig,
};

/// Two readout clouds in the IQ plane: a ground-state blob along I and an
/// excited-state blob rotated towards Q.
fn iq_readout_signals() -> Array2<f64> {
    array![
        [1.20, 0.38],
        [1.15, 0.42],
        [1.25, 0.35],
        [1.18, 0.45],
        [-0.28, 1.12],
        [-0.35, 1.05],
        [-0.30, 1.15],
        [-0.25, 1.08],
    ]
}

fn assert_two_blobs(labels: &[usize]) {
    let ground = labels[0];
    assert!(labels[..4].iter().all(|&l| l == ground));
    let excited = labels[4];
    assert_ne!(ground, excited);
    assert!(labels[4..].iter().all(|&l| l == excited));
}

#[test]
fn clusters_iq_clouds_with_probability_encoding() {
    let config = QuantumKMeansConfig {
        shots: 512,
        seed: Some(101),
        ..QuantumKMeansConfig::default()
    };
    let mut model = QuantumKMeans::with_config(LocalSimulator::new().with_seed(101), config);
    let labels = model.fit_predict(&iq_readout_signals()).unwrap();
    assert_two_blobs(&labels.to_vec());
    assert!(model.n_iter().unwrap() >= 1);
}

#[test]
fn clusters_iq_clouds_with_angle_encoding() {
    let signals = array![
        [2.0, 2.1],
        [1.9, 2.0],
        [2.1, 1.9],
        [2.0, 1.8],
        [-2.0, -1.9],
        [-1.9, -2.1],
        [-2.1, -2.0],
        [-1.8, -2.0],
    ];
    let config = QuantumKMeansConfig {
        map_type: MapType::Angle,
        shots: 512,
        seed: Some(55),
        ..QuantumKMeansConfig::default()
    };
    let mut model = QuantumKMeans::with_config(LocalSimulator::new().with_seed(55), config);
    let labels = model.fit_predict(&signals).unwrap();
    assert_two_blobs(&labels.to_vec());
}

#[test]
fn readout_noise_does_not_break_well_separated_clouds() {
    let config = QuantumKMeansConfig {
        shots: 1024,
        seed: Some(77),
        ..QuantumKMeansConfig::default()
    };
    let backend = NoisySimulator::new(0.02).unwrap().with_seed(77);
    let mut model = QuantumKMeans::with_config(backend, config);
    let labels = model.fit_predict(&iq_readout_signals()).unwrap();
    assert_two_blobs(&labels.to_vec());
}

#[test]
fn fitted_model_predicts_and_summarizes() {
    let config = QuantumKMeansConfig {
        shots: 512,
        seed: Some(19),
        ..QuantumKMeansConfig::default()
    };
    let mut model = QuantumKMeans::with_config(LocalSimulator::new().with_seed(19), config);
    let signals = iq_readout_signals();
    model.fit(&signals).unwrap();

    let fresh = array![[1.22, 0.40], [-0.31, 1.10]];
    let predicted = model.predict(&fresh, None).unwrap();
    let labels = model.labels().unwrap();
    assert_eq!(predicted[0], labels[0]);
    assert_eq!(predicted[1], labels[4]);

    let json = model.summary().unwrap().to_json().unwrap();
    assert!(json.contains("\"backend\""));
    assert!(json.contains("\"cluster_centers\""));

    assert_eq!(model.name(), "Quantum k-Means");
    assert!(!model.description().is_empty());
}
