use thiserror::Error;

/// Errors produced while building circuits, running backends or fitting
/// the clustering estimator.
#[derive(Debug, Error)]
pub enum Error {
    #[error("qubit index {qubit} out of range for {num_qubits}-qubit circuit")]
    QubitOutOfRange { qubit: usize, num_qubits: usize },

    #[error("classical bit index {clbit} out of range for {num_clbits}-bit register")]
    ClbitOutOfRange { clbit: usize, num_clbits: usize },

    #[error("state preparation expects {expected} amplitudes for {qubits} qubits, got {found}")]
    AmplitudeCount {
        qubits: usize,
        expected: usize,
        found: usize,
    },

    #[error("state preparation amplitudes have norm {norm}, expected 1")]
    UnnormalizedAmplitudes { norm: f64 },

    #[error("state preparation targets must still be in |0...0>")]
    PreparationTargetNotZero,

    #[error("circuit needs {requested} qubits but the backend supports at most {limit}")]
    TooManyQubits { requested: usize, limit: usize },

    #[error("shots must be greater than zero")]
    ZeroShots,

    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    #[error("feature count mismatch: points have {points} features, centers have {centers}")]
    FeatureMismatch { points: usize, centers: usize },

    #[error("angle encoding needs at least two features, got {0}")]
    TooFewFeatures(usize),

    #[error("cannot encode a zero vector")]
    ZeroVector,

    #[error("cannot fit {n_clusters} clusters to {n_samples} samples")]
    TooFewSamples {
        n_samples: usize,
        n_clusters: usize,
    },

    #[error("explicit initial centers must have shape ({expected_rows}, {expected_cols}), got ({rows}, {cols})")]
    BadInitShape {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("estimator has not been fitted")]
    NotFitted,

    #[error("unknown map type: {0}")]
    UnknownMapType(String),

    #[error("unknown backend kind: {0}")]
    UnknownBackendKind(String),

    #[error("readout error probability {0} must lie in [0, 1]")]
    BadReadoutError(f64),

    #[error("sample weights must match the number of samples ({expected}), got {found}")]
    BadWeightCount { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
