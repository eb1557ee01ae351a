
// Description: Quantum-enhanced k-means clustering for superconducting-qubit
// readout signal analysis. Distances inside the k-means loop are estimated
// by swap-test circuits executed on a pluggable quantum backend.

use std::io::ErrorKind;

pub mod algorithms;
pub mod error;
pub mod infrastructure;
pub mod quantum;

#[cfg(feature = "python")]
pub mod bindings;

pub use algorithms::{
    pairwise_distances, preprocess, Algorithm, FitSummary, Init, InitialCenter, MapType,
    QuantumKMeans, QuantumKMeansConfig,
};
pub use error::{Error, Result};
pub use infrastructure::{BackendKind, Counts, LocalSimulator, NoisySimulator, QuantumBackend};
pub use quantum::{QuantumCircuit, StateVector};

/// Route crate logging to `log_path`, replacing any previous log file.
pub fn setup_logger(log_path: &str) -> std::result::Result<(), fern::InitError> {
    if let Err(e) = std::fs::remove_file(log_path) {
        if e.kind() != ErrorKind::NotFound {
            return Err(fern::InitError::Io(e));
        }
    }

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(fern::log_file(log_path)?)
        .apply()?;
    Ok(())
}
