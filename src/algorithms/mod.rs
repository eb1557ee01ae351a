pub mod distance;
pub mod encoding;
pub mod qkmeans;
pub mod seeding;

pub use distance::pairwise_distances;
pub use encoding::{preprocess, MapType};
pub use qkmeans::{FitSummary, Init, QuantumKMeans, QuantumKMeansConfig};
pub use seeding::InitialCenter;

use crate::error::Result;

/// Trait for the quantum algorithms in this crate.
/// Each algorithm implements it for its own input and output types.
pub trait Algorithm {
    type Input;
    type Output;

    /// Run the algorithm on the given input.
    fn run(&mut self, input: Self::Input) -> Result<Self::Output>;

    /// Get the algorithm's name.
    fn name(&self) -> String;

    /// Get a description of the algorithm.
    fn description(&self) -> String;
}
