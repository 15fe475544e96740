pub mod classifier;
pub mod registry;

pub use classifier::{CraftClassifier, Prediction};
pub use registry::ModelRegistry;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not loaded. Call load() first.")]
    NotLoaded,
    #[error("Invalid model input: {0}")]
    InvalidInput(String),
}
