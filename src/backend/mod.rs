//! Backend module - inference provider trait and the Replicate client

pub mod replicate;
pub mod traits;

pub use replicate::ReplicateBackend;
pub use traits::{InferenceBackend, PredictionOutput};
