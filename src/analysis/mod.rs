pub mod heuristic;
pub mod pool;

use thiserror::Error;

use crate::models::verdict::Verdict;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("analysis worker failed: {0}")]
    Worker(String),
}

/// Content-analysis strategy. `analyze` is CPU-bound and synchronous;
/// callers go through `AnalysisPool` to keep it off the request path.
///
/// The shipped implementation is a heuristic stand-in; a model-backed one
/// plugs in here without any pipeline change.
pub trait AnalysisEngine: Send + Sync {
    fn analyze(&self, image: &[u8]) -> Result<Verdict, AnalysisError>;
}
