use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Semaphore;

use super::{AnalysisEngine, AnalysisError};
use crate::models::verdict::Verdict;

/// Bounded worker pool in front of an `AnalysisEngine`.
///
/// Analysis is CPU-bound; running it inline would stall every other request
/// on the same runtime. The semaphore caps how many blocking tasks run at
/// once — callers past the ceiling queue on a permit instead of spawning
/// unbounded work. This is the service's only backpressure mechanism.
#[derive(Clone)]
pub struct AnalysisPool {
    engine: Arc<dyn AnalysisEngine>,
    permits: Arc<Semaphore>,
}

impl AnalysisPool {
    pub fn new(engine: Arc<dyn AnalysisEngine>, workers: usize) -> Self {
        Self {
            engine,
            permits: Arc::new(Semaphore::new(workers)),
        }
    }

    /// Run the engine on a blocking worker thread, suspending cooperatively
    /// until a permit and the result are available.
    pub async fn analyze(&self, image: Bytes) -> Result<Verdict, AnalysisError> {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AnalysisError::Worker("analysis pool is shut down".into()))?;

        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || engine.analyze(&image))
            .await
            .map_err(|e| AnalysisError::Worker(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Engine double that tracks how many analyses run at once.
    struct GaugeEngine {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl AnalysisEngine for GaugeEngine {
        fn analyze(&self, _image: &[u8]) -> Result<Verdict, AnalysisError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(25));
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(Verdict::safe())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn pool_never_exceeds_its_permit_ceiling() {
        let engine = Arc::new(GaugeEngine {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let pool = AnalysisPool::new(engine.clone(), 2);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                pool.analyze(Bytes::from_static(b"payload")).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert!(engine.peak.load(Ordering::SeqCst) <= 2);
    }
}
