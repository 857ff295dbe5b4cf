use bytes::Bytes;
use serde_json::json;

use super::recorder::UsageRecorder;
use crate::analysis::pool::AnalysisPool;
use crate::errors::AppError;
use crate::models::token::TokenRecord;
use crate::models::usage::UsageRecord;
use crate::models::verdict::Verdict;

/// Default hard ceiling on accepted uploads.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// What the gateway knows about an upload before analysis.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Bytes,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

pub struct ModerationPipeline {
    pool: AnalysisPool,
    recorder: UsageRecorder,
    max_upload_bytes: usize,
}

impl ModerationPipeline {
    pub fn new(pool: AnalysisPool, recorder: UsageRecorder, max_upload_bytes: usize) -> Self {
        Self {
            pool,
            recorder,
            max_upload_bytes,
        }
    }

    /// Validate, analyze, record.
    ///
    /// Validation failures return before the engine is touched and leave no
    /// usage record — nothing was dispatched. Once analysis runs, exactly
    /// one record is written whether it succeeded or not, and a failing
    /// write never changes the outcome handed back to the caller.
    pub async fn handle(&self, upload: Upload, caller: &TokenRecord) -> Result<Verdict, AppError> {
        let content_type = upload.content_type.as_deref().unwrap_or("");
        if !content_type.starts_with("image/") {
            return Err(AppError::InvalidInput("file must be an image".into()));
        }
        if upload.bytes.len() > self.max_upload_bytes {
            return Err(AppError::PayloadTooLarge);
        }

        let size = upload.bytes.len();
        match self.pool.analyze(upload.bytes.clone()).await {
            Ok(verdict) => {
                self.recorder
                    .record(UsageRecord::new(
                        caller.secret.clone(),
                        "/moderate",
                        "POST",
                        Some(200),
                        Some(json!({
                            "filename": upload.filename,
                            "file_size": size,
                            "content_type": content_type,
                            "is_safe": verdict.is_safe,
                        })),
                    ))
                    .await;
                Ok(verdict)
            }
            Err(err) => {
                // Full detail stays in the server log; the client and the
                // usage record get a short description only.
                tracing::error!("image analysis failed: {}", err);
                self.recorder
                    .record(UsageRecord::new(
                        caller.secret.clone(),
                        "/moderate",
                        "POST",
                        Some(500),
                        Some(json!({
                            "filename": upload.filename,
                            "error": err.to_string(),
                        })),
                    ))
                    .await;
                Err(AppError::AnalysisFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisEngine, AnalysisError};
    use crate::store::memory::MemoryStore;
    use crate::store::{StoreError, UsageLog};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Engine double: fixed outcome, counts invocations.
    struct CountingEngine {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl AnalysisEngine for CountingEngine {
        fn analyze(&self, _image: &[u8]) -> Result<Verdict, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AnalysisError::Worker("synthetic failure".into()))
            } else {
                Ok(Verdict::safe())
            }
        }
    }

    /// Usage log double whose appends always fail.
    struct FailingLog;

    #[async_trait]
    impl UsageLog for FailingLog {
        async fn append(&self, _record: &crate::models::usage::UsageRecord) -> Result<(), StoreError> {
            Err(StoreError::Backend(anyhow::anyhow!("log unavailable")))
        }
    }

    fn caller() -> TokenRecord {
        TokenRecord {
            secret: "testsecret".into(),
            is_admin: false,
            created_at: Utc::now(),
            is_active: true,
            description: None,
        }
    }

    fn pipeline_with(
        fail: bool,
        calls: Arc<AtomicUsize>,
        store: Arc<MemoryStore>,
    ) -> ModerationPipeline {
        let pool = AnalysisPool::new(Arc::new(CountingEngine { calls, fail }), 2);
        ModerationPipeline::new(pool, UsageRecorder::new(store), DEFAULT_MAX_UPLOAD_BYTES)
    }

    fn upload(len: usize, content_type: Option<&str>) -> Upload {
        Upload {
            bytes: Bytes::from(vec![0u8; len]),
            filename: Some("img.png".into()),
            content_type: content_type.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn non_image_content_type_is_rejected_before_analysis() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline_with(false, calls.clone(), store.clone());

        let err = pipeline
            .handle(upload(16, Some("text/plain")), &caller())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(store.usage_records().await.is_empty());
    }

    #[tokio::test]
    async fn missing_content_type_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline_with(false, calls.clone(), store.clone());

        let err = pipeline.handle(upload(16, None), &caller()).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exactly_the_ceiling_is_accepted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline_with(false, calls.clone(), store.clone());

        let verdict = pipeline
            .handle(upload(DEFAULT_MAX_UPLOAD_BYTES, Some("image/png")), &caller())
            .await
            .unwrap();

        assert!(verdict.is_safe);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn one_byte_over_the_ceiling_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline_with(false, calls.clone(), store.clone());

        let err = pipeline
            .handle(
                upload(DEFAULT_MAX_UPLOAD_BYTES + 1, Some("image/png")),
                &caller(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PayloadTooLarge));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(store.usage_records().await.is_empty());
    }

    #[tokio::test]
    async fn success_writes_exactly_one_usage_record() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline_with(false, calls, store.clone());

        pipeline
            .handle(upload(64, Some("image/png")), &caller())
            .await
            .unwrap();

        let records = store.usage_records().await;
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.token, "testsecret");
        assert_eq!(record.endpoint, "/moderate");
        assert_eq!(record.method, "POST");
        assert_eq!(record.status_code, Some(200));

        let metadata = record.metadata.as_ref().unwrap();
        assert_eq!(metadata["filename"], "img.png");
        assert_eq!(metadata["file_size"], 64);
        assert_eq!(metadata["content_type"], "image/png");
        assert_eq!(metadata["is_safe"], true);
    }

    #[tokio::test]
    async fn engine_failure_is_sanitized_and_still_recorded() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline_with(true, calls.clone(), store.clone());

        let err = pipeline
            .handle(upload(64, Some("image/jpeg")), &caller())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AnalysisFailed));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let records = store.usage_records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status_code, Some(500));

        let metadata = records[0].metadata.as_ref().unwrap();
        assert!(metadata["error"].as_str().unwrap().contains("synthetic failure"));
    }

    #[tokio::test]
    async fn usage_log_failure_does_not_mask_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pool = AnalysisPool::new(Arc::new(CountingEngine { calls, fail: false }), 2);
        let pipeline = ModerationPipeline::new(
            pool,
            UsageRecorder::new(Arc::new(FailingLog)),
            DEFAULT_MAX_UPLOAD_BYTES,
        );

        let verdict = pipeline
            .handle(upload(64, Some("image/png")), &caller())
            .await
            .unwrap();
        assert!(verdict.is_safe);
    }

    #[tokio::test]
    async fn usage_log_failure_does_not_mask_analysis_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pool = AnalysisPool::new(Arc::new(CountingEngine { calls, fail: true }), 2);
        let pipeline = ModerationPipeline::new(
            pool,
            UsageRecorder::new(Arc::new(FailingLog)),
            DEFAULT_MAX_UPLOAD_BYTES,
        );

        let err = pipeline
            .handle(upload(64, Some("image/png")), &caller())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AnalysisFailed));
    }
}
