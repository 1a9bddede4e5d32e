//! Scan ingestion and pest detection pipeline
//!
//! An item is uploaded to object storage, downloaded again by key, forwarded
//! to the detection service, classified, stored as an analysis report and
//! finally checked for an alert. Items in a batch run one after another.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use shared::{
    mime_type_for_path, storage_key_from_url, validate_upload_file_name, Alert, AnalysisReport,
    BatchPolicy, BatchReport, NewAlert, NormalizedDetection, ScanOutcome, ScanState, ScanType,
};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::{DetectionApi, ObjectStore};
use crate::services::report::NewAnalysisReport;
use crate::services::{AlertService, ReportService};

/// Persistence used by the pipeline
#[async_trait]
pub trait ScanRepository: Send + Sync {
    async fn save_report(&self, report: NewAnalysisReport) -> AppResult<AnalysisReport>;
    async fn save_alert(&self, alert: NewAlert) -> AppResult<Alert>;
}

/// PostgreSQL-backed [`ScanRepository`]
#[derive(Clone)]
pub struct PgScanRepository {
    reports: ReportService,
    alerts: AlertService,
}

impl PgScanRepository {
    pub fn new(db: PgPool) -> Self {
        Self {
            reports: ReportService::new(db.clone()),
            alerts: AlertService::new(db),
        }
    }
}

#[async_trait]
impl ScanRepository for PgScanRepository {
    async fn save_report(&self, report: NewAnalysisReport) -> AppResult<AnalysisReport> {
        self.reports.insert(report).await
    }

    async fn save_alert(&self, alert: NewAlert) -> AppResult<Alert> {
        self.alerts.create(alert).await
    }
}

/// A file received from the client
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Result of a single successful detection run
#[derive(Debug, Serialize)]
pub struct DetectionOutcome {
    pub report: AnalysisReport,
    pub detection: NormalizedDetection,
    pub alert_raised: bool,
}

/// An item that stopped short of `Done`
#[derive(Debug, Error)]
#[error("scan failed at {failed_at:?}: {error}")]
pub struct ScanFailure {
    /// Last state the item reached before the error
    pub failed_at: ScanState,
    #[source]
    pub error: AppError,
}

impl ScanFailure {
    fn record(state: &mut ScanState, error: AppError) -> Self {
        let failed_at = *state;
        if failed_at != ScanState::Selected {
            if let Ok(failed) = failed_at.fail() {
                *state = failed;
            }
        }
        Self { failed_at, error }
    }
}

pub struct ScanPipeline {
    store: Arc<dyn ObjectStore>,
    detector: Arc<dyn DetectionApi>,
    repository: Arc<dyn ScanRepository>,
}

impl ScanPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        detector: Arc<dyn DetectionApi>,
        repository: Arc<dyn ScanRepository>,
    ) -> Self {
        Self {
            store,
            detector,
            repository,
        }
    }

    /// Run detection for media that is already in storage
    pub async fn analyze(
        &self,
        farm_id: Uuid,
        image_url: &str,
        scan_type: ScanType,
    ) -> AppResult<DetectionOutcome> {
        let mut state = ScanState::Uploaded;
        self.detect_and_record(farm_id, image_url, scan_type, &mut state)
            .await
            .map_err(|error| {
                let failure = ScanFailure::record(&mut state, error);
                tracing::error!(
                    %farm_id,
                    failed_at = ?failure.failed_at,
                    error = %failure.error,
                    "Detection run failed"
                );
                failure.error
            })
    }

    /// Upload and analyze every file in order
    pub async fn process_batch(
        &self,
        farm_id: Uuid,
        files: Vec<UploadedFile>,
        scan_type: ScanType,
        policy: BatchPolicy,
    ) -> BatchReport {
        let names: Vec<String> = files.iter().map(|f| f.file_name.clone()).collect();
        let mut outcomes = Vec::with_capacity(files.len());

        for (idx, file) in files.into_iter().enumerate() {
            let file_name = file.file_name.clone();
            let mut state = ScanState::Selected;

            match self.process_item(farm_id, file, scan_type, &mut state).await {
                Ok(outcome) => outcomes.push(ScanOutcome::Completed {
                    file_name,
                    report_id: outcome.report.id,
                    infestation_level: outcome.report.infestation_level,
                    alert_raised: outcome.alert_raised,
                }),
                Err(ScanFailure { failed_at, error }) => {
                    tracing::error!(
                        %farm_id,
                        file_name = %file_name,
                        ?failed_at,
                        error = %error,
                        "Scan item failed"
                    );
                    outcomes.push(ScanOutcome::Failed {
                        file_name,
                        failed_at,
                        error: error.public_message(),
                    });

                    if policy == BatchPolicy::AbortOnFirstError {
                        outcomes.extend(
                            names[idx + 1..]
                                .iter()
                                .cloned()
                                .map(|file_name| ScanOutcome::Skipped { file_name }),
                        );
                        break;
                    }
                }
            }
        }

        BatchReport { outcomes }
    }

    /// Upload one file and run it through detection.
    ///
    /// `state` ends at `Done`, or at `Failed` once the item has left
    /// `Selected`. A file rejected before upload stays `Selected`.
    pub async fn process_item(
        &self,
        farm_id: Uuid,
        file: UploadedFile,
        scan_type: ScanType,
        state: &mut ScanState,
    ) -> Result<DetectionOutcome, ScanFailure> {
        self.run_item(farm_id, file, scan_type, state)
            .await
            .map_err(|error| ScanFailure::record(state, error))
    }

    async fn run_item(
        &self,
        farm_id: Uuid,
        file: UploadedFile,
        scan_type: ScanType,
        state: &mut ScanState,
    ) -> AppResult<DetectionOutcome> {
        if file.bytes.is_empty() {
            return Err(AppError::ValidationError("No file selected".to_string()));
        }
        let ext = validate_upload_file_name(&file.file_name)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        *state = state.advance()?;
        let image_url = self.store_media(&ext, file.bytes).await?;
        *state = state.advance()?;

        self.detect_and_record(farm_id, &image_url, scan_type, state)
            .await
    }

    /// Write media under a fresh key and return its public URL
    async fn store_media(&self, ext: &str, bytes: Vec<u8>) -> AppResult<String> {
        let key = format!("{}.{}", Uuid::new_v4(), ext);
        let media = mime_type_for_path(&key);
        self.store.upload(&key, bytes, media.mime_type).await?;
        Ok(self.store.public_url(&key))
    }

    async fn detect_and_record(
        &self,
        farm_id: Uuid,
        image_url: &str,
        scan_type: ScanType,
        state: &mut ScanState,
    ) -> AppResult<DetectionOutcome> {
        *state = state.advance()?;

        let key = storage_key_from_url(image_url)
            .ok_or_else(|| AppError::ValidationError("Invalid image URL format".to_string()))?;
        let bytes = self.store.download(key).await?;
        let media = mime_type_for_path(key);
        tracing::info!(%farm_id, %scan_type, mime_type = media.mime_type, "Running pest detection");

        let raw = self.detector.detect(bytes, media).await?;
        let detection = raw.normalize();
        *state = state.advance()?;

        let report = self
            .repository
            .save_report(NewAnalysisReport {
                farm_id,
                scan_type,
                media_type: detection.media_type,
                image_url: image_url.to_string(),
                analyzed_media: detection.analyzed_media.clone(),
                infestation_level: detection.infestation_level,
                confidence_score: detection.confidence_score,
                pest_types: detection.pest_types.clone(),
                bounding_boxes: detection.bounding_boxes.clone(),
            })
            .await
            .map_err(|err| {
                tracing::error!(%farm_id, error = %err, "Failed to save analysis report");
                AppError::Persistence("Failed to save analysis report".to_string())
            })?;
        *state = state.advance()?;

        let alert_raised = self.raise_alert(&report).await;
        *state = state.advance()?;

        tracing::info!(
            %farm_id,
            report_id = %report.id,
            level = %report.infestation_level,
            alert_raised,
            "Scan analyzed"
        );
        *state = state.advance()?;

        Ok(DetectionOutcome {
            report,
            detection,
            alert_raised,
        })
    }

    /// Best-effort and at most once. Failures are logged, never returned.
    async fn raise_alert(&self, report: &AnalysisReport) -> bool {
        let Some(alert) = NewAlert::for_analysis(
            report.farm_id,
            report.infestation_level,
            &report.pest_types,
            report.confidence_score,
        ) else {
            return false;
        };

        match self.repository.save_alert(alert).await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(
                    farm_id = %report.farm_id,
                    report_id = %report.id,
                    error = %err,
                    "Failed to create pest alert"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;
    use shared::{AlertSeverity, InfestationLevel, MediaFile, RawDetectionResponse};
    use tokio_test::{assert_err, assert_ok};

    const BASE: &str = "https://store.test/storage/v1/object/public/crop-scans";

    #[derive(Default)]
    struct FakeStore {
        objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
        upload_calls: Mutex<usize>,
        fail_upload_call: Option<usize>,
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<()> {
            let call = {
                let mut calls = self.upload_calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if self.fail_upload_call == Some(call) {
                return Err(AppError::StorageError("bucket unavailable".into()));
            }
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), (bytes, content_type.to_string()));
            Ok(())
        }

        async fn download(&self, key: &str) -> AppResult<Vec<u8>> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .map(|(bytes, _)| bytes.clone())
                .ok_or_else(|| AppError::StorageError("Failed to download image".into()))
        }

        fn public_url(&self, key: &str) -> String {
            format!("{}/{}", BASE, key)
        }
    }

    struct FakeDetector {
        response: RawDetectionResponse,
        calls: Mutex<Vec<MediaFile>>,
        fail: bool,
    }

    impl FakeDetector {
        fn counting(count: u32) -> Self {
            Self {
                response: RawDetectionResponse {
                    detections_count: Some(count),
                    media_type: Some("image".into()),
                    ..Default::default()
                },
                calls: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl DetectionApi for FakeDetector {
        async fn detect(&self, _bytes: Vec<u8>, media: MediaFile) -> AppResult<RawDetectionResponse> {
            self.calls.lock().unwrap().push(media);
            if self.fail {
                return Err(AppError::AiDetectionError("model offline".into()));
            }
            Ok(self.response.clone())
        }
    }

    #[derive(Default)]
    struct FakeRepository {
        reports: Mutex<Vec<AnalysisReport>>,
        alerts: Mutex<Vec<NewAlert>>,
        fail_reports: bool,
        fail_alerts: bool,
    }

    #[async_trait]
    impl ScanRepository for FakeRepository {
        async fn save_report(&self, report: NewAnalysisReport) -> AppResult<AnalysisReport> {
            if self.fail_reports {
                return Err(AppError::Internal("connection reset".into()));
            }
            let saved = AnalysisReport {
                id: Uuid::new_v4(),
                farm_id: report.farm_id,
                scan_type: report.scan_type,
                media_type: report.media_type,
                image_url: report.image_url,
                analyzed_media: report.analyzed_media,
                infestation_level: report.infestation_level,
                confidence_score: report.confidence_score,
                pest_types: report.pest_types,
                bounding_boxes: report.bounding_boxes,
                analyzed_at: Utc::now(),
            };
            self.reports.lock().unwrap().push(saved.clone());
            Ok(saved)
        }

        async fn save_alert(&self, alert: NewAlert) -> AppResult<Alert> {
            if self.fail_alerts {
                return Err(AppError::Internal("alerts table locked".into()));
            }
            self.alerts.lock().unwrap().push(alert.clone());
            Ok(Alert {
                id: Uuid::new_v4(),
                farm_id: alert.farm_id,
                alert_type: alert.alert_type,
                severity: alert.severity,
                message: alert.message,
                is_read: false,
                created_at: Utc::now(),
            })
        }
    }

    fn pipeline(
        store: Arc<FakeStore>,
        detector: Arc<FakeDetector>,
        repo: Arc<FakeRepository>,
    ) -> ScanPipeline {
        ScanPipeline::new(store, detector, repo)
    }

    fn jpeg(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
        }
    }

    #[tokio::test]
    async fn test_single_jpeg_end_to_end() {
        let store = Arc::new(FakeStore::default());
        let detector = Arc::new(FakeDetector::counting(7));
        let repo = Arc::new(FakeRepository::default());
        let pipeline = pipeline(store.clone(), detector.clone(), repo.clone());

        let farm_id = Uuid::new_v4();
        let mut state = ScanState::Selected;
        let outcome = assert_ok!(
            pipeline
                .process_item(farm_id, jpeg("leaf.jpg"), ScanType::SpotCheck, &mut state)
                .await
        );

        assert_eq!(state, ScanState::Done);
        assert_eq!(outcome.report.infestation_level, InfestationLevel::High);
        assert!((outcome.report.confidence_score - 0.85).abs() < 1e-9);
        assert_eq!(outcome.report.pest_types, vec!["Fall Armyworm".to_string()]);
        assert!(outcome.report.image_url.starts_with(BASE));
        assert!(outcome.alert_raised);

        let alerts = repo.alerts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert_eq!(alerts[0].farm_id, farm_id);

        let objects = store.objects.lock().unwrap();
        let (_, content_type) = objects.values().next().unwrap();
        assert_eq!(content_type, "image/jpeg");
        assert_eq!(detector.calls.lock().unwrap()[0].file_name, "file.jpg");
    }

    #[tokio::test]
    async fn test_batch_aborts_on_first_error() {
        let store = Arc::new(FakeStore {
            fail_upload_call: Some(2),
            ..Default::default()
        });
        let detector = Arc::new(FakeDetector::counting(1));
        let repo = Arc::new(FakeRepository::default());
        let pipeline = pipeline(store, detector.clone(), repo.clone());

        let report = pipeline
            .process_batch(
                Uuid::new_v4(),
                vec![jpeg("a.jpg"), jpeg("b.jpg"), jpeg("c.jpg")],
                ScanType::DroneFlight,
                BatchPolicy::AbortOnFirstError,
            )
            .await;

        assert_eq!(report.outcomes.len(), 3);
        assert!(report.outcomes[0].is_completed());
        assert_eq!(
            report.outcomes[1],
            ScanOutcome::Failed {
                file_name: "b.jpg".into(),
                failed_at: ScanState::Uploading,
                error: "Storage error: bucket unavailable".into(),
            }
        );
        assert_eq!(
            report.outcomes[2],
            ScanOutcome::Skipped {
                file_name: "c.jpg".into()
            }
        );
        assert_eq!(repo.reports.lock().unwrap().len(), 1);
        assert_eq!(detector.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_batch_continue_on_error_attempts_every_item() {
        let store = Arc::new(FakeStore {
            fail_upload_call: Some(2),
            ..Default::default()
        });
        let repo = Arc::new(FakeRepository::default());
        let pipeline = pipeline(store, Arc::new(FakeDetector::counting(3)), repo.clone());

        let report = pipeline
            .process_batch(
                Uuid::new_v4(),
                vec![jpeg("a.jpg"), jpeg("b.jpg"), jpeg("c.jpg")],
                ScanType::SpotCheck,
                BatchPolicy::ContinueOnError,
            )
            .await;

        assert_eq!(report.completed(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(repo.reports.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_url_is_rejected_before_detection() {
        let detector = Arc::new(FakeDetector::counting(3));
        let pipeline = pipeline(
            Arc::new(FakeStore::default()),
            detector.clone(),
            Arc::new(FakeRepository::default()),
        );

        let err = assert_err!(
            pipeline
                .analyze(Uuid::new_v4(), "https://elsewhere.test/leaf.jpg", ScanType::SpotCheck)
                .await
        );

        assert!(matches!(err, AppError::ValidationError(ref m) if m == "Invalid image URL format"));
        assert!(detector.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_alert_failure_does_not_fail_the_item() {
        let repo = Arc::new(FakeRepository {
            fail_alerts: true,
            ..Default::default()
        });
        let pipeline = pipeline(
            Arc::new(FakeStore::default()),
            Arc::new(FakeDetector::counting(12)),
            repo.clone(),
        );

        let mut state = ScanState::Selected;
        let outcome = pipeline
            .process_item(Uuid::new_v4(), jpeg("a.jpg"), ScanType::LiveScan, &mut state)
            .await
            .unwrap();

        assert_eq!(outcome.report.infestation_level, InfestationLevel::Critical);
        assert!(!outcome.alert_raised);
        assert_eq!(repo.reports.lock().unwrap().len(), 1);
        assert_eq!(state, ScanState::Done);
    }

    #[tokio::test]
    async fn test_moderate_infestation_raises_no_alert() {
        let repo = Arc::new(FakeRepository::default());
        let pipeline = pipeline(
            Arc::new(FakeStore::default()),
            Arc::new(FakeDetector::counting(3)),
            repo.clone(),
        );

        let mut state = ScanState::Selected;
        let outcome = pipeline
            .process_item(Uuid::new_v4(), jpeg("a.png"), ScanType::SpotCheck, &mut state)
            .await
            .unwrap();

        assert_eq!(outcome.report.infestation_level, InfestationLevel::Moderate);
        assert!(!outcome.alert_raised);
        assert!(repo.alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_save_failure_aborts_item() {
        let repo = Arc::new(FakeRepository {
            fail_reports: true,
            ..Default::default()
        });
        let pipeline = pipeline(
            Arc::new(FakeStore::default()),
            Arc::new(FakeDetector::counting(5)),
            repo.clone(),
        );

        let mut state = ScanState::Selected;
        let err = pipeline
            .process_item(Uuid::new_v4(), jpeg("a.jpg"), ScanType::SpotCheck, &mut state)
            .await
            .unwrap_err();

        assert_eq!(err.error.public_message(), "Failed to save analysis report");
        assert_eq!(err.failed_at, ScanState::Classified);
        assert_eq!(state, ScanState::Failed);
        assert!(repo.alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detection_failure_is_surfaced_verbatim() {
        let detector = Arc::new(FakeDetector {
            fail: true,
            ..FakeDetector::counting(0)
        });
        let pipeline = pipeline(
            Arc::new(FakeStore::default()),
            detector,
            Arc::new(FakeRepository::default()),
        );

        let mut state = ScanState::Selected;
        let err = pipeline
            .process_item(Uuid::new_v4(), jpeg("clip.mp4"), ScanType::DroneFlight, &mut state)
            .await
            .unwrap_err();

        assert_eq!(err.error.public_message(), "AI detection failed: model offline");
        assert_eq!(err.failed_at, ScanState::Detecting);
        assert_eq!(state, ScanState::Failed);
    }

    #[tokio::test]
    async fn test_unsupported_file_stays_selected() {
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(
            store.clone(),
            Arc::new(FakeDetector::counting(0)),
            Arc::new(FakeRepository::default()),
        );

        let mut state = ScanState::Selected;
        let result = pipeline
            .process_item(
                Uuid::new_v4(),
                UploadedFile {
                    file_name: "notes.txt".into(),
                    bytes: b"hello".to_vec(),
                },
                ScanType::SpotCheck,
                &mut state,
            )
            .await;

        let failure = result.unwrap_err();
        assert!(matches!(failure.error, AppError::ValidationError(_)));
        assert_eq!(failure.failed_at, ScanState::Selected);
        assert_eq!(state, ScanState::Selected);
        assert_eq!(*store.upload_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upload_failure_moves_item_to_failed() {
        let store = Arc::new(FakeStore {
            fail_upload_call: Some(1),
            ..Default::default()
        });
        let detector = Arc::new(FakeDetector::counting(2));
        let pipeline = pipeline(store, detector.clone(), Arc::new(FakeRepository::default()));

        let mut state = ScanState::Selected;
        let failure = assert_err!(
            pipeline
                .process_item(Uuid::new_v4(), jpeg("leaf.jpg"), ScanType::SpotCheck, &mut state)
                .await
        );

        assert_eq!(state, ScanState::Failed);
        assert_eq!(failure.failed_at, ScanState::Uploading);
        assert!(matches!(failure.error, AppError::StorageError(_)));
        assert!(state.is_terminal());
        assert!(detector.calls.lock().unwrap().is_empty());
    }
}
