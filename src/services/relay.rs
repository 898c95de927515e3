use crate::config::{PathMode, RelayConfig};
use crate::error::AppError;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::time;
use uuid::Uuid;

/// Filesystem layout for one upload/worker round-trip.
///
/// In scoped mode everything lives under a per-request token directory;
/// the worker recovers the token from the upload path it reads out of
/// the marker file. In fixed mode the paths match the original
/// single-slot layout and `token` is `None`.
#[derive(Debug, Clone)]
pub struct RelayJob {
    pub token: Option<Uuid>,
    pub upload_path: PathBuf,
    pub upload_marker: PathBuf,
    pub output_path: PathBuf,
    pub result_marker: PathBuf,
    pub download_name: String,
}

/// Drives the marker-file handshake with the external worker: persist
/// the upload, signal readiness, wait for the result marker, claim it.
pub struct RelayService {
    config: RelayConfig,
}

impl RelayService {
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    /// Compute all paths for one request. `filename` must already be
    /// sanitized.
    pub fn prepare(&self, filename: &str) -> RelayJob {
        let download_name = format!("{}{}", self.config.output_prefix, filename);

        match self.config.path_mode {
            PathMode::Scoped => {
                let token = Uuid::new_v4();
                let upload_dir = self.config.upload_dir.join(token.to_string());
                let output_dir = self.config.output_dir.join(token.to_string());
                RelayJob {
                    token: Some(token),
                    upload_path: upload_dir.join(filename),
                    upload_marker: upload_dir.join(&self.config.upload_marker_name),
                    output_path: output_dir.join(&download_name),
                    result_marker: output_dir.join(&self.config.result_marker_name),
                    download_name,
                }
            }
            PathMode::Fixed => RelayJob {
                token: None,
                upload_path: self.config.upload_dir.join(filename),
                upload_marker: self.config.upload_dir.join(&self.config.upload_marker_name),
                output_path: self.config.output_dir.join(&download_name),
                result_marker: self.config.output_dir.join(&self.config.result_marker_name),
                download_name,
            },
        }
    }

    /// Persist the uploaded bytes at the job's upload path. Failure maps
    /// to the legacy upload error naming the destination; no marker is
    /// written in that case.
    pub async fn store_upload(&self, job: &RelayJob, data: &[u8]) -> Result<(), AppError> {
        let write = async {
            if let Some(parent) = job.upload_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&job.upload_path, data).await
        };

        write.await.map_err(|e| {
            tracing::error!(
                "Failed to persist upload at {}: {}",
                job.upload_path.display(),
                e
            );
            AppError::UploadFailed {
                dest: job.upload_path.display().to_string(),
            }
        })
    }

    /// Write the upload-ready marker. Its entire content is the upload
    /// path string; that is the only channel the worker reads.
    pub async fn signal_ready(&self, job: &RelayJob) -> Result<(), AppError> {
        tokio::fs::write(&job.upload_marker, job.upload_path.display().to_string())
            .await
            .map_err(|e| {
                AppError::Internal(format!(
                    "Failed to write upload marker {}: {}",
                    job.upload_marker.display(),
                    e
                ))
            })
    }

    /// Block (asynchronously) until the worker creates the result marker,
    /// then claim it. Bounded by the configured wait timeout; after the
    /// marker appears, the configured grace delay elapses before it is
    /// removed and the output is touched.
    pub async fn await_result(&self, job: &RelayJob) -> Result<(), AppError> {
        let poll = async {
            loop {
                if tokio::fs::try_exists(&job.result_marker)
                    .await
                    .unwrap_or(false)
                {
                    return;
                }
                time::sleep(self.config.poll_interval).await;
            }
        };

        time::timeout(self.config.wait_timeout, poll)
            .await
            .map_err(|_| {
                tracing::warn!(
                    "Worker did not produce {} within {:?}",
                    job.result_marker.display(),
                    self.config.wait_timeout
                );
                AppError::WorkerTimeout
            })?;

        if !self.config.grace_delay.is_zero() {
            time::sleep(self.config.grace_delay).await;
        }

        // Removal is idempotent: a marker already gone is not an error.
        match tokio::fs::remove_file(&job.result_marker).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!(
                "Failed to remove result marker {}: {}",
                job.result_marker.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;

    fn fixed_config(root: &Path) -> RelayConfig {
        RelayConfig {
            upload_dir: root.join("upload"),
            output_dir: root.join("output"),
            path_mode: PathMode::Fixed,
            poll_interval: Duration::from_millis(10),
            wait_timeout: Duration::from_secs(2),
            grace_delay: Duration::ZERO,
            ..RelayConfig::default()
        }
    }

    #[test]
    fn test_fixed_mode_uses_legacy_paths() {
        let config = fixed_config(Path::new("."));
        let service = RelayService::new(config);
        let job = service.prepare("cat.jpg");

        assert!(job.token.is_none());
        assert_eq!(job.upload_path, Path::new("./upload/cat.jpg"));
        assert_eq!(job.upload_marker, Path::new("./upload/image_ready"));
        assert_eq!(job.output_path, Path::new("./output/processed_cat.jpg"));
        assert_eq!(job.result_marker, Path::new("./output/result_ready"));
        assert_eq!(job.download_name, "processed_cat.jpg");
    }

    #[test]
    fn test_scoped_mode_isolates_requests() {
        let service = RelayService::new(RelayConfig::default());
        let a = service.prepare("cat.jpg");
        let b = service.prepare("cat.jpg");

        let token = a.token.expect("scoped jobs carry a token");
        assert!(a.upload_path.starts_with(format!("./upload/{token}")));
        assert!(a.result_marker.starts_with(format!("./output/{token}")));
        assert_ne!(a.upload_marker, b.upload_marker);
        assert_ne!(a.result_marker, b.result_marker);
        assert_eq!(a.download_name, "processed_cat.jpg");
    }

    #[tokio::test]
    async fn test_store_upload_then_signal_writes_marker_content() {
        let dir = tempfile::tempdir().unwrap();
        let service = RelayService::new(fixed_config(dir.path()));
        let job = service.prepare("cat.jpg");

        service.store_upload(&job, b"jpeg bytes").await.unwrap();
        service.signal_ready(&job).await.unwrap();

        let stored = tokio::fs::read(&job.upload_path).await.unwrap();
        assert_eq!(stored, b"jpeg bytes");

        let marker = tokio::fs::read_to_string(&job.upload_marker).await.unwrap();
        assert_eq!(marker, job.upload_path.display().to_string());
    }

    #[tokio::test]
    async fn test_await_result_claims_marker() {
        let dir = tempfile::tempdir().unwrap();
        let service = RelayService::new(fixed_config(dir.path()));
        let job = service.prepare("cat.jpg");

        tokio::fs::create_dir_all(job.result_marker.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&job.result_marker, "").await.unwrap();

        service.await_result(&job).await.unwrap();
        assert!(!job.result_marker.exists());

        // A second claim of the same (now absent) marker would also succeed,
        // so removal stays idempotent.
        tokio::fs::write(&job.result_marker, "").await.unwrap();
        service.await_result(&job).await.unwrap();
        assert!(!job.result_marker.exists());
    }

    #[tokio::test]
    async fn test_grace_delay_elapses_before_marker_claim() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixed_config(dir.path());
        config.grace_delay = Duration::from_millis(200);
        let service = RelayService::new(config);
        let job = service.prepare("cat.jpg");

        tokio::fs::create_dir_all(job.result_marker.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&job.result_marker, "").await.unwrap();

        let started = std::time::Instant::now();
        let marker = job.result_marker.clone();
        let job_for_wait = job.clone();
        let wait = tokio::spawn(async move { service.await_result(&job_for_wait).await });

        // Mid-grace the marker must still be on disk.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(marker.exists());

        wait.await.unwrap().unwrap();
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(!job.result_marker.exists());
    }

    #[tokio::test]
    async fn test_await_result_times_out_without_worker() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixed_config(dir.path());
        config.wait_timeout = Duration::from_millis(50);
        let service = RelayService::new(config);
        let job = service.prepare("cat.jpg");

        let err = service.await_result(&job).await.unwrap_err();
        assert!(matches!(err, AppError::WorkerTimeout));
    }
}
