use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Path layout for marker and output files.
///
/// `Scoped` puts every request under a generated token directory so
/// concurrent uploads cannot clobber each other's markers. `Fixed`
/// reproduces the single-slot layout legacy workers expect: one marker
/// path shared by all requests, one upload in flight at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMode {
    Scoped,
    Fixed,
}

impl PathMode {
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "fixed" | "legacy" => PathMode::Fixed,
            _ => PathMode::Scoped,
        }
    }
}

/// Relay configuration for the upload/worker handshake
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Directory uploads are persisted into (default: ./upload)
    pub upload_dir: PathBuf,

    /// Directory the worker deposits results into (default: ./output)
    pub output_dir: PathBuf,

    /// Marker filename signalling an upload is ready (default: image_ready)
    pub upload_marker_name: String,

    /// Marker filename the worker creates when done (default: result_ready)
    pub result_marker_name: String,

    /// Prefix the worker applies to its output filename (default: processed_)
    pub output_prefix: String,

    /// Maximum upload size in bytes (default: 10 MB)
    pub max_upload_size: usize,

    /// Upper bound on waiting for the worker (default: 300 s)
    pub wait_timeout: Duration,

    /// Interval between result-marker checks (default: 1 s)
    pub poll_interval: Duration,

    /// Delay between seeing the result marker and reading the output,
    /// for workers that do not rename their output into place atomically
    /// (default: 1 s; set to zero for workers that do)
    pub grace_delay: Duration,

    /// Marker/output path layout (default: scoped)
    pub path_mode: PathMode,

    /// Listen address (default: 127.0.0.1:3000)
    pub bind_addr: SocketAddr,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./upload"),
            output_dir: PathBuf::from("./output"),
            upload_marker_name: "image_ready".to_string(),
            result_marker_name: "result_ready".to_string(),
            output_prefix: "processed_".to_string(),
            max_upload_size: 10 * 1024 * 1024, // 10 MB
            wait_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(1),
            grace_delay: Duration::from_secs(1),
            path_mode: PathMode::Scoped,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl RelayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),

            output_dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.output_dir),

            upload_marker_name: env::var("UPLOAD_MARKER_NAME")
                .unwrap_or(default.upload_marker_name),

            result_marker_name: env::var("RESULT_MARKER_NAME")
                .unwrap_or(default.result_marker_name),

            output_prefix: env::var("OUTPUT_PREFIX").unwrap_or(default.output_prefix),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            wait_timeout: env::var("WAIT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.wait_timeout),

            poll_interval: env::var("POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default.poll_interval),

            grace_delay: env::var("GRACE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default.grace_delay),

            path_mode: env::var("PATH_MODE")
                .map(|v| PathMode::parse(&v))
                .unwrap_or(default.path_mode),

            bind_addr: env::var("BIND_ADDR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.bind_addr),
        }
    }

    /// Create config for development (fast polling, short worker timeout)
    pub fn development() -> Self {
        Self {
            wait_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
            grace_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.max_upload_size, 10 * 1024 * 1024);
        assert_eq!(config.wait_timeout, Duration::from_secs(300));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.path_mode, PathMode::Scoped);
        assert_eq!(config.output_prefix, "processed_");
    }

    #[test]
    fn test_development_config() {
        let config = RelayConfig::development();
        assert!(config.wait_timeout < Duration::from_secs(300));
        assert!(config.grace_delay.is_zero());
    }

    #[test]
    fn test_path_mode_parse() {
        assert_eq!(PathMode::parse("fixed"), PathMode::Fixed);
        assert_eq!(PathMode::parse("LEGACY"), PathMode::Fixed);
        assert_eq!(PathMode::parse("scoped"), PathMode::Scoped);
        assert_eq!(PathMode::parse("anything-else"), PathMode::Scoped);
    }
}
