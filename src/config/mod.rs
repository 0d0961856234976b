use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Bucket holding single-image uploads
pub const SINGLE_IMAGE_BUCKET: &str = "single-image-bucket";

/// Bucket holding grouped (multi-image) uploads
pub const MULTIPLE_IMAGE_BUCKET: &str = "multiple-image-bucket";

/// Region used when creating buckets
pub const BUCKET_REGION: &str = "us-east-1";

/// Validity of every presigned GET URL handed out
pub const PRESIGNED_URL_TTL_SECS: u64 = 3600;

/// Maximum number of file parts accepted by `/upload-multiple`
pub const MAX_FILES_PER_GROUP: usize = 10;

/// What startup does when bucket provisioning fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProvisioningPolicy {
    /// Log the failure and keep serving
    #[default]
    BestEffort,
    /// Abort startup
    FailFast,
}

impl FromStr for ProvisioningPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "best-effort" | "best_effort" | "besteffort" => Ok(Self::BestEffort),
            "fail-fast" | "fail_fast" | "failfast" => Ok(Self::FailFast),
            other => Err(format!("unknown provisioning policy '{}'", other)),
        }
    }
}

/// Gateway configuration, read from the environment
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listen port (default: 3001)
    pub port: u16,

    /// Object store host (default: "localhost")
    pub store_host: String,

    /// Object store port (default: 9000)
    pub store_port: u16,

    /// Use https for the object store connection (default: false)
    pub store_use_ssl: bool,

    pub store_access_key: String,
    pub store_secret_key: String,

    /// Local staging directory for incoming uploads (default: "uploads")
    pub staging_dir: PathBuf,

    /// Request body limit for upload routes in bytes (default: 256 MB)
    pub max_body_size: usize,

    /// Startup bucket provisioning policy (default: best-effort)
    pub provisioning_policy: ProvisioningPolicy,

    /// Remove staging leftovers older than this many hours. Disabled when unset.
    pub staging_cleanup_age_hours: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            store_host: "localhost".to_string(),
            store_port: 9000,
            store_use_ssl: false,
            store_access_key: String::new(),
            store_secret_key: String::new(),
            staging_dir: PathBuf::from("uploads"),
            max_body_size: 256 * 1024 * 1024, // 256 MB
            provisioning_policy: ProvisioningPolicy::BestEffort,
            staging_cleanup_age_hours: None,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            store_host: env::var("MINIO_ENDPOINT")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(default.store_host),

            store_port: env::var("MINIO_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.store_port),

            store_use_ssl: env::var("MINIO_USE_SSL")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.store_use_ssl),

            store_access_key: env::var("MINIO_ACCESS_KEY").unwrap_or(default.store_access_key),
            store_secret_key: env::var("MINIO_SECRET_KEY").unwrap_or(default.store_secret_key),

            staging_dir: env::var("STAGING_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.staging_dir),

            max_body_size: env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_body_size),

            provisioning_policy: env::var("BUCKET_PROVISIONING")
                .ok()
                .and_then(|v| match v.parse() {
                    Ok(policy) => Some(policy),
                    Err(e) => {
                        tracing::warn!("{}, falling back to best-effort", e);
                        None
                    }
                })
                .unwrap_or(default.provisioning_policy),

            staging_cleanup_age_hours: env::var("STAGING_CLEANUP_AGE_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|hours| *hours > 0),
        }
    }

    /// Endpoint URL of the object store, e.g. `http://localhost:9000`
    pub fn store_endpoint_url(&self) -> String {
        let scheme = if self.store_use_ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.store_host, self.store_port)
    }

    /// Config for tests: staging in the given directory, everything else default
    pub fn with_staging_dir(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            ..Self::default()
        }
    }
}
