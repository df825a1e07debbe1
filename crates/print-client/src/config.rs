//! Configuration types for the print client.

use std::time::Duration;

use zpl_labels_core::GeometrySpec;
use zpl_labels_profile::{Profile, ProfileError};

/// Default path of the gateway's batch print endpoint.
pub const DEFAULT_BATCH_PATH: &str = "/print-batch";

/// Default path of the gateway's printer status endpoint.
pub const DEFAULT_STATUS_PATH: &str = "/printer/status";

/// Print gateway endpoint configuration.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway base URL, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Path of the batch print endpoint.
    pub batch_path: String,
    /// Path of the printer status endpoint.
    pub status_path: String,
    /// Network timeout settings.
    pub timeouts: GatewayTimeouts,
    /// Retry settings for transient failures.
    pub retry: RetryConfig,
}

impl GatewayConfig {
    /// Configuration for the gateway at `base_url` with default paths,
    /// timeouts and retry policy.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            batch_path: DEFAULT_BATCH_PATH.to_string(),
            status_path: DEFAULT_STATUS_PATH.to_string(),
            timeouts: GatewayTimeouts::default(),
            retry: RetryConfig::default(),
        }
    }

    /// Full URL of the batch print endpoint.
    pub fn batch_url(&self) -> String {
        join_url(&self.base_url, &self.batch_path)
    }

    /// Full URL of the printer status endpoint.
    pub fn status_url(&self) -> String {
        join_url(&self.base_url, &self.status_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Timeout settings for gateway requests.
///
/// A batch request covers the gateway driving the printer for every label,
/// so `request` is generous.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct GatewayTimeouts {
    /// Maximum time to establish the TCP/TLS connection.
    pub connect: Duration,
    /// Maximum time for a complete request/response exchange.
    pub request: Duration,
}

impl Default for GatewayTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            request: Duration::from_secs(60),
        }
    }
}

/// Retry settings for transient failures.
///
/// Uses exponential backoff with optional jitter. Only errors where
/// `DispatchError::is_retryable()` returns `true` are retried.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Whether to add random jitter to retry delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Print orchestrator settings.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Target printer resolution in dots per inch.
    pub dpi: u32,
    /// Label layout to encode with.
    pub geometry: GeometrySpec,
    /// How long a success or partial-success status stays displayed.
    pub success_display: Duration,
    /// How long a failure status stays displayed.
    pub failure_display: Duration,
    /// Largest batch accepted in one print request.
    pub max_batch_size: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            dpi: 203,
            geometry: GeometrySpec::standard(),
            success_display: Duration::from_secs(3),
            failure_display: Duration::from_secs(5),
            max_batch_size: 5000,
        }
    }
}

impl OrchestratorConfig {
    /// Use `geometry` for encoding.
    pub fn with_geometry(mut self, geometry: GeometrySpec) -> Self {
        self.geometry = geometry;
        self
    }

    /// Apply a printer profile: resolution and darkness override.
    ///
    /// Fails when the current geometry does not fit the profile's printhead.
    pub fn with_profile(mut self, profile: &Profile) -> Result<Self, ProfileError> {
        profile.check_fit(
            self.geometry.width_dots(profile.dpi),
            self.geometry.height_dots(profile.dpi),
        )?;
        self.dpi = profile.dpi;
        if let Some(darkness) = profile.darkness {
            self.geometry = self.geometry.with_darkness(darkness);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zpl_labels_profile::Page;

    #[test]
    fn urls_join_cleanly() {
        let c = GatewayConfig::new("http://gw:8000/");
        assert_eq!(c.batch_url(), "http://gw:8000/print-batch");
        assert_eq!(c.status_url(), "http://gw:8000/printer/status");
        let mut c = GatewayConfig::new("http://gw/api");
        c.batch_path = "jobs".into();
        assert_eq!(c.batch_url(), "http://gw/api/jobs");
    }

    #[test]
    fn orchestrator_defaults() {
        let c = OrchestratorConfig::default();
        assert_eq!(c.dpi, 203);
        assert_eq!(c.geometry.name, "standard");
        assert_eq!(c.success_display, Duration::from_secs(3));
        assert_eq!(c.failure_display, Duration::from_secs(5));
        assert_eq!(c.max_batch_size, 5000);
    }

    #[test]
    fn profile_sets_dpi_and_darkness() {
        let mut profile = Profile::for_dpi(300);
        profile.darkness = Some(25);
        let c = OrchestratorConfig::default().with_profile(&profile).unwrap();
        assert_eq!(c.dpi, 300);
        assert_eq!(c.geometry.darkness, 25);
    }

    #[test]
    fn profile_rejects_oversized_geometry() {
        let mut profile = Profile::for_dpi(203);
        profile.page = Some(Page {
            width_dots: Some(400),
            height_dots: None,
        });
        assert!(matches!(
            OrchestratorConfig::default().with_profile(&profile),
            Err(ProfileError::LabelTooLarge { width_dots: 679, .. })
        ));
    }
}
