//! Batch coordinator configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

/// Default cap on concurrently executing writes
pub const DEFAULT_MAX_IN_FLIGHT: usize = 32;

/// Batch coordinator configuration
///
/// # Example
///
/// ```
/// use payroll_batch::BatchConfig;
/// use std::time::Duration;
///
/// let config = BatchConfig::default()
///     .with_max_in_flight(8)
///     .with_op_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum writes executing at once; batches up to this size start all
    /// writes immediately
    pub max_in_flight: usize,

    /// Time limit for a single write (None = wait indefinitely)
    #[serde(default, with = "option_duration_millis")]
    pub op_timeout: Option<Duration>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            op_timeout: None,
        }
    }
}

impl BatchConfig {
    /// Create a new batch configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// One write at a time, in submission order
    pub fn sequential() -> Self {
        Self::default().with_max_in_flight(1)
    }

    /// Set maximum concurrency, clamped to `1..=Semaphore::MAX_PERMITS`
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = clamp_in_flight(max);
        self
    }

    /// Number of permits the coordinator hands out per batch
    ///
    /// `max_in_flight` is public and deserializable, so it is clamped again
    /// here before it reaches the semaphore.
    pub fn permits(&self) -> usize {
        clamp_in_flight(self.max_in_flight)
    }

    /// Set the per-write time limit
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = Some(timeout);
        self
    }
}

fn clamp_in_flight(max: usize) -> usize {
    max.clamp(1, Semaphore::MAX_PERMITS)
}

/// Serde support for Option<Duration> as milliseconds
mod option_duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.map(|d| d.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}
