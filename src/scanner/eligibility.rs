//! Size and age thresholds that decide whether a file enters the pipeline.

use std::time::{Duration, SystemTime};

/// Returns true iff `size >= min_size` and `now - modified >= min_age`.
///
/// A modification time later than `now` has a negative age and is never
/// old enough, whatever `min_age` is.
///
/// # Example
///
/// ```
/// use dupesweep::scanner::is_eligible;
/// use std::time::{Duration, SystemTime};
///
/// let now = SystemTime::now();
/// let two_days_ago = now - Duration::from_secs(2 * 86_400);
/// assert!(is_eligible(2048, two_days_ago, now, 1024, Duration::from_secs(86_400)));
/// assert!(!is_eligible(500, two_days_ago, now, 1024, Duration::from_secs(86_400)));
/// ```
#[must_use]
pub fn is_eligible(
    size: u64,
    modified: SystemTime,
    now: SystemTime,
    min_size: u64,
    min_age: Duration,
) -> bool {
    if size < min_size {
        return false;
    }
    match now.duration_since(modified) {
        Ok(age) => age >= min_age,
        Err(_) => false,
    }
}

/// Eligibility thresholds for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligibility {
    /// Minimum file size in bytes (inclusive)
    pub min_size: u64,
    /// Minimum time since last modification (inclusive)
    pub min_age: Duration,
}

impl Eligibility {
    #[must_use]
    pub fn new(min_size: u64, min_age: Duration) -> Self {
        Self { min_size, min_age }
    }

    /// Evaluate the thresholds against one file's metadata.
    #[must_use]
    pub fn is_eligible(&self, size: u64, modified: SystemTime, now: SystemTime) -> bool {
        is_eligible(size, modified, now, self.min_size, self.min_age)
    }
}

impl Default for Eligibility {
    fn default() -> Self {
        Self {
            min_size: 1024,
            min_age: Duration::from_secs(24 * 60 * 60),
        }
    }
}
