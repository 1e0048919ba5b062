//! Admission window evaluator
//!
//! Decides, from the current time, whether new orders may be accepted.
//! Windows are half-open `[start, end)` minute-of-day ranges during
//! which ordering is disabled. The time comes from a remote source
//! with a bounded timeout; on any failure the local device clock is
//! used instead — a skewed clock may evaluate the wrong window, but a
//! dead time service never blocks checkout. Evaluated fresh on every
//! checkout attempt.

use chrono::{DateTime, Local, Timelike};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

/// A minute-of-day interval during which ordering is disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisabledWindow {
    /// Inclusive start, minutes since local midnight
    pub start_min: u32,
    /// Exclusive end
    pub end_min: u32,
}

impl DisabledWindow {
    pub fn contains(&self, minute_of_day: u32) -> bool {
        minute_of_day >= self.start_min && minute_of_day < self.end_min
    }
}

/// The configured set of disabled windows
#[derive(Debug, Clone)]
pub struct AdmissionSchedule {
    windows: Vec<DisabledWindow>,
}

impl AdmissionSchedule {
    pub fn new(windows: Vec<DisabledWindow>) -> Self {
        Self { windows }
    }

    /// The canteen's stock schedule: restock break 10:00-10:30,
    /// kitchen closed 12:30-16:00
    pub fn default_windows() -> Self {
        Self::new(vec![
            DisabledWindow {
                start_min: 600,
                end_min: 630,
            },
            DisabledWindow {
                start_min: 750,
                end_min: 960,
            },
        ])
    }

    /// Parse a window spec like `"600-630,750-960"`
    ///
    /// Returns `None` for malformed specs or inverted ranges.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut windows = Vec::new();
        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (start, end) = part.split_once('-')?;
            let start: u32 = start.trim().parse().ok()?;
            let end: u32 = end.trim().parse().ok()?;
            if start >= end || end > 1440 {
                return None;
            }
            windows.push(DisabledWindow {
                start_min: start,
                end_min: end,
            });
        }
        Some(Self::new(windows))
    }

    /// False iff `now`'s minute-of-day falls inside any disabled window
    pub fn is_ordering_allowed(&self, now: DateTime<Local>) -> bool {
        let minute = now.hour() * 60 + now.minute();
        !self.windows.iter().any(|w| w.contains(minute))
    }
}

/// Remote time fetch errors (all of them trigger the local fallback)
#[derive(Debug, Error)]
pub enum TimeFetchError {
    #[error("Request timed out")]
    Timeout,

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed timestamp: {0}")]
    Parse(#[from] chrono::ParseError),
}

#[derive(Debug, Deserialize)]
struct TimeResponse {
    /// ISO-8601 timestamp, e.g. "2026-08-25T10:15:00+08:00"
    datetime: String,
}

/// Two-tier time source: remote service first, local clock on failure
///
/// Fallbacks are counted and logged so operators can see when the
/// admission check is running on device time.
pub struct TimeSource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    fallbacks: AtomicU64,
}

impl TimeSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
            fallbacks: AtomicU64::new(0),
        }
    }

    /// Current wall-clock time, falling back to the device clock
    pub async fn now(&self) -> DateTime<Local> {
        match self.fetch_remote().await {
            Ok(now) => now,
            Err(e) => {
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, "Remote time fetch failed, using local clock");
                Local::now()
            }
        }
    }

    /// How many times the local fallback has been taken
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    async fn fetch_remote(&self) -> Result<DateTime<Local>, TimeFetchError> {
        let response = tokio::time::timeout(self.timeout, self.client.get(&self.url).send())
            .await
            .map_err(|_| TimeFetchError::Timeout)??;
        let body: TimeResponse = response.error_for_status()?.json().await?;
        let parsed = DateTime::parse_from_rfc3339(&body.datetime)?;
        Ok(parsed.with_timezone(&Local))
    }
}
