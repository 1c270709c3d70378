/*!
 * Core Types
 * Common types used across the kernel
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Discrete simulation step
pub type Tick = u64;

/// Stable unique process key
///
/// Cheap to clone: the queue snapshot, the registry and the lifecycle
/// events all hold the same allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(Arc<str>);

impl ProcessId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProcessId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProcessId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl AsRef<str> for ProcessId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for ProcessId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Process priority (higher runs first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Priority {
    Idle = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
        Priority::Idle,
    ];
}

/// Frequency class selecting default interval, budget and reserve threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrequencyClass {
    High,
    Medium,
    Low,
}

impl FrequencyClass {
    pub const ALL: [FrequencyClass; 3] = [
        FrequencyClass::High,
        FrequencyClass::Medium,
        FrequencyClass::Low,
    ];

    /// Stable index into per-class tables
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            FrequencyClass::High => 0,
            FrequencyClass::Medium => 1,
            FrequencyClass::Low => 2,
        }
    }
}

/// Process lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessState {
    Idle,
    Running,
    Suspended,
    /// Transient; resolved to `Idle` or `Suspended` before execution returns
    Error,
}

/// Point at which a suspension ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspendedUntil {
    Tick(Tick),
    Forever,
}

impl SuspendedUntil {
    /// Whether the suspension has run out at `now`
    #[inline]
    pub fn expired(self, now: Tick) -> bool {
        match self {
            SuspendedUntil::Tick(until) => now >= until,
            SuspendedUntil::Forever => false,
        }
    }

    pub fn is_forever(self) -> bool {
        matches!(self, SuspendedUntil::Forever)
    }
}

/// Why a process was suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspensionReason {
    /// Temporary backoff after repeated failures
    ConsecutiveErrors,
    /// Failure ceiling reached; never auto-resumes
    CircuitBreaker,
    /// Operator request
    Manual,
}

impl fmt::Display for SuspensionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SuspensionReason::ConsecutiveErrors => "consecutive errors",
            SuspensionReason::CircuitBreaker => "circuit breaker",
            SuspensionReason::Manual => "manual",
        };
        f.write_str(s)
    }
}
