/*!
 * Lifecycle Events
 * Suspension and recovery notifications published to other subsystems
 */

use crate::core::types::{ProcessId, SuspensionReason, Tick};
use serde::{Deserialize, Serialize};

/// Process lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LifecycleEvent {
    #[serde(rename = "process.suspended")]
    Suspended {
        id: ProcessId,
        name: String,
        reason: SuspensionReason,
        consecutive_errors: u32,
        permanent: bool,
        /// Absent for permanent and manual suspensions
        resume_at: Option<Tick>,
        tick: Tick,
    },

    #[serde(rename = "process.recovered")]
    Recovered {
        id: ProcessId,
        name: String,
        previous_reason: Option<SuspensionReason>,
        consecutive_errors: u32,
        manual: bool,
        tick: Tick,
    },
}

impl LifecycleEvent {
    /// Event name as seen by subscribers
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Suspended { .. } => "process.suspended",
            LifecycleEvent::Recovered { .. } => "process.recovered",
        }
    }

    pub fn process_id(&self) -> &ProcessId {
        match self {
            LifecycleEvent::Suspended { id, .. } | LifecycleEvent::Recovered { id, .. } => id,
        }
    }

    pub fn is_permanent_suspension(&self) -> bool {
        matches!(self, LifecycleEvent::Suspended { permanent: true, .. })
    }
}
