//! Advisory dispatcher status, broadcast for display only.

use std::time::Duration;

/// What the dispatcher worker is doing right now.
///
/// ```text
/// Idle ──submit──▶ Processing{remaining}
///                    ├─ ceiling hit ──▶ Cooldown{wait} ──▶ Processing
///                    ├─ transient   ──▶ Retrying{..}   ──▶ Processing
///                    └─ gave up     ──▶ Failed{..}
/// queue drained ──▶ Idle
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DispatchStatus {
    #[default]
    Idle,
    /// A request is in transmission; `remaining` includes it.
    Processing { remaining: usize },
    /// Rate ceiling reached; dispatch resumes after `wait`.
    Cooldown { wait: Duration },
    /// Waiting `delay` before retry number `attempt`.
    Retrying { attempt: u32, delay: Duration },
    /// The last request settled with a failure marker.
    Failed { reason: String },
}

impl DispatchStatus {
    /// A short human-readable label suitable for a status line.
    pub fn label(&self) -> String {
        match self {
            DispatchStatus::Idle => "Ready".into(),
            DispatchStatus::Processing { remaining } if *remaining > 1 => {
                format!("Processing... ({remaining} queued)")
            }
            DispatchStatus::Processing { .. } => "Processing...".into(),
            DispatchStatus::Cooldown { .. } => "Rate limit reached. Please wait...".into(),
            DispatchStatus::Retrying { attempt, delay } => {
                format!("Retrying ({attempt}) in {:.1}s...", delay.as_secs_f32())
            }
            DispatchStatus::Failed { .. } => "Error processing request".into(),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            DispatchStatus::Processing { .. }
                | DispatchStatus::Cooldown { .. }
                | DispatchStatus::Retrying { .. }
        )
    }
}
