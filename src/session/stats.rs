use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::controller::RecordingState;

/// Statistics about a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Current lifecycle phase
    pub state: RecordingState,

    /// When the current or most recent recording started
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds since the recording started
    pub duration_secs: f64,

    /// Number of audio chunks buffered so far
    pub chunks_buffered: usize,
}
