use serde::Serialize;

/// Counters the host can read for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavigationStatistics {
    /// Sampling level chosen by the most recently located height request.
    pub last_height_request_lod: Option<u8>,
    pub height_requests_resolved: u64,
    pub height_requests_abandoned: u64,
    /// Frames the front height request spent waiting for tiles.
    pub height_request_pending_frames: u64,
    pub invariant_corrections: u64,
}
