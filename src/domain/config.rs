//! Tunables for the coordination core.

/// Thresholds and windows used by the anomaly detector, trail manager, and
/// geofence monitor. Defaults match the reference behavior; binaries may
/// override individual values from CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct CoreConfig {
    /// Movement below this distance between samples counts as standing still
    pub movement_threshold_m: f64,
    /// Standing still longer than this triggers the stationary/SOS alert
    pub stationary_limit_ms: i64,
    /// Members with a sample newer than this take part in the group center
    pub activity_threshold_ms: i64,
    /// Trail entries older than this are pruned
    pub trail_window_ms: i64,
    /// Hard cap on trail length per member
    pub trail_max_points: usize,
    /// Stationary/SOS alerts auto-clear after this duration
    pub alert_duration_ms: i64,
    /// Server-side deviation broadcast threshold
    pub server_deviation_threshold_m: f64,
    /// Client-side marker styling threshold
    pub client_deviation_threshold_m: f64,
    /// Interval of the trail pruning sweep
    pub prune_interval_ms: u64,
    /// Default geofence radius
    pub geofence_radius_m: f64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            movement_threshold_m: 5.0,
            stationary_limit_ms: 5 * 60 * 1000,
            activity_threshold_ms: 30_000,
            trail_window_ms: 5 * 60 * 1000,
            trail_max_points: 100,
            alert_duration_ms: 30_000,
            server_deviation_threshold_m: 100.0,
            client_deviation_threshold_m: 150.0,
            prune_interval_ms: 60_000,
            geofence_radius_m: 300.0,
        }
    }
}
