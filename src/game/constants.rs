/// Wheel geometry - faces are read through FACE_ORDER, never from the raw angle
pub mod wheel {
    /// Number of sectors on the wheel
    pub const SECTOR_COUNT: usize = 12;
    /// Width of one sector in degrees
    pub const SECTOR_WIDTH: f64 = 360.0 / SECTOR_COUNT as f64;
    /// The pointer sits on a sector boundary, half a sector off centre
    pub const POINTER_OFFSET: f64 = 15.0;
    /// Face values in physical order, counter-clockwise from the pointer
    pub const FACE_ORDER: [u8; SECTOR_COUNT] = [4, 5, 6, 1, 2, 3, 4, 5, 6, 1, 2, 3];
    /// Minimum number of full turns added to every spin
    pub const MIN_FULL_TURNS: u32 = 5;
    /// Face that unlocks a chance card
    pub const CHANCE_FACE: u8 = 6;
}

/// Spin animation timing
pub mod animation {
    use std::time::Duration;

    /// Visual rotation length
    pub const DURATION: Duration = Duration::from_millis(4000);
    /// Frame period (~60 fps)
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);
    /// CSS `cubic-bezier(0.440, -0.205, 0.000, 1.130)` control points
    pub const EASING: (f64, f64, f64, f64) = (0.44, -0.205, 0.0, 1.13);
}

/// Location gate
pub mod location {
    use std::time::Duration;

    /// Poll period for device location
    pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
    /// Per-axis threshold in decimal degrees (a multi-kilometre box, not a geofence)
    pub const THRESHOLD_DEGREES: f64 = 0.1;
}

/// Scoring
pub mod score {
    /// Points for a task when the deck had nothing for the square
    pub const DEFAULT_TASK_POINTS: i64 = 10;
}
