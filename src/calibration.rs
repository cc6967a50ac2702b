use crate::protocol::ClientCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationPoint {
    pub observed_clock_time_ms: i64,
    pub wall_clock_ms: i64,
}

impl CalibrationPoint {
    pub fn new(observed_clock_time_ms: i64, wall_clock_ms: i64) -> Self {
        Self {
            observed_clock_time_ms,
            wall_clock_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationStats {
    pub delta_seek_ms: i64,
    pub delta_real_ms: i64,
    pub speed: f64,
}

impl CalibrationStats {
    pub fn command(&self) -> ClientCommand {
        ClientCommand::SetSpeedScale(self.speed)
    }
}

/// `None` unless both clock time and wall time strictly increase.
pub fn compute_speed(sync1: CalibrationPoint, sync2: CalibrationPoint) -> Option<CalibrationStats> {
    let delta_seek_ms = sync2.observed_clock_time_ms - sync1.observed_clock_time_ms;
    let delta_real_ms = sync2.wall_clock_ms - sync1.wall_clock_ms;
    if delta_seek_ms <= 0 || delta_real_ms <= 0 {
        return None;
    }
    Some(CalibrationStats {
        delta_seek_ms,
        delta_real_ms,
        speed: delta_seek_ms as f64 / delta_real_ms as f64,
    })
}

#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    sync1: Option<CalibrationPoint>,
    sync2: Option<CalibrationPoint>,
    stats: Option<CalibrationStats>,
}

impl Calibrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync1(&self) -> Option<CalibrationPoint> {
        self.sync1
    }

    pub fn sync2(&self) -> Option<CalibrationPoint> {
        self.sync2
    }

    pub fn stats(&self) -> Option<CalibrationStats> {
        self.stats
    }

    pub fn mark_sync1(&mut self, point: CalibrationPoint) {
        self.sync1 = Some(point);
        self.sync2 = None;
    }

    /// Offers a second point. Rejected candidates leave the calibrator
    /// untouched and return `None`.
    pub fn mark_sync2(&mut self, point: CalibrationPoint) -> Option<CalibrationStats> {
        let stats = compute_speed(self.sync1?, point)?;
        self.sync2 = Some(point);
        self.stats = Some(stats);
        tracing::debug!(
            delta_seek_ms = stats.delta_seek_ms,
            delta_real_ms = stats.delta_real_ms,
            speed = stats.speed,
            "calibration accepted"
        );
        Some(stats)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
