use serde::Serialize;

use crate::geo::{haversine_km, interpolate};
use crate::models::location::Coordinates;

pub const ROUTE_START: Coordinates = Coordinates {
    latitude: 27.7172,
    longitude: 85.3240,
};
pub const ROUTE_END: Coordinates = Coordinates {
    latitude: 27.7218,
    longitude: 85.3320,
};

const PROGRESS_PER_TICK: f64 = 0.005;
const TRIP_MINUTES: f64 = 15.0;

/// One frame of the simulated vehicle for the tracking view.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingFrame {
    pub order_id: String,
    pub tick: u64,
    pub progress: f64,
    pub position: Coordinates,
    pub destination: Coordinates,
    pub remaining_km: f64,
    pub eta: String,
}

/// Moves a marker along a straight line, looping once the destination is passed.
/// Purely visual; no routing is involved.
#[derive(Debug, Clone)]
pub struct TrackingSimulation {
    start: Coordinates,
    end: Coordinates,
}

impl TrackingSimulation {
    pub fn new(start: Coordinates, end: Coordinates) -> Self {
        Self { start, end }
    }

    pub fn progress_at(tick: u64) -> f64 {
        let mut progress = 0.0;
        for _ in 0..(tick % Self::ticks_per_loop()) {
            progress += PROGRESS_PER_TICK;
            if progress > 1.0 {
                progress = 0.0;
            }
        }
        progress
    }

    // Progress resets on the tick that pushes it past 1, so the cycle is that many ticks long.
    fn ticks_per_loop() -> u64 {
        let mut progress = 0.0;
        let mut ticks = 0;
        loop {
            ticks += 1;
            progress += PROGRESS_PER_TICK;
            if progress > 1.0 {
                return ticks;
            }
        }
    }

    pub fn frame(&self, order_id: &str, tick: u64) -> TrackingFrame {
        let progress = Self::progress_at(tick);
        let position = interpolate(&self.start, &self.end, progress);
        let minutes_left = (TRIP_MINUTES * (1.0 - progress)).ceil() as u64;

        TrackingFrame {
            order_id: order_id.to_string(),
            tick,
            progress,
            position,
            destination: self.end,
            remaining_km: haversine_km(&position, &self.end),
            eta: format!("{minutes_left} mins"),
        }
    }
}

impl Default for TrackingSimulation {
    fn default() -> Self {
        Self::new(ROUTE_START, ROUTE_END)
    }
}
