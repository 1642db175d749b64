//! Brain-side guidance logic
//!
//! Board-agnostic: takes fix validity and speed from the GPS decoder,
//! produces the instruction/distance pair the brain pushes to the display.
//! Route following is leg simulation for now; the countdown, speed
//! smoothing, and no-fix behavior are the real product contract.

use heapless::String;

/// Maximum instruction text length on the wire.
pub const INSTRUCTION_MAX: usize = 63;

/// Exponential moving average weight for new speed samples.
pub const SPEED_SMOOTHING_ALPHA: f32 = 0.5;

/// Readings below this magnitude are clamped to a standstill.
pub const SPEED_ZERO_CLAMP_KMH: f32 = 0.1;

/// Distance at which the instruction switches to the approach cue.
pub const APPROACH_DISTANCE_M: u16 = 50;

const LEG_DISTANCE_M: u16 = 2000;

/// Exponential moving average over speed samples in km/h.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeedFilter {
    kmh: f32,
}

impl SpeedFilter {
    pub const fn new() -> Self {
        Self { kmh: 0.0 }
    }

    /// Fold in a new sample and return the smoothed value.
    pub fn update(&mut self, sample_kmh: f32) -> f32 {
        let mut next =
            SPEED_SMOOTHING_ALPHA * sample_kmh + (1.0 - SPEED_SMOOTHING_ALPHA) * self.kmh;
        if next > -SPEED_ZERO_CLAMP_KMH && next < SPEED_ZERO_CLAMP_KMH {
            next = 0.0;
        }
        self.kmh = next;
        next
    }

    pub const fn kmh(&self) -> f32 {
        self.kmh
    }

    pub fn reset(&mut self) {
        self.kmh = 0.0;
    }
}

/// Produces the navigation cue sent to the display each guidance tick.
#[derive(Debug, Clone)]
pub struct GuidancePlanner {
    instruction: String<INSTRUCTION_MAX>,
    distance_m: u16,
    have_fix: bool,
    speed: SpeedFilter,
}

impl GuidancePlanner {
    pub fn new() -> Self {
        let mut instruction = String::new();
        let _ = instruction.push_str("Starting navigation");
        Self {
            instruction,
            distance_m: 1000,
            have_fix: false,
            speed: SpeedFilter::new(),
        }
    }

    /// Record the latest fix state. An invalid fix zeroes the speed input;
    /// a valid one feeds the smoothing filter.
    pub fn set_fix(&mut self, valid: bool, speed_kmh: f32) {
        self.have_fix = valid;
        if valid {
            self.speed.update(speed_kmh);
        } else {
            self.speed.update(0.0);
        }
    }

    /// Smoothed speed in km/h.
    pub const fn speed_kmh(&self) -> f32 {
        self.speed.kmh()
    }

    /// Advance the countdown by one guidance interval and return the cue
    /// to transmit.
    pub fn tick(&mut self, interval_ms: u32) -> (&str, u16) {
        if !self.have_fix {
            self.set_instruction("Waiting for GPS fix");
            self.distance_m = 0;
            return (self.instruction.as_str(), self.distance_m);
        }

        let metres_per_second = self.speed.kmh() / 3.6;
        let covered_m = metres_per_second * interval_ms as f32 / 1000.0;
        self.distance_m = self.distance_m.saturating_sub(covered_m as u16);

        if self.distance_m == 0 {
            // Leg complete; roll to the next one
            self.distance_m = LEG_DISTANCE_M;
            self.set_instruction("Proceed straight");
        } else if self.distance_m < APPROACH_DISTANCE_M {
            self.set_instruction("Turn right soon");
        }

        (self.instruction.as_str(), self.distance_m)
    }

    fn set_instruction(&mut self, text: &str) {
        self.instruction.clear();
        let _ = self.instruction.push_str(text);
    }
}

impl Default for GuidancePlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_averages_toward_samples() {
        let mut filter = SpeedFilter::new();
        assert_eq!(filter.update(100.0), 50.0);
        assert_eq!(filter.update(100.0), 75.0);
        assert_eq!(filter.update(100.0), 87.5);
    }

    #[test]
    fn filter_clamps_crawl_to_zero() {
        let mut filter = SpeedFilter::new();
        assert_eq!(filter.update(0.15), 0.0);
        filter.update(10.0);
        filter.update(0.0);
        filter.update(0.0);
        filter.update(0.0);
        filter.update(0.0);
        filter.update(0.0);
        // 10 * 0.5^6 = 0.156..., one more halving crosses the clamp
        assert_eq!(filter.update(0.0), 0.0);
    }

    #[test]
    fn no_fix_yields_waiting_cue() {
        let mut planner = GuidancePlanner::new();
        planner.set_fix(false, 0.0);
        let (instruction, distance) = planner.tick(1000);
        assert_eq!(instruction, "Waiting for GPS fix");
        assert_eq!(distance, 0);
    }

    #[test]
    fn countdown_advances_with_speed() {
        let mut planner = GuidancePlanner::new();
        // Two identical samples settle the EMA at 54 km/h = 15 m/s
        planner.set_fix(true, 72.0);
        planner.set_fix(true, 72.0);
        let (_, d1) = planner.tick(1000);
        assert_eq!(d1, 1000 - 15);
        let (_, d2) = planner.tick(1000);
        assert!(d2 < d1);
    }

    #[test]
    fn approach_cue_under_threshold() {
        let mut planner = GuidancePlanner::new();
        let mut saw_approach = false;
        // 108 km/h = 30 m/s; steps of at most 30 m cannot jump the
        // 50 m approach window from above
        for _ in 0..100 {
            planner.set_fix(true, 108.0);
            let (instruction, distance) = planner.tick(1000);
            if distance > 0 && distance < APPROACH_DISTANCE_M {
                assert_eq!(instruction, "Turn right soon");
                saw_approach = true;
            }
        }
        assert!(saw_approach);
    }

    #[test]
    fn leg_rolls_over_at_zero() {
        let mut planner = GuidancePlanner::new();
        planner.set_fix(true, 7200.0);
        planner.set_fix(true, 7200.0);
        // 2700 m/tick at ~5400 km/h EMA: first tick exhausts the leg
        let (instruction, distance) = planner.tick(1000);
        assert_eq!(distance, LEG_DISTANCE_M);
        assert_eq!(instruction, "Proceed straight");
    }
}
