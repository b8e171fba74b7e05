use crate::config::{AreaConfig, MotionConfig};
use crate::state::{Battery, PositionRecord};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use std::f64::consts::{PI, TAU};
use std::sync::Arc;

/// Sensor validity of a tracked object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    Valid,
    /// Frozen in place until `ticks` reaches `dwell`
    Invalid { ticks: u32, dwell: u32 },
}

/// Motion, validity and battery state of one tracked object
pub struct KinematicModel {
    object_id: i64,
    tag_id: String,
    source_id: i64,

    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    angle: f64,
    cruise_speed: f64,
    waypoint: Option<(f64, f64)>,

    battery: i32,
    sensor: SensorState,

    area: Arc<AreaConfig>,
    motion: Arc<MotionConfig>,
    rng: StdRng,
}

impl KinematicModel {
    /// Create a model with randomized location, heading, speed, battery and source
    pub fn new(
        object_id: i64,
        tag_id: String,
        area: Arc<AreaConfig>,
        motion: Arc<MotionConfig>,
        mut rng: StdRng,
    ) -> Self {
        let x = rng.gen::<f64>() * area.width;
        let y = rng.gen::<f64>() * area.height;
        let angle = rng.gen::<f64>() * TAU;
        let cruise_speed = motion.min_speed + rng.gen::<f64>() * (motion.max_speed - motion.min_speed);
        let battery = rng.gen_range(80..100);
        let source_id = rng.gen_range(1..=5);

        Self {
            object_id,
            tag_id,
            source_id,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            angle,
            cruise_speed,
            waypoint: None,
            battery,
            sensor: SensorState::Valid,
            area,
            motion,
            rng,
        }
    }

    /// Advance by `dt` seconds and return the resulting record
    pub fn advance(&mut self, dt: f64) -> PositionRecord {
        self.advance_at(dt, Utc::now())
    }

    /// Advance by `dt` seconds, stamping the record with `now`
    pub fn advance_at(&mut self, dt: f64, now: DateTime<Utc>) -> PositionRecord {
        if let SensorState::Invalid { ticks, dwell } = self.sensor {
            let ticks = ticks + 1;
            self.sensor = if ticks >= dwell {
                SensorState::Valid
            } else {
                SensorState::Invalid { ticks, dwell }
            };
            // Frozen; the recovery tick itself is still reported invalid
            return self.record(now, false);
        }

        self.steer();
        self.integrate(dt);
        self.drain_battery();

        if self.rng.gen::<f64>() < self.motion.invalid_probability {
            self.enter_invalid();
        }

        self.record(now, self.is_valid())
    }

    pub fn object_id(&self) -> i64 {
        self.object_id
    }

    pub fn is_valid(&self) -> bool {
        self.sensor == SensorState::Valid
    }

    pub fn sensor_state(&self) -> SensorState {
        self.sensor
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn velocity(&self) -> (f64, f64) {
        (self.vx, self.vy)
    }

    pub fn waypoint(&self) -> Option<(f64, f64)> {
        self.waypoint
    }

    pub fn battery(&self) -> i32 {
        self.battery
    }

    fn enter_invalid(&mut self) {
        let lo = self.motion.invalid_min_ticks.min(self.motion.invalid_max_ticks);
        let hi = self.motion.invalid_min_ticks.max(self.motion.invalid_max_ticks);
        let dwell = self.rng.gen_range(lo..=hi).max(1);
        self.sensor = SensorState::Invalid { ticks: 0, dwell };
    }

    /// Retarget occasionally, then blend velocity and heading toward the waypoint
    fn steer(&mut self) {
        if self.rng.gen::<f64>() < self.motion.retarget_probability {
            self.waypoint = Some((
                self.rng.gen::<f64>() * self.area.width,
                self.rng.gen::<f64>() * self.area.height,
            ));
        }

        if let Some((tx, ty)) = self.waypoint {
            let dx = tx - self.x;
            let dy = ty - self.y;
            let dist = dx.hypot(dy);

            if dist > self.motion.arrival_radius {
                let k = self.motion.smoothing;
                let desired_vx = dx / dist * self.cruise_speed;
                let desired_vy = dy / dist * self.cruise_speed;
                self.vx += (desired_vx - self.vx) * k;
                self.vy += (desired_vy - self.vy) * k;

                let diff = normalize_angle(dy.atan2(dx) - self.angle);
                self.angle += diff * k;
            } else {
                self.vx *= self.motion.arrival_decay;
                self.vy *= self.motion.arrival_decay;
            }
        }

        let jitter = self.motion.jitter;
        self.vx += (self.rng.gen::<f64>() - 0.5) * jitter;
        self.vy += (self.rng.gen::<f64>() - 0.5) * jitter;

        self.vx *= self.motion.damping;
        self.vy *= self.motion.damping;
    }

    /// Move, reflecting off the area edges and heading back to the center
    fn integrate(&mut self, dt: f64) {
        self.x += self.vx * dt;
        self.y += self.vy * dt;

        let mut bounced = false;
        if self.x < 0.0 {
            self.x = 0.0;
            self.vx = -self.vx;
            bounced = true;
        } else if self.x > self.area.width {
            self.x = self.area.width;
            self.vx = -self.vx;
            bounced = true;
        }
        if self.y < 0.0 {
            self.y = 0.0;
            self.vy = -self.vy;
            bounced = true;
        } else if self.y > self.area.height {
            self.y = self.area.height;
            self.vy = -self.vy;
            bounced = true;
        }

        if bounced {
            self.waypoint = Some(self.area.center());
        }
    }

    fn drain_battery(&mut self) {
        if self.rng.gen::<f64>() < self.motion.battery_drain_probability && self.battery > 0 {
            self.battery -= 1;
        }
    }

    fn record(&self, now: DateTime<Utc>, is_valid: bool) -> PositionRecord {
        let (latitude, longitude) = self.area.to_geo(self.x, self.y);

        PositionRecord {
            object_id: self.object_id,
            tag_id: self.tag_id.clone(),
            timestamp: now,
            is_valid,
            source_id: self.source_id,
            x: self.x,
            y: self.y,
            z: 0.0,
            a: self.angle,
            b: 0.0,
            c: 0.0,
            latitude,
            longitude,
            altitude: self.area.altitude,
            flags: Vec::new(),
            tenant_id: self.area.tenant_id,
            battery: Battery {
                percentage: self.battery,
                percentage_last_update: now,
                voltage: None,
                state: None,
            },
        }
    }
}

/// Wrap an angle difference into (-π, π]
pub fn normalize_angle(angle: f64) -> f64 {
    PI - (PI - angle).rem_euclid(TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn quiet_motion() -> MotionConfig {
        MotionConfig {
            retarget_probability: 0.0,
            invalid_probability: 0.0,
            battery_drain_probability: 0.0,
            ..MotionConfig::default()
        }
    }

    fn model_with(motion: MotionConfig, seed: u64) -> KinematicModel {
        KinematicModel::new(
            1,
            "tool-001".to_string(),
            Arc::new(AreaConfig::default()),
            Arc::new(motion),
            StdRng::seed_from_u64(seed),
        )
    }

    #[test]
    fn test_initial_state_within_bounds() {
        for seed in 0..50 {
            let model = model_with(MotionConfig::default(), seed);
            let (x, y) = model.position();
            assert!((0.0..=100.0).contains(&x));
            assert!((0.0..=100.0).contains(&y));
            assert!((0.5..=2.5).contains(&model.cruise_speed));
            assert!((80..100).contains(&model.battery()));
            assert!((1..=5).contains(&model.source_id));
            assert!(model.is_valid());
        }
    }

    #[test]
    fn test_record_fields() {
        let mut model = model_with(quiet_motion(), 1);
        let now = Utc::now();
        let record = model.advance_at(0.1, now);

        assert_eq!(record.object_id, 1);
        assert_eq!(record.tag_id, "tool-001");
        assert_eq!(record.timestamp, now);
        assert_eq!(record.z, 0.0);
        assert_eq!(record.b, 0.0);
        assert_eq!(record.c, 0.0);
        assert_eq!(record.altitude, 520.0);
        assert_eq!(record.tenant_id, 1);
        assert!(record.flags.is_empty());
        assert!((record.latitude - (48.1351 + record.y / 111_000.0)).abs() < 1e-12);
        assert!((record.longitude - (11.5820 + record.x / 111_000.0)).abs() < 1e-12);
        assert_eq!(record.battery.percentage_last_update, now);
        assert!(record.battery.voltage.is_none());
    }

    #[test]
    fn test_invalid_is_frozen_and_recovers_within_max() {
        let mut model = model_with(quiet_motion(), 7);
        model.vx = 1.5;
        model.vy = -1.0;
        model.enter_invalid();
        let frozen = model.position();

        let max = model.motion.invalid_max_ticks;
        let mut advances = 0;
        while !model.is_valid() {
            let record = model.advance(0.1);
            advances += 1;
            assert!(!record.is_valid);
            assert_eq!((record.x, record.y), frozen);
            assert!(advances <= max, "still invalid after {} ticks", advances);
        }
        assert!(advances >= model.motion.invalid_min_ticks);

        // Motion resumes on the next tick
        let record = model.advance(0.1);
        assert!(record.is_valid);
        assert_ne!((record.x, record.y), frozen);
    }

    #[test]
    fn test_dwell_drawn_within_configured_range() {
        let motion = MotionConfig {
            invalid_min_ticks: 3,
            invalid_max_ticks: 6,
            ..quiet_motion()
        };
        for seed in 0..100 {
            let mut model = model_with(motion.clone(), seed);
            model.enter_invalid();
            match model.sensor_state() {
                SensorState::Invalid { ticks, dwell } => {
                    assert_eq!(ticks, 0);
                    assert!((3..=6).contains(&dwell));
                }
                SensorState::Valid => panic!("model should be invalid"),
            }
        }
    }

    #[test]
    fn test_always_invalid_probability_flags_record() {
        let motion = MotionConfig {
            invalid_probability: 1.0,
            ..quiet_motion()
        };
        let mut model = model_with(motion, 3);

        let record = model.advance(0.1);
        assert!(!record.is_valid);
        assert!(!model.is_valid());
    }

    #[test]
    fn test_reflects_off_upper_x_boundary() {
        let mut model = model_with(quiet_motion(), 11);
        model.x = 99.95;
        model.y = 50.0;
        model.vx = 5.0;
        model.vy = 0.0;
        model.waypoint = None;

        let record = model.advance(0.1);

        assert_eq!(record.x, 100.0);
        assert!(model.velocity().0 < 0.0);
        assert_eq!(model.waypoint(), Some((50.0, 50.0)));
    }

    #[test]
    fn test_reflects_off_lower_y_boundary() {
        let mut model = model_with(quiet_motion(), 12);
        model.x = 50.0;
        model.y = 0.05;
        model.vx = 0.0;
        model.vy = -5.0;
        model.waypoint = None;

        let record = model.advance(0.1);

        assert_eq!(record.y, 0.0);
        assert!(model.velocity().1 > 0.0);
        assert_eq!(model.waypoint(), Some((50.0, 50.0)));
    }

    #[test]
    fn test_stays_in_bounds_over_long_run() {
        let motion = MotionConfig {
            retarget_probability: 0.05,
            ..MotionConfig::default()
        };
        let mut model = model_with(motion, 21);

        for _ in 0..10_000 {
            let record = model.advance(0.1);
            assert!((0.0..=100.0).contains(&record.x));
            assert!((0.0..=100.0).contains(&record.y));
        }
    }

    #[test]
    fn test_velocity_decays_near_waypoint() {
        let motion = MotionConfig {
            jitter: 0.0,
            ..quiet_motion()
        };
        let mut model = model_with(motion, 5);
        model.x = 50.0;
        model.y = 50.0;
        model.vx = 1.0;
        model.vy = 0.0;
        model.waypoint = Some((50.1, 50.0));

        model.advance(0.1);

        assert!((model.velocity().0 - 0.9 * 0.98).abs() < 1e-12);
    }

    #[test]
    fn test_heading_blends_across_wrap_boundary() {
        let motion = MotionConfig {
            jitter: 0.0,
            ..quiet_motion()
        };
        let mut model = model_with(motion, 6);
        model.x = 50.0;
        model.y = 50.0;
        model.angle = 3.0;
        // Bearing to the waypoint is -3.0 rad, just across the ±π seam
        model.waypoint = Some((50.0 + 20.0 * (-3.0f64).cos(), 50.0 + 20.0 * (-3.0f64).sin()));

        let record = model.advance(0.1);

        // Short way round is +0.283 rad, blended by 0.1
        let expected = 3.0 + (TAU - 6.0) * 0.1;
        assert!((record.a - expected).abs() < 1e-9);
    }

    #[test]
    fn test_battery_drains_to_zero_and_stops() {
        let motion = MotionConfig {
            battery_drain_probability: 1.0,
            ..quiet_motion()
        };
        let mut model = model_with(motion, 8);
        model.battery = 3;

        let mut last = model.battery();
        for _ in 0..10 {
            let record = model.advance(0.1);
            assert!(record.battery.percentage <= last);
            assert!(record.battery.percentage >= 0);
            last = record.battery.percentage;
        }
        assert_eq!(model.battery(), 0);
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(1.5 * PI) + 0.5 * PI).abs() < 1e-12);
        assert!((normalize_angle(-1.5 * PI) - 0.5 * PI).abs() < 1e-12);
        assert!((normalize_angle(PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(0.25) - 0.25).abs() < 1e-12);
    }
}
