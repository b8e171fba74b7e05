use crate::state::MAX_SUBSCRIBER_BUFFER;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete hub configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RtlsConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub area: AreaConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Population and tick settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of tracked objects (ids 1..=population)
    #[serde(default = "default_population")]
    pub population: usize,
    /// Tick period in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Fixed seed for reproducible runs; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_population() -> usize {
    250
}

fn default_tick_interval_ms() -> u64 {
    100
}

impl SimulationConfig {
    /// Tick period, never shorter than 1 ms
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            population: default_population(),
            tick_interval_ms: default_tick_interval_ms(),
            seed: None,
        }
    }
}

/// Bounded rectangular area plus the fixed geographic reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaConfig {
    /// Width in meters (x axis)
    #[serde(default = "default_extent")]
    pub width: f64,
    /// Height in meters (y axis)
    #[serde(default = "default_extent")]
    pub height: f64,
    #[serde(default = "default_origin_latitude")]
    pub origin_latitude: f64,
    #[serde(default = "default_origin_longitude")]
    pub origin_longitude: f64,
    #[serde(default = "default_altitude")]
    pub altitude: f64,
    #[serde(default = "default_tenant_id")]
    pub tenant_id: i64,
}

fn default_extent() -> f64 {
    100.0
}

fn default_origin_latitude() -> f64 {
    48.1351
}

fn default_origin_longitude() -> f64 {
    11.5820
}

fn default_altitude() -> f64 {
    520.0
}

fn default_tenant_id() -> i64 {
    1
}

/// Meters per degree used for the flat lat/lon offset
pub const METERS_PER_DEGREE: f64 = 111_000.0;

impl AreaConfig {
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Linear offset from the area origin; only plausible near the origin.
    pub fn to_geo(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.origin_latitude + y / METERS_PER_DEGREE,
            self.origin_longitude + x / METERS_PER_DEGREE,
        )
    }
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            width: default_extent(),
            height: default_extent(),
            origin_latitude: default_origin_latitude(),
            origin_longitude: default_origin_longitude(),
            altitude: default_altitude(),
            tenant_id: default_tenant_id(),
        }
    }
}

/// Tunables for the per-object motion and sensor model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    /// Per-tick chance of picking a new waypoint
    #[serde(default = "default_retarget_probability")]
    pub retarget_probability: f64,
    /// Blend factor for velocity and heading smoothing
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
    /// Distance under which the model brakes instead of steering
    #[serde(default = "default_arrival_radius")]
    pub arrival_radius: f64,
    #[serde(default = "default_arrival_decay")]
    pub arrival_decay: f64,
    /// Peak-to-peak width of the per-tick velocity jitter
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    #[serde(default = "default_damping")]
    pub damping: f64,
    #[serde(default = "default_battery_drain_probability")]
    pub battery_drain_probability: f64,
    #[serde(default = "default_invalid_probability")]
    pub invalid_probability: f64,
    #[serde(default = "default_invalid_min_ticks")]
    pub invalid_min_ticks: u32,
    #[serde(default = "default_invalid_max_ticks")]
    pub invalid_max_ticks: u32,
}

fn default_min_speed() -> f64 {
    0.5
}

fn default_max_speed() -> f64 {
    2.5
}

fn default_retarget_probability() -> f64 {
    0.01
}

fn default_smoothing() -> f64 {
    0.1
}

fn default_arrival_radius() -> f64 {
    0.5
}

fn default_arrival_decay() -> f64 {
    0.9
}

fn default_jitter() -> f64 {
    0.05
}

fn default_damping() -> f64 {
    0.98
}

fn default_battery_drain_probability() -> f64 {
    0.001
}

fn default_invalid_probability() -> f64 {
    0.0005
}

fn default_invalid_min_ticks() -> u32 {
    20
}

fn default_invalid_max_ticks() -> u32 {
    50
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            retarget_probability: default_retarget_probability(),
            smoothing: default_smoothing(),
            arrival_radius: default_arrival_radius(),
            arrival_decay: default_arrival_decay(),
            jitter: default_jitter(),
            damping: default_damping(),
            battery_drain_probability: default_battery_drain_probability(),
            invalid_probability: default_invalid_probability(),
            invalid_min_ticks: default_invalid_min_ticks(),
            invalid_max_ticks: default_invalid_max_ticks(),
        }
    }
}

/// Subscriber delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Per-subscriber buffer; two full population bursts when absent.
    /// Clamped to `1..=MAX_SUBSCRIBER_BUFFER`.
    #[serde(default)]
    pub subscriber_buffer: Option<usize>,
    #[serde(default = "default_sse_keepalive_seconds")]
    pub sse_keepalive_seconds: u64,
}

fn default_sse_keepalive_seconds() -> u64 {
    15
}

impl StreamConfig {
    pub fn buffer_for(&self, population: usize) -> usize {
        self.subscriber_buffer
            .unwrap_or_else(|| population.saturating_mul(2))
            .clamp(1, MAX_SUBSCRIBER_BUFFER)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: None,
            sse_keepalive_seconds: default_sse_keepalive_seconds(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Directory served at `/`
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            static_dir: default_static_dir(),
        }
    }
}

impl RtlsConfig {
    /// Apply `RTLS_*` env var overrides. Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RTLS_BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(v) = lookup("RTLS_STATIC_DIR") {
            self.server.static_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("RTLS_POPULATION") {
            if let Ok(n) = v.parse::<usize>() {
                self.simulation.population = n;
            }
        }
        if let Some(v) = lookup("RTLS_TICK_MS") {
            if let Ok(n) = v.parse::<u64>() {
                if n > 0 {
                    self.simulation.tick_interval_ms = n;
                }
            }
        }
        if let Some(v) = lookup("RTLS_SEED") {
            if let Ok(n) = v.parse::<u64>() {
                self.simulation.seed = Some(n);
            }
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> anyhow::Result<RtlsConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: RtlsConfig = toml::from_str(&contents)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RtlsConfig::default();
        assert_eq!(config.simulation.population, 250);
        assert_eq!(config.simulation.tick_interval_ms, 100);
        assert!(config.simulation.seed.is_none());
        assert_eq!(config.area.width, 100.0);
        assert_eq!(config.area.altitude, 520.0);
        assert_eq!(config.motion.invalid_min_ticks, 20);
        assert_eq!(config.motion.invalid_max_ticks, 50);
        assert_eq!(config.stream.buffer_for(250), 500);
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [simulation]
            population = 10
            tick_interval_ms = 50
            seed = 7

            [area]
            width = 40.0
            height = 20.0

            [motion]
            invalid_probability = 0.0

            [stream]
            subscriber_buffer = 64

            [server]
            bind_addr = "127.0.0.1:9000"
            static_dir = "/srv/www"
        "#;

        let config: RtlsConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.simulation.population, 10);
        assert_eq!(config.simulation.tick_interval(), Duration::from_millis(50));
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.area.center(), (20.0, 10.0));
        assert_eq!(config.motion.invalid_probability, 0.0);
        assert_eq!(config.motion.smoothing, 0.1); // Default
        assert_eq!(config.stream.buffer_for(10), 64);
        assert_eq!(config.server.static_dir, PathBuf::from("/srv/www"));
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [simulation]
            population = 3
        "#;

        let config: RtlsConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.simulation.population, 3);
        assert_eq!(config.simulation.tick_interval_ms, 100); // Default
        assert_eq!(config.area.height, 100.0); // Default
        assert_eq!(config.stream.buffer_for(3), 6);
    }

    #[test]
    fn test_subscriber_buffer_is_capped() {
        let toml = r#"
            [stream]
            subscriber_buffer = 9000000000000000000
        "#;

        let config: RtlsConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.stream.buffer_for(250), MAX_SUBSCRIBER_BUFFER);

        let derived = StreamConfig::default();
        assert_eq!(derived.buffer_for(usize::MAX), MAX_SUBSCRIBER_BUFFER);
        assert_eq!(derived.buffer_for(0), 1);
    }

    #[test]
    fn test_zero_tick_interval_is_clamped() {
        let toml = r#"
            [simulation]
            tick_interval_ms = 0
        "#;

        let config: RtlsConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.simulation.tick_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind_addr = \"127.0.0.1:1234\"").unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:1234");
        assert_eq!(config.simulation.population, 250);
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("/nonexistent/rtls.toml").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RTLS_POPULATION", "12"),
            ("RTLS_TICK_MS", "250"),
            ("RTLS_SEED", "99"),
            ("RTLS_BIND_ADDR", "127.0.0.1:3000"),
        ]
        .into_iter()
        .collect();

        let mut config = RtlsConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.simulation.population, 12);
        assert_eq!(config.simulation.tick_interval_ms, 250);
        assert_eq!(config.simulation.seed, Some(99));
        assert_eq!(config.server.bind_addr, "127.0.0.1:3000");
    }

    #[test]
    fn test_env_overrides_ignore_garbage() {
        let mut config = RtlsConfig::default();
        config.apply_overrides(|key| match key {
            "RTLS_POPULATION" => Some("many".to_string()),
            "RTLS_TICK_MS" => Some("0".to_string()),
            _ => None,
        });

        assert_eq!(config.simulation.population, 250);
        assert_eq!(config.simulation.tick_interval_ms, 100);
    }

    #[test]
    fn test_geo_offset() {
        let area = AreaConfig::default();
        let (lat, lon) = area.to_geo(111.0, 222.0);
        assert!((lat - (48.1351 + 0.002)).abs() < 1e-9);
        assert!((lon - (11.5820 + 0.001)).abs() < 1e-9);
    }
}
