//! Motion configuration loading.

use std::path::Path;

use ai_nav::PathConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Every tunable constant used by the generators, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub path: PathConfig,
    pub chase: ChaseConfig,
    pub follow: FollowConfig,
    pub random: RandomConfig,
    pub flee: FleeConfig,
    pub confused: ConfusedConfig,
    pub waypoint: WaypointConfig,
    pub flight: FlightConfig,
}

impl MotionConfig {
    /// Load from a YAML file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read motion config {}", path.display()))?;
        Self::from_yaml(&text)
            .with_context(|| format!("failed to parse motion config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config = serde_yaml::from_str(text).context("invalid motion config")?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaseConfig {
    #[serde(default = "default_check_interval")]
    pub range_check_interval_ms: u32,
}

impl Default for ChaseConfig {
    fn default() -> Self {
        Self { range_check_interval_ms: default_check_interval() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowConfig {
    #[serde(default = "default_check_interval")]
    pub check_interval_ms: u32,

    /// Slack added to the follow range before a new move is started.
    #[serde(default = "default_follow_tolerance")]
    pub range_tolerance: f32,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval(),
            range_tolerance: default_follow_tolerance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomConfig {
    #[serde(default = "default_min_steps")]
    pub min_steps: u32,
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Rest after a burst of steps, in whole seconds.
    #[serde(default = "default_min_pause")]
    pub min_pause_secs: u32,
    #[serde(default = "default_max_pause")]
    pub max_pause_secs: u32,

    #[serde(default = "default_wander_path_limit")]
    pub path_length_limit: f32,
    #[serde(default = "default_los_retry")]
    pub los_retry_ms: u32,
    #[serde(default = "default_bad_path_retry")]
    pub bad_path_retry_ms: u32,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            min_steps: default_min_steps(),
            max_steps: default_max_steps(),
            min_pause_secs: default_min_pause(),
            max_pause_secs: default_max_pause(),
            path_length_limit: default_wander_path_limit(),
            los_retry_ms: default_los_retry(),
            bad_path_retry_ms: default_bad_path_retry(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleeConfig {
    #[serde(default = "default_min_quiet")]
    pub min_quiet_distance: f32,
    #[serde(default = "default_max_quiet")]
    pub max_quiet_distance: f32,
    #[serde(default = "default_wander_path_limit")]
    pub path_length_limit: f32,
    #[serde(default = "default_los_retry")]
    pub los_retry_ms: u32,
    #[serde(default = "default_bad_path_retry")]
    pub bad_path_retry_ms: u32,
    #[serde(default = "default_min_wait")]
    pub min_wait_ms: u32,
    #[serde(default = "default_max_wait")]
    pub max_wait_ms: u32,
}

impl Default for FleeConfig {
    fn default() -> Self {
        Self {
            min_quiet_distance: default_min_quiet(),
            max_quiet_distance: default_max_quiet(),
            path_length_limit: default_wander_path_limit(),
            los_retry_ms: default_los_retry(),
            bad_path_retry_ms: default_bad_path_retry(),
            min_wait_ms: default_min_wait(),
            max_wait_ms: default_max_wait(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusedConfig {
    /// Half-width of the jitter around the reference point.
    #[serde(default = "default_confused_radius")]
    pub radius: f32,
    #[serde(default = "default_wander_path_limit")]
    pub path_length_limit: f32,
    #[serde(default = "default_los_retry")]
    pub los_retry_ms: u32,
    #[serde(default = "default_bad_path_retry")]
    pub bad_path_retry_ms: u32,
    #[serde(default = "default_min_wait")]
    pub min_wait_ms: u32,
    #[serde(default = "default_max_wait")]
    pub max_wait_ms: u32,
}

impl Default for ConfusedConfig {
    fn default() -> Self {
        Self {
            radius: default_confused_radius(),
            path_length_limit: default_wander_path_limit(),
            los_retry_ms: default_los_retry(),
            bad_path_retry_ms: default_bad_path_retry(),
            min_wait_ms: default_min_wait(),
            max_wait_ms: default_max_wait(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointConfig {
    #[serde(default = "default_waypoint_delay")]
    pub initial_delay_ms: u32,
    #[serde(default = "default_waypoint_delay")]
    pub blocked_retry_ms: u32,
}

impl Default for WaypointConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_waypoint_delay(),
            blocked_retry_ms: default_waypoint_delay(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightConfig {
    #[serde(default = "default_flight_speed")]
    pub speed: f32,
    /// Nodes closer than this to a segment join are skipped.
    #[serde(default = "default_skip_distance")]
    pub skip_point_distance: f32,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self { speed: default_flight_speed(), skip_point_distance: default_skip_distance() }
    }
}

fn default_check_interval() -> u32 {
    100
}
fn default_follow_tolerance() -> f32 {
    1.0
}
fn default_min_steps() -> u32 {
    2
}
fn default_max_steps() -> u32 {
    10
}
fn default_min_pause() -> u32 {
    4
}
fn default_max_pause() -> u32 {
    10
}
fn default_wander_path_limit() -> f32 {
    30.0
}
fn default_los_retry() -> u32 {
    200
}
fn default_bad_path_retry() -> u32 {
    100
}
fn default_min_quiet() -> f32 {
    28.0
}
fn default_max_quiet() -> f32 {
    43.0
}
fn default_min_wait() -> u32 {
    800
}
fn default_max_wait() -> u32 {
    1500
}
fn default_confused_radius() -> f32 {
    2.0
}
fn default_waypoint_delay() -> u32 {
    1000
}
fn default_flight_speed() -> f32 {
    32.0
}
fn default_skip_distance() -> f32 {
    40.0
}
