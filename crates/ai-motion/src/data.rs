//! Authored movement data: waypoint paths, spline chains and taxi routes.

use std::sync::Arc;

use ai_core::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionDataError {
    #[error("waypoint path {path_id} node {node_id} has a non-finite position")]
    NonFiniteWaypoint { path_id: u32, node_id: u32 },
    #[error("waypoint path {path_id} node {node_id} has event chance {chance} (max 100)")]
    InvalidEventChance { path_id: u32, node_id: u32, chance: u8 },
    #[error("spline chain link {index} has {points} points, need at least 2")]
    ShortSplineLink { index: usize, points: usize },
    #[error("spline chain link {index} has a zero expected duration")]
    ZeroSplineDuration { index: usize },
    #[error("taxi route segment {index} has no nodes")]
    EmptyTaxiSegment { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointMoveType {
    #[default]
    Walk,
    Run,
    Land,
    TakeOff,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointNode {
    pub id: u32,
    pub position: Vec3,
    /// Facing applied when the node has a delay or ends the path.
    #[serde(default)]
    pub orientation: Option<f32>,
    #[serde(default)]
    pub delay_ms: u32,
    #[serde(default)]
    pub event_id: Option<u32>,
    /// Percent chance for `event_id` to fire on arrival.
    #[serde(default = "default_event_chance")]
    pub event_chance: u8,
    #[serde(default)]
    pub move_type: WaypointMoveType,
}

fn default_event_chance() -> u8 {
    100
}

impl WaypointNode {
    pub fn new(id: u32, position: Vec3) -> Self {
        Self {
            id,
            position,
            orientation: None,
            delay_ms: 0,
            event_id: None,
            event_chance: default_event_chance(),
            move_type: WaypointMoveType::Walk,
        }
    }

    pub fn with_delay(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_orientation(mut self, orientation: f32) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn with_event(mut self, event_id: u32, chance: u8) -> Self {
        self.event_id = Some(event_id);
        self.event_chance = chance;
        self
    }

    pub fn with_move_type(mut self, move_type: WaypointMoveType) -> Self {
        self.move_type = move_type;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointPath {
    pub id: u32,
    pub nodes: Vec<WaypointNode>,
}

impl WaypointPath {
    pub fn new(id: u32, nodes: Vec<WaypointNode>) -> Result<Self, MotionDataError> {
        let path = Self { id, nodes };
        path.validate()?;
        Ok(path)
    }

    pub fn validate(&self) -> Result<(), MotionDataError> {
        for node in &self.nodes {
            if !node.position.is_finite() || node.orientation.is_some_and(|o| !o.is_finite()) {
                return Err(MotionDataError::NonFiniteWaypoint {
                    path_id: self.id,
                    node_id: node.id,
                });
            }
            if node.event_chance > 100 {
                return Err(MotionDataError::InvalidEventChance {
                    path_id: self.id,
                    node_id: node.id,
                    chance: node.event_chance,
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One spline of an authored chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplineChainLink {
    /// The first point is replaced by the unit's position at launch.
    pub points: Vec<Vec3>,
    /// Duration the chain was authored against.
    pub expected_duration_ms: u32,
    /// Delay from this link's launch to the next one's.
    pub time_to_next_ms: u32,
    #[serde(default)]
    pub velocity: f32,
}

impl SplineChainLink {
    pub fn new(points: Vec<Vec3>, expected_duration_ms: u32, time_to_next_ms: u32) -> Self {
        Self { points, expected_duration_ms, time_to_next_ms, velocity: 0.0 }
    }

    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = velocity;
        self
    }
}

/// Validate and freeze a chain so generators and resume info can share it.
pub fn spline_chain(
    links: Vec<SplineChainLink>,
) -> Result<Arc<[SplineChainLink]>, MotionDataError> {
    for (index, link) in links.iter().enumerate() {
        if link.points.len() < 2 {
            return Err(MotionDataError::ShortSplineLink { index, points: link.points.len() });
        }
        if link.expected_duration_ms == 0 {
            return Err(MotionDataError::ZeroSplineDuration { index });
        }
    }
    Ok(links.into())
}

/// Snapshot of an interrupted spline chain, enough to pick it up again later.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SplineChainResumeInfo {
    pub point_id: u32,
    pub chain: Option<Arc<[SplineChainLink]>>,
    pub walk: bool,
    pub spline_index: usize,
    /// Next control point of the interrupted link; zero for "start the link afresh".
    pub point_index: usize,
    pub time_to_next_ms: u32,
}

impl SplineChainResumeInfo {
    pub fn is_empty(&self) -> bool {
        self.chain.is_none()
    }

    pub fn clear(&mut self) {
        self.chain = None;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxiNode {
    pub map_id: u32,
    pub position: Vec3,
    #[serde(default)]
    pub arrival_event: Option<u32>,
    #[serde(default)]
    pub departure_event: Option<u32>,
}

impl TaxiNode {
    pub fn new(map_id: u32, position: Vec3) -> Self {
        Self { map_id, position, arrival_event: None, departure_event: None }
    }
}

/// Path between two consecutive taxi destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxiSegment {
    pub nodes: Vec<TaxiNode>,
    #[serde(default)]
    pub cost: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxiRoute {
    pub segments: Vec<TaxiSegment>,
}

impl TaxiRoute {
    pub fn new(segments: Vec<TaxiSegment>) -> Result<Self, MotionDataError> {
        if let Some(index) = segments.iter().position(|s| s.nodes.is_empty()) {
            return Err(MotionDataError::EmptyTaxiSegment { index });
        }
        Ok(Self { segments })
    }
}
