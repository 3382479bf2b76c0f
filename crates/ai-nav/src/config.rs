#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunables of the path generator.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PathConfig {
    /// Maximum polygons in a corridor.
    pub max_path_length: usize,
    /// Maximum points in a point path.
    pub max_point_path_length: usize,
    pub smooth_path_step_size: f32,
    pub smooth_path_slop: f32,
    /// A start or end farther than this from the mesh is flagged far-from-poly.
    pub far_from_poly_distance: f32,
    pub nearest_poly_extents: [f32; 3],
    /// Vertical half-extent of the fallback nearest-poly search.
    pub nearest_poly_fallback_height: f32,
    /// Reuse the previous corridor when the new start is this close to it.
    pub corridor_reuse_distance: f32,
    /// Fraction of the previous corridor kept as a prefix.
    pub corridor_reuse_prefix: f32,
    /// Destination forcing applies when the actual end is off by less than this
    /// fraction of the requested distance.
    pub force_destination_ratio: f32,
    pub force_destination_tolerance: f32,
    /// Points beyond this absolute coordinate are outside the map.
    pub map_half_size: f32,
    pub max_search_nodes: usize,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            max_path_length: 74,
            max_point_path_length: 74,
            smooth_path_step_size: 4.0,
            smooth_path_slop: 0.3,
            far_from_poly_distance: 7.0,
            nearest_poly_extents: [3.0, 3.0, 5.0],
            nearest_poly_fallback_height: 50.0,
            corridor_reuse_distance: 3.0,
            corridor_reuse_prefix: 0.8,
            force_destination_ratio: 0.3,
            force_destination_tolerance: 1.0,
            map_half_size: 17_066.666,
            max_search_nodes: 4096,
        }
    }
}
