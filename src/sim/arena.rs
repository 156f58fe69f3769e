//! Arena catalog and play-space bounds
//!
//! Arenas differ only in decoration, which the presentation layer owns.
//! The simulation needs the bounding box balloons live in and the edges
//! they enter from.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::centered;

/// Selectable arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArenaKind {
    #[default]
    Desert,
    Mountain,
    City,
}

impl ArenaKind {
    pub const ALL: [ArenaKind; 3] = [ArenaKind::Desert, ArenaKind::Mountain, ArenaKind::City];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArenaKind::Desert => "desert",
            ArenaKind::Mountain => "mountain",
            ArenaKind::City => "city",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "desert" => Some(ArenaKind::Desert),
            "mountain" => Some(ArenaKind::Mountain),
            "city" => Some(ArenaKind::City),
            _ => None,
        }
    }

    /// Display name
    pub fn title(&self) -> &'static str {
        match self {
            ArenaKind::Desert => "Desert Oasis",
            ArenaKind::Mountain => "Mountain Forest",
            ArenaKind::City => "Abandoned City",
        }
    }

    /// Play-space bounds (every arena is 100 x 100)
    pub fn bounds(&self) -> Bounds {
        Bounds::standard()
    }
}

/// Axis-aligned box balloons must stay inside
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn standard() -> Self {
        Self {
            min: Vec3::new(-ARENA_HALF_EXTENT, ARENA_FLOOR, -ARENA_HALF_EXTENT),
            max: Vec3::new(ARENA_HALF_EXTENT, ARENA_CEILING, ARENA_HALF_EXTENT),
        }
    }

    /// Inclusive containment test
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Side of the arena a balloon enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// -Z
    North,
    /// +X
    East,
    /// +Z
    South,
    /// -X
    West,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::North, Edge::East, Edge::South, Edge::West];

    /// Unit direction pointing from this edge toward the arena center
    pub fn inward(&self) -> Vec3 {
        match self {
            Edge::North => Vec3::Z,
            Edge::East => Vec3::NEG_X,
            Edge::South => Vec3::NEG_Z,
            Edge::West => Vec3::X,
        }
    }
}

/// Inward drift speed range per tick
const INWARD_SPEED: (f32, f32) = (0.01, 0.04);
/// Maximum lateral drift along the edge per tick
const LATERAL_DRIFT: f32 = 0.02;
/// Maximum vertical drift per tick
pub(crate) const VERTICAL_DRIFT: f32 = 0.01;
/// Spawn altitude band
pub(crate) const SPAWN_HEIGHT: (f32, f32) = (5.0, 20.0);

/// Pick a random edge and produce an entry position with inward-biased drift
pub fn edge_spawn<R: Rng>(rng: &mut R, bounds: &Bounds) -> (Vec3, Vec3) {
    let edge = Edge::ALL[rng.random_range(0..Edge::ALL.len())];
    edge_spawn_at(rng, bounds, edge)
}

/// Entry position and drift for a specific edge of `bounds`
pub fn edge_spawn_at<R: Rng>(rng: &mut R, bounds: &Bounds, edge: Edge) -> (Vec3, Vec3) {
    let center = bounds.center();
    let half = (bounds.max - bounds.min) * 0.5;
    // Entry line sits EDGE_SPAWN_INSET inside each wall
    let reach_x = (half.x - EDGE_SPAWN_INSET).max(0.0);
    let reach_z = (half.z - EDGE_SPAWN_INSET).max(0.0);

    let along = rng.random::<f32>();
    let lateral = centered(rng.random::<f32>(), LATERAL_DRIFT);
    let inward = rng.random_range(INWARD_SPEED.0..INWARD_SPEED.1);
    let low = SPAWN_HEIGHT.0.clamp(bounds.min.y, bounds.max.y);
    let high = SPAWN_HEIGHT.1.clamp(bounds.min.y, bounds.max.y);
    let y = low + (high - low) * rng.random::<f32>();
    let vy = centered(rng.random::<f32>(), VERTICAL_DRIFT);

    let (pos, drift) = match edge {
        Edge::North => (
            Vec3::new(center.x + centered(along, reach_x), y, center.z - reach_z),
            Vec3::new(lateral, vy, inward),
        ),
        Edge::East => (
            Vec3::new(center.x + reach_x, y, center.z + centered(along, reach_z)),
            Vec3::new(-inward, vy, lateral),
        ),
        Edge::South => (
            Vec3::new(center.x + centered(along, reach_x), y, center.z + reach_z),
            Vec3::new(lateral, vy, -inward),
        ),
        Edge::West => (
            Vec3::new(center.x - reach_x, y, center.z + centered(along, reach_z)),
            Vec3::new(inward, vy, lateral),
        ),
    };
    (pos, drift)
}
