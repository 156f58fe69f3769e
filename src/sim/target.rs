//! Balloon population
//!
//! Owns every live balloon: initial layout, periodic edge spawns, per-tick
//! drift with wraparound respawn, and removal on pop. Balloons are kept
//! sorted by id so iteration order is stable.

use std::collections::HashMap;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::{Bounds, SPAWN_HEIGHT, VERTICAL_DRIFT, edge_spawn};
use crate::consts::BALLOON_COLORS;
use crate::centered;
use crate::tuning::SpawnTuning;

/// Opaque balloon identity, unique for the life of a population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u32);

/// Presentation-side handle (mesh, sprite, DOM node...) bound to a balloon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderHandle(pub u32);

/// A balloon
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub id: TargetId,
    pub position: Vec3,
    /// Constant per-tick displacement
    pub drift: Vec3,
    pub color_index: u8,
}

/// Initial layout regions: 3 x 3 grid over the horizontal map, (min, max) per axis
const REGION_SPANS: [(f32, f32); 3] = [(-45.0, -25.0), (-15.0, 5.0), (15.0, 45.0)];
/// Maximum horizontal drift of initially placed balloons per tick
const INITIAL_DRIFT: f32 = 0.025;

/// Live balloon set
#[derive(Debug, Clone)]
pub struct TargetPopulation {
    bounds: Bounds,
    tuning: SpawnTuning,
    targets: Vec<Target>,
    handles: HashMap<TargetId, RenderHandle>,
    rng: Pcg32,
    next_id: u32,
}

impl TargetPopulation {
    pub fn new(bounds: Bounds, tuning: SpawnTuning, seed: u64) -> Self {
        Self {
            bounds,
            tuning,
            targets: Vec::new(),
            handles: HashMap::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|index| &self.targets[index])
    }

    pub fn at_capacity(&self) -> bool {
        self.targets.len() >= self.tuning.max_live
    }

    fn next_target_id(&mut self) -> TargetId {
        let id = TargetId(self.next_id);
        self.next_id += 1;
        id
    }

    fn random_color(&mut self) -> u8 {
        self.rng.random_range(0..BALLOON_COLORS)
    }

    /// Drop every balloon and render binding
    pub fn clear(&mut self) {
        self.targets.clear();
        self.handles.clear();
    }

    /// Replace the population with the round-start layout
    pub fn populate_initial(&mut self) {
        self.clear();
        let count = self.tuning.initial_count.min(self.tuning.max_live);
        for i in 0..count {
            let region = i % (REGION_SPANS.len() * REGION_SPANS.len());
            let (x_min, x_max) = REGION_SPANS[region / REGION_SPANS.len()];
            let (z_min, z_max) = REGION_SPANS[region % REGION_SPANS.len()];

            let position = Vec3::new(
                self.rng.random_range(x_min..x_max),
                self.rng.random_range(SPAWN_HEIGHT.0..SPAWN_HEIGHT.1),
                self.rng.random_range(z_min..z_max),
            );
            let drift = Vec3::new(
                centered(self.rng.random::<f32>(), INITIAL_DRIFT),
                centered(self.rng.random::<f32>(), VERTICAL_DRIFT),
                centered(self.rng.random::<f32>(), INITIAL_DRIFT),
            );
            let color = self.random_color();
            self.insert(position, drift, color);
        }
        log::info!("Placed {} balloons", self.targets.len());
    }

    fn insert(&mut self, position: Vec3, drift: Vec3, color_index: u8) -> TargetId {
        let id = self.next_target_id();
        // Ids are monotonic, so pushing keeps the vector sorted
        self.targets.push(Target {
            id,
            position,
            drift,
            color_index,
        });
        id
    }

    /// Add a balloon at an explicit position, unless the population is full
    pub fn spawn_at(&mut self, position: Vec3, drift: Vec3) -> Option<TargetId> {
        if self.at_capacity() {
            return None;
        }
        let color = self.random_color();
        Some(self.insert(position, drift, color))
    }

    /// Add one balloon entering from a random edge, unless the population is full
    pub fn spawn_edge(&mut self) -> Option<TargetId> {
        if self.at_capacity() {
            log::debug!("Spawn skipped: {} balloons live", self.targets.len());
            return None;
        }
        let (position, drift) = edge_spawn(&mut self.rng, &self.bounds);
        let color = self.random_color();
        let id = self.insert(position, drift, color);
        log::debug!("Spawned balloon {:?} at {:?}", id, position);
        Some(id)
    }

    /// Advance every balloon by its drift. Balloons leaving the bounds are
    /// sent back in from an edge with the same id and color.
    ///
    /// Returns how many balloons wrapped around.
    pub fn update(&mut self) -> usize {
        let mut wrapped = 0;
        for target in &mut self.targets {
            let next = target.position + target.drift;
            if self.bounds.contains(next) {
                target.position = next;
            } else {
                let (position, drift) = edge_spawn(&mut self.rng, &self.bounds);
                target.position = position;
                target.drift = drift;
                wrapped += 1;
            }
        }
        wrapped
    }

    /// Remove a popped balloon and its render binding
    pub fn remove(&mut self, id: TargetId) -> Option<Target> {
        let index = self.targets.binary_search_by_key(&id, |t| t.id).ok()?;
        self.handles.remove(&id);
        Some(self.targets.remove(index))
    }

    /// Associate a presentation handle with a live balloon
    pub fn bind_render_handle(&mut self, id: TargetId, handle: RenderHandle) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.handles.insert(id, handle);
        true
    }

    pub fn render_handle(&self, id: TargetId) -> Option<RenderHandle> {
        self.handles.get(&id).copied()
    }
}
