//! Shot resolution
//!
//! Intersects a shot's rays with every live balloon, keeps the nearest
//! crossing per balloon and pops the closest `max_penetration` of them.

use std::collections::HashMap;

use glam::Vec3;

use super::ray::{Ray, ray_sphere};
use super::target::{Target, TargetId, TargetPopulation};
use super::timer::{TimerKind, Timers};
use super::weapon::WeaponConfig;
use crate::consts::BALLOON_RADIUS;
use crate::tuning::Tuning;

/// Presentation delay between successive pops of one penetrating shot
pub const POP_STAGGER_MS: u64 = 50;

/// Nearest crossing of a balloon by any ray of a shot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotHit {
    pub target: TargetId,
    pub distance: f32,
}

/// A balloon removed by a shot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Popped {
    pub id: TargetId,
    pub position: Vec3,
    pub color_index: u8,
    pub points: u64,
    /// When presentation should show the pop, relative to the shot
    pub delay_ms: u64,
}

/// Everything one trigger pull changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShotOutcome {
    pub popped: Vec<Popped>,
    /// Extra points for resolving more than one balloon
    pub bonus: u64,
}

impl ShotOutcome {
    pub fn miss() -> Self {
        Self::default()
    }

    pub fn is_miss(&self) -> bool {
        self.popped.is_empty()
    }

    pub fn points(&self) -> u64 {
        self.popped.iter().map(|p| p.points).sum::<u64>() + self.bonus
    }
}

/// Every balloon crossed by any ray, nearest first (ties by id)
pub fn collect_hits(rays: &[Ray], targets: &[Target]) -> Vec<ShotHit> {
    let mut nearest: HashMap<TargetId, f32> = HashMap::new();
    for ray in rays {
        for target in targets {
            let result = ray_sphere(ray, target.position, BALLOON_RADIUS);
            if !result.hit {
                continue;
            }
            nearest
                .entry(target.id)
                .and_modify(|d| *d = d.min(result.distance))
                .or_insert(result.distance);
        }
    }

    let mut hits: Vec<ShotHit> = nearest
        .into_iter()
        .map(|(target, distance)| ShotHit { target, distance })
        .collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.target.cmp(&b.target)));
    hits
}

/// Pop the balloons a shot reaches and schedule their replacements
pub fn resolve_shot(
    rays: &[Ray],
    population: &mut TargetPopulation,
    weapon: &WeaponConfig,
    tuning: &Tuning,
    timers: &mut Timers,
) -> ShotOutcome {
    let hits = collect_hits(rays, population.targets());
    if hits.is_empty() {
        return ShotOutcome::miss();
    }

    let points = weapon.points_for(tuning.score.base_score);
    let mut outcome = ShotOutcome::miss();
    for hit in hits.iter().take(weapon.max_penetration as usize) {
        let Some(target) = population.remove(hit.target) else {
            continue;
        };
        timers.schedule_once(TimerKind::PendingRespawn, tuning.spawning.respawn_delay_ms);
        outcome.popped.push(Popped {
            id: target.id,
            position: target.position,
            color_index: target.color_index,
            points,
            delay_ms: outcome.popped.len() as u64 * POP_STAGGER_MS,
        });
    }

    let extra = outcome.popped.len().saturating_sub(1) as u64;
    outcome.bonus = extra * tuning.score.penetration_bonus_per_extra as u64;

    if outcome.popped.len() > 1 {
        log::debug!(
            "Penetrating shot popped {} balloons (+{} bonus)",
            outcome.popped.len(),
            outcome.bonus
        );
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arena::Bounds;
    use crate::sim::weapon::WeaponKind;
    use crate::tuning::SpawnTuning;

    fn population(positions: &[Vec3]) -> (TargetPopulation, Vec<TargetId>) {
        let mut pop = TargetPopulation::new(Bounds::standard(), SpawnTuning::default(), 7);
        let ids = positions
            .iter()
            .map(|p| pop.spawn_at(*p, Vec3::ZERO).unwrap())
            .collect();
        (pop, ids)
    }

    fn forward_ray() -> Ray {
        Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Z)
    }

    #[test]
    fn test_single_target_hit() {
        let (mut pop, ids) = population(&[Vec3::new(0.0, 10.0, -10.0), Vec3::new(20.0, 10.0, -10.0)]);
        let mut timers = Timers::new();
        let config = WeaponConfig::for_kind(WeaponKind::Pistol);

        let outcome = resolve_shot(&[forward_ray()], &mut pop, &config, &Tuning::default(), &mut timers);

        assert_eq!(outcome.points(), 10);
        assert_eq!(outcome.popped.len(), 1);
        assert_eq!(outcome.popped[0].id, ids[0]);
        assert_eq!(pop.len(), 1);
        assert_eq!(timers.pending_of(TimerKind::PendingRespawn), 1);

        assert!(timers.advance(999).is_empty());
        assert_eq!(timers.advance(1).len(), 1);
    }

    #[test]
    fn test_penetration_caps_at_three() {
        let positions: Vec<Vec3> = (1..=5)
            .map(|i| Vec3::new(0.0, 10.0, -5.0 * i as f32))
            .collect();
        let (mut pop, ids) = population(&positions);
        let mut timers = Timers::new();
        let config = WeaponConfig::for_kind(WeaponKind::Sniper);

        let outcome = resolve_shot(&[forward_ray()], &mut pop, &config, &Tuning::default(), &mut timers);

        let popped: Vec<_> = outcome.popped.iter().map(|p| p.id).collect();
        assert_eq!(popped, ids[..3].to_vec());
        assert_eq!(outcome.bonus, 10);
        assert_eq!(outcome.points(), 3 * 20 + 10);
        assert_eq!(pop.len(), 2);
        assert_eq!(timers.pending_of(TimerKind::PendingRespawn), 3);

        let delays: Vec<_> = outcome.popped.iter().map(|p| p.delay_ms).collect();
        assert_eq!(delays, vec![0, 50, 100]);
    }

    #[test]
    fn test_duplicate_rays_count_once() {
        let (mut pop, _) = population(&[Vec3::new(0.0, 10.0, -10.0)]);
        let mut timers = Timers::new();
        let config = WeaponConfig::for_kind(WeaponKind::Sniper);
        let rays = [forward_ray(), forward_ray(), forward_ray()];

        let hits = collect_hits(&rays, pop.targets());
        assert_eq!(hits.len(), 1);

        let outcome = resolve_shot(&rays, &mut pop, &config, &Tuning::default(), &mut timers);
        assert_eq!(outcome.popped.len(), 1);
        assert_eq!(outcome.bonus, 0);
        assert_eq!(outcome.points(), 20);
    }

    #[test]
    fn test_dedup_keeps_nearest_distance() {
        let (pop, ids) = population(&[Vec3::new(0.0, 10.0, -10.0)]);
        let straight = forward_ray();
        let grazing = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.09, 0.0, -1.0));
        let hits = collect_hits(&[grazing, straight], pop.targets());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, ids[0]);
        assert!((hits[0].distance - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_equal_distance_breaks_ties_by_id() {
        let (pop, ids) = population(&[Vec3::new(3.0, 10.0, -10.0), Vec3::new(-3.0, 10.0, -10.0)]);
        let rays = [
            Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(-0.3, 0.0, -1.0)),
            Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.3, 0.0, -1.0)),
        ];
        let hits = collect_hits(&rays, pop.targets());
        assert_eq!(hits.len(), 2);
        assert!((hits[0].distance - hits[1].distance).abs() < 1e-4);
        assert_eq!(hits[0].target, ids[0]);
    }

    #[test]
    fn test_miss_changes_nothing() {
        let (mut pop, _) = population(&[Vec3::new(0.0, 10.0, 10.0)]);
        let mut timers = Timers::new();
        let config = WeaponConfig::for_kind(WeaponKind::Rifle);
        let outcome = resolve_shot(&[forward_ray()], &mut pop, &config, &Tuning::default(), &mut timers);
        assert!(outcome.is_miss());
        assert_eq!(outcome.points(), 0);
        assert_eq!(pop.len(), 1);
        assert!(timers.is_empty());
    }
}
