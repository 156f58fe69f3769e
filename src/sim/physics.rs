//! Physics capability for the player body
//!
//! The motion controller only talks to `PhysicsBody`. Contact reports are
//! drained once per tick instead of pushed through callbacks; the controller
//! keeps its own fallbacks because contact delivery from real engines is not
//! reliable enough to gate jumping on.

use glam::Vec3;

use super::arena::Bounds;

/// A collision reported by the physics backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Surface normal pointing toward the player body
    pub normal: Vec3,
}

/// What the player controller needs from a physics engine
pub trait PhysicsBody {
    fn position(&self) -> Vec3;
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);
    fn set_position(&mut self, position: Vec3);
    /// Integrate one step
    fn step(&mut self, dt: f32);
    /// Contacts collected since the last drain
    fn drain_contacts(&mut self) -> Vec<Contact>;
    /// Backend's own opinion on whether the body is standing on something
    fn query_grounded(&self) -> bool;
}

/// Built-in arcade body: a sphere over the ground plane `y = 0`
#[derive(Debug, Clone)]
pub struct ArcadeBody {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
    pub gravity: f32,
    pub restitution: f32,
    /// Horizontal walls (Y of the bounds is ignored)
    pub walls: Option<Bounds>,
    resting: bool,
    contacts: Vec<Contact>,
}

/// Bounce speeds below this settle instead of bouncing
const SETTLE_SPEED: f32 = 0.5;

impl ArcadeBody {
    pub fn new(position: Vec3, radius: f32, gravity: f32, restitution: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            radius,
            gravity,
            restitution,
            walls: None,
            resting: false,
            contacts: Vec::new(),
        }
    }

    pub fn with_walls(mut self, walls: Bounds) -> Self {
        self.walls = Some(walls);
        self
    }
}

impl PhysicsBody for ArcadeBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        if velocity.y > 0.0 {
            self.resting = false;
        }
        self.velocity = velocity;
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.resting = false;
    }

    fn step(&mut self, dt: f32) {
        self.velocity.y += self.gravity * dt;
        self.position += self.velocity * dt;

        if self.position.y <= self.radius {
            self.position.y = self.radius;
            if self.velocity.y <= 0.0 {
                let impact = -self.velocity.y;
                self.velocity.y = if impact * self.restitution > SETTLE_SPEED {
                    impact * self.restitution
                } else {
                    0.0
                };
                self.resting = self.velocity.y == 0.0;
                self.contacts.push(Contact { normal: Vec3::Y });
            }
        } else {
            self.resting = false;
        }

        if let Some(walls) = self.walls {
            let r = self.radius;
            for (pos, vel, lo, hi) in [
                (&mut self.position.x, &mut self.velocity.x, walls.min.x, walls.max.x),
                (&mut self.position.z, &mut self.velocity.z, walls.min.z, walls.max.z),
            ] {
                if *pos < lo + r {
                    *pos = lo + r;
                    *vel = (*vel).max(0.0);
                } else if *pos > hi - r {
                    *pos = hi - r;
                    *vel = (*vel).min(0.0);
                }
            }
        }
    }

    fn drain_contacts(&mut self) -> Vec<Contact> {
        std::mem::take(&mut self.contacts)
    }

    fn query_grounded(&self) -> bool {
        self.resting
    }
}
