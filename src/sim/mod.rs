//! Gameplay simulation module
//!
//! All gameplay logic lives here. This module stays free of platform code:
//! - Fixed timestep only, driven by the caller
//! - Seeded RNG only
//! - Stable iteration order (balloons by id, timers by due time)
//! - Platform devices (aim capture, audio, physics) behind traits

pub mod arena;
pub mod game;
pub mod hit;
pub mod input;
pub mod lock;
pub mod physics;
pub mod player;
pub mod ray;
pub mod session;
pub mod target;
pub mod timer;
pub mod weapon;

pub use arena::{ArenaKind, Bounds};
pub use game::{Game, GameEvent, Hud, Snapshot, TargetView, TickInput, WeaponView};
pub use hit::{ShotHit, ShotOutcome, collect_hits, resolve_shot};
pub use input::{InputEvent, Key, KeyState};
pub use lock::{AimCapture, AlwaysCapture, LockCoordinator, LockError};
pub use physics::{ArcadeBody, Contact, PhysicsBody};
pub use player::{CameraPose, PlayerController};
pub use ray::{Ray, RayHit, build_aim_rays, ray_sphere};
pub use session::{CountdownTick, Phase, Session, TransitionError};
pub use target::{RenderHandle, Target, TargetId, TargetPopulation};
pub use timer::{TimerId, TimerKind, Timers};
pub use weapon::{Weapon, WeaponConfig, WeaponKind};
