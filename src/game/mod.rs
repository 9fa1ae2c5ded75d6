//! Game Simulation Module
//!
//! The space-combat core: a galaxy of star systems, planets and stations,
//! ships flown by the player or by AI, projectiles, asteroids and loot, all
//! driven by a fixed-step physics world.
//!
//! Key concepts:
//! - ObjectId: Generational handle for safe object references
//! - WorldObject: Closed set of simulated object kinds
//! - ObjectManager: Live and far objects, one sync point per frame
//! - Event: Effects and sounds leave the simulation as events
//! - GameSession: Hero lifecycle, pause, time factor and saving
//!
//! Design philosophy:
//! - Deferred structural changes (no add/remove mid-iteration)
//! - Objects far from the camera keep only a lightweight snapshot
//! - Rendering and audio never reach into the simulation

pub mod asteroid;
pub mod camera;
pub mod catalog;
pub mod components;
pub mod config;
pub mod contact;
pub mod drawable;
pub mod entity;
pub mod event;
pub mod faction;
pub mod hero;
pub mod item;
pub mod loot;
pub mod object;
pub mod object_manager;
pub mod particles;
pub mod physics;
pub mod planet;
pub mod projectile;
pub mod renderer;
pub mod runtime;
pub mod save;
pub mod session;
pub mod ship;
pub mod station;
pub mod world;

// Re-export main types
pub use catalog::Catalog;
pub use config::SimSettings;
pub use renderer::Renderer;
pub use save::SaveManager;
pub use session::{GameSession, SessionStart};
