//! Game simulation modules

pub mod arena;
pub mod celestial;
pub mod combat;
pub mod constants;
pub mod damage;
pub mod entity;
pub mod error;
pub mod math;
pub mod npc;
pub mod physics;
pub mod powerup;
pub mod respawn;
pub mod snapshot;
pub mod world;


pub use arena::{ArenaHandle, GameArena, GameCommand};
pub use snapshot::Frame;
pub use world::WorldConfig;
