//! # Hookwire Game Layer
//!
//! This crate bridges the host process to extensions: it installs
//! interception hooks, turns packets and entity callbacks into events, and
//! exposes index-addressable entity views.
//!
//! ## Modules
//!
//! - `host` / `hooks` - The host seam and its interception points
//! - `memory` - In-process host used by tests and the launcher
//! - `entities` / `data` - Host entity tables and cached wrappers
//! - `map` - The host's world tile grid
//! - `player` / `npc` / `projectile` - Entity wrappers
//! - `dispatch` - Per-kind packet routing tables
//! - `players` / `npcs` / `projectiles` / `world` - Built-in services
//! - `builtin` - Module binding the built-in services
//! - `events` - Game events raised by the services
//! - `guard` - Replay reentrancy guard
//! - `pool` - Pooled send buffers

pub mod builtin;
pub mod data;
pub mod dispatch;
pub mod entities;
pub mod events;
pub mod guard;
pub mod hooks;
pub mod host;
pub mod map;
pub mod memory;
pub mod npc;
pub mod npcs;
pub mod player;
pub mod players;
pub mod pool;
pub mod projectile;
pub mod projectiles;
pub mod world;

// Re-export commonly used types
pub use builtin::BuiltinModule;
pub use data::{NpcData, PlayerData, ProjectileData};
pub use dispatch::{Direction, DispatchTable, PlayerList};
pub use entities::{Entity, EntityCell, EntityList, EntityTable};
pub use events::*;
pub use guard::ReplayGuard;
pub use hooks::{HookResult, HostHooks, LootDrop, SocketId};
pub use host::Host;
pub use map::TileMap;
pub use memory::{MemoryHost, MEMORY_VERSION};
pub use npc::Npc;
pub use npcs::{HostNpcService, NpcList, NpcService};
pub use player::Player;
pub use players::{HostPlayerService, PlayerService};
pub use pool::{BufferPool, PooledBuffer};
pub use projectile::Projectile;
pub use projectiles::{HostProjectileService, ProjectileList, ProjectileService};
pub use world::{HostWorldService, WorldService};
