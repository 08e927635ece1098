//! # Host Interception Points
//!
//! The host calls into these slots at fixed points of its network and
//! simulation loops. Each slot holds at most one callback; installing a new
//! one replaces the old. Callbacks answer with a [`HookResult`].

use std::sync::Arc;

use hookwire_core::{ItemId, ItemPrefix, NpcId, ProjectileId};
use parking_lot::RwLock;

use crate::entities::EntityCell;
use crate::data::{NpcData, ProjectileData};

/// Whether the host should run its own handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookResult {
    /// Run the host's normal processing
    Continue,
    /// Suppress the host's normal processing
    Cancel,
}

/// Identifies a connection's socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(pub u64);

/// Item about to be dropped as NPC loot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LootDrop {
    pub id: ItemId,
    pub stack_size: i32,
    pub prefix: ItemPrefix,
}

/// Raw frame body received from a client (`body[0]` is the packet id)
pub type ReceiveDataHook = dyn Fn(usize, &[u8]) -> HookResult + Send + Sync;
/// Complete frame about to be written to a client
pub type SendBytesHook = dyn Fn(usize, &[u8]) -> HookResult + Send + Sync;
/// Complete module frame about to be written to a socket
pub type SendNetDataHook = dyn Fn(SocketId, &[u8]) -> HookResult + Send + Sync;
/// Slot index about to be updated or reset
pub type IndexHook = dyn Fn(usize) -> HookResult + Send + Sync;
/// NPC defaults about to be applied; the slot is `None` for objects outside the table
pub type NpcSetDefaultsHook = dyn Fn(Option<usize>, &EntityCell<NpcData>, &mut NpcId) -> HookResult + Send + Sync;
/// Loot about to be dropped by the NPC in a slot
pub type NpcLootHook = dyn Fn(usize, &mut LootDrop) -> HookResult + Send + Sync;
/// Projectile defaults about to be applied
pub type ProjectileSetDefaultsHook =
    dyn Fn(Option<usize>, &EntityCell<ProjectileData>, &mut ProjectileId) -> HookResult + Send + Sync;
/// The world is about to be written out
pub type WorldSaveHook = dyn Fn() -> HookResult + Send + Sync;

/// One installable callback
pub struct Hook<F: ?Sized> {
    slot: RwLock<Option<Arc<F>>>,
}

impl<F: ?Sized> Hook<F> {
    pub fn new() -> Self {
        Self { slot: RwLock::new(None) }
    }

    /// Install a callback, replacing any previous one
    pub fn set(&self, callback: Arc<F>) {
        *self.slot.write() = Some(callback);
    }

    pub fn clear(&self) {
        *self.slot.write() = None;
    }

    /// The installed callback
    ///
    /// The lock is released before returning, so the callback may install
    /// or clear hooks itself.
    pub fn get(&self) -> Option<Arc<F>> {
        self.slot.read().clone()
    }

    pub fn is_set(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl<F: ?Sized> Default for Hook<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Every interception point the host exposes
#[derive(Default)]
pub struct HostHooks {
    pub receive_data: Hook<ReceiveDataHook>,
    pub send_bytes: Hook<SendBytesHook>,
    pub send_net_data: Hook<SendNetDataHook>,
    pub player_pre_update: Hook<IndexHook>,
    pub client_pre_reset: Hook<IndexHook>,
    pub npc_set_defaults: Hook<NpcSetDefaultsHook>,
    pub npc_spawn: Hook<IndexHook>,
    pub npc_pre_update: Hook<IndexHook>,
    pub npc_killed: Hook<IndexHook>,
    pub npc_loot: Hook<NpcLootHook>,
    pub projectile_set_defaults: Hook<ProjectileSetDefaultsHook>,
    pub projectile_pre_update: Hook<IndexHook>,
    pub world_save: Hook<WorldSaveHook>,
}

impl HostHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of installed callbacks
    pub fn installed(&self) -> usize {
        [
            self.receive_data.is_set(),
            self.send_bytes.is_set(),
            self.send_net_data.is_set(),
            self.player_pre_update.is_set(),
            self.client_pre_reset.is_set(),
            self.npc_set_defaults.is_set(),
            self.npc_spawn.is_set(),
            self.npc_pre_update.is_set(),
            self.npc_killed.is_set(),
            self.npc_loot.is_set(),
            self.projectile_set_defaults.is_set(),
            self.projectile_pre_update.is_set(),
            self.world_save.is_set(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }
}

/// Run an index hook, defaulting to [`HookResult::Continue`] when empty
pub fn run_index_hook(hook: &Hook<IndexHook>, index: usize) -> HookResult {
    match hook.get() {
        Some(callback) => callback(index),
        None => HookResult::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_set_and_clear() {
        let hooks = HostHooks::new();
        assert_eq!(hooks.installed(), 0);
        assert_eq!(run_index_hook(&hooks.npc_spawn, 3), HookResult::Continue);

        hooks.npc_spawn.set(Arc::new(|index| {
            if index == 3 {
                HookResult::Cancel
            } else {
                HookResult::Continue
            }
        }));
        assert_eq!(hooks.installed(), 1);
        assert_eq!(run_index_hook(&hooks.npc_spawn, 3), HookResult::Cancel);
        assert_eq!(run_index_hook(&hooks.npc_spawn, 4), HookResult::Continue);

        hooks.npc_spawn.clear();
        assert!(!hooks.npc_spawn.is_set());
    }

    #[test]
    fn test_hook_may_clear_itself() {
        let hooks = Arc::new(HostHooks::new());
        let inner = Arc::downgrade(&hooks);
        hooks.player_pre_update.set(Arc::new(move |_| {
            if let Some(hooks) = inner.upgrade() {
                hooks.player_pre_update.clear();
            }
            HookResult::Continue
        }));

        run_index_hook(&hooks.player_pre_update, 0);
        assert!(!hooks.player_pre_update.is_set());
    }
}
