//! NPC wrapper

use std::fmt;

use hookwire_core::{Buff, NpcId, Vector2f};

use crate::data::{NpcData, NPC_BUFF_SLOTS};
use crate::entities::EntityCell;

/// Handle onto one NPC record
///
/// Detached handles wrap records that the host built outside its table,
/// such as templates; they have no index.
pub struct Npc {
    index: Option<usize>,
    data: EntityCell<NpcData>,
}

impl Npc {
    pub fn new(index: Option<usize>, data: EntityCell<NpcData>) -> Self {
        Self { index, data }
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn is_active(&self) -> bool {
        self.data.read().active
    }

    /// Remove the NPC from the world without killing it
    pub fn despawn(&self) {
        self.data.write().active = false;
    }

    pub fn id(&self) -> NpcId {
        self.data.read().id
    }

    pub fn name(&self) -> String {
        self.data.read().name.clone()
    }

    pub fn position(&self) -> Vector2f {
        self.data.read().position
    }

    pub fn set_position(&self, position: Vector2f) {
        self.data.write().position = position;
    }

    pub fn velocity(&self) -> Vector2f {
        self.data.read().velocity
    }

    pub fn set_velocity(&self, velocity: Vector2f) {
        self.data.write().velocity = velocity;
    }

    pub fn health(&self) -> i32 {
        self.data.read().health
    }

    pub fn set_health(&self, health: i32) {
        self.data.write().health = health;
    }

    pub fn max_health(&self) -> i32 {
        self.data.read().max_health
    }

    /// Active buffs, skipping empty slots
    pub fn buffs(&self) -> Vec<Buff> {
        self.data.read().buffs.iter().copied().filter(|buff| buff.ticks > 0).collect()
    }

    /// Apply a buff
    ///
    /// Refreshes an existing buff of the same id, otherwise takes the first
    /// empty slot.
    ///
    /// # Returns
    /// `false` when every slot is taken by another buff
    pub fn add_buff(&self, buff: Buff) -> bool {
        let mut data = self.data.write();
        let slot = data
            .buffs
            .iter()
            .position(|existing| existing.ticks > 0 && existing.id == buff.id)
            .or_else(|| data.buffs.iter().position(|existing| existing.ticks <= 0));
        match slot {
            Some(slot) => {
                data.buffs[slot] = buff;
                true
            }
            None => false,
        }
    }

    pub fn buff_slots(&self) -> usize {
        NPC_BUFF_SLOTS
    }
}

impl fmt::Debug for Npc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Npc")
            .field("index", &self.index)
            .field("id", &self.data.read().id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookwire_core::BuffId;
    use parking_lot::RwLock;
    use std::sync::Arc;

    #[test]
    fn test_add_buff_refreshes_and_fills() {
        let npc = Npc::new(Some(0), Arc::new(RwLock::new(NpcData::default())));
        assert!(npc.add_buff(Buff::new(BuffId(20), 60)));
        assert!(npc.add_buff(Buff::new(BuffId(20), 120)));
        assert_eq!(npc.buffs(), vec![Buff::new(BuffId(20), 120)]);

        for id in 21..25 {
            assert!(npc.add_buff(Buff::new(BuffId(id), 10)));
        }
        assert!(!npc.add_buff(Buff::new(BuffId(99), 10)));
        assert_eq!(npc.buffs().len(), npc.buff_slots());
    }

    #[test]
    fn test_despawn() {
        let data = NpcData {
            active: true,
            ..NpcData::default()
        };
        let npc = Npc::new(None, Arc::new(RwLock::new(data)));
        assert!(npc.is_active());
        npc.despawn();
        assert!(!npc.is_active());
        assert_eq!(npc.index(), None);
    }
}
