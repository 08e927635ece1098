//! Host-side entity records

use hookwire_core::{Buff, CharacterDifficulty, NpcId, ProjectileId, Team, Vector2f};

use crate::entities::Entity;

/// Buff slots per player
pub const PLAYER_BUFF_SLOTS: usize = 44;
/// Buff slots per NPC
pub const NPC_BUFF_SLOTS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerData {
    pub active: bool,
    pub name: String,
    pub health: i32,
    pub max_health: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub is_in_pvp: bool,
    pub team: Team,
    pub difficulty: CharacterDifficulty,
    pub buffs: [Buff; PLAYER_BUFF_SLOTS],
    pub position: Vector2f,
}

impl Default for PlayerData {
    fn default() -> Self {
        Self {
            active: false,
            name: String::new(),
            health: 100,
            max_health: 100,
            mana: 0,
            max_mana: 20,
            is_in_pvp: false,
            team: Team::None,
            difficulty: CharacterDifficulty::default(),
            buffs: [Buff::default(); PLAYER_BUFF_SLOTS],
            position: Vector2f::ZERO,
        }
    }
}

impl Entity for PlayerData {
    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NpcData {
    pub active: bool,
    pub id: NpcId,
    pub name: String,
    pub position: Vector2f,
    pub velocity: Vector2f,
    pub health: i32,
    pub max_health: i32,
    pub buffs: [Buff; NPC_BUFF_SLOTS],
}

impl NpcData {
    /// Reset the record to the host's defaults for `id`
    pub fn apply_defaults(&mut self, id: NpcId) {
        let (name, health) = match id {
            NpcId::BLUE_SLIME => ("Blue Slime", 25),
            NpcId::GREEN_SLIME => ("Green Slime", 14),
            NpcId::GOLDFISH => ("Goldfish", 5),
            NpcId::NONE => ("", 0),
            _ => ("Unknown", 1),
        };
        self.id = id;
        self.name = name.to_string();
        self.health = health;
        self.max_health = health;
        self.velocity = Vector2f::ZERO;
        self.buffs = [Buff::default(); NPC_BUFF_SLOTS];
    }
}

impl Entity for NpcData {
    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectileData {
    pub active: bool,
    pub id: ProjectileId,
    pub position: Vector2f,
    pub velocity: Vector2f,
    pub damage: i32,
    pub knockback: f32,
    /// Remaining lifetime in ticks
    pub time_left: i32,
}

impl ProjectileData {
    pub fn apply_defaults(&mut self, id: ProjectileId) {
        self.id = id;
        self.time_left = match id {
            ProjectileId::NONE => 0,
            _ => 3600,
        };
        self.damage = 0;
        self.knockback = 0.0;
    }
}

impl Entity for ProjectileData {
    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}
