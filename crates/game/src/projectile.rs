//! Projectile wrapper

use std::fmt;

use hookwire_core::{ProjectileId, Vector2f};

use crate::data::ProjectileData;
use crate::entities::EntityCell;

/// Handle onto one projectile record
pub struct Projectile {
    index: Option<usize>,
    data: EntityCell<ProjectileData>,
}

impl Projectile {
    pub fn new(index: Option<usize>, data: EntityCell<ProjectileData>) -> Self {
        Self { index, data }
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn is_active(&self) -> bool {
        self.data.read().active
    }

    pub fn remove(&self) {
        self.data.write().active = false;
    }

    pub fn id(&self) -> ProjectileId {
        self.data.read().id
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

    pub fn damage(&self) -> i32 {
        self.data.read().damage
    }

    pub fn set_damage(&self, damage: i32) {
        self.data.write().damage = damage;
    }

    pub fn knockback(&self) -> f32 {
        self.data.read().knockback
    }

    pub fn set_knockback(&self, knockback: f32) {
        self.data.write().knockback = knockback;
    }
}

impl fmt::Debug for Projectile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projectile")
            .field("index", &self.index)
            .field("id", &self.data.read().id)
            .finish()
    }
}
