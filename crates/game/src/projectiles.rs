//! Projectile service

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use hookwire_core::{ProjectileId, Vector2f};
use hookwire_events::{Event, EventBus};
use hookwire_extensions::{Extension, ExtensionContext};

use crate::data::ProjectileData;
use crate::entities::{EntityCell, EntityList};
use crate::events::{ProjectileDefaultsEvent, ProjectileTickEvent};
use crate::hooks::HookResult;
use crate::host::Host;
use crate::projectile::Projectile;

pub type ProjectileList = EntityList<ProjectileData, Projectile>;

/// Projectile capability
pub trait ProjectileService: Send + Sync {
    fn projectiles(&self) -> &ProjectileList;

    /// Spawn a projectile
    ///
    /// # Arguments
    /// * `id` - Projectile kind
    /// * `position` - World position
    /// * `velocity` - Initial velocity
    /// * `damage` - Damage dealt on hit
    /// * `knockback` - Knockback dealt on hit
    ///
    /// # Returns
    /// The new projectile, or `None` when the table is full
    fn spawn(
        &self,
        id: ProjectileId,
        position: Vector2f,
        velocity: Vector2f,
        damage: i32,
        knockback: f32,
    ) -> Option<Arc<Projectile>>;
}

pub struct HostProjectileService {
    host: Arc<dyn Host>,
    events: Arc<EventBus>,
    projectiles: ProjectileList,
    owner: String,
    span: tracing::Span,
    disposed: AtomicBool,
}

impl HostProjectileService {
    pub fn new(ctx: &ExtensionContext<'_>) -> anyhow::Result<Arc<Self>> {
        let host = ctx.get::<dyn Host>()?;
        let events = ctx.events()?;

        let service = Arc::new(Self {
            projectiles: EntityList::new(host.projectiles().clone(), Projectile::new),
            host,
            events,
            owner: ctx.name().to_string(),
            span: ctx.span(),
            disposed: AtomicBool::new(false),
        });

        let hooks = service.host.hooks();
        let weak = Arc::downgrade(&service);
        hooks.projectile_set_defaults.set(Arc::new(
            move |slot: Option<usize>, cell: &EntityCell<ProjectileData>, id: &mut ProjectileId| {
                with_service(&weak, |service| service.on_set_defaults(slot, cell, id))
            },
        ));
        let weak = Arc::downgrade(&service);
        hooks
            .projectile_pre_update
            .set(Arc::new(move |index| with_service(&weak, |service| service.on_pre_update(index))));

        tracing::debug!(parent: &service.span, "Installed projectile hooks");
        Ok(service)
    }

    fn on_set_defaults(&self, slot: Option<usize>, cell: &EntityCell<ProjectileData>, id: &mut ProjectileId) -> HookResult {
        let projectile = self.projectiles.resolve(slot, cell);
        let mut evt = ProjectileDefaultsEvent::new(projectile, *id);
        self.events.raise(&mut evt);
        if evt.is_canceled() {
            return HookResult::Cancel;
        }
        *id = evt.id;
        HookResult::Continue
    }

    fn on_pre_update(&self, index: usize) -> HookResult {
        let Ok(projectile) = self.projectiles.get(index) else {
            return HookResult::Continue;
        };
        let mut evt = ProjectileTickEvent::new(projectile);
        self.events.raise(&mut evt);
        if evt.is_canceled() {
            HookResult::Cancel
        } else {
            HookResult::Continue
        }
    }
}

fn with_service<F>(weak: &Weak<HostProjectileService>, f: F) -> HookResult
where
    F: FnOnce(&HostProjectileService) -> HookResult,
{
    match weak.upgrade() {
        Some(service) => f(&service),
        None => HookResult::Continue,
    }
}

impl ProjectileService for HostProjectileService {
    fn projectiles(&self) -> &ProjectileList {
        &self.projectiles
    }

    fn spawn(
        &self,
        id: ProjectileId,
        position: Vector2f,
        velocity: Vector2f,
        damage: i32,
        knockback: f32,
    ) -> Option<Arc<Projectile>> {
        let index = self.host.spawn_projectile(id, position, velocity, damage, knockback)?;
        self.projectiles.get(index).ok()
    }
}

impl Extension for HostProjectileService {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let hooks = self.host.hooks();
        hooks.projectile_set_defaults.clear();
        hooks.projectile_pre_update.clear();
        self.events.deregister_owner(&self.owner);
        tracing::debug!(parent: &self.span, "Removed projectile hooks");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use hookwire_events::EventPriority;
    use parking_lot::Mutex;

    #[test]
    fn test_projectiles_view() {
        let harness = Harness::new();
        assert_eq!(harness.projectiles().projectiles().count(), 1000);
        assert!(harness.projectiles().projectiles().get(1000).is_err());
    }

    #[test]
    fn test_spawn_projectile() {
        let harness = Harness::new();
        let projectile = harness
            .projectiles()
            .spawn(
                ProjectileId::WOODEN_ARROW,
                Vector2f::new(100.0, 100.0),
                Vector2f::new(2.0, -1.0),
                12,
                1.5,
            )
            .unwrap();

        assert_eq!(projectile.index(), Some(0));
        assert_eq!(projectile.id(), ProjectileId::WOODEN_ARROW);
        assert_eq!(projectile.damage(), 12);
        assert_eq!(projectile.knockback(), 1.5);
        assert!(projectile.is_active());

        harness.host.tick();
        assert_eq!(projectile.position(), Vector2f::new(102.0, 99.0));
    }

    #[test]
    fn test_defaults_event_replaces_id() {
        let harness = Harness::new();
        harness
            .events()
            .register::<ProjectileDefaultsEvent, _>("test", EventPriority::Normal, |evt| {
                evt.id = ProjectileId::FIRE_ARROW;
            });

        let projectile = harness
            .projectiles()
            .spawn(ProjectileId::WOODEN_ARROW, Vector2f::ZERO, Vector2f::ZERO, 0, 0.0)
            .unwrap();
        assert_eq!(projectile.id(), ProjectileId::FIRE_ARROW);
    }

    #[test]
    fn test_defaults_for_detached_projectile() {
        let harness = Harness::new();
        let seen = Arc::new(Mutex::new(None));
        let record = seen.clone();
        harness
            .events()
            .register::<ProjectileDefaultsEvent, _>("test", EventPriority::Normal, move |evt| {
                *record.lock() = Some(evt.projectile.index());
            });

        let template = harness.host.projectile_template(ProjectileId::WOODEN_ARROW);
        assert_eq!(*seen.lock(), Some(None));
        assert_eq!(template.read().id, ProjectileId::WOODEN_ARROW);
    }

    #[test]
    fn test_projectile_tick_canceled() {
        let harness = Harness::new();
        let projectile = harness
            .projectiles()
            .spawn(ProjectileId::WOODEN_ARROW, Vector2f::ZERO, Vector2f::new(1.0, 1.0), 0, 0.0)
            .unwrap();
        harness
            .events()
            .register::<ProjectileTickEvent, _>("test", EventPriority::Normal, |evt| evt.cancel());

        harness.host.tick();
        assert_eq!(projectile.position(), Vector2f::ZERO);
    }

    #[test]
    fn test_spawn_fails_when_full() {
        let harness = Harness::with_capacity(8, 8, 2);
        let projectiles = harness.projectiles();
        assert!(projectiles
            .spawn(ProjectileId::WOODEN_ARROW, Vector2f::ZERO, Vector2f::ZERO, 0, 0.0)
            .is_some());
        assert!(projectiles
            .spawn(ProjectileId::WOODEN_ARROW, Vector2f::ZERO, Vector2f::ZERO, 0, 0.0)
            .is_none());
    }
}
