//! Built-in services module

use std::sync::Arc;

use hookwire_extensions::{BindingPriority, Candidate, ExtensionModule, ModuleBuilder, ServiceScope};

use crate::npcs::{HostNpcService, NpcService};
use crate::players::{HostPlayerService, PlayerService};
use crate::projectiles::{HostProjectileService, ProjectileService};
use crate::world::{HostWorldService, WorldService};

const AUTHOR: &str = "Hookwire";

/// Declares the player, NPC, projectile and world capabilities
///
/// Every implementation is bound at [`BindingPriority::LOWEST`], so any
/// other module declaring the same capability replaces it.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinModule;

impl ExtensionModule for BuiltinModule {
    fn name(&self) -> &str {
        "hookwire-builtin"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn register(&self, builder: &mut ModuleBuilder) {
        builder
            .declare_interface::<dyn PlayerService>(ServiceScope::Singleton)
            .declare_interface::<dyn NpcService>(ServiceScope::Singleton)
            .declare_interface::<dyn ProjectileService>(ServiceScope::Singleton)
            .declare_interface::<dyn WorldService>(ServiceScope::Singleton)
            .declare_candidate(
                Candidate::<dyn PlayerService>::new("hookwire-players", HostPlayerService::new, |s| {
                    s as Arc<dyn PlayerService>
                })
                .author(AUTHOR)
                .priority(BindingPriority::LOWEST),
            )
            .declare_candidate(
                Candidate::<dyn NpcService>::new("hookwire-npcs", HostNpcService::new, |s| s as Arc<dyn NpcService>)
                    .author(AUTHOR)
                    .priority(BindingPriority::LOWEST)
                    .depends_on::<dyn PlayerService>(),
            )
            .declare_candidate(
                Candidate::<dyn ProjectileService>::new("hookwire-projectiles", HostProjectileService::new, |s| {
                    s as Arc<dyn ProjectileService>
                })
                .author(AUTHOR)
                .priority(BindingPriority::LOWEST),
            )
            .declare_candidate(
                Candidate::<dyn WorldService>::new("hookwire-world", HostWorldService::new, |s| {
                    s as Arc<dyn WorldService>
                })
                .author(AUTHOR)
                .priority(BindingPriority::LOWEST),
            );
    }
}
