//! # World Service
//!
//! Exposes the host's tile grid and turns tile packets into world events:
//! block and wall breaks and placements, paint, liquid, tile squares and
//! wiring. Also raises [`WorldSaveEvent`] from the host's save callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use hookwire_core::TilePosition;
use hookwire_events::{Event, EventBus, EventPriority};
use hookwire_extensions::{Extension, ExtensionContext};
use hookwire_protocol::{
    BlockPaintPacket, Packet, TileLiquidPacket, TileModification, TileModifyPacket, TileSquarePacket,
    WallPaintPacket, WireActivatePacket,
};

use crate::events::{
    forward, BlockBreakEvent, BlockPaintEvent, BlockPlaceEvent, PacketReceiveEvent, TileLiquidEvent,
    TileSquareEvent, WallBreakEvent, WallPaintEvent, WallPlaceEvent, WiringActivateEvent, WorldSaveEvent,
};
use crate::hooks::HookResult;
use crate::host::Host;
use crate::map::TileMap;

/// World capability
pub trait WorldService: Send + Sync {
    /// The host's tile grid
    fn world(&self) -> &Arc<TileMap>;
}

pub struct HostWorldService {
    host: Arc<dyn Host>,
    events: Arc<EventBus>,
    world: Arc<TileMap>,
    owner: String,
    span: tracing::Span,
    disposed: AtomicBool,
}

fn position(x: i16, y: i16) -> TilePosition {
    TilePosition::new(i32::from(x), i32::from(y))
}

impl HostWorldService {
    pub fn new(ctx: &ExtensionContext<'_>) -> anyhow::Result<Arc<Self>> {
        let host = ctx.get::<dyn Host>()?;
        let events = ctx.events()?;

        let service = Arc::new(Self {
            world: host.world().clone(),
            host,
            events,
            owner: ctx.name().to_string(),
            span: ctx.span(),
            disposed: AtomicBool::new(false),
        });
        service.install();
        Ok(service)
    }

    fn install(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.host
            .hooks()
            .world_save
            .set(Arc::new(move || with_service(&weak, |service| service.on_save())));

        self.on_packet::<TileModifyPacket, _>(Self::on_tile_modify);
        self.on_packet::<TileSquarePacket, _>(|service, evt| {
            let square = TileSquareEvent::new(
                evt.sender.clone(),
                position(evt.packet.x, evt.packet.y),
                evt.packet.size,
                evt.packet.tiles.clone(),
            );
            let square = forward(&service.events, evt, square);
            if square.tiles.len() == evt.packet.tiles.len() {
                evt.packet.tiles = square.tiles;
            } else {
                tracing::warn!(parent: &service.span, "Ignored tile square edit that changed its length");
            }
        });
        self.on_packet::<TileLiquidPacket, _>(|service, evt| {
            let settled = TileLiquidEvent::new(
                evt.sender.clone(),
                position(evt.packet.x, evt.packet.y),
                evt.packet.amount,
                evt.packet.liquid,
            );
            let settled = forward(&service.events, evt, settled);
            evt.packet.amount = settled.amount;
            evt.packet.liquid = settled.liquid;
        });
        self.on_packet::<WireActivatePacket, _>(|service, evt| {
            let activated = WiringActivateEvent::new(evt.sender.clone(), position(evt.packet.x, evt.packet.y));
            forward(&service.events, evt, activated);
        });
        self.on_packet::<BlockPaintPacket, _>(|service, evt| {
            let at = position(evt.packet.x, evt.packet.y);
            let painted = BlockPaintEvent::new(evt.sender.clone(), at, evt.packet.color);
            let painted = forward(&service.events, evt, painted);
            evt.packet.color = painted.color;
        });
        self.on_packet::<WallPaintPacket, _>(|service, evt| {
            let at = position(evt.packet.x, evt.packet.y);
            let painted = WallPaintEvent::new(evt.sender.clone(), at, evt.packet.color);
            let painted = forward(&service.events, evt, painted);
            evt.packet.color = painted.color;
        });

        tracing::debug!(parent: &self.span, "Installed world hooks");
    }

    /// Handle every received `P` at the lowest priority
    fn on_packet<P, F>(self: &Arc<Self>, handler: F)
    where
        P: Packet,
        F: Fn(&Self, &mut PacketReceiveEvent<P>) + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(self);
        self.events
            .register::<PacketReceiveEvent<P>, _>(&self.owner, EventPriority::Lowest, move |evt| {
                if let Some(service) = weak.upgrade() {
                    handler(&service, evt);
                }
            });
    }

    fn on_tile_modify(&self, evt: &mut PacketReceiveEvent<TileModifyPacket>) {
        let packet = evt.packet;
        let player = evt.sender.clone();
        let at = position(packet.x, packet.y);

        match packet.modification {
            // A failed break only damaged the tile
            TileModification::BREAK_BLOCK | TileModification::BREAK_BLOCK_ITEMLESS if !packet.is_failure() => {
                let is_itemless = packet.modification == TileModification::BREAK_BLOCK_ITEMLESS;
                forward(&self.events, evt, BlockBreakEvent::new(player, at, is_itemless));
            }
            TileModification::PLACE_BLOCK | TileModification::REPLACE_BLOCK => {
                let is_replacement = packet.modification == TileModification::REPLACE_BLOCK;
                let placed = BlockPlaceEvent::new(player, at, packet.block_id(), packet.style, is_replacement);
                let placed = forward(&self.events, evt, placed);
                evt.packet.data = placed.id.0 as i16;
                evt.packet.style = placed.style;
            }
            TileModification::BREAK_WALL if !packet.is_failure() => {
                forward(&self.events, evt, WallBreakEvent::new(player, at));
            }
            TileModification::PLACE_WALL | TileModification::REPLACE_WALL => {
                let is_replacement = packet.modification == TileModification::REPLACE_WALL;
                let placed = WallPlaceEvent::new(player, at, packet.wall_id(), is_replacement);
                let placed = forward(&self.events, evt, placed);
                evt.packet.data = placed.id.0 as i16;
            }
            _ => {}
        }
    }

    fn on_save(&self) -> HookResult {
        let mut evt = WorldSaveEvent::new(self.world.clone());
        self.events.raise(&mut evt);
        if evt.is_canceled() {
            tracing::info!(parent: &self.span, "World save canceled");
            HookResult::Cancel
        } else {
            HookResult::Continue
        }
    }
}

fn with_service<F>(weak: &Weak<HostWorldService>, f: F) -> HookResult
where
    F: FnOnce(&HostWorldService) -> HookResult,
{
    match weak.upgrade() {
        Some(service) => f(&service),
        None => HookResult::Continue,
    }
}

impl WorldService for HostWorldService {
    fn world(&self) -> &Arc<TileMap> {
        &self.world
    }
}

impl Extension for HostWorldService {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.host.hooks().world_save.clear();
        let removed = self.events.deregister_owner(&self.owner);
        tracing::debug!(parent: &self.span, "Removed world hooks and {} handlers", removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use hookwire_core::{BlockId, ItemId, ItemPrefix, Liquid, PaintColor, Tile, WallId};
    use hookwire_protocol::PacketRole;
    use parking_lot::Mutex;

    use crate::hooks::LootDrop;

    const SENDER: usize = 5;

    fn harness() -> Harness {
        let harness = Harness::new();
        harness.host.connect(SENDER);
        harness
    }

    fn modify_frame(modification: TileModification, data: i16, style: u8) -> Vec<u8> {
        TileModifyPacket {
            modification,
            x: 100,
            y: 256,
            data,
            style,
        }
        .to_frame(PacketRole::Client)
        .unwrap()
        .to_vec()
    }

    fn drop_of(id: ItemId) -> LootDrop {
        LootDrop {
            id,
            stack_size: 1,
            prefix: ItemPrefix::NONE,
        }
    }

    fn cancel_all<E: Event>(harness: &Harness) {
        harness
            .events()
            .register::<E, _>("test", EventPriority::Normal, |evt| evt.cancel());
    }

    #[test]
    fn test_world_view() {
        let harness = harness();
        let world = harness.world();
        assert!(Arc::ptr_eq(world.world(), harness.host.world()));
        assert_eq!((world.world().width(), world.world().height()), (512, 512));
    }

    #[test]
    fn test_break_block() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.set(100, 256, Tile::block(BlockId::STONE));
        let seen = Arc::new(Mutex::new(None));
        let record = seen.clone();
        harness.events().register::<BlockBreakEvent, _>("test", EventPriority::Normal, move |evt| {
            *record.lock() = Some((evt.player.index(), evt.position, evt.is_itemless));
        });

        harness.host.receive_frame(SENDER, &[11, 0, 17, 0, 100, 0, 0, 1, 0, 0, 0]);

        assert_eq!(*seen.lock(), Some((Some(SENDER), TilePosition::new(100, 256), false)));
        assert!(!world.get(100, 256).unwrap().is_block_active);
        assert_eq!(harness.host.dropped_items(), vec![drop_of(ItemId::STONE_BLOCK)]);
    }

    #[test]
    fn test_break_block_failure() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.set(100, 256, Tile::block(BlockId::STONE));
        let raised = Arc::new(Mutex::new(false));
        let record = raised.clone();
        harness.events().register::<BlockBreakEvent, _>("test", EventPriority::Normal, move |_| {
            *record.lock() = true;
        });

        harness.host.receive_frame(SENDER, &[11, 0, 17, 0, 100, 0, 0, 1, 1, 0, 0]);

        assert!(!*raised.lock());
        assert!(world.get(100, 256).unwrap().is_block_active);
        assert!(harness.host.dropped_items().is_empty());
    }

    #[test]
    fn test_break_block_canceled() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.set(100, 256, Tile::block(BlockId::STONE));
        cancel_all::<BlockBreakEvent>(&harness);

        harness.host.receive_frame(SENDER, &[11, 0, 17, 0, 100, 0, 0, 1, 0, 0, 0]);

        assert!(world.get(100, 256).unwrap().is_block_active);
        assert!(harness.host.dropped_items().is_empty());
    }

    #[test]
    fn test_break_block_itemless() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.set(100, 256, Tile::block(BlockId::STONE));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = seen.clone();
        harness.events().register::<BlockBreakEvent, _>("test", EventPriority::Normal, move |evt| {
            record.lock().push(evt.is_itemless);
        });

        // Failure variant first: nothing happens
        harness
            .host
            .receive_frame(SENDER, &modify_frame(TileModification::BREAK_BLOCK_ITEMLESS, 1, 0));
        assert!(seen.lock().is_empty());
        assert!(world.get(100, 256).unwrap().is_block_active);

        harness.host.receive_frame(SENDER, &[11, 0, 17, 4, 100, 0, 0, 1, 0, 0, 0]);
        assert_eq!(*seen.lock(), vec![true]);
        assert!(!world.get(100, 256).unwrap().is_block_active);
        assert!(harness.host.dropped_items().is_empty());
    }

    #[test]
    fn test_place_block() {
        let harness = harness();
        let seen = Arc::new(Mutex::new(None));
        let record = seen.clone();
        harness.events().register::<BlockPlaceEvent, _>("test", EventPriority::Normal, move |evt| {
            *record.lock() = Some((evt.player.index(), evt.position, evt.id, evt.style, evt.is_replacement));
        });

        harness.host.receive_frame(SENDER, &[11, 0, 17, 1, 100, 0, 0, 1, 4, 0, 1]);

        assert_eq!(
            *seen.lock(),
            Some((Some(SENDER), TilePosition::new(100, 256), BlockId::TORCHES, 1, false))
        );
        let tile = harness.host.world().get(100, 256).unwrap();
        assert!(tile.is_block_active);
        assert_eq!(tile.block_id, BlockId::TORCHES);
        assert_eq!(tile.block_frame_y, 22);
    }

    #[test]
    fn test_place_block_edited() {
        let harness = harness();
        harness.events().register::<BlockPlaceEvent, _>("test", EventPriority::Normal, |evt| {
            evt.id = BlockId::STONE;
            evt.style = 0;
        });

        harness.host.receive_frame(SENDER, &[11, 0, 17, 1, 100, 0, 0, 1, 4, 0, 1]);

        let tile = harness.host.world().get(100, 256).unwrap();
        assert_eq!(tile.block_id, BlockId::STONE);
        assert_eq!(tile.block_frame_y, 0);
    }

    #[test]
    fn test_place_block_canceled() {
        let harness = harness();
        cancel_all::<BlockPlaceEvent>(&harness);

        harness.host.receive_frame(SENDER, &[11, 0, 17, 1, 100, 0, 0, 1, 4, 0, 1]);

        assert!(!harness.host.world().get(100, 256).unwrap().is_block_active);
    }

    #[test]
    fn test_place_block_on_occupied_tile() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.set(100, 256, Tile::block(BlockId::DIRT));

        harness.host.receive_frame(SENDER, &[11, 0, 17, 1, 100, 0, 0, 1, 4, 0, 1]);

        assert_eq!(world.get(100, 256).unwrap().block_id, BlockId::DIRT);
    }

    #[test]
    fn test_replace_block() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.set(100, 256, Tile::block(BlockId::DIRT));
        let seen = Arc::new(Mutex::new(None));
        let record = seen.clone();
        harness.events().register::<BlockPlaceEvent, _>("test", EventPriority::Normal, move |evt| {
            *record.lock() = Some((evt.id, evt.style, evt.is_replacement));
        });

        harness.host.receive_frame(SENDER, &[11, 0, 17, 21, 100, 0, 0, 1, 1, 0, 0]);

        assert_eq!(*seen.lock(), Some((BlockId::STONE, 0, true)));
        let tile = world.get(100, 256).unwrap();
        assert!(tile.is_block_active);
        assert_eq!(tile.block_id, BlockId::STONE);
        assert_eq!(harness.host.dropped_items(), vec![drop_of(ItemId::DIRT_BLOCK)]);
    }

    #[test]
    fn test_replace_block_canceled() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.set(100, 256, Tile::block(BlockId::DIRT));
        cancel_all::<BlockPlaceEvent>(&harness);

        harness.host.receive_frame(SENDER, &[11, 0, 17, 21, 100, 0, 0, 1, 1, 0, 0]);

        assert_eq!(world.get(100, 256).unwrap().block_id, BlockId::DIRT);
        assert!(harness.host.dropped_items().is_empty());
    }

    #[test]
    fn test_break_wall() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.update(100, 256, |tile| tile.wall_id = WallId::STONE);
        let seen = Arc::new(Mutex::new(None));
        let record = seen.clone();
        harness.events().register::<WallBreakEvent, _>("test", EventPriority::Normal, move |evt| {
            *record.lock() = Some((evt.player.index(), evt.position));
        });

        harness.host.receive_frame(SENDER, &[11, 0, 17, 2, 100, 0, 0, 1, 0, 0, 0]);

        assert_eq!(*seen.lock(), Some((Some(SENDER), TilePosition::new(100, 256))));
        assert_eq!(world.get(100, 256).unwrap().wall_id, WallId::NONE);
        assert_eq!(harness.host.dropped_items(), vec![drop_of(ItemId::STONE_WALL)]);
    }

    #[test]
    fn test_break_wall_failure() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.update(100, 256, |tile| tile.wall_id = WallId::STONE);
        let raised = Arc::new(Mutex::new(false));
        let record = raised.clone();
        harness.events().register::<WallBreakEvent, _>("test", EventPriority::Normal, move |_| {
            *record.lock() = true;
        });

        harness.host.receive_frame(SENDER, &[11, 0, 17, 2, 100, 0, 0, 1, 1, 0, 0]);

        assert!(!*raised.lock());
        assert_eq!(world.get(100, 256).unwrap().wall_id, WallId::STONE);
    }

    #[test]
    fn test_break_wall_canceled() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.update(100, 256, |tile| tile.wall_id = WallId::STONE);
        cancel_all::<WallBreakEvent>(&harness);

        harness.host.receive_frame(SENDER, &[11, 0, 17, 2, 100, 0, 0, 1, 0, 0, 0]);

        assert_eq!(world.get(100, 256).unwrap().wall_id, WallId::STONE);
        assert!(harness.host.dropped_items().is_empty());
    }

    #[test]
    fn test_place_wall() {
        let harness = harness();
        let seen = Arc::new(Mutex::new(None));
        let record = seen.clone();
        harness.events().register::<WallPlaceEvent, _>("test", EventPriority::Normal, move |evt| {
            *record.lock() = Some((evt.player.index(), evt.position, evt.id, evt.is_replacement));
        });

        harness.host.receive_frame(SENDER, &[11, 0, 17, 3, 100, 0, 0, 1, 1, 0, 0]);

        assert_eq!(
            *seen.lock(),
            Some((Some(SENDER), TilePosition::new(100, 256), WallId::STONE, false))
        );
        assert_eq!(harness.host.world().get(100, 256).unwrap().wall_id, WallId::STONE);
    }

    #[test]
    fn test_place_wall_canceled() {
        let harness = harness();
        cancel_all::<WallPlaceEvent>(&harness);

        harness.host.receive_frame(SENDER, &[11, 0, 17, 3, 100, 0, 0, 1, 1, 0, 0]);

        assert_eq!(harness.host.world().get(100, 256).unwrap().wall_id, WallId::NONE);
    }

    #[test]
    fn test_replace_wall() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.update(100, 256, |tile| tile.wall_id = WallId::DIRT);
        let seen = Arc::new(Mutex::new(None));
        let record = seen.clone();
        harness.events().register::<WallPlaceEvent, _>("test", EventPriority::Normal, move |evt| {
            *record.lock() = Some((evt.id, evt.is_replacement));
        });

        harness.host.receive_frame(SENDER, &[11, 0, 17, 22, 100, 0, 0, 1, 1, 0, 0]);

        assert_eq!(*seen.lock(), Some((WallId::STONE, true)));
        assert_eq!(world.get(100, 256).unwrap().wall_id, WallId::STONE);
        assert_eq!(harness.host.dropped_items(), vec![drop_of(ItemId::DIRT_WALL)]);
    }

    #[test]
    fn test_replace_wall_edited() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.update(100, 256, |tile| tile.wall_id = WallId::DIRT);
        harness.events().register::<WallPlaceEvent, _>("test", EventPriority::Normal, |evt| {
            evt.id = WallId::WOOD;
        });

        harness.host.receive_frame(SENDER, &[11, 0, 17, 22, 100, 0, 0, 1, 1, 0, 0]);

        assert_eq!(world.get(100, 256).unwrap().wall_id, WallId::WOOD);
    }

    #[test]
    fn test_unknown_modification_ignored() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.set(100, 256, Tile::block(BlockId::STONE));
        let raised = Arc::new(Mutex::new(0));
        let record = raised.clone();
        harness.events().register::<BlockBreakEvent, _>("test", EventPriority::Normal, move |_| {
            *record.lock() += 1;
        });
        let record = raised.clone();
        harness.events().register::<BlockPlaceEvent, _>("test", EventPriority::Normal, move |_| {
            *record.lock() += 1;
        });

        harness.host.receive_frame(SENDER, &[11, 0, 17, 255, 100, 0, 0, 1, 0, 0, 0]);

        assert_eq!(*raised.lock(), 0);
        assert_eq!(world.get(100, 256).unwrap(), Tile::block(BlockId::STONE));
    }

    const SQUARE_FRAME: [u8; 41] = [
        41, 0, 20, 3, 0, 100, 0, 0, 1, 0, 0, 1, 0, 1, 0, 1, 0, 4, 0, 1, 0, 2, 0, 4, 0, 1, 0, 8, 0, 255, 1, 0, 4, 1, 0,
        8, 1, 240, 131, 0, 0,
    ];

    #[test]
    fn test_tile_square() {
        let harness = harness();
        let seen = Arc::new(Mutex::new(None));
        let record = seen.clone();
        harness.events().register::<TileSquareEvent, _>("test", EventPriority::Normal, move |evt| {
            *record.lock() = Some((evt.player.index(), evt.position, evt.size, evt.tiles.len()));
        });

        harness.host.receive_frame(SENDER, &SQUARE_FRAME);

        assert_eq!(*seen.lock(), Some((Some(SENDER), TilePosition::new(100, 256), 3, 9)));
        let world = harness.host.world();
        assert!(!world.get(100, 256).unwrap().is_block_active);
        let stone = world.get(100, 257).unwrap();
        assert!(stone.is_block_active);
        assert_eq!(stone.block_id, BlockId::STONE);
        assert_eq!(world.get(101, 256).unwrap().wall_id, WallId::STONE);
        assert_eq!(world.get(101, 257).unwrap().liquid, Liquid::Lava);
        assert!(world.get(102, 257).unwrap().has_yellow_wire);
    }

    #[test]
    fn test_tile_square_edited() {
        let harness = harness();
        harness.events().register::<TileSquareEvent, _>("test", EventPriority::Normal, |evt| {
            if let Some(tile) = evt.tile_mut(0, 0) {
                *tile = Tile::block(BlockId::STONE);
            }
        });

        harness.host.receive_frame(SENDER, &SQUARE_FRAME);

        assert_eq!(harness.host.world().get(100, 256).unwrap(), Tile::block(BlockId::STONE));
    }

    #[test]
    fn test_tile_square_canceled() {
        let harness = harness();
        cancel_all::<TileSquareEvent>(&harness);

        harness.host.receive_frame(SENDER, &SQUARE_FRAME);

        assert!(!harness.host.world().get(100, 257).unwrap().is_block_active);
    }

    #[test]
    fn test_tile_liquid() {
        let harness = harness();
        let seen = Arc::new(Mutex::new(None));
        let record = seen.clone();
        harness.events().register::<TileLiquidEvent, _>("test", EventPriority::Normal, move |evt| {
            *record.lock() = Some((evt.player.index(), evt.position, evt.amount, evt.liquid));
        });

        harness.host.receive_frame(SENDER, &[9, 0, 48, 0, 1, 100, 0, 255, 2]);

        assert_eq!(
            *seen.lock(),
            Some((Some(SENDER), TilePosition::new(256, 100), 255, Liquid::Honey))
        );
        let tile = harness.host.world().get(256, 100).unwrap();
        assert_eq!((tile.liquid_amount, tile.liquid), (255, Liquid::Honey));
    }

    #[test]
    fn test_tile_liquid_canceled() {
        let harness = harness();
        cancel_all::<TileLiquidEvent>(&harness);

        harness.host.receive_frame(SENDER, &[9, 0, 48, 0, 1, 100, 0, 255, 2]);

        assert_eq!(harness.host.world().get(256, 100).unwrap().liquid_amount, 0);
    }

    fn wire_switch(world: &TileMap) {
        let mut switch = Tile::block(BlockId::SWITCH);
        switch.has_red_wire = true;
        world.set(256, 100, switch);

        let mut door = Tile::block(BlockId::STONE);
        door.has_red_wire = true;
        door.has_actuator = true;
        world.set(257, 100, door);
    }

    #[test]
    fn test_wiring_activate() {
        let harness = harness();
        let world = harness.world().world().clone();
        wire_switch(&world);
        let seen = Arc::new(Mutex::new(None));
        let record = seen.clone();
        harness.events().register::<WiringActivateEvent, _>("test", EventPriority::Normal, move |evt| {
            *record.lock() = Some((evt.player.index(), evt.position));
        });

        harness.host.receive_frame(SENDER, &[7, 0, 59, 0, 1, 100, 0]);

        assert_eq!(*seen.lock(), Some((Some(SENDER), TilePosition::new(256, 100))));
        assert!(world.get(257, 100).unwrap().is_block_actuated);
        assert!(!world.get(256, 100).unwrap().is_block_actuated);
    }

    #[test]
    fn test_wiring_activate_canceled() {
        let harness = harness();
        let world = harness.world().world().clone();
        wire_switch(&world);
        cancel_all::<WiringActivateEvent>(&harness);

        harness.host.receive_frame(SENDER, &[7, 0, 59, 0, 1, 100, 0]);

        assert!(!world.get(257, 100).unwrap().is_block_actuated);
    }

    #[test]
    fn test_block_paint() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.set(256, 100, Tile::block(BlockId::STONE));
        let seen = Arc::new(Mutex::new(None));
        let record = seen.clone();
        harness.events().register::<BlockPaintEvent, _>("test", EventPriority::Normal, move |evt| {
            *record.lock() = Some((evt.player.index(), evt.position, evt.color));
        });

        harness.host.receive_frame(SENDER, &[8, 0, 63, 0, 1, 100, 0, 1]);

        assert_eq!(
            *seen.lock(),
            Some((Some(SENDER), TilePosition::new(256, 100), PaintColor::RED))
        );
        assert_eq!(world.get(256, 100).unwrap().block_color, PaintColor::RED);
    }

    #[test]
    fn test_block_paint_canceled() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.set(256, 100, Tile::block(BlockId::STONE));
        cancel_all::<BlockPaintEvent>(&harness);

        harness.host.receive_frame(SENDER, &[8, 0, 63, 0, 1, 100, 0, 1]);

        assert_eq!(world.get(256, 100).unwrap().block_color, PaintColor::NONE);
    }

    #[test]
    fn test_wall_paint() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.update(256, 100, |tile| tile.wall_id = WallId::STONE);
        harness.events().register::<WallPaintEvent, _>("test", EventPriority::Normal, |evt| {
            assert_eq!(evt.color, PaintColor::RED);
            evt.color = PaintColor::YELLOW;
        });

        harness.host.receive_frame(SENDER, &[8, 0, 64, 0, 1, 100, 0, 1]);

        assert_eq!(world.get(256, 100).unwrap().wall_color, PaintColor::YELLOW);
    }

    #[test]
    fn test_wall_paint_canceled() {
        let harness = harness();
        let world = harness.world().world().clone();
        world.update(256, 100, |tile| tile.wall_id = WallId::STONE);
        cancel_all::<WallPaintEvent>(&harness);

        harness.host.receive_frame(SENDER, &[8, 0, 64, 0, 1, 100, 0, 1]);

        assert_eq!(world.get(256, 100).unwrap().wall_color, PaintColor::NONE);
    }

    #[test]
    fn test_world_save() {
        let harness = harness();
        let seen = Arc::new(Mutex::new(None));
        let record = seen.clone();
        harness.events().register::<WorldSaveEvent, _>("test", EventPriority::Normal, move |evt| {
            *record.lock() = Some(evt.world.clone());
        });

        assert!(harness.host.save_world());

        let world = seen.lock().clone().unwrap();
        assert!(Arc::ptr_eq(&world, harness.host.world()));
        assert_eq!(harness.host.save_count(), 1);
    }

    #[test]
    fn test_world_save_canceled() {
        let harness = harness();
        cancel_all::<WorldSaveEvent>(&harness);

        assert!(!harness.host.save_world());
        assert_eq!(harness.host.save_count(), 0);
    }

    #[test]
    fn test_dispose_removes_world_hooks() {
        let harness = harness();
        assert!(harness.host.hooks().world_save.is_set());

        harness.manager.shutdown();

        assert!(!harness.host.hooks().world_save.is_set());
        assert_eq!(harness.events().handler_count::<PacketReceiveEvent<TileModifyPacket>>(), 0);
        assert!(harness.host.save_world());

        // The host handles tile packets natively once the services are gone
        harness.host.receive_frame(SENDER, &[11, 0, 17, 3, 100, 0, 0, 1, 1, 0, 0]);
        assert_eq!(harness.host.world().get(100, 256).unwrap().wall_id, WallId::STONE);
    }
}
