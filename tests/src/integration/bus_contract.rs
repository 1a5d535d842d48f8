//! The envelope contract subscribers outside the cache rely on.

use crate::init_tracing;
use hexmap_bus::{EventFilter, EventKind, InMemoryEventBus, EVENT_SOURCE};
use hexmap_cache::adapters::{InMemoryGateway, SystemTimeSource};
use hexmap_cache::{CacheConfig, MapCacheApi, MapCacheService, TileDraft};
use std::sync::Arc;

#[tokio::test]
async fn envelopes_are_tagged_map_cache_and_timestamped() {
    init_tracing();
    let gateway = InMemoryGateway::new();
    gateway.seed_tile("1,0:1", "t1", "parent");
    let bus = Arc::new(InMemoryEventBus::new());
    let mut service = MapCacheService::new(
        gateway.clone(),
        gateway.clone(),
        SystemTimeSource,
        CacheConfig::default(),
    )
    .with_event_bus(bus.clone());
    let mut sub = bus.subscribe(EventFilter::all());

    service
        .create_item("1,0:1", TileDraft::titled("hello"))
        .await
        .unwrap();

    let envelope = sub.try_recv().unwrap().expect("one envelope");
    assert_eq!(envelope.source, EVENT_SOURCE);
    assert!(envelope.timestamp_ms > 0);
    assert_eq!(envelope.event.kind(), EventKind::TileCreated);
}

#[tokio::test]
async fn serialized_envelope_shape_is_stable() {
    init_tracing();
    let gateway = InMemoryGateway::new();
    gateway.seed_tile("1,0:1", "t1", "parent");
    let bus = Arc::new(InMemoryEventBus::new());
    let mut service = MapCacheService::new(
        gateway.clone(),
        gateway.clone(),
        SystemTimeSource,
        CacheConfig::default(),
    )
    .with_event_bus(bus.clone());
    let mut sub = bus.subscribe(EventFilter::all());

    service.move_item("1,0:1", "1,0:4").await.unwrap();

    let envelope = sub.try_recv().unwrap().expect("one envelope");
    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["type"], "tile_moved");
    assert_eq!(json["source"], "map_cache");
    assert_eq!(json["payload"]["from_coord_id"], "1,0:1");
    assert_eq!(json["payload"]["to_coord_id"], "1,0:4");
    assert_eq!(json["payload"]["tile_id"], "t1");
}
