//! End-to-end flows: coordinator + in-memory authority + real event bus.

use crate::init_tracing;
use hexmap_bus::{EventFilter, EventKind, EventPublisher, InMemoryEventBus, MapEvent};
use hexmap_cache::adapters::{InMemoryGateway, SystemTimeSource};
use hexmap_cache::{CacheConfig, MapCacheApi, MapCacheService, TileDraft, TileUpdate};
use std::sync::Arc;

type Service = MapCacheService<InMemoryGateway, InMemoryGateway, SystemTimeSource>;

fn make_service() -> (Service, InMemoryGateway, Arc<InMemoryEventBus>) {
    let gateway = InMemoryGateway::new();
    let bus = Arc::new(InMemoryEventBus::new());
    let service = MapCacheService::new(
        gateway.clone(),
        gateway.clone(),
        SystemTimeSource,
        CacheConfig::default(),
    )
    .with_event_bus(bus.clone());
    (service, gateway, bus)
}

#[tokio::test]
async fn full_lifecycle_against_in_memory_authority() {
    init_tracing();
    let (mut service, gateway, bus) = make_service();
    let mut sub = bus.subscribe(EventFilter::all());

    // Seed an authoritative region and load it.
    gateway.seed_tile("1,0:", "u1", "user root");
    gateway.seed_tile("1,0:1", "t1", "projects");
    gateway.seed_tile("1,0:1,2", "t2", "roadmap");
    let loaded = service.load_region("1,0:").await.unwrap();
    assert_eq!(loaded, 3);

    // Create, update, move, delete - one event each, in order.
    let created = service
        .create_item("1,0:1", TileDraft::titled("ideas"))
        .await
        .unwrap();
    assert_eq!(created.coord_id().as_str(), "1,0:1,1");

    service
        .update_item(
            "1,0:1,1",
            TileUpdate {
                content: Some("scratchpad".to_string()),
                ..TileUpdate::default()
            },
        )
        .await
        .unwrap();

    service.move_item("1,0:1,1", "1,0:3").await.unwrap();
    service.delete_item("1,0:3").await.unwrap();

    let kinds: Vec<EventKind> = std::iter::from_fn(|| sub.try_recv().unwrap())
        .map(|envelope| envelope.event.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::TileCreated,
            EventKind::TileUpdated,
            EventKind::TileMoved,
            EventKind::TileDeleted,
        ]
    );
    assert_eq!(bus.events_published(), 4);

    // Cache and authority agree on the final shape.
    assert!(service.store().with(|s| !s.contains("1,0:3")));
    assert!(gateway.tile_at("1,0:3").is_none());
    assert!(gateway.tile_at("1,0:1").is_some());
}

#[tokio::test]
async fn move_with_server_side_subtree_payload() {
    init_tracing();
    let (mut service, gateway, bus) = make_service();

    gateway.seed_tile("1,0:1", "t1", "parent");
    gateway.seed_tile("1,0:1,2", "t2", "child");
    gateway.seed_tile("1,0:1,2,3", "t3", "grandchild");
    // The cache only ever loaded the root.
    service.load_region("1,0:1").await.unwrap();
    let removed = service.invalidate_region("1,0:1,2").await.unwrap();
    assert_eq!(removed, 2);

    let mut sub = bus.subscribe(EventFilter::kinds(vec![EventKind::TileMoved]));
    service.move_item("1,0:1", "1,0:5").await.unwrap();

    // The authoritative payload re-addressed descendants the cache had
    // dropped; they appear at their new coordinates anyway.
    let store = service.store();
    assert!(store.with(|s| s.contains("1,0:5")));
    assert!(store.with(|s| s.contains("1,0:5,2")));
    assert!(store.with(|s| s.contains("1,0:5,2,3")));
    assert!(!store.with(|s| s.contains("1,0:1")));

    let envelope = sub.try_recv().unwrap().expect("move event");
    assert!(matches!(
        envelope.event,
        MapEvent::TileMoved { ref to_coord_id, .. } if to_coord_id.as_str() == "1,0:5"
    ));
}

#[tokio::test]
async fn failed_edit_leaves_cache_consistent_for_the_next_one() {
    init_tracing();
    let (mut service, gateway, bus) = make_service();
    gateway.seed_tile("1,0:1", "t1", "parent");
    service.load_region("1,0:1").await.unwrap();

    gateway.fail_next(hexmap_cache::GatewayError::Timeout);
    let before = service.store().snapshot();
    service
        .create_item("1,0:1", TileDraft::titled("lost"))
        .await
        .unwrap_err();
    assert_eq!(service.store().snapshot(), before);
    assert_eq!(bus.events_published(), 0);

    // The same edit succeeds afterwards and lands in the same slot.
    let record = service
        .create_item("1,0:1", TileDraft::titled("second try"))
        .await
        .unwrap();
    assert_eq!(record.coord_id().as_str(), "1,0:1,1");
    assert_eq!(bus.events_published(), 1);
}

#[tokio::test]
async fn swap_between_sibling_subtrees() {
    init_tracing();
    let (mut service, gateway, bus) = make_service();
    gateway.seed_tile("1,0:1", "t1", "alpha");
    gateway.seed_tile("1,0:1,3", "t13", "alpha child");
    gateway.seed_tile("1,0:2", "t2", "beta");
    service.load_region("1,0:").await.unwrap();

    let mut sub = bus.subscribe(EventFilter::all());
    service.move_item("1,0:1", "1,0:2").await.unwrap();

    let store = service.store();
    assert_eq!(
        store.with(|s| s.get("1,0:2").unwrap().title.clone()),
        "alpha"
    );
    assert_eq!(
        store.with(|s| s.get("1,0:2,3").unwrap().title.clone()),
        "alpha child"
    );
    assert_eq!(store.with(|s| s.get("1,0:1").unwrap().title.clone()), "beta");

    let envelope = sub.try_recv().unwrap().expect("swap event");
    assert_eq!(envelope.event.kind(), EventKind::TilesSwapped);
    assert_eq!(sub.try_recv().unwrap(), None);
}
