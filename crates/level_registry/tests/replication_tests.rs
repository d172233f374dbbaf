//! End-to-end replication between an authoritative registry and a replica.
//!
//! The registry side owns real modules in an arena; the replica side pushes
//! into proxy modules, the way an observer does.

use level_component::{ActorType, MapComponent, MapComponentArena, MapHandle, ProxyModules};
use level_math::Cell;
use level_registry::{Baseline, MapRegistry, RegistryReplica, ReplicaError, ReplicationEvent};

fn cell(x: i32, y: i32) -> Cell {
    Cell::from_xyz(x as f32 * 200.0, y as f32 * 200.0, 0.0)
}

struct Side {
    arena: MapComponentArena,
    registry: MapRegistry,
}

impl Side {
    fn new() -> Self {
        Self {
            arena: MapComponentArena::new(),
            registry: MapRegistry::new(),
        }
    }

    fn spawn(&mut self, at: Cell) -> MapHandle {
        let handle = self
            .arena
            .insert(MapComponent::with_cell(at, ActorType::Box));
        self.registry.emplace(&self.arena, handle).unwrap();
        handle
    }
}

struct Observer {
    baseline: Baseline,
    replica: RegistryReplica,
    proxies: ProxyModules,
}

impl Observer {
    fn new() -> Self {
        Self {
            baseline: Baseline::new(),
            replica: RegistryReplica::new(),
            proxies: ProxyModules::new(),
        }
    }

    /// Sends whatever changed and applies it. Returns the fired hooks.
    fn sync(&mut self, registry: &MapRegistry) -> Vec<ReplicationEvent> {
        let Some(delta) = registry.delta_since(&self.baseline) else {
            return Vec::new();
        };
        self.baseline.advance(&delta);
        self.replica.apply(&delta, &mut self.proxies).unwrap()
    }
}

#[test]
fn test_remove_add_change_with_constant_count() {
    let mut server = Side::new();
    let a = server.spawn(cell(0, 0));
    let b = server.spawn(cell(1, 0));
    let c = server.spawn(cell(2, 0));

    let mut observer = Observer::new();
    assert_eq!(observer.sync(&server.registry).len(), 3);

    server.registry.remove(b);
    server.arena.remove(b);
    let d = server.spawn(cell(3, 0));
    server.registry.set_cell(a, cell(0, 1), &mut server.arena);
    assert_eq!(server.registry.len(), 3);
    assert_eq!(server.arena.get(a).unwrap().cell(), cell(0, 1));

    let events = observer.sync(&server.registry);
    assert_eq!(
        events,
        vec![
            ReplicationEvent::PreRemove { module: b, cell: cell(1, 0) },
            ReplicationEvent::PostAdd { module: d, cell: cell(3, 0) },
            ReplicationEvent::PostChange { module: a, cell: cell(0, 1) },
        ]
    );

    let replica = &observer.replica;
    assert_eq!(replica.len(), 3);
    assert_eq!(replica.find(a).unwrap().cell(), cell(0, 1));
    assert_eq!(replica.find(c).unwrap().cell(), cell(2, 0));
    assert_eq!(replica.find(d).unwrap().cell(), cell(3, 0));
    assert!(!replica.contains_module(b));

    assert_eq!(observer.proxies.cell(a), Some(cell(0, 1)));
    assert_eq!(observer.proxies.cell(c), Some(cell(2, 0)));
    assert_eq!(observer.proxies.cell(d), Some(cell(3, 0)));
    // The removed module got its last cell pushed before being dropped.
    assert_eq!(observer.proxies.cell(b), Some(cell(1, 0)));
}

#[test]
fn test_replica_matches_registry_after_many_ticks() {
    let mut server = Side::new();
    let mut observer = Observer::new();
    let mut live = Vec::new();

    for tick in 0..20 {
        live.push(server.spawn(cell(tick, 0)));
        if tick % 3 == 0 {
            let gone = live.remove(0);
            server.registry.remove(gone);
            server.arena.remove(gone);
        }
        if let Some(&mover) = live.first() {
            server.registry.set_cell(mover, cell(tick, 5), &mut server.arena);
        }
        observer.sync(&server.registry);
    }

    let mut expected: Vec<(MapHandle, Cell)> = server
        .registry
        .entries()
        .iter()
        .map(|entry| (entry.module(), entry.cell()))
        .collect();
    let mut actual: Vec<(MapHandle, Cell)> = observer
        .replica
        .entries()
        .iter()
        .map(|entry| (entry.module(), entry.cell()))
        .collect();
    expected.sort();
    actual.sort();
    assert_eq!(expected, actual);
    for (module, cell) in &expected {
        assert_eq!(server.arena.get(*module).unwrap().cell(), *cell);
    }
    assert_eq!(observer.replica.version(), server.registry.version());
}

#[test]
fn test_lost_delta_recovers_with_full_snapshot() {
    let mut server = Side::new();
    let mut observer = Observer::new();
    let a = server.spawn(cell(0, 0));
    observer.sync(&server.registry);

    // A delta is computed and recorded as sent, then lost in transit.
    let b = server.spawn(cell(1, 0));
    let lost = server.registry.delta_since(&observer.baseline).unwrap();
    observer.baseline.advance(&lost);

    server.registry.remove(a);
    let next = server.registry.delta_since(&observer.baseline).unwrap();
    let err = observer
        .replica
        .apply(&next, &mut observer.proxies)
        .unwrap_err();
    assert!(matches!(err, ReplicaError::VersionGap { .. }));

    let snapshot = server.registry.full_snapshot();
    observer.baseline.advance(&snapshot);
    observer
        .replica
        .apply(&snapshot, &mut observer.proxies)
        .unwrap();

    assert!(!observer.replica.contains_module(a));
    assert!(observer.replica.contains_module(b));
    assert_eq!(observer.replica.version(), server.registry.version());
    assert!(server.registry.delta_since(&observer.baseline).is_none());
}

#[test]
fn test_late_joiner_receives_everything() {
    let mut server = Side::new();
    for x in 0..5 {
        server.spawn(cell(x, x));
    }
    let first = server.registry.get(0).unwrap();
    server.registry.remove(first);

    let mut observer = Observer::new();
    let events = observer.sync(&server.registry);
    assert_eq!(events.len(), 4);
    assert!(events
        .iter()
        .all(|event| matches!(event, ReplicationEvent::PostAdd { .. })));
    assert_eq!(observer.replica.iter().len(), server.registry.len());
}
