use std::sync::Arc;

use rotor_client::{
    CalibrationStore, DispatchError, FavoritesStore, LockStore, MemoryStore, Outbound,
    RotorStore, Router, SettingsStore, SortKey, MAX_FAVORITES,
};
use tokio::sync::mpsc;

fn harness() -> (Router, Arc<FavoritesStore>, mpsc::UnboundedReceiver<String>) {
    let (tx, outbound_rx) = mpsc::unbounded_channel();
    let outbound = Outbound::new(tx);
    let favorites = Arc::new(FavoritesStore::new(outbound.clone()));
    let router = Router::new(
        Arc::new(RotorStore::new()),
        Arc::new(CalibrationStore::new()),
        Arc::new(SettingsStore::new()),
        favorites.clone(),
        Arc::new(LockStore::new(outbound, Arc::new(MemoryStore::new()))),
    );
    (router, favorites, outbound_rx)
}

fn ids(store: &FavoritesStore) -> Vec<u32> {
    store.get().entries.iter().map(|f| f.id).collect()
}

#[test]
fn add_assigns_dense_ids_and_pushes_snapshot() {
    let (_router, favorites, mut rx) = harness();

    assert!(favorites.add("North beacon", 10.0));
    assert!(favorites.add("Repeater", 200.0));
    assert_eq!(ids(&favorites), vec![1, 2]);

    assert_eq!(
        rx.try_recv().unwrap(),
        r#"FAVORITES|[{"id":1,"name":"North beacon","angle":10.0}]"#
    );
    assert!(rx.try_recv().unwrap().starts_with("FAVORITES|["));
}

#[test]
fn add_refuses_past_capacity_without_sending() {
    let (_router, favorites, mut rx) = harness();

    for i in 0..MAX_FAVORITES {
        assert!(favorites.add(&format!("sat-{i}"), i as f64));
    }
    while rx.try_recv().is_ok() {}

    let version = favorites.version();
    assert!(favorites.has_max());
    assert!(!favorites.add("one too many", 99.0));
    assert_eq!(favorites.get().entries.len(), MAX_FAVORITES);
    assert_eq!(favorites.version(), version);
    assert!(rx.try_recv().is_err());
}

#[test]
fn remove_renumbers_and_reapplies_sort() {
    let (_router, favorites, mut rx) = harness();
    favorites.add("c", 30.0);
    favorites.add("a", 10.0);
    favorites.add("b", 20.0);
    favorites.sort_by(SortKey::Name, true);
    while rx.try_recv().is_ok() {}

    // Display order is a(2), b(3), c(1); drop the middle entry.
    favorites.remove(1);

    let list = favorites.get();
    let names: Vec<&str> = list.entries.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a", "c"]);
    // Renumbered by ascending old id: c was 1, a was 2.
    assert_eq!(
        list.entries.iter().map(|f| (f.id, f.name.as_str())).collect::<Vec<_>>(),
        vec![(2, "a"), (1, "c")]
    );
    assert!(rx.try_recv().unwrap().starts_with("FAVORITES|["));
}

#[test]
fn remove_out_of_range_is_a_no_op() {
    let (_router, favorites, mut rx) = harness();
    favorites.add("only", 5.0);
    while rx.try_recv().is_ok() {}

    let version = favorites.version();
    favorites.remove(3);
    assert_eq!(favorites.version(), version);
    assert!(rx.try_recv().is_err());
}

#[test]
fn sort_key_persists_only_when_asked() {
    let (_router, favorites, _rx) = harness();
    favorites.add("b", 200.0);
    favorites.add("a", 100.0);

    // One-shot sort: display order changes, the remembered key does not.
    favorites.sort_by(SortKey::Name, false);
    assert_eq!(favorites.get().sort_key, SortKey::Id);

    favorites.sort_by(SortKey::Angle, true);
    assert_eq!(favorites.get().sort_key, SortKey::Angle);

    // Structural mutation reapplies the remembered key.
    favorites.add("c", 50.0);
    let angles: Vec<f64> = favorites.get().entries.iter().map(|f| f.angle).collect();
    assert_eq!(angles, vec![50.0, 100.0, 200.0]);
}

#[test]
fn broadcast_replaces_the_list_under_the_remembered_sort() {
    let (router, favorites, _rx) = harness();
    favorites.sort_by(SortKey::Name, true);

    router
        .dispatch(
            r#"FAVORITES|[{"id":1,"name":"zulu","angle":300.0},{"id":2,"name":"alpha","angle":15.0}]"#,
        )
        .unwrap();

    let names: Vec<String> = favorites.get().entries.iter().map(|f| f.name.clone()).collect();
    assert_eq!(names, vec!["alpha", "zulu"]);
}

#[test]
fn invalid_broadcast_resets_and_resyncs_empty_list() {
    let (router, favorites, mut rx) = harness();
    favorites.add("keep me", 42.0);
    while rx.try_recv().is_ok() {}

    // Parses as JSON but fails validation (missing angle).
    let result = router.dispatch(r#"FAVORITES|[{"id":1,"name":"broken"}]"#);
    assert!(matches!(result, Err(DispatchError::InvalidFavorites(_))));

    assert!(favorites.get().entries.is_empty());
    assert_eq!(rx.try_recv().unwrap(), "FAVORITES|[]");
}

#[test]
fn oversized_broadcast_counts_as_invalid() {
    let (router, favorites, mut rx) = harness();

    let oversized: Vec<String> = (1..=MAX_FAVORITES as u32 + 1)
        .map(|id| format!(r#"{{"id":{id},"name":"s{id}","angle":{id}.0}}"#))
        .collect();
    let result = router.dispatch(&format!("FAVORITES|[{}]", oversized.join(",")));

    assert!(matches!(result, Err(DispatchError::InvalidFavorites(_))));
    assert!(favorites.get().entries.is_empty());
    assert_eq!(rx.try_recv().unwrap(), "FAVORITES|[]");
}

#[test]
fn unparsable_broadcast_changes_nothing() {
    let (router, favorites, mut rx) = harness();
    favorites.add("survivor", 7.0);
    while rx.try_recv().is_ok() {}
    let version = favorites.version();

    let result = router.dispatch("FAVORITES|{not json");
    assert!(matches!(result, Err(DispatchError::Payload { identifier: "FAVORITES", .. })));
    assert_eq!(favorites.version(), version);
    assert_eq!(favorites.get().entries.len(), 1);
    assert!(rx.try_recv().is_err());
}
