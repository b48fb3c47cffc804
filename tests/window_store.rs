use repage::WindowStore;

const RETENTION_MS: u64 = 60_000;
const WINDOW_MS: u64 = 10_000;

fn store(retain_duplicates: bool) -> WindowStore<String> {
    WindowStore::new("pages", RETENTION_MS, WINDOW_MS, retain_duplicates)
}

#[test]
fn fetch_returns_live_entries() {
    let mut store = store(false);
    store.put("P1@m1", "page".to_string(), 1_000);
    assert_eq!(store.fetch("P1@m1", 2_000), Some(&"page".to_string()));
}

#[test]
fn entries_age_out_after_retention_without_deletion() {
    let mut store = store(false);
    store.put("P1@m1", "page".to_string(), 1_000);
    assert!(store.fetch("P1@m1", 1_000 + RETENTION_MS - 1).is_some());
    assert!(store.fetch("P1@m1", 1_000 + RETENTION_MS).is_none());
}

#[test]
fn re_put_in_same_window_overwrites_by_default() {
    let mut store = store(false);
    store.put("P1@m1", "v1".to_string(), 1_000);
    store.put("P1@m1", "v2".to_string(), 2_000);
    assert_eq!(store.fetch("P1@m1", 3_000), Some(&"v2".to_string()));
    assert_eq!(store.len(), 1);
}

#[test]
fn retain_duplicates_keeps_versions_and_serves_latest() {
    let mut store = store(true);
    store.put("P1@m1", "v1".to_string(), 1_000);
    store.put("P1@m1", "v2".to_string(), 2_000);
    assert_eq!(store.fetch("P1@m1", 3_000), Some(&"v2".to_string()));
}

#[test]
fn re_put_in_later_window_adds_a_new_version() {
    let mut store = store(false);
    store.put("P1@m1", "v1".to_string(), 1_000);
    store.put("P1@m1", "v2".to_string(), 1_000 + WINDOW_MS);
    assert_eq!(store.fetch("P1@m1", 12_000), Some(&"v2".to_string()));
}

#[test]
fn delete_removes_every_version() {
    let mut store = store(true);
    store.put("P1@m1", "v1".to_string(), 1_000);
    store.put("P1@m1", "v2".to_string(), 2_000);
    assert!(store.delete("P1@m1"));
    assert!(store.fetch("P1@m1", 2_500).is_none());
    assert!(!store.delete("P1@m1"));
}

#[test]
fn advance_physically_reclaims_aged_entries() {
    let mut store = store(false);
    store.put("P1@m1", "v1".to_string(), 1_000);
    store.put("P2@m1", "v1".to_string(), 50_000);
    store.advance(1_000 + RETENTION_MS);
    assert_eq!(store.len(), 1);
    assert!(store.fetch("P2@m1", 1_000 + RETENTION_MS).is_some());
}
