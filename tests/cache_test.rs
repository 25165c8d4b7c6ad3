#[path = "common/mod.rs"]
mod common;

use std::fs;
use std::sync::Arc;

use common::{after_throttle, engine_with, options};
use jiff::Timestamp;
use listwin::cache::{CacheStore, CursorCache, FileStore, MemoryStore};
use listwin::{Edge, RecordId, SortOrder};
use tempfile::TempDir;

const KEY: &str = "api_users_list_cache";

fn desc(range: std::ops::RangeInclusive<RecordId>) -> Vec<RecordId> {
    range.rev().collect()
}

fn file_cache(dir: &TempDir) -> CursorCache {
    CursorCache::new(Arc::new(FileStore::new(dir.path())), KEY)
}

#[tokio::test(start_paused = true)]
async fn test_next_session_resumes_at_first_visible_record() {
    let dir = TempDir::new().unwrap();

    // Session one: three pages down, then one back up.
    let (_, _, engine) = engine_with(1..=100, options(10, 20));
    let engine = engine.with_cache(file_cache(&dir));
    engine.mount(SortOrder::Desc).await;
    for _ in 0..3 {
        after_throttle().await;
        engine.load_edge(Edge::Bottom).await;
    }
    assert_eq!(engine.ids(), desc(61..=80));
    after_throttle().await;
    engine.load_edge(Edge::Top).await;
    assert_eq!(engine.ids(), desc(71..=90));

    let entry = file_cache(&dir).load().unwrap();
    assert_eq!(entry.begin_id, "91");
    assert_eq!(entry.sort_order, SortOrder::Desc);

    // Session two starts where session one's window started.
    let (api, _, engine) = engine_with(1..=100, options(10, 20));
    let engine = engine.with_cache(file_cache(&dir));
    engine.mount(SortOrder::Desc).await;

    assert_eq!(engine.ids(), desc(81..=90));
    assert!(engine.has_more_top());
    assert_eq!(api.page_queries()[0].cursor.begin_id, 91);

    after_throttle().await;
    engine.load_edge(Edge::Top).await;
    assert_eq!(engine.ids(), desc(81..=100));
    assert!(!engine.has_more_top());
}

#[tokio::test(start_paused = true)]
async fn test_cached_sort_order_wins_over_default() {
    let cache = CursorCache::new(Arc::new(MemoryStore::new()), KEY);
    cache.save(30, SortOrder::Asc).unwrap();

    let (_, _, engine) = engine_with(1..=100, options(10, 50));
    let engine = engine.with_cache(cache);
    engine.mount(SortOrder::Desc).await;

    assert_eq!(engine.sort_order(), SortOrder::Asc);
    assert_eq!(engine.ids(), (30..=39).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn test_cache_is_read_only_at_first_mount() {
    let store = Arc::new(MemoryStore::new());
    let cache = CursorCache::new(store.clone(), KEY);
    cache.save(60, SortOrder::Desc).unwrap();

    let (api, _, engine) = engine_with(1..=100, options(10, 50));
    let engine = engine.with_cache(cache);
    engine.mount(SortOrder::Desc).await;
    assert_eq!(engine.ids(), desc(51..=60));

    engine.reset(SortOrder::Desc).await;
    assert_eq!(engine.ids(), desc(91..=100));
    assert!(api.page_queries()[1].cursor.is_sentinel());

    engine.mount(SortOrder::Desc).await;
    assert!(api.page_queries()[2].cursor.is_sentinel());

    // The sentinel reset was saved as the new position.
    let raw = store.get(KEY).unwrap().unwrap();
    assert!(raw.contains("\"beginID\":\"101\""));
}

#[tokio::test(start_paused = true)]
async fn test_expired_or_corrupt_cache_means_cold_start() {
    let store = Arc::new(MemoryStore::new());
    let cache = CursorCache::new(store.clone(), KEY);
    let two_hours_ago =
        Timestamp::from_millisecond(Timestamp::now().as_millisecond() - 2 * 60 * 60 * 1000).unwrap();
    cache.save_at(60, SortOrder::Asc, two_hours_ago).unwrap();

    let (api, _, engine) = engine_with(1..=100, options(10, 50));
    let engine = engine.with_cache(cache.clone());
    engine.mount(SortOrder::Desc).await;
    assert_eq!(engine.sort_order(), SortOrder::Desc);
    assert!(api.page_queries()[0].cursor.is_sentinel());

    store.set(KEY, "{not json").unwrap();
    let (api, _, engine) = engine_with(1..=100, options(10, 50));
    let engine = engine.with_cache(cache);
    engine.mount(SortOrder::Desc).await;
    assert!(api.page_queries()[0].cursor.is_sentinel());
    assert_eq!(engine.ids(), desc(91..=100));
}

#[tokio::test(start_paused = true)]
async fn test_downward_loads_do_not_move_the_cached_position() {
    let dir = TempDir::new().unwrap();
    let (_, _, engine) = engine_with(1..=100, options(10, 50));
    let engine = engine.with_cache(file_cache(&dir));
    engine.mount(SortOrder::Asc).await;

    let path = FileStore::new(dir.path()).path_for(KEY);
    let before = fs::read_to_string(&path).unwrap();
    assert!(before.contains("\"beginID\":\"0\""));

    after_throttle().await;
    engine.load_edge(Edge::Bottom).await;
    let after = fs::read_to_string(&path).unwrap();
    assert_eq!(before, after);
}

#[tokio::test(start_paused = true)]
async fn test_cursor_past_the_end_restarts_from_the_top() {
    let cache = CursorCache::new(Arc::new(MemoryStore::new()), KEY);
    cache.save(5, SortOrder::Desc).unwrap();

    // Everything at or below the cached position was deleted meanwhile.
    let (api, _, engine) = engine_with(6..=100, options(10, 50));
    let engine = engine.with_cache(cache.clone());
    let outcome = engine.mount(SortOrder::Desc).await;

    assert!(outcome.is_applied());
    assert_eq!(engine.ids(), desc(91..=100));
    assert!(!engine.has_more_top());
    assert!(engine.has_more_bottom());
    assert_eq!(engine.total(), 95);

    let queries = api.page_queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].cursor.begin_id, 6);
    assert!(queries[1].cursor.is_sentinel());
    assert_eq!(cache.load().unwrap().begin_id, "101");
}

#[tokio::test(start_paused = true)]
async fn test_empty_list_saves_sentinel() {
    let cache = CursorCache::new(Arc::new(MemoryStore::new()), KEY);
    cache.save(60, SortOrder::Desc).unwrap();

    let (api, _, engine) = engine_with(Vec::<RecordId>::new(), options(10, 50));
    let engine = engine.with_cache(cache.clone());
    engine.mount(SortOrder::Desc).await;

    assert!(engine.ids().is_empty());
    assert!(!engine.has_more_top());
    assert!(!engine.has_more_bottom());
    assert_eq!(engine.total(), 0);
    assert_eq!(api.page_queries().len(), 2);
    assert_eq!(cache.load().unwrap().begin_id, "0");
}
