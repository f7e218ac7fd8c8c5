//! Integration tests for bulk changes, selection and the listing cache.

mod common;

use basecamp::error::AppError;
use basecamp::models::ItemType;
use common::TestClient;
use serde_json::json;

/// Bulk category change for [1, 2, 3] -> "5" clears the selection and
/// invalidates the cached listing.
#[tokio::test]
async fn test_bulk_category_clears_selection_and_cache() {
    let client = TestClient::new().await;
    let state = client.state();
    client
        .backend
        .set_listing(json!([{"id": 1, "title": "Alpine lakes", "categoryId": "2"}]));

    state.cached_listing(ItemType::Posts).await.unwrap();
    state.cached_listing(ItemType::Posts).await.unwrap();
    assert_eq!(client.backend.listing_fetches("/posts"), 1);

    state.selections.replace(ItemType::Posts, &[1, 2, 3]);
    let updated = state
        .bulk()
        .set_category(ItemType::Posts, &[1, 2, 3], "5")
        .await
        .unwrap();

    assert_eq!(updated, 3);
    assert!(state.selections.get(ItemType::Posts).is_empty());
    state.cached_listing(ItemType::Posts).await.unwrap();
    assert_eq!(client.backend.listing_fetches("/posts"), 2);

    let calls = client.backend.calls_matching("/posts/bulk-category");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "PATCH");
    assert_eq!(calls[0].body, json!({"ids": [1, 2, 3], "categoryId": "5"}));
}

/// A rejected bulk change keeps the selection and the cache.
#[tokio::test]
async fn test_failed_bulk_change_keeps_selection() {
    let client = TestClient::new().await;
    let state = client.state();
    client.backend.set_bulk_status(500);

    state.cached_listing(ItemType::Videos).await.unwrap();
    state.selections.replace(ItemType::Videos, &[7, 8]);

    let err = state
        .bulk()
        .set_status(ItemType::Videos, &[7, 8], "archived")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Backend { status: 500, .. }));

    assert_eq!(state.selections.get(ItemType::Videos), vec![7, 8]);
    state.cached_listing(ItemType::Videos).await.unwrap();
    assert_eq!(client.backend.listing_fetches("/videos"), 1);
    assert_eq!(client.backend.calls_matching("/videos/bulk-status").len(), 1);
}

/// Empty ID lists never reach the backend.
#[tokio::test]
async fn test_bulk_change_requires_ids() {
    let client = TestClient::new().await;

    let err = client
        .state()
        .bulk()
        .delete(ItemType::Posts, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = client
        .state()
        .bulk()
        .set_category(ItemType::Posts, &[1], "  ")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(client.backend.calls().is_empty());
}

/// Bulk delete sends DELETE with the ID list and deduplicates it.
#[tokio::test]
async fn test_bulk_delete_sends_ids() {
    let client = TestClient::new().await;

    let removed = client
        .state()
        .bulk()
        .delete(ItemType::Videos, &[4, 4, 9])
        .await
        .unwrap();
    assert_eq!(removed, 2);

    let calls = client.backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "DELETE");
    assert_eq!(calls[0].path, "/videos");
    assert_eq!(calls[0].body, json!({"ids": [4, 9]}));
}

/// Cached listings are served without refetching until invalidated.
#[tokio::test]
async fn test_listing_cache_refetches_after_invalidation() {
    let client = TestClient::new().await;
    let state = client.state();
    client
        .backend
        .set_listing(json!([{"id": 1, "title": "Desert hikes"}]));

    let first = state.cached_listing(ItemType::Posts).await.unwrap();
    client
        .backend
        .set_listing(json!([{"id": 1, "title": "Desert hikes"}, {"id": 2, "title": "Snowshoe routes"}]));
    let stale = state.cached_listing(ItemType::Posts).await.unwrap();
    assert_eq!(first, stale);
    assert_eq!(client.backend.calls_matching("/posts").len(), 1);

    state.cache.invalidate(ItemType::Posts);
    let fresh = state.cached_listing(ItemType::Posts).await.unwrap();
    assert_eq!(fresh.len(), 2);
    assert_eq!(fresh[1].title, "Snowshoe routes");
    assert_eq!(client.backend.calls_matching("/posts").len(), 2);
}

/// Invalidating one item type leaves the other cached.
#[tokio::test]
async fn test_invalidation_is_per_item_type() {
    let client = TestClient::new().await;
    let state = client.state();

    state.cached_listing(ItemType::Posts).await.unwrap();
    state.cached_listing(ItemType::Videos).await.unwrap();

    state.cache.invalidate(ItemType::Videos);
    state.cached_listing(ItemType::Posts).await.unwrap();
    state.cached_listing(ItemType::Videos).await.unwrap();

    assert_eq!(client.backend.listing_fetches("/posts"), 1);
    assert_eq!(client.backend.listing_fetches("/videos"), 2);
}

/// A listing that does not decode is an error and is not cached.
#[tokio::test]
async fn test_undecodable_listing_is_not_cached() {
    let client = TestClient::new().await;
    let state = client.state();
    client.backend.set_listing(json!([{"id": "nine"}]));

    let err = state.cached_listing(ItemType::Posts).await.unwrap_err();
    assert!(matches!(err, AppError::Http(_)));

    client
        .backend
        .set_listing(json!([{"id": 9, "title": "Gear review"}]));
    let rows = state.cached_listing(ItemType::Posts).await.unwrap();
    assert_eq!(rows[0].id, 9);
    assert_eq!(client.backend.listing_fetches("/posts"), 2);

    let conn = state.db.get().unwrap();
    let failed = basecamp::db::queries::api_logs::get_failed_logs_since(&conn, 0).unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].endpoint, "GET /posts");
}
