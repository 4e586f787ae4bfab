//! Request handlers for the read API

use crate::api::{ApiError, AppState};
use crate::model::Category;
use crate::scrape::{CycleOutcome, RefreshRequest};
use crate::storage::SnapshotStore;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// Query parameters accepted by `GET /stock`
#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub category: Option<String>,
}

/// Serves the service index with the available endpoints
pub async fn get_index() -> Json<Value> {
    Json(json!({
        "message": "Garden stock extraction service",
        "endpoints": {
            "/stock": "GET - full stock state",
            "/stock?category=<key>": "GET - one category",
            "/stock/refresh": "GET - run an extraction cycle now"
        },
        "available_categories": Category::ALL.map(|c| c.as_key()),
    }))
}

/// Serves the latest snapshots
///
/// Without a `category` parameter this returns every category keyed by
/// name, with categories that have never been captured rendered as empty
/// arrays. With `category=<key>` it returns that category's items keyed
/// by the category name, or 404 when the key is unknown or the category
/// has never been captured.
///
/// # Arguments
///
/// * `state` - Shared store handle
/// * `query` - Optional category filter
pub async fn get_stock(
    State(state): State<AppState>,
    Query(query): Query<StockQuery>,
) -> Result<Json<Value>, ApiError> {
    match query.category {
        Some(ref key) => {
            let category = match Category::from_key(key) {
                Some(category) => category,
                None => return Err(ApiError::not_found("unknown category")),
            };

            let snapshot = {
                let store = state.store.lock().unwrap();
                store.get(category).map_err(ApiError::internal)?
            };

            match snapshot {
                Some(snapshot) => {
                    let mut body = serde_json::Map::new();
                    body.insert(category.as_key().to_string(), json!(snapshot.items));
                    body.insert("last_updated".to_string(), json!(snapshot.captured_at));
                    Ok(Json(Value::Object(body)))
                }
                None => Err(ApiError::not_found("category has no data yet")),
            }
        }
        None => {
            let stock = {
                let store = state.store.lock().unwrap();
                store.get_all().map_err(ApiError::internal)?
            };

            let mut body = serde_json::Map::new();
            for category in Category::ALL {
                let items = stock
                    .snapshots
                    .get(&category)
                    .map(|snapshot| snapshot.items.clone())
                    .unwrap_or_default();
                body.insert(category.as_key().to_string(), json!(items));
            }
            body.insert("last_updated".to_string(), json!(stock.last_updated));
            Ok(Json(Value::Object(body)))
        }
    }
}

/// Runs a manual extraction cycle, then reports the resulting state
///
/// The request is queued on the scheduler loop's channel and the response
/// waits for that cycle to complete, so manual cycles are serialized with
/// timer-triggered ones. The response is 200 even when the cycle itself
/// failed upstream; the message says what happened and `last_updated`
/// reflects whatever the store now holds.
pub async fn refresh_stock(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let (reply_sender, reply_receiver) = oneshot::channel();
    state
        .refresh
        .send(RefreshRequest {
            reply: reply_sender,
        })
        .await
        .map_err(|_| ApiError::internal("scheduler is not running"))?;

    let outcome = reply_receiver
        .await
        .map_err(|_| ApiError::internal("scheduler dropped the refresh request"))?;

    let message = match outcome {
        CycleOutcome::Success { .. } => "Stock data refreshed",
        CycleOutcome::ParseFailure => "Refresh ran but the page structure was not recognized",
        CycleOutcome::TransportFailure | CycleOutcome::Exhausted => {
            "Refresh ran but the stock page could not be fetched"
        }
    };

    let last_updated = {
        let store = state.store.lock().unwrap();
        store.get_all().map_err(ApiError::internal)?.last_updated
    };

    Ok(Json(json!({
        "message": message,
        "last_updated": last_updated,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;
    use crate::scrape::{run_scheduler, ExtractionCycle, FetchError, PageFetcher};
    use crate::storage::SqliteStore;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    fn create_test_state() -> (AppState, mpsc::Receiver<RefreshRequest>) {
        let store = Arc::new(Mutex::new(SqliteStore::new_in_memory().unwrap()));
        let (sender, receiver) = mpsc::channel(4);
        (AppState::new(store, sender), receiver)
    }

    fn stamp(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    struct StaticFetcher {
        body: String,
    }

    impl PageFetcher for StaticFetcher {
        async fn fetch_page(&self, _attempt: u32) -> Result<String, FetchError> {
            Ok(self.body.clone())
        }
    }

    #[tokio::test]
    async fn test_index_lists_categories() {
        let Json(body) = get_index().await;

        let categories = body["available_categories"].as_array().unwrap();
        assert_eq!(categories.len(), 5);
        assert!(categories.contains(&json!("egg_shop")));
        assert!(body["endpoints"]["/stock"].is_string());
    }

    #[tokio::test]
    async fn test_full_stock_renders_all_categories() {
        let (state, _receiver) = create_test_state();
        {
            let mut store = state.store.lock().unwrap();
            store
                .replace(Category::Seeds, &[Item::new("Carrot", 5)], stamp(0))
                .unwrap();
        }

        let Json(body) = get_stock(State(state), Query(StockQuery { category: None }))
            .await
            .unwrap();

        assert_eq!(body["seeds"][0]["name"], json!("Carrot"));
        assert_eq!(body["seeds"][0]["stock"], json!(5));
        assert_eq!(body["seeds"][0]["price"], json!(0));
        assert_eq!(body["gear"], json!([]));
        assert_eq!(body["egg_shop"], json!([]));
        assert!(body["last_updated"].is_string());
    }

    #[tokio::test]
    async fn test_empty_store_renders_null_last_updated() {
        let (state, _receiver) = create_test_state();

        let Json(body) = get_stock(State(state), Query(StockQuery { category: None }))
            .await
            .unwrap();

        assert!(body["last_updated"].is_null());
        assert_eq!(body["cosmetics"], json!([]));
    }

    #[tokio::test]
    async fn test_single_category_keyed_by_name() {
        let (state, _receiver) = create_test_state();
        {
            let mut store = state.store.lock().unwrap();
            store
                .replace(Category::Gear, &[Item::new("Trowel", 2)], stamp(0))
                .unwrap();
        }

        let Json(body) = get_stock(
            State(state),
            Query(StockQuery {
                category: Some("gear".to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(body["gear"][0]["name"], json!("Trowel"));
        assert!(body["last_updated"].is_string());
        assert!(body.get("seeds").is_none());
    }

    #[tokio::test]
    async fn test_unknown_category_is_not_found() {
        let (state, _receiver) = create_test_state();

        let result = get_stock(
            State(state),
            Query(StockQuery {
                category: Some("weapons".to_string()),
            }),
        )
        .await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_never_captured_category_is_not_found() {
        let (state, _receiver) = create_test_state();

        let result = get_stock(
            State(state),
            Query(StockQuery {
                category: Some("honey".to_string()),
            }),
        )
        .await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_captured_empty_category_is_ok() {
        let (state, _receiver) = create_test_state();
        {
            let mut store = state.store.lock().unwrap();
            store.replace(Category::Honey, &[], stamp(0)).unwrap();
        }

        let Json(body) = get_stock(
            State(state),
            Query(StockQuery {
                category: Some("honey".to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(body["honey"], json!([]));
    }

    #[tokio::test]
    async fn test_refresh_runs_cycle_through_scheduler() {
        let store = Arc::new(Mutex::new(SqliteStore::new_in_memory().unwrap()));
        let (sender, receiver) = mpsc::channel(4);
        let state = AppState::new(store.clone(), sender);

        let fetcher = StaticFetcher {
            body: r#"
                <html><body><main>
                    <div>
                        <h2>Seeds</h2>
                        <ul><li>Carrot x4</li></ul>
                    </div>
                </main></body></html>
            "#
            .to_string(),
        };
        tokio::spawn(run_scheduler(
            ExtractionCycle::new(fetcher, store, 1),
            receiver,
        ));

        let Json(body) = refresh_stock(State(state.clone())).await.unwrap();

        assert_eq!(body["message"], json!("Stock data refreshed"));
        assert!(body["last_updated"].is_string());

        let snapshot = {
            let store = state.store.lock().unwrap();
            store.get(Category::Seeds).unwrap()
        };
        assert!(snapshot.is_some());
    }

    #[tokio::test]
    async fn test_refresh_without_scheduler_is_internal_error() {
        let (state, receiver) = create_test_state();
        drop(receiver);

        let result = refresh_stock(State(state)).await;

        assert!(matches!(result, Err(ApiError::Internal(_))));
    }
}
