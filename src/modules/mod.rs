pub mod books;
pub mod redis;

use std::sync::Arc;

use shelf_kernel::{settings::Settings, ModuleRegistry};
use shelf_store::{KeyValueStore, StoreModule};

/// Register the store lifecycle module and every HTTP module with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    settings: &Settings,
    store: Arc<dyn KeyValueStore>,
) {
    registry.register_core(Arc::new(StoreModule::new(Arc::clone(&store))));
    registry.register_custom(Arc::new(redis::RedisModule::new(store, &settings.seed)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::Request, http::StatusCode};
    use serde_json::json;
    use shelf_store::MemoryStore;
    use tower::ServiceExt;

    fn registry_with(store: &Arc<MemoryStore>) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        let store: Arc<dyn KeyValueStore> = store.clone();
        register_all(&mut registry, &Settings::default(), store);
        registry
    }

    async fn call(uri: &str, store: &Arc<MemoryStore>) -> (StatusCode, serde_json::Value) {
        let app = shelf_http::app(&registry_with(store), &Settings::default());
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn trailing_slash_without_key_is_bad_request_without_store_call() {
        let store = Arc::new(MemoryStore::new());
        let (status, body) = call("/redis/", &store).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"success": false, "message": "Key parameter is required"})
        );
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn mounted_health_route_answers_with_and_without_trailing_slash() {
        let store = Arc::new(MemoryStore::new());
        for uri in ["/redis/health", "/redis/health/"] {
            let (status, body) = call(uri, &store).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["data"], "PONG");
        }
    }
}
