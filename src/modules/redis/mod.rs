pub mod handlers;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use serde_json::json;
use shelf_kernel::{settings::SeedSettings, InitCtx, Module};
use shelf_store::KeyValueStore;

use crate::modules::books::seed::IdStrategy;
use handlers::RedisState;

/// Key-value endpoints and the sample-data seeder, mounted under `/redis`
pub struct RedisModule {
    state: RedisState,
}

impl RedisModule {
    pub fn new(store: Arc<dyn KeyValueStore>, seed: &SeedSettings) -> Self {
        let ids = if seed.deterministic_ids {
            IdStrategy::Deterministic
        } else {
            IdStrategy::Random
        };
        Self {
            state: RedisState { store, ids },
        }
    }
}

#[async_trait]
impl Module for RedisModule {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn mount_path(&self) -> String {
        "/redis".to_string()
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            ids = ?self.state.ids,
            "redis module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(handlers::missing_key))
            .route("/health", get(handlers::health))
            .route("/set", post(handlers::set_value))
            .route("/populate", get(handlers::populate))
            .route("/{key}", get(handlers::get_value))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let envelope = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/Envelope" }
                    }
                }
            })
        };
        let populate = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/PopulateResponse" }
                    }
                }
            })
        };

        Some(json!({
            "paths": {
                "/health": {
                    "get": {
                        "summary": "Ping the store",
                        "tags": ["Redis"],
                        "responses": {
                            "200": envelope("Store answered PONG"),
                            "503": envelope("Store unreachable or unhealthy")
                        }
                    }
                },
                "/set": {
                    "post": {
                        "summary": "Store a value",
                        "tags": ["Redis"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/KeyValueEntry" }
                                }
                            }
                        },
                        "responses": {
                            "201": envelope("Value saved"),
                            "400": envelope("Missing or malformed body"),
                            "500": envelope("Store failure")
                        }
                    }
                },
                "/{key}": {
                    "get": {
                        "summary": "Read a value",
                        "tags": ["Redis"],
                        "parameters": [{
                            "name": "key",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": envelope("Value found"),
                            "400": envelope("Key missing"),
                            "404": envelope("Key not found"),
                            "500": envelope("Store failure")
                        }
                    }
                },
                "/populate": {
                    "get": {
                        "summary": "Write the sample books and chapters",
                        "tags": ["Redis"],
                        "responses": {
                            "200": populate("Sample data written"),
                            "500": populate("Aborted; earlier writes are kept")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "KeyValueEntry": {
                        "type": "object",
                        "properties": {
                            "key": { "type": "string" },
                            "value": { "type": "string" }
                        },
                        "required": ["key", "value"]
                    },
                    "PopulateResponse": {
                        "type": "object",
                        "properties": {
                            "success": { "type": "boolean" },
                            "message": { "type": "string" },
                            "booksCreated": { "type": "integer" },
                            "chaptersCreated": { "type": "integer" }
                        },
                        "required": ["success", "message", "booksCreated", "chaptersCreated"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "redis module stopped");
        Ok(())
    }
}
