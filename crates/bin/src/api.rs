//! HTTP routes over an [`Engine`].
//!
//! | Method | Path              | Success                  |
//! |--------|-------------------|--------------------------|
//! | POST   | `/api/items`      | 201 + created item       |
//! | GET    | `/api/items`      | 200 + depth-ordered list |
//! | GET    | `/api/items/{id}` | 200 + item               |
//! | PATCH  | `/api/items/{id}` | 200 + updated item       |
//! | DELETE | `/api/items/{id}` | 200, empty body          |
//! | GET    | `/health`         | 200 + status document    |
//!
//! Failures carry `{"error": <message>, "kind": <module>}` with 404 for unknown
//! ids, 400 for invalid input and 500 for store failures.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;

use stratum::{
    Engine, ItemId, PlacedItem,
    filter::ListParams,
    item::{CreateItemRequest, UpdateItemRequest},
};

/// Build the application router.
pub fn router(engine: Engine) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/items", get(handle_list).post(handle_create))
        .route(
            "/api/items/{id}",
            get(handle_get).patch(handle_update).delete(handle_delete),
        )
        .with_state(engine)
}

/// Error body returned for every failed request.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

/// A failure ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: message,
                kind: "request",
            },
        }
    }
}

impl From<stratum::Error> for ApiError {
    fn from(err: stratum::Error) -> Self {
        let status = if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else if err.is_validation_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        }
        Self {
            status,
            body: ErrorBody {
                error: err.to_string(),
                kind: err.module(),
            },
        }
    }
}

impl From<stratum::item::ItemError> for ApiError {
    fn from(err: stratum::item::ItemError) -> Self {
        stratum::Error::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    items: usize,
    time: String,
}

/// Handler for GET /health
async fn handle_health(State(engine): State<Engine>) -> Response {
    match engine.count().await {
        Ok(items) => Json(HealthResponse {
            status: "healthy",
            items,
            time: engine.clock().now_rfc3339(),
        })
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "unhealthy", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Handler for POST /api/items
async fn handle_create(
    State(engine): State<Engine>,
    body: Result<Json<CreateItemRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PlacedItem>)> {
    let Json(request) = body?;
    let item = engine.create_item(request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Handler for GET /api/items
async fn handle_list(
    State(engine): State<Engine>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<PlacedItem>>> {
    Ok(Json(engine.list_items(&params).await?))
}

/// Handler for GET /api/items/{id}
async fn handle_get(
    State(engine): State<Engine>,
    Path(id): Path<String>,
) -> ApiResult<Json<PlacedItem>> {
    let id: ItemId = id.parse()?;
    Ok(Json(engine.get(&id).await?))
}

/// Handler for PATCH /api/items/{id}
async fn handle_update(
    State(engine): State<Engine>,
    Path(id): Path<String>,
    body: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> ApiResult<Json<PlacedItem>> {
    let id: ItemId = id.parse()?;
    let Json(request) = body?;
    Ok(Json(engine.update_item(&id, request).await?))
}

/// Handler for DELETE /api/items/{id}
async fn handle_delete(
    State(engine): State<Engine>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id: ItemId = id.parse()?;
    engine.delete(&id).await?;
    Ok(StatusCode::OK)
}
