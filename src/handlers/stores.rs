use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use uuid::Uuid;

use super::common::{json_body, path_id, query_params};
use crate::{
    errors::ServiceError,
    models::store,
    services::stores::{CreateStoreInput, StoreFilter, UpdateStoreInput},
    ApiResponse, AppState,
};

pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stores).post(create_store))
        .route("/:id", get(get_store).put(update_store).delete(delete_store))
}

#[utoipa::path(
    get,
    path = "/api/v1/stores",
    params(StoreFilter),
    responses(
        (status = 200, description = "Stores", body = ApiResponse<Vec<store::Model>>)
    ),
    tag = "Catalog"
)]
pub async fn list_stores(
    State(state): State<AppState>,
    query: Result<Query<StoreFilter>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<store::Model>>>, ServiceError> {
    let filter = query_params(query)?;
    let stores = state.services.stores.list_stores(&filter).await?;
    Ok(Json(ApiResponse::success(stores)))
}

#[utoipa::path(
    post,
    path = "/api/v1/stores",
    request_body = CreateStoreInput,
    responses(
        (status = 201, description = "Store created", body = ApiResponse<store::Model>),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Brand not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Store code already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn create_store(
    State(state): State<AppState>,
    payload: Result<Json<CreateStoreInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<store::Model>>), ServiceError> {
    let store = state.services.stores.create_store(json_body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(store))))
}

#[utoipa::path(
    get,
    path = "/api/v1/stores/{id}",
    params(("id" = Uuid, Path, description = "Store id")),
    responses(
        (status = 200, description = "Store", body = ApiResponse<store::Model>),
        (status = 404, description = "Store not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_store(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<store::Model>>, ServiceError> {
    let store = state.services.stores.get_store(path_id(id)?).await?;
    Ok(Json(ApiResponse::success(store)))
}

#[utoipa::path(
    put,
    path = "/api/v1/stores/{id}",
    params(("id" = Uuid, Path, description = "Store id")),
    request_body = UpdateStoreInput,
    responses(
        (status = 200, description = "Store updated", body = ApiResponse<store::Model>),
        (status = 404, description = "Store not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn update_store(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateStoreInput>, JsonRejection>,
) -> Result<Json<ApiResponse<store::Model>>, ServiceError> {
    let id = path_id(id)?;
    let store = state
        .services
        .stores
        .update_store(id, json_body(payload)?)
        .await?;
    Ok(Json(ApiResponse::success(store)))
}

/// Delete a store. Refused while areas, stations or bills reference it.
#[utoipa::path(
    delete,
    path = "/api/v1/stores/{id}",
    params(("id" = Uuid, Path, description = "Store id")),
    responses(
        (status = 204, description = "Store deleted"),
        (status = 404, description = "Store not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Store is still referenced", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn delete_store(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ServiceError> {
    state.services.stores.delete_store(path_id(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
