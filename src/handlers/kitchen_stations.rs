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
    models::kitchen_station,
    services::kitchen_stations::{CreateStationInput, StationFilter, UpdateStationInput},
    ApiResponse, AppState,
};

pub fn kitchen_station_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stations).post(create_station))
        .route(
            "/:id",
            get(get_station).put(update_station).delete(delete_station),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/kitchen-stations",
    params(StationFilter),
    responses(
        (status = 200, description = "Kitchen stations", body = ApiResponse<Vec<kitchen_station::Model>>)
    ),
    tag = "Catalog"
)]
pub async fn list_stations(
    State(state): State<AppState>,
    query: Result<Query<StationFilter>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<kitchen_station::Model>>>, ServiceError> {
    let filter = query_params(query)?;
    let stations = state.services.kitchen_stations.list_stations(&filter).await?;
    Ok(Json(ApiResponse::success(stations)))
}

/// Create a kitchen station
///
/// A station without `store_id` applies to every store of the brand. The code
/// is unique per brand and store scope.
#[utoipa::path(
    post,
    path = "/api/v1/kitchen-stations",
    request_body = CreateStationInput,
    responses(
        (status = 201, description = "Kitchen station created", body = ApiResponse<kitchen_station::Model>),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 409, description = "Code already used in this scope", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn create_station(
    State(state): State<AppState>,
    payload: Result<Json<CreateStationInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<kitchen_station::Model>>), ServiceError> {
    let station = state
        .services
        .kitchen_stations
        .create_station(json_body(payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(station))))
}

#[utoipa::path(
    get,
    path = "/api/v1/kitchen-stations/{id}",
    params(("id" = Uuid, Path, description = "Kitchen station id")),
    responses(
        (status = 200, description = "Kitchen station", body = ApiResponse<kitchen_station::Model>),
        (status = 404, description = "Kitchen station not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_station(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<kitchen_station::Model>>, ServiceError> {
    let station = state
        .services
        .kitchen_stations
        .get_station(path_id(id)?)
        .await?;
    Ok(Json(ApiResponse::success(station)))
}

#[utoipa::path(
    put,
    path = "/api/v1/kitchen-stations/{id}",
    params(("id" = Uuid, Path, description = "Kitchen station id")),
    request_body = UpdateStationInput,
    responses(
        (status = 200, description = "Kitchen station updated", body = ApiResponse<kitchen_station::Model>),
        (status = 404, description = "Kitchen station not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Code already used in this scope", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn update_station(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateStationInput>, JsonRejection>,
) -> Result<Json<ApiResponse<kitchen_station::Model>>, ServiceError> {
    let id = path_id(id)?;
    let station = state
        .services
        .kitchen_stations
        .update_station(id, json_body(payload)?)
        .await?;
    Ok(Json(ApiResponse::success(station)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/kitchen-stations/{id}",
    params(("id" = Uuid, Path, description = "Kitchen station id")),
    responses(
        (status = 204, description = "Kitchen station deleted"),
        (status = 404, description = "Kitchen station not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn delete_station(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .kitchen_stations
        .delete_station(path_id(id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
