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
    models::{table_area, tables},
    services::table_areas::{AreaFilter, CreateAreaInput, CreateTableInput, TableFilter},
    ApiResponse, AppState,
};

pub fn table_area_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_areas).post(create_area))
        .route("/:id", get(get_area).delete(delete_area))
}

pub fn table_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tables).post(create_table))
        .route("/:id", get(get_table).delete(delete_table))
}

#[utoipa::path(
    get,
    path = "/api/v1/table-areas",
    params(AreaFilter),
    responses(
        (status = 200, description = "Table areas", body = ApiResponse<Vec<table_area::Model>>)
    ),
    tag = "Catalog"
)]
pub async fn list_areas(
    State(state): State<AppState>,
    query: Result<Query<AreaFilter>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<table_area::Model>>>, ServiceError> {
    let filter = query_params(query)?;
    let areas = state.services.table_areas.list_areas(&filter).await?;
    Ok(Json(ApiResponse::success(areas)))
}

/// Create a table area. The owning company is taken from the store's brand.
#[utoipa::path(
    post,
    path = "/api/v1/table-areas",
    request_body = CreateAreaInput,
    responses(
        (status = 201, description = "Table area created", body = ApiResponse<table_area::Model>),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 409, description = "Area name already used in this store", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn create_area(
    State(state): State<AppState>,
    payload: Result<Json<CreateAreaInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<table_area::Model>>), ServiceError> {
    let area = state
        .services
        .table_areas
        .create_area(json_body(payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(area))))
}

#[utoipa::path(
    get,
    path = "/api/v1/table-areas/{id}",
    params(("id" = Uuid, Path, description = "Table area id")),
    responses(
        (status = 200, description = "Table area", body = ApiResponse<table_area::Model>),
        (status = 404, description = "Table area not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_area(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<table_area::Model>>, ServiceError> {
    let area = state.services.table_areas.get_area(path_id(id)?).await?;
    Ok(Json(ApiResponse::success(area)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/table-areas/{id}",
    params(("id" = Uuid, Path, description = "Table area id")),
    responses(
        (status = 204, description = "Table area deleted"),
        (status = 404, description = "Table area not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Area still has tables", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn delete_area(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ServiceError> {
    state.services.table_areas.delete_area(path_id(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/tables",
    params(TableFilter),
    responses(
        (status = 200, description = "Tables", body = ApiResponse<Vec<tables::Model>>)
    ),
    tag = "Catalog"
)]
pub async fn list_tables(
    State(state): State<AppState>,
    query: Result<Query<TableFilter>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<tables::Model>>>, ServiceError> {
    let filter = query_params(query)?;
    let tables = state.services.table_areas.list_tables(&filter).await?;
    Ok(Json(ApiResponse::success(tables)))
}

#[utoipa::path(
    post,
    path = "/api/v1/tables",
    request_body = CreateTableInput,
    responses(
        (status = 201, description = "Table created", body = ApiResponse<tables::Model>),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 409, description = "Table number already used in this area", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn create_table(
    State(state): State<AppState>,
    payload: Result<Json<CreateTableInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<tables::Model>>), ServiceError> {
    let table = state
        .services
        .table_areas
        .create_table(json_body(payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(table))))
}

#[utoipa::path(
    get,
    path = "/api/v1/tables/{id}",
    params(("id" = Uuid, Path, description = "Table id")),
    responses(
        (status = 200, description = "Table", body = ApiResponse<tables::Model>),
        (status = 404, description = "Table not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_table(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<tables::Model>>, ServiceError> {
    let table = state.services.table_areas.get_table(path_id(id)?).await?;
    Ok(Json(ApiResponse::success(table)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tables/{id}",
    params(("id" = Uuid, Path, description = "Table id")),
    responses(
        (status = 204, description = "Table deleted"),
        (status = 404, description = "Table not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn delete_table(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ServiceError> {
    state.services.table_areas.delete_table(path_id(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
