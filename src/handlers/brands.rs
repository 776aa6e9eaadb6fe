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
    models::brand,
    services::brands::{BrandFilter, CreateBrandInput, UpdateBrandInput},
    ApiResponse, AppState,
};

pub fn brand_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_brands).post(create_brand))
        .route("/:id", get(get_brand).put(update_brand).delete(delete_brand))
}

/// List brands
#[utoipa::path(
    get,
    path = "/api/v1/brands",
    params(BrandFilter),
    responses(
        (status = 200, description = "Brands", body = ApiResponse<Vec<brand::Model>>)
    ),
    tag = "Catalog"
)]
pub async fn list_brands(
    State(state): State<AppState>,
    query: Result<Query<BrandFilter>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<brand::Model>>>, ServiceError> {
    let filter = query_params(query)?;
    let brands = state.services.brands.list_brands(&filter).await?;
    Ok(Json(ApiResponse::success(brands)))
}

/// Create a brand
#[utoipa::path(
    post,
    path = "/api/v1/brands",
    request_body = CreateBrandInput,
    responses(
        (status = 201, description = "Brand created", body = ApiResponse<brand::Model>),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 409, description = "Brand name already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn create_brand(
    State(state): State<AppState>,
    payload: Result<Json<CreateBrandInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<brand::Model>>), ServiceError> {
    let input = json_body(payload)?;
    let brand = state.services.brands.create_brand(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(brand))))
}

/// Get a brand
#[utoipa::path(
    get,
    path = "/api/v1/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand id")),
    responses(
        (status = 200, description = "Brand", body = ApiResponse<brand::Model>),
        (status = 404, description = "Brand not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_brand(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<brand::Model>>, ServiceError> {
    let brand = state.services.brands.get_brand(path_id(id)?).await?;
    Ok(Json(ApiResponse::success(brand)))
}

/// Update a brand
#[utoipa::path(
    put,
    path = "/api/v1/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand id")),
    request_body = UpdateBrandInput,
    responses(
        (status = 200, description = "Brand updated", body = ApiResponse<brand::Model>),
        (status = 404, description = "Brand not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Brand name already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn update_brand(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateBrandInput>, JsonRejection>,
) -> Result<Json<ApiResponse<brand::Model>>, ServiceError> {
    let id = path_id(id)?;
    let input = json_body(payload)?;
    let brand = state.services.brands.update_brand(id, input).await?;
    Ok(Json(ApiResponse::success(brand)))
}

/// Delete a brand
///
/// Refused while stores, kitchen stations, table areas or bills still point
/// at the brand.
#[utoipa::path(
    delete,
    path = "/api/v1/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand id")),
    responses(
        (status = 204, description = "Brand deleted"),
        (status = 404, description = "Brand not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Brand is still referenced", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn delete_brand(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ServiceError> {
    state.services.brands.delete_brand(path_id(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
