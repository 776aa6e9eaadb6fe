use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::common::{optional_uuid, query_params};
use crate::{
    common::DateRange,
    errors::ServiceError,
    services::reports::{ReportData, ReportFilter, ReportKind},
    ApiResponse, AppState,
};

/// Build the analytics Router scoped under `/api/v1/analytics`.
///
/// Every report answers with and without a trailing slash.
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/daily-sales", get(get_daily_sales))
        .route("/daily-sales/", get(get_daily_sales))
        .route("/product-sales", get(get_product_sales))
        .route("/product-sales/", get(get_product_sales))
        .route("/promotion-performance", get(get_promotion_performance))
        .route("/promotion-performance/", get(get_promotion_performance))
        .route("/member-analytics", get(get_member_analytics))
        .route("/member-analytics/", get(get_member_analytics))
        .route("/inventory-cogs", get(get_inventory_cogs))
        .route("/inventory-cogs/", get(get_inventory_cogs))
        .route("/cashier-performance", get(get_cashier_performance))
        .route("/cashier-performance/", get(get_cashier_performance))
        .route("/payment-methods", get(get_payment_methods))
        .route("/payment-methods/", get(get_payment_methods))
}

/// Query parameters shared by all reports. Values are validated by
/// [`ReportQuery::into_filter`] so every failure uses the error envelope.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// First business date, `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Last business date (inclusive), `YYYY-MM-DD`
    pub end_date: Option<String>,
    pub brand_id: Option<String>,
    pub store_id: Option<String>,
    pub product_id: Option<String>,
    pub category_id: Option<String>,
    pub promotion_id: Option<String>,
    pub member_id: Option<String>,
    pub cashier_id: Option<String>,
    pub payment_method: Option<String>,
}

impl ReportQuery {
    pub fn into_filter(self) -> Result<ReportFilter, ServiceError> {
        let start = self
            .start_date
            .ok_or_else(|| ServiceError::ValidationError("start_date is required".to_string()))?;
        let end = self
            .end_date
            .ok_or_else(|| ServiceError::ValidationError("end_date is required".to_string()))?;

        Ok(ReportFilter {
            range: DateRange::parse(&start, &end)?,
            brand_id: optional_uuid("brand_id", self.brand_id.as_deref())?,
            store_id: optional_uuid("store_id", self.store_id.as_deref())?,
            product_id: optional_uuid("product_id", self.product_id.as_deref())?,
            category_id: optional_uuid("category_id", self.category_id.as_deref())?,
            promotion_id: optional_uuid("promotion_id", self.promotion_id.as_deref())?,
            member_id: optional_uuid("member_id", self.member_id.as_deref())?,
            cashier_id: optional_uuid("cashier_id", self.cashier_id.as_deref())?,
            payment_method: self
                .payment_method
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
        })
    }
}

async fn run_report(
    state: &AppState,
    kind: ReportKind,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ReportData>>, ServiceError> {
    let filter = query_params(query)?.into_filter()?;
    let data = state.services.reports.run(kind, &filter).await?;
    Ok(Json(ApiResponse::success(data)))
}

/// Sales totals per business day
#[utoipa::path(
    get,
    path = "/api/v1/analytics/daily-sales",
    params(ReportQuery),
    responses(
        (status = 200, description = "Daily sales report", body = ApiResponse<ReportData>),
        (status = 400, description = "Invalid report parameters", body = crate::errors::ErrorResponse)
    ),
    tag = "Analytics"
)]
pub async fn get_daily_sales(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ReportData>>, ServiceError> {
    run_report(&state, ReportKind::DailySales, query).await
}

/// Quantity and revenue per product
#[utoipa::path(
    get,
    path = "/api/v1/analytics/product-sales",
    params(ReportQuery),
    responses(
        (status = 200, description = "Product sales report", body = ApiResponse<ReportData>),
        (status = 400, description = "Invalid report parameters", body = crate::errors::ErrorResponse)
    ),
    tag = "Analytics"
)]
pub async fn get_product_sales(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ReportData>>, ServiceError> {
    run_report(&state, ReportKind::ProductSales, query).await
}

/// Usage, discount and cashback per promotion
#[utoipa::path(
    get,
    path = "/api/v1/analytics/promotion-performance",
    params(ReportQuery),
    responses(
        (status = 200, description = "Promotion performance report", body = ApiResponse<ReportData>),
        (status = 400, description = "Invalid report parameters", body = crate::errors::ErrorResponse)
    ),
    tag = "Analytics"
)]
pub async fn get_promotion_performance(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ReportData>>, ServiceError> {
    run_report(&state, ReportKind::PromotionPerformance, query).await
}

/// Visits and spend per loyalty member
#[utoipa::path(
    get,
    path = "/api/v1/analytics/member-analytics",
    params(ReportQuery),
    responses(
        (status = 200, description = "Member analytics report", body = ApiResponse<ReportData>),
        (status = 400, description = "Invalid report parameters", body = crate::errors::ErrorResponse)
    ),
    tag = "Analytics"
)]
pub async fn get_member_analytics(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ReportData>>, ServiceError> {
    run_report(&state, ReportKind::MemberAnalytics, query).await
}

/// Revenue, cost of goods sold and margin per product
#[utoipa::path(
    get,
    path = "/api/v1/analytics/inventory-cogs",
    params(ReportQuery),
    responses(
        (status = 200, description = "Inventory COGS report", body = ApiResponse<ReportData>),
        (status = 400, description = "Invalid report parameters", body = crate::errors::ErrorResponse)
    ),
    tag = "Analytics"
)]
pub async fn get_inventory_cogs(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ReportData>>, ServiceError> {
    run_report(&state, ReportKind::InventoryCogs, query).await
}

/// Bills and sales per cashier
#[utoipa::path(
    get,
    path = "/api/v1/analytics/cashier-performance",
    params(ReportQuery),
    responses(
        (status = 200, description = "Cashier performance report", body = ApiResponse<ReportData>),
        (status = 400, description = "Invalid report parameters", body = crate::errors::ErrorResponse)
    ),
    tag = "Analytics"
)]
pub async fn get_cashier_performance(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ReportData>>, ServiceError> {
    run_report(&state, ReportKind::CashierPerformance, query).await
}

/// Successful payment volume per payment method
#[utoipa::path(
    get,
    path = "/api/v1/analytics/payment-methods",
    params(ReportQuery),
    responses(
        (status = 200, description = "Payment method report", body = ApiResponse<ReportData>),
        (status = 400, description = "Invalid report parameters", body = crate::errors::ErrorResponse)
    ),
    tag = "Analytics"
)]
pub async fn get_payment_methods(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ReportData>>, ServiceError> {
    run_report(&state, ReportKind::PaymentMethods, query).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn query(start: &str, end: &str) -> ReportQuery {
        ReportQuery {
            start_date: Some(start.to_string()),
            end_date: Some(end.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn missing_dates_are_rejected() {
        let q = ReportQuery {
            start_date: Some("2024-03-01".into()),
            ..Default::default()
        };
        assert_matches!(q.into_filter(), Err(ServiceError::ValidationError(msg)) if msg.contains("end_date"));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        let mut q = query("2024-03-01", "2024-03-02");
        q.store_id = Some("store-1".into());
        assert_matches!(q.into_filter(), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn blank_filters_are_ignored() {
        let mut q = query("2024-03-01", "2024-03-02");
        q.brand_id = Some(String::new());
        q.payment_method = Some(" ".into());
        let filter = q.into_filter().unwrap();
        assert_eq!(filter.brand_id, None);
        assert_eq!(filter.payment_method, None);
    }
}
