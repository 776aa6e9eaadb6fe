use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "F&B Back Office API",
        version = "0.1.0",
        description = r#"
# F&B Back Office API

Head-office API for restaurant brands: catalog administration for brands,
stores, kitchen stations and dining tables, plus sales analytics over bills
synced from the POS.

## Business dates

Report ranges are inclusive business dates (`YYYY-MM-DD`) interpreted in the
configured business time zone.

## Error Handling

Every failure uses the same envelope with a stable `code`:

```json
{
  "error": "Conflict",
  "code": "delete_protected",
  "message": "Delete blocked: brand 6c1f... is referenced by 2 store(s)",
  "request_id": "req-abc123xyz",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Catalog", description = "Brands, stores, kitchen stations and tables"),
        (name = "Analytics", description = "Sales reports over synced bills")
    ),
    paths(
        // Brands
        crate::handlers::brands::list_brands,
        crate::handlers::brands::create_brand,
        crate::handlers::brands::get_brand,
        crate::handlers::brands::update_brand,
        crate::handlers::brands::delete_brand,

        // Stores
        crate::handlers::stores::list_stores,
        crate::handlers::stores::create_store,
        crate::handlers::stores::get_store,
        crate::handlers::stores::update_store,
        crate::handlers::stores::delete_store,

        // Kitchen stations
        crate::handlers::kitchen_stations::list_stations,
        crate::handlers::kitchen_stations::create_station,
        crate::handlers::kitchen_stations::get_station,
        crate::handlers::kitchen_stations::update_station,
        crate::handlers::kitchen_stations::delete_station,

        // Table areas and tables
        crate::handlers::table_areas::list_areas,
        crate::handlers::table_areas::create_area,
        crate::handlers::table_areas::get_area,
        crate::handlers::table_areas::delete_area,
        crate::handlers::table_areas::list_tables,
        crate::handlers::table_areas::create_table,
        crate::handlers::table_areas::get_table,
        crate::handlers::table_areas::delete_table,

        // Analytics
        crate::handlers::analytics::get_daily_sales,
        crate::handlers::analytics::get_product_sales,
        crate::handlers::analytics::get_promotion_performance,
        crate::handlers::analytics::get_member_analytics,
        crate::handlers::analytics::get_inventory_cogs,
        crate::handlers::analytics::get_cashier_performance,
        crate::handlers::analytics::get_payment_methods,
    ),
    components(
        schemas(
            crate::common::DateRange,
            crate::services::reports::ReportKind,
            crate::services::reports::ReportData,
            crate::models::tables::TableStatus,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
