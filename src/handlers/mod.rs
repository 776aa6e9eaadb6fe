pub mod analytics;
pub mod brands;
pub mod common;
pub mod kitchen_stations;
pub mod stores;
pub mod table_areas;

use crate::db::DbPool;
use crate::services::{
    brands::BrandService, kitchen_stations::KitchenStationService, members::MemberPointsService,
    reports::ReportService, stores::StoreService, table_areas::TableAreaService,
};
use chrono::FixedOffset;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub brands: Arc<BrandService>,
    pub stores: Arc<StoreService>,
    pub kitchen_stations: Arc<KitchenStationService>,
    pub table_areas: Arc<TableAreaService>,
    pub members: Arc<MemberPointsService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    /// `offset` is the business timezone used for day boundaries.
    pub fn new(db_pool: Arc<DbPool>, offset: FixedOffset) -> Self {
        Self {
            brands: Arc::new(BrandService::new(db_pool.clone())),
            stores: Arc::new(StoreService::new(db_pool.clone())),
            kitchen_stations: Arc::new(KitchenStationService::new(db_pool.clone())),
            table_areas: Arc::new(TableAreaService::new(db_pool.clone())),
            members: Arc::new(MemberPointsService::new(db_pool.clone(), offset)),
            reports: Arc::new(ReportService::new(db_pool, offset)),
        }
    }
}
