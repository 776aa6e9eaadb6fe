use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "store")]
#[schema(as = Store)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub brand_id: Uuid,
    #[sea_orm(unique)]
    pub store_code: String,
    pub store_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub timezone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::brand::Entity",
        from = "Column::BrandId",
        to = "super::brand::Column::Id",
        on_delete = "Restrict"
    )]
    Brand,
    #[sea_orm(has_many = "super::table_area::Entity")]
    TableAreas,
    #[sea_orm(has_many = "super::kitchen_station::Entity")]
    KitchenStations,
}

impl Related<super::brand::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brand.def()
    }
}

impl Related<super::table_area::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TableAreas.def()
    }
}

impl Related<super::kitchen_station::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::KitchenStations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
