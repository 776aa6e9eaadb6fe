//! Ordered, append-only migration log.
//!
//! Steps are applied in order by [`Migrator::up`]; sea-orm records applied
//! steps in `seaql_migrations`, so replaying the log on every start is a no-op
//! once the schema is current. Every step names the steps it builds on
//! ([`Migrator::history`]). New steps are only ever appended.

use sea_orm_migration::prelude::*;

pub struct Migrator;

/// A step of the migration log together with the steps it depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationRecord {
    pub name: &'static str,
    pub depends_on: &'static [&'static str],
}

macro_rules! record {
    ($module:ident) => {
        MigrationRecord {
            name: $module::NAME,
            depends_on: $module::DEPENDS_ON,
        }
    };
}

impl Migrator {
    /// The log in application order.
    pub fn history() -> Vec<MigrationRecord> {
        vec![
            record!(m20240101_000001_create_company),
            record!(m20240101_000002_create_brand),
            record!(m20240101_000003_create_store),
            record!(m20240101_000004_create_kitchen_station),
            record!(m20240101_000005_create_table_area_and_table),
            record!(m20240215_000006_kitchen_station_store_scope),
            record!(m20240301_000007_table_area_company),
            record!(m20240310_000008_rename_table_to_tables),
            record!(m20240401_000009_create_member_ledger),
            record!(m20240401_000010_create_bill_tables),
            record!(m20240401_000011_create_promotion_log),
            record!(m20240501_000012_create_report_snapshot_and_job_run),
        ]
    }
}

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_company::Migration),
            Box::new(m20240101_000002_create_brand::Migration),
            Box::new(m20240101_000003_create_store::Migration),
            Box::new(m20240101_000004_create_kitchen_station::Migration),
            Box::new(m20240101_000005_create_table_area_and_table::Migration),
            Box::new(m20240215_000006_kitchen_station_store_scope::Migration),
            Box::new(m20240301_000007_table_area_company::Migration),
            Box::new(m20240310_000008_rename_table_to_tables::Migration),
            Box::new(m20240401_000009_create_member_ledger::Migration),
            Box::new(m20240401_000010_create_bill_tables::Migration),
            Box::new(m20240401_000011_create_promotion_log::Migration),
            Box::new(m20240501_000012_create_report_snapshot_and_job_run::Migration),
        ]
    }
}

#[derive(DeriveIden)]
enum Company {
    Table,
    Id,
    Code,
    Name,
    Timezone,
    PointExpiryMonths,
    PointsPerCurrency,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Brand {
    Table,
    Id,
    CompanyId,
    Code,
    Name,
    TaxRate,
    ServiceCharge,
    PointExpiryMonthsOverride,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Store {
    Table,
    Id,
    BrandId,
    StoreCode,
    StoreName,
    Address,
    Phone,
    Timezone,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum KitchenStation {
    Table,
    Id,
    BrandId,
    StoreId,
    Name,
    Code,
    Description,
    SortOrder,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TableArea {
    Table,
    Id,
    CompanyId,
    BrandId,
    StoreId,
    Name,
    Description,
    SortOrder,
    FloorWidth,
    FloorHeight,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

/// Seating tables, stored as `table` until step 8 renamed it to `tables`.
#[derive(DeriveIden)]
enum DiningTable {
    #[sea_orm(iden = "table")]
    Table,
    #[sea_orm(iden = "tables")]
    Renamed,
    Id,
    AreaId,
    Number,
    Capacity,
    QrCode,
    PosX,
    PosY,
    Status,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Member {
    Table,
    Id,
    CompanyId,
    MemberCode,
    FullName,
    Phone,
    Tier,
    Points,
    PointBalance,
    TotalVisits,
    TotalSpent,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum MemberTransaction {
    Table,
    Id,
    MemberId,
    BillId,
    TransactionType,
    PointsChange,
    PointsBefore,
    PointsAfter,
    IsExpired,
    ExpiredAt,
    Reference,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Bill {
    Table,
    Id,
    CompanyId,
    BrandId,
    StoreId,
    TerminalCode,
    BillNumber,
    Status,
    MemberId,
    MemberCode,
    Subtotal,
    TaxAmount,
    ServiceCharge,
    DiscountAmount,
    Total,
    CreatedBy,
    CreatedAt,
    SyncedAt,
}

#[derive(DeriveIden)]
enum BillItem {
    Table,
    Id,
    BillId,
    ProductId,
    ProductSku,
    ProductName,
    CategoryId,
    Quantity,
    UnitPrice,
    UnitCost,
    DiscountAmount,
    Total,
    IsVoid,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Payment {
    Table,
    Id,
    BillId,
    PaymentMethod,
    Amount,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BillPromotion {
    Table,
    Id,
    BillId,
    PromotionId,
    PromotionName,
    PromotionCode,
    DiscountAmount,
    CashbackAmount,
    AppliedAt,
}

#[derive(DeriveIden)]
enum PromotionLog {
    Table,
    Id,
    BillId,
    PromotionId,
    Status,
    Reason,
    DiscountAmount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ReportSnapshot {
    Table,
    Id,
    ReportKind,
    ReportDate,
    Payload,
    GeneratedAt,
}

#[derive(DeriveIden)]
enum JobRun {
    Table,
    Id,
    JobName,
    Task,
    ScheduledFor,
    StartedAt,
    FinishedAt,
    Status,
    Detail,
}

fn money(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .decimal_len(14, 2)
        .not_null()
        .default(0)
        .to_owned()
}

fn timestamp(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

mod m20240101_000001_create_company {
    use super::*;

    pub const NAME: &str = "m20240101_000001_create_company";
    pub const DEPENDS_ON: &[&str] = &[];

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            NAME
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Company::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Company::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Company::Code)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Company::Name).string().not_null())
                        .col(
                            ColumnDef::new(Company::Timezone)
                                .string_len(64)
                                .not_null()
                                .default("Asia/Jakarta"),
                        )
                        .col(
                            ColumnDef::new(Company::PointExpiryMonths)
                                .integer()
                                .not_null()
                                .default(12),
                        )
                        .col(money(Company::PointsPerCurrency))
                        .col(
                            ColumnDef::new(Company::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(timestamp(Company::CreatedAt))
                        .col(timestamp(Company::UpdatedAt))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Company::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000002_create_brand {
    use super::*;

    pub const NAME: &str = "m20240101_000002_create_brand";
    pub const DEPENDS_ON: &[&str] = &[super::m20240101_000001_create_company::NAME];

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            NAME
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Brand::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Brand::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Brand::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(Brand::Code).string_len(32).not_null())
                        .col(
                            ColumnDef::new(Brand::Name)
                                .string_len(200)
                                .not_null()
                                .unique_key(),
                        )
                        .col(money(Brand::TaxRate))
                        .col(money(Brand::ServiceCharge))
                        .col(ColumnDef::new(Brand::PointExpiryMonthsOverride).integer().null())
                        .col(
                            ColumnDef::new(Brand::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(timestamp(Brand::CreatedAt))
                        .col(timestamp(Brand::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_brand_company")
                                .from(Brand::Table, Brand::CompanyId)
                                .to(Company::Table, Company::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_brand_company_code")
                        .table(Brand::Table)
                        .col(Brand::CompanyId)
                        .col(Brand::Code)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Brand::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000003_create_store {
    use super::*;

    pub const NAME: &str = "m20240101_000003_create_store";
    pub const DEPENDS_ON: &[&str] = &[super::m20240101_000002_create_brand::NAME];

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            NAME
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Store::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Store::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Store::BrandId).uuid().not_null())
                        .col(
                            ColumnDef::new(Store::StoreCode)
                                .string_len(20)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Store::StoreName).string_len(200).not_null())
                        .col(ColumnDef::new(Store::Address).text().null())
                        .col(ColumnDef::new(Store::Phone).string_len(20).null())
                        .col(
                            ColumnDef::new(Store::Timezone)
                                .string_len(64)
                                .not_null()
                                .default("Asia/Jakarta"),
                        )
                        .col(
                            ColumnDef::new(Store::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(timestamp(Store::CreatedAt))
                        .col(timestamp(Store::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_store_brand")
                                .from(Store::Table, Store::BrandId)
                                .to(Brand::Table, Brand::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_store_brand")
                        .table(Store::Table)
                        .col(Store::BrandId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Store::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000004_create_kitchen_station {
    use super::*;

    pub const NAME: &str = "m20240101_000004_create_kitchen_station";
    pub const DEPENDS_ON: &[&str] = &[super::m20240101_000002_create_brand::NAME];

    pub const BRAND_CODE_INDEX: &str = "idx_kitchen_station_brand_code";

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            NAME
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(KitchenStation::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(KitchenStation::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(KitchenStation::BrandId).uuid().not_null())
                        .col(ColumnDef::new(KitchenStation::Name).string_len(100).not_null())
                        .col(ColumnDef::new(KitchenStation::Code).string_len(20).not_null())
                        .col(
                            ColumnDef::new(KitchenStation::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(timestamp(KitchenStation::CreatedAt))
                        .col(timestamp(KitchenStation::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_kitchen_station_brand")
                                .from(KitchenStation::Table, KitchenStation::BrandId)
                                .to(Brand::Table, Brand::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name(BRAND_CODE_INDEX)
                        .table(KitchenStation::Table)
                        .col(KitchenStation::BrandId)
                        .col(KitchenStation::Code)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(KitchenStation::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000005_create_table_area_and_table {
    use super::*;

    pub const NAME: &str = "m20240101_000005_create_table_area_and_table";
    pub const DEPENDS_ON: &[&str] = &[super::m20240101_000003_create_store::NAME];

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            NAME
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(TableArea::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(TableArea::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(TableArea::BrandId).uuid().not_null())
                        .col(ColumnDef::new(TableArea::StoreId).uuid().not_null())
                        .col(ColumnDef::new(TableArea::Name).string_len(100).not_null())
                        .col(ColumnDef::new(TableArea::Description).text().null())
                        .col(
                            ColumnDef::new(TableArea::SortOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(TableArea::FloorWidth)
                                .integer()
                                .not_null()
                                .default(800),
                        )
                        .col(
                            ColumnDef::new(TableArea::FloorHeight)
                                .integer()
                                .not_null()
                                .default(600),
                        )
                        .col(
                            ColumnDef::new(TableArea::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(timestamp(TableArea::CreatedAt))
                        .col(timestamp(TableArea::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_table_area_store")
                                .from(TableArea::Table, TableArea::StoreId)
                                .to(Store::Table, Store::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_table_area_brand")
                                .from(TableArea::Table, TableArea::BrandId)
                                .to(Brand::Table, Brand::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_table_area_store_name")
                        .table(TableArea::Table)
                        .col(TableArea::StoreId)
                        .col(TableArea::Name)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DiningTable::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(DiningTable::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(DiningTable::AreaId).uuid().not_null())
                        .col(ColumnDef::new(DiningTable::Number).string_len(20).not_null())
                        .col(
                            ColumnDef::new(DiningTable::Capacity)
                                .integer()
                                .not_null()
                                .default(4),
                        )
                        .col(ColumnDef::new(DiningTable::QrCode).string_len(200).null())
                        .col(ColumnDef::new(DiningTable::PosX).integer().not_null().default(0))
                        .col(ColumnDef::new(DiningTable::PosY).integer().not_null().default(0))
                        .col(
                            ColumnDef::new(DiningTable::Status)
                                .string_len(16)
                                .not_null()
                                .default("available"),
                        )
                        .col(
                            ColumnDef::new(DiningTable::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(timestamp(DiningTable::CreatedAt))
                        .col(timestamp(DiningTable::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_table_area")
                                .from(DiningTable::Table, DiningTable::AreaId)
                                .to(TableArea::Table, TableArea::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_table_area_number")
                        .table(DiningTable::Table)
                        .col(DiningTable::AreaId)
                        .col(DiningTable::Number)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DiningTable::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(TableArea::Table).to_owned())
                .await
        }
    }
}

/// Kitchen stations become optionally store scoped: codes are unique per
/// (brand, store) instead of per brand.
mod m20240215_000006_kitchen_station_store_scope {
    use super::*;
    use sea_orm_migration::sea_orm::DatabaseBackend;

    pub const NAME: &str = "m20240215_000006_kitchen_station_store_scope";
    pub const DEPENDS_ON: &[&str] = &[
        super::m20240101_000003_create_store::NAME,
        super::m20240101_000004_create_kitchen_station::NAME,
    ];

    const BRAND_STORE_CODE_INDEX: &str = "idx_kitchen_station_brand_store_code";

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            NAME
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .alter_table(
                    Table::alter()
                        .table(KitchenStation::Table)
                        .add_column(ColumnDef::new(KitchenStation::StoreId).uuid().null())
                        .to_owned(),
                )
                .await?;
            manager
                .alter_table(
                    Table::alter()
                        .table(KitchenStation::Table)
                        .add_column(ColumnDef::new(KitchenStation::Description).text().null())
                        .to_owned(),
                )
                .await?;
            manager
                .alter_table(
                    Table::alter()
                        .table(KitchenStation::Table)
                        .add_column(
                            ColumnDef::new(KitchenStation::SortOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            // SQLite cannot add constraints to an existing table
            if manager.get_database_backend() == DatabaseBackend::Postgres {
                manager
                    .create_foreign_key(
                        ForeignKey::create()
                            .name("fk_kitchen_station_store")
                            .from(KitchenStation::Table, KitchenStation::StoreId)
                            .to(Store::Table, Store::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .to_owned(),
                    )
                    .await?;
            }

            manager
                .drop_index(
                    Index::drop()
                        .name(super::m20240101_000004_create_kitchen_station::BRAND_CODE_INDEX)
                        .table(KitchenStation::Table)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name(BRAND_STORE_CODE_INDEX)
                        .table(KitchenStation::Table)
                        .col(KitchenStation::BrandId)
                        .col(KitchenStation::StoreId)
                        .col(KitchenStation::Code)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_index(
                    Index::drop()
                        .name(BRAND_STORE_CODE_INDEX)
                        .table(KitchenStation::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(
                    Index::create()
                        .name(super::m20240101_000004_create_kitchen_station::BRAND_CODE_INDEX)
                        .table(KitchenStation::Table)
                        .col(KitchenStation::BrandId)
                        .col(KitchenStation::Code)
                        .unique()
                        .to_owned(),
                )
                .await
        }
    }
}

/// Table areas record their company directly; existing rows are backfilled
/// through store → brand.
mod m20240301_000007_table_area_company {
    use super::*;
    use sea_orm_migration::sea_orm::DatabaseBackend;

    pub const NAME: &str = "m20240301_000007_table_area_company";
    pub const DEPENDS_ON: &[&str] = &[super::m20240101_000005_create_table_area_and_table::NAME];

    const BACKFILL_SQL: &str = r#"UPDATE "table_area" SET "company_id" = (
        SELECT "brand"."company_id" FROM "store"
        INNER JOIN "brand" ON "brand"."id" = "store"."brand_id"
        WHERE "store"."id" = "table_area"."store_id"
    ) WHERE "company_id" IS NULL"#;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            NAME
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .alter_table(
                    Table::alter()
                        .table(TableArea::Table)
                        .add_column(ColumnDef::new(TableArea::CompanyId).uuid().null())
                        .to_owned(),
                )
                .await?;

            if manager.get_database_backend() == DatabaseBackend::Postgres {
                manager
                    .create_foreign_key(
                        ForeignKey::create()
                            .name("fk_table_area_company")
                            .from(TableArea::Table, TableArea::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .to_owned(),
                    )
                    .await?;
            }

            manager
                .get_connection()
                .execute_unprepared(BACKFILL_SQL)
                .await?;
            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .alter_table(
                    Table::alter()
                        .table(TableArea::Table)
                        .drop_column(TableArea::CompanyId)
                        .to_owned(),
                )
                .await
        }
    }
}

mod m20240310_000008_rename_table_to_tables {
    use super::*;

    pub const NAME: &str = "m20240310_000008_rename_table_to_tables";
    pub const DEPENDS_ON: &[&str] = &[super::m20240301_000007_table_area_company::NAME];

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            NAME
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .rename_table(
                    Table::rename()
                        .table(DiningTable::Table, DiningTable::Renamed)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .rename_table(
                    Table::rename()
                        .table(DiningTable::Renamed, DiningTable::Table)
                        .to_owned(),
                )
                .await
        }
    }
}

mod m20240401_000009_create_member_ledger {
    use super::*;

    pub const NAME: &str = "m20240401_000009_create_member_ledger";
    pub const DEPENDS_ON: &[&str] = &[super::m20240101_000001_create_company::NAME];

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            NAME
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Member::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Member::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Member::CompanyId).uuid().not_null())
                        .col(
                            ColumnDef::new(Member::MemberCode)
                                .string_len(20)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Member::FullName).string_len(200).not_null())
                        .col(ColumnDef::new(Member::Phone).string_len(20).null())
                        .col(
                            ColumnDef::new(Member::Tier)
                                .string_len(20)
                                .not_null()
                                .default("bronze"),
                        )
                        .col(ColumnDef::new(Member::Points).integer().not_null().default(0))
                        .col(money(Member::PointBalance))
                        .col(
                            ColumnDef::new(Member::TotalVisits)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(money(Member::TotalSpent))
                        .col(
                            ColumnDef::new(Member::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(timestamp(Member::CreatedAt))
                        .col(timestamp(Member::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_member_company")
                                .from(Member::Table, Member::CompanyId)
                                .to(Company::Table, Company::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MemberTransaction::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MemberTransaction::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(MemberTransaction::MemberId).uuid().not_null())
                        .col(ColumnDef::new(MemberTransaction::BillId).uuid().null())
                        .col(
                            ColumnDef::new(MemberTransaction::TransactionType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MemberTransaction::PointsChange)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MemberTransaction::PointsBefore)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MemberTransaction::PointsAfter)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MemberTransaction::IsExpired)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(MemberTransaction::ExpiredAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(MemberTransaction::Reference).string_len(100).null())
                        .col(ColumnDef::new(MemberTransaction::Notes).text().null())
                        .col(timestamp(MemberTransaction::CreatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_member_transaction_member")
                                .from(MemberTransaction::Table, MemberTransaction::MemberId)
                                .to(Member::Table, Member::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_member_transaction_member_type")
                        .table(MemberTransaction::Table)
                        .col(MemberTransaction::MemberId)
                        .col(MemberTransaction::TransactionType)
                        .col(MemberTransaction::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MemberTransaction::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Member::Table).to_owned())
                .await
        }
    }
}

mod m20240401_000010_create_bill_tables {
    use super::*;

    pub const NAME: &str = "m20240401_000010_create_bill_tables";
    pub const DEPENDS_ON: &[&str] = &[super::m20240101_000003_create_store::NAME];

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            NAME
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Bill::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Bill::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Bill::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(Bill::BrandId).uuid().not_null())
                        .col(ColumnDef::new(Bill::StoreId).uuid().not_null())
                        .col(ColumnDef::new(Bill::TerminalCode).string_len(20).null())
                        .col(
                            ColumnDef::new(Bill::BillNumber)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Bill::Status).string_len(16).not_null())
                        .col(ColumnDef::new(Bill::MemberId).uuid().null())
                        .col(ColumnDef::new(Bill::MemberCode).string_len(20).null())
                        .col(money(Bill::Subtotal))
                        .col(money(Bill::TaxAmount))
                        .col(money(Bill::ServiceCharge))
                        .col(money(Bill::DiscountAmount))
                        .col(money(Bill::Total))
                        .col(ColumnDef::new(Bill::CreatedBy).uuid().null())
                        .col(timestamp(Bill::CreatedAt))
                        .col(
                            ColumnDef::new(Bill::SyncedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bill_store")
                                .from(Bill::Table, Bill::StoreId)
                                .to(Store::Table, Store::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_bill_status_created")
                        .table(Bill::Table)
                        .col(Bill::Status)
                        .col(Bill::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BillItem::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(BillItem::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(BillItem::BillId).uuid().not_null())
                        .col(ColumnDef::new(BillItem::ProductId).uuid().not_null())
                        .col(ColumnDef::new(BillItem::ProductSku).string_len(50).not_null())
                        .col(ColumnDef::new(BillItem::ProductName).string_len(200).not_null())
                        .col(ColumnDef::new(BillItem::CategoryId).uuid().null())
                        .col(
                            ColumnDef::new(BillItem::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(money(BillItem::UnitPrice))
                        .col(money(BillItem::UnitCost))
                        .col(money(BillItem::DiscountAmount))
                        .col(money(BillItem::Total))
                        .col(
                            ColumnDef::new(BillItem::IsVoid)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(timestamp(BillItem::CreatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bill_item_bill")
                                .from(BillItem::Table, BillItem::BillId)
                                .to(Bill::Table, Bill::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Payment::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payment::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Payment::BillId).uuid().not_null())
                        .col(ColumnDef::new(Payment::PaymentMethod).string_len(20).not_null())
                        .col(money(Payment::Amount))
                        .col(ColumnDef::new(Payment::Status).string_len(16).not_null())
                        .col(timestamp(Payment::CreatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payment_bill")
                                .from(Payment::Table, Payment::BillId)
                                .to(Bill::Table, Bill::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BillPromotion::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BillPromotion::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(BillPromotion::BillId).uuid().not_null())
                        .col(ColumnDef::new(BillPromotion::PromotionId).uuid().not_null())
                        .col(
                            ColumnDef::new(BillPromotion::PromotionName)
                                .string_len(200)
                                .not_null(),
                        )
                        .col(ColumnDef::new(BillPromotion::PromotionCode).string_len(50).null())
                        .col(money(BillPromotion::DiscountAmount))
                        .col(money(BillPromotion::CashbackAmount))
                        .col(timestamp(BillPromotion::AppliedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bill_promotion_bill")
                                .from(BillPromotion::Table, BillPromotion::BillId)
                                .to(Bill::Table, Bill::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                BillPromotion::Table.into_iden(),
                Payment::Table.into_iden(),
                BillItem::Table.into_iden(),
                Bill::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }
}

mod m20240401_000011_create_promotion_log {
    use super::*;

    pub const NAME: &str = "m20240401_000011_create_promotion_log";
    pub const DEPENDS_ON: &[&str] = &[super::m20240401_000010_create_bill_tables::NAME];

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            NAME
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PromotionLog::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PromotionLog::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(PromotionLog::BillId).uuid().null())
                        .col(ColumnDef::new(PromotionLog::PromotionId).uuid().null())
                        .col(ColumnDef::new(PromotionLog::Status).string_len(20).not_null())
                        .col(ColumnDef::new(PromotionLog::Reason).text().null())
                        .col(money(PromotionLog::DiscountAmount))
                        .col(timestamp(PromotionLog::CreatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_promotion_log_created")
                        .table(PromotionLog::Table)
                        .col(PromotionLog::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PromotionLog::Table).to_owned())
                .await
        }
    }
}

mod m20240501_000012_create_report_snapshot_and_job_run {
    use super::*;

    pub const NAME: &str = "m20240501_000012_create_report_snapshot_and_job_run";
    pub const DEPENDS_ON: &[&str] = &[super::m20240401_000010_create_bill_tables::NAME];

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            NAME
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ReportSnapshot::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReportSnapshot::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ReportSnapshot::ReportKind)
                                .string_len(40)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReportSnapshot::ReportDate).date().not_null())
                        .col(ColumnDef::new(ReportSnapshot::Payload).json().not_null())
                        .col(timestamp(ReportSnapshot::GeneratedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_report_snapshot_kind_date")
                        .table(ReportSnapshot::Table)
                        .col(ReportSnapshot::ReportKind)
                        .col(ReportSnapshot::ReportDate)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(JobRun::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(JobRun::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(JobRun::JobName).string_len(100).not_null())
                        .col(ColumnDef::new(JobRun::Task).string_len(100).not_null())
                        .col(timestamp(JobRun::ScheduledFor))
                        .col(timestamp(JobRun::StartedAt))
                        .col(
                            ColumnDef::new(JobRun::FinishedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(JobRun::Status).string_len(16).not_null())
                        .col(ColumnDef::new(JobRun::Detail).text().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_job_run_started")
                        .table(JobRun::Table)
                        .col(JobRun::StartedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(JobRun::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ReportSnapshot::Table).to_owned())
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn history_matches_registered_migrations() {
        let registered: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        let recorded: Vec<String> = Migrator::history()
            .iter()
            .map(|r| r.name.to_string())
            .collect();
        assert_eq!(registered, recorded);
    }

    #[test]
    fn every_dependency_precedes_its_dependant() {
        let mut seen = HashSet::new();
        for record in Migrator::history() {
            for dep in record.depends_on {
                assert!(
                    seen.contains(dep),
                    "{} depends on {} which is not applied before it",
                    record.name,
                    dep
                );
            }
            assert!(seen.insert(record.name), "duplicate step {}", record.name);
        }
    }

    #[test]
    fn names_sort_in_application_order() {
        let names: Vec<&str> = Migrator::history().iter().map(|r| r.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }
}
