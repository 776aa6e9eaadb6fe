mod common;

use chrono::Utc;
use common::TestApp;
use fnb_backoffice::{
    db::{self, DbConfig, DbPool},
    migrator::Migrator,
    models::{brand, company, store, table_area, tables},
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement, Value};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

async fn bare_database() -> DbPool {
    db::establish_connection_with_config(&DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..DbConfig::default()
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn rerunning_the_log_is_a_no_op() {
    let app = TestApp::new().await;

    db::run_migrations(app.db()).await.unwrap();

    let applied: Vec<String> = Migrator::get_applied_migrations(app.db())
        .await
        .unwrap()
        .iter()
        .map(|m| m.name().to_string())
        .collect();
    let history: Vec<String> = Migrator::history()
        .iter()
        .map(|r| r.name.to_string())
        .collect();
    assert_eq!(applied, history);
    assert!(Migrator::get_pending_migrations(app.db())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn renamed_tables_table_is_queryable() {
    let app = TestApp::new().await;
    assert!(tables::Entity::find().all(app.db()).await.unwrap().is_empty());

    let backend = app.db().get_database_backend();
    let row = app
        .db()
        .query_one(Statement::from_string(
            backend,
            "SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name = 'table'",
        ))
        .await
        .unwrap()
        .unwrap();
    let n: i64 = row.try_get("", "n").unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn later_steps_carry_existing_rows_forward() {
    let db = bare_database().await;
    // Up to and including the original table_area / table schema
    Migrator::up(&db, Some(5)).await.unwrap();

    let now = Utc::now();
    let company = company::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set("ACME".to_string()),
        name: Set("Acme".to_string()),
        timezone: Set("Asia/Jakarta".to_string()),
        point_expiry_months: Set(12),
        points_per_currency: Set(Decimal::ONE),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .unwrap();
    let brand = brand::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(company.id),
        code: Set("KOPI".to_string()),
        name: Set("Kopi".to_string()),
        tax_rate: Set(Decimal::ZERO),
        service_charge: Set(Decimal::ZERO),
        point_expiry_months_override: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .unwrap();
    let store = store::ActiveModel {
        id: Set(Uuid::new_v4()),
        brand_id: Set(brand.id),
        store_code: Set("KOPI-01".to_string()),
        store_name: Set("Kopi 01".to_string()),
        address: Set(None),
        phone: Set(None),
        timezone: Set("Asia/Jakarta".to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .unwrap();

    let backend = db.get_database_backend();
    let (area_id, table_id) = (Uuid::new_v4(), Uuid::new_v4());
    db.execute(Statement::from_sql_and_values(
        backend,
        r#"INSERT INTO "table_area" ("id", "brand_id", "store_id", "name", "created_at", "updated_at") VALUES (?, ?, ?, ?, ?, ?)"#,
        [
            Value::from(area_id),
            Value::from(brand.id),
            Value::from(store.id),
            Value::from("Indoor"),
            Value::from(now),
            Value::from(now),
        ],
    ))
    .await
    .unwrap();
    db.execute(Statement::from_sql_and_values(
        backend,
        r#"INSERT INTO "table" ("id", "area_id", "number", "created_at", "updated_at") VALUES (?, ?, ?, ?, ?)"#,
        [
            Value::from(table_id),
            Value::from(area_id),
            Value::from("A1"),
            Value::from(now),
            Value::from(now),
        ],
    ))
    .await
    .unwrap();

    Migrator::up(&db, None).await.unwrap();

    let area = table_area::Entity::find_by_id(area_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(area.company_id, Some(company.id));

    let table = tables::Entity::find_by_id(table_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(table.number, "A1");
    assert_eq!(table.area_id, area_id);
    assert_eq!(table.capacity, 4);
}
