//! Database entities.
//!
//! Tenant hierarchy: `company` → `brand` → `store`. Restaurant configuration
//! (`kitchen_station`, `table_area`, `tables`) hangs off brands and stores;
//! sales data synced from the POS (`bill` and its children) feeds the reports.

pub mod bill;
pub mod bill_item;
pub mod bill_promotion;
pub mod brand;
pub mod company;
pub mod job_run;
pub mod kitchen_station;
pub mod member;
pub mod member_transaction;
pub mod payment;
pub mod promotion_log;
pub mod report_snapshot;
pub mod store;
pub mod table_area;
pub mod tables;
