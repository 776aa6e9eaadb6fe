// Catalog
pub mod brands;
pub mod kitchen_stations;
pub mod stores;
pub mod table_areas;

// Loyalty
pub mod members;

// Analytics and Reporting
pub mod reports;

use crate::errors::ServiceError;
use uuid::Uuid;

/// Rejects a delete while any dependent rows still reference the parent.
pub(crate) fn ensure_no_dependents(
    entity: &str,
    id: Uuid,
    dependents: &[(&str, u64)],
) -> Result<(), ServiceError> {
    let blocking: Vec<String> = dependents
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(kind, count)| format!("{} {}", count, kind))
        .collect();

    if blocking.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::DeleteProtected(format!(
            "{} {} is still referenced by {}",
            entity,
            id,
            blocking.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn dependents_block_delete() {
        let id = Uuid::new_v4();
        assert!(ensure_no_dependents("Brand", id, &[("stores", 0)]).is_ok());
        assert_matches!(
            ensure_no_dependents("Brand", id, &[("stores", 2), ("bills", 0)]),
            Err(ServiceError::DeleteProtected(msg)) if msg.contains("2 stores") && !msg.contains("bills")
        );
    }
}
