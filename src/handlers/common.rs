use crate::errors::ServiceError;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    Json,
};
use uuid::Uuid;

/// Unwraps a JSON body, reporting malformed payloads as validation errors.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid request body: {}", e.body_text())))
}

pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ServiceError> {
    query
        .map(|Query(params)| params)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid query: {}", e.body_text())))
}

pub fn path_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ServiceError> {
    path.map(|Path(id)| id)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid id: {}", e.body_text())))
}

/// Empty strings count as absent.
pub fn optional_uuid(field: &str, value: Option<&str>) -> Result<Option<Uuid>, ServiceError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| ServiceError::ValidationError(format!("Invalid {} '{}'", field, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_uuid_accepts_blank_and_rejects_garbage() {
        assert_eq!(optional_uuid("brand_id", None).unwrap(), None);
        assert_eq!(optional_uuid("brand_id", Some("  ")).unwrap(), None);

        let id = Uuid::new_v4();
        assert_eq!(
            optional_uuid("brand_id", Some(&id.to_string())).unwrap(),
            Some(id)
        );
        assert!(matches!(
            optional_uuid("brand_id", Some("not-a-uuid")),
            Err(ServiceError::ValidationError(_))
        ));
    }
}
