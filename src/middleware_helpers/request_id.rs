use crate::tracing::{scope_request_id, RequestId};
use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlates a request with its logs and response.
///
/// A non-blank `x-request-id` sent by the caller (POS terminals send their
/// own) is kept, otherwise a fresh one is generated. The id lands in the
/// request extensions for the trace span, in the task-local read by the
/// response envelopes, and back on the response header.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(RequestId::new)
        .unwrap_or_default();
    let header = HeaderValue::from_str(request_id.as_str()).ok();

    request.extensions_mut().insert(request_id.clone());
    let mut response = scope_request_id(request_id, next.run(request)).await;

    if let Some(value) = header {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ServiceError;
    use axum::{
        body::{to_bytes, Body},
        extract::Extension,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/echo",
                get(|Extension(id): Extension<RequestId>| async move { id.0 }),
            )
            .route(
                "/missing",
                get(|| async { Err::<(), _>(ServiceError::NotFound("Store x not found".into())) }),
            )
            .layer(axum::middleware::from_fn(request_id_middleware))
    }

    fn get_request(uri: &str, id: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(id) = id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn generated_id_matches_header_and_extension() {
        let response = app().oneshot(get_request("/echo", None)).await.unwrap();
        let header = response.headers()[REQUEST_ID_HEADER]
            .to_str()
            .unwrap()
            .to_string();

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(String::from_utf8(body.to_vec()).unwrap(), header);
    }

    #[tokio::test]
    async fn terminal_id_is_kept_and_reported_in_errors() {
        let response = app()
            .oneshot(get_request("/missing", Some("pos-42")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "pos-42");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let envelope: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(envelope["request_id"], "pos-42");
        assert_eq!(envelope["code"], "not_found");
    }

    #[tokio::test]
    async fn blank_id_is_replaced() {
        let response = app()
            .oneshot(get_request("/echo", Some("  ")))
            .await
            .unwrap();
        assert_ne!(response.headers()[REQUEST_ID_HEADER], "  ");
    }
}
