//! Exposes a [`RewriteService`] over HTTP with axum.
use axum::Extension;
use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use http::StatusCode;
use http_body_util::BodyExt;
use http_body_util::LengthLimitError;
use http_body_util::Limited;
use serde_json::json;
use tower::ServiceExt;

use crate::http_ext::RequestBody;
use crate::services::QueryEngine;
use crate::services::RewriteService;

/// The default request body size limit, in bytes.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 2_000_000;

/// A router serving GraphQL GET and POST requests on `path`.
///
/// Request bodies larger than [`DEFAULT_MAX_REQUEST_BYTES`] are rejected with
/// `413 Payload Too Large`.
pub fn router<E>(path: &str, service: RewriteService<E>) -> Router
where
    E: QueryEngine,
{
    router_with_body_limit(path, service, DEFAULT_MAX_REQUEST_BYTES)
}

/// Same as [`router`], with a custom request body size limit.
pub fn router_with_body_limit<E>(
    path: &str,
    service: RewriteService<E>,
    max_request_bytes: usize,
) -> Router
where
    E: QueryEngine,
{
    Router::new()
        .route(
            path,
            get({
                move |Extension(service): Extension<RewriteService<E>>, request: Request| {
                    handle(service, request, max_request_bytes)
                }
            })
            .post({
                move |Extension(service): Extension<RewriteService<E>>, request: Request| {
                    handle(service, request, max_request_bytes)
                }
            }),
        )
        .layer(Extension(service))
}

async fn handle<E>(
    service: RewriteService<E>,
    request: Request,
    max_request_bytes: usize,
) -> Response
where
    E: QueryEngine,
{
    let (parts, body) = request.into_parts();
    let bytes = match Limited::new(body, max_request_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(error) if error.is::<LengthLimitError>() => {
            tracing::debug!(max_request_bytes, "request body payload too large");
            return error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body payload too large".to_string(),
            );
        }
        Err(error) => {
            tracing::debug!(%error, "couldn't read request body");
            return error_response(StatusCode::BAD_REQUEST, error.to_string());
        }
    };

    let request = http::Request::from_parts(parts, RequestBody::Raw(bytes));
    match service.oneshot(request).await {
        Ok(response) => response.map(Body::from),
        Err(error) => {
            tracing::error!(%error, "GraphQL request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({"errors": [{"message": message}]}))).into_response()
}
