//! Extraction of GraphQL parameters from an HTTP request.
//!
//! Parameters may come from the URL query string (GET requests, or POST requests adding
//! parameters to the URL) and from the body. Query string parameters take precedence.
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use mediatype::MediaType;
use mediatype::names::APPLICATION;

use crate::error::ExtractionError;
use crate::http_ext;
use crate::http_ext::RequestBody;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::request;

/// Decodes the GraphQL parameters carried by an HTTP request.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ParamsExtractor: Send + Sync + 'static {
    /// Extract `{query, variables, operationName}` from `request`.
    ///
    /// Absent parameters are not an error: a request without any query yields a
    /// [`request::Request`] whose `query` is `None`.
    async fn extract(
        &self,
        request: &http_ext::Request,
    ) -> Result<request::Request, ExtractionError>;
}

/// The GraphQL over HTTP parameter extractor.
///
/// Body decoding follows the request's content type:
/// - `application/json`: a JSON object,
/// - `application/graphql`: the whole body is the query,
/// - `application/x-www-form-urlencoded`: form fields.
///
/// Any other content type contributes no parameter.
#[derive(Clone, Debug, Default)]
pub struct DefaultParamsExtractor;

#[async_trait::async_trait]
impl ParamsExtractor for DefaultParamsExtractor {
    async fn extract(
        &self,
        request: &http_ext::Request,
    ) -> Result<request::Request, ExtractionError> {
        let url_params = match request.uri().query() {
            Some(query_string) => {
                serde_urlencoded::from_str::<Object>(query_string)
                    .map_err(ExtractionError::UrlEncoded)?
            }
            None => Object::new(),
        };
        let body_params = body_params(request.headers(), request.body())?;

        let query = param(&url_params, &body_params, "query")
            .and_then(Value::as_str)
            .map(str::to_string);
        let operation_name = param(&url_params, &body_params, "operationName")
            .and_then(Value::as_str)
            .map(str::to_string);
        let variables = match param(&url_params, &body_params, "variables") {
            Some(Value::String(text)) => {
                match serde_json::from_str::<Value>(text)
                    .map_err(ExtractionError::InvalidVariables)?
                {
                    Value::Object(variables) => Some(variables),
                    _ => None,
                }
            }
            Some(Value::Object(variables)) => Some(variables.clone()),
            _ => None,
        };

        Ok(request::Request {
            query,
            operation_name,
            variables,
        })
    }
}

fn param<'a>(url_params: &'a Object, body_params: &'a Object, key: &str) -> Option<&'a Value> {
    url_params
        .get(key)
        .filter(|value| !value.is_null())
        .or_else(|| body_params.get(key))
}

#[derive(Debug, PartialEq)]
enum BodyKind {
    Json,
    GraphQL,
    UrlEncoded,
}

fn body_kind(headers: &HeaderMap) -> Option<BodyKind> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let media_type = MediaType::parse(content_type).ok()?;
    if media_type.ty != APPLICATION {
        return None;
    }
    if media_type.subty == "json" {
        Some(BodyKind::Json)
    } else if media_type.subty == "graphql" {
        Some(BodyKind::GraphQL)
    } else if media_type.subty == "x-www-form-urlencoded" {
        Some(BodyKind::UrlEncoded)
    } else {
        None
    }
}

fn body_params(headers: &HeaderMap, body: &RequestBody) -> Result<Object, ExtractionError> {
    let bytes = match body {
        RequestBody::Json(Value::Object(object)) => return Ok(object.clone()),
        RequestBody::Json(_) => return Ok(Object::new()),
        RequestBody::Raw(bytes) if bytes.is_empty() => return Ok(Object::new()),
        RequestBody::Raw(bytes) => bytes,
    };

    match body_kind(headers) {
        Some(BodyKind::Json) => {
            serde_json::from_slice::<Object>(bytes).map_err(ExtractionError::InvalidJson)
        }
        Some(BodyKind::GraphQL) => {
            let query = std::str::from_utf8(bytes).map_err(|_| ExtractionError::InvalidUtf8)?;
            let mut params = Object::new();
            params.insert("query".to_string(), Value::from(query));
            Ok(params)
        }
        Some(BodyKind::UrlEncoded) => {
            serde_urlencoded::from_bytes::<Object>(bytes).map_err(ExtractionError::UrlEncoded)
        }
        None => Ok(Object::new()),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::Method;
    use serde_json::json;

    use super::*;

    fn request(
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: RequestBody,
    ) -> http_ext::Request {
        let mut builder = http::Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        builder.body(body).unwrap()
    }

    #[tokio::test]
    async fn it_reads_json_bodies() {
        let req = request(
            Method::POST,
            "http://example.com/graphql",
            Some("application/json; charset=utf-8"),
            RequestBody::from(
                r#"{"query": "query Q { a }", "operationName": "Q", "variables": {"id": "7"}}"#,
            ),
        );
        let params = DefaultParamsExtractor.extract(&req).await.unwrap();
        assert_eq!(
            params,
            request::Request::builder()
                .query("query Q { a }")
                .operation_name("Q")
                .variables(json!({"id": "7"}).as_object().cloned().unwrap())
                .build()
        );
    }

    #[tokio::test]
    async fn it_reads_already_decoded_bodies() {
        let req = request(
            Method::POST,
            "http://example.com/graphql",
            None,
            RequestBody::Json(json!({"query": "{ a }"})),
        );
        let params = DefaultParamsExtractor.extract(&req).await.unwrap();
        assert_eq!(params.query.as_deref(), Some("{ a }"));
        assert_eq!(params.variables, None);
    }

    #[tokio::test]
    async fn it_reads_graphql_bodies() {
        let req = request(
            Method::POST,
            "http://example.com/graphql",
            Some("application/graphql"),
            RequestBody::from("{ a }"),
        );
        let params = DefaultParamsExtractor.extract(&req).await.unwrap();
        assert_eq!(params.query.as_deref(), Some("{ a }"));
    }

    #[tokio::test]
    async fn it_reads_url_encoded_bodies() {
        let req = request(
            Method::POST,
            "http://example.com/graphql",
            Some("application/x-www-form-urlencoded"),
            RequestBody::from("query=%7B+a+%7D&variables=%7B%22id%22%3A%227%22%7D"),
        );
        let params = DefaultParamsExtractor.extract(&req).await.unwrap();
        assert_eq!(params.query.as_deref(), Some("{ a }"));
        assert_eq!(params.variables, json!({"id": "7"}).as_object().cloned());
    }

    #[tokio::test]
    async fn query_string_parameters_win() {
        let req = request(
            Method::POST,
            "http://example.com/graphql?query=%7B+b+%7D&operationName=B",
            Some("application/json"),
            RequestBody::from(r#"{"query": "{ a }", "operationName": "A"}"#),
        );
        let params = DefaultParamsExtractor.extract(&req).await.unwrap();
        assert_eq!(params.query.as_deref(), Some("{ b }"));
        assert_eq!(params.operation_name.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn it_reads_get_requests() {
        let req = request(
            Method::GET,
            "http://example.com/graphql?query=%7B+a+%7D&variables=%7B%22id%22%3A%227%22%7D",
            None,
            RequestBody::Raw(Bytes::new()),
        );
        let params = DefaultParamsExtractor.extract(&req).await.unwrap();
        assert_eq!(params.query.as_deref(), Some("{ a }"));
        assert_eq!(params.variables, json!({"id": "7"}).as_object().cloned());
    }

    #[tokio::test]
    async fn missing_parameters_are_not_an_error() {
        let req = request(
            Method::POST,
            "http://example.com/graphql",
            None,
            RequestBody::default(),
        );
        let params = DefaultParamsExtractor.extract(&req).await.unwrap();
        assert_eq!(params, request::Request::default());

        let req = request(
            Method::POST,
            "http://example.com/graphql",
            Some("text/plain"),
            RequestBody::from("{ a }"),
        );
        let params = DefaultParamsExtractor.extract(&req).await.unwrap();
        assert_eq!(params.query, None);
    }

    #[tokio::test]
    async fn non_string_queries_are_ignored() {
        let req = request(
            Method::POST,
            "http://example.com/graphql",
            None,
            RequestBody::Json(json!({"query": 42, "variables": 7})),
        );
        let params = DefaultParamsExtractor.extract(&req).await.unwrap();
        assert_eq!(params, request::Request::default());
    }

    #[tokio::test]
    async fn it_rejects_invalid_json() {
        let req = request(
            Method::POST,
            "http://example.com/graphql",
            Some("application/json"),
            RequestBody::from("{ not json"),
        );
        let error = DefaultParamsExtractor.extract(&req).await.unwrap_err();
        assert!(matches!(error, ExtractionError::InvalidJson(_)));
    }

    #[tokio::test]
    async fn it_rejects_invalid_variables() {
        let req = request(
            Method::GET,
            "http://example.com/graphql?query=%7B+a+%7D&variables=%7Bnope",
            None,
            RequestBody::default(),
        );
        let error = DefaultParamsExtractor.extract(&req).await.unwrap_err();
        assert!(matches!(error, ExtractionError::InvalidVariables(_)));
    }
}
