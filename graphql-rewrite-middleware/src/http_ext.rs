//! HTTP request types seen by the middleware.
use bytes::Bytes;
use http::Uri;

use crate::json_ext::Object;
use crate::json_ext::Value;

/// An HTTP request as handled by the middleware and the query engine behind it.
pub type Request = http::Request<RequestBody>;

/// The body of an incoming request.
///
/// Hosting pipelines may decode the body before the middleware runs (a JSON body parser placed
/// earlier in the stack, for instance), in which case it arrives as [`RequestBody::Json`].
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    /// Raw, undecoded bytes.
    Raw(Bytes),

    /// An already decoded JSON value.
    Json(Value),
}

impl Default for RequestBody {
    fn default() -> Self {
        RequestBody::Raw(Bytes::new())
    }
}

impl RequestBody {
    /// The decoded JSON object, when the body is one.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            RequestBody::Json(Value::Object(object)) => Some(object),
            _ => None,
        }
    }

    /// Installs a rewritten GraphQL body.
    ///
    /// A structured object body is kept and shallow-merged with `replacement`, whose fields win
    /// on collision. Any other body is replaced wholesale.
    pub fn merge(&mut self, replacement: Object) {
        match self {
            RequestBody::Json(Value::Object(object)) => object.extend(replacement),
            _ => *self = RequestBody::Json(Value::Object(replacement)),
        }
    }
}

/// `uri` without its GraphQL parameters, once they have been moved to the body.
///
/// Other parameters are kept as sent. Returns `None` when there is nothing to remove.
pub(crate) fn strip_graphql_params(uri: &Uri) -> Option<Uri> {
    let query = uri.query()?;
    let pairs: Vec<&str> = query.split('&').collect();
    let kept: Vec<&str> = pairs
        .iter()
        .copied()
        .filter(|pair| !is_graphql_param(pair))
        .collect();
    if kept.len() == pairs.len() {
        return None;
    }

    let path_and_query = if kept.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), kept.join("&"))
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse().ok()?);
    Uri::from_parts(parts).ok()
}

fn is_graphql_param(pair: &str) -> bool {
    serde_urlencoded::from_str::<Vec<(String, String)>>(pair)
        .ok()
        .and_then(|params| params.into_iter().next())
        .is_some_and(|(key, _)| matches!(key.as_str(), "query" | "variables" | "operationName"))
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Raw(bytes)
    }
}

impl From<&'static str> for RequestBody {
    fn from(text: &'static str) -> Self {
        RequestBody::Raw(Bytes::from_static(text.as_bytes()))
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}
