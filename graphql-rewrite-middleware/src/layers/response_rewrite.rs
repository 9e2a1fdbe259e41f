//! Rewrites outgoing GraphQL responses.
//!
//! A query engine may emit its response as a structured value or as already serialized bytes,
//! and emitting a structured value may itself end in a raw emission. The [`ResponseInterceptor`]
//! hooks both paths and rewrites the response `data` on the first of them only, as recorded by
//! the cycle's [`EmissionGuard`](crate::context::EmissionGuard).
//!
//! Anything that is not a rewritable GraphQL response (no session, non JSON content, no `data`,
//! undecodable bytes) is forwarded unchanged.
use bytes::Bytes;
use http::HeaderMap;
use http::HeaderValue;
use http::header::CONTENT_LENGTH;
use http::header::CONTENT_TYPE;
use mediatype::MediaType;
use mediatype::names::APPLICATION;
use mediatype::names::JSON;

use crate::context::RewriteContext;
use crate::context::RewriteSession;
use crate::emission::Emitter;
use crate::error::EmitError;
use crate::json_ext::Value;

/// An [`Emitter`] rewriting the response of a rewritten request before passing it on.
pub struct ResponseInterceptor<'a> {
    inner: &'a mut dyn Emitter,
    context: &'a mut RewriteContext,
}

impl<'a> ResponseInterceptor<'a> {
    pub fn new(inner: &'a mut dyn Emitter, context: &'a mut RewriteContext) -> Self {
        Self { inner, context }
    }

    /// The session to rewrite this emission with, claiming the guard.
    fn claim(&mut self) -> Option<&RewriteSession> {
        let session = self.context.session.as_ref()?;
        if self.context.guard.try_claim() {
            Some(session)
        } else {
            tracing::debug!("response already rewritten, forwarding emission unchanged");
            None
        }
    }
}

/// Replaces the `data` member of a GraphQL response object, leaving everything else alone.
///
/// Returns `None` when there is nothing to rewrite, or when the rewrite failed.
fn rewrite_data(session: &RewriteSession, body: &Value) -> Option<Value> {
    let object = body.as_object()?;
    let data = object.get("data").filter(|data| !data.is_null())?;
    match session.rewrite_response(data.clone()) {
        Ok(data) => {
            let mut object = object.clone();
            object.insert("data".to_string(), data);
            Some(Value::Object(object))
        }
        Err(error) => {
            tracing::warn!(%error, "couldn't rewrite GraphQL response, forwarding it unchanged");
            None
        }
    }
}

pub(crate) fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| MediaType::parse(value).ok())
        .is_some_and(|media_type| {
            media_type.ty == APPLICATION
                && (media_type.subty == JSON || media_type.suffix == Some(JSON))
        })
}

/// Serializes the way the raw emission path writes bodies: two spaces indentation.
fn to_pretty_bytes(body: &Value) -> Result<Bytes, serde_json::Error> {
    serde_json::to_vec_pretty(body).map(Bytes::from)
}

impl Emitter for ResponseInterceptor<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn headers_sent(&self) -> bool {
        self.inner.headers_sent()
    }

    fn json(&mut self, body: Value) -> Result<(), EmitError> {
        let rewritten = self.claim().and_then(|session| rewrite_data(session, &body));
        self.inner.json(rewritten.unwrap_or(body))
    }

    fn send(&mut self, body: Bytes) -> Result<(), EmitError> {
        if self.inner.headers_sent() {
            return self.inner.send(body);
        }
        let json = is_json_content_type(self.inner.headers());
        let Some(session) = self.claim().filter(|_| json) else {
            return self.inner.send(body);
        };

        let decoded = match serde_json::from_slice::<Value>(&body) {
            Ok(decoded) => decoded,
            Err(error) => {
                tracing::debug!(%error, "response body is not JSON, forwarding it unchanged");
                return self.inner.send(body);
            }
        };
        let Some(rewritten) = rewrite_data(session, &decoded) else {
            return self.inner.send(body);
        };

        let bytes = to_pretty_bytes(&rewritten)?;
        self.inner
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
        self.inner.send(bytes)
    }
}
