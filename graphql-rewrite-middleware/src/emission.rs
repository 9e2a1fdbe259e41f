//! Response emission.
//!
//! A query engine writes its response through an [`Emitter`], either as a structured JSON value
//! or as raw bytes. The response interceptor is itself an [`Emitter`] wrapping the one the
//! response is finally written to.
use bytes::Bytes;
use http::HeaderMap;
use http::HeaderValue;
use http::StatusCode;
use http::header::CONTENT_LENGTH;
use http::header::CONTENT_TYPE;

use crate::error::EmitError;
use crate::json_ext::Value;

/// The capabilities a query engine needs to emit its response.
pub trait Emitter: Send {
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Whether the response head has already been written.
    fn headers_sent(&self) -> bool;

    /// Emit a structured JSON body.
    fn json(&mut self, body: Value) -> Result<(), EmitError>;

    /// Emit a raw body.
    fn send(&mut self, body: Bytes) -> Result<(), EmitError>;
}

/// An [`Emitter`] buffering the response in memory.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// The emitted body, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn into_response(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(self.body.unwrap_or_default());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Emitter for ResponseWriter {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn headers_sent(&self) -> bool {
        self.body.is_some()
    }

    fn json(&mut self, body: Value) -> Result<(), EmitError> {
        let bytes = serde_json::to_vec(&body)?;
        self.headers
            .entry(CONTENT_TYPE)
            .or_insert_with(|| HeaderValue::from_static("application/json"));
        self.send(bytes.into())
    }

    fn send(&mut self, body: Bytes) -> Result<(), EmitError> {
        if self.headers_sent() {
            return Err(EmitError::HeadersSent);
        }
        self.headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        self.body = Some(body);
        Ok(())
    }
}
