//! Rewrite middleware errors.
use displaydoc::Display;
use thiserror::Error;

/// Errors raised while rewriting a query or a response.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RewriteError {
    /// couldn't parse GraphQL document: {0}
    Parse(String),

    /// invalid type reference '{0}'
    InvalidType(String),

    /// invalid GraphQL name '{0}'
    InvalidName(String),

    /// this handler has already rewritten a request
    AlreadyProcessed,

    /// rewriter '{rewriter}' cannot be applied: {reason}
    Incompatible {
        /// The rule that rejected its input.
        rewriter: String,

        /// Why the input was rejected.
        reason: String,
    },
}

/// Errors raised while extracting GraphQL parameters from an HTTP request.
#[derive(Error, Display, Debug)]
#[non_exhaustive]
pub enum ExtractionError {
    /// POST body sent invalid JSON: {0}
    InvalidJson(serde_json::Error),

    /// variables are invalid JSON: {0}
    InvalidVariables(serde_json::Error),

    /// couldn't decode url-encoded parameters: {0}
    UrlEncoded(serde_urlencoded::de::Error),

    /// request body is not valid UTF-8
    InvalidUtf8,
}

/// Errors surfaced by the request interceptor when parsing errors are not ignored.
#[derive(Error, Display, Debug)]
#[non_exhaustive]
pub enum InterceptError {
    /// couldn't extract GraphQL parameters: {0}
    Extraction(#[from] ExtractionError),

    /// couldn't rewrite GraphQL request: {0}
    Rewrite(#[from] RewriteError),
}

/// Errors raised by an [`crate::Emitter`].
#[derive(Error, Display, Debug)]
#[non_exhaustive]
pub enum EmitError {
    /// response headers have already been sent
    HeadersSent,

    /// couldn't serialize response body: {0}
    Serialization(#[from] serde_json::Error),
}
