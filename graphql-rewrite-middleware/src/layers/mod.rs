//! The two interception points around a query engine.
pub mod request_rewrite;
pub mod response_rewrite;
