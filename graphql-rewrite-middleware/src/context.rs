//! Per-request state shared by the request and response interceptors.
//!
//! A [`RewriteContext`] lives for exactly one request/response cycle. The request interceptor
//! stores a [`RewriteSession`] in it when the query was rewritten; the response interceptor
//! uses that session, at most once, to rewrite the response back.
use crate::error::RewriteError;
use crate::json_ext::Value;
use crate::rewrite::RewriteHandler;

/// Correlates a rewritten request with its response.
#[derive(Debug)]
pub struct RewriteSession {
    handler: RewriteHandler,
}

impl RewriteSession {
    pub(crate) fn new(handler: RewriteHandler) -> Self {
        Self { handler }
    }

    /// Rewrites a response's `data` back into the shape the client asked for.
    pub fn rewrite_response(&self, data: Value) -> Result<Value, RewriteError> {
        self.handler.rewrite_response(data)
    }
}

/// Marks a response as already rewritten.
///
/// Both emission paths of a response share one guard, so that a structured emission which is
/// then written out as raw bytes is only rewritten once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmissionGuard {
    rewritten: bool,
}

impl EmissionGuard {
    /// Claims the right to rewrite the response; only the first call succeeds.
    pub fn try_claim(&mut self) -> bool {
        !std::mem::replace(&mut self.rewritten, true)
    }

    pub fn is_claimed(&self) -> bool {
        self.rewritten
    }
}

/// State of one request/response cycle.
#[derive(Debug, Default)]
pub struct RewriteContext {
    pub(crate) session: Option<RewriteSession>,
    pub(crate) guard: EmissionGuard,
}

impl RewriteContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session installed by the request interceptor, if the request was rewritten.
    pub fn session(&self) -> Option<&RewriteSession> {
        self.session.as_ref()
    }

    pub fn guard(&self) -> EmissionGuard {
        self.guard
    }
}
