//! Rewrites incoming GraphQL requests.
//!
//! The interceptor extracts the GraphQL parameters of the request, rewrites the query and
//! variables with a fresh [`RewriteHandler`], installs the result as the request body and keeps
//! the handler in the cycle's [`RewriteContext`] for the response interceptor.
//!
//! Requests without a query go through untouched. Requests that cannot be extracted or rewritten
//! go through untouched too, unless the interceptor was told not to ignore parsing errors.
use std::fmt;
use std::sync::Arc;

use tracing::Instrument;

use crate::context::RewriteContext;
use crate::context::RewriteSession;
use crate::error::InterceptError;
use crate::http_ext;
use crate::params::DefaultParamsExtractor;
use crate::params::ParamsExtractor;
use crate::request;
use crate::rewrite::RewriteHandler;
use crate::rewrite::RewriteRuleSet;

/// Rewrites GraphQL requests to the current schema shape.
#[derive(Clone)]
pub struct RequestInterceptor {
    rewriters: RewriteRuleSet,
    ignore_parsing_errors: bool,
    extractor: Arc<dyn ParamsExtractor>,
}

impl fmt::Debug for RequestInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestInterceptor")
            .field("rewriters", &self.rewriters)
            .field("ignore_parsing_errors", &self.ignore_parsing_errors)
            .finish_non_exhaustive()
    }
}

impl RequestInterceptor {
    pub fn new(rewriters: RewriteRuleSet, ignore_parsing_errors: bool) -> Self {
        Self::with_extractor(
            rewriters,
            ignore_parsing_errors,
            Arc::new(DefaultParamsExtractor),
        )
    }

    pub fn with_extractor(
        rewriters: RewriteRuleSet,
        ignore_parsing_errors: bool,
        extractor: Arc<dyn ParamsExtractor>,
    ) -> Self {
        Self {
            rewriters,
            ignore_parsing_errors,
            extractor,
        }
    }

    pub fn ignore_parsing_errors(&self) -> bool {
        self.ignore_parsing_errors
    }

    /// Rewrites `request` in place, recording the session in `context`.
    ///
    /// Errors are only returned when parsing errors are not ignored; the request must then not
    /// be handed to the query engine.
    pub async fn intercept(
        &self,
        request: &mut http_ext::Request,
        context: &mut RewriteContext,
    ) -> Result<(), InterceptError> {
        let span = tracing::debug_span!(
            "graphql_rewrite.request",
            method = %request.method(),
            uri = %request.uri(),
        );
        match self.rewrite(request).instrument(span).await {
            Ok(session) => {
                context.session = session;
                Ok(())
            }
            Err(error) if self.ignore_parsing_errors => {
                tracing::warn!(%error, "GraphQL request forwarded without rewriting");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    async fn rewrite(
        &self,
        request: &mut http_ext::Request,
    ) -> Result<Option<RewriteSession>, InterceptError> {
        let params = self.extractor.extract(request).await?;
        let Some(query) = params.non_empty_query() else {
            tracing::debug!("no GraphQL query in request, nothing to rewrite");
            return Ok(None);
        };

        let mut handler = RewriteHandler::new(self.rewriters.clone());
        let rewritten = handler.rewrite_request(query, params.variables.clone())?;
        tracing::debug!(rewritten = handler.has_matches(), "GraphQL request intercepted");

        let body = request::Request {
            query: Some(rewritten.query),
            operation_name: params.operation_name,
            variables: rewritten.variables,
        }
        .to_body();
        request.body_mut().merge(body);
        if let Some(uri) = http_ext::strip_graphql_params(request.uri()) {
            *request.uri_mut() = uri;
        }

        Ok(Some(RewriteSession::new(handler)))
    }
}
