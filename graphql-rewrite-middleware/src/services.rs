//! Tower composition of the rewrite cycle around a query engine.
use std::fmt;
use std::sync::Arc;
use std::task::Poll;

use bytes::Bytes;
use futures::future::BoxFuture;
use tower::BoxError;
use tower::Layer;
use tower::Service;
use typed_builder::TypedBuilder;

use crate::configuration::Configuration;
use crate::context::RewriteContext;
use crate::emission::Emitter;
use crate::emission::ResponseWriter;
use crate::error::RewriteError;
use crate::http_ext;
use crate::layers::request_rewrite::RequestInterceptor;
use crate::layers::response_rewrite::ResponseInterceptor;
use crate::params::DefaultParamsExtractor;
use crate::params::ParamsExtractor;
use crate::rewrite::RewriteRuleSet;
use crate::rewrite::Rewriter;

/// Executes GraphQL requests.
///
/// The engine reads the GraphQL parameters from the request, rewritten ones included, and
/// emits its response through `response`.
#[async_trait::async_trait]
pub trait QueryEngine: Send + Sync + 'static {
    async fn execute(
        &self,
        request: http_ext::Request,
        response: &mut dyn Emitter,
    ) -> Result<(), BoxError>;
}

/// Wraps a [`QueryEngine`] into a [`RewriteService`].
#[derive(Clone, TypedBuilder)]
pub struct RewriteLayer {
    /// The rules to apply, in order.
    #[builder(setter(transform = |rewriters: Vec<Arc<dyn Rewriter>>| rewriters.into()))]
    rewriters: RewriteRuleSet,

    /// Whether requests that can't be parsed are forwarded untouched rather than failed.
    #[builder(default = true)]
    ignore_parsing_errors: bool,

    /// How GraphQL parameters are read from requests, [`DefaultParamsExtractor`] if unset.
    #[builder(default, setter(strip_option))]
    extractor: Option<Arc<dyn ParamsExtractor>>,
}

impl fmt::Debug for RewriteLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteLayer")
            .field("rewriters", &self.rewriters)
            .field("ignore_parsing_errors", &self.ignore_parsing_errors)
            .finish_non_exhaustive()
    }
}

impl RewriteLayer {
    pub fn from_configuration(configuration: &Configuration) -> Result<Self, RewriteError> {
        Ok(Self::builder()
            .rewriters(configuration.rewriters()?)
            .ignore_parsing_errors(configuration.ignore_parsing_errors)
            .build())
    }

    fn interceptor(&self) -> RequestInterceptor {
        RequestInterceptor::with_extractor(
            self.rewriters.clone(),
            self.ignore_parsing_errors,
            self.extractor
                .clone()
                .unwrap_or_else(|| Arc::new(DefaultParamsExtractor)),
        )
    }
}

impl<E> Layer<E> for RewriteLayer
where
    E: QueryEngine,
{
    type Service = RewriteService<E>;

    fn layer(&self, engine: E) -> Self::Service {
        RewriteService {
            engine: Arc::new(engine),
            interceptor: self.interceptor(),
        }
    }
}

/// Runs one rewrite cycle per request: request interception, execution, response interception.
pub struct RewriteService<E> {
    engine: Arc<E>,
    interceptor: RequestInterceptor,
}

impl<E> Clone for RewriteService<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            interceptor: self.interceptor.clone(),
        }
    }
}

impl<E> Service<http_ext::Request> for RewriteService<E>
where
    E: QueryEngine,
{
    type Response = http::Response<Bytes>;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut request: http_ext::Request) -> Self::Future {
        let engine = self.engine.clone();
        let interceptor = self.interceptor.clone();
        Box::pin(async move {
            let mut context = RewriteContext::new();
            interceptor.intercept(&mut request, &mut context).await?;

            let mut writer = ResponseWriter::new();
            let mut response = ResponseInterceptor::new(&mut writer, &mut context);
            engine.execute(request, &mut response).await?;
            Ok(writer.into_response())
        })
    }
}
