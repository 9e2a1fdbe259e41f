//! Backward compatible GraphQL schema evolution, as HTTP middleware.
//!
//! Incoming queries written against a legacy shape of the schema are rewritten to the current
//! shape before they reach the query engine, and the engine's response is rewritten back into
//! the shape the legacy client expects before it leaves the server.
//!
//! The pieces compose as a [`tower::Layer`]:
//!
//! ```ignore
//! let layer = RewriteLayer::builder()
//!     .rewriters(vec![Arc::new(FieldArgTypeRewriter::new(
//!         "getPokemon",
//!         "id",
//!         "String!",
//!         "ID!",
//!     )?) as Arc<dyn Rewriter>])
//!     .build();
//! let router = axum_factory::router("/graphql", layer.layer(my_engine));
//! ```
//!
//! See [`layers::request_rewrite`] and [`layers::response_rewrite`] for the two interception
//! points.

pub mod axum_factory;
pub mod configuration;
pub mod context;
pub mod emission;
pub mod error;
pub mod http_ext;
pub mod json_ext;
pub mod layers;
pub mod params;
pub mod request;
pub mod rewrite;
pub mod rewriters;
pub mod services;

pub use crate::configuration::Configuration;
pub use crate::configuration::ConfigurationError;
pub use crate::context::EmissionGuard;
pub use crate::context::RewriteContext;
pub use crate::context::RewriteSession;
pub use crate::emission::Emitter;
pub use crate::emission::ResponseWriter;
pub use crate::error::EmitError;
pub use crate::error::ExtractionError;
pub use crate::error::InterceptError;
pub use crate::error::RewriteError;
pub use crate::http_ext::RequestBody;
pub use crate::layers::request_rewrite::RequestInterceptor;
pub use crate::layers::response_rewrite::ResponseInterceptor;
pub use crate::params::DefaultParamsExtractor;
pub use crate::params::ParamsExtractor;
pub use crate::rewrite::RewriteHandler;
pub use crate::rewrite::Rewriter;
pub use crate::rewriters::FieldArgTypeRewriter;
pub use crate::rewriters::FieldArgsToInputTypeRewriter;
pub use crate::rewriters::NestFieldOutputsRewriter;
pub use crate::services::QueryEngine;
pub use crate::services::RewriteLayer;
pub use crate::services::RewriteService;
