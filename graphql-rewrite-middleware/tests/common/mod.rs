#![allow(dead_code)]

use std::sync::Arc;

use async_graphql::EmptySubscription;
use async_graphql::ID;
use async_graphql::InputObject;
use async_graphql::Object;
use async_graphql::Schema;
use async_graphql::SimpleObject;
use async_graphql::Variables;
use axum::Router;
use axum::body::Body;
use bytes::Bytes;
use graphql_rewrite_middleware::DefaultParamsExtractor;
use graphql_rewrite_middleware::Emitter;
use graphql_rewrite_middleware::FieldArgTypeRewriter;
use graphql_rewrite_middleware::FieldArgsToInputTypeRewriter;
use graphql_rewrite_middleware::NestFieldOutputsRewriter;
use graphql_rewrite_middleware::ParamsExtractor;
use graphql_rewrite_middleware::QueryEngine;
use graphql_rewrite_middleware::RewriteLayer;
use graphql_rewrite_middleware::Rewriter;
use graphql_rewrite_middleware::axum_factory;
use graphql_rewrite_middleware::http_ext;
use http::HeaderValue;
use http::StatusCode;
use http::header::CONTENT_TYPE;
use http_body_util::BodyExt;
use serde_json::Value;
use serde_json::json;
use tower::BoxError;
use tower::Layer;
use tower::ServiceExt;

/*
  type Query {
    getPokemon(id: ID!): Pokemon
  }

  type Mutation {
    makePokemon(input: MakePokemonInput!): MakePokemonOutput
  }
*/
pub struct Query;

#[Object]
impl Query {
    async fn get_pokemon(&self, id: ID) -> Option<Pokemon> {
        (id.as_str() == "7").then(|| Pokemon {
            id: ID::from("7"),
            name: "Charmander".to_string(),
        })
    }
}

pub struct Mutation;

#[Object]
impl Mutation {
    async fn make_pokemon(&self, input: MakePokemonInput) -> Option<MakePokemonOutput> {
        Some(MakePokemonOutput {
            pokemon: Pokemon {
                id: ID::from("17"),
                name: input.name,
            },
        })
    }
}

#[derive(Clone, SimpleObject)]
pub struct Pokemon {
    name: String,
    id: ID,
}

#[derive(InputObject)]
pub struct MakePokemonInput {
    name: String,
}

#[derive(SimpleObject)]
pub struct MakePokemonOutput {
    pokemon: Pokemon,
}

/// Executes requests against the current Pokemon schema.
pub struct PokemonEngine {
    schema: Schema<Query, Mutation, EmptySubscription>,
    pretty: bool,
}

impl PokemonEngine {
    pub fn new() -> Self {
        Self {
            schema: Schema::build(Query, Mutation, EmptySubscription).finish(),
            pretty: false,
        }
    }

    /// Writes responses as pretty printed bytes instead of structured values.
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::new()
        }
    }
}

#[async_trait::async_trait]
impl QueryEngine for PokemonEngine {
    async fn execute(
        &self,
        request: http_ext::Request,
        response: &mut dyn Emitter,
    ) -> Result<(), BoxError> {
        let params = DefaultParamsExtractor.extract(&request).await?;
        let Some(query) = params.query else {
            response.json(json!({"errors": [{"message": "Must provide query string."}]}))?;
            return Ok(());
        };

        let mut graphql_request = async_graphql::Request::new(query);
        if let Some(variables) = params.variables {
            graphql_request = graphql_request.variables(Variables::from_json(Value::Object(variables)));
        }
        if let Some(operation_name) = params.operation_name {
            graphql_request = graphql_request.operation_name(operation_name);
        }
        let body = serde_json::to_value(self.schema.execute(graphql_request).await)?;

        if self.pretty {
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            );
            response.send(serde_json::to_vec_pretty(&body)?.into())?;
        } else {
            response.json(body)?;
        }
        Ok(())
    }
}

/// Answers every request with the same structured payload.
pub struct StaticEngine(pub Value);

#[async_trait::async_trait]
impl QueryEngine for StaticEngine {
    async fn execute(
        &self,
        _request: http_ext::Request,
        response: &mut dyn Emitter,
    ) -> Result<(), BoxError> {
        response.json(self.0.clone())?;
        Ok(())
    }
}

/// Answers every request with the same bytes, as JSON.
pub struct RawEngine(pub Bytes);

#[async_trait::async_trait]
impl QueryEngine for RawEngine {
    async fn execute(
        &self,
        _request: http_ext::Request,
        response: &mut dyn Emitter,
    ) -> Result<(), BoxError> {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response.send(self.0.clone())?;
        Ok(())
    }
}

pub fn query_rewriters() -> Vec<Arc<dyn Rewriter>> {
    vec![Arc::new(
        FieldArgTypeRewriter::new("getPokemon", "id", "String!", "ID!").unwrap(),
    )]
}

pub fn mutation_rewriters() -> Vec<Arc<dyn Rewriter>> {
    vec![
        Arc::new(FieldArgsToInputTypeRewriter::new("makePokemon", ["name"], None).unwrap()),
        Arc::new(NestFieldOutputsRewriter::new("makePokemon", "pokemon", ["id", "name"]).unwrap()),
    ]
}

pub fn router<E: QueryEngine>(layer: RewriteLayer, engine: E) -> Router {
    axum_factory::router("/graphql", layer.layer(engine))
}

pub fn layer(rewriters: Vec<Arc<dyn Rewriter>>) -> RewriteLayer {
    RewriteLayer::builder().rewriters(rewriters).build()
}

/// POSTs a JSON body to `/graphql`, returning the status and the decoded response body.
pub async fn post(router: &Router, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = http::Request::builder().method("POST").uri("/graphql");
    let body = match body {
        Some(body) => {
            request = request.header(CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&body).unwrap())
        }
        None => Body::empty(),
    };
    let (status, bytes) = send(router, request.body(body).unwrap()).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

pub async fn send(router: &Router, request: http::Request<Body>) -> (StatusCode, Bytes) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes)
}
