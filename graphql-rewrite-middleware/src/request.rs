use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use typed_builder::TypedBuilder;

use crate::json_ext::Object;

/// The GraphQL parameters carried by an HTTP request.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, TypedBuilder)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Request {
    /// The GraphQL operation (e.g., query, mutation) string.
    ///
    /// For historical purposes, the term "query" is commonly used to refer to
    /// *any* GraphQL operation which might be, e.g., a `mutation`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[builder(default, setter(into, strip_option))]
    pub query: Option<String>,

    /// The (optional) GraphQL operation name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[builder(default, setter(into, strip_option))]
    pub operation_name: Option<String>,

    /// The (optional) GraphQL variables in the form of a JSON object.
    ///
    /// `None` when the client did not send any, which is different from an empty object for the
    /// rewriters: they hand back absent variables when nothing had to change.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[builder(default, setter(strip_option))]
    pub variables: Option<Object>,
}

impl Request {
    /// The query, unless it is absent or empty.
    pub fn non_empty_query(&self) -> Option<&str> {
        self.query.as_deref().filter(|query| !query.is_empty())
    }

    /// The body handed to the query engine once the query has been rewritten.
    pub(crate) fn to_body(&self) -> Object {
        let mut body = Object::new();
        body.insert(
            "operationName".to_string(),
            self.operation_name
                .as_deref()
                .map(Value::from)
                .unwrap_or(Value::Null),
        );
        body.insert(
            "query".to_string(),
            self.query.as_deref().map(Value::from).unwrap_or(Value::Null),
        );
        body.insert(
            "variables".to_string(),
            self.variables
                .clone()
                .map(Value::Object)
                .unwrap_or(Value::Null),
        );
        body
    }
}
