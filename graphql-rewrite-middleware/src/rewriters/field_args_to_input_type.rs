use std::collections::BTreeMap;

use graphql_parser::query::Value as GraphQLValue;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use super::validate_name;
use crate::error::RewriteError;
use crate::rewrite::OperationContext;
use crate::rewrite::Rewriter;
use crate::rewrite::ast;

fn default_input_arg_name() -> String {
    "input".to_string()
}

/// Fold loose field arguments into a single input object argument.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FieldArgsToInputTypeConfig {
    /// The field whose arguments moved into an input type.
    pub field_name: String,
    /// The arguments legacy queries pass directly to the field.
    pub arg_names: Vec<String>,
    /// The argument carrying the input object.
    #[serde(default = "default_input_arg_name")]
    pub input_arg_name: String,
}

/// Rewrites `field(a: $a, b: 1)` into `field(input: {a: $a, b: 1})`.
///
/// Responses are left untouched.
#[derive(Clone, Debug)]
pub struct FieldArgsToInputTypeRewriter {
    field_name: String,
    arg_names: Vec<String>,
    input_arg_name: String,
}

impl FieldArgsToInputTypeRewriter {
    pub fn new<I, S>(
        field_name: &str,
        arg_names: I,
        input_arg_name: Option<&str>,
    ) -> Result<Self, RewriteError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            field_name: validate_name(field_name)?,
            arg_names: arg_names
                .into_iter()
                .map(|name| validate_name(name.as_ref()))
                .collect::<Result<_, _>>()?,
            input_arg_name: validate_name(input_arg_name.unwrap_or("input"))?,
        })
    }

    fn is_folded(&self, argument: &str) -> bool {
        self.arg_names.iter().any(|name| name == argument)
    }
}

impl TryFrom<FieldArgsToInputTypeConfig> for FieldArgsToInputTypeRewriter {
    type Error = RewriteError;

    fn try_from(config: FieldArgsToInputTypeConfig) -> Result<Self, Self::Error> {
        Self::new(
            &config.field_name,
            &config.arg_names,
            Some(config.input_arg_name.as_str()),
        )
    }
}

impl Rewriter for FieldArgsToInputTypeRewriter {
    fn matches(&self, field: &ast::Field, _operation: &OperationContext<'_>) -> bool {
        field.name == self.field_name
            && field
                .arguments
                .iter()
                .any(|(name, _)| self.is_folded(name))
    }

    fn rewrite_query(
        &self,
        field: &mut ast::Field,
        _operation: &mut OperationContext<'_>,
    ) -> Result<(), RewriteError> {
        if field
            .arguments
            .iter()
            .any(|(name, _)| *name == self.input_arg_name)
        {
            return Err(RewriteError::Incompatible {
                rewriter: "field_args_to_input_type".to_string(),
                reason: format!(
                    "field '{}' already has an '{}' argument",
                    self.field_name, self.input_arg_name
                ),
            });
        }

        let (folded, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut field.arguments)
            .into_iter()
            .partition(|(name, _)| self.is_folded(name));
        field.arguments = kept;
        field.arguments.push((
            self.input_arg_name.clone(),
            GraphQLValue::Object(folded.into_iter().collect::<BTreeMap<_, _>>()),
        ));
        Ok(())
    }
}
