use graphql_parser::query::Value as GraphQLValue;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use super::parse_type;
use super::validate_name;
use crate::error::RewriteError;
use crate::rewrite::OperationContext;
use crate::rewrite::Rewriter;
use crate::rewrite::ast;

/// Change the declared type of the variable bound to a field argument.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FieldArgTypeConfig {
    /// The field whose argument changed type.
    pub field_name: String,
    /// The argument that changed type.
    pub arg_name: String,
    /// The type legacy queries declare, e.g. `String!`.
    pub old_type: String,
    /// The type the schema now expects, e.g. `ID!`.
    pub new_type: String,
}

/// Redeclares `$var: OldType` as `$var: NewType` wherever `$var` feeds `field(arg: $var)`.
///
/// Responses are left untouched.
#[derive(Clone, Debug)]
pub struct FieldArgTypeRewriter {
    field_name: String,
    arg_name: String,
    old_type: ast::Type,
    new_type: ast::Type,
}

impl FieldArgTypeRewriter {
    pub fn new(
        field_name: &str,
        arg_name: &str,
        old_type: &str,
        new_type: &str,
    ) -> Result<Self, RewriteError> {
        Ok(Self {
            field_name: validate_name(field_name)?,
            arg_name: validate_name(arg_name)?,
            old_type: parse_type(old_type)?,
            new_type: parse_type(new_type)?,
        })
    }

    fn bound_variable<'f>(&self, field: &'f ast::Field) -> Option<&'f str> {
        field
            .arguments
            .iter()
            .find_map(|(name, value)| match value {
                GraphQLValue::Variable(variable) if *name == self.arg_name => {
                    Some(variable.as_str())
                }
                _ => None,
            })
    }
}

impl TryFrom<FieldArgTypeConfig> for FieldArgTypeRewriter {
    type Error = RewriteError;

    fn try_from(config: FieldArgTypeConfig) -> Result<Self, Self::Error> {
        Self::new(
            &config.field_name,
            &config.arg_name,
            &config.old_type,
            &config.new_type,
        )
    }
}

impl Rewriter for FieldArgTypeRewriter {
    fn matches(&self, field: &ast::Field, operation: &OperationContext<'_>) -> bool {
        field.name == self.field_name
            && self
                .bound_variable(field)
                .and_then(|variable| operation.variable_definition(variable))
                .is_some_and(|definition| definition.var_type == self.old_type)
    }

    fn rewrite_query(
        &self,
        field: &mut ast::Field,
        operation: &mut OperationContext<'_>,
    ) -> Result<(), RewriteError> {
        let variable = self.bound_variable(field).ok_or_else(|| RewriteError::Incompatible {
            rewriter: "field_arg_type".to_string(),
            reason: format!("argument '{}' is not bound to a variable", self.arg_name),
        })?;
        let definition =
            operation
                .variable_definition_mut(variable)
                .ok_or_else(|| RewriteError::Incompatible {
                    rewriter: "field_arg_type".to_string(),
                    reason: format!("variable '${variable}' is not declared"),
                })?;
        definition.var_type = self.new_type.clone();
        Ok(())
    }
}
