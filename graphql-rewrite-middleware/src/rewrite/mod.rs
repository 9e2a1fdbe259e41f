//! Rewrite rules and the per-request handler applying them.
//!
//! A [`Rewriter`] is one pure transformation between a legacy query shape and the current
//! schema's shape. Rules are applied in the order they were configured: on the way in, each rule
//! sees the document as left by the previous one; on the way out, responses are rewritten in the
//! reverse order.
use std::fmt;
use std::sync::Arc;

use crate::error::RewriteError;
use crate::json_ext::Object;
use crate::json_ext::Value;

mod handler;

pub use self::handler::RewriteHandler;
pub use self::handler::RewrittenRequest;

/// The GraphQL syntax tree rewriters operate on.
pub mod ast {
    use graphql_parser::query;

    pub type Document = query::Document<'static, String>;
    pub type Definition = query::Definition<'static, String>;
    pub type OperationDefinition = query::OperationDefinition<'static, String>;
    pub type FragmentDefinition = query::FragmentDefinition<'static, String>;
    pub type VariableDefinition = query::VariableDefinition<'static, String>;
    pub type SelectionSet = query::SelectionSet<'static, String>;
    pub type Selection = query::Selection<'static, String>;
    pub type Field = query::Field<'static, String>;
    pub type Type = query::Type<'static, String>;
    pub type Value = query::Value<'static, String>;

    /// The key a field's value is found under in the response.
    pub fn response_key(field: &Field) -> &str {
        field.alias.as_deref().unwrap_or(&field.name)
    }
}

/// The ordered rules configured for a middleware instance.
pub type RewriteRuleSet = Arc<[Arc<dyn Rewriter>]>;

/// A rewrite rule.
///
/// The handler walks every field of every operation and calls [`Rewriter::rewrite_query`] on
/// those for which [`Rewriter::matches`] holds. Once the engine has answered, the value found at
/// each rewritten field's response path goes through [`Rewriter::rewrite_response`].
pub trait Rewriter: fmt::Debug + Send + Sync + 'static {
    /// Whether this rule applies to `field`.
    fn matches(&self, field: &ast::Field, operation: &OperationContext<'_>) -> bool;

    /// Rewrite a matching field in place.
    fn rewrite_query(
        &self,
        field: &mut ast::Field,
        operation: &mut OperationContext<'_>,
    ) -> Result<(), RewriteError>;

    /// Rewrite the response value of a field this rule rewrote.
    fn rewrite_response(&self, value: Value) -> Result<Value, RewriteError> {
        Ok(value)
    }
}

/// What a rule may see and change of the operation enclosing a field.
pub struct OperationContext<'a> {
    variable_definitions: &'a mut Vec<ast::VariableDefinition>,
    variables: &'a mut Object,
}

impl<'a> OperationContext<'a> {
    pub(crate) fn new(
        variable_definitions: &'a mut Vec<ast::VariableDefinition>,
        variables: &'a mut Object,
    ) -> Self {
        Self {
            variable_definitions,
            variables,
        }
    }

    pub fn variable_definition(&self, name: &str) -> Option<&ast::VariableDefinition> {
        self.variable_definitions
            .iter()
            .find(|definition| definition.name == name)
    }

    pub fn variable_definition_mut(
        &mut self,
        name: &str,
    ) -> Option<&mut ast::VariableDefinition> {
        self.variable_definitions
            .iter_mut()
            .find(|definition| definition.name == name)
    }

    /// The request's variable values, shared by every operation of the document.
    pub fn variables(&self) -> &Object {
        self.variables
    }

    pub fn variables_mut(&mut self) -> &mut Object {
        self.variables
    }
}
