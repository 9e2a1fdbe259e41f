//! Built-in rewrite rules.
use graphql_parser::query::Type;

use crate::error::RewriteError;
use crate::rewrite::ast;

mod field_arg_type;
mod field_args_to_input_type;
mod nest_field_outputs;

pub use self::field_arg_type::FieldArgTypeConfig;
pub use self::field_arg_type::FieldArgTypeRewriter;
pub use self::field_args_to_input_type::FieldArgsToInputTypeConfig;
pub use self::field_args_to_input_type::FieldArgsToInputTypeRewriter;
pub use self::nest_field_outputs::NestFieldOutputsConfig;
pub use self::nest_field_outputs::NestFieldOutputsRewriter;

/// Whether `text` is a GraphQL name (`/[_A-Za-z][_0-9A-Za-z]*/`).
pub(crate) fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

pub(crate) fn validate_name(text: &str) -> Result<String, RewriteError> {
    if is_name(text) {
        Ok(text.to_string())
    } else {
        Err(RewriteError::InvalidName(text.to_string()))
    }
}

/// Parses a type reference such as `ID!` or `[String!]`.
pub(crate) fn parse_type(text: &str) -> Result<ast::Type, RewriteError> {
    let invalid = || RewriteError::InvalidType(text.to_string());
    let text = text.trim();
    if let Some(inner) = text.strip_suffix('!') {
        return match parse_type(inner).map_err(|_| invalid())? {
            Type::NonNullType(_) => Err(invalid()),
            inner => Ok(Type::NonNullType(Box::new(inner))),
        };
    }
    if let Some(inner) = text.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        let inner = parse_type(inner).map_err(|_| invalid())?;
        return Ok(Type::ListType(Box::new(inner)));
    }
    if is_name(text) {
        Ok(Type::NamedType(text.to_string()))
    } else {
        Err(invalid())
    }
}
