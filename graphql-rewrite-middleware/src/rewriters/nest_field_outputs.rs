use graphql_parser::query::Field;
use graphql_parser::query::Selection;
use graphql_parser::query::SelectionSet;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use super::validate_name;
use crate::error::RewriteError;
use crate::json_ext::Value;
use crate::rewrite::OperationContext;
use crate::rewrite::Rewriter;
use crate::rewrite::ast;

/// Move some of a field's outputs under a new sub-field.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NestFieldOutputsConfig {
    /// The field whose outputs moved.
    pub field_name: String,
    /// The sub-field now holding the moved outputs.
    pub new_output_name: String,
    /// The outputs that moved.
    pub outputs_to_nest: Vec<String>,
}

/// Rewrites `field { a b c }` into `field { wrapper { a b } c }`, and the matching responses back.
#[derive(Clone, Debug)]
pub struct NestFieldOutputsRewriter {
    field_name: String,
    new_output_name: String,
    outputs_to_nest: Vec<String>,
}

impl NestFieldOutputsRewriter {
    pub fn new<I, S>(
        field_name: &str,
        new_output_name: &str,
        outputs_to_nest: I,
    ) -> Result<Self, RewriteError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            field_name: validate_name(field_name)?,
            new_output_name: validate_name(new_output_name)?,
            outputs_to_nest: outputs_to_nest
                .into_iter()
                .map(|name| validate_name(name.as_ref()))
                .collect::<Result<_, _>>()?,
        })
    }

    fn is_nested(&self, selection: &ast::Selection) -> bool {
        matches!(selection, Selection::Field(field) if self.outputs_to_nest.contains(&field.name))
    }
}

impl TryFrom<NestFieldOutputsConfig> for NestFieldOutputsRewriter {
    type Error = RewriteError;

    fn try_from(config: NestFieldOutputsConfig) -> Result<Self, Self::Error> {
        Self::new(
            &config.field_name,
            &config.new_output_name,
            &config.outputs_to_nest,
        )
    }
}

impl Rewriter for NestFieldOutputsRewriter {
    fn matches(&self, field: &ast::Field, _operation: &OperationContext<'_>) -> bool {
        let items = &field.selection_set.items;
        field.name == self.field_name
            && !items.iter().any(|selection| {
                matches!(selection, Selection::Field(child) if child.name == self.new_output_name)
            })
            && items.iter().any(|selection| self.is_nested(selection))
    }

    fn rewrite_query(
        &self,
        field: &mut ast::Field,
        _operation: &mut OperationContext<'_>,
    ) -> Result<(), RewriteError> {
        let (nested, mut kept): (Vec<_>, Vec<_>) = std::mem::take(&mut field.selection_set.items)
            .into_iter()
            .partition(|selection| self.is_nested(selection));
        kept.insert(
            0,
            Selection::Field(Field {
                position: field.position,
                alias: None,
                name: self.new_output_name.clone(),
                arguments: Vec::new(),
                directives: Vec::new(),
                selection_set: SelectionSet {
                    span: field.selection_set.span,
                    items: nested,
                },
            }),
        );
        field.selection_set.items = kept;
        Ok(())
    }

    fn rewrite_response(&self, value: Value) -> Result<Value, RewriteError> {
        let mut object = match value {
            Value::Object(object) => object,
            other => return Ok(other),
        };
        match object.remove(&self.new_output_name) {
            Some(Value::Object(nested)) => object.extend(nested),
            Some(Value::Null) => {
                for output in &self.outputs_to_nest {
                    object.insert(output.clone(), Value::Null);
                }
            }
            Some(other) => {
                object.insert(self.new_output_name.clone(), other);
            }
            None => {}
        }
        Ok(Value::Object(object))
    }
}
