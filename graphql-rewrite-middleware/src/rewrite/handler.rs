use std::collections::HashMap;
use std::sync::Arc;

use graphql_parser::query::Definition;
use graphql_parser::query::OperationDefinition;

use super::OperationContext;
use super::RewriteRuleSet;
use super::Rewriter;
use super::ast;
use crate::error::RewriteError;
use crate::json_ext::Object;
use crate::json_ext::Path;
use crate::json_ext::Value;

/// The outcome of rewriting a request.
#[derive(Clone, Debug, PartialEq)]
pub struct RewrittenRequest {
    pub query: String,
    pub variables: Option<Object>,
}

#[derive(Debug)]
struct RewriterMatch {
    rewriter: Arc<dyn Rewriter>,
    paths: Vec<Path>,
}

/// Applies a [`RewriteRuleSet`] to one request, then to the response that request produced.
///
/// The handler remembers where each rule matched in the query, which is what lets the response be
/// rewritten back. It is therefore single use: rewriting a second request fails with
/// [`RewriteError::AlreadyProcessed`].
#[derive(Debug)]
pub struct RewriteHandler {
    rewriters: RewriteRuleSet,
    matches: Vec<RewriterMatch>,
    processed: bool,
}

impl RewriteHandler {
    pub fn new(rewriters: RewriteRuleSet) -> Self {
        Self {
            rewriters,
            matches: Vec::new(),
            processed: false,
        }
    }

    /// Rewrites `query` and `variables` to the current schema shape.
    ///
    /// When no rule matches, the query text and variables are handed back untouched.
    pub fn rewrite_request(
        &mut self,
        query: &str,
        variables: Option<Object>,
    ) -> Result<RewrittenRequest, RewriteError> {
        if self.processed {
            return Err(RewriteError::AlreadyProcessed);
        }
        self.processed = true;

        let mut document: ast::Document = graphql_parser::parse_query::<String>(query)
            .map_err(|error| RewriteError::Parse(error.to_string()))?
            .into_static();
        let mut values = variables.clone().unwrap_or_default();

        // Fragments are rewritten at most once per rule, through the first spread reaching them.
        let mut fragments: HashMap<String, ast::FragmentDefinition> = document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                Definition::Fragment(fragment) => Some((fragment.name.clone(), fragment.clone())),
                Definition::Operation(_) => None,
            })
            .collect();

        for rewriter in self.rewriters.iter() {
            let mut traversal = Traversal {
                rewriter: rewriter.as_ref(),
                fragments: &mut fragments,
                fragment_paths: HashMap::new(),
            };
            let mut paths = Vec::new();
            for definition in document.definitions.iter_mut() {
                if let Definition::Operation(operation) = definition {
                    traversal.operation(operation, &mut values, &mut paths)?;
                }
            }
            if !paths.is_empty() {
                tracing::trace!(
                    ?rewriter,
                    paths = %paths.iter().map(Path::to_string).collect::<Vec<_>>().join(", "),
                    "rewrite rule matched"
                );
                self.matches.push(RewriterMatch {
                    rewriter: rewriter.clone(),
                    paths,
                });
            }
        }

        if self.matches.is_empty() {
            return Ok(RewrittenRequest {
                query: query.to_string(),
                variables,
            });
        }

        for definition in document.definitions.iter_mut() {
            if let Definition::Fragment(fragment) = definition {
                if let Some(rewritten) = fragments.remove(&fragment.name) {
                    *fragment = rewritten;
                }
            }
        }

        Ok(RewrittenRequest {
            query: document.to_string(),
            variables: if variables.is_none() && values.is_empty() {
                None
            } else {
                Some(values)
            },
        })
    }

    /// Rewrites a response's `data` back into the shape the client's query asked for.
    pub fn rewrite_response(&self, data: Value) -> Result<Value, RewriteError> {
        let mut data = data;
        for matched in self.matches.iter().rev() {
            // deepest paths first, so that outer rewrites don't move inner targets
            for path in matched.paths.iter().rev() {
                path.apply(&mut data, &mut |value| matched.rewriter.rewrite_response(value))?;
            }
        }
        Ok(data)
    }

    /// Whether any rule rewrote the request.
    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }
}

struct Traversal<'a> {
    rewriter: &'a dyn Rewriter,
    fragments: &'a mut HashMap<String, ast::FragmentDefinition>,
    // match paths relative to each fragment already rewritten by this rule
    fragment_paths: HashMap<String, Vec<Path>>,
}

impl Traversal<'_> {
    fn operation(
        &mut self,
        operation: &mut ast::OperationDefinition,
        values: &mut Object,
        paths: &mut Vec<Path>,
    ) -> Result<(), RewriteError> {
        let mut no_variables = Vec::new();
        let (variable_definitions, selection_set) = match operation {
            OperationDefinition::SelectionSet(selection_set) => (&mut no_variables, selection_set),
            OperationDefinition::Query(query) => {
                (&mut query.variable_definitions, &mut query.selection_set)
            }
            OperationDefinition::Mutation(mutation) => {
                (&mut mutation.variable_definitions, &mut mutation.selection_set)
            }
            OperationDefinition::Subscription(subscription) => (
                &mut subscription.variable_definitions,
                &mut subscription.selection_set,
            ),
        };
        let mut context = OperationContext::new(variable_definitions, values);
        self.selection_set(selection_set, &mut Path::default(), &mut context, paths)
    }

    fn selection_set(
        &mut self,
        selection_set: &mut ast::SelectionSet,
        path: &mut Path,
        operation: &mut OperationContext<'_>,
        paths: &mut Vec<Path>,
    ) -> Result<(), RewriteError> {
        for selection in selection_set.items.iter_mut() {
            match selection {
                ast::Selection::Field(field) => {
                    path.push(ast::response_key(field));
                    if self.rewriter.matches(field, operation) {
                        self.rewriter.rewrite_query(field, operation)?;
                        paths.push(path.clone());
                    }
                    self.selection_set(&mut field.selection_set, path, operation, paths)?;
                    path.pop();
                }
                ast::Selection::InlineFragment(fragment) => {
                    self.selection_set(&mut fragment.selection_set, path, operation, paths)?;
                }
                ast::Selection::FragmentSpread(spread) => {
                    let relative = self.fragment(&spread.fragment_name, operation)?;
                    paths.extend(relative.iter().map(|relative| path.join(relative)));
                }
            }
        }
        Ok(())
    }

    fn fragment(
        &mut self,
        name: &str,
        operation: &mut OperationContext<'_>,
    ) -> Result<Vec<Path>, RewriteError> {
        if let Some(paths) = self.fragment_paths.get(name) {
            return Ok(paths.clone());
        }
        // unknown fragment, or a spread cycle back into a fragment being rewritten
        let Some(mut definition) = self.fragments.remove(name) else {
            return Ok(Vec::new());
        };
        let mut paths = Vec::new();
        let result = self.selection_set(
            &mut definition.selection_set,
            &mut Path::default(),
            operation,
            &mut paths,
        );
        self.fragments.insert(name.to_string(), definition);
        result?;
        self.fragment_paths.insert(name.to_string(), paths.clone());
        Ok(paths)
    }
}
