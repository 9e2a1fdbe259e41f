//! Logic for loading configuration in to an object model
use std::str::FromStr;
use std::sync::Arc;

use displaydoc::Display;
use schemars::JsonSchema;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::error::RewriteError;
use crate::rewrite::Rewriter;
use crate::rewriters::FieldArgTypeConfig;
use crate::rewriters::FieldArgTypeRewriter;
use crate::rewriters::FieldArgsToInputTypeConfig;
use crate::rewriters::FieldArgsToInputTypeRewriter;
use crate::rewriters::NestFieldOutputsConfig;
use crate::rewriters::NestFieldOutputsRewriter;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not deserialize configuration: {0}
    DeserializeConfigError(#[from] serde_yaml::Error),

    /// invalid rewriter configuration: {0}
    InvalidRewriter(#[from] RewriteError),
}

/// The configuration of the rewrite middleware.
///
/// Can be created through `serde::Deserialize` from various formats,
/// or inline in Rust code with `serde_json::json!` and `serde_json::from_value`.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Forward requests whose parameters or query cannot be parsed untouched, instead of
    /// failing them.
    pub ignore_parsing_errors: bool,

    /// Rewrite rules. Requests go through them in order, responses in reverse order.
    pub rewriters: Vec<RewriterConfig>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            ignore_parsing_errors: true,
            rewriters: Vec::new(),
        }
    }
}

/// A built-in rewrite rule.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RewriterConfig {
    /// Change the declared type of the variable bound to a field argument.
    FieldArgType(FieldArgTypeConfig),

    /// Fold field arguments into a single input object argument.
    FieldArgsToInputType(FieldArgsToInputTypeConfig),

    /// Move field outputs under a new sub-field.
    NestFieldOutputs(NestFieldOutputsConfig),
}

impl RewriterConfig {
    pub fn build(&self) -> Result<Arc<dyn Rewriter>, RewriteError> {
        let rewriter: Arc<dyn Rewriter> = match self {
            RewriterConfig::FieldArgType(config) => {
                Arc::new(FieldArgTypeRewriter::try_from(config.clone())?)
            }
            RewriterConfig::FieldArgsToInputType(config) => {
                Arc::new(FieldArgsToInputTypeRewriter::try_from(config.clone())?)
            }
            RewriterConfig::NestFieldOutputs(config) => {
                Arc::new(NestFieldOutputsRewriter::try_from(config.clone())?)
            }
        };
        Ok(rewriter)
    }
}

impl Configuration {
    /// Parses and validates a YAML configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigurationError> {
        let configuration: Configuration = serde_yaml::from_str(yaml)?;
        configuration.rewriters()?;
        Ok(configuration)
    }

    /// The configured rules, in order.
    pub fn rewriters(&self) -> Result<Vec<Arc<dyn Rewriter>>, RewriteError> {
        self.rewriters.iter().map(RewriterConfig::build).collect()
    }

    /// The JSON schema of the configuration.
    pub fn schema() -> RootSchema {
        schemars::schema_for!(Configuration)
    }
}

impl FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_yaml(s)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const POKEMON: &str = r#"
rewriters:
  - field_arg_type:
      field_name: getPokemon
      arg_name: id
      old_type: "String!"
      new_type: "ID!"
  - field_args_to_input_type:
      field_name: makePokemon
      arg_names: [name]
  - nest_field_outputs:
      field_name: makePokemon
      new_output_name: pokemon
      outputs_to_nest: [id, name]
"#;

    #[test]
    fn it_loads_yaml() {
        let configuration: Configuration = POKEMON.parse().unwrap();
        assert!(configuration.ignore_parsing_errors);
        assert_eq!(configuration.rewriters.len(), 3);
        assert_eq!(
            configuration.rewriters[1],
            RewriterConfig::FieldArgsToInputType(FieldArgsToInputTypeConfig {
                field_name: "makePokemon".to_string(),
                arg_names: vec!["name".to_string()],
                input_arg_name: "input".to_string(),
            })
        );
        assert_eq!(configuration.rewriters().unwrap().len(), 3);
    }

    #[test]
    fn empty_configurations_use_defaults() {
        let configuration = Configuration::from_yaml("{}").unwrap();
        assert_eq!(configuration, Configuration::default());
        assert!(configuration.ignore_parsing_errors);

        let configuration = Configuration::from_yaml("ignore_parsing_errors: false").unwrap();
        assert!(!configuration.ignore_parsing_errors);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = Configuration::from_yaml("ignore_parsing_error: false").unwrap_err();
        assert!(matches!(error, ConfigurationError::DeserializeConfigError(_)));

        let error = Configuration::from_yaml(
            "rewriters:\n  - rename_field:\n      field_name: a\n",
        )
        .unwrap_err();
        assert!(matches!(error, ConfigurationError::DeserializeConfigError(_)));
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let error = Configuration::from_yaml(
            r#"
rewriters:
  - field_arg_type:
      field_name: getPokemon
      arg_name: id
      old_type: "[String!"
      new_type: "ID!"
"#,
        )
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid rewriter configuration: invalid type reference '[String!'"
        );
    }

    #[test]
    fn it_builds_from_json_too() {
        let configuration: Configuration = serde_json::from_value(json!({
            "ignore_parsing_errors": false,
            "rewriters": [{"nest_field_outputs": {
                "field_name": "makePokemon",
                "new_output_name": "pokemon",
                "outputs_to_nest": ["id"]
            }}]
        }))
        .unwrap();
        assert!(!configuration.ignore_parsing_errors);
        assert_eq!(configuration.rewriters().unwrap().len(), 1);
    }

    #[test]
    fn schema_describes_every_rule() {
        let schema = serde_json::to_value(Configuration::schema()).unwrap();
        assert_eq!(schema["properties"]["ignore_parsing_errors"]["type"], "boolean");
        let schema = schema.to_string();
        for rule in ["field_arg_type", "field_args_to_input_type", "nest_field_outputs"] {
            assert!(schema.contains(rule), "{rule}");
        }
    }
}
