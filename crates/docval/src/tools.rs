//! The tools the model can call to validate documents.
//!
//! Each tool is a statically typed handler behind [`ToolHandler`]. The agent
//! looks handlers up by name and hands them [`ToolArguments`], which merge what
//! the model declared with what the system supplies (the attached file).
pub mod client;
pub mod irpf;
pub mod outcome;
pub mod residence;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;

pub use client::{ValidationClient, ValidationConfig};
pub use irpf::ValidateIrpf;
pub use outcome::{DocumentKind, ValidationError, ValidationOutcome};
pub use residence::ValidateProofOfResidence;

/// Argument carrying the base64 encoded PDF
pub const FILE_ARGUMENT: &str = "fileBase64";

/// Values supplied by the system rather than the model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub file_base64: Option<String>,
}

/// Arguments for one tool call: the model's declared mapping plus system overrides.
///
/// An override only applies where the model left the value absent, which
/// includes `null` and the empty string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    declared: Map<String, Value>,
    overrides: Overrides,
}

impl ToolArguments {
    /// Wrap the arguments produced by the model, which must be an object (or null)
    pub fn from_model(arguments: Value) -> AgentResult<Self> {
        let declared = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(AgentError::InvalidParameters(format!(
                    "expected an object of arguments, got {}",
                    other
                )))
            }
        };
        Ok(Self {
            declared,
            overrides: Overrides::default(),
        })
    }

    pub fn with_file<S: Into<String>>(mut self, file_base64: S) -> Self {
        self.overrides.file_base64 = Some(file_base64.into());
        self
    }

    /// Whether the model itself provided a file payload
    pub fn declares_file(&self) -> bool {
        matches!(self.declared.get(FILE_ARGUMENT), Some(Value::String(s)) if !s.is_empty())
    }

    /// Names of the arguments the model declared
    pub fn declared_keys(&self) -> Vec<&str> {
        self.declared.keys().map(String::as_str).collect()
    }

    pub fn merged(&self) -> Value {
        let mut merged = self.declared.clone();
        if !self.declares_file() {
            if let Some(file) = &self.overrides.file_base64 {
                merged.insert(FILE_ARGUMENT.to_string(), Value::String(file.clone()));
            }
        }
        Value::Object(merged)
    }

    /// Check the merged arguments against a tool's typed argument struct
    pub fn parse<T: DeserializeOwned>(&self) -> AgentResult<T> {
        serde_json::from_value(self.merged())
            .map_err(|e| AgentError::InvalidParameters(e.to_string()))
    }
}

/// A tool the agent can dispatch to
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Metadata advertised to the model
    fn tool(&self) -> &Tool;

    fn name(&self) -> &str {
        &self.tool().name
    }

    /// Run the tool. Precondition and upstream failures come back as a failed
    /// envelope; `Err` is reserved for arguments that do not fit the schema.
    async fn call(&self, arguments: ToolArguments) -> AgentResult<ValidationOutcome>;
}

/// Both validation tools, sharing one client
pub fn validation_tools(client: Arc<ValidationClient>) -> Vec<Box<dyn ToolHandler>> {
    vec![
        Box::new(ValidateIrpf::new(Arc::clone(&client))),
        Box::new(ValidateProofOfResidence::new(client)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Args {
        #[serde(rename = "fileBase64", default)]
        file_base64: Option<String>,
        #[serde(default)]
        address: Option<String>,
    }

    #[test]
    fn test_override_fills_missing_file() {
        let arguments = ToolArguments::from_model(json!({"address": "Rua A"}))
            .unwrap()
            .with_file("JVBERi0=");

        assert_eq!(
            arguments.merged(),
            json!({"address": "Rua A", "fileBase64": "JVBERi0="})
        );
        assert!(!arguments.declares_file());
    }

    #[test]
    fn test_override_fills_null_and_empty_file() {
        for declared in [json!({"fileBase64": null}), json!({"fileBase64": ""})] {
            let arguments = ToolArguments::from_model(declared).unwrap().with_file("AAAA");
            assert_eq!(arguments.merged()["fileBase64"], "AAAA");
        }
    }

    #[test]
    fn test_declared_file_wins() {
        let arguments = ToolArguments::from_model(json!({"fileBase64": "TU9ERUw="}))
            .unwrap()
            .with_file("U1lTVEVN");

        assert_eq!(arguments.merged()["fileBase64"], "TU9ERUw=");
    }

    #[test]
    fn test_null_arguments_are_empty() {
        let arguments = ToolArguments::from_model(Value::Null).unwrap();
        assert_eq!(arguments.merged(), json!({}));
        assert!(arguments.declared_keys().is_empty());
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let result = ToolArguments::from_model(json!(["fileBase64"]));
        assert!(matches!(result, Err(AgentError::InvalidParameters(_))));
    }

    #[test]
    fn test_parse_validates_types() {
        let arguments = ToolArguments::from_model(json!({"address": 42})).unwrap();
        let result = arguments.parse::<Args>();
        assert!(matches!(result, Err(AgentError::InvalidParameters(_))));

        let arguments = ToolArguments::from_model(json!({"address": "Rua B"}))
            .unwrap()
            .with_file("AAAA");
        let args: Args = arguments.parse().unwrap();
        assert_eq!(args.address.as_deref(), Some("Rua B"));
        assert_eq!(args.file_base64.as_deref(), Some("AAAA"));
    }

    #[test]
    fn test_validation_tools_names() {
        let client = Arc::new(ValidationClient::new(ValidationConfig::default()).unwrap());
        let tools = validation_tools(client);
        let names: Vec<&str> = tools.iter().map(|tool| tool.name()).collect();
        assert_eq!(names, vec!["validate_irpf", "validate_proof_of_residence"]);
    }
}
