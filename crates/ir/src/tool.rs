use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IRToolDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input, stored verbatim.
    pub input_schema: Value,
}

/// Which tool (if any) the model must call. `None`/`Auto`/`Required` map
/// cleanly across protocols; `Specific` names one tool by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IRToolChoice {
    None,
    Auto,
    Required,
    Specific { name: String },
}
