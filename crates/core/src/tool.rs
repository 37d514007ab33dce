//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act inside its working root:
//! list directories, read and write files, run scripts.
//!
//! The working root is passed to [`Tool::execute`] as a separate capability
//! argument. Each tool deserializes the model-supplied arguments into its own
//! typed struct, so there is no way for the model to name the root.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::root::WorkingRoot;

/// A request to execute a tool, as emitted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the model's call id, or minted by the provider)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            arguments,
        }
    }
}

/// The outcome of one tool call. Every tool produces exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ToolResult {
    Ok(String),
    Error(String),
}

impl ToolResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// The payload text, whichever side it is on.
    pub fn text(&self) -> &str {
        match self {
            Self::Ok(s) | Self::Error(s) => s,
        }
    }
}

impl From<Result<String, ToolError>> for ToolResult {
    fn from(result: Result<String, ToolError>) -> Self {
        match result {
            Ok(output) => Self::Ok(output),
            Err(e) => Self::Error(e.to_string()),
        }
    }
}

/// The result of a dispatched call, tagged with the tool that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolObservation {
    /// The call ID this observation answers
    pub call_id: String,

    /// The tool name as requested by the model
    pub tool_name: String,

    pub result: ToolResult,
}

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    /// An array of strings.
    Array,
}

/// One entry of a tool's parameter schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }
}

/// A tool definition advertised to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The tool name (unique within a registry)
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// Parameters, in declaration order
    pub parameters: Vec<ParamSpec>,
}

impl ToolSpec {
    /// Render the parameters as a JSON Schema object.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for param in &self.parameters {
            let mut schema = serde_json::json!({
                "type": param.param_type,
                "description": param.description,
            });
            if param.param_type == ParamType::Array {
                schema["items"] = serde_json::json!({ "type": "string" });
            }
            properties.insert(param.name.clone(), schema);
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        let mut schema = serde_json::json!({
            "type": "object",
            "properties": properties,
        });
        if !required.is_empty() {
            schema["required"] = serde_json::json!(required);
        }
        schema
    }
}

/// Deserialize model-supplied arguments into a tool's typed parameter struct.
///
/// `null` is treated as an empty object; unknown keys are ignored.
pub fn parse_arguments<T: DeserializeOwned>(
    tool_name: &str,
    arguments: serde_json::Value,
) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool_name: tool_name.into(),
        reason: e.to_string(),
    })
}

/// The core Tool trait.
///
/// Each built-in tool implements this trait and is registered in the
/// [`ToolRegistry`], which the agent loop uses for both the advertised
/// catalog and dispatch.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// Parameter schema entries. Never includes the working root.
    fn parameters(&self) -> Vec<ParamSpec>;

    /// Execute the tool inside `root` with the model-supplied arguments.
    async fn execute(
        &self,
        root: &WorkingRoot,
        arguments: serde_json::Value,
    ) -> Result<String, ToolError>;

    /// Convert this tool into a ToolSpec for sending to the model.
    fn to_spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// The fixed catalog of callable tools plus the root they run in.
///
/// Registration order is preserved so the catalog sent to the model is
/// stable across turns.
pub struct ToolRegistry {
    root: WorkingRoot,
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new(root: WorkingRoot) -> Self {
        Self {
            root,
            tools: Vec::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(i) => self.tools[i] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// The working root injected into every call.
    pub fn root(&self) -> &WorkingRoot {
        &self.root
    }

    /// All tool specs, in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.to_spec()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Execute a tool call and wrap the outcome as an observation.
    ///
    /// Never fails: unknown names and tool errors come back as
    /// `ToolResult::Error` so the model can read them.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolObservation {
        let result = match self.get(&call.name) {
            Some(tool) => {
                debug!(tool = %call.name, call_id = %call.id, "Dispatching tool call");
                tool.execute(&self.root, call.arguments.clone()).await
            }
            None => Err(ToolError::UnknownTool(call.name.clone())),
        };

        if let Err(e) = &result {
            warn!(tool = %call.name, error = %e, "Tool call failed");
        }

        ToolObservation {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            result: result.into(),
        }
    }
}
