use crate::error::{Result, WorkerError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User-supplied options for the EXIF task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub json_output: bool,
}

impl TaskConfig {
    pub const JSON_OUTPUT: &'static str = "json_output";

    /// Reads the options out of the raw `task_config` value.
    ///
    /// A missing or `null` config means all defaults. Unknown keys are
    /// ignored so a UI may post more fields than this task reads.
    pub fn from_value(value: Option<&Value>) -> Result<Self> {
        let object = match value {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(object)) => object,
            Some(other) => {
                return Err(WorkerError::InvalidTaskConfig {
                    message: format!("expected an object, got {}", other),
                })
            }
        };

        let json_output = match object.get(Self::JSON_OUTPUT) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            // Checkbox values posted as strings
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => true,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") || s.is_empty() => false,
            Some(other) => {
                return Err(WorkerError::InvalidTaskConfig {
                    message: format!("'{}' must be a boolean, got {}", Self::JSON_OUTPUT, other),
                })
            }
        };

        Ok(Self { json_output })
    }

    pub fn output_extension(&self) -> &'static str {
        if self.json_output {
            ".json"
        } else {
            ".txt"
        }
    }

    pub fn output_data_type(&self) -> &'static str {
        if self.json_output {
            "application/json"
        } else {
            "text/plain"
        }
    }
}

/// One entry of the form a UI renders for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigField {
    pub name: String,
    pub label: String,
    pub description: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub default_value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Checkbox,
}

/// Static description of a task, published alongside its registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub display_name: String,
    pub description: String,
    pub task_config: Vec<ConfigField>,
}
