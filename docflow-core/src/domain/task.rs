//! Task domain types
//!
//! A task is one step of a pipeline. On the wire it is a flat JSON object whose
//! `type` field selects which payload section is present (`module`, `prompt`,
//! `remote`, `pipelines` or `callback`). Here the payload is a sum type, and
//! every key the model does not own is kept verbatim in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// JSON object used for pass-through fields
pub type JsonMap = Map<String, Value>;

/// Errors raised while decoding a task from its wire representation
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("task field `{field}` is invalid: {message}")]
    InvalidField { field: &'static str, message: String },

    #[error("unknown task type `{0}`")]
    UnknownKind(String),

    #[error("task `{id}` of type {kind} has no `{key}` section")]
    MissingPayload {
        id: String,
        kind: TaskKind,
        key: &'static str,
    },

    #[error("task `{id}` has a malformed `{key}` section: {source}")]
    InvalidPayload {
        id: String,
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Execution kind of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Module,
    Pipeline,
    Prompt,
    Remote,
    PublishCallback,
}

impl TaskKind {
    pub const ALL: [TaskKind; 5] = [
        TaskKind::Module,
        TaskKind::Pipeline,
        TaskKind::Prompt,
        TaskKind::Remote,
        TaskKind::PublishCallback,
    ];

    /// Value of the `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Module => "module",
            TaskKind::Pipeline => "pipeline",
            TaskKind::Prompt => "prompt",
            TaskKind::Remote => "remote",
            TaskKind::PublishCallback => "publish_callback",
        }
    }

    /// Key of the payload section selected by this kind
    pub fn payload_key(&self) -> &'static str {
        match self {
            TaskKind::Module => "module",
            TaskKind::Pipeline => "pipelines",
            TaskKind::Prompt => "prompt",
            TaskKind::Remote => "remote",
            TaskKind::PublishCallback => "callback",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Module => "Module",
            TaskKind::Pipeline => "Sub-pipeline",
            TaskKind::Prompt => "Prompt",
            TaskKind::Remote => "Remote",
            TaskKind::PublishCallback => "Publish callback",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| TaskError::UnknownKind(s.to_string()))
    }
}

/// `module` section: runs a registered processing module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub module_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// `prompt` section: a single LLM invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instructions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// `remote` section: an outbound HTTP call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<JsonMap>,
    /// Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// One entry of a `pipelines` section: a sub-pipeline to dispatch to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// `callback` section of a publish-callback task
///
/// The callback shape is owned by the publishing service, so it stays opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallbackSpec {
    #[serde(flatten)]
    pub fields: JsonMap,
}

/// Type-specific payload of a task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskPayload {
    Module(ModuleSpec),
    Pipeline(Vec<PipelineRef>),
    Prompt(PromptSpec),
    Remote(RemoteSpec),
    PublishCallback(CallbackSpec),
}

impl TaskPayload {
    /// An empty payload of the given kind
    pub fn empty(kind: TaskKind) -> Self {
        match kind {
            TaskKind::Module => TaskPayload::Module(ModuleSpec::default()),
            TaskKind::Pipeline => TaskPayload::Pipeline(Vec::new()),
            TaskKind::Prompt => TaskPayload::Prompt(PromptSpec::default()),
            TaskKind::Remote => TaskPayload::Remote(RemoteSpec::default()),
            TaskKind::PublishCallback => TaskPayload::PublishCallback(CallbackSpec::default()),
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            TaskPayload::Module(_) => TaskKind::Module,
            TaskPayload::Pipeline(_) => TaskKind::Pipeline,
            TaskPayload::Prompt(_) => TaskKind::Prompt,
            TaskPayload::Remote(_) => TaskKind::Remote,
            TaskPayload::PublishCallback(_) => TaskKind::PublishCallback,
        }
    }

    fn from_value(kind: TaskKind, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            TaskKind::Module => TaskPayload::Module(serde_json::from_value(value)?),
            TaskKind::Pipeline => TaskPayload::Pipeline(serde_json::from_value(value)?),
            TaskKind::Prompt => TaskPayload::Prompt(serde_json::from_value(value)?),
            TaskKind::Remote => TaskPayload::Remote(serde_json::from_value(value)?),
            TaskKind::PublishCallback => {
                TaskPayload::PublishCallback(serde_json::from_value(value)?)
            }
        })
    }

    fn to_value(&self) -> Value {
        let value = match self {
            TaskPayload::Module(spec) => serde_json::to_value(spec),
            TaskPayload::Pipeline(refs) => serde_json::to_value(refs),
            TaskPayload::Prompt(spec) => serde_json::to_value(spec),
            TaskPayload::Remote(spec) => serde_json::to_value(spec),
            TaskPayload::PublishCallback(spec) => serde_json::to_value(spec),
        };
        // Plain structs with string keys never fail to serialize
        value.unwrap_or(Value::Null)
    }
}

/// Post-processing directives applied to a task's output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostProcessing {
    /// Field of the output to fan out over
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_each: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl PostProcessing {
    pub fn is_empty(&self) -> bool {
        self.for_each.is_none() && self.extra.is_empty()
    }
}

/// One step in a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JsonMap", into = "JsonMap")]
pub struct Task {
    pub id: String,
    pub payload: TaskPayload,
    pub post_processing: Option<PostProcessing>,
    /// `entity_schema_ref`, `invoke`, `params` and any other key not modelled above
    pub extra: JsonMap,
}

impl Task {
    pub fn new(id: impl Into<String>, payload: TaskPayload) -> Self {
        Self {
            id: id.into(),
            payload,
            post_processing: None,
            extra: JsonMap::new(),
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.payload.kind()
    }

    /// Field this task's output fans out over, if any
    pub fn for_each(&self) -> Option<&str> {
        self.post_processing
            .as_ref()
            .and_then(|pp| pp.for_each.as_deref())
            .filter(|field| !field.is_empty())
    }

    pub fn entity_schema_ref(&self) -> Option<&Value> {
        self.extra.get("entity_schema_ref")
    }
}

impl TryFrom<JsonMap> for Task {
    type Error = TaskError;

    fn try_from(mut map: JsonMap) -> Result<Self, Self::Error> {
        let id = match map.remove("id") {
            Some(Value::String(id)) => id,
            Some(other) => {
                return Err(TaskError::InvalidField {
                    field: "id",
                    message: format!("expected a string, found {}", other),
                });
            }
            None => return Err(TaskError::MissingField("id")),
        };

        let kind: TaskKind = match map.remove("type") {
            Some(Value::String(kind)) => kind.parse()?,
            Some(other) => {
                return Err(TaskError::InvalidField {
                    field: "type",
                    message: format!("expected a string, found {}", other),
                });
            }
            None => return Err(TaskError::MissingField("type")),
        };

        let key = kind.payload_key();
        let raw = map.remove(key).ok_or_else(|| TaskError::MissingPayload {
            id: id.clone(),
            kind,
            key,
        })?;
        let payload =
            TaskPayload::from_value(kind, raw).map_err(|source| TaskError::InvalidPayload {
                id: id.clone(),
                key,
                source,
            })?;

        let post_processing = match map.remove("post_processing") {
            None => None,
            // An explicit null is not ours to interpret; keep it as-is
            Some(Value::Null) => {
                map.insert("post_processing".to_string(), Value::Null);
                None
            }
            Some(value) => Some(serde_json::from_value(value).map_err(|source| {
                TaskError::InvalidPayload {
                    id: id.clone(),
                    key: "post_processing",
                    source,
                }
            })?),
        };

        Ok(Task {
            id,
            payload,
            post_processing,
            extra: map,
        })
    }
}

impl From<Task> for JsonMap {
    fn from(task: Task) -> Self {
        let kind = task.kind();
        let mut map = task.extra;
        map.insert("id".to_string(), Value::String(task.id));
        map.insert("type".to_string(), Value::String(kind.as_str().to_string()));
        map.insert(kind.payload_key().to_string(), task.payload.to_value());
        if let Some(pp) = task.post_processing {
            if let Ok(value) = serde_json::to_value(pp) {
                map.insert("post_processing".to_string(), value);
            }
        }
        map
    }
}
