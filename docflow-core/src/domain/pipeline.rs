//! Pipeline domain types

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use super::task::{JsonMap, Task, TaskKind};

/// Errors raised when editing a pipeline's task list
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("task index {index} is out of range (pipeline has {len} tasks)")]
    TaskIndexOutOfRange { index: usize, len: usize },

    #[error("task `{0}` not found in pipeline")]
    TaskNotFound(String),

    #[error("task id is immutable: expected `{expected}`, found `{found}`")]
    TaskIdChanged { expected: String, found: String },

    #[error("task `{id}` type is immutable: expected {expected}, found {found}")]
    TaskKindChanged {
        id: String,
        expected: TaskKind,
        found: TaskKind,
    },

    #[error("malformed task list: {0}")]
    MalformedTaskList(String),
}

/// Pipeline definition
///
/// An ordered list of tasks plus metadata. The order of `tasks` is the default
/// sequential execution order. Fields the service adds that are not modelled
/// here are carried in `extra` so a fetched pipeline can be resent unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Upsert key: POSTing a pipeline with an existing key replaces it
    pub key: String,
    pub name: String,
    /// Services send this as a string or a bare number
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_publish_entities_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Pipeline {
    /// Create an empty pipeline with the given key and name
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            key: key.into(),
            name: name.into(),
            version: None,
            scope: None,
            active: None,
            auto_publish_entities_enabled: None,
            app_id: None,
            labels: None,
            tasks: Vec::new(),
            created_at: None,
            created_by: None,
            modified_at: None,
            modified_by: None,
            extra: JsonMap::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(false)
    }

    /// Position of the task with the given id
    pub fn task_index(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Replace the task at `index`, returning the previous one
    ///
    /// The replacement must keep the original task's id and type.
    pub fn replace_task(&mut self, index: usize, task: Task) -> Result<Task, PipelineError> {
        let len = self.tasks.len();
        let slot = self
            .tasks
            .get_mut(index)
            .ok_or(PipelineError::TaskIndexOutOfRange { index, len })?;

        if slot.id != task.id {
            return Err(PipelineError::TaskIdChanged {
                expected: slot.id.clone(),
                found: task.id,
            });
        }
        let found = task.kind();
        if slot.kind() != found {
            return Err(PipelineError::TaskKindChanged {
                id: task.id,
                expected: slot.kind(),
                found,
            });
        }

        Ok(std::mem::replace(slot, task))
    }

    /// Replace the task sharing `task.id`, returning the previous one
    pub fn replace_task_by_id(&mut self, task: Task) -> Result<Task, PipelineError> {
        let index = self
            .task_index(&task.id)
            .ok_or_else(|| PipelineError::TaskNotFound(task.id.clone()))?;
        self.replace_task(index, task)
    }

    /// Task ids that appear more than once, in first-seen order
    pub fn duplicate_task_ids(&self) -> Vec<String> {
        duplicate_task_ids(&self.tasks)
    }
}

/// Task ids that appear more than once in `tasks`, in first-seen order
pub fn duplicate_task_ids(tasks: &[Task]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut duplicates = Vec::new();
    for task in tasks {
        let count = seen.entry(task.id.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicates.push(task.id.clone());
        }
    }
    duplicates
}

fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or a number, found {}",
            other
        ))),
    }
}

fn raw_tasks(record: &mut JsonMap) -> Result<Option<&mut Vec<Value>>, PipelineError> {
    match record.get_mut("tasks") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(tasks)) => Ok(Some(tasks)),
        Some(_) => Err(PipelineError::MalformedTaskList(
            "`tasks` is not an array".to_string(),
        )),
    }
}

fn raw_task_id(raw: &Value) -> Option<&str> {
    raw.get("id").and_then(Value::as_str)
}

/// Write `task` over the task with the same id in a pipeline record exactly
/// as the service returned it
///
/// Every other key of the record and every other task keep their received
/// JSON, including explicit nulls and integer-valued numbers. The task's id
/// and type must match the stored one.
pub fn splice_task(record: &mut JsonMap, task: &Task) -> Result<(), PipelineError> {
    let slot = raw_tasks(record)?
        .and_then(|tasks| {
            tasks
                .iter_mut()
                .find(|raw| raw_task_id(raw) == Some(task.id.as_str()))
        })
        .ok_or_else(|| PipelineError::TaskNotFound(task.id.clone()))?;

    let found = task.kind();
    let stored = slot
        .get("type")
        .and_then(Value::as_str)
        .and_then(|kind| kind.parse::<TaskKind>().ok());
    match stored {
        Some(expected) if expected != found => {
            return Err(PipelineError::TaskKindChanged {
                id: task.id.clone(),
                expected,
                found,
            });
        }
        Some(_) => {}
        None => {
            return Err(PipelineError::MalformedTaskList(format!(
                "stored task `{}` has no recognised type",
                task.id
            )));
        }
    }

    *slot = Value::Object(JsonMap::from(task.clone()));
    Ok(())
}

/// Replace the whole task list of a pipeline record
///
/// A task that decodes to exactly the stored task with the same id keeps its
/// received JSON; anything else is written from `tasks`.
pub fn splice_tasks(record: &mut JsonMap, tasks: &[Task]) -> Result<(), PipelineError> {
    let previous = raw_tasks(record)?.map(std::mem::take).unwrap_or_default();

    let spliced = tasks
        .iter()
        .map(|task| {
            previous
                .iter()
                .find(|raw| {
                    raw_task_id(raw) == Some(task.id.as_str())
                        && serde_json::from_value::<Task>((*raw).clone()).ok().as_ref()
                            == Some(task)
                })
                .cloned()
                .unwrap_or_else(|| Value::Object(JsonMap::from(task.clone())))
        })
        .collect();

    record.insert("tasks".to_string(), Value::Array(spliced));
    Ok(())
}
