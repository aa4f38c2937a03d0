//! Task editor
//!
//! Applies a form submission to an existing task. Only the fields the active
//! type-specific form owns are overwritten; everything else on the task,
//! including keys this crate does not model, is carried over unchanged.
//!
//! Form values arrive as text the way an editor collects them. Numeric fields
//! are normalized (defaults, clamping, rounding) and structured text such as
//! remote headers is parsed here, so a bad value becomes a field error instead
//! of a failed save.

use serde_json::Value;

use crate::domain::task::{
    CallbackSpec, JsonMap, ModuleSpec, PipelineRef, PostProcessing, PromptSpec, RemoteSpec, Task,
    TaskKind, TaskPayload,
};
use crate::validation::ValidationErrors;

pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const MAX_TEMPERATURE: f64 = 2.0;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
/// Seconds
pub const DEFAULT_REMOTE_TIMEOUT: u64 = 30;

pub const HTTP_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// A submitted task form
///
/// `None` means the field was not part of the submission. For `for_each`,
/// `Some(None)` clears the fan-out marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskEdit {
    pub for_each: Option<Option<String>>,
    pub payload: Option<PayloadEdit>,
}

/// Type-specific section of a task form
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadEdit {
    Module(ModuleEdit),
    Pipeline(PipelineEdit),
    Prompt(PromptEdit),
    Remote(RemoteEdit),
    PublishCallback(CallbackEdit),
}

impl PayloadEdit {
    pub fn kind(&self) -> TaskKind {
        match self {
            PayloadEdit::Module(_) => TaskKind::Module,
            PayloadEdit::Pipeline(_) => TaskKind::Pipeline,
            PayloadEdit::Prompt(_) => TaskKind::Prompt,
            PayloadEdit::Remote(_) => TaskKind::Remote,
            PayloadEdit::PublishCallback(_) => TaskKind::PublishCallback,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleEdit {
    pub module_type: Option<String>,
    /// JSON text; empty removes the context
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineEdit {
    pub pipelines: Option<Vec<PipelineRef>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptEdit {
    pub model: Option<String>,
    pub prompt: Option<String>,
    pub system_instructions: Option<Vec<String>>,
    pub max_output_tokens: Option<String>,
    pub temperature: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteEdit {
    pub url: Option<String>,
    pub method: Option<String>,
    /// JSON object text
    pub headers: Option<String>,
    pub timeout: Option<String>,
}

/// Keys to set on the callback section; a `null` value removes the key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallbackEdit {
    pub fields: JsonMap,
}

/// Build a new task of the given kind for a create flow
pub fn create_task(id: &str, kind: TaskKind) -> Result<Task, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if id.trim().is_empty() {
        errors.add("id", "id is required");
    }
    errors.into_result(Task::new(id.trim(), TaskPayload::empty(kind)))
}

/// Merge a form submission into `original`
///
/// `merge(task, &TaskEdit::default())` returns an identical task.
pub fn merge(original: &Task, edit: &TaskEdit) -> Result<Task, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut task = original.clone();

    if let Some(payload_edit) = &edit.payload {
        apply_payload(&mut task.payload, payload_edit, &mut errors);
    }

    if let Some(for_each) = &edit.for_each {
        apply_for_each(&mut task, for_each.as_deref());
    }

    errors.into_result(task)
}

fn apply_payload(payload: &mut TaskPayload, edit: &PayloadEdit, errors: &mut ValidationErrors) {
    match (payload, edit) {
        (TaskPayload::Module(spec), PayloadEdit::Module(edit)) => apply_module(spec, edit, errors),
        (TaskPayload::Pipeline(refs), PayloadEdit::Pipeline(edit)) => {
            if let Some(pipelines) = &edit.pipelines {
                *refs = pipelines.clone();
            }
        }
        (TaskPayload::Prompt(spec), PayloadEdit::Prompt(edit)) => apply_prompt(spec, edit, errors),
        (TaskPayload::Remote(spec), PayloadEdit::Remote(edit)) => apply_remote(spec, edit, errors),
        (TaskPayload::PublishCallback(spec), PayloadEdit::PublishCallback(edit)) => {
            apply_callback(spec, edit)
        }
        (payload, edit) => errors.add(
            "type",
            format!(
                "type is immutable: cannot apply a {} form to a {} task",
                edit.kind(),
                payload.kind()
            ),
        ),
    }
}

fn apply_module(spec: &mut ModuleSpec, edit: &ModuleEdit, errors: &mut ValidationErrors) {
    if let Some(module_type) = &edit.module_type {
        if module_type.trim().is_empty() {
            errors.add("module.type", "module type is required");
        } else {
            spec.module_type = Some(module_type.trim().to_string());
        }
    }
    if let Some(context) = &edit.context {
        if context.trim().is_empty() {
            spec.context = None;
        } else {
            match serde_json::from_str::<Value>(context) {
                Ok(value) => spec.context = Some(value),
                Err(e) => errors.add("module.context", format!("context must be valid JSON: {}", e)),
            }
        }
    }
}

fn apply_prompt(spec: &mut PromptSpec, edit: &PromptEdit, errors: &mut ValidationErrors) {
    if let Some(model) = &edit.model {
        if model.trim().is_empty() {
            errors.add("prompt.model", "model is required");
        } else {
            spec.model = Some(model.trim().to_string());
        }
    }
    if let Some(prompt) = &edit.prompt {
        spec.prompt = Some(prompt.clone());
    }
    if let Some(instructions) = &edit.system_instructions {
        spec.system_instructions = Some(
            instructions
                .iter()
                .map(|i| i.trim())
                .filter(|i| !i.is_empty())
                .map(str::to_string)
                .collect(),
        );
    }
    if let Some(text) = &edit.max_output_tokens {
        match normalize_max_output_tokens(text) {
            Ok(tokens) => spec.max_output_tokens = Some(tokens),
            Err(message) => errors.add("prompt.max_output_tokens", message),
        }
    }
    if let Some(text) = &edit.temperature {
        match normalize_temperature(text) {
            Ok(temperature) => spec.temperature = Some(temperature),
            Err(message) => errors.add("prompt.temperature", message),
        }
    }
}

fn apply_remote(spec: &mut RemoteSpec, edit: &RemoteEdit, errors: &mut ValidationErrors) {
    if let Some(url) = &edit.url {
        let url = url.trim();
        if url.is_empty() {
            errors.add("remote.url", "url is required");
        } else if !url.starts_with("http://") && !url.starts_with("https://") {
            errors.add("remote.url", "url must start with http:// or https://");
        } else {
            spec.url = Some(url.to_string());
        }
    }
    if let Some(method) = &edit.method {
        let method = method.trim().to_ascii_uppercase();
        if HTTP_METHODS.contains(&method.as_str()) {
            spec.method = Some(method);
        } else {
            errors.add(
                "remote.method",
                format!("method must be one of {}", HTTP_METHODS.join(", ")),
            );
        }
    }
    if let Some(text) = &edit.headers {
        match parse_headers(text) {
            Ok(headers) => spec.headers = Some(headers),
            Err(message) => errors.add("remote.headers", message),
        }
    }
    if let Some(text) = &edit.timeout {
        match normalize_timeout(text) {
            Ok(timeout) => spec.timeout = Some(timeout),
            Err(message) => errors.add("remote.timeout", message),
        }
    }
}

fn apply_callback(spec: &mut CallbackSpec, edit: &CallbackEdit) {
    for (key, value) in &edit.fields {
        if value.is_null() {
            spec.fields.remove(key);
        } else {
            spec.fields.insert(key.clone(), value.clone());
        }
    }
}

fn apply_for_each(task: &mut Task, field: Option<&str>) {
    match field.map(str::trim).filter(|f| !f.is_empty()) {
        Some(field) => {
            task.post_processing
                .get_or_insert_with(PostProcessing::default)
                .for_each = Some(field.to_string());
        }
        None => {
            if let Some(pp) = task.post_processing.as_mut() {
                pp.for_each = None;
                if pp.is_empty() {
                    task.post_processing = None;
                }
            }
        }
    }
}

/// Temperature: empty means the default, otherwise clamped to `[0, 2]` and
/// rounded to one decimal
pub fn normalize_temperature(text: &str) -> Result<f64, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(DEFAULT_TEMPERATURE);
    }
    let value: f64 = text
        .parse()
        .map_err(|_| format!("temperature must be a number, got '{}'", text))?;
    if !value.is_finite() {
        return Err(format!("temperature must be a number, got '{}'", text));
    }
    Ok((value.clamp(0.0, MAX_TEMPERATURE) * 10.0).round() / 10.0)
}

pub fn normalize_max_output_tokens(text: &str) -> Result<u32, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(DEFAULT_MAX_OUTPUT_TOKENS);
    }
    match text.parse::<u32>() {
        Ok(tokens) if tokens >= 1 => Ok(tokens),
        _ => Err(format!(
            "max_output_tokens must be a whole number of at least 1, got '{}'",
            text
        )),
    }
}

/// Remote timeout in seconds
pub fn normalize_timeout(text: &str) -> Result<u64, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(DEFAULT_REMOTE_TIMEOUT);
    }
    match text.parse::<u64>() {
        Ok(seconds) if seconds >= 1 => Ok(seconds),
        _ => Err(format!(
            "timeout must be a whole number of seconds of at least 1, got '{}'",
            text
        )),
    }
}

/// Parse header text into a JSON object of string values; empty text is `{}`
pub fn parse_headers(text: &str) -> Result<JsonMap, String> {
    if text.trim().is_empty() {
        return Ok(JsonMap::new());
    }
    let value: Value =
        serde_json::from_str(text).map_err(|e| format!("headers must be valid JSON: {}", e))?;
    let Value::Object(headers) = value else {
        return Err("headers must be a JSON object".to_string());
    };
    if let Some((name, _)) = headers.iter().find(|(_, v)| !v.is_string()) {
        return Err(format!("header '{}' must have a string value", name));
    }
    Ok(headers)
}
