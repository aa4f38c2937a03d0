//! Pipeline flow graph
//!
//! Derives the renderable node/edge graph for a pipeline's task list:
//! a synthetic `start` node, one node per task in order, and a synthetic `end`
//! node, chained by sequential edges. An edge entering a task whose predecessor
//! fans out (`post_processing.for_each`) is styled as a fan-out transition.
//!
//! Derivation is pure and total. Node and edge ids are keyed by task id, so a
//! reordered task list moves the fan-out marker together with the task that
//! declares it. A repeated task id gets an occurrence suffix (`task:ocr#2`),
//! keeping every node and edge id unique.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write;
use std::iter;

use crate::domain::task::{Task, TaskKind};

pub const START_NODE_ID: &str = "start";
pub const END_NODE_ID: &str = "end";

/// Vertical distance between consecutive nodes
pub const ROW_SPACING: f64 = 100.0;

/// What callers show instead of a graph for an empty pipeline
pub const EMPTY_PLACEHOLDER: &str = "No tasks defined";

/// Position of a node in the layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Node kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Start,
    Task {
        task_id: String,
        task_kind: TaskKind,
        /// Position in the pipeline's task list
        index: usize,
    },
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub position: Position,
}

impl FlowNode {
    fn start() -> Self {
        Self {
            id: START_NODE_ID.to_string(),
            kind: NodeKind::Start,
            label: "Start".to_string(),
            position: Position::row(0),
        }
    }

    fn end(row: usize) -> Self {
        Self {
            id: END_NODE_ID.to_string(),
            kind: NodeKind::End,
            label: "End".to_string(),
            position: Position::row(row),
        }
    }

    fn for_task(id: String, index: usize, task: &Task) -> Self {
        Self {
            id,
            kind: NodeKind::Task {
                task_id: task.id.clone(),
                task_kind: task.kind(),
                index,
            },
            label: format!("{} ({})", task.id, task.kind().label()),
            position: Position::row(index + 1),
        }
    }

    pub fn is_task(&self) -> bool {
        matches!(self.kind, NodeKind::Task { .. })
    }
}

impl Position {
    fn row(row: usize) -> Self {
        Self {
            x: 0.0,
            y: ROW_SPACING * row as f64,
        }
    }
}

/// Edge style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStyle {
    Sequential,
    /// The source task's output is iterated; one invocation per item
    FanOut,
    /// Drawn by the user in the editor; not part of the task model
    UserDefined,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub style: EdgeStyle,
    pub label: Option<String>,
}

impl FlowEdge {
    fn between(source: &FlowNode, source_task: Option<&Task>, target: &FlowNode) -> Self {
        let fan_out = source_task
            .and_then(Task::for_each)
            .filter(|_| target.is_task());

        Self {
            id: edge_id(&source.id, &target.id),
            source: source.id.clone(),
            target: target.id.clone(),
            style: if fan_out.is_some() {
                EdgeStyle::FanOut
            } else {
                EdgeStyle::Sequential
            },
            label: fan_out.map(|field| format!("for each: {}", field)),
        }
    }
}

/// Renderable graph of a pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

/// Node id for a task
pub fn task_node_id(task_id: &str) -> String {
    format!("task:{}", task_id)
}

/// First id of the form `task:<id>`, `task:<id>#2`, `task:<id>#3`, ... not in `used`
fn unique_task_node_id(task_id: &str, used: &HashSet<String>) -> String {
    let base = task_node_id(task_id);
    let mut id = base.clone();
    let mut occurrence = 1;
    while used.contains(&id) {
        occurrence += 1;
        id = format!("{}#{}", base, occurrence);
    }
    id
}

fn edge_id(source: &str, target: &str) -> String {
    format!("{}->{}", source, target)
}

/// Derive the flow graph for an ordered task list
///
/// An empty list yields an empty graph; callers render [`EMPTY_PLACEHOLDER`].
pub fn derive_graph(tasks: &[Task]) -> FlowGraph {
    if tasks.is_empty() {
        return FlowGraph::default();
    }

    let mut seen = HashSet::new();
    let mut used = HashSet::new();
    let task_stops: Vec<(FlowNode, Option<&Task>)> = tasks
        .iter()
        .enumerate()
        .map(|(index, task)| {
            if !seen.insert(task.id.as_str()) {
                tracing::warn!("Duplicate task id '{}' in pipeline graph", task.id);
            }
            let id = unique_task_node_id(&task.id, &used);
            used.insert(id.clone());
            (FlowNode::for_task(id, index, task), Some(task))
        })
        .collect();

    let stops: Vec<(FlowNode, Option<&Task>)> = iter::once((FlowNode::start(), None))
        .chain(task_stops)
        .chain(iter::once((FlowNode::end(tasks.len() + 1), None)))
        .collect();

    let edges = stops
        .windows(2)
        .map(|pair| {
            let (source, source_task) = &pair[0];
            let (target, _) = &pair[1];
            FlowEdge::between(source, *source_task, target)
        })
        .collect();

    FlowGraph {
        nodes: stops.into_iter().map(|(node, _)| node).collect(),
        edges,
    }
}

impl FlowGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The edge entering the given node, following the sequential chain
    pub fn incoming_edge(&self, node_id: &str) -> Option<&FlowEdge> {
        self.edges
            .iter()
            .find(|e| e.target == node_id && e.style != EdgeStyle::UserDefined)
    }

    /// Add a user-drawn edge to the rendered graph
    ///
    /// The edge lives only in this graph; it is never written back to the task
    /// list. Returns `false` when either endpoint is unknown or the edge exists.
    pub fn connect(&mut self, source: &str, target: &str) -> bool {
        if self.node(source).is_none() || self.node(target).is_none() {
            return false;
        }
        let id = format!("user:{}", edge_id(source, target));
        if self.edges.iter().any(|e| e.id == id) {
            return false;
        }
        self.edges.push(FlowEdge {
            id,
            source: source.to_string(),
            target: target.to_string(),
            style: EdgeStyle::UserDefined,
            label: None,
        });
        true
    }

    /// Console rendering, top to bottom
    pub fn render_text(&self) -> String {
        if self.is_empty() {
            return EMPTY_PLACEHOLDER.to_string();
        }

        let mut out = String::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                match self.incoming_edge(&node.id) {
                    Some(edge) if edge.style == EdgeStyle::FanOut => {
                        let label = edge.label.as_deref().unwrap_or("for each");
                        let _ = writeln!(out, "  │ {}", label);
                        let _ = writeln!(out, "  ⇊");
                    }
                    _ => {
                        let _ = writeln!(out, "  │");
                        let _ = writeln!(out, "  ▼");
                    }
                }
            }
            let _ = writeln!(out, "{}", node.label);
        }

        for edge in self.edges.iter().filter(|e| e.style == EdgeStyle::UserDefined) {
            let _ = writeln!(out, "(user edge) {} → {}", edge.source, edge.target);
        }

        out
    }
}
