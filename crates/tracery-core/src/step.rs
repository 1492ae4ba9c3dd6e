//! Output model: steps, edges and the step graph.

use serde::{Deserialize, Serialize};

use crate::workflow::{Location, VariableId};

/// Opaque step identifier, unique within one extraction call.
pub type StepId = String;

/// Classification of a step or edge relative to the branch it sits in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchType {
    Then,
    Else,
    #[default]
    Sequential,
}

impl BranchType {
    /// Ordering key for laying out siblings: `then` left of `sequential`,
    /// `sequential` left of `else`.
    pub fn precedence(self) -> u8 {
        match self {
            BranchType::Then => 0,
            BranchType::Sequential => 1,
            BranchType::Else => 2,
        }
    }
}

/// Kind of control transfer an edge represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    #[default]
    Sequential,
    Conditional,
}

/// Code and variable binding carried by a transformation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationData {
    pub code: String,
    pub arguments: String,
    pub variable_id: VariableId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
}

/// A coarse-grained node of the step graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepData {
    pub id: StepId,
    pub function_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_async: bool,
    pub location: Location,
    pub bubble_ids: Vec<VariableId>,
    /// Topological depth, used as the layout row.
    pub level: u32,
    /// First inbound parent only; the edge list carries the full parent set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_step_id: Option<StepId>,
    pub branch_type: BranchType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_label: Option<String>,
    pub is_transformation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation_data: Option<TransformationData>,
}

/// A directed edge between two steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepEdge {
    pub source_step_id: StepId,
    pub target_step_id: StepId,
    pub edge_type: EdgeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub branch_type: BranchType,
}

/// Steps and edges extracted from one workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepGraph {
    pub steps: Vec<StepData>,
    pub edges: Vec<StepEdge>,
}

impl StepGraph {
    pub fn new(steps: Vec<StepData>, edges: Vec<StepEdge>) -> Self {
        Self { steps, edges }
    }

    /// Returns true when the graph has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Looks up a step by id.
    pub fn step(&self, id: &str) -> Option<&StepData> {
        self.steps.iter().find(|step| step.id == id)
    }

    /// Returns the edges whose target is `id`, in insertion order.
    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a StepEdge> + 'a {
        self.edges
            .iter()
            .filter(move |edge| edge.target_step_id == id)
    }

    /// Returns the edges whose source is `id`, in insertion order.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a StepEdge> + 'a {
        self.edges
            .iter()
            .filter(move |edge| edge.source_step_id == id)
    }
}
