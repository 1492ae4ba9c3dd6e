//! Input model: the parsed workflow tree and its bubble table.
//!
//! These types mirror the JSON produced by the upstream workflow parser.
//! Node kinds form a closed set, so every consumer matches exhaustively and a
//! new kind is a compile error until each consumer handles it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier of a bubble (an external integration call) in the source.
pub type VariableId = i64;

/// The flat bubble table, keyed by variable id.
///
/// A `BTreeMap` keeps iteration ordered by id so that every traversal over
/// the table is deterministic.
pub type BubbleTable = BTreeMap<VariableId, BubbleInfo>;

/// Inclusive source line range of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub start_line: u32,
    pub end_line: u32,
}

impl Location {
    pub fn new(start_line: u32, end_line: u32) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    /// Returns true when `other` lies fully within this range.
    pub fn contains(&self, other: &Location) -> bool {
        self.start_line <= other.start_line && other.end_line <= self.end_line
    }

    /// Returns the smallest range covering both locations.
    pub fn span(&self, other: &Location) -> Location {
        Location {
            start_line: self.start_line.min(other.start_line),
            end_line: self.end_line.max(other.end_line),
        }
    }
}

/// One workflow tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkflowNode {
    #[serde(rename = "function_call")]
    FunctionCall(FunctionCallNode),
    #[serde(rename = "transformation_function")]
    Transformation(TransformationNode),
    #[serde(rename = "if")]
    If(IfNode),
    #[serde(rename = "for")]
    For(LoopNode),
    #[serde(rename = "while")]
    While(LoopNode),
    #[serde(rename = "parallel_execution")]
    Parallel(ParallelNode),
    #[serde(rename = "bubble")]
    Bubble(BubbleRef),
    #[serde(rename = "try_catch")]
    TryCatch(TryCatchNode),
}

impl WorkflowNode {
    /// Source location of the node.
    pub fn location(&self) -> Location {
        match self {
            WorkflowNode::FunctionCall(node) => node.location,
            WorkflowNode::Transformation(node) => node.location,
            WorkflowNode::If(node) => node.location,
            WorkflowNode::For(node) | WorkflowNode::While(node) => node.location,
            WorkflowNode::Parallel(node) => node.location,
            WorkflowNode::Bubble(node) => node.location,
            WorkflowNode::TryCatch(node) => node.location,
        }
    }

    /// Shorthand for a bubble reference node.
    pub fn bubble(variable_id: VariableId, location: Location) -> Self {
        WorkflowNode::Bubble(BubbleRef {
            variable_id,
            location,
        })
    }
}

/// Definition site of the method a call resolves to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDefinition {
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
}

impl MethodDefinition {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            ..Self::default()
        }
    }
}

/// A call to a user-defined function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallNode {
    pub function_name: String,
    #[serde(default)]
    pub method_definition: Option<MethodDefinition>,
    #[serde(default)]
    pub children: Vec<WorkflowNode>,
    #[serde(default)]
    pub location: Location,
    /// True for a direct `this.method()` style invocation.
    #[serde(default)]
    pub is_method_call: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl FunctionCallNode {
    /// A call resolving to a method defined at `definition`.
    pub fn new(function_name: impl Into<String>, definition: Location) -> Self {
        Self {
            function_name: function_name.into(),
            method_definition: Some(MethodDefinition::new(definition)),
            ..Self::default()
        }
    }

    /// Replaces the children of this call (builder style).
    pub fn with_children(mut self, children: Vec<WorkflowNode>) -> Self {
        self.children = children;
        self
    }
}

/// Inline data-mapping code bound to a variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationNode {
    pub function_name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub arguments: String,
    pub variable_id: VariableId,
    #[serde(default)]
    pub variable_name: Option<String>,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub description: Option<String>,
}

/// A conditional with a then-branch in `children` and an optional else-branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IfNode {
    pub condition: String,
    #[serde(default)]
    pub children: Vec<WorkflowNode>,
    #[serde(default)]
    pub else_branch: Option<Vec<WorkflowNode>>,
    #[serde(default)]
    pub location: Location,
}

impl IfNode {
    /// Returns the nested `if` when the else-branch is exactly one `if` node,
    /// which is how an `else if` is represented.
    pub fn else_if(&self) -> Option<&IfNode> {
        match self.else_branch.as_deref() {
            Some([WorkflowNode::If(nested)]) => Some(nested),
            _ => None,
        }
    }
}

/// Body of a `for` or `while` loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopNode {
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub children: Vec<WorkflowNode>,
    #[serde(default)]
    pub location: Location,
}

/// Sibling nodes executed concurrently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelNode {
    #[serde(default)]
    pub children: Vec<WorkflowNode>,
    #[serde(default)]
    pub location: Location,
}

/// Leaf reference to a bubble by variable id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleRef {
    pub variable_id: VariableId,
    #[serde(default)]
    pub location: Location,
}

/// A `try` body with an optional `catch` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TryCatchNode {
    #[serde(default)]
    pub children: Vec<WorkflowNode>,
    #[serde(default)]
    pub catch_block: Option<Vec<WorkflowNode>>,
    #[serde(default)]
    pub location: Location,
}

/// One entry of the bubble table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleInfo {
    pub variable_id: VariableId,
    #[serde(default)]
    pub variable_name: Option<String>,
    #[serde(default)]
    pub bubble_name: Option<String>,
    #[serde(default)]
    pub location: Location,
    /// Set when this record duplicates another bubble for a specific call site.
    #[serde(default)]
    pub cloned_from_variable_id: Option<VariableId>,
}

impl BubbleInfo {
    pub fn new(variable_id: VariableId, location: Location) -> Self {
        Self {
            variable_id,
            location,
            ..Self::default()
        }
    }

    /// Returns true for per-call-site clones of another bubble.
    pub fn is_clone(&self) -> bool {
        self.cloned_from_variable_id.is_some()
    }
}

/// Everything the upstream parser hands over for one workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInput {
    /// Root nodes of the workflow body; absent when parsing found none.
    #[serde(default)]
    pub workflow: Option<Vec<WorkflowNode>>,
    #[serde(default)]
    pub bubbles: BubbleTable,
}
