//! Step-graph extraction.
//!
//! Walks a workflow tree once, depth first, and turns it into a step-level
//! DAG. The traversal carries a [`Frontier`] (the dangling step outputs the
//! next step connects from) and a branch context describing how the edges
//! into the next step should be labeled.
//!
//! Control-flow constructs never become steps themselves. They shape the
//! frontier instead:
//!
//! - branches of an `if` start from the same frontier and their ends are
//!   merged afterwards, so the step following the conditional receives one
//!   edge per branch end;
//! - an `else if` continues the chain from the same frontier instead of
//!   nesting a new level;
//! - a loop may run zero times, so its exit merges the pre-loop frontier with
//!   the end of its body;
//! - every call in a parallel block fans out from the same frontier and the
//!   block ends on the union of the siblings.

mod bubbles;
mod frontier;

use log::{debug, trace};

use tracery_core::{
    step::{BranchType, EdgeType, StepData, StepEdge, StepGraph, StepId, TransformationData},
    workflow::{
        BubbleTable, FunctionCallNode, IfNode, LoopNode, ParallelNode, TransformationNode,
        TryCatchNode, WorkflowNode,
    },
};

use bubbles::BubbleAttribution;
use frontier::Frontier;

/// Id of the synthesized step holding top-level bubbles.
pub const MAIN_STEP_ID: &str = "step-main";

/// Extracts the step graph of a workflow.
///
/// Returns an empty graph when `root` is absent or empty. Nodes that cannot
/// be interpreted (a call without a method definition) are skipped together
/// with their subtree.
pub fn extract_step_graph(root: Option<&[WorkflowNode]>, bubbles: &BubbleTable) -> StepGraph {
    match root {
        Some(root) if !root.is_empty() => StepGraphBuilder::new(root, bubbles).build(),
        _ => {
            debug!("Workflow has no root nodes; returning an empty step graph");
            StepGraph::default()
        }
    }
}

/// How the edges into the next created step are classified.
#[derive(Debug, Clone, Default)]
struct BranchContext {
    branch_type: BranchType,
    label: Option<String>,
}

impl BranchContext {
    fn sequential() -> Self {
        Self::default()
    }

    fn branch(branch_type: BranchType, label: impl Into<String>) -> Self {
        Self {
            branch_type,
            label: Some(label.into()),
        }
    }

    fn edge_type(&self) -> EdgeType {
        if self.label.is_some() || self.branch_type != BranchType::Sequential {
            EdgeType::Conditional
        } else {
            EdgeType::Sequential
        }
    }
}

/// Single-use builder turning one workflow tree into a [`StepGraph`].
pub struct StepGraphBuilder<'a> {
    root: &'a [WorkflowNode],
    attribution: BubbleAttribution<'a>,
    steps: Vec<StepData>,
    edges: Vec<StepEdge>,
    next_id: usize,
}

impl<'a> StepGraphBuilder<'a> {
    pub fn new(root: &'a [WorkflowNode], bubbles: &'a BubbleTable) -> Self {
        Self {
            root,
            attribution: BubbleAttribution::new(bubbles, root),
            steps: Vec::new(),
            edges: Vec::new(),
            next_id: 0,
        }
    }

    /// Runs the traversal and returns the finished graph.
    pub fn build(mut self) -> StepGraph {
        let root = self.root;
        self.process_nodes(root, Frontier::root(), BranchContext::sequential());
        self.synthesize_main_step();

        debug!(
            steps_count = self.steps.len(),
            edges_count = self.edges.len();
            "Step graph extracted"
        );

        StepGraph::new(self.steps, self.edges)
    }

    /// Processes a sibling sequence, threading the frontier through it.
    ///
    /// The branch context labels the edges into the first step created; every
    /// later step of the sequence is plain sequential flow.
    fn process_nodes(
        &mut self,
        nodes: &[WorkflowNode],
        mut frontier: Frontier,
        mut context: BranchContext,
    ) -> Frontier {
        for node in nodes {
            let steps_before = self.steps.len();
            frontier = self.process_node(node, frontier, &context);
            if self.steps.len() > steps_before {
                context = BranchContext::sequential();
            }
        }
        frontier
    }

    /// Processes a branch body, returning its end frontier only when the
    /// branch created at least one step.
    fn process_branch(
        &mut self,
        nodes: &[WorkflowNode],
        frontier: &Frontier,
        context: BranchContext,
    ) -> Option<Frontier> {
        let steps_before = self.steps.len();
        let end = self.process_nodes(nodes, frontier.clone(), context);
        (self.steps.len() > steps_before).then_some(end)
    }

    fn process_node(
        &mut self,
        node: &WorkflowNode,
        frontier: Frontier,
        context: &BranchContext,
    ) -> Frontier {
        match node {
            WorkflowNode::FunctionCall(call) => self.process_call(call, frontier, context),
            WorkflowNode::Transformation(transformation) => {
                self.process_transformation(transformation, frontier, context)
            }
            WorkflowNode::If(node) => self.process_if(node, frontier, false),
            WorkflowNode::For(node) | WorkflowNode::While(node) => {
                self.process_loop(node, frontier)
            }
            WorkflowNode::Parallel(node) => self.process_parallel(node, frontier, context),
            WorkflowNode::TryCatch(node) => self.process_try_catch(node, frontier, context),
            WorkflowNode::Bubble(_) => frontier,
        }
    }

    fn process_call(
        &mut self,
        call: &FunctionCallNode,
        frontier: Frontier,
        context: &BranchContext,
    ) -> Frontier {
        let Some(definition) = &call.method_definition else {
            trace!(function_name = call.function_name; "Skipping call without method definition");
            return frontier;
        };

        let bubble_ids = self.attribution.claim_for_call(call, definition);
        let step_id = self.push_step(
            &frontier,
            context,
            StepData {
                function_name: call.function_name.clone(),
                description: definition
                    .description
                    .clone()
                    .or_else(|| call.description.clone()),
                is_async: definition.is_async,
                location: definition.location,
                bubble_ids,
                ..StepData::default()
            },
        );

        let own = Frontier::single(frontier.level() + 1, step_id);
        if call.children.is_empty() {
            own
        } else {
            self.process_nodes(&call.children, own, BranchContext::sequential())
        }
    }

    fn process_transformation(
        &mut self,
        transformation: &TransformationNode,
        frontier: Frontier,
        context: &BranchContext,
    ) -> Frontier {
        let step_id = self.push_step(
            &frontier,
            context,
            StepData {
                function_name: transformation.function_name.clone(),
                description: transformation.description.clone(),
                is_async: transformation.is_async,
                location: transformation.location,
                is_transformation: true,
                transformation_data: Some(TransformationData {
                    code: transformation.code.clone(),
                    arguments: transformation.arguments.clone(),
                    variable_id: transformation.variable_id,
                    variable_name: transformation.variable_name.clone(),
                }),
                ..StepData::default()
            },
        );

        Frontier::single(frontier.level() + 1, step_id)
    }

    fn process_if(&mut self, node: &IfNode, frontier: Frontier, is_else_if: bool) -> Frontier {
        let keyword = if is_else_if { "else if" } else { "if" };
        let then_context =
            BranchContext::branch(BranchType::Then, format!("{keyword} {}", node.condition));

        let mut ends = Vec::with_capacity(2);
        ends.extend(self.process_branch(&node.children, &frontier, then_context));

        if let Some(nested) = node.else_if() {
            let steps_before = self.steps.len();
            let end = self.process_if(nested, frontier.clone(), true);
            if self.steps.len() > steps_before {
                ends.push(end);
            }
        } else if let Some(else_branch) = node.else_branch.as_deref() {
            let else_context = BranchContext::branch(BranchType::Else, "else");
            ends.extend(self.process_branch(else_branch, &frontier, else_context));
        }

        Frontier::merge(ends).unwrap_or_else(|| {
            // Both branches were empty: nothing records that the conditional existed.
            debug!(condition = node.condition; "Conditional produced no steps");
            frontier
        })
    }

    fn process_loop(&mut self, node: &LoopNode, frontier: Frontier) -> Frontier {
        let body_end =
            self.process_nodes(&node.children, frontier.clone(), BranchContext::sequential());
        frontier.union(body_end)
    }

    fn process_parallel(
        &mut self,
        node: &ParallelNode,
        frontier: Frontier,
        context: &BranchContext,
    ) -> Frontier {
        let mut ends = Vec::with_capacity(node.children.len());

        for child in &node.children {
            match child {
                WorkflowNode::FunctionCall(call) => {
                    let steps_before = self.steps.len();
                    let end = self.process_call(call, frontier.clone(), context);
                    if self.steps.len() > steps_before {
                        ends.push(end);
                    }
                }
                other => {
                    trace!(location:? = other.location(); "Ignoring non-call child of parallel block");
                }
            }
        }

        Frontier::merge(ends).unwrap_or(frontier)
    }

    fn process_try_catch(
        &mut self,
        node: &TryCatchNode,
        frontier: Frontier,
        context: &BranchContext,
    ) -> Frontier {
        let try_end = self.process_nodes(&node.children, frontier, context.clone());

        let catch_end = node.catch_block.as_deref().and_then(|catch_block| {
            let catch_context = BranchContext::branch(BranchType::Sequential, "catch");
            self.process_branch(catch_block, &try_end, catch_context)
        });

        match catch_end {
            Some(catch_end) => try_end.union(catch_end),
            None => try_end,
        }
    }

    /// Allocates a step at the frontier's level and connects every frontier
    /// parent to it.
    fn push_step(&mut self, frontier: &Frontier, context: &BranchContext, data: StepData) -> StepId {
        self.next_id += 1;
        let id = format!("step-{}", self.next_id);

        trace!(
            step_id = id,
            function_name = data.function_name,
            level = frontier.level();
            "Creating step"
        );

        self.steps.push(StepData {
            id: id.clone(),
            level: frontier.level(),
            parent_step_id: frontier.first_parent().cloned(),
            branch_type: context.branch_type,
            branch_label: context.label.clone(),
            ..data
        });

        for parent in frontier.parents() {
            debug_assert_ne!(parent, &id, "Step {id} cannot be its own parent");
            self.edges.push(StepEdge {
                source_step_id: parent.clone(),
                target_step_id: id.clone(),
                edge_type: context.edge_type(),
                label: context.label.clone(),
                branch_type: context.branch_type,
            });
        }

        id
    }

    /// Collects unowned, non-clone bubbles into a leading `step-main`.
    fn synthesize_main_step(&mut self) {
        let unattributed = self.attribution.unattributed();
        if unattributed.is_empty() {
            return;
        }

        let location = unattributed
            .iter()
            .map(|bubble| bubble.location)
            .reduce(|acc, location| acc.span(&location))
            .unwrap_or_default();

        debug!(bubbles_count = unattributed.len(); "Synthesizing main step for top-level bubbles");

        let main = StepData {
            id: MAIN_STEP_ID.to_string(),
            function_name: "main".to_string(),
            description: Some("Top-level bubble instantiations".to_string()),
            location,
            bubble_ids: unattributed
                .iter()
                .map(|bubble| bubble.variable_id)
                .collect(),
            ..StepData::default()
        };

        if let Some(first) = self.steps.first_mut() {
            if first.parent_step_id.is_none() {
                first.parent_step_id = Some(MAIN_STEP_ID.to_string());
            }
            let first_id = first.id.clone();

            for step in &mut self.steps {
                step.level += 1;
            }

            self.edges.insert(
                0,
                StepEdge {
                    source_step_id: MAIN_STEP_ID.to_string(),
                    target_step_id: first_id,
                    ..StepEdge::default()
                },
            );
        }

        self.steps.insert(0, main);
    }
}
