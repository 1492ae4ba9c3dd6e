//! Attribution of bubbles to steps.
//!
//! A bubble is owned by at most one function-call step. Ownership comes
//! first from `bubble` nodes nested under the call (through control flow but
//! not through other calls), and otherwise from line-range containment within
//! the called method's definition. Whatever is left over belongs to the
//! synthesized main step.

use std::collections::HashSet;

use log::trace;

use tracery_core::workflow::{
    BubbleInfo, BubbleTable, FunctionCallNode, MethodDefinition, VariableId, WorkflowNode,
};

pub(crate) struct BubbleAttribution<'a> {
    table: &'a BubbleTable,
    /// Every bubble id referenced by a `bubble` node anywhere in the tree.
    referenced: HashSet<VariableId>,
    /// Bubble ids already owned by a step.
    attributed: HashSet<VariableId>,
}

impl<'a> BubbleAttribution<'a> {
    pub(crate) fn new(table: &'a BubbleTable, root: &[WorkflowNode]) -> Self {
        let mut referenced = HashSet::new();
        collect_referenced(root, &mut referenced);

        Self {
            table,
            referenced,
            attributed: HashSet::new(),
        }
    }

    /// Claims the bubbles belonging to a function-call step.
    pub(crate) fn claim_for_call(
        &mut self,
        call: &FunctionCallNode,
        definition: &MethodDefinition,
    ) -> Vec<VariableId> {
        let mut nested = Vec::new();
        collect_nested(&call.children, &mut nested);

        let claimed = self.claim(nested);
        if !claimed.is_empty() || call.is_method_call {
            return claimed;
        }

        let contained: Vec<VariableId> = self
            .table
            .values()
            .filter(|bubble| {
                !bubble.is_clone()
                    && !self.referenced.contains(&bubble.variable_id)
                    && definition.location.contains(&bubble.location)
            })
            .map(|bubble| bubble.variable_id)
            .collect();

        if !contained.is_empty() {
            trace!(
                function_name = call.function_name,
                bubbles_count = contained.len();
                "Attributing bubbles by line-range containment"
            );
        }

        self.claim(contained)
    }

    /// Bubbles that no step owns, excluding clones, in table order.
    pub(crate) fn unattributed(&self) -> Vec<&'a BubbleInfo> {
        let table: &'a BubbleTable = self.table;
        table
            .values()
            .filter(|bubble| !bubble.is_clone() && !self.attributed.contains(&bubble.variable_id))
            .collect()
    }

    /// Marks the known, still unowned candidates as owned and returns them.
    fn claim(&mut self, candidates: Vec<VariableId>) -> Vec<VariableId> {
        let mut claimed = Vec::new();
        for id in candidates {
            if self.table.contains_key(&id) && self.attributed.insert(id) {
                claimed.push(id);
            }
        }
        claimed
    }
}

/// Collects bubble references nested under a call's children.
///
/// Descends through conditionals, loops, parallel blocks and catch blocks;
/// stops at nested calls and transformations since those form their own steps.
fn collect_nested(nodes: &[WorkflowNode], out: &mut Vec<VariableId>) {
    for node in nodes {
        match node {
            WorkflowNode::Bubble(bubble) => out.push(bubble.variable_id),
            WorkflowNode::If(node) => {
                collect_nested(&node.children, out);
                if let Some(else_branch) = &node.else_branch {
                    collect_nested(else_branch, out);
                }
            }
            WorkflowNode::For(node) | WorkflowNode::While(node) => {
                collect_nested(&node.children, out)
            }
            WorkflowNode::Parallel(node) => collect_nested(&node.children, out),
            WorkflowNode::TryCatch(node) => {
                collect_nested(&node.children, out);
                if let Some(catch_block) = &node.catch_block {
                    collect_nested(catch_block, out);
                }
            }
            WorkflowNode::FunctionCall(_) | WorkflowNode::Transformation(_) => {}
        }
    }
}

/// Collects every bubble reference in the tree.
fn collect_referenced(nodes: &[WorkflowNode], out: &mut HashSet<VariableId>) {
    for node in nodes {
        match node {
            WorkflowNode::Bubble(bubble) => {
                out.insert(bubble.variable_id);
            }
            WorkflowNode::FunctionCall(node) => collect_referenced(&node.children, out),
            WorkflowNode::If(node) => {
                collect_referenced(&node.children, out);
                if let Some(else_branch) = &node.else_branch {
                    collect_referenced(else_branch, out);
                }
            }
            WorkflowNode::For(node) | WorkflowNode::While(node) => {
                collect_referenced(&node.children, out)
            }
            WorkflowNode::Parallel(node) => collect_referenced(&node.children, out),
            WorkflowNode::TryCatch(node) => {
                collect_referenced(&node.children, out);
                if let Some(catch_block) = &node.catch_block {
                    collect_referenced(catch_block, out);
                }
            }
            WorkflowNode::Transformation(_) => {}
        }
    }
}
