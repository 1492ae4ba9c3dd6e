//! Structural checks for extracted step graphs.
//!
//! Extraction always produces a well-formed graph. These checks exist for
//! graphs that arrive from elsewhere (deserialized, hand-built or edited)
//! before they are handed to a layout engine.

use std::collections::{HashMap, HashSet};

use log::debug;
use petgraph::{algo, graphmap::DiGraphMap};
use thiserror::Error;

use tracery_core::{
    step::{StepGraph, StepId},
    workflow::{BubbleTable, VariableId},
};

/// A violated step-graph invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("step `{0}` is defined more than once")]
    DuplicateStep(StepId),

    #[error("edge `{source_step}` -> `{target_step}` references an unknown step")]
    DanglingEdge {
        source_step: StepId,
        target_step: StepId,
    },

    #[error("step `{0}` has an edge to itself")]
    SelfLoop(StepId),

    #[error("step `{step}` references unknown bubble {bubble}")]
    UnknownBubble { step: StepId, bubble: VariableId },

    #[error("bubble {bubble} is attributed to both `{first}` and `{second}`")]
    SharedBubble {
        bubble: VariableId,
        first: StepId,
        second: StepId,
    },

    #[error("step graph contains a cycle through `{0}`")]
    Cycle(StepId),
}

/// Checks that `graph` is a DAG over unique steps whose bubbles come from
/// `bubbles` and are owned by at most one step.
///
/// # Errors
///
/// Returns the first [`GraphError`] found.
pub fn validate(graph: &StepGraph, bubbles: &BubbleTable) -> Result<(), GraphError> {
    let mut known: HashSet<&str> = HashSet::with_capacity(graph.steps.len());
    let mut owners: HashMap<VariableId, &str> = HashMap::new();
    let mut dag: DiGraphMap<&str, ()> =
        DiGraphMap::with_capacity(graph.steps.len(), graph.edges.len());

    for step in &graph.steps {
        if !known.insert(step.id.as_str()) {
            return Err(GraphError::DuplicateStep(step.id.clone()));
        }
        dag.add_node(step.id.as_str());

        for &bubble in &step.bubble_ids {
            if !bubbles.contains_key(&bubble) {
                return Err(GraphError::UnknownBubble {
                    step: step.id.clone(),
                    bubble,
                });
            }
            if step.is_transformation {
                continue;
            }
            if let Some(first) = owners.insert(bubble, step.id.as_str()) {
                return Err(GraphError::SharedBubble {
                    bubble,
                    first: first.to_string(),
                    second: step.id.clone(),
                });
            }
        }
    }

    for edge in &graph.edges {
        let source = edge.source_step_id.as_str();
        let target = edge.target_step_id.as_str();

        if !known.contains(source) || !known.contains(target) {
            return Err(GraphError::DanglingEdge {
                source_step: edge.source_step_id.clone(),
                target_step: edge.target_step_id.clone(),
            });
        }
        if source == target {
            return Err(GraphError::SelfLoop(edge.source_step_id.clone()));
        }
        // Repeated edges collapse onto one graphmap edge.
        dag.add_edge(source, target, ());
    }

    algo::toposort(&dag, None)
        .map_err(|cycle| GraphError::Cycle(cycle.node_id().to_string()))?;

    debug!(
        steps_count = graph.steps.len(),
        edges_count = graph.edges.len();
        "Step graph validated"
    );

    Ok(())
}
