//! Index-based adjacency views over a [`StepGraph`].
//!
//! The step graph carries two notions of parenthood. `parent_step_id` names
//! exactly one parent and makes the steps a forest; the edge list names every
//! parent. They differ exactly at convergence points.

use std::collections::HashMap;

use petgraph::Direction;

use tracery_core::step::StepGraph;

#[derive(Debug)]
pub(crate) struct Topology {
    /// Tree children from `parent_step_id`, in step input order.
    children: Vec<Vec<usize>>,
    /// Every distinct edge source, in edge order.
    parents: Vec<Vec<usize>>,
    /// Every distinct edge target, in edge order.
    successors: Vec<Vec<usize>>,
    /// Steps without a `parent_step_id`, in input order.
    roots: Vec<usize>,
}

impl Topology {
    pub(crate) fn new(graph: &StepGraph) -> Self {
        let count = graph.steps.len();
        let index: HashMap<&str, usize> = graph
            .steps
            .iter()
            .enumerate()
            .map(|(idx, step)| (step.id.as_str(), idx))
            .collect();

        let mut children = vec![Vec::new(); count];
        let mut roots = Vec::new();
        for (idx, step) in graph.steps.iter().enumerate() {
            match step.parent_step_id.as_deref() {
                None => roots.push(idx),
                Some(parent) => {
                    // A parent id that names no step leaves this step unreachable.
                    if let Some(&parent_idx) = index.get(parent) {
                        children[parent_idx].push(idx);
                    }
                }
            }
        }

        let mut parents: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
        for edge in &graph.edges {
            let (Some(&source), Some(&target)) = (
                index.get(edge.source_step_id.as_str()),
                index.get(edge.target_step_id.as_str()),
            ) else {
                continue;
            };
            if !parents[target].contains(&source) {
                parents[target].push(source);
                successors[source].push(target);
            }
        }

        Self {
            children,
            parents,
            successors,
            roots,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn children(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    pub(crate) fn parents(&self, idx: usize) -> &[usize] {
        &self.parents[idx]
    }

    pub(crate) fn successors(&self, idx: usize) -> &[usize] {
        &self.successors[idx]
    }

    /// Edge parents for [`Direction::Incoming`], edge targets otherwise.
    pub(crate) fn neighbours(&self, idx: usize, direction: Direction) -> &[usize] {
        match direction {
            Direction::Incoming => self.parents(idx),
            Direction::Outgoing => self.successors(idx),
        }
    }

    pub(crate) fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Steps with more than one distinct parent edge.
    pub(crate) fn convergence_points(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|&idx| self.parents[idx].len() > 1)
    }

    /// `idx` followed by every tree descendant, each listed once.
    pub(crate) fn subtree(&self, idx: usize) -> Vec<usize> {
        let mut visited = vec![false; self.len()];
        let mut stack = vec![idx];
        let mut out = Vec::new();
        while let Some(current) = stack.pop() {
            if std::mem::replace(&mut visited[current], true) {
                continue;
            }
            out.push(current);
            stack.extend(self.children[current].iter().rev());
        }
        out
    }
}
