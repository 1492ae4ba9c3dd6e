//! Hierarchical step layout engine
//!
//! Places steps in two phases:
//!
//! 1. A tree pass over the forest formed by each step's single
//!    `parent_step_id`. Children are centered below their parent in branch
//!    order (`then`, `sequential`, `else`) and sibling subtrees are pushed
//!    apart by a running x cursor so they never overlap. Convergence points
//!    reserve no width here since phase 2 repositions them.
//! 2. A bounded relaxation pass for convergence points (steps with more than
//!    one inbound edge). Each is moved, together with its tree subtree, to
//!    the horizontal midpoint of its parents and just below the lowest one.
//!    Points that share one parent set are spread around that midpoint at
//!    sibling spacing instead of stacking.
//!    Relaxation stops once no step moves by more than the tolerance or the
//!    pass limit is reached. Hitting the limit leaves the layout valid but
//!    possibly not perfectly centered.

use std::collections::HashMap;

use log::{debug, trace};

use tracery_core::{geometry::Point, step::StepGraph};

use crate::{
    config::LayoutConfig,
    layout::{Layout, engines::StepEngine, sizing::HeightMap, topology::Topology},
};

/// Tree placement followed by convergence relaxation.
#[derive(Debug, Clone)]
pub struct Engine {
    step_width: f32,
    horizontal_spacing: f32,
    vertical_gap: f32,
    max_relaxation_passes: usize,
    relaxation_tolerance: f32,
    default_position: Point,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create a new hierarchical engine with the default layout settings
    pub fn new() -> Self {
        let defaults = LayoutConfig::default();
        Self {
            step_width: defaults.step_width(),
            horizontal_spacing: defaults.horizontal_spacing(),
            vertical_gap: defaults.vertical_gap(),
            max_relaxation_passes: defaults.max_relaxation_passes(),
            relaxation_tolerance: defaults.relaxation_tolerance(),
            default_position: defaults.default_position(),
        }
    }

    /// Set the shared width of every step box
    pub fn set_step_width(&mut self, width: f32) -> &mut Self {
        self.step_width = width;
        self
    }

    /// Set the center-to-center distance between siblings
    pub fn set_horizontal_spacing(&mut self, spacing: f32) -> &mut Self {
        self.horizontal_spacing = spacing;
        self
    }

    /// Set the gap between a step's bottom edge and its children
    pub fn set_vertical_gap(&mut self, gap: f32) -> &mut Self {
        self.vertical_gap = gap;
        self
    }

    /// Set the upper bound on relaxation passes
    pub fn set_max_relaxation_passes(&mut self, passes: usize) -> &mut Self {
        self.max_relaxation_passes = passes;
        self
    }

    /// Set the movement below which relaxation counts as settled
    pub fn set_relaxation_tolerance(&mut self, tolerance: f32) -> &mut Self {
        self.relaxation_tolerance = tolerance;
        self
    }

    /// Set the position of steps the tree pass never reaches
    pub fn set_default_position(&mut self, position: Point) -> &mut Self {
        self.default_position = position;
        self
    }

    /// Re-runs convergence relaxation over an existing layout.
    ///
    /// Steps of `graph` missing from `layout` start at the default position.
    /// Returns the number of passes performed; zero when `graph` has no
    /// convergence points.
    pub fn relax_convergence(&self, graph: &StepGraph, layout: &mut Layout) -> usize {
        let topology = Topology::new(graph);
        let heights: Vec<f32> = graph
            .steps
            .iter()
            .map(|step| layout.height(&step.id).unwrap_or_default())
            .collect();
        let mut positions: Vec<Point> = graph
            .steps
            .iter()
            .map(|step| layout.position(&step.id).unwrap_or(self.default_position))
            .collect();

        let passes = self.relax(&topology, &heights, &mut positions);

        for (step, position) in graph.steps.iter().zip(positions) {
            layout.insert(step.id.clone(), position);
        }
        passes
    }

    fn relax(&self, topology: &Topology, heights: &[f32], positions: &mut [Point]) -> usize {
        let slots = convergence_slots(topology);
        if slots.is_empty() {
            return 0;
        }

        let mut passes = 0;
        let mut max_delta = f32::INFINITY;
        while passes < self.max_relaxation_passes && max_delta > self.relaxation_tolerance {
            passes += 1;
            max_delta = 0.0;

            for &(idx, rank, count) in &slots {
                let spread = Point::new(self.sibling_offset(rank, count), 0.0);
                let target = self
                    .convergence_target(topology.parents(idx), heights, positions)
                    .add_point(spread);
                let current = positions[idx];
                let distance = current.max_axis_distance(target);
                if distance > 0.0 {
                    let delta = target.sub_point(current);
                    for member in topology.subtree(idx) {
                        positions[member] = positions[member].add_point(delta);
                    }
                }
                max_delta = max_delta.max(distance);
            }

            trace!(pass = passes, max_delta; "Convergence relaxation pass");
        }

        if max_delta > self.relaxation_tolerance {
            debug!(
                passes,
                max_delta;
                "Convergence relaxation stopped at the pass limit before settling"
            );
        }

        passes
    }

    /// Midpoint of the parents' x-extents, one gap below the lowest parent.
    fn convergence_target(
        &self,
        parents: &[usize],
        heights: &[f32],
        positions: &[Point],
    ) -> Point {
        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut bottom = f32::NEG_INFINITY;
        for &parent in parents {
            let position = positions[parent];
            min_x = min_x.min(position.x());
            max_x = max_x.max(position.x() + self.step_width);
            bottom = bottom.max(position.y() + heights[parent]);
        }

        let center = (min_x + max_x) / 2.0;
        Point::new(center - self.step_width / 2.0, bottom + self.vertical_gap)
    }

    /// Horizontal offset of sibling `index` out of `count`, centered on zero.
    fn sibling_offset(&self, index: usize, count: usize) -> f32 {
        (index as f32 - (count as f32 - 1.0) / 2.0) * self.horizontal_spacing
    }
}

/// Convergence points in input order as `(step, rank, count)`.
///
/// Points sharing the exact same parent set (parallel calls after a branch)
/// form one group and are spread around the shared midpoint by `rank`.
fn convergence_slots(topology: &Topology) -> Vec<(usize, usize, usize)> {
    let mut counts: HashMap<Vec<usize>, usize> = HashMap::new();
    let mut ranked = Vec::new();
    for idx in topology.convergence_points() {
        let mut key = topology.parents(idx).to_vec();
        key.sort_unstable();
        let count = counts.entry(key.clone()).or_default();
        ranked.push((idx, *count, key));
        *count += 1;
    }

    ranked
        .into_iter()
        .map(|(idx, rank, key)| (idx, rank, counts.get(&key).copied().unwrap_or(1)))
        .collect()
}

impl StepEngine for Engine {
    fn calculate(&self, graph: &StepGraph, heights: &HeightMap) -> Layout {
        let topology = Topology::new(graph);
        let step_heights: Vec<f32> = graph
            .steps
            .iter()
            .map(|step| heights.get(&step.id).copied().unwrap_or_default())
            .collect();

        let placed = self.place_tree(graph, &topology, &step_heights);

        let unplaced = placed.iter().filter(|p| p.is_none()).count();
        if unplaced > 0 {
            debug!(unplaced; "Steps unreachable from any root get the default position");
        }

        let mut positions: Vec<Point> = placed
            .into_iter()
            .map(|position| position.unwrap_or(self.default_position))
            .collect();

        let passes = self.relax(&topology, &step_heights, &mut positions);
        trace!(passes; "Hierarchical layout finished");

        let mut layout = Layout::new(self.step_width, heights.clone());
        for (step, position) in graph.steps.iter().zip(positions) {
            layout.insert(step.id.clone(), position);
        }
        layout
    }
}

impl Engine {
    /// Tree pass over the `parent_step_id` forest.
    ///
    /// Runs without recursion: a preorder walk claims each step for one tree
    /// parent, a reverse sweep fits sibling subtrees left to right relative to
    /// their parent, and a forward sweep turns the offsets into positions.
    /// Steps never reached stay `None`.
    fn place_tree(
        &self,
        graph: &StepGraph,
        topology: &Topology,
        heights: &[f32],
    ) -> Vec<Option<Point>> {
        let len = topology.len();
        let mut visited = vec![false; len];
        let mut preorder = Vec::with_capacity(len);
        let mut tree_parent: Vec<Option<usize>> = vec![None; len];
        let mut tree_children: Vec<Vec<usize>> = vec![Vec::new(); len];
        let mut roots = Vec::new();

        let mut stack: Vec<(usize, Option<usize>)> =
            topology.roots().iter().rev().map(|&root| (root, None)).collect();
        while let Some((idx, parent)) = stack.pop() {
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            preorder.push(idx);
            tree_parent[idx] = parent;
            match parent {
                Some(parent) => tree_children[parent].push(idx),
                None => roots.push(idx),
            }

            let mut children: Vec<usize> = topology
                .children(idx)
                .iter()
                .copied()
                .filter(|&child| !visited[child])
                .collect();
            children.sort_by_key(|&child| graph.steps[child].branch_type.precedence());
            stack.extend(children.into_iter().rev().map(|child| (child, Some(idx))));
        }

        // Offsets are relative to the tree parent; extents are the left-edge
        // range of a subtree relative to its own root.
        let mut offsets = vec![0.0; len];
        let mut extents = vec![(0.0, 0.0); len];
        for &idx in preorder.iter().rev() {
            let extent = self.fit_siblings(
                &tree_children[idx],
                topology,
                &extents,
                &mut offsets,
                true,
            );
            extents[idx] = extent;
        }
        self.fit_siblings(&roots, topology, &extents, &mut offsets, false);

        let mut positions: Vec<Option<Point>> = vec![None; len];
        for &idx in &preorder {
            // Preorder puts every tree parent before its children.
            let position = match tree_parent[idx] {
                Some(parent) => {
                    let origin = positions[parent].unwrap_or_default();
                    Point::new(
                        origin.x() + offsets[idx],
                        origin.y() + heights[parent] + self.vertical_gap,
                    )
                }
                None => Point::new(offsets[idx], 0.0),
            };
            positions[idx] = Some(position);
        }
        positions
    }

    /// Assigns x offsets to one sibling row and returns the row's extent.
    ///
    /// Siblings start at their nominal slot (centered around zero when
    /// `centered`, otherwise all at zero) and are pushed right until they
    /// clear the previous sibling's subtree by the horizontal spacing.
    /// Convergence points sit at offset zero and take no room; relaxation
    /// places them.
    fn fit_siblings(
        &self,
        siblings: &[usize],
        topology: &Topology,
        extents: &[(f32, f32)],
        offsets: &mut [f32],
        centered: bool,
    ) -> (f32, f32) {
        let (converging, spread): (Vec<usize>, Vec<usize>) = siblings
            .iter()
            .copied()
            .partition(|&idx| topology.parents(idx).len() > 1);

        let count = spread.len();
        let mut extent = (0.0_f32, 0.0_f32);
        let mut cursor: Option<f32> = None;
        for (i, &idx) in spread.iter().enumerate() {
            let (min_x, max_x) = extents[idx];
            let mut x = if centered {
                self.sibling_offset(i, count)
            } else {
                0.0
            };
            if let Some(cursor) = cursor {
                if x + min_x < cursor {
                    x = cursor - min_x;
                }
            }
            cursor = Some(x + max_x + self.horizontal_spacing);
            offsets[idx] = x;
            extent = (extent.0.min(x + min_x), extent.1.max(x + max_x));
        }

        for idx in converging {
            offsets[idx] = 0.0;
        }
        extent
    }
}
