//! Layered step layout engine
//!
//! Rows come straight from each step's `level`. Within a row, steps are
//! ordered by a bounded number of barycenter sweeps that alternate between
//! pulling each step toward its edge parents and toward its edge targets.
//! Rows are centered on x = 0 and never overlap, so no relaxation is needed.

use std::collections::BTreeMap;

use log::trace;
use petgraph::Direction;

use tracery_core::{geometry::Point, step::StepGraph};

use crate::{
    config::LayoutConfig,
    layout::{Layout, engines::StepEngine, sizing::HeightMap, topology::Topology},
};

/// Level rows with barycenter ordering.
#[derive(Debug, Clone)]
pub struct Engine {
    step_width: f32,
    horizontal_spacing: f32,
    vertical_gap: f32,
    barycenter_sweeps: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create a new layered engine with the default layout settings
    pub fn new() -> Self {
        let defaults = LayoutConfig::default();
        Self {
            step_width: defaults.step_width(),
            horizontal_spacing: defaults.horizontal_spacing(),
            vertical_gap: defaults.vertical_gap(),
            barycenter_sweeps: defaults.barycenter_sweeps(),
        }
    }

    pub fn set_step_width(&mut self, width: f32) -> &mut Self {
        self.step_width = width;
        self
    }

    pub fn set_horizontal_spacing(&mut self, spacing: f32) -> &mut Self {
        self.horizontal_spacing = spacing;
        self
    }

    pub fn set_vertical_gap(&mut self, gap: f32) -> &mut Self {
        self.vertical_gap = gap;
        self
    }

    /// Set the number of ordering sweeps; zero keeps input order per row
    pub fn set_barycenter_sweeps(&mut self, sweeps: usize) -> &mut Self {
        self.barycenter_sweeps = sweeps;
        self
    }

    fn row_x(&self, index: usize, count: usize) -> f32 {
        (index as f32 - (count as f32 - 1.0) / 2.0) * self.horizontal_spacing
    }

    fn assign_row_x(&self, row: &[usize], xs: &mut [f32]) {
        for (index, &idx) in row.iter().enumerate() {
            xs[idx] = self.row_x(index, row.len());
        }
    }

    /// Stable-sorts `row` by the mean x of each step's neighbours in
    /// `direction`. Steps without neighbours keep their current x as key.
    fn reorder_row(
        &self,
        row: &mut [usize],
        topology: &Topology,
        direction: Direction,
        xs: &mut [f32],
    ) {
        let keys: Vec<(usize, f32)> = row
            .iter()
            .map(|&idx| {
                let neighbours = topology.neighbours(idx, direction);
                let key = if neighbours.is_empty() {
                    xs[idx]
                } else {
                    neighbours.iter().map(|&n| xs[n]).sum::<f32>() / neighbours.len() as f32
                };
                (idx, key)
            })
            .collect();

        let mut sorted = keys;
        sorted.sort_by(|(_, a), (_, b)| a.total_cmp(b));
        for (slot, (idx, _)) in row.iter_mut().zip(sorted) {
            *slot = idx;
        }
        self.assign_row_x(row, xs);
    }
}

impl StepEngine for Engine {
    fn calculate(&self, graph: &StepGraph, heights: &HeightMap) -> Layout {
        let topology = Topology::new(graph);

        let mut by_level: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (idx, step) in graph.steps.iter().enumerate() {
            by_level.entry(step.level).or_default().push(idx);
        }
        let mut rows: Vec<Vec<usize>> = by_level.into_values().collect();

        let mut xs = vec![0.0; graph.steps.len()];
        for row in &rows {
            self.assign_row_x(row, &mut xs);
        }

        for sweep in 0..self.barycenter_sweeps {
            if sweep % 2 == 0 {
                for row in rows.iter_mut().skip(1) {
                    self.reorder_row(row, &topology, Direction::Incoming, &mut xs);
                }
            } else {
                for row in rows.iter_mut().rev().skip(1) {
                    self.reorder_row(row, &topology, Direction::Outgoing, &mut xs);
                }
            }
        }
        trace!(
            rows_count = rows.len(),
            sweeps = self.barycenter_sweeps;
            "Layered rows ordered"
        );

        let height_of = |idx: usize| {
            heights
                .get(&graph.steps[idx].id)
                .copied()
                .unwrap_or_default()
        };

        let mut ys = vec![0.0; graph.steps.len()];
        let mut y = 0.0;
        for row in &rows {
            let row_height = row.iter().map(|&idx| height_of(idx)).fold(0.0, f32::max);
            for &idx in row {
                ys[idx] = y;
            }
            y += row_height + self.vertical_gap;
        }

        let mut layout = Layout::new(self.step_width, heights.clone());
        for (idx, step) in graph.steps.iter().enumerate() {
            layout.insert(step.id.clone(), Point::new(xs[idx], ys[idx]));
        }
        layout
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use tracery_core::step::{StepData, StepEdge};

    use super::*;

    fn step(id: &str, level: u32) -> StepData {
        StepData {
            id: id.to_string(),
            level,
            ..StepData::default()
        }
    }

    fn edge(source: &str, target: &str) -> StepEdge {
        StepEdge {
            source_step_id: source.to_string(),
            target_step_id: target.to_string(),
            ..StepEdge::default()
        }
    }

    fn heights(graph: &StepGraph, height: f32) -> HeightMap {
        graph
            .steps
            .iter()
            .map(|step| (step.id.clone(), height))
            .collect()
    }

    fn engine() -> Engine {
        let mut engine = Engine::new();
        engine
            .set_step_width(100.0)
            .set_horizontal_spacing(150.0)
            .set_vertical_gap(20.0);
        engine
    }

    #[test]
    fn test_rows_follow_levels() {
        let graph = StepGraph::new(
            vec![step("a", 0), step("b", 1), step("c", 1), step("d", 3)],
            vec![edge("a", "b"), edge("a", "c")],
        );
        let mut sizes = heights(&graph, 50.0);
        sizes.insert("b".to_string(), 90.0);

        let layout = engine().calculate(&graph, &sizes);

        assert_approx_eq!(f32, layout.position("a").unwrap().y(), 0.0);
        assert_approx_eq!(f32, layout.position("b").unwrap().y(), 70.0);
        assert_approx_eq!(f32, layout.position("c").unwrap().y(), 70.0);
        // Row height is the tallest step in the row; empty levels are skipped.
        assert_approx_eq!(f32, layout.position("d").unwrap().y(), 70.0 + 90.0 + 20.0);
    }

    #[test]
    fn test_rows_are_centered() {
        let graph = StepGraph::new(vec![step("a", 0), step("b", 1), step("c", 1)], vec![]);
        let layout = engine().calculate(&graph, &heights(&graph, 50.0));

        assert_approx_eq!(f32, layout.position("a").unwrap().x(), 0.0);
        assert_approx_eq!(f32, layout.position("b").unwrap().x(), -75.0);
        assert_approx_eq!(f32, layout.position("c").unwrap().x(), 75.0);
    }

    #[test]
    fn test_barycenter_uncrosses_edges() {
        // Row 1 is [p, q]; row 2 lists q's child before p's child.
        let graph = StepGraph::new(
            vec![step("p", 0), step("q", 0), step("qc", 1), step("pc", 1)],
            vec![edge("p", "pc"), edge("q", "qc")],
        );
        let layout = engine().calculate(&graph, &heights(&graph, 50.0));

        let pc = layout.position("pc").unwrap();
        let qc = layout.position("qc").unwrap();
        assert!(pc.x() < qc.x());
    }

    #[test]
    fn test_zero_sweeps_keep_input_order() {
        let graph = StepGraph::new(
            vec![step("p", 0), step("q", 0), step("qc", 1), step("pc", 1)],
            vec![edge("p", "pc"), edge("q", "qc")],
        );
        let mut engine = engine();
        engine.set_barycenter_sweeps(0);
        let layout = engine.calculate(&graph, &heights(&graph, 50.0));

        assert!(layout.position("qc").unwrap().x() < layout.position("pc").unwrap().x());
    }
}
