//! Two-dimensional placement of step graphs.
//!
//! A [`Layout`] maps every step id to the top-left corner of its box. All
//! boxes share one width; heights come from [`sizing::StepSizer`].

mod engines;
pub mod sizing;
mod topology;

pub use engines::{EngineBuilder, Hierarchical, Layered, StepEngine};

use indexmap::IndexMap;

use tracery_core::{
    geometry::{Bounds, Point, Size},
    step::StepId,
};

use sizing::HeightMap;

/// Positions and heights computed for one step graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    /// Top-left corners in step input order.
    positions: IndexMap<StepId, Point>,
    heights: HeightMap,
    step_width: f32,
}

impl Layout {
    pub(crate) fn new(step_width: f32, heights: HeightMap) -> Self {
        Self {
            positions: IndexMap::new(),
            heights,
            step_width,
        }
    }

    pub(crate) fn insert(&mut self, id: StepId, position: Point) {
        self.positions.insert(id, position);
    }

    /// Returns the top-left corner of a step.
    pub fn position(&self, id: &str) -> Option<Point> {
        self.positions.get(id).copied()
    }

    /// Returns every position in step input order.
    pub fn positions(&self) -> &IndexMap<StepId, Point> {
        &self.positions
    }

    /// Returns the computed height of a step.
    pub fn height(&self, id: &str) -> Option<f32> {
        self.heights.get(id).copied()
    }

    pub fn step_width(&self) -> f32 {
        self.step_width
    }

    /// Returns the box occupied by a step.
    pub fn step_bounds(&self, id: &str) -> Option<Bounds> {
        let position = self.position(id)?;
        let height = self.height(id).unwrap_or_default();
        Some(Bounds::new_from_top_left(
            position,
            Size::new(self.step_width, height),
        ))
    }

    /// Returns the smallest rectangle containing every step box.
    ///
    /// An empty layout has default (zero) bounds.
    pub fn bounds(&self) -> Bounds {
        self.positions
            .keys()
            .filter_map(|id| self.step_bounds(id))
            .reduce(|acc, bounds| acc.merge(&bounds))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
