//! Layout engine factory module
//!
//! This module provides a system for selecting and using different layout
//! engines based on the configured [`LayoutEngine`]. Engines are created on
//! first use, configured from the [`LayoutConfig`], and cached for reuse.

mod hierarchical;
mod layered;

use std::collections::HashMap;

use log::{debug, trace};

use tracery_core::step::StepGraph;

use crate::{
    config::{LayoutConfig, LayoutEngine},
    layout::{
        Layout,
        sizing::{HeightMap, StepSizer},
    },
};

pub use hierarchical::Engine as Hierarchical;
pub use layered::Engine as Layered;

/// Trait defining the interface for step-graph layout engines
pub trait StepEngine {
    /// Calculate positions for every step of `graph`.
    ///
    /// - `graph`: The step graph to lay out
    /// - `heights`: Precomputed pixel height per step id. Steps missing from
    ///   the map are treated as zero height.
    ///
    /// Every step of the input appears in the returned layout, in input order.
    fn calculate(&self, graph: &StepGraph, heights: &HeightMap) -> Layout;
}

/// Builder for creating and configuring layout engines.
#[derive(Default)]
pub struct EngineBuilder {
    // Cache for reusing engines with the same configuration
    engines: HashMap<LayoutEngine, Box<dyn StepEngine>>,

    config: LayoutConfig,
    sizer: StepSizer,
}

impl EngineBuilder {
    /// Create a new engine builder with default engine cache and configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the spacing and engine selection used by created engines
    pub fn with_layout_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the sizer that turns step content into heights
    pub fn with_sizer(mut self, sizer: StepSizer) -> Self {
        self.sizer = sizer;
        self
    }

    /// Get an engine of the specified type with configured options
    pub fn engine(&mut self, engine_type: LayoutEngine) -> &dyn StepEngine {
        let config = &self.config;
        let engine = self.engines.entry(engine_type).or_insert_with(|| {
            trace!(engine_type:%; "Creating layout engine");
            let engine: Box<dyn StepEngine> = match engine_type {
                LayoutEngine::Hierarchical => {
                    let mut e = Hierarchical::new();
                    e.set_step_width(config.step_width())
                        .set_horizontal_spacing(config.horizontal_spacing())
                        .set_vertical_gap(config.vertical_gap())
                        .set_max_relaxation_passes(config.max_relaxation_passes())
                        .set_relaxation_tolerance(config.relaxation_tolerance())
                        .set_default_position(config.default_position());
                    Box::new(e)
                }
                LayoutEngine::Layered => {
                    let mut e = Layered::new();
                    e.set_step_width(config.step_width())
                        .set_horizontal_spacing(config.horizontal_spacing())
                        .set_vertical_gap(config.vertical_gap())
                        .set_barycenter_sweeps(config.barycenter_sweeps());
                    Box::new(e)
                }
            };
            engine
        });
        // Dereference to avoid returning reference to temporary
        &**engine
    }

    /// Lay out `graph` with the configured engine.
    pub fn build(mut self, graph: &StepGraph) -> Layout {
        let heights = self.sizer.height_map(graph);
        let engine_type = self.config.engine();

        debug!(
            engine_type:%,
            steps_count = graph.steps.len();
            "Calculating step layout"
        );

        self.engine(engine_type).calculate(graph, &heights)
    }
}
