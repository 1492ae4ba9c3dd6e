//! Step height estimation.
//!
//! Layout never measures rendered text. Heights are a deterministic function
//! of a step's header text length and the number of bubbles it owns.

use std::collections::HashMap;

use tracery_core::step::{StepData, StepGraph, StepId};

use crate::config::SizingConfig;

/// Computed pixel height per step id.
pub type HeightMap = HashMap<StepId, f32>;

/// Turns step content into a pixel height.
#[derive(Debug, Clone, Default)]
pub struct StepSizer {
    config: SizingConfig,
}

impl StepSizer {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    /// Height of a single step.
    ///
    /// Transformation steps have a fixed height. Other steps get a header
    /// sized by the wrapped length of their name and description, plus one
    /// slot per owned bubble.
    pub fn height(&self, step: &StepData) -> f32 {
        if step.is_transformation {
            return self.config.transformation_height();
        }

        let header_chars = step.function_name.chars().count()
            + step
                .description
                .as_deref()
                .map_or(0, |description| description.chars().count());
        let header_lines = header_chars
            .div_ceil(self.config.header_chars_per_line().max(1))
            .max(1);

        let header = self.config.header_base_height()
            + header_lines as f32 * self.config.header_line_height();
        let body = step.bubble_ids.len() as f32 * self.config.bubble_slot_height()
            + self.config.body_padding();

        header + body
    }

    /// Heights of every step in `graph`.
    pub fn height_map(&self, graph: &StepGraph) -> HeightMap {
        graph
            .steps
            .iter()
            .map(|step| (step.id.clone(), self.height(step)))
            .collect()
    }
}
