//! Configuration types for Tracery step-graph layout.
//!
//! This module provides configuration structures that control how step
//! graphs are sized and laid out. All types implement [`serde::Deserialize`]
//! for flexible loading from external sources, and every field falls back to
//! a default when omitted.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout and sizing settings.
//! - [`LayoutConfig`] - Selects the [`LayoutEngine`] and its spacing parameters.
//! - [`SizingConfig`] - Controls how step heights are estimated from their content.
//!
//! # Example
//!
//! ```
//! # use tracery::config::{AppConfig, LayoutEngine};
//! let config = AppConfig::default();
//! assert_eq!(config.layout().engine(), LayoutEngine::Hierarchical);
//! assert!(config.validate().is_ok());
//! ```

use std::{fmt, str::FromStr};

use serde::Deserialize;

use tracery_core::geometry::Point;

use crate::error::TraceryError;

/// Top-level configuration combining layout and sizing settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Step sizing configuration section.
    #[serde(default)]
    sizing: SizingConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified layout and sizing configurations.
    pub fn new(layout: LayoutConfig, sizing: SizingConfig) -> Self {
        Self { layout, sizing }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the sizing configuration.
    pub fn sizing(&self) -> &SizingConfig {
        &self.sizing
    }

    /// Replaces the layout engine (builder style).
    pub fn with_engine(mut self, engine: LayoutEngine) -> Self {
        self.layout.engine = engine;
        self
    }

    /// Checks that the configured values can produce a non-overlapping layout.
    ///
    /// # Errors
    ///
    /// Returns [`TraceryError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), TraceryError> {
        self.layout.validate()?;
        self.sizing.validate()
    }
}

/// Available layout algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutEngine {
    /// Tree placement along first parents, then convergence centering.
    #[default]
    Hierarchical,
    /// Rows by step level with barycenter ordering inside each row.
    Layered,
}

impl fmt::Display for LayoutEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutEngine::Hierarchical => write!(f, "hierarchical"),
            LayoutEngine::Layered => write!(f, "layered"),
        }
    }
}

impl FromStr for LayoutEngine {
    type Err = TraceryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hierarchical" => Ok(LayoutEngine::Hierarchical),
            "layered" => Ok(LayoutEngine::Layered),
            other => Err(TraceryError::Config(format!(
                "unknown layout engine `{other}` (expected `hierarchical` or `layered`)"
            ))),
        }
    }
}

/// Layout engine selection and spacing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    engine: LayoutEngine,
    step_width: f32,
    /// Center-to-center distance between neighbouring siblings.
    horizontal_spacing: f32,
    /// Minimum gap between a step's bottom edge and its children.
    vertical_gap: f32,
    max_relaxation_passes: usize,
    relaxation_tolerance: f32,
    barycenter_sweeps: usize,
    /// Position given to steps the tree walk never reaches.
    default_position: Point,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            engine: LayoutEngine::default(),
            step_width: 320.0,
            horizontal_spacing: 400.0,
            vertical_gap: 80.0,
            max_relaxation_passes: 10,
            relaxation_tolerance: 1.0,
            barycenter_sweeps: 4,
            default_position: Point::default(),
        }
    }
}

impl LayoutConfig {
    pub fn engine(&self) -> LayoutEngine {
        self.engine
    }

    pub fn step_width(&self) -> f32 {
        self.step_width
    }

    pub fn horizontal_spacing(&self) -> f32 {
        self.horizontal_spacing
    }

    pub fn vertical_gap(&self) -> f32 {
        self.vertical_gap
    }

    pub fn max_relaxation_passes(&self) -> usize {
        self.max_relaxation_passes
    }

    pub fn relaxation_tolerance(&self) -> f32 {
        self.relaxation_tolerance
    }

    pub fn barycenter_sweeps(&self) -> usize {
        self.barycenter_sweeps
    }

    pub fn default_position(&self) -> Point {
        self.default_position
    }

    fn validate(&self) -> Result<(), TraceryError> {
        let values = [
            ("step_width", self.step_width),
            ("horizontal_spacing", self.horizontal_spacing),
            ("vertical_gap", self.vertical_gap),
            ("relaxation_tolerance", self.relaxation_tolerance),
            ("default_position.x", self.default_position.x()),
            ("default_position.y", self.default_position.y()),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                return Err(TraceryError::Config(format!(
                    "layout.{name} must be finite, got {value}"
                )));
            }
        }
        if self.step_width <= 0.0 {
            return Err(TraceryError::Config(format!(
                "layout.step_width must be positive, got {}",
                self.step_width
            )));
        }
        if self.horizontal_spacing < self.step_width {
            return Err(TraceryError::Config(format!(
                "layout.horizontal_spacing ({}) must be at least layout.step_width ({})",
                self.horizontal_spacing, self.step_width
            )));
        }
        if self.vertical_gap < 0.0 {
            return Err(TraceryError::Config(format!(
                "layout.vertical_gap must not be negative, got {}",
                self.vertical_gap
            )));
        }
        if !(self.relaxation_tolerance >= 0.0) {
            return Err(TraceryError::Config(format!(
                "layout.relaxation_tolerance must not be negative, got {}",
                self.relaxation_tolerance
            )));
        }
        if self.max_relaxation_passes == 0 {
            return Err(TraceryError::Config(
                "layout.max_relaxation_passes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters of the step height estimate.
///
/// Ordinary steps are a header (wrapped function name and description) on top
/// of one slot per bubble. Transformation steps have a fixed height.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    transformation_height: f32,
    header_base_height: f32,
    header_line_height: f32,
    header_chars_per_line: usize,
    bubble_slot_height: f32,
    body_padding: f32,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            transformation_height: 180.0,
            header_base_height: 56.0,
            header_line_height: 20.0,
            header_chars_per_line: 36,
            bubble_slot_height: 72.0,
            body_padding: 24.0,
        }
    }
}

impl SizingConfig {
    pub fn transformation_height(&self) -> f32 {
        self.transformation_height
    }

    pub fn header_base_height(&self) -> f32 {
        self.header_base_height
    }

    pub fn header_line_height(&self) -> f32 {
        self.header_line_height
    }

    pub fn header_chars_per_line(&self) -> usize {
        self.header_chars_per_line
    }

    pub fn bubble_slot_height(&self) -> f32 {
        self.bubble_slot_height
    }

    pub fn body_padding(&self) -> f32 {
        self.body_padding
    }

    fn validate(&self) -> Result<(), TraceryError> {
        if self.header_chars_per_line == 0 {
            return Err(TraceryError::Config(
                "sizing.header_chars_per_line must be at least 1".to_string(),
            ));
        }
        let heights = [
            ("transformation_height", self.transformation_height),
            ("header_base_height", self.header_base_height),
            ("header_line_height", self.header_line_height),
            ("bubble_slot_height", self.bubble_slot_height),
            ("body_padding", self.body_padding),
        ];
        for (name, value) in heights {
            if !value.is_finite() || value < 0.0 {
                return Err(TraceryError::Config(format!(
                    "sizing.{name} must be finite and not negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}
