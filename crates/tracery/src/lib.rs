//! Tracery - step graphs and layouts for automation workflow trees.
//!
//! Turns a parsed workflow (a tree of function calls, conditionals, loops,
//! parallel blocks and inline transformations) into a step-level DAG, then
//! positions every step in 2-D for rendering.

pub mod config;
pub mod extract;
pub mod graph;
pub mod layout;

mod error;

pub use tracery_core::{geometry, step, workflow};

pub use error::TraceryError;
pub use extract::extract_step_graph;
pub use layout::Layout;

use log::{debug, info, trace};

use tracery_core::{
    step::StepGraph,
    workflow::{BubbleTable, WorkflowInput},
};

use config::AppConfig;
use layout::{EngineBuilder, sizing::StepSizer};

/// Lays out `graph` with the default configuration.
///
/// Every step of `graph` gets a position, including steps with several
/// parents and steps unreachable from any root.
pub fn layout(graph: &StepGraph) -> Layout {
    FlowBuilder::default().layout(graph)
}

/// Builder for extracting and laying out workflow step graphs.
///
/// This provides an API for processing workflows through parsing,
/// extraction, validation, and layout stages.
///
/// # Examples
///
/// ```rust
/// use tracery::{FlowBuilder, config::AppConfig};
///
/// let source = r#"{
///     "workflow": [{
///         "type": "function_call",
///         "functionName": "fetch",
///         "methodDefinition": { "location": { "startLine": 1, "endLine": 4 } }
///     }]
/// }"#;
///
/// let builder = FlowBuilder::new(AppConfig::default());
/// let input = builder.parse(source).expect("Failed to parse");
/// let graph = builder.extract(&input);
/// builder.validate(&graph, &input.bubbles).expect("Invalid graph");
///
/// let layout = builder.layout(&graph);
/// assert_eq!(layout.len(), 1);
/// ```
#[derive(Default)]
pub struct FlowBuilder {
    config: AppConfig,
}

impl FlowBuilder {
    /// Create a new flow builder with the given configuration.
    ///
    /// The configuration is used as is. Callers holding a configuration
    /// from outside the program should go through [`FlowBuilder::try_new`]
    /// or call [`AppConfig::validate`] first; invalid values such as NaN
    /// spacings produce meaningless positions.
    ///
    /// # Arguments
    ///
    /// * `config` - Layout and sizing settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Create a new flow builder after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TraceryError::Config`] naming the first offending field.
    pub fn try_new(config: AppConfig) -> Result<Self, TraceryError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Returns the configuration this builder was created with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse a JSON workflow document.
    ///
    /// # Errors
    ///
    /// Returns [`TraceryError::Parse`] carrying the source text when the
    /// document is not valid JSON or does not match the workflow schema.
    pub fn parse(&self, source: &str) -> Result<WorkflowInput, TraceryError> {
        info!("Parsing workflow input");

        let input: WorkflowInput = serde_json::from_str(source)
            .map_err(|err| TraceryError::new_parse_error(err, source))?;

        debug!(
            root_count = input.workflow.as_ref().map_or(0, Vec::len),
            bubbles_count = input.bubbles.len();
            "Workflow input parsed"
        );

        Ok(input)
    }

    /// Extract the step graph of a parsed workflow.
    pub fn extract(&self, input: &WorkflowInput) -> StepGraph {
        info!("Extracting step graph");

        let graph = extract_step_graph(input.workflow.as_deref(), &input.bubbles);
        trace!(graph:?; "Extracted step graph");

        graph
    }

    /// Check the structural invariants of a step graph.
    ///
    /// # Errors
    ///
    /// Returns [`TraceryError::Graph`] describing the first violation.
    pub fn validate(&self, graph: &StepGraph, bubbles: &BubbleTable) -> Result<(), TraceryError> {
        graph::validate(graph, bubbles)?;
        Ok(())
    }

    /// Compute positions for every step of `graph`.
    pub fn layout(&self, graph: &StepGraph) -> Layout {
        info!(engine:% = self.config.layout().engine(); "Laying out step graph");

        let layout = EngineBuilder::new()
            .with_layout_config(self.config.layout().clone())
            .with_sizer(StepSizer::new(self.config.sizing().clone()))
            .build(graph);

        debug!(
            positions_count = layout.len(),
            width = layout.bounds().width(),
            height = layout.bounds().height();
            "Layout calculated"
        );

        layout
    }
}
