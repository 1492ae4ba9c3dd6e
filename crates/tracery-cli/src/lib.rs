//! CLI logic for the Tracery step-graph tool.
//!
//! Reads a parsed workflow as JSON, extracts its step graph, lays it out and
//! writes steps, edges and positions back out as JSON.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, io};

use indexmap::IndexMap;
use log::info;
use serde::Serialize;

use tracery::{
    FlowBuilder, TraceryError,
    config::LayoutEngine,
    geometry::Point,
    step::{StepData, StepEdge, StepId},
};

/// Document written to the output file.
#[derive(Serialize)]
struct FlowOutput<'a> {
    steps: &'a [StepData],
    edges: &'a [StepEdge],
    positions: &'a IndexMap<StepId, Point>,
}

/// Run the Tracery CLI application
///
/// This function processes the input file through the Tracery pipeline
/// and writes the resulting step graph and layout to the output file.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `TraceryError` for:
/// - File I/O errors
/// - Configuration loading errors or an unknown engine name
/// - JSON parsing errors
/// - Step-graph invariant violations
pub fn run(args: &Args) -> Result<(), TraceryError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing workflow"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(engine) = &args.engine {
        app_config = app_config.with_engine(engine.parse::<LayoutEngine>()?);
    }

    let source = fs::read_to_string(&args.input)?;

    let builder = FlowBuilder::new(app_config);
    let input = builder.parse(&source)?;
    let graph = builder.extract(&input);
    builder.validate(&graph, &input.bubbles)?;
    let layout = builder.layout(&graph);

    let output = FlowOutput {
        steps: &graph.steps,
        edges: &graph.edges,
        positions: layout.positions(),
    };
    let json = serde_json::to_string_pretty(&output).map_err(io::Error::from)?;
    fs::write(&args.output, json)?;

    info!(output_file = args.output, steps_count = graph.steps.len(); "Step graph exported successfully");

    Ok(())
}
