//! Tracery Core Types
//!
//! This crate provides the foundational types shared by the Tracery
//! step-graph extractor, its layout engines and the CLI. It includes:
//!
//! - **Workflow**: the parsed workflow tree and bubble table ([`workflow`] module)
//! - **Step**: steps, edges and the step graph ([`step`] module)
//! - **Geometry**: points, sizes and bounds used by layout ([`geometry`] module)

pub mod geometry;
pub mod step;
pub mod workflow;
