//! mcubatch library
//!
//! Batch project generation and build verification for MCU IDE
//! configurations. A batch file declares projects to generate and a
//! sequence of operations to run against each project's live
//! configuration; the runner executes them through the bridge traits and
//! accumulates every expectation mismatch without halting the batch.
//!
//! The IDE's real scripting surface is out of tree; implement
//! [`bridge::ProjectBridge`] and [`bridge::ConfigBridge`] to drive it.
//! The built-in [`bridge::SimBridge`] executes batches against an
//! in-memory configurator model.

pub mod availability;
pub mod batch;
pub mod bridge;
pub mod buildlog;
pub mod cli;
pub mod error;
pub mod fileops;
pub mod mdf;
pub mod plan;
pub mod progress;
pub mod registry;
pub mod report;
pub mod runner;
pub mod step;
pub mod types;

// Re-export main types for convenience
pub use batch::{Batch, ProjectSpec};
pub use bridge::{
    Attempt, BridgeError, ConfigBridge, GenerationStatus, Handle, ProjectBridge, ProjectRequest,
    SimBridge,
};
pub use error::{Error, Result};
pub use plan::{IarSupport, Plan};
pub use registry::{LookupError, ObjectKind, ObjectRegistry};
pub use report::BatchReport;
pub use runner::{RunOptions, run_batch};
pub use step::{PropertyValue, Step};
pub use types::{BuildMode, Expect, ProjectKind, PropertyScope};
