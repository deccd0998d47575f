//! Command implementations for the iacscan CLI
//!
//! Two commands cover the operator workflows: `scan` runs the registered
//! backends over a target path and renders the merged report, and `plugins`
//! prints the backend catalog so operators can see what a scan would run.

pub mod plugins;
pub mod scan;
