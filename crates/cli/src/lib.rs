//! Command-line host for the barscan acquisition controller.
//!
//! Wires the controller to a V4L2 camera, a headless surface and the zbar
//! tools, and prints each outcome as a result envelope.

pub mod cli;
pub mod commands;
pub mod context;
pub mod engine;
pub mod error;
pub mod logging;
pub mod output;
pub mod platform;
