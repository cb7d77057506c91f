//! Camera platforms available to the command-line host.

pub mod v4l;

pub use v4l::V4l2Camera;
