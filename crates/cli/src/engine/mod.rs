//! Decoder engines available to the command-line host.

pub mod zbar;

pub use zbar::ZbarEngine;
