//! Data shapes exchanged between the acquisition controller and its
//! capabilities (camera platforms and decoder engines).
//!
//! Types in this crate are pure data. Behavior lives in `barscan`.

pub mod decode;
pub mod media;
pub mod symbology;

pub use decode::*;
pub use media::*;
pub use symbology::*;
