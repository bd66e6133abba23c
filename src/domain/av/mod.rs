//! Audio/Video domain modules.

pub mod geometry;

pub use geometry::{AspectClass, Geometry};
