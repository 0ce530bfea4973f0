//! Contains the types and functions for the high level pipeline builder API.

mod dither_pipeline;

pub use dither_pipeline::{DitherMethod, DitherPipeline};
