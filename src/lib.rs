//! Preparing vector map features for drawing and transmission.
//!
//! The crate takes a [`FeatureMap`] and decides which of its features are
//! shown and where their labels go. See [`Pipeline`] for the stages.

pub use self::config::Config;
pub use self::error::Error;
pub use self::feature::{Feature, FeatureMap, FeatureType};
pub use self::measure::{CachedMeasurer, EstimatingMeasurer, GlyphMeasurer};
pub use self::pipeline::{Output, Pipeline};
pub use self::projection::{CosLatProjection, Projection};

pub mod boxes;
pub mod config;
pub mod error;
pub mod feature;
pub mod importance;
pub mod label;
pub mod measure;
pub mod merge;
pub mod names;
pub mod notice;
pub mod overlap;
pub mod pipeline;
pub mod projection;
pub mod style;
pub mod world;
