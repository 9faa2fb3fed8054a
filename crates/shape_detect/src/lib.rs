//! # Single-Shape Polygon Detection
//!
//! Finds the one polygon drawn in a high-contrast image, names it by its
//! vertex count and reports where its centre sits relative to the frame.
//!
//! ## Stages
//!
//! - **Edges**: Sobel magnitude with hysteresis thresholds
//! - **Lines**: (ρ, θ) voting with local-maximum peak picking, peaks from
//!   the same edge band merged into one line
//! - **Line buffer**: every line drawn across the whole frame
//! - **Polygons**: closed cells of the line buffer, traced and simplified
//! - **Selection**: the largest cell whose sides run along edge pixels; when
//!   no cell qualifies, the edge map is traced directly
//! - **Label and centroid**: vertex count, circle-like check, vertex mean
//!
//! Each stage is a trait, so any of them can be swapped through the builder.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shape_detect::Pipeline;
//!
//! let pipeline = Pipeline::builder().build();
//! let image = image::open("shape.png")?.to_luma8();
//! let detection = pipeline.detect(&image)?;
//!
//! println!("{} at {:?}", detection.label, detection.centroid.point);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configured Pipeline
//!
//! ```rust,no_run
//! use shape_detect::{PipelineBuilder, PipelineConfig};
//!
//! let mut config = PipelineConfig::default();
//! config.lines.min_votes = 60;
//! config.edges.thin_edges = true;
//!
//! let pipeline = PipelineBuilder::from_config(&config)?.build();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod input;
pub mod debug;

#[cfg(test)]
mod test_utils;

pub use error::{Result, ShapeError};
pub use types::{
    Centroid, Detection, EdgeMap, PolarLine, Polygon, PolygonSource, Regularity, Segment,
    ShapeLabel,
};
pub use config::{
    ClassifierConfig, ContourBorders, ContourConfig, EdgeConfig, LineConfig, PipelineConfig,
    SelectionConfig,
};
pub use traits::{EdgeExtractor, LineDetector, PolygonExtractor, ShapeClassifier};
pub use pipeline::{builder::PipelineBuilder, Pipeline, PipelineRun};
pub use input::luma_from_raw;
pub use debug::DebugView;
