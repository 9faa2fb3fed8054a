pub mod edges;
pub mod hough;
pub mod rasterize;
pub mod contours;
pub mod classify;
pub mod centroid;

pub use edges::HysteresisEdgeExtractor;
pub use hough::HoughLineDetector;
pub use rasterize::{draw_lines, is_near_vertical, rasterize, LineBuffer};
pub use contours::{
    edge_support, simplify_closed, tolerance_for, trace_contours, ContourPolygonExtractor,
};
pub use classify::VertexCountClassifier;
