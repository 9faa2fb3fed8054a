use image::GrayImage;
use crate::{
    error::Result,
    types::{EdgeMap, PolarLine, Polygon, ShapeLabel},
};

/// Trait for edge extraction algorithms
pub trait EdgeExtractor: Send + Sync {
    /// Turn a grayscale image into a binary edge map
    fn extract(&self, image: &GrayImage) -> Result<EdgeMap>;
}

/// Trait for line detection algorithms
pub trait LineDetector: Send + Sync {
    /// Detect infinite lines in an edge map, strongest first
    fn detect(&self, edges: &EdgeMap) -> Vec<PolarLine>;
}

/// Trait for polygon extraction algorithms
pub trait PolygonExtractor: Send + Sync {
    /// Trace closed boundaries in a binary buffer and simplify them to polygons
    fn extract(&self, buffer: &EdgeMap) -> Vec<Polygon>;
}

/// Trait for shape classification
pub trait ShapeClassifier: Send + Sync {
    fn classify(&self, polygon: &Polygon) -> ShapeLabel;
}
