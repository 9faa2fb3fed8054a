pub mod builder;

use image::{DynamicImage, GrayImage};
use tracing::{debug, info};

use crate::{
    algorithms::{centroid, draw_lines, edge_support, LineBuffer},
    config::SelectionConfig,
    error::{Result, ShapeError},
    traits::{EdgeExtractor, LineDetector, PolygonExtractor, ShapeClassifier},
    types::{Detection, EdgeMap, PolarLine, Polygon, PolygonSource},
};

/// Edge → line → polygon → label pipeline for a single-shape image
pub struct Pipeline {
    edge_extractor: Box<dyn EdgeExtractor>,
    line_detector: Box<dyn LineDetector>,
    polygon_extractor: Box<dyn PolygonExtractor>,
    classifier: Box<dyn ShapeClassifier>,
    selection: SelectionConfig,
}

/// Everything one run produced, kept for debug overlays
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub edges: EdgeMap,
    pub lines: Vec<PolarLine>,
    pub line_buffer: LineBuffer,
    pub polygons: Vec<Polygon>,
    /// Polygons traced from the edge map; empty unless the fallback ran
    pub edge_polygons: Vec<Polygon>,
    /// The largest edge-backed polygon, classified; `None` if nothing survived
    pub detection: Option<Detection>,
}

impl PipelineRun {
    /// The detected shape, or [`ShapeError::NoShapeDetected`]
    pub fn detection(&self) -> Result<&Detection> {
        self.detection.as_ref().ok_or(ShapeError::NoShapeDetected)
    }

    pub fn into_detection(self) -> Result<Detection> {
        self.detection.ok_or(ShapeError::NoShapeDetected)
    }
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Create a new pipeline with the given components
    pub fn new(
        edge_extractor: Box<dyn EdgeExtractor>,
        line_detector: Box<dyn LineDetector>,
        polygon_extractor: Box<dyn PolygonExtractor>,
        classifier: Box<dyn ShapeClassifier>,
        selection: SelectionConfig,
    ) -> Self {
        Self {
            edge_extractor,
            line_detector,
            polygon_extractor,
            classifier,
            selection,
        }
    }

    /// Run every stage and keep the intermediate results
    pub fn run(&self, image: &GrayImage) -> Result<PipelineRun> {
        let (width, height) = image.dimensions();

        // Step 1: Edge map
        let edges = self.edge_extractor.extract(image)?;

        // Step 2: Lines, strongest first
        let lines = self.line_detector.detect(&edges);

        // Step 3: Lines drawn across the frame onto a fresh buffer
        let line_buffer = draw_lines(&lines, width, height)?;

        // Step 4: Closed cells of the line buffer as polygons
        let polygons = self.polygon_extractor.extract(&line_buffer.buffer);

        // Step 5: The largest cell whose every side runs along edges is the shape
        let radius = self.selection.support_radius;
        let min_support = self.selection.min_edge_support;
        let mut chosen = largest(
            polygons
                .iter()
                .filter(|polygon| edge_support(polygon, &edges, radius) >= min_support),
        )
        .map(|polygon| (polygon.clone(), PolygonSource::LineBuffer));

        // Step 6: Sides too short to clear the vote threshold leave no backed
        // cell; trace the edge map directly
        let mut edge_polygons = Vec::new();
        if chosen.is_none() && self.selection.edge_fallback {
            edge_polygons = self.polygon_extractor.extract(&edges);
            debug!(
                cells = polygons.len(),
                edge_polygons = edge_polygons.len(),
                "no line cell backed by edges, using the edge map"
            );
            chosen = largest(edge_polygons.iter())
                .map(|polygon| (polygon.clone(), PolygonSource::EdgeMap));
        }

        let detection = chosen.map(|(polygon, source)| Detection {
            label: self.classifier.classify(&polygon),
            centroid: centroid::compute(&polygon, width, height),
            regularity: polygon.regularity(),
            polygon,
            source,
            image_width: width,
            image_height: height,
        });

        match &detection {
            Some(found) => info!(
                label = %found.label,
                source = %found.source,
                vertices = found.polygon.len(),
                cx = found.centroid.point[0],
                cy = found.centroid.point[1],
                "shape detected"
            ),
            None => debug!(polygons = polygons.len(), "no shape survived"),
        }

        Ok(PipelineRun {
            edges,
            lines,
            line_buffer,
            polygons,
            edge_polygons,
            detection,
        })
    }

    /// Detect the shape in a grayscale image
    pub fn detect(&self, image: &GrayImage) -> Result<Detection> {
        self.run(image)?.into_detection()
    }

    /// Detect the shape in an image of any color type; color is reduced to luma first
    pub fn detect_dynamic(&self, image: &DynamicImage) -> Result<Detection> {
        self.detect(&image.to_luma8())
    }
}

fn largest<'a>(polygons: impl Iterator<Item = &'a Polygon>) -> Option<&'a Polygon> {
    polygons
        .filter(|polygon| polygon.area() > 0.0)
        .max_by(|a, b| a.area().total_cmp(&b.area()))
}
