use crate::{
    algorithms::{
        ContourPolygonExtractor, HoughLineDetector, HysteresisEdgeExtractor,
        VertexCountClassifier,
    },
    config::{PipelineConfig, SelectionConfig},
    error::Result,
    pipeline::Pipeline,
    traits::{EdgeExtractor, LineDetector, PolygonExtractor, ShapeClassifier},
};

/// Builder for creating detection pipelines with a fluent API
pub struct PipelineBuilder {
    edge_extractor: Option<Box<dyn EdgeExtractor>>,
    line_detector: Option<Box<dyn LineDetector>>,
    polygon_extractor: Option<Box<dyn PolygonExtractor>>,
    classifier: Option<Box<dyn ShapeClassifier>>,
    selection: SelectionConfig,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            edge_extractor: None,
            line_detector: None,
            polygon_extractor: None,
            classifier: None,
            selection: SelectionConfig::default(),
        }
    }

    /// Builder with every standard stage configured from `config`
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new()
            .set_edge_extractor(HysteresisEdgeExtractor::new(config.edges.clone()))
            .set_line_detector(HoughLineDetector::new(config.lines.clone()))
            .set_polygon_extractor(ContourPolygonExtractor::new(config.contours.clone()))
            .set_classifier(VertexCountClassifier::new(config.classifier.clone()))
            .set_selection(config.selection.clone()))
    }

    /// Set the edge extractor (replaces any existing one)
    pub fn set_edge_extractor<E>(mut self, extractor: E) -> Self
    where
        E: EdgeExtractor + 'static,
    {
        self.edge_extractor = Some(Box::new(extractor));
        self
    }

    /// Set the line detector (replaces any existing one)
    pub fn set_line_detector<D>(mut self, detector: D) -> Self
    where
        D: LineDetector + 'static,
    {
        self.line_detector = Some(Box::new(detector));
        self
    }

    /// Set the polygon extractor (replaces any existing one)
    pub fn set_polygon_extractor<P>(mut self, extractor: P) -> Self
    where
        P: PolygonExtractor + 'static,
    {
        self.polygon_extractor = Some(Box::new(extractor));
        self
    }

    /// Set the shape classifier (replaces any existing one)
    pub fn set_classifier<C>(mut self, classifier: C) -> Self
    where
        C: ShapeClassifier + 'static,
    {
        self.classifier = Some(Box::new(classifier));
        self
    }

    /// Set how the detected polygon is chosen
    pub fn set_selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = selection;
        self
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let edge_extractor = self
            .edge_extractor
            .unwrap_or_else(|| Box::new(HysteresisEdgeExtractor::default()));
        let line_detector = self
            .line_detector
            .unwrap_or_else(|| Box::new(HoughLineDetector::default()));
        let polygon_extractor = self
            .polygon_extractor
            .unwrap_or_else(|| Box::new(ContourPolygonExtractor::default()));
        let classifier = self
            .classifier
            .unwrap_or_else(|| Box::new(VertexCountClassifier::default()));

        Pipeline::new(
            edge_extractor,
            line_detector,
            polygon_extractor,
            classifier,
            self.selection,
        )
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ShapeError,
        test_utils::{regular_polygon, stroked_polygon},
        types::{Polygon, ShapeLabel},
    };

    struct AlwaysHexagon;

    impl ShapeClassifier for AlwaysHexagon {
        fn classify(&self, _polygon: &Polygon) -> ShapeLabel {
            ShapeLabel::Hexagon
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = PipelineConfig::default();
        config.lines.min_votes = 0;
        assert!(matches!(
            PipelineBuilder::from_config(&config),
            Err(ShapeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn custom_stage_replaces_default() {
        let vertices = regular_polygon([100.0, 100.0], 70.0, 4);
        let image = stroked_polygon(200, 200, &vertices, 2);

        let pipeline = PipelineBuilder::from_config(&PipelineConfig::default())
            .unwrap()
            .set_classifier(AlwaysHexagon)
            .build();
        let detection = pipeline.detect(&image).unwrap();
        assert_eq!(detection.label, ShapeLabel::Hexagon);
        assert_eq!(detection.polygon.len(), 4);
    }
}
