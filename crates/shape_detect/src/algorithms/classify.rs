use crate::{
    config::{ClassifierConfig, MIN_CIRCLE_VERTICES},
    traits::ShapeClassifier,
    types::{Polygon, ShapeLabel},
};

/// Labels polygons by vertex count; many-sided polygons whose corners all
/// turn the same way by about the same amount are called circle-like.
#[derive(Debug, Clone, Default)]
pub struct VertexCountClassifier {
    pub config: ClassifierConfig,
}

impl VertexCountClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Fewer vertices than this always keep their polygon label
    fn circle_threshold(&self) -> usize {
        self.config.circle_min_vertices.max(MIN_CIRCLE_VERTICES)
    }

    fn turns_uniformly(&self, polygon: &Polygon) -> bool {
        let turns = polygon.turning_angles();
        let all_left = turns.iter().all(|&t| t > 0.0);
        let all_right = turns.iter().all(|&t| t < 0.0);
        (all_left || all_right)
            && polygon.regularity().turning_angle_cv <= self.config.turning_tolerance
    }
}

impl ShapeClassifier for VertexCountClassifier {
    fn classify(&self, polygon: &Polygon) -> ShapeLabel {
        match polygon.len() {
            3 => ShapeLabel::Triangle,
            4 => ShapeLabel::Quadrilateral,
            5 => ShapeLabel::Pentagon,
            6 => ShapeLabel::Hexagon,
            n if n >= self.circle_threshold() && self.turns_uniformly(polygon) => {
                ShapeLabel::CircleLike
            }
            n => ShapeLabel::NGon(n),
        }
    }
}
