//! Pipeline configuration.
//!
//! Every stage takes its parameters explicitly; [`PipelineConfig`] groups
//! them so a whole run can be described by one serializable value. All
//! sections use `#[serde(default)]`, so partial config files fill in the
//! documented defaults.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShapeError};

/// Finest accepted accumulator step (0.05°); finer steps only cost memory
pub const MIN_ANGLE_RESOLUTION: f32 = std::f32::consts::PI / 3600.0;

/// Polygons with fewer vertices are always named by their count
pub const MIN_CIRCLE_VERTICES: usize = 10;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PipelineConfig {
    pub edges: EdgeConfig,
    pub lines: LineConfig,
    pub contours: ContourConfig,
    pub selection: SelectionConfig,
    pub classifier: ClassifierConfig,
}

impl PipelineConfig {
    /// Check that every parameter is within its usable range
    pub fn validate(&self) -> Result<()> {
        self.edges.validate()?;
        self.lines.validate()?;
        self.contours.validate()?;
        self.selection.validate()?;
        self.classifier.validate()
    }
}

/// Hysteresis gradient thresholds, on the 0–1020 Sobel scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EdgeConfig {
    pub low_threshold: f32,
    pub high_threshold: f32,
    /// 1 is the plain 3×3 Sobel aperture; larger radii add a Gaussian
    /// pre-blur of sigma `radius - 1`.
    pub smoothing_radius: u32,
    /// Thin edges to one pixel with non-maximum suppression before hysteresis
    pub thin_edges: bool,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            low_threshold: 125.0,
            high_threshold: 350.0,
            smoothing_radius: 1,
            thin_edges: false,
        }
    }
}

impl EdgeConfig {
    fn validate(&self) -> Result<()> {
        if !(self.low_threshold.is_finite() && self.high_threshold.is_finite()) {
            return Err(ShapeError::InvalidConfig(
                "edge thresholds must be finite".to_string(),
            ));
        }
        if self.low_threshold < 0.0 || self.low_threshold > self.high_threshold {
            return Err(ShapeError::InvalidConfig(format!(
                "edge thresholds must satisfy 0 <= low <= high (got low={}, high={})",
                self.low_threshold, self.high_threshold
            )));
        }
        Ok(())
    }
}

/// Accumulator parameters for line voting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LineConfig {
    /// Angular step between accumulator columns, in radians
    pub angle_resolution: f32,
    /// Minimum votes for a cell to count as a line
    pub min_votes: u32,
    /// Peaks closer than this in angle (radians) may describe the same edge
    pub merge_angle: f32,
    /// A weaker peak within `merge_angle` of a stronger one is merged into it
    /// when the two lines come this close (pixels) inside the frame.
    pub merge_distance: f32,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            angle_resolution: std::f32::consts::PI / 180.0,
            min_votes: 80,
            merge_angle: std::f32::consts::PI / 30.0,
            merge_distance: 6.0,
        }
    }
}

impl LineConfig {
    fn validate(&self) -> Result<()> {
        if !(self.angle_resolution >= MIN_ANGLE_RESOLUTION
            && self.angle_resolution < std::f32::consts::PI)
        {
            return Err(ShapeError::InvalidConfig(format!(
                "angle resolution must be in [{MIN_ANGLE_RESOLUTION}, pi), got {}",
                self.angle_resolution
            )));
        }
        if self.min_votes == 0 {
            return Err(ShapeError::InvalidConfig(
                "min_votes must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("merge_angle", self.merge_angle),
            ("merge_distance", self.merge_distance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ShapeError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Contour tracing and simplification parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ContourConfig {
    /// Contours with fewer pixels are treated as noise
    pub min_contour_pixels: usize,
    /// Simplification tolerance as a fraction of the contour's bounding-box diagonal
    pub tolerance_ratio: f32,
    /// Drop contours that reach the image border; they are open curves cut by the frame
    pub drop_frame_contours: bool,
    /// Which traced borders become polygons
    pub borders: ContourBorders,
}

/// Border kinds produced by border following
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContourBorders {
    /// Outer borders of foreground components and the borders of their holes
    All,
    /// Only borders of background regions enclosed by foreground: the cells
    /// between drawn lines, or the inside of an outline
    #[default]
    Holes,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            min_contour_pixels: 16,
            tolerance_ratio: 0.02,
            drop_frame_contours: true,
            borders: ContourBorders::Holes,
        }
    }
}

impl ContourConfig {
    fn validate(&self) -> Result<()> {
        if !(self.tolerance_ratio.is_finite() && self.tolerance_ratio >= 0.0) {
            return Err(ShapeError::InvalidConfig(format!(
                "tolerance ratio must be a non-negative number, got {}",
                self.tolerance_ratio
            )));
        }
        Ok(())
    }
}

/// How the detected polygon is chosen among the traced ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SelectionConfig {
    /// Distance (pixels) within which an edge pixel backs a point of a polygon side
    pub support_radius: u32,
    /// Smallest fraction of every side that must be backed by edge pixels
    pub min_edge_support: f32,
    /// Trace the edge map itself when no line-buffer polygon is backed by edges
    pub edge_fallback: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            support_radius: 3,
            min_edge_support: 0.8,
            edge_fallback: true,
        }
    }
}

impl SelectionConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_edge_support) {
            return Err(ShapeError::InvalidConfig(format!(
                "min_edge_support must be within [0, 1], got {}",
                self.min_edge_support
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Smallest vertex count that may be called circle-like
    pub circle_min_vertices: usize,
    /// Largest turning-angle coefficient of variation still considered uniform
    pub turning_tolerance: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            circle_min_vertices: 10,
            turning_tolerance: 0.35,
        }
    }
}

impl ClassifierConfig {
    fn validate(&self) -> Result<()> {
        if self.circle_min_vertices < MIN_CIRCLE_VERTICES {
            return Err(ShapeError::InvalidConfig(format!(
                "circle_min_vertices must be at least {MIN_CIRCLE_VERTICES}, got {}",
                self.circle_min_vertices
            )));
        }
        if !(self.turning_tolerance.is_finite() && self.turning_tolerance >= 0.0) {
            return Err(ShapeError::InvalidConfig(format!(
                "turning tolerance must be a non-negative number, got {}",
                self.turning_tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.edges.low_threshold, 125.0);
        assert_eq!(config.edges.high_threshold, 350.0);
        assert_eq!(config.lines.min_votes, 80);
        assert_eq!(config.contours.min_contour_pixels, 16);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let mut config = PipelineConfig::default();
        config.edges.low_threshold = 400.0;
        assert!(matches!(
            config.validate(),
            Err(ShapeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_angle_resolution_is_rejected() {
        let mut config = PipelineConfig::default();
        config.lines.angle_resolution = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn tiny_angle_resolution_is_rejected() {
        let mut config = PipelineConfig::default();
        config.lines.angle_resolution = 1e-6;
        assert!(matches!(
            config.validate(),
            Err(ShapeError::InvalidConfig(_))
        ));

        config.lines.angle_resolution = MIN_ANGLE_RESOLUTION;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn circle_threshold_below_ten_is_rejected() {
        let mut config = PipelineConfig::default();
        config.classifier.circle_min_vertices = 9;
        assert!(config.validate().is_err());

        config.classifier.circle_min_vertices = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn negative_merge_window_is_rejected() {
        let mut config = PipelineConfig::default();
        config.lines.merge_distance = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn support_fraction_must_be_a_fraction() {
        let mut config = PipelineConfig::default();
        config.selection.min_edge_support = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "lines": { "min_votes": 40 } }"#).unwrap();
        assert_eq!(config.lines.min_votes, 40);
        assert_eq!(config.lines.angle_resolution, LineConfig::default().angle_resolution);
        assert_eq!(config.edges, EdgeConfig::default());
        assert_eq!(config.contours.borders, ContourBorders::Holes);
    }
}
