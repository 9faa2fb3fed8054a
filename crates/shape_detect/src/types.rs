use std::fmt;

use geo_types::{Coord, LineString, Polygon as GeoPolygon};
use image::{GrayImage, Luma};
use schemars::JsonSchema;
use serde::Serialize;
use strum::Display;

/// Binary edge grid. Pixels are either [`EdgeMap::ON`] or 0, nothing in between.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap {
    image: GrayImage,
}

impl EdgeMap {
    pub const ON: u8 = 255;

    /// Blank map (no edges) of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    /// Binarize an arbitrary grayscale buffer: any non-zero sample becomes an edge.
    pub fn from_image(image: &GrayImage) -> Self {
        let mut map = Self::new(image.width(), image.height());
        for (x, y, pixel) in image.enumerate_pixels() {
            if pixel[0] != 0 {
                map.set(x, y);
            }
        }
        map
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] == Self::ON
    }

    pub fn set(&mut self, x: u32, y: u32) {
        self.image.put_pixel(x, y, Luma([Self::ON]));
    }

    /// Number of edge pixels
    pub fn count(&self) -> usize {
        self.image.pixels().filter(|p| p[0] == Self::ON).count()
    }

    /// Edge pixel coordinates in row-major order
    pub fn edge_pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.image
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] == Self::ON)
            .map(|(x, y, _)| (x, y))
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Mutable access for drawing. Callers must only write `0` or [`EdgeMap::ON`].
    pub(crate) fn image_mut(&mut self) -> &mut GrayImage {
        &mut self.image
    }
}

/// Infinite line `x·cos(theta) + y·sin(theta) = rho`, `theta` in `[0, π)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, JsonSchema)]
pub struct PolarLine {
    pub rho: f32,
    pub theta: f32,
    /// Accumulator votes the line received
    pub votes: u32,
}

/// A polar line clipped to the image frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, JsonSchema)]
pub struct Segment {
    pub start: [f32; 2],
    pub end: [f32; 2],
}

impl Segment {
    pub fn length(&self) -> f32 {
        let dx = self.end[0] - self.start[0];
        let dy = self.end[1] - self.start[1];
        (dx * dx + dy * dy).sqrt()
    }
}

/// Closed polygon: at least 3 vertices, no consecutive duplicates, closure implied.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Polygon {
    vertices: Vec<[f32; 2]>,
}

impl Polygon {
    /// Build a polygon, collapsing consecutive duplicate vertices (including
    /// the wrap from last to first). Returns `None` if fewer than 3 remain.
    pub fn new(points: Vec<[f32; 2]>) -> Option<Self> {
        let mut vertices: Vec<[f32; 2]> = Vec::with_capacity(points.len());
        for point in points {
            if vertices.last() != Some(&point) {
                vertices.push(point);
            }
        }
        while vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        if vertices.len() < 3 {
            return None;
        }
        Some(Self { vertices })
    }

    pub fn vertices(&self) -> &[[f32; 2]] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Edges as vertex pairs, including the closing edge
    pub fn edges(&self) -> impl Iterator<Item = ([f32; 2], [f32; 2])> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Convert to geo-types Polygon for geometric operations
    pub fn to_geo_polygon(&self) -> GeoPolygon<f32> {
        let coords: Vec<Coord<f32>> = self
            .vertices
            .iter()
            .map(|&[x, y]| Coord { x, y })
            .collect();
        GeoPolygon::new(LineString::new(coords), vec![])
    }

    /// Enclosed area
    pub fn area(&self) -> f32 {
        use geo::Area;
        self.to_geo_polygon().unsigned_area()
    }

    pub fn perimeter(&self) -> f32 {
        self.edges().map(|(a, b)| distance(a, b)).sum()
    }

    /// Get the bounding box of the polygon
    pub fn bounding_box(&self) -> ([f32; 2], [f32; 2]) {
        bounding_box(&self.vertices)
    }

    /// Signed exterior angle at each vertex, in radians within (-π, π]
    pub fn turning_angles(&self) -> Vec<f32> {
        let n = self.vertices.len();
        (0..n)
            .map(|i| {
                let prev = self.vertices[(i + n - 1) % n];
                let cur = self.vertices[i];
                let next = self.vertices[(i + 1) % n];
                let a = [cur[0] - prev[0], cur[1] - prev[1]];
                let b = [next[0] - cur[0], next[1] - cur[1]];
                let cross = a[0] * b[1] - a[1] * b[0];
                let dot = a[0] * b[0] + a[1] * b[1];
                cross.atan2(dot)
            })
            .collect()
    }

    pub fn regularity(&self) -> Regularity {
        let lengths: Vec<f32> = self.edges().map(|(a, b)| distance(a, b)).collect();
        let turns: Vec<f32> = self.turning_angles().iter().map(|t| t.abs()).collect();
        Regularity {
            edge_length_cv: coefficient_of_variation(&lengths),
            turning_angle_cv: coefficient_of_variation(&turns),
        }
    }
}

/// How uniform a polygon's edges and corners are; 0 is perfectly regular.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, JsonSchema)]
pub struct Regularity {
    /// Standard deviation of edge lengths over their mean
    pub edge_length_cv: f32,
    /// Standard deviation of absolute turning angles over their mean
    pub turning_angle_cv: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub enum ShapeLabel {
    Triangle,
    Quadrilateral,
    Pentagon,
    Hexagon,
    /// Polygon with an unrecognized vertex count
    NGon(usize),
    CircleLike,
}

impl ShapeLabel {
    /// Vertex count implied by the label; `None` for circle-like shapes
    pub fn vertex_count(&self) -> Option<usize> {
        match self {
            Self::Triangle => Some(3),
            Self::Quadrilateral => Some(4),
            Self::Pentagon => Some(5),
            Self::Hexagon => Some(6),
            Self::NGon(n) => Some(*n),
            Self::CircleLike => None,
        }
    }
}

impl fmt::Display for ShapeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Triangle => write!(f, "triangle"),
            Self::Quadrilateral => write!(f, "quadrilateral"),
            Self::Pentagon => write!(f, "pentagon"),
            Self::Hexagon => write!(f, "hexagon"),
            Self::NGon(n) => write!(f, "{n}-gon"),
            Self::CircleLike => write!(f, "circle-like"),
        }
    }
}

/// Vertex mean of a polygon, with its offset from the image centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, JsonSchema)]
pub struct Centroid {
    pub point: [f32; 2],
    /// `point - (width / 2, height / 2)`
    pub offset: [f32; 2],
}

/// Which buffer the detected polygon was traced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PolygonSource {
    /// A cell enclosed by the detected lines
    LineBuffer,
    /// The edge map itself, when no line cell was backed by edges
    EdgeMap,
}

/// Final result of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Detection {
    pub polygon: Polygon,
    pub label: ShapeLabel,
    pub centroid: Centroid,
    pub regularity: Regularity,
    pub source: PolygonSource,
    /// Original image dimensions
    pub image_width: u32,
    pub image_height: u32,
}

pub(crate) fn distance(a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    (dx * dx + dy * dy).sqrt()
}

pub(crate) fn bounding_box(points: &[[f32; 2]]) -> ([f32; 2], [f32; 2]) {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;

    for &[x, y] in points {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    ([min_x, min_y], [max_x, max_y])
}

fn coefficient_of_variation(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    if mean.abs() <= f32::EPSILON {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
    variance.sqrt() / mean.abs()
}
