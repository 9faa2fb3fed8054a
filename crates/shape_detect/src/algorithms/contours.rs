use geo_types::{Coord, LineString};
use imageproc::contours::BorderType;
use tracing::debug;

use crate::{
    config::{ContourBorders, ContourConfig},
    traits::PolygonExtractor,
    types::{bounding_box, distance, EdgeMap, Polygon},
};

/// Border-following contour tracer followed by closed Douglas-Peucker simplification
#[derive(Debug, Clone, Default)]
pub struct ContourPolygonExtractor {
    pub config: ContourConfig,
}

impl ContourPolygonExtractor {
    pub fn new(config: ContourConfig) -> Self {
        Self { config }
    }
}

impl PolygonExtractor for ContourPolygonExtractor {
    fn extract(&self, buffer: &EdgeMap) -> Vec<Polygon> {
        let mut contours = trace_contours(
            buffer,
            self.config.min_contour_pixels,
            self.config.borders,
        );
        if self.config.drop_frame_contours {
            let (w, h) = (buffer.width() as f32, buffer.height() as f32);
            contours.retain(|contour| !touches_frame(contour, w, h));
        }
        let polygons: Vec<Polygon> = contours
            .iter()
            .filter_map(|contour| {
                let epsilon = tolerance_for(contour, self.config.tolerance_ratio);
                Polygon::new(simplify_closed(contour, epsilon))
            })
            .collect();

        debug!(
            contours = contours.len(),
            polygons = polygons.len(),
            "extracted polygons"
        );
        polygons
    }
}

/// Borders of the foreground as ordered pixel loops, without loops shorter
/// than `min_pixels`.
pub fn trace_contours(
    buffer: &EdgeMap,
    min_pixels: usize,
    borders: ContourBorders,
) -> Vec<Vec<[f32; 2]>> {
    imageproc::contours::find_contours::<i32>(buffer.as_image())
        .into_iter()
        .filter(|contour| match borders {
            ContourBorders::All => true,
            ContourBorders::Holes => contour.border_type == BorderType::Hole,
        })
        .filter(|contour| contour.points.len() >= min_pixels)
        .map(|contour| {
            contour
                .points
                .iter()
                .map(|p| [p.x as f32, p.y as f32])
                .collect()
        })
        .collect()
}

fn touches_frame(contour: &[[f32; 2]], width: f32, height: f32) -> bool {
    contour
        .iter()
        .any(|&[x, y]| x <= 0.0 || y <= 0.0 || x >= width - 1.0 || y >= height - 1.0)
}

/// `ratio` times the diagonal of the points' bounding box
pub fn tolerance_for(points: &[[f32; 2]], ratio: f32) -> f32 {
    if points.is_empty() {
        return 0.0;
    }
    let (min, max) = bounding_box(points);
    ratio * (max[0] - min[0]).hypot(max[1] - min[1])
}

/// Douglas-Peucker over a closed loop.
///
/// The loop is cut at its first point and the point farthest from it, each
/// half is simplified as an open polyline, and the halves are joined back in
/// the original order. The first point is dropped afterwards if it sits
/// within `epsilon` of the chord between its neighbours.
///
/// A pass only ever keeps a subsequence of its input, so passes repeat until
/// one removes nothing. The result is a fixed point: simplifying it again with
/// the same `epsilon` returns it unchanged.
pub fn simplify_closed(points: &[[f32; 2]], epsilon: f32) -> Vec<[f32; 2]> {
    let mut current = simplify_pass(points, epsilon);
    loop {
        let next = simplify_pass(&current, epsilon);
        if next.len() == current.len() {
            return current;
        }
        current = next;
    }
}

fn simplify_pass(points: &[[f32; 2]], epsilon: f32) -> Vec<[f32; 2]> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let mut far = 0;
    let mut far_distance = 0.0f32;
    for (i, &p) in points.iter().enumerate() {
        let d = (p[0] - first[0]).hypot(p[1] - first[1]);
        if d > far_distance {
            far = i;
            far_distance = d;
        }
    }
    if far == 0 {
        return vec![first];
    }

    let head = simplify_open(&points[..=far], epsilon);
    let mut tail_points = points[far..].to_vec();
    tail_points.push(first);
    let tail = simplify_open(&tail_points, epsilon);

    let mut result = head;
    if tail.len() > 2 {
        result.extend_from_slice(&tail[1..tail.len() - 1]);
    }

    let n = result.len();
    if n > 3 && point_to_segment(result[0], result[n - 1], result[1]) <= epsilon {
        result.remove(0);
    }
    result
}

fn simplify_open(points: &[[f32; 2]], epsilon: f32) -> Vec<[f32; 2]> {
    use geo::Simplify;

    let coords: Vec<Coord<f32>> = points.iter().map(|&[x, y]| Coord { x, y }).collect();
    LineString::new(coords)
        .simplify(&epsilon)
        .coords()
        .map(|coord| [coord.x, coord.y])
        .collect()
}

/// Smallest fraction, over the polygon's sides, of side points that have an
/// edge pixel within `radius` (Chebyshev distance). Sides are sampled about
/// once per pixel.
pub fn edge_support(polygon: &Polygon, edges: &EdgeMap, radius: u32) -> f32 {
    polygon
        .edges()
        .map(|(a, b)| {
            let samples = distance(a, b).ceil().max(1.0) as usize;
            let backed = (0..=samples)
                .filter(|&i| {
                    let t = i as f32 / samples as f32;
                    let p = [a[0] + t * (b[0] - a[0]), a[1] + t * (b[1] - a[1])];
                    has_edge_near(edges, p, radius)
                })
                .count();
            backed as f32 / (samples + 1) as f32
        })
        .fold(1.0, f32::min)
}

fn has_edge_near(edges: &EdgeMap, p: [f32; 2], radius: u32) -> bool {
    let (w, h) = (edges.width() as i64, edges.height() as i64);
    let (cx, cy) = (p[0].round() as i64, p[1].round() as i64);
    let r = radius as i64;
    let (x0, x1) = ((cx - r).max(0), (cx + r).min(w - 1));
    let (y0, y1) = ((cy - r).max(0), (cy + r).min(h - 1));
    (y0..=y1).any(|y| (x0..=x1).any(|x| edges.is_edge(x as u32, y as u32)))
}

fn point_to_segment(p: [f32; 2], a: [f32; 2], b: [f32; 2]) -> f32 {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let ap = [p[0] - a[0], p[1] - a[1]];
    let len_sq = ab[0] * ab[0] + ab[1] * ab[1];
    if len_sq <= f32::EPSILON {
        return ap[0].hypot(ap[1]);
    }
    let t = ((ap[0] * ab[0] + ap[1] * ab[1]) / len_sq).clamp(0.0, 1.0);
    let closest = [a[0] + t * ab[0], a[1] + t * ab[1]];
    (p[0] - closest[0]).hypot(p[1] - closest[1])
}
