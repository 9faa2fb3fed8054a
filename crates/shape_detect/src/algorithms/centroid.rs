use crate::types::{Centroid, Polygon};

/// Arithmetic mean of the polygon's vertices and its offset from the image centre.
///
/// The mean is not area-weighted: simplification can leave small
/// self-intersections, which skew a shoelace centroid but barely move the
/// vertex mean.
pub fn compute(polygon: &Polygon, image_width: u32, image_height: u32) -> Centroid {
    let vertices = polygon.vertices();
    let n = vertices.len().max(1) as f32;
    let (sum_x, sum_y) = vertices
        .iter()
        .fold((0.0f32, 0.0f32), |(sx, sy), &[x, y]| (sx + x, sy + y));
    let point = [sum_x / n, sum_y / n];

    Centroid {
        point,
        offset: [
            point[0] - image_width as f32 / 2.0,
            point[1] - image_height as f32 / 2.0,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_centroid() {
        let square =
            Polygon::new(vec![[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]]).unwrap();
        let centroid = compute(&square, 10, 10);
        assert_eq!(centroid.point, [5.0, 5.0]);
        assert_eq!(centroid.offset, [0.0, 0.0]);
    }

    #[test]
    fn offset_is_relative_to_image_centre() {
        let triangle =
            Polygon::new(vec![[160.0, 40.0], [80.0, 200.0], [240.0, 200.0]]).unwrap();
        let centroid = compute(&triangle, 320, 240);
        assert!((centroid.point[0] - 160.0).abs() < 1e-4);
        assert!((centroid.point[1] - 146.666_67).abs() < 1e-3);
        assert!(centroid.offset[0].abs() < 1e-4);
        assert!((centroid.offset[1] - 26.666_67).abs() < 1e-3);
    }

    #[test]
    fn extra_vertices_pull_the_vertex_mean() {
        // The midpoint vertex on the y = 0 edge pulls the mean towards it; an area centroid would stay at (5, 5)
        let polygon =
            Polygon::new(vec![[0.0, 0.0], [5.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]])
                .unwrap();
        let centroid = compute(&polygon, 0, 0);
        assert_eq!(centroid.point, [5.0, 4.0]);
    }
}
