//! Gradient-magnitude edge extraction with hysteresis thresholding.
//!
//! - Sobel 3×3 derivatives (`imageproc::gradients`), L2 magnitude.
//! - Optional Gaussian pre-blur for `smoothing_radius > 1`.
//! - Optional non-maximum suppression along the quantized gradient direction.
//! - Hysteresis: magnitudes above `high` seed edges, which then grow through
//!   8-connected pixels whose magnitude is at least `low`.
use std::collections::VecDeque;

use image::GrayImage;
use tracing::debug;

use crate::{
    config::EdgeConfig,
    error::{Result, ShapeError},
    traits::EdgeExtractor,
    types::EdgeMap,
};

const TAN_22_5_DEG: f32 = 0.414_213_57;

const NEIGHBORS_8: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Sobel + hysteresis edge extractor
#[derive(Debug, Clone, Default)]
pub struct HysteresisEdgeExtractor {
    pub config: EdgeConfig,
}

impl HysteresisEdgeExtractor {
    pub fn new(config: EdgeConfig) -> Self {
        Self { config }
    }
}

impl EdgeExtractor for HysteresisEdgeExtractor {
    fn extract(&self, image: &GrayImage) -> Result<EdgeMap> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ShapeError::InvalidInput(format!(
                "image has zero size ({width}x{height})"
            )));
        }

        let gradient = Gradient::compute(image, self.config.smoothing_radius);
        let response = if self.config.thin_edges {
            gradient.suppress_non_maxima()
        } else {
            gradient.magnitude.clone()
        };

        let edges = hysteresis(
            &response,
            width,
            height,
            self.config.low_threshold,
            self.config.high_threshold,
        );
        debug!(width, height, edge_pixels = edges.count(), "extracted edges");
        Ok(edges)
    }
}

/// Per-pixel derivative buffers, row-major
struct Gradient {
    width: usize,
    height: usize,
    gx: Vec<f32>,
    gy: Vec<f32>,
    magnitude: Vec<f32>,
}

impl Gradient {
    fn compute(image: &GrayImage, smoothing_radius: u32) -> Self {
        let blurred;
        let source = if smoothing_radius > 1 {
            blurred = imageproc::filter::gaussian_blur_f32(image, (smoothing_radius - 1) as f32);
            &blurred
        } else {
            image
        };

        let gx: Vec<f32> = imageproc::gradients::horizontal_sobel(source)
            .pixels()
            .map(|p| f32::from(p[0]))
            .collect();
        let gy: Vec<f32> = imageproc::gradients::vertical_sobel(source)
            .pixels()
            .map(|p| f32::from(p[0]))
            .collect();
        let magnitude = gx
            .iter()
            .zip(&gy)
            .map(|(x, y)| (x * x + y * y).sqrt())
            .collect();

        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            gx,
            gy,
            magnitude,
        }
    }

    /// Keep a pixel only if it peaks along its gradient direction. On plateaus
    /// the first pixel (lower side) wins, so flat ridges still leave one pixel.
    fn suppress_non_maxima(&self) -> Vec<f32> {
        let (w, h) = (self.width, self.height);
        let mut thinned = vec![0.0; w * h];
        if w < 3 || h < 3 {
            return thinned;
        }

        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let idx = y * w + x;
                let mag = self.magnitude[idx];
                if mag == 0.0 {
                    continue;
                }

                let gx = self.gx[idx];
                let gy = self.gy[idx];
                let (abs_gx, abs_gy) = (gx.abs(), gy.abs());
                let (dx, dy): (isize, isize) = if abs_gy <= abs_gx * TAN_22_5_DEG {
                    (1, 0)
                } else if abs_gx <= abs_gy * TAN_22_5_DEG {
                    (0, 1)
                } else if (gx >= 0.0) == (gy >= 0.0) {
                    (1, 1)
                } else {
                    (1, -1)
                };

                let behind = (y as isize - dy) as usize * w + (x as isize - dx) as usize;
                let ahead = (y as isize + dy) as usize * w + (x as isize + dx) as usize;
                if mag > self.magnitude[behind] && mag >= self.magnitude[ahead] {
                    thinned[idx] = mag;
                }
            }
        }
        thinned
    }
}

fn hysteresis(response: &[f32], width: u32, height: u32, low: f32, high: f32) -> EdgeMap {
    let (w, h) = (width as usize, height as usize);
    let mut edges = EdgeMap::new(width, height);
    let mut visited = vec![false; w * h];
    let mut queue = VecDeque::new();

    for (idx, &value) in response.iter().enumerate() {
        if value > high {
            visited[idx] = true;
            queue.push_back(idx);
        }
    }

    while let Some(idx) = queue.pop_front() {
        let (x, y) = (idx % w, idx / w);
        edges.set(x as u32, y as u32);

        for (dx, dy) in NEIGHBORS_8 {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                continue;
            }
            let nidx = ny as usize * w + nx as usize;
            if !visited[nidx] && response[nidx] >= low {
                visited[nidx] = true;
                queue.push_back(nidx);
            }
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn filled_square(size: u32, from: u32, to: u32) -> GrayImage {
        let mut img = GrayImage::new(size, size);
        for y in from..to {
            for x in from..to {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        img
    }

    #[test]
    fn blank_image_has_no_edges() {
        let image = GrayImage::new(64, 48);
        let edges = HysteresisEdgeExtractor::default().extract(&image).unwrap();
        assert_eq!(edges.count(), 0);
        assert_eq!(edges.width(), 64);
        assert_eq!(edges.height(), 48);
    }

    #[test]
    fn empty_image_is_invalid_input() {
        let image = GrayImage::new(0, 10);
        let result = HysteresisEdgeExtractor::default().extract(&image);
        assert!(matches!(result, Err(ShapeError::InvalidInput(_))));
    }

    #[test]
    fn square_boundary_becomes_edges() {
        let image = filled_square(40, 10, 30);
        let edges = HysteresisEdgeExtractor::default().extract(&image).unwrap();

        assert!(edges.is_edge(10, 20));
        assert!(edges.is_edge(29, 20));
        assert!(!edges.is_edge(20, 20), "flat interior must not be an edge");
        assert!(!edges.is_edge(2, 2), "flat background must not be an edge");
        assert!(edges.as_image().pixels().all(|p| p[0] == 0 || p[0] == EdgeMap::ON));
    }

    #[test]
    fn weak_step_below_low_threshold_is_ignored() {
        // A 20-level step gives a Sobel magnitude of 80, under the default low of 125.
        let mut image = GrayImage::new(30, 30);
        for (x, _, pixel) in image.enumerate_pixels_mut() {
            *pixel = Luma([if x < 15 { 100 } else { 120 }]);
        }
        let edges = HysteresisEdgeExtractor::default().extract(&image).unwrap();
        assert_eq!(edges.count(), 0);
    }

    #[test]
    fn weak_pixels_survive_only_when_connected_to_strong_ones() {
        let response = vec![
            400.0, 200.0, 200.0, 0.0, 200.0, //
            0.0, 0.0, 0.0, 0.0, 0.0,
        ];
        let edges = hysteresis(&response, 5, 2, 125.0, 350.0);
        assert!(edges.is_edge(0, 0));
        assert!(edges.is_edge(1, 0));
        assert!(edges.is_edge(2, 0));
        assert!(!edges.is_edge(4, 0), "isolated weak pixel must be dropped");
        assert_eq!(edges.count(), 3);
    }

    #[test]
    fn thinning_keeps_one_pixel_across_a_step() {
        let image = filled_square(40, 10, 30);
        let extractor = HysteresisEdgeExtractor::new(EdgeConfig {
            thin_edges: true,
            ..EdgeConfig::default()
        });
        let thick = HysteresisEdgeExtractor::default().extract(&image).unwrap();
        let thin = extractor.extract(&image).unwrap();

        assert!(thin.count() > 0);
        assert!(thin.count() < thick.count());
        let row: Vec<u32> = (0..20).filter(|&x| thin.is_edge(x, 20)).collect();
        assert_eq!(row.len(), 1, "left side of the square thins to one pixel");
    }

    #[test]
    fn extraction_is_deterministic() {
        let image = filled_square(50, 12, 37);
        let extractor = HysteresisEdgeExtractor::default();
        assert_eq!(
            extractor.extract(&image).unwrap(),
            extractor.extract(&image).unwrap()
        );
    }
}
