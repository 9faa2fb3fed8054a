//! Overlays of intermediate pipeline results, for eyeballing a run.
//!
//! Colours come from a fixed palette indexed by item order, so the same run
//! always renders the same picture.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_line_segment_mut};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

use crate::{pipeline::PipelineRun, types::Polygon};

#[derive(
    Debug, Clone, Copy,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[strum(serialize_all = "snake_case")]
pub enum DebugView {
    /// The binary edge map
    Edges,
    /// Detected lines drawn over the source image
    Lines,
    /// Simplified polygons from the line buffer and, after a fallback, the
    /// edge map, with the detection's vertices and centroid marked
    Contours,
}

impl DebugView {
    /// Accepted spellings, for help text
    pub fn names() -> &'static [&'static str] {
        Self::VARIANTS
    }
}

pub const PALETTE: [Rgb<u8>; 8] = [
    Rgb([230, 25, 75]),
    Rgb([60, 180, 75]),
    Rgb([255, 225, 25]),
    Rgb([0, 130, 200]),
    Rgb([245, 130, 48]),
    Rgb([145, 30, 180]),
    Rgb([70, 240, 240]),
    Rgb([240, 50, 230]),
];

const EDGE: Rgb<u8> = Rgb([255, 255, 255]);
const VERTEX: Rgb<u8> = Rgb([255, 255, 255]);
const CENTROID: Rgb<u8> = Rgb([255, 0, 0]);

fn palette(index: usize) -> Rgb<u8> {
    PALETTE[index % PALETTE.len()]
}

/// Render one view of `run`. `source` is the grayscale image the run was made from.
pub fn render(run: &PipelineRun, source: &GrayImage, view: DebugView) -> RgbImage {
    match view {
        DebugView::Edges => render_edges(run),
        DebugView::Lines => render_lines(run, source),
        DebugView::Contours => render_contours(run),
    }
}

fn render_edges(run: &PipelineRun) -> RgbImage {
    let mut canvas = RgbImage::new(run.edges.width(), run.edges.height());
    for (x, y) in run.edges.edge_pixels() {
        canvas.put_pixel(x, y, EDGE);
    }
    canvas
}

fn render_lines(run: &PipelineRun, source: &GrayImage) -> RgbImage {
    let mut canvas = RgbImage::from_fn(source.width(), source.height(), |x, y| {
        let v = source.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    });
    for (i, segment) in run.line_buffer.segments.iter().enumerate() {
        draw_line_segment_mut(
            &mut canvas,
            (segment.start[0], segment.start[1]),
            (segment.end[0], segment.end[1]),
            palette(i),
        );
    }
    canvas
}

fn render_contours(run: &PipelineRun) -> RgbImage {
    let (width, height) = (run.edges.width(), run.edges.height());
    let mut canvas = RgbImage::new(width, height);
    for (i, polygon) in run.polygons.iter().chain(&run.edge_polygons).enumerate() {
        draw_outline(&mut canvas, polygon, palette(i));
    }

    if let Some(detection) = &run.detection {
        for &[x, y] in detection.polygon.vertices() {
            draw_cross_mut(&mut canvas, VERTEX, x.round() as i32, y.round() as i32);
        }
        let [cx, cy] = detection.centroid.point;
        draw_cross_mut(&mut canvas, CENTROID, cx.round() as i32, cy.round() as i32);
    }
    canvas
}

fn draw_outline(canvas: &mut RgbImage, polygon: &Polygon, color: Rgb<u8>) {
    for (a, b) in polygon.edges() {
        draw_line_segment_mut(canvas, (a[0], a[1]), (b[0], b[1]), color);
    }
}
