//! Clipping polar lines to the frame and drawing them onto a shared buffer.
//!
//! The clipping axis follows the line's orientation so the division is always
//! by the larger of `cos θ` / `sin θ`: near-vertical lines are intersected
//! with the first and last rows, near-horizontal ones with the first and last
//! columns.
use std::f32::consts::FRAC_PI_4;

use image::Luma;
use tracing::{debug, warn};

use crate::{
    error::{Result, ShapeError},
    types::{EdgeMap, PolarLine, Segment},
};

/// Lines drawn onto one buffer, plus the segments that produced it
#[derive(Debug, Clone)]
pub struct LineBuffer {
    pub buffer: EdgeMap,
    pub segments: Vec<Segment>,
    /// Lines skipped because they could not be clipped to the frame
    pub skipped: usize,
}

/// `θ < π/4` or `θ > 3π/4`
pub fn is_near_vertical(theta: f32) -> bool {
    theta < FRAC_PI_4 || theta > 3.0 * FRAC_PI_4
}

/// Clip an infinite polar line to the `width × height` frame.
pub fn rasterize(line: &PolarLine, width: u32, height: u32) -> Result<Segment> {
    if width == 0 || height == 0 {
        return Err(ShapeError::InvalidInput(format!(
            "cannot clip to a {width}x{height} frame"
        )));
    }

    let degenerate = || ShapeError::DegenerateLine {
        rho: line.rho,
        theta: line.theta,
    };
    let (cos, sin) = (line.theta.cos(), line.theta.sin());
    let max_x = (width - 1) as f32;
    let max_y = (height - 1) as f32;

    let (start, end) = if is_near_vertical(line.theta) {
        if cos.abs() <= f32::EPSILON {
            return Err(degenerate());
        }
        (
            [line.rho / cos, 0.0],
            [(line.rho - max_y * sin) / cos, max_y],
        )
    } else {
        if sin.abs() <= f32::EPSILON {
            return Err(degenerate());
        }
        (
            [0.0, line.rho / sin],
            [max_x, (line.rho - max_x * cos) / sin],
        )
    };

    if !start.iter().chain(end.iter()).all(|v| v.is_finite()) {
        return Err(degenerate());
    }

    clip_to_frame(start, end, max_x, max_y).ok_or_else(degenerate)
}

/// Liang–Barsky clip of a segment to `[0, max_x] × [0, max_y]`
fn clip_to_frame(start: [f32; 2], end: [f32; 2], max_x: f32, max_y: f32) -> Option<Segment> {
    let dx = end[0] - start[0];
    let dy = end[1] - start[1];
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;

    let bounds = [
        (-dx, start[0]),
        (dx, max_x - start[0]),
        (-dy, start[1]),
        (dy, max_y - start[1]),
    ];
    for (p, q) in bounds {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some(Segment {
        start: [start[0] + t0 * dx, start[1] + t0 * dy],
        end: [start[0] + t1 * dx, start[1] + t1 * dy],
    })
}

/// Rasterize every line onto a fresh buffer. Lines that cannot be clipped are
/// skipped; any other failure aborts.
pub fn draw_lines(lines: &[PolarLine], width: u32, height: u32) -> Result<LineBuffer> {
    let mut buffer = EdgeMap::new(width, height);
    let mut segments = Vec::with_capacity(lines.len());
    let mut skipped = 0;

    for line in lines {
        match rasterize(line, width, height) {
            Ok(segment) => {
                imageproc::drawing::draw_line_segment_mut(
                    buffer.image_mut(),
                    (segment.start[0], segment.start[1]),
                    (segment.end[0], segment.end[1]),
                    Luma([EdgeMap::ON]),
                );
                segments.push(segment);
            }
            Err(err) if err.is_recoverable() => {
                warn!(%err, "skipping line");
                skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    debug!(drawn = segments.len(), skipped, "rasterized lines");
    Ok(LineBuffer {
        buffer,
        segments,
        skipped,
    })
}
