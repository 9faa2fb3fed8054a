use std::f32::consts::{FRAC_PI_2, PI, TAU};

use image::{GrayImage, Luma};

/// White polygon outline on black, `stroke` pixels thick
pub(crate) fn stroked_polygon(
    width: u32,
    height: u32,
    vertices: &[[f32; 2]],
    stroke: u32,
) -> GrayImage {
    let mut image = GrayImage::new(width, height);
    let n = vertices.len();
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        for dy in 0..stroke {
            for dx in 0..stroke {
                let (dx, dy) = (dx as f32, dy as f32);
                imageproc::drawing::draw_line_segment_mut(
                    &mut image,
                    (a[0] + dx, a[1] + dy),
                    (b[0] + dx, b[1] + dy),
                    Luma([255u8]),
                );
            }
        }
    }
    image
}

/// Regular polygon with a horizontal bottom edge
pub(crate) fn regular_polygon(center: [f32; 2], radius: f32, sides: usize) -> Vec<[f32; 2]> {
    let start = FRAC_PI_2 + PI / sides as f32;
    (0..sides)
        .map(|i| {
            let angle = start + TAU * i as f32 / sides as f32;
            [
                center[0] + radius * angle.cos(),
                center[1] + radius * angle.sin(),
            ]
        })
        .collect()
}
