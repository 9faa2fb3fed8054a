//! Line detection by (rho, theta) voting.
//!
//! Every edge pixel votes once per theta column at its rounded rho. Cells
//! above `min_votes` that are strict local maxima of their 3×3 neighbourhood
//! become candidate peaks. The theta axis wraps at π with rho mirrored, so a
//! line near θ = 0 and its twin near θ = π compete for the same peak.
//!
//! A wide edge band leaves a fan of such peaks: lines tilted by a few degrees
//! that still cross the band along most of its length. Candidates are taken
//! strongest first, and one that is within `merge_angle` of an accepted line
//! and comes within `merge_distance` of it inside the frame is dropped.
use std::f32::consts::PI;

use tracing::debug;

use crate::{config::LineConfig, traits::LineDetector, types::{EdgeMap, PolarLine}};

#[derive(Debug, Clone, Default)]
pub struct HoughLineDetector {
    pub config: LineConfig,
}

impl HoughLineDetector {
    pub fn new(config: LineConfig) -> Self {
        Self { config }
    }
}

impl LineDetector for HoughLineDetector {
    fn detect(&self, edges: &EdgeMap) -> Vec<PolarLine> {
        let accumulator = Accumulator::vote(edges, self.config.angle_resolution);
        let peaks = accumulator.peaks(self.config.min_votes);
        let candidates = peaks.len();
        let lines = merge_duplicates(
            peaks,
            self.config.merge_angle,
            self.config.merge_distance,
            edges.width(),
            edges.height(),
        );
        debug!(
            thetas = accumulator.thetas.len(),
            rho_bins = accumulator.rho_bins,
            candidates,
            lines = lines.len(),
            "detected lines"
        );
        lines
    }
}

/// Keep peaks in order, dropping each one that repeats an already kept line.
fn merge_duplicates(
    peaks: Vec<PolarLine>,
    max_angle: f32,
    max_distance: f32,
    width: u32,
    height: u32,
) -> Vec<PolarLine> {
    let max_x = width.saturating_sub(1) as f32;
    let max_y = height.saturating_sub(1) as f32;
    let mut kept: Vec<PolarLine> = Vec::with_capacity(peaks.len());
    for peak in peaks {
        let repeated = kept
            .iter()
            .any(|line| same_edge(line, &peak, max_angle, max_distance, max_x, max_y));
        if !repeated {
            kept.push(peak);
        }
    }
    kept
}

fn same_edge(
    kept: &PolarLine,
    other: &PolarLine,
    max_angle: f32,
    max_distance: f32,
    max_x: f32,
    max_y: f32,
) -> bool {
    let angle = (kept.theta - other.theta).abs();
    if angle.min(PI - angle) > max_angle {
        return false;
    }
    let Some((a, b)) = span_in_frame(kept, max_x, max_y) else {
        return false;
    };
    let (da, db) = (signed_distance(other, a), signed_distance(other, b));
    // Opposite signs: the lines cross inside the frame
    da * db <= 0.0 || da.abs().min(db.abs()) <= max_distance
}

/// End points of the part of `line` inside `[0, max_x] × [0, max_y]`
fn span_in_frame(line: &PolarLine, max_x: f32, max_y: f32) -> Option<([f32; 2], [f32; 2])> {
    let (sin, cos) = line.theta.sin_cos();
    let foot = [line.rho * cos, line.rho * sin];
    let dir = [-sin, cos];

    let mut lo = f32::NEG_INFINITY;
    let mut hi = f32::INFINITY;
    for (origin, step, max) in [(foot[0], dir[0], max_x), (foot[1], dir[1], max_y)] {
        if step.abs() <= f32::EPSILON {
            if origin < 0.0 || origin > max {
                return None;
            }
            continue;
        }
        let (t0, t1) = (-origin / step, (max - origin) / step);
        lo = lo.max(t0.min(t1));
        hi = hi.min(t0.max(t1));
    }
    if lo > hi {
        return None;
    }

    let at = |t: f32| [foot[0] + t * dir[0], foot[1] + t * dir[1]];
    Some((at(lo), at(hi)))
}

fn signed_distance(line: &PolarLine, p: [f32; 2]) -> f32 {
    let (sin, cos) = line.theta.sin_cos();
    p[0] * cos + p[1] * sin - line.rho
}

struct Accumulator {
    thetas: Vec<f32>,
    /// Index of rho = 0
    rho_offset: usize,
    rho_bins: usize,
    /// `votes[theta_idx * rho_bins + rho_idx]`
    votes: Vec<u32>,
}

impl Accumulator {
    fn vote(edges: &EdgeMap, angle_resolution: f32) -> Self {
        let count = (PI / angle_resolution).round().max(1.0) as usize;
        let thetas: Vec<f32> = (0..count)
            .map(|i| i as f32 * angle_resolution)
            .filter(|&theta| theta < PI)
            .collect();
        let trig: Vec<(f32, f32)> = thetas.iter().map(|t| (t.cos(), t.sin())).collect();

        let (w, h) = (edges.width() as f32, edges.height() as f32);
        let rho_offset = (w * w + h * h).sqrt().ceil() as usize + 1;
        let rho_bins = 2 * rho_offset + 1;
        let mut votes = vec![0u32; thetas.len() * rho_bins];

        for (x, y) in edges.edge_pixels() {
            let (x, y) = (x as f32, y as f32);
            for (t, &(cos, sin)) in trig.iter().enumerate() {
                let rho = (x * cos + y * sin).round() as i64;
                let r = (rho + rho_offset as i64) as usize;
                votes[t * rho_bins + r] += 1;
            }
        }

        Self {
            thetas,
            rho_offset,
            rho_bins,
            votes,
        }
    }

    fn at(&self, t: usize, r: usize) -> u32 {
        self.votes[t * self.rho_bins + r]
    }

    /// Neighbour cell `(t + dt, r + dr)`, wrapping theta across π by mirroring rho
    fn neighbor(&self, t: usize, r: usize, dt: i64, dr: i64) -> Option<(usize, usize)> {
        let n = self.thetas.len() as i64;
        let mut nt = t as i64 + dt;
        let mut nr = r as i64 + dr;
        if nt < 0 || nt >= n {
            if n < 2 {
                return None;
            }
            nt = nt.rem_euclid(n);
            nr = 2 * self.rho_offset as i64 - nr;
        }
        if nr < 0 || nr >= self.rho_bins as i64 {
            return None;
        }
        Some((nt as usize, nr as usize))
    }

    /// On equal votes the cell with the smaller (theta, rho) key wins.
    fn is_local_max(&self, t: usize, r: usize) -> bool {
        let votes = self.at(t, r);
        for dt in -1..=1 {
            for dr in -1..=1 {
                if dt == 0 && dr == 0 {
                    continue;
                }
                let Some((nt, nr)) = self.neighbor(t, r, dt, dr) else {
                    continue;
                };
                if (nt, nr) == (t, r) {
                    continue;
                }
                let other = self.at(nt, nr);
                if other > votes || (other == votes && (nt, nr) < (t, r)) {
                    return false;
                }
            }
        }
        true
    }

    fn peaks(&self, min_votes: u32) -> Vec<PolarLine> {
        let mut found: Vec<(u32, usize, usize)> = Vec::new();
        for t in 0..self.thetas.len() {
            for r in 0..self.rho_bins {
                let votes = self.at(t, r);
                if votes >= min_votes && self.is_local_max(t, r) {
                    found.push((votes, t, r));
                }
            }
        }

        found.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
        found
            .into_iter()
            .map(|(votes, t, r)| PolarLine {
                rho: r as f32 - self.rho_offset as f32,
                theta: self.thetas[t],
                votes,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn map_with(width: u32, height: u32, pixels: impl IntoIterator<Item = (u32, u32)>) -> EdgeMap {
        let mut map = EdgeMap::new(width, height);
        for (x, y) in pixels {
            map.set(x, y);
        }
        map
    }

    fn detector(min_votes: u32) -> HoughLineDetector {
        HoughLineDetector::new(LineConfig {
            min_votes,
            ..LineConfig::default()
        })
    }

    #[test]
    fn empty_map_yields_no_lines() {
        let map = EdgeMap::new(50, 50);
        assert!(detector(1).detect(&map).is_empty());
    }

    #[test]
    fn vertical_line_is_found_at_theta_zero() {
        let map = map_with(100, 100, (0..100).map(|y| (30, y)));
        let lines = detector(80).detect(&map);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].rho, 30.0);
        assert_eq!(lines[0].theta, 0.0);
        assert_eq!(lines[0].votes, 100);
    }

    #[test]
    fn horizontal_line_is_found_at_half_pi() {
        let map = map_with(120, 90, (0..120).map(|x| (x, 45)));
        let lines = detector(80).detect(&map);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].rho, 45.0);
        assert!((lines[0].theta - FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn weak_lines_are_rejected() {
        let map = map_with(100, 100, (0..50).map(|y| (10, y)));
        assert!(detector(80).detect(&map).is_empty());
        assert_eq!(detector(40).detect(&map).len(), 1);
    }

    #[test]
    fn lines_are_ordered_by_votes() {
        let long = (0..100).map(|y| (20, y));
        let short = (0..90).map(|x| (x, 70));
        let map = map_with(100, 100, long.chain(short));
        let lines = detector(80).detect(&map);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].votes, 100);
        assert_eq!(lines[0].rho, 20.0);
        assert_eq!(lines[1].rho, 70.0);
        assert!(lines.iter().all(|l| (0.0..PI).contains(&l.theta)));
    }

    #[test]
    fn detection_is_deterministic() {
        let diagonal = (0..80).map(|i| (i + 10, i + 5));
        let vertical = (0..90).map(|y| (60, y));
        let map = map_with(100, 100, diagonal.chain(vertical));
        let detector = detector(50);
        assert_eq!(detector.detect(&map), detector.detect(&map));
    }

    /// Column of the line through row `y`
    fn x_at(line: &PolarLine, y: f32) -> f32 {
        (line.rho - y * line.theta.sin()) / line.theta.cos()
    }

    #[test]
    fn wide_band_yields_one_line() {
        let band = (0..100).flat_map(|y| (40..44).map(move |x| (x, y)));
        let map = map_with(100, 100, band);
        let lines = detector(80).detect(&map);

        assert_eq!(lines.len(), 1, "{lines:?}");
        let x = x_at(&lines[0], 50.0);
        assert!((39.0..=44.0).contains(&x), "line misses the band: x={x}");
    }

    #[test]
    fn parallel_bands_stay_separate() {
        let left = (0..100).flat_map(|y| (20..24).map(move |x| (x, y)));
        let right = (0..100).flat_map(|y| (60..64).map(move |x| (x, y)));
        let map = map_with(100, 100, left.chain(right));
        let lines = detector(80).detect(&map);

        assert_eq!(lines.len(), 2, "{lines:?}");
        let mut xs: Vec<f32> = lines.iter().map(|l| x_at(l, 50.0)).collect();
        xs.sort_by(f32::total_cmp);
        assert!((19.0..=24.0).contains(&xs[0]));
        assert!((59.0..=64.0).contains(&xs[1]));
    }

    #[test]
    fn tilted_band_yields_one_line() {
        // 4 px wide band along y = x / 2 + 20
        let band = (0..160).flat_map(|x| (0..4).map(move |d| (x, x / 2 + 20 + d)));
        let map = map_with(160, 120, band);
        let lines = detector(80).detect(&map);

        assert_eq!(lines.len(), 1, "{lines:?}");
    }

    #[test]
    fn crossing_lines_are_not_merged() {
        let kept = PolarLine { rho: 50.0, theta: 0.0, votes: 100 };
        let across = PolarLine { rho: 50.0, theta: FRAC_PI_2, votes: 90 };
        let tilted = PolarLine { rho: 52.0, theta: 0.03, votes: 90 };
        let parallel = PolarLine { rho: 80.0, theta: 0.0, votes: 90 };

        assert!(!same_edge(&kept, &across, PI / 30.0, 6.0, 99.0, 99.0));
        assert!(same_edge(&kept, &tilted, PI / 30.0, 6.0, 99.0, 99.0));
        assert!(!same_edge(&kept, &parallel, PI / 30.0, 6.0, 99.0, 99.0));
    }

    #[test]
    fn near_vertical_twins_across_the_wrap_are_merged() {
        let kept = PolarLine { rho: 30.0, theta: 0.0, votes: 100 };
        // θ just under π with negative ρ is a line close to x = 30
        let twin = PolarLine { rho: -30.5, theta: PI - 0.02, votes: 90 };
        assert!(same_edge(&kept, &twin, PI / 30.0, 6.0, 99.0, 99.0));
    }

    #[test]
    fn theta_wraps_with_mirrored_rho() {
        let map = map_with(10, 10, [(3, 3)]);
        let acc = Accumulator::vote(&map, PI / 180.0);
        let last = acc.thetas.len() - 1;
        let r = acc.rho_offset + 4;
        assert_eq!(acc.neighbor(0, r, -1, 0), Some((last, acc.rho_offset - 4)));
    }
}
