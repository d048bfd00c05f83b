//! Filled disc rasterization for area bodies

use std::collections::HashSet;

use glam::{IVec2, Vec2};

use super::{DiscKernel, isqrt};
use crate::to_pixel;

/// Every lattice point inside the disc, by bounding-box column scan
pub fn points_in_disc(center: Vec2, radius: f32) -> HashSet<IVec2> {
    let center = to_pixel(center);
    let kernel = DiscKernel::new(radius);
    let mut points = HashSet::with_capacity(kernel.size_hint());

    let extent = kernel.extent();
    for dx in -extent..=extent {
        let Some(h) = kernel.column_half_height(dx) else {
            continue;
        };
        for dy in -h..=h {
            points.insert(center + IVec2::new(dx, dy));
        }
    }
    points
}

/// Same set as [`points_in_disc`], computing one octant and mirroring it
pub fn points_in_disc_symmetric(center: Vec2, radius: f32) -> HashSet<IVec2> {
    let center = to_pixel(center);
    let r_sq = DiscKernel::new(radius).r_sq();
    let mut points = HashSet::new();

    // Octant 0 <= x <= y
    let mut x: i32 = 0;
    while 2 * (x as i64) * (x as i64) <= r_sq as i64 {
        let y_max = isqrt(r_sq - x * x);
        for y in x..=y_max {
            for (a, b) in [(x, y), (y, x)] {
                points.insert(center + IVec2::new(a, b));
                points.insert(center + IVec2::new(-a, b));
                points.insert(center + IVec2::new(a, -b));
                points.insert(center + IVec2::new(-a, -b));
            }
        }
        x += 1;
    }
    points
}
