//! Capsule-swept line rasterization for projectiles
//!
//! A projectile can cross many pixels in one tick. Painting only its end
//! position would leave holes, so the motion is treated as a stadium: a
//! thick segment from the previous to the current position with rounded
//! caps.
//!
//! The line is walked with integer Bresenham steps and the disc footprint
//! is stamped at each step. A step can sit half a pixel off the true line,
//! which would drop rim pixels on diagonals, so each step also emits the
//! ring just outside its disc wherever that ring lies inside the capsule.
//! Both endpoints then get the half of their disc that faces away from the
//! segment. The output is a sequence and may repeat points; painting is
//! idempotent so repeats only cost iterations.

use glam::{I64Vec2, IVec2, Vec2};

use super::DiscKernel;
use crate::to_pixel;

/// Width of the rim ring checked around each step, covering the distance
/// from any point of the segment to its nearest Bresenham step
const RIM_WIDTH: f32 = 1.5;

/// Squared pixel length below 4: neither axis moved by more than a pixel
#[inline]
fn is_degenerate(delta: I64Vec2) -> bool {
    delta.abs().max_element() < 2
}

/// Reusable capsule rasterizer
///
/// Keeps its output buffer and the disc footprints between calls, so a
/// projectile system sweeping hundreds of shots per tick does not allocate.
#[derive(Debug, Default)]
pub struct CapsuleRasterizer {
    points: Vec<IVec2>,
    offsets: Vec<IVec2>,
    /// Widened disc minus the disc itself
    rim: Vec<IVec2>,
    kernel: Option<DiscKernel>,
}

impl CapsuleRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lattice points within `radius` of the segment `[start, end]`
    ///
    /// The returned slice is valid until the next call.
    pub fn sweep(&mut self, start: Vec2, end: Vec2, radius: f32) -> &[IVec2] {
        self.points.clear();
        let kernel = self.load_kernel(radius);

        let from = to_pixel(start);
        let to = to_pixel(end);
        let delta = to.as_i64vec2() - from.as_i64vec2();

        if is_degenerate(delta) {
            stamp(&mut self.points, &self.offsets, from);
            return &self.points;
        }

        let longest = delta.abs().max_element() as usize;
        // One full disc per step plus two half discs
        self.points
            .reserve(self.offsets.len().saturating_mul(longest.saturating_add(3)));

        let capsule = Capsule::new(from, delta, kernel.r_sq());
        self.walk_line(&capsule);
        hemisphere(&mut self.points, &self.offsets, from, -delta);
        hemisphere(&mut self.points, &self.offsets, to, delta);

        &self.points
    }

    fn load_kernel(&mut self, radius: f32) -> DiscKernel {
        let kernel = DiscKernel::new(radius);
        if self.kernel != Some(kernel) {
            self.offsets.clear();
            kernel.offsets_into(&mut self.offsets);

            self.rim.clear();
            kernel.widened(RIM_WIDTH).offsets_into(&mut self.rim);
            self.rim.retain(|&o| !kernel.contains(o));

            self.kernel = Some(kernel);
        }
        kernel
    }

    /// Bresenham walk over the capsule axis, endpoints inclusive
    fn walk_line(&mut self, capsule: &Capsule) {
        let delta = capsule.delta;
        let diagonal = delta.signum();

        let mut longest = delta.x.abs();
        let mut shortest = delta.y.abs();
        let mut straight = I64Vec2::new(delta.x.signum(), 0);
        if longest < shortest {
            std::mem::swap(&mut longest, &mut shortest);
            straight = I64Vec2::new(0, delta.y.signum());
        }

        let mut numerator = longest >> 1;
        let mut pos = capsule.start;
        for _ in 0..=longest {
            // Every step lies between the two i32 endpoints
            let at = pos.as_ivec2();
            stamp(&mut self.points, &self.offsets, at);
            self.points.extend(
                self.rim
                    .iter()
                    .map(|&o| at.saturating_add(o))
                    .filter(|&p| capsule.covers(p)),
            );

            numerator += shortest;
            if numerator >= longest {
                numerator -= longest;
                pos += diagonal;
            } else {
                pos += straight;
            }
        }
    }
}

#[inline]
fn stamp(points: &mut Vec<IVec2>, offsets: &[IVec2], at: IVec2) {
    points.extend(offsets.iter().map(|&o| at.saturating_add(o)));
}

/// Half disc at `center` on the side where `dot(offset, outward) >= 0`
#[inline]
fn hemisphere(points: &mut Vec<IVec2>, offsets: &[IVec2], center: IVec2, outward: I64Vec2) {
    points.extend(
        offsets
            .iter()
            .filter(|o| dot_wide(o.as_i64vec2(), outward) >= 0)
            .map(|&o| center.saturating_add(o)),
    );
}

/// Exact lattice membership for the stadium around `[start, start + delta]`
///
/// Products are taken in i128 so endpoints anywhere in the i32 plane are
/// safe.
#[derive(Debug, Clone, Copy)]
struct Capsule {
    start: I64Vec2,
    delta: I64Vec2,
    len_sq: i128,
    r_sq: i128,
}

impl Capsule {
    fn new(start: IVec2, delta: I64Vec2, r_sq: i32) -> Self {
        Self {
            start: start.as_i64vec2(),
            delta,
            len_sq: dot_wide(delta, delta),
            r_sq: r_sq as i128,
        }
    }

    fn covers(&self, p: IVec2) -> bool {
        let v = p.as_i64vec2() - self.start;
        let t = dot_wide(v, self.delta);
        if t <= 0 {
            dot_wide(v, v) <= self.r_sq
        } else if t >= self.len_sq {
            let w = v - self.delta;
            dot_wide(w, w) <= self.r_sq
        } else {
            let cross = v.x as i128 * self.delta.y as i128 - v.y as i128 * self.delta.x as i128;
            // A cross product too large to square is far outside
            cross
                .checked_mul(cross)
                .is_some_and(|c| c <= self.r_sq * self.len_sq)
        }
    }
}

#[inline]
fn dot_wide(a: I64Vec2, b: I64Vec2) -> i128 {
    a.x as i128 * b.x as i128 + a.y as i128 * b.y as i128
}

/// Lattice points within `radius` of `[start, end]`, freshly allocated
pub fn swept_points(start: Vec2, end: Vec2, radius: f32) -> Vec<IVec2> {
    let mut rasterizer = CapsuleRasterizer::new();
    rasterizer.sweep(start, end, radius);
    rasterizer.points
}

/// Upper bound on the sweep length, for callers that size their own buffers
pub fn estimate_capacity(start: Vec2, end: Vec2, radius: f32) -> usize {
    let delta = to_pixel(end).as_i64vec2() - to_pixel(start).as_i64vec2();
    let steps = delta.abs().max_element() as usize + 1;
    let kernel = DiscKernel::new(radius);
    // Disc and rim together fit the widened disc at every step
    kernel
        .widened(RIM_WIDTH)
        .size_hint()
        .saturating_mul(steps)
        .saturating_add(kernel.size_hint().saturating_mul(2))
}
