//! Lattice rasterization of continuous shapes
//!
//! Both rasterizers share one inclusion rule: an offset `(dx, dy)` from the
//! rounded center is inside when `dx² + dy² <= floor(radius² + 1)`. The +1
//! slack compensates for float truncation at the rim and sets the fill
//! density along edges.

pub mod capsule;
pub mod circle;

pub use capsule::{CapsuleRasterizer, estimate_capacity, swept_points};
pub use circle::{points_in_disc, points_in_disc_symmetric};

use glam::IVec2;

/// Integer disc footprint for a given radius
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscKernel {
    /// Inclusive squared-distance threshold
    r_sq: i32,
    /// Largest |dx| or |dy| that can be inside
    extent: i32,
}

impl DiscKernel {
    pub fn new(radius: f32) -> Self {
        // `as` saturates, and NaN maps to 0
        let r_sq = (radius * radius + 1.0) as i32;
        Self {
            r_sq,
            extent: isqrt(r_sq),
        }
    }

    #[inline]
    pub fn r_sq(&self) -> i32 {
        self.r_sq
    }

    #[inline]
    pub fn extent(&self) -> i32 {
        self.extent
    }

    #[inline]
    pub fn contains(&self, offset: IVec2) -> bool {
        offset.as_i64vec2().length_squared() <= self.r_sq as i64
    }

    /// Same footprint grown by `by` pixels of radius
    pub fn widened(&self, by: f32) -> Self {
        Self::new((self.r_sq as f32).sqrt() + by)
    }

    /// Half-height of the disc column at horizontal offset `dx`
    #[inline]
    pub fn column_half_height(&self, dx: i32) -> Option<i32> {
        let dx = dx as i64;
        let remaining = self.r_sq as i64 - dx * dx;
        (remaining >= 0).then(|| isqrt(remaining as i32))
    }

    /// Append every offset inside the disc, column by column
    pub fn offsets_into(&self, out: &mut Vec<IVec2>) {
        for dx in -self.extent..=self.extent {
            if let Some(h) = self.column_half_height(dx) {
                out.extend((-h..=h).map(|dy| IVec2::new(dx, dy)));
            }
        }
    }

    /// Upper bound on the number of offsets, for preallocation
    pub fn size_hint(&self) -> usize {
        let side = 2 * self.extent as usize + 1;
        side * side
    }
}

/// Floor of the square root for non-negative integers
pub(crate) fn isqrt(n: i32) -> i32 {
    if n <= 0 {
        return 0;
    }
    // i64 so `(r + 1)²` cannot overflow near i32::MAX
    let n = n as i64;
    let mut r = (n as f64).sqrt() as i64;
    while r > 0 && r * r > n {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    r as i32
}
