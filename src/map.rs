//! Shared pixel-ownership raster
//!
//! Writes are queued and applied in bounded batches once per tick, so a
//! burst of paint requests turns into latency instead of per-tick cost.
//! Reads go straight to the cache and only ever see flushed writes.

use std::collections::VecDeque;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// RGBA8 pixel color
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Unowned cell, also returned for out-of-bounds reads
    pub const UNSET: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// A queued pixel write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintRequest {
    pub x: i32,
    pub y: i32,
    pub color: Color,
}

/// Fixed-size ownership grid with a FIFO write queue
#[derive(Debug, Clone)]
pub struct PixelMap {
    width: u32,
    height: u32,
    /// Row-major readable cache
    cells: Vec<Color>,
    queue: VecDeque<PaintRequest>,
    /// Set by a non-empty flush, cleared by the renderer
    dirty: bool,
}

impl PixelMap {
    /// Create a map with every cell unset
    pub fn new(width: u32, height: u32) -> Result<Self, SimError> {
        Self::with_fill(width, height, Color::UNSET)
    }

    /// Create a map with every cell set to `fill`
    pub fn with_fill(width: u32, height: u32, fill: Color) -> Result<Self, SimError> {
        if width == 0 || height == 0 {
            return Err(SimError::InvalidDimensions { width, height });
        }
        log::debug!("Pixel map {}x{} created", width, height);
        Ok(Self {
            width,
            height,
            cells: vec![fill; width as usize * height as usize],
            queue: VecDeque::new(),
            dirty: false,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Check if coordinates are within bounds
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as u32) < self.width && y >= 0 && (y as u32) < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Owner of a cell as of the last flush
    #[inline]
    pub fn read(&self, x: i32, y: i32) -> Color {
        if self.contains(x, y) {
            self.cells[self.index(x, y)]
        } else {
            Color::UNSET
        }
    }

    /// Queue a write; out-of-bounds requests are dropped
    #[inline]
    pub fn request_paint(&mut self, x: i32, y: i32, color: Color) {
        if self.contains(x, y) {
            self.queue.push_back(PaintRequest { x, y, color });
        }
    }

    /// Apply up to `max_count` queued writes in FIFO order
    ///
    /// Returns the number applied. Anything left stays queued for the next
    /// call.
    pub fn flush(&mut self, max_count: usize) -> usize {
        let count = max_count.min(self.queue.len());
        for request in self.queue.drain(..count) {
            // In-bounds was checked on enqueue and the grid never resizes
            let idx = request.y as usize * self.width as usize + request.x as usize;
            self.cells[idx] = request.color;
        }
        if count > 0 {
            self.dirty = true;
        }
        count
    }

    /// Writes waiting for a flush
    #[inline]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Report and clear the re-upload flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Tightly packed RGBA8 view of the cache for texture upload
    pub fn as_rgba_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }

    /// Number of cells currently owned by `color`
    pub fn count_color(&self, color: Color) -> usize {
        self.cells.iter().filter(|&&c| c == color).count()
    }
}
