//! Captured depth buffers.

use markups_core::{CameraParams, Viewport};

/// Per-pixel normalized depth of a completed render.
///
/// Rows are stored top to bottom, matching display coordinates. A cleared
/// pixel holds 1.0 (the far plane).
#[derive(Debug, Clone, PartialEq)]
pub struct DepthBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl DepthBuffer {
    /// Value of a pixel nothing was rendered into.
    pub const CLEAR_DEPTH: f32 = 1.0;

    /// Creates a buffer with every pixel at [`DepthBuffer::CLEAR_DEPTH`].
    pub fn cleared(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![Self::CLEAR_DEPTH; width as usize * height as usize],
        }
    }

    /// Wraps read-back depth values. Returns `None` if the length does not
    /// match the dimensions.
    pub fn from_vec(width: u32, height: u32, data: Vec<f32>) -> Option<Self> {
        (data.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Builds a buffer from a per-pixel function of `(x, y)`.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Viewport covered by this buffer.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    /// Depth at a pixel, `None` outside the buffer.
    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Overwrites a rectangle of pixels where `depth` is nearer than the
    /// stored value. The rectangle is clipped to the buffer.
    pub fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, depth: f32) {
        for y in y0.min(self.height)..y1.min(self.height) {
            for x in x0.min(self.width)..x1.min(self.width) {
                let i = y as usize * self.width as usize + x as usize;
                if depth < self.data[i] {
                    self.data[i] = depth;
                }
            }
        }
    }

    /// Raw depth values.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// A depth buffer together with the camera it was rendered with.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthSnapshot {
    pub buffer: DepthBuffer,
    pub camera: CameraParams,
}

impl DepthSnapshot {
    pub fn new(buffer: DepthBuffer, camera: CameraParams) -> Self {
        Self { buffer, camera }
    }

    /// Viewport the snapshot was captured for.
    pub fn viewport(&self) -> Viewport {
        self.buffer.viewport()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleared_buffer() {
        let buffer = DepthBuffer::cleared(4, 3);
        assert_eq!(buffer.as_slice().len(), 12);
        assert_eq!(buffer.depth_at(3, 2), Some(1.0));
        assert_eq!(buffer.depth_at(4, 0), None);
        assert_eq!(buffer.depth_at(0, 3), None);
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(DepthBuffer::from_vec(2, 2, vec![0.5; 4]).is_some());
        assert!(DepthBuffer::from_vec(2, 2, vec![0.5; 3]).is_none());
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let buffer = DepthBuffer::from_fn(3, 2, |x, y| (y * 3 + x) as f32 / 10.0);
        assert_eq!(buffer.depth_at(2, 0), Some(0.2));
        assert_eq!(buffer.depth_at(0, 1), Some(0.3));
    }

    #[test]
    fn test_fill_rect_keeps_nearest() {
        let mut buffer = DepthBuffer::cleared(4, 4);
        buffer.fill_rect(1, 1, 3, 3, 0.5);
        buffer.fill_rect(0, 0, 10, 10, 0.8);
        assert_eq!(buffer.depth_at(1, 1), Some(0.5));
        assert_eq!(buffer.depth_at(0, 0), Some(0.8));
        assert_eq!(buffer.depth_at(3, 3), Some(0.8));
    }
}
