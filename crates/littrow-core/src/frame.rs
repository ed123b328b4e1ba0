use ndarray::Array1;

use crate::error::{LittrowError, Result};

/// Borrowed view of one captured planar YUV 4:2:0 frame.
///
/// The buffer holds a full-resolution luma plane of `stride * height` bytes
/// followed by two quarter-size chroma planes of `(stride / 2) * (height / 2)`
/// bytes each. The view only borrows the buffer for the duration of one
/// reduction; once the borrow ends the caller fires the frame source's
/// buffer-done callback and the buffer can be reused.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> FrameView<'a> {
    /// 4:2:0 subsampling needs an even `height` and `stride`; odd geometries
    /// would index chroma rows past the quarter-size planes.
    pub fn new(data: &'a [u8], width: usize, height: usize, stride: usize) -> Result<Self> {
        let required = buffer_len(height, stride);
        if stride < width || height % 2 != 0 || stride % 2 != 0 || data.len() < required {
            return Err(LittrowError::InvalidGeometry {
                width,
                height,
                stride,
                len: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// True when the frame has no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn luma(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    #[inline]
    pub fn chroma_u(&self, x: usize, y: usize) -> u8 {
        let plane = self.stride * self.height;
        self.data[plane + (y / 2) * (self.stride / 2) + x / 2]
    }

    #[inline]
    pub fn chroma_v(&self, x: usize, y: usize) -> u8 {
        let plane = self.stride * self.height + (self.stride / 2) * (self.height / 2);
        self.data[plane + (y / 2) * (self.stride / 2) + x / 2]
    }
}

/// Byte length of a planar 4:2:0 buffer with the given geometry.
pub fn buffer_len(height: usize, stride: usize) -> usize {
    stride * height + 2 * ((stride / 2) * (height / 2))
}

/// One-dimensional per-column intensity trace reduced from a frame.
///
/// Index-addressed: `data[x]` is the accumulated intensity of pixel column
/// `x`. A fresh trace is produced per frame and mutated in place by the
/// calibration corrections; traces are never shared between frames.
#[derive(Clone, Debug, Default)]
pub struct Trace {
    /// Accumulated intensity per column.
    pub data: Array1<f32>,
    /// Largest accumulator value, tracked for display scaling and peak
    /// thresholds.
    pub max: f32,
}

impl Trace {
    pub fn zeros(width: usize) -> Self {
        Self {
            data: Array1::zeros(width),
            max: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Recompute `max` after an in-place mutation of `data`.
    pub fn recompute_max(&mut self) {
        self.max = self.data.iter().copied().fold(0.0f32, f32::max);
    }
}
