#![allow(dead_code)]

use littrow_core::frame::buffer_len;

/// Build a planar YUV 4:2:0 buffer with uniform luma and zero chroma.
pub fn uniform_frame(height: usize, stride: usize, luma: u8) -> Vec<u8> {
    let mut buf = vec![0u8; buffer_len(height, stride)];
    buf[..stride * height].fill(luma);
    buf
}

/// Build a planar YUV 4:2:0 buffer with uniform luma and uniform chroma.
pub fn uniform_yuv_frame(height: usize, stride: usize, luma: u8, u: u8, v: u8) -> Vec<u8> {
    let luma_len = stride * height;
    let chroma_len = (stride / 2) * (height / 2);
    let mut buf = vec![0u8; buffer_len(height, stride)];
    buf[..luma_len].fill(luma);
    buf[luma_len..luma_len + chroma_len].fill(u);
    buf[luma_len + chroma_len..].fill(v);
    buf
}

/// Build a frame whose single bright luma column drifts right by `drift`
/// pixels per row, starting at column `x0` in row 0. Chroma stays zero.
pub fn skewed_line_frame(
    width: usize,
    height: usize,
    stride: usize,
    x0: usize,
    drift: f32,
) -> Vec<u8> {
    let mut buf = vec![0u8; buffer_len(height, stride)];
    for y in 0..height {
        let x = (x0 as f32 + drift * y as f32).round() as isize;
        if (0..width as isize).contains(&x) {
            buf[y * stride + x as usize] = 255;
        }
    }
    buf
}
