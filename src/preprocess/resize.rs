// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/preprocess/resize.rs - 双线性插值缩放
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use crate::{
  error::{PipelineError, Result},
  image::Image,
};

/// 一个方向上的采样位置: 两个相邻索引和靠后索引的权重
#[derive(Debug, Clone, Copy)]
struct Tap {
  lo: usize,
  hi: usize,
  frac: f32,
}

/// 按像素中心对齐把目标坐标映射回源坐标，并钳制到 [0, src_len - 1]
fn taps(src_len: usize, dst_len: usize) -> Vec<Tap> {
  let scale = src_len as f32 / dst_len as f32;
  let last = (src_len - 1) as f32;

  (0..dst_len)
    .map(|d| {
      let s = ((d as f32 + 0.5) * scale - 0.5).clamp(0.0, last);
      let lo = s.floor() as usize;
      let hi = (lo + 1).min(src_len - 1);
      Tap {
        lo,
        hi,
        frac: s - lo as f32,
      }
    })
    .collect()
}

pub fn resize_bilinear(src: &Image<u8>, width: usize, height: usize) -> Result<Image<u8>> {
  if width == 0 || height == 0 {
    return Err(PipelineError::invalid_dimensions(
      width,
      height,
      src.channels(),
      0,
    ));
  }
  if src.width() == 0 || src.height() == 0 {
    return Err(PipelineError::invalid_dimensions(
      src.width(),
      src.height(),
      src.channels(),
      src.len(),
    ));
  }

  let channels = src.channels();
  let mut dst = Image::zeroed(width, height, channels)?;
  let xs = taps(src.width(), width);
  let ys = taps(src.height(), height);
  let out = dst.as_mut_slice();

  for (y, ty) in ys.iter().enumerate() {
    for (x, tx) in xs.iter().enumerate() {
      let p00 = src.pixel(tx.lo, ty.lo);
      let p10 = src.pixel(tx.hi, ty.lo);
      let p01 = src.pixel(tx.lo, ty.hi);
      let p11 = src.pixel(tx.hi, ty.hi);
      let base = (y * width + x) * channels;

      for c in 0..channels {
        let top = p00[c] as f32 * (1.0 - tx.frac) + p10[c] as f32 * tx.frac;
        let bottom = p01[c] as f32 * (1.0 - tx.frac) + p11[c] as f32 * tx.frac;
        let value = top * (1.0 - ty.frac) + bottom * ty.frac;
        out[base + c] = value.round().clamp(0.0, 255.0) as u8;
      }
    }
  }

  Ok(dst)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ramp(width: usize, height: usize) -> Image<u8> {
    let data = (0..width * height * 3).map(|i| (i * 7 % 256) as u8).collect();
    Image::from_vec(width, height, 3, data).unwrap()
  }

  #[test]
  fn test_identity_is_lossless() {
    let src = ramp(5, 4);
    let dst = resize_bilinear(&src, 5, 4).unwrap();
    assert_eq!(dst, src);
    assert_eq!(dst.pixel(0, 0), src.pixel(0, 0));
    assert_eq!(dst.pixel(4, 0), src.pixel(4, 0));
    assert_eq!(dst.pixel(0, 3), src.pixel(0, 3));
    assert_eq!(dst.pixel(4, 3), src.pixel(4, 3));
  }

  #[test]
  fn test_output_size_for_many_targets() {
    let src = ramp(7, 3);
    for (w, h) in [(1, 1), (2, 9), (14, 6), (7, 3), (3, 1), (31, 17)] {
      let dst = resize_bilinear(&src, w, h).unwrap();
      assert_eq!(dst.len(), w * h * 3);
      assert_eq!((dst.width(), dst.height(), dst.channels()), (w, h, 3));
    }
  }

  #[test]
  fn test_taps_stay_in_bounds() {
    for (src, dst) in [(1, 5), (5, 1), (3, 100), (100, 3), (2, 2)] {
      for tap in taps(src, dst) {
        assert!(tap.lo < src && tap.hi < src);
        assert!((0.0..=1.0).contains(&tap.frac));
      }
    }
  }

  #[test]
  fn test_downscale_blends_neighbours() {
    // 两列 0 与 200 缩到一列，取中点
    let src = Image::from_vec(2, 1, 3, vec![0, 0, 0, 200, 200, 200]).unwrap();
    let dst = resize_bilinear(&src, 1, 1).unwrap();
    assert_eq!(dst.as_slice(), &[100, 100, 100]);
  }

  #[test]
  fn test_upscale_edges_keep_source_values() {
    let src = Image::from_vec(2, 1, 3, vec![10, 20, 30, 90, 80, 70]).unwrap();
    let dst = resize_bilinear(&src, 8, 1).unwrap();
    assert_eq!(dst.pixel(0, 0), &[10, 20, 30]);
    assert_eq!(dst.pixel(7, 0), &[90, 80, 70]);
  }

  #[test]
  fn test_overflowing_target_is_invalid() {
    let src = ramp(2, 2);
    assert!(matches!(
      resize_bilinear(&src, 1 << 62, 4),
      Err(PipelineError::InvalidDimensions { .. })
    ));
  }

  #[test]
  fn test_zero_target_is_invalid() {
    let src = ramp(2, 2);
    assert!(matches!(
      resize_bilinear(&src, 0, 2),
      Err(PipelineError::InvalidDimensions { .. })
    ));
    assert!(matches!(
      resize_bilinear(&src, 2, 0),
      Err(PipelineError::InvalidDimensions { .. })
    ));
  }
}
