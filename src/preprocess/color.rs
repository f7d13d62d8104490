// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/preprocess/color.rs - RGB565 到 RGB888 转换
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
  frame::{Frame, RGB565_BYTES_PER_PIXEL},
  image::{Image, RGB_CHANNELS, sample_count},
};

/// 将一个 RGB565 像素展开为 8 位三通道
///
/// 低位用高位复制填充，使 0x1F/0x3F 映射到 255。
pub fn expand_rgb565(pixel: u16) -> [u8; 3] {
  let r5 = ((pixel >> 11) & 0x1F) as u8;
  let g6 = ((pixel >> 5) & 0x3F) as u8;
  let b5 = (pixel & 0x1F) as u8;

  [
    (r5 << 3) | (r5 >> 2),
    (g6 << 2) | (g6 >> 4),
    (b5 << 3) | (b5 >> 2),
  ]
}

/// 截断 8 位三通道为一个 RGB565 像素
pub fn pack_rgb565(r: u8, g: u8, b: u8) -> u16 {
  ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

pub fn rgb565_to_rgb888(frame: &Frame) -> Result<Image<u8>> {
  let data = frame.data();
  if frame.width == 0
    || frame.height == 0
    || sample_count(frame.width, frame.height, RGB565_BYTES_PER_PIXEL) != Some(data.len())
  {
    return Err(PipelineError::invalid_dimensions(
      frame.width,
      frame.height,
      RGB565_BYTES_PER_PIXEL,
      data.len(),
    ));
  }

  let mut image = Image::zeroed(frame.width, frame.height, RGB_CHANNELS)?;
  for (dst, src) in image
    .as_mut_slice()
    .chunks_exact_mut(RGB_CHANNELS)
    .zip(data.chunks_exact(RGB565_BYTES_PER_PIXEL))
  {
    let pixel = frame.format.decode([src[0], src[1]]);
    dst.copy_from_slice(&expand_rgb565(pixel));
  }

  Ok(image)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::PixelFormat;

  fn frame_of(width: usize, height: usize, pixels: &[u16]) -> Frame {
    let data: Vec<u8> = pixels
      .iter()
      .flat_map(|p| PixelFormat::Rgb565Be.encode(*p))
      .collect();
    Frame::new(width, height, PixelFormat::Rgb565Be, data.into())
  }

  #[test]
  fn test_expand_extremes() {
    assert_eq!(expand_rgb565(0x0000), [0, 0, 0]);
    assert_eq!(expand_rgb565(0xFFFF), [255, 255, 255]);
    assert_eq!(expand_rgb565(0xF800), [255, 0, 0]);
    assert_eq!(expand_rgb565(0x07E0), [0, 255, 0]);
    assert_eq!(expand_rgb565(0x001F), [0, 0, 255]);
  }

  #[test]
  fn test_top_bits_preserved_for_every_component() {
    for r5 in 0u16..32 {
      for g6 in 0u16..64 {
        let b5 = (r5 + g6) % 32;
        let [r, g, b] = expand_rgb565((r5 << 11) | (g6 << 5) | b5);
        assert_eq!((r >> 3) as u16, r5);
        assert_eq!((g >> 2) as u16, g6);
        assert_eq!((b >> 3) as u16, b5);
      }
    }
  }

  #[test]
  fn test_pack_keeps_top_bits() {
    assert_eq!(pack_rgb565(255, 255, 255), 0xFFFF);
    assert_eq!(pack_rgb565(132, 130, 132), 0x8410);
    let [r, g, b] = expand_rgb565(pack_rgb565(200, 100, 50));
    assert_eq!((r >> 3, g >> 2, b >> 3), (200 >> 3, 100 >> 2, 50 >> 3));
  }

  #[test]
  fn test_output_size_and_layout() {
    let frame = frame_of(2, 1, &[0xF800, 0x001F]);
    let image = rgb565_to_rgb888(&frame).unwrap();
    assert_eq!(image.len(), 2 * 1 * 3);
    assert_eq!(image.as_slice(), &[255, 0, 0, 0, 0, 255]);
  }

  #[test]
  fn test_little_endian_source() {
    let frame = Frame::new(1, 1, PixelFormat::Rgb565Le, vec![0x1F, 0x00].into());
    let image = rgb565_to_rgb888(&frame).unwrap();
    assert_eq!(image.as_slice(), &[0, 0, 255]);
  }

  #[test]
  fn test_length_mismatch_is_invalid_dimensions() {
    let frame = Frame::new(2, 2, PixelFormat::Rgb565Be, vec![0u8; 7].into());
    let err = rgb565_to_rgb888(&frame).unwrap_err();
    assert_eq!(err, PipelineError::invalid_dimensions(2, 2, 2, 7));
  }

  #[test]
  fn test_overflowing_geometry_is_invalid_dimensions() {
    // 1<<62 * 4 * 2 在 64 位上回绕为 0，与空缓冲区长度相同
    for (width, height) in [(1usize << 62, 4usize), (usize::MAX, usize::MAX), (usize::MAX / 2 + 1, 1)] {
      let frame = Frame::new(width, height, PixelFormat::Rgb565Be, Box::default());
      let err = rgb565_to_rgb888(&frame).unwrap_err();
      assert_eq!(err, PipelineError::invalid_dimensions(width, height, 2, 0));
    }
  }
}
