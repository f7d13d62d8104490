// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/image.rs - 交错排列的多通道图像
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

use crate::error::{PipelineError, Result};

pub const RGB_CHANNELS: usize = 3;

/// HWC 交错排列的图像，样本缓冲区由图像独占
///
/// 不变量: `data.len() == width * height * channels`
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
  width: usize,
  height: usize,
  channels: usize,
  data: Box<[T]>,
}

/// `width * height * channels`，溢出时为 None
pub fn sample_count(width: usize, height: usize, channels: usize) -> Option<usize> {
  width.checked_mul(height)?.checked_mul(channels)
}

impl<T: Copy + Default> Image<T> {
  pub fn zeroed(width: usize, height: usize, channels: usize) -> Result<Self> {
    let size = sample_count(width, height, channels)
      .ok_or_else(|| PipelineError::invalid_dimensions(width, height, channels, 0))?;
    Ok(Self {
      width,
      height,
      channels,
      data: vec![T::default(); size].into_boxed_slice(),
    })
  }
}

impl<T> Image<T> {
  pub fn from_vec(width: usize, height: usize, channels: usize, data: Vec<T>) -> Result<Self> {
    if sample_count(width, height, channels) != Some(data.len()) {
      return Err(PipelineError::invalid_dimensions(
        width,
        height,
        channels,
        data.len(),
      ));
    }

    Ok(Self {
      width,
      height,
      channels,
      data: data.into_boxed_slice(),
    })
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn channels(&self) -> usize {
    self.channels
  }

  /// 样本总数
  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn as_slice(&self) -> &[T] {
    &self.data
  }

  pub fn as_mut_slice(&mut self) -> &mut [T] {
    &mut self.data
  }

  /// 逐样本变换，尺寸不变
  pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Image<U> {
    Image {
      width: self.width,
      height: self.height,
      channels: self.channels,
      data: self.data.iter().map(f).collect(),
    }
  }

  pub fn pixel(&self, x: usize, y: usize) -> &[T] {
    let start = (y * self.width + x) * self.channels;
    &self.data[start..start + self.channels]
  }
}
