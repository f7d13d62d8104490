// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/tensor.rs - 定长 int8 张量与输入适配
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

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  error::{PipelineError, Result},
  image::Image,
};

/// 张量维度，顺序固定为 (batch, channels, height, width)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dims {
  pub n: usize,
  pub c: usize,
  pub h: usize,
  pub w: usize,
}

impl Dims {
  pub const fn new(n: usize, c: usize, h: usize, w: usize) -> Self {
    Self { n, c, h, w }
  }

  pub const fn len(&self) -> usize {
    self.n * self.c * self.h * self.w
  }

  pub const fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl fmt::Display for Dims {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {}, {}, {})", self.n, self.c, self.h, self.w)
  }
}

/// 张量在内存中的排列方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
  Nchw,
  #[default]
  Nhwc,
}

/// 由模型持有的定长张量，长度在创建时确定且不再改变
#[derive(Debug, Clone)]
pub struct Tensor {
  dims: Dims,
  layout: TensorLayout,
  data: Box<[i8]>,
}

impl Tensor {
  pub fn zeroed(dims: Dims, layout: TensorLayout) -> Self {
    Self {
      dims,
      layout,
      data: vec![0i8; dims.len()].into_boxed_slice(),
    }
  }

  pub fn dims(&self) -> Dims {
    self.dims
  }

  pub fn layout(&self) -> TensorLayout {
    self.layout
  }

  pub fn capacity(&self) -> usize {
    self.data.len()
  }

  pub fn as_slice(&self) -> &[i8] {
    &self.data
  }

  /// 只暴露切片，调用方无法改变张量长度
  pub fn as_mut_slice(&mut self) -> &mut [i8] {
    &mut self.data
  }
}

/// 把量化后的图像写入模型输入张量
///
/// 图像按 HWC 交错排列；NCHW 张量会在拷贝时转置。
pub fn load_image(image: &Image<i8>, tensor: &mut Tensor) -> Result<()> {
  if image.len() != tensor.capacity() {
    return Err(PipelineError::ShapeMismatch {
      expected: tensor.capacity(),
      actual: image.len(),
    });
  }

  match tensor.layout() {
    TensorLayout::Nhwc => tensor.as_mut_slice().copy_from_slice(image.as_slice()),
    TensorLayout::Nchw => {
      let dims = tensor.dims();
      let (c_len, h_len, w_len) = (image.channels(), image.height(), image.width());
      if dims.n != 1 || (dims.c, dims.h, dims.w) != (c_len, h_len, w_len) {
        return Err(PipelineError::ShapeMismatch {
          expected: tensor.capacity(),
          actual: image.len(),
        });
      }

      let plane = h_len * w_len;
      let dst = tensor.as_mut_slice();
      for (i, pixel) in image.as_slice().chunks_exact(c_len).enumerate() {
        for (c, &value) in pixel.iter().enumerate() {
          dst[c * plane + i] = value;
        }
      }
    }
  }

  Ok(())
}
