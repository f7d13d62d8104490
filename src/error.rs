// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/error.rs - 流水线错误定义
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

use thiserror::Error;

/// 单个周期内可能出现的错误，全部在编排器边界内恢复
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
  #[error("图像尺寸无效: {width}x{height}x{channels}, 缓冲区长度 {len}")]
  InvalidDimensions {
    width: usize,
    height: usize,
    channels: usize,
    len: usize,
  },
  #[error("张量形状不匹配: 期望 {expected} 个样本, 实际 {actual} 个")]
  ShapeMismatch { expected: usize, actual: usize },
  #[error("本周期无可用帧: {0}")]
  CaptureUnavailable(String),
  #[error("模型推理失败: {0}")]
  InferenceError(String),
}

impl PipelineError {
  pub fn invalid_dimensions(width: usize, height: usize, channels: usize, len: usize) -> Self {
    PipelineError::InvalidDimensions {
      width,
      height,
      channels,
      len,
    }
  }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
