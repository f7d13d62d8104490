// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/model/linear.rs - int8 全连接分类头
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

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::Model,
  tensor::{Dims, Tensor, TensorLayout},
};

const LINEAR_MAX_SHIFT: u32 = 31;

#[derive(Error, Debug)]
pub enum LinearModelError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("模型描述解析错误: {0}")]
  ModelParseError(#[from] serde_json::Error),
  #[error("模型无效: {0}")]
  ModelInvalid(String),
}

/// 模型文件的 JSON 描述
#[derive(Debug, Deserialize)]
struct LinearDescription {
  input: Dims,
  #[serde(default)]
  layout: TensorLayout,
  /// 每个类别一行，长度等于输入样本数，顺序与输入张量内存顺序一致
  weights: Vec<Vec<i8>>,
  bias: Vec<i32>,
  #[serde(default)]
  shift: u32,
}

/// 对整个输入做一次整数点积:
/// `out[k] = saturate((bias[k] + Σ w[k][i] * x[i]) >> shift)`，右移按四舍五入
pub struct LinearModel {
  input: Tensor,
  output: Tensor,
  weights: Box<[i8]>,
  bias: Box<[i32]>,
  shift: u32,
}

impl LinearModel {
  pub fn new(
    input: Dims,
    layout: TensorLayout,
    weights: Vec<Vec<i8>>,
    bias: Vec<i32>,
    shift: u32,
  ) -> Result<Self, LinearModelError> {
    let classes = weights.len();
    if classes == 0 {
      return Err(LinearModelError::ModelInvalid("类别数为 0".to_string()));
    }
    if input.is_empty() {
      return Err(LinearModelError::ModelInvalid(format!(
        "输入形状为空: {}",
        input
      )));
    }
    if bias.len() != classes {
      return Err(LinearModelError::ModelInvalid(format!(
        "偏置数量 {} 与类别数 {} 不一致",
        bias.len(),
        classes
      )));
    }
    if let Some((k, row)) = weights
      .iter()
      .enumerate()
      .find(|(_, row)| row.len() != input.len())
    {
      return Err(LinearModelError::ModelInvalid(format!(
        "第 {} 行权重长度 {} 与输入样本数 {} 不一致",
        k,
        row.len(),
        input.len()
      )));
    }
    if shift > LINEAR_MAX_SHIFT {
      return Err(LinearModelError::ModelInvalid(format!(
        "右移位数 {} 超过 {}",
        shift, LINEAR_MAX_SHIFT
      )));
    }

    Ok(Self {
      input: Tensor::zeroed(input, layout),
      output: Tensor::zeroed(Dims::new(1, classes, 1, 1), TensorLayout::Nchw),
      weights: weights.into_iter().flatten().collect(),
      bias: bias.into_boxed_slice(),
      shift,
    })
  }

  pub fn from_json(text: &str) -> Result<Self, LinearModelError> {
    let description: LinearDescription = serde_json::from_str(text)?;
    Self::new(
      description.input,
      description.layout,
      description.weights,
      description.bias,
      description.shift,
    )
  }
}

impl FromUrlWithScheme for LinearModel {
  const SCHEME: &'static str = "linear";
}

impl FromUrl for LinearModel {
  type Error = LinearModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(LinearModelError::SchemeMismatch);
    }

    info!("加载模型文件: {}", url.path());
    let text = std::fs::read_to_string(url.path())?;
    let model = Self::from_json(&text)?;
    info!(
      "模型加载完成, 输入形状 {}, 输出形状 {}",
      model.input.dims(),
      model.output.dims()
    );
    Ok(model)
  }
}

impl Model for LinearModel {
  type Error = LinearModelError;

  fn input_tensor(&mut self) -> &mut Tensor {
    &mut self.input
  }

  fn output_tensor(&self) -> &Tensor {
    &self.output
  }

  fn run(&mut self) -> Result<(), Self::Error> {
    let x = self.input.as_slice();
    let rows = self.weights.chunks_exact(x.len());
    let round = if self.shift == 0 {
      0
    } else {
      1i64 << (self.shift - 1)
    };

    for ((out, row), &bias) in self.output.as_mut_slice().iter_mut().zip(rows).zip(self.bias.iter()) {
      let acc = row
        .iter()
        .zip(x)
        .fold(bias as i64, |acc, (&w, &v)| acc + w as i64 * v as i64);
      *out = ((acc + round) >> self.shift).clamp(i8::MIN as i64, i8::MAX as i64) as i8;
    }

    debug!("线性模型输出: {:?}", self.output.as_slice());
    Ok(())
  }
}
