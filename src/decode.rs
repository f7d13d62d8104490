// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/decode.rs - 模型输出解码
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

use serde::Serialize;
use tracing::debug;

use crate::tensor::{Dims, Tensor};

mod calibration;
pub use self::calibration::{Calibration, ScoreMap};

/// 一次推理的分类结果，创建后不可变
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecisionResult {
  pub class_id: usize,
  pub confidence: f32,
  pub raw_score: i8,
}

/// 按输出张量形状区分的解码结果，任何形状都有对应分支
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
  /// 输出形状为 (1, C, 1, 1)
  Classification(DecisionResult),
  /// 形状不在已知集合中，保留原始形状供调用方判断
  Unrecognized(Dims),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
  Positive,
  Negative,
}

pub struct Decoder<C = ScoreMap> {
  calibration: C,
  positive_class: usize,
  threshold: f32,
}

impl<C: Calibration> Decoder<C> {
  pub fn new(calibration: C, positive_class: usize, threshold: f32) -> Self {
    Self {
      calibration,
      positive_class,
      threshold,
    }
  }

  pub fn decode(&self, output: &Tensor) -> Decoded {
    let dims = output.dims();
    if dims.n != 1 || dims.h != 1 || dims.w != 1 || dims.c == 0 {
      debug!("无法识别的输出形状: {}", dims);
      return Decoded::Unrecognized(dims);
    }

    let scores = &output.as_slice()[..dims.c];
    let (class_id, raw_score) = argmax(scores);
    let confidence = self.confidence(raw_score);
    debug!(
      "分类输出: {} 个类别, 最高分类别 {} (原始得分 {}, 置信度 {:.3})",
      dims.c, class_id, raw_score, confidence
    );

    Decoded::Classification(DecisionResult {
      class_id,
      confidence,
      raw_score,
    })
  }

  /// 仅当类别为正类且置信度严格大于阈值时判为阳性
  pub fn decide(&self, result: &DecisionResult) -> Decision {
    if result.class_id == self.positive_class && result.confidence > self.threshold {
      Decision::Positive
    } else {
      Decision::Negative
    }
  }

  fn confidence(&self, raw: i8) -> f32 {
    let value = self.calibration.confidence(raw);
    if value.is_nan() {
      0.0
    } else {
      value.clamp(0.0, 1.0)
    }
  }
}

/// 取最大值下标，相等时保留最先出现的
fn argmax(scores: &[i8]) -> (usize, i8) {
  let mut best = (0, scores[0]);
  for (i, &score) in scores.iter().enumerate().skip(1) {
    if score > best.1 {
      best = (i, score);
    }
  }
  best
}
