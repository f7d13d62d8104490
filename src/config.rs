// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/config.rs - 流水线配置
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

use std::time::Duration;

use thiserror::Error;

use crate::{decode::ScoreMap, preprocess::QuantizationRange};

pub const DEFAULT_INPUT_WIDTH: usize = 224;
pub const DEFAULT_INPUT_HEIGHT: usize = 224;
pub const DEFAULT_THRESHOLD: f32 = 0.5;
pub const DEFAULT_CAPTURE_DELAY: Duration = Duration::from_millis(3000);
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
  #[error("量化区间无效: {0}")]
  QuantizationRange(String),
  #[error("置信度阈值必须在 [0, 1] 内, 实际为 {0}")]
  Threshold(f32),
  #[error("置信度映射无效: {0}")]
  Calibration(String),
}

/// 编排器在构造时接收的全部配置
#[derive(Debug, Clone)]
pub struct PipelineConfig {
  pub input_width: usize,
  pub input_height: usize,
  pub quantization: QuantizationRange,
  pub positive_class: usize,
  pub threshold: f32,
  pub calibration: ScoreMap,
  pub labels: Vec<String>,
  /// 两次采集之间的间隔
  pub capture_delay: Duration,
  /// 采集失败后的重试间隔
  pub retry_delay: Duration,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      input_width: DEFAULT_INPUT_WIDTH,
      input_height: DEFAULT_INPUT_HEIGHT,
      quantization: QuantizationRange::default(),
      positive_class: 0,
      threshold: DEFAULT_THRESHOLD,
      calibration: ScoreMap::default(),
      labels: Vec::new(),
      capture_delay: DEFAULT_CAPTURE_DELAY,
      retry_delay: DEFAULT_RETRY_DELAY,
    }
  }
}

impl PipelineConfig {
  pub fn builder() -> PipelineConfigBuilder {
    PipelineConfigBuilder::default()
  }

  /// 输入尺寸不在这里检查，零尺寸由缩放阶段逐周期报告
  pub fn validate(&self) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&self.threshold) {
      return Err(ConfigError::Threshold(self.threshold));
    }
    self.calibration.validate()
  }

  pub fn label(&self, class_id: usize) -> Option<&str> {
    self.labels.get(class_id).map(String::as_str)
  }
}

#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
  config: PipelineConfig,
}

impl PipelineConfigBuilder {
  pub fn input_size(mut self, width: usize, height: usize) -> Self {
    self.config.input_width = width;
    self.config.input_height = height;
    self
  }

  pub fn quantization(mut self, range: QuantizationRange) -> Self {
    self.config.quantization = range;
    self
  }

  pub fn positive_class(mut self, class_id: usize) -> Self {
    self.config.positive_class = class_id;
    self
  }

  pub fn threshold(mut self, threshold: f32) -> Self {
    self.config.threshold = threshold;
    self
  }

  pub fn calibration(mut self, calibration: ScoreMap) -> Self {
    self.config.calibration = calibration;
    self
  }

  pub fn labels<I, S>(mut self, labels: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.config.labels = labels.into_iter().map(Into::into).collect();
    self
  }

  pub fn capture_delay(mut self, delay: Duration) -> Self {
    self.config.capture_delay = delay;
    self
  }

  pub fn retry_delay(mut self, delay: Duration) -> Self {
    self.config.retry_delay = delay;
    self
  }

  pub fn build(self) -> PipelineConfig {
    self.config
  }
}
