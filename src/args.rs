// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/args.rs - 命令行参数
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

use tracing::info;
use url::Url;

use crate::{config::PipelineConfig, decode::ScoreMap, preprocess::QuantizationRange};

/// 各个程序共用的流水线参数
#[derive(clap::Args, Debug, Clone)]
pub struct PipelineArgs {
  /// 模型描述
  /// - linear:///path/to/model.json
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 输入来源
  /// - image:///path/to/frame.png?order=be|le&fb_count=N
  /// - pattern://solid?width=W&height=H&value=0x8410
  /// - pattern://gradient?width=W&height=H
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 结果输出
  /// - log://
  /// - jsonl:///path/to/report.jsonl
  #[arg(long, value_name = "OUTPUT", default_value = "log://")]
  pub output: Url,

  /// 模型输入宽度
  #[arg(long, default_value_t = crate::config::DEFAULT_INPUT_WIDTH)]
  pub width: usize,

  /// 模型输入高度
  #[arg(long, default_value_t = crate::config::DEFAULT_INPUT_HEIGHT)]
  pub height: usize,

  /// 量化区间: input_min,input_max,output_min,output_max
  #[arg(long, value_name = "RANGE", default_value = "0,255,-128,127")]
  pub quant_range: QuantizationRange,

  /// 判定为阳性的类别编号
  #[arg(long, default_value_t = 0)]
  pub positive_class: usize,

  /// 置信度阈值 (0.0 - 1.0)，严格大于才判定为阳性
  #[arg(long, default_value_t = crate::config::DEFAULT_THRESHOLD)]
  pub threshold: f32,

  /// 置信度映射: offset | dequant:<scale>,<zero_point> | sigmoid:<scale>,<zero_point>
  #[arg(long, value_name = "MAP", default_value = "offset")]
  pub calibration: ScoreMap,

  /// 类别标签，以逗号分隔
  #[arg(long, value_delimiter = ',')]
  pub labels: Vec<String>,

  /// 两次采集之间的间隔（毫秒）
  #[arg(long, default_value_t = 3000)]
  pub capture_delay_ms: u64,

  /// 采集失败后的重试间隔（毫秒）
  #[arg(long, default_value_t = 1000)]
  pub retry_delay_ms: u64,
}

impl PipelineArgs {
  pub fn pipeline_config(&self) -> PipelineConfig {
    PipelineConfig::builder()
      .input_size(self.width, self.height)
      .quantization(self.quant_range)
      .positive_class(self.positive_class)
      .threshold(self.threshold)
      .calibration(self.calibration)
      .labels(self.labels.iter().cloned())
      .capture_delay(Duration::from_millis(self.capture_delay_ms))
      .retry_delay(Duration::from_millis(self.retry_delay_ms))
      .build()
  }

  pub fn log_summary(&self) {
    info!("模型文件路径: {}", self.model);
    info!("输入来源: {}", self.input);
    info!("输出路径: {}", self.output);
    info!(
      "输入尺寸: {}x{}, 阳性类别: {}, 阈值: {}, 置信度映射: {}",
      self.width, self.height, self.positive_class, self.threshold, self.calibration
    );
  }
}
