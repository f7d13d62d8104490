// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/output/log_report.rs - 日志上报
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

use std::convert::Infallible;

use tracing::{error, info, warn};

use crate::{
  FromUrlWithScheme,
  decode::Decision,
  output::Report,
  pipeline::{CycleOutcome, CycleReport},
};

/// `log://`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReport;

impl FromUrlWithScheme for LogReport {
  const SCHEME: &'static str = "log";
}

impl crate::FromUrl for LogReport {
  type Error = Infallible;

  fn from_url(_url: &url::Url) -> Result<Self, Self::Error> {
    Ok(LogReport)
  }
}

impl Report for LogReport {
  type Error = Infallible;

  fn report(&self, report: &CycleReport) -> Result<(), Self::Error> {
    match &report.outcome {
      CycleOutcome::Classified {
        result,
        decision,
        label,
      } => {
        let name = label.clone().unwrap_or_else(|| format!("#{}", result.class_id));
        info!(
          "({}) 识别结果: {} (置信度: {:.2}, 原始得分: {})",
          report.cycle, name, result.confidence, result.raw_score
        );
        match decision {
          Decision::Positive => info!("({}) *** 检测到目标 ***", report.cycle),
          Decision::Negative => info!("({}) 未检测到目标或置信度不足", report.cycle),
        }
      }
      CycleOutcome::Unrecognized(dims) => {
        warn!("({}) 输出形状 {} 需要专门的后处理逻辑", report.cycle, dims);
      }
      CycleOutcome::Failed { stage, error } => {
        error!("({}) 阶段 {} 失败: {}", report.cycle, stage, error);
      }
    }
    info!("({}) 推理耗时: {:.2?}", report.cycle, report.elapsed);
    Ok(())
  }
}
