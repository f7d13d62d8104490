// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/output.rs - 周期结果上报
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
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, pipeline::CycleReport};

/// 接收每个周期的结果，不需要回应
pub trait Report: Sized {
  type Error;
  fn report(&self, report: &CycleReport) -> Result<(), Self::Error>;
}

mod log_report;
pub use self::log_report::LogReport;

#[cfg(feature = "jsonl_report")]
mod jsonl_report;
#[cfg(feature = "jsonl_report")]
pub use self::jsonl_report::{JsonLinesReport, JsonLinesReportError, report_line};

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "jsonl_report")]
  #[error("JSON Lines 输出错误: {0}")]
  JsonLinesReportError(#[from] JsonLinesReportError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  Log(LogReport),
  #[cfg(feature = "jsonl_report")]
  JsonLines(JsonLinesReport),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      LogReport::SCHEME => Ok(OutputWrapper::Log(LogReport)),
      #[cfg(feature = "jsonl_report")]
      JsonLinesReport::SCHEME => Ok(OutputWrapper::JsonLines(JsonLinesReport::from_url(url)?)),
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl Report for OutputWrapper {
  type Error = OutputError;

  fn report(&self, report: &CycleReport) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Log(output) => output.report(report).map_err(|e| match e {}),
      #[cfg(feature = "jsonl_report")]
      OutputWrapper::JsonLines(output) => output.report(report).map_err(OutputError::from),
    }
  }
}
