// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/output/jsonl_report.rs - JSON Lines 文件上报
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

use std::{
  fs::{File, OpenOptions},
  io::Write,
  path::PathBuf,
  sync::Mutex,
};

use chrono::Utc;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::Report,
  pipeline::{CycleOutcome, CycleReport},
};

#[derive(Error, Debug)]
pub enum JsonLinesReportError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// `jsonl:///path/to/report.jsonl`，每个周期追加一行
pub struct JsonLinesReport {
  path: PathBuf,
  file: Mutex<File>,
}

impl FromUrlWithScheme for JsonLinesReport {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonLinesReport {
  type Error = JsonLinesReportError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonLinesReportError::SchemeMismatch);
    }

    let path = PathBuf::from(url.path());
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    info!("结果将追加写入: {}", path.display());

    Ok(Self {
      path,
      file: Mutex::new(file),
    })
  }
}

impl JsonLinesReport {
  pub fn path(&self) -> &PathBuf {
    &self.path
  }
}

/// 单个周期的 JSON 表示
pub fn report_line(report: &CycleReport) -> Value {
  let mut line = json!({
    "timestamp": Utc::now().to_rfc3339(),
    "cycle": report.cycle,
    "outcome": report.outcome.kind(),
    "elapsed_ms": report.elapsed.as_secs_f64() * 1000.0,
  });

  let detail = match &report.outcome {
    CycleOutcome::Classified { result, label, .. } => json!({
      "class_id": result.class_id,
      "label": label,
      "confidence": result.confidence,
      "raw_score": result.raw_score,
    }),
    CycleOutcome::Unrecognized(dims) => json!({ "dims": dims }),
    CycleOutcome::Failed { stage, error } => json!({
      "stage": stage,
      "error": error.to_string(),
    }),
  };

  if let (Some(line), Value::Object(detail)) = (line.as_object_mut(), detail) {
    line.extend(detail);
  }
  line
}

impl Report for JsonLinesReport {
  type Error = JsonLinesReportError;

  fn report(&self, report: &CycleReport) -> Result<(), Self::Error> {
    let text = serde_json::to_string(&report_line(report))?;
    let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    writeln!(file, "{}", text)?;
    file.flush()?;
    Ok(())
  }
}
