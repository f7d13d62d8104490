// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/pipeline.rs - 单周期流水线编排
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
  fmt,
  rc::Rc,
  time::{Duration, Instant},
};

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::{
  config::{ConfigError, PipelineConfig},
  decode::{Calibration, Decision, DecisionResult, Decoded, Decoder, ScoreMap},
  error::PipelineError,
  frame::{Frame, FrameGuard, FrameSource},
  image::{RGB_CHANNELS, sample_count},
  model::Model,
  preprocess::{quantize, resize_bilinear, rgb565_to_rgb888},
  tensor::{Dims, load_image},
};

mod ledger;
pub use self::ledger::{AllocationLedger, Tracked};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
  Capture,
  Convert,
  Resize,
  Quantize,
  Load,
  Infer,
  Decode,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Stage::Capture => "capture",
      Stage::Convert => "convert",
      Stage::Resize => "resize",
      Stage::Quantize => "quantize",
      Stage::Load => "load",
      Stage::Infer => "infer",
      Stage::Decode => "decode",
    };
    f.write_str(name)
  }
}

/// 各阶段耗时，按执行顺序记录
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
  steps: Vec<(Stage, Duration)>,
}

impl StageTimings {
  fn measure<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let value = f();
    self.steps.push((stage, start.elapsed()));
    value
  }

  pub fn get(&self, stage: Stage) -> Option<Duration> {
    self
      .steps
      .iter()
      .find(|(s, _)| *s == stage)
      .map(|(_, d)| *d)
  }

  pub fn steps(&self) -> &[(Stage, Duration)] {
    &self.steps
  }

  pub fn total(&self) -> Duration {
    self.steps.iter().map(|(_, d)| *d).sum()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
  Classified {
    result: DecisionResult,
    decision: Decision,
    label: Option<String>,
  },
  /// 模型输出形状无法解码，不是失败也不是阴性
  Unrecognized(Dims),
  Failed {
    stage: Stage,
    error: PipelineError,
  },
}

impl CycleOutcome {
  pub fn kind(&self) -> &'static str {
    match self {
      CycleOutcome::Classified {
        decision: Decision::Positive,
        ..
      } => "positive",
      CycleOutcome::Classified {
        decision: Decision::Negative,
        ..
      } => "negative",
      CycleOutcome::Unrecognized(_) => "unrecognized",
      CycleOutcome::Failed { .. } => "failed",
    }
  }
}

/// 每个周期恰好产生一份报告
#[derive(Debug, Clone)]
pub struct CycleReport {
  pub cycle: u64,
  pub outcome: CycleOutcome,
  /// 预处理、推理与解码的总耗时
  pub elapsed: Duration,
  pub timings: StageTimings,
}

pub struct Pipeline<M, C = ScoreMap> {
  config: PipelineConfig,
  model: M,
  decoder: Decoder<C>,
  ledger: Rc<AllocationLedger>,
  cycle: u64,
}

impl<M: Model> Pipeline<M> {
  /// 使用配置中的置信度映射
  pub fn new(config: PipelineConfig, model: M) -> Result<Self, ConfigError> {
    let calibration = config.calibration;
    Self::with_calibration(config, model, calibration)
  }
}

impl<M: Model, C: Calibration> Pipeline<M, C> {
  pub fn with_calibration(
    config: PipelineConfig,
    mut model: M,
    calibration: C,
  ) -> Result<Self, ConfigError> {
    config.validate()?;

    let expected = sample_count(config.input_width, config.input_height, RGB_CHANNELS);
    let input = model.input_tensor();
    if expected != Some(input.capacity()) {
      warn!(
        "目标尺寸 {}x{}x{} 与模型输入形状 {} 不一致, 每个周期都将失败",
        config.input_width,
        config.input_height,
        RGB_CHANNELS,
        input.dims()
      );
    }
    debug!("模型输入形状: {}", input.dims());
    debug!("模型输出形状: {}", model.output_tensor().dims());

    let decoder = Decoder::new(calibration, config.positive_class, config.threshold);
    Ok(Self {
      config,
      model,
      decoder,
      ledger: Rc::new(AllocationLedger::default()),
      cycle: 0,
    })
  }

  pub fn config(&self) -> &PipelineConfig {
    &self.config
  }

  pub fn model(&self) -> &M {
    &self.model
  }

  pub fn ledger(&self) -> &AllocationLedger {
    &self.ledger
  }

  /// 采集一帧并完整处理
  ///
  /// 任何阶段失败都只结束当前周期，帧与已分配的中间图像都会被释放。
  pub fn run_cycle<S: FrameSource>(&mut self, source: &mut S) -> CycleReport {
    self.cycle += 1;
    let mut timings = StageTimings::default();

    let frame = match FrameGuard::capture(source) {
      Ok(frame) => frame,
      Err(e) => {
        warn!("第 {} 周期采集失败: {}", self.cycle, e);
        return CycleReport {
          cycle: self.cycle,
          outcome: CycleOutcome::Failed {
            stage: Stage::Capture,
            error: PipelineError::CaptureUnavailable(e.to_string()),
          },
          elapsed: Duration::ZERO,
          timings,
        };
      }
    };

    let start = Instant::now();
    let processed = self.process(&frame, &mut timings);
    let elapsed = start.elapsed();
    drop(frame);

    if self.ledger.live() != 0 {
      error!("第 {} 周期结束时仍有 {} 个中间图像未释放", self.cycle, self.ledger.live());
    }

    for (stage, duration) in timings.steps() {
      debug!("阶段 {} 耗时: {:.2?}", stage, duration);
    }

    let outcome = match processed {
      Ok(Decoded::Classification(result)) => self.classified(result),
      Ok(Decoded::Unrecognized(dims)) => {
        warn!("模型输出形状 {} 无法解码", dims);
        CycleOutcome::Unrecognized(dims)
      }
      Err((stage, error)) => {
        warn!("第 {} 周期在阶段 {} 失败: {}", self.cycle, stage, error);
        CycleOutcome::Failed { stage, error }
      }
    };

    CycleReport {
      cycle: self.cycle,
      outcome,
      elapsed,
      timings,
    }
  }

  fn process(
    &mut self,
    frame: &Frame,
    timings: &mut StageTimings,
  ) -> Result<Decoded, (Stage, PipelineError)> {
    let (width, height) = (self.config.input_width, self.config.input_height);
    let range = self.config.quantization;

    let rgb = timings
      .measure(Stage::Convert, || rgb565_to_rgb888(frame))
      .map_err(|e| (Stage::Convert, e))?;
    let rgb = self.ledger.track(rgb);

    let resized = timings
      .measure(Stage::Resize, || resize_bilinear(&rgb, width, height))
      .map_err(|e| (Stage::Resize, e))?;
    drop(rgb);
    let resized = self.ledger.track(resized);

    let quantized = timings.measure(Stage::Quantize, || quantize(&resized, &range));
    drop(resized);
    let quantized = self.ledger.track(quantized);

    let input = self.model.input_tensor();
    timings
      .measure(Stage::Load, || load_image(&quantized, input))
      .map_err(|e| (Stage::Load, e))?;
    drop(quantized);

    let model = &mut self.model;
    timings
      .measure(Stage::Infer, || model.run())
      .map_err(|e| (Stage::Infer, PipelineError::InferenceError(e.to_string())))?;

    let output = self.model.output_tensor();
    let decoder = &self.decoder;
    Ok(timings.measure(Stage::Decode, || decoder.decode(output)))
  }

  fn classified(&self, result: DecisionResult) -> CycleOutcome {
    let decision = self.decoder.decide(&result);
    let label = self.config.label(result.class_id).map(String::from);
    if label.is_none() && !self.config.labels.is_empty() {
      warn!("类别编号 {} 没有对应的标签", result.class_id);
    }

    CycleOutcome::Classified {
      result,
      decision,
      label,
    }
  }
}

#[cfg(test)]
mod tests;
