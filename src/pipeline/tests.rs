// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/pipeline/tests.rs - 流水线场景测试
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

use super::*;
use crate::{
  frame::PixelFormat,
  preprocess::QuantizationRange,
  tensor::{Tensor, TensorLayout},
};

const MID_GRAY: u16 = 0x8410;

#[derive(Error, Debug)]
#[error("模拟错误")]
struct MockError;

struct MockSource {
  width: usize,
  height: usize,
  pixel: u16,
  /// 缓冲区长度的偏差，用于构造损坏的帧
  truncate: usize,
  available: bool,
  captured: usize,
  released: usize,
}

impl MockSource {
  fn solid(width: usize, height: usize, pixel: u16) -> Self {
    Self {
      width,
      height,
      pixel,
      truncate: 0,
      available: true,
      captured: 0,
      released: 0,
    }
  }
}

impl FrameSource for MockSource {
  type Error = MockError;

  fn capture(&mut self) -> Result<Frame, Self::Error> {
    if !self.available {
      return Err(MockError);
    }
    self.captured += 1;
    let mut data: Vec<u8> = (0..self.width * self.height)
      .flat_map(|_| PixelFormat::Rgb565Be.encode(self.pixel))
      .collect();
    data.truncate(data.len() - self.truncate);
    Ok(Frame::new(
      self.width,
      self.height,
      PixelFormat::Rgb565Be,
      data.into(),
    ))
  }

  fn release(&mut self, _frame: Frame) {
    self.released += 1;
  }
}

struct MockModel {
  input: Tensor,
  output: Tensor,
  /// 前若干次运行返回错误
  failures: usize,
  runs: usize,
  last_input: Vec<i8>,
}

impl MockModel {
  fn classifier(input: Dims, scores: &[i8]) -> Self {
    let mut output = Tensor::zeroed(Dims::new(1, scores.len(), 1, 1), TensorLayout::Nchw);
    output.as_mut_slice().copy_from_slice(scores);
    Self {
      input: Tensor::zeroed(input, TensorLayout::Nhwc),
      output,
      failures: 0,
      runs: 0,
      last_input: Vec::new(),
    }
  }

  fn with_output(input: Dims, output: Dims) -> Self {
    Self {
      input: Tensor::zeroed(input, TensorLayout::Nhwc),
      output: Tensor::zeroed(output, TensorLayout::Nchw),
      failures: 0,
      runs: 0,
      last_input: Vec::new(),
    }
  }
}

impl Model for MockModel {
  type Error = MockError;

  fn input_tensor(&mut self) -> &mut Tensor {
    &mut self.input
  }

  fn output_tensor(&self) -> &Tensor {
    &self.output
  }

  fn run(&mut self) -> Result<(), Self::Error> {
    self.runs += 1;
    self.last_input = self.input.as_slice().to_vec();
    if self.failures > 0 {
      self.failures -= 1;
      return Err(MockError);
    }
    Ok(())
  }
}

fn config_2x2() -> PipelineConfig {
  PipelineConfig::builder()
    .input_size(2, 2)
    .quantization(QuantizationRange::default())
    .positive_class(1)
    .threshold(0.5)
    .build()
}

const INPUT_2X2: Dims = Dims::new(1, 3, 2, 2);

#[test]
fn test_gray_frame_end_to_end() {
  let mut source = MockSource::solid(4, 4, MID_GRAY);
  let model = MockModel::classifier(INPUT_2X2, &[10, 90, -128, -128]);
  let mut pipeline = Pipeline::new(config_2x2(), model).unwrap();

  let report = pipeline.run_cycle(&mut source);

  // 0x8410 -> (132, 130, 132); -128 + v * 255 / 255
  let range = QuantizationRange::default();
  let [r, g, b] = crate::preprocess::expand_rgb565(MID_GRAY);
  let expected_pixel = [
    range.apply(r as f32),
    range.apply(g as f32),
    range.apply(b as f32),
  ];
  assert_eq!(expected_pixel, [4, 2, 4]);
  let expected: Vec<i8> = expected_pixel.iter().copied().cycle().take(12).collect();
  assert_eq!(pipeline.model().last_input, expected);

  assert_eq!(
    report.outcome,
    CycleOutcome::Classified {
      result: DecisionResult {
        class_id: 1,
        confidence: ScoreMap::Offset.confidence(90),
        raw_score: 90,
      },
      decision: Decision::Positive,
      label: None,
    }
  );
  assert_eq!(report.cycle, 1);
  assert_eq!((source.captured, source.released), (1, 1));
  assert_eq!((pipeline.ledger().allocated(), pipeline.ledger().released()), (3, 3));
}

#[test]
fn test_resize_failure_releases_converted_image() {
  let mut source = MockSource::solid(4, 4, MID_GRAY);
  let model = MockModel::classifier(INPUT_2X2, &[0, 0]);
  let config = PipelineConfig::builder().input_size(0, 2).build();
  let mut pipeline = Pipeline::new(config, model).unwrap();

  let report = pipeline.run_cycle(&mut source);

  assert!(matches!(
    report.outcome,
    CycleOutcome::Failed {
      stage: Stage::Resize,
      error: PipelineError::InvalidDimensions { .. }
    }
  ));
  assert_eq!(pipeline.ledger().allocated(), 1);
  assert_eq!(pipeline.ledger().released(), 1);
  assert_eq!((source.captured, source.released), (1, 1));
  assert_eq!(pipeline.model().runs, 0);
}

#[test]
fn test_load_failure_releases_every_intermediate() {
  let mut source = MockSource::solid(4, 4, MID_GRAY);
  let model = MockModel::classifier(Dims::new(1, 3, 4, 4), &[0, 0]);
  let mut pipeline = Pipeline::new(config_2x2(), model).unwrap();

  let report = pipeline.run_cycle(&mut source);

  assert_eq!(
    report.outcome,
    CycleOutcome::Failed {
      stage: Stage::Load,
      error: PipelineError::ShapeMismatch {
        expected: 48,
        actual: 12
      }
    }
  );
  assert_eq!((pipeline.ledger().allocated(), pipeline.ledger().released()), (3, 3));
  assert_eq!((source.captured, source.released), (1, 1));
  assert_eq!(pipeline.model().runs, 0);
}

#[test]
fn test_inference_failure_then_next_cycle_recovers() {
  let mut source = MockSource::solid(4, 4, MID_GRAY);
  let mut model = MockModel::classifier(INPUT_2X2, &[10, 90, -128, -128]);
  model.failures = 1;
  let mut pipeline = Pipeline::new(config_2x2(), model).unwrap();

  let first = pipeline.run_cycle(&mut source);
  assert!(matches!(
    first.outcome,
    CycleOutcome::Failed {
      stage: Stage::Infer,
      error: PipelineError::InferenceError(_)
    }
  ));
  assert_eq!(pipeline.ledger().live(), 0);

  let second = pipeline.run_cycle(&mut source);
  assert_eq!(second.cycle, 2);
  assert_eq!(second.outcome.kind(), "positive");

  assert_eq!((pipeline.ledger().allocated(), pipeline.ledger().released()), (6, 6));
  assert_eq!((source.captured, source.released), (2, 2));
  assert_eq!(pipeline.model().runs, 2);
}

#[test]
fn test_capture_unavailable_is_reported() {
  let mut source = MockSource::solid(4, 4, MID_GRAY);
  source.available = false;
  let model = MockModel::classifier(INPUT_2X2, &[0, 0]);
  let mut pipeline = Pipeline::new(config_2x2(), model).unwrap();

  let report = pipeline.run_cycle(&mut source);

  assert!(matches!(
    report.outcome,
    CycleOutcome::Failed {
      stage: Stage::Capture,
      error: PipelineError::CaptureUnavailable(_)
    }
  ));
  assert_eq!(report.elapsed, Duration::ZERO);
  assert_eq!((source.captured, source.released), (0, 0));
  assert_eq!(pipeline.ledger().allocated(), 0);
}

#[test]
fn test_corrupt_frame_fails_at_convert_and_is_released() {
  let mut source = MockSource::solid(4, 4, MID_GRAY);
  source.truncate = 1;
  let model = MockModel::classifier(INPUT_2X2, &[0, 0]);
  let mut pipeline = Pipeline::new(config_2x2(), model).unwrap();

  let report = pipeline.run_cycle(&mut source);

  assert!(matches!(
    report.outcome,
    CycleOutcome::Failed {
      stage: Stage::Convert,
      error: PipelineError::InvalidDimensions { len: 31, .. }
    }
  ));
  assert_eq!((source.captured, source.released), (1, 1));
  assert_eq!(pipeline.ledger().allocated(), 0);
}

#[test]
fn test_unrecognized_output_is_not_a_decision() {
  let mut source = MockSource::solid(4, 4, MID_GRAY);
  let model = MockModel::with_output(INPUT_2X2, Dims::new(1, 4, 2, 1));
  let mut pipeline = Pipeline::new(config_2x2(), model).unwrap();

  let report = pipeline.run_cycle(&mut source);

  assert_eq!(report.outcome, CycleOutcome::Unrecognized(Dims::new(1, 4, 2, 1)));
  assert_eq!(report.outcome.kind(), "unrecognized");
  assert_eq!(pipeline.ledger().live(), 0);
}

#[test]
fn test_labels_and_custom_calibration() {
  let mut source = MockSource::solid(4, 4, MID_GRAY);
  let model = MockModel::classifier(INPUT_2X2, &[10, 90]);
  let config = PipelineConfig::builder()
    .input_size(2, 2)
    .positive_class(1)
    .threshold(0.9)
    .labels(["motherboard", "background"])
    .build();
  let mut pipeline = Pipeline::with_calibration(config, model, |_: i8| 0.95f32).unwrap();

  let report = pipeline.run_cycle(&mut source);

  let CycleOutcome::Classified {
    result,
    decision,
    label,
  } = report.outcome
  else {
    panic!("应当得到分类结果");
  };
  assert_eq!(result.confidence, 0.95);
  assert_eq!(decision, Decision::Positive);
  assert_eq!(label.as_deref(), Some("background"));
}

#[test]
fn test_timings_cover_every_stage() {
  let mut source = MockSource::solid(4, 4, MID_GRAY);
  let model = MockModel::classifier(INPUT_2X2, &[0, 1]);
  let mut pipeline = Pipeline::new(config_2x2(), model).unwrap();

  let report = pipeline.run_cycle(&mut source);

  let stages: Vec<Stage> = report.timings.steps().iter().map(|(s, _)| *s).collect();
  assert_eq!(
    stages,
    [
      Stage::Convert,
      Stage::Resize,
      Stage::Quantize,
      Stage::Load,
      Stage::Infer,
      Stage::Decode
    ]
  );
  assert!(report.timings.get(Stage::Infer).is_some());
  assert!(report.timings.total() <= report.elapsed);
}

#[test]
fn test_invalid_config_is_rejected() {
  let model = MockModel::classifier(INPUT_2X2, &[0, 1]);
  let config = PipelineConfig::builder().threshold(-0.1).build();
  assert!(Pipeline::new(config, model).is_err());
}
