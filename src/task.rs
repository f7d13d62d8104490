// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/task.rs - 任务循环
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
  fmt::Display,
  sync::mpsc::{self, Receiver, RecvTimeoutError},
  thread,
  time::Duration,
};

use tracing::{info, warn};

use crate::{
  decode::Calibration,
  frame::FrameSource,
  model::Model,
  output::Report,
  pipeline::{CycleOutcome, CycleReport, Pipeline, Stage},
};

pub trait Task<S, M, C, O>: Sized {
  type Error;
  fn run_task(self, source: S, pipeline: Pipeline<M, C>, output: O) -> Result<(), Self::Error>;
}

/// 上报失败只记录日志，不影响下一个周期
fn deliver<O>(output: &O, report: &CycleReport)
where
  O: Report,
  O::Error: Display,
{
  if let Err(e) = output.report(report) {
    warn!("({}) 结果上报失败: {}", report.cycle, e);
  }
}

pub struct OneShotTask;

impl<S, M, C, O> Task<S, M, C, O> for OneShotTask
where
  S: FrameSource,
  M: Model,
  C: Calibration,
  O: Report,
  O::Error: Display,
{
  type Error = anyhow::Error;

  fn run_task(self, mut source: S, mut pipeline: Pipeline<M, C>, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let report = pipeline.run_cycle(&mut source);
    info!("周期完成，耗时: {:.2?}", report.elapsed);
    deliver(&output, &report);

    if let CycleOutcome::Failed { stage, error } = report.outcome {
      anyhow::bail!("阶段 {} 失败: {}", stage, error);
    }
    Ok(())
  }
}

/// 基准测试: 同一个流水线连续运行多次，统计平均耗时
#[derive(Debug)]
pub struct RepeatShotTask {
  times: usize,
}

impl RepeatShotTask {
  pub const DEFAULT_TIMES: usize = 1000;
  /// 预热周期不计入平均值
  pub const WARMUP: usize = 2;

  pub fn with_times(mut self, times: usize) -> Self {
    self.times = times;
    self
  }
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self {
      times: Self::DEFAULT_TIMES,
    }
  }
}

/// 跳过预热周期后的平均值，样本不足时使用全部样本
pub fn average_elapsed(times: &[Duration], warmup: usize) -> Option<Duration> {
  let samples = if times.len() > warmup {
    &times[warmup..]
  } else {
    times
  };
  if samples.is_empty() {
    return None;
  }
  Some(mean(samples.iter().sum(), samples.len()))
}

fn mean(total: Duration, count: usize) -> Duration {
  total.div_f64(count as f64)
}

impl<S, M, C, O> Task<S, M, C, O> for RepeatShotTask
where
  S: FrameSource,
  M: Model,
  C: Calibration,
  O: Report,
  O::Error: Display,
{
  type Error = anyhow::Error;

  fn run_task(self, mut source: S, mut pipeline: Pipeline<M, C>, output: O) -> Result<(), Self::Error> {
    info!("开始任务，共 {} 个周期...", self.times);
    let mut times = Vec::with_capacity(self.times);
    let mut failures = 0usize;

    for _ in 0..self.times {
      let report = pipeline.run_cycle(&mut source);
      info!("({})周期完成，耗时: {:.2?}", report.cycle, report.elapsed);
      deliver(&output, &report);
      match report.outcome {
        CycleOutcome::Failed { .. } => failures += 1,
        _ => times.push(report.elapsed),
      }
    }

    if failures > 0 {
      warn!("{} 个周期失败，不计入统计", failures);
    }
    match average_elapsed(&times, Self::WARMUP) {
      Some(average) => warn!("平均推理时间: {:.2?}", average),
      None => anyhow::bail!("没有成功的周期"),
    }

    Ok(())
  }
}

/// 持续采集，直到收到中断信号或达到指定周期数
#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<u64>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<u64>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 返回实际运行的周期数
  ///
  /// 周期之间等待 `capture_delay`，采集失败后改为等待 `retry_delay`，
  /// 等待期间收到 `stop` 上的消息即退出。
  pub fn run_until<S, M, C, O>(
    &self,
    source: &mut S,
    pipeline: &mut Pipeline<M, C>,
    output: &O,
    stop: &Receiver<()>,
  ) -> u64
  where
    S: FrameSource,
    M: Model,
    C: Calibration,
    O: Report,
    O::Error: Display,
  {
    let capture_delay = pipeline.config().capture_delay;
    let retry_delay = pipeline.config().retry_delay;
    let mut cycles = 0;

    loop {
      let report = pipeline.run_cycle(source);
      cycles += 1;
      info!("处理第 {} 帧图像，耗时: {:.2?}", report.cycle, report.elapsed);
      deliver(output, &report);

      if self.frame_number.is_some_and(|n| cycles >= n) {
        info!("达到指定帧数 {}, 退出任务循环", cycles);
        break;
      }

      let delay = match report.outcome {
        CycleOutcome::Failed {
          stage: Stage::Capture,
          ..
        } => retry_delay,
        _ => capture_delay,
      };
      match stop.recv_timeout(delay) {
        Ok(()) => {
          warn!("中断信号接收，退出任务循环");
          break;
        }
        Err(RecvTimeoutError::Timeout) => {}
        Err(RecvTimeoutError::Disconnected) => thread::sleep(delay),
      }
    }

    cycles
  }
}

impl<S, M, C, O> Task<S, M, C, O> for ContinuousTask
where
  S: FrameSource,
  M: Model,
  C: Calibration,
  O: Report,
  O::Error: Display,
{
  type Error = anyhow::Error;

  fn run_task(self, mut source: S, mut pipeline: Pipeline<M, C>, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let (tx, rx) = mpsc::channel();

    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;

    let cycles = self.run_until(&mut source, &mut pipeline, &output, &rx);
    info!("任务完成，共 {} 个周期，退出", cycles);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_average_skips_warmup() {
    let times = [
      Duration::from_millis(100),
      Duration::from_millis(50),
      Duration::from_millis(10),
      Duration::from_millis(20),
    ];
    assert_eq!(average_elapsed(&times, 2), Some(Duration::from_millis(15)));
    assert_eq!(
      average_elapsed(&times[..2], 2),
      Some(Duration::from_millis(75))
    );
    assert_eq!(average_elapsed(&[], 2), None);
  }

  #[test]
  fn test_mean_counts_beyond_u32() {
    let count = 1usize << 33;
    assert_eq!(
      mean(Duration::from_secs(1 << 33), count),
      Duration::from_secs(1)
    );
  }
}
