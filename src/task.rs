// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/task.rs - 单次与周期性测量任务
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
  sync::mpsc::{Receiver, RecvTimeoutError},
  thread,
  time::{Duration, Instant},
};

use tracing::{error, info, warn};

use crate::{
  Measurement,
  compose,
  frame::Frame,
  input::FrameSource,
  output::{Record, Render},
  overlay::TextOverlay,
  pipeline::StakeImagePipeline,
  variant::StakeStrategy,
};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// 一次完整的测量：取图、处理、输出
pub trait Job {
  fn name(&self) -> &str;
  fn run_once(&self) -> anyhow::Result<Measurement>;
}

/// 单个雪场的测量任务
pub struct ResortJob<'a, I, S, T, R>
where
  S: StakeStrategy,
  T: TextOverlay,
{
  name: &'a str,
  source: I,
  pipeline: StakeImagePipeline<'a, S, T>,
  output: &'a R,
  panel: Option<Frame>,
}

impl<'a, I, S, T, R> ResortJob<'a, I, S, T, R>
where
  S: StakeStrategy,
  T: TextOverlay,
{
  pub fn new(name: &'a str, source: I, pipeline: StakeImagePipeline<'a, S, T>, output: &'a R) -> Self {
    Self {
      name,
      source,
      pipeline,
      output,
      panel: None,
    }
  }

  /// 输出前拼接在左侧的面板
  pub fn with_panel(mut self, panel: Option<Frame>) -> Self {
    self.panel = panel;
    self
  }
}

impl<'a, I, S, T, R, IE, RE> Job for ResortJob<'a, I, S, T, R>
where
  I: FrameSource<Error = IE>,
  S: StakeStrategy,
  T: TextOverlay,
  R: Render<Frame, Record, Error = RE>,
  IE: std::error::Error + Send + Sync + 'static,
  RE: std::error::Error + Send + Sync + 'static,
{
  fn name(&self) -> &str {
    self.name
  }

  fn run_once(&self) -> anyhow::Result<Measurement> {
    let frame = self.source.read_frame()?;
    let reading = self.pipeline.run(frame)?;
    let frame = match &self.panel {
      Some(panel) => compose::side_by_side(panel, &reading.frame),
      None => reading.frame,
    };
    let record = Record {
      resort: self.name.to_string(),
      measurement: reading.measurement,
    };
    self.output.render_result(&frame, &record)?;
    Ok(reading.measurement)
  }
}

pub trait Task<J>: Sized {
  type Error;
  fn run_task(self, jobs: &[J]) -> Result<(), Self::Error>;
}

/// 只运行第一个任务一次，失败直接返回
pub struct OneShotTask;

impl<J: Job> Task<J> for OneShotTask {
  type Error = anyhow::Error;

  fn run_task(self, jobs: &[J]) -> Result<(), Self::Error> {
    let job = jobs.first().ok_or_else(|| anyhow::anyhow!("没有可运行的任务"))?;
    info!("开始任务: {}", job.name());
    let now = Instant::now();
    let measurement = job.run_once()?;
    info!(
      "任务完成: {} 雪深 {:?}，耗时: {:.2?}",
      job.name(),
      measurement,
      now.elapsed()
    );
    Ok(())
  }
}

/// 按固定间隔轮流运行各个任务，间隔从启动时刻起算，不随耗时漂移
#[derive(Debug)]
pub struct ContinuousTask {
  interval: Duration,
  frame_number: Option<usize>,
}

impl Default for ContinuousTask {
  fn default() -> Self {
    Self {
      interval: DEFAULT_INTERVAL,
      frame_number: None,
    }
  }
}

/// 距离下一个间隔边界还需等待的时间
pub fn until_next_tick(elapsed: Duration, interval: Duration) -> Duration {
  if interval.is_zero() {
    return Duration::ZERO;
  }
  let into = elapsed.as_nanos() % interval.as_nanos();
  interval - Duration::from_nanos(into as u64)
}

impl ContinuousTask {
  pub fn with_interval(mut self, interval: Duration) -> Self {
    self.interval = interval;
    self
  }

  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 循环运行直到达到次数上限或收到停止信号；返回运行次数
  pub fn run_until<J: Job>(&self, jobs: &[J], stop: &Receiver<()>) -> usize {
    if jobs.is_empty() {
      warn!("没有可运行的任务");
      return 0;
    }

    let start = Instant::now();
    let mut runs = 0;
    for job in jobs.iter().cycle() {
      runs += 1;
      info!("第 {} 次运行: {}", runs, job.name());
      let now = Instant::now();
      match job.run_once() {
        Ok(measurement) => info!(
          "{} 雪深 {:?}，耗时: {:.2?}",
          job.name(),
          measurement,
          now.elapsed()
        ),
        Err(err) => error!("{} 运行失败: {:#}", job.name(), err),
      }

      if self.frame_number.is_some_and(|n| runs >= n) {
        info!("达到指定次数 {}, 退出任务循环", runs);
        break;
      }

      let wait = until_next_tick(start.elapsed(), self.interval);
      match stop.recv_timeout(wait) {
        Ok(()) | Err(RecvTimeoutError::Disconnected) => {
          warn!("中断信号接收，退出任务循环");
          break;
        }
        Err(RecvTimeoutError::Timeout) => {}
      }
    }
    runs
  }
}

impl<J: Job> Task<J> for ContinuousTask {
  type Error = anyhow::Error;

  fn run_task(self, jobs: &[J]) -> Result<(), Self::Error> {
    info!("开始任务，间隔 {:?}", self.interval);
    let (tx, rx) = std::sync::mpsc::channel();

    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;

    let runs = self.run_until(jobs, &rx);
    info!("任务完成，共运行 {} 次，退出", runs);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::Cell;
  use std::sync::mpsc;

  struct Counting {
    name: String,
    calls: Cell<usize>,
    fail: bool,
  }

  impl Counting {
    fn new(name: &str, fail: bool) -> Self {
      Self {
        name: name.to_string(),
        calls: Cell::new(0),
        fail,
      }
    }
  }

  impl Job for Counting {
    fn name(&self) -> &str {
      &self.name
    }

    fn run_once(&self) -> anyhow::Result<Measurement> {
      self.calls.set(self.calls.get() + 1);
      if self.fail {
        anyhow::bail!("抓拍图不可用");
      }
      Ok(Some(3))
    }
  }

  #[test]
  fn next_tick_accounts_for_elapsed_time() {
    let interval = Duration::from_secs(60);
    assert_eq!(until_next_tick(Duration::from_secs(0), interval), interval);
    assert_eq!(
      until_next_tick(Duration::from_secs(75), interval),
      Duration::from_secs(45)
    );
    assert_eq!(until_next_tick(Duration::from_secs(5), Duration::ZERO), Duration::ZERO);
  }

  #[test]
  fn resorts_are_cycled_in_order_and_failures_do_not_stop_loop() {
    let jobs = vec![Counting::new("breckenridge", true), Counting::new("vail", false)];
    let (_tx, rx) = mpsc::channel();
    let task = ContinuousTask::default()
      .with_interval(Duration::ZERO)
      .with_frame_number(Some(5));
    assert_eq!(task.run_until(&jobs, &rx), 5);
    assert_eq!(jobs[0].calls.get(), 3);
    assert_eq!(jobs[1].calls.get(), 2);
  }

  #[test]
  fn stop_signal_ends_loop_after_current_run() {
    let jobs = vec![Counting::new("vail", false)];
    let (tx, rx) = mpsc::channel();
    tx.send(()).unwrap();
    let task = ContinuousTask::default().with_interval(Duration::from_secs(3600));
    assert_eq!(task.run_until(&jobs, &rx), 1);
  }

  #[test]
  fn one_shot_propagates_failure() {
    let jobs = vec![Counting::new("vail", true)];
    assert!(OneShotTask.run_task(&jobs).is_err());
    let jobs = vec![Counting::new("vail", false)];
    assert!(OneShotTask.run_task(&jobs).is_ok());
    assert!(Task::<Counting>::run_task(OneShotTask, &[]).is_err());
  }
}
