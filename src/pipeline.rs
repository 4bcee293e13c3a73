// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/pipeline.rs - 雪桩图像处理流水线
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

//! 每个阶段是一个独立的类型，只能由上一阶段消费后得到：
//! `Fetched -> Calibrated -> Regioned -> Classified -> Normalized -> Annotated`。

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::{
  Measurement,
  annotate::{self, AnnotationConfig, Annotator},
  calibrate::{CalibrationError, CalibrationParams},
  config::ResortConfig,
  frame::{Frame, FrameError},
  normalize::{self, NormalizeError, NormalizerConfig, Zoom},
  overlay::TextOverlay,
  region::{RegionError, RegionMap},
  variant::{StakeStrategy, StakeVariant},
};

#[derive(Error, Debug)]
pub enum PipelineError {
  #[error("帧错误: {0}")]
  FrameError(#[from] FrameError),
  #[error("区域配置错误: {0}")]
  RegionError(#[from] RegionError),
  #[error("标定失败: {0}")]
  CalibrationError(#[from] CalibrationError),
  #[error("归一化失败: {0}")]
  NormalizeError(#[from] NormalizeError),
}

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct StakeReading {
  pub frame: Frame,
  pub measurement: Measurement,
  pub params: CalibrationParams,
}

/// 已取得并放大的原始帧
pub struct Fetched {
  frame: Frame,
}

impl Fetched {
  pub fn new(frame: Frame, scale: u32) -> Self {
    let (width, height) = (frame.width(), frame.height());
    let frame = frame.upscale(scale);
    debug!(
      "输入 {}x{} 放大 {} 倍至 {}x{}",
      width,
      height,
      scale,
      frame.width(),
      frame.height()
    );
    Self { frame }
  }

  pub fn calibrate<S: StakeStrategy>(self, strategy: &S) -> Result<Calibrated, CalibrationError> {
    let (frame, params) = strategy.calibrate(self.frame)?;
    Ok(Calibrated { frame, params })
  }
}

pub struct Calibrated {
  frame: Frame,
  params: CalibrationParams,
}

impl Calibrated {
  pub fn params(&self) -> &CalibrationParams {
    &self.params
  }

  pub fn build_regions<S: StakeStrategy>(self, strategy: &S) -> Regioned {
    let regions = strategy.build_regions(&self.params);
    debug!("生成 {} 个刻度区域", regions.len());
    Regioned {
      frame: self.frame,
      params: self.params,
      regions,
    }
  }
}

pub struct Regioned {
  frame: Frame,
  params: CalibrationParams,
  regions: RegionMap,
}

impl Regioned {
  pub fn regions(&self) -> &RegionMap {
    &self.regions
  }

  pub fn classify<S: StakeStrategy>(self, strategy: &S) -> Classified {
    let measurement = strategy.classify(&self.frame, &self.regions);
    Classified {
      frame: self.frame,
      params: self.params,
      regions: self.regions,
      measurement,
    }
  }
}

pub struct Classified {
  frame: Frame,
  params: CalibrationParams,
  regions: RegionMap,
  measurement: Measurement,
}

impl Classified {
  pub fn measurement(&self) -> Measurement {
    self.measurement
  }

  pub fn normalize(self, config: &NormalizerConfig) -> Result<Normalized, NormalizeError> {
    let (frame, zoom) = normalize::converge_crop(self.frame, config)?;
    Ok(Normalized {
      frame,
      params: self.params,
      regions: self.regions,
      measurement: self.measurement,
      zoom,
    })
  }
}

pub struct Normalized {
  frame: Frame,
  params: CalibrationParams,
  regions: RegionMap,
  measurement: Measurement,
  zoom: Zoom,
}

impl Normalized {
  pub fn zoom(&self) -> &Zoom {
    &self.zoom
  }

  pub fn annotate<O: TextOverlay>(
    self,
    overlay: &O,
    config: &AnnotationConfig,
    draw_regions: bool,
  ) -> Annotated {
    let mut frame = self.frame;
    if draw_regions {
      frame = annotate::draw_regions(frame, &self.regions, &self.zoom, config);
    }
    let annotator = Annotator::new(overlay, config);
    let frame = annotator.draw_snowline(frame, &self.regions, self.measurement, &self.zoom);
    let frame = annotator.draw_header(frame, self.measurement);
    Annotated {
      reading: StakeReading {
        frame,
        measurement: self.measurement,
        params: self.params,
      },
    }
  }
}

pub struct Annotated {
  reading: StakeReading,
}

impl Annotated {
  pub fn into_reading(self) -> StakeReading {
    self.reading
  }
}

pub struct StakeImagePipeline<'a, S: StakeStrategy, O: TextOverlay> {
  strategy: S,
  overlay: &'a O,
  scale: u32,
  normalizer: &'a NormalizerConfig,
  annotation: &'a AnnotationConfig,
  draw_regions: bool,
}

impl<'a, O: TextOverlay> StakeImagePipeline<'a, StakeVariant<'a>, O> {
  pub fn for_resort(resort: &'a ResortConfig, overlay: &'a O) -> Result<Self, PipelineError> {
    let strategy = StakeVariant::from_resort(resort)?;
    Ok(Self::new(
      strategy,
      overlay,
      resort.scale,
      &resort.normalizer,
      &resort.annotation,
    ))
  }
}

impl<'a, S: StakeStrategy, O: TextOverlay> StakeImagePipeline<'a, S, O> {
  pub fn new(
    strategy: S,
    overlay: &'a O,
    scale: u32,
    normalizer: &'a NormalizerConfig,
    annotation: &'a AnnotationConfig,
  ) -> Self {
    Self {
      strategy,
      overlay,
      scale,
      normalizer,
      annotation,
      draw_regions: false,
    }
  }

  pub fn with_draw_regions(mut self, draw_regions: bool) -> Self {
    self.draw_regions = draw_regions;
    self
  }

  pub fn run(&self, frame: Frame) -> Result<StakeReading, PipelineError> {
    let now = Instant::now();

    let calibrated = Fetched::new(frame, self.scale).calibrate(&self.strategy)?;
    info!("标定耗时: {:.2?}", now.elapsed());

    let classified = calibrated
      .build_regions(&self.strategy)
      .classify(&self.strategy);
    info!("判定耗时: {:.2?}", now.elapsed());

    let normalized = classified.normalize(self.normalizer)?;
    info!(
      "归一化完成，迭代 {} 次，耗时: {:.2?}",
      normalized.zoom().iterations,
      now.elapsed()
    );

    let reading = normalized
      .annotate(self.overlay, self.annotation, self.draw_regions)
      .into_reading();
    info!("流水线完成，耗时: {:.2?}", now.elapsed());
    Ok(reading)
  }
}
