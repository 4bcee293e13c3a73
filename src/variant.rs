// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/variant.rs - 雪场差异化策略
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

use tracing::debug;

use crate::{
  Measurement,
  calibrate::{CalibrationError, CalibrationParams, StakeCalibrator},
  classify::SnowClassifier,
  config::ResortConfig,
  frame::Frame,
  region::{RegionError, RegionGeometry, RegionMap},
};

/// 不同雪桩样式之间唯一有差异的三个步骤
pub trait StakeStrategy {
  fn calibrate(&self, frame: Frame) -> Result<(Frame, CalibrationParams), CalibrationError>;
  fn build_regions(&self, params: &CalibrationParams) -> RegionMap;
  fn classify(&self, frame: &Frame, regions: &RegionMap) -> Measurement;
}

/// 由雪场配置选出的策略
pub struct StakeVariant<'a> {
  resort: &'a ResortConfig,
  geometry: RegionGeometry,
}

impl<'a> StakeVariant<'a> {
  pub fn from_resort(resort: &'a ResortConfig) -> Result<Self, RegionError> {
    let geometry = resort.geometry()?;
    debug!(
      "雪场 {} 使用 {} 个刻度区域",
      resort.name,
      geometry.inches() + 1
    );
    Ok(Self { resort, geometry })
  }
}

impl StakeStrategy for StakeVariant<'_> {
  fn calibrate(&self, frame: Frame) -> Result<(Frame, CalibrationParams), CalibrationError> {
    let stake_box = &self.resort.stake_box;
    StakeCalibrator::new(
      &self.resort.stake,
      stake_box.height as u32,
      stake_box.width as u32,
      self.resort.default_origin(),
    )
    .calibrate(frame)
  }

  fn build_regions(&self, params: &CalibrationParams) -> RegionMap {
    self.geometry.build(params.origin)
  }

  fn classify(&self, frame: &Frame, regions: &RegionMap) -> Measurement {
    SnowClassifier::new(&self.resort.classifier).classify(frame, regions)
  }
}
