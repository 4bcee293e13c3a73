// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/calibrate/lightness_band.rs - 高亮度色带标定
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

use image::GrayImage;
use imageproc::{distance_transform::Norm, morphology};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{
  CalibrationError, Roi, ScanPass, crop_gray,
  scan::{self, SampleSeries},
};
use crate::{
  color::{self, ColorRange, ColorSpace, MASK_ON},
  frame::Frame,
  normalize,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightnessBandConfig {
  /// HLS 空间中的桩身色带
  pub band: ColorRange,
  /// 方形结构元素半径，2 对应 5x5
  pub kernel_radius: u8,
  pub dilate_iterations: u8,
  pub erode_iterations: u8,
  /// 估计倾角的区域，不能太高，否则积雪会进入
  pub rotation_roi: Roi,
  pub origin_roi: Roi,
  pub rotation_divisor: u32,
  pub origin_divisor: u32,
  /// 复查桩顶时相对左边缘的偏移
  pub refine_offset: u32,
  /// 补偿旋转后桩顶边缘缺口的像素数
  pub top_buffer: i32,
}

impl Default for LightnessBandConfig {
  fn default() -> Self {
    Self {
      band: ColorRange::new([0, 180, 0], [255, 255, 255]),
      kernel_radius: 2,
      dilate_iterations: 4,
      erode_iterations: 8,
      rotation_roi: Roi::new(1300, 200, 500, 500),
      origin_roi: Roi::new(1300, 200, 500, 300),
      rotation_divisor: 12,
      origin_divisor: 8,
      refine_offset: 5,
      top_buffer: 0,
    }
  }
}

fn is_on(value: u8) -> bool {
  value == MASK_ON
}

impl LightnessBandConfig {
  fn stake_mask(&self, frame: &Frame) -> GrayImage {
    let mask = color::in_range_mask(frame.image(), ColorSpace::Hls, &self.band);
    if self.kernel_radius == 0 {
      return mask;
    }
    morphology::open(&mask, Norm::LInf, self.kernel_radius)
  }

  // 连续 n 次半径 r 的方形膨胀等价于一次半径 n*r 的膨胀
  fn repeated(&self, iterations: u8) -> u8 {
    self.kernel_radius.saturating_mul(iterations)
  }

  fn dilate(&self, mask: GrayImage) -> GrayImage {
    match self.repeated(self.dilate_iterations) {
      0 => mask,
      k => morphology::dilate(&mask, Norm::LInf, k),
    }
  }

  fn erode(&self, mask: GrayImage) -> GrayImage {
    match self.repeated(self.erode_iterations) {
      0 => mask,
      k => morphology::erode(&mask, Norm::LInf, k),
    }
  }

  fn estimate_rotation(&self, frame: &Frame) -> Result<f64, CalibrationError> {
    let mask = self.stake_mask(frame);
    let (crop, _) = crop_gray(&mask, self.rotation_roi, ScanPass::Rotation)?;
    let crop = self.erode(self.dilate(crop));

    let stride = scan::stride(crop.height(), self.rotation_divisor);
    let series = scan::sweep_rows(&crop, 0, stride, is_on);
    debug!("倾角扫描: 步长 {}, 样本数 {}", stride, series.len());

    series
      .correction_angle()
      .ok_or(CalibrationError::NoSamples {
        pass: ScanPass::Rotation,
      })
  }

  fn estimate_origin(&self, frame: &Frame) -> Result<(i32, i32), CalibrationError> {
    let mask = self.stake_mask(frame);
    let (crop, rect) = crop_gray(&mask, self.origin_roi, ScanPass::StakeTop)?;
    let crop = self.dilate(crop);

    // 第一遍：沿 ROI 中线向下找桩顶（也可能是雪面）
    let top = scan::first_in_column(&crop, crop.width() / 2, 0, is_on).ok_or(
      CalibrationError::NoSamples {
        pass: ScanPass::StakeTop,
      },
    )?;
    debug!("中线桩顶: {}", top);

    // 第二遍：自桩顶向下找桩的左边缘
    let stride = scan::stride(crop.height() - top, self.origin_divisor);
    let series: SampleSeries = scan::sweep_rows(&crop, top, stride, is_on);
    let left = series.robust_column().ok_or(CalibrationError::NoSamples {
      pass: ScanPass::StakeEdge,
    })? as u32;
    debug!("左边缘: {} (样本数 {})", left, series.len());

    // 中线可能落在雪上，从左边缘附近重新找桩顶
    let refine_column = (left + self.refine_offset).min(crop.width() - 1);
    let top = match scan::first_in_column(&crop, refine_column, 0, is_on) {
      Some(y) => y,
      None => {
        warn!("第 {} 列未找到桩顶，沿用中线结果", refine_column);
        top
      }
    };

    Ok((
      rect.left() + left as i32,
      rect.top() + top as i32 + self.top_buffer,
    ))
  }

  pub(super) fn calibrate(&self, frame: Frame) -> Result<(Frame, (i32, i32), f64), CalibrationError> {
    let rotation = self.estimate_rotation(&frame)?;
    let frame = normalize::rotate(frame, rotation);
    let origin = self.estimate_origin(&frame)?;
    Ok((frame, origin, rotation))
  }
}
