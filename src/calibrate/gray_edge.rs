// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/calibrate/gray_edge.rs - 灰度边缘标定
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

use serde::Deserialize;
use tracing::debug;

use super::{CalibrationError, Roi, ScanPass, crop_gray, scan};
use crate::{
  color::{self, ColorRange, ColorSpace, MASK_ON},
  frame::Frame,
  normalize,
};

/// 桩顶是白色图案、桩身是蓝色的雪桩。
///
/// 左边缘和倾角都取自同一组灰度样本，桩顶位置由粉色刻度确定。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GrayEdgeConfig {
  pub edge_roi: Roi,
  /// 灰度高于此值视为桩身
  pub gray_level: u8,
  pub divisor: u32,
  pub x_offset: i32,
  /// 刻度扫描区域与左边缘的间距
  pub marker_gap: i32,
  pub marker_top: i32,
  pub marker_height: u32,
  /// HSV 空间中的刻度颜色
  pub marker_band: ColorRange,
}

impl Default for GrayEdgeConfig {
  fn default() -> Self {
    Self {
      edge_roi: Roi::new(1100, 200, 500, 1000),
      gray_level: 100,
      divisor: 8,
      x_offset: 5,
      marker_gap: 10,
      marker_top: 200,
      marker_height: 800,
      marker_band: ColorRange::new([100, 0, 0], [180, 255, 255]),
    }
  }
}

impl GrayEdgeConfig {
  pub(super) fn calibrate(&self, frame: Frame) -> Result<(Frame, (i32, i32), f64), CalibrationError> {
    let gray = frame.to_gray();
    let (crop, rect) = crop_gray(&gray, self.edge_roi, ScanPass::StakeEdge)?;

    let level = self.gray_level;
    let stride = scan::stride(crop.height(), self.divisor);
    let series = scan::sweep_rows(&crop, 0, stride, |v| v > level);
    debug!("边缘扫描: 步长 {}, 样本数 {}", stride, series.len());

    let left = series.robust_column().ok_or(CalibrationError::NoSamples {
      pass: ScanPass::StakeEdge,
    })? as i32;
    let origin_x = rect.left() + left + self.x_offset;

    let rotation = series.correction_angle().ok_or(CalibrationError::NoSamples {
      pass: ScanPass::Rotation,
    })?;
    let frame = normalize::rotate(frame, rotation);

    let marker_roi = Roi::new(
      origin_x + self.marker_gap,
      self.marker_top,
      (self.edge_roi.width as i32 - left).max(0) as u32,
      self.marker_height,
    );
    let mask = color::in_range_mask(frame.image(), ColorSpace::Hsv, &self.marker_band);
    let (marker, marker_rect) = crop_gray(&mask, marker_roi, ScanPass::Marker)?;
    let top = scan::first_in_column(&marker, 0, 0, |v| v == MASK_ON).ok_or(
      CalibrationError::NoSamples {
        pass: ScanPass::Marker,
      },
    )?;
    debug!("刻度顶部: {}", top);

    Ok((frame, (origin_x, marker_rect.top() + top as i32), rotation))
  }
}
