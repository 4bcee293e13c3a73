// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/calibrate/scan.rs - 扫描线采样
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
use tracing::debug;

use crate::outlier;

/// 扫描线上第一个命中的像素，`row` 与 `column` 均相对于 ROI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeSample {
  pub row: u32,
  pub column: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSeries {
  samples: Vec<EdgeSample>,
}

impl SampleSeries {
  pub fn len(&self) -> usize {
    self.samples.len()
  }

  pub fn is_empty(&self) -> bool {
    self.samples.is_empty()
  }

  pub fn samples(&self) -> &[EdgeSample] {
    &self.samples
  }

  pub fn columns(&self) -> Vec<f64> {
    self.samples.iter().map(|s| s.column as f64).collect()
  }

  /// 相邻样本连线相对竖直方向的角度（度）：`atan(Δcolumn / Δrow)`
  pub fn angles(&self) -> Vec<f64> {
    self
      .samples
      .windows(2)
      .filter(|pair| pair[1].row != pair[0].row)
      .map(|pair| {
        let d_col = pair[1].column as f64 - pair[0].column as f64;
        let d_row = pair[1].row as f64 - pair[0].row as f64;
        (d_col / d_row).atan().to_degrees()
      })
      .collect()
  }

  /// 剔除离群值后的平均列号
  pub fn robust_column(&self) -> Option<f64> {
    outlier::mean(&outlier::reject_outliers(&self.columns()))
  }

  /// 把雪桩扶正所需的旋转角度，即平均倾角取反
  pub fn correction_angle(&self) -> Option<f64> {
    let angles = self.angles();
    debug!("倾角样本: {:?}", angles);
    outlier::mean(&outlier::reject_outliers(&angles)).map(|mean| -mean)
  }
}

impl FromIterator<EdgeSample> for SampleSeries {
  fn from_iter<T: IntoIterator<Item = EdgeSample>>(iter: T) -> Self {
    Self {
      samples: iter.into_iter().collect(),
    }
  }
}

/// 扫描步长 `span / divisor - 1`，至少为 1
pub fn stride(span: u32, divisor: u32) -> usize {
  let divisor = divisor.max(1);
  ((span / divisor).saturating_sub(1)).max(1) as usize
}

pub fn first_in_row<F>(image: &GrayImage, row: u32, hit: F) -> Option<u32>
where
  F: Fn(u8) -> bool,
{
  if row >= image.height() {
    return None;
  }
  (0..image.width()).find(|&x| hit(image.get_pixel(x, row).0[0]))
}

pub fn first_in_column<F>(image: &GrayImage, column: u32, from_row: u32, hit: F) -> Option<u32>
where
  F: Fn(u8) -> bool,
{
  if column >= image.width() {
    return None;
  }
  (from_row..image.height()).find(|&y| hit(image.get_pixel(column, y).0[0]))
}

/// 自 `start_row` 起按步长横向扫描，记录每行第一个命中的像素；没有命中的行直接跳过
pub fn sweep_rows<F>(image: &GrayImage, start_row: u32, stride: usize, hit: F) -> SampleSeries
where
  F: Fn(u8) -> bool,
{
  (start_row..image.height())
    .step_by(stride.max(1))
    .filter_map(|row| first_in_row(image, row, &hit).map(|column| EdgeSample { row, column }))
    .collect()
}
