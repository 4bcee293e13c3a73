// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/classify.rs - 雪线所在刻度的颜色判定
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

//! 积雪让桩身颜色变得一致；无雪时刻度附近的颜色是不连续的。
//! 低于阈值刻度时统计不连续的标记色，高于阈值刻度时统计桩身色。

use serde::Deserialize;
use tracing::{debug, info};

use crate::{
  Measurement,
  color::{self, ColorRange, ColorSpace},
  frame::Frame,
  region::RegionMap,
};

/// 颜色范围及其像素数阈值，计数严格大于 `min_pixels` 才算命中
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ColorBand {
  pub range: ColorRange,
  pub min_pixels: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClassifierConfig {
  /// 刻度 `< threshold_inch` 用标记色，`>=` 用桩身色
  #[serde(default)]
  pub threshold_inch: u32,
  #[serde(default)]
  pub color_space: ColorSpace,
  #[serde(default)]
  pub marking: Option<ColorBand>,
  pub snow: ColorBand,
}

pub struct SnowClassifier<'a> {
  config: &'a ClassifierConfig,
}

impl<'a> SnowClassifier<'a> {
  pub fn new(config: &'a ClassifierConfig) -> Self {
    Self { config }
  }

  fn band_for(&self, label: u32) -> Option<&ColorBand> {
    if label < self.config.threshold_inch {
      self.config.marking.as_ref()
    } else {
      Some(&self.config.snow)
    }
  }

  /// 从 0 开始向上检查，第一个满足阈值的刻度即为当前雪深
  pub fn classify(&self, frame: &Frame, regions: &RegionMap) -> Measurement {
    for region in regions.iter() {
      let Some(band) = self.band_for(region.label) else {
        continue;
      };
      for window in &region.windows {
        let count = frame
          .crop(*window)
          .map(|crop| color::count_in_range(crop.image(), self.config.color_space, &band.range))
          .unwrap_or(0);
        debug!("刻度 {}: 命中像素 {}", region.label, count);
        if count > band.min_pixels {
          info!("雪深判定为 {} 英寸", region.label);
          return Some(region.label);
        }
      }
    }
    info!("没有刻度满足阈值，雪深未知");
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::region::{RegionGeometry, WindowLayout};
  use image::{Rgb, RgbImage};
  use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};

  const PINK: Rgb<u8> = Rgb([255, 105, 180]);
  const BLUE: Rgb<u8> = Rgb([20, 40, 220]);

  fn config() -> ClassifierConfig {
    ClassifierConfig {
      threshold_inch: 6,
      color_space: ColorSpace::Hsv,
      marking: Some(ColorBand {
        range: ColorRange::new([100, 0, 0], [180, 255, 255]),
        min_pixels: 100,
      }),
      snow: ColorBand {
        range: ColorRange::new([90, 127, 127], [130, 255, 255]),
        min_pixels: 9,
      },
    }
  }

  fn frame_with(fill: &[(Rect, Rgb<u8>)]) -> Frame {
    let mut image = RgbImage::from_pixel(120, 260, Rgb([90, 90, 90]));
    for (rect, color) in fill {
      draw_filled_rect_mut(&mut image, *rect, *color);
    }
    Frame::new(image).unwrap()
  }

  #[test]
  fn snow_band_applies_at_threshold() {
    let regions = RegionGeometry::new(18, 10, 20, WindowLayout::Single)
      .unwrap()
      .build((40, 20));
    let window = regions.get(7).unwrap().windows[0];
    let frame = frame_with(&[(window, BLUE)]);
    let config = config();
    assert_eq!(SnowClassifier::new(&config).classify(&frame, &regions), Some(7));
  }

  #[test]
  fn lowest_matching_label_wins() {
    let regions = RegionGeometry::new(18, 10, 20, WindowLayout::Single)
      .unwrap()
      .build((40, 20));
    let frame = frame_with(&[
      (regions.get(12).unwrap().windows[0], BLUE),
      (regions.get(4).unwrap().windows[0], PINK),
    ]);
    let config = config();
    assert_eq!(SnowClassifier::new(&config).classify(&frame, &regions), Some(4));
  }

  #[test]
  fn pink_above_threshold_inch_is_ignored() {
    let regions = RegionGeometry::new(18, 10, 20, WindowLayout::Single)
      .unwrap()
      .build((40, 20));
    let frame = frame_with(&[(regions.get(9).unwrap().windows[0], PINK)]);
    let config = config();
    assert_eq!(SnowClassifier::new(&config).classify(&frame, &regions), None);
  }

  #[test]
  fn either_split_window_triggers_label() {
    let regions = RegionGeometry::new(18, 10, 20, WindowLayout::Split { inset: 10 })
      .unwrap()
      .build((60, 20));
    let right = regions.get(2).unwrap().windows[1];
    let frame = frame_with(&[(right, PINK)]);
    let config = config();
    assert_eq!(SnowClassifier::new(&config).classify(&frame, &regions), Some(2));
  }

  #[test]
  fn windows_outside_frame_count_zero() {
    let regions = RegionGeometry::new(3, 10, 20, WindowLayout::Single)
      .unwrap()
      .build((500, 500));
    let frame = frame_with(&[]);
    let config = config();
    assert_eq!(SnowClassifier::new(&config).classify(&frame, &regions), None);
  }

  #[test]
  fn classification_is_deterministic() {
    let regions = RegionGeometry::new(18, 10, 20, WindowLayout::Single)
      .unwrap()
      .build((40, 20));
    let frame = frame_with(&[(regions.get(3).unwrap().windows[0], PINK)]);
    let config = config();
    let classifier = SnowClassifier::new(&config);
    let first = classifier.classify(&frame, &regions);
    for _ in 0..5 {
      assert_eq!(classifier.classify(&frame, &regions), first);
    }
    assert_eq!(first, Some(3));
  }
}
