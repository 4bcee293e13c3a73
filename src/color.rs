// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/color.rs - 颜色空间转换与颜色范围掩码
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

//! 8 位颜色空间约定：色相取 0..180（即角度的一半），其余通道取 0..255。

use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::Deserialize;

/// 掩码中 "on" 像素的取值
pub const MASK_ON: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
  #[default]
  Hsv,
  Hls,
  Rgb,
}

/// 三通道闭区间 `[lower, upper]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ColorRange {
  pub lower: [u8; 3],
  pub upper: [u8; 3],
}

impl ColorRange {
  pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
    Self { lower, upper }
  }

  pub fn contains(&self, value: [u8; 3]) -> bool {
    (0..3).all(|c| self.lower[c] <= value[c] && value[c] <= self.upper[c])
  }
}

fn hue_degrees(r: f32, g: f32, b: f32, max: f32, diff: f32) -> f32 {
  if diff == 0.0 {
    return 0.0;
  }
  let h = if max == r {
    60.0 * (g - b) / diff
  } else if max == g {
    120.0 + 60.0 * (b - r) / diff
  } else {
    240.0 + 60.0 * (r - g) / diff
  };
  if h < 0.0 { h + 360.0 } else { h }
}

pub fn rgb_to_hsv(pixel: Rgb<u8>) -> [u8; 3] {
  let [r, g, b] = pixel.0.map(f32::from);
  let max = r.max(g).max(b);
  let min = r.min(g).min(b);
  let diff = max - min;

  let s = if max > 0.0 { diff * 255.0 / max } else { 0.0 };
  let h = hue_degrees(r, g, b, max, diff) / 2.0;
  [h.round() as u8, s.round() as u8, max as u8]
}

pub fn rgb_to_hls(pixel: Rgb<u8>) -> [u8; 3] {
  let [r, g, b] = pixel.0.map(f32::from);
  let max = r.max(g).max(b);
  let min = r.min(g).min(b);
  let diff = max - min;
  let sum = max + min;

  let l = sum / 2.0;
  let s = if diff == 0.0 {
    0.0
  } else if l < 127.5 {
    diff * 255.0 / sum
  } else {
    diff * 255.0 / (510.0 - sum)
  };
  let h = hue_degrees(r, g, b, max, diff) / 2.0;
  [h.round() as u8, l.round() as u8, s.round() as u8]
}

pub fn convert(pixel: Rgb<u8>, space: ColorSpace) -> [u8; 3] {
  match space {
    ColorSpace::Hsv => rgb_to_hsv(pixel),
    ColorSpace::Hls => rgb_to_hls(pixel),
    ColorSpace::Rgb => pixel.0,
  }
}

/// 在给定颜色空间中做范围阈值，返回 0/255 的二值掩码
pub fn in_range_mask(image: &RgbImage, space: ColorSpace, range: &ColorRange) -> GrayImage {
  GrayImage::from_fn(image.width(), image.height(), |x, y| {
    if range.contains(convert(*image.get_pixel(x, y), space)) {
      Luma([MASK_ON])
    } else {
      Luma([0])
    }
  })
}

/// 统计落在颜色范围内的像素数
pub fn count_in_range(image: &RgbImage, space: ColorSpace, range: &ColorRange) -> u32 {
  image
    .pixels()
    .filter(|pixel| range.contains(convert(**pixel, space)))
    .count() as u32
}
