// 该文件是 Snowstake （雪桩） 项目的一部分。
// tests/common/mod.rs - 测试用合成图像与记录器
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

#![allow(dead_code)]

use std::cell::RefCell;

use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};

pub use snowstake::{
  Config, Frame, StakeImagePipeline,
  calibrate::{LightnessBandConfig, Roi, StakeCalibrator, StakeDesign},
  color::ColorRange,
  overlay::{TextOverlay, TextStyle},
};

pub const BACKGROUND: Rgb<u8> = Rgb([30, 30, 30]);
pub const STAKE: Rgb<u8> = Rgb([255, 255, 255]);
pub const GRAY: Rgb<u8> = Rgb([90, 90, 90]);
pub const PINK: Rgb<u8> = Rgb([255, 105, 180]);

/// 白色竖直雪桩：x 120..150，y 40..400
pub const STAKE_RECT: (i32, i32, u32, u32) = (120, 40, 30, 360);

pub fn vertical_stake_frame() -> Frame {
  let mut image = RgbImage::from_pixel(300, 460, BACKGROUND);
  let (x, y, w, h) = STAKE_RECT;
  draw_filled_rect_mut(&mut image, Rect::at(x, y).of_size(w, h), STAKE);
  Frame::new(image).unwrap()
}

/// 与合成雪桩尺寸相符的亮度色带标定参数
pub fn small_lightness_band() -> StakeDesign {
  StakeDesign::LightnessBand(LightnessBandConfig {
    band: ColorRange::new([0, 180, 0], [255, 255, 255]),
    kernel_radius: 1,
    dilate_iterations: 1,
    erode_iterations: 2,
    rotation_roi: Roi::new(60, 60, 160, 160),
    origin_roi: Roi::new(60, 20, 160, 120),
    rotation_divisor: 12,
    origin_divisor: 8,
    refine_offset: 5,
    top_buffer: 0,
  })
}

pub fn gray_frame(fills: &[(Rect, Rgb<u8>)]) -> Frame {
  let mut image = RgbImage::from_pixel(120, 260, GRAY);
  for (rect, color) in fills {
    draw_filled_rect_mut(&mut image, *rect, *color);
  }
  Frame::new(image).unwrap()
}

/// 18 英寸、固定标定、原点 (40, 20)、窗口 20x10 的雪场
pub const FIXED_RESORT: &str = r#"{
  "resorts": [{
    "name": "vail",
    "scale": 1,
    "inches": 18,
    "box": { "height": 10, "width": 20, "origin": [40, 20] },
    "stake": { "strategy": "fixed" },
    "classifier": {
      "threshold_inch": 6,
      "color_space": "hsv",
      "marking": { "range": { "lower": [100, 0, 0], "upper": [180, 255, 255] }, "min_pixels": 100 },
      "snow": { "range": { "lower": [90, 127, 127], "upper": [130, 255, 255] }, "min_pixels": 9 }
    },
    "annotation": { "marker": { "width": 30 } }
  }]
}"#;

/// 记录所有绘制的文字，不需要字体文件
#[derive(Default)]
pub struct Recorder {
  pub texts: RefCell<Vec<String>>,
}

impl TextOverlay for Recorder {
  fn draw_text(&self, _: &mut RgbImage, _: (i32, i32), text: &str, _: &TextStyle) {
    self.texts.borrow_mut().push(text.to_string());
  }
}
