// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/overlay.rs - 文字叠加
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

use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_text_mut, text_size},
  rect::Rect,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum OverlayError {
  #[error("字体文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 文字锚点，与常见排版库的两字母写法一致：水平 l/m/r，垂直 t/m/s（基线）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Anchor {
  #[serde(rename = "lt")]
  LeftTop,
  #[default]
  #[serde(rename = "ls")]
  LeftBaseline,
  #[serde(rename = "mt")]
  MiddleTop,
  #[serde(rename = "mm")]
  Middle,
  #[serde(rename = "ms")]
  MiddleBaseline,
  #[serde(rename = "rt")]
  RightTop,
  #[serde(rename = "rs")]
  RightBaseline,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextStyle {
  pub font_size: f32,
  pub anchor: Anchor,
  pub fill: [u8; 3],
  pub stroke: [u8; 3],
  /// 描边宽度，0 表示不描边
  pub stroke_width: u32,
}

impl Default for TextStyle {
  fn default() -> Self {
    Self {
      font_size: 200.0,
      anchor: Anchor::LeftBaseline,
      fill: [255, 255, 255],
      stroke: [0, 0, 0],
      stroke_width: 8,
    }
  }
}

/// 在图像上绘制文字与实心矩形的能力
pub trait TextOverlay {
  fn draw_text(&self, image: &mut RgbImage, position: (i32, i32), text: &str, style: &TextStyle);

  fn fill_rect(&self, image: &mut RgbImage, rect: Rect, color: Rgb<u8>) {
    draw_filled_rect_mut(image, rect, color);
  }
}

/// 基于 `ab_glyph` 字体的实现
pub struct GlyphOverlay {
  font: FontArc,
}

impl GlyphOverlay {
  pub fn from_bytes(data: Vec<u8>) -> Result<Self, OverlayError> {
    let font = FontArc::try_from_vec(data)?;
    Ok(Self { font })
  }

  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OverlayError> {
    let path = path.as_ref();
    debug!("加载字体文件: {}", path.display());
    let data = std::fs::read(path)?;
    Self::from_bytes(data)
  }

  /// 按锚点把位置换算成文字左上角
  fn top_left(&self, position: (i32, i32), text: &str, style: &TextStyle) -> (i32, i32) {
    let scale = PxScale::from(style.font_size);
    let (width, _) = text_size(scale, &self.font, text);
    let scaled = self.font.as_scaled(scale);
    let ascent = scaled.ascent().round() as i32;
    let height = scaled.height().round() as i32;
    let width = width as i32;

    let (x, y) = position;
    let x = match style.anchor {
      Anchor::LeftTop | Anchor::LeftBaseline => x,
      Anchor::MiddleTop | Anchor::Middle | Anchor::MiddleBaseline => x - width / 2,
      Anchor::RightTop | Anchor::RightBaseline => x - width,
    };
    let y = match style.anchor {
      Anchor::LeftTop | Anchor::MiddleTop | Anchor::RightTop => y,
      Anchor::Middle => y - height / 2,
      Anchor::LeftBaseline | Anchor::MiddleBaseline | Anchor::RightBaseline => y - ascent,
    };
    (x, y)
  }
}

impl TextOverlay for GlyphOverlay {
  fn draw_text(&self, image: &mut RgbImage, position: (i32, i32), text: &str, style: &TextStyle) {
    let scale = PxScale::from(style.font_size);
    let (x, y) = self.top_left(position, text, style);

    // 描边：在半径为描边宽度的圆盘内逐点偏移绘制
    let radius = style.stroke_width as i32;
    if radius > 0 {
      let stroke = Rgb(style.stroke);
      for dy in -radius..=radius {
        for dx in -radius..=radius {
          if dx * dx + dy * dy > radius * radius {
            continue;
          }
          draw_text_mut(image, stroke, x + dx, y + dy, scale, &self.font, text);
        }
      }
    }

    draw_text_mut(image, Rgb(style.fill), x, y, scale, &self.font, text);
  }
}
