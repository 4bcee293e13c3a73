// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/frame.rs - RGB 帧定义
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

use image::{DynamicImage, GrayImage, RgbImage, imageops::FilterType};
use imageproc::rect::Rect;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
  #[error("帧尺寸无效: {width}x{height}")]
  EmptyFrame { width: u32, height: u32 },
}

/// 一次流水线运行独占的 RGB 图像。
///
/// 宽高始终为正；所有变换都按值消费旧帧并返回新帧。
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
  image: RgbImage,
}

impl Frame {
  pub fn new(image: RgbImage) -> Result<Self, FrameError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      return Err(FrameError::EmptyFrame { width, height });
    }
    Ok(Self { image })
  }

  /// 由已有帧派生的画布，尺寸必然为正
  pub(crate) fn from_canvas(image: RgbImage) -> Self {
    debug_assert!(image.width() > 0 && image.height() > 0);
    Self { image }
  }

  pub fn from_dynamic(image: DynamicImage) -> Result<Self, FrameError> {
    Self::new(image.into_rgb8())
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn image(&self) -> &RgbImage {
    &self.image
  }

  pub fn image_mut(&mut self) -> &mut RgbImage {
    &mut self.image
  }

  pub fn into_image(self) -> RgbImage {
    self.image
  }

  pub fn to_gray(&self) -> GrayImage {
    image::imageops::grayscale(&self.image)
  }

  /// 按整数倍放大，对应抓拍图在标定前的放大
  pub fn upscale(self, factor: u32) -> Self {
    if factor <= 1 {
      return self;
    }
    let width = self.width() * factor;
    let height = self.height() * factor;
    Self {
      image: image::imageops::resize(&self.image, width, height, FilterType::Triangle),
    }
  }

  /// 裁剪到与帧相交的部分；没有交集时返回 `None`
  pub fn crop(&self, rect: Rect) -> Option<Self> {
    let rect = clamp_rect(rect, self.width(), self.height())?;
    let view = image::imageops::crop_imm(
      &self.image,
      rect.left() as u32,
      rect.top() as u32,
      rect.width(),
      rect.height(),
    );
    Some(Self {
      image: view.to_image(),
    })
  }
}

impl TryFrom<RgbImage> for Frame {
  type Error = FrameError;

  fn try_from(image: RgbImage) -> Result<Self, Self::Error> {
    Frame::new(image)
  }
}

/// 把矩形限制在 `width`x`height` 的图像范围内
pub fn clamp_rect(rect: Rect, width: u32, height: u32) -> Option<Rect> {
  let left = rect.left().max(0);
  let top = rect.top().max(0);
  let right = (rect.left() + rect.width() as i32).min(width as i32);
  let bottom = (rect.top() + rect.height() as i32).min(height as i32);
  if left >= right || top >= bottom {
    return None;
  }
  Some(Rect::at(left, top).of_size((right - left) as u32, (bottom - top) as u32))
}
