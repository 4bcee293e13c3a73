// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/normalize.rs - 旋转校正与迭代放大裁剪
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

use image::{GrayImage, ImageBuffer, Pixel, Rgb, imageops::FilterType};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::frame::Frame;

const DEFAULT_STEP: f64 = 1.01;
const DEFAULT_MAX_ITERATIONS: u32 = 500;

#[derive(Error, Debug)]
pub enum NormalizeError {
  #[error("边角裁剪在 {iterations} 次迭代后仍未收敛")]
  Convergence { iterations: u32 },
  #[error("放大步长必须大于 1: {0}")]
  InvalidStep(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
  /// 每次迭代的放大倍数
  pub step: f64,
  pub max_iterations: u32,
}

impl Default for NormalizerConfig {
  fn default() -> Self {
    Self {
      step: DEFAULT_STEP,
      max_iterations: DEFAULT_MAX_ITERATIONS,
    }
  }
}

/// 放大并居中裁剪后的坐标映射：`p' = p * scale - offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
  pub scale_x: f64,
  pub scale_y: f64,
  pub offset_x: i32,
  pub offset_y: i32,
  pub iterations: u32,
}

impl Zoom {
  pub const IDENTITY: Zoom = Zoom {
    scale_x: 1.0,
    scale_y: 1.0,
    offset_x: 0,
    offset_y: 0,
    iterations: 0,
  };

  pub fn map_point(&self, x: i32, y: i32) -> (i32, i32) {
    (
      (x as f64 * self.scale_x).round() as i32 - self.offset_x,
      (y as f64 * self.scale_y).round() as i32 - self.offset_y,
    )
  }
}

/// 以帧中心旋转 `degrees` 度（正值为逆时针），尺寸不变，空出的区域填黑。
pub fn rotate(frame: Frame, degrees: f64) -> Frame {
  if degrees == 0.0 {
    return frame;
  }
  debug!("旋转图像 {:.3} 度", degrees);
  // imageproc 的正角度为顺时针
  let theta = -(degrees.to_radians()) as f32;
  let rotated = rotate_about_center(
    frame.image(),
    theta,
    Interpolation::Bilinear,
    Rgb([0, 0, 0]),
  );
  Frame::from_canvas(rotated)
}

fn resize_and_center_crop<P>(
  image: &ImageBuffer<P, Vec<P::Subpixel>>,
  new_width: u32,
  new_height: u32,
  width: u32,
  height: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
  P: Pixel + 'static,
  P::Subpixel: 'static,
{
  let resized = image::imageops::resize(image, new_width, new_height, FilterType::Triangle);
  let x_offset = (new_width - width) / 2;
  let y_offset = (new_height - height) / 2;
  image::imageops::crop_imm(&resized, x_offset, y_offset, width, height).to_image()
}

fn corners_are_content(gray: &GrayImage) -> bool {
  let (w, h) = gray.dimensions();
  [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)]
    .iter()
    .all(|&(x, y)| gray.get_pixel(x, y).0[0] != 0)
}

fn grow(length: u32, step: f64) -> u32 {
  ((length as f64 * step).round() as u32).max(length + 1)
}

/// 迭代放大裁剪，直到四个角都不再是旋转留下的黑边。
///
/// 先在灰度副本上逐步试探，再按累计倍数对原图只做一次缩放。
pub fn converge_crop(frame: Frame, config: &NormalizerConfig) -> Result<(Frame, Zoom), NormalizeError> {
  if config.step <= 1.0 || !config.step.is_finite() {
    return Err(NormalizeError::InvalidStep(config.step));
  }

  let (width, height) = (frame.width(), frame.height());
  let mut probe = frame.to_gray();
  let mut iterations = 0u32;
  let mut scale_x = 1.0f64;
  let mut scale_y = 1.0f64;

  while !corners_are_content(&probe) {
    if iterations >= config.max_iterations {
      warn!("边角裁剪超过最大迭代次数 {}", config.max_iterations);
      return Err(NormalizeError::Convergence { iterations });
    }
    let new_width = grow(width, config.step);
    let new_height = grow(height, config.step);
    probe = resize_and_center_crop(&probe, new_width, new_height, width, height);
    scale_x *= new_width as f64 / width as f64;
    scale_y *= new_height as f64 / height as f64;
    iterations += 1;
  }

  if iterations == 0 {
    debug!("四角均为有效内容，无需裁剪");
    return Ok((frame, Zoom::IDENTITY));
  }

  // 一次性缩放的边缘比逐步缩放更锐利，角点仍为黑时继续放大
  loop {
    let new_width = (width as f64 * scale_x).round() as u32;
    let new_height = (height as f64 * scale_y).round() as u32;
    let cropped = resize_and_center_crop(frame.image(), new_width, new_height, width, height);
    let gray = image::imageops::grayscale(&cropped);
    if corners_are_content(&gray) {
      info!(
        "边角裁剪收敛: {} 次迭代, 缩放 {:.4}x{:.4}",
        iterations, scale_x, scale_y
      );
      let zoom = Zoom {
        scale_x: new_width as f64 / width as f64,
        scale_y: new_height as f64 / height as f64,
        offset_x: ((new_width - width) / 2) as i32,
        offset_y: ((new_height - height) / 2) as i32,
        iterations,
      };
      let frame = Frame::from_canvas(cropped);
      return Ok((frame, zoom));
    }
    if iterations >= config.max_iterations {
      warn!("原图裁剪超过最大迭代次数 {}", config.max_iterations);
      return Err(NormalizeError::Convergence { iterations });
    }
    debug!("原图角点仍为黑边，继续放大");
    scale_x *= config.step;
    scale_y *= config.step;
    iterations += 1;
  }
}
