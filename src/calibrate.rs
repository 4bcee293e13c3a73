// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/calibrate.rs - 雪桩自动标定
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

use std::fmt;

use image::GrayImage;
use imageproc::rect::Rect;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  frame::{Frame, clamp_rect},
  normalize,
};

pub mod scan;

mod gray_edge;
mod lightness_band;

pub use self::gray_edge::GrayEdgeConfig;
pub use self::lightness_band::LightnessBandConfig;

/// 标定中的扫描阶段，用于错误信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPass {
  Rotation,
  StakeTop,
  StakeEdge,
  Marker,
}

impl fmt::Display for ScanPass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ScanPass::Rotation => "倾角",
      ScanPass::StakeTop => "桩顶",
      ScanPass::StakeEdge => "桩左边缘",
      ScanPass::Marker => "刻度标记",
    };
    f.write_str(name)
  }
}

#[derive(Error, Debug, PartialEq)]
pub enum CalibrationError {
  #[error("{pass} 扫描没有找到任何样本")]
  NoSamples { pass: ScanPass },
  #[error("{pass} 扫描区域 {roi:?} 不在图像范围内")]
  RoiOutsideFrame { pass: ScanPass, roi: Roi },
}

/// 以像素表示的感兴趣区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Roi {
  pub x: i32,
  pub y: i32,
  pub width: u32,
  pub height: u32,
}

impl Roi {
  pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  pub fn to_rect(self) -> Option<Rect> {
    if self.width == 0 || self.height == 0 {
      return None;
    }
    Some(Rect::at(self.x, self.y).of_size(self.width, self.height))
  }
}

/// 一次运行的标定结果，计算后不再修改
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationParams {
  pub box_height: u32,
  pub box_width: u32,
  pub origin: (i32, i32),
  /// 已施加到工作帧上的旋转（度）
  pub rotation: f64,
}

/// 手工标定：旋转和原点偏移都来自配置
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct FixedConfig {
  pub rotation: f64,
  pub x_adjust: i32,
  pub y_adjust: i32,
}

/// 雪桩样式对应的标定策略
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StakeDesign {
  /// 高亮度色带 + 形态学处理，适用于白色桩身
  LightnessBand(LightnessBandConfig),
  /// 灰度边缘 + 粉色刻度，适用于顶部白色、桩身蓝色的雪桩
  GrayEdge(GrayEdgeConfig),
  Fixed(FixedConfig),
}

/// 把 ROI 限制在图像内并裁剪，返回裁剪结果及其在原图中的位置
pub(crate) fn crop_gray(
  image: &GrayImage,
  roi: Roi,
  pass: ScanPass,
) -> Result<(GrayImage, Rect), CalibrationError> {
  let rect = roi
    .to_rect()
    .and_then(|rect| clamp_rect(rect, image.width(), image.height()))
    .ok_or(CalibrationError::RoiOutsideFrame { pass, roi })?;
  let view = image::imageops::crop_imm(
    image,
    rect.left() as u32,
    rect.top() as u32,
    rect.width(),
    rect.height(),
  );
  Ok((view.to_image(), rect))
}

pub struct StakeCalibrator<'a> {
  design: &'a StakeDesign,
  box_height: u32,
  box_width: u32,
  default_origin: (i32, i32),
}

impl<'a> StakeCalibrator<'a> {
  pub fn new(
    design: &'a StakeDesign,
    box_height: u32,
    box_width: u32,
    default_origin: (i32, i32),
  ) -> Self {
    Self {
      design,
      box_height,
      box_width,
      default_origin,
    }
  }

  /// 估计旋转与区域原点；返回已扶正的工作帧
  pub fn calibrate(&self, frame: Frame) -> Result<(Frame, CalibrationParams), CalibrationError> {
    let (frame, origin, rotation) = match self.design {
      StakeDesign::LightnessBand(config) => config.calibrate(frame)?,
      StakeDesign::GrayEdge(config) => config.calibrate(frame)?,
      StakeDesign::Fixed(config) => {
        debug!("使用固定标定参数: {:?}", config);
        let origin = (
          self.default_origin.0 + config.x_adjust,
          self.default_origin.1 + config.y_adjust,
        );
        (normalize::rotate(frame, config.rotation), origin, config.rotation)
      }
    };

    let params = CalibrationParams {
      box_height: self.box_height,
      box_width: self.box_width,
      origin,
      rotation,
    };
    info!(
      "标定完成: 旋转 {:.3} 度, 原点 ({}, {})",
      params.rotation, params.origin.0, params.origin.1
    );
    Ok((frame, params))
  }
}
