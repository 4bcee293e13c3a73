// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/compose.rs - 图像拼接
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

use image::{Rgb, RgbImage, imageops};

use crate::frame::Frame;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// 左右拼接两帧，高度不足的部分填充白色
pub fn side_by_side(left: &Frame, right: &Frame) -> Frame {
  let width = left.width() + right.width();
  let height = left.height().max(right.height());
  let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);
  imageops::replace(&mut canvas, left.image(), 0, 0);
  imageops::replace(&mut canvas, right.image(), left.width() as i64, 0);
  Frame::from_canvas(canvas)
}
