// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/region.rs - 英寸刻度区域划分
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

use std::collections::BTreeMap;

use imageproc::rect::Rect;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegionError {
  #[error("区域高度必须为正数: {0}")]
  InvalidHeight(i32),
  #[error("区域宽度必须为正数: {0}")]
  InvalidWidth(i32),
  #[error("英寸数不能为负数: {0}")]
  InvalidInches(i32),
  #[error("左右窗口间距不能为负数: {0}")]
  InvalidInset(i32),
}

/// 每个刻度的窗口布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowLayout {
  /// 单个窗口，原点为窗口左上角
  #[default]
  Single,
  /// 以原点 x 为中心、左右各偏移 `inset` 的一对窗口
  Split { inset: i32 },
}

/// 一个刻度对应的像素窗口（单窗口或左右一对）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
  pub label: u32,
  pub windows: Vec<Rect>,
}

impl Region {
  /// 最左侧窗口，用于定位雪线标记
  pub fn leftmost(&self) -> Option<Rect> {
    self.windows.iter().copied().min_by_key(|rect| rect.left())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMap {
  regions: BTreeMap<u32, Region>,
  box_height: u32,
}

impl RegionMap {
  pub fn get(&self, label: u32) -> Option<&Region> {
    self.regions.get(&label)
  }

  /// 按刻度从 0 向上遍历
  pub fn iter(&self) -> impl Iterator<Item = &Region> {
    self.regions.values()
  }

  pub fn len(&self) -> usize {
    self.regions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.regions.is_empty()
  }

  pub fn box_height(&self) -> u32 {
    self.box_height
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionGeometry {
  inches: u32,
  box_height: u32,
  box_width: u32,
  layout: WindowLayout,
}

impl RegionGeometry {
  pub fn new(
    inches: i32,
    box_height: i32,
    box_width: i32,
    layout: WindowLayout,
  ) -> Result<Self, RegionError> {
    if inches < 0 {
      return Err(RegionError::InvalidInches(inches));
    }
    if box_height <= 0 {
      return Err(RegionError::InvalidHeight(box_height));
    }
    if box_width <= 0 {
      return Err(RegionError::InvalidWidth(box_width));
    }
    if let WindowLayout::Split { inset } = layout
      && inset < 0
    {
      return Err(RegionError::InvalidInset(inset));
    }

    Ok(Self {
      inches: inches as u32,
      box_height: box_height as u32,
      box_width: box_width as u32,
      layout,
    })
  }

  pub fn inches(&self) -> u32 {
    self.inches
  }

  fn windows_at(&self, origin: (i32, i32), index: u32) -> Vec<Rect> {
    let (x, y) = origin;
    let top = y + (index * self.box_height) as i32;
    let width = self.box_width;
    let height = self.box_height;
    match self.layout {
      WindowLayout::Single => vec![Rect::at(x, top).of_size(width, height)],
      WindowLayout::Split { inset } => vec![
        Rect::at(x - inset - width as i32, top).of_size(width, height),
        Rect::at(x + inset, top).of_size(width, height),
      ],
    }
  }

  /// 从原点开始自上而下堆叠窗口；最上面的窗口是最大刻度，最下面是 0
  pub fn build(&self, origin: (i32, i32)) -> RegionMap {
    let regions = (0..=self.inches)
      .map(|index| {
        let label = self.inches - index;
        let region = Region {
          label,
          windows: self.windows_at(origin, index),
        };
        (label, region)
      })
      .collect();

    RegionMap {
      regions,
      box_height: self.box_height,
    }
  }
}
