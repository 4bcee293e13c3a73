// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/annotate.rs - 雪线标记与雪深文字
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

use image::Rgb;
use imageproc::rect::Rect;
use serde::Deserialize;
use tracing::debug;

use crate::{
  Measurement,
  frame::Frame,
  normalize::Zoom,
  overlay::{Anchor, TextOverlay, TextStyle},
  region::RegionMap,
};

/// 雪线左侧的遮挡条及其上方的雪深数字
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
  pub enabled: bool,
  /// 遮挡条向左延伸的长度
  pub width: i32,
  pub thickness: i32,
  pub color: [u8; 3],
  /// 文字基线与遮挡条的间距
  pub text_gap: i32,
  pub style: TextStyle,
}

impl Default for MarkerConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      width: 300,
      thickness: 5,
      color: [0, 0, 0],
      text_gap: 10,
      style: TextStyle::default(),
    }
  }
}

/// 右上角的雪深标题，可在雪深上方加一行雪场名
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
  pub enabled: bool,
  pub title: Option<String>,
  /// 第一行的锚点；未设置时取右上角减去边距
  pub position: Option<(i32, i32)>,
  pub margin_x: i32,
  pub margin_y: i32,
  /// 行距，未设置时为字号加 4
  pub line_spacing: Option<i32>,
  pub style: TextStyle,
}

impl HeaderConfig {
  fn line_advance(&self) -> i32 {
    self
      .line_spacing
      .unwrap_or(self.style.font_size.round() as i32 + 4)
  }
}

impl Default for HeaderConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      title: None,
      position: None,
      margin_x: 100,
      margin_y: 20,
      line_spacing: None,
      style: TextStyle {
        font_size: 500.0,
        anchor: Anchor::RightTop,
        ..TextStyle::default()
      },
    }
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
  pub marker: MarkerConfig,
  pub header: HeaderConfig,
  /// 雪深未知时显示的文字
  pub placeholder: String,
  pub region_color: [u8; 3],
  pub region_thickness: u32,
}

impl Default for AnnotationConfig {
  fn default() -> Self {
    Self {
      marker: MarkerConfig::default(),
      header: HeaderConfig::default(),
      placeholder: "--".to_string(),
      region_color: [0, 255, 0],
      region_thickness: 5,
    }
  }
}

pub fn format_measurement(measurement: Measurement, placeholder: &str) -> String {
  match measurement {
    Some(inches) => format!("{}\"", inches),
    None => placeholder.to_string(),
  }
}

/// 把裁剪前的半开区间 `[x0, x1) x [y0, y1)` 映射到裁剪后的坐标
fn map_span(zoom: &Zoom, x0: i32, y0: i32, x1: i32, y1: i32) -> Option<Rect> {
  let (left, top) = zoom.map_point(x0, y0);
  let (right, bottom) = zoom.map_point(x1, y1);
  if right <= left || bottom <= top {
    return None;
  }
  Some(Rect::at(left, top).of_size((right - left) as u32, (bottom - top) as u32))
}

pub struct Annotator<'a, O: TextOverlay> {
  overlay: &'a O,
  config: &'a AnnotationConfig,
}

impl<'a, O: TextOverlay> Annotator<'a, O> {
  pub fn new(overlay: &'a O, config: &'a AnnotationConfig) -> Self {
    Self { overlay, config }
  }

  /// 遮挡雪线左侧并标注雪深；雪深未知时没有雪线可标
  pub fn draw_snowline(
    &self,
    mut frame: Frame,
    regions: &RegionMap,
    measurement: Measurement,
    zoom: &Zoom,
  ) -> Frame {
    let marker = &self.config.marker;
    if !marker.enabled {
      return frame;
    }
    let Some(window) = measurement
      .and_then(|label| regions.get(label))
      .and_then(|region| region.leftmost())
    else {
      debug!("雪深未知，跳过雪线标记");
      return frame;
    };

    let right = window.left();
    let left = right - marker.width;
    let bottom = window.top() + regions.box_height() as i32;
    let top = bottom - marker.thickness;

    if let Some(rect) = map_span(zoom, left, top, right + 1, bottom + 1) {
      self
        .overlay
        .fill_rect(frame.image_mut(), rect, Rgb(marker.color));
    }

    let text = format_measurement(measurement, &self.config.placeholder);
    let position = zoom.map_point(left, top - marker.text_gap);
    self
      .overlay
      .draw_text(frame.image_mut(), position, &text, &marker.style);
    frame
  }

  pub fn draw_header(&self, mut frame: Frame, measurement: Measurement) -> Frame {
    let header = &self.config.header;
    if !header.enabled {
      return frame;
    }
    let text = format_measurement(measurement, &self.config.placeholder);
    let (x, mut y) = header
      .position
      .unwrap_or((frame.width() as i32 - header.margin_x, header.margin_y));
    debug!("绘制标题 {:?} {} 于 ({}, {})", header.title, text, x, y);
    for line in header.title.iter().map(String::as_str).chain([text.as_str()]) {
      self
        .overlay
        .draw_text(frame.image_mut(), (x, y), line, &header.style);
      y += header.line_advance();
    }
    frame
  }
}

/// 调试用：画出所有刻度窗口
pub fn draw_regions(mut frame: Frame, regions: &RegionMap, zoom: &Zoom, config: &AnnotationConfig) -> Frame {
  let color = Rgb(config.region_color);
  for region in regions.iter() {
    for window in &region.windows {
      let x1 = window.left() + window.width() as i32;
      let y1 = window.top() + window.height() as i32;
      let Some(rect) = map_span(zoom, window.left(), window.top(), x1, y1) else {
        continue;
      };
      for inset in 0..config.region_thickness as i32 {
        let w = rect.width() as i32 - 2 * inset;
        let h = rect.height() as i32 - 2 * inset;
        if w <= 0 || h <= 0 {
          break;
        }
        let ring = Rect::at(rect.left() + inset, rect.top() + inset).of_size(w as u32, h as u32);
        imageproc::drawing::draw_hollow_rect_mut(frame.image_mut(), ring, color);
      }
    }
  }
  frame
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::region::{RegionGeometry, WindowLayout};
  use image::RgbImage;
  use std::cell::RefCell;

  #[derive(Default)]
  struct Recorder {
    texts: RefCell<Vec<(String, (i32, i32))>>,
    rects: RefCell<Vec<Rect>>,
  }

  impl TextOverlay for Recorder {
    fn draw_text(&self, _: &mut RgbImage, position: (i32, i32), text: &str, _: &TextStyle) {
      self.texts.borrow_mut().push((text.to_string(), position));
    }

    fn fill_rect(&self, image: &mut RgbImage, rect: Rect, color: Rgb<u8>) {
      self.rects.borrow_mut().push(rect);
      imageproc::drawing::draw_filled_rect_mut(image, rect, color);
    }
  }

  fn frame() -> Frame {
    Frame::new(RgbImage::from_pixel(400, 300, Rgb([128, 128, 128]))).unwrap()
  }

  #[test]
  fn measurement_formats_as_inches() {
    assert_eq!(format_measurement(Some(12), "--"), "12\"");
    assert_eq!(format_measurement(Some(0), "--"), "0\"");
    assert_eq!(format_measurement(None, "--"), "--");
  }

  #[test]
  fn snowline_marker_sits_left_of_region() {
    let regions = RegionGeometry::new(10, 20, 30, WindowLayout::Single)
      .unwrap()
      .build((350, 20));
    let config = AnnotationConfig {
      marker: MarkerConfig {
        width: 100,
        ..MarkerConfig::default()
      },
      ..AnnotationConfig::default()
    };
    let recorder = Recorder::default();
    let annotator = Annotator::new(&recorder, &config);
    let out = annotator.draw_snowline(frame(), &regions, Some(4), &Zoom::IDENTITY);

    // 刻度 4 的窗口位于 y = 20 + 6 * 20 = 140
    let rect = recorder.rects.borrow()[0];
    assert_eq!((rect.left(), rect.top()), (250, 155));
    assert_eq!((rect.width(), rect.height()), (101, 6));
    assert_eq!(out.image().get_pixel(300, 158).0, [0, 0, 0]);
    assert_eq!(
      recorder.texts.borrow().as_slice(),
      &[("4\"".to_string(), (250, 145))]
    );
  }

  #[test]
  fn unknown_measurement_renders_placeholder_not_zero() {
    let regions = RegionGeometry::new(10, 20, 30, WindowLayout::Single)
      .unwrap()
      .build((350, 20));
    let config = AnnotationConfig::default();
    let recorder = Recorder::default();
    let annotator = Annotator::new(&recorder, &config);
    let out = annotator.draw_snowline(frame(), &regions, None, &Zoom::IDENTITY);
    let out = annotator.draw_header(out, None);

    assert!(recorder.rects.borrow().is_empty());
    let texts = recorder.texts.borrow();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].0, "--");
    assert!(texts.iter().all(|(t, _)| t != "0\""));
    assert_eq!(texts[0].1, (300, 20));
    assert_eq!(out.width(), 400);
  }

  #[test]
  fn header_title_is_drawn_above_measurement() {
    let config = AnnotationConfig {
      header: HeaderConfig {
        title: Some("VAIL".to_string()),
        position: Some((310, 30)),
        style: TextStyle {
          font_size: 40.0,
          anchor: Anchor::RightBaseline,
          ..TextStyle::default()
        },
        ..HeaderConfig::default()
      },
      ..AnnotationConfig::default()
    };
    let recorder = Recorder::default();
    Annotator::new(&recorder, &config).draw_header(frame(), Some(12));
    assert_eq!(
      recorder.texts.borrow().as_slice(),
      &[
        ("VAIL".to_string(), (310, 30)),
        ("12\"".to_string(), (310, 74)),
      ]
    );
  }

  #[test]
  fn region_boxes_are_drawn() {
    let regions = RegionGeometry::new(2, 20, 30, WindowLayout::Single)
      .unwrap()
      .build((10, 10));
    let out = draw_regions(frame(), &regions, &Zoom::IDENTITY, &AnnotationConfig::default());
    assert_eq!(out.image().get_pixel(10, 10).0, [0, 255, 0]);
    assert_eq!(out.image().get_pixel(25, 20).0, [128, 128, 128]);
  }
}
