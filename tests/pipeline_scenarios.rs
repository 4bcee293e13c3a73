// 该文件是 Snowstake （雪桩） 项目的一部分。
// tests/pipeline_scenarios.rs - 端到端测量
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

mod common;

use std::io::Write;

use common::*;
use imageproc::rect::Rect;

fn config() -> Config {
  Config::from_json(FIXED_RESORT).unwrap()
}

#[test]
fn pink_marking_in_third_inch_reads_three() {
  let config = config();
  let resort = config.resort("vail").unwrap();
  // 刻度 3 位于自上而下第 15 个窗口
  let window = Rect::at(40, 20 + 15 * 10).of_size(20, 10);
  let frame = gray_frame(&[(window, PINK)]);

  let recorder = Recorder::default();
  let pipeline = StakeImagePipeline::for_resort(resort, &recorder).unwrap();
  let reading = pipeline.run(frame).unwrap();

  assert_eq!(reading.measurement, Some(3));
  assert_eq!(recorder.texts.borrow().as_slice(), &["3\"", "3\""]);
  // 雪线标记覆盖在窗口底边左侧
  assert_eq!(reading.frame.image().get_pixel(25, 178).0, [0, 0, 0]);
}

#[test]
fn nothing_detected_renders_placeholder() {
  let config = config();
  let resort = config.resort("vail").unwrap();

  let recorder = Recorder::default();
  let pipeline = StakeImagePipeline::for_resort(resort, &recorder).unwrap();
  let reading = pipeline.run(gray_frame(&[])).unwrap();

  assert_eq!(reading.measurement, None);
  let texts = recorder.texts.borrow();
  assert_eq!(texts.as_slice(), &["--"]);
  assert!(!texts.iter().any(|t| t == "0\""));
  assert_eq!(reading.frame.image().get_pixel(25, 178).0, GRAY.0);
}

#[test]
fn config_loads_from_file() {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  file.write_all(FIXED_RESORT.as_bytes()).unwrap();
  let config = Config::from_path(file.path()).unwrap();
  assert_eq!(config.resorts.len(), 1);
  assert_eq!(config.resorts[0].name, "vail");
}

#[test]
fn bundled_config_keeps_resort_order() {
  let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/resorts.json");
  let config = Config::from_path(path).unwrap();
  let names: Vec<&str> = config.resorts.iter().map(|r| r.name.as_str()).collect();
  assert_eq!(names, ["breckenridge", "vail"]);
  for resort in &config.resorts {
    assert!(resort.url.as_deref().is_some_and(|url| url.contains("##MINUTE##")));
  }

  let vail = config.resort("vail").unwrap();
  let marking = vail.classifier.marking.as_ref().unwrap();
  assert_eq!(marking.min_pixels, 1000);
  assert_eq!(vail.classifier.snow.min_pixels, 9);
  let header = &vail.annotation.header;
  assert_eq!(header.title.as_deref(), Some("VAIL"));
  assert_eq!(header.position, Some((3100, 300)));
  assert_eq!(header.style.font_size, 400.0);
}
