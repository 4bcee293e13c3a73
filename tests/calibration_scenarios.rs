// 该文件是 Snowstake （雪桩） 项目的一部分。
// tests/calibration_scenarios.rs - 合成雪桩的自动标定
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

use common::*;
use snowstake::{calibrate::CalibrationError, normalize};

#[test]
fn vertical_stake_needs_no_rotation() {
  let design = small_lightness_band();
  let calibrator = StakeCalibrator::new(&design, 20, 30, (0, 0));
  let (_, params) = calibrator.calibrate(vertical_stake_frame()).unwrap();

  assert!(params.rotation.abs() < 0.5, "rotation = {}", params.rotation);
  let (x, y, _, _) = STAKE_RECT;
  assert!((params.origin.0 - x).abs() <= 3, "origin = {:?}", params.origin);
  assert!((params.origin.1 - y).abs() <= 3, "origin = {:?}", params.origin);
}

#[test]
fn counter_clockwise_tilt_is_undone() {
  let design = small_lightness_band();
  let calibrator = StakeCalibrator::new(&design, 20, 30, (0, 0));
  let tilted = normalize::rotate(vertical_stake_frame(), 7.0);
  let (_, params) = calibrator.calibrate(tilted).unwrap();

  assert!(
    (params.rotation + 7.0).abs() < 1.0,
    "rotation = {}",
    params.rotation
  );
}

#[test]
fn stakeless_frame_is_a_calibration_error() {
  let design = small_lightness_band();
  let calibrator = StakeCalibrator::new(&design, 20, 30, (0, 0));
  let empty = gray_frame(&[]);
  // 120x260 的纯灰图中看不到任何桩身
  assert!(matches!(
    calibrator.calibrate(empty),
    Err(CalibrationError::NoSamples { .. })
  ));
}
