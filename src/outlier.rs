// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/outlier.rs - 基于中位数绝对偏差的离群值剔除
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

/// 默认的归一化偏差阈值
pub const DEFAULT_THRESHOLD: f64 = 6.0;

/// 中位数，偶数长度时取中间两个值的平均
pub fn median(values: &[f64]) -> Option<f64> {
  if values.is_empty() {
    return None;
  }
  let mut sorted = values.to_vec();
  sorted.sort_by(f64::total_cmp);
  let mid = sorted.len() / 2;
  if sorted.len() % 2 == 0 {
    Some((sorted[mid - 1] + sorted[mid]) / 2.0)
  } else {
    Some(sorted[mid])
  }
}

pub fn mean(values: &[f64]) -> Option<f64> {
  if values.is_empty() {
    return None;
  }
  Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// 保留 `|x - median| / MAD < threshold` 的值，顺序不变。
/// MAD 为 0 时按 1.0 归一化。
pub fn reject_outliers_with(values: &[f64], threshold: f64) -> Vec<f64> {
  let Some(center) = median(values) else {
    return Vec::new();
  };
  let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
  let mad = median(&deviations).unwrap_or(0.0);
  let scale = if mad != 0.0 { mad } else { 1.0 };

  values
    .iter()
    .zip(&deviations)
    .filter(|(_, d)| *d / scale < threshold)
    .map(|(v, _)| *v)
    .collect()
}

pub fn reject_outliers(values: &[f64]) -> Vec<f64> {
  reject_outliers_with(values, DEFAULT_THRESHOLD)
}
