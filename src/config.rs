// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/config.rs - 雪场配置
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

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
  annotate::AnnotationConfig,
  calibrate::StakeDesign,
  classify::ClassifierConfig,
  normalize::NormalizerConfig,
  region::{RegionError, RegionGeometry, WindowLayout},
};

const DEFAULT_SCALE: u32 = 5;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("配置文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置文件解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("雪场 {resort} 区域配置无效: {source}")]
  InvalidRegion {
    resort: String,
    #[source]
    source: RegionError,
  },
  #[error("雪场 {resort} 配置无效: {reason}")]
  Invalid { resort: String, reason: String },
  #[error("未知雪场: {0}")]
  UnknownResort(String),
  #[error("配置中没有任何雪场")]
  NoResorts,
}

impl ConfigError {
  fn invalid(resort: &str, reason: impl Into<String>) -> Self {
    ConfigError::Invalid {
      resort: resort.to_string(),
      reason: reason.into(),
    }
  }
}

/// 刻度窗口尺寸与默认原点（放大后的像素）
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BoxConfig {
  pub height: i32,
  pub width: i32,
  #[serde(default)]
  pub origin: [i32; 2],
  #[serde(default)]
  pub layout: WindowLayout,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResortConfig {
  pub name: String,
  /// 抓拍地址模板，`##HOUR##` 与 `##MINUTE##` 会被替换
  #[serde(default)]
  pub url: Option<String>,
  /// 标定前的整数放大倍数，所有 ROI 都以放大后的像素计
  #[serde(default = "default_scale")]
  pub scale: u32,
  pub inches: i32,
  #[serde(rename = "box")]
  pub stake_box: BoxConfig,
  pub stake: StakeDesign,
  pub classifier: ClassifierConfig,
  #[serde(default)]
  pub normalizer: NormalizerConfig,
  #[serde(default)]
  pub annotation: AnnotationConfig,
}

fn default_scale() -> u32 {
  DEFAULT_SCALE
}

impl ResortConfig {
  pub fn geometry(&self) -> Result<RegionGeometry, RegionError> {
    RegionGeometry::new(
      self.inches,
      self.stake_box.height,
      self.stake_box.width,
      self.stake_box.layout,
    )
  }

  pub fn default_origin(&self) -> (i32, i32) {
    (self.stake_box.origin[0], self.stake_box.origin[1])
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    self
      .geometry()
      .map_err(|source| ConfigError::InvalidRegion {
        resort: self.name.clone(),
        source,
      })?;

    if self.scale == 0 {
      return Err(ConfigError::invalid(&self.name, "放大倍数必须至少为 1"));
    }
    if self.classifier.threshold_inch > 0 && self.classifier.marking.is_none() {
      return Err(ConfigError::invalid(
        &self.name,
        "threshold_inch 大于 0 时必须配置 marking 色带",
      ));
    }
    if self.classifier.threshold_inch > self.inches as u32 {
      warn!(
        "雪场 {} 的 threshold_inch {} 大于刻度数 {}",
        self.name, self.classifier.threshold_inch, self.inches
      );
    }
    if !(self.normalizer.step > 1.0 && self.normalizer.step.is_finite()) {
      return Err(ConfigError::invalid(&self.name, "normalizer.step 必须大于 1"));
    }
    Ok(())
  }
}

/// 进程级只读配置，启动时加载一次
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
  /// 文字叠加使用的字体文件
  #[serde(default)]
  pub font: Option<PathBuf>,
  pub resorts: Vec<ResortConfig>,
}

impl Config {
  pub fn from_json(text: &str) -> Result<Self, ConfigError> {
    let config: Config = serde_json::from_str(text)?;
    config.validate()?;
    Ok(config)
  }

  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    info!("加载配置文件: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    Self::from_json(&text)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.resorts.is_empty() {
      return Err(ConfigError::NoResorts);
    }
    for (index, resort) in self.resorts.iter().enumerate() {
      if self.resorts[..index].iter().any(|r| r.name == resort.name) {
        return Err(ConfigError::invalid(&resort.name, "雪场名称重复"));
      }
      resort.validate()?;
    }
    Ok(())
  }

  pub fn resort(&self, name: &str) -> Result<&ResortConfig, ConfigError> {
    self
      .resorts
      .iter()
      .find(|resort| resort.name == name)
      .ok_or_else(|| ConfigError::UnknownResort(name.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::calibrate::LightnessBandConfig;

  const MINIMAL: &str = r#"{
    "resorts": [{
      "name": "breckenridge",
      "inches": 24,
      "box": { "height": 40, "width": 60 },
      "stake": { "strategy": "lightness_band" },
      "classifier": {
        "color_space": "rgb",
        "snow": { "range": { "lower": [45, 0, 0], "upper": [180, 255, 255] }, "min_pixels": 100 }
      }
    }]
  }"#;

  #[test]
  fn defaults_fill_missing_fields() {
    let config = Config::from_json(MINIMAL).unwrap();
    let resort = config.resort("breckenridge").unwrap();
    assert_eq!(resort.scale, 5);
    assert_eq!(resort.stake, StakeDesign::LightnessBand(LightnessBandConfig::default()));
    assert_eq!(resort.stake_box.layout, WindowLayout::Single);
    assert_eq!(resort.normalizer, NormalizerConfig::default());
    assert_eq!(resort.annotation.placeholder, "--");
    assert!(config.font.is_none());
  }

  #[test]
  fn unknown_resort_is_reported() {
    let config = Config::from_json(MINIMAL).unwrap();
    assert!(matches!(
      config.resort("vail"),
      Err(ConfigError::UnknownResort(name)) if name == "vail"
    ));
  }

  #[test]
  fn negative_box_height_is_rejected() {
    let text = MINIMAL.replace(r#""height": 40"#, r#""height": -40"#);
    assert!(matches!(
      Config::from_json(&text),
      Err(ConfigError::InvalidRegion {
        source: RegionError::InvalidHeight(-40),
        ..
      })
    ));
  }

  #[test]
  fn threshold_without_marking_band_is_rejected() {
    let text = MINIMAL.replace(r#""color_space": "rgb","#, r#""color_space": "rgb", "threshold_inch": 6,"#);
    assert!(matches!(Config::from_json(&text), Err(ConfigError::Invalid { .. })));
  }

  #[test]
  fn malformed_json_is_parse_error() {
    assert!(matches!(
      Config::from_json("{ \"resorts\": "),
      Err(ConfigError::ParseError(_))
    ));
    assert!(matches!(
      Config::from_json(r#"{ "resorts": [] }"#),
      Err(ConfigError::NoResorts)
    ));
  }
}
