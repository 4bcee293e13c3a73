// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Frame,
  output::{Record, Render},
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 每次测量写入 `<雪场>_<时间>.png` 和同名 `.txt`
pub struct DirectoryRecordOutput {
  directory: PathBuf,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(uri.path()),
    })
  }
}

impl DirectoryRecordOutput {
  fn record_stem(&self, resort: &str, now: DateTime<Utc>) -> PathBuf {
    self
      .directory
      .join(format!("{}_{}", resort, now.format("%Y%m%d_%H%M%S")))
  }

  pub fn record_at(
    &self,
    frame: &Frame,
    record: &Record,
    now: DateTime<Utc>,
  ) -> Result<PathBuf, DirectoryRecordOutputError> {
    std::fs::create_dir_all(&self.directory)?;

    let stem = self.record_stem(&record.resort, now);
    let image_path = stem.with_extension("png");
    frame.image().save(&image_path)?;

    let text = match record.measurement {
      Some(inches) => inches.to_string(),
      None => "none".to_string(),
    };
    std::fs::write(stem.with_extension("txt"), format!("{}\n", text))?;

    info!("记录 {} 雪深 {} 到 {}", record.resort, text, image_path.display());
    Ok(image_path)
  }
}

impl Render<Frame, Record> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &Frame, result: &Record) -> Result<(), Self::Error> {
    self.record_at(frame, result, Utc::now())?;
    Ok(())
  }
}
