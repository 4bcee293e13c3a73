// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/input/timecam.rs - 定时抓拍图获取
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

use std::time::Duration;

use chrono::{DateTime, DurationRound, TimeDelta, Timelike, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  frame::{Frame, FrameError},
  input::FrameSource,
};

const HOUR_PLACEHOLDER: &str = "##HOUR##";
const MINUTE_PLACEHOLDER: &str = "##MINUTE##";
const UPLOAD_DELAY_MINUTES: i64 = 5;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum FetchError {
  #[error("HTTP 请求错误: {0}")]
  RequestError(#[from] reqwest::Error),
  #[error("HTTP 状态异常: {status} ({url})")]
  Status {
    status: reqwest::StatusCode,
    url: String,
  },
  #[error("图像解码错误: {0}")]
  DecodeError(#[from] image::ImageError),
  #[error("图像无效: {0}")]
  FrameError(#[from] FrameError),
}

/// 摄像头每 5 分钟上传一次：取当前分钟向下取整到 5 分钟，再往前退 5 分钟
pub fn snapshot_time(now: DateTime<Utc>) -> DateTime<Utc> {
  let now = now
    .duration_trunc(TimeDelta::minutes(1))
    .unwrap_or(now);
  let past = (now.minute() % 5) as i64 + UPLOAD_DELAY_MINUTES;
  now - TimeDelta::minutes(past)
}

/// 替换 `##HOUR##`（`%Y_%m_%d_%H`）与 `##MINUTE##`（`%Y_%m_%d_%H_%M`）
pub fn expand_template(template: &str, when: DateTime<Utc>) -> String {
  let hour = when.format("%Y_%m_%d_%H").to_string();
  let minute = format!("{}{}", hour, when.format("_%M"));
  template
    .replace(HOUR_PLACEHOLDER, &hour)
    .replace(MINUTE_PLACEHOLDER, &minute)
}

pub struct TimecamInput {
  template: String,
  client: reqwest::blocking::Client,
}

impl TimecamInput {
  pub fn new(template: impl Into<String>) -> Result<Self, FetchError> {
    let client = reqwest::blocking::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .user_agent(concat!("snowstake/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self {
      template: template.into(),
      client,
    })
  }

  pub fn fetch_at(&self, now: DateTime<Utc>) -> Result<Frame, FetchError> {
    let url = expand_template(&self.template, snapshot_time(now));
    info!("获取抓拍图: {}", url);

    let response = self.client.get(&url).send()?;
    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status { status, url });
    }

    let bytes = response.bytes()?;
    debug!("下载完成: {} 字节", bytes.len());
    let image = image::load_from_memory(&bytes)?;
    Ok(Frame::from_dynamic(image)?)
  }
}

impl FrameSource for TimecamInput {
  type Error = FetchError;

  fn read_frame(&self) -> Result<Frame, Self::Error> {
    self.fetch_at(Utc::now())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn snapshot_rounds_down_and_backs_off() {
    let now = Utc.with_ymd_and_hms(2024, 1, 7, 14, 23, 41).unwrap();
    assert_eq!(
      snapshot_time(now),
      Utc.with_ymd_and_hms(2024, 1, 7, 14, 15, 0).unwrap()
    );
    let aligned = Utc.with_ymd_and_hms(2024, 1, 7, 0, 0, 5).unwrap();
    assert_eq!(
      snapshot_time(aligned),
      Utc.with_ymd_and_hms(2024, 1, 6, 23, 55, 0).unwrap()
    );
  }

  #[test]
  fn template_placeholders_expand() {
    let when = Utc.with_ymd_and_hms(2024, 1, 7, 14, 15, 0).unwrap();
    let url = expand_template(
      "https://cams.example.com/##HOUR##/cam_##MINUTE##.jpg",
      when,
    );
    assert_eq!(
      url,
      "https://cams.example.com/2024_01_07_14/cam_2024_01_07_14_15.jpg"
    );
  }

  #[test]
  fn template_without_placeholders_is_unchanged() {
    let when = Utc.with_ymd_and_hms(2024, 1, 7, 14, 15, 0).unwrap();
    assert_eq!(
      expand_template("https://example.com/live.jpg", when),
      "https://example.com/live.jpg"
    );
  }
}
