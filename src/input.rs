// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/input.rs - 雪桩图像输入
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

use thiserror::Error;

use crate::{FromUrl, FromUrlWithScheme, config::ResortConfig, frame::Frame};

mod read_image_file;
pub use self::read_image_file::{ImageFileInput, ImageFileInputError};

#[cfg(feature = "timecam_input")]
mod timecam;
#[cfg(feature = "timecam_input")]
pub use self::timecam::{FetchError, TimecamInput, expand_template, snapshot_time};

/// 能够产生一帧图像的输入源
pub trait FrameSource {
  type Error;
  fn read_frame(&self) -> Result<Frame, Self::Error>;
}

#[derive(Error, Debug)]
pub enum InputError {
  #[error("图像文件输入错误: {0}")]
  ImageFileInputError(#[from] ImageFileInputError),
  #[cfg(feature = "timecam_input")]
  #[error("抓拍图获取错误: {0}")]
  FetchError(#[from] FetchError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("雪场 {0} 没有可用的抓拍地址")]
  NoSource(String),
}

pub enum InputWrapper {
  ReadImageFile(ImageFileInput),
  #[cfg(feature = "timecam_input")]
  Timecam(TimecamInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    if url.scheme() == ImageFileInput::SCHEME {
      let input = ImageFileInput::from_url(url)?;
      return Ok(InputWrapper::ReadImageFile(input));
    }
    #[cfg(feature = "timecam_input")]
    {
      if url.scheme() == "http" || url.scheme() == "https" {
        let input = TimecamInput::new(url.as_str())?;
        return Ok(InputWrapper::Timecam(input));
      }
    }
    Err(InputError::SchemeMismatch)
  }
}

impl InputWrapper {
  /// 按雪场配置中的地址模板定时抓取
  #[cfg(feature = "timecam_input")]
  pub fn for_resort(resort: &ResortConfig) -> Result<Self, InputError> {
    let template = resort
      .url
      .as_deref()
      .ok_or_else(|| InputError::NoSource(resort.name.clone()))?;
    Ok(InputWrapper::Timecam(TimecamInput::new(template)?))
  }

  #[cfg(not(feature = "timecam_input"))]
  pub fn for_resort(resort: &ResortConfig) -> Result<Self, InputError> {
    Err(InputError::NoSource(resort.name.clone()))
  }
}

impl FrameSource for InputWrapper {
  type Error = InputError;

  fn read_frame(&self) -> Result<Frame, Self::Error> {
    match self {
      InputWrapper::ReadImageFile(input) => Ok(input.read_frame()?),
      #[cfg(feature = "timecam_input")]
      InputWrapper::Timecam(input) => Ok(input.read_frame()?),
    }
  }
}
