// 该文件是 Snowstake （雪桩） 项目的一部分。
// src/bin/stake_oneshot.rs - 单次测量
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

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use snowstake::{
  Config, FromUrl, StakeImagePipeline,
  input::{FrameSource, ImageFileInput, InputWrapper},
  output::OutputWrapper,
  overlay::GlyphOverlay,
  task::{OneShotTask, ResortJob, Task},
};

/// Snowstake 单次测量参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 配置文件路径
  #[arg(long, value_name = "CONFIG")]
  pub config: PathBuf,
  /// 雪场名称
  #[arg(long, value_name = "RESORT")]
  pub resort: String,
  /// 输入来源，缺省时按雪场配置的地址抓取
  #[arg(long, value_name = "SOURCE")]
  pub input: Option<Url>,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 拼接在左侧的面板图像
  #[arg(long, value_name = "PANEL")]
  pub panel: Option<Url>,
  /// 画出所有刻度区域
  #[arg(long)]
  pub draw_regions: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  info!("配置文件路径: {}", args.config.display());
  info!("雪场: {}", args.resort);
  info!("输出路径: {}", args.output);

  let config = Config::from_path(&args.config)?;
  let resort = config.resort(&args.resort)?;
  let font = config.font.as_ref().context("配置中缺少字体文件 font")?;
  let overlay = GlyphOverlay::from_path(font)?;

  let input = match &args.input {
    Some(url) => InputWrapper::from_url(url)?,
    None => InputWrapper::for_resort(resort)?,
  };
  let panel = match &args.panel {
    Some(url) => Some(ImageFileInput::from_url(url)?.read_frame()?),
    None => None,
  };
  let output = OutputWrapper::from_url(&args.output)?;

  let pipeline = StakeImagePipeline::for_resort(resort, &overlay)?.with_draw_regions(args.draw_regions);
  let job = ResortJob::new(&resort.name, input, pipeline, &output).with_panel(panel);

  OneShotTask.run_task(&[job])?;

  Ok(())
}
